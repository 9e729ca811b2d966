//! The task list: active tasks, the history of deleted ones, and every
//! mutation on them. Each mutation persists both collections and re-renders
//! the affected view straight away.

use crate::api::BootstrapLoader;
use crate::error::ValidationError;
use crate::models::{Status, Task, TaskId};
use crate::store::{Persistence, Storage};
use crate::view::{Intent, Notice, Renderer};
use chrono::{Local, Utc};
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

/// Destructive operations that wait for the user before taking effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Confirm {
    Delete(TaskId),
    ClearHistory,
}

impl Confirm {
    pub fn title(&self) -> &'static str {
        match self {
            Confirm::Delete(_) => "Are you sure?",
            Confirm::ClearHistory => "Clear the history?",
        }
    }

    pub fn text(&self) -> &'static str {
        match self {
            Confirm::Delete(_) => "You won't be able to recover it once deleted.",
            Confirm::ClearHistory => "This removes every deleted task for good.",
        }
    }

    pub fn confirm_label(&self) -> &'static str {
        match self {
            Confirm::Delete(_) => "Yes, delete it",
            Confirm::ClearHistory => "Yes, clear it",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Answer {
    Confirmed,
    Dismissed,
}

pub struct TaskList<S, R> {
    tasks: Vec<Task>,
    history: Vec<Task>,
    persistence: Persistence<S>,
    renderer: R,
    priorities: Vec<String>,
    date_format: String,
    last_id: TaskId,
}

impl<S: Storage, R: Renderer> TaskList<S, R> {
    pub fn new(storage: S, renderer: R, priorities: Vec<String>, date_format: &str) -> Self {
        Self {
            tasks: Vec::new(),
            history: Vec::new(),
            persistence: Persistence::new(storage),
            renderer,
            priorities,
            date_format: date_format.to_string(),
            last_id: 0,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn history(&self) -> &[Task] {
        &self.history
    }

    pub fn priorities(&self) -> &[String] {
        &self.priorities
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    #[cfg(test)]
    pub fn persistence(&self) -> &Persistence<S> {
        &self.persistence
    }

    /// Seeds the active tasks from the bootstrap resource, falling back to
    /// the stored copy. History always comes from storage. Never fails.
    pub async fn initialize(&mut self, loader: &BootstrapLoader) {
        let fetched = loader.fetch().await;
        let stored = self.persistence.load();
        self.history = stored.history;
        self.tasks = match fetched {
            Ok(tasks) => {
                info!(count = tasks.len(), source = ?loader.source(), "loaded bootstrap tasks");
                self.without_known_ids(tasks)
            }
            Err(err) => {
                warn!(error = %err, "could not load bootstrap tasks, using stored tasks");
                stored.tasks
            }
        };
        self.last_id = self
            .tasks
            .iter()
            .chain(&self.history)
            .map(|t| t.id)
            .max()
            .unwrap_or(0);

        self.render_tasks();
        self.render_history();
    }

    // Bootstrap tasks already moved to the history, or repeated in the
    // payload, would share an id with another task.
    fn without_known_ids(&self, tasks: Vec<Task>) -> Vec<Task> {
        let mut seen: HashSet<TaskId> = self.history.iter().map(|t| t.id).collect();
        let total = tasks.len();
        let kept: Vec<Task> = tasks.into_iter().filter(|t| seen.insert(t.id)).collect();
        if kept.len() < total {
            warn!(
                skipped = total - kept.len(),
                "skipped bootstrap tasks whose id is already taken"
            );
        }
        kept
    }

    pub fn add_task(
        &mut self,
        title: &str,
        description: &str,
        priority: &str,
    ) -> Result<TaskId, ValidationError> {
        let result = self.validate(title, priority);
        if let Err(err) = &result {
            self.renderer.notify(Notice::error("Oops!", &capitalize(&err.to_string())));
        }
        result?;

        let task = Task {
            id: self.next_id(),
            title: title.trim().to_string(),
            description: description.trim().to_string(),
            priority: priority.to_string(),
            date: Local::now().format(&self.date_format).to_string(),
            status: Status::Pending,
        };
        let id = task.id;
        debug!(id, title = %task.title, "adding task");

        self.tasks.push(task);
        self.persist();
        self.render_tasks();
        self.renderer
            .notify(Notice::success("Task added!", "Your new task has been saved"));
        Ok(id)
    }

    /// Moves the task to the history once confirmed. Returns whether anything changed.
    pub fn delete_task(&mut self, id: TaskId, answer: Answer) -> bool {
        if answer == Answer::Dismissed {
            debug!(id, "delete dismissed");
            return false;
        }
        let Some(index) = self.tasks.iter().position(|t| t.id == id) else {
            return false;
        };

        let task = self.tasks.remove(index);
        debug!(id, title = %task.title, "moving task to history");
        self.history.push(task);
        self.persist();
        self.render_tasks();
        self.render_history();
        self.renderer
            .notify(Notice::success("Deleted", "The task has been deleted"));
        true
    }

    pub fn toggle_status(&mut self, id: TaskId) -> Option<Status> {
        let task = self.tasks.iter_mut().find(|t| t.id == id)?;
        task.status = task.status.toggled();
        let status = task.status;
        debug!(id, status = status.label(), "toggled task");

        self.persist();
        self.render_tasks();
        Some(status)
    }

    pub fn clear_history(&mut self, answer: Answer) -> bool {
        if answer == Answer::Dismissed {
            return false;
        }
        debug!(count = self.history.len(), "clearing history");
        self.history.clear();
        self.persist();
        self.render_history();
        self.renderer.notify(Notice::success(
            "History cleared",
            "Every deleted task has been removed",
        ));
        true
    }

    /// Renders the active tasks matching `priority` (all of them for `None`)
    /// without touching the collection itself.
    pub fn filter_by_priority(&mut self, priority: Option<&str>) -> Vec<TaskId> {
        let filtered: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|t| priority.map_or(true, |p| t.priority == p))
            .collect();
        let ids = filtered.iter().map(|t| t.id).collect();
        self.renderer.render_tasks(&filtered, priority);
        ids
    }

    /// Routes an intent raised by a rendered row. Deletion only asks for
    /// confirmation, the caller resolves it through `resolve`.
    pub fn dispatch(&mut self, intent: Intent) -> Option<Confirm> {
        match intent {
            Intent::Toggle(id) => {
                self.toggle_status(id);
                None
            }
            Intent::Delete(id) => Some(Confirm::Delete(id)),
        }
    }

    pub fn resolve(&mut self, request: Confirm, answer: Answer) -> bool {
        match request {
            Confirm::Delete(id) => self.delete_task(id, answer),
            Confirm::ClearHistory => self.clear_history(answer),
        }
    }

    fn validate(&self, title: &str, priority: &str) -> Result<(), ValidationError> {
        if title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if !self.priorities.iter().any(|p| p == priority) {
            return Err(ValidationError::UnknownPriority(priority.to_string()));
        }
        Ok(())
    }

    // Millisecond timestamp, bumped when the clock has not moved on. Once
    // `last_id` is at the top of the range the lowest unused id is taken.
    fn next_id(&mut self) -> TaskId {
        let now = Utc::now().timestamp_millis();
        match self.last_id.checked_add(1) {
            Some(bumped) => {
                self.last_id = now.max(bumped);
                self.last_id
            }
            None => {
                let taken: HashSet<TaskId> =
                    self.tasks.iter().chain(&self.history).map(|t| t.id).collect();
                let id = (1..).find(|id| !taken.contains(id)).unwrap_or(0);
                warn!(id, "task ids exhausted, reusing the lowest free id");
                id
            }
        }
    }

    fn persist(&mut self) {
        if let Err(err) = self.persistence.save(&self.tasks, &self.history) {
            error!(error = %err, "could not save tasks");
        }
    }

    fn render_tasks(&mut self) {
        let all: Vec<&Task> = self.tasks.iter().collect();
        self.renderer.render_tasks(&all, None);
    }

    fn render_history(&mut self) {
        self.renderer.render_history(&self.history);
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
