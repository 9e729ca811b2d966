//! What the task list hands to the screen, and what the screen hands back.

use crate::models::{Status, Task, TaskId};

/// User intents an active row can raise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
    Toggle(TaskId),
    Delete(TaskId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A fire-once message for the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub text: String,
}

impl Notice {
    pub fn success(title: &str, text: &str) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: title.to_string(),
            text: text.to_string(),
        }
    }

    pub fn error(title: &str, text: &str) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.to_string(),
            text: text.to_string(),
        }
    }
}

/// Every call replaces the whole view it targets.
pub trait Renderer {
    fn render_tasks(&mut self, tasks: &[&Task], filter: Option<&str>);
    fn render_history(&mut self, history: &[Task]);
    fn notify(&mut self, notice: Notice);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskRow {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub priority: String,
    pub date: String,
    pub status: Status,
}

impl TaskRow {
    fn from_task(task: &Task) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            description: task.description.clone(),
            priority: task.priority.clone(),
            date: task.date.clone(),
            status: task.status,
        }
    }

    pub fn toggle_intent(&self) -> Intent {
        Intent::Toggle(self.id)
    }

    pub fn delete_intent(&self) -> Intent {
        Intent::Delete(self.id)
    }
}

// History rows are read-only and carry no status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryRow {
    pub title: String,
    pub description: String,
    pub priority: String,
    pub date: String,
}

/// View model the terminal UI draws from.
#[derive(Debug, Default)]
pub struct Board {
    pub tasks: Vec<TaskRow>,
    pub history: Vec<HistoryRow>,
    pub filter: Option<String>,
    pub notice: Option<Notice>,
}

impl Board {
    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }
}

impl Renderer for Board {
    fn render_tasks(&mut self, tasks: &[&Task], filter: Option<&str>) {
        self.tasks = tasks.iter().map(|task| TaskRow::from_task(task)).collect();
        self.filter = filter.map(str::to_string);
    }

    fn render_history(&mut self, history: &[Task]) {
        self.history = history
            .iter()
            .map(|task| HistoryRow {
                title: format!("{} (Deleted)", task.title),
                description: task.description.clone(),
                priority: task.priority.clone(),
                date: task.date.clone(),
            })
            .collect();
    }

    fn notify(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }
}
