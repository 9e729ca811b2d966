use crate::models::TaskId;
use crate::parser::parse_task_input;
use crate::store::{FileStorage, Storage};
use crate::tasklist::{Answer, Confirm, TaskList};
use crate::view::{Board, Intent, Notice};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::widgets::ListState;
use tracing::debug;

pub struct App<S = FileStorage> {
    pub list: TaskList<S, Board>,
    pub state: ListState,
    pub history_state: ListState,
    pub focus: Focus,
    pub input_mode: InputMode,
    pub active_input: ActiveInput,
    pub new_task_title: String,
    pub new_task_description: String,
    pub new_task_priority: String,
    pub default_priority: String,
    pub pending: Option<Confirm>,
    pub notice: Option<Notice>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
    Insert,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActiveInput {
    Title,
    Description,
    Priority,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
    Tasks,
    History,
}

impl<S: Storage> App<S> {
    pub fn new(list: TaskList<S, Board>, default_priority: &str) -> App<S> {
        let mut app = App {
            list,
            state: ListState::default(),
            history_state: ListState::default(),
            focus: Focus::Tasks,
            input_mode: InputMode::Normal,
            active_input: ActiveInput::Title,
            new_task_title: String::new(),
            new_task_description: String::new(),
            new_task_priority: default_priority.to_string(),
            default_priority: default_priority.to_string(),
            pending: None,
            notice: None,
        };
        app.sync();
        app
    }

    pub fn board(&self) -> &Board {
        self.list.renderer()
    }

    pub fn selected_id(&self) -> Option<TaskId> {
        self.state
            .selected()
            .and_then(|i| self.board().tasks.get(i))
            .map(|row| row.id)
    }

    /// Picks up a fresh notice and keeps the selections inside their lists.
    fn sync(&mut self) {
        if let Some(notice) = self.list.renderer_mut().take_notice() {
            self.notice = Some(notice);
        }
        let tasks = self.board().tasks.len();
        let history = self.board().history.len();
        clamp_selection(&mut self.state, tasks);
        clamp_selection(&mut self.history_state, history);
    }

    pub fn next(&mut self) {
        let (state, len) = self.focused();
        if len == 0 {
            return;
        }
        let i = match state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let (state, len) = self.focused();
        if len == 0 {
            return;
        }
        let i = match state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        state.select(Some(i));
    }

    fn focused(&mut self) -> (&mut ListState, usize) {
        let board = self.list.renderer();
        match self.focus {
            Focus::Tasks => (&mut self.state, board.tasks.len()),
            Focus::History => (&mut self.history_state, board.history.len()),
        }
    }

    /// Moves the active view to the next priority filter: all, then each priority in order.
    pub fn cycle_filter(&mut self) {
        let priorities = self.list.priorities();
        let next = match &self.board().filter {
            None => priorities.first().cloned(),
            Some(current) => priorities
                .iter()
                .position(|p| p == current)
                .and_then(|i| priorities.get(i + 1))
                .cloned(),
        };
        self.list.filter_by_priority(next.as_deref());
        self.state.select(None);
        self.sync();
    }

    fn cycle_form_priority(&mut self) {
        let priorities = self.list.priorities();
        let i = priorities
            .iter()
            .position(|p| *p == self.new_task_priority)
            .map_or(0, |i| (i + 1) % priorities.len());
        if let Some(p) = priorities.get(i) {
            self.new_task_priority = p.clone();
        }
    }

    /// Opens a confirmation prompt. An open prompt has to be answered first,
    /// later requests are dropped until then.
    fn request(&mut self, confirm: Confirm) {
        match self.pending {
            Some(open) => debug!(?open, ignored = ?confirm, "a prompt is already open"),
            None => self.pending = Some(confirm),
        }
    }

    fn answer(&mut self, answer: Answer) {
        if let Some(request) = self.pending.take() {
            self.list.resolve(request, answer);
            self.sync();
        }
    }

    fn submit_task(&mut self) {
        let parsed = parse_task_input(&self.new_task_title, self.list.priorities());
        let priority = parsed
            .priority
            .unwrap_or_else(|| self.new_task_priority.clone());

        let added = self
            .list
            .add_task(&parsed.title, &self.new_task_description, &priority);
        self.sync();

        // A rejected task keeps the form open so the title can be fixed.
        if added.is_ok() {
            self.reset_form();
            self.input_mode = InputMode::Normal;
        }
    }

    fn reset_form(&mut self) {
        self.new_task_title.clear();
        self.new_task_description.clear();
        self.new_task_priority = self.default_priority.clone();
        self.active_input = ActiveInput::Title;
    }

    /// Returns `true` when the app should quit.
    pub fn handle_input(&mut self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return false;
        }

        match self.input_mode {
            InputMode::Normal => {
                self.notice = None;
                match key.code {
                    KeyCode::Char('q') => return true,
                    KeyCode::Char('j') | KeyCode::Down => self.next(),
                    KeyCode::Char('k') | KeyCode::Up => self.previous(),
                    KeyCode::Tab => {
                        self.focus = match self.focus {
                            Focus::Tasks => Focus::History,
                            Focus::History => Focus::Tasks,
                        };
                    }
                    KeyCode::Char('a') => {
                        self.reset_form();
                        self.input_mode = InputMode::Editing;
                    }
                    KeyCode::Char(' ') | KeyCode::Enter => {
                        if let Some(intent) = self.selected_row_intent(true) {
                            self.list.dispatch(intent);
                            self.sync();
                        }
                    }
                    KeyCode::Char('d') => {
                        if let Some(intent) = self.selected_row_intent(false) {
                            if let Some(confirm) = self.list.dispatch(intent) {
                                self.request(confirm);
                            }
                        }
                    }
                    KeyCode::Char('c') => self.request(Confirm::ClearHistory),
                    KeyCode::Char('f') => self.cycle_filter(),
                    KeyCode::Char('y') => self.answer(Answer::Confirmed),
                    KeyCode::Char('n') | KeyCode::Esc => self.answer(Answer::Dismissed),
                    _ => {}
                }
            }

            InputMode::Editing => match key.code {
                KeyCode::Char('i') => {
                    if self.active_input == ActiveInput::Priority {
                        self.cycle_form_priority();
                    } else {
                        self.input_mode = InputMode::Insert;
                    }
                }
                KeyCode::Char('p') => self.cycle_form_priority(),
                KeyCode::Tab => {
                    self.active_input = match self.active_input {
                        ActiveInput::Title => ActiveInput::Description,
                        ActiveInput::Description => ActiveInput::Priority,
                        ActiveInput::Priority => ActiveInput::Title,
                    };
                }
                KeyCode::Enter => self.submit_task(),
                KeyCode::Esc => {
                    self.reset_form();
                    self.input_mode = InputMode::Normal;
                }
                _ => {}
            },
            InputMode::Insert => match key.code {
                KeyCode::Char(c) => match self.active_input {
                    ActiveInput::Title => self.new_task_title.push(c),
                    ActiveInput::Description => self.new_task_description.push(c),
                    ActiveInput::Priority => {}
                },
                KeyCode::Backspace => match self.active_input {
                    ActiveInput::Title => {
                        self.new_task_title.pop();
                    }
                    ActiveInput::Description => {
                        self.new_task_description.pop();
                    }
                    ActiveInput::Priority => {}
                },
                KeyCode::Enter => {
                    self.input_mode = InputMode::Editing;
                    self.submit_task();
                }
                KeyCode::Esc => {
                    self.input_mode = InputMode::Editing;
                }
                _ => {}
            },
        }
        false
    }

    // Only active rows raise intents; history is read-only.
    fn selected_row_intent(&self, toggle: bool) -> Option<Intent> {
        if self.focus != Focus::Tasks {
            return None;
        }
        let row = self.state.selected().and_then(|i| self.board().tasks.get(i))?;
        Some(if toggle {
            row.toggle_intent()
        } else {
            row.delete_intent()
        })
    }
}

fn clamp_selection(state: &mut ListState, len: usize) {
    match state.selected() {
        _ if len == 0 => state.select(None),
        None => state.select(Some(0)),
        Some(i) if i >= len => state.select(Some(len - 1)),
        Some(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Status;
    use crate::store::MemoryStorage;
    use crossterm::event::KeyModifiers;

    fn app() -> App<MemoryStorage> {
        let list = TaskList::new(
            MemoryStorage::default(),
            Board::default(),
            vec!["High".into(), "Medium".into(), "Low".into()],
            "%d/%m/%Y",
        );
        App::new(list, "Medium")
    }

    fn press(app: &mut App<MemoryStorage>, code: KeyCode) -> bool {
        app.handle_input(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_str(app: &mut App<MemoryStorage>, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn add(app: &mut App<MemoryStorage>, title: &str) {
        press(app, KeyCode::Char('a'));
        press(app, KeyCode::Char('i'));
        type_str(app, title);
        press(app, KeyCode::Esc);
        press(app, KeyCode::Enter);
    }

    #[test]
    fn test_add_task_through_the_form() {
        let mut app = app();
        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.input_mode, InputMode::Editing);

        press(&mut app, KeyCode::Char('i'));
        type_str(&mut app, "Buy milk");
        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char('i'));
        type_str(&mut app, "2%");
        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char('p'));
        assert_eq!(app.new_task_priority, "Low");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.input_mode, InputMode::Normal);
        let task = &app.list.tasks()[0];
        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.description, "2%");
        assert_eq!(task.priority, "Low");
        assert_eq!(app.notice.as_ref().unwrap().title, "Task added!");
        assert_eq!(app.state.selected(), Some(0));
    }

    #[test]
    fn test_quick_add_marker_sets_priority() {
        let mut app = app();
        add(&mut app, "Call the bank !high");
        assert_eq!(app.list.tasks()[0].title, "Call the bank");
        assert_eq!(app.list.tasks()[0].priority, "High");
    }

    #[test]
    fn test_empty_title_keeps_the_form_open() {
        let mut app = app();
        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.input_mode, InputMode::Editing);
        assert!(app.list.tasks().is_empty());
        assert_eq!(app.notice.as_ref().unwrap().title, "Oops!");
    }

    #[test]
    fn test_toggle_selected_task() {
        let mut app = app();
        add(&mut app, "Flip me");
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.list.tasks()[0].status, Status::Completed);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.list.tasks()[0].status, Status::Pending);
    }

    #[test]
    fn test_delete_waits_for_confirmation() {
        let mut app = app();
        add(&mut app, "First");
        add(&mut app, "Second");

        press(&mut app, KeyCode::Char('d'));
        assert!(matches!(app.pending, Some(Confirm::Delete(_))));
        assert_eq!(app.list.tasks().len(), 2);

        // Other actions keep working while the prompt is open.
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.list.tasks()[1].status, Status::Completed);
        assert_eq!(app.list.tasks().len(), 2);

        press(&mut app, KeyCode::Char('y'));
        assert!(app.pending.is_none());
        assert_eq!(app.list.tasks().len(), 1);
        assert_eq!(app.list.tasks()[0].title, "Second");
        assert_eq!(app.list.history()[0].title, "First");
        assert_eq!(app.history_state.selected(), Some(0));
    }

    #[test]
    fn test_dismissed_prompt_changes_nothing() {
        let mut app = app();
        add(&mut app, "Keep");
        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('n'));

        assert!(app.pending.is_none());
        assert_eq!(app.list.tasks().len(), 1);

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.list.tasks().len(), 1);
    }

    #[test]
    fn test_open_prompt_is_not_replaced() {
        let mut app = app();
        add(&mut app, "Gone");
        add(&mut app, "Older");
        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));

        press(&mut app, KeyCode::Char('d'));
        let open = app.pending;
        assert!(matches!(open, Some(Confirm::Delete(_))));

        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.pending, open);

        press(&mut app, KeyCode::Char('y'));
        assert!(app.list.tasks().is_empty());
        assert_eq!(app.list.history().len(), 2);
    }

    #[test]
    fn test_clear_history_flow() {
        let mut app = app();
        add(&mut app, "Gone");
        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(app.list.history().len(), 1);

        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.pending, Some(Confirm::ClearHistory));
        press(&mut app, KeyCode::Char('y'));
        assert!(app.list.history().is_empty());
        assert_eq!(app.history_state.selected(), None);
    }

    #[test]
    fn test_history_rows_raise_no_intents() {
        let mut app = app();
        add(&mut app, "Gone");
        add(&mut app, "Stays");
        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));

        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Char('d'));
        assert!(app.pending.is_none());
        assert_eq!(app.list.tasks()[0].status, Status::Pending);
    }

    #[test]
    fn test_filter_cycles_through_priorities() {
        let mut app = app();
        add(&mut app, "a !high");
        add(&mut app, "b !low");
        add(&mut app, "c !high");

        press(&mut app, KeyCode::Char('f'));
        assert_eq!(app.board().filter.as_deref(), Some("High"));
        assert_eq!(app.board().tasks.len(), 2);

        press(&mut app, KeyCode::Char('f'));
        assert_eq!(app.board().filter.as_deref(), Some("Medium"));
        assert!(app.board().tasks.is_empty());
        assert_eq!(app.selected_id(), None);

        press(&mut app, KeyCode::Char('f'));
        press(&mut app, KeyCode::Char('f'));
        assert_eq!(app.board().filter, None);
        assert_eq!(app.board().tasks.len(), 3);
        assert_eq!(app.list.tasks().len(), 3);
    }

    #[test]
    fn test_quit() {
        let mut app = app();
        assert!(press(&mut app, KeyCode::Char('q')));
    }
}
