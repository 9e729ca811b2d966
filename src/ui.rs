use crate::app::{ActiveInput, App, Focus, InputMode};
use crate::models::Status;
use crate::store::Storage;
use crate::view::{NoticeLevel, TaskRow};
use crossterm::event::{self, Event as CEvent};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;

fn centered_rect_absolute(width: u16, height: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length((r.height.saturating_sub(height)) / 2),
                Constraint::Length(height),
                Constraint::Length((r.height.saturating_sub(height) + 1) / 2),
            ]
            .as_ref(),
        )
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Length((r.width.saturating_sub(width)) / 2),
                Constraint::Length(width),
                Constraint::Length((r.width.saturating_sub(width) + 1) / 2),
            ]
            .as_ref(),
        )
        .split(popup_layout[1])[1]
}

fn priority_color(priority: &str) -> Color {
    match priority.to_lowercase().as_str() {
        "high" => Color::Red,
        "medium" => Color::Yellow,
        "low" => Color::Green,
        _ => Color::White,
    }
}

fn key(label: &str) -> Span<'static> {
    Span::styled(format!(" {label} "), Style::default().fg(Color::Red))
}

fn get_legend(input_mode: InputMode) -> Text<'static> {
    match input_mode {
        InputMode::Normal => Text::from(Line::from(vec![
            key("q"),
            Span::raw(": Quit "),
            key("j/k"),
            Span::raw(": Move "),
            key("Tab"),
            Span::raw(": Switch List "),
            key("a"),
            Span::raw(": Add Task "),
            key("Space"),
            Span::raw(": Toggle "),
            key("d"),
            Span::raw(": Delete "),
            key("f"),
            Span::raw(": Filter "),
            key("c"),
            Span::raw(": Clear History "),
        ])),
        InputMode::Editing => Text::from(Line::from(vec![
            key("i"),
            Span::raw(": Type "),
            key("Tab"),
            Span::raw(": Next Field "),
            key("p"),
            Span::raw(": Priority "),
            key("Enter"),
            Span::raw(": Submit "),
            key("Esc"),
            Span::raw(": Cancel "),
        ])),
        InputMode::Insert => Text::from(Line::from(vec![
            key("Enter"),
            Span::raw(": Submit "),
            key("Esc"),
            Span::raw(": Stop Typing "),
        ])),
    }
}

fn task_item(row: &TaskRow) -> ListItem<'static> {
    let mut style = Style::default().fg(priority_color(&row.priority));
    if row.status == Status::Completed {
        style = style
            .fg(Color::DarkGray)
            .add_modifier(Modifier::CROSSED_OUT);
    }

    let content = vec![
        Span::styled(
            format!("[{}] ", row.priority),
            Style::default().fg(priority_color(&row.priority)),
        ),
        Span::styled(row.title.clone(), style),
        Span::styled(
            format!("  {}", row.date),
            Style::default().fg(Color::DarkGray),
        ),
    ];
    ListItem::new(Line::from(content))
}

fn bold(label: &'static str) -> Span<'static> {
    Span::styled(label, Style::default().add_modifier(Modifier::BOLD))
}

fn draw_detail(f: &mut Frame, row: Option<&TaskRow>, area: Rect) {
    let detail_block = Block::default().borders(Borders::ALL).title("Task Details");

    let Some(row) = row else {
        let paragraph = Paragraph::new("No task selected")
            .block(detail_block)
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
        return;
    };

    let description = if row.description.is_empty() {
        "No description".to_string()
    } else {
        row.description.clone()
    };

    let lines = vec![
        Line::from(bold_title(&row.title)),
        Line::from(vec![bold("Date: "), Span::raw(row.date.clone())]),
        Line::from(vec![
            bold("Priority: "),
            Span::styled(
                row.priority.clone(),
                Style::default().fg(priority_color(&row.priority)),
            ),
        ]),
        Line::from(vec![bold("Status: "), Span::raw(row.status.label())]),
        Line::from(vec![bold("Description: ")]),
        Line::from(Span::raw(description)),
        Line::from(""),
        Line::from(vec![
            key("Space"),
            Span::raw(row.status.action_label()),
            key("d"),
            Span::raw("Delete"),
        ]),
    ];

    let paragraph = Paragraph::new(lines)
        .block(detail_block)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn bold_title(title: &str) -> Span<'static> {
    Span::styled(
        title.to_string(),
        Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
    )
}

fn pane_block(title: String, focused: bool) -> Block<'static> {
    let style = if focused {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(title)
}

fn draw_form<S: Storage>(f: &mut Frame, app: &App<S>, body: Rect) {
    let popup_width = ((u32::from(body.width) * 60 / 100) as u16).max(20);
    let inner_width = popup_width.saturating_sub(2).max(1);

    let title_lines = calculate_wrapped_lines(&app.new_task_title, inner_width).max(1) as u16;
    let description_lines =
        calculate_wrapped_lines(&app.new_task_description, inner_width).max(1) as u16;
    let popup_height = (title_lines + description_lines + 1 + 6 + 2).min(body.height);

    let popup_area = centered_rect_absolute(popup_width, popup_height, body);
    f.render_widget(Clear, popup_area);

    let heading = if app.input_mode == InputMode::Insert {
        "New Task (typing)"
    } else {
        "New Task (Press Enter to Submit)"
    };
    let outer = Block::default()
        .title(heading)
        .borders(Borders::ALL)
        .style(Style::default().fg(Color::Green));
    let inner = outer.inner(popup_area);
    f.render_widget(outer, popup_area);

    let fields = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(title_lines + 2),
            Constraint::Length(description_lines + 2),
            Constraint::Length(3),
        ])
        .split(inner);

    let field = |label: &'static str, which: ActiveInput| {
        let style = if app.active_input == which {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::White)
        };
        Block::default()
            .borders(Borders::ALL)
            .title(label)
            .border_style(style)
    };

    let title = Paragraph::new(app.new_task_title.as_str())
        .block(field("Title", ActiveInput::Title))
        .wrap(Wrap { trim: false });
    let description = Paragraph::new(app.new_task_description.as_str())
        .block(field("Description", ActiveInput::Description))
        .wrap(Wrap { trim: false });
    let priority = Paragraph::new(Span::styled(
        app.new_task_priority.clone(),
        Style::default().fg(priority_color(&app.new_task_priority)),
    ))
    .block(field("Priority", ActiveInput::Priority));

    f.render_widget(title, fields[0]);
    f.render_widget(description, fields[1]);
    f.render_widget(priority, fields[2]);
}

fn footer_line<S: Storage>(app: &App<S>) -> Line<'static> {
    if let Some(request) = app.pending {
        return Line::from(vec![
            Span::styled(
                format!("{} ", request.title()),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("{} ", request.text())),
            key("y"),
            Span::raw(request.confirm_label()),
            key("n"),
            Span::raw("Cancel"),
        ]);
    }

    match &app.notice {
        Some(notice) => {
            let color = match notice.level {
                NoticeLevel::Success => Color::Green,
                NoticeLevel::Error => Color::Red,
            };
            Line::from(vec![
                Span::styled(
                    format!("{} ", notice.title),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::raw(notice.text.clone()),
            ])
        }
        None => Line::from(""),
    }
}

pub fn draw<S: Storage>(f: &mut Frame, app: &mut App<S>) {
    let size = f.area();

    // Split the main layout into body and footer
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([Constraint::Min(0), Constraint::Length(3)].as_ref())
        .split(size);

    let body_chunk = chunks[0];
    let footer_chunk = chunks[1];

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)].as_ref())
        .split(body_chunk);
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
        .split(columns[1]);

    let board = app.list.renderer();
    let task_title = match &board.filter {
        Some(priority) => format!(
            "Tasks ({priority}) {}/{}",
            board.tasks.len(),
            app.list.tasks().len()
        ),
        None => "Tasks (All)".to_string(),
    };
    let tasks_block = pane_block(task_title, app.focus == Focus::Tasks);

    // Left panel: active tasks
    let tasks_widget = if !board.tasks.is_empty() {
        let items: Vec<ListItem> = board.tasks.iter().map(task_item).collect();
        List::new(items)
            .block(tasks_block)
            .highlight_style(Style::default().add_modifier(Modifier::BOLD))
            .highlight_symbol(">> ")
    } else {
        List::new(vec![ListItem::new("No tasks")]).block(tasks_block)
    };

    let history_title = format!("History ({})", app.list.history().len());
    let history_block = pane_block(history_title, app.focus == Focus::History);
    let history_widget = if !board.history.is_empty() {
        let items: Vec<ListItem> = board
            .history
            .iter()
            .map(|row| {
                let mut lines = vec![Line::from(vec![
                    Span::styled(
                        format!("[{}] ", row.priority),
                        Style::default().fg(priority_color(&row.priority)),
                    ),
                    Span::styled(row.title.clone(), Style::default().fg(Color::DarkGray)),
                    Span::styled(
                        format!("  {}", row.date),
                        Style::default().fg(Color::DarkGray),
                    ),
                ])];
                if !row.description.is_empty() {
                    lines.push(Line::from(Span::styled(
                        format!("    {}", row.description),
                        Style::default().fg(Color::DarkGray),
                    )));
                }
                ListItem::new(lines)
            })
            .collect();
        List::new(items)
            .block(history_block)
            .highlight_style(Style::default().add_modifier(Modifier::BOLD))
            .highlight_symbol(">> ")
    } else {
        List::new(vec![ListItem::new("History is empty")]).block(history_block)
    };

    let selected = app
        .selected_id()
        .and_then(|id| board.tasks.iter().find(|row| row.id == id))
        .cloned();

    f.render_stateful_widget(tasks_widget, columns[0], &mut app.state);
    draw_detail(f, selected.as_ref(), right[0]);
    f.render_stateful_widget(history_widget, right[1], &mut app.history_state);

    if app.input_mode != InputMode::Normal {
        draw_form(f, app, body_chunk);
    }

    // Notice or pending confirmation, then the legend
    let footer = Paragraph::new(Text::from(footer_line(app)))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true });
    let legend = Paragraph::new(get_legend(app.input_mode))
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true });

    let footer_rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)].as_ref())
        .split(footer_chunk);
    f.render_widget(footer, footer_rows[0]);
    f.render_widget(legend, footer_rows[1]);
}

pub fn run_app<B: Backend, S: Storage>(
    terminal: &mut Terminal<B>,
    mut app: App<S>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| draw(f, &mut app))?;

        // Handle input
        if event::poll(Duration::from_millis(100))? {
            if let CEvent::Key(key) = event::read()? {
                if app.handle_input(key) {
                    return Ok(());
                }
            }
        }
    }
}

fn calculate_wrapped_lines(text: &str, max_width: u16) -> usize {
    let mut line_count = 0;
    for line in text.lines() {
        let line_width = line.chars().count() as u16;
        line_count += line_width.div_ceil(max_width) as usize;
    }
    line_count
}
