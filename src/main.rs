// main.rs

mod api;
mod app;
mod config;
mod error;
mod models;
mod parser;
mod store;
mod tasklist;
mod ui;
mod view;

use api::{BootstrapLoader, BootstrapSource};
use app::App;
use config::Config;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use dotenv::dotenv;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::{self, OpenOptions};
use std::io;
use std::sync::Mutex;
use store::FileStorage;
use tasklist::TaskList;
use tracing::info;
use tracing_subscriber::EnvFilter;
use view::Board;

// The terminal belongs to the UI, so logs go to a file in the data directory.
fn init_logging(config: &Config) -> io::Result<()> {
    let path = config.log_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let filter = EnvFilter::try_from_env("TASKLIST_LOG")
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::load()?;
    init_logging(&config)?;

    let data_dir = config.data_dir();
    info!(data_dir = %data_dir.display(), "starting tasklist");

    let mut list = TaskList::new(
        FileStorage::new(data_dir),
        Board::default(),
        config.priorities.clone(),
        &config.date_format,
    );
    let loader = BootstrapLoader::new(config.bootstrap.as_deref().map(BootstrapSource::parse));
    list.initialize(&loader).await;

    // Setup terminal UI
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    terminal.hide_cursor()?;

    let app = App::new(list, &config.default_priority);

    let res = ui::run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}
