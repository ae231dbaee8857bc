use std::fs::OpenOptions;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use crossterm::{event::{DisableMouseCapture, EnableMouseCapture}, execute, terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen}};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use tasks::{
    application::task_store::{TaskStore, TaskStoreImpl},
    client::{
        driver::{self, ClientEvent},
        keymap::{self, Action},
        state::UiState,
        theme::ThemeStore,
        view,
    },
    config::Config,
    domain::repository::TaskRepository,
    infrastructure::sqlite_repo::{prepare_sqlite_file, SqliteTaskRepository},
};

const RESYNC_PERIOD: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    // The terminal belongs to the UI, so logs only go to a file when asked for.
    if let Some(path) = &config.log_file {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    }

    prepare_sqlite_file(&config.database_url)?;
    let repo = SqliteTaskRepository::connect(&config.database_url).await?;
    repo.init().await?;
    let store = TaskStoreImpl::new(repo);

    // Theme is known before the first frame is drawn.
    let themes = ThemeStore::new(&config.theme_file);
    let state = UiState::new(themes.load());

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, store, themes, state).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    res
}

async fn run_app<S: TaskStore + Clone>(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>, store: S, themes: ThemeStore, mut state: UiState) -> Result<()> {
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();

    // Subscribe in the background so the loading indicator shows meanwhile.
    let feed = driver::spawn_snapshot_feed(&store, RESYNC_PERIOD, events_tx.clone());
    let resync = driver::spawn_resync(&store, RESYNC_PERIOD);
    let _input = driver::spawn_terminal_input(events_tx.clone());

    terminal.draw(|f| view::render(f, &state))?;
    while let Some(event) = events_rx.recv().await {
        match event {
            ClientEvent::Snapshot(snapshot) => { state.apply_snapshot(&snapshot); }
            ClientEvent::Finished { command, result } => state.command_finished(&command, &result),
            ClientEvent::FeedFailed(e) => state.feed_failed(&e),
            ClientEvent::Redraw => {}
            ClientEvent::Key(key) => match keymap::handle_key(&mut state, key) {
                Action::None => {}
                Action::Quit => break,
                Action::ToggleTheme => {
                    let theme = state.toggle_theme();
                    if let Err(e) = themes.save(theme) { tracing::warn!(error = %e, "could not persist theme"); }
                }
                Action::Dispatch(command) => { driver::spawn_command(&store, command, events_tx.clone()); }
            },
        }
        terminal.draw(|f| view::render(f, &state))?;
    }

    // Dropping the receiver also stops the input thread.
    feed.abort();
    resync.abort();
    Ok(())
}
