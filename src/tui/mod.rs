//! Terminal front end for the modal stack using ratatui

mod app;
pub mod keys;
pub mod layer;
pub mod presenter;

pub use app::{demo_dialogs, App, WizardStep};
pub use keys::{parse_key, KeyAction, KeyMap};
pub use layer::{DialogLayer, LayerStack};
pub use presenter::{ModalTheme, TerminalPresenter};

use anyhow::Result;
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io;
use std::time::Duration;

use crate::config::ModalSettings;

pub type Backend = CrosstermBackend<io::Stdout>;

/// How long to wait for input before redrawing
const FRAME_INTERVAL: Duration = Duration::from_millis(50);

/// Initialize the terminal for TUI mode
pub fn init_terminal() -> Result<Terminal<Backend>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to normal mode
pub fn restore_terminal(terminal: &mut Terminal<Backend>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Run the interactive demo until it is quit or every dialog is closed
pub async fn run(settings: ModalSettings) -> Result<()> {
    let mut app = App::new(settings)?;
    let mut terminal = init_terminal()?;

    let result = run_app(&mut terminal, &mut app).await;

    restore_terminal(&mut terminal)?;
    result
}

async fn run_app(terminal: &mut Terminal<Backend>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|frame| app.render(frame))?;

        if let Some(event) = next_event().await? {
            if app.handle_event(event)? {
                break;
            }
        }

        if app.update()? {
            break;
        }
    }
    Ok(())
}

async fn next_event() -> Result<Option<event::Event>> {
    let event = tokio::task::spawn_blocking(|| -> io::Result<Option<event::Event>> {
        if event::poll(FRAME_INTERVAL)? {
            event::read().map(Some)
        } else {
            Ok(None)
        }
    })
    .await??;
    Ok(event)
}
