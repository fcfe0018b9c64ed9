use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::ExecutableCommand;
use crossterm::event::{
    DisableBracketedPaste, EnableBracketedPaste, EventStream, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use futures::StreamExt;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::info;

use crate::app::App;
use crate::views;

const TICK: Duration = Duration::from_millis(250);

/// Restores the terminal when dropped, including on early return or panic.
struct TerminalRestoreGuard;

impl TerminalRestoreGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let guard = Self;
        let mut stdout = io::stdout();
        stdout
            .execute(EnterAlternateScreen)
            .context("Failed to enter alternate screen")?;
        // Lets Shift+Enter arrive as a modified Enter where the terminal supports it.
        let _ = stdout.execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                | KeyboardEnhancementFlags::REPORT_ALTERNATE_KEYS,
        ));
        let _ = stdout.execute(EnableBracketedPaste);
        Ok(guard)
    }
}

impl Drop for TerminalRestoreGuard {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        let _ = stdout.execute(PopKeyboardEnhancementFlags);
        let _ = stdout.execute(DisableBracketedPaste);
        let _ = stdout.execute(LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}

/// Run the UI until the user quits.
pub async fn run(app: &mut App) -> Result<()> {
    let _guard = TerminalRestoreGuard::enter()?;
    let mut terminal: Terminal<CrosstermBackend<Stdout>> =
        Terminal::new(CrosstermBackend::new(io::stdout())).context("Failed to open terminal")?;

    let mut events = EventStream::new();
    let mut tick = tokio::time::interval(TICK);
    app.controller.initialize();

    loop {
        terminal
            .draw(|frame| views::render(frame, app))
            .context("Failed to draw")?;

        tokio::select! {
            event = events.next() => match event {
                Some(Ok(event)) => app.handle_event(event),
                Some(Err(e)) => return Err(e).context("Failed to read terminal event"),
                None => break,
            },
            Some(outcome) = app.controller.next_outcome() => app.apply(outcome),
            _ = tick.tick() => app.tick(),
        }

        if app.should_quit() {
            break;
        }
    }

    info!("Shutting down");
    Ok(())
}
