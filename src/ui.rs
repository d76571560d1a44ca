//! Interactive terminal session.
//!
//! [`run`] owns the terminal for the lifetime of the session: it checks that
//! standard input is a terminal device, enters raw mode and the alternate
//! screen, spawns the blocking input reader, and then drives the single
//! consumer loop — draw, await the next input event, update the session —
//! until the exit flag is set or the input channel closes.

pub mod render;
pub mod session;
pub mod theme;

pub use session::{Mode, Session};
pub use theme::ColorTheme;

use crate::error::{JlvError, Result};
use crate::input::{self, InputEvent, INPUT_QUEUE_DEPTH};
use crate::view::FileView;
use ratatui::backend::CrosstermBackend;
use ratatui::crossterm::execute;
use ratatui::crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::crossterm::tty::IsTty;
use ratatui::Terminal;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Take over the terminal and run the session on `view` until the user
/// exits. Fails up-front with a terminal error when standard input is not an
/// interactive terminal, so the caller can fall back to a plain dump.
pub async fn run(view: FileView) -> Result<()> {
    if !io::stdin().is_tty() {
        return Err(JlvError::terminal("standard input is not a terminal"));
    }
    enable_raw_mode().map_err(|e| JlvError::terminal(e.to_string()))?;
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(JlvError::terminal(e.to_string()));
    }
    let mut terminal = match Terminal::new(CrosstermBackend::new(stdout)) {
        Ok(terminal) => terminal,
        Err(e) => {
            restore_terminal();
            return Err(JlvError::terminal(e.to_string()));
        }
    };

    let (width, height) = ratatui::crossterm::terminal::size().unwrap_or((80, 24));
    let mut session = Session::new(view, width, height);
    let theme = ColorTheme::default();

    let (tx, mut rx) = mpsc::channel(INPUT_QUEUE_DEPTH);
    let shutdown = Arc::new(AtomicBool::new(false));
    let reader = input::spawn_input_thread(tx, Arc::clone(&shutdown));

    let result = loop {
        session.poll_file_error();
        if let Err(e) = terminal.draw(|frame| render::draw(frame, &session, &theme)) {
            break Err(e.into());
        }
        match rx.recv().await {
            Some(InputEvent::Term(event)) => session.handle_event(&event),
            Some(InputEvent::Closed) | None => break Err(JlvError::InputClosed),
        }
        if session.should_exit() {
            break Ok(());
        }
    };

    shutdown.store(true, Ordering::SeqCst);
    restore_terminal();
    let _ = reader.join();
    result
}

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}
