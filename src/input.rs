//! Raw terminal input collection.
//!
//! Exactly one blocking reader thread polls crossterm for events and forwards
//! them, in order, into a bounded channel. The session loop is the only
//! consumer and the only place that touches view or file state; the reader
//! never does. A read failure pushes the [`InputEvent::Closed`] sentinel and
//! terminates the thread — the session treats it as fatal.

use ratatui::crossterm::event::{self, Event};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc::Sender;

/// Depth of the input queue between the reader thread and the session loop.
pub const INPUT_QUEUE_DEPTH: usize = 256;

/// How long each poll blocks before re-checking the shutdown flag.
const POLL_INTERVAL_MS: u64 = 50;

/// Events delivered to the session loop.
#[derive(Debug)]
pub enum InputEvent {
    /// A terminal event (key press, resize, ...).
    Term(Event),
    /// The input device failed or closed; the session must exit.
    Closed,
}

/// Spawn the blocking reader thread. It runs until the shutdown flag is set,
/// the channel is dropped, or the device read fails.
pub fn spawn_input_thread(
    tx: Sender<InputEvent>,
    shutdown: Arc<AtomicBool>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        while !shutdown.load(Ordering::SeqCst) {
            match event::poll(Duration::from_millis(POLL_INTERVAL_MS)) {
                Ok(false) => continue,
                Ok(true) => match event::read() {
                    Ok(ev) => {
                        if tx.blocking_send(InputEvent::Term(ev)).is_err() {
                            break;
                        }
                    }
                    Err(_) => {
                        let _ = tx.blocking_send(InputEvent::Closed);
                        break;
                    }
                },
                Err(_) => {
                    let _ = tx.blocking_send(InputEvent::Closed);
                    break;
                }
            }
        }
    })
}
