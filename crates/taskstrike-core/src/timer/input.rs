//! Non-blocking character input.
//!
//! Terminal input runs in raw mode via crossterm so single keys arrive
//! without a newline; Ctrl-C then shows up as a key event and is mapped to
//! [`Key::Interrupt`]. When stdin is not a terminal, or raw mode cannot be
//! enabled, the source degrades to "no input ever". Source failures are
//! never fatal.

use std::io::IsTerminal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use tracing::{debug, info};

use super::decision::{Decision, DecisionCell};

/// Poll bound for the background listener and the prompt protocol.
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A single keyboard response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    /// Ctrl-C pressed while the terminal is in raw mode.
    Interrupt,
}

/// Non-blocking single-key source.
pub trait KeySource: Send {
    /// Wait up to `timeout` for one key. `None` means no input was
    /// available; source failures are reported the same way.
    fn poll_key(&mut self, timeout: Duration) -> Option<Key>;
}

/// Shared handle serializing source access between the listener thread and
/// the prompt protocol.
pub type SharedKeySource = Arc<Mutex<Box<dyn KeySource>>>;

pub fn shared(source: Box<dyn KeySource>) -> SharedKeySource {
    Arc::new(Mutex::new(source))
}

/// Open the best source for the current environment.
pub fn open_source() -> Box<dyn KeySource> {
    match TerminalKeys::open() {
        Some(keys) => Box::new(keys),
        None => {
            debug!("no interactive terminal, keyboard input disabled");
            Box::new(NullKeys)
        }
    }
}

/// Crossterm-backed terminal keys. Raw mode is held for the source lifetime.
pub struct TerminalKeys {
    _private: (),
}

impl TerminalKeys {
    /// Enable raw mode on the controlling terminal, if there is one.
    pub fn open() -> Option<Self> {
        if !std::io::stdin().is_terminal() {
            return None;
        }
        crossterm::terminal::enable_raw_mode().ok()?;
        Some(Self { _private: () })
    }
}

impl KeySource for TerminalKeys {
    fn poll_key(&mut self, timeout: Duration) -> Option<Key> {
        match event::poll(timeout) {
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => match key.code {
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        Some(Key::Interrupt)
                    }
                    KeyCode::Char(c) => Some(Key::Char(c.to_ascii_lowercase())),
                    _ => None,
                },
                Ok(_) => None,
                Err(e) => {
                    debug!("input read failed: {e}");
                    None
                }
            },
            Ok(false) => None,
            Err(e) => {
                debug!("input poll failed: {e}");
                None
            }
        }
    }
}

impl Drop for TerminalKeys {
    fn drop(&mut self) {
        let _ = crossterm::terminal::disable_raw_mode();
    }
}

/// Headless fallback: always reports "no input".
pub struct NullKeys;

impl KeySource for NullKeys {
    fn poll_key(&mut self, timeout: Duration) -> Option<Key> {
        std::thread::sleep(timeout);
        None
    }
}

/// Background listener loop.
///
/// Publishes the first valid `y`/`n`/`c` response into the cell, then
/// disarms; after that it only forwards interrupt keys until stopped. While
/// a prompt is active the source belongs to the prompt and the listener
/// stays off it.
pub fn run_listener(source: SharedKeySource, cell: Arc<DecisionCell>, interrupt: Arc<AtomicBool>) {
    let mut armed = true;
    while !cell.is_stopped() {
        if armed && (cell.is_resolved() || cell.continue_requested()) {
            armed = false;
        }
        if cell.prompt_active() {
            std::thread::sleep(POLL_INTERVAL);
            continue;
        }
        let key = {
            let mut src = source.lock().unwrap_or_else(|e| e.into_inner());
            src.poll_key(POLL_INTERVAL)
        };
        let Some(key) = key else { continue };
        match key {
            Key::Interrupt => interrupt.store(true, Ordering::SeqCst),
            Key::Char(c) if armed => match c.to_ascii_lowercase() {
                'y' => {
                    cell.try_resolve(Decision::Finished);
                    armed = false;
                }
                'n' => {
                    cell.try_resolve(Decision::NotFinished);
                    armed = false;
                }
                'c' => {
                    if cell.request_continue() {
                        info!("continuation requested, countdown will keep running");
                    }
                    armed = false;
                }
                _ => {}
            },
            Key::Char(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::testing::ScriptedKeys;
    use std::time::Instant;

    fn spawn_listener(
        script: Vec<Key>,
        then: Option<Key>,
    ) -> (Arc<DecisionCell>, Arc<AtomicBool>, std::thread::JoinHandle<()>) {
        let cell = Arc::new(DecisionCell::new());
        let interrupt = Arc::new(AtomicBool::new(false));
        let source = shared(Box::new(ScriptedKeys::new(script, then)));
        let handle = {
            let cell = Arc::clone(&cell);
            let interrupt = Arc::clone(&interrupt);
            std::thread::spawn(move || run_listener(source, cell, interrupt))
        };
        (cell, interrupt, handle)
    }

    fn wait_until(deadline_ms: u64, mut check: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_millis(deadline_ms);
        while Instant::now() < deadline {
            if check() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        false
    }

    #[test]
    fn publishes_finished_on_y() {
        let (cell, _, handle) = spawn_listener(vec![Key::Char('y')], None);
        assert!(wait_until(1000, || cell.is_resolved()));
        assert_eq!(cell.decision(), Decision::Finished);
        cell.stop();
        handle.join().unwrap();
    }

    #[test]
    fn ignores_unknown_keys() {
        let (cell, _, handle) = spawn_listener(
            vec![Key::Char('x'), Key::Char('q'), Key::Char('n')],
            None,
        );
        assert!(wait_until(1000, || cell.is_resolved()));
        assert_eq!(cell.decision(), Decision::NotFinished);
        cell.stop();
        handle.join().unwrap();
    }

    #[test]
    fn continuation_disarms_decision_capture() {
        let (cell, _, handle) = spawn_listener(vec![Key::Char('c'), Key::Char('y')], None);
        assert!(wait_until(1000, || cell.continue_requested()));
        // The trailing 'y' must be discarded: continuation stopped the
        // listener's decision capture.
        std::thread::sleep(Duration::from_millis(30));
        assert!(!cell.is_resolved());
        cell.stop();
        handle.join().unwrap();
    }

    #[test]
    fn interrupt_key_sets_flag_without_deciding() {
        let (cell, interrupt, handle) = spawn_listener(vec![Key::Interrupt], None);
        assert!(wait_until(1000, || interrupt.load(Ordering::SeqCst)));
        assert!(!cell.is_resolved());
        cell.stop();
        handle.join().unwrap();
    }

    #[test]
    fn listener_pauses_while_prompt_active() {
        let cell = Arc::new(DecisionCell::new());
        cell.set_prompt_active(true);
        let interrupt = Arc::new(AtomicBool::new(false));
        let source = shared(Box::new(ScriptedKeys::new(vec![], Some(Key::Char('y')))));
        let handle = {
            let cell = Arc::clone(&cell);
            let interrupt = Arc::clone(&interrupt);
            std::thread::spawn(move || run_listener(source, cell, interrupt))
        };
        std::thread::sleep(Duration::from_millis(50));
        assert!(!cell.is_resolved(), "listener read keys during a prompt");
        cell.set_prompt_active(false);
        assert!(wait_until(1000, || cell.is_resolved()));
        cell.stop();
        handle.join().unwrap();
    }

    #[test]
    fn stop_ends_the_loop() {
        let (cell, _, handle) = spawn_listener(vec![], None);
        cell.stop();
        handle.join().unwrap();
    }
}
