//! Timeout-bounded interactive prompt.
//!
//! The prompt and the background listener publish through the same
//! [`DecisionCell`]; whichever resolves first wins. While a prompt is
//! waiting it owns the input source (the listener pauses, see
//! `DecisionCell::prompt_active`).

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::warn;

use super::decision::{Decision, DecisionCell};
use super::input::{Key, SharedKeySource, POLL_INTERVAL};

/// How a prompt run resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptOutcome {
    /// The user answered with one of the allowed characters.
    Answered(char),
    /// No input within the timeout; the caller applies the default.
    TimedOut,
    /// A character outside the allowed set arrived; caller defaults.
    Invalid,
    /// The decision was resolved elsewhere while waiting.
    AlreadyResolved(Decision),
    /// A fresh interrupt arrived while waiting.
    Interrupted,
}

/// Ask a single-character question, waiting up to `timeout`.
///
/// Timeouts and invalid input both fall back to the caller's default; the
/// timeout additionally logs a warning, invalid input prints a distinct
/// console message.
pub(crate) fn ask<W: Write>(
    out: &mut W,
    question: &str,
    options: &[char],
    timeout: Duration,
    source: &SharedKeySource,
    cell: &DecisionCell,
    interrupt: &AtomicBool,
) -> PromptOutcome {
    cell.set_prompt_active(true);
    let outcome = wait_for_answer(out, question, options, timeout, source, cell, interrupt);
    cell.set_prompt_active(false);
    outcome
}

fn wait_for_answer<W: Write>(
    out: &mut W,
    question: &str,
    options: &[char],
    timeout: Duration,
    source: &SharedKeySource,
    cell: &DecisionCell,
    interrupt: &AtomicBool,
) -> PromptOutcome {
    let _ = write!(out, "\r\n{question} ");
    let _ = out.flush();

    let mut waited = Duration::ZERO;
    while waited < timeout {
        if interrupt.swap(false, Ordering::SeqCst) {
            return PromptOutcome::Interrupted;
        }
        if cell.is_resolved() {
            return PromptOutcome::AlreadyResolved(cell.decision());
        }

        let key = {
            let mut src = source.lock().unwrap_or_else(|e| e.into_inner());
            src.poll_key(POLL_INTERVAL)
        };
        waited += POLL_INTERVAL;

        match key {
            Some(Key::Interrupt) => return PromptOutcome::Interrupted,
            Some(Key::Char(c)) => {
                let c = c.to_ascii_lowercase();
                if options.contains(&c) {
                    return PromptOutcome::Answered(c);
                }
                let _ = write!(out, "\r\ninvalid input, defaulting to not finished\r\n");
                let _ = out.flush();
                return PromptOutcome::Invalid;
            }
            None => {}
        }
    }

    warn!("no answer within {}s, defaulting to not finished", timeout.as_secs());
    PromptOutcome::TimedOut
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::input::shared;
    use crate::timer::testing::ScriptedKeys;
    use std::sync::atomic::AtomicBool;

    fn ask_with(
        script: Vec<Key>,
        then: Option<Key>,
        timeout: Duration,
    ) -> (PromptOutcome, usize, Vec<u8>) {
        let (keys, polls) = ScriptedKeys::with_counter(script, then);
        let source = shared(Box::new(keys));
        let cell = DecisionCell::new();
        let interrupt = AtomicBool::new(false);
        let mut out = Vec::new();
        let outcome = ask(
            &mut out,
            "Did you finish 'demo'? (y/n)",
            &['y', 'n'],
            timeout,
            &source,
            &cell,
            &interrupt,
        );
        (outcome, polls.load(Ordering::SeqCst), out)
    }

    #[test]
    fn valid_answer_is_returned() {
        let (outcome, _, _) = ask_with(vec![Key::Char('y')], None, Duration::from_secs(2));
        assert_eq!(outcome, PromptOutcome::Answered('y'));
    }

    #[test]
    fn uppercase_answer_is_accepted() {
        let (outcome, _, _) = ask_with(vec![Key::Char('N')], None, Duration::from_secs(2));
        assert_eq!(outcome, PromptOutcome::Answered('n'));
    }

    #[test]
    fn invalid_answer_defaults_with_message() {
        let (outcome, _, out) = ask_with(vec![Key::Char('x')], None, Duration::from_secs(2));
        assert_eq!(outcome, PromptOutcome::Invalid);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("invalid input"));
    }

    #[test]
    fn timeout_after_expected_poll_count() {
        // timeout=2s with a 100ms poll bound: the prompt gives up after
        // twenty empty polls, not earlier and not later.
        let (outcome, polls, _) = ask_with(vec![], None, Duration::from_secs(2));
        assert_eq!(outcome, PromptOutcome::TimedOut);
        assert_eq!(polls, 20);
    }

    #[test]
    fn resolved_elsewhere_short_circuits() {
        let source = shared(Box::new(ScriptedKeys::new(vec![], None)));
        let cell = DecisionCell::new();
        cell.try_resolve(Decision::Finished);
        let interrupt = AtomicBool::new(false);
        let mut out = Vec::new();
        let outcome = ask(
            &mut out,
            "q",
            &['y', 'n'],
            Duration::from_secs(2),
            &source,
            &cell,
            &interrupt,
        );
        assert_eq!(outcome, PromptOutcome::AlreadyResolved(Decision::Finished));
    }

    #[test]
    fn interrupt_aborts_the_wait() {
        let source = shared(Box::new(ScriptedKeys::new(vec![], None)));
        let cell = DecisionCell::new();
        let interrupt = AtomicBool::new(true);
        let mut out = Vec::new();
        let outcome = ask(
            &mut out,
            "q",
            &['y', 'n'],
            Duration::from_secs(2),
            &source,
            &cell,
            &interrupt,
        );
        assert_eq!(outcome, PromptOutcome::Interrupted);
        // The flag was consumed by the observation.
        assert!(!interrupt.load(Ordering::SeqCst));
    }

    #[test]
    fn interrupt_key_aborts_the_wait() {
        let (outcome, _, _) = ask_with(vec![Key::Interrupt], None, Duration::from_secs(2));
        assert_eq!(outcome, PromptOutcome::Interrupted);
    }

    #[test]
    fn prompt_active_cleared_on_exit() {
        let source = shared(Box::new(ScriptedKeys::new(vec![Key::Char('y')], None)));
        let cell = DecisionCell::new();
        let interrupt = AtomicBool::new(false);
        let mut out = Vec::new();
        ask(
            &mut out,
            "q",
            &['y'],
            Duration::from_secs(1),
            &source,
            &cell,
            &interrupt,
        );
        assert!(!cell.prompt_active());
    }
}
