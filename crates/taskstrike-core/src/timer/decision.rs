//! Shared decision state between the countdown loop and the input listener.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// The single authoritative "did the user finish" outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Decision {
    #[default]
    Unset,
    Finished,
    NotFinished,
}

#[derive(Debug, Default)]
struct CellInner {
    decision: Decision,
    continue_requested: bool,
}

/// Mutex-guarded tri-state cell with compare-and-set publication.
///
/// The first writer to resolve the decision wins; later writers re-check
/// under the lock and no-op. Continuation is a separate one-shot flag that
/// never touches the decision itself.
#[derive(Debug, Default)]
pub struct DecisionCell {
    inner: Mutex<CellInner>,
    stopped: AtomicBool,
    prompt_active: AtomicBool,
}

impl DecisionCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a terminal decision. Returns false if one was already set.
    pub fn try_resolve(&self, decision: Decision) -> bool {
        debug_assert!(decision != Decision::Unset);
        let mut inner = self.lock_inner();
        if inner.decision != Decision::Unset {
            return false;
        }
        inner.decision = decision;
        true
    }

    /// One-shot continuation request. Returns false if a decision already
    /// exists or continuation was already granted.
    pub fn request_continue(&self) -> bool {
        let mut inner = self.lock_inner();
        if inner.decision != Decision::Unset || inner.continue_requested {
            return false;
        }
        inner.continue_requested = true;
        true
    }

    pub fn decision(&self) -> Decision {
        self.lock_inner().decision
    }

    pub fn is_resolved(&self) -> bool {
        self.decision() != Decision::Unset
    }

    pub fn continue_requested(&self) -> bool {
        self.lock_inner().continue_requested
    }

    /// Tell the listener to wind down. Checked once per poll.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// While a prompt owns the input source the listener must not read it.
    pub fn set_prompt_active(&self, active: bool) {
        self.prompt_active.store(active, Ordering::SeqCst);
    }

    pub fn prompt_active(&self) -> bool {
        self.prompt_active.load(Ordering::SeqCst)
    }

    fn lock_inner(&self) -> std::sync::MutexGuard<'_, CellInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
