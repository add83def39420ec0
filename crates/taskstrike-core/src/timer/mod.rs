//! The countdown timer: state machine, input listener, prompt protocol and
//! rendering helpers.

mod clock;
mod decision;
pub mod display;
mod input;
mod prompt;
mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use clock::{Clock, SystemClock};
pub use decision::{Decision, DecisionCell};
pub use input::{open_source, shared, Key, KeySource, NullKeys, SharedKeySource, TerminalKeys};
pub use prompt::PromptOutcome;
pub use session::{
    CompletionStatus, HistoryRecord, HistorySink, Timer, TimerConfig, TimerParts,
};
