//! # TaskStrike Core Library
//!
//! Core logic for the TaskStrike countdown timer. The CLI binary is a thin
//! layer over this crate.
//!
//! ## Architecture
//!
//! - **Timer**: a tick-driven countdown state machine with a background
//!   keyboard listener and a timeout-bounded completion prompt
//! - **Storage**: SQLite-based task history and to-do list, TOML-based
//!   configuration
//! - **Notify**: best-effort desktop notifications
//!
//! ## Key Components
//!
//! - [`Timer`]: the countdown state machine; one [`HistoryRecord`] per run
//! - [`Database`]: task history, to-do list and statistics persistence
//! - [`Config`]: application configuration management

pub mod error;
pub mod notify;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, DatabaseError};
pub use notify::{DesktopNotifier, Notifier};
pub use storage::{data_dir, Config, Database};
pub use timer::{CompletionStatus, HistoryRecord, HistorySink, Timer, TimerConfig};
