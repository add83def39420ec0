//! The countdown state machine.
//!
//! One [`Timer`] owns the render loop; a background listener feeds the
//! shared decision cell. Every exit path (normal completion, interrupt,
//! continuation exhaustion) funnels through the run-once finalize, which
//! produces exactly one [`HistoryRecord`] per run.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use crossterm::cursor::MoveTo;
use crossterm::terminal::{self, Clear, ClearType};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::DatabaseError;
use crate::notify::Notifier;

use super::clock::{Clock, SystemClock};
use super::decision::{Decision, DecisionCell};
use super::display;
use super::input::{self, SharedKeySource};
use super::prompt::{self, PromptOutcome};

/// Completion status of a finalized run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    Finished,
    NotFinished,
}

impl CompletionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionStatus::Finished => "finished",
            CompletionStatus::NotFinished => "not_finished",
        }
    }
}

impl std::fmt::Display for CompletionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompletionStatus::Finished => write!(f, "Finished"),
            CompletionStatus::NotFinished => write!(f, "Not Finished"),
        }
    }
}

impl std::str::FromStr for CompletionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "finished" => Ok(CompletionStatus::Finished),
            "not_finished" => Ok(CompletionStatus::NotFinished),
            other => Err(format!("unknown completion status: {other}")),
        }
    }
}

/// The durable outcome of one timer run. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub task_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Initial countdown length in minutes.
    pub initial_duration_min: u32,
    /// Minutes actually spent, from elapsed tick time.
    pub actual_duration_min: u32,
    pub status: CompletionStatus,
}

/// Where finalized runs go. Implementations must be durable before
/// returning success.
pub trait HistorySink {
    fn record_task_run(&self, record: &HistoryRecord) -> Result<(), DatabaseError>;
}

/// Explicit state-machine configuration; no ambient globals.
#[derive(Debug, Clone)]
pub struct TimerConfig {
    pub tick_interval: Duration,
    pub clear_screen: bool,
    pub prompt_timeout: Duration,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            clear_screen: true,
            prompt_timeout: Duration::from_secs(30),
        }
    }
}

/// Dependency bundle for [`Timer::with_parts`]; lets tests inject doubles.
pub struct TimerParts {
    pub source: SharedKeySource,
    pub clock: Arc<dyn Clock>,
    pub interrupt: Arc<AtomicBool>,
    pub cell: Arc<DecisionCell>,
    pub out: Box<dyn Write + Send>,
}

impl TimerParts {
    /// Terminal defaults: keyboard source, system clock, stdout, and the
    /// interrupt latch wired to SIGINT/SIGTERM.
    pub fn terminal() -> Self {
        let interrupt = Arc::new(AtomicBool::new(false));
        for sig in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
            if let Err(e) = signal_hook::flag::register(sig, Arc::clone(&interrupt)) {
                warn!("could not register signal handler: {e}");
            }
        }
        Self {
            source: input::shared(input::open_source()),
            clock: Arc::new(SystemClock),
            interrupt,
            cell: Arc::new(DecisionCell::new()),
            out: Box::new(io::stdout()),
        }
    }
}

enum Flow {
    Continue,
    Break,
}

/// A single countdown session.
pub struct Timer {
    task_name: String,
    total_seconds: i64,
    remaining_seconds: i64,
    elapsed_seconds: u64,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    initial_prompt_done: bool,
    final_prompt_done: bool,
    /// Run-once latch for finalize.
    record: Option<HistoryRecord>,
    config: TimerConfig,
    source: SharedKeySource,
    clock: Arc<dyn Clock>,
    interrupt: Arc<AtomicBool>,
    cell: Arc<DecisionCell>,
    out: Box<dyn Write + Send>,
}

impl Timer {
    /// Build a timer for a real terminal session.
    pub fn new(task_name: impl Into<String>, total_seconds: i64, config: TimerConfig) -> Self {
        Self::with_parts(task_name, total_seconds, config, TimerParts::terminal())
    }

    /// Fully injected constructor; the test seam.
    pub fn with_parts(
        task_name: impl Into<String>,
        total_seconds: i64,
        config: TimerConfig,
        parts: TimerParts,
    ) -> Self {
        Self {
            task_name: task_name.into(),
            total_seconds,
            remaining_seconds: total_seconds,
            elapsed_seconds: 0,
            start_time: None,
            end_time: None,
            initial_prompt_done: false,
            final_prompt_done: false,
            record: None,
            config,
            source: parts.source,
            clock: parts.clock,
            interrupt: parts.interrupt,
            cell: parts.cell,
            out: parts.out,
        }
    }

    pub fn task_name(&self) -> &str {
        &self.task_name
    }

    pub fn remaining_seconds(&self) -> i64 {
        self.remaining_seconds
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    /// Run the countdown to completion and produce the durable record.
    ///
    /// Failures inside finalize are logged and reported on the console but
    /// never propagate past this boundary.
    pub fn run(&mut self, sink: &dyn HistorySink, notifier: &dyn Notifier) -> HistoryRecord {
        self.start_time = Some(self.clock.now());
        info!(
            task = %self.task_name,
            total_seconds = self.total_seconds,
            "task started"
        );

        let listener = {
            let source = Arc::clone(&self.source);
            let cell = Arc::clone(&self.cell);
            let interrupt = Arc::clone(&self.interrupt);
            std::thread::spawn(move || input::run_listener(source, cell, interrupt))
        };

        self.countdown();
        let record = self.finalize(sink, notifier);

        // Finalize already set the stop flag, so this returns within one
        // poll bound. Teardown is best-effort.
        let _ = listener.join();
        record
    }

    // ── Tick loop ────────────────────────────────────────────────────

    fn countdown(&mut self) {
        loop {
            if self.take_interrupt() {
                self.on_interrupt();
                return;
            }

            self.draw_frame();

            if self.remaining_seconds <= 0 {
                if self.should_initial_prompt() {
                    if let Flow::Break = self.initial_prompt() {
                        return;
                    }
                } else if self.should_final_prompt() {
                    if let Flow::Break = self.overtime_prompt() {
                        return;
                    }
                }
            }

            if self.exit_ready() {
                return;
            }

            self.clock.sleep(self.config.tick_interval);
            let tick_secs = self.config.tick_interval.as_secs().max(1) as i64;
            self.remaining_seconds -= tick_secs;
            self.elapsed_seconds += tick_secs as u64;

            if self.exit_ready() {
                return;
            }
        }
    }

    fn should_initial_prompt(&self) -> bool {
        !self.initial_prompt_done && !self.cell.is_resolved() && !self.cell.continue_requested()
    }

    /// In continuation mode the final confirmation fires once overtime has
    /// consumed a full extra countdown.
    fn should_final_prompt(&self) -> bool {
        self.cell.continue_requested()
            && !self.final_prompt_done
            && self.remaining_seconds <= -self.total_seconds.max(0)
    }

    /// A resolved decision ends the loop, except in continuation mode where
    /// only the final prompt's answer counts.
    fn exit_ready(&self) -> bool {
        if !self.cell.is_resolved() {
            return false;
        }
        !self.cell.continue_requested() || self.final_prompt_done
    }

    fn take_interrupt(&self) -> bool {
        self.interrupt.swap(false, Ordering::SeqCst)
    }

    // ── Prompts ──────────────────────────────────────────────────────

    /// Zero-crossing question: finished, not finished, or keep running.
    fn initial_prompt(&mut self) -> Flow {
        self.initial_prompt_done = true;
        let question = format!("Did you finish '{}'? (y/n, c to continue)", self.task_name);
        match prompt::ask(
            &mut self.out,
            &question,
            &['y', 'n', 'c'],
            self.config.prompt_timeout,
            &self.source,
            &self.cell,
            &self.interrupt,
        ) {
            PromptOutcome::Answered('y') => {
                self.cell.try_resolve(Decision::Finished);
            }
            PromptOutcome::Answered('n') => {
                self.cell.try_resolve(Decision::NotFinished);
            }
            PromptOutcome::Answered(_) => {
                if self.cell.request_continue() {
                    info!(task = %self.task_name, "continuation chosen at zero-crossing");
                }
            }
            PromptOutcome::TimedOut | PromptOutcome::Invalid => {
                self.cell.try_resolve(Decision::NotFinished);
            }
            PromptOutcome::AlreadyResolved(_) => {}
            PromptOutcome::Interrupted => {
                self.on_interrupt();
                return Flow::Break;
            }
        }
        Flow::Continue
    }

    /// Overtime confirmation, yes/no only. Always leaves a decision behind.
    fn final_prompt(&mut self) {
        self.final_prompt_done = true;
        let question = format!("Did you finish '{}'? (y/n)", self.task_name);
        match prompt::ask(
            &mut self.out,
            &question,
            &['y', 'n'],
            self.config.prompt_timeout,
            &self.source,
            &self.cell,
            &self.interrupt,
        ) {
            PromptOutcome::Answered('y') => {
                self.cell.try_resolve(Decision::Finished);
            }
            PromptOutcome::Answered(_) | PromptOutcome::TimedOut | PromptOutcome::Invalid => {
                self.cell.try_resolve(Decision::NotFinished);
            }
            PromptOutcome::AlreadyResolved(_) => {}
            PromptOutcome::Interrupted => {
                warn!("interrupted while answering, defaulting to not finished");
                self.cell.try_resolve(Decision::NotFinished);
            }
        }
    }

    fn overtime_prompt(&mut self) -> Flow {
        self.final_prompt();
        if self.exit_ready() {
            Flow::Break
        } else {
            Flow::Continue
        }
    }

    /// Cancellation path: capture the end time, obtain a decision if there
    /// is none yet, then fall through to finalize.
    fn on_interrupt(&mut self) {
        info!(task = %self.task_name, "countdown interrupted");
        let _ = write!(self.out, "\r\nTask manually interrupted.\r\n");
        let _ = self.out.flush();
        if self.end_time.is_none() {
            self.end_time = Some(self.clock.now());
        }
        if !self.final_prompt_done && !self.cell.is_resolved() {
            self.final_prompt();
        }
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn draw_frame(&mut self) {
        let time = display::format_remaining(self.remaining_seconds);
        let (width, height) = terminal_size();
        if self.config.clear_screen {
            let _ = crossterm::execute!(self.out, Clear(ClearType::All), MoveTo(0, 0));
        }
        for line in display::render_frame(&time, &self.task_name, width, height) {
            let _ = write!(self.out, "{line}\r\n");
        }
        let _ = self.out.flush();
    }

    // ── Finalize ─────────────────────────────────────────────────────

    /// Run-once terminal step: resolve the outcome, write the history
    /// record, fire the notification, print the summary.
    fn finalize(&mut self, sink: &dyn HistorySink, notifier: &dyn Notifier) -> HistoryRecord {
        if let Some(record) = &self.record {
            return record.clone();
        }
        self.cell.stop();

        // A record always carries an explicit decision; ask once more if
        // none was captured on the way here.
        if !self.cell.is_resolved() {
            if !self.final_prompt_done {
                self.final_prompt();
            }
            if !self.cell.is_resolved() {
                self.cell.try_resolve(Decision::NotFinished);
            }
        }

        let end = *self.end_time.get_or_insert_with(|| self.clock.now());
        let start = self.start_time.unwrap_or(end);
        let status = match self.cell.decision() {
            Decision::Finished => CompletionStatus::Finished,
            _ => CompletionStatus::NotFinished,
        };

        let record = HistoryRecord {
            task_name: self.task_name.clone(),
            start_time: start,
            end_time: end,
            initial_duration_min: (self.total_seconds.max(0) as u64 / 60) as u32,
            actual_duration_min: (self.elapsed_seconds / 60) as u32,
            status,
        };

        if let Err(e) = sink.record_task_run(&record) {
            error!("failed to record task run: {e}");
            let _ = write!(self.out, "\r\nerror: failed to record task history: {e}\r\n");
        }
        notifier.notify(&record.task_name, Some(status));

        let (width, _) = terminal_size();
        if self.config.clear_screen {
            let _ = crossterm::execute!(self.out, Clear(ClearType::All), MoveTo(0, 0));
        }
        let summary = format!("{} - Time's up! ({status})", self.task_name);
        let _ = write!(
            self.out,
            "\r\n{}\r\n",
            display::center_line(&summary, width as usize)
        );
        let _ = self.out.flush();

        info!(
            task = %record.task_name,
            status = %status,
            elapsed_seconds = self.elapsed_seconds,
            "task run recorded"
        );
        self.record = Some(record.clone());
        record
    }
}

fn terminal_size() -> (u16, u16) {
    terminal::size().unwrap_or((display::DEFAULT_WIDTH, display::DEFAULT_HEIGHT))
}
