//! Shared test doubles for the timer modules.

use std::collections::VecDeque;
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::DatabaseError;
use crate::notify::Notifier;

use super::clock::Clock;
use super::decision::DecisionCell;
use super::input::{Key, KeySource};
use super::session::{CompletionStatus, HistoryRecord, HistorySink};

/// Key source that replays a fixed script, then an optional steady key.
/// Every poll costs one real millisecond so spinning loops stay cheap.
pub(crate) struct ScriptedKeys {
    script: VecDeque<Key>,
    then: Option<Key>,
    polls: Arc<AtomicUsize>,
}

impl ScriptedKeys {
    pub fn new(script: Vec<Key>, then: Option<Key>) -> Self {
        Self {
            script: script.into(),
            then,
            polls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_counter(script: Vec<Key>, then: Option<Key>) -> (Self, Arc<AtomicUsize>) {
        let keys = Self::new(script, then);
        let polls = Arc::clone(&keys.polls);
        (keys, polls)
    }
}

impl KeySource for ScriptedKeys {
    fn poll_key(&mut self, _timeout: Duration) -> Option<Key> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(1));
        if let Some(key) = self.script.pop_front() {
            return Some(key);
        }
        self.then
    }
}

/// Key source that answers only while a prompt is active, so scripted
/// answers deterministically reach the prompt and never the listener.
pub(crate) struct PromptGatedKeys {
    cell: Arc<DecisionCell>,
    script: VecDeque<Key>,
}

impl PromptGatedKeys {
    pub fn new(cell: Arc<DecisionCell>, script: Vec<Key>) -> Self {
        Self {
            cell,
            script: script.into(),
        }
    }
}

impl KeySource for PromptGatedKeys {
    fn poll_key(&mut self, _timeout: Duration) -> Option<Key> {
        std::thread::sleep(Duration::from_millis(1));
        if self.cell.prompt_active() {
            self.script.pop_front()
        } else {
            None
        }
    }
}

/// Clock with virtual time: `sleep` advances the session instantly while
/// costing one real millisecond. Optionally raises an interrupt flag after
/// a given number of sleeps, pinning cancellation to an exact tick.
pub(crate) struct TestClock {
    start: DateTime<Utc>,
    virtual_ms: Mutex<i64>,
    sleeps: AtomicU64,
    interrupt_after: Option<(u64, Arc<AtomicBool>)>,
}

impl TestClock {
    pub fn new() -> Self {
        Self {
            start: Utc::now(),
            virtual_ms: Mutex::new(0),
            sleeps: AtomicU64::new(0),
            interrupt_after: None,
        }
    }

    pub fn with_interrupt_after(sleeps: u64, flag: Arc<AtomicBool>) -> Self {
        let mut clock = Self::new();
        clock.interrupt_after = Some((sleeps, flag));
        clock
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        let ms = *self.virtual_ms.lock().unwrap();
        self.start + chrono::Duration::milliseconds(ms)
    }

    fn sleep(&self, dur: Duration) {
        {
            let mut ms = self.virtual_ms.lock().unwrap();
            *ms += dur.as_millis() as i64;
        }
        let n = self.sleeps.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((at, flag)) = &self.interrupt_after {
            if n >= *at {
                flag.store(true, Ordering::SeqCst);
            }
        }
        std::thread::sleep(Duration::from_millis(1));
    }
}

/// Cloneable in-memory writer capturing everything the timer prints.
#[derive(Clone)]
pub(crate) struct BufWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl BufWriter {
    pub fn new() -> Self {
        Self {
            buf: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock().unwrap()).into_owned()
    }
}

impl Write for BufWriter {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// History sink capturing records, optionally failing every write.
#[derive(Default)]
pub(crate) struct MockSink {
    records: Mutex<Vec<HistoryRecord>>,
    fail: bool,
}

impl MockSink {
    pub fn failing() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn records(&self) -> Vec<HistoryRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl HistorySink for MockSink {
    fn record_task_run(&self, record: &HistoryRecord) -> Result<(), DatabaseError> {
        if self.fail {
            return Err(DatabaseError::QueryFailed("sink unavailable".into()));
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// Notifier capturing every call.
#[derive(Default)]
pub(crate) struct MockNotifier {
    calls: Mutex<Vec<(String, Option<CompletionStatus>)>>,
}

impl MockNotifier {
    pub fn calls(&self) -> Vec<(String, Option<CompletionStatus>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Notifier for MockNotifier {
    fn notify(&self, task_name: &str, status: Option<CompletionStatus>) {
        self.calls
            .lock()
            .unwrap()
            .push((task_name.to_string(), status));
    }
}
