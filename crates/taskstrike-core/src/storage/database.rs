//! SQLite-based task history and to-do storage.
//!
//! Provides persistent storage for:
//! - Attempted/completed task runs (one row per finalized countdown)
//! - The to-do list of scheduled tasks
//! - Aggregate statistics (today and all-time)

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::DatabaseError;
use crate::timer::{CompletionStatus, HistoryRecord, HistorySink};

use super::data_dir;

/// One finalized task run, as read back from storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: i64,
    pub task_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub initial_duration_min: u32,
    pub actual_duration_min: u32,
    pub status: CompletionStatus,
}

/// One scheduled task on the to-do list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: i64,
    pub task_name: String,
    pub duration_min: u32,
    pub added_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Stats {
    pub total_runs: u64,
    pub finished: u64,
    pub not_finished: u64,
    pub total_minutes: u64,
    pub today_runs: u64,
    pub today_minutes: u64,
}

/// SQLite database for task history and the to-do list.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data dir>/taskstrike.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, DatabaseError> {
        let path = data_dir()
            .map_err(|e| DatabaseError::QueryFailed(format!("cannot resolve data dir: {e}")))?
            .join("taskstrike.db");
        Self::open_at(&path)
    }

    /// Open the database at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS tasks (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                task_name        TEXT NOT NULL,
                start_time       TEXT NOT NULL,
                end_time         TEXT NOT NULL,
                initial_duration INTEGER NOT NULL,
                actual_duration  INTEGER NOT NULL,
                status           TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS todo (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                task_name  TEXT NOT NULL,
                duration   INTEGER NOT NULL,
                added_date TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_tasks_end_time ON tasks(end_time);
            CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);",
        )?;
        Ok(())
    }

    /// Full task history, most recent run first.
    ///
    /// # Errors
    /// Returns an error if the query fails or a row cannot be decoded.
    pub fn task_history(&self) -> Result<Vec<TaskRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, task_name, start_time, end_time, initial_duration, actual_duration, status
             FROM tasks ORDER BY end_time DESC, id DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(TaskRecord {
                id: row.get(0)?,
                task_name: row.get(1)?,
                start_time: parse_ts(2, &row.get::<_, String>(2)?)?,
                end_time: parse_ts(3, &row.get::<_, String>(3)?)?,
                initial_duration_min: row.get(4)?,
                actual_duration_min: row.get(5)?,
                status: parse_status(6, &row.get::<_, String>(6)?)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Append a task to the to-do list. Returns the new row id.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn todo_add(
        &self,
        task_name: &str,
        duration_min: u32,
        added_date: DateTime<Utc>,
    ) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO todo (task_name, duration, added_date) VALUES (?1, ?2, ?3)",
            params![task_name, duration_min, added_date.to_rfc3339()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// The to-do list, oldest entry first.
    pub fn todo_list(&self) -> Result<Vec<TodoItem>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, task_name, duration, added_date FROM todo ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(TodoItem {
                id: row.get(0)?,
                task_name: row.get(1)?,
                duration_min: row.get(2)?,
                added_date: parse_ts(3, &row.get::<_, String>(3)?)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Remove to-do entries by task name. Returns the number of rows removed.
    pub fn todo_remove(&self, task_name: &str) -> Result<usize, DatabaseError> {
        let n = self
            .conn
            .execute("DELETE FROM todo WHERE task_name = ?1", params![task_name])?;
        Ok(n)
    }

    /// All-time statistics, with today's counters filled in.
    pub fn stats_all(&self) -> Result<Stats, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT status, COUNT(*), COALESCE(SUM(actual_duration), 0)
             FROM tasks
             GROUP BY status",
        )?;

        let mut stats = Stats::default();
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, u64>(2)?,
            ))
        })?;
        for row in rows {
            let (status, count, minutes) = row?;
            stats.total_runs += count;
            stats.total_minutes += minutes;
            match status.as_str() {
                "finished" => stats.finished += count,
                "not_finished" => stats.not_finished += count,
                _ => {}
            }
        }

        let mut stmt2 = self.conn.prepare(
            "SELECT COUNT(*), COALESCE(SUM(actual_duration), 0)
             FROM tasks
             WHERE end_time >= ?1",
        )?;
        let row = stmt2.query_row(params![today_floor()], |row| {
            Ok((row.get::<_, u64>(0)?, row.get::<_, u64>(1)?))
        })?;
        stats.today_runs = row.0;
        stats.today_minutes = row.1;

        Ok(stats)
    }

    /// Statistics restricted to runs that ended today.
    pub fn stats_today(&self) -> Result<Stats, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT status, COUNT(*), COALESCE(SUM(actual_duration), 0)
             FROM tasks
             WHERE end_time >= ?1
             GROUP BY status",
        )?;

        let mut stats = Stats::default();
        let rows = stmt.query_map(params![today_floor()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, u64>(2)?,
            ))
        })?;
        for row in rows {
            let (status, count, minutes) = row?;
            stats.total_runs += count;
            stats.total_minutes += minutes;
            match status.as_str() {
                "finished" => stats.finished += count,
                "not_finished" => stats.not_finished += count,
                _ => {}
            }
        }
        stats.today_runs = stats.total_runs;
        stats.today_minutes = stats.total_minutes;

        Ok(stats)
    }
}

impl HistorySink for Database {
    fn record_task_run(&self, record: &HistoryRecord) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO tasks (task_name, start_time, end_time, initial_duration, actual_duration, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.task_name,
                record.start_time.to_rfc3339(),
                record.end_time.to_rfc3339(),
                record.initial_duration_min,
                record.actual_duration_min,
                record.status.as_str(),
            ],
        )?;
        Ok(())
    }
}

/// Midnight today, in the stored RFC 3339 shape for lexicographic compare.
fn today_floor() -> String {
    format!("{}T00:00:00+00:00", Utc::now().format("%Y-%m-%d"))
}

fn parse_ts(idx: usize, text: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn parse_status(idx: usize, text: &str) -> Result<CompletionStatus, rusqlite::Error> {
    text.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            e.into(),
        )
    })
}
