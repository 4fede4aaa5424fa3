use chrono::{DateTime, Local, Utc};
use rusqlite::{params, Connection};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::controller::{Reward, RewardSink, RewardSource};
use crate::error::HistoryError;

/// XP needed per level
pub const XP_PER_LEVEL: u64 = 250;

/// A reward that has been written to the history table
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedSession {
    pub id: i64,
    pub source: RewardSource,
    pub session_id: String,
    pub xp: u32,
    pub cycles: u32,
    pub completed_at: DateTime<Local>,
}

/// Level reached for a total amount of XP
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XpLevel {
    pub total_xp: u64,
    pub level: u64,
    pub next_level_xp: u64,
    /// Percent of the way from this level to the next
    pub progress: f64,
}

impl XpLevel {
    pub fn from_total(total_xp: u64) -> Self {
        let level = total_xp / XP_PER_LEVEL;
        let into_level = total_xp % XP_PER_LEVEL;
        Self {
            total_xp,
            level,
            next_level_xp: (level + 1) * XP_PER_LEVEL,
            progress: into_level as f64 * 100.0 / XP_PER_LEVEL as f64,
        }
    }
}

#[derive(Serialize)]
struct CsvRow<'a> {
    completed_at: String,
    source: String,
    session_id: &'a str,
    xp: u32,
    cycles: u32,
}

/// SQLite-backed log of completed sessions
#[derive(Debug)]
pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    /// Open the database under the state dir, creating it if needed
    pub fn open_default() -> Result<Self, HistoryError> {
        let path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("pulsehabit_history.db"));
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, HistoryError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path.as_ref())?;
        Self::init(conn)
    }

    pub fn in_memory() -> Result<Self, HistoryError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, HistoryError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS completed_sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source TEXT NOT NULL,
                session_id TEXT NOT NULL,
                xp INTEGER NOT NULL,
                cycles INTEGER NOT NULL,
                completed_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_completed_sessions_at ON completed_sessions(completed_at)",
            [],
        )?;

        Ok(Self { conn })
    }

    pub fn record(&self, reward: &Reward) -> Result<i64, HistoryError> {
        self.conn.execute(
            r#"
            INSERT INTO completed_sessions (source, session_id, xp, cycles, completed_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                reward.source.to_string(),
                reward.session_id,
                reward.xp,
                reward.cycles,
                // UTC text sorts in time order across offset changes
                reward.completed_at.with_timezone(&Utc).to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent completions first
    pub fn recent(&self, limit: usize) -> Result<Vec<CompletedSession>, HistoryError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, source, session_id, xp, cycles, completed_at
            FROM completed_sessions
            ORDER BY completed_at DESC, id DESC
            LIMIT ?1
            "#,
        )?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map([limit], |row| {
            let source: String = row.get(1)?;
            let source = RewardSource::from_tag(&source).ok_or_else(|| {
                rusqlite::Error::InvalidColumnType(1, "source".to_string(), rusqlite::types::Type::Text)
            })?;
            let completed_at: String = row.get(5)?;
            let completed_at = DateTime::parse_from_rfc3339(&completed_at)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(5, "completed_at".to_string(), rusqlite::types::Type::Text)
                })?
                .with_timezone(&Local);

            Ok(CompletedSession {
                id: row.get(0)?,
                source,
                session_id: row.get(2)?,
                xp: row.get(3)?,
                cycles: row.get(4)?,
                completed_at,
            })
        })?;

        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row?);
        }
        Ok(sessions)
    }

    pub fn total_xp(&self) -> Result<u64, HistoryError> {
        let total: i64 =
            self.conn
                .query_row("SELECT COALESCE(SUM(xp), 0) FROM completed_sessions", [], |row| {
                    row.get(0)
                })?;
        Ok(u64::try_from(total).unwrap_or(0))
    }

    pub fn count(&self) -> Result<u64, HistoryError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM completed_sessions", [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    pub fn level(&self) -> Result<XpLevel, HistoryError> {
        Ok(XpLevel::from_total(self.total_xp()?))
    }

    pub fn clear(&self) -> Result<(), HistoryError> {
        self.conn.execute("DELETE FROM completed_sessions", [])?;
        Ok(())
    }

    /// Write every completion, oldest first, as CSV. Returns the row count.
    pub fn export_csv<W: Write>(&self, out: W) -> Result<usize, HistoryError> {
        let mut sessions = self.recent(usize::MAX)?;
        sessions.reverse();

        let mut writer = csv::Writer::from_writer(out);
        for s in &sessions {
            writer.serialize(CsvRow {
                completed_at: s.completed_at.to_rfc3339(),
                source: s.source.to_string(),
                session_id: &s.session_id,
                xp: s.xp,
                cycles: s.cycles,
            })?;
        }
        writer.flush()?;
        Ok(sessions.len())
    }
}

impl RewardSink for HistoryDb {
    fn reward(&mut self, reward: &Reward) {
        if let Err(e) = self.record(reward) {
            tracing::error!(error = %e, session = %reward.session_id, "failed to record completed session");
        }
    }
}
