//! SQLite-backed candidate record store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::{CandidateRecord, CandidateStore, Disposition};
use crate::campaign::StoreError;

const RECORD_COLUMNS: &str =
    "campaign_id, dedup_key, title, source, url, size_bytes, disposition, reason, created_at, processed_at";

/// SQLite-backed candidate store.
pub struct SqliteCandidateStore {
    conn: Mutex<Connection>,
}

impl SqliteCandidateStore {
    /// Create a new store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS candidates (
                campaign_id TEXT NOT NULL,
                dedup_key TEXT NOT NULL,
                title TEXT NOT NULL,
                source TEXT NOT NULL,
                url TEXT,
                size_bytes INTEGER,
                disposition TEXT NOT NULL,
                reason TEXT,
                created_at TEXT NOT NULL,
                processed_at TEXT,
                PRIMARY KEY (campaign_id, dedup_key)
            );

            CREATE INDEX IF NOT EXISTS idx_candidates_created_at ON candidates(created_at);
            CREATE INDEX IF NOT EXISTS idx_candidates_actionable ON candidates(disposition, processed_at);
            "#,
        )?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("connection lock poisoned".to_string()))
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<CandidateRecord> {
        let disposition_str: String = row.get(6)?;
        let created_at_str: String = row.get(8)?;
        let processed_at_str: Option<String> = row.get(9)?;

        let disposition = Disposition::parse(&disposition_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                6,
                rusqlite::types::Type::Text,
                format!("invalid disposition: {}", disposition_str).into(),
            )
        })?;

        Ok(CandidateRecord {
            campaign_id: row.get(0)?,
            dedup_key: row.get(1)?,
            title: row.get(2)?,
            source: row.get(3)?,
            url: row.get(4)?,
            size_bytes: row.get::<_, Option<i64>>(5)?.map(|s| s.max(0) as u64),
            disposition,
            reason: row.get(7)?,
            created_at: parse_timestamp(&created_at_str).unwrap_or_else(Utc::now),
            processed_at: processed_at_str.as_deref().and_then(parse_timestamp),
        })
    }

    fn query_records(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<CandidateRecord>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, Self::row_to_record)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

impl CandidateStore for SqliteCandidateStore {
    fn is_recorded(&self, campaign_id: &str, dedup_key: &str) -> Result<bool, StoreError> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM candidates WHERE campaign_id = ? AND dedup_key = ?",
            params![campaign_id, dedup_key],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn record(&self, record: &CandidateRecord) -> Result<bool, StoreError> {
        let conn = self.conn()?;
        let inserted = conn.execute(
            r#"
            INSERT OR IGNORE INTO candidates
                (campaign_id, dedup_key, title, source, url, size_bytes, disposition, reason, created_at, processed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                record.campaign_id,
                record.dedup_key,
                record.title,
                record.source,
                record.url,
                record.size_bytes.map(|s| s as i64),
                record.disposition.as_str(),
                record.reason,
                record.created_at.to_rfc3339(),
                record.processed_at.map(|dt| dt.to_rfc3339()),
            ],
        )?;
        Ok(inserted > 0)
    }

    fn list_for_campaign(&self, campaign_id: &str) -> Result<Vec<CandidateRecord>, StoreError> {
        let sql = format!(
            "SELECT {} FROM candidates WHERE campaign_id = ? ORDER BY created_at ASC",
            RECORD_COLUMNS
        );
        self.query_records(&sql, &[&campaign_id])
    }

    fn list_actionable(&self, limit: i64) -> Result<Vec<CandidateRecord>, StoreError> {
        let sql = format!(
            "SELECT {} FROM candidates WHERE disposition = 'accepted' AND processed_at IS NULL ORDER BY created_at ASC LIMIT ?",
            RECORD_COLUMNS
        );
        self.query_records(&sql, &[&limit])
    }

    fn mark_processed(
        &self,
        campaign_id: &str,
        dedup_key: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let affected = conn.execute(
            "UPDATE candidates SET processed_at = ? WHERE campaign_id = ? AND dedup_key = ?",
            params![at.to_rfc3339(), campaign_id, dedup_key],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound(format!("{}/{}", campaign_id, dedup_key)));
        }
        Ok(())
    }

    fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM candidates WHERE created_at < ?",
            params![cutoff.to_rfc3339()],
        )?;
        Ok(removed)
    }
}
