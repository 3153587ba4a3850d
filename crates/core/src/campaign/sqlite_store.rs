//! SQLite-backed campaign store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{
    Campaign, CampaignStore, Category, CreateCampaignRequest, Mode, SessionState, StoreError,
};

const CAMPAIGN_COLUMNS: &str = "id, query, category, mode, langs, created_at, session";

/// SQLite-backed campaign store.
pub struct SqliteCampaignStore {
    conn: Mutex<Connection>,
}

impl SqliteCampaignStore {
    /// Create a new SQLite campaign store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite campaign store (useful for testing).
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
            CREATE TABLE IF NOT EXISTS campaigns (
                id TEXT PRIMARY KEY,
                query TEXT NOT NULL,
                category TEXT NOT NULL,
                mode TEXT NOT NULL,
                langs TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL,
                session TEXT NOT NULL,
                last_attempt TEXT,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_campaigns_last_attempt ON campaigns(last_attempt);
            CREATE INDEX IF NOT EXISTS idx_campaigns_query ON campaigns(lower(query), category);

            CREATE TABLE IF NOT EXISTS continuation_links (
                parent_id TEXT NOT NULL,
                child_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                PRIMARY KEY (parent_id, child_id)
            );
            "#,
        )?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("connection lock poisoned".to_string()))
    }

    fn row_to_campaign(row: &rusqlite::Row) -> rusqlite::Result<Campaign> {
        let id: String = row.get(0)?;
        let query: String = row.get(1)?;
        let category_str: String = row.get(2)?;
        let mode_str: String = row.get(3)?;
        let langs_json: String = row.get(4)?;
        let created_at_str: String = row.get(5)?;
        let session_json: String = row.get(6)?;

        let category = Category::parse(&category_str).ok_or_else(|| invalid_column(2, &category_str))?;
        let mode = Mode::parse(&mode_str).ok_or_else(|| invalid_column(3, &mode_str))?;

        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| invalid_column(5, &created_at_str))?;

        // A damaged language list only widens the filter, so fall back to none.
        let langs: Vec<String> = serde_json::from_str(&langs_json).unwrap_or_default();
        let session: SessionState =
            serde_json::from_str(&session_json).map_err(|_| invalid_column(6, &session_json))?;

        Ok(Campaign {
            id,
            query,
            category,
            mode,
            langs,
            created_at,
            session,
        })
    }
}

fn invalid_column(idx: usize, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        format!("invalid value: {}", value).into(),
    )
}

impl CampaignStore for SqliteCampaignStore {
    fn create(&self, request: CreateCampaignRequest) -> Result<Campaign, StoreError> {
        let campaign = Campaign {
            id: uuid::Uuid::new_v4().to_string(),
            query: request.query,
            category: request.category,
            mode: request.mode,
            langs: request.langs,
            created_at: Utc::now(),
            session: SessionState::default(),
        };
        self.save(&campaign)?;
        Ok(campaign)
    }

    fn get(&self, id: &str) -> Result<Option<Campaign>, StoreError> {
        let conn = self.conn()?;
        let sql = format!("SELECT {} FROM campaigns WHERE id = ?", CAMPAIGN_COLUMNS);
        let campaign = conn
            .query_row(&sql, params![id], Self::row_to_campaign)
            .optional()?;
        Ok(campaign)
    }

    fn list_by_last_attempt(&self) -> Result<Vec<Campaign>, StoreError> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM campaigns ORDER BY last_attempt IS NOT NULL, last_attempt ASC, created_at ASC",
            CAMPAIGN_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], Self::row_to_campaign)?;

        let mut campaigns = Vec::new();
        for row in rows {
            campaigns.push(row?);
        }
        Ok(campaigns)
    }

    fn save(&self, campaign: &Campaign) -> Result<(), StoreError> {
        let conn = self.conn()?;

        let langs_json = serde_json::to_string(&campaign.langs)?;
        let session_json = serde_json::to_string(&campaign.session)?;

        conn.execute(
            r#"
            INSERT INTO campaigns (id, query, category, mode, langs, created_at, session, last_attempt, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                query = excluded.query,
                category = excluded.category,
                mode = excluded.mode,
                langs = excluded.langs,
                session = excluded.session,
                last_attempt = excluded.last_attempt,
                updated_at = excluded.updated_at
            "#,
            params![
                campaign.id,
                campaign.query,
                campaign.category.as_str(),
                campaign.mode.as_str(),
                langs_json,
                campaign.created_at.to_rfc3339(),
                session_json,
                campaign.session.last_attempt.map(|dt| dt.to_rfc3339()),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let conn = self.conn()?;
        let affected = conn.execute("DELETE FROM campaigns WHERE id = ?", params![id])?;
        Ok(affected > 0)
    }

    fn find_equivalent(
        &self,
        query: &str,
        category: Category,
    ) -> Result<Option<Campaign>, StoreError> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM campaigns WHERE lower(query) = lower(?) AND category = ? LIMIT 1",
            CAMPAIGN_COLUMNS
        );
        let campaign = conn
            .query_row(
                &sql,
                params![query.trim(), category.as_str()],
                Self::row_to_campaign,
            )
            .optional()?;
        Ok(campaign)
    }

    fn link_continuation(&self, parent_id: &str, child_id: &str) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO continuation_links (parent_id, child_id, created_at) VALUES (?, ?, ?)",
            params![parent_id, child_id, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn continuations_of(&self, parent_id: &str) -> Result<Vec<String>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT child_id FROM continuation_links WHERE parent_id = ? ORDER BY created_at ASC",
        )?;
        let rows = stmt.query_map(params![parent_id], |row| row.get::<_, String>(0))?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }

    fn count(&self) -> Result<i64, StoreError> {
        let conn = self.conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM campaigns", [], |row| row.get(0))?;
        Ok(count)
    }
}
