//! Push outcome log. Rows are immutable after creation except the two
//! engagement booleans, and `converted_to_premium` requires `is_opened`.

use chrono::{DateTime, FixedOffset};

use saju_core::types::UserKey;

use crate::error::Result;
use crate::Db;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushStatus {
    Success,
    Retried,
    Failed,
}

impl PushStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PushStatus::Success => "success",
            PushStatus::Retried => "retried",
            PushStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PushLogRow {
    pub id: i64,
    pub category: String,
    pub status: String,
    pub is_opened: bool,
    pub converted_to_premium: bool,
    pub sent_at: String,
}

pub struct PushLogStore {
    db: Db,
}

impl PushLogStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub fn append(
        &self,
        key: &UserKey,
        category: &str,
        message_text: &str,
        status: PushStatus,
        now: DateTime<FixedOffset>,
    ) -> Result<i64> {
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO push_log
             (platform, platform_user_id, category, message_text, status, sent_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                key.platform.to_string(),
                key.platform_user_id,
                category,
                message_text,
                status.as_str(),
                now.to_rfc3339()
            ],
        )?;
        Ok(db.last_insert_rowid())
    }

    pub fn mark_opened(&self, id: i64) -> Result<()> {
        let db = self.db.lock().unwrap();
        db.execute("UPDATE push_log SET is_opened = 1 WHERE id = ?1", [id])?;
        Ok(())
    }

    /// Only flips when the row was opened first.
    pub fn mark_converted(&self, id: i64) -> Result<bool> {
        let db = self.db.lock().unwrap();
        let n = db.execute(
            "UPDATE push_log SET converted_to_premium = 1
             WHERE id = ?1 AND is_opened = 1",
            [id],
        )?;
        Ok(n > 0)
    }

    /// Most recent push row for a user — button taps resolve against this.
    pub fn latest_id(&self, key: &UserKey) -> Result<Option<i64>> {
        let db = self.db.lock().unwrap();
        let id: Option<i64> = db
            .query_row(
                "SELECT id FROM push_log
                 WHERE platform = ?1 AND platform_user_id = ?2
                 ORDER BY id DESC LIMIT 1",
                rusqlite::params![key.platform.to_string(), key.platform_user_id],
                |row| row.get(0),
            )
            .ok();
        Ok(id)
    }

    pub fn recent(&self, key: &UserKey, limit: usize) -> Result<Vec<PushLogRow>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT id, category, status, is_opened, converted_to_premium, sent_at
             FROM push_log
             WHERE platform = ?1 AND platform_user_id = ?2
             ORDER BY id DESC LIMIT ?3",
        )?;
        let rows = stmt
            .query_map(
                rusqlite::params![key.platform.to_string(), key.platform_user_id, limit],
                |row| {
                    Ok(PushLogRow {
                        id: row.get(0)?,
                        category: row.get(1)?,
                        status: row.get(2)?,
                        is_opened: row.get::<_, i32>(3)? != 0,
                        converted_to_premium: row.get::<_, i32>(4)? != 0,
                        sent_at: row.get(5)?,
                    })
                },
            )?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }
}
