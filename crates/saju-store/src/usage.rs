//! Daily billable-request counters, one row per (user, KST day). The
//! increment is a single UPSERT so concurrent requests can't lose counts.

use saju_core::types::UserKey;

use crate::error::Result;
use crate::Db;

pub struct UsageStore {
    db: Db,
}

impl UsageStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Atomic increment; returns the new count.
    pub fn increment(&self, key: &UserKey, kst_date: &str) -> Result<u32> {
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO daily_usage (platform, platform_user_id, kst_date, count)
             VALUES (?1, ?2, ?3, 1)
             ON CONFLICT(platform, platform_user_id, kst_date)
             DO UPDATE SET count = count + 1",
            rusqlite::params![key.platform.to_string(), key.platform_user_id, kst_date],
        )?;
        let count: u32 = db.query_row(
            "SELECT count FROM daily_usage
             WHERE platform = ?1 AND platform_user_id = ?2 AND kst_date = ?3",
            rusqlite::params![key.platform.to_string(), key.platform_user_id, kst_date],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn count(&self, key: &UserKey, kst_date: &str) -> Result<u32> {
        let db = self.db.lock().unwrap();
        let count: Option<u32> = db
            .query_row(
                "SELECT count FROM daily_usage
                 WHERE platform = ?1 AND platform_user_id = ?2 AND kst_date = ?3",
                rusqlite::params![key.platform.to_string(), key.platform_user_id, kst_date],
                |row| row.get(0),
            )
            .ok();
        Ok(count.unwrap_or(0))
    }
}
