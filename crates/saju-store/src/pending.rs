//! Short-TTL pending actions — the sole arbiter of what the next utterance
//! means. Single slot per (user, action type); expired rows are never
//! returned.

use chrono::{DateTime, Duration, FixedOffset};
use rusqlite::OptionalExtension;
use serde::{Deserialize, Serialize};
use tracing::debug;

use saju_core::types::UserKey;

use crate::error::Result;
use crate::Db;

pub const DEFAULT_TTL_MINUTES: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionType {
    Referral,
    Compatibility,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Referral => "referral",
            ActionType::Compatibility => "compatibility",
        }
    }
}

/// One payload variant per action type, so consumers branch statically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PendingPayload {
    Referral { code: String },
    Compatibility { question: String },
}

impl PendingPayload {
    pub fn action_type(&self) -> ActionType {
        match self {
            PendingPayload::Referral { .. } => ActionType::Referral,
            PendingPayload::Compatibility { .. } => ActionType::Compatibility,
        }
    }
}

pub struct PendingStore {
    db: Db,
}

impl PendingStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Upsert: any existing row with the same key is deleted first so there is
    /// always at most one slot per (user, action type).
    pub fn set(
        &self,
        key: &UserKey,
        payload: &PendingPayload,
        ttl: Option<Duration>,
        now: DateTime<FixedOffset>,
    ) -> Result<()> {
        let ttl = ttl.unwrap_or_else(|| Duration::minutes(DEFAULT_TTL_MINUTES));
        let action = payload.action_type().as_str();
        let payload_json = serde_json::to_string(payload)?;
        let expires = (now + ttl).to_rfc3339();

        let mut db = self.db.lock().unwrap();
        let tx = db.transaction()?;
        tx.execute(
            "DELETE FROM pending_actions
             WHERE platform = ?1 AND platform_user_id = ?2 AND action_type = ?3",
            rusqlite::params![key.platform.to_string(), key.platform_user_id, action],
        )?;
        tx.execute(
            "INSERT INTO pending_actions
             (platform, platform_user_id, action_type, payload, expires_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                key.platform.to_string(),
                key.platform_user_id,
                action,
                payload_json,
                expires,
                now.to_rfc3339()
            ],
        )?;
        tx.commit()?;
        debug!(user = %key, action, "pending action set");
        Ok(())
    }

    /// Latest non-expired payload for this slot.
    pub fn get(
        &self,
        key: &UserKey,
        action: ActionType,
        now: DateTime<FixedOffset>,
    ) -> Result<Option<PendingPayload>> {
        let db = self.db.lock().unwrap();
        let row: Option<String> = db
            .query_row(
                "SELECT payload FROM pending_actions
                 WHERE platform = ?1 AND platform_user_id = ?2 AND action_type = ?3
                   AND expires_at > ?4",
                rusqlite::params![
                    key.platform.to_string(),
                    key.platform_user_id,
                    action.as_str(),
                    now.to_rfc3339()
                ],
                |r| r.get(0),
            )
            .optional()?;
        match row {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Get-and-consume in one step.
    pub fn take(
        &self,
        key: &UserKey,
        action: ActionType,
        now: DateTime<FixedOffset>,
    ) -> Result<Option<PendingPayload>> {
        let payload = self.get(key, action, now)?;
        if payload.is_some() {
            self.delete(key, action)?;
        }
        Ok(payload)
    }

    pub fn delete(&self, key: &UserKey, action: ActionType) -> Result<()> {
        let db = self.db.lock().unwrap();
        db.execute(
            "DELETE FROM pending_actions
             WHERE platform = ?1 AND platform_user_id = ?2 AND action_type = ?3",
            rusqlite::params![
                key.platform.to_string(),
                key.platform_user_id,
                action.as_str()
            ],
        )?;
        Ok(())
    }

    /// Periodic sweep. Returns how many expired rows were deleted.
    pub fn sweep_expired(&self, now: DateTime<FixedOffset>) -> Result<usize> {
        let db = self.db.lock().unwrap();
        let n = db.execute(
            "DELETE FROM pending_actions WHERE expires_at <= ?1",
            rusqlite::params![now.to_rfc3339()],
        )?;
        if n > 0 {
            debug!(count = n, "expired pending actions swept");
        }
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use saju_core::clock::{FixedClock, KstClock};
    use saju_core::types::Platform;

    fn key(id: &str) -> UserKey {
        UserKey::new(Platform::Telegram, id)
    }

    fn compat(question: &str) -> PendingPayload {
        PendingPayload::Compatibility {
            question: question.to_string(),
        }
    }

    #[test]
    fn single_slot_keeps_latest() {
        let s = PendingStore::new(crate::open_memory_db().unwrap());
        let now = FixedClock::at(2026, 8, 1, 9, 0).now_kst();
        s.set(&key("u1"), &compat("p1"), None, now).unwrap();
        s.set(&key("u1"), &compat("p2"), None, now).unwrap();
        let got = s.get(&key("u1"), ActionType::Compatibility, now).unwrap();
        assert_eq!(got, Some(compat("p2")));
    }

    #[test]
    fn expired_rows_are_invisible() {
        let s = PendingStore::new(crate::open_memory_db().unwrap());
        let now = FixedClock::at(2026, 8, 1, 9, 0).now_kst();
        s.set(&key("u1"), &compat("q"), Some(Duration::minutes(10)), now)
            .unwrap();

        let later = now + Duration::minutes(11);
        assert!(s
            .get(&key("u1"), ActionType::Compatibility, later)
            .unwrap()
            .is_none());
        // Still physically present until the sweep runs.
        assert_eq!(s.sweep_expired(later).unwrap(), 1);
        assert_eq!(s.sweep_expired(later).unwrap(), 0);
    }

    #[test]
    fn take_consumes() {
        let s = PendingStore::new(crate::open_memory_db().unwrap());
        let now = FixedClock::at(2026, 8, 1, 9, 0).now_kst();
        s.set(&key("u1"), &compat("q"), None, now).unwrap();
        assert!(s
            .take(&key("u1"), ActionType::Compatibility, now)
            .unwrap()
            .is_some());
        assert!(s
            .take(&key("u1"), ActionType::Compatibility, now)
            .unwrap()
            .is_none());
    }

    #[test]
    fn slots_are_independent_per_action_type() {
        let s = PendingStore::new(crate::open_memory_db().unwrap());
        let now = FixedClock::at(2026, 8, 1, 9, 0).now_kst();
        s.set(
            &key("u1"),
            &PendingPayload::Referral { code: "ref_ABC123".into() },
            None,
            now,
        )
        .unwrap();
        s.set(&key("u1"), &compat("q"), None, now).unwrap();
        assert!(s.get(&key("u1"), ActionType::Referral, now).unwrap().is_some());
        assert!(s
            .get(&key("u1"), ActionType::Compatibility, now)
            .unwrap()
            .is_some());
    }
}
