//! Rolling conversation history, capped per user. The prune runs in the same
//! transaction as the insert so a crash can't leave the cap exceeded.

use chrono::{DateTime, FixedOffset};

use saju_core::types::UserKey;

use crate::error::Result;
use crate::Db;

pub const DEFAULT_HISTORY_CAP: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: String,
    pub content: String,
    pub created_at: String,
}

pub struct HistoryStore {
    db: Db,
    cap: usize,
}

impl HistoryStore {
    pub fn new(db: Db) -> Self {
        Self {
            db,
            cap: DEFAULT_HISTORY_CAP,
        }
    }

    pub fn with_cap(db: Db, cap: usize) -> Self {
        Self { db, cap }
    }

    /// Append a turn and prune to the cap transactionally.
    pub fn append(
        &self,
        key: &UserKey,
        role: &str,
        content: &str,
        now: DateTime<FixedOffset>,
    ) -> Result<()> {
        let mut db = self.db.lock().unwrap();
        let tx = db.transaction()?;
        tx.execute(
            "INSERT INTO conversation_turns
             (platform, platform_user_id, role, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                key.platform.to_string(),
                key.platform_user_id,
                role,
                content,
                now.to_rfc3339()
            ],
        )?;
        // FIFO prune: keep only the `cap` newest rows for this user.
        tx.execute(
            "DELETE FROM conversation_turns
             WHERE platform = ?1 AND platform_user_id = ?2
               AND id NOT IN (
                 SELECT id FROM conversation_turns
                 WHERE platform = ?1 AND platform_user_id = ?2
                 ORDER BY id DESC LIMIT ?3
               )",
            rusqlite::params![key.platform.to_string(), key.platform_user_id, self.cap],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Up to `limit` most recent turns, oldest first.
    pub fn recent(&self, key: &UserKey, limit: usize) -> Result<Vec<Turn>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT role, content, created_at FROM conversation_turns
             WHERE platform = ?1 AND platform_user_id = ?2
             ORDER BY id DESC LIMIT ?3",
        )?;
        let mut turns: Vec<Turn> = stmt
            .query_map(
                rusqlite::params![key.platform.to_string(), key.platform_user_id, limit],
                |row| {
                    Ok(Turn {
                        role: row.get(0)?,
                        content: row.get(1)?,
                        created_at: row.get(2)?,
                    })
                },
            )?
            .filter_map(|r| r.ok())
            .collect();
        turns.reverse();
        Ok(turns)
    }

    pub fn count(&self, key: &UserKey) -> Result<usize> {
        let db = self.db.lock().unwrap();
        let n: i64 = db.query_row(
            "SELECT COUNT(*) FROM conversation_turns
             WHERE platform = ?1 AND platform_user_id = ?2",
            rusqlite::params![key.platform.to_string(), key.platform_user_id],
            |row| row.get(0),
        )?;
        Ok(n as usize)
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

    #[test]
    fn append_and_read_in_order() {
        let s = HistoryStore::new(crate::open_memory_db().unwrap());
        let now = FixedClock::at(2026, 8, 1, 9, 0).now_kst();
        s.append(&key("u1"), "user", "질문", now).unwrap();
        s.append(&key("u1"), "assistant", "답변", now).unwrap();
        let turns = s.recent(&key("u1"), 10).unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, "user");
        assert_eq!(turns[1].role, "assistant");
    }

    #[test]
    fn cap_keeps_exactly_n_newest() {
        let cap = 10usize;
        let s = HistoryStore::with_cap(crate::open_memory_db().unwrap(), cap);
        let now = FixedClock::at(2026, 8, 1, 9, 0).now_kst();
        // 2·N + 5 appends → exactly N newest remain.
        let total = 2 * cap + 5;
        for i in 0..total {
            s.append(&key("u1"), "user", &format!("msg {}", i), now)
                .unwrap();
        }
        assert_eq!(s.count(&key("u1")).unwrap(), cap);
        let turns = s.recent(&key("u1"), 100).unwrap();
        assert_eq!(turns.first().unwrap().content, format!("msg {}", total - cap));
        assert_eq!(turns.last().unwrap().content, format!("msg {}", total - 1));
    }

    #[test]
    fn users_are_isolated() {
        let s = HistoryStore::new(crate::open_memory_db().unwrap());
        let now = FixedClock::at(2026, 8, 1, 9, 0).now_kst();
        s.append(&key("a"), "user", "a의 질문", now).unwrap();
        s.append(&key("b"), "user", "b의 질문", now).unwrap();
        assert_eq!(s.count(&key("a")).unwrap(), 1);
        assert_eq!(s.recent(&key("b"), 10).unwrap()[0].content, "b의 질문");
    }
}
