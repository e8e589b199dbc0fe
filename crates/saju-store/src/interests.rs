//! Per-user interest counters with recency-weighted decay. Scores always
//! renormalise to ~100 in the same transaction as the update.

use chrono::{DateTime, Duration, FixedOffset};
use tracing::debug;

use saju_analysis::interest::InterestCategory;
use saju_core::types::UserKey;

use crate::error::Result;
use crate::Db;

const DECAY_FACTOR: f64 = 0.7;
const DECAY_AFTER_DAYS: i64 = 7;
const TRACK_WEIGHT: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct InterestRow {
    pub category: InterestCategory,
    pub ask_count: u32,
    pub weighted_count: f64,
    pub score: u32,
}

pub struct InterestStore {
    db: Db,
}

impl InterestStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Record one classified utterance: bump the matched categories and
    /// renormalise this user's scores so they sum to ~100.
    pub fn track(
        &self,
        key: &UserKey,
        categories: &[InterestCategory],
        now: DateTime<FixedOffset>,
    ) -> Result<()> {
        let now_str = now.to_rfc3339();
        let mut db = self.db.lock().unwrap();
        let tx = db.transaction()?;
        for cat in categories {
            tx.execute(
                "INSERT INTO interests
                 (platform, platform_user_id, category, ask_count, weighted_count,
                  score, last_asked)
                 VALUES (?1, ?2, ?3, 1, ?4, 0, ?5)
                 ON CONFLICT(platform, platform_user_id, category) DO UPDATE SET
                   ask_count = ask_count + 1,
                   weighted_count = weighted_count + ?4,
                   last_asked = ?5",
                rusqlite::params![
                    key.platform.to_string(),
                    key.platform_user_id,
                    cat.to_string(),
                    TRACK_WEIGHT,
                    now_str
                ],
            )?;
        }
        renormalize(&tx, key)?;
        tx.commit()?;
        Ok(())
    }

    /// All rows for a user, highest score first.
    pub fn scores(&self, key: &UserKey) -> Result<Vec<InterestRow>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT category, ask_count, weighted_count, score FROM interests
             WHERE platform = ?1 AND platform_user_id = ?2
             ORDER BY score DESC, category",
        )?;
        let rows = stmt
            .query_map(
                rusqlite::params![key.platform.to_string(), key.platform_user_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, u32>(1)?,
                        row.get::<_, f64>(2)?,
                        row.get::<_, u32>(3)?,
                    ))
                },
            )?
            .filter_map(|r| r.ok())
            .filter_map(|(cat, ask_count, weighted_count, score)| {
                Some(InterestRow {
                    category: cat.parse().ok()?,
                    ask_count,
                    weighted_count,
                    score,
                })
            })
            .collect();
        Ok(rows)
    }

    /// Top-n categories for push personalization.
    pub fn top(&self, key: &UserKey, n: usize) -> Result<Vec<InterestCategory>> {
        Ok(self
            .scores(key)?
            .into_iter()
            .take(n)
            .map(|r| r.category)
            .collect())
    }

    /// Scheduled decay: rows idle for more than 7 days lose 30% weight, then
    /// every affected user's scores are renormalised.
    pub fn decay_sweep(&self, now: DateTime<FixedOffset>) -> Result<usize> {
        let cutoff = (now - Duration::days(DECAY_AFTER_DAYS)).to_rfc3339();
        let mut db = self.db.lock().unwrap();
        let tx = db.transaction()?;

        let affected: Vec<(String, String)> = {
            let mut stmt = tx.prepare(
                "SELECT DISTINCT platform, platform_user_id FROM interests
                 WHERE last_asked < ?1",
            )?;
            let rows: Vec<_> = stmt
                .query_map([&cutoff], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })?
                .filter_map(|r| r.ok())
                .collect();
            rows
        };

        let n = tx.execute(
            "UPDATE interests SET weighted_count = weighted_count * ?1
             WHERE last_asked < ?2",
            rusqlite::params![DECAY_FACTOR, cutoff],
        )?;

        for (platform, uid) in &affected {
            renormalize_raw(&tx, platform, uid)?;
        }
        tx.commit()?;
        if n > 0 {
            debug!(rows = n, users = affected.len(), "interest decay applied");
        }
        Ok(n)
    }
}

fn renormalize(tx: &rusqlite::Transaction<'_>, key: &UserKey) -> Result<()> {
    renormalize_raw(tx, &key.platform.to_string(), &key.platform_user_id)
}

/// score = round(weighted / Σ weighted × 100) per row.
fn renormalize_raw(tx: &rusqlite::Transaction<'_>, platform: &str, uid: &str) -> Result<()> {
    let total: f64 = tx.query_row(
        "SELECT COALESCE(SUM(weighted_count), 0) FROM interests
         WHERE platform = ?1 AND platform_user_id = ?2",
        rusqlite::params![platform, uid],
        |row| row.get(0),
    )?;
    if total <= 0.0 {
        return Ok(());
    }
    tx.execute(
        "UPDATE interests
         SET score = CAST(ROUND(weighted_count / ?3 * 100) AS INTEGER)
         WHERE platform = ?1 AND platform_user_id = ?2",
        rusqlite::params![platform, uid, total],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use saju_core::clock::{FixedClock, KstClock};
    use saju_core::types::Platform;

    fn key(id: &str) -> UserKey {
        UserKey::new(Platform::Telegram, id)
    }

    fn sum_scores(s: &InterestStore, k: &UserKey) -> u32 {
        s.scores(k).unwrap().iter().map(|r| r.score).sum()
    }

    #[test]
    fn scores_normalize_to_about_100() {
        let s = InterestStore::new(crate::open_memory_db().unwrap());
        let now = FixedClock::at(2026, 8, 1, 9, 0).now_kst();
        let sequences: Vec<Vec<InterestCategory>> = vec![
            vec![InterestCategory::Love],
            vec![InterestCategory::Love, InterestCategory::Money],
            vec![InterestCategory::Career],
            vec![InterestCategory::Love],
            vec![InterestCategory::General],
        ];
        for cats in sequences {
            s.track(&key("u1"), &cats, now).unwrap();
            let total = sum_scores(&s, &key("u1"));
            assert!(
                (99..=101).contains(&total),
                "scores sum {} out of tolerance",
                total
            );
        }
    }

    #[test]
    fn ask_count_and_weight_accumulate() {
        let s = InterestStore::new(crate::open_memory_db().unwrap());
        let now = FixedClock::at(2026, 8, 1, 9, 0).now_kst();
        s.track(&key("u1"), &[InterestCategory::Love], now).unwrap();
        s.track(&key("u1"), &[InterestCategory::Love], now).unwrap();
        let rows = s.scores(&key("u1")).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].ask_count, 2);
        assert!((rows[0].weighted_count - 4.0).abs() < 1e-9);
        assert_eq!(rows[0].score, 100);
    }

    #[test]
    fn decay_applies_only_to_idle_rows() {
        let s = InterestStore::new(crate::open_memory_db().unwrap());
        let old = FixedClock::at(2026, 7, 1, 9, 0).now_kst();
        let now = FixedClock::at(2026, 8, 1, 9, 0).now_kst();

        s.track(&key("u1"), &[InterestCategory::Love], old).unwrap();
        s.track(&key("u1"), &[InterestCategory::Money], now).unwrap();

        let decayed = s.decay_sweep(now).unwrap();
        assert_eq!(decayed, 1);

        let rows = s.scores(&key("u1")).unwrap();
        let love = rows
            .iter()
            .find(|r| r.category == InterestCategory::Love)
            .unwrap();
        let money = rows
            .iter()
            .find(|r| r.category == InterestCategory::Money)
            .unwrap();
        assert!((love.weighted_count - 1.4).abs() < 1e-9);
        assert!((money.weighted_count - 2.0).abs() < 1e-9);
        assert!((99..=101).contains(&sum_scores(&s, &key("u1"))));
    }

    #[test]
    fn top_returns_highest_first() {
        let s = InterestStore::new(crate::open_memory_db().unwrap());
        let now = FixedClock::at(2026, 8, 1, 9, 0).now_kst();
        for _ in 0..3 {
            s.track(&key("u1"), &[InterestCategory::Money], now).unwrap();
        }
        s.track(&key("u1"), &[InterestCategory::Love], now).unwrap();
        let top = s.top(&key("u1"), 2).unwrap();
        assert_eq!(top[0], InterestCategory::Money);
        assert_eq!(top.len(), 2);
    }
}
