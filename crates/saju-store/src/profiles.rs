//! Birth profile repository. One row per (platform, user); the profile owns
//! its conversation turns (deleted together on reset).

use chrono::{DateTime, FixedOffset};
use rusqlite::OptionalExtension;
use tracing::info;

use saju_core::types::{BirthInfo, Gender, UserKey};

use crate::error::{Result, StoreError};
use crate::Db;

#[derive(Debug, Clone)]
pub struct Profile {
    pub key: UserKey,
    pub display_name: Option<String>,
    pub birth: BirthInfo,
    pub is_active: bool,
    pub premium_until: Option<String>,
    pub free_unlocks: u32,
    pub referral_code: Option<String>,
    pub last_active_at: Option<String>,
}

impl Profile {
    /// Valid premium flag at `now` (RFC3339 strings share the +09:00 offset,
    /// so lexicographic comparison is chronological).
    pub fn premium_valid_at(&self, now: &DateTime<FixedOffset>) -> bool {
        self.premium_until
            .as_deref()
            .map(|until| until > now.to_rfc3339().as_str())
            .unwrap_or(false)
    }
}

pub struct ProfileStore {
    db: Db,
}

impl ProfileStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Insert or replace the birth tuple for this user. Validates ranges.
    pub fn upsert(
        &self,
        key: &UserKey,
        birth: &BirthInfo,
        display_name: Option<&str>,
        now: DateTime<FixedOffset>,
    ) -> Result<()> {
        birth.validate().map_err(StoreError::Invalid)?;
        let now_str = now.to_rfc3339();
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO profiles
             (platform, platform_user_id, display_name, birth_year, birth_month,
              birth_day, birth_hour, birth_minute, gender, is_active,
              last_active_at, created_at, updated_at)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,1,?10,?10,?10)
             ON CONFLICT(platform, platform_user_id) DO UPDATE SET
               display_name = excluded.display_name,
               birth_year = excluded.birth_year,
               birth_month = excluded.birth_month,
               birth_day = excluded.birth_day,
               birth_hour = excluded.birth_hour,
               birth_minute = excluded.birth_minute,
               gender = excluded.gender,
               is_active = 1,
               updated_at = excluded.updated_at",
            rusqlite::params![
                key.platform.to_string(),
                key.platform_user_id,
                display_name,
                birth.year,
                birth.month,
                birth.day,
                birth.hour,
                birth.minute,
                birth.gender.to_string(),
                now_str,
            ],
        )?;
        info!(user = %key, "profile upserted");
        Ok(())
    }

    pub fn get(&self, key: &UserKey) -> Result<Option<Profile>> {
        let db = self.db.lock().unwrap();
        let row = db
            .query_row(
                "SELECT display_name, birth_year, birth_month, birth_day, birth_hour,
                        birth_minute, gender, is_active, premium_until, free_unlocks,
                        referral_code, last_active_at
                 FROM profiles WHERE platform = ?1 AND platform_user_id = ?2",
                rusqlite::params![key.platform.to_string(), key.platform_user_id],
                |row| {
                    Ok((
                        row.get::<_, Option<String>>(0)?,
                        row.get::<_, i32>(1)?,
                        row.get::<_, u32>(2)?,
                        row.get::<_, u32>(3)?,
                        row.get::<_, u32>(4)?,
                        row.get::<_, u32>(5)?,
                        row.get::<_, String>(6)?,
                        row.get::<_, i32>(7)?,
                        row.get::<_, Option<String>>(8)?,
                        row.get::<_, u32>(9)?,
                        row.get::<_, Option<String>>(10)?,
                        row.get::<_, Option<String>>(11)?,
                    ))
                },
            )
            .optional()?;

        Ok(row.map(
            |(
                display_name,
                year,
                month,
                day,
                hour,
                minute,
                gender,
                is_active,
                premium_until,
                free_unlocks,
                referral_code,
                last_active_at,
            )| {
                Profile {
                    key: key.clone(),
                    display_name,
                    birth: BirthInfo {
                        year,
                        month,
                        day,
                        hour,
                        minute,
                        gender: gender.parse().unwrap_or(Gender::F),
                    },
                    is_active: is_active != 0,
                    premium_until,
                    free_unlocks,
                    referral_code,
                    last_active_at,
                }
            },
        ))
    }

    /// Delete the profile and its conversation turns (reset + re-enter flow).
    pub fn delete(&self, key: &UserKey) -> Result<bool> {
        let mut db = self.db.lock().unwrap();
        let tx = db.transaction()?;
        tx.execute(
            "DELETE FROM conversation_turns WHERE platform = ?1 AND platform_user_id = ?2",
            rusqlite::params![key.platform.to_string(), key.platform_user_id],
        )?;
        let n = tx.execute(
            "DELETE FROM profiles WHERE platform = ?1 AND platform_user_id = ?2",
            rusqlite::params![key.platform.to_string(), key.platform_user_id],
        )?;
        tx.commit()?;
        info!(user = %key, deleted = n > 0, "profile reset");
        Ok(n > 0)
    }

    /// Flip `is_active` — used when the platform reports the user blocked us.
    pub fn set_active(&self, key: &UserKey, active: bool) -> Result<()> {
        let db = self.db.lock().unwrap();
        db.execute(
            "UPDATE profiles SET is_active = ?3
             WHERE platform = ?1 AND platform_user_id = ?2",
            rusqlite::params![
                key.platform.to_string(),
                key.platform_user_id,
                active as i32
            ],
        )?;
        Ok(())
    }

    /// Record activity for the daily-push eligibility window.
    pub fn touch_activity(&self, key: &UserKey, now: DateTime<FixedOffset>) -> Result<()> {
        let db = self.db.lock().unwrap();
        db.execute(
            "UPDATE profiles SET last_active_at = ?3
             WHERE platform = ?1 AND platform_user_id = ?2",
            rusqlite::params![
                key.platform.to_string(),
                key.platform_user_id,
                now.to_rfc3339()
            ],
        )?;
        Ok(())
    }

    pub fn award_free_unlock(&self, key: &UserKey) -> Result<()> {
        let db = self.db.lock().unwrap();
        db.execute(
            "UPDATE profiles SET free_unlocks = free_unlocks + 1
             WHERE platform = ?1 AND platform_user_id = ?2",
            rusqlite::params![key.platform.to_string(), key.platform_user_id],
        )?;
        Ok(())
    }

    /// Spend one free unlock. Returns false when none remain.
    pub fn use_free_unlock(&self, key: &UserKey) -> Result<bool> {
        let db = self.db.lock().unwrap();
        let n = db.execute(
            "UPDATE profiles SET free_unlocks = free_unlocks - 1
             WHERE platform = ?1 AND platform_user_id = ?2 AND free_unlocks > 0",
            rusqlite::params![key.platform.to_string(), key.platform_user_id],
        )?;
        Ok(n > 0)
    }

    pub fn set_premium_until(&self, key: &UserKey, until: &str) -> Result<()> {
        let db = self.db.lock().unwrap();
        db.execute(
            "UPDATE profiles SET premium_until = ?3
             WHERE platform = ?1 AND platform_user_id = ?2",
            rusqlite::params![key.platform.to_string(), key.platform_user_id, until],
        )?;
        Ok(())
    }

    /// Assign (or return the existing) invite code for this user.
    pub fn ensure_referral_code(&self, key: &UserKey) -> Result<String> {
        if let Some(p) = self.get(key)? {
            if let Some(code) = p.referral_code {
                return Ok(code);
            }
        }
        let code = format!(
            "ref_{}",
            uuid::Uuid::new_v4().simple().to_string()[..8].to_uppercase()
        );
        let db = self.db.lock().unwrap();
        db.execute(
            "UPDATE profiles SET referral_code = ?3
             WHERE platform = ?1 AND platform_user_id = ?2",
            rusqlite::params![key.platform.to_string(), key.platform_user_id, code],
        )?;
        Ok(code)
    }

    pub fn find_by_referral_code(&self, code: &str) -> Result<Option<UserKey>> {
        let db = self.db.lock().unwrap();
        let row = db
            .query_row(
                "SELECT platform, platform_user_id FROM profiles WHERE referral_code = ?1",
                rusqlite::params![code],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;
        Ok(row.and_then(|(platform, uid)| {
            platform
                .parse()
                .ok()
                .map(|p| UserKey::new(p, uid))
        }))
    }

    /// Active profiles whose last activity is within `window_days` of `now`.
    pub fn list_push_eligible(
        &self,
        now: DateTime<FixedOffset>,
        window_days: i64,
    ) -> Result<Vec<Profile>> {
        let cutoff = (now - chrono::Duration::days(window_days)).to_rfc3339();
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT platform, platform_user_id FROM profiles
             WHERE is_active = 1 AND last_active_at IS NOT NULL AND last_active_at >= ?1
             ORDER BY id",
        )?;
        let keys: Vec<UserKey> = stmt
            .query_map([cutoff], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .filter_map(|r| r.ok())
            .filter_map(|(p, uid)| p.parse().ok().map(|pf| UserKey::new(pf, uid)))
            .collect();
        drop(stmt);
        drop(db);

        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(p) = self.get(&key)? {
                out.push(p);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use saju_core::clock::{FixedClock, KstClock};
    use saju_core::types::Platform;

    fn store() -> ProfileStore {
        ProfileStore::new(crate::open_memory_db().unwrap())
    }

    fn key(id: &str) -> UserKey {
        UserKey::new(Platform::Telegram, id)
    }

    fn birth() -> BirthInfo {
        BirthInfo {
            year: 1994,
            month: 10,
            day: 3,
            hour: 19,
            minute: 30,
            gender: Gender::F,
        }
    }

    #[test]
    fn upsert_then_get_round_trips() {
        let s = store();
        let now = FixedClock::at(2026, 8, 1, 9, 0).now_kst();
        s.upsert(&key("u1"), &birth(), Some("지민"), now).unwrap();
        let p = s.get(&key("u1")).unwrap().unwrap();
        assert_eq!(p.birth, birth());
        assert_eq!(p.display_name.as_deref(), Some("지민"));
        assert!(p.is_active);
        assert_eq!(p.free_unlocks, 0);
    }

    #[test]
    fn upsert_is_single_row_per_user() {
        let s = store();
        let now = FixedClock::at(2026, 8, 1, 9, 0).now_kst();
        s.upsert(&key("u1"), &birth(), None, now).unwrap();
        let mut b2 = birth();
        b2.year = 1990;
        s.upsert(&key("u1"), &b2, None, now).unwrap();
        let p = s.get(&key("u1")).unwrap().unwrap();
        assert_eq!(p.birth.year, 1990);
    }

    #[test]
    fn free_unlock_counter() {
        let s = store();
        let now = FixedClock::at(2026, 8, 1, 9, 0).now_kst();
        s.upsert(&key("u1"), &birth(), None, now).unwrap();
        assert!(!s.use_free_unlock(&key("u1")).unwrap());
        s.award_free_unlock(&key("u1")).unwrap();
        assert!(s.use_free_unlock(&key("u1")).unwrap());
        assert!(!s.use_free_unlock(&key("u1")).unwrap());
    }

    #[test]
    fn referral_code_is_stable_and_findable() {
        let s = store();
        let now = FixedClock::at(2026, 8, 1, 9, 0).now_kst();
        s.upsert(&key("u1"), &birth(), None, now).unwrap();
        let code = s.ensure_referral_code(&key("u1")).unwrap();
        assert!(code.starts_with("ref_"));
        assert_eq!(s.ensure_referral_code(&key("u1")).unwrap(), code);
        assert_eq!(s.find_by_referral_code(&code).unwrap().unwrap(), key("u1"));
        assert!(s.find_by_referral_code("ref_NOPE").unwrap().is_none());
    }

    #[test]
    fn push_eligibility_window() {
        let s = store();
        let clock = FixedClock::at(2026, 8, 1, 8, 0);
        let now = clock.now_kst();
        s.upsert(&key("fresh"), &birth(), None, now).unwrap();
        s.touch_activity(&key("fresh"), now).unwrap();

        s.upsert(&key("stale"), &birth(), None, now).unwrap();
        s.touch_activity(&key("stale"), now - chrono::Duration::days(10))
            .unwrap();

        s.upsert(&key("blocked"), &birth(), None, now).unwrap();
        s.touch_activity(&key("blocked"), now).unwrap();
        s.set_active(&key("blocked"), false).unwrap();

        let eligible = s.list_push_eligible(now, 7).unwrap();
        let ids: Vec<&str> = eligible
            .iter()
            .map(|p| p.key.platform_user_id.as_str())
            .collect();
        assert_eq!(ids, vec!["fresh"]);
    }

    #[test]
    fn premium_flag_respects_expiry() {
        let s = store();
        let clock = FixedClock::at(2026, 8, 1, 9, 0);
        let now = clock.now_kst();
        s.upsert(&key("u1"), &birth(), None, now).unwrap();

        let future = (now + chrono::Duration::days(30)).to_rfc3339();
        s.set_premium_until(&key("u1"), &future).unwrap();
        assert!(s.get(&key("u1")).unwrap().unwrap().premium_valid_at(&now));

        let past = (now - chrono::Duration::days(1)).to_rfc3339();
        s.set_premium_until(&key("u1"), &past).unwrap();
        assert!(!s.get(&key("u1")).unwrap().unwrap().premium_valid_at(&now));
    }
}
