//! Opaque payment records written by the payment webhook and read by the
//! entitlement lookup. The core never talks to the gateway itself.

use chrono::{DateTime, FixedOffset};
use rusqlite::OptionalExtension;
use tracing::info;

use saju_core::types::{Tier, UserKey};

use crate::error::Result;
use crate::profiles::Profile;
use crate::Db;

pub struct BillingStore {
    db: Db,
}

impl BillingStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub fn record_order(
        &self,
        key: &UserKey,
        product: &str,
        amount: i64,
        now: DateTime<FixedOffset>,
    ) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO orders (id, platform, platform_user_id, product, amount, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                id,
                key.platform.to_string(),
                key.platform_user_id,
                product,
                amount,
                now.to_rfc3339()
            ],
        )?;
        info!(user = %key, product, amount, "order recorded");
        Ok(id)
    }

    /// Current subscription tier if the row is still valid at `now`.
    pub fn subscription_tier(
        &self,
        key: &UserKey,
        now: &DateTime<FixedOffset>,
    ) -> Result<Option<Tier>> {
        let db = self.db.lock().unwrap();
        let row: Option<(String, String)> = db
            .query_row(
                "SELECT tier, expires_at FROM subscriptions
                 WHERE platform = ?1 AND platform_user_id = ?2",
                rusqlite::params![key.platform.to_string(), key.platform_user_id],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?;
        Ok(row.and_then(|(tier, expires)| {
            if expires.as_str() > now.to_rfc3339().as_str() {
                tier.parse().ok()
            } else {
                None
            }
        }))
    }

    pub fn set_subscription(
        &self,
        key: &UserKey,
        tier: Tier,
        expires_at: &str,
        now: DateTime<FixedOffset>,
    ) -> Result<()> {
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO subscriptions
             (platform, platform_user_id, tier, expires_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(platform, platform_user_id) DO UPDATE SET
               tier = excluded.tier,
               expires_at = excluded.expires_at",
            rusqlite::params![
                key.platform.to_string(),
                key.platform_user_id,
                tier.to_string(),
                expires_at,
                now.to_rfc3339()
            ],
        )?;
        Ok(())
    }

    pub fn add_credits(
        &self,
        key: &UserKey,
        delta: i64,
        reason: &str,
        now: DateTime<FixedOffset>,
    ) -> Result<()> {
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO credit_ledger
             (platform, platform_user_id, delta, reason, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                key.platform.to_string(),
                key.platform_user_id,
                delta,
                reason,
                now.to_rfc3339()
            ],
        )?;
        Ok(())
    }

    pub fn credit_balance(&self, key: &UserKey) -> Result<i64> {
        let db = self.db.lock().unwrap();
        let balance: i64 = db.query_row(
            "SELECT COALESCE(SUM(delta), 0) FROM credit_ledger
             WHERE platform = ?1 AND platform_user_id = ?2",
            rusqlite::params![key.platform.to_string(), key.platform_user_id],
            |row| row.get(0),
        )?;
        Ok(balance)
    }

    /// Effective tier: the maximum valid one across the profile premium flag,
    /// the subscription row, and the credit balance.
    pub fn effective_tier(
        &self,
        profile: Option<&Profile>,
        key: &UserKey,
        now: &DateTime<FixedOffset>,
    ) -> Result<Tier> {
        let mut tier = Tier::Free;
        if profile.map(|p| p.premium_valid_at(now)).unwrap_or(false) {
            tier = tier.max(Tier::Premium);
        }
        if let Some(sub) = self.subscription_tier(key, now)? {
            tier = tier.max(sub);
        }
        if self.credit_balance(key)? > 0 {
            tier = tier.max(Tier::Basic);
        }
        Ok(tier)
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
    fn default_tier_is_free() {
        let s = BillingStore::new(crate::open_memory_db().unwrap());
        let now = FixedClock::at(2026, 8, 1, 9, 0).now_kst();
        assert_eq!(s.effective_tier(None, &key("u1"), &now).unwrap(), Tier::Free);
    }

    #[test]
    fn credits_grant_basic() {
        let s = BillingStore::new(crate::open_memory_db().unwrap());
        let now = FixedClock::at(2026, 8, 1, 9, 0).now_kst();
        s.add_credits(&key("u1"), 3, "purchase", now).unwrap();
        assert_eq!(s.credit_balance(&key("u1")).unwrap(), 3);
        assert_eq!(
            s.effective_tier(None, &key("u1"), &now).unwrap(),
            Tier::Basic
        );
        s.add_credits(&key("u1"), -3, "spend", now).unwrap();
        assert_eq!(s.effective_tier(None, &key("u1"), &now).unwrap(), Tier::Free);
    }

    #[test]
    fn subscription_beats_credits_until_expiry() {
        let s = BillingStore::new(crate::open_memory_db().unwrap());
        let now = FixedClock::at(2026, 8, 1, 9, 0).now_kst();
        s.add_credits(&key("u1"), 1, "purchase", now).unwrap();

        let future = (now + chrono::Duration::days(30)).to_rfc3339();
        s.set_subscription(&key("u1"), Tier::Premium, &future, now)
            .unwrap();
        assert_eq!(
            s.effective_tier(None, &key("u1"), &now).unwrap(),
            Tier::Premium
        );

        let past = (now - chrono::Duration::days(1)).to_rfc3339();
        s.set_subscription(&key("u1"), Tier::Premium, &past, now)
            .unwrap();
        // Expired subscription — credits still grant basic.
        assert_eq!(
            s.effective_tier(None, &key("u1"), &now).unwrap(),
            Tier::Basic
        );
    }

    #[test]
    fn order_rows_are_recorded() {
        let s = BillingStore::new(crate::open_memory_db().unwrap());
        let now = FixedClock::at(2026, 8, 1, 9, 0).now_kst();
        let id = s
            .record_order(&key("u1"), "premium_unlock", 4900, now)
            .unwrap();
        assert!(!id.is_empty());
    }
}
