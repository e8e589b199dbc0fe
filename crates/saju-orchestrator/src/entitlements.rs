//! Daily-quota gate. The spam throttle runs first (in-process); this gate is
//! the persistent one. Usage is committed only after a successful turn, so
//! failed analyses never consume quota.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use tracing::debug;

use saju_core::error::SajuError;
use saju_core::types::{Tier, UserKey};
use saju_store::billing::BillingStore;
use saju_store::profiles::Profile;
use saju_store::usage::UsageStore;

pub struct EntitlementGate {
    billing: Arc<BillingStore>,
    usage: Arc<UsageStore>,
}

impl EntitlementGate {
    pub fn new(billing: Arc<BillingStore>, usage: Arc<UsageStore>) -> Self {
        Self { billing, usage }
    }

    pub fn tier(
        &self,
        key: &UserKey,
        profile: Option<&Profile>,
        now: &DateTime<FixedOffset>,
    ) -> Result<Tier, SajuError> {
        Ok(self.billing.effective_tier(profile, key, now)?)
    }

    /// Check the daily quota without consuming it. Returns the resolved tier.
    pub fn check(
        &self,
        key: &UserKey,
        profile: Option<&Profile>,
        now: &DateTime<FixedOffset>,
    ) -> Result<Tier, SajuError> {
        let tier = self.tier(key, profile, now)?;
        let today = now.format("%Y-%m-%d").to_string();
        let used = self.usage.count(key, &today)?;
        if used >= tier.daily_limit() {
            debug!(user = %key, %tier, used, "daily quota exceeded");
            return Err(SajuError::QuotaExceeded { tier });
        }
        Ok(tier)
    }

    /// Consume one unit after a successful billable turn.
    pub fn commit(&self, key: &UserKey, now: &DateTime<FixedOffset>) -> Result<u32, SajuError> {
        let today = now.format("%Y-%m-%d").to_string();
        Ok(self.usage.increment(key, &today)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use saju_core::clock::{FixedClock, KstClock};
    use saju_core::types::Platform;

    fn gate() -> EntitlementGate {
        let db = saju_store::open_memory_db().unwrap();
        EntitlementGate::new(
            Arc::new(BillingStore::new(db.clone())),
            Arc::new(UsageStore::new(db)),
        )
    }

    fn key() -> UserKey {
        UserKey::new(Platform::Telegram, "u1")
    }

    #[test]
    fn free_tier_allows_three_per_day() {
        let g = gate();
        let now = FixedClock::at(2026, 8, 1, 9, 0).now_kst();
        for _ in 0..3 {
            g.check(&key(), None, &now).unwrap();
            g.commit(&key(), &now).unwrap();
        }
        let err = g.check(&key(), None, &now).unwrap_err();
        assert!(matches!(err, SajuError::QuotaExceeded { tier: Tier::Free }));
    }

    #[test]
    fn quota_resets_on_next_kst_day() {
        let g = gate();
        let day1 = FixedClock::at(2026, 8, 1, 9, 0).now_kst();
        for _ in 0..3 {
            g.commit(&key(), &day1).unwrap();
        }
        assert!(g.check(&key(), None, &day1).is_err());
        let day2 = FixedClock::at(2026, 8, 2, 0, 5).now_kst();
        assert!(g.check(&key(), None, &day2).is_ok());
    }

    #[test]
    fn check_without_commit_does_not_consume() {
        let g = gate();
        let now = FixedClock::at(2026, 8, 1, 9, 0).now_kst();
        for _ in 0..10 {
            g.check(&key(), None, &now).unwrap();
        }
        // Still within quota because nothing was committed.
        assert!(g.check(&key(), None, &now).is_ok());
    }
}
