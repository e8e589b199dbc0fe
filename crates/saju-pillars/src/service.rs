//! Remote-first pillar computation with a durable cache in front.

use std::sync::Arc;

use tracing::{debug, warn};

use saju_core::types::BirthInfo;

use crate::engine::compute_pillars;
use crate::error::Result;
use crate::remote::PillarApiClient;
use crate::types::Pillars;

/// Durable cache keyed by the birth tuple. Entries are immutable — racing
/// writers produce identical rows, so `put` may silently ignore conflicts.
pub trait PillarCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Pillars>;
    fn put(&self, key: &str, pillars: &Pillars);
}

/// No-op cache for tests and cacheless setups.
pub struct NullCache;

impl PillarCache for NullCache {
    fn get(&self, _key: &str) -> Option<Pillars> {
        None
    }
    fn put(&self, _key: &str, _pillars: &Pillars) {}
}

pub struct PillarService {
    remote: Option<PillarApiClient>,
    cache: Arc<dyn PillarCache>,
}

impl PillarService {
    pub fn new(remote: Option<PillarApiClient>, cache: Arc<dyn PillarCache>) -> Self {
        Self { remote, cache }
    }

    pub fn local_only(cache: Arc<dyn PillarCache>) -> Self {
        Self {
            remote: None,
            cache,
        }
    }

    /// Compute the four pillars: cache → remote service → local calculator.
    /// The local result is authoritative when the remote path is exhausted.
    pub async fn compute(&self, birth: &BirthInfo) -> Result<Pillars> {
        let key = birth.cache_key();
        if let Some(hit) = self.cache.get(&key) {
            debug!(%key, "pillar cache hit");
            return Ok(hit);
        }

        let pillars = match &self.remote {
            Some(client) => match client.fetch(birth).await {
                Ok(p) => p,
                Err(e) => {
                    warn!(error = %e, "pillar API exhausted — falling back to local calculator");
                    compute_pillars(birth)?
                }
            },
            None => compute_pillars(birth)?,
        };

        self.cache.put(&key, &pillars);
        Ok(pillars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use saju_core::types::Gender;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MapCache(Mutex<HashMap<String, Pillars>>);

    impl PillarCache for MapCache {
        fn get(&self, key: &str) -> Option<Pillars> {
            self.0.lock().unwrap().get(key).copied()
        }
        fn put(&self, key: &str, pillars: &Pillars) {
            self.0
                .lock()
                .unwrap()
                .entry(key.to_string())
                .or_insert(*pillars);
        }
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

    #[tokio::test]
    async fn local_fallback_populates_cache() {
        let cache = Arc::new(MapCache(Mutex::new(HashMap::new())));
        let svc = PillarService::local_only(cache.clone());

        let first = svc.compute(&birth()).await.unwrap();
        assert!(cache.get(&birth().cache_key()).is_some());

        let second = svc.compute(&birth()).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn invalid_birth_is_not_cached() {
        let cache = Arc::new(MapCache(Mutex::new(HashMap::new())));
        let svc = PillarService::local_only(cache.clone());
        let mut b = birth();
        b.month = 13;
        assert!(svc.compute(&b).await.is_err());
        assert!(cache.0.lock().unwrap().is_empty());
    }
}
