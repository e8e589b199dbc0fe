//! Durable pillar cache. Entries are immutable — INSERT OR IGNORE makes
//! racing identical writes harmless.

use chrono::Utc;
use rusqlite::OptionalExtension;
use tracing::warn;

use saju_pillars::service::PillarCache;
use saju_pillars::types::Pillars;

use crate::Db;

pub struct SqlitePillarCache {
    db: Db,
}

impl SqlitePillarCache {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

impl PillarCache for SqlitePillarCache {
    fn get(&self, key: &str) -> Option<Pillars> {
        let db = self.db.lock().unwrap();
        let json: Option<String> = db
            .query_row(
                "SELECT pillars FROM pillar_cache WHERE cache_key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()
            .ok()
            .flatten();
        json.and_then(|j| serde_json::from_str(&j).ok())
    }

    fn put(&self, key: &str, pillars: &Pillars) {
        let json = match serde_json::to_string(pillars) {
            Ok(j) => j,
            Err(e) => {
                warn!(error = %e, "pillar cache serialization failed");
                return;
            }
        };
        let db = self.db.lock().unwrap();
        if let Err(e) = db.execute(
            "INSERT OR IGNORE INTO pillar_cache (cache_key, pillars, created_at)
             VALUES (?1, ?2, ?3)",
            rusqlite::params![key, json, Utc::now().to_rfc3339()],
        ) {
            warn!(error = %e, "pillar cache write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use saju_pillars::types::Pillar;

    #[test]
    fn put_get_round_trip_and_immutability() {
        let cache = SqlitePillarCache::new(crate::open_memory_db().unwrap());
        let a = Pillars {
            year: Pillar::new(0, 10),
            month: Pillar::new(2, 2),
            day: Pillar::new(4, 4),
            hour: Pillar::new(6, 6),
        };
        cache.put("k", &a);
        assert_eq!(cache.get("k"), Some(a));

        // A second write with different content is ignored — first wins.
        let b = Pillars {
            year: Pillar::new(1, 1),
            month: Pillar::new(1, 1),
            day: Pillar::new(1, 1),
            hour: Pillar::new(1, 1),
        };
        cache.put("k", &b);
        assert_eq!(cache.get("k"), Some(a));
        assert_eq!(cache.get("missing"), None);
    }
}
