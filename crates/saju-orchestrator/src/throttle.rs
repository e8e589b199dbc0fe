//! In-process spam throttle. Per-process only — with multiple instances the
//! guarantee is per-instance; strict global throttling would have to move to
//! the shared store.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const WINDOW: Duration = Duration::from_secs(3);
const CAPACITY: usize = 1000;

/// Bounded last-request map. When the map exceeds capacity the oldest
/// entries are swept out, LRU-style.
pub struct SpamThrottle {
    inner: Mutex<HashMap<String, Instant>>,
    window: Duration,
    capacity: usize,
}

impl Default for SpamThrottle {
    fn default() -> Self {
        Self::new(WINDOW, CAPACITY)
    }
}

impl SpamThrottle {
    pub fn new(window: Duration, capacity: usize) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            window,
            capacity,
        }
    }

    /// Allow or reject. On rejection returns `retry_after` whole seconds
    /// (at least 1); on allow the request time is recorded.
    pub fn check(&self, user: &str) -> Result<(), u64> {
        let now = Instant::now();
        let mut map = self.inner.lock().unwrap();

        if let Some(last) = map.get(user) {
            let elapsed = now.duration_since(*last);
            if elapsed < self.window {
                let remaining = self.window - elapsed;
                let retry_after = remaining.as_secs_f64().ceil() as u64;
                return Err(retry_after.max(1));
            }
        }

        if map.len() >= self.capacity && !map.contains_key(user) {
            sweep_oldest(&mut map, self.capacity / 4);
        }
        map.insert(user.to_string(), now);
        Ok(())
    }
}

/// Remove the `n` oldest entries.
fn sweep_oldest(map: &mut HashMap<String, Instant>, n: usize) {
    let mut entries: Vec<(String, Instant)> =
        map.iter().map(|(k, v)| (k.clone(), *v)).collect();
    entries.sort_by_key(|(_, t)| *t);
    for (key, _) in entries.into_iter().take(n) {
        map.remove(&key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_request_within_window_is_rejected() {
        let t = SpamThrottle::default();
        assert!(t.check("u1").is_ok());
        let retry = t.check("u1").unwrap_err();
        assert!((1..=3).contains(&retry), "retry_after {} out of range", retry);
    }

    #[test]
    fn different_users_do_not_interfere() {
        let t = SpamThrottle::default();
        assert!(t.check("u1").is_ok());
        assert!(t.check("u2").is_ok());
    }

    #[test]
    fn request_allowed_after_window() {
        let t = SpamThrottle::new(Duration::from_millis(50), 10);
        assert!(t.check("u1").is_ok());
        assert!(t.check("u1").is_err());
        std::thread::sleep(Duration::from_millis(60));
        assert!(t.check("u1").is_ok());
    }

    #[test]
    fn capacity_sweep_keeps_map_bounded() {
        let t = SpamThrottle::new(Duration::from_secs(3), 100);
        for i in 0..150 {
            let _ = t.check(&format!("user-{}", i));
        }
        let len = t.inner.lock().unwrap().len();
        assert!(len <= 101, "map grew to {}", len);
    }
}
