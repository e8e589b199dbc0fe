//! Per-user serialization gates. Consecutive requests from the same user are
//! strictly ordered; different users never block each other.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

const SWEEP_THRESHOLD: usize = 2048;

#[derive(Default)]
pub struct UserGates {
    gates: DashMap<String, Arc<Mutex<()>>>,
}

impl UserGates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the per-user lock. Held for the whole turn so history reads
    /// can't race history writes for the same user.
    pub async fn acquire(&self, user: &str) -> OwnedMutexGuard<()> {
        let gate = self
            .gates
            .entry(user.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        if self.gates.len() > SWEEP_THRESHOLD {
            self.sweep_idle();
        }

        gate.lock_owned().await
    }

    /// Drop gates nobody is holding or waiting on.
    fn sweep_idle(&self) {
        self.gates
            .retain(|_, gate| Arc::strong_count(gate) > 1);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.gates.len()
    }
}
