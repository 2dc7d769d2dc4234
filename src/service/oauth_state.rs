//! One-shot OAuth `state` values with a fixed time to live.

use std::time::{Duration, Instant};

use moka::sync::Cache;

use crate::service::crypto;

const MAX_PENDING_STATES: u64 = 10_000;

pub struct OAuthStateCache {
    ttl: Duration,
    states: Cache<String, Instant>,
}

impl OAuthStateCache {
    pub fn new(ttl: Duration) -> Self {
        let states = Cache::builder()
            .max_capacity(MAX_PENDING_STATES)
            .time_to_live(ttl)
            .build();
        Self { ttl, states }
    }

    pub fn issue(&self) -> String {
        let state = crypto::random_token();
        self.states.insert(state.clone(), Instant::now());
        state
    }

    /// Removes `state` and reports whether it was known and still fresh.
    pub fn consume(&self, state: &str) -> bool {
        match self.states.remove(state) {
            Some(issued_at) => issued_at.elapsed() <= self.ttl,
            None => false,
        }
    }

    pub fn len(&self) -> u64 {
        self.states.run_pending_tasks();
        self.states.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
