use std::collections::HashMap;
use std::sync::Mutex;

/// Keyed storage for the last accepted submission time (Unix seconds).
pub trait RateLimitStore: Send + Sync {
    fn get(&self, key: &str) -> Option<i64>;
    fn set(&self, key: &str, timestamp: i64);
}

#[derive(Default)]
pub struct InMemoryRateLimitStore {
    entries: Mutex<HashMap<String, i64>>,
}

impl RateLimitStore for InMemoryRateLimitStore {
    fn get(&self, key: &str) -> Option<i64> {
        match self.entries.lock() {
            Ok(entries) => entries.get(key).copied(),
            Err(e) => {
                log::error!("Rate limit store lock poisoned: {e}");
                None
            }
        }
    }

    fn set(&self, key: &str, timestamp: i64) {
        match self.entries.lock() {
            Ok(mut entries) => {
                entries.insert(key.to_string(), timestamp);
            }
            Err(e) => log::error!("Rate limit store lock poisoned: {e}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Limited { remaining_secs: i64 },
}

/// Minimum spacing between two accepted submissions from one client.
pub struct RateLimiter {
    window_secs: i64,
    store: Box<dyn RateLimitStore>,
}

impl RateLimiter {
    pub fn new(window_secs: u64, store: Box<dyn RateLimitStore>) -> Self {
        Self {
            window_secs: i64::try_from(window_secs).unwrap_or(i64::MAX),
            store,
        }
    }

    pub fn in_memory(window_secs: u64) -> Self {
        Self::new(window_secs, Box::new(InMemoryRateLimitStore::default()))
    }

    /// Records `now` for `client_id` when allowed. A limited request leaves
    /// the stored timestamp untouched. A clock that stepped backwards counts
    /// as no time elapsed.
    pub fn check_and_record(&self, client_id: &str, now: i64) -> RateDecision {
        if let Some(last) = self.store.get(client_id) {
            let elapsed = (now - last).max(0);
            if elapsed < self.window_secs {
                return RateDecision::Limited {
                    remaining_secs: self.window_secs - elapsed,
                };
            }
        }
        self.store.set(client_id, now);
        RateDecision::Allowed
    }

    pub fn last_accepted(&self, client_id: &str) -> Option<i64> {
        self.store.get(client_id)
    }
}
