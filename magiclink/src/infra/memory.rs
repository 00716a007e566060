use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

use crate::domain::repository::RateLimiter;
use crate::error::MagicLinkError;

#[derive(Debug, Clone)]
struct FixedWindow {
    count: u32,
    window_start: DateTime<Utc>,
    window_secs: u64,
}

impl FixedWindow {
    fn elapsed_at(&self, now: DateTime<Utc>) -> bool {
        now - self.window_start > Duration::seconds(self.window_secs as i64)
    }

    fn resets_at(&self) -> DateTime<Utc> {
        self.window_start + Duration::seconds(self.window_secs as i64)
    }
}

/// Process-local fixed-window counters for single-instance deployments and
/// tests. Multi-instance deployments must use `RedisRateLimiter` so all
/// instances share one set of counters.
#[derive(Clone, Default)]
pub struct MemoryRateLimiter {
    windows: Arc<Mutex<HashMap<String, FixedWindow>>>,
}

impl MemoryRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    fn live_count(&self, key: &str) -> u32 {
        let now = Utc::now();
        let windows = self.windows.lock().unwrap();
        windows
            .get(key)
            .filter(|w| !w.elapsed_at(now))
            .map(|w| w.count)
            .unwrap_or(0)
    }
}

impl RateLimiter for MemoryRateLimiter {
    async fn too_many_attempts(
        &self,
        key: &str,
        max_attempts: u32,
    ) -> Result<bool, MagicLinkError> {
        Ok(self.live_count(key) >= max_attempts)
    }

    async fn available_in(&self, key: &str) -> Result<u64, MagicLinkError> {
        let now = Utc::now();
        let windows = self.windows.lock().unwrap();
        let secs = windows
            .get(key)
            .filter(|w| !w.elapsed_at(now))
            .map(|w| (w.resets_at() - now).num_seconds())
            .unwrap_or(0);
        Ok(secs.max(0) as u64)
    }

    async fn hit(&self, key: &str, window_secs: u64) -> Result<(), MagicLinkError> {
        let now = Utc::now();
        let mut windows = self.windows.lock().unwrap();
        let window = windows.entry(key.to_owned()).or_insert(FixedWindow {
            count: 0,
            window_start: now,
            window_secs,
        });
        if window.elapsed_at(now) {
            window.count = 0;
            window.window_start = now;
            window.window_secs = window_secs;
        }
        window.count += 1;
        Ok(())
    }

    async fn remaining_attempts(
        &self,
        key: &str,
        max_attempts: u32,
    ) -> Result<u32, MagicLinkError> {
        Ok(max_attempts.saturating_sub(self.live_count(key)))
    }
}
