//! Per-address sliding-window rate limiting.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::warn;

use parley_config::RateLimitConfig;

// Stale windows are swept once the map grows past this.
const PRUNE_THRESHOLD: usize = 1024;

/// Counts requests per caller address within a fixed window.
#[derive(Clone)]
pub struct RateLimiter {
    windows: Arc<RwLock<HashMap<String, (u32, Instant)>>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            windows: Arc::new(RwLock::new(HashMap::new())),
            max_requests: config.max_requests,
            window: Duration::from_secs(config.window_secs),
        }
    }

    /// Whether a request from `caller` is admitted right now.
    pub async fn allow(&self, caller: &str) -> bool {
        let mut windows = self.windows.write().await;
        let now = Instant::now();

        if windows.len() > PRUNE_THRESHOLD {
            let window = self.window;
            windows.retain(|_, (_, start)| now.duration_since(*start) <= window);
        }

        let (count, start) = windows.entry(caller.to_string()).or_insert((0, now));
        if now.duration_since(*start) > self.window {
            *count = 1;
            *start = now;
            return true;
        }

        *count += 1;
        if *count > self.max_requests {
            warn!(caller = %caller, "Rate limit exceeded");
            false
        } else {
            true
        }
    }
}
