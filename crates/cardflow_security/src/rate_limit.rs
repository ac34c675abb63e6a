//! Process-local per-key token-bucket limiter guarding public-portal
//! verification attempts (§4.8: 5 attempts per 60-second rolling window).

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Bucket {
    attempts: Vec<Instant>,
}

/// A rolling-window counter keyed by an arbitrary string (typically the
/// caller's IP address). Not distributed: each process instance keeps its
/// own state, matching the "process-local" requirement.
pub struct TokenBucketLimiter {
    max_attempts: usize,
    window: Duration,
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl TokenBucketLimiter {
    pub fn new(max_attempts: usize, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    pub fn default_portal_limiter() -> Self {
        Self::new(5, Duration::from_secs(60))
    }

    /// Records an attempt for `key` and returns whether it is allowed.
    /// Attempts older than the window are dropped before counting, so the
    /// window rolls rather than resetting on a fixed boundary.
    pub fn check(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().expect("rate limiter mutex poisoned");
        let bucket = buckets.entry(key.to_string()).or_insert_with(|| Bucket { attempts: Vec::new() });
        bucket.attempts.retain(|t| now.duration_since(*t) < self.window);

        if bucket.attempts.len() >= self.max_attempts {
            return false;
        }
        bucket.attempts.push(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_max_attempts_then_blocks() {
        let limiter = TokenBucketLimiter::new(3, Duration::from_secs(60));
        assert!(limiter.check("1.2.3.4"));
        assert!(limiter.check("1.2.3.4"));
        assert!(limiter.check("1.2.3.4"));
        assert!(!limiter.check("1.2.3.4"));
    }

    #[test]
    fn keys_are_independent() {
        let limiter = TokenBucketLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.check("a"));
        assert!(limiter.check("b"));
        assert!(!limiter.check("a"));
    }

    #[test]
    fn window_rolls_forward() {
        let limiter = TokenBucketLimiter::new(1, Duration::from_millis(20));
        assert!(limiter.check("a"));
        assert!(!limiter.check("a"));
        std::thread::sleep(Duration::from_millis(30));
        assert!(limiter.check("a"));
    }
}
