//! Access control and per-user rate limiting.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use teloxide::types::UserId;

/// The allow-list. Anyone not on it gets a refusal and nothing else.
#[derive(Debug, Default)]
pub struct AccessPolicy {
    allowed: HashSet<u64>,
}

impl AccessPolicy {
    pub fn new(allowed_user_ids: &[u64]) -> Self {
        Self {
            allowed: allowed_user_ids.iter().copied().collect(),
        }
    }

    pub fn is_allowed(&self, user: UserId) -> bool {
        self.allowed.contains(&user.0)
    }
}

/// Drops events that arrive within the cooldown of the previous one from
/// the same user. Allowed events refresh the window; dropped ones do not.
#[derive(Debug)]
pub struct RateLimiter {
    cooldown: Duration,
    last_seen: Mutex<HashMap<UserId, Instant>>,
}

impl RateLimiter {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_seen: Mutex::new(HashMap::new()),
        }
    }

    /// True if the event may proceed.
    pub fn check(&self, user: UserId) -> bool {
        let now = Instant::now();
        let mut last_seen = match self.last_seen.lock() {
            Ok(guard) => guard,
            // A poisoned map only loses cooldown history.
            Err(poisoned) => poisoned.into_inner(),
        };
        match last_seen.get(&user) {
            Some(last) if now.duration_since(*last) < self.cooldown => false,
            _ => {
                last_seen.insert(user, now);
                true
            }
        }
    }
}
