//! Per-user report cooldowns.
//!
//! A user who submitted a report has to wait a fixed period before
//! opening the next one. Only confirmed reports start the period.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::debug;

/// Tracks the last submission time of every user.
#[derive(Debug)]
pub struct Cooldowns {
    /// Minimum duration between two reports of one user.
    period: Duration,

    /// Last submission per user id.
    last_report: Mutex<HashMap<i64, Instant>>,
}

impl Cooldowns {
    /// Creates a tracker with the specified period.
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            last_report: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a tracker from seconds.
    #[must_use]
    pub fn from_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    /// Returns the configured period.
    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }

    /// Returns how long the user still has to wait, or `None` if a new
    /// report is allowed right now.
    pub async fn remaining(&self, user_id: i64) -> Option<Duration> {
        let last = self.last_report.lock().await;
        let elapsed = last.get(&user_id)?.elapsed();

        if elapsed >= self.period {
            None
        } else {
            Some(self.period - elapsed)
        }
    }

    /// Starts the cooldown for the user.
    pub async fn start(&self, user_id: i64) {
        debug!("Starting {:?} cooldown for user {}", self.period, user_id);
        let mut last = self.last_report.lock().await;
        last.insert(user_id, Instant::now());
    }

    /// Clears the cooldown of the user.
    pub async fn clear(&self, user_id: i64) {
        let mut last = self.last_report.lock().await;
        last.remove(&user_id);
    }

    /// Drops entries whose cooldown already ran out.
    ///
    /// Returns the number of removed entries.
    pub async fn prune(&self) -> usize {
        let mut last = self.last_report.lock().await;
        let before = last.len();
        last.retain(|_, started| started.elapsed() < self.period);
        before - last.len()
    }
}

/// Whole seconds to show the user for a remaining wait, never zero.
#[must_use]
pub fn display_secs(remaining: Duration) -> u64 {
    remaining.as_secs().max(1)
}
