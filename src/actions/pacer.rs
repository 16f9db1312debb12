//! Fixed pacing between consecutive sends.
//!
//! Keeps bulk operations such as broadcasts from sending faster than one
//! message per interval, which reduces the chance of Telegram throttling
//! the account.

use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::debug;

/// Enforces a minimum interval between sends.
#[derive(Debug)]
pub struct SendPacer {
    /// Minimum duration between sends.
    interval: Duration,

    /// When the last send was let through.
    last_send: Mutex<Option<Instant>>,
}

impl SendPacer {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_send: Mutex::new(None),
        }
    }

    /// Waits until the next send is allowed, then marks it as performed.
    ///
    /// Returns the duration waited (0 if no wait was needed).
    pub async fn wait_and_acquire(&self) -> Duration {
        let mut last = self.last_send.lock().await;

        let wait = last.map_or(Duration::ZERO, |at| {
            self.interval.saturating_sub(at.elapsed())
        });

        if !wait.is_zero() {
            debug!("Pacer: waiting {:?} before next send", wait);
            tokio::time::sleep(wait).await;
        }

        *last = Some(Instant::now());
        wait
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_send_is_immediate() {
        let pacer = SendPacer::new(Duration::from_secs(1));

        let waited = pacer.wait_and_acquire().await;
        assert_eq!(waited, Duration::ZERO);
    }

    #[tokio::test]
    async fn test_second_send_waits() {
        let pacer = SendPacer::new(Duration::from_millis(50));

        pacer.wait_and_acquire().await;

        let started = Instant::now();
        let waited = pacer.wait_and_acquire().await;
        assert!(waited > Duration::ZERO);
        assert!(started.elapsed() >= waited);
    }

    #[tokio::test]
    async fn test_zero_interval_never_waits() {
        let pacer = SendPacer::new(Duration::ZERO);

        pacer.wait_and_acquire().await;
        assert_eq!(pacer.wait_and_acquire().await, Duration::ZERO);
    }
}
