//! Bounded polling with cooperative cancellation.
//!
//! The takeoff and landing loops poll the status endpoint until the awaited
//! flight phase is observed. The policy bounds those loops with an optional
//! deadline, and a [`CancelToken`] lets another thread end them early, so a
//! vehicle that never reaches the phase cannot block the caller forever.

use crate::error::ClientError;
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

/// How a polling loop paces itself and when it gives up.
#[derive(Debug, Clone)]
pub struct PollPolicy {
    /// Pause between two status polls.
    pub interval: Duration,

    /// Total time budget for the loop. `None` polls until cancelled.
    pub deadline: Option<Duration>,
}
impl PollPolicy {
    /// Sets the loop's total time budget.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets the pause between two polls.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Converts the relative deadline to an absolute instant, measured from
    /// now.
    pub(crate) fn deadline_from_now(&self) -> Option<Instant> {
        self.deadline.map(|x| Instant::now() + x)
    }

    /// Sleeps for one poll interval, waking early on cancellation or an
    /// expired deadline.
    pub(crate) fn pause(
        &self,
        cancel: &CancelToken,
        deadline: Option<Instant>,
    ) -> Result<(), ClientError> {
        let until = Instant::now() + self.interval;
        loop {
            if cancel.is_cancelled() {
                return Err(ClientError::Cancelled);
            }
            if let Some(deadline) = deadline
                && Instant::now() >= deadline
            {
                return Err(ClientError::DeadlineExceeded);
            }
            let now = Instant::now();
            if now >= until {
                return Ok(());
            }
            std::thread::sleep((until - now).min(Duration::from_millis(50)));
        }
    }
}
impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            deadline: None,
        }
    }
}

/// A cloneable flag that ends polling loops early.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);
impl CancelToken {
    /// Creates a new, untriggered token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Triggers the token. Every loop holding a clone returns
    /// [`ClientError::Cancelled`] at its next pause.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Returns whether the token has been triggered.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pause_elapses_the_interval() {
        let policy = PollPolicy::default().with_interval(Duration::from_millis(20));
        let started = Instant::now();
        policy.pause(&CancelToken::new(), None).unwrap();
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn cancelled_token_interrupts_the_pause() {
        let policy = PollPolicy::default();
        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(matches!(
            policy.pause(&cancel, None),
            Err(ClientError::Cancelled)
        ));
    }

    #[test]
    fn expired_deadline_interrupts_the_pause() {
        let policy = PollPolicy::default();
        let deadline = Some(Instant::now() - Duration::from_millis(1));
        assert!(matches!(
            policy.pause(&CancelToken::new(), deadline),
            Err(ClientError::DeadlineExceeded)
        ));
    }
}
