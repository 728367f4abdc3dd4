//! Inter-request pacing
//!
//! Both external services block clients that hammer them, so every request is
//! followed by a constant pause. This is not a backoff: the pause does not
//! depend on the outcome of the request.

use std::future::Future;
use std::time::Duration;

/// Pause policy applied after each external request
pub trait Throttle: Send + Sync {
    fn pause(&self) -> impl Future<Output = ()> + Send;
}

/// Sleep for a fixed duration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Throttle for FixedDelay {
    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

/// Never pause (tests, local stubs)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoDelay;

impl Throttle for NoDelay {
    async fn pause(&self) {}
}

impl<'a, T: Throttle> Throttle for &'a T {
    fn pause(&self) -> impl Future<Output = ()> + Send {
        T::pause(*self)
    }
}
