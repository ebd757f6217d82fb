//! Timer seams used by the poller and the flash slot.

use std::time::Duration;

use async_trait::async_trait;

/// Awaitable delay, used between job status polls.
#[async_trait(?Send)]
pub trait Timer {
    /// Resolve after `duration` has elapsed.
    async fn sleep(&self, duration: Duration);
}

/// Fire-and-forget callback scheduling, used for notification expiry.
pub trait Scheduler {
    /// Run `task` once after `delay`.
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>);
}
