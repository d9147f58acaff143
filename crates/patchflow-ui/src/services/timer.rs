//! Browser timer for the freshness poller.

use std::time::Duration;

use async_trait::async_trait;
use gloo_timers::future::TimeoutFuture;

use crate::features::lists::checker::Sleeper;

/// [`Sleeper`] backed by `setTimeout`.
#[derive(Clone, Copy, Debug, Default)]
pub struct GlooSleeper;

#[async_trait(?Send)]
impl Sleeper for GlooSleeper {
    async fn sleep(&self, duration: Duration) {
        let millis = u32::try_from(duration.as_millis()).unwrap_or(u32::MAX);
        TimeoutFuture::new(millis).await;
    }
}
