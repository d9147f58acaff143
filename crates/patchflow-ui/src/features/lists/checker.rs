//! Periodic freshness checks for a mounted list.
//!
//! # Design
//! - The loop is a plain future; the caller spawns it (browser `spawn_local`, tokio
//!   `LocalSet`) and stops it through an [`AutoCheckHandle`].
//! - Time comes from a [`Sleeper`] so tests drive ticks without real timers.
//! - A failed check flags the list and polling continues; an auth failure expires the
//!   session and ends the loop.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::core::api::ApiClient;
use crate::core::auth::AuthEvent;
use crate::core::store::StoreHandle;
use crate::core::transport::HttpTransport;
use crate::features::lists::registry::ListTarget;
use crate::features::lists::state::ListEvent;

/// Source of delays between checks.
#[async_trait(?Send)]
pub trait Sleeper {
    /// Resolve after `duration`.
    async fn sleep(&self, duration: Duration);
}

#[async_trait(?Send)]
impl<Z: Sleeper + ?Sized> Sleeper for Rc<Z> {
    async fn sleep(&self, duration: Duration) {
        (**self).sleep(duration).await;
    }
}

/// Stop switch shared between a running poller and its owner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AutoCheckHandle {
    target: ListTarget,
    stopped: Rc<Cell<bool>>,
}

impl AutoCheckHandle {
    /// Handle for a poller of `target`.
    #[must_use]
    pub fn new(target: ListTarget) -> Self {
        Self {
            target,
            stopped: Rc::new(Cell::new(false)),
        }
    }

    /// List the poller refreshes.
    #[must_use]
    pub const fn target(&self) -> ListTarget {
        self.target
    }

    /// Ask the poller to stop before its next check.
    pub fn stop(&self) {
        self.stopped.set(true);
    }

    /// Whether a stop was requested.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.get()
    }
}

/// Result of a single freshness check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The token did not advance.
    Unchanged,
    /// The token advanced; cached pages may be stale.
    Updated {
        /// Token before the check.
        previous: u64,
        /// Token returned by the server.
        latest: u64,
    },
    /// The check failed; the next tick retries.
    Failed,
    /// The server rejected the session.
    SessionExpired,
}

/// Polling loop for one list.
pub struct AutoUpdateTask<T, S, Z> {
    api: Rc<ApiClient<T>>,
    store: S,
    sleeper: Z,
    interval: Duration,
    handle: AutoCheckHandle,
}

impl<T, S, Z> AutoUpdateTask<T, S, Z>
where
    T: HttpTransport,
    S: StoreHandle,
    Z: Sleeper,
{
    /// Build a task polling `handle.target()` every `interval`.
    #[must_use]
    pub const fn new(
        api: Rc<ApiClient<T>>,
        store: S,
        sleeper: Z,
        interval: Duration,
        handle: AutoCheckHandle,
    ) -> Self {
        Self {
            api,
            store,
            sleeper,
            interval,
            handle,
        }
    }

    /// Handle stopping this task.
    #[must_use]
    pub fn handle(&self) -> AutoCheckHandle {
        self.handle.clone()
    }

    /// Query the freshness token once and record the result.
    pub async fn check_once(&self) -> CheckOutcome {
        let target = self.handle.target();
        match self.api.latest_update(target.kind).await {
            Ok(latest) => {
                let previous = self
                    .store
                    .snapshot()
                    .lists
                    .for_target(target)
                    .map_or(0, |cache| cache.latest_update_timestamp);
                self.store.dispatch_list(
                    target,
                    ListEvent::UpdatesChecked {
                        latest_update_timestamp: latest,
                    },
                );
                if latest > previous {
                    debug!(
                        role = target.role.as_str(),
                        list = target.kind.as_str(),
                        previous,
                        latest,
                        "list has updates"
                    );
                    CheckOutcome::Updated { previous, latest }
                } else {
                    CheckOutcome::Unchanged
                }
            }
            Err(err) if err.is_unauthorized() => {
                self.store.dispatch_auth(&AuthEvent::SessionExpired);
                CheckOutcome::SessionExpired
            }
            Err(err) => {
                warn!(
                    role = target.role.as_str(),
                    list = target.kind.as_str(),
                    error = %err,
                    "freshness check failed"
                );
                self.store.dispatch_list(target, ListEvent::UpdateCheckFailed);
                CheckOutcome::Failed
            }
        }
    }

    /// Poll until stopped or the session expires. Returns the number of checks performed.
    pub async fn run(self) -> u32 {
        let target = self.handle.target();
        let mut checks = 0_u32;
        loop {
            if self.handle.is_stopped() {
                break;
            }
            self.sleeper.sleep(self.interval).await;
            if self.handle.is_stopped() {
                break;
            }
            checks = checks.saturating_add(1);
            if self.check_once().await == CheckOutcome::SessionExpired {
                info!(
                    role = target.role.as_str(),
                    list = target.kind.as_str(),
                    "session expired; polling stopped"
                );
                self.handle.stop();
                self.store.dispatch_list(target, ListEvent::AutoCheckStopped);
                break;
            }
        }
        checks
    }
}
