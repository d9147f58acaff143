//! Per-item review progress for a list view.
//!
//! # Design
//! - Three disjoint id sets: in progress, succeeded, failed.
//! - A failed item must be acknowledged before it can be retried.
//! - Completion removes exactly the completed id; an unknown id is an error, not a no-op.

use std::collections::BTreeSet;

use patchflow_api_models::ItemId;
use thiserror::Error;

/// Review status of one item as seen by the view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemStatus {
    /// No request sent for this item.
    Idle,
    /// A request is in flight.
    InProgress,
    /// The last request succeeded.
    Succeeded,
    /// The last request failed and awaits acknowledgement.
    Failed,
}

/// Rejected review transitions.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ReviewError {
    /// A request for the item is already in flight.
    #[error("item {id} already has a request in flight")]
    AlreadyInProgress {
        /// Item id.
        id: ItemId,
    },
    /// The item was already handled successfully.
    #[error("item {id} was already handled")]
    AlreadySucceeded {
        /// Item id.
        id: ItemId,
    },
    /// The item failed and the failure was not acknowledged yet.
    #[error("item {id} failed; acknowledge the failure before retrying")]
    AwaitingRetry {
        /// Item id.
        id: ItemId,
    },
    /// No request for the item is in flight.
    #[error("item {id} has no request in flight")]
    NotInProgress {
        /// Item id.
        id: ItemId,
    },
}

/// In-progress, succeeded and failed item sets.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ReviewTracker {
    in_progress: BTreeSet<ItemId>,
    succeeded: BTreeSet<ItemId>,
    failed: BTreeSet<ItemId>,
}

impl ReviewTracker {
    /// Status of `id`.
    #[must_use]
    pub fn status(&self, id: ItemId) -> ItemStatus {
        if self.in_progress.contains(&id) {
            ItemStatus::InProgress
        } else if self.succeeded.contains(&id) {
            ItemStatus::Succeeded
        } else if self.failed.contains(&id) {
            ItemStatus::Failed
        } else {
            ItemStatus::Idle
        }
    }

    /// Mark `id` as in flight.
    ///
    /// # Errors
    ///
    /// Fails when `id` is not idle.
    pub fn begin(&mut self, id: ItemId) -> Result<(), ReviewError> {
        match self.status(id) {
            ItemStatus::Idle => {
                self.in_progress.insert(id);
                Ok(())
            }
            ItemStatus::InProgress => Err(ReviewError::AlreadyInProgress { id }),
            ItemStatus::Succeeded => Err(ReviewError::AlreadySucceeded { id }),
            ItemStatus::Failed => Err(ReviewError::AwaitingRetry { id }),
        }
    }

    /// Move `id` out of flight into the succeeded or failed set.
    ///
    /// # Errors
    ///
    /// Fails when `id` is not in flight; no other item is affected.
    pub fn complete(&mut self, id: ItemId, success: bool) -> Result<ItemStatus, ReviewError> {
        if !self.in_progress.remove(&id) {
            return Err(ReviewError::NotInProgress { id });
        }
        if success {
            self.succeeded.insert(id);
            Ok(ItemStatus::Succeeded)
        } else {
            self.failed.insert(id);
            Ok(ItemStatus::Failed)
        }
    }

    /// Clear a failure so the item can be retried. Returns whether `id` had failed.
    pub fn acknowledge_failure(&mut self, id: ItemId) -> bool {
        self.failed.remove(&id)
    }

    /// Forget succeeded and failed outcomes; in-flight items stay tracked.
    pub fn clear_outcomes(&mut self) {
        self.succeeded.clear();
        self.failed.clear();
    }

    /// Forget everything.
    pub fn reset(&mut self) {
        self.in_progress.clear();
        self.clear_outcomes();
    }

    /// Ids with a request in flight.
    #[must_use]
    pub const fn in_progress(&self) -> &BTreeSet<ItemId> {
        &self.in_progress
    }

    /// Ids handled successfully.
    #[must_use]
    pub const fn succeeded(&self) -> &BTreeSet<ItemId> {
        &self.succeeded
    }

    /// Ids whose last request failed.
    #[must_use]
    pub const fn failed(&self) -> &BTreeSet<ItemId> {
        &self.failed
    }

    /// Whether nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.in_progress.is_empty() && self.succeeded.is_empty() && self.failed.is_empty()
    }
}
