//! State assertions shared by integration suites.

use patchflow_ui::features::lists::review::ReviewTracker;
use patchflow_ui::features::lists::state::PagedListCache;

/// Panic unless the in-progress, succeeded and failed sets are pairwise disjoint.
///
/// # Panics
///
/// When an id appears in two sets.
pub fn assert_review_sets_disjoint(tracker: &ReviewTracker) {
    assert!(
        tracker.in_progress().is_disjoint(tracker.succeeded()),
        "in-progress and succeeded overlap: {tracker:?}"
    );
    assert!(
        tracker.in_progress().is_disjoint(tracker.failed()),
        "in-progress and failed overlap: {tracker:?}"
    );
    assert!(
        tracker.succeeded().is_disjoint(tracker.failed()),
        "succeeded and failed overlap: {tracker:?}"
    );
}

/// Panic unless every cached page is stamped at or below the latest token.
///
/// # Panics
///
/// When a page carries a stamp newer than the cache's token.
pub fn assert_stamps_not_ahead(cache: &PagedListCache) {
    for (page, entry) in cache.list_pages.iter() {
        assert!(
            entry.update_timestamp <= cache.latest_update_timestamp,
            "page {page} stamped {} ahead of {}",
            entry.update_timestamp,
            cache.latest_update_timestamp
        );
    }
}
