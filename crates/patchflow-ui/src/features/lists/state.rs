//! Paged list cache and its pure reducer.
//!
//! # Design
//! - Pages are shared `Rc` entries inside an `Rc` map, so untouched pages keep their identity
//!   across transitions and views can skip re-rendering them.
//! - The reducer never mutates its input; a transition that changes nothing hands back the
//!   same `Rc`.
//! - `latest_update_timestamp` only moves forward.

use std::collections::BTreeMap;
use std::rc::Rc;

use patchflow_api_models::{ItemId, ListItem, PageResponse};

use crate::features::lists::query::{PageQuery, PageRequest};

/// A cached page of rows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageEntry {
    /// Rows in server order.
    pub data: Vec<ListItem>,
    /// Freshness token at the time the page was stored.
    pub update_timestamp: u64,
    /// Sort and filter the page was fetched with.
    pub query: PageQuery,
}

impl PageEntry {
    fn position(&self, id: ItemId) -> Option<usize> {
        self.data.iter().position(|item| item.id() == id)
    }
}

/// Page cache and status flags for one list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PagedListCache {
    /// Cached pages by zero-based index.
    pub list_pages: Rc<BTreeMap<u32, Rc<PageEntry>>>,
    /// Most recent server freshness token seen.
    pub latest_update_timestamp: u64,
    /// Total item count across all pages.
    pub total_items_count: u64,
    /// A page fetch is in flight.
    pub is_loading_list: bool,
    /// The last page fetch failed.
    pub error_while_fetching_data: bool,
    /// The last freshness check failed.
    pub error_while_checking_updates: bool,
    /// A review or feedback request is in flight.
    pub action_pending: bool,
    /// The freshness poller is running.
    pub is_auto_checking: bool,
}

impl Default for PagedListCache {
    fn default() -> Self {
        Self {
            list_pages: Rc::new(BTreeMap::new()),
            latest_update_timestamp: 0,
            total_items_count: 0,
            is_loading_list: true,
            error_while_fetching_data: false,
            error_while_checking_updates: false,
            action_pending: false,
            is_auto_checking: false,
        }
    }
}

/// Row lookup inside a cached page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowSelector {
    /// Match by item id.
    Id(ItemId),
    /// Match by row position.
    Row(usize),
}

impl PagedListCache {
    /// Cached page `page`.
    #[must_use]
    pub fn page(&self, page: u32) -> Option<&Rc<PageEntry>> {
        self.list_pages.get(&page)
    }

    /// Whether `page` is cached but older than the latest freshness token.
    #[must_use]
    pub fn is_page_stale(&self, page: u32) -> bool {
        self.page(page)
            .is_some_and(|entry| self.latest_update_timestamp > entry.update_timestamp)
    }

    /// Whether the "updates available" badge should be shown for `page`.
    #[must_use]
    pub fn show_updates_badge(&self, page: u32) -> bool {
        !self.is_loading_list && self.is_page_stale(page)
    }

    /// Whether `request` needs a server round trip.
    #[must_use]
    pub fn needs_retrieval(&self, request: &PageRequest) -> bool {
        if self.error_while_fetching_data {
            return true;
        }
        self.page(request.page).is_none_or(|entry| {
            entry.query != request.query || self.latest_update_timestamp > entry.update_timestamp
        })
    }

    /// Rows of `page`, empty when not cached.
    #[must_use]
    pub fn rows(&self, page: u32) -> &[ListItem] {
        self.page(page).map_or(&[], |entry| entry.data.as_slice())
    }

    /// Number of pages for `page_size` rows per page.
    #[must_use]
    pub fn page_count(&self, page_size: u32) -> u64 {
        if page_size == 0 {
            return 0;
        }
        self.total_items_count.div_ceil(u64::from(page_size))
    }

    /// Find a row in `page`.
    #[must_use]
    pub fn retrieve_element(&self, page: u32, selector: RowSelector) -> Option<&ListItem> {
        let entry = self.page(page)?;
        match selector {
            RowSelector::Id(id) => entry.data.iter().find(|item| item.id() == id),
            RowSelector::Row(row) => entry.data.get(row),
        }
    }

    fn replace_item(&mut self, updated: &ListItem) {
        let id = updated.id();
        let Some((page, replacement)) = self.list_pages.iter().find_map(|(page, entry)| {
            entry.position(id).map(|position| {
                let mut data = entry.data.clone();
                data[position] = updated.clone();
                let replacement = PageEntry {
                    data,
                    update_timestamp: entry.update_timestamp,
                    query: entry.query.clone(),
                };
                (*page, Rc::new(replacement))
            })
        }) else {
            return;
        };
        Rc::make_mut(&mut self.list_pages).insert(page, replacement);
    }
}

/// Transitions of a single list cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListEvent {
    /// A review, feedback or creation request is about to be sent.
    PerformingRequest,
    /// A request announced by [`ListEvent::PerformingRequest`] finished.
    RequestCompleted,
    /// A page fetch started.
    PageRequested {
        /// Requested page.
        page: u32,
    },
    /// A page fetch succeeded.
    PageRetrieved {
        /// Retrieved page.
        page: u32,
        /// Query the page was fetched with.
        query: PageQuery,
        /// Server payload.
        response: PageResponse<ListItem>,
    },
    /// The cached page could be reused.
    NoRetrievalNeeded {
        /// Requested page.
        page: u32,
    },
    /// A page fetch failed.
    PageRetrievalFailed {
        /// Requested page.
        page: u32,
    },
    /// A freshness check returned a token.
    UpdatesChecked {
        /// Server freshness token.
        latest_update_timestamp: u64,
    },
    /// A freshness check failed.
    UpdateCheckFailed,
    /// The freshness poller started.
    AutoCheckStarted,
    /// The freshness poller stopped.
    AutoCheckStopped,
    /// A review request was sent.
    ItemReviewRequested {
        /// Reviewed item.
        id: ItemId,
    },
    /// A review request succeeded.
    ItemReviewSucceeded {
        /// Reviewed item.
        id: ItemId,
        /// Updated row returned by the server, when any.
        updated: Option<ListItem>,
    },
    /// A review request failed.
    ItemReviewFailed {
        /// Reviewed item.
        id: ItemId,
    },
    /// Installation feedback was sent.
    FeedbackRequested {
        /// Send request the feedback refers to.
        id: ItemId,
    },
    /// Installation feedback was accepted.
    FeedbackSucceeded {
        /// Send request the feedback refers to.
        id: ItemId,
        /// Updated row returned by the server, when any.
        updated: Option<ListItem>,
    },
    /// Installation feedback was rejected.
    FeedbackFailed {
        /// Send request the feedback refers to.
        id: ItemId,
    },
}

/// Apply `event` to `cache`, returning the next state.
#[must_use]
pub fn reduce_list(cache: &Rc<PagedListCache>, event: &ListEvent) -> Rc<PagedListCache> {
    let mut next = (**cache).clone();
    match event {
        ListEvent::PerformingRequest
        | ListEvent::ItemReviewRequested { .. }
        | ListEvent::FeedbackRequested { .. } => {
            next.action_pending = true;
        }
        ListEvent::PageRequested { .. } => {
            next.is_loading_list = true;
        }
        ListEvent::PageRetrieved {
            page,
            query,
            response,
        } => {
            if next.latest_update_timestamp == 0
                && let Some(first) = response.items.first()
            {
                next.latest_update_timestamp = first.timestamp();
            }
            let entry = Rc::new(PageEntry {
                data: response.items.clone(),
                update_timestamp: next.latest_update_timestamp,
                query: query.clone(),
            });
            Rc::make_mut(&mut next.list_pages).insert(*page, entry);
            next.total_items_count = response.count;
            next.is_loading_list = false;
            next.error_while_fetching_data = false;
        }
        ListEvent::NoRetrievalNeeded { .. } => {
            next.is_loading_list = false;
        }
        ListEvent::PageRetrievalFailed { .. } => {
            next.is_loading_list = false;
            next.error_while_fetching_data = true;
        }
        ListEvent::UpdatesChecked {
            latest_update_timestamp,
        } => {
            if *latest_update_timestamp <= cache.latest_update_timestamp
                && !cache.error_while_checking_updates
            {
                return Rc::clone(cache);
            }
            next.latest_update_timestamp =
                next.latest_update_timestamp.max(*latest_update_timestamp);
            next.error_while_checking_updates = false;
        }
        ListEvent::UpdateCheckFailed => {
            next.error_while_checking_updates = true;
        }
        ListEvent::AutoCheckStarted => {
            next.is_auto_checking = true;
        }
        ListEvent::AutoCheckStopped => {
            next.is_auto_checking = false;
        }
        ListEvent::ItemReviewSucceeded { updated, .. }
        | ListEvent::FeedbackSucceeded { updated, .. } => {
            next.action_pending = false;
            if let Some(item) = updated {
                next.replace_item(item);
            }
        }
        ListEvent::RequestCompleted
        | ListEvent::ItemReviewFailed { .. }
        | ListEvent::FeedbackFailed { .. } => {
            next.action_pending = false;
        }
    }
    if next == **cache {
        return Rc::clone(cache);
    }
    Rc::new(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::lists::query::FilterDescriptor;
    use patchflow_api_models::{ApprovalStatus, Author, Commit};

    fn commit(id: ItemId, timestamp: u64) -> ListItem {
        ListItem::Commit(Commit {
            id,
            title: format!("commit {id}"),
            description: String::new(),
            timestamp,
            update_timestamp: None,
            author: Author {
                id: 1,
                name: "dev".to_string(),
            },
            approver: None,
            approval_status: ApprovalStatus::Pending,
            components: None,
        })
    }

    fn retrieved(page: u32, items: Vec<ListItem>, count: u64) -> ListEvent {
        ListEvent::PageRetrieved {
            page,
            query: PageQuery::default(),
            response: PageResponse { count, items },
        }
    }

    #[test]
    fn first_page_seeds_freshness_token() {
        let cache = Rc::new(PagedListCache::default());
        let next = reduce_list(&cache, &retrieved(0, vec![commit(9, 500), commit(8, 400)], 2));
        assert_eq!(next.latest_update_timestamp, 500);
        assert_eq!(next.page(0).map(|entry| entry.update_timestamp), Some(500));
        assert_eq!(next.total_items_count, 2);
        assert!(!next.is_loading_list);
        assert_eq!(cache.latest_update_timestamp, 0);
    }

    #[test]
    fn empty_first_page_keeps_token_at_zero() {
        let cache = Rc::new(PagedListCache::default());
        let next = reduce_list(&cache, &retrieved(0, Vec::new(), 0));
        assert_eq!(next.latest_update_timestamp, 0);
        assert!(next.rows(0).is_empty());
        assert!(next.page(0).is_some());
    }

    #[test]
    fn freshness_token_is_monotonic() {
        let cache = Rc::new(PagedListCache::default());
        let seeded = reduce_list(&cache, &retrieved(0, vec![commit(1, 100)], 1));
        let newer = reduce_list(
            &seeded,
            &ListEvent::UpdatesChecked {
                latest_update_timestamp: 200,
            },
        );
        assert_eq!(newer.latest_update_timestamp, 200);
        assert!(newer.is_page_stale(0));
        assert!(newer.show_updates_badge(0));

        let older = reduce_list(
            &newer,
            &ListEvent::UpdatesChecked {
                latest_update_timestamp: 150,
            },
        );
        assert!(Rc::ptr_eq(&older, &newer));
    }

    #[test]
    fn check_failure_is_cleared_by_next_success() {
        let cache = Rc::new(PagedListCache::default());
        let failed = reduce_list(&cache, &ListEvent::UpdateCheckFailed);
        assert!(failed.error_while_checking_updates);
        let recovered = reduce_list(
            &failed,
            &ListEvent::UpdatesChecked {
                latest_update_timestamp: 0,
            },
        );
        assert!(!recovered.error_while_checking_updates);
    }

    #[test]
    fn untouched_pages_keep_identity() {
        let cache = Rc::new(PagedListCache::default());
        let one = reduce_list(&cache, &retrieved(0, vec![commit(1, 100)], 2));
        let two = reduce_list(&one, &retrieved(1, vec![commit(2, 90)], 2));
        let (Some(before), Some(after)) = (one.page(0), two.page(0)) else {
            panic!("page 0 should stay cached");
        };
        assert!(Rc::ptr_eq(before, after));
        assert!(one.page(1).is_none());
    }

    #[test]
    fn review_success_replaces_row_in_place() {
        let cache = Rc::new(PagedListCache::default());
        let loaded = reduce_list(&cache, &retrieved(0, vec![commit(1, 100), commit(2, 90)], 2));
        let pending = reduce_list(&loaded, &ListEvent::ItemReviewRequested { id: 2 });
        assert!(pending.action_pending);

        let ListItem::Commit(mut approved) = commit(2, 90) else {
            unreachable!()
        };
        approved.approval_status = ApprovalStatus::Approved;
        let done = reduce_list(
            &pending,
            &ListEvent::ItemReviewSucceeded {
                id: 2,
                updated: Some(ListItem::Commit(approved)),
            },
        );
        assert!(!done.action_pending);
        let row = done.retrieve_element(0, RowSelector::Id(2));
        assert_eq!(row.map(ListItem::approval_status), Some(ApprovalStatus::Approved));
        assert_eq!(done.rows(0)[0].id(), 1);
        assert_eq!(done.page(0).map(|entry| entry.update_timestamp), Some(100));
    }

    #[test]
    fn retrieval_rules_follow_query_and_freshness() {
        let cache = Rc::new(PagedListCache::default());
        let loaded = reduce_list(&cache, &retrieved(0, vec![commit(1, 100)], 1));
        let same = PageRequest {
            page: 0,
            query: PageQuery::default(),
        };
        assert!(!loaded.needs_retrieval(&same));

        let filtered = PageRequest {
            page: 0,
            query: PageQuery {
                filter: FilterDescriptor::history(),
                ..PageQuery::default()
            },
        };
        assert!(loaded.needs_retrieval(&filtered));
        assert!(loaded.needs_retrieval(&PageRequest { page: 1, ..same.clone() }));

        let failed = reduce_list(&loaded, &ListEvent::PageRetrievalFailed { page: 0 });
        assert!(failed.error_while_fetching_data);
        assert!(failed.needs_retrieval(&same));
    }

    #[test]
    fn fetch_error_survives_a_retry_until_it_succeeds() {
        let cache = Rc::new(PagedListCache::default());
        let loaded = reduce_list(&cache, &retrieved(0, vec![commit(1, 100)], 30));
        let failed = reduce_list(&loaded, &ListEvent::PageRetrievalFailed { page: 2 });
        let retrying = reduce_list(&failed, &ListEvent::PageRequested { page: 2 });
        assert!(retrying.is_loading_list);
        assert!(retrying.error_while_fetching_data);
        assert_eq!(retrying.rows(0).len(), 1);

        let recovered = reduce_list(&retrying, &retrieved(2, vec![commit(21, 80)], 30));
        assert!(!recovered.is_loading_list);
        assert!(!recovered.error_while_fetching_data);
    }

    #[test]
    fn item_requests_leave_the_loading_flag_alone() {
        let cache = Rc::new(PagedListCache::default());
        let loading = reduce_list(&cache, &ListEvent::PageRequested { page: 0 });
        assert!(loading.is_loading_list);
        assert!(!loading.action_pending);

        let pending = reduce_list(&loading, &ListEvent::PerformingRequest);
        assert!(pending.is_loading_list);
        assert!(pending.action_pending);

        let completed = reduce_list(&pending, &ListEvent::RequestCompleted);
        assert!(completed.is_loading_list);
        assert!(!completed.action_pending);

        let reviewing = reduce_list(&completed, &ListEvent::PerformingRequest);
        let failed = reduce_list(&reviewing, &ListEvent::ItemReviewFailed { id: 3 });
        assert!(failed.is_loading_list);
        assert!(!failed.action_pending);
        assert_eq!(failed.total_items_count, loading.total_items_count);
    }

    #[test]
    fn page_count_rounds_up() {
        let cache = PagedListCache {
            total_items_count: 21,
            ..PagedListCache::default()
        };
        assert_eq!(cache.page_count(10), 3);
        assert_eq!(cache.page_count(0), 0);
        assert_eq!(cache.retrieve_element(0, RowSelector::Row(0)), None);
    }
}
