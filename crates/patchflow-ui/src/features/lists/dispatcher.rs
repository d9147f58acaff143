//! Side-effecting list intents.
//!
//! # Design
//! - Intents (load, reload, review, feedback, create, remove) perform the HTTP call and emit
//!   tagged [`ListEvent`]s; reducers stay pure.
//! - Every 401 is turned into a session expiry instead of a list error.
//! - The store is only touched synchronously between awaits.

use std::rc::Rc;
use std::time::Duration;

use patchflow_api_models::{ApprovalStatus, ElementKind, InstallStatus, ItemId, NewSendRequestData};
use tracing::{debug, warn};

use crate::core::api::{ApiClient, ApiError};
use crate::core::auth::AuthEvent;
use crate::core::store::StoreHandle;
use crate::core::transport::HttpTransport;
use crate::features::lists::checker::{AutoCheckHandle, AutoUpdateTask, Sleeper};
use crate::features::lists::query::{PageQuery, PageRequest};
use crate::features::lists::registry::ListTarget;
use crate::features::lists::state::ListEvent;

/// What a page load ended up doing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The page was fetched and cached.
    Fetched,
    /// The cached page was reused.
    Cached,
    /// The fetch failed.
    Failed,
}

/// Issues list requests and reports their progress to the store.
pub struct ListDispatcher<T, S> {
    api: Rc<ApiClient<T>>,
    store: S,
    page_size: u32,
}

impl<T: HttpTransport, S: StoreHandle> ListDispatcher<T, S> {
    /// Dispatcher fetching `page_size` rows per page.
    #[must_use]
    pub const fn new(api: Rc<ApiClient<T>>, store: S, page_size: u32) -> Self {
        Self {
            api,
            store,
            page_size,
        }
    }

    /// Shared API client.
    #[must_use]
    pub const fn api(&self) -> &Rc<ApiClient<T>> {
        &self.api
    }

    /// Store events are dispatched to.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Rows per page.
    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    fn expire_if_unauthorized(&self, err: &ApiError) -> bool {
        if err.is_unauthorized() {
            self.store.dispatch_auth(&AuthEvent::SessionExpired);
            return true;
        }
        false
    }

    /// Load `request`, reusing the cached page when it is fresh and was fetched with the
    /// same query.
    pub async fn load_page(&self, target: ListTarget, request: &PageRequest) -> LoadOutcome {
        let needs_retrieval = self
            .store
            .snapshot()
            .lists
            .for_target(target)
            .is_none_or(|cache| cache.needs_retrieval(request));
        if !needs_retrieval {
            debug!(
                role = target.role.as_str(),
                list = target.kind.as_str(),
                page = request.page,
                "page cached"
            );
            self.store
                .dispatch_list(target, ListEvent::NoRetrievalNeeded { page: request.page });
            return LoadOutcome::Cached;
        }
        self.fetch_page(target, request).await
    }

    /// Fetch `request` from the server regardless of the cache.
    pub async fn fetch_page(&self, target: ListTarget, request: &PageRequest) -> LoadOutcome {
        let page = request.page;
        self.store
            .dispatch_list(target, ListEvent::PageRequested { page });
        debug!(role = target.role.as_str(), list = target.kind.as_str(), page, "fetching page");
        match self.api.fetch_page(target.kind, request, self.page_size).await {
            Ok(response) => {
                self.store.dispatch_list(
                    target,
                    ListEvent::PageRetrieved {
                        page,
                        query: request.query.clone(),
                        response,
                    },
                );
                LoadOutcome::Fetched
            }
            Err(err) => {
                warn!(
                    role = target.role.as_str(),
                    list = target.kind.as_str(),
                    page,
                    error = %err,
                    "page fetch failed"
                );
                self.store
                    .dispatch_list(target, ListEvent::PageRetrievalFailed { page });
                self.expire_if_unauthorized(&err);
                LoadOutcome::Failed
            }
        }
    }

    /// Start polling freshness for `target`; the caller spawns the returned task.
    pub fn start_auto_check<Z: Sleeper>(
        &self,
        target: ListTarget,
        sleeper: Z,
        interval: Duration,
    ) -> AutoUpdateTask<T, S, Z> {
        self.store
            .dispatch_list(target, ListEvent::AutoCheckStarted);
        AutoUpdateTask::new(
            Rc::clone(&self.api),
            self.store.clone(),
            sleeper,
            interval,
            AutoCheckHandle::new(target),
        )
    }

    /// Stop a poller started with [`Self::start_auto_check`].
    pub fn stop_auto_check(&self, handle: &AutoCheckHandle) {
        handle.stop();
        self.store
            .dispatch_list(handle.target(), ListEvent::AutoCheckStopped);
    }

    /// Approve or reject `id`. Returns whether the server accepted the review.
    pub async fn review_item(
        &self,
        target: ListTarget,
        id: ItemId,
        approval_status: ApprovalStatus,
    ) -> bool {
        self.store
            .dispatch_list(target, ListEvent::ItemReviewRequested { id });
        match self.api.review(target.kind, id, approval_status).await {
            Ok(updated) => {
                self.store
                    .dispatch_list(target, ListEvent::ItemReviewSucceeded { id, updated });
                true
            }
            Err(err) => {
                warn!(
                    role = target.role.as_str(),
                    list = target.kind.as_str(),
                    id,
                    error = %err,
                    "review failed"
                );
                self.store
                    .dispatch_list(target, ListEvent::ItemReviewFailed { id });
                self.expire_if_unauthorized(&err);
                false
            }
        }
    }

    /// Report installation feedback for send request `id`. Returns whether it was accepted.
    pub async fn send_feedback(
        &self,
        target: ListTarget,
        id: ItemId,
        install_status: InstallStatus,
        install_feedback: &str,
    ) -> bool {
        self.store
            .dispatch_list(target, ListEvent::FeedbackRequested { id });
        match self
            .api
            .send_feedback(id, install_status, install_feedback)
            .await
        {
            Ok(updated) => {
                self.store
                    .dispatch_list(target, ListEvent::FeedbackSucceeded { id, updated });
                true
            }
            Err(err) => {
                warn!(id, error = %err, "install feedback failed");
                self.store
                    .dispatch_list(target, ListEvent::FeedbackFailed { id });
                self.expire_if_unauthorized(&err);
                false
            }
        }
    }

    /// Submit a new send request, then reload page 0 of `target` with `query`.
    ///
    /// # Errors
    ///
    /// The creation failure; the list is left untouched in that case.
    pub async fn create_send_request(
        &self,
        target: ListTarget,
        data: NewSendRequestData,
        query: PageQuery,
    ) -> Result<LoadOutcome, ApiError> {
        self.store
            .dispatch_list(target, ListEvent::PerformingRequest);
        let created = self.api.create_send_request(data).await;
        self.store
            .dispatch_list(target, ListEvent::RequestCompleted);
        if let Err(err) = created {
            warn!(error = %err, "send request creation failed");
            self.expire_if_unauthorized(&err);
            return Err(err);
        }
        let request = PageRequest { page: 0, query };
        Ok(self.fetch_page(target, &request).await)
    }

    /// Remove element `id` of `kind`, then reload `request`.
    ///
    /// # Errors
    ///
    /// The removal failure; the list is left untouched in that case.
    pub async fn remove_element(
        &self,
        target: ListTarget,
        id: ItemId,
        request: &PageRequest,
    ) -> Result<LoadOutcome, ApiError> {
        let kind: ElementKind = target.kind;
        if let Err(err) = self.api.remove(kind, id).await {
            warn!(list = kind.as_str(), id, error = %err, "element removal failed");
            self.expire_if_unauthorized(&err);
            return Err(err);
        }
        Ok(self.fetch_page(target, request).await)
    }
}
