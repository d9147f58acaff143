//! Role view controller: one query state and review tracker per list tab.
//!
//! # Design
//! - Methods take `&self`; per-list state sits in a `RefCell` that is borrowed only between
//!   awaits, so several reviews can be in flight at once.
//! - Reviewer views start on the "to be reviewed" filter, authoring views unfiltered.
//! - `mount` loads page 0 of every tab and returns the pollers for the caller to spawn;
//!   `unmount` stops them and resets per-item state.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

use patchflow_api_models::{
    ApprovalStatus, ElementKind, InstallStatus, ItemId, ListItem, UserRole,
};
use thiserror::Error;
use tracing::debug;

use crate::core::api::ApiError;
use crate::core::logic::can_remove;
use crate::core::store::StoreHandle;
use crate::core::transport::HttpTransport;
use crate::features::lists::checker::{AutoCheckHandle, AutoUpdateTask, Sleeper};
use crate::features::lists::dispatcher::{ListDispatcher, LoadOutcome};
use crate::features::lists::query::{FilterDescriptor, ListQueryState, PageRequest, SortDescriptor};
use crate::features::lists::registry::{ListSlot, ListTarget};
use crate::features::lists::review::{ItemStatus, ReviewError, ReviewTracker};
use crate::features::lists::state::RowSelector;
use crate::features::send_requests::{DraftError, SendRequestDraft};

/// Failures of controller intents.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// The role's view has no list of this kind.
    #[error("no {kind:?} list in the {role:?} view")]
    UnknownList {
        /// Role of the view.
        role: UserRole,
        /// Requested list kind.
        kind: ElementKind,
    },
    /// Illegal review transition.
    #[error(transparent)]
    Review(#[from] ReviewError),
    /// Draft failed validation.
    #[error(transparent)]
    Draft(#[from] DraftError),
    /// Server call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// The element is not a pending element of the current user.
    #[error("element {id} cannot be removed")]
    NotRemovable {
        /// Element id.
        id: ItemId,
    },
}

/// Everything a list table needs to render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListPresentation {
    /// List shown.
    pub target: ListTarget,
    /// Rows of the current page.
    pub table_data: Vec<ListItem>,
    /// Total items across pages.
    pub items_count: u64,
    /// Zero-based current page.
    pub current_page: u32,
    /// Number of pages.
    pub page_count: u64,
    /// A fetch is in flight.
    pub is_loading: bool,
    /// Latest freshness token.
    pub latest_update_timestamp: u64,
    /// The last fetch failed.
    pub display_error: bool,
    /// The last freshness check failed.
    pub update_check_failed: bool,
    /// Newer data exists for the current page.
    pub show_updates_badge: bool,
    /// The "to be reviewed" filter is active.
    pub is_review_mode: bool,
    /// A text search is active.
    pub is_searching: bool,
    /// Active sort.
    pub sorting: SortDescriptor,
    /// Active filter.
    pub filter: FilterDescriptor,
    /// Ids with a request in flight.
    pub in_progress: Vec<ItemId>,
    /// Ids handled successfully.
    pub succeeded: Vec<ItemId>,
    /// Ids whose request failed.
    pub failed: Vec<ItemId>,
}

struct ListView {
    target: ListTarget,
    query: ListQueryState,
    reviews: ReviewTracker,
}

impl ListView {
    fn new(slot: ListSlot) -> Self {
        Self {
            target: slot.target(),
            query: ListQueryState::new(slot.default_filter()),
            reviews: ReviewTracker::default(),
        }
    }
}

/// Controller of one role view.
pub struct ViewController<T, S> {
    role: UserRole,
    dispatcher: Rc<ListDispatcher<T, S>>,
    views: BTreeMap<ElementKind, RefCell<ListView>>,
    auto_checks: RefCell<Vec<AutoCheckHandle>>,
    poll_interval: Duration,
}

impl<T: HttpTransport, S: StoreHandle> ViewController<T, S> {
    /// Controller for `role`'s view.
    #[must_use]
    pub fn new(
        role: UserRole,
        dispatcher: Rc<ListDispatcher<T, S>>,
        poll_interval: Duration,
    ) -> Self {
        let views = ListSlot::for_role(role)
            .map(|slot| (slot.target().kind, RefCell::new(ListView::new(slot))))
            .collect();
        Self {
            role,
            dispatcher,
            views,
            auto_checks: RefCell::new(Vec::new()),
            poll_interval,
        }
    }

    /// Role of the view.
    #[must_use]
    pub const fn role(&self) -> UserRole {
        self.role
    }

    /// List kinds of the view, in tab order.
    #[must_use]
    pub fn kinds(&self) -> Vec<ElementKind> {
        self.views.keys().copied().collect()
    }

    /// Whether pollers are registered.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        !self.auto_checks.borrow().is_empty()
    }

    fn view(&self, kind: ElementKind) -> Result<&RefCell<ListView>, ControllerError> {
        self.views.get(&kind).ok_or(ControllerError::UnknownList {
            role: self.role,
            kind,
        })
    }

    fn target_and<R>(
        &self,
        kind: ElementKind,
        f: impl FnOnce(&mut ListView) -> R,
    ) -> Result<(ListTarget, R), ControllerError> {
        let mut view = self.view(kind)?.borrow_mut();
        let result = f(&mut view);
        Ok((view.target, result))
    }

    /// Load page 0 of every tab and start their pollers.
    pub async fn mount<Z: Sleeper + Clone>(&self, sleeper: Z) -> Vec<AutoUpdateTask<T, S, Z>> {
        let mut tasks = Vec::with_capacity(self.views.len());
        for view in self.views.values() {
            let (target, request) = {
                let view = view.borrow();
                (view.target, view.query.current_request())
            };
            self.dispatcher.load_page(target, &request).await;
            let task = self
                .dispatcher
                .start_auto_check(target, sleeper.clone(), self.poll_interval);
            self.auto_checks.borrow_mut().push(task.handle());
            tasks.push(task);
        }
        debug!(role = self.role.as_str(), lists = tasks.len(), "view mounted");
        tasks
    }

    /// Stop pollers and reset per-item state.
    pub fn unmount(&self) {
        let handles: Vec<_> = self.auto_checks.borrow_mut().drain(..).collect();
        for handle in &handles {
            self.dispatcher.stop_auto_check(handle);
        }
        for view in self.views.values() {
            view.borrow_mut().reviews.reset();
        }
        debug!(role = self.role.as_str(), "view unmounted");
    }

    /// Show page `page` of `kind`.
    ///
    /// # Errors
    ///
    /// [`ControllerError::UnknownList`] for a kind the view does not show.
    pub async fn change_page(
        &self,
        kind: ElementKind,
        page: u32,
    ) -> Result<LoadOutcome, ControllerError> {
        let (target, request) = self.target_and(kind, |view| view.query.change_page(page))?;
        Ok(self.dispatcher.load_page(target, &request).await)
    }

    /// Sort `kind` by `column`.
    ///
    /// # Errors
    ///
    /// [`ControllerError::UnknownList`] for a kind the view does not show.
    pub async fn sort(
        &self,
        kind: ElementKind,
        column: &str,
    ) -> Result<LoadOutcome, ControllerError> {
        let (target, request) = self.target_and(kind, |view| view.query.sort(column))?;
        Ok(self.dispatcher.load_page(target, &request).await)
    }

    /// Switch the filter of `kind`.
    ///
    /// # Errors
    ///
    /// [`ControllerError::UnknownList`] for a kind the view does not show.
    pub async fn set_filter(
        &self,
        kind: ElementKind,
        filter: FilterDescriptor,
    ) -> Result<LoadOutcome, ControllerError> {
        let (target, request) = self.target_and(kind, |view| {
            let transition = view.query.set_filter(filter);
            if transition.filter_changed {
                view.reviews.clear_outcomes();
            }
            transition.request
        })?;
        Ok(self.dispatcher.load_page(target, &request).await)
    }

    /// Search `kind` for `query`; an empty query shows the history.
    ///
    /// # Errors
    ///
    /// [`ControllerError::UnknownList`] for a kind the view does not show.
    pub async fn search(
        &self,
        kind: ElementKind,
        query: &str,
    ) -> Result<LoadOutcome, ControllerError> {
        let (target, request) = self.target_and(kind, |view| {
            let transition = view.query.search(query);
            if transition.filter_changed {
                view.reviews.clear_outcomes();
            }
            transition.request
        })?;
        Ok(self.dispatcher.load_page(target, &request).await)
    }

    /// Re-fetch the current page of `kind` from the server.
    ///
    /// # Errors
    ///
    /// [`ControllerError::UnknownList`] for a kind the view does not show.
    pub async fn reload(&self, kind: ElementKind) -> Result<LoadOutcome, ControllerError> {
        let (target, request) = self.target_and(kind, |view| view.query.current_request())?;
        Ok(self.dispatcher.fetch_page(target, &request).await)
    }

    /// Approve or reject `id` in `kind`.
    ///
    /// # Errors
    ///
    /// [`ControllerError::Review`] when the item is not idle or was reset while in flight.
    pub async fn review_item(
        &self,
        kind: ElementKind,
        id: ItemId,
        approval_status: ApprovalStatus,
    ) -> Result<ItemStatus, ControllerError> {
        let (target, begun) = self.target_and(kind, |view| view.reviews.begin(id))?;
        begun?;
        let success = self
            .dispatcher
            .review_item(target, id, approval_status)
            .await;
        self.complete(kind, id, success)
    }

    /// Report installation feedback for send request `id`.
    ///
    /// # Errors
    ///
    /// [`ControllerError::UnknownList`] outside the client view, or
    /// [`ControllerError::Review`] when the item is not idle.
    pub async fn send_feedback(
        &self,
        id: ItemId,
        install_status: InstallStatus,
        install_feedback: &str,
    ) -> Result<ItemStatus, ControllerError> {
        let kind = ElementKind::SendRequests;
        let (target, begun) = self.target_and(kind, |view| view.reviews.begin(id))?;
        begun?;
        let success = self
            .dispatcher
            .send_feedback(target, id, install_status, install_feedback)
            .await;
        self.complete(kind, id, success)
    }

    fn complete(
        &self,
        kind: ElementKind,
        id: ItemId,
        success: bool,
    ) -> Result<ItemStatus, ControllerError> {
        let (_, status) = self.target_and(kind, |view| view.reviews.complete(id, success))?;
        Ok(status?)
    }

    /// Clear a failure so `id` can be retried.
    ///
    /// # Errors
    ///
    /// [`ControllerError::UnknownList`] for a kind the view does not show.
    pub fn acknowledge_failure(
        &self,
        kind: ElementKind,
        id: ItemId,
    ) -> Result<bool, ControllerError> {
        self.target_and(kind, |view| view.reviews.acknowledge_failure(id))
            .map(|(_, acknowledged)| acknowledged)
    }

    /// Review status of `id` in `kind`.
    #[must_use]
    pub fn item_status(&self, kind: ElementKind, id: ItemId) -> ItemStatus {
        self.views
            .get(&kind)
            .map_or(ItemStatus::Idle, |view| view.borrow().reviews.status(id))
    }

    /// Validate `draft`, submit it and reload page 0 of the send requests tab.
    ///
    /// # Errors
    ///
    /// [`ControllerError::Draft`] before any request, or [`ControllerError::Api`].
    pub async fn create_send_request(
        &self,
        draft: &SendRequestDraft,
    ) -> Result<LoadOutcome, ControllerError> {
        let data = draft.validate()?;
        let (target, request) =
            self.target_and(ElementKind::SendRequests, |view| view.query.change_page(0))?;
        Ok(self
            .dispatcher
            .create_send_request(target, data, request.query)
            .await?)
    }

    /// Remove `id` from `kind` if it is a pending element of the current user, then reload
    /// the current page.
    ///
    /// # Errors
    ///
    /// [`ControllerError::NotRemovable`] when the rule forbids it, or
    /// [`ControllerError::Api`].
    pub async fn remove_element(
        &self,
        kind: ElementKind,
        id: ItemId,
    ) -> Result<LoadOutcome, ControllerError> {
        let (target, request) = self.target_and(kind, |view| view.query.current_request())?;
        let removable = {
            let state = self.dispatcher.store().snapshot();
            let item = state
                .lists
                .for_target(target)
                .and_then(|cache| cache.retrieve_element(request.page, RowSelector::Id(id)));
            match (item, state.user.info.as_ref()) {
                (Some(item), Some(user)) => can_remove(item, user),
                _ => false,
            }
        };
        if !removable {
            return Err(ControllerError::NotRemovable { id });
        }
        Ok(self.dispatcher.remove_element(target, id, &request).await?)
    }

    /// Row of the current page of `kind`.
    #[must_use]
    pub fn element(&self, kind: ElementKind, selector: RowSelector) -> Option<ListItem> {
        let view = self.views.get(&kind)?.borrow();
        let state = self.dispatcher.store().snapshot();
        state
            .lists
            .for_target(view.target)?
            .retrieve_element(view.query.current_page(), selector)
            .cloned()
    }

    /// Current request of `kind`.
    #[must_use]
    pub fn current_request(&self, kind: ElementKind) -> Option<PageRequest> {
        self.views
            .get(&kind)
            .map(|view| view.borrow().query.current_request())
    }

    /// Render data for `kind`.
    #[must_use]
    pub fn presentation(&self, kind: ElementKind) -> Option<ListPresentation> {
        let view = self.views.get(&kind)?.borrow();
        let state = self.dispatcher.store().snapshot();
        let cache = state.lists.for_target(view.target)?;
        let page = view.query.current_page();
        Some(ListPresentation {
            target: view.target,
            table_data: cache.rows(page).to_vec(),
            items_count: cache.total_items_count,
            current_page: page,
            page_count: cache.page_count(self.dispatcher.page_size()),
            is_loading: cache.is_loading_list,
            latest_update_timestamp: cache.latest_update_timestamp,
            display_error: cache.error_while_fetching_data,
            update_check_failed: cache.error_while_checking_updates,
            show_updates_badge: cache.show_updates_badge(page),
            is_review_mode: view.query.is_review_mode(),
            is_searching: view.query.is_searching(),
            sorting: view.query.sorting().clone(),
            filter: view.query.filter().clone(),
            in_progress: view.reviews.in_progress().iter().copied().collect(),
            succeeded: view.reviews.succeeded().iter().copied().collect(),
            failed: view.reviews.failed().iter().copied().collect(),
        })
    }
}
