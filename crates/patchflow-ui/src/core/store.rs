//! App-wide store and the handle features use to reach it.
//!
//! # Design
//! - One `AppStore` with small slices (session, user, lists) so reducers stay predictable.
//! - Features depend on the [`StoreHandle`] trait, not on a global; the browser binds it to
//!   yewdux's `Dispatch`, native callers and tests use [`LocalStore`].
//! - Every update swaps in a new `Rc<AppStore>`; readers holding an old snapshot keep it.

use std::cell::RefCell;
use std::rc::Rc;

use yewdux::store::Store;

use crate::core::auth::{AuthEvent, SessionState, UserState, reduce_session, reduce_user};
use crate::features::lists::registry::{ListAction, ListTarget, ListsState, reduce_lists};
use crate::features::lists::state::ListEvent;

/// Global application store.
#[derive(Clone, Debug, PartialEq, Eq, Store, Default)]
pub struct AppStore {
    /// Login state and access token.
    pub session: SessionState,
    /// Profile of the logged-in user.
    pub user: UserState,
    /// Every list cache.
    pub lists: ListsState,
}

impl AppStore {
    /// Route a tagged list action to its slot.
    pub fn apply_list_action(&mut self, action: &ListAction) {
        self.lists = reduce_lists(&self.lists, action);
    }

    /// Apply a session/profile transition.
    pub fn apply_auth_event(&mut self, event: &AuthEvent) {
        self.session = reduce_session(&self.session, event);
        self.user = reduce_user(&self.user, event);
    }
}

/// Access to the shared store.
pub trait StoreHandle: Clone {
    /// Current state.
    fn snapshot(&self) -> Rc<AppStore>;

    /// Mutate the state and notify subscribers.
    fn reduce<F: FnOnce(&mut AppStore)>(&self, f: F);

    /// Dispatch a list event tagged with `target`.
    fn dispatch_list(&self, target: ListTarget, event: ListEvent) {
        let action = ListAction::new(target, event);
        self.reduce(|store| store.apply_list_action(&action));
    }

    /// Dispatch a session/profile event.
    fn dispatch_auth(&self, event: &AuthEvent) {
        self.reduce(|store| store.apply_auth_event(event));
    }
}

/// Single-threaded in-memory store.
#[derive(Clone, Debug, Default)]
pub struct LocalStore {
    state: Rc<RefCell<Rc<AppStore>>>,
}

impl LocalStore {
    /// Store seeded with `state`.
    #[must_use]
    pub fn with_state(state: AppStore) -> Self {
        Self {
            state: Rc::new(RefCell::new(Rc::new(state))),
        }
    }
}

impl StoreHandle for LocalStore {
    fn snapshot(&self) -> Rc<AppStore> {
        Rc::clone(&self.state.borrow())
    }

    fn reduce<F: FnOnce(&mut AppStore)>(&self, f: F) {
        let mut next = (*self.snapshot()).clone();
        f(&mut next);
        *self.state.borrow_mut() = Rc::new(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::lists::registry::ListSlot;

    #[test]
    fn local_store_swaps_snapshots() {
        let store = LocalStore::default();
        let before = store.snapshot();
        store.dispatch_list(ListSlot::ClientSendRequests.target(), ListEvent::AutoCheckStarted);
        let after = store.snapshot();
        assert!(!before.lists.get(ListSlot::ClientSendRequests).is_auto_checking);
        assert!(after.lists.get(ListSlot::ClientSendRequests).is_auto_checking);
        assert!(Rc::ptr_eq(
            before.lists.get(ListSlot::ProgrammerCommits),
            after.lists.get(ListSlot::ProgrammerCommits)
        ));
    }

    #[test]
    fn auth_events_update_both_slices() {
        let store = LocalStore::with_state(AppStore::default());
        store.dispatch_auth(&AuthEvent::LoginSucceeded {
            access_token: "abc".to_string(),
        });
        assert!(store.snapshot().session.is_authenticated());
        store.dispatch_auth(&AuthEvent::SessionExpired);
        let state = store.snapshot();
        assert!(state.session.is_session_expired);
        assert!(state.user.info.is_none());
    }
}
