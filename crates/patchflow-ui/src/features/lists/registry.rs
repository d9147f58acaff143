//! Registry of list slots keyed by (role, element kind).
//!
//! # Design
//! - Each slot owns an independent [`PagedListCache`]; actions carry a [`ListTarget`] tag and
//!   only the slot with a matching tag changes.
//! - Slots an action does not address are handed back by reference, never rebuilt.

use std::rc::Rc;

use patchflow_api_models::{ElementKind, UserRole};

use crate::features::lists::query::FilterDescriptor;
use crate::features::lists::state::{ListEvent, PagedListCache, reduce_list};

/// (role, element kind) tag carried by list actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListTarget {
    /// Role whose view owns the list.
    pub role: UserRole,
    /// Element type shown by the list.
    pub kind: ElementKind,
}

impl ListTarget {
    /// Build a target.
    #[must_use]
    pub const fn new(role: UserRole, kind: ElementKind) -> Self {
        Self { role, kind }
    }
}

/// The lists the client keeps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ListSlot {
    /// Commits authored by the programmer.
    ProgrammerCommits,
    /// Send requests authored by the programmer.
    ProgrammerSendRequests,
    /// Commits reviewed by the technical area manager.
    ManagerCommits,
    /// Send requests reviewed by the revision office manager.
    RevisionOfficeSendRequests,
    /// Send requests delivered to the client.
    ClientSendRequests,
}

impl ListSlot {
    /// Every slot.
    pub const ALL: [Self; 5] = [
        Self::ProgrammerCommits,
        Self::ProgrammerSendRequests,
        Self::ManagerCommits,
        Self::RevisionOfficeSendRequests,
        Self::ClientSendRequests,
    ];

    /// Tag addressing this slot.
    #[must_use]
    pub const fn target(self) -> ListTarget {
        match self {
            Self::ProgrammerCommits => ListTarget::new(UserRole::Programmer, ElementKind::Commits),
            Self::ProgrammerSendRequests => {
                ListTarget::new(UserRole::Programmer, ElementKind::SendRequests)
            }
            Self::ManagerCommits => {
                ListTarget::new(UserRole::TechnicalAreaManager, ElementKind::Commits)
            }
            Self::RevisionOfficeSendRequests => {
                ListTarget::new(UserRole::RevisionOfficeManager, ElementKind::SendRequests)
            }
            Self::ClientSendRequests => {
                ListTarget::new(UserRole::Client, ElementKind::SendRequests)
            }
        }
    }

    /// Slot addressed by `target`, if registered.
    #[must_use]
    pub fn for_target(target: ListTarget) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.target() == target)
    }

    /// Slots owned by `role`'s view, in tab order.
    pub fn for_role(role: UserRole) -> impl Iterator<Item = Self> {
        Self::ALL
            .into_iter()
            .filter(move |slot| slot.target().role == role)
    }

    /// Whether this slot's view reviews items rather than authoring them.
    #[must_use]
    pub const fn is_reviewer_view(self) -> bool {
        matches!(self, Self::ManagerCommits | Self::RevisionOfficeSendRequests)
    }

    /// Filter the slot's view opens with: "to be reviewed" for reviewers, unfiltered
    /// otherwise.
    #[must_use]
    pub const fn default_filter(self) -> FilterDescriptor {
        if self.is_reviewer_view() {
            FilterDescriptor::to_be_reviewed()
        } else {
            FilterDescriptor::unfiltered()
        }
    }
}

/// A list event tagged with the list it is meant for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListAction {
    /// Addressed list.
    pub target: ListTarget,
    /// Transition to apply.
    pub event: ListEvent,
}

impl ListAction {
    /// Build an action.
    #[must_use]
    pub const fn new(target: ListTarget, event: ListEvent) -> Self {
        Self { target, event }
    }
}

/// All list caches.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ListsState {
    programmer_commits: Rc<PagedListCache>,
    programmer_send_requests: Rc<PagedListCache>,
    manager_commits: Rc<PagedListCache>,
    revision_office_send_requests: Rc<PagedListCache>,
    client_send_requests: Rc<PagedListCache>,
}

impl ListsState {
    /// Cache of `slot`.
    #[must_use]
    pub const fn get(&self, slot: ListSlot) -> &Rc<PagedListCache> {
        match slot {
            ListSlot::ProgrammerCommits => &self.programmer_commits,
            ListSlot::ProgrammerSendRequests => &self.programmer_send_requests,
            ListSlot::ManagerCommits => &self.manager_commits,
            ListSlot::RevisionOfficeSendRequests => &self.revision_office_send_requests,
            ListSlot::ClientSendRequests => &self.client_send_requests,
        }
    }

    /// Cache addressed by `target`, if registered.
    #[must_use]
    pub fn for_target(&self, target: ListTarget) -> Option<&Rc<PagedListCache>> {
        ListSlot::for_target(target).map(|slot| self.get(slot))
    }

    const fn get_mut(&mut self, slot: ListSlot) -> &mut Rc<PagedListCache> {
        match slot {
            ListSlot::ProgrammerCommits => &mut self.programmer_commits,
            ListSlot::ProgrammerSendRequests => &mut self.programmer_send_requests,
            ListSlot::ManagerCommits => &mut self.manager_commits,
            ListSlot::RevisionOfficeSendRequests => &mut self.revision_office_send_requests,
            ListSlot::ClientSendRequests => &mut self.client_send_requests,
        }
    }
}

/// Reduce one slot: foreign tags leave the cache untouched.
#[must_use]
pub fn reduce_slot(
    slot: ListSlot,
    cache: &Rc<PagedListCache>,
    action: &ListAction,
) -> Rc<PagedListCache> {
    if slot.target() != action.target {
        return Rc::clone(cache);
    }
    reduce_list(cache, &action.event)
}

/// Route `action` to the slot it addresses.
#[must_use]
pub fn reduce_lists(state: &ListsState, action: &ListAction) -> ListsState {
    let mut next = state.clone();
    for slot in ListSlot::ALL {
        *next.get_mut(slot) = reduce_slot(slot, state.get(slot), action);
    }
    next
}
