//! Role sections and tab routing.
//!
//! # Design
//! - The home view lists one section per role the user holds, in a fixed order.
//! - Routes look like `/<role>/<tab>`; an unknown or missing tab falls back to the first one.

use patchflow_api_models::{ElementKind, UserInfo, UserRole};

use crate::features::lists::registry::{ListSlot, ListTarget};

/// A navigation section backed by a role view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NavigationSection {
    /// Role owning the section.
    pub role: UserRole,
    /// Section title.
    pub title: &'static str,
}

impl NavigationSection {
    /// Section of `role`.
    #[must_use]
    pub const fn for_role(role: UserRole) -> Self {
        let title = match role {
            UserRole::Programmer => "Programmer",
            UserRole::TechnicalAreaManager => "Technical area manager",
            UserRole::RevisionOfficeManager => "Revision office manager",
            UserRole::Client => "Client",
        };
        Self { role, title }
    }

    /// Route prefix, e.g. `/programmer`.
    #[must_use]
    pub fn route(&self) -> String {
        format!("/{}", self.role.as_str())
    }

    /// Tabs of the section, in display order.
    #[must_use]
    pub fn tabs(&self) -> Vec<NavigationTab> {
        ListSlot::for_role(self.role)
            .map(|slot| NavigationTab::from(slot.target()))
            .collect()
    }
}

/// Sections visible to `user`.
#[must_use]
pub fn visible_sections(user: &UserInfo) -> Vec<NavigationSection> {
    UserRole::all()
        .into_iter()
        .filter(|role| user.has_role(*role))
        .map(NavigationSection::for_role)
        .collect()
}

/// Tab of a role section.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NavigationTab {
    /// List shown by the tab.
    pub target: ListTarget,
}

impl From<ListTarget> for NavigationTab {
    fn from(target: ListTarget) -> Self {
        Self { target }
    }
}

impl NavigationTab {
    /// URL segment of the tab.
    #[must_use]
    pub const fn segment(&self) -> &'static str {
        self.target.kind.as_str()
    }

    /// Tab of `role` selected by `segment`; `None` for a role without lists.
    ///
    /// Accepts the kind name (`commits`) or a zero-based index (`1`); anything else picks
    /// the first tab.
    #[must_use]
    pub fn from_segment(role: UserRole, segment: Option<&str>) -> Option<Self> {
        let tabs = NavigationSection::for_role(role).tabs();
        let chosen = segment.and_then(|segment| {
            tabs.iter().copied().find(|tab| tab.segment() == segment).or_else(|| {
                segment
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| tabs.get(index).copied())
            })
        });
        chosen.or_else(|| tabs.first().copied())
    }
}

/// Resolve `/<role>[/<tab>]` into the list it shows.
#[must_use]
pub fn resolve_route(user: &UserInfo, path: &str) -> Option<ListTarget> {
    let mut parts = path.trim_matches('/').split('/');
    let role = UserRole::from_str_opt(parts.next()?)?;
    if !user.has_role(role) {
        return None;
    }
    NavigationTab::from_segment(role, parts.next()).map(|tab| tab.target)
}

/// Element kinds a role's view lists.
#[must_use]
pub fn kinds_for_role(role: UserRole) -> Vec<ElementKind> {
    ListSlot::for_role(role)
        .map(|slot| slot.target().kind)
        .collect()
}
