//! Pure presentation helpers for list rows and detail dialogs.

use chrono::DateTime;
use patchflow_api_models::{ApprovalStatus, InstallStatus, ListItem, UserInfo};

/// Text shown for a missing value.
pub const PLACEHOLDER: &str = "—";

/// Fields a detail dialog can show.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementField {
    /// Item id.
    Id,
    /// Short title.
    Title,
    /// Free-text description.
    Description,
    /// Creation time.
    Timestamp,
    /// Last modification time.
    UpdateTimestamp,
    /// Delivery time (send requests).
    DeliveryTimestamp,
    /// Submitting user.
    Author,
    /// Reviewer.
    Approver,
    /// Review outcome.
    ApprovalStatus,
    /// Installation mode (send requests).
    InstallType,
    /// Package download link (send requests).
    InstallLink,
    /// Installation outcome (send requests).
    InstallStatus,
    /// Installation feedback (send requests).
    InstallFeedback,
    /// Shipped commits (send requests).
    LinkedCommits,
    /// Destination clients (send requests).
    RecipientClients,
    /// Client contacts (send requests).
    ClientRepresentatives,
    /// Affected components.
    Components,
    /// Source branch (send requests).
    Branch,
}

/// Format UNIX seconds as `dd/mm/yyyy HH:MM:SS` (UTC).
#[must_use]
pub fn format_timestamp(seconds: u64) -> String {
    i64::try_from(seconds)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map_or_else(
            || PLACEHOLDER.to_string(),
            |time| time.format("%d/%m/%Y %H:%M:%S").to_string(),
        )
}

fn non_empty(value: &str) -> String {
    if value.trim().is_empty() {
        PLACEHOLDER.to_string()
    } else {
        value.to_string()
    }
}

fn optional<T>(value: Option<T>, render: impl FnOnce(T) -> String) -> String {
    value.map_or_else(|| PLACEHOLDER.to_string(), render)
}

fn joined<I: IntoIterator<Item = String>>(values: I) -> String {
    let joined = values.into_iter().collect::<Vec<_>>().join(", ");
    non_empty(&joined)
}

/// Printable value of `field` for `item`; fields the item does not carry render as
/// [`PLACEHOLDER`].
#[must_use]
pub fn render_field(item: &ListItem, field: ElementField) -> String {
    match (field, item) {
        (ElementField::Id, _) => item.id().to_string(),
        (ElementField::Title, _) => non_empty(item.title()),
        (ElementField::Description, _) => non_empty(item.description()),
        (ElementField::Timestamp, _) => format_timestamp(item.timestamp()),
        (ElementField::Author, _) => non_empty(&item.author().name),
        (ElementField::ApprovalStatus, _) => item.approval_status().label().to_string(),
        (ElementField::UpdateTimestamp, ListItem::Commit(commit)) => {
            optional(commit.update_timestamp, format_timestamp)
        }
        (ElementField::UpdateTimestamp, ListItem::SendRequest(request)) => {
            optional(request.update_timestamp, format_timestamp)
        }
        (ElementField::Approver, ListItem::Commit(commit)) => {
            optional(commit.approver.as_ref(), |author| non_empty(&author.name))
        }
        (ElementField::Approver, ListItem::SendRequest(request)) => {
            optional(request.approver.as_ref(), |author| non_empty(&author.name))
        }
        (ElementField::Components, ListItem::Commit(commit)) => {
            optional(commit.components.as_deref(), non_empty)
        }
        (ElementField::Components, ListItem::SendRequest(request)) => {
            optional(request.components.as_deref(), non_empty)
        }
        (ElementField::DeliveryTimestamp, ListItem::SendRequest(request)) => {
            optional(request.delivery_timestamp, format_timestamp)
        }
        (ElementField::InstallType, ListItem::SendRequest(request)) => {
            optional(request.install_type, |kind| kind.label().to_string())
        }
        (ElementField::InstallLink, ListItem::SendRequest(request)) => {
            optional(request.install_link.as_deref(), non_empty)
        }
        (ElementField::InstallStatus, ListItem::SendRequest(request)) => {
            optional(request.install_status, |status| {
                match status {
                    InstallStatus::Failed => "Failed",
                    InstallStatus::Pending => "Awaiting feedback",
                    InstallStatus::Succeeded => "Installed",
                }
                .to_string()
            })
        }
        (ElementField::InstallFeedback, ListItem::SendRequest(request)) => {
            optional(request.install_feedback.as_deref(), non_empty)
        }
        (ElementField::LinkedCommits, ListItem::SendRequest(request)) => joined(
            request
                .linked_commits
                .iter()
                .map(|commit| format!("#{} {}", commit.id, commit.title)),
        ),
        (ElementField::RecipientClients, ListItem::SendRequest(request)) => joined(
            request
                .recipient_clients
                .iter()
                .map(|client| client.name.clone()),
        ),
        (ElementField::ClientRepresentatives, ListItem::SendRequest(request)) => {
            joined(request.client_representatives.iter().cloned())
        }
        (ElementField::Branch, ListItem::SendRequest(request)) => {
            optional(request.branch.as_deref(), non_empty)
        }
        (
            ElementField::DeliveryTimestamp
            | ElementField::InstallType
            | ElementField::InstallLink
            | ElementField::InstallStatus
            | ElementField::InstallFeedback
            | ElementField::LinkedCommits
            | ElementField::RecipientClients
            | ElementField::ClientRepresentatives
            | ElementField::Branch,
            ListItem::Commit(_),
        ) => PLACEHOLDER.to_string(),
    }
}

/// Whether `user` may remove `item`: only pending items they authored.
#[must_use]
pub fn can_remove(item: &ListItem, user: &UserInfo) -> bool {
    item.approval_status() == ApprovalStatus::Pending && item.author().id == user.id
}
