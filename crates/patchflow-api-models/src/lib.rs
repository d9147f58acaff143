#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls
)]
#![allow(clippy::module_name_repetitions)]
//! Shared HTTP DTOs for the Patchflow API.
//!
//! These types are used by the browser client and the CLI to encode requests
//! and decode responses, so the wire contract lives in exactly one place.
//! Timestamps are UNIX seconds as sent by the server.

use serde::{Deserialize, Serialize};

/// Identifier of a commit or send request.
pub type ItemId = u64;

/// Identifier of a user account.
pub type UserId = u64;

/// Minimal user reference embedded in list items.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Author {
    /// User identifier.
    pub id: UserId,
    /// Display name.
    #[serde(alias = "username")]
    pub name: String,
}

/// Review outcome of a commit or send request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "i8", into = "i8")]
pub enum ApprovalStatus {
    /// Rejected by a reviewer.
    Rejected,
    /// Awaiting review.
    Pending,
    /// Approved by a reviewer.
    Approved,
}

impl ApprovalStatus {
    /// Numeric wire value (`-1`, `0`, `1`).
    #[must_use]
    pub const fn as_i8(self) -> i8 {
        match self {
            Self::Rejected => -1,
            Self::Pending => 0,
            Self::Approved => 1,
        }
    }

    /// Human-readable label used in detail dialogs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Rejected => "Rejected",
            Self::Pending => "Pending",
            Self::Approved => "Approved",
        }
    }
}

impl TryFrom<i8> for ApprovalStatus {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Self::Rejected),
            0 => Ok(Self::Pending),
            1 => Ok(Self::Approved),
            other => Err(format!("unknown approval status {other}")),
        }
    }
}

impl From<ApprovalStatus> for i8 {
    fn from(value: ApprovalStatus) -> Self {
        value.as_i8()
    }
}

/// Outcome reported by a client after installing a package.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "i8", into = "i8")]
pub enum InstallStatus {
    /// Installation failed on the client side.
    Failed,
    /// No feedback received yet.
    Pending,
    /// Installation completed successfully.
    Succeeded,
}

impl InstallStatus {
    /// Numeric wire value (`-1`, `0`, `1`).
    #[must_use]
    pub const fn as_i8(self) -> i8 {
        match self {
            Self::Failed => -1,
            Self::Pending => 0,
            Self::Succeeded => 1,
        }
    }
}

impl TryFrom<i8> for InstallStatus {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Self::Failed),
            0 => Ok(Self::Pending),
            1 => Ok(Self::Succeeded),
            other => Err(format!("unknown install status {other}")),
        }
    }
}

impl From<InstallStatus> for i8 {
    fn from(value: InstallStatus) -> Self {
        value.as_i8()
    }
}

/// How a package has to be installed on the client machine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum InstallType {
    /// Can be applied while the client software is running.
    DuringExecution,
    /// Requires the client software to be shut down first.
    NeedsShutdown,
}

impl InstallType {
    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::DuringExecution => "During execution",
            Self::NeedsShutdown => "Needs shutdown",
        }
    }
}

/// Commit reference embedded in a send request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommitRef {
    /// Commit identifier.
    pub id: ItemId,
    /// Commit title.
    pub title: String,
}

/// Client reference embedded in a send request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientRef {
    /// Client identifier.
    pub id: UserId,
    /// Client display name.
    pub name: String,
}

/// A code commit submitted by a programmer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Commit {
    /// Commit identifier.
    pub id: ItemId,
    /// Short title.
    #[serde(default)]
    pub title: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Creation time.
    pub timestamp: u64,
    /// Last modification time, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_timestamp: Option<u64>,
    /// Submitting programmer.
    pub author: Author,
    /// Reviewer, once reviewed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approver: Option<Author>,
    /// Review outcome.
    pub approval_status: ApprovalStatus,
    /// Affected software components.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<String>,
}

/// A request to deliver a package to one or more clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendRequest {
    /// Send request identifier.
    pub id: ItemId,
    /// Short title.
    #[serde(default)]
    pub title: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Creation time.
    pub timestamp: u64,
    /// Last modification time, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_timestamp: Option<u64>,
    /// Delivery time, once delivered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_timestamp: Option<u64>,
    /// Submitting programmer.
    pub author: Author,
    /// Reviewer, once reviewed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approver: Option<Author>,
    /// Review outcome.
    pub approval_status: ApprovalStatus,
    /// Installation mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_type: Option<InstallType>,
    /// Download link of the package.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_link: Option<String>,
    /// Installation outcome reported by the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_status: Option<InstallStatus>,
    /// Free-text installation feedback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_feedback: Option<String>,
    /// Commits shipped with this package.
    #[serde(default)]
    pub linked_commits: Vec<CommitRef>,
    /// Clients that receive this package.
    #[serde(default)]
    pub recipient_clients: Vec<ClientRef>,
    /// Contact people on the client side.
    #[serde(default)]
    pub client_representatives: Vec<String>,
    /// Affected software components.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<String>,
    /// Source branch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

/// A row of any list the client displays.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ListItem {
    /// Commit row.
    Commit(Commit),
    /// Send request row.
    SendRequest(SendRequest),
}

impl ListItem {
    /// Item identifier.
    #[must_use]
    pub const fn id(&self) -> ItemId {
        match self {
            Self::Commit(commit) => commit.id,
            Self::SendRequest(request) => request.id,
        }
    }

    /// Creation time in UNIX seconds.
    #[must_use]
    pub const fn timestamp(&self) -> u64 {
        match self {
            Self::Commit(commit) => commit.timestamp,
            Self::SendRequest(request) => request.timestamp,
        }
    }

    /// Review outcome.
    #[must_use]
    pub const fn approval_status(&self) -> ApprovalStatus {
        match self {
            Self::Commit(commit) => commit.approval_status,
            Self::SendRequest(request) => request.approval_status,
        }
    }

    /// Submitting user.
    #[must_use]
    pub const fn author(&self) -> &Author {
        match self {
            Self::Commit(commit) => &commit.author,
            Self::SendRequest(request) => &request.author,
        }
    }

    /// Short title.
    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::Commit(commit) => &commit.title,
            Self::SendRequest(request) => &request.title,
        }
    }

    /// Free-text description.
    #[must_use]
    pub fn description(&self) -> &str {
        match self {
            Self::Commit(commit) => &commit.description,
            Self::SendRequest(request) => &request.description,
        }
    }

    /// Element type of this row.
    #[must_use]
    pub const fn kind(&self) -> ElementKind {
        match self {
            Self::Commit(_) => ElementKind::Commits,
            Self::SendRequest(_) => ElementKind::SendRequests,
        }
    }
}

impl From<Commit> for ListItem {
    fn from(value: Commit) -> Self {
        Self::Commit(value)
    }
}

impl From<SendRequest> for ListItem {
    fn from(value: SendRequest) -> Self {
        Self::SendRequest(value)
    }
}

/// List element types served by the API.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum ElementKind {
    /// Code commits.
    Commits,
    /// Package send requests.
    SendRequests,
}

impl ElementKind {
    /// Path segment used by the list endpoints.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Commits => "commits",
            Self::SendRequests => "sendRequests",
        }
    }
}

/// Roles a user may hold.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum UserRole {
    /// Submits commits and send requests.
    Programmer,
    /// Reviews commits.
    TechnicalAreaManager,
    /// Reviews send requests.
    RevisionOfficeManager,
    /// Receives packages and reports installation feedback.
    Client,
}

impl UserRole {
    /// Every role, in navigation order.
    #[must_use]
    pub const fn all() -> [Self; 4] {
        [
            Self::Programmer,
            Self::TechnicalAreaManager,
            Self::RevisionOfficeManager,
            Self::Client,
        ]
    }

    /// Role string used to tag list actions and build routes.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Programmer => "programmer",
            Self::TechnicalAreaManager => "technicalAreaManager",
            Self::RevisionOfficeManager => "revisionOfficeManager",
            Self::Client => "client",
        }
    }

    /// Parse a role string.
    #[must_use]
    pub fn from_str_opt(value: &str) -> Option<Self> {
        Self::all().into_iter().find(|role| role.as_str() == value)
    }
}

/// One page of list data as returned by the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageResponse<T> {
    /// Total number of items matching the query, across all pages.
    pub count: u64,
    /// Items of the requested page, newest first.
    #[serde(alias = "commit_list", alias = "send_request_list")]
    pub items: Vec<T>,
}

impl<T> PageResponse<T> {
    /// Convert the item type while keeping the count.
    #[must_use]
    pub fn map_items<U>(self, f: impl FnMut(T) -> U) -> PageResponse<U> {
        PageResponse {
            count: self.count,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}

/// Freshness metadata for a list.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FreshnessResponse {
    /// Timestamp of the most recent change to the list.
    pub latest_update_timestamp: u64,
}

/// Envelope wrapping every request body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestEnvelope<T> {
    /// Request payload.
    pub request_data: T,
}

impl<T> RequestEnvelope<T> {
    /// Wrap a payload.
    pub const fn new(request_data: T) -> Self {
        Self { request_data }
    }
}

/// Envelope used by the legacy authentication endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LegacyEnvelope<T> {
    /// Server module name.
    pub module: String,
    /// Action within the module.
    pub action: String,
    /// Request payload.
    pub request_data: T,
}

/// Empty request payload.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Empty {}

/// Credentials sent to the login endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginData {
    /// Account name.
    pub username: String,
    /// Uppercase hex SHA-256 digest of the password.
    pub hash_pass: String,
}

/// Successful login payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginResponse {
    /// Token sent back in the `X-Auth-Header` header.
    pub access_token: String,
}

/// Profile of the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserInfo {
    /// User identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Roles held by the user.
    #[serde(default)]
    pub roles: Vec<UserRole>,
}

impl UserInfo {
    /// Whether the user holds `role`.
    #[must_use]
    pub fn has_role(&self, role: UserRole) -> bool {
        self.roles.contains(&role)
    }
}

/// Approve/reject request payload.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReviewData {
    /// Reviewed item.
    pub id: ItemId,
    /// Review outcome chosen by the reviewer.
    pub approval_status: ApprovalStatus,
}

/// Installation feedback payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedbackData {
    /// Send request the feedback refers to.
    pub id: ItemId,
    /// Installation outcome.
    pub install_status: InstallStatus,
    /// Free-text feedback.
    pub install_feedback: String,
}

/// Payload creating a new send request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewSendRequestData {
    /// Short title.
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// Installation mode.
    pub install_type: InstallType,
    /// Destination client ids.
    pub dest_clients: Vec<UserId>,
    /// Source branch.
    pub branch: String,
    /// Commit ids shipped with the package.
    pub commits: Vec<ItemId>,
    /// Affected software components.
    pub components: String,
}

/// Payload identifying a single element.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ElementRef {
    /// Element identifier.
    pub id: ItemId,
}
