//! New send request drafts.
//!
//! # Design
//! - The form edits a [`SendRequestDraft`]; only a validated draft becomes a wire payload.
//! - Validation reports the first missing field so the form can focus it.

use patchflow_api_models::{InstallType, ItemId, NewSendRequestData, UserId};
use thiserror::Error;

/// Reasons a draft cannot be submitted.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DraftError {
    /// Title is blank.
    #[error("title is required")]
    MissingTitle,
    /// No installation mode chosen.
    #[error("install type is required")]
    MissingInstallType,
    /// No destination client chosen.
    #[error("at least one destination client is required")]
    NoDestination,
    /// Branch is blank.
    #[error("branch is required")]
    MissingBranch,
    /// No commit linked.
    #[error("at least one commit must be linked")]
    NoCommits,
}

/// Editable state of the "new send request" form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SendRequestDraft {
    /// Short title.
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// Installation mode.
    pub install_type: Option<InstallType>,
    /// Destination client ids.
    pub dest_clients: Vec<UserId>,
    /// Source branch.
    pub branch: String,
    /// Linked commit ids.
    pub commits: Vec<ItemId>,
    /// Affected software components.
    pub components: String,
}

impl SendRequestDraft {
    /// Toggle `client` in the destination list.
    pub fn toggle_client(&mut self, client: UserId) {
        toggle(&mut self.dest_clients, client);
    }

    /// Toggle `commit` in the linked commits.
    pub fn toggle_commit(&mut self, commit: ItemId) {
        toggle(&mut self.commits, commit);
    }

    /// Validate and build the submission payload.
    ///
    /// # Errors
    ///
    /// The first [`DraftError`] found, in form order.
    pub fn validate(&self) -> Result<NewSendRequestData, DraftError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(DraftError::MissingTitle);
        }
        let install_type = self.install_type.ok_or(DraftError::MissingInstallType)?;
        if self.dest_clients.is_empty() {
            return Err(DraftError::NoDestination);
        }
        let branch = self.branch.trim();
        if branch.is_empty() {
            return Err(DraftError::MissingBranch);
        }
        if self.commits.is_empty() {
            return Err(DraftError::NoCommits);
        }
        Ok(NewSendRequestData {
            title: title.to_string(),
            description: self.description.trim().to_string(),
            install_type,
            dest_clients: self.dest_clients.clone(),
            branch: branch.to_string(),
            commits: self.commits.clone(),
            components: self.components.trim().to_string(),
        })
    }
}

fn toggle(values: &mut Vec<u64>, value: u64) {
    if let Some(position) = values.iter().position(|existing| *existing == value) {
        values.remove(position);
    } else {
        values.push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> SendRequestDraft {
        let mut draft = SendRequestDraft {
            title: "  Release 2.0 ".to_string(),
            description: "bundle".to_string(),
            install_type: Some(InstallType::DuringExecution),
            branch: "main".to_string(),
            ..SendRequestDraft::default()
        };
        draft.toggle_client(5);
        draft.toggle_commit(11);
        draft
    }

    #[test]
    fn complete_draft_becomes_payload() {
        let payload = complete().validate().unwrap();
        assert_eq!(payload.title, "Release 2.0");
        assert_eq!(payload.dest_clients, vec![5]);
        assert_eq!(payload.commits, vec![11]);
        assert_eq!(payload.install_type, InstallType::DuringExecution);
    }

    #[test]
    fn missing_fields_are_reported_in_form_order() {
        let mut draft = complete();
        draft.title = "   ".to_string();
        draft.branch.clear();
        assert_eq!(draft.validate(), Err(DraftError::MissingTitle));

        let mut draft = complete();
        draft.toggle_client(5);
        assert_eq!(draft.validate(), Err(DraftError::NoDestination));

        let mut draft = complete();
        draft.install_type = None;
        assert_eq!(draft.validate(), Err(DraftError::MissingInstallType));

        let mut draft = complete();
        draft.toggle_commit(11);
        assert_eq!(draft.validate(), Err(DraftError::NoCommits));
    }
}
