//! Item builders and API payloads.

use patchflow_api_models::{
    ApprovalStatus, Author, ClientRef, Commit, CommitRef, InstallType, ItemId, SendRequest,
    UserId, UserInfo, UserRole,
};
use serde_json::{Value, json};

/// Author with a generated name.
#[must_use]
pub fn author(id: UserId) -> Author {
    Author {
        id,
        name: format!("user{id}"),
    }
}

/// Pending commit by user 1.
#[must_use]
pub fn commit(id: ItemId, timestamp: u64) -> Commit {
    Commit {
        id,
        title: format!("Commit {id}"),
        description: format!("Change set {id}"),
        timestamp,
        update_timestamp: None,
        author: author(1),
        approver: None,
        approval_status: ApprovalStatus::Pending,
        components: Some("core".to_string()),
    }
}

/// Pending send request by user 1 addressed to client 5.
#[must_use]
pub fn send_request(id: ItemId, timestamp: u64) -> SendRequest {
    SendRequest {
        id,
        title: format!("Package {id}"),
        description: String::new(),
        timestamp,
        update_timestamp: None,
        delivery_timestamp: None,
        author: author(1),
        approver: None,
        approval_status: ApprovalStatus::Pending,
        install_type: Some(InstallType::DuringExecution),
        install_link: None,
        install_status: None,
        install_feedback: None,
        linked_commits: vec![CommitRef {
            id: 1,
            title: "Commit 1".to_string(),
        }],
        recipient_clients: vec![ClientRef {
            id: 5,
            name: "ACME".to_string(),
        }],
        client_representatives: Vec::new(),
        components: None,
        branch: Some("main".to_string()),
    }
}

/// Profile holding `roles`.
#[must_use]
pub fn user(id: UserId, roles: &[UserRole]) -> UserInfo {
    UserInfo {
        id,
        name: format!("user{id}"),
        roles: roles.to_vec(),
    }
}

/// Commit page payload in the server's `commit_list` shape.
#[must_use]
pub fn commit_page(count: u64, commits: &[Commit]) -> Value {
    json!({ "count": count, "commit_list": commits })
}

/// Send request page payload in the server's `send_request_list` shape.
#[must_use]
pub fn send_request_page(count: u64, requests: &[SendRequest]) -> Value {
    json!({ "count": count, "send_request_list": requests })
}

/// Freshness payload.
#[must_use]
pub fn freshness(latest_update_timestamp: u64) -> Value {
    json!({ "latest_update_timestamp": latest_update_timestamp })
}

/// Login payload.
#[must_use]
pub fn login(access_token: &str) -> Value {
    json!({ "access_token": access_token })
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchflow_api_models::PageResponse;

    #[test]
    fn page_payloads_decode_as_server_pages() {
        let page: PageResponse<Commit> =
            serde_json::from_value(commit_page(3, &[commit(1, 10)])).unwrap();
        assert_eq!(page.count, 3);
        assert_eq!(page.items, vec![commit(1, 10)]);
        let page: PageResponse<SendRequest> =
            serde_json::from_value(send_request_page(1, &[send_request(2, 20)])).unwrap();
        assert_eq!(page.items[0].recipient_clients[0].name, "ACME");
    }
}
