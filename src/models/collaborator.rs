use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Collaborator {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    #[serde(default)]
    pub user_email: String,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Rejected,
}

impl Default for InvitationStatus {
    fn default() -> Self {
        InvitationStatus::Pending
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CollaboratorInvitation {
    pub id: String,
    pub project_id: String,
    #[serde(default)]
    pub project_title: String,
    pub invited_by_id: String,
    #[serde(default)]
    pub invited_by_name: String,
    pub invited_user_id: String,
    #[serde(default)]
    pub invited_user_name: String,
    #[serde(default)]
    pub invited_user_email: String,
    #[serde(default)]
    pub status: InvitationStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub responded_at: Option<DateTime<Utc>>,
}

impl CollaboratorInvitation {
    pub fn is_pending(&self) -> bool {
        self.status == InvitationStatus::Pending
    }
}

/// Who to invite: an existing user by id, or anyone by email.
/// Email wins when a caller has both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InviteTarget {
    UserId(String),
    Email(String),
}

impl InviteTarget {
    pub fn to_payload(&self) -> serde_json::Value {
        match self {
            InviteTarget::UserId(id) => serde_json::json!({ "user_id": id }),
            InviteTarget::Email(email) => serde_json::json!({ "email": email }),
        }
    }
}
