use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::collaborator::Collaborator;
use super::user::UserRole;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Pending,
    InProgress,
    Delivered,
    Completed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Pending => "pending",
            ProjectStatus::InProgress => "in_progress",
            ProjectStatus::Delivered => "delivered",
            ProjectStatus::Completed => "completed",
        }
    }

    /// Human-readable form, e.g. "in progress"
    pub fn label(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl Default for ProjectStatus {
    fn default() -> Self {
        ProjectStatus::Pending
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    PendingApproval,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::PendingApproval => "pending_approval",
            PaymentStatus::Paid => "paid",
        }
    }
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Unpaid
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// File metadata as returned by the backend. `url` is relative to the API base.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(rename = "type", default)]
    pub mime_type: String,
    #[serde(default)]
    pub size: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectUpdate {
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub files: Vec<FileData>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub sender_role: Option<UserRole>,
    /// Present on the workspace-wide unread feed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub workspace_id: String,
    pub client_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub amount: f64,
    pub created_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub client_files: Vec<FileData>,
    #[serde(default)]
    pub delivery_files: Vec<FileData>,
    #[serde(default)]
    pub payment_files: Vec<FileData>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub updates: Vec<ProjectUpdate>,
    #[serde(default)]
    pub collaborators: Vec<Collaborator>,
}

impl Project {
    pub fn is_completed(&self) -> bool {
        self.status == ProjectStatus::Completed
    }

    /// True when the user owns the project or was added as a collaborator
    pub fn involves(&self, user_id: &str) -> bool {
        self.client_id == user_id || self.collaborators.iter().any(|c| c.user_id == user_id)
    }

    /// Comments and updates merged into one conversation, oldest first
    pub fn timeline(&self) -> Vec<DiscussionItem<'_>> {
        let mut items: Vec<DiscussionItem<'_>> = self
            .comments
            .iter()
            .map(DiscussionItem::Comment)
            .chain(self.updates.iter().map(DiscussionItem::Update))
            .collect();
        items.sort_by_key(|item| item.created_at());
        items
    }
}

/// Entry in a project's discussion thread
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiscussionItem<'a> {
    Comment(&'a Comment),
    Update(&'a ProjectUpdate),
}

impl DiscussionItem<'_> {
    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            DiscussionItem::Comment(c) => c.created_at,
            DiscussionItem::Update(u) => u.created_at,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            DiscussionItem::Comment(c) => &c.text,
            DiscussionItem::Update(u) => &u.text,
        }
    }
}

/// Form data for a new project; files travel separately as uploads
#[derive(Debug, Clone)]
pub struct NewProject {
    pub title: String,
    pub description: String,
    pub amount: f64,
    pub deadline: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_json() -> serde_json::Value {
        serde_json::json!({
            "id": "p-1",
            "workspaceId": "ws-1",
            "clientId": "c-1",
            "title": "Website Redesign",
            "description": "New landing page",
            "amount": 1500.0,
            "createdAt": "2024-03-01T10:00:00Z",
            "deadline": "2024-03-05T10:00:00Z",
            "status": "in_progress",
            "paymentStatus": "pending_approval"
        })
    }

    #[test]
    fn test_project_missing_collections_default_to_empty() {
        let project: Project = serde_json::from_value(sample_json()).unwrap();
        assert_eq!(project.status, ProjectStatus::InProgress);
        assert_eq!(project.payment_status, PaymentStatus::PendingApproval);
        assert!(project.client_files.is_empty());
        assert!(project.updates.is_empty());
        assert!(project.paid_at.is_none());
    }

    #[test]
    fn test_status_label() {
        assert_eq!(ProjectStatus::InProgress.label(), "in progress");
        assert_eq!(ProjectStatus::Completed.label(), "completed");
    }

    #[test]
    fn test_file_data_type_field() {
        let file: FileData = serde_json::from_value(serde_json::json!({
            "id": "f-1",
            "name": "branding.pdf",
            "url": "/api/files/p-1/client/branding.pdf",
            "type": "application/pdf",
            "size": "2MB",
            "uploadedAt": "2024-03-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(file.mime_type, "application/pdf");
    }

    #[test]
    fn test_timeline_merges_by_created_at() {
        let mut project: Project = serde_json::from_value(sample_json()).unwrap();
        let at = |h| Utc.with_ymd_and_hms(2024, 3, 2, h, 0, 0).unwrap();
        project.comments.push(Comment {
            id: "cm-2".to_string(),
            user_id: "admin-1".to_string(),
            user_name: "Admin".to_string(),
            text: "second".to_string(),
            created_at: at(12),
        });
        project.comments.push(Comment {
            id: "cm-1".to_string(),
            user_id: "c-1".to_string(),
            user_name: "Alice".to_string(),
            text: "first".to_string(),
            created_at: at(9),
        });
        project.updates.push(ProjectUpdate {
            id: "u-1".to_string(),
            text: "middle".to_string(),
            files: vec![],
            created_at: at(10),
            is_read: false,
            sender_role: Some(UserRole::Client),
            project_id: None,
        });

        let timeline = project.timeline();
        let texts: Vec<&str> = timeline.iter().map(|i| i.text()).collect();
        assert_eq!(texts, vec!["first", "middle", "second"]);
    }
}
