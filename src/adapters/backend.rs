//! The backend as the store sees it
//!
//! [`Backend`] is the seam between application state and transport:
//! [`HttpBackend`] talks to the real REST API, tests plug in an in-memory
//! implementation.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::endpoints;
use super::http_client::{multipart_form, HttpClient};
use crate::error::Result;
use crate::models::{
    AuthResponse, Collaborator, CollaboratorInvitation, Comment, FileCategory, FileData,
    InviteTarget, LoginRequest, NewProject, NewUser, ProfileUpdate, Project, ProjectStatus,
    ProjectUpdate, RegisterRequest, UploadFile, User, Workspace,
};
use crate::storage::LocalStorage;

#[async_trait]
pub trait Backend: Send + Sync {
    /// Current bearer token, if signed in
    fn token(&self) -> Option<String>;
    fn set_token(&self, token: Option<String>);

    // Auth
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse>;
    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse>;

    // Users
    async fn list_users(&self) -> Result<Vec<User>>;
    async fn create_user(&self, user: &NewUser) -> Result<User>;
    async fn current_user(&self) -> Result<User>;
    async fn update_profile(&self, update: &ProfileUpdate) -> Result<User>;

    // Workspaces
    async fn current_workspace(&self) -> Result<Workspace>;
    async fn update_workspace(&self, name: &str) -> Result<Workspace>;
    async fn workspace_stats(&self) -> Result<Value>;
    async fn export_workspace(&self) -> Result<Vec<u8>>;
    async fn import_workspace(&self, file: &UploadFile) -> Result<Value>;

    // Projects
    async fn list_projects(&self) -> Result<Vec<Project>>;
    async fn get_project(&self, project_id: &str) -> Result<Project>;
    async fn create_project(&self, project: &NewProject, files: &[UploadFile]) -> Result<Project>;
    async fn update_project_status(&self, project_id: &str, status: ProjectStatus) -> Result<Project>;
    async fn upload_delivery(&self, project_id: &str, files: &[UploadFile]) -> Result<Project>;
    async fn add_comment(&self, project_id: &str, text: &str) -> Result<Comment>;
    async fn add_project_update(
        &self,
        project_id: &str,
        text: &str,
        files: &[UploadFile],
    ) -> Result<ProjectUpdate>;
    async fn mark_payment_cleared(&self, project_id: &str, files: &[UploadFile]) -> Result<Project>;
    async fn approve_payment(&self, project_id: &str) -> Result<Project>;
    async fn dashboard_stats(&self) -> Result<Value>;
    /// Unread updates for one project, or across the workspace with `None`
    async fn unread_updates(&self, project_id: Option<&str>) -> Result<Vec<ProjectUpdate>>;

    // Collaborators
    async fn list_collaborators(&self, project_id: &str) -> Result<Vec<Collaborator>>;
    async fn invite_collaborator(
        &self,
        project_id: &str,
        target: &InviteTarget,
    ) -> Result<CollaboratorInvitation>;
    async fn remove_collaborator(&self, project_id: &str, collaborator_id: &str) -> Result<()>;
    async fn my_invitations(&self) -> Result<Vec<CollaboratorInvitation>>;
    async fn respond_to_invitation(
        &self,
        invitation_id: &str,
        accept: bool,
    ) -> Result<CollaboratorInvitation>;

    // Finance
    async fn finance_history(&self) -> Result<Vec<Project>>;
    async fn finance_stats(&self) -> Result<Value>;
}

/// [`Backend`] over HTTP
pub struct HttpBackend {
    http: HttpClient,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration, storage: Option<Arc<LocalStorage>>) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(base_url, timeout, storage)?,
        })
    }

    pub fn with_client(http: HttpClient) -> Self {
        Self { http }
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Direct link to a stored file; the token rides in the query string
    /// so the link works outside of this client.
    pub fn file_url(&self, project_id: &str, category: FileCategory, filename: &str) -> String {
        let token = self.http.token().unwrap_or_default();
        format!(
            "{}?token={}",
            self.http.url(&endpoints::file(project_id, category.as_str(), filename)),
            urlencoding::encode(&token)
        )
    }

    /// Absolute URL for a file's relative `url`
    pub fn resolve_file_url(&self, file: &FileData) -> String {
        if file.url.starts_with("http://") || file.url.starts_with("https://") {
            file.url.clone()
        } else {
            self.http.url(&file.url)
        }
    }
}

#[async_trait]
impl Backend for HttpBackend {
    fn token(&self) -> Option<String> {
        self.http.token()
    }

    fn set_token(&self, token: Option<String>) {
        self.http.set_token(token);
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: AuthResponse = self.http.post(endpoints::LOGIN, &request).await?;
        self.http.set_token(Some(response.access_token.clone()));
        info!("Signed in as {}", response.user.email);
        Ok(response)
    }

    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse> {
        let response: AuthResponse = self.http.post(endpoints::REGISTER, request).await?;
        self.http.set_token(Some(response.access_token.clone()));
        info!("Registered workspace {}", request.workspace_name);
        Ok(response)
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        self.http.get(endpoints::USERS).await
    }

    async fn create_user(&self, user: &NewUser) -> Result<User> {
        self.http.post(endpoints::USERS_CREATE, user).await
    }

    async fn current_user(&self) -> Result<User> {
        self.http.get(endpoints::USERS_ME).await
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<User> {
        self.http.put(endpoints::USERS_ME_UPDATE, update).await
    }

    async fn current_workspace(&self) -> Result<Workspace> {
        self.http.get(endpoints::WORKSPACE_ME).await
    }

    async fn update_workspace(&self, name: &str) -> Result<Workspace> {
        self.http
            .put(endpoints::WORKSPACE_UPDATE, &json!({ "name": name }))
            .await
    }

    async fn workspace_stats(&self) -> Result<Value> {
        self.http.get(endpoints::WORKSPACE_STATS).await
    }

    async fn export_workspace(&self) -> Result<Vec<u8>> {
        self.http.get_bytes(endpoints::WORKSPACE_EXPORT).await
    }

    async fn import_workspace(&self, file: &UploadFile) -> Result<Value> {
        let part = reqwest::multipart::Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.mime)
            .map_err(|e| crate::error::Error::Validation(format!("Invalid content type: {}", e)))?;
        let form = reqwest::multipart::Form::new().part("file", part);
        self.http.upload(endpoints::WORKSPACE_IMPORT, form).await
    }

    async fn list_projects(&self) -> Result<Vec<Project>> {
        self.http.get(endpoints::PROJECTS).await
    }

    async fn get_project(&self, project_id: &str) -> Result<Project> {
        self.http.get(&endpoints::project(project_id)).await
    }

    async fn create_project(&self, project: &NewProject, files: &[UploadFile]) -> Result<Project> {
        let fields = [
            ("title", project.title.clone()),
            ("description", project.description.clone()),
            ("amount", project.amount.to_string()),
            ("deadline", project.deadline.to_rfc3339()),
        ];
        let form = multipart_form(&fields, files)?;
        self.http.upload(endpoints::PROJECTS_CREATE, form).await
    }

    async fn update_project_status(&self, project_id: &str, status: ProjectStatus) -> Result<Project> {
        self.http
            .put(&endpoints::project_status(project_id), &json!({ "status": status }))
            .await
    }

    async fn upload_delivery(&self, project_id: &str, files: &[UploadFile]) -> Result<Project> {
        let form = multipart_form(&[], files)?;
        self.http
            .upload(&endpoints::project_delivery(project_id), form)
            .await
    }

    async fn add_comment(&self, project_id: &str, text: &str) -> Result<Comment> {
        self.http
            .post(&endpoints::project_comments(project_id), &json!({ "text": text }))
            .await
    }

    async fn add_project_update(
        &self,
        project_id: &str,
        text: &str,
        files: &[UploadFile],
    ) -> Result<ProjectUpdate> {
        let form = multipart_form(&[("text", text.to_string())], files)?;
        self.http
            .upload(&endpoints::project_updates(project_id), form)
            .await
    }

    async fn mark_payment_cleared(&self, project_id: &str, files: &[UploadFile]) -> Result<Project> {
        let path = endpoints::payment_clear(project_id);
        if files.is_empty() {
            self.http.put(&path, &json!({})).await
        } else {
            // Proof files go as multipart; the route takes POST as well as PUT
            let form = multipart_form(&[], files)?;
            self.http.upload(&path, form).await
        }
    }

    async fn approve_payment(&self, project_id: &str) -> Result<Project> {
        self.http
            .put(&endpoints::payment_approve(project_id), &json!({}))
            .await
    }

    async fn dashboard_stats(&self) -> Result<Value> {
        self.http.get(endpoints::DASHBOARD_STATS).await
    }

    async fn unread_updates(&self, project_id: Option<&str>) -> Result<Vec<ProjectUpdate>> {
        match project_id {
            Some(id) => self.http.get(&endpoints::project_unread_updates(id)).await,
            None => self.http.get(endpoints::UNREAD_UPDATES).await,
        }
    }

    async fn list_collaborators(&self, project_id: &str) -> Result<Vec<Collaborator>> {
        self.http.get(&endpoints::collaborators(project_id)).await
    }

    async fn invite_collaborator(
        &self,
        project_id: &str,
        target: &InviteTarget,
    ) -> Result<CollaboratorInvitation> {
        self.http
            .post(&endpoints::collaborator_invite(project_id), &target.to_payload())
            .await
    }

    async fn remove_collaborator(&self, project_id: &str, collaborator_id: &str) -> Result<()> {
        self.http
            .delete(&endpoints::collaborator(project_id, collaborator_id))
            .await
    }

    async fn my_invitations(&self) -> Result<Vec<CollaboratorInvitation>> {
        self.http.get(endpoints::INVITATIONS).await
    }

    async fn respond_to_invitation(
        &self,
        invitation_id: &str,
        accept: bool,
    ) -> Result<CollaboratorInvitation> {
        self.http
            .post(
                &endpoints::invitation_respond(invitation_id),
                &json!({ "accept": accept }),
            )
            .await
    }

    async fn finance_history(&self) -> Result<Vec<Project>> {
        self.http.get(endpoints::FINANCE_HISTORY).await
    }

    async fn finance_stats(&self) -> Result<Value> {
        self.http.get(endpoints::FINANCE_STATS).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn backend() -> HttpBackend {
        HttpBackend::new("http://localhost:8000", Duration::from_secs(5), None).unwrap()
    }

    #[test]
    fn test_file_url_carries_encoded_token() {
        let backend = backend();
        backend.set_token(Some("a+b/c".to_string()));
        assert_eq!(
            backend.file_url("p-1", FileCategory::Payment, "receipt.png"),
            "http://localhost:8000/api/files/p-1/payment/receipt.png?token=a%2Bb%2Fc"
        );
    }

    #[test]
    fn test_resolve_file_url() {
        let backend = backend();
        let mut file = FileData {
            id: "f-1".to_string(),
            name: "brief.pdf".to_string(),
            url: "/api/files/p-1/client/brief.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            size: "2MB".to_string(),
            uploaded_at: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
        };
        assert_eq!(
            backend.resolve_file_url(&file),
            "http://localhost:8000/api/files/p-1/client/brief.pdf"
        );

        file.url = "https://cdn.example.com/brief.pdf".to_string();
        assert_eq!(backend.resolve_file_url(&file), "https://cdn.example.com/brief.pdf");
    }
}
