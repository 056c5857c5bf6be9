//! Client-side store
//!
//! [`Store`] owns the cached [`AppState`] and exposes one async action per
//! user intent. Mutating actions follow the same sync policy:
//!
//! 1. check role and lifecycle rules locally, before any network call
//! 2. call the backend and merge the returned object into state
//! 3. toast the outcome and persist the session snapshot
//! 4. reload the full project list after a short delay, in the background,
//!    to pick up server-side side effects; failures there are only logged
//!
//! Failures in steps 1-2 are toasted and returned to the caller.

pub mod selectors;
pub mod state;

use chrono::Utc;
use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::adapters::Backend;
use crate::error::{Error, Result};
use crate::models::{
    AppSettings, Collaborator, CollaboratorInvitation, Comment, InviteTarget, NewProject, NewUser,
    ProfileUpdate, Project, ProjectStatus, ProjectUpdate, RegisterRequest, Theme, UploadFile,
    User, UserRole, Workspace,
};
use crate::services::lifecycle::{self, LifecycleError};
use crate::services::poller::{spawn_poll, Watchers};
use crate::services::Toaster;
use crate::storage::{LocalStorage, STATE_KEY};

pub use selectors::{DashboardSummary, FinanceSummary};
pub use state::{AppState, PersistedState};

/// Timing knobs for reconciliation and polling
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub reload_delay: Duration,
    pub unread_poll_interval: Duration,
    pub invitation_poll_interval: Duration,
    pub notify_on_unread: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self::from(&AppSettings::default())
    }
}

impl From<&AppSettings> for SyncOptions {
    fn from(settings: &AppSettings) -> Self {
        Self {
            reload_delay: settings.reload_delay(),
            unread_poll_interval: settings.unread_poll_interval(),
            invitation_poll_interval: settings.invitation_poll_interval(),
            notify_on_unread: settings.notify_on_unread,
        }
    }
}

struct Inner {
    backend: Arc<dyn Backend>,
    state: RwLock<AppState>,
    toaster: Toaster,
    storage: Option<Arc<LocalStorage>>,
    options: SyncOptions,
    in_flight: Mutex<HashSet<String>>,
}

/// Cheap-to-clone handle to the shared store
#[derive(Clone)]
pub struct Store {
    inner: Arc<Inner>,
}

/// Marks an action as running until dropped
struct InFlight<'a> {
    set: &'a Mutex<HashSet<String>>,
    key: String,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Ok(mut set) = self.set.lock() {
            set.remove(&self.key);
        }
    }
}

impl Store {
    pub fn new(
        backend: Arc<dyn Backend>,
        options: SyncOptions,
        storage: Option<Arc<LocalStorage>>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                state: RwLock::new(AppState::default()),
                toaster: Toaster::new(),
                storage,
                options,
                in_flight: Mutex::new(HashSet::new()),
            }),
        }
    }

    pub fn toaster(&self) -> &Toaster {
        &self.inner.toaster
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.inner.backend
    }

    pub fn options(&self) -> &SyncOptions {
        &self.inner.options
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> AppState {
        self.inner.state.read().await.clone()
    }

    /// Run a closure against the current state without cloning it
    pub async fn read<T>(&self, f: impl FnOnce(&AppState) -> T) -> T {
        f(&*self.inner.state.read().await)
    }

    pub async fn current_user(&self) -> Option<User> {
        self.inner.state.read().await.user.clone()
    }

    pub async fn dashboard_summary(&self) -> DashboardSummary {
        self.read(selectors::dashboard_summary).await
    }

    pub async fn finance_summary(&self) -> FinanceSummary {
        self.read(selectors::finance_summary).await
    }

    pub async fn pending_invitations(&self) -> Vec<CollaboratorInvitation> {
        self.read(|s| selectors::pending_invitations(s).into_iter().cloned().collect())
            .await
    }

    // ------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------

    fn fail<T>(&self, err: Error) -> Result<T> {
        self.inner.toaster.error(err.to_string());
        Err(err)
    }

    fn begin(&self, key: String) -> Result<InFlight<'_>> {
        let mut set = self
            .inner
            .in_flight
            .lock()
            .map_err(|_| Error::Busy)?;
        if !set.insert(key.clone()) {
            debug!("Rejecting duplicate {}", key);
            return Err(Error::Busy);
        }
        Ok(InFlight {
            set: &self.inner.in_flight,
            key,
        })
    }

    /// Run a user action: reject duplicates, toast failures
    async fn guarded<T, F>(&self, key: String, action: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let _guard = match self.begin(key) {
            Ok(guard) => guard,
            Err(e) => return self.fail(e),
        };
        match action.await {
            Ok(value) => Ok(value),
            Err(e) => self.fail(e),
        }
    }

    /// Run a read action, toasting failures
    async fn reported<T, F>(&self, action: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match action.await {
            Ok(value) => Ok(value),
            Err(e) => self.fail(e),
        }
    }

    async fn require_user(&self) -> Result<User> {
        self.current_user().await.ok_or(Error::Unauthenticated)
    }

    async fn require_admin(&self) -> Result<User> {
        let user = self.require_user().await?;
        if user.role == UserRole::Admin {
            Ok(user)
        } else {
            Err(Error::Forbidden)
        }
    }

    /// Cached project, fetched from the backend when missing
    async fn project(&self, project_id: &str) -> Result<Project> {
        if let Some(project) = self.inner.state.read().await.project(project_id) {
            return Ok(project.clone());
        }

        debug!("Project {} not cached, fetching", project_id);
        self.fetch_project(project_id).await
    }

    /// Load a project from the backend and merge it into the cache
    async fn fetch_project(&self, project_id: &str) -> Result<Project> {
        let project = match self.inner.backend.get_project(project_id).await {
            Ok(project) => project,
            Err(e) if e.status() == Some(404) => {
                return Err(Error::ProjectNotFound(project_id.to_string()))
            }
            Err(e) => return Err(e),
        };
        self.inner.state.write().await.upsert_project(project.clone());
        Ok(project)
    }

    /// Project that passes `check`.
    ///
    /// A lifecycle rejection on cached data is retried once against a fresh
    /// copy from the backend. Role rejections are final.
    async fn checked_project<F>(&self, project_id: &str, check: F) -> Result<Project>
    where
        F: Fn(&Project) -> std::result::Result<(), LifecycleError>,
    {
        let cached = self.project(project_id).await?;
        match check(&cached) {
            Ok(()) => return Ok(cached),
            Err(e @ LifecycleError::RoleNotPermitted { .. }) => return Err(e.into()),
            Err(e) => debug!("Cached project {} rejected ({}), refreshing", project_id, e),
        }

        let fresh = self.fetch_project(project_id).await?;
        check(&fresh)?;
        Ok(fresh)
    }

    async fn can_manage_collaborators(&self, project_id: &str) -> Result<User> {
        let user = self.require_user().await?;
        let project = self.project(project_id).await?;
        if user.role == UserRole::Admin || project.client_id == user.id {
            Ok(user)
        } else {
            Err(Error::Forbidden)
        }
    }

    /// Write the persisted slice to local storage
    pub async fn persist(&self) {
        let Some(storage) = &self.inner.storage else {
            return;
        };
        let snapshot = self.inner.state.read().await.persisted();
        if let Err(e) = storage.save_json(STATE_KEY, &snapshot) {
            warn!("Failed to persist state: {}", e);
        }
    }

    /// Reload projects after the configured delay on a background task
    fn schedule_reload(&self) {
        let store = self.clone();
        let delay = self.inner.options.reload_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = store.refresh_projects().await {
                warn!("Background project reload failed: {}", e);
            }
        });
    }

    /// Merge a project returned by a mutation and run the follow-up steps
    async fn commit_project(&self, project: Project) {
        self.inner.state.write().await.upsert_project(project);
        self.persist().await;
        self.schedule_reload();
    }

    // ------------------------------------------------------------------
    // Session
    // ------------------------------------------------------------------

    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        self.guarded("login".to_string(), async {
            let response = self.inner.backend.login(email, password).await?;
            let user = response.user;
            self.inner.state.write().await.sign_in(user.clone(), Utc::now());
            self.persist().await;
            self.inner
                .toaster
                .success(format!("Welcome back, {}!", user.name));
            Ok(user)
        })
        .await
    }

    pub async fn register_workspace(
        &self,
        workspace_name: &str,
        admin_name: &str,
        email: &str,
        password: &str,
    ) -> Result<User> {
        self.guarded("register".to_string(), async {
            let request = RegisterRequest {
                workspace_name: workspace_name.to_string(),
                admin_name: admin_name.to_string(),
                email: email.to_string(),
                password: password.to_string(),
            };
            let response = self.inner.backend.register(&request).await?;
            let user = response.user;
            self.inner.state.write().await.sign_in(user.clone(), Utc::now());
            self.persist().await;
            self.inner.toaster.success("Workspace created successfully!");
            Ok(user)
        })
        .await
    }

    pub async fn logout(&self) {
        self.inner.backend.set_token(None);
        self.inner.state.write().await.sign_out();
        if let Some(storage) = &self.inner.storage {
            if let Err(e) = storage.remove(STATE_KEY) {
                warn!("Failed to clear persisted state: {}", e);
            }
        }
        info!("Signed out");
    }

    /// Bring back the previous session from local storage.
    ///
    /// A stored token without a cached user is resolved through
    /// `users/me`; a rejected token ends the session.
    pub async fn restore_session(&self) -> Result<Option<User>> {
        if let Some(storage) = &self.inner.storage {
            match storage.load_json::<PersistedState>(STATE_KEY) {
                Ok(Some(saved)) => self.inner.state.write().await.restore(saved),
                Ok(None) => {}
                Err(e) => warn!("Ignoring unreadable persisted state: {}", e),
            }
        }

        if self.inner.backend.token().is_none() {
            if self.current_user().await.is_some() {
                info!("Cached user without a token, signing out");
                self.inner.state.write().await.sign_out();
            }
            return Ok(None);
        }

        match self.inner.backend.current_user().await {
            Ok(user) => {
                let mut state = self.inner.state.write().await;
                match state.user.as_ref().map(|u| u.id == user.id) {
                    Some(true) => state.upsert_user(user.clone()),
                    Some(false) => {
                        info!("Stored token belongs to another account, dropping cached session");
                        state.sign_out();
                        state.sign_in(user.clone(), Utc::now());
                    }
                    None => state.sign_in(user.clone(), Utc::now()),
                }
                drop(state);
                self.persist().await;
                info!("Restored session for {}", user.email);
                Ok(Some(user))
            }
            Err(e) if e.is_unauthorized() => {
                info!("Stored token rejected, signing out");
                self.logout().await;
                Ok(None)
            }
            Err(e) => {
                warn!("Could not verify stored session: {}", e);
                Err(e)
            }
        }
    }

    /// Seed the theme from settings. Not written to local storage, so a
    /// snapshot loaded by [`Store::restore_session`] still overrides it.
    pub async fn set_theme(&self, theme: Theme) {
        self.inner.state.write().await.theme = theme;
    }

    pub async fn toggle_theme(&self) -> Theme {
        let theme = {
            let mut state = self.inner.state.write().await;
            state.theme = state.theme.toggled();
            state.theme
        };
        self.persist().await;
        theme
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Replace the project list without toasting; used by background reloads
    pub async fn refresh_projects(&self) -> Result<()> {
        if self.current_user().await.is_none() {
            return Ok(());
        }
        let projects = self.inner.backend.list_projects().await?;
        debug!("Reloaded {} projects", projects.len());
        self.inner.state.write().await.replace_projects(projects);
        self.persist().await;
        Ok(())
    }

    pub async fn load_projects(&self) -> Result<()> {
        self.reported(async {
            self.require_user().await?;
            self.refresh_projects().await
        })
        .await
    }

    /// Fetch one project and merge it into the cache
    pub async fn load_project(&self, project_id: &str) -> Result<Project> {
        self.reported(async {
            self.require_user().await?;
            let project = self.inner.backend.get_project(project_id).await?;
            self.inner.state.write().await.upsert_project(project.clone());
            Ok(project)
        })
        .await
    }

    pub async fn load_users(&self) -> Result<()> {
        self.reported(async {
            self.require_admin().await?;
            let users = self.inner.backend.list_users().await?;
            self.inner.state.write().await.replace_users(users);
            Ok(())
        })
        .await
    }

    pub async fn load_workspace(&self) -> Result<Workspace> {
        self.reported(async {
            self.require_user().await?;
            let workspace = self.inner.backend.current_workspace().await?;
            self.inner.state.write().await.workspace = Some(workspace.clone());
            Ok(workspace)
        })
        .await
    }

    /// Replace the invitation list without toasting; used by polling
    pub async fn refresh_invitations(&self) -> Result<()> {
        if self.current_user().await.is_none() {
            return Ok(());
        }
        let invitations = self.inner.backend.my_invitations().await?;
        self.inner
            .state
            .write()
            .await
            .replace_invitations(invitations);
        Ok(())
    }

    pub async fn load_invitations(&self) -> Result<()> {
        self.reported(async {
            self.require_user().await?;
            self.refresh_invitations().await
        })
        .await
    }

    // ------------------------------------------------------------------
    // Users and workspace
    // ------------------------------------------------------------------

    pub async fn create_user(&self, new_user: NewUser) -> Result<User> {
        self.guarded(format!("create_user:{}", new_user.email), async {
            self.require_admin().await?;
            let user = self.inner.backend.create_user(&new_user).await?;
            self.inner.state.write().await.upsert_user(user.clone());
            self.inner
                .toaster
                .success(format!("{} created successfully!", user.role.label()));
            Ok(user)
        })
        .await
    }

    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<User> {
        self.guarded("update_profile".to_string(), async {
            self.require_user().await?;
            if update.name.as_deref().map(str::trim) == Some("") {
                return Err(Error::Validation("Name cannot be empty".to_string()));
            }
            let user = self.inner.backend.update_profile(&update).await?;
            self.inner.state.write().await.upsert_user(user.clone());
            self.persist().await;
            self.inner.toaster.success("Profile updated successfully");
            Ok(user)
        })
        .await
    }

    pub async fn update_workspace(&self, name: &str) -> Result<Workspace> {
        self.guarded("update_workspace".to_string(), async {
            self.require_admin().await?;
            let workspace = self.inner.backend.update_workspace(name).await?;
            self.inner.state.write().await.workspace = Some(workspace.clone());
            self.inner.toaster.success("Workspace updated");
            Ok(workspace)
        })
        .await
    }

    // ------------------------------------------------------------------
    // Project lifecycle
    // ------------------------------------------------------------------

    /// Client submits a new project; it starts out pending and unpaid
    pub async fn add_project(&self, project: NewProject, files: Vec<UploadFile>) -> Result<Project> {
        self.guarded("add_project".to_string(), async {
            let user = self.require_user().await?;
            if user.role != UserRole::Client {
                return Err(LifecycleError::RoleNotPermitted {
                    required: UserRole::Client,
                    action: "submit a project",
                }
                .into());
            }
            if project.title.trim().is_empty() {
                return Err(Error::Validation("Title is required".to_string()));
            }
            if !project.amount.is_finite() || project.amount < 0.0 {
                return Err(Error::Validation("Amount must be a positive number".to_string()));
            }

            let created = self.inner.backend.create_project(&project, &files).await?;
            info!("Created project {} ({})", created.title, created.id);
            self.commit_project(created.clone()).await;
            self.inner.toaster.success("Project submitted successfully!");
            Ok(created)
        })
        .await
    }

    /// Admin moves a project one step forward
    pub async fn update_project_status(
        &self,
        project_id: &str,
        status: ProjectStatus,
    ) -> Result<Project> {
        self.guarded(format!("status:{}", project_id), async {
            let user = self.require_user().await?;
            self.checked_project(project_id, |p| {
                lifecycle::check_status_change(p.status, status, user.role)
            })
            .await?;

            let mut updated = self
                .inner
                .backend
                .update_project_status(project_id, status)
                .await?;
            lifecycle::apply_status(&mut updated, status);
            info!("Project {} is now {}", project_id, status);

            self.commit_project(updated.clone()).await;
            self.inner
                .toaster
                .success(format!("Project marked as {}", status.label()));
            if status == ProjectStatus::Completed {
                self.inner.toaster.info("Files deleted from server.");
            }
            Ok(updated)
        })
        .await
    }

    /// Admin uploads delivery files, moving the project to delivered
    pub async fn upload_delivery(&self, project_id: &str, files: Vec<UploadFile>) -> Result<Project> {
        self.guarded(format!("delivery:{}", project_id), async {
            let user = self.require_user().await?;
            self.checked_project(project_id, |p| {
                lifecycle::check_delivery(p, user.role, files.len())
            })
            .await?;

            let updated = self
                .inner
                .backend
                .upload_delivery(project_id, &files)
                .await?;
            info!("Delivered {} files for project {}", files.len(), project_id);

            self.commit_project(updated.clone()).await;
            self.inner
                .toaster
                .success("Delivery files uploaded & project updated!");
            Ok(updated)
        })
        .await
    }

    pub async fn add_comment(&self, project_id: &str, text: &str) -> Result<Comment> {
        self.guarded(format!("comment:{}", project_id), async {
            self.require_user().await?;
            let text = text.trim();
            if text.is_empty() {
                return Err(Error::Validation("Comment cannot be empty".to_string()));
            }

            let comment = self.inner.backend.add_comment(project_id, text).await?;
            self.inner
                .state
                .write()
                .await
                .push_comment(project_id, comment.clone());
            self.persist().await;
            self.schedule_reload();
            self.inner.toaster.success("Comment added");
            Ok(comment)
        })
        .await
    }

    /// Post an update with optional files.
    ///
    /// A client update on a delivered project sends it back to in progress.
    pub async fn add_project_update(
        &self,
        project_id: &str,
        text: &str,
        files: Vec<UploadFile>,
    ) -> Result<ProjectUpdate> {
        self.guarded(format!("update:{}", project_id), async {
            let user = self.require_user().await?;
            let text = text.trim();
            if text.is_empty() && files.is_empty() {
                return Err(Error::Validation(
                    "Add a message or at least one file".to_string(),
                ));
            }

            let mut update = self
                .inner
                .backend
                .add_project_update(project_id, text, &files)
                .await?;
            update.sender_role.get_or_insert(user.role);

            {
                let mut state = self.inner.state.write().await;
                state.push_update(project_id, update.clone());
                if let Some(project) = state.project_mut(project_id) {
                    if lifecycle::apply_client_update(project, user.role) {
                        info!("Project {} reopened by client update", project_id);
                    }
                }
            }
            self.persist().await;
            self.schedule_reload();

            match user.role {
                UserRole::Client => self.inner.toaster.success("Update sent to Admin successfully"),
                UserRole::Admin => self.inner.toaster.success("Update sent to client"),
            }
            Ok(update)
        })
        .await
    }

    /// Client reports payment sent, optionally with proof files
    pub async fn mark_payment_cleared(
        &self,
        project_id: &str,
        files: Vec<UploadFile>,
    ) -> Result<Project> {
        self.guarded(format!("payment:{}", project_id), async {
            let user = self.require_user().await?;
            self.checked_project(project_id, |p| {
                lifecycle::check_payment_clearance(p, user.role)
            })
            .await?;

            let mut updated = self
                .inner
                .backend
                .mark_payment_cleared(project_id, &files)
                .await?;
            lifecycle::apply_payment_cleared(&mut updated);

            self.commit_project(updated.clone()).await;
            self.inner
                .toaster
                .success("Payment marked as cleared. Waiting for Admin approval.");
            Ok(updated)
        })
        .await
    }

    /// Admin confirms the payment arrived
    pub async fn approve_payment(&self, project_id: &str) -> Result<Project> {
        self.guarded(format!("payment:{}", project_id), async {
            let user = self.require_user().await?;
            self.checked_project(project_id, |p| {
                lifecycle::check_payment_approval(p, user.role)
            })
            .await?;

            let mut updated = self.inner.backend.approve_payment(project_id).await?;
            lifecycle::apply_payment_approved(&mut updated, Utc::now());

            self.commit_project(updated.clone()).await;
            self.inner
                .toaster
                .success("Payment approved! Transaction closed.");
            Ok(updated)
        })
        .await
    }

    // ------------------------------------------------------------------
    // Collaborators
    // ------------------------------------------------------------------

    /// Refresh the collaborator list of one cached project
    pub async fn load_collaborators(&self, project_id: &str) -> Result<Vec<Collaborator>> {
        self.reported(async {
            self.require_user().await?;
            let collaborators = self.inner.backend.list_collaborators(project_id).await?;
            if let Some(project) = self.inner.state.write().await.project_mut(project_id) {
                project.collaborators = collaborators.clone();
            }
            Ok(collaborators)
        })
        .await
    }

    pub async fn invite_collaborator(
        &self,
        project_id: &str,
        target: InviteTarget,
    ) -> Result<CollaboratorInvitation> {
        self.guarded(format!("invite:{}", project_id), async {
            self.can_manage_collaborators(project_id).await?;
            if let InviteTarget::Email(email) = &target {
                if email.trim().is_empty() || !email.contains('@') {
                    return Err(Error::Validation("Enter a valid email address".to_string()));
                }
            }

            let invitation = self
                .inner
                .backend
                .invite_collaborator(project_id, &target)
                .await?;
            self.schedule_reload();

            let who = match (&target, invitation.invited_user_name.is_empty()) {
                (_, false) => invitation.invited_user_name.clone(),
                (InviteTarget::Email(email), true) => email.clone(),
                (InviteTarget::UserId(id), true) => id.clone(),
            };
            self.inner
                .toaster
                .success(format!("Invitation sent to {}", who));
            Ok(invitation)
        })
        .await
    }

    pub async fn remove_collaborator(&self, project_id: &str, collaborator_id: &str) -> Result<()> {
        self.guarded(format!("remove_collaborator:{}", collaborator_id), async {
            self.can_manage_collaborators(project_id).await?;
            self.inner
                .backend
                .remove_collaborator(project_id, collaborator_id)
                .await?;
            self.inner
                .state
                .write()
                .await
                .remove_collaborator(project_id, collaborator_id);
            self.persist().await;
            self.schedule_reload();
            self.inner.toaster.success("Collaborator removed");
            Ok(())
        })
        .await
    }

    pub async fn respond_to_invitation(
        &self,
        invitation_id: &str,
        accept: bool,
    ) -> Result<CollaboratorInvitation> {
        self.guarded(format!("invitation:{}", invitation_id), async {
            self.require_user().await?;
            let invitation = self
                .inner
                .backend
                .respond_to_invitation(invitation_id, accept)
                .await?;
            self.inner
                .state
                .write()
                .await
                .upsert_invitation(invitation.clone());

            if accept {
                // The project only shows up in our list after a reload
                self.schedule_reload();
                self.inner.toaster.success(format!(
                    "You joined {}",
                    if invitation.project_title.is_empty() {
                        "the project"
                    } else {
                        invitation.project_title.as_str()
                    }
                ));
            } else {
                self.inner.toaster.info("Invitation declined");
            }
            Ok(invitation)
        })
        .await
    }

    // ------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------

    /// Poll the workspace-wide unread feed (admins only).
    ///
    /// A non-empty result moves the last-checked time forward. With
    /// `notify_on_unread` set, each project with news gets one info toast.
    pub async fn check_unread_updates(&self) -> Result<Vec<ProjectUpdate>> {
        match self.current_user().await {
            Some(user) if user.role == UserRole::Admin => {}
            _ => return Ok(Vec::new()),
        }

        let updates = self.inner.backend.unread_updates(None).await?;
        if updates.is_empty() {
            return Ok(updates);
        }
        debug!("{} unread updates", updates.len());

        let titles = {
            let mut state = self.inner.state.write().await;
            state.mark_checked(Utc::now());

            let mut seen = HashSet::new();
            let mut titles = Vec::new();
            for update in &updates {
                if !seen.insert(update.project_id.clone()) {
                    continue;
                }
                let title = update
                    .project_id
                    .as_deref()
                    .and_then(|id| state.project(id))
                    .map(|p| p.title.clone())
                    .unwrap_or_else(|| "a project".to_string());
                titles.push(title);
            }
            titles
        };
        self.persist().await;

        if self.inner.options.notify_on_unread {
            for title in titles {
                self.inner.toaster.info(format!("Update on: {}", title));
            }
        }
        Ok(updates)
    }

    /// Unread updates for a single project
    pub async fn project_unread_updates(&self, project_id: &str) -> Result<Vec<ProjectUpdate>> {
        self.reported(async {
            self.require_user().await?;
            self.inner.backend.unread_updates(Some(project_id)).await
        })
        .await
    }

    /// Start background polling for the signed-in user.
    ///
    /// Invitations load once right away, then on their interval. The unread
    /// poll only runs for admins. Dropping the returned [`Watchers`] stops
    /// both.
    pub async fn start_watchers(&self) -> Watchers {
        if let Err(e) = self.refresh_invitations().await {
            warn!("Initial invitation load failed: {}", e);
        }

        let store = self.clone();
        let invitations = spawn_poll(
            "invitations",
            self.inner.options.invitation_poll_interval,
            move || {
                let store = store.clone();
                async move {
                    if let Err(e) = store.refresh_invitations().await {
                        warn!("Invitation refresh failed: {}", e);
                    }
                }
            },
        );

        let is_admin = self
            .current_user()
            .await
            .map(|u| u.is_admin())
            .unwrap_or(false);
        let unread_updates = is_admin.then(|| {
            let store = self.clone();
            spawn_poll(
                "unread updates",
                self.inner.options.unread_poll_interval,
                move || {
                    let store = store.clone();
                    async move {
                        if let Err(e) = store.check_unread_updates().await {
                            warn!("Unread update check failed: {}", e);
                        }
                    }
                },
            )
        });

        Watchers {
            unread_updates,
            invitations,
        }
    }

    // ------------------------------------------------------------------
    // Stats, finance, import/export
    // ------------------------------------------------------------------

    pub async fn workspace_stats(&self) -> Result<serde_json::Value> {
        self.reported(async {
            self.require_user().await?;
            self.inner.backend.workspace_stats().await
        })
        .await
    }

    pub async fn dashboard_stats(&self) -> Result<serde_json::Value> {
        self.reported(async {
            self.require_user().await?;
            self.inner.backend.dashboard_stats().await
        })
        .await
    }

    pub async fn finance_history(&self) -> Result<Vec<Project>> {
        self.reported(async {
            self.require_user().await?;
            self.inner.backend.finance_history().await
        })
        .await
    }

    pub async fn finance_stats(&self) -> Result<serde_json::Value> {
        self.reported(async {
            self.require_user().await?;
            self.inner.backend.finance_stats().await
        })
        .await
    }

    pub async fn export_workspace(&self) -> Result<Vec<u8>> {
        self.reported(async {
            self.require_admin().await?;
            let bytes = self.inner.backend.export_workspace().await?;
            info!("Exported {} bytes of workspace data", bytes.len());
            Ok(bytes)
        })
        .await
    }

    pub async fn import_workspace(&self, file: UploadFile) -> Result<serde_json::Value> {
        self.guarded("import_workspace".to_string(), async {
            self.require_admin().await?;
            let result = self.inner.backend.import_workspace(&file).await?;
            self.schedule_reload();
            self.inner.toaster.success("Workspace data imported");
            Ok(result)
        })
        .await
    }
}
