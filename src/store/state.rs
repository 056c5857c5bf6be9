//! Application state and its reducers
//!
//! `AppState` is a plain value. Every change goes through one of the methods
//! below, which only touch local data; network calls and timers live in
//! [`Store`](super::Store).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{
    CollaboratorInvitation, Comment, Project, ProjectUpdate, Theme, User, Workspace,
};

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub user: Option<User>,
    pub workspace: Option<Workspace>,
    pub users: Vec<User>,
    pub projects: Vec<Project>,
    pub invitations: Vec<CollaboratorInvitation>,
    /// Last time the unread-updates poll found something
    pub last_check_time: DateTime<Utc>,
    pub theme: Theme,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            user: None,
            workspace: None,
            users: Vec::new(),
            projects: Vec::new(),
            invitations: Vec::new(),
            last_check_time: Utc::now(),
            theme: Theme::default(),
        }
    }
}

impl AppState {
    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn project_mut(&mut self, id: &str) -> Option<&mut Project> {
        self.projects.iter_mut().find(|p| p.id == id)
    }

    pub fn sign_in(&mut self, user: User, now: DateTime<Utc>) {
        self.user = Some(user);
        self.last_check_time = now;
    }

    /// Drop everything tied to the session
    pub fn sign_out(&mut self) {
        let theme = self.theme;
        *self = AppState {
            theme,
            ..AppState::default()
        };
    }

    pub fn replace_projects(&mut self, projects: Vec<Project>) {
        self.projects = projects;
    }

    /// Insert or replace by id; new projects go to the end
    pub fn upsert_project(&mut self, project: Project) {
        match self.project_mut(&project.id) {
            Some(existing) => *existing = project,
            None => self.projects.push(project),
        }
    }

    /// Returns false when the project is not cached
    pub fn push_comment(&mut self, project_id: &str, comment: Comment) -> bool {
        match self.project_mut(project_id) {
            Some(project) => {
                if !project.comments.iter().any(|c| c.id == comment.id) {
                    project.comments.push(comment);
                    project.comments.sort_by_key(|c| c.created_at);
                }
                true
            }
            None => false,
        }
    }

    pub fn push_update(&mut self, project_id: &str, update: ProjectUpdate) -> bool {
        match self.project_mut(project_id) {
            Some(project) => {
                if !project.updates.iter().any(|u| u.id == update.id) {
                    project.updates.push(update);
                }
                true
            }
            None => false,
        }
    }

    pub fn remove_collaborator(&mut self, project_id: &str, collaborator_id: &str) {
        if let Some(project) = self.project_mut(project_id) {
            project.collaborators.retain(|c| c.id != collaborator_id);
        }
    }

    pub fn replace_invitations(&mut self, invitations: Vec<CollaboratorInvitation>) {
        self.invitations = invitations;
    }

    pub fn upsert_invitation(&mut self, invitation: CollaboratorInvitation) {
        match self.invitations.iter_mut().find(|i| i.id == invitation.id) {
            Some(existing) => *existing = invitation,
            None => self.invitations.push(invitation),
        }
    }

    pub fn replace_users(&mut self, users: Vec<User>) {
        self.users = users;
    }

    /// Insert or replace a user, keeping the signed-in user in sync
    pub fn upsert_user(&mut self, user: User) {
        if self.user.as_ref().map(|u| u.id == user.id).unwrap_or(false) {
            self.user = Some(user.clone());
        }
        match self.users.iter_mut().find(|u| u.id == user.id) {
            Some(existing) => *existing = user,
            None => self.users.push(user),
        }
    }

    pub fn mark_checked(&mut self, now: DateTime<Utc>) {
        self.last_check_time = now;
    }

    pub fn persisted(&self) -> PersistedState {
        PersistedState {
            user: self.user.clone(),
            projects: self.projects.clone(),
            last_check_time: self.last_check_time,
            theme: self.theme,
        }
    }

    pub fn restore(&mut self, saved: PersistedState) {
        self.user = saved.user;
        self.projects = saved.projects;
        self.last_check_time = saved.last_check_time;
        self.theme = saved.theme;
    }
}

/// The slice of state written to local storage between runs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    pub user: Option<User>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default = "Utc::now")]
    pub last_check_time: DateTime<Utc>,
    #[serde(default)]
    pub theme: Theme,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PaymentStatus, ProjectStatus, UserRole};
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap()
    }

    fn project(id: &str) -> Project {
        Project {
            id: id.to_string(),
            workspace_id: "ws-1".to_string(),
            client_id: "c-1".to_string(),
            title: format!("Project {}", id),
            description: String::new(),
            amount: 100.0,
            created_at: at(1),
            deadline: at(10),
            status: ProjectStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            paid_at: None,
            client_files: vec![],
            delivery_files: vec![],
            payment_files: vec![],
            comments: vec![],
            updates: vec![],
            collaborators: vec![],
        }
    }

    fn user(id: &str, name: &str) -> User {
        User {
            id: id.to_string(),
            name: name.to_string(),
            email: format!("{}@example.com", id),
            role: UserRole::Admin,
            workspace_id: "ws-1".to_string(),
        }
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut state = AppState::default();
        state.upsert_project(project("p-1"));
        state.upsert_project(project("p-2"));

        let mut changed = project("p-1");
        changed.status = ProjectStatus::InProgress;
        state.upsert_project(changed);

        assert_eq!(state.projects.len(), 2);
        assert_eq!(state.projects[0].status, ProjectStatus::InProgress);
        assert_eq!(state.projects[1].id, "p-2");
    }

    #[test]
    fn test_comments_stay_ordered_and_unique() {
        let mut state = AppState::default();
        state.upsert_project(project("p-1"));

        let comment = |id: &str, day| Comment {
            id: id.to_string(),
            user_id: "c-1".to_string(),
            user_name: "Alice".to_string(),
            text: id.to_string(),
            created_at: at(day),
        };
        assert!(state.push_comment("p-1", comment("late", 5)));
        assert!(state.push_comment("p-1", comment("early", 2)));
        assert!(state.push_comment("p-1", comment("late", 5)));
        assert!(!state.push_comment("missing", comment("x", 1)));

        let ids: Vec<&str> = state.projects[0].comments.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["early", "late"]);
    }

    #[test]
    fn test_upsert_user_updates_session_user() {
        let mut state = AppState::default();
        state.sign_in(user("admin-1", "Admin"), at(1));
        state.replace_users(vec![user("admin-1", "Admin"), user("c-1", "Alice")]);

        state.upsert_user(user("admin-1", "Renamed"));
        assert_eq!(state.user.as_ref().unwrap().name, "Renamed");
        assert_eq!(state.users[0].name, "Renamed");
        assert_eq!(state.users.len(), 2);
    }

    #[test]
    fn test_sign_out_keeps_theme_only() {
        let mut state = AppState::default();
        state.theme = Theme::Dark;
        state.sign_in(user("admin-1", "Admin"), at(1));
        state.upsert_project(project("p-1"));

        state.sign_out();
        assert!(state.user.is_none());
        assert!(state.projects.is_empty());
        assert_eq!(state.theme, Theme::Dark);
    }

    #[test]
    fn test_persisted_round_trip_through_json() {
        let mut state = AppState::default();
        state.sign_in(user("admin-1", "Admin"), at(3));
        state.upsert_project(project("p-1"));
        state.invitations = vec![];

        let json = serde_json::to_string(&state.persisted()).unwrap();
        let saved: PersistedState = serde_json::from_str(&json).unwrap();

        let mut restored = AppState::default();
        restored.restore(saved);
        assert_eq!(restored.user, state.user);
        assert_eq!(restored.projects, state.projects);
        assert_eq!(restored.last_check_time, at(3));
    }
}
