//! Derived views over [`AppState`]

use serde::Serialize;

use super::state::AppState;
use crate::models::{
    CollaboratorInvitation, DiscussionItem, PaymentStatus, Project, ProjectStatus, UserRole,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total: usize,
    pub pending: usize,
    pub active: usize,
    /// Delivered or completed
    pub done: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FinanceSummary {
    /// Paid amounts (earned for admins, spent for clients)
    pub total_paid: f64,
    /// Awaiting approval, or completed and not yet paid
    pub pending_clearance: f64,
    pub projects_billed: usize,
}

/// Projects the signed-in user can see, nearest deadline first.
///
/// Admins see the whole workspace; clients see what they own or
/// collaborate on.
pub fn visible_projects(state: &AppState) -> Vec<&Project> {
    let Some(user) = state.user.as_ref() else {
        return Vec::new();
    };

    let mut projects: Vec<&Project> = state
        .projects
        .iter()
        .filter(|p| p.workspace_id == user.workspace_id)
        .filter(|p| user.role == UserRole::Admin || p.involves(&user.id))
        .collect();
    projects.sort_by_key(|p| p.deadline);
    projects
}

pub fn dashboard_summary(state: &AppState) -> DashboardSummary {
    let projects = visible_projects(state);
    let count = |pred: fn(&ProjectStatus) -> bool| projects.iter().filter(|p| pred(&p.status)).count();

    DashboardSummary {
        total: projects.len(),
        pending: count(|s| *s == ProjectStatus::Pending),
        active: count(|s| *s == ProjectStatus::InProgress),
        done: count(|s| matches!(s, ProjectStatus::Delivered | ProjectStatus::Completed)),
    }
}

/// Completed projects plus anything with payment activity
pub fn billed_projects(state: &AppState) -> Vec<&Project> {
    visible_projects(state)
        .into_iter()
        .filter(|p| p.is_completed() || p.payment_status != PaymentStatus::Unpaid)
        .collect()
}

pub fn finance_summary(state: &AppState) -> FinanceSummary {
    let billed = billed_projects(state);

    let total_paid = billed
        .iter()
        .filter(|p| p.payment_status == PaymentStatus::Paid)
        .map(|p| p.amount)
        .sum();

    let pending_clearance = billed
        .iter()
        .filter(|p| {
            p.payment_status == PaymentStatus::PendingApproval
                || (p.is_completed() && p.payment_status == PaymentStatus::Unpaid)
        })
        .map(|p| p.amount)
        .sum();

    FinanceSummary {
        total_paid,
        pending_clearance,
        projects_billed: billed.len(),
    }
}

pub fn pending_invitations(state: &AppState) -> Vec<&CollaboratorInvitation> {
    state.invitations.iter().filter(|i| i.is_pending()).collect()
}

/// Comments and updates of a cached project, oldest first
pub fn discussion_timeline<'a>(state: &'a AppState, project_id: &str) -> Vec<DiscussionItem<'a>> {
    state
        .project(project_id)
        .map(|p| p.timeline())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use chrono::{TimeZone, Utc};

    fn project(id: &str, client: &str, status: ProjectStatus, payment: PaymentStatus, amount: f64, day: u32) -> Project {
        let at = Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap();
        Project {
            id: id.to_string(),
            workspace_id: "ws-1".to_string(),
            client_id: client.to_string(),
            title: id.to_string(),
            description: String::new(),
            amount,
            created_at: at,
            deadline: at,
            status,
            payment_status: payment,
            paid_at: None,
            client_files: vec![],
            delivery_files: vec![],
            payment_files: vec![],
            comments: vec![],
            updates: vec![],
            collaborators: vec![],
        }
    }

    fn state_for(role: UserRole, id: &str) -> AppState {
        let mut state = AppState::default();
        state.user = Some(User {
            id: id.to_string(),
            name: id.to_string(),
            email: format!("{}@example.com", id),
            role,
            workspace_id: "ws-1".to_string(),
        });
        state.projects = vec![
            project("p-1", "c-1", ProjectStatus::InProgress, PaymentStatus::Unpaid, 1500.0, 9),
            project("p-2", "c-2", ProjectStatus::Pending, PaymentStatus::Unpaid, 500.0, 2),
            project("p-3", "c-1", ProjectStatus::Completed, PaymentStatus::Paid, 2000.0, 5),
            project("p-4", "c-1", ProjectStatus::Completed, PaymentStatus::Unpaid, 300.0, 6),
            project("p-5", "c-2", ProjectStatus::Delivered, PaymentStatus::Unpaid, 700.0, 7),
        ];
        let mut foreign = project("p-6", "c-1", ProjectStatus::Pending, PaymentStatus::Unpaid, 1.0, 1);
        foreign.workspace_id = "ws-other".to_string();
        state.projects.push(foreign);
        state
    }

    #[test]
    fn test_admin_sees_workspace_sorted_by_deadline() {
        let state = state_for(UserRole::Admin, "admin-1");
        let ids: Vec<&str> = visible_projects(&state).iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p-2", "p-3", "p-4", "p-5", "p-1"]);
    }

    #[test]
    fn test_client_sees_own_and_collaborations() {
        let mut state = state_for(UserRole::Client, "c-1");
        state.projects[1].collaborators.push(crate::models::Collaborator {
            id: "col-1".to_string(),
            user_id: "c-1".to_string(),
            user_name: "Alice".to_string(),
            user_email: String::new(),
            added_at: Utc::now(),
        });
        let ids: Vec<&str> = visible_projects(&state).iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p-2", "p-3", "p-4", "p-1"]);
    }

    #[test]
    fn test_dashboard_summary() {
        let state = state_for(UserRole::Admin, "admin-1");
        assert_eq!(
            dashboard_summary(&state),
            DashboardSummary {
                total: 5,
                pending: 1,
                active: 1,
                done: 3,
            }
        );
    }

    #[test]
    fn test_finance_summary() {
        let state = state_for(UserRole::Admin, "admin-1");
        let summary = finance_summary(&state);
        assert_eq!(summary.projects_billed, 2);
        assert_eq!(summary.total_paid, 2000.0);
        assert_eq!(summary.pending_clearance, 300.0);
    }

    #[test]
    fn test_signed_out_sees_nothing() {
        let mut state = state_for(UserRole::Admin, "admin-1");
        state.user = None;
        assert!(visible_projects(&state).is_empty());
        assert_eq!(dashboard_summary(&state), DashboardSummary::default());
    }

    #[test]
    fn test_timeline_of_unknown_project_is_empty() {
        let state = state_for(UserRole::Admin, "admin-1");
        assert!(discussion_timeline(&state, "missing").is_empty());
        assert!(discussion_timeline(&state, "p-1").is_empty());
    }
}
