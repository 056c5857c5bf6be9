//! Backend route table

pub const LOGIN: &str = "/api/auth/login";
pub const REGISTER: &str = "/api/auth/register";

pub const USERS: &str = "/api/users/";
pub const USERS_CREATE: &str = "/api/users/create";
pub const USERS_ME: &str = "/api/users/me";
pub const USERS_ME_UPDATE: &str = "/api/users/me/update";

pub const WORKSPACE_ME: &str = "/api/workspaces/me";
pub const WORKSPACE_UPDATE: &str = "/api/workspaces/me/update";
pub const WORKSPACE_STATS: &str = "/api/workspaces/me/stats";
pub const WORKSPACE_EXPORT: &str = "/api/workspaces/me/export";
pub const WORKSPACE_IMPORT: &str = "/api/workspaces/me/import";

pub const PROJECTS: &str = "/api/projects/";
pub const PROJECTS_CREATE: &str = "/api/projects/create";
pub const DASHBOARD_STATS: &str = "/api/projects/dashboard/stats";
pub const UNREAD_UPDATES: &str = "/api/projects/updates/unread";

pub const INVITATIONS: &str = "/api/collaborators/invitations";

pub const FINANCE_HISTORY: &str = "/api/finance/history";
pub const FINANCE_STATS: &str = "/api/finance/stats";

pub fn project(id: &str) -> String {
    format!("/api/projects/{}", id)
}

pub fn project_status(id: &str) -> String {
    format!("/api/projects/{}/status", id)
}

pub fn project_delivery(id: &str) -> String {
    format!("/api/projects/{}/delivery", id)
}

pub fn project_comments(id: &str) -> String {
    format!("/api/projects/{}/comments", id)
}

pub fn project_updates(id: &str) -> String {
    format!("/api/projects/{}/updates", id)
}

pub fn project_unread_updates(id: &str) -> String {
    format!("/api/projects/{}/updates/unread", id)
}

pub fn payment_clear(id: &str) -> String {
    format!("/api/projects/{}/payment/clear", id)
}

pub fn payment_approve(id: &str) -> String {
    format!("/api/projects/{}/payment/approve", id)
}

pub fn collaborators(project_id: &str) -> String {
    format!("/api/projects/{}/collaborators", project_id)
}

pub fn collaborator_invite(project_id: &str) -> String {
    format!("/api/projects/{}/collaborators/invite", project_id)
}

pub fn collaborator(project_id: &str, collaborator_id: &str) -> String {
    format!("/api/projects/{}/collaborators/{}", project_id, collaborator_id)
}

pub fn invitation_respond(invitation_id: &str) -> String {
    format!("/api/collaborators/invitations/{}/respond", invitation_id)
}

pub fn file(project_id: &str, category: &str, filename: &str) -> String {
    format!(
        "/api/files/{}/{}/{}",
        project_id,
        category,
        urlencoding::encode(filename)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(project_status("p-1"), "/api/projects/p-1/status");
        assert_eq!(payment_clear("p-1"), "/api/projects/p-1/payment/clear");
        assert_eq!(
            collaborator("p-1", "col-9"),
            "/api/projects/p-1/collaborators/col-9"
        );
        assert_eq!(
            file("p-1", "delivery", "final build.zip"),
            "/api/files/p-1/delivery/final%20build.zip"
        );
    }
}
