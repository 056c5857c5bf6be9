//! Project status and payment state machine
//!
//! Status moves forward one step at a time:
//! `pending -> in_progress -> delivered -> completed`. The only way back is
//! `delivered -> in_progress`, taken when a client posts an update on a
//! delivered project. Payment is gated on `completed` and moves
//! `unpaid -> pending_approval -> paid`.
//!
//! The `check_*` functions are guards run before any network call; the
//! `apply_*` functions mutate a local project copy after the server accepted
//! the change.

use chrono::{DateTime, Utc};

use crate::models::{PaymentStatus, Project, ProjectStatus, UserRole};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("Cannot move project from {from} to {to}")]
    InvalidStatusTransition {
        from: ProjectStatus,
        to: ProjectStatus,
    },

    #[error("Payment cannot move from {from} to {to}")]
    InvalidPaymentTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },

    #[error("Payment opens once the project is completed (currently {0})")]
    PaymentNotOpen(ProjectStatus),

    #[error("Only {required} users can {action}")]
    RoleNotPermitted {
        required: UserRole,
        action: &'static str,
    },

    #[error("Projects can only be delivered while in progress (currently {0})")]
    NotDeliverable(ProjectStatus),

    #[error("Select at least one file to deliver")]
    NothingToDeliver,
}

impl ProjectStatus {
    /// The single forward successor, `None` once completed
    pub fn next(&self) -> Option<ProjectStatus> {
        match self {
            ProjectStatus::Pending => Some(ProjectStatus::InProgress),
            ProjectStatus::InProgress => Some(ProjectStatus::Delivered),
            ProjectStatus::Delivered => Some(ProjectStatus::Completed),
            ProjectStatus::Completed => None,
        }
    }

    /// Position in the progress tracker (0-based)
    pub fn step(&self) -> usize {
        match self {
            ProjectStatus::Pending => 0,
            ProjectStatus::InProgress => 1,
            ProjectStatus::Delivered => 2,
            ProjectStatus::Completed => 3,
        }
    }
}

impl PaymentStatus {
    pub fn can_transition_to(&self, to: PaymentStatus) -> bool {
        matches!(
            (self, to),
            (PaymentStatus::Unpaid, PaymentStatus::PendingApproval)
                | (PaymentStatus::PendingApproval, PaymentStatus::Paid)
        )
    }
}

fn require_role(
    role: UserRole,
    required: UserRole,
    action: &'static str,
) -> Result<(), LifecycleError> {
    if role == required {
        Ok(())
    } else {
        Err(LifecycleError::RoleNotPermitted { required, action })
    }
}

/// Guard for an explicit status change through the status endpoint
pub fn check_status_change(
    current: ProjectStatus,
    target: ProjectStatus,
    role: UserRole,
) -> Result<(), LifecycleError> {
    require_role(role, UserRole::Admin, "change project status")?;

    if current.next() == Some(target) {
        Ok(())
    } else {
        Err(LifecycleError::InvalidStatusTransition {
            from: current,
            to: target,
        })
    }
}

/// Guard for uploading delivery files, which also moves the project to delivered
pub fn check_delivery(
    project: &Project,
    role: UserRole,
    file_count: usize,
) -> Result<(), LifecycleError> {
    require_role(role, UserRole::Admin, "deliver a project")?;

    if project.status != ProjectStatus::InProgress {
        return Err(LifecycleError::NotDeliverable(project.status));
    }
    if file_count == 0 {
        return Err(LifecycleError::NothingToDeliver);
    }
    Ok(())
}

/// Set the status locally. Reaching `completed` drops client and delivery files.
pub fn apply_status(project: &mut Project, status: ProjectStatus) {
    project.status = status;
    if status == ProjectStatus::Completed {
        project.client_files.clear();
        project.delivery_files.clear();
    }
}

/// Back-edge for client updates on a delivered project.
///
/// Returns `true` when the project was reverted to in progress.
pub fn apply_client_update(project: &mut Project, sender: UserRole) -> bool {
    if sender == UserRole::Client && project.status == ProjectStatus::Delivered {
        project.status = ProjectStatus::InProgress;
        true
    } else {
        false
    }
}

fn check_payment(
    project: &Project,
    to: PaymentStatus,
) -> Result<(), LifecycleError> {
    if !project.is_completed() {
        return Err(LifecycleError::PaymentNotOpen(project.status));
    }
    if !project.payment_status.can_transition_to(to) {
        return Err(LifecycleError::InvalidPaymentTransition {
            from: project.payment_status,
            to,
        });
    }
    Ok(())
}

/// Guard for the client claiming payment was sent
pub fn check_payment_clearance(project: &Project, role: UserRole) -> Result<(), LifecycleError> {
    require_role(role, UserRole::Client, "mark a payment as cleared")?;
    check_payment(project, PaymentStatus::PendingApproval)
}

/// Guard for the admin confirming payment arrived
pub fn check_payment_approval(project: &Project, role: UserRole) -> Result<(), LifecycleError> {
    require_role(role, UserRole::Admin, "approve a payment")?;
    check_payment(project, PaymentStatus::Paid)
}

pub fn apply_payment_cleared(project: &mut Project) {
    project.payment_status = PaymentStatus::PendingApproval;
}

/// Mark paid, keeping the server's `paidAt` when it sent one
pub fn apply_payment_approved(project: &mut Project, now: DateTime<Utc>) {
    project.payment_status = PaymentStatus::Paid;
    if project.paid_at.is_none() {
        project.paid_at = Some(now);
    }
}
