use crate::workflows::leasing::audit::AuditAction;
use crate::workflows::leasing::domain::LeaseStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    Submit,
    Approve,
    Reject,
    Reopen,
    Terminate,
    Renew,
}

impl LifecycleAction {
    pub const fn label(self) -> &'static str {
        match self {
            LifecycleAction::Submit => "submit",
            LifecycleAction::Approve => "approve",
            LifecycleAction::Reject => "reject",
            LifecycleAction::Reopen => "reopen",
            LifecycleAction::Terminate => "terminate",
            LifecycleAction::Renew => "renew",
        }
    }

    pub(crate) const fn audit_action(self) -> AuditAction {
        match self {
            LifecycleAction::Submit => AuditAction::Submitted,
            LifecycleAction::Approve => AuditAction::Approved,
            LifecycleAction::Reject => AuditAction::Rejected,
            LifecycleAction::Reopen => AuditAction::Reopened,
            LifecycleAction::Terminate => AuditAction::Terminated,
            LifecycleAction::Renew => AuditAction::Renewed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot {} a lease in status {}", .action.label(), .from.label())]
pub struct InvalidTransition {
    pub from: LeaseStatus,
    pub action: LifecycleAction,
}

/// The full transition table. Anything not listed is rejected, so adding a
/// status forces every action to be reconsidered here.
pub fn transition(
    from: LeaseStatus,
    action: LifecycleAction,
) -> Result<LeaseStatus, InvalidTransition> {
    match (from, action) {
        (LeaseStatus::Draft, LifecycleAction::Submit) => Ok(LeaseStatus::Draft),
        (LeaseStatus::Draft, LifecycleAction::Approve) => Ok(LeaseStatus::Active),
        (LeaseStatus::Draft, LifecycleAction::Reject) => Ok(LeaseStatus::Rejected),
        (LeaseStatus::Rejected, LifecycleAction::Reopen) => Ok(LeaseStatus::Draft),
        (LeaseStatus::Active, LifecycleAction::Terminate) => Ok(LeaseStatus::Terminated),
        (LeaseStatus::Active, LifecycleAction::Renew) => Ok(LeaseStatus::Renewed),
        (from, action) => Err(InvalidTransition { from, action }),
    }
}
