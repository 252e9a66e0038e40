use crate::workflows::leasing::domain::{ActorId, LeaseId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Created,
    Updated,
    Submitted,
    Approved,
    Rejected,
    Reopened,
    Terminated,
    Renewed,
    EscalationApplied,
}

impl AuditAction {
    pub const fn label(self) -> &'static str {
        match self {
            AuditAction::Created => "created",
            AuditAction::Updated => "updated",
            AuditAction::Submitted => "submitted",
            AuditAction::Approved => "approved",
            AuditAction::Rejected => "rejected",
            AuditAction::Reopened => "reopened",
            AuditAction::Terminated => "terminated",
            AuditAction::Renewed => "renewed",
            AuditAction::EscalationApplied => "escalation_applied",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub from: Value,
    pub to: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<FieldChange>,
}

impl AuditDetails {
    pub fn note(note: impl Into<String>) -> Self {
        Self {
            note: Some(note.into()),
            ..Self::default()
        }
    }

    pub fn changes(changes: Vec<FieldChange>) -> Self {
        Self {
            changes,
            ..Self::default()
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// One append-only record of something done to a lease. Entries are written
/// in the same storage operation as the lease change they describe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub lease_id: LeaseId,
    pub actor: ActorId,
    pub action: AuditAction,
    #[serde(default)]
    pub details: AuditDetails,
    pub recorded_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub lease_id: Option<LeaseId>,
    pub action: Option<AuditAction>,
}

impl AuditFilter {
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        if let Some(lease_id) = &self.lease_id {
            if entry.lease_id != *lease_id {
                return false;
            }
        }
        if let Some(action) = self.action {
            if entry.action != action {
                return false;
            }
        }
        true
    }
}

/// Who performed an operation and from where, as reported by the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditSource {
    pub actor: ActorId,
    pub ip_address: Option<String>,
}

impl AuditSource {
    pub fn system() -> Self {
        Self {
            actor: ActorId::system(),
            ip_address: None,
        }
    }

    pub fn actor(actor: ActorId) -> Self {
        Self {
            actor,
            ip_address: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuditError {
    #[error("audit trail unavailable: {0}")]
    Unavailable(String),
}

/// Read side of the trail. `by_lease` returns entries oldest first; `recent`
/// returns newest first, capped at `limit`.
pub trait AuditTrail: Send + Sync {
    fn by_lease(&self, lease_id: &LeaseId) -> Result<Vec<AuditEntry>, AuditError>;

    fn recent(&self, limit: usize, filter: &AuditFilter) -> Result<Vec<AuditEntry>, AuditError>;
}
