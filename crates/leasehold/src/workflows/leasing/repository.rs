use crate::workflows::leasing::audit::AuditEntry;
use crate::workflows::leasing::domain::{LeaseId, LeaseRecord};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("lease already exists")]
    Conflict,
    #[error("lease not found")]
    NotFound,
    #[error("lease version conflict (expected {expected}, found {found})")]
    VersionConflict { expected: u64, found: u64 },
    #[error("lease store unavailable: {0}")]
    Unavailable(String),
}

/// Lease persistence. Every write carries the audit entry describing it, and
/// the two land together or not at all.
pub trait LeaseRepository: Send + Sync {
    fn insert(
        &self,
        record: LeaseRecord,
        entry: AuditEntry,
    ) -> Result<LeaseRecord, RepositoryError>;

    fn fetch(&self, lease_id: &LeaseId) -> Result<Option<LeaseRecord>, RepositoryError>;

    /// Replaces the stored record only while its version still equals
    /// `expected_version`. The caller hands over the record with the version
    /// already advanced.
    fn commit(
        &self,
        record: LeaseRecord,
        expected_version: u64,
        entry: AuditEntry,
    ) -> Result<LeaseRecord, RepositoryError>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
