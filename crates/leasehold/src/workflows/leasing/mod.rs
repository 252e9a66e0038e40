//! Lease lifecycle workflow: drafting, review, activation, and the rent
//! obligations that follow from an active lease.

pub mod audit;
pub mod billing;
pub mod domain;
pub mod lifecycle;
pub mod repository;
pub mod router;
pub mod schedule;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use audit::{
    AuditAction, AuditDetails, AuditEntry, AuditError, AuditFilter, AuditSource, AuditTrail,
    FieldChange,
};
pub use billing::{BlendStrategy, GuaranteeFloor, ObligationError, RentCalculator};
pub use domain::{
    ActorId, CurrencyCode, EscalationKind, EscalationStep, InvalidTerm, LeaseDraft, LeaseId,
    LeaseParties, LeasePatch, LeaseRecord, LeaseStatus, LeaseStatusView, LeaseTerm, Money,
    RentModel, RevenueBasis, RevenueFigures, SharePercentage, ShareOutOfRange,
};
pub use lifecycle::{InvalidTransition, LifecycleAction};
pub use repository::{Clock, LeaseRepository, RepositoryError, SystemClock};
pub use router::{lease_router, lease_router_with_actor_header, DEFAULT_ACTOR_HEADER};
pub use schedule::{AmbiguousScheduleError, EscalationSchedule};
pub use service::{LeaseService, LeaseServiceError, RenewalOutcome};
pub use validation::{ValidationError, Violation};
