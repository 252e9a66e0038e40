use crate::workflows::leasing::audit::{
    AuditAction, AuditDetails, AuditEntry, AuditError, AuditFilter, AuditSource, AuditTrail,
    FieldChange,
};
use crate::workflows::leasing::billing::{ObligationError, RentCalculator};
use crate::workflows::leasing::domain::{
    EscalationStep, LeaseDraft, LeaseId, LeasePatch, LeaseRecord, LeaseStatus, Money,
    RevenueFigures,
};
use crate::workflows::leasing::lifecycle::{self, InvalidTransition, LifecycleAction};
use crate::workflows::leasing::repository::{Clock, LeaseRepository, RepositoryError, SystemClock};
use crate::workflows::leasing::schedule::EscalationSchedule;
use crate::workflows::leasing::validation::{self, ValidationError, Violation};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static LEASE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_lease_id() -> LeaseId {
    let id = LEASE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    LeaseId(format!("lease-{id:06}"))
}

#[derive(Debug, thiserror::Error)]
pub enum LeaseServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Transition(#[from] InvalidTransition),
    #[error("lease in status {} cannot be modified by this operation", .status.label())]
    ImmutableState { status: LeaseStatus },
    #[error(transparent)]
    Obligation(#[from] ObligationError),
    #[error("lease was modified concurrently (expected version {expected}, found {found})")]
    ConcurrentModification { expected: u64, found: u64 },
    #[error(transparent)]
    Repository(RepositoryError),
    #[error(transparent)]
    Audit(#[from] AuditError),
}

impl From<RepositoryError> for LeaseServiceError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::VersionConflict { expected, found } => {
                Self::ConcurrentModification { expected, found }
            }
            other => Self::Repository(other),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RenewalOutcome {
    pub renewed: LeaseRecord,
    pub successor: LeaseRecord,
}

/// Orchestrates the lease lifecycle over a store that persists records and
/// their audit entries together. Loses every race it detects: a stale version
/// aborts the write instead of retrying.
pub struct LeaseService<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    calculator: RentCalculator,
}

impl<S> LeaseService<S>
where
    S: LeaseRepository + AuditTrail + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            calculator: RentCalculator::default(),
        }
    }

    pub fn with_calculator(mut self, calculator: RentCalculator) -> Self {
        self.calculator = calculator;
        self
    }

    pub fn create_draft(
        &self,
        draft: LeaseDraft,
        source: &AuditSource,
    ) -> Result<LeaseRecord, LeaseServiceError> {
        let now = self.clock.now();
        let record = validation::record_from_draft(next_lease_id(), draft, now)?;
        let entry = self.entry(
            &record.id,
            AuditAction::Created,
            AuditDetails::default(),
            source,
        );
        let stored = self.store.insert(record, entry)?;
        tracing::info!(lease_id = %stored.id, model = stored.rent.label(), "lease draft created");
        Ok(stored)
    }

    pub fn get(&self, lease_id: &LeaseId) -> Result<LeaseRecord, LeaseServiceError> {
        self.fetch_required(lease_id)
    }

    /// Applies a partial edit to a draft. Only drafts are editable; anything
    /// past review is immutable and changes go through lifecycle operations.
    pub fn update(
        &self,
        lease_id: &LeaseId,
        patch: LeasePatch,
        source: &AuditSource,
    ) -> Result<LeaseRecord, LeaseServiceError> {
        let current = self.fetch_required(lease_id)?;
        if current.status != LeaseStatus::Draft {
            return Err(LeaseServiceError::ImmutableState {
                status: current.status,
            });
        }

        let before = current.as_draft();
        let after = patch.apply_to(&before);
        let mut changes = draft_changes(&before, &after);
        let rent_affected = rent_affecting(&before, &after);

        let now = self.clock.now();
        let mut updated = validation::record_from_draft(current.id.clone(), after, now)?;
        updated.status = current.status;
        updated.schedule_version = current.schedule_version;
        updated.created_at = current.created_at;
        updated.version = current.version + 1;

        if rent_affected {
            let as_of = now.date_naive().clamp(updated.term.start, updated.term.end);
            let floor_before = self.calculator.guaranteed_floor(&current, as_of)?;
            let floor_after = self.calculator.guaranteed_floor(&updated, as_of)?;
            changes.push(FieldChange {
                field: "guaranteed_floor".to_string(),
                from: serde_json::to_value(floor_before).unwrap_or(Value::Null),
                to: serde_json::to_value(floor_after).unwrap_or(Value::Null),
            });
        }

        let entry = self.entry(
            &updated.id,
            AuditAction::Updated,
            AuditDetails::changes(changes),
            source,
        );
        let stored = self.store.commit(updated, current.version, entry)?;
        tracing::info!(lease_id = %stored.id, version = stored.version, "lease draft updated");
        Ok(stored)
    }

    /// Re-runs draft validation as the review gate. The status does not move,
    /// but reviewers only see drafts that validate clean.
    pub fn submit_for_review(
        &self,
        lease_id: &LeaseId,
        source: &AuditSource,
    ) -> Result<LeaseRecord, LeaseServiceError> {
        let current = self.fetch_required(lease_id)?;
        let next = lifecycle::transition(current.status, LifecycleAction::Submit)?;
        validation::record_from_draft(current.id.clone(), current.as_draft(), self.clock.now())?;
        self.transition_to(
            current,
            next,
            LifecycleAction::Submit,
            AuditDetails::default(),
            source,
        )
    }

    pub fn approve(
        &self,
        lease_id: &LeaseId,
        notes: Option<String>,
        source: &AuditSource,
    ) -> Result<LeaseRecord, LeaseServiceError> {
        let current = self.fetch_required(lease_id)?;
        let next = lifecycle::transition(current.status, LifecycleAction::Approve)?;
        let details = notes.map(AuditDetails::note).unwrap_or_default();
        self.transition_to(current, next, LifecycleAction::Approve, details, source)
    }

    /// A rejection must say why. The reason is checked before anything is
    /// read or written, so a refused rejection leaves no trace.
    pub fn reject(
        &self,
        lease_id: &LeaseId,
        reason: &str,
        comments: Option<String>,
        source: &AuditSource,
    ) -> Result<LeaseRecord, LeaseServiceError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ValidationError {
                violations: vec![Violation::BlankField { field: "reason" }],
            }
            .into());
        }

        let current = self.fetch_required(lease_id)?;
        let next = lifecycle::transition(current.status, LifecycleAction::Reject)?;
        let mut details = AuditDetails::note(reason);
        if let Some(comments) = comments {
            details = details.with_comment(comments);
        }
        self.transition_to(current, next, LifecycleAction::Reject, details, source)
    }

    pub fn reopen(
        &self,
        lease_id: &LeaseId,
        source: &AuditSource,
    ) -> Result<LeaseRecord, LeaseServiceError> {
        let current = self.fetch_required(lease_id)?;
        let next = lifecycle::transition(current.status, LifecycleAction::Reopen)?;
        self.transition_to(
            current,
            next,
            LifecycleAction::Reopen,
            AuditDetails::default(),
            source,
        )
    }

    pub fn terminate(
        &self,
        lease_id: &LeaseId,
        reason: Option<String>,
        source: &AuditSource,
    ) -> Result<LeaseRecord, LeaseServiceError> {
        let current = self.fetch_required(lease_id)?;
        let next = lifecycle::transition(current.status, LifecycleAction::Terminate)?;
        let details = reason.map(AuditDetails::note).unwrap_or_default();
        self.transition_to(current, next, LifecycleAction::Terminate, details, source)
    }

    /// Closes out an active lease and opens its successor draft in one
    /// operation. The successor carries the parties, rent model and deposit
    /// forward; escalations are renegotiated per term, so it starts with none.
    pub fn renew(
        &self,
        lease_id: &LeaseId,
        new_start: NaiveDate,
        new_end: NaiveDate,
        source: &AuditSource,
    ) -> Result<RenewalOutcome, LeaseServiceError> {
        let current = self.fetch_required(lease_id)?;
        let next = lifecycle::transition(current.status, LifecycleAction::Renew)?;

        let successor_draft = LeaseDraft {
            parties: current.parties.clone(),
            term_start: new_start,
            term_end: new_end,
            notice_period_months: current.term.notice_period_months,
            rent: current.rent,
            escalations: Vec::new(),
            security_deposit: current.security_deposit,
            currency: current.currency,
        };
        // Validate the successor before touching the current lease, so a bad
        // renewal term changes nothing.
        let successor =
            validation::record_from_draft(next_lease_id(), successor_draft, self.clock.now())?;

        let details = AuditDetails::note(format!("renewed into {}", successor.id));
        let renewed = self.transition_to(current, next, LifecycleAction::Renew, details, source)?;

        let entry = self.entry(
            &successor.id,
            AuditAction::Created,
            AuditDetails::note(format!("successor to {}", renewed.id)),
            source,
        );
        let successor = self.store.insert(successor, entry)?;
        tracing::info!(lease_id = %renewed.id, successor_id = %successor.id, "lease renewed");

        Ok(RenewalOutcome { renewed, successor })
    }

    /// Replaces the escalation schedule on an active lease. The whole batch
    /// validates against the term or none of it lands.
    pub fn amend_escalations(
        &self,
        lease_id: &LeaseId,
        steps: Vec<EscalationStep>,
        source: &AuditSource,
    ) -> Result<LeaseRecord, LeaseServiceError> {
        let current = self.fetch_required(lease_id)?;
        if current.status != LeaseStatus::Active {
            return Err(LeaseServiceError::ImmutableState {
                status: current.status,
            });
        }

        let schedule = EscalationSchedule::new(steps, &current.term)?;
        let change = FieldChange {
            field: "escalations".to_string(),
            from: serde_json::to_value(&current.escalations).unwrap_or(Value::Null),
            to: serde_json::to_value(&schedule).unwrap_or(Value::Null),
        };

        let expected = current.version;
        let mut amended = current;
        amended.escalations = schedule;
        amended.schedule_version += 1;
        amended.updated_at = self.clock.now();
        amended.version = expected + 1;

        let entry = self.entry(
            &amended.id,
            AuditAction::EscalationApplied,
            AuditDetails::changes(vec![change]),
            source,
        );
        let stored = self.store.commit(amended, expected, entry)?;
        tracing::info!(
            lease_id = %stored.id,
            schedule_version = stored.schedule_version,
            "escalation schedule amended"
        );
        Ok(stored)
    }

    pub fn obligation(
        &self,
        lease_id: &LeaseId,
        as_of: NaiveDate,
        revenue: Option<&RevenueFigures>,
    ) -> Result<Money, LeaseServiceError> {
        let lease = self.fetch_required(lease_id)?;
        Ok(self.calculator.obligation(&lease, as_of, revenue)?)
    }

    pub fn guaranteed_floor(
        &self,
        lease_id: &LeaseId,
        as_of: NaiveDate,
    ) -> Result<Money, LeaseServiceError> {
        let lease = self.fetch_required(lease_id)?;
        Ok(self.calculator.guaranteed_floor(&lease, as_of)?)
    }

    pub fn invoice_for_month(
        &self,
        lease_id: &LeaseId,
        year: i32,
        month: u32,
        revenue: Option<&RevenueFigures>,
    ) -> Result<Money, LeaseServiceError> {
        let lease = self.fetch_required(lease_id)?;
        Ok(self
            .calculator
            .invoice_for_month(&lease, year, month, revenue)?)
    }

    pub fn audit_trail(&self, lease_id: &LeaseId) -> Result<Vec<AuditEntry>, LeaseServiceError> {
        self.fetch_required(lease_id)?;
        Ok(self.store.by_lease(lease_id)?)
    }

    pub fn recent_activity(
        &self,
        limit: usize,
        filter: &AuditFilter,
    ) -> Result<Vec<AuditEntry>, LeaseServiceError> {
        Ok(self.store.recent(limit, filter)?)
    }

    fn fetch_required(&self, lease_id: &LeaseId) -> Result<LeaseRecord, LeaseServiceError> {
        Ok(self
            .store
            .fetch(lease_id)?
            .ok_or(RepositoryError::NotFound)?)
    }

    fn transition_to(
        &self,
        mut current: LeaseRecord,
        next: LeaseStatus,
        action: LifecycleAction,
        details: AuditDetails,
        source: &AuditSource,
    ) -> Result<LeaseRecord, LeaseServiceError> {
        let expected = current.version;
        let from = current.status;
        current.status = next;
        current.updated_at = self.clock.now();
        current.version = expected + 1;

        let entry = self.entry(&current.id, action.audit_action(), details, source);
        let stored = self.store.commit(current, expected, entry)?;
        tracing::info!(
            lease_id = %stored.id,
            from = from.label(),
            to = stored.status.label(),
            action = action.label(),
            "lease transitioned"
        );
        Ok(stored)
    }

    fn entry(
        &self,
        lease_id: &LeaseId,
        action: AuditAction,
        details: AuditDetails,
        source: &AuditSource,
    ) -> AuditEntry {
        AuditEntry {
            lease_id: lease_id.clone(),
            actor: source.actor.clone(),
            action,
            details,
            recorded_at: self.clock.now(),
            ip_address: source.ip_address.clone(),
        }
    }
}

fn rent_affecting(before: &LeaseDraft, after: &LeaseDraft) -> bool {
    before.rent != after.rent
        || before.escalations != after.escalations
        || before.currency != after.currency
}

fn draft_changes(before: &LeaseDraft, after: &LeaseDraft) -> Vec<FieldChange> {
    let mut changes = Vec::new();
    push_change(&mut changes, "parties", &before.parties, &after.parties);
    push_change(
        &mut changes,
        "term_start",
        &before.term_start,
        &after.term_start,
    );
    push_change(&mut changes, "term_end", &before.term_end, &after.term_end);
    push_change(
        &mut changes,
        "notice_period_months",
        &before.notice_period_months,
        &after.notice_period_months,
    );
    push_change(&mut changes, "rent", &before.rent, &after.rent);
    push_change(
        &mut changes,
        "escalations",
        &before.escalations,
        &after.escalations,
    );
    push_change(
        &mut changes,
        "security_deposit",
        &before.security_deposit,
        &after.security_deposit,
    );
    push_change(&mut changes, "currency", &before.currency, &after.currency);
    changes
}

fn push_change<T: PartialEq + Serialize>(
    changes: &mut Vec<FieldChange>,
    field: &str,
    before: &T,
    after: &T,
) {
    if before == after {
        return;
    }
    changes.push(FieldChange {
        field: field.to_string(),
        from: serde_json::to_value(before).unwrap_or(Value::Null),
        to: serde_json::to_value(after).unwrap_or(Value::Null),
    });
}
