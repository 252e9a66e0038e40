use crate::workflows::leasing::domain::{
    InvalidTerm, LeaseDraft, LeaseId, LeaseRecord, LeaseStatus, LeaseTerm, Money, RentModel,
};
use crate::workflows::leasing::schedule::{self, EscalationSchedule};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

/// One reason a draft was refused. A failed validation carries every
/// violation found, so callers can fix a submission in a single pass.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    #[error("field {field} must not be blank")]
    BlankField { field: &'static str },
    #[error(transparent)]
    Term(#[from] InvalidTerm),
    #[error("field {field} must not be negative (found {value})")]
    NegativeAmount { field: &'static str, value: Decimal },
    #[error("escalation step {index} value must not be negative (found {value})")]
    NegativeStepValue { index: usize, value: Decimal },
    #[error("escalation step {index} takes effect {effective_from}, outside the lease term")]
    StepOutsideTerm {
        index: usize,
        effective_from: NaiveDate,
    },
    #[error("escalation step {index} ends on or before its effective date")]
    StepEndsBeforeStart { index: usize },
    #[error("escalation steps {first} and {second} overlap")]
    OverlappingSteps { first: usize, second: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("lease draft failed validation with {} violation(s)", .violations.len())]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

/// Shapes a draft into a versioned record, or reports why it cannot be one.
pub(crate) fn record_from_draft(
    id: LeaseId,
    draft: LeaseDraft,
    now: DateTime<Utc>,
) -> Result<LeaseRecord, ValidationError> {
    let LeaseDraft {
        parties,
        term_start,
        term_end,
        notice_period_months,
        rent,
        escalations,
        security_deposit,
        currency,
    } = draft;

    let mut violations = Vec::new();

    let fields = [
        ("project_id", parties.project_id.as_str()),
        ("unit_id", parties.unit_id.as_str()),
        ("owner_id", parties.owner_id.as_str()),
        ("tenant_id", parties.tenant_id.as_str()),
    ];
    for (field, value) in fields {
        if value.trim().is_empty() {
            violations.push(Violation::BlankField { field });
        }
    }

    check_amounts(&rent, security_deposit, &mut violations);

    let term = match LeaseTerm::new(term_start, term_end, notice_period_months) {
        Ok(term) => Some(term),
        Err(invalid) => {
            violations.push(Violation::Term(invalid));
            None
        }
    };

    // Steps can only be judged against a well-formed term.
    let schedule = match term.as_ref() {
        Some(term) => {
            let step_violations = schedule::violations(&escalations, term);
            if step_violations.is_empty() {
                Some(EscalationSchedule::from_validated(escalations))
            } else {
                violations.extend(step_violations);
                None
            }
        }
        None => None,
    };

    match (term, schedule) {
        (Some(term), Some(escalations)) if violations.is_empty() => Ok(LeaseRecord {
            id,
            parties,
            term,
            rent,
            escalations,
            schedule_version: 1,
            status: LeaseStatus::Draft,
            security_deposit,
            currency,
            version: 0,
            created_at: now,
            updated_at: now,
        }),
        _ => Err(ValidationError { violations }),
    }
}

fn check_amounts(rent: &RentModel, security_deposit: Money, violations: &mut Vec<Violation>) {
    match rent {
        RentModel::Fixed { monthly_rent } => {
            check_non_negative("monthly_rent", *monthly_rent, violations);
        }
        RentModel::RevenueShare {
            minimum_guarantee, ..
        } => {
            if let Some(guarantee) = minimum_guarantee {
                check_non_negative("minimum_guarantee", *guarantee, violations);
            }
        }
        RentModel::Hybrid {
            monthly_rent,
            minimum_guarantee,
            ..
        } => {
            check_non_negative("monthly_rent", *monthly_rent, violations);
            if let Some(guarantee) = minimum_guarantee {
                check_non_negative("minimum_guarantee", *guarantee, violations);
            }
        }
    }
    check_non_negative("security_deposit", security_deposit, violations);
}

fn check_non_negative(field: &'static str, amount: Money, violations: &mut Vec<Violation>) {
    if amount.0 < Decimal::ZERO {
        violations.push(Violation::NegativeAmount {
            field,
            value: amount.0,
        });
    }
}
