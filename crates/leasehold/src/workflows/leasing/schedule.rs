use crate::workflows::leasing::domain::{EscalationKind, EscalationStep, LeaseTerm};
use crate::workflows::leasing::validation::{ValidationError, Violation};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Validated, non-overlapping escalation steps ordered by effective date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EscalationSchedule {
    steps: Vec<EscalationStep>,
}

impl EscalationSchedule {
    pub fn empty() -> Self {
        Self { steps: Vec::new() }
    }

    /// Validates the whole batch before accepting any of it. Every violation
    /// found is reported, not just the first.
    pub fn new(steps: Vec<EscalationStep>, term: &LeaseTerm) -> Result<Self, ValidationError> {
        let violations = violations(&steps, term);
        if !violations.is_empty() {
            return Err(ValidationError { violations });
        }
        Ok(Self::from_validated(steps))
    }

    pub(crate) fn from_validated(mut steps: Vec<EscalationStep>) -> Self {
        steps.sort_by_key(|step| step.effective_from);
        Self { steps }
    }

    pub fn steps(&self) -> &[EscalationStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step governing `as_of`, if any. An open-ended step runs to the term
    /// end, and among applicable steps the latest effective date wins. Two
    /// applicable steps sharing an effective date is a fault in the stored
    /// schedule, surfaced rather than resolved arbitrarily.
    pub fn step_for(
        &self,
        as_of: NaiveDate,
    ) -> Result<Option<&EscalationStep>, AmbiguousScheduleError> {
        let mut selected: Option<&EscalationStep> = None;
        for step in &self.steps {
            if step.effective_from > as_of {
                continue;
            }
            if step.effective_to.map_or(false, |to| to <= as_of) {
                continue;
            }
            selected = match selected {
                Some(current) if step.effective_from > current.effective_from => Some(step),
                Some(current) if step.effective_from == current.effective_from => {
                    return Err(AmbiguousScheduleError {
                        as_of,
                        effective_from: step.effective_from,
                    });
                }
                Some(current) => Some(current),
                None => Some(step),
            };
        }
        Ok(selected)
    }
}

/// All schedule violations against a term, in one pass. Percentage steps over
/// 100 are legal but suspicious, so they only log a warning.
pub(crate) fn violations(steps: &[EscalationStep], term: &LeaseTerm) -> Vec<Violation> {
    let mut found = Vec::new();

    for (index, step) in steps.iter().enumerate() {
        if !term.contains(step.effective_from) {
            found.push(Violation::StepOutsideTerm {
                index,
                effective_from: step.effective_from,
            });
        }
        if let Some(to) = step.effective_to {
            if to <= step.effective_from {
                found.push(Violation::StepEndsBeforeStart { index });
            }
        }
        let value = match step.kind {
            EscalationKind::Percentage(value) => value,
            EscalationKind::FixedAmount(value) => value,
        };
        if value < Decimal::ZERO {
            found.push(Violation::NegativeStepValue { index, value });
        }
        if let EscalationKind::Percentage(percent) = step.kind {
            if percent > Decimal::ONE_HUNDRED {
                tracing::warn!(index, value = %percent, "escalation step exceeds 100 percent");
            }
        }
    }

    let mut order: Vec<usize> = (0..steps.len()).collect();
    order.sort_by_key(|&index| steps[index].effective_from);
    for pair in order.windows(2) {
        let (first, second) = (pair[0], pair[1]);
        let first_end = steps[first].effective_to.unwrap_or(term.end);
        if steps[second].effective_from < first_end {
            found.push(Violation::OverlappingSteps { first, second });
        }
    }

    found
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("escalation schedule is ambiguous at {as_of}: more than one step takes effect {effective_from}")]
pub struct AmbiguousScheduleError {
    pub as_of: NaiveDate,
    pub effective_from: NaiveDate,
}
