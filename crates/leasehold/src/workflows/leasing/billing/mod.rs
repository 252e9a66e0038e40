//! Rent computation: base amount per model, escalation, proration, and a
//! single rounding pass at the currency's minor unit.

pub mod policy;

pub use policy::{BlendStrategy, GuaranteeFloor};

use crate::workflows::leasing::domain::{
    CurrencyCode, EscalationKind, LeaseRecord, Money, RentModel, RevenueBasis, RevenueFigures,
};
use crate::workflows::leasing::schedule::AmbiguousScheduleError;
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ObligationError {
    #[error("no {} figure was reported for the period", .basis.label())]
    MissingRevenue { basis: RevenueBasis },
    #[error("{year}-{month:02} is not a valid billing period")]
    InvalidPeriod { year: i32, month: u32 },
    #[error(transparent)]
    AmbiguousSchedule(#[from] AmbiguousScheduleError),
}

pub struct RentCalculator {
    blend: Box<dyn BlendStrategy>,
}

impl Default for RentCalculator {
    fn default() -> Self {
        Self {
            blend: Box::new(GuaranteeFloor),
        }
    }
}

impl RentCalculator {
    pub fn new<B: BlendStrategy + 'static>(blend: B) -> Self {
        Self {
            blend: Box::new(blend),
        }
    }

    /// Monthly amount owed as of a date, after escalation and rounding.
    pub fn obligation(
        &self,
        lease: &LeaseRecord,
        as_of: NaiveDate,
        revenue: Option<&RevenueFigures>,
    ) -> Result<Money, ObligationError> {
        let base = self.base_amount(&lease.rent, revenue)?;
        let escalated = escalated_raw(lease, as_of, base)?;
        Ok(rounded(lease.currency, escalated))
    }

    /// Obligation with revenue taken as zero: what the lease guarantees
    /// regardless of reported sales.
    pub fn guaranteed_floor(
        &self,
        lease: &LeaseRecord,
        as_of: NaiveDate,
    ) -> Result<Money, ObligationError> {
        let base = match lease.rent {
            RentModel::Fixed { monthly_rent } => {
                self.blend.blend(Some(monthly_rent.0), None, Decimal::ZERO)
            }
            RentModel::RevenueShare {
                minimum_guarantee, ..
            } => self
                .blend
                .blend(None, minimum_guarantee.map(|money| money.0), Decimal::ZERO),
            RentModel::Hybrid {
                monthly_rent,
                minimum_guarantee,
                ..
            } => self.blend.blend(
                Some(monthly_rent.0),
                minimum_guarantee.map(|money| money.0),
                Decimal::ZERO,
            ),
        };
        let escalated = escalated_raw(lease, as_of, base)?;
        Ok(rounded(lease.currency, escalated))
    }

    /// Rent invoiced for a calendar month, prorated by the days the lease is
    /// active within it. The rate is taken at the first active day and the
    /// result rounds once, at the end.
    pub fn invoice_for_month(
        &self,
        lease: &LeaseRecord,
        year: i32,
        month: u32,
        revenue: Option<&RevenueFigures>,
    ) -> Result<Money, ObligationError> {
        let (first, last) = month_bounds(year, month)?;
        let active_from = first.max(lease.term.start);
        let active_to = last.min(lease.term.end);
        if active_from > active_to {
            return Ok(Money(Decimal::ZERO));
        }

        let base = self.base_amount(&lease.rent, revenue)?;
        let monthly = escalated_raw(lease, active_from, base)?;

        let active_days = (active_to - active_from).num_days() + 1;
        let days_in_month = (last - first).num_days() + 1;
        let prorated = monthly * Decimal::from(active_days) / Decimal::from(days_in_month);
        Ok(rounded(lease.currency, prorated))
    }

    fn base_amount(
        &self,
        rent: &RentModel,
        revenue: Option<&RevenueFigures>,
    ) -> Result<Decimal, ObligationError> {
        match *rent {
            RentModel::Fixed { monthly_rent } => Ok(monthly_rent.0),
            RentModel::RevenueShare {
                minimum_guarantee,
                share,
                basis,
            } => {
                let sales = figure_for(revenue, basis)?;
                let revenue_share = sales.0 * share.value() / Decimal::ONE_HUNDRED;
                Ok(self.blend.blend(
                    None,
                    minimum_guarantee.map(|money| money.0),
                    revenue_share,
                ))
            }
            RentModel::Hybrid {
                monthly_rent,
                minimum_guarantee,
                share,
                basis,
            } => {
                let sales = figure_for(revenue, basis)?;
                let revenue_share = sales.0 * share.value() / Decimal::ONE_HUNDRED;
                Ok(self.blend.blend(
                    Some(monthly_rent.0),
                    minimum_guarantee.map(|money| money.0),
                    revenue_share,
                ))
            }
        }
    }
}

fn escalated_raw(
    lease: &LeaseRecord,
    as_of: NaiveDate,
    base: Decimal,
) -> Result<Decimal, ObligationError> {
    let step = lease.escalations.step_for(as_of)?;
    let adjusted = match step.map(|step| step.kind) {
        Some(EscalationKind::Percentage(percent)) => {
            base * (Decimal::ONE + percent / Decimal::ONE_HUNDRED)
        }
        Some(EscalationKind::FixedAmount(amount)) => base + amount,
        None => base,
    };
    Ok(adjusted)
}

// Banker's rounding; intermediate figures keep full precision.
fn rounded(currency: CurrencyCode, amount: Decimal) -> Money {
    Money(amount.round_dp_with_strategy(
        currency.minor_units(),
        RoundingStrategy::MidpointNearestEven,
    ))
}

fn figure_for(
    revenue: Option<&RevenueFigures>,
    basis: RevenueBasis,
) -> Result<Money, ObligationError> {
    revenue
        .and_then(|figures| figures.for_basis(basis))
        .ok_or(ObligationError::MissingRevenue { basis })
}

fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), ObligationError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or(ObligationError::InvalidPeriod { year, month })?;
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let last = next_month
        .and_then(|date| date.pred_opt())
        .ok_or(ObligationError::InvalidPeriod { year, month })?;
    Ok((first, last))
}
