use crate::workflows::leasing::schedule::EscalationSchedule;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeaseId(pub String);

impl fmt::Display for LeaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub String);

impl ActorId {
    pub fn system() -> Self {
        Self("system".to_string())
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseParties {
    pub project_id: String,
    pub unit_id: String,
    pub owner_id: String,
    pub tenant_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("lease term must end after it starts (start {start}, end {end})")]
pub struct InvalidTerm {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Occupancy window of a lease. Both endpoints are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseTerm {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub notice_period_months: u8,
}

impl LeaseTerm {
    pub fn new(
        start: NaiveDate,
        end: NaiveDate,
        notice_period_months: u8,
    ) -> Result<Self, InvalidTerm> {
        if end <= start {
            return Err(InvalidTerm { start, end });
        }
        Ok(Self {
            start,
            end,
            notice_period_months,
        })
    }

    /// Whole months elapsed between start and end.
    pub fn tenure_months(&self) -> u32 {
        let mut months = (self.end.year() - self.start.year()) * 12 + self.end.month() as i32
            - self.start.month() as i32;
        if self.end.day() < self.start.day() {
            months -= 1;
        }
        months.max(0) as u32
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Monetary amount in the lease currency. Comparisons ignore trailing zeros.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(pub Decimal);

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CurrencyCode {
    Usd,
    Eur,
    Gbp,
    Inr,
    Jpy,
    Kwd,
}

impl CurrencyCode {
    /// Exponent of the minor unit: the decimal places amounts settle at.
    pub const fn minor_units(self) -> u32 {
        match self {
            CurrencyCode::Jpy => 0,
            CurrencyCode::Kwd => 3,
            CurrencyCode::Usd | CurrencyCode::Eur | CurrencyCode::Gbp | CurrencyCode::Inr => 2,
        }
    }

    pub const fn code(self) -> &'static str {
        match self {
            CurrencyCode::Usd => "USD",
            CurrencyCode::Eur => "EUR",
            CurrencyCode::Gbp => "GBP",
            CurrencyCode::Inr => "INR",
            CurrencyCode::Jpy => "JPY",
            CurrencyCode::Kwd => "KWD",
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("revenue share must be between 0 and 100 percent (found {0})")]
pub struct ShareOutOfRange(pub Decimal);

/// Tenant revenue share, expressed in percent between 0 and 100 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct SharePercentage(Decimal);

impl SharePercentage {
    pub fn new(value: Decimal) -> Result<Self, ShareOutOfRange> {
        if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
            return Err(ShareOutOfRange(value));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for SharePercentage {
    type Error = ShareOutOfRange;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SharePercentage> for Decimal {
    fn from(value: SharePercentage) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevenueBasis {
    NetSales,
    GrossSales,
}

impl RevenueBasis {
    pub const fn label(self) -> &'static str {
        match self {
            RevenueBasis::NetSales => "net_sales",
            RevenueBasis::GrossSales => "gross_sales",
        }
    }
}

/// How the rent owed for a period is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum RentModel {
    Fixed {
        monthly_rent: Money,
    },
    RevenueShare {
        minimum_guarantee: Option<Money>,
        share: SharePercentage,
        basis: RevenueBasis,
    },
    Hybrid {
        monthly_rent: Money,
        minimum_guarantee: Option<Money>,
        share: SharePercentage,
        basis: RevenueBasis,
    },
}

impl RentModel {
    pub const fn label(self) -> &'static str {
        match self {
            RentModel::Fixed { .. } => "fixed",
            RentModel::RevenueShare { .. } => "revenue_share",
            RentModel::Hybrid { .. } => "hybrid",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum EscalationKind {
    Percentage(Decimal),
    FixedAmount(Decimal),
}

/// One rent adjustment. An absent `effective_to` runs to the end of the term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationStep {
    pub effective_from: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_to: Option<NaiveDate>,
    #[serde(flatten)]
    pub kind: EscalationKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaseStatus {
    Draft,
    Active,
    Rejected,
    Terminated,
    Renewed,
}

impl LeaseStatus {
    pub const fn label(self) -> &'static str {
        match self {
            LeaseStatus::Draft => "draft",
            LeaseStatus::Active => "active",
            LeaseStatus::Rejected => "rejected",
            LeaseStatus::Terminated => "terminated",
            LeaseStatus::Renewed => "renewed",
        }
    }
}

/// A lease as held by the engine. The record owns its escalation schedule and
/// carries a version counter bumped on every successful write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaseRecord {
    pub id: LeaseId,
    pub parties: LeaseParties,
    pub term: LeaseTerm,
    pub rent: RentModel,
    pub escalations: EscalationSchedule,
    pub schedule_version: u32,
    pub status: LeaseStatus,
    pub security_deposit: Money,
    pub currency: CurrencyCode,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LeaseRecord {
    pub fn status_view(&self) -> LeaseStatusView {
        LeaseStatusView {
            lease_id: self.id.clone(),
            status: self.status.label(),
            rent_model: self.rent.label(),
            term_start: self.term.start,
            term_end: self.term.end,
            tenure_months: self.term.tenure_months(),
            schedule_version: self.schedule_version,
            version: self.version,
        }
    }

    /// Editable projection of the record, used to diff updates against.
    pub fn as_draft(&self) -> LeaseDraft {
        LeaseDraft {
            parties: self.parties.clone(),
            term_start: self.term.start,
            term_end: self.term.end,
            notice_period_months: self.term.notice_period_months,
            rent: self.rent,
            escalations: self.escalations.steps().to_vec(),
            security_deposit: self.security_deposit,
            currency: self.currency,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaseStatusView {
    pub lease_id: LeaseId,
    pub status: &'static str,
    pub rent_model: &'static str,
    pub term_start: NaiveDate,
    pub term_end: NaiveDate,
    pub tenure_months: u32,
    pub schedule_version: u32,
    pub version: u64,
}

/// Incoming lease submission before validation has shaped it into a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaseDraft {
    pub parties: LeaseParties,
    pub term_start: NaiveDate,
    pub term_end: NaiveDate,
    #[serde(default)]
    pub notice_period_months: u8,
    pub rent: RentModel,
    #[serde(default)]
    pub escalations: Vec<EscalationStep>,
    pub security_deposit: Money,
    pub currency: CurrencyCode,
}

/// Partial update to a draft lease. Absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeasePatch {
    pub parties: Option<LeaseParties>,
    pub term_start: Option<NaiveDate>,
    pub term_end: Option<NaiveDate>,
    pub notice_period_months: Option<u8>,
    pub rent: Option<RentModel>,
    pub escalations: Option<Vec<EscalationStep>>,
    pub security_deposit: Option<Money>,
    pub currency: Option<CurrencyCode>,
}

impl LeasePatch {
    pub fn apply_to(&self, base: &LeaseDraft) -> LeaseDraft {
        LeaseDraft {
            parties: self.parties.clone().unwrap_or_else(|| base.parties.clone()),
            term_start: self.term_start.unwrap_or(base.term_start),
            term_end: self.term_end.unwrap_or(base.term_end),
            notice_period_months: self
                .notice_period_months
                .unwrap_or(base.notice_period_months),
            rent: self.rent.unwrap_or(base.rent),
            escalations: self
                .escalations
                .clone()
                .unwrap_or_else(|| base.escalations.clone()),
            security_deposit: self.security_deposit.unwrap_or(base.security_deposit),
            currency: self.currency.unwrap_or(base.currency),
        }
    }
}

/// Reported tenant revenue for a period, keyed by basis.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RevenueFigures {
    pub net_sales: Option<Money>,
    pub gross_sales: Option<Money>,
}

impl RevenueFigures {
    pub fn for_basis(&self, basis: RevenueBasis) -> Option<Money> {
        match basis {
            RevenueBasis::NetSales => self.net_sales,
            RevenueBasis::GrossSales => self.gross_sales,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.net_sales.is_none() && self.gross_sales.is_none()
    }
}
