use rust_decimal::Decimal;

/// Reconciles the candidate amounts a rent model produces into the single
/// figure owed for the period.
pub trait BlendStrategy: Send + Sync {
    fn blend(
        &self,
        fixed: Option<Decimal>,
        guarantee: Option<Decimal>,
        revenue_share: Decimal,
    ) -> Decimal;
}

/// The tenant owes the revenue share, but never less than the fixed rent or
/// the minimum guarantee.
#[derive(Debug, Clone, Copy, Default)]
pub struct GuaranteeFloor;

impl BlendStrategy for GuaranteeFloor {
    fn blend(
        &self,
        fixed: Option<Decimal>,
        guarantee: Option<Decimal>,
        revenue_share: Decimal,
    ) -> Decimal {
        let mut owed = revenue_share;
        if let Some(fixed) = fixed {
            owed = owed.max(fixed);
        }
        if let Some(guarantee) = guarantee {
            owed = owed.max(guarantee);
        }
        owed
    }
}
