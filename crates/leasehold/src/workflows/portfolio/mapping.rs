use super::parser::PortfolioRow;
use crate::workflows::leasing::domain::{
    CurrencyCode, EscalationKind, EscalationStep, LeaseDraft, LeaseParties, Money, RentModel,
    RevenueBasis, SharePercentage, ShareOutOfRange,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;

#[derive(Debug, thiserror::Error)]
pub(crate) enum RowError {
    #[error("column {0} is required")]
    MissingColumn(&'static str),
    #[error("column {column} does not hold a date (found {value})")]
    InvalidDate { column: &'static str, value: String },
    #[error("column {column} does not hold a number (found {value})")]
    InvalidNumber { column: &'static str, value: String },
    #[error("unknown rent model {0:?}")]
    UnknownRentModel(String),
    #[error("unknown currency {0:?}")]
    UnknownCurrency(String),
    #[error("unknown revenue basis {0:?}")]
    UnknownBasis(String),
    #[error(transparent)]
    Share(#[from] ShareOutOfRange),
}

pub(crate) fn draft_from_row(row: &PortfolioRow) -> Result<LeaseDraft, RowError> {
    let term_start = parse_date("Lease Start", row.lease_start.as_deref())?;
    let term_end = parse_date("Lease End", row.lease_end.as_deref())?;
    let notice_period_months = match row.notice_months.as_deref() {
        Some(value) => value.parse::<u8>().map_err(|_| RowError::InvalidNumber {
            column: "Notice Months",
            value: value.to_string(),
        })?,
        None => 0,
    };
    let currency = parse_currency(&row.currency)?;
    let rent = parse_rent_model(row)?;
    let security_deposit = match row.security_deposit.as_deref() {
        Some(value) => Money(parse_decimal("Security Deposit", value)?),
        None => Money(Decimal::ZERO),
    };
    let escalations = parse_escalation(row)?;

    Ok(LeaseDraft {
        parties: LeaseParties {
            project_id: row.project_id.clone(),
            unit_id: row.unit_id.clone(),
            owner_id: row.owner_id.clone(),
            tenant_id: row.tenant_id.clone(),
        },
        term_start,
        term_end,
        notice_period_months,
        rent,
        escalations,
        security_deposit,
        currency,
    })
}

fn parse_rent_model(row: &PortfolioRow) -> Result<RentModel, RowError> {
    let normalized = row
        .rent_model
        .trim()
        .to_ascii_lowercase()
        .replace([' ', '-'], "_");
    match normalized.as_str() {
        "fixed" => Ok(RentModel::Fixed {
            monthly_rent: required_money("Monthly Rent", row.monthly_rent.as_deref())?,
        }),
        "revenue_share" => Ok(RentModel::RevenueShare {
            minimum_guarantee: optional_money(
                "Minimum Guarantee",
                row.minimum_guarantee.as_deref(),
            )?,
            share: required_share(row)?,
            basis: parse_basis(row.revenue_basis.as_deref())?,
        }),
        "hybrid" => Ok(RentModel::Hybrid {
            monthly_rent: required_money("Monthly Rent", row.monthly_rent.as_deref())?,
            minimum_guarantee: optional_money(
                "Minimum Guarantee",
                row.minimum_guarantee.as_deref(),
            )?,
            share: required_share(row)?,
            basis: parse_basis(row.revenue_basis.as_deref())?,
        }),
        _ => Err(RowError::UnknownRentModel(row.rent_model.clone())),
    }
}

fn required_share(row: &PortfolioRow) -> Result<SharePercentage, RowError> {
    let value = row
        .share_percent
        .as_deref()
        .ok_or(RowError::MissingColumn("Share Percent"))?;
    Ok(SharePercentage::new(parse_decimal("Share Percent", value)?)?)
}

// Sheets from older templates leave the basis blank; net sales is the
// portfolio-wide convention there.
fn parse_basis(value: Option<&str>) -> Result<RevenueBasis, RowError> {
    let value = match value {
        Some(value) => value,
        None => return Ok(RevenueBasis::NetSales),
    };
    let normalized = value.trim().to_ascii_lowercase().replace([' ', '-'], "_");
    match normalized.as_str() {
        "net" | "net_sales" => Ok(RevenueBasis::NetSales),
        "gross" | "gross_sales" => Ok(RevenueBasis::GrossSales),
        _ => Err(RowError::UnknownBasis(value.to_string())),
    }
}

fn parse_currency(value: &str) -> Result<CurrencyCode, RowError> {
    match value.trim().to_ascii_uppercase().as_str() {
        "USD" => Ok(CurrencyCode::Usd),
        "EUR" => Ok(CurrencyCode::Eur),
        "GBP" => Ok(CurrencyCode::Gbp),
        "INR" => Ok(CurrencyCode::Inr),
        "JPY" => Ok(CurrencyCode::Jpy),
        "KWD" => Ok(CurrencyCode::Kwd),
        _ => Err(RowError::UnknownCurrency(value.to_string())),
    }
}

fn parse_escalation(row: &PortfolioRow) -> Result<Vec<EscalationStep>, RowError> {
    let date = match row.escalation_date.as_deref() {
        Some(date) => date,
        None => return Ok(Vec::new()),
    };
    let effective_from = parse_date_value("Escalation Date", date)?;

    let kind = if let Some(percent) = row.escalation_percent.as_deref() {
        EscalationKind::Percentage(parse_decimal("Escalation Percent", percent)?)
    } else if let Some(amount) = row.escalation_amount.as_deref() {
        EscalationKind::FixedAmount(parse_decimal("Escalation Amount", amount)?)
    } else {
        return Err(RowError::MissingColumn("Escalation Percent"));
    };

    Ok(vec![EscalationStep {
        effective_from,
        effective_to: None,
        kind,
    }])
}

fn required_money(column: &'static str, value: Option<&str>) -> Result<Money, RowError> {
    let value = value.ok_or(RowError::MissingColumn(column))?;
    Ok(Money(parse_decimal(column, value)?))
}

fn optional_money(column: &'static str, value: Option<&str>) -> Result<Option<Money>, RowError> {
    value
        .map(|value| parse_decimal(column, value).map(Money))
        .transpose()
}

fn parse_date(column: &'static str, value: Option<&str>) -> Result<NaiveDate, RowError> {
    let value = value.ok_or(RowError::MissingColumn(column))?;
    parse_date_value(column, value)
}

fn parse_date_value(column: &'static str, value: &str) -> Result<NaiveDate, RowError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| RowError::InvalidDate {
        column,
        value: value.to_string(),
    })
}

fn parse_decimal(column: &'static str, value: &str) -> Result<Decimal, RowError> {
    value
        .parse::<Decimal>()
        .map_err(|_| RowError::InvalidNumber {
            column,
            value: value.to_string(),
        })
}
