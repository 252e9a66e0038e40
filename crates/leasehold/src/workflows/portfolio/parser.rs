use serde::{Deserialize, Deserializer};
use std::io::Read;

/// One row of the onboarding sheet, untouched beyond whitespace trimming.
/// Interpretation happens in the mapping layer.
#[derive(Debug, Deserialize)]
pub(crate) struct PortfolioRow {
    #[serde(rename = "Project ID")]
    pub(crate) project_id: String,
    #[serde(rename = "Unit ID")]
    pub(crate) unit_id: String,
    #[serde(rename = "Owner ID")]
    pub(crate) owner_id: String,
    #[serde(rename = "Tenant ID")]
    pub(crate) tenant_id: String,
    #[serde(
        rename = "Lease Start",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) lease_start: Option<String>,
    #[serde(
        rename = "Lease End",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) lease_end: Option<String>,
    #[serde(
        rename = "Notice Months",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) notice_months: Option<String>,
    #[serde(rename = "Currency")]
    pub(crate) currency: String,
    #[serde(rename = "Rent Model")]
    pub(crate) rent_model: String,
    #[serde(
        rename = "Monthly Rent",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) monthly_rent: Option<String>,
    #[serde(
        rename = "Minimum Guarantee",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) minimum_guarantee: Option<String>,
    #[serde(
        rename = "Share Percent",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) share_percent: Option<String>,
    #[serde(
        rename = "Revenue Basis",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) revenue_basis: Option<String>,
    #[serde(
        rename = "Security Deposit",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) security_deposit: Option<String>,
    #[serde(
        rename = "Escalation Date",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) escalation_date: Option<String>,
    #[serde(
        rename = "Escalation Percent",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) escalation_percent: Option<String>,
    #[serde(
        rename = "Escalation Amount",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) escalation_amount: Option<String>,
}

/// Reads the whole sheet, keeping per-row failures recoverable. A broken
/// header fails the call; a broken row only fails that row.
pub(crate) fn parse_rows<R: Read>(
    reader: R,
) -> Result<Vec<Result<PortfolioRow, csv::Error>>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    csv_reader.headers()?;
    Ok(csv_reader.deserialize::<PortfolioRow>().collect())
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
