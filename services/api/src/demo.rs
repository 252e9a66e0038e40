use crate::infra::InMemoryLeaseStore;
use chrono::{Datelike, Local, NaiveDate};
use clap::Args;
use leasehold::error::AppError;
use leasehold::workflows::leasing::{
    ActorId, AuditSource, CurrencyCode, EscalationKind, EscalationStep, LeaseDraft, LeaseParties,
    LeaseService, Money, RentModel, RevenueBasis, RevenueFigures, SharePercentage, ShareOutOfRange,
};
use leasehold::workflows::portfolio::PortfolioImporter;
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Lease commencement date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) term_start: Option<NaiveDate>,
    /// Lease expiry date (YYYY-MM-DD). Defaults to three years after the start.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) term_end: Option<NaiveDate>,
    /// Optional portfolio CSV export to onboard before the walkthrough.
    #[arg(long)]
    pub(crate) portfolio_csv: Option<PathBuf>,
    /// Skip the renewal portion of the demo.
    #[arg(long)]
    pub(crate) skip_renewal: bool,
}

#[derive(Args, Debug)]
pub(crate) struct PortfolioImportArgs {
    /// Path to the portfolio CSV export
    pub(crate) path: PathBuf,
    /// Actor recorded on the audit trail for each created draft
    #[arg(long, default_value = "ops-import")]
    pub(crate) actor: String,
}

pub(crate) fn run_portfolio_import(args: PortfolioImportArgs) -> Result<(), AppError> {
    let PortfolioImportArgs { path, actor } = args;

    let store = Arc::new(InMemoryLeaseStore::default());
    let service = LeaseService::new(store);
    let source = AuditSource::actor(ActorId(actor));

    let summary = PortfolioImporter::from_path(path, &service, &source)?;

    println!("Portfolio import (transient store)");
    println!("- {} draft(s) created", summary.created.len());
    for lease_id in &summary.created {
        println!("  - {}", lease_id);
    }
    if summary.failures.is_empty() {
        println!("- No rows rejected");
    } else {
        println!("- {} row(s) rejected", summary.failures.len());
        for failure in &summary.failures {
            println!("  - line {}: {}", failure.line, failure.reason);
        }
    }

    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        term_start,
        term_end,
        portfolio_csv,
        skip_renewal,
    } = args;

    let term_start = term_start.unwrap_or_else(|| Local::now().date_naive());
    let term_end = term_end.unwrap_or(term_start + chrono::Duration::days(365 * 3));

    println!("Lease lifecycle demo");
    println!("Lease term: {} -> {}", term_start, term_end);

    let store = Arc::new(InMemoryLeaseStore::default());
    let service = LeaseService::new(store);
    let source = AuditSource::actor(ActorId("demo-operator".to_string()));

    if let Some(path) = portfolio_csv {
        let summary = PortfolioImporter::from_path(path, &service, &source)?;
        println!("\nPortfolio onboarding");
        println!("- {} draft(s) created", summary.created.len());
        for failure in &summary.failures {
            println!("- line {} skipped: {}", failure.line, failure.reason);
        }
    }

    println!("\nDraft intake");
    let draft = match demo_draft(term_start, term_end) {
        Ok(draft) => draft,
        Err(err) => {
            println!("  Demo draft invalid: {}", err);
            return Ok(());
        }
    };
    let record = match service.create_draft(draft, &source) {
        Ok(record) => record,
        Err(err) => {
            println!("  Draft rejected: {}", err);
            return Ok(());
        }
    };
    println!("- Created {} -> status {}", record.id, record.status.label());

    println!("\nReview");
    let submitted = match service.submit_for_review(&record.id, &source) {
        Ok(record) => record,
        Err(err) => {
            println!("  Submission refused: {}", err);
            return Ok(());
        }
    };
    println!("- Submitted for review (version {})", submitted.version);

    let approved = match service.approve(
        &record.id,
        Some("demo walkthrough approval".to_string()),
        &source,
    ) {
        Ok(record) => record,
        Err(err) => {
            println!("  Approval refused: {}", err);
            return Ok(());
        }
    };
    println!(
        "- Approved -> status {} (version {})",
        approved.status.label(),
        approved.version
    );
    match serde_json::to_string_pretty(&approved.status_view()) {
        Ok(json) => println!("  Status payload:\n{}", json),
        Err(err) => println!("  Status payload unavailable: {}", err),
    }

    println!("\nRent queries");
    let first_year = term_start + chrono::Duration::days(30);
    let second_year = term_start + chrono::Duration::days(400);
    let revenue = RevenueFigures {
        net_sales: Some(Money(Decimal::from(900_000u32))),
        gross_sales: None,
    };
    match service.obligation(&record.id, first_year, Some(&revenue)) {
        Ok(amount) => println!("- Obligation on {}: {}", first_year, amount),
        Err(err) => println!("- Obligation on {} unavailable: {}", first_year, err),
    }
    match service.obligation(&record.id, second_year, Some(&revenue)) {
        Ok(amount) => println!("- Obligation on {} (escalated): {}", second_year, amount),
        Err(err) => println!("- Obligation on {} unavailable: {}", second_year, err),
    }
    match service.guaranteed_floor(&record.id, first_year) {
        Ok(floor) => println!("- Guaranteed floor on {}: {}", first_year, floor),
        Err(err) => println!("- Guaranteed floor unavailable: {}", err),
    }
    match service.invoice_for_month(
        &record.id,
        term_start.year(),
        term_start.month(),
        Some(&revenue),
    ) {
        Ok(amount) => println!(
            "- Invoice for {}-{:02}: {}",
            term_start.year(),
            term_start.month(),
            amount
        ),
        Err(err) => println!("- Invoice unavailable: {}", err),
    }

    println!("\nSchedule amendment");
    let steps = vec![
        EscalationStep {
            effective_from: term_start + chrono::Duration::days(365),
            effective_to: Some(term_start + chrono::Duration::days(730)),
            kind: EscalationKind::Percentage(Decimal::from(4u32)),
        },
        EscalationStep {
            effective_from: term_start + chrono::Duration::days(730),
            effective_to: None,
            kind: EscalationKind::Percentage(Decimal::from(7u32)),
        },
    ];
    match service.amend_escalations(&record.id, steps, &source) {
        Ok(record) => println!(
            "- Schedule amended (schedule version {})",
            record.schedule_version
        ),
        Err(err) => println!("- Amendment refused: {}", err),
    }

    if !skip_renewal {
        println!("\nRenewal");
        let renewal_start = term_end + chrono::Duration::days(1);
        let renewal_end = renewal_start + chrono::Duration::days(365 * 2);
        match service.renew(&record.id, renewal_start, renewal_end, &source) {
            Ok(outcome) => {
                println!(
                    "- {} -> status {}",
                    outcome.renewed.id,
                    outcome.renewed.status.label()
                );
                println!(
                    "- Successor {} -> status {}",
                    outcome.successor.id,
                    outcome.successor.status.label()
                );
            }
            Err(err) => println!("  Renewal refused: {}", err),
        }
    }

    println!("\nAudit trail");
    match service.audit_trail(&record.id) {
        Ok(entries) => {
            for entry in entries {
                println!(
                    "- {} {} {}",
                    entry.recorded_at,
                    entry.actor,
                    entry.action.label()
                );
            }
        }
        Err(err) => println!("  Trail unavailable: {}", err),
    }

    Ok(())
}

fn demo_draft(term_start: NaiveDate, term_end: NaiveDate) -> Result<LeaseDraft, ShareOutOfRange> {
    let share = SharePercentage::new(Decimal::from(6u32))?;

    Ok(LeaseDraft {
        parties: LeaseParties {
            project_id: "proj-waterfront".to_string(),
            unit_id: "unit-18".to_string(),
            owner_id: "owner-3".to_string(),
            tenant_id: "tenant-outfitters".to_string(),
        },
        term_start,
        term_end,
        notice_period_months: 3,
        rent: RentModel::Hybrid {
            monthly_rent: Money(Decimal::from(30_000u32)),
            minimum_guarantee: Some(Money(Decimal::from(40_000u32))),
            share,
            basis: RevenueBasis::NetSales,
        },
        escalations: vec![EscalationStep {
            effective_from: term_start + chrono::Duration::days(365),
            effective_to: None,
            kind: EscalationKind::Percentage(Decimal::from(4u32)),
        }],
        security_deposit: Money(Decimal::from(60_000u32)),
        currency: CurrencyCode::Usd,
    })
}
