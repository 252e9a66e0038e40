mod support;

use chrono::{Duration, NaiveDate, Utc};
use leasehold::workflows::leasing::{
    AuditSource, CurrencyCode, EscalationKind, EscalationSchedule, EscalationStep, LeaseId,
    LeaseParties, LeaseRecord, LeaseStatus, LeaseTerm, Money, RentCalculator, RentModel,
    RevenueBasis, RevenueFigures, SharePercentage, Violation,
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use support::{build_service, date, money, standard_draft};

fn long_term() -> LeaseTerm {
    LeaseTerm::new(date(2020, 1, 1), date(2020, 1, 1) + Duration::days(3000), 3)
        .expect("valid term")
}

fn active_record(term: LeaseTerm, rent: RentModel, steps: Vec<EscalationStep>) -> LeaseRecord {
    let escalations = EscalationSchedule::new(steps, &term).expect("valid schedule");
    let now = Utc::now();
    LeaseRecord {
        id: LeaseId("lease-fixture".to_string()),
        parties: LeaseParties {
            project_id: "proj-harbor".to_string(),
            unit_id: "unit-112".to_string(),
            owner_id: "owner-52".to_string(),
            tenant_id: "tenant-bookshop".to_string(),
        },
        term,
        rent,
        escalations,
        schedule_version: 1,
        status: LeaseStatus::Active,
        security_deposit: money("0"),
        currency: CurrencyCode::Usd,
        version: 0,
        created_at: now,
        updated_at: now,
    }
}

// Two percentage steps with disjoint windows somewhere in the first thousand
// days of the term.
fn two_disjoint_steps() -> impl Strategy<Value = (EscalationStep, EscalationStep)> {
    (
        1i64..600,
        1i64..=200,
        0i64..200,
        1i64..=200,
        1u32..=50,
        1u32..=50,
    )
        .prop_map(
            |(first_start, first_len, gap, second_len, first_pct, second_pct)| {
                let term_start = date(2020, 1, 1);
                let first_from = term_start + Duration::days(first_start);
                let first_to = first_from + Duration::days(first_len);
                let second_from = first_to + Duration::days(gap);
                let second_to = second_from + Duration::days(second_len);
                (
                    EscalationStep {
                        effective_from: first_from,
                        effective_to: Some(first_to),
                        kind: EscalationKind::Percentage(Decimal::from(first_pct)),
                    },
                    EscalationStep {
                        effective_from: second_from,
                        effective_to: Some(second_to),
                        kind: EscalationKind::Percentage(Decimal::from(second_pct)),
                    },
                )
            },
        )
}

// A pair whose second window opens inside the first, so every draw collides.
fn overlapping_steps() -> impl Strategy<Value = (EscalationStep, EscalationStep)> {
    (1i64..600, 2i64..=200, 1i64..=200, 1u32..=50, 1u32..=50).prop_flat_map(
        |(first_start, first_len, second_len, first_pct, second_pct)| {
            (0..first_len).prop_map(move |intrusion| {
                let term_start = date(2020, 1, 1);
                let first_from = term_start + Duration::days(first_start);
                let first_to = first_from + Duration::days(first_len);
                let second_from = first_from + Duration::days(intrusion);
                let second_to = second_from + Duration::days(second_len);
                (
                    EscalationStep {
                        effective_from: first_from,
                        effective_to: Some(first_to),
                        kind: EscalationKind::Percentage(Decimal::from(first_pct)),
                    },
                    EscalationStep {
                        effective_from: second_from,
                        effective_to: Some(second_to),
                        kind: EscalationKind::Percentage(Decimal::from(second_pct)),
                    },
                )
            })
        },
    )
}

proptest! {
    #[test]
    fn disjoint_schedules_always_validate((first, second) in two_disjoint_steps()) {
        let service = build_service();
        let mut draft = standard_draft();
        draft.term_start = date(2020, 1, 1);
        draft.term_end = date(2020, 1, 1) + Duration::days(3000);
        // Deliberately out of order; storage orders the schedule.
        draft.escalations = vec![second, first];

        let record = service
            .create_draft(draft, &AuditSource::system())
            .expect("disjoint steps validate");
        prop_assert_eq!(
            record.escalations.steps()[0].effective_from,
            first.effective_from
        );
        prop_assert_eq!(
            record.escalations.steps()[1].effective_from,
            second.effective_from
        );
    }

    #[test]
    fn overlapping_windows_never_validate((first, second) in overlapping_steps()) {
        let err = EscalationSchedule::new(vec![first, second], &long_term())
            .expect_err("colliding windows must be refused");
        prop_assert!(
            err.violations
                .iter()
                .any(|violation| matches!(violation, Violation::OverlappingSteps { .. })),
            "expected an OverlappingSteps violation"
        );
    }

    #[test]
    fn a_fully_active_month_invoices_the_first_days_obligation(
        (first, second) in two_disjoint_steps(),
        month_offset in 1i64..94,
        rent_cents in 1_000i64..50_000_000,
    ) {
        let rent = RentModel::Fixed {
            monthly_rent: Money(Decimal::new(rent_cents, 2)),
        };
        let lease = active_record(long_term(), rent, vec![first, second]);
        let calculator = RentCalculator::default();

        let year = 2020 + (month_offset / 12) as i32;
        let month = (month_offset % 12) as u32 + 1;
        let first_day = NaiveDate::from_ymd_opt(year, month, 1).expect("valid month");

        let invoice = calculator
            .invoice_for_month(&lease, year, month, None)
            .expect("invoice");
        let obligation = calculator
            .obligation(&lease, first_day, None)
            .expect("obligation");
        prop_assert_eq!(invoice, obligation);
    }

    #[test]
    fn share_obligations_settle_on_the_minor_unit(
        sales_cents in 1i64..=10_000_000_000,
        share_tenths in 1i64..=1000,
    ) {
        let rent = RentModel::RevenueShare {
            minimum_guarantee: None,
            share: SharePercentage::new(Decimal::new(share_tenths, 1))
                .expect("share in range"),
            basis: RevenueBasis::NetSales,
        };
        let lease = active_record(long_term(), rent, Vec::new());
        let revenue = RevenueFigures {
            net_sales: Some(Money(Decimal::new(sales_cents, 2))),
            gross_sales: None,
        };

        let amount = RentCalculator::default()
            .obligation(&lease, date(2021, 6, 1), Some(&revenue))
            .expect("amount");
        prop_assert!(amount.0.scale() <= 2);
        prop_assert!(amount.0 >= Decimal::ZERO);
    }

    #[test]
    fn step_order_in_storage_never_changes_the_amount(
        (first, second) in two_disjoint_steps(),
        probe_days in 0i64..3000,
    ) {
        let as_of = date(2020, 1, 1) + Duration::days(probe_days);
        let rent = RentModel::Fixed {
            monthly_rent: money("50000"),
        };
        let ordered = active_record(long_term(), rent, vec![first, second]);
        let reversed = active_record(long_term(), rent, vec![second, first]);
        let calculator = RentCalculator::default();

        prop_assert_eq!(
            calculator.obligation(&ordered, as_of, None).expect("amount"),
            calculator.obligation(&reversed, as_of, None).expect("amount")
        );
    }

    #[test]
    fn a_partial_month_never_exceeds_the_full_rate(
        start_day in 2u32..=28,
        rent_cents in 1_000i64..50_000_000,
    ) {
        let term = LeaseTerm::new(date(2020, 1, start_day), date(2024, 12, 31), 0)
            .expect("valid term");
        let rent = RentModel::Fixed {
            monthly_rent: Money(Decimal::new(rent_cents, 2)),
        };
        let lease = active_record(term, rent, Vec::new());
        let calculator = RentCalculator::default();

        let invoice = calculator
            .invoice_for_month(&lease, 2020, 1, None)
            .expect("invoice");
        let monthly = calculator
            .obligation(&lease, date(2020, 1, start_day), None)
            .expect("monthly");
        prop_assert!(invoice <= monthly);
        prop_assert!(invoice.0 > Decimal::ZERO);
    }
}
