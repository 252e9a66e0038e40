use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::workflows::leasing::audit::{
    AuditEntry, AuditError, AuditFilter, AuditSource, AuditTrail,
};
use crate::workflows::leasing::domain::{
    CurrencyCode, EscalationKind, EscalationStep, LeaseDraft, LeaseId, LeaseParties, LeaseRecord,
    Money, RentModel, RevenueBasis, SharePercentage,
};
use crate::workflows::leasing::repository::{Clock, LeaseRepository, RepositoryError};
use crate::workflows::leasing::router::lease_router;
use crate::workflows::leasing::service::LeaseService;

pub(super) fn dec(value: &str) -> Decimal {
    value.parse().expect("valid decimal")
}

pub(super) fn money(value: &str) -> Money {
    Money(dec(value))
}

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn share(value: &str) -> SharePercentage {
    SharePercentage::new(dec(value)).expect("valid share")
}

pub(super) fn parties() -> LeaseParties {
    LeaseParties {
        project_id: "proj-marina".to_string(),
        unit_id: "unit-204".to_string(),
        owner_id: "owner-17".to_string(),
        tenant_id: "tenant-coffeeco".to_string(),
    }
}

pub(super) fn percentage_step(
    effective_from: NaiveDate,
    effective_to: Option<NaiveDate>,
    percent: &str,
) -> EscalationStep {
    EscalationStep {
        effective_from,
        effective_to,
        kind: EscalationKind::Percentage(dec(percent)),
    }
}

pub(super) fn amount_step(
    effective_from: NaiveDate,
    effective_to: Option<NaiveDate>,
    amount: &str,
) -> EscalationStep {
    EscalationStep {
        effective_from,
        effective_to,
        kind: EscalationKind::FixedAmount(dec(amount)),
    }
}

pub(super) fn fixed_draft() -> LeaseDraft {
    LeaseDraft {
        parties: parties(),
        term_start: date(2024, 1, 1),
        term_end: date(2026, 12, 31),
        notice_period_months: 3,
        rent: RentModel::Fixed {
            monthly_rent: money("50000"),
        },
        escalations: vec![percentage_step(date(2025, 1, 1), None, "10")],
        security_deposit: money("100000"),
        currency: CurrencyCode::Usd,
    }
}

pub(super) fn revenue_share_draft() -> LeaseDraft {
    LeaseDraft {
        parties: parties(),
        term_start: date(2024, 1, 1),
        term_end: date(2026, 12, 31),
        notice_period_months: 3,
        rent: RentModel::RevenueShare {
            minimum_guarantee: Some(money("20000")),
            share: share("7"),
            basis: RevenueBasis::NetSales,
        },
        escalations: Vec::new(),
        security_deposit: money("40000"),
        currency: CurrencyCode::Usd,
    }
}

pub(super) fn hybrid_draft() -> LeaseDraft {
    LeaseDraft {
        parties: parties(),
        term_start: date(2024, 1, 1),
        term_end: date(2026, 12, 31),
        notice_period_months: 3,
        rent: RentModel::Hybrid {
            monthly_rent: money("30000"),
            minimum_guarantee: Some(money("40000")),
            share: share("5"),
            basis: RevenueBasis::NetSales,
        },
        escalations: Vec::new(),
        security_deposit: money("60000"),
        currency: CurrencyCode::Usd,
    }
}

pub(super) struct FixedClock(pub(super) DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub(super) fn fixed_clock() -> Arc<FixedClock> {
    let now = Utc
        .with_ymd_and_hms(2024, 6, 15, 9, 30, 0)
        .single()
        .expect("valid timestamp");
    Arc::new(FixedClock(now))
}

pub(super) fn build_service() -> (LeaseService<MemoryLeaseStore>, Arc<MemoryLeaseStore>) {
    let store = Arc::new(MemoryLeaseStore::default());
    let service = LeaseService::with_clock(store.clone(), fixed_clock());
    (service, store)
}

pub(super) fn system_source() -> AuditSource {
    AuditSource::system()
}

pub(super) fn active_lease(
    service: &LeaseService<MemoryLeaseStore>,
    draft: LeaseDraft,
) -> LeaseRecord {
    let created = service
        .create_draft(draft, &system_source())
        .expect("draft created");
    service
        .submit_for_review(&created.id, &system_source())
        .expect("submitted");
    service
        .approve(&created.id, None, &system_source())
        .expect("approved")
}

pub(super) fn router_with_service(service: LeaseService<MemoryLeaseStore>) -> axum::Router {
    lease_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

#[derive(Default)]
pub(super) struct MemoryLeaseStore {
    state: Mutex<StoreState>,
}

#[derive(Default)]
struct StoreState {
    leases: HashMap<LeaseId, LeaseRecord>,
    entries: Vec<AuditEntry>,
}

impl MemoryLeaseStore {
    pub(super) fn entries(&self) -> Vec<AuditEntry> {
        self.state.lock().expect("store mutex poisoned").entries.clone()
    }
}

impl LeaseRepository for MemoryLeaseStore {
    fn insert(&self, record: LeaseRecord, entry: AuditEntry) -> Result<LeaseRecord, RepositoryError> {
        let mut state = self.state.lock().expect("store mutex poisoned");
        if state.leases.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        state.leases.insert(record.id.clone(), record.clone());
        state.entries.push(entry);
        Ok(record)
    }

    fn fetch(&self, lease_id: &LeaseId) -> Result<Option<LeaseRecord>, RepositoryError> {
        let state = self.state.lock().expect("store mutex poisoned");
        Ok(state.leases.get(lease_id).cloned())
    }

    fn commit(
        &self,
        record: LeaseRecord,
        expected_version: u64,
        entry: AuditEntry,
    ) -> Result<LeaseRecord, RepositoryError> {
        let mut state = self.state.lock().expect("store mutex poisoned");
        let stored = state
            .leases
            .get(&record.id)
            .ok_or(RepositoryError::NotFound)?;
        if stored.version != expected_version {
            return Err(RepositoryError::VersionConflict {
                expected: expected_version,
                found: stored.version,
            });
        }
        state.leases.insert(record.id.clone(), record.clone());
        state.entries.push(entry);
        Ok(record)
    }
}

impl AuditTrail for MemoryLeaseStore {
    fn by_lease(&self, lease_id: &LeaseId) -> Result<Vec<AuditEntry>, AuditError> {
        let state = self.state.lock().expect("store mutex poisoned");
        let mut entries: Vec<AuditEntry> = state
            .entries
            .iter()
            .filter(|entry| entry.lease_id == *lease_id)
            .cloned()
            .collect();
        entries.sort_by_key(|entry| entry.recorded_at);
        Ok(entries)
    }

    fn recent(&self, limit: usize, filter: &AuditFilter) -> Result<Vec<AuditEntry>, AuditError> {
        let state = self.state.lock().expect("store mutex poisoned");
        let mut entries: Vec<AuditEntry> = state
            .entries
            .iter()
            .filter(|entry| filter.matches(entry))
            .cloned()
            .collect();
        entries.reverse();
        entries.truncate(limit);
        Ok(entries)
    }
}

pub(super) struct UnavailableStore;

impl LeaseRepository for UnavailableStore {
    fn insert(
        &self,
        _record: LeaseRecord,
        _entry: AuditEntry,
    ) -> Result<LeaseRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _lease_id: &LeaseId) -> Result<Option<LeaseRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn commit(
        &self,
        _record: LeaseRecord,
        _expected_version: u64,
        _entry: AuditEntry,
    ) -> Result<LeaseRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

impl AuditTrail for UnavailableStore {
    fn by_lease(&self, _lease_id: &LeaseId) -> Result<Vec<AuditEntry>, AuditError> {
        Err(AuditError::Unavailable("database offline".to_string()))
    }

    fn recent(&self, _limit: usize, _filter: &AuditFilter) -> Result<Vec<AuditEntry>, AuditError> {
        Err(AuditError::Unavailable("database offline".to_string()))
    }
}
