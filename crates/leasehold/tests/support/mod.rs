#![allow(dead_code)]

use chrono::NaiveDate;
use leasehold::workflows::leasing::{
    AuditEntry, AuditError, AuditFilter, AuditSource, AuditTrail, CurrencyCode, LeaseDraft,
    LeaseId, LeaseParties, LeaseRecord, LeaseRepository, LeaseService, Money, RentModel,
    RepositoryError,
};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub fn dec(value: &str) -> Decimal {
    value.parse().expect("valid decimal")
}

pub fn money(value: &str) -> Money {
    Money(dec(value))
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub fn standard_draft() -> LeaseDraft {
    LeaseDraft {
        parties: LeaseParties {
            project_id: "proj-harbor".to_string(),
            unit_id: "unit-112".to_string(),
            owner_id: "owner-52".to_string(),
            tenant_id: "tenant-bookshop".to_string(),
        },
        term_start: date(2024, 1, 1),
        term_end: date(2026, 12, 31),
        notice_period_months: 3,
        rent: RentModel::Fixed {
            monthly_rent: money("50000"),
        },
        escalations: Vec::new(),
        security_deposit: money("100000"),
        currency: CurrencyCode::Usd,
    }
}

pub fn build_service() -> LeaseService<MemoryLeaseStore> {
    LeaseService::new(Arc::new(MemoryLeaseStore::default()))
}

pub fn active_lease(service: &LeaseService<MemoryLeaseStore>, draft: LeaseDraft) -> LeaseRecord {
    let created = service
        .create_draft(draft, &AuditSource::system())
        .expect("draft created");
    service
        .submit_for_review(&created.id, &AuditSource::system())
        .expect("submitted");
    service
        .approve(&created.id, None, &AuditSource::system())
        .expect("approved")
}

#[derive(Default)]
pub struct MemoryLeaseStore {
    state: Mutex<StoreState>,
}

#[derive(Default)]
struct StoreState {
    leases: HashMap<LeaseId, LeaseRecord>,
    entries: Vec<AuditEntry>,
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
