use chrono::NaiveDate;
use leasehold::workflows::leasing::{
    AuditEntry, AuditError, AuditFilter, AuditTrail, LeaseId, LeaseRecord, LeaseRepository,
    RepositoryError,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
struct StoreState {
    leases: HashMap<LeaseId, LeaseRecord>,
    entries: Vec<AuditEntry>,
}

/// Lease storage for a single-process deployment. Records and their audit
/// entries share one lock, so a write lands together with its trail entry
/// or not at all.
#[derive(Default, Clone)]
pub(crate) struct InMemoryLeaseStore {
    state: Arc<Mutex<StoreState>>,
}

impl LeaseRepository for InMemoryLeaseStore {
    fn insert(
        &self,
        record: LeaseRecord,
        entry: AuditEntry,
    ) -> Result<LeaseRecord, RepositoryError> {
        let mut guard = self.state.lock().expect("repository mutex poisoned");
        if guard.leases.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.leases.insert(record.id.clone(), record.clone());
        guard.entries.push(entry);
        Ok(record)
    }

    fn fetch(&self, lease_id: &LeaseId) -> Result<Option<LeaseRecord>, RepositoryError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard.leases.get(lease_id).cloned())
    }

    fn commit(
        &self,
        record: LeaseRecord,
        expected_version: u64,
        entry: AuditEntry,
    ) -> Result<LeaseRecord, RepositoryError> {
        let mut guard = self.state.lock().expect("repository mutex poisoned");
        let stored = guard
            .leases
            .get(&record.id)
            .ok_or(RepositoryError::NotFound)?;
        if stored.version != expected_version {
            return Err(RepositoryError::VersionConflict {
                expected: expected_version,
                found: stored.version,
            });
        }
        guard.leases.insert(record.id.clone(), record.clone());
        guard.entries.push(entry);
        Ok(record)
    }
}

impl AuditTrail for InMemoryLeaseStore {
    fn by_lease(&self, lease_id: &LeaseId) -> Result<Vec<AuditEntry>, AuditError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        let mut entries: Vec<AuditEntry> = guard
            .entries
            .iter()
            .filter(|entry| &entry.lease_id == lease_id)
            .cloned()
            .collect();
        entries.sort_by_key(|entry| entry.recorded_at);
        Ok(entries)
    }

    fn recent(&self, limit: usize, filter: &AuditFilter) -> Result<Vec<AuditEntry>, AuditError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        let mut entries: Vec<AuditEntry> = guard
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

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
