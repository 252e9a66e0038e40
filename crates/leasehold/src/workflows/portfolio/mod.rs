//! Bulk onboarding of existing leases from the portfolio team's spreadsheet
//! export. Each row becomes an independent draft; a bad row never blocks the
//! rest of the sheet.

mod mapping;
mod parser;

use crate::workflows::leasing::audit::{AuditSource, AuditTrail};
use crate::workflows::leasing::domain::LeaseId;
use crate::workflows::leasing::repository::LeaseRepository;
use crate::workflows::leasing::service::LeaseService;
use serde::Serialize;
use std::io::Read;
use std::path::Path;

#[derive(Debug)]
pub enum PortfolioImportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for PortfolioImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortfolioImportError::Io(err) => {
                write!(f, "failed to read portfolio export: {}", err)
            }
            PortfolioImportError::Csv(err) => write!(f, "invalid portfolio CSV data: {}", err),
        }
    }
}

impl std::error::Error for PortfolioImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PortfolioImportError::Io(err) => Some(err),
            PortfolioImportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for PortfolioImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for PortfolioImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

#[derive(Debug, Default, Serialize)]
pub struct ImportSummary {
    pub created: Vec<LeaseId>,
    pub failures: Vec<RowFailure>,
}

/// A row that did not make it in, by sheet line number (the header is line 1).
#[derive(Debug, Serialize)]
pub struct RowFailure {
    pub line: u64,
    pub reason: String,
}

pub struct PortfolioImporter;

impl PortfolioImporter {
    pub fn from_path<P, S>(
        path: P,
        service: &LeaseService<S>,
        source: &AuditSource,
    ) -> Result<ImportSummary, PortfolioImportError>
    where
        P: AsRef<Path>,
        S: LeaseRepository + AuditTrail + 'static,
    {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, service, source)
    }

    pub fn from_reader<R, S>(
        reader: R,
        service: &LeaseService<S>,
        source: &AuditSource,
    ) -> Result<ImportSummary, PortfolioImportError>
    where
        R: Read,
        S: LeaseRepository + AuditTrail + 'static,
    {
        let mut summary = ImportSummary::default();

        for (index, row) in parser::parse_rows(reader)?.into_iter().enumerate() {
            let line = index as u64 + 2;
            let draft = match row {
                Ok(row) => mapping::draft_from_row(&row),
                Err(err) => {
                    summary.failures.push(RowFailure {
                        line,
                        reason: err.to_string(),
                    });
                    continue;
                }
            };
            let draft = match draft {
                Ok(draft) => draft,
                Err(err) => {
                    summary.failures.push(RowFailure {
                        line,
                        reason: err.to_string(),
                    });
                    continue;
                }
            };
            match service.create_draft(draft, source) {
                Ok(record) => summary.created.push(record.id),
                Err(err) => summary.failures.push(RowFailure {
                    line,
                    reason: err.to_string(),
                }),
            }
        }

        tracing::info!(
            created = summary.created.len(),
            failed = summary.failures.len(),
            "portfolio import finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::leasing::audit::{AuditEntry, AuditError, AuditFilter};
    use crate::workflows::leasing::domain::{LeaseRecord, LeaseStatus, RentModel};
    use crate::workflows::leasing::repository::RepositoryError;
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct MemoryLeaseStore {
        state: Mutex<StoreState>,
    }

    #[derive(Default)]
    struct StoreState {
        leases: HashMap<LeaseId, LeaseRecord>,
        entries: Vec<AuditEntry>,
    }

    impl LeaseRepository for MemoryLeaseStore {
        fn insert(
            &self,
            record: LeaseRecord,
            entry: AuditEntry,
        ) -> Result<LeaseRecord, RepositoryError> {
            let mut state = self.state.lock().expect("store lock");
            if state.leases.contains_key(&record.id) {
                return Err(RepositoryError::Conflict);
            }
            state.leases.insert(record.id.clone(), record.clone());
            state.entries.push(entry);
            Ok(record)
        }

        fn fetch(&self, lease_id: &LeaseId) -> Result<Option<LeaseRecord>, RepositoryError> {
            let state = self.state.lock().expect("store lock");
            Ok(state.leases.get(lease_id).cloned())
        }

        fn commit(
            &self,
            record: LeaseRecord,
            expected_version: u64,
            entry: AuditEntry,
        ) -> Result<LeaseRecord, RepositoryError> {
            let mut state = self.state.lock().expect("store lock");
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
            let state = self.state.lock().expect("store lock");
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
            let state = self.state.lock().expect("store lock");
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

    fn service() -> LeaseService<MemoryLeaseStore> {
        LeaseService::new(Arc::new(MemoryLeaseStore::default()))
    }

    const HEADER: &str = "Project ID,Unit ID,Owner ID,Tenant ID,Lease Start,Lease End,Notice Months,Currency,Rent Model,Monthly Rent,Minimum Guarantee,Share Percent,Revenue Basis,Security Deposit,Escalation Date,Escalation Percent,Escalation Amount";

    #[test]
    fn import_creates_drafts_for_clean_rows() {
        let csv = format!(
            "{HEADER}\n\
proj-1,unit-1,own-1,ten-1,2025-01-01,2027-12-31,3,USD,fixed,2500,,,,5000,2026-01-01,5,\n\
proj-1,unit-2,own-1,ten-2,2025-03-01,2028-02-29,6,EUR,revenue share,,30000,12.5,gross sales,,,,\n"
        );
        let service = service();
        let summary =
            PortfolioImporter::from_reader(Cursor::new(csv), &service, &AuditSource::system())
                .expect("import succeeds");

        assert_eq!(summary.created.len(), 2, "failures: {:?}", summary.failures);
        assert!(summary.failures.is_empty());

        let first = service.get(&summary.created[0]).expect("lease stored");
        assert_eq!(first.status, LeaseStatus::Draft);
        assert_eq!(first.escalations.len(), 1);
        assert_eq!(first.term.notice_period_months, 3);

        let second = service.get(&summary.created[1]).expect("lease stored");
        assert!(matches!(second.rent, RentModel::RevenueShare { .. }));
    }

    #[test]
    fn import_isolates_failing_rows() {
        let csv = format!(
            "{HEADER}\n\
proj-1,unit-1,own-1,ten-1,2025-01-01,2027-12-31,3,USD,fixed,2500,,,,,,,\n\
proj-1,unit-2,own-1,ten-2,2025-01-01,2027-12-31,3,USD,barter,2500,,,,,,,\n\
proj-1,unit-3,own-1,ten-3,2027-12-31,2025-01-01,3,USD,fixed,2500,,,,,,,\n"
        );
        let service = service();
        let summary =
            PortfolioImporter::from_reader(Cursor::new(csv), &service, &AuditSource::system())
                .expect("import succeeds");

        assert_eq!(summary.created.len(), 1);
        assert_eq!(summary.failures.len(), 2);
        assert_eq!(summary.failures[0].line, 3);
        assert!(summary.failures[0].reason.contains("barter"));
        assert_eq!(summary.failures[1].line, 4);
    }

    #[test]
    fn from_path_propagates_io_errors() {
        let service = service();
        let error = PortfolioImporter::from_path(
            "./does-not-exist.csv",
            &service,
            &AuditSource::system(),
        )
        .expect_err("expected io error");

        match error {
            PortfolioImportError::Io(_) => {}
            other => panic!("expected io error, got {other:?}"),
        }
    }
}
