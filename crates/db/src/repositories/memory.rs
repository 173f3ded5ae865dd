//! In-memory doubles for the storage traits. Used by unit tests that
//! exercise resolver/dispatcher behavior without a database file.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;
use rust_decimal::Decimal;

use harborcall_core::authz::{AuthorizationQuery, LookupError};
use harborcall_core::domain::notification::{NotificationRecord, SessionId};
use harborcall_core::domain::permit::{Permit, PermitCode};
use harborcall_core::ledger::{LedgerError, LedgerInsertOutcome, NotificationLedger};

#[derive(Default)]
pub struct InMemoryPermitStore {
    permits: Mutex<HashMap<String, Permit>>,
}

impl InMemoryPermitStore {
    pub fn with_permits(permits: Vec<Permit>) -> Self {
        let permits =
            permits.into_iter().map(|permit| (permit.code.0.clone(), permit)).collect();
        Self { permits: Mutex::new(permits) }
    }

    pub fn upsert(&self, permit: Permit) {
        self.permits.lock().expect("lock").insert(permit.code.0.clone(), permit);
    }
}

#[async_trait::async_trait]
impl AuthorizationQuery for InMemoryPermitStore {
    async fn check_validity(&self, code: &PermitCode) -> Result<bool, LookupError> {
        Ok(self
            .permits
            .lock()
            .expect("lock")
            .get(code.as_str())
            .map(|permit| permit.is_valid_at(Utc::now()))
            .unwrap_or(false))
    }

    async fn check_balance(&self, code: &PermitCode) -> Result<Decimal, LookupError> {
        Ok(self
            .permits
            .lock()
            .expect("lock")
            .get(code.as_str())
            .map(|permit| permit.quota_balance_kg)
            .unwrap_or(Decimal::ZERO))
    }

    async fn find_permit(&self, code: &PermitCode) -> Result<Option<Permit>, LookupError> {
        Ok(self.permits.lock().expect("lock").get(code.as_str()).cloned())
    }
}

/// Mirrors the SQL ledger's semantics: the insert is atomic under one lock
/// and a duplicate session reports a conflict outcome. `fail_inserts`
/// simulates a ledger outage after a successful dispatch.
#[derive(Default)]
pub struct InMemoryNotificationLedger {
    records: Mutex<HashMap<String, NotificationRecord>>,
    fail_inserts: Mutex<bool>,
}

impl InMemoryNotificationLedger {
    pub fn set_insert_failure(&self, fail: bool) {
        *self.fail_inserts.lock().expect("lock") = fail;
    }

    pub fn records(&self) -> Vec<NotificationRecord> {
        self.records.lock().expect("lock").values().cloned().collect()
    }
}

#[async_trait::async_trait]
impl NotificationLedger for InMemoryNotificationLedger {
    async fn find_by_session(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<NotificationRecord>, LedgerError> {
        Ok(self.records.lock().expect("lock").get(session_id.as_str()).cloned())
    }

    async fn insert(
        &self,
        record: NotificationRecord,
    ) -> Result<LedgerInsertOutcome, LedgerError> {
        if *self.fail_inserts.lock().expect("lock") {
            return Err(LedgerError::Unavailable("simulated ledger outage".to_owned()));
        }

        let mut records = self.records.lock().expect("lock");
        if records.contains_key(record.session_id.as_str()) {
            return Ok(LedgerInsertOutcome::DuplicateSession);
        }
        records.insert(record.session_id.as_str().to_owned(), record);
        Ok(LedgerInsertOutcome::Recorded)
    }
}
