use async_trait::async_trait;
use thiserror::Error;

use crate::domain::notification::{NotificationRecord, SessionId};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("notification ledger unavailable: {0}")]
    Unavailable(String),
}

/// Outcome of an atomic ledger insert. A duplicate session is a normal,
/// expected idempotency signal under concurrent gateway retries, not an
/// error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LedgerInsertOutcome {
    Recorded,
    DuplicateSession,
}

/// Durable record of "notification sent for session X". The storage layer
/// must enforce uniqueness on the session id; implementations surface a
/// constraint conflict as `DuplicateSession` rather than failing.
#[async_trait]
pub trait NotificationLedger: Send + Sync {
    async fn find_by_session(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<NotificationRecord>, LedgerError>;

    async fn insert(
        &self,
        record: NotificationRecord,
    ) -> Result<LedgerInsertOutcome, LedgerError>;
}
