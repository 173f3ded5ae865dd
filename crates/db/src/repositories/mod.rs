use thiserror::Error;

use harborcall_core::authz::LookupError;
use harborcall_core::ledger::LedgerError;

pub mod memory;
pub mod notification_ledger;
pub mod permit;

pub use memory::{InMemoryNotificationLedger, InMemoryPermitStore};
pub use notification_ledger::SqlNotificationLedger;
pub use permit::SqlPermitStore;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

// The resolver and dispatcher treat any storage fault as transient; the
// distinction that matters to them is fault vs not-found, and that is
// preserved by the Option returns.
impl From<RepositoryError> for LookupError {
    fn from(error: RepositoryError) -> Self {
        Self::Unavailable(error.to_string())
    }
}

impl From<RepositoryError> for LedgerError {
    fn from(error: RepositoryError) -> Self {
        Self::Unavailable(error.to_string())
    }
}
