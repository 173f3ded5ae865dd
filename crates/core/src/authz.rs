use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::permit::{Permit, PermitCode};

/// A lookup failure is connectivity/timeout trouble, never "not found".
/// The resolver maps it to a non-terminal retry prompt so the caller keeps
/// their dialog position.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("authorization store unavailable: {0}")]
    Unavailable(String),
}

/// Read side of the authorization store. Implemented over the permits table;
/// this crate only ever reads.
#[async_trait]
pub trait AuthorizationQuery: Send + Sync {
    /// True iff a record exists and its expiry is strictly after now.
    async fn check_validity(&self, code: &PermitCode) -> Result<bool, LookupError>;

    /// Remaining quota in kilograms; zero when the code does not exist.
    async fn check_balance(&self, code: &PermitCode) -> Result<Decimal, LookupError>;

    /// Full record, including expiry and the registered rights holder
    /// contact, for prompt parameterization and recipient resolution.
    async fn find_permit(&self, code: &PermitCode) -> Result<Option<Permit>, LookupError>;
}
