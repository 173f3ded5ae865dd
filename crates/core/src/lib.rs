pub mod authz;
pub mod config;
pub mod dialog;
pub mod dispatch;
pub mod domain;
pub mod errors;
pub mod ledger;
pub mod prompts;

pub use authz::{AuthorizationQuery, LookupError};
pub use dialog::path::{DialogPath, PATH_DELIMITER, RESET_TOKEN};
pub use dialog::position::{classify, ConfirmChoice, DialogPosition, MenuBranch};
pub use dialog::resolver::MenuResolver;
pub use dispatch::{DepartureNotifier, NoopDepartureNotifier, NotifyOutcome};
pub use domain::notification::{ChannelOutcome, NotificationRecord, SessionId};
pub use domain::permit::{Msisdn, Permit, PermitCode, RightsHolderContact};
pub use errors::RequestValidationError;
pub use ledger::{LedgerError, LedgerInsertOutcome, NotificationLedger};
pub use prompts::{Reply, DEFAULT_MAX_REPLY_CHARS};

// Re-exported so downstream crates share one chrono/decimal version.
pub use chrono;
pub use rust_decimal;
