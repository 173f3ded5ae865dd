use async_trait::async_trait;

use crate::domain::notification::SessionId;
use crate::domain::permit::{Msisdn, PermitCode};

/// Outcome of the notify action as seen by the dialog. Every variant maps to
/// a prompt; none of them crosses the resolver boundary as an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// At least one channel accepted the message and the attempt is on the
    /// ledger (or the ledger write failed after a successful send, which is
    /// reported as success and reconciled from logs).
    Delivered,
    /// A ledger entry for this session already existed; nothing was resent.
    AlreadyNotified,
    /// No rights holder contact is registered for the code.
    RecipientNotFound,
    /// Both channels failed. No ledger entry was written, so the identical
    /// terminal step can be retried safely.
    DispatchFailed,
    /// Ledger or authorization store lookup failure before any send.
    Unavailable,
}

impl NotifyOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered | Self::AlreadyNotified)
    }
}

/// The terminal side effect behind the confirm submenu. Implementations must
/// guarantee at-most-once delivery per session across retries and concurrent
/// duplicate requests.
#[async_trait]
pub trait DepartureNotifier: Send + Sync {
    async fn notify(
        &self,
        session_id: &SessionId,
        code: &PermitCode,
        caller_phone: &Msisdn,
    ) -> NotifyOutcome;
}

/// Inert notifier for wiring tests and scaffolding.
#[derive(Default)]
pub struct NoopDepartureNotifier;

#[async_trait]
impl DepartureNotifier for NoopDepartureNotifier {
    async fn notify(
        &self,
        _session_id: &SessionId,
        _code: &PermitCode,
        _caller_phone: &Msisdn,
    ) -> NotifyOutcome {
        NotifyOutcome::Delivered
    }
}
