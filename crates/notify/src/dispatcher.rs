use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use harborcall_core::authz::AuthorizationQuery;
use harborcall_core::chrono::Utc;
use harborcall_core::dispatch::{DepartureNotifier, NotifyOutcome};
use harborcall_core::domain::notification::{ChannelOutcome, NotificationRecord, SessionId};
use harborcall_core::domain::permit::{Msisdn, PermitCode};
use harborcall_core::ledger::{LedgerInsertOutcome, NotificationLedger};

use crate::transport::{NotificationTransport, TransportError};

fn departure_notice(code: &PermitCode) -> String {
    format!(
        "This is a notification to inform you that your Authorised Rep (Skipper) \
         intends to depart to sea against Quota code: {code}."
    )
}

/// Fans one departure notice out to SMS and email, at most once per dialog
/// session.
///
/// Protocol order matters and is fixed: ledger pre-check, recipient
/// resolution, concurrent fan-out, ledger write. The ledger row is written
/// only after a dispatch attempt, and not at all when both channels failed,
/// which keeps a failed-everywhere attempt retryable while any-success
/// attempts are final.
pub struct NotificationDispatcher {
    authz: Arc<dyn AuthorizationQuery>,
    ledger: Arc<dyn NotificationLedger>,
    sms: Arc<dyn NotificationTransport>,
    email: Arc<dyn NotificationTransport>,
}

impl NotificationDispatcher {
    pub fn new(
        authz: Arc<dyn AuthorizationQuery>,
        ledger: Arc<dyn NotificationLedger>,
        sms: Arc<dyn NotificationTransport>,
        email: Arc<dyn NotificationTransport>,
    ) -> Self {
        Self { authz, ledger, sms, email }
    }
}

#[async_trait]
impl DepartureNotifier for NotificationDispatcher {
    async fn notify(
        &self,
        session_id: &SessionId,
        code: &PermitCode,
        caller_phone: &Msisdn,
    ) -> NotifyOutcome {
        match self.ledger.find_by_session(session_id).await {
            Ok(Some(_)) => {
                debug!(
                    event_name = "notify.duplicate_suppressed",
                    session_id = session_id.as_str(),
                    permit_code = code.as_str(),
                    "session already notified; skipping resend"
                );
                return NotifyOutcome::AlreadyNotified;
            }
            Ok(None) => {}
            Err(ledger_error) => {
                warn!(
                    event_name = "notify.ledger_precheck_failed",
                    session_id = session_id.as_str(),
                    error = %ledger_error,
                    "ledger pre-check failed; refusing to send blind"
                );
                return NotifyOutcome::Unavailable;
            }
        }

        let permit = match self.authz.find_permit(code).await {
            Ok(permit) => permit,
            Err(lookup_error) => {
                warn!(
                    event_name = "notify.recipient_lookup_failed",
                    session_id = session_id.as_str(),
                    permit_code = code.as_str(),
                    error = %lookup_error,
                    "recipient lookup failed"
                );
                return NotifyOutcome::Unavailable;
            }
        };
        let Some(contact) = permit.and_then(|permit| permit.contact) else {
            info!(
                event_name = "notify.recipient_not_found",
                session_id = session_id.as_str(),
                permit_code = code.as_str(),
                "no rights holder registered for permit"
            );
            return NotifyOutcome::RecipientNotFound;
        };

        // The two channels are independent; neither waits on or fails the
        // other.
        let message = departure_notice(code);
        let (sms_result, email_result) = tokio::join!(
            self.sms.send(&contact.cell_phone, &message),
            self.email.send(&contact.email, &message),
        );

        let sms_outcome = channel_outcome(session_id, self.sms.as_ref(), sms_result);
        let email_outcome = channel_outcome(session_id, self.email.as_ref(), email_result);

        if !sms_outcome.is_sent() && !email_outcome.is_sent() {
            // No ledger write: the idempotency guard stays open so the
            // identical terminal step can attempt delivery again.
            warn!(
                event_name = "notify.dispatch_failed",
                session_id = session_id.as_str(),
                permit_code = code.as_str(),
                "both channels failed; attempt left retryable"
            );
            return NotifyOutcome::DispatchFailed;
        }

        let record = NotificationRecord::new(
            session_id.clone(),
            code.clone(),
            caller_phone.clone(),
            sms_outcome,
            email_outcome,
            Utc::now(),
        );

        match self.ledger.insert(record).await {
            Ok(LedgerInsertOutcome::Recorded) => {
                info!(
                    event_name = "notify.delivered",
                    session_id = session_id.as_str(),
                    permit_code = code.as_str(),
                    sms_outcome = sms_outcome.as_str(),
                    email_outcome = email_outcome.as_str(),
                    "departure notification recorded"
                );
                NotifyOutcome::Delivered
            }
            // A concurrent duplicate won the write; same signal as a
            // pre-check hit.
            Ok(LedgerInsertOutcome::DuplicateSession) => {
                debug!(
                    event_name = "notify.duplicate_write_suppressed",
                    session_id = session_id.as_str(),
                    permit_code = code.as_str(),
                    "lost insert race to a concurrent duplicate request"
                );
                NotifyOutcome::AlreadyNotified
            }
            // The recipient has the message; re-notifying them is worse
            // than a missing audit row. Reconciled from this log line.
            Err(ledger_error) => {
                error!(
                    event_name = "notify.ledger_write_failed",
                    session_id = session_id.as_str(),
                    permit_code = code.as_str(),
                    sms_outcome = sms_outcome.as_str(),
                    email_outcome = email_outcome.as_str(),
                    error = %ledger_error,
                    "delivery succeeded but ledger write failed; needs reconciliation"
                );
                NotifyOutcome::Delivered
            }
        }
    }
}

fn channel_outcome(
    session_id: &SessionId,
    transport: &dyn NotificationTransport,
    result: Result<(), TransportError>,
) -> ChannelOutcome {
    match result {
        Ok(()) => ChannelOutcome::Sent,
        Err(transport_error) => {
            warn!(
                event_name = "notify.channel_failed",
                session_id = session_id.as_str(),
                channel = transport.channel().as_str(),
                error = %transport_error,
                "channel send failed"
            );
            ChannelOutcome::Failed
        }
    }
}
