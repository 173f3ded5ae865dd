use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::permit::{Msisdn, PermitCode};

/// Gateway-issued dialog session identifier. The dedup ledger keys on this
/// value alone; it is treated as a single-use token within its validity
/// window.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelOutcome {
    Sent,
    Failed,
}

impl ChannelOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "sent" => Some(Self::Sent),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent)
    }
}

/// One completed-or-attempted departure notification. Written once per
/// session that reached the notify action; never mutated or deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: String,
    pub session_id: SessionId,
    pub permit_number: PermitCode,
    pub caller_phone: Msisdn,
    pub sms_outcome: ChannelOutcome,
    pub email_outcome: ChannelOutcome,
    pub sent_at: DateTime<Utc>,
}

impl NotificationRecord {
    pub fn new(
        session_id: SessionId,
        permit_number: PermitCode,
        caller_phone: Msisdn,
        sms_outcome: ChannelOutcome,
        email_outcome: ChannelOutcome,
        sent_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session_id,
            permit_number,
            caller_phone,
            sms_outcome,
            email_outcome,
            sent_at,
        }
    }

    /// The dispatch attempt behind this record reached the recipient on at
    /// least one channel.
    pub fn any_channel_sent(&self) -> bool {
        self.sms_outcome.is_sent() || self.email_outcome.is_sent()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::domain::permit::{Msisdn, PermitCode};

    use super::{ChannelOutcome, NotificationRecord, SessionId};

    #[test]
    fn channel_outcome_round_trips_through_storage_form() {
        assert_eq!(ChannelOutcome::parse(ChannelOutcome::Sent.as_str()), Some(ChannelOutcome::Sent));
        assert_eq!(
            ChannelOutcome::parse(ChannelOutcome::Failed.as_str()),
            Some(ChannelOutcome::Failed)
        );
        assert_eq!(ChannelOutcome::parse("queued"), None);
    }

    #[test]
    fn record_reports_partial_delivery_as_sent() {
        let record = NotificationRecord::new(
            SessionId("ATUid_001".to_owned()),
            PermitCode("ABC123".to_owned()),
            Msisdn("27812807278".to_owned()),
            ChannelOutcome::Failed,
            ChannelOutcome::Sent,
            Utc::now(),
        );
        assert!(record.any_channel_sent());
        assert!(!record.id.is_empty());
    }
}
