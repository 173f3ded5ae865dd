use sqlx::{sqlite::SqliteRow, Row};

use harborcall_core::domain::notification::{ChannelOutcome, NotificationRecord, SessionId};
use harborcall_core::domain::permit::{Msisdn, PermitCode};
use harborcall_core::ledger::{LedgerError, LedgerInsertOutcome, NotificationLedger};

use super::permit::parse_timestamp;
use super::RepositoryError;
use crate::DbPool;

/// Durable dedup ledger over `departure_notifications`. The at-most-once
/// guarantee lives in the table's UNIQUE(session_id) constraint: the insert
/// is a single statement, and a conflict is reported as `DuplicateSession`
/// so concurrent duplicate requests converge without a fatal error.
pub struct SqlNotificationLedger {
    pool: DbPool,
}

impl SqlNotificationLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl NotificationLedger for SqlNotificationLedger {
    async fn find_by_session(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<NotificationRecord>, LedgerError> {
        let row = sqlx::query(
            "SELECT
                id,
                session_id,
                permit_number,
                caller_phone,
                sms_outcome,
                email_outcome,
                sent_at
             FROM departure_notifications
             WHERE session_id = ?",
        )
        .bind(session_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::from)
        .map_err(LedgerError::from)?;

        row.map(record_from_row).transpose().map_err(LedgerError::from)
    }

    async fn insert(
        &self,
        record: NotificationRecord,
    ) -> Result<LedgerInsertOutcome, LedgerError> {
        let result = sqlx::query(
            "INSERT INTO departure_notifications (
                id,
                session_id,
                permit_number,
                caller_phone,
                sms_outcome,
                email_outcome,
                sent_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.id)
        .bind(record.session_id.as_str())
        .bind(record.permit_number.as_str())
        .bind(record.caller_phone.as_str())
        .bind(record.sms_outcome.as_str())
        .bind(record.email_outcome.as_str())
        .bind(record.sent_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(LedgerInsertOutcome::Recorded),
            Err(sqlx::Error::Database(database_error))
                if database_error.is_unique_violation() =>
            {
                Ok(LedgerInsertOutcome::DuplicateSession)
            }
            Err(error) => Err(LedgerError::Unavailable(error.to_string())),
        }
    }
}

fn record_from_row(row: SqliteRow) -> Result<NotificationRecord, RepositoryError> {
    Ok(NotificationRecord {
        id: row.try_get("id")?,
        session_id: SessionId(row.try_get("session_id")?),
        permit_number: PermitCode(row.try_get("permit_number")?),
        caller_phone: Msisdn(row.try_get("caller_phone")?),
        sms_outcome: parse_channel_outcome("sms_outcome", row.try_get("sms_outcome")?)?,
        email_outcome: parse_channel_outcome("email_outcome", row.try_get("email_outcome")?)?,
        sent_at: parse_timestamp("sent_at", row.try_get("sent_at")?)?,
    })
}

fn parse_channel_outcome(column: &str, value: String) -> Result<ChannelOutcome, RepositoryError> {
    ChannelOutcome::parse(&value).ok_or_else(|| {
        RepositoryError::Decode(format!("unknown channel outcome in `{column}`: `{value}`"))
    })
}
