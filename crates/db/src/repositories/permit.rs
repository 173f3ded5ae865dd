use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{sqlite::SqliteRow, Row};

use harborcall_core::authz::{AuthorizationQuery, LookupError};
use harborcall_core::domain::permit::{Permit, PermitCode, RightsHolderContact};

use super::RepositoryError;
use crate::DbPool;

/// Read-only view over the `permits` and `rights_holders` tables. The
/// import utility owns writes; this store only answers dialog lookups.
pub struct SqlPermitStore {
    pool: DbPool,
}

impl SqlPermitStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn expiry_for(&self, code: &PermitCode) -> Result<Option<DateTime<Utc>>, RepositoryError> {
        let row = sqlx::query("SELECT date_expiry FROM permits WHERE permit_number = ?")
            .bind(code.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| parse_timestamp("date_expiry", row.try_get("date_expiry")?)).transpose()
    }

    async fn balance_for(&self, code: &PermitCode) -> Result<Option<Decimal>, RepositoryError> {
        let row = sqlx::query("SELECT quota_balance_kg FROM permits WHERE permit_number = ?")
            .bind(code.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| parse_decimal("quota_balance_kg", row.try_get("quota_balance_kg")?))
            .transpose()
    }

    async fn permit_with_contact(
        &self,
        code: &PermitCode,
    ) -> Result<Option<Permit>, RepositoryError> {
        let row = sqlx::query(
            "SELECT
                p.permit_number,
                p.date_expiry,
                p.quota_balance_kg,
                rh.cell_phone,
                rh.email
             FROM permits p
             LEFT JOIN rights_holders rh ON rh.permit_number = p.permit_number
             WHERE p.permit_number = ?
             LIMIT 1",
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(permit_from_row).transpose()
    }
}

#[async_trait::async_trait]
impl AuthorizationQuery for SqlPermitStore {
    async fn check_validity(&self, code: &PermitCode) -> Result<bool, LookupError> {
        let expiry = self.expiry_for(code).await.map_err(LookupError::from)?;
        Ok(expiry.map(|expiry| expiry > Utc::now()).unwrap_or(false))
    }

    async fn check_balance(&self, code: &PermitCode) -> Result<Decimal, LookupError> {
        let balance = self.balance_for(code).await.map_err(LookupError::from)?;
        Ok(balance.unwrap_or(Decimal::ZERO))
    }

    async fn find_permit(&self, code: &PermitCode) -> Result<Option<Permit>, LookupError> {
        self.permit_with_contact(code).await.map_err(LookupError::from)
    }
}

fn permit_from_row(row: SqliteRow) -> Result<Permit, RepositoryError> {
    let cell_phone: Option<String> = row.try_get("cell_phone")?;
    let email: Option<String> = row.try_get("email")?;
    let contact = match (cell_phone, email) {
        (Some(cell_phone), Some(email)) => Some(RightsHolderContact { cell_phone, email }),
        _ => None,
    };

    Ok(Permit {
        code: PermitCode(row.try_get("permit_number")?),
        date_expiry: parse_timestamp("date_expiry", row.try_get("date_expiry")?)?,
        quota_balance_kg: parse_decimal("quota_balance_kg", row.try_get("quota_balance_kg")?)?,
        contact,
    })
}

pub(crate) fn parse_timestamp(column: &str, value: String) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(&value).map(|timestamp| timestamp.with_timezone(&Utc)).map_err(
        |error| {
            RepositoryError::Decode(format!("invalid timestamp in `{column}`: `{value}` ({error})"))
        },
    )
}

fn parse_decimal(column: &str, value: String) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(&value).map_err(|error| {
        RepositoryError::Decode(format!("invalid decimal in `{column}`: `{value}` ({error})"))
    })
}
