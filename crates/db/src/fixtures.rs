//! Deterministic demo/e2e fixtures: a small permit book covering the
//! classifications the dialog can reach (valid, expired, exhausted, valid
//! but without a registered rights holder).

use crate::repositories::RepositoryError;
use crate::DbPool;

struct SeedPermit {
    permit_number: &'static str,
    date_expiry: &'static str,
    quota_balance_kg: &'static str,
    contact: Option<SeedContact>,
    description: &'static str,
}

struct SeedContact {
    id: &'static str,
    cell_phone: &'static str,
    email: &'static str,
}

const SEED_PERMITS: &[SeedPermit] = &[
    SeedPermit {
        permit_number: "ABC123",
        date_expiry: "2030-01-01T00:00:00Z",
        quota_balance_kg: "50",
        contact: Some(SeedContact {
            id: "rh-abc123",
            cell_phone: "27812807278",
            email: "abc123.holder@example.test",
        }),
        description: "valid permit with quota and a registered rights holder",
    },
    SeedPermit {
        permit_number: "OLD999",
        date_expiry: "2020-01-01T00:00:00Z",
        quota_balance_kg: "120",
        contact: Some(SeedContact {
            id: "rh-old999",
            cell_phone: "27820000001",
            email: "old999.holder@example.test",
        }),
        description: "expired permit",
    },
    SeedPermit {
        permit_number: "EMPTY00",
        date_expiry: "2030-01-01T00:00:00Z",
        quota_balance_kg: "0",
        contact: Some(SeedContact {
            id: "rh-empty00",
            cell_phone: "27820000002",
            email: "empty00.holder@example.test",
        }),
        description: "valid permit with exhausted quota",
    },
    SeedPermit {
        permit_number: "LONER55",
        date_expiry: "2030-01-01T00:00:00Z",
        quota_balance_kg: "25",
        contact: None,
        description: "valid permit without a registered rights holder",
    },
];

const SEED_TIMESTAMP: &str = "2026-01-01T00:00:00Z";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedResult {
    pub permits_inserted: usize,
    pub rights_holders_inserted: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

pub struct SeedDataset;

impl SeedDataset {
    /// Loads the fixture permit book. Re-running replaces prior fixture rows,
    /// so the command is idempotent for local development.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut permits_inserted = 0;
        let mut rights_holders_inserted = 0;

        for seed in SEED_PERMITS {
            sqlx::query("DELETE FROM rights_holders WHERE permit_number = ?")
                .bind(seed.permit_number)
                .execute(pool)
                .await?;
            sqlx::query("DELETE FROM permits WHERE permit_number = ?")
                .bind(seed.permit_number)
                .execute(pool)
                .await?;

            sqlx::query(
                "INSERT INTO permits
                    (permit_number, date_expiry, quota_balance_kg, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(seed.permit_number)
            .bind(seed.date_expiry)
            .bind(seed.quota_balance_kg)
            .bind(SEED_TIMESTAMP)
            .bind(SEED_TIMESTAMP)
            .execute(pool)
            .await?;
            permits_inserted += 1;

            if let Some(contact) = &seed.contact {
                sqlx::query(
                    "INSERT INTO rights_holders (id, permit_number, cell_phone, email, created_at)
                     VALUES (?, ?, ?, ?, ?)",
                )
                .bind(contact.id)
                .bind(seed.permit_number)
                .bind(contact.cell_phone)
                .bind(contact.email)
                .bind(SEED_TIMESTAMP)
                .execute(pool)
                .await?;
                rights_holders_inserted += 1;
            }
        }

        Ok(SeedResult { permits_inserted, rights_holders_inserted })
    }

    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        for seed in SEED_PERMITS {
            let permit_count: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM permits WHERE permit_number = ?")
                    .bind(seed.permit_number)
                    .fetch_one(pool)
                    .await?;
            checks.push((seed.description, permit_count == 1));

            if let Some(contact) = &seed.contact {
                let contact_count: i64 =
                    sqlx::query_scalar("SELECT COUNT(*) FROM rights_holders WHERE id = ?")
                        .bind(contact.id)
                        .fetch_one(pool)
                        .await?;
                checks.push((seed.description, contact_count == 1));
            }
        }

        let all_present = checks.iter().all(|(_, present)| *present);
        Ok(VerificationResult { all_present, checks })
    }
}

#[cfg(test)]
mod tests {
    use super::SeedDataset;
    use crate::{connect_with_settings, migrations};

    #[tokio::test]
    async fn seed_loads_and_verifies() {
        let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 30)
            .await
            .expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");

        let result = SeedDataset::load(&pool).await.expect("seed");
        assert_eq!(result.permits_inserted, 4);
        assert_eq!(result.rights_holders_inserted, 3);

        let verification = SeedDataset::verify(&pool).await.expect("verify");
        assert!(verification.all_present, "all fixture rows should be present: {:?}", verification.checks);

        pool.close().await;
    }

    #[tokio::test]
    async fn seed_is_idempotent_across_reruns() {
        let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 30)
            .await
            .expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");

        SeedDataset::load(&pool).await.expect("first seed");
        SeedDataset::load(&pool).await.expect("second seed");

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM permits")
            .fetch_one(&pool)
            .await
            .expect("count permits");
        assert_eq!(count, 4);

        pool.close().await;
    }
}
