//! # Settings Repository
//!
//! Site-wide VAT configuration, stored as a singleton row (id = 1).
//! The row is seeded by the initial migration, so reads never miss.

use sqlx::{SqliteExecutor, SqlitePool};
use tracing::info;

use crate::error::DbResult;
use savora_core::validation::validate_vat_rate_bps;
use savora_core::VatSettings;

#[derive(Debug, sqlx::FromRow)]
struct SettingsRow {
    vat_enabled: bool,
    vat_rate_standard_bps: i64,
    vat_rate_reduced_bps: i64,
    vat_price_inclusive: bool,
}

impl From<SettingsRow> for VatSettings {
    fn from(row: SettingsRow) -> Self {
        VatSettings {
            vat_enabled: row.vat_enabled,
            standard_rate_bps: row.vat_rate_standard_bps as u32,
            reduced_rate_bps: row.vat_rate_reduced_bps as u32,
            vat_price_inclusive: row.vat_price_inclusive,
        }
    }
}

/// Repository for site settings.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Reads the current VAT configuration.
    pub async fn vat_settings(&self) -> DbResult<VatSettings> {
        vat_settings(&self.pool).await
    }

    /// Replaces the VAT configuration (admin settings page).
    pub async fn update_vat_settings(&self, settings: &VatSettings) -> DbResult<()> {
        validate_vat_rate_bps(settings.standard_rate_bps)?;
        validate_vat_rate_bps(settings.reduced_rate_bps)?;

        sqlx::query(
            r#"
            UPDATE site_settings SET
                vat_enabled = ?,
                vat_rate_standard_bps = ?,
                vat_rate_reduced_bps = ?,
                vat_price_inclusive = ?
            WHERE id = 1
            "#,
        )
        .bind(settings.vat_enabled)
        .bind(settings.standard_rate_bps as i64)
        .bind(settings.reduced_rate_bps as i64)
        .bind(settings.vat_price_inclusive)
        .execute(&self.pool)
        .await?;

        info!(
            enabled = settings.vat_enabled,
            standard_bps = settings.standard_rate_bps,
            reduced_bps = settings.reduced_rate_bps,
            inclusive = settings.vat_price_inclusive,
            "VAT settings updated"
        );
        Ok(())
    }
}

// =============================================================================
// Transaction-Scoped Functions
// =============================================================================

pub(crate) async fn vat_settings<'e, E>(executor: E) -> DbResult<VatSettings>
where
    E: SqliteExecutor<'e>,
{
    let row: SettingsRow = sqlx::query_as(
        "SELECT vat_enabled, vat_rate_standard_bps, vat_rate_reduced_bps, vat_price_inclusive \
         FROM site_settings WHERE id = 1",
    )
    .fetch_one(executor)
    .await?;

    Ok(row.into())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_defaults_seeded_disabled() {
        let db = test_db().await;

        let settings = db.settings().vat_settings().await.unwrap();
        assert!(!settings.vat_enabled);
        assert_eq!(settings.standard_rate_bps, 0);
        assert_eq!(settings.reduced_rate_bps, 0);
    }

    #[tokio::test]
    async fn test_update_roundtrip() {
        let db = test_db().await;
        let repo = db.settings();

        let settings = VatSettings {
            vat_enabled: true,
            standard_rate_bps: 1900,
            reduced_rate_bps: 700,
            vat_price_inclusive: true,
        };
        repo.update_vat_settings(&settings).await.unwrap();

        let loaded = repo.vat_settings().await.unwrap();
        assert!(loaded.vat_enabled);
        assert_eq!(loaded.standard_rate_bps, 1900);
        assert_eq!(loaded.reduced_rate_bps, 700);
        assert!(loaded.vat_price_inclusive);
    }

    #[tokio::test]
    async fn test_out_of_range_rate_rejected() {
        let db = test_db().await;

        let settings = VatSettings {
            vat_enabled: true,
            standard_rate_bps: 10001,
            reduced_rate_bps: 700,
            vat_price_inclusive: true,
        };
        let err = db.settings().update_vat_settings(&settings).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidInput(_)));
    }
}
