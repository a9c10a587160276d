//! # Settings Repository
//!
//! Per-organization business configuration: one row per organization,
//! read at checkout time (tax rate, pricing mode, context requirements)
//! and at print time (business identity, currency symbol).

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use crate::feed::{ChangeAction, ChangeEvent, ChangeFeed, Collection};
use tally_core::types::OrgSettings;
use tally_core::validation;

/// Repository for organization settings.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
    feed: ChangeFeed,
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool, feed: ChangeFeed) -> Self {
        SettingsRepository { pool, feed }
    }

    /// Gets an organization's settings, if configured.
    pub async fn get(&self, org_id: &str) -> DbResult<Option<OrgSettings>> {
        let settings = sqlx::query_as::<_, OrgSettings>(
            r#"
            SELECT org_id, business_name, address, vat_number, currency_symbol,
                   tax_rate_bps, pricing_mode, require_table_for_dine_in,
                   require_customer_for_delivery
            FROM org_settings
            WHERE org_id = ?1
            "#,
        )
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(settings)
    }

    /// Gets an organization's settings, falling back to defaults for an
    /// organization that has not configured any yet.
    ///
    /// The fallback is not persisted; it only makes reads total.
    pub async fn get_or_default(&self, org_id: &str) -> DbResult<OrgSettings> {
        Ok(self
            .get(org_id)
            .await?
            .unwrap_or_else(|| OrgSettings::defaults(org_id, "Unnamed Business")))
    }

    /// Creates or replaces an organization's settings.
    pub async fn upsert(&self, settings: &OrgSettings) -> DbResult<()> {
        validation::validate_name(&settings.business_name)
            .map_err(tally_core::CoreError::from)?;
        validation::validate_tax_rate_bps(settings.tax_rate_bps)
            .map_err(tally_core::CoreError::from)?;

        debug!(org_id = %settings.org_id, "Upserting organization settings");

        sqlx::query(
            r#"
            INSERT INTO org_settings (
                org_id, business_name, address, vat_number, currency_symbol,
                tax_rate_bps, pricing_mode, require_table_for_dine_in,
                require_customer_for_delivery
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(org_id) DO UPDATE SET
                business_name = excluded.business_name,
                address = excluded.address,
                vat_number = excluded.vat_number,
                currency_symbol = excluded.currency_symbol,
                tax_rate_bps = excluded.tax_rate_bps,
                pricing_mode = excluded.pricing_mode,
                require_table_for_dine_in = excluded.require_table_for_dine_in,
                require_customer_for_delivery = excluded.require_customer_for_delivery
            "#,
        )
        .bind(&settings.org_id)
        .bind(&settings.business_name)
        .bind(&settings.address)
        .bind(&settings.vat_number)
        .bind(&settings.currency_symbol)
        .bind(settings.tax_rate_bps)
        .bind(settings.pricing_mode)
        .bind(settings.require_table_for_dine_in)
        .bind(settings.require_customer_for_delivery)
        .execute(&self.pool)
        .await?;

        self.feed.publish(ChangeEvent {
            org_id: settings.org_id.clone(),
            collection: Collection::Settings,
            entity_id: settings.org_id.clone(),
            action: ChangeAction::Updated,
        });

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::test_db;
    use tally_core::money::PricingMode;

    const ORG: &str = "org-test";

    #[tokio::test]
    async fn test_get_or_default_without_row() {
        let db = test_db().await;
        let settings = db.settings().get_or_default(ORG).await.unwrap();
        assert_eq!(settings.org_id, ORG);
        assert_eq!(settings.pricing_mode, PricingMode::Exclusive);

        // Fallback is not persisted
        assert!(db.settings().get(ORG).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_roundtrip() {
        let db = test_db().await;
        let repo = db.settings();

        let mut settings = OrgSettings::defaults(ORG, "Demo Bistro");
        settings.tax_rate_bps = 825;
        settings.pricing_mode = PricingMode::Inclusive;
        repo.upsert(&settings).await.unwrap();

        let fetched = repo.get(ORG).await.unwrap().unwrap();
        assert_eq!(fetched.business_name, "Demo Bistro");
        assert_eq!(fetched.tax_rate_bps, 825);
        assert_eq!(fetched.pricing_mode, PricingMode::Inclusive);

        // Second upsert replaces
        settings.business_name = "Demo Bistro & Bar".to_string();
        repo.upsert(&settings).await.unwrap();
        let fetched = repo.get(ORG).await.unwrap().unwrap();
        assert_eq!(fetched.business_name, "Demo Bistro & Bar");
    }

    #[tokio::test]
    async fn test_upsert_rejects_absurd_tax_rate() {
        let db = test_db().await;
        let mut settings = OrgSettings::defaults(ORG, "Demo");
        settings.tax_rate_bps = 20000; // 200%
        assert!(db.settings().upsert(&settings).await.is_err());
    }
}
