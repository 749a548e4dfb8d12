//! # Development Seed Binary
//!
//! Creates a local database with VAT settings and a few sample coupons so
//! the storefront has something to redeem during development.
//!
//! ## Usage
//! ```bash
//! cargo run -p savora-db --bin seed
//! SAVORA_DB=/tmp/demo.db cargo run -p savora-db --bin seed
//! ```
//!
//! Safe to re-run: coupons that already exist are skipped.

use chrono::{Duration, Utc};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use savora_core::{Coupon, DiscountType, VatSettings};
use savora_db::{Database, DbConfig, DbError};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let path = std::env::var("SAVORA_DB").unwrap_or_else(|_| "./savora.db".to_string());
    info!(path = %path, "Seeding development database");

    let db = Database::new(DbConfig::new(&path)).await?;

    // German VAT: 19% standard, 7% reduced, menu prices shown gross
    db.settings()
        .update_vat_settings(&VatSettings {
            vat_enabled: true,
            standard_rate_bps: 1900,
            reduced_rate_bps: 700,
            vat_price_inclusive: true,
        })
        .await?;
    info!("VAT settings configured (19% / 7%, inclusive)");

    for coupon in sample_coupons() {
        match db.coupons().insert(&coupon).await {
            Ok(()) => info!(code = %coupon.code, "Coupon seeded"),
            Err(DbError::UniqueViolation { .. }) => {
                warn!(code = %coupon.code, "Coupon already exists, skipping")
            }
            Err(e) => return Err(e.into()),
        }
    }

    db.close().await;
    info!("Seed complete");
    Ok(())
}

fn sample_coupons() -> Vec<Coupon> {
    let now = Utc::now();

    let base = |code: &str| Coupon {
        id: Uuid::new_v4().to_string(),
        code: code.to_string(),
        is_active: true,
        starts_at: None,
        ends_at: None,
        discount_type: DiscountType::Percentage,
        discount_value: 0,
        max_uses: None,
        used_count: 0,
        max_uses_per_user: None,
        allowed_users: vec![],
        min_order_cents: None,
        created_at: now,
        updated_at: now,
    };

    vec![
        // 10% off, once per user
        Coupon {
            discount_value: 1000,
            max_uses_per_user: Some(1),
            ..base("WELCOME10")
        },
        // 5.00€ off orders of 30.00€ or more, one week
        Coupon {
            discount_type: DiscountType::Fixed,
            discount_value: 500,
            min_order_cents: Some(3000),
            ends_at: Some(now + Duration::days(7)),
            ..base("FIVER")
        },
        // 20% off, first 50 redemptions
        Coupon {
            discount_value: 2000,
            max_uses: Some(50),
            ..base("LAUNCH20")
        },
    ]
}
