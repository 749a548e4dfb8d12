//! # savora-db: Database Layer for the Savora Ordering Platform
//!
//! SQLite persistence for coupons, orders and site settings, plus the
//! checkout transaction that ties redemption counting to order creation.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Savora Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    savora-core (Pure Logic)                     │   │
//! │  │          coupon validator • price breakdown • types             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ used by                                │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                ★ savora-db (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌────────────────┐  ┌──────────────────────┐  │   │
//! │  │   │   pool    │  │  repository    │  │      checkout        │  │   │
//! │  │   │ SqlitePool│  │ coupon, order, │  │  place_order() with  │  │   │
//! │  │   │ WAL mode  │  │   settings     │  │  atomic redemption   │  │   │
//! │  │   └───────────┘  └────────────────┘  └──────────────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! use savora_db::{CheckoutService, Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./savora.db")).await?;
//! let checkout = CheckoutService::new(db.clone());
//!
//! let placed = checkout.place_order(request).await?;
//! println!("total: {}", placed.breakdown.total);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use checkout::{CheckoutError, CheckoutItem, CheckoutRequest, CheckoutService, PlacedOrder};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::coupon::CouponRepository;
pub use repository::order::OrderRepository;
pub use repository::settings::SettingsRepository;
