//! # savora-core: Pure Business Logic for the Savora Ordering Platform
//!
//! This crate is the **heart** of Savora. It contains the coupon validity
//! and order-pricing logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Savora Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            Storefront / Back-Office (TypeScript)                │   │
//! │  │    Menu ──► Cart ──► Checkout ──► Receipt / Admin order page    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ savora-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  coupon   │  │  pricing  │  │   │
//! │  │   │  Coupon   │  │   Money   │  │ validator │  │ breakdown │  │   │
//! │  │   │   Order   │  │  VAT math │  │  reasons  │  │ VAT split │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    savora-db (Database Layer)                   │   │
//! │  │     SQLite repositories, checkout transaction, migrations      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Coupon, Order, OrderItem, VatSettings, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`coupon`] - Coupon validator with named rejection reasons
//! - [`pricing`] - Price breakdown calculator (discount, VAT split, total)
//! - [`error`] - Domain error types
//! - [`validation`] - Admin/checkout input validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, clock access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Rejections Are Data**: a declined coupon is a value, not an error
//!
//! ## Example Usage
//!
//! ```rust
//! use savora_core::money::Money;
//! use savora_core::pricing::compute_breakdown;
//! use savora_core::types::VatSettings;
//!
//! let vat = VatSettings {
//!     vat_enabled: true,
//!     standard_rate_bps: 1900, // 19% on delivery
//!     reduced_rate_bps: 700,   // 7% on food
//!     vat_price_inclusive: true,
//! };
//!
//! let breakdown = compute_breakdown(
//!     &[Money::from_cents(20000)],
//!     Money::from_cents(4900),
//!     Money::zero(),
//!     Money::from_cents(2000),
//!     &vat,
//! )
//! .unwrap();
//!
//! assert_eq!(breakdown.total.cents(), 22900);
//! assert_eq!(breakdown.vat.unwrap().total_vat.cents(), 2090);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod coupon;
pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use savora_core::Money` instead of
// `use savora_core::money::Money`

pub use coupon::{CouponRejection, RedemptionContext};
pub use error::{CoreError, PricingError, ValidationError};
pub use money::Money;
pub use pricing::{Breakdown, VatBreakdown, VatBucket};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum items allowed in a single order
///
/// ## Business Reason
/// Prevents runaway carts and ensures reasonable order sizes.
/// Can be made configurable per-site in future versions.
pub const MAX_ORDER_ITEMS: usize = 100;

/// Maximum quantity of a single item in an order
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 100 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// 100% expressed in basis points.
///
/// Shared upper bound for percentage discounts and VAT rates.
pub const MAX_PERCENT_BPS: i64 = 10000;

/// Maximum length of a coupon code.
pub const COUPON_CODE_MAX_LEN: usize = 40;
