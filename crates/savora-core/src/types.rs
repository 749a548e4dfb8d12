//! # Domain Types
//!
//! Core domain types used throughout the Savora ordering platform.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Coupon      │   │      Order      │   │   OrderItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  code (unique)  │   │  id (UUID)      │   │  name_snapshot  │       │
//! │  │  discount_type  │   │  status         │   │  unit_price     │       │
//! │  │  usage caps     │   │  total_cents    │   │  extras         │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     VatRate     │   │   OrderStatus   │   │  VatSettings    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bps (u32)      │   │  Pending..      │   │  enabled flag   │       │
//! │  │  700 = 7%       │   │  Cancelled      │   │  two rates      │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! Order items freeze product name and prices at order time. Totals shown
//! later are recomputed from these snapshots, never from the live catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// VAT Rate
// =============================================================================

/// VAT rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 700 bps = 7% (reduced rate for food), 1900 bps = 19% (standard rate)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VatRate(u32);

impl VatRate {
    /// Creates a VAT rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        VatRate(bps)
    }

    /// Creates a VAT rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        VatRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero VAT rate.
    #[inline]
    pub const fn zero() -> Self {
        VatRate(0)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for VatRate {
    fn default() -> Self {
        VatRate::zero()
    }
}

// =============================================================================
// Discount Type
// =============================================================================

/// How a coupon's `discount_value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    /// `discount_value` is in basis points (1000 = 10% off the subtotal).
    Percentage,
    /// `discount_value` is a fixed amount in cents.
    Fixed,
}

// =============================================================================
// Order Status
// =============================================================================

/// The status of an order.
///
/// ## Lifecycle
/// ```text
/// PENDING → PAID/PREPARING → DELIVERING → COMPLETED
///     └──────────────────────────────────► CANCELLED
/// ```
///
/// Status is set by the external fulfillment workflow and displayed to
/// customers and admins. There is no transition engine in this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order placed, payment not yet confirmed.
    Pending,
    /// Payment confirmed.
    Paid,
    /// Kitchen is preparing the order.
    Preparing,
    /// Out for delivery.
    Delivering,
    /// Delivered / picked up.
    Completed,
    /// Cancelled by customer or admin.
    Cancelled,
}

impl OrderStatus {
    /// Checks if the order has reached a terminal state.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

// =============================================================================
// Coupon
// =============================================================================

/// A discount code created by an administrator.
///
/// ## Usage Caps
/// - `max_uses` / `used_count`: global redemption cap across all users.
///   `used_count` is incremented exactly once per order that applies the
///   coupon, at order-creation time, and never decremented (no undo on
///   cancellation).
/// - `max_uses_per_user`: cap per redeeming user, checked against that
///   user's past orders carrying this code.
/// - `allowed_users`: when non-empty, only the listed user IDs may redeem.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Coupon {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Unique, case-sensitive code entered at checkout.
    pub code: String,

    /// Inactive coupons are never usable regardless of other fields.
    pub is_active: bool,

    /// Usable from this instant (inclusive). None = unbounded.
    #[ts(as = "Option<String>")]
    pub starts_at: Option<DateTime<Utc>>,

    /// Usable until this instant (inclusive). None = unbounded.
    #[ts(as = "Option<String>")]
    pub ends_at: Option<DateTime<Utc>>,

    /// How `discount_value` is applied.
    pub discount_type: DiscountType,

    /// Basis points for Percentage (1000 = 10%), cents for Fixed.
    pub discount_value: i64,

    /// Global redemption cap. None = unlimited.
    pub max_uses: Option<i64>,

    /// Redemptions so far across all users.
    pub used_count: i64,

    /// Per-user redemption cap. None = unlimited.
    pub max_uses_per_user: Option<i64>,

    /// Restriction list of user IDs. Empty = anyone may redeem.
    pub allowed_users: Vec<String>,

    /// Minimum pre-discount order subtotal required, in cents.
    pub min_order_cents: Option<i64>,

    /// When the coupon was created.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// When the coupon was last updated.
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Coupon {
    /// Returns the minimum order subtotal as Money, if set.
    #[inline]
    pub fn min_order(&self) -> Option<Money> {
        self.min_order_cents.map(Money::from_cents)
    }

    /// Checks if the global usage cap still has room.
    pub fn has_remaining_uses(&self) -> bool {
        match self.max_uses {
            Some(max) => self.used_count < max,
            None => true,
        }
    }

    /// Checks if a user passes the `allowed_users` restriction.
    pub fn is_user_allowed(&self, user_id: &str) -> bool {
        self.allowed_users.is_empty() || self.allowed_users.iter().any(|u| u == user_id)
    }
}

// =============================================================================
// Order
// =============================================================================

/// A customer order.
///
/// All monetary fields are snapshots persisted at checkout. The invariant
/// `subtotal + delivery_fee + tip - discount == total` holds for every
/// persisted order; `discount_cents` is the validated coupon amount, never
/// back-solved from the total.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    pub id: String,
    /// Redeeming/ordering user. Guests get a session-scoped identity.
    pub user_id: String,
    pub status: OrderStatus,
    /// Coupon code applied at checkout, if any.
    pub coupon_code: Option<String>,
    /// Sum of item line totals before discount.
    pub subtotal_cents: i64,
    pub delivery_fee_cents: i64,
    pub tip_cents: i64,
    /// Discount granted by the coupon (0 when no coupon).
    pub discount_cents: i64,
    pub total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Returns the items subtotal as Money.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    /// Returns the delivery fee as Money.
    #[inline]
    pub fn delivery_fee(&self) -> Money {
        Money::from_cents(self.delivery_fee_cents)
    }

    /// Returns the tip as Money.
    #[inline]
    pub fn tip(&self) -> Money {
        Money::from_cents(self.tip_cents)
    }

    /// Returns the discount as Money.
    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }

    /// Returns the grand total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Checks the persisted-totals invariant.
    ///
    /// `subtotal + delivery_fee + tip - discount == total` (floored at 0).
    pub fn totals_consistent(&self) -> bool {
        let expected = (self.subtotal() + self.delivery_fee() + self.tip() - self.discount())
            .floor_at_zero();
        expected == self.total()
    }
}

// =============================================================================
// Order Item
// =============================================================================

/// A line item in an order.
/// Uses the snapshot pattern to freeze product data at order time.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    /// Product or combo this line refers to.
    pub product_id: String,
    /// Product name at order time (frozen).
    pub name_snapshot: String,
    /// Chosen size, if the product has size variants.
    pub size: Option<String>,
    /// Unit price in cents at order time (frozen).
    pub unit_price_cents: i64,
    /// Quantity ordered.
    pub quantity: i64,
    /// Chosen extras with their own price snapshots.
    pub extras: Vec<ItemExtra>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Line total: (unit price + extras) × quantity.
    pub fn line_total(&self) -> Money {
        let extras: Money = self.extras.iter().map(ItemExtra::price).sum();
        (self.unit_price() + extras).multiply_quantity(self.quantity)
    }
}

/// An extra added to an order item (e.g. "extra cheese"), price frozen at
/// order time.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemExtra {
    pub name: String,
    pub price_cents: i64,
}

impl ItemExtra {
    /// Returns the extra's price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// VAT Settings
// =============================================================================

/// Site-wide VAT configuration, maintained by an administrator.
///
/// ## Buckets
/// Food items carry the reduced rate, the delivery fee carries the standard
/// rate. When `vat_price_inclusive` is true, stored prices are gross and the
/// net/VAT split is backed out; otherwise VAT is additive on net prices.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VatSettings {
    /// Master switch. When false, no VAT fields are computed at all.
    pub vat_enabled: bool,
    /// Standard rate in basis points (delivery fee). 1900 = 19%.
    pub standard_rate_bps: u32,
    /// Reduced rate in basis points (food items). 700 = 7%.
    pub reduced_rate_bps: u32,
    /// Whether stored prices already include VAT.
    pub vat_price_inclusive: bool,
}

impl VatSettings {
    /// Returns the standard rate (delivery fee bucket).
    #[inline]
    pub fn standard_rate(&self) -> VatRate {
        VatRate::from_bps(self.standard_rate_bps)
    }

    /// Returns the reduced rate (food bucket).
    #[inline]
    pub fn reduced_rate(&self) -> VatRate {
        VatRate::from_bps(self.reduced_rate_bps)
    }
}

impl Default for VatSettings {
    /// VAT disabled; rates zeroed until an administrator configures them.
    fn default() -> Self {
        VatSettings {
            vat_enabled: false,
            standard_rate_bps: 0,
            reduced_rate_bps: 0,
            vat_price_inclusive: true,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vat_rate_from_bps() {
        let rate = VatRate::from_bps(700);
        assert_eq!(rate.bps(), 700);
        assert!((rate.percentage() - 7.0).abs() < 0.001);
    }

    #[test]
    fn test_vat_rate_from_percentage() {
        let rate = VatRate::from_percentage(19.0);
        assert_eq!(rate.bps(), 1900);
    }

    #[test]
    fn test_order_status_default_and_terminal() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Delivering.is_terminal());
    }

    #[test]
    fn test_line_total_includes_extras() {
        let item = OrderItem {
            id: "i1".to_string(),
            order_id: "o1".to_string(),
            product_id: "p1".to_string(),
            name_snapshot: "Margherita".to_string(),
            size: Some("large".to_string()),
            unit_price_cents: 1090,
            quantity: 2,
            extras: vec![
                ItemExtra {
                    name: "Extra cheese".to_string(),
                    price_cents: 150,
                },
                ItemExtra {
                    name: "Olives".to_string(),
                    price_cents: 100,
                },
            ],
            created_at: Utc::now(),
        };

        // (10.90 + 1.50 + 1.00) × 2 = 26.80
        assert_eq!(item.line_total().cents(), 2680);
    }

    #[test]
    fn test_coupon_helpers() {
        let now = Utc::now();
        let coupon = Coupon {
            id: "c1".to_string(),
            code: "WELCOME10".to_string(),
            is_active: true,
            starts_at: None,
            ends_at: None,
            discount_type: DiscountType::Percentage,
            discount_value: 1000,
            max_uses: Some(3),
            used_count: 3,
            max_uses_per_user: None,
            allowed_users: vec!["user-a".to_string()],
            min_order_cents: None,
            created_at: now,
            updated_at: now,
        };

        assert!(!coupon.has_remaining_uses());
        assert!(coupon.is_user_allowed("user-a"));
        assert!(!coupon.is_user_allowed("user-b"));
    }

    #[test]
    fn test_order_totals_consistent() {
        let now = Utc::now();
        let order = Order {
            id: "o1".to_string(),
            user_id: "u1".to_string(),
            status: OrderStatus::Pending,
            coupon_code: Some("WELCOME10".to_string()),
            subtotal_cents: 20000,
            delivery_fee_cents: 4900,
            tip_cents: 0,
            discount_cents: 2000,
            total_cents: 22900,
            created_at: now,
            updated_at: now,
        };
        assert!(order.totals_consistent());

        let broken = Order {
            total_cents: 22899,
            ..order
        };
        assert!(!broken.totals_consistent());
    }
}
