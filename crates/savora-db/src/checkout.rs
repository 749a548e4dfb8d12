//! # Checkout Service
//!
//! Turns a validated cart into a persisted order, inside one transaction.
//!
//! ## Checkout Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    place_order Pipeline                                 │
//! │                                                                         │
//! │  1. Validate the request shape (pure, before any I/O)                  │
//! │  2. BEGIN                                                               │
//! │  3.   Load VAT settings                                                │
//! │  4.   If a coupon code was supplied:                                   │
//! │         load coupon        ──missing──► UnknownCoupon                  │
//! │         count prior uses                                               │
//! │         run the validator  ──declined─► CouponRejected(reason)         │
//! │         conditional used_count + 1                                     │
//! │                            ──0 rows───► CouponRejected(EXHAUSTED)      │
//! │  5.   Compute the breakdown (single pricing code path)                 │
//! │  6.   Insert order + item snapshots                                    │
//! │  7. COMMIT                                                              │
//! │                                                                         │
//! │  Any error before COMMIT rolls everything back: no order row without   │
//! │  its redemption, no redemption without its order row.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Step 4's conditional UPDATE is what makes redemption caps safe under
//! concurrency: two checkouts may both pass the validator on the same
//! last use, but only one UPDATE will match a row. The loser surfaces as
//! `CouponRejected(Exhausted)` just like a coupon that was already spent.

use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::DbError;
use crate::pool::Database;
use crate::repository::{coupon, order, settings};
use savora_core::coupon::{validate, CouponRejection, RedemptionContext};
use savora_core::pricing::compute_breakdown;
use savora_core::validation::{validate_amount_cents, validate_coupon_code, validate_quantity};
use savora_core::{
    Breakdown, CoreError, ItemExtra, Money, Order, OrderItem, OrderStatus, ValidationError,
    MAX_ORDER_ITEMS,
};
use thiserror::Error;

// =============================================================================
// Request / Response Types
// =============================================================================

/// One cart line as submitted by the storefront.
///
/// Name and prices arrive from the storefront's catalog view and are frozen
/// into the order item snapshot as-is.
#[derive(Debug, Clone)]
pub struct CheckoutItem {
    pub product_id: String,
    pub name: String,
    pub size: Option<String>,
    pub unit_price_cents: i64,
    pub quantity: i64,
    pub extras: Vec<ItemExtra>,
}

/// A checkout request.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    /// Redeeming/ordering user. Guests get a session-scoped identity.
    pub user_id: String,
    pub items: Vec<CheckoutItem>,
    pub delivery_fee_cents: i64,
    pub tip_cents: i64,
    /// Coupon code to apply, if the customer entered one.
    pub coupon_code: Option<String>,
}

/// The outcome of a successful checkout.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order: Order,
    pub items: Vec<OrderItem>,
    /// The breakdown shown on the confirmation page. Recomputable later
    /// from the order snapshots via `breakdown_for_order`.
    pub breakdown: Breakdown,
}

// =============================================================================
// Errors
// =============================================================================

/// Checkout failures.
///
/// `CouponRejected` is the only variant a customer sees verbatim; the rest
/// are translated by the API layer.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The coupon exists but was declined; the reason says why.
    #[error("Coupon declined: {}", .0.user_message())]
    CouponRejected(CouponRejection),

    /// No coupon with the given (case-sensitive) code exists.
    #[error("Unknown coupon code: {code}")]
    UnknownCoupon { code: String },

    /// The request failed domain validation.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The database failed.
    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<ValidationError> for CheckoutError {
    fn from(err: ValidationError) -> Self {
        CheckoutError::Core(CoreError::Validation(err))
    }
}

// =============================================================================
// Service
// =============================================================================

/// Places orders against the database.
#[derive(Debug, Clone)]
pub struct CheckoutService {
    db: Database,
}

impl CheckoutService {
    /// Creates a new checkout service on top of an open database.
    pub fn new(db: Database) -> Self {
        CheckoutService { db }
    }

    /// Places an order.
    ///
    /// Validates the request, applies the coupon (if any) atomically with
    /// the order insert, and returns the persisted order with its price
    /// breakdown. See the module docs for the transaction shape.
    #[instrument(skip(self, request), fields(user_id = %request.user_id))]
    pub async fn place_order(&self, request: CheckoutRequest) -> Result<PlacedOrder, CheckoutError> {
        validate_request(&request)?;

        let now = Utc::now();
        let order_id = Uuid::new_v4().to_string();
        let items = build_items(&order_id, &request.items);
        let line_totals: Vec<Money> = items.iter().map(OrderItem::line_total).collect();
        let subtotal: Money = line_totals.iter().copied().sum();
        let delivery_fee = Money::from_cents(request.delivery_fee_cents);
        let tip = Money::from_cents(request.tip_cents);

        let mut tx = self
            .db
            .pool()
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let vat = settings::vat_settings(&mut *tx).await?;

        let mut discount = Money::zero();
        if let Some(code) = &request.coupon_code {
            let coupon = coupon::get_by_code(&mut *tx, code)
                .await?
                .ok_or_else(|| CheckoutError::UnknownCoupon { code: code.clone() })?;

            let prior =
                order::count_user_redemptions(&mut *tx, &request.user_id, &coupon.code).await?;

            let ctx = RedemptionContext {
                user_id: &request.user_id,
                order_subtotal: subtotal,
                prior_redemptions: prior,
                now,
            };
            discount = validate(&coupon, &ctx).map_err(|reason| {
                info!(code = %coupon.code, ?reason, "Coupon declined");
                CheckoutError::CouponRejected(reason)
            })?;

            // The validator saw a stale used_count if another checkout
            // committed in between; the conditional update is the arbiter.
            if !coupon::increment_usage(&mut *tx, &coupon.id).await? {
                warn!(code = %coupon.code, "Coupon redemption lost the race");
                return Err(CheckoutError::CouponRejected(CouponRejection::Exhausted));
            }
        }

        let breakdown = compute_breakdown(&line_totals, delivery_fee, tip, discount, &vat)
            .map_err(CoreError::Pricing)?;

        let db_order = Order {
            id: order_id,
            user_id: request.user_id.clone(),
            status: OrderStatus::Pending,
            coupon_code: request.coupon_code.clone(),
            subtotal_cents: breakdown.items_subtotal.cents(),
            delivery_fee_cents: breakdown.delivery_fee.cents(),
            tip_cents: breakdown.tip.cents(),
            discount_cents: breakdown.discount.cents(),
            total_cents: breakdown.total.cents(),
            created_at: now,
            updated_at: now,
        };

        order::insert_order(&mut *tx, &db_order).await?;
        for item in &items {
            order::insert_item(&mut *tx, item).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            order_id = %db_order.id,
            total_cents = db_order.total_cents,
            discount_cents = db_order.discount_cents,
            coupon = ?db_order.coupon_code,
            "Order placed"
        );

        Ok(PlacedOrder {
            order: db_order,
            items,
            breakdown,
        })
    }

    /// Recomputes the receipt breakdown for a persisted order.
    ///
    /// Same arithmetic as checkout, fed from the order's snapshots. Used by
    /// the customer receipt and the admin order page.
    pub async fn receipt(&self, order_id: &str) -> Result<PlacedOrder, CheckoutError> {
        let orders = self.db.orders();
        let order = orders
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", order_id))?;
        let items = orders.get_items(order_id).await?;
        let vat = self.db.settings().vat_settings().await?;

        let breakdown =
            savora_core::pricing::breakdown_for_order(&order, &vat).map_err(CoreError::Pricing)?;

        Ok(PlacedOrder {
            order,
            items,
            breakdown,
        })
    }
}

// =============================================================================
// Request Validation
// =============================================================================

fn validate_request(request: &CheckoutRequest) -> Result<(), CheckoutError> {
    if request.user_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "user_id".to_string(),
        }
        .into());
    }

    if request.items.is_empty() {
        return Err(CheckoutError::Core(CoreError::EmptyOrder));
    }

    if request.items.len() > MAX_ORDER_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_ORDER_ITEMS as i64,
        }
        .into());
    }

    for item in &request.items {
        validate_quantity(item.quantity)?;
        validate_amount_cents("unit_price_cents", item.unit_price_cents)?;
        for extra in &item.extras {
            validate_amount_cents("extra price_cents", extra.price_cents)?;
        }
    }

    validate_amount_cents("delivery_fee_cents", request.delivery_fee_cents)?;
    validate_amount_cents("tip_cents", request.tip_cents)?;

    if let Some(code) = &request.coupon_code {
        validate_coupon_code(code)?;
    }

    Ok(())
}

fn build_items(order_id: &str, lines: &[CheckoutItem]) -> Vec<OrderItem> {
    let now = Utc::now();
    lines
        .iter()
        .map(|line| OrderItem {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            product_id: line.product_id.clone(),
            name_snapshot: line.name.clone(),
            size: line.size.clone(),
            unit_price_cents: line.unit_price_cents,
            quantity: line.quantity,
            extras: line.extras.clone(),
            created_at: now,
        })
        .collect()
}

impl CheckoutError {
    /// True when the failure should be shown to the customer as-is.
    pub fn is_customer_facing(&self) -> bool {
        matches!(
            self,
            CheckoutError::CouponRejected(_) | CheckoutError::UnknownCoupon { .. }
        )
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::DbConfig;
    use chrono::Duration;
    use savora_core::{Coupon, DiscountType, VatSettings};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn enable_vat(db: &Database) {
        db.settings()
            .update_vat_settings(&VatSettings {
                vat_enabled: true,
                standard_rate_bps: 1900,
                reduced_rate_bps: 700,
                vat_price_inclusive: true,
            })
            .await
            .unwrap();
    }

    fn coupon(code: &str) -> Coupon {
        let now = Utc::now();
        Coupon {
            id: Uuid::new_v4().to_string(),
            code: code.to_string(),
            is_active: true,
            starts_at: None,
            ends_at: None,
            discount_type: DiscountType::Percentage,
            discount_value: 1000,
            max_uses: None,
            used_count: 0,
            max_uses_per_user: None,
            allowed_users: vec![],
            min_order_cents: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// A 200.00€ cart: two pizzas at 100.00€ each.
    fn request(user_id: &str, code: Option<&str>) -> CheckoutRequest {
        CheckoutRequest {
            user_id: user_id.to_string(),
            items: vec![CheckoutItem {
                product_id: "pizza".to_string(),
                name: "Pizza Diavola".to_string(),
                size: Some("family".to_string()),
                unit_price_cents: 10000,
                quantity: 2,
                extras: vec![],
            }],
            delivery_fee_cents: 4900,
            tip_cents: 0,
            coupon_code: code.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_place_order_without_coupon() {
        let db = test_db().await;
        enable_vat(&db).await;
        let service = CheckoutService::new(db.clone());

        let placed = service.place_order(request("user-1", None)).await.unwrap();

        assert_eq!(placed.order.subtotal_cents, 20000);
        assert_eq!(placed.order.total_cents, 24900);
        assert_eq!(placed.order.discount_cents, 0);
        assert!(placed.order.totals_consistent());

        let vat = placed.breakdown.vat.unwrap();
        assert_eq!(vat.food.net.cents() + vat.food.vat.cents(), 20000);
        assert_eq!(vat.delivery.net.cents() + vat.delivery.vat.cents(), 4900);

        // persisted and reloadable
        let loaded = db.orders().get_by_id(&placed.order.id).await.unwrap();
        assert!(loaded.is_some());
        let items = db.orders().get_items(&placed.order.id).await.unwrap();
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn test_place_order_with_percentage_coupon() {
        let db = test_db().await;
        enable_vat(&db).await;
        db.coupons().insert(&coupon("WELCOME10")).await.unwrap();
        let service = CheckoutService::new(db.clone());

        let placed = service
            .place_order(request("user-1", Some("WELCOME10")))
            .await
            .unwrap();

        // 10% of 200.00 subtotal
        assert_eq!(placed.order.discount_cents, 2000);
        assert_eq!(placed.order.total_cents, 22900);
        assert_eq!(placed.breakdown.vat.unwrap().total_vat.cents(), 2090);

        let used = db
            .coupons()
            .get_by_code("WELCOME10")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(used.used_count, 1);
    }

    #[tokio::test]
    async fn test_receipt_matches_checkout() {
        let db = test_db().await;
        enable_vat(&db).await;
        db.coupons().insert(&coupon("WELCOME10")).await.unwrap();
        let service = CheckoutService::new(db.clone());

        let placed = service
            .place_order(request("user-1", Some("WELCOME10")))
            .await
            .unwrap();
        let receipt = service.receipt(&placed.order.id).await.unwrap();

        assert_eq!(receipt.breakdown, placed.breakdown);
        assert_eq!(receipt.items.len(), 1);
    }

    #[tokio::test]
    async fn test_global_cap_enforced_across_orders() {
        let db = test_db().await;
        let mut limited = coupon("ONCE");
        limited.max_uses = Some(1);
        db.coupons().insert(&limited).await.unwrap();
        let service = CheckoutService::new(db.clone());

        service
            .place_order(request("user-1", Some("ONCE")))
            .await
            .unwrap();

        let err = service
            .place_order(request("user-2", Some("ONCE")))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::CouponRejected(CouponRejection::Exhausted)
        ));
        assert!(err.is_customer_facing());
    }

    #[tokio::test]
    async fn test_per_user_limit_enforced() {
        let db = test_db().await;
        let mut personal = coupon("PERSONAL");
        personal.max_uses_per_user = Some(1);
        db.coupons().insert(&personal).await.unwrap();
        let service = CheckoutService::new(db.clone());

        service
            .place_order(request("user-1", Some("PERSONAL")))
            .await
            .unwrap();

        let err = service
            .place_order(request("user-1", Some("PERSONAL")))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::CouponRejected(CouponRejection::PerUserLimit)
        ));

        // a different user is still fine
        service
            .place_order(request("user-2", Some("PERSONAL")))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_below_minimum_rejected_and_nothing_persisted() {
        let db = test_db().await;
        let mut big_spender = coupon("BIG");
        big_spender.min_order_cents = Some(50000);
        db.coupons().insert(&big_spender).await.unwrap();
        let service = CheckoutService::new(db.clone());

        let err = service
            .place_order(request("user-1", Some("BIG")))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::CouponRejected(CouponRejection::BelowMinimum)
        ));

        // rollback: no order row, no redemption spent
        assert!(db.orders().list_for_user("user-1").await.unwrap().is_empty());
        let unused = db.coupons().get_by_code("BIG").await.unwrap().unwrap();
        assert_eq!(unused.used_count, 0);
    }

    #[tokio::test]
    async fn test_expired_coupon_rejected() {
        let db = test_db().await;
        let mut expired = coupon("BYGONE");
        expired.ends_at = Some(Utc::now() - Duration::days(1));
        db.coupons().insert(&expired).await.unwrap();
        let service = CheckoutService::new(db);

        let err = service
            .place_order(request("user-1", Some("BYGONE")))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::CouponRejected(CouponRejection::Expired)
        ));
    }

    #[tokio::test]
    async fn test_unknown_coupon_code() {
        let db = test_db().await;
        let service = CheckoutService::new(db);

        let err = service
            .place_order(request("user-1", Some("NOPE")))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::UnknownCoupon { .. }));
        assert!(err.is_customer_facing());
    }

    #[tokio::test]
    async fn test_empty_cart_rejected() {
        let db = test_db().await;
        let service = CheckoutService::new(db);

        let mut req = request("user-1", None);
        req.items.clear();

        let err = service.place_order(req).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Core(CoreError::EmptyOrder)));
    }

    #[tokio::test]
    async fn test_invalid_quantity_rejected() {
        let db = test_db().await;
        let service = CheckoutService::new(db);

        let mut req = request("user-1", None);
        req.items[0].quantity = 0;

        let err = service.place_order(req).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Core(CoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_vat_disabled_omits_breakdown() {
        let db = test_db().await;
        let service = CheckoutService::new(db);

        let placed = service.place_order(request("user-1", None)).await.unwrap();
        assert!(placed.breakdown.vat.is_none());
        assert_eq!(placed.order.total_cents, 24900);
    }
}
