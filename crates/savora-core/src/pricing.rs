//! # Price Breakdown Calculator
//!
//! Computes the numbers shown on checkout, the customer receipt and the
//! admin order page — from ONE code path, so the three can never disagree
//! on rounding or VAT bucketing.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Where the Breakdown is Used                          │
//! │                                                                         │
//! │  Checkout                                                               │
//! │    line totals + fee + tip + validated discount                         │
//! │         │                                                               │
//! │         ▼                                                               │
//! │    compute_breakdown() ──► persisted on the Order                       │
//! │                                                                         │
//! │  Customer receipt / Admin order page                                    │
//! │    persisted Order snapshots                                            │
//! │         │                                                               │
//! │         ▼                                                               │
//! │    breakdown_for_order() ──► SAME arithmetic, SAME rounding             │
//! │                                                                         │
//! │  The discount is always the persisted/validated amount. It is NEVER    │
//! │  re-derived as (subtotal + fee + tip) − total, which would silently    │
//! │  absorb rounding drift into the displayed discount.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## VAT Buckets
//! Two buckets, each with its own rate:
//! - food (items subtotal) at the reduced rate
//! - delivery fee at the standard rate
//!
//! With `vat_price_inclusive` the net is backed out of the gross; otherwise
//! VAT is additive on the stored net prices. Either way the per-bucket
//! division rounds half up exactly once and `net + vat == gross` holds.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::PricingError;
use crate::money::Money;
use crate::types::{Order, VatRate, VatSettings};

// =============================================================================
// Breakdown Types
// =============================================================================

/// Net/VAT split for a single VAT-bearing component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VatBucket {
    /// The component's headline amount (items subtotal or delivery fee).
    pub gross: Money,
    /// Net portion.
    pub net: Money,
    /// VAT portion. Always `gross - net`.
    pub vat: Money,
}

/// VAT itemization across both buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VatBreakdown {
    /// Items subtotal at the reduced rate.
    pub food: VatBucket,
    /// Delivery fee at the standard rate.
    pub delivery: VatBucket,
    /// Sum of VAT across buckets.
    pub total_vat: Money,
}

/// The full price breakdown for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Breakdown {
    /// Sum of item line totals, before discount.
    pub items_subtotal: Money,
    pub delivery_fee: Money,
    pub tip: Money,
    /// Discount as validated by the coupon validator (0 when no coupon).
    pub discount: Money,
    /// `items_subtotal + delivery_fee + tip − discount`, floored at 0.
    pub total: Money,
    /// Present only when VAT is enabled in settings.
    pub vat: Option<VatBreakdown>,
}

// =============================================================================
// Calculator
// =============================================================================

/// Computes the price breakdown from item line totals.
///
/// ## Contract
/// All inputs must be non-negative, and the discount must not exceed
/// `items subtotal + delivery fee` (the validator's clamp guarantees this;
/// it is re-checked here so an upstream bug surfaces immediately instead of
/// rendering a nonsense receipt). Violations return [`PricingError`] — a
/// programming fault, never shown to the end user.
///
/// ## Example
/// ```rust
/// use savora_core::money::Money;
/// use savora_core::pricing::compute_breakdown;
/// use savora_core::types::VatSettings;
///
/// let vat = VatSettings {
///     vat_enabled: true,
///     standard_rate_bps: 1900,
///     reduced_rate_bps: 700,
///     vat_price_inclusive: true,
/// };
///
/// let breakdown = compute_breakdown(
///     &[Money::from_cents(15000), Money::from_cents(5000)],
///     Money::from_cents(4900), // delivery
///     Money::zero(),           // tip
///     Money::from_cents(2000), // discount
///     &vat,
/// )
/// .unwrap();
///
/// assert_eq!(breakdown.total.cents(), 22900); // 229.00€
/// ```
pub fn compute_breakdown(
    line_totals: &[Money],
    delivery_fee: Money,
    tip: Money,
    discount: Money,
    vat: &VatSettings,
) -> Result<Breakdown, PricingError> {
    for line in line_totals {
        ensure_non_negative("line total", *line)?;
    }
    let items_subtotal: Money = line_totals.iter().copied().sum();

    compute(items_subtotal, delivery_fee, tip, discount, vat)
}

/// Computes the breakdown for a previously persisted order.
///
/// Receipt views (customer and admin) feed the order's snapshot values
/// through the same arithmetic as checkout. The persisted `discount_cents`
/// is used as-is.
pub fn breakdown_for_order(order: &Order, vat: &VatSettings) -> Result<Breakdown, PricingError> {
    compute(
        order.subtotal(),
        order.delivery_fee(),
        order.tip(),
        order.discount(),
        vat,
    )
}

fn compute(
    items_subtotal: Money,
    delivery_fee: Money,
    tip: Money,
    discount: Money,
    vat: &VatSettings,
) -> Result<Breakdown, PricingError> {
    ensure_non_negative("items subtotal", items_subtotal)?;
    ensure_non_negative("delivery fee", delivery_fee)?;
    ensure_non_negative("tip", tip)?;
    ensure_non_negative("discount", discount)?;

    let base = items_subtotal + delivery_fee;
    if discount > base {
        return Err(PricingError::DiscountExceedsBase {
            discount_cents: discount.cents(),
            base_cents: base.cents(),
        });
    }

    let total = (items_subtotal + delivery_fee + tip - discount).floor_at_zero();

    let vat_breakdown = if vat.vat_enabled {
        let food = bucket(items_subtotal, vat.reduced_rate(), vat.vat_price_inclusive);
        let delivery = bucket(delivery_fee, vat.standard_rate(), vat.vat_price_inclusive);
        Some(VatBreakdown {
            total_vat: food.vat + delivery.vat,
            food,
            delivery,
        })
    } else {
        None
    };

    Ok(Breakdown {
        items_subtotal,
        delivery_fee,
        tip,
        discount,
        total,
        vat: vat_breakdown,
    })
}

/// Splits one VAT-bearing amount into net and VAT.
fn bucket(gross: Money, rate: VatRate, price_inclusive: bool) -> VatBucket {
    if price_inclusive {
        let net = gross.net_of_inclusive(rate);
        VatBucket {
            gross,
            net,
            vat: gross - net,
        }
    } else {
        VatBucket {
            gross,
            net: gross,
            vat: gross.vat_on_net(rate),
        }
    }
}

fn ensure_non_negative(field: &'static str, amount: Money) -> Result<(), PricingError> {
    if amount.is_negative() {
        return Err(PricingError::NegativeAmount {
            field,
            cents: amount.cents(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn german_vat_inclusive() -> VatSettings {
        VatSettings {
            vat_enabled: true,
            standard_rate_bps: 1900,
            reduced_rate_bps: 700,
            vat_price_inclusive: true,
        }
    }

    #[test]
    fn test_receipt_scenario_inclusive_vat() {
        // 200.00€ food + 49.00€ delivery, 20.00€ discount, prices incl. VAT
        let breakdown = compute_breakdown(
            &[Money::from_cents(20000)],
            Money::from_cents(4900),
            Money::zero(),
            Money::from_cents(2000),
            &german_vat_inclusive(),
        )
        .unwrap();

        assert_eq!(breakdown.total.cents(), 22900); // 229.00€

        let vat = breakdown.vat.unwrap();
        assert_eq!(vat.food.net.cents(), 18692); // 186.92€
        assert_eq!(vat.food.vat.cents(), 1308); // 13.08€
        assert_eq!(vat.delivery.net.cents(), 4118); // 41.18€
        assert_eq!(vat.delivery.vat.cents(), 782); // 7.82€
        assert_eq!(vat.total_vat.cents(), 2090); // 20.90€
    }

    #[test]
    fn test_exclusive_vat_is_additive() {
        let settings = VatSettings {
            vat_price_inclusive: false,
            ..german_vat_inclusive()
        };

        let breakdown = compute_breakdown(
            &[Money::from_cents(10000)],
            Money::from_cents(500),
            Money::zero(),
            Money::zero(),
            &settings,
        )
        .unwrap();

        let vat = breakdown.vat.unwrap();
        // net prices stay as stored, VAT computed on top
        assert_eq!(vat.food.net.cents(), 10000);
        assert_eq!(vat.food.vat.cents(), 700); // 7% of 100.00€
        assert_eq!(vat.delivery.net.cents(), 500);
        assert_eq!(vat.delivery.vat.cents(), 95); // 19% of 5.00€
        assert_eq!(vat.total_vat.cents(), 795);
    }

    #[test]
    fn test_vat_disabled_populates_no_vat_fields() {
        let settings = VatSettings {
            vat_enabled: false,
            ..german_vat_inclusive()
        };

        let breakdown = compute_breakdown(
            &[Money::from_cents(10000)],
            Money::from_cents(500),
            Money::from_cents(200),
            Money::zero(),
            &settings,
        )
        .unwrap();

        assert!(breakdown.vat.is_none());
        assert_eq!(breakdown.total.cents(), 10700);
    }

    #[test]
    fn test_inclusive_buckets_round_trip() {
        // net + vat must reconstruct the gross for every bucket
        let settings = german_vat_inclusive();
        for (subtotal, fee) in [(1, 1), (99, 33), (20000, 4900), (123457, 999)] {
            let breakdown = compute_breakdown(
                &[Money::from_cents(subtotal)],
                Money::from_cents(fee),
                Money::zero(),
                Money::zero(),
                &settings,
            )
            .unwrap();

            let vat = breakdown.vat.unwrap();
            assert_eq!(vat.food.net + vat.food.vat, vat.food.gross);
            assert_eq!(vat.delivery.net + vat.delivery.vat, vat.delivery.gross);
        }
    }

    #[test]
    fn test_idempotent() {
        // no hidden clock or randomness: identical inputs, identical output
        let settings = german_vat_inclusive();
        let lines = [Money::from_cents(20000), Money::from_cents(333)];
        let a = compute_breakdown(
            &lines,
            Money::from_cents(4900),
            Money::from_cents(150),
            Money::from_cents(2000),
            &settings,
        )
        .unwrap();
        let b = compute_breakdown(
            &lines,
            Money::from_cents(4900),
            Money::from_cents(150),
            Money::from_cents(2000),
            &settings,
        )
        .unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_tip_is_not_vat_bearing() {
        let breakdown = compute_breakdown(
            &[Money::from_cents(10000)],
            Money::zero(),
            Money::from_cents(1000),
            Money::zero(),
            &german_vat_inclusive(),
        )
        .unwrap();

        let vat = breakdown.vat.unwrap();
        // tip contributes to the total but not to any VAT bucket
        assert_eq!(breakdown.total.cents(), 11000);
        assert_eq!(vat.delivery.vat.cents(), 0);
        assert_eq!(vat.total_vat, vat.food.vat);
    }

    #[test]
    fn test_negative_inputs_rejected() {
        let settings = german_vat_inclusive();

        let err = compute_breakdown(
            &[Money::from_cents(-1)],
            Money::zero(),
            Money::zero(),
            Money::zero(),
            &settings,
        )
        .unwrap_err();
        assert!(matches!(err, PricingError::NegativeAmount { field: "line total", .. }));

        let err = compute_breakdown(
            &[Money::from_cents(100)],
            Money::zero(),
            Money::from_cents(-50),
            Money::zero(),
            &settings,
        )
        .unwrap_err();
        assert!(matches!(err, PricingError::NegativeAmount { field: "tip", .. }));
    }

    #[test]
    fn test_overlarge_discount_rejected() {
        // the validator clamps discounts; a larger one here means an
        // upstream bug and must fail loudly
        let err = compute_breakdown(
            &[Money::from_cents(10000)],
            Money::from_cents(500),
            Money::zero(),
            Money::from_cents(10501),
            &german_vat_inclusive(),
        )
        .unwrap_err();

        assert_eq!(
            err,
            PricingError::DiscountExceedsBase {
                discount_cents: 10501,
                base_cents: 10500,
            }
        );
    }

    #[test]
    fn test_discount_equal_to_base_totals_to_tip() {
        let breakdown = compute_breakdown(
            &[Money::from_cents(10000)],
            Money::from_cents(500),
            Money::from_cents(300),
            Money::from_cents(10500),
            &german_vat_inclusive(),
        )
        .unwrap();

        assert_eq!(breakdown.total.cents(), 300);
    }

    #[test]
    fn test_breakdown_for_order_matches_checkout_path() {
        use crate::types::{Order, OrderStatus};
        use chrono::Utc;

        let settings = german_vat_inclusive();
        let at_checkout = compute_breakdown(
            &[Money::from_cents(20000)],
            Money::from_cents(4900),
            Money::zero(),
            Money::from_cents(2000),
            &settings,
        )
        .unwrap();

        let now = Utc::now();
        let order = Order {
            id: "o1".to_string(),
            user_id: "u1".to_string(),
            status: OrderStatus::Paid,
            coupon_code: Some("WELCOME10".to_string()),
            subtotal_cents: at_checkout.items_subtotal.cents(),
            delivery_fee_cents: at_checkout.delivery_fee.cents(),
            tip_cents: at_checkout.tip.cents(),
            discount_cents: at_checkout.discount.cents(),
            total_cents: at_checkout.total.cents(),
            created_at: now,
            updated_at: now,
        };

        let at_receipt = breakdown_for_order(&order, &settings).unwrap();
        assert_eq!(at_checkout, at_receipt);
    }
}
