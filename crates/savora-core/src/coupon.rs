//! # Coupon Validator
//!
//! Decides whether a discount code is usable for a specific user and order
//! context, and if so, computes the discount amount.
//!
//! ## Validation Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Coupon Validation Pipeline                           │
//! │                                                                         │
//! │  validate(coupon, ctx)                                                 │
//! │       │                                                                 │
//! │       ├── 1. is_active?            ──no──► INACTIVE                    │
//! │       ├── 2. now ≥ starts_at?      ──no──► NOT_STARTED                 │
//! │       ├── 3. now ≤ ends_at?        ──no──► EXPIRED                     │
//! │       ├── 4. used_count < max?     ──no──► EXHAUSTED                   │
//! │       ├── 5. user in allow-list?   ──no──► NOT_ALLOWED                 │
//! │       ├── 6. prior uses < cap?     ──no──► PER_USER_LIMIT              │
//! │       ├── 7. subtotal ≥ minimum?   ──no──► BELOW_MINIMUM               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  compute discount, clamped to [0, subtotal]                            │
//! │                                                                         │
//! │  The FIRST failing check wins; later checks are not evaluated.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Purity
//! This module never touches a clock, a counter or the database. `now` and
//! the user's prior redemption count are injected through
//! [`RedemptionContext`]. Incrementing `used_count` is the caller's job and
//! must happen atomically with order persistence (see savora-db's checkout
//! transaction) — two concurrent checkouts may both pass validation here,
//! only the conditional update in the transaction decides who wins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Coupon, DiscountType};

// =============================================================================
// Rejection Reasons
// =============================================================================

/// The closed set of reasons a coupon can be declined.
///
/// Returned as data, never raised as an error: a declined coupon is a normal
/// business outcome. The storefront branches on the variant to show the right
/// message ("this coupon has expired" vs. "minimum order not met").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CouponRejection {
    /// The coupon is switched off.
    Inactive,
    /// The validity window has not opened yet.
    NotStarted,
    /// The validity window has closed.
    Expired,
    /// The global redemption cap is reached.
    Exhausted,
    /// The user is not on the coupon's allow-list.
    NotAllowed,
    /// The user has hit their personal redemption cap.
    PerUserLimit,
    /// The order subtotal is below the coupon's minimum.
    BelowMinimum,
}

impl CouponRejection {
    /// A customer-safe description of the rejection.
    ///
    /// The storefront localizes these; this fallback keeps log lines and
    /// API responses readable.
    pub const fn user_message(&self) -> &'static str {
        match self {
            CouponRejection::Inactive => "This coupon is not active",
            CouponRejection::NotStarted => "This coupon is not valid yet",
            CouponRejection::Expired => "This coupon has expired",
            CouponRejection::Exhausted => "This coupon has been fully redeemed",
            CouponRejection::NotAllowed => "This coupon is not available for your account",
            CouponRejection::PerUserLimit => "You have already used this coupon",
            CouponRejection::BelowMinimum => "Your order does not meet the coupon minimum",
        }
    }
}

// =============================================================================
// Redemption Context
// =============================================================================

/// Everything the validator needs to know about the redeeming side.
///
/// ## Injected, Not Fetched
/// - `now` is passed in so tests (and the checkout transaction re-check) are
///   deterministic — this module never reads a live clock.
/// - `prior_redemptions` is the count of this user's past orders carrying
///   this coupon's code, supplied by the storage layer.
#[derive(Debug, Clone)]
pub struct RedemptionContext<'a> {
    /// The redeeming user. Always present when a coupon is applied; guests
    /// get a session-scoped identity from the session layer.
    pub user_id: &'a str,
    /// Pre-discount sum of item line totals (no delivery fee, no tip).
    pub order_subtotal: Money,
    /// How many of this user's past orders already carry this code.
    pub prior_redemptions: i64,
    /// Current instant, injected for testability.
    pub now: DateTime<Utc>,
}

// =============================================================================
// Validator
// =============================================================================

/// Validates a coupon against a redemption context.
///
/// Returns the discount amount on success, or the first failing check's
/// [`CouponRejection`]. Checks run in a fixed order and short-circuit, so an
/// inactive, expired coupon always reports `Inactive`.
///
/// ## Side Effects
/// None. This function does not increment `used_count`; the caller must do
/// that exactly once, atomically with order persistence.
///
/// ## Edge Cases
/// - A coupon with `discount_value = 0` is valid and yields a zero discount.
/// - A coupon applied to a zero-subtotal order yields a zero discount.
/// - The discount never exceeds the subtotal it applies to.
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use savora_core::coupon::{validate, RedemptionContext};
/// use savora_core::money::Money;
/// # use savora_core::types::{Coupon, DiscountType};
/// # let now = Utc::now();
/// # let coupon = Coupon {
/// #     id: "c1".into(), code: "WELCOME10".into(), is_active: true,
/// #     starts_at: None, ends_at: None,
/// #     discount_type: DiscountType::Percentage, discount_value: 1000,
/// #     max_uses: None, used_count: 0, max_uses_per_user: None,
/// #     allowed_users: vec![], min_order_cents: None,
/// #     created_at: now, updated_at: now,
/// # };
///
/// let ctx = RedemptionContext {
///     user_id: "user-1",
///     order_subtotal: Money::from_cents(25000), // 250.00€
///     prior_redemptions: 0,
///     now,
/// };
///
/// let discount = validate(&coupon, &ctx).unwrap();
/// assert_eq!(discount.cents(), 2500); // 10% of 250.00€
/// ```
pub fn validate(coupon: &Coupon, ctx: &RedemptionContext) -> Result<Money, CouponRejection> {
    if !coupon.is_active {
        return Err(CouponRejection::Inactive);
    }

    if let Some(starts_at) = coupon.starts_at {
        if ctx.now < starts_at {
            return Err(CouponRejection::NotStarted);
        }
    }

    if let Some(ends_at) = coupon.ends_at {
        if ctx.now > ends_at {
            return Err(CouponRejection::Expired);
        }
    }

    if !coupon.has_remaining_uses() {
        return Err(CouponRejection::Exhausted);
    }

    if !coupon.is_user_allowed(ctx.user_id) {
        return Err(CouponRejection::NotAllowed);
    }

    if let Some(per_user) = coupon.max_uses_per_user {
        if ctx.prior_redemptions >= per_user {
            return Err(CouponRejection::PerUserLimit);
        }
    }

    if let Some(minimum) = coupon.min_order() {
        if ctx.order_subtotal < minimum {
            return Err(CouponRejection::BelowMinimum);
        }
    }

    Ok(discount_amount(coupon, ctx.order_subtotal))
}

/// Computes the discount for an already-validated coupon.
///
/// Clamped to `[0, subtotal]` in both modes: a percentage above 100% or a
/// fixed amount above the subtotal can never produce a negative total.
fn discount_amount(coupon: &Coupon, subtotal: Money) -> Money {
    match coupon.discount_type {
        DiscountType::Percentage => {
            // discount_value is in basis points; clamping also covers
            // misconfigured values above 10000 bps
            let raw = subtotal.percentage_of(coupon.discount_value.max(0) as u32);
            raw.floor_at_zero().min(subtotal)
        }
        DiscountType::Fixed => Money::from_cents(coupon.discount_value)
            .floor_at_zero()
            .min(subtotal),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
