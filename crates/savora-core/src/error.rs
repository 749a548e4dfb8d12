//! # Error Types
//!
//! Domain-specific error types for savora-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  savora-core errors (this file)                                        │
//! │  ├── CoreError        - General domain errors                          │
//! │  ├── ValidationError  - Input validation failures (admin forms)        │
//! │  └── PricingError     - Caller-contract violations in the calculator   │
//! │                                                                         │
//! │  savora-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  NOT an error: coupon::CouponRejection. A declined coupon is a normal  │
//! │  business outcome returned as data, so the storefront can branch on    │
//! │  the reason code and show the right message.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (code, field, amounts)
//! 3. Errors are enum variants, never String
//! 4. A `PricingError` indicates a BUG in the caller and must never be
//!    rendered to an end user

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent domain rule violations. They should be caught and
/// translated to user-friendly messages by the calling layer.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An order must contain at least one item.
    #[error("Order must contain at least one item")]
    EmptyOrder,

    /// Item quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Pricing contract violation (wraps PricingError).
    #[error("Pricing error: {0}")]
    Pricing(#[from] PricingError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when admin or customer input doesn't meet requirements.
/// Used for early validation before records reach storage.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid coupon code characters, invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A date range where the end precedes the start.
    #[error("{field}: end date must not precede start date")]
    InvertedDateRange { field: String },

    /// Duplicate value (e.g., duplicate coupon code).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Pricing Error
// =============================================================================

/// Caller-contract violations detected by the price breakdown calculator.
///
/// The calculator has no I/O and cannot fail on its own; these variants fire
/// when an upstream bug feeds it impossible inputs. They are deliberately a
/// distinct type from [`crate::coupon::CouponRejection`]: a rejected coupon
/// is shown to the customer, a `PricingError` is paged to a developer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    /// A monetary input was negative.
    #[error("{field} must not be negative (got {cents} cents)")]
    NegativeAmount { field: &'static str, cents: i64 },

    /// The discount exceeds the amount it may apply to
    /// (items subtotal + delivery fee). The validator clamps discounts, so
    /// this firing means the clamp was bypassed somewhere upstream.
    #[error("discount ({discount_cents} cents) exceeds items + delivery ({base_cents} cents)")]
    DiscountExceedsBase { discount_cents: i64, base_cents: i64 },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = PricingError::DiscountExceedsBase {
            discount_cents: 30000,
            base_cents: 24900,
        };
        assert_eq!(
            err.to_string(),
            "discount (30000 cents) exceeds items + delivery (24900 cents)"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "code".to_string(),
        };
        assert_eq!(err.to_string(), "code is required");

        let err = ValidationError::InvertedDateRange {
            field: "validity window".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "validity window: end date must not precede start date"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "code".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }

    #[test]
    fn test_pricing_converts_to_core_error() {
        let pricing_err = PricingError::NegativeAmount {
            field: "tip",
            cents: -100,
        };
        let core_err: CoreError = pricing_err.into();
        assert!(matches!(core_err, CoreError::Pricing(_)));
    }
}
