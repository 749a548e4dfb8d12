//! # Validation Module
//!
//! Input validation for admin forms (coupon editor, VAT settings) and
//! checkout payloads, run before anything reaches storage.
//!
//! ## Usage
//! ```rust,no_run
//! use savora_core::validation::{validate_coupon_code, validate_quantity};
//!
//! // Validate a code before the coupon insert
//! validate_coupon_code("WELCOME10").unwrap();
//!
//! // Validate quantity before accepting a cart line
//! validate_quantity(2).unwrap();
//! ```

use chrono::{DateTime, Utc};

use crate::error::ValidationError;
use crate::types::DiscountType;
use crate::{COUPON_CODE_MAX_LEN, MAX_ITEM_QUANTITY, MAX_PERCENT_BPS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a coupon code.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 40 characters
/// - Only alphanumeric characters, hyphens, underscores
/// - Case is preserved: codes are case-sensitive identifiers
pub fn validate_coupon_code(code: &str) -> ValidationResult<()> {
    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.len() > COUPON_CODE_MAX_LEN {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: COUPON_CODE_MAX_LEN,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a UUID string format.
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a coupon's discount value against its type.
///
/// ## Rules
/// - Percentage: 0 to 10000 basis points (0% to 100%)
/// - Fixed: any non-negative cent amount
pub fn validate_discount_value(discount_type: DiscountType, value: i64) -> ValidationResult<()> {
    match discount_type {
        DiscountType::Percentage => {
            if value < 0 || value > MAX_PERCENT_BPS {
                return Err(ValidationError::OutOfRange {
                    field: "discount_value".to_string(),
                    min: 0,
                    max: MAX_PERCENT_BPS,
                });
            }
        }
        DiscountType::Fixed => {
            if value < 0 {
                return Err(ValidationError::OutOfRange {
                    field: "discount_value".to_string(),
                    min: 0,
                    max: i64::MAX,
                });
            }
        }
    }

    Ok(())
}

/// Validates a monetary amount in cents.
///
/// Zero is allowed (free delivery, no tip).
pub fn validate_amount_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates an item quantity.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a VAT rate in basis points (0% to 100%).
pub fn validate_vat_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps as i64 > MAX_PERCENT_BPS {
        return Err(ValidationError::OutOfRange {
            field: "vat_rate".to_string(),
            min: 0,
            max: MAX_PERCENT_BPS,
        });
    }

    Ok(())
}

// =============================================================================
// Date Validators
// =============================================================================

/// Validates a coupon validity window.
///
/// Either side may be None (unbounded); when both are set the end must not
/// precede the start.
pub fn validate_date_range(
    starts_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
) -> ValidationResult<()> {
    if let (Some(start), Some(end)) = (starts_at, ends_at) {
        if end < start {
            return Err(ValidationError::InvertedDateRange {
                field: "validity window".to_string(),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
