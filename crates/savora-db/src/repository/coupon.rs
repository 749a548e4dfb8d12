//! # Coupon Repository
//!
//! Database operations for coupons.
//!
//! ## Redemption Counting
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Why increment_usage Is Conditional                   │
//! │                                                                         │
//! │  Two checkouts race for the LAST use of a coupon (max_uses = 3):       │
//! │                                                                         │
//! │  Request A: validate (used_count=2 < 3) ✓                              │
//! │  Request B: validate (used_count=2 < 3) ✓   ← both pass!               │
//! │                                                                         │
//! │  Request A: UPDATE ... SET used_count = used_count + 1                 │
//! │             WHERE used_count < max_uses   → 1 row, wins                │
//! │  Request B: same UPDATE                   → 0 rows, loses              │
//! │                                                                         │
//! │  The UPDATE's WHERE clause is the only arbiter; validation alone       │
//! │  can never overspend the cap.                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use savora_core::validation::{
    validate_amount_cents, validate_coupon_code, validate_date_range, validate_discount_value,
};
use savora_core::{Coupon, DiscountType};

// =============================================================================
// Row Mapping
// =============================================================================

/// Raw database row for a coupon.
///
/// `allowed_users` is stored as a JSON array (NULL = unrestricted); the
/// conversion to the domain type parses it.
#[derive(Debug, sqlx::FromRow)]
struct CouponRow {
    id: String,
    code: String,
    is_active: bool,
    starts_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
    discount_type: DiscountType,
    discount_value: i64,
    max_uses: Option<i64>,
    used_count: i64,
    max_uses_per_user: Option<i64>,
    allowed_users: Option<String>,
    min_order_cents: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CouponRow {
    fn into_coupon(self) -> DbResult<Coupon> {
        let allowed_users = match self.allowed_users {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| DbError::corrupt("coupons", format!("allowed_users: {e}")))?,
            None => Vec::new(),
        };

        Ok(Coupon {
            id: self.id,
            code: self.code,
            is_active: self.is_active,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            discount_type: self.discount_type,
            discount_value: self.discount_value,
            max_uses: self.max_uses,
            used_count: self.used_count,
            max_uses_per_user: self.max_uses_per_user,
            allowed_users,
            min_order_cents: self.min_order_cents,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Serializes the allow-list for storage. Empty list → NULL.
fn allowed_users_json(coupon: &Coupon) -> DbResult<Option<String>> {
    if coupon.allowed_users.is_empty() {
        return Ok(None);
    }
    let json = serde_json::to_string(&coupon.allowed_users)
        .map_err(|e| DbError::Internal(e.to_string()))?;
    Ok(Some(json))
}

/// Runs savora-core validation before a coupon reaches SQL.
fn validate_coupon(coupon: &Coupon) -> DbResult<()> {
    validate_coupon_code(&coupon.code)?;
    validate_discount_value(coupon.discount_type, coupon.discount_value)?;
    validate_date_range(coupon.starts_at, coupon.ends_at)?;
    if let Some(min) = coupon.min_order_cents {
        validate_amount_cents("min_order_cents", min)?;
    }
    Ok(())
}

const SELECT_COLUMNS: &str = "\
    id, code, is_active, starts_at, ends_at, \
    discount_type, discount_value, \
    max_uses, used_count, max_uses_per_user, \
    allowed_users, min_order_cents, \
    created_at, updated_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for coupon database operations.
#[derive(Debug, Clone)]
pub struct CouponRepository {
    pool: SqlitePool,
}

impl CouponRepository {
    /// Creates a new CouponRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CouponRepository { pool }
    }

    /// Looks a coupon up by its code.
    ///
    /// Codes are case-sensitive: `WELCOME10` and `welcome10` are different
    /// coupons (the column has no NOCASE collation).
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Coupon>> {
        get_by_code(&self.pool, code).await
    }

    /// Gets a coupon by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Coupon>> {
        let row: Option<CouponRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM coupons WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(CouponRow::into_coupon).transpose()
    }

    /// Lists all coupons, newest first (admin back-office).
    pub async fn list(&self) -> DbResult<Vec<Coupon>> {
        let rows: Vec<CouponRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM coupons ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(CouponRow::into_coupon).collect()
    }

    /// Inserts a new coupon after validating it.
    pub async fn insert(&self, coupon: &Coupon) -> DbResult<()> {
        validate_coupon(coupon)?;
        debug!(id = %coupon.id, code = %coupon.code, "Inserting coupon");

        let allowed_users = allowed_users_json(coupon)?;

        sqlx::query(
            r#"
            INSERT INTO coupons (
                id, code, is_active, starts_at, ends_at,
                discount_type, discount_value,
                max_uses, used_count, max_uses_per_user,
                allowed_users, min_order_cents,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&coupon.id)
        .bind(&coupon.code)
        .bind(coupon.is_active)
        .bind(coupon.starts_at)
        .bind(coupon.ends_at)
        .bind(coupon.discount_type)
        .bind(coupon.discount_value)
        .bind(coupon.max_uses)
        .bind(coupon.used_count)
        .bind(coupon.max_uses_per_user)
        .bind(allowed_users)
        .bind(coupon.min_order_cents)
        .bind(coupon.created_at)
        .bind(coupon.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an editable coupon (admin editor).
    ///
    /// `used_count` is deliberately NOT writable here; it only moves through
    /// [`CouponRepository::increment_usage`].
    pub async fn update(&self, coupon: &Coupon) -> DbResult<()> {
        validate_coupon(coupon)?;
        debug!(id = %coupon.id, code = %coupon.code, "Updating coupon");

        let allowed_users = allowed_users_json(coupon)?;
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE coupons SET
                code = ?,
                is_active = ?,
                starts_at = ?,
                ends_at = ?,
                discount_type = ?,
                discount_value = ?,
                max_uses = ?,
                max_uses_per_user = ?,
                allowed_users = ?,
                min_order_cents = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&coupon.code)
        .bind(coupon.is_active)
        .bind(coupon.starts_at)
        .bind(coupon.ends_at)
        .bind(coupon.discount_type)
        .bind(coupon.discount_value)
        .bind(coupon.max_uses)
        .bind(coupon.max_uses_per_user)
        .bind(allowed_users)
        .bind(coupon.min_order_cents)
        .bind(now)
        .bind(&coupon.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Coupon", &coupon.id));
        }

        Ok(())
    }

    /// Attempts to consume one redemption of the coupon.
    ///
    /// Returns `true` if the redemption was granted, `false` if the coupon
    /// was deactivated or its cap was reached in the meantime. Called inside
    /// the checkout transaction; see the module docs for the race this
    /// closes.
    pub async fn increment_usage(&self, coupon_id: &str) -> DbResult<bool> {
        increment_usage(&self.pool, coupon_id).await
    }
}

// =============================================================================
// Transaction-Scoped Functions
// =============================================================================
// The checkout transaction runs these against `&mut *tx`; the repository
// methods above delegate to them with the pool.

pub(crate) async fn get_by_code<'e, E>(executor: E, code: &str) -> DbResult<Option<Coupon>>
where
    E: SqliteExecutor<'e>,
{
    let row: Option<CouponRow> = sqlx::query_as(&format!(
        "SELECT {SELECT_COLUMNS} FROM coupons WHERE code = ?"
    ))
    .bind(code)
    .fetch_optional(executor)
    .await?;

    row.map(CouponRow::into_coupon).transpose()
}

pub(crate) async fn increment_usage<'e, E>(executor: E, coupon_id: &str) -> DbResult<bool>
where
    E: SqliteExecutor<'e>,
{
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE coupons SET
            used_count = used_count + 1,
            updated_at = ?
        WHERE id = ?
          AND is_active = 1
          AND (max_uses IS NULL OR used_count < max_uses)
        "#,
    )
    .bind(now)
    .bind(coupon_id)
    .execute(executor)
    .await?;

    let granted = result.rows_affected() > 0;
    debug!(coupon_id = %coupon_id, granted, "Coupon usage increment");
    Ok(granted)
}

// =============================================================================
// Unit Tests
// =============================================================================
