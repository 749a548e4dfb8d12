//! # Repository Module
//!
//! Database repository implementations for Savora.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Checkout / page handler                                               │
//! │       │                                                                 │
//! │       │  db.coupons().get_by_code("WELCOME10")                         │
//! │       ▼                                                                 │
//! │  CouponRepository                                                      │
//! │  ├── get_by_code(&self, code)                                          │
//! │  ├── insert(&self, coupon)                                             │
//! │  └── increment_usage(&self, id)                                        │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Transaction-Scoped Access
//! Each repository also exposes `pub(crate)` executor-generic functions so
//! the checkout transaction can run the same queries against `&mut *tx`
//! instead of the pool. One SQL string per operation, two entry points.
//!
//! ## Available Repositories
//!
//! - [`coupon::CouponRepository`] - Coupon CRUD and usage counting
//! - [`order::OrderRepository`] - Orders and item snapshots
//! - [`settings::SettingsRepository`] - Site-wide VAT configuration

pub mod coupon;
pub mod order;
pub mod settings;
