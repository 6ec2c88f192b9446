//! Unified error handling.
//!
//! Each layer has its own error type ([`StoreError`], [`PersistenceError`],
//! [`ApiError`], [`ConfigError`]); `AppError` unifies them for callers that
//! drive a whole [`ShopSession`](crate::session::ShopSession).

use shopfront_core::ProductId;
use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::persistence::PersistenceError;

/// Input rejected by the cart or wishlist store.
///
/// A rejected call never touches the store's state or its persisted slot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Quantities must be at least one and fit in a `u32` once merged.
    #[error("Invalid quantity {amount} for product {id}")]
    InvalidQuantity {
        /// Product the quantity was given for.
        id: ProductId,
        /// The rejected amount.
        amount: u32,
    },

    /// The cart total would exceed the range of `Decimal`.
    #[error("Cart total overflows with product {id}")]
    PriceOverflow {
        /// Product whose line pushed the total out of range.
        id: ProductId,
    },

    /// Product IDs must be non-empty.
    #[error("Product ID cannot be empty")]
    EmptyProductId,
}

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Store rejected the input.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Backend API operation failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Session storage operation failed.
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl AppError {
    /// Whether the backend rejected the bearer token (401/403).
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api(ApiError::Unauthorized(_)))
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
