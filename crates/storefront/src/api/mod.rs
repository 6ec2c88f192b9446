//! Backend REST API client.
//!
//! # Architecture
//!
//! - The backend is the source of truth for carts, wishlists and products;
//!   the local stores are updated only after a call here succeeds
//! - Every call carries the bearer token of the signed-in user
//! - Product lookups are cached in memory via `moka` (5 minute TTL)
//!
//! # Endpoints
//!
//! | Method | Path | Body |
//! |---|---|---|
//! | `POST` | `/auth/login` | `{email, password}` |
//! | `GET` | `/products/:id` | |
//! | `POST` | `/cart` | `{userId, productId, quantity}` |
//! | `PUT` | `/cart/:id` | `{quantity}` |
//! | `DELETE` | `/cart/:id` | |
//! | `GET` | `/wishlist/:userId` | |
//! | `POST` | `/wishlist` | `{userId, productId}` |
//! | `DELETE` | `/wishlist/:userId/:productId` | |
//!
//! # Example
//!
//! ```rust,ignore
//! use shopfront_storefront::api::ApiClient;
//!
//! let mut client = ApiClient::new(&config)?;
//! let session = client.login("ada@example.com", &password).await?;
//! client.set_token(session.token.clone());
//!
//! let product = client.product(&ProductId::new("p1")).await?;
//! client.add_cart_item(&session.user.id, &product.id, 2).await?;
//! ```

mod client;
pub mod types;

pub use client::ApiClient;
pub use types::*;

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when calling the backend API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend rejected the bearer token (401 or 403).
    #[error("Unauthorized: backend returned {0}")]
    Unauthorized(StatusCode),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other non-success status.
    #[error("Backend returned {status}: {body}")]
    Status {
        /// Response status.
        status: StatusCode,
        /// Response body, truncated.
        body: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Request URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The operation needs a signed-in user.
    #[error("Not signed in")]
    NotSignedIn,
}

impl ApiError {
    /// Whether the error must end the local session.
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// Whether the backend reported the resource as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_failure_classification() {
        assert!(ApiError::Unauthorized(StatusCode::UNAUTHORIZED).is_auth_failure());
        assert!(ApiError::Unauthorized(StatusCode::FORBIDDEN).is_auth_failure());
        assert!(!ApiError::RateLimited(3).is_auth_failure());
        assert!(!ApiError::NotSignedIn.is_auth_failure());
    }

    #[test]
    fn test_not_found() {
        let err = ApiError::Status {
            status: StatusCode::NOT_FOUND,
            body: "missing".to_string(),
        };
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Backend returned 404 Not Found: missing");
    }
}
