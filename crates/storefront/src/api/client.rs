//! HTTP client for the backend REST API.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use shopfront_core::{ProductId, UserId};
use tracing::{debug, instrument};
use url::Url;

use super::ApiError;
use super::types::{
    AddCartItemRequest, AddWishlistItemRequest, LoginRequest, Product, UpdateCartItemRequest,
};
use crate::auth::AuthSession;
use crate::config::StorefrontConfig;
use crate::wishlist::WishlistLineItem;

/// Longest response body kept in errors and logs.
const BODY_SNIPPET_LEN: usize = 200;

/// Client for the backend REST API.
///
/// Cheap to clone; clones share the connection pool and product cache but
/// each carries its own bearer token.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
    token: Option<SecretString>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    products: Cache<ProductId, Product>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("signed_in", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &StorefrontConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        let products = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_url.clone(),
                products,
            }),
            token: None,
        })
    }

    /// Attach the bearer token sent with every following call.
    pub fn set_token(&mut self, token: SecretString) {
        self.token = Some(token);
    }

    /// Drop the bearer token.
    pub fn clear_token(&mut self) {
        self.token = None;
    }

    /// Whether a bearer token is attached.
    #[must_use]
    pub const fn has_token(&self) -> bool {
        self.token.is_some()
    }

    // =========================================================================
    // Request Plumbing
    // =========================================================================

    /// Build a request for `path` (relative to the API base URL).
    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self.inner.base_url.join(path)?;
        let request = self.inner.client.request(method, url);
        Ok(match &self.token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        })
    }

    /// Send a request and return the body of a successful response.
    async fn send(&self, request: RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            tracing::warn!(status = %status, "Backend rejected bearer token");
            return Err(ApiError::Unauthorized(status));
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        let body = response.text().await?;

        if !status.is_success() {
            let snippet = body.chars().take(BODY_SNIPPET_LEN).collect::<String>();
            tracing::error!(
                status = %status,
                body = %snippet,
                "Backend returned non-success status"
            );
            return Err(ApiError::Status {
                status,
                body: snippet,
            });
        }

        Ok(body)
    }

    /// Send a request and parse the JSON body.
    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let body = self.send(request).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(BODY_SNIPPET_LEN).collect::<String>(),
                "Failed to parse backend response"
            );
            ApiError::Parse(e)
        })
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Exchange credentials for a `{token, user}` pair.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` for rejected credentials, or an error
    /// if the request fails.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<AuthSession, ApiError> {
        let body = LoginRequest {
            email,
            password: password.expose_secret(),
        };
        let request = self.request(Method::POST, "auth/login")?.json(&body);
        let session: AuthSession = self.send_json(request).await?;
        debug!(user_id = %session.user.id, "Signed in");
        Ok(session)
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: &ProductId) -> Result<Product, ApiError> {
        if let Some(product) = self.inner.products.get(id).await {
            debug!("Cache hit for product");
            return Ok(product);
        }

        let path = format!("products/{}", urlencoding::encode(id.as_str()));
        let request = self.request(Method::GET, &path)?;
        let product: Product = self.send_json(request).await?;

        self.inner
            .products
            .insert(id.clone(), product.clone())
            .await;

        Ok(product)
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Add `quantity` units of a product to the user's server-side cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(user_id = %user, product_id = %product))]
    pub async fn add_cart_item(
        &self,
        user: &UserId,
        product: &ProductId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        let body = AddCartItemRequest {
            user_id: user,
            product_id: product,
            quantity,
        };
        let request = self.request(Method::POST, "cart")?.json(&body);
        self.send(request).await.map(|_| ())
    }

    /// Set the quantity of a cart item.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn update_cart_item(&self, id: &ProductId, quantity: u32) -> Result<(), ApiError> {
        let path = format!("cart/{}", urlencoding::encode(id.as_str()));
        let request = self
            .request(Method::PUT, &path)?
            .json(&UpdateCartItemRequest { quantity });
        self.send(request).await.map(|_| ())
    }

    /// Remove a cart item.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn remove_cart_item(&self, id: &ProductId) -> Result<(), ApiError> {
        let path = format!("cart/{}", urlencoding::encode(id.as_str()));
        let request = self.request(Method::DELETE, &path)?;
        self.send(request).await.map(|_| ())
    }

    // =========================================================================
    // Wishlist
    // =========================================================================

    /// Get the user's canonical wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is malformed.
    #[instrument(skip(self), fields(user_id = %user))]
    pub async fn wishlist(&self, user: &UserId) -> Result<Vec<WishlistLineItem>, ApiError> {
        let path = format!("wishlist/{}", urlencoding::encode(user.as_str()));
        let request = self.request(Method::GET, &path)?;
        self.send_json(request).await
    }

    /// Save a product to the user's wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(user_id = %user, product_id = %product))]
    pub async fn add_wishlist_item(&self, user: &UserId, product: &ProductId) -> Result<(), ApiError> {
        let body = AddWishlistItemRequest {
            user_id: user,
            product_id: product,
        };
        let request = self.request(Method::POST, "wishlist")?.json(&body);
        self.send(request).await.map(|_| ())
    }

    /// Remove a product from the user's wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(user_id = %user, product_id = %product))]
    pub async fn remove_wishlist_item(
        &self,
        user: &UserId,
        product: &ProductId,
    ) -> Result<(), ApiError> {
        let path = format!(
            "wishlist/{}/{}",
            urlencoding::encode(user.as_str()),
            urlencoding::encode(product.as_str())
        );
        let request = self.request(Method::DELETE, &path)?;
        self.send(request).await.map(|_| ())
    }
}
