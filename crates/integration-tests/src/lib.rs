//! Integration tests for Shopfront.
//!
//! The tests drive a [`ShopSession`] against a `wiremock` stand-in for the
//! backend REST API, with session state written to a temporary directory.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopfront-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_sync` - Cart changes confirmed by the backend and persisted
//! - `session_lifecycle` - Sign in, reload, sign out

#![cfg_attr(not(test), forbid(unsafe_code))]

use serde_json::{Value, json};
use shopfront_storefront::{FileStorage, ShopSession, StorefrontConfig};
use tempfile::TempDir;
use wiremock::MockServer;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

/// A mock backend plus a session directory that outlives individual sessions.
pub struct TestContext {
    /// The mock backend, serving under `/api`.
    pub server: MockServer,
    /// Directory backing the file storage.
    pub dir: TempDir,
}

impl TestContext {
    /// Start a mock backend and create an empty session directory.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
            dir: TempDir::new().expect("Failed to create session dir"),
        }
    }

    /// Configuration pointing at the mock backend and the session directory.
    ///
    /// # Panics
    ///
    /// Panics if the mock server URI is not a valid API URL.
    #[must_use]
    pub fn config(&self) -> StorefrontConfig {
        let mut config = StorefrontConfig::for_api(&format!("{}/api", self.server.uri()))
            .expect("Mock server URI should be a valid API URL");
        config.session_dir = self.dir.path().to_path_buf();
        config
    }

    /// Open a session over the shared directory, as a fresh process would.
    ///
    /// # Panics
    ///
    /// Panics if the session cannot be opened.
    #[must_use]
    pub fn open(&self) -> ShopSession<FileStorage> {
        let config = self.config();
        ShopSession::open(&config, FileStorage::new(&config.session_dir))
            .expect("Failed to open session")
    }

    /// Mount a login endpoint accepting any credentials for user `u1`.
    pub async fn mock_login(&self, token: &str) {
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token": token,
                "user": { "id": "u1", "name": "Ada", "email": "ada@example.com" }
            })))
            .mount(&self.server)
            .await;
    }

    /// Mount `GET /products/:id` for a product priced as a decimal string.
    pub async fn mock_product(&self, id: &str, title: &str, price: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/api/products/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(product_json(id, title, price)))
            .mount(&self.server)
            .await;
    }
}

/// Product body as the backend serves it.
#[must_use]
pub fn product_json(id: &str, title: &str, price: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "price": price,
        "image": format!("https://cdn.example.com/{id}.jpg"),
        "slug": id,
        "inStock": true
    })
}
