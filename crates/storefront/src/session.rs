//! The shop session: one handle owning the signed-in identity, the backend
//! client and the cart and wishlist stores.
//!
//! # Flow
//!
//! Every remote-backed operation follows the same sequence:
//!
//! 1. Build the change and validate it locally (bad input never reaches the
//!    backend)
//! 2. Await the backend call
//! 3. On success, apply the confirmed change to the local store in one step
//!
//! Local state therefore only ever reflects changes the backend accepted.
//! A 401/403 from any call signs the session out before the error is
//! returned.
//!
//! # Example
//!
//! ```rust,ignore
//! use shopfront_storefront::{FileStorage, ShopSession, StorefrontConfig};
//!
//! let config = StorefrontConfig::from_env()?;
//! let mut shop = ShopSession::open(&config, FileStorage::new(&config.session_dir))?;
//!
//! shop.sign_in("ada@example.com", &password).await?;
//! let product = shop.fetch_product(&ProductId::new("p1")).await?;
//! shop.add_to_cart(&product, 2).await?;
//! println!("{} items", shop.cart().total_quantity());
//! ```

use std::rc::Rc;

use secrecy::SecretString;
use shopfront_core::ProductId;
use tracing::{instrument, warn};

use crate::api::{ApiClient, ApiError, Product};
use crate::auth::{AuthSession, SessionUser};
use crate::cart::{CartChange, CartState, CartStore};
use crate::config::StorefrontConfig;
use crate::error::{Result, StoreError};
use crate::persistence::SessionStorage;
use crate::wishlist::{WishlistChange, WishlistState, WishlistStore};

/// Cart, wishlist and identity for one browsing session.
pub struct ShopSession<S> {
    storage: Rc<S>,
    api: ApiClient,
    auth: Option<AuthSession>,
    cart: CartStore<Rc<S>>,
    wishlist: WishlistStore,
}

impl<S: SessionStorage> ShopSession<S> {
    /// Open the session: restore the identity and cart from `storage`.
    ///
    /// The wishlist starts empty; call [`refresh_wishlist`](Self::refresh_wishlist)
    /// to load the backend's list.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn open(config: &StorefrontConfig, storage: S) -> Result<Self> {
        let storage = Rc::new(storage);
        let mut api = ApiClient::new(config)?;

        let auth = AuthSession::load(&storage);
        if let Some(session) = &auth {
            api.set_token(session.token.clone());
        }

        let cart = CartStore::hydrate(Rc::clone(&storage), config.cart_slot.clone());

        Ok(Self {
            storage,
            api,
            auth,
            cart,
            wishlist: WishlistStore::new(),
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Current cart.
    #[must_use]
    pub const fn cart(&self) -> &CartState {
        self.cart.state()
    }

    /// Current wishlist.
    #[must_use]
    pub const fn wishlist(&self) -> &WishlistState {
        self.wishlist.state()
    }

    /// The signed-in user, if any.
    #[must_use]
    pub fn user(&self) -> Option<&SessionUser> {
        self.auth.as_ref().map(|session| &session.user)
    }

    /// Whether a user is signed in.
    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        self.auth.is_some()
    }

    /// The backend client.
    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    /// The session storage.
    #[must_use]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    // =========================================================================
    // Identity
    // =========================================================================

    /// Sign in and load the user's wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or a request fails.
    /// A failed wishlist load leaves the user signed in.
    #[instrument(skip(self, password))]
    pub async fn sign_in(&mut self, email: &str, password: &SecretString) -> Result<&SessionUser> {
        let session = self.api.login(email, password).await?;

        session.save(&self.storage);
        self.api.set_token(session.token.clone());
        self.auth = Some(session);

        self.refresh_wishlist().await?;

        self.user().ok_or_else(|| ApiError::NotSignedIn.into())
    }

    /// Sign out: forget the identity and clear the cart and wishlist.
    pub fn sign_out(&mut self) {
        if let Err(e) = AuthSession::forget(&self.storage) {
            warn!(error = %e, "Failed to remove persisted auth session");
        }
        self.api.clear_token();
        self.auth = None;
        self.cart.clear_cart();
        self.wishlist.clear_wishlist();
        tracing::info!("Signed out");
    }

    /// Wipe the whole session storage and local state.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be cleared.
    pub fn reset(&mut self) -> Result<()> {
        self.sign_out();
        self.storage.clear()?;
        Ok(())
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Fetch a product from the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the request fails.
    pub async fn fetch_product(&mut self, id: &ProductId) -> Result<Product> {
        let result = self.api.product(id).await;
        self.confirm(result)
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Add `quantity` units of a product to the cart.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the cart would reject the change (zero or
    /// overflowing quantity, overflowing total), `ApiError::NotSignedIn`
    /// without a user, or the backend's error.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add_to_cart(&mut self, product: &Product, quantity: u32) -> Result<()> {
        let change = CartChange::Added(product.to_cart_item(quantity));
        self.cart.state().check(&change)?;

        let user = self.require_user()?.id.clone();
        let result = self.api.add_cart_item(&user, &product.id, quantity).await;
        self.confirm(result)?;

        self.cart.apply(change)?;
        Ok(())
    }

    /// Set the quantity of a cart line. Returns `false` if the product was
    /// not in the local cart.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the cart would reject the change (zero
    /// amount, overflowing total), `ApiError::NotSignedIn` without a user,
    /// or the backend's error.
    #[instrument(skip(self))]
    pub async fn update_cart_amount(&mut self, id: &ProductId, amount: u32) -> Result<bool> {
        let change = CartChange::AmountSet {
            id: id.clone(),
            amount,
        };
        self.cart.state().check(&change)?;

        self.require_user()?;
        let result = self.api.update_cart_item(id, amount).await;
        self.confirm(result)?;

        Ok(self.cart.apply(change)?)
    }

    /// Remove a cart line. Returns `false` if the product was not in the
    /// local cart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotSignedIn` without a user, or the backend's error.
    #[instrument(skip(self))]
    pub async fn remove_from_cart(&mut self, id: &ProductId) -> Result<bool> {
        self.require_user()?;
        let result = self.api.remove_cart_item(id).await;
        self.confirm(result)?;

        Ok(self.cart.remove_from_cart(id))
    }

    /// Empty the local cart. The backend has no bulk clear.
    pub fn clear_cart(&mut self) {
        self.cart.clear_cart();
    }

    // =========================================================================
    // Wishlist
    // =========================================================================

    /// Replace the local wishlist with the backend's canonical list.
    /// Returns the new count.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotSignedIn` without a user, or the backend's error.
    #[instrument(skip(self))]
    pub async fn refresh_wishlist(&mut self) -> Result<usize> {
        let user = self.require_user()?.id.clone();
        let result = self.api.wishlist(&user).await;
        let items = self.confirm(result)?;

        self.wishlist.apply(WishlistChange::Replaced(items))?;
        Ok(self.wishlist.state().count())
    }

    /// Empty the local wishlist. The backend list is left as is.
    pub fn clear_wishlist(&mut self) {
        self.wishlist.clear_wishlist();
    }

    /// Save a product. Returns `false` if it was already saved.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::EmptyProductId` for an empty ID,
    /// `ApiError::NotSignedIn` without a user, or the backend's error.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add_to_wishlist(&mut self, product: &Product) -> Result<bool> {
        if product.id.is_empty() {
            return Err(StoreError::EmptyProductId.into());
        }

        let user = self.require_user()?.id.clone();
        let result = self.api.add_wishlist_item(&user, &product.id).await;
        self.confirm(result)?;

        Ok(self
            .wishlist
            .apply(WishlistChange::Added(product.to_wishlist_item()))?)
    }

    /// Remove a saved product. Returns `false` if it was not saved locally.
    ///
    /// If the backend call fails (other than an auth failure), the wishlist
    /// is re-fetched so the local copy matches the backend again.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotSignedIn` without a user, or the backend's error.
    #[instrument(skip(self))]
    pub async fn remove_from_wishlist(&mut self, id: &ProductId) -> Result<bool> {
        let user = self.require_user()?.id.clone();

        match self.api.remove_wishlist_item(&user, id).await {
            Ok(()) => Ok(self.wishlist.remove_from_wishlist(id)),
            Err(e) if e.is_auth_failure() => self.confirm(Err(e)),
            Err(e) => {
                if let Err(refresh) = self.refresh_wishlist().await {
                    warn!(error = %refresh, "Failed to re-fetch wishlist after failed remove");
                }
                Err(e.into())
            }
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn require_user(&self) -> std::result::Result<&SessionUser, ApiError> {
        self.user().ok_or(ApiError::NotSignedIn)
    }

    /// Pass a backend result through, signing out on an auth failure.
    fn confirm<T>(&mut self, result: std::result::Result<T, ApiError>) -> Result<T> {
        match result {
            Ok(value) => Ok(value),
            Err(e) => {
                if e.is_auth_failure() {
                    warn!(error = %e, "Backend rejected session, signing out");
                    self.sign_out();
                }
                Err(e.into())
            }
        }
    }
}
