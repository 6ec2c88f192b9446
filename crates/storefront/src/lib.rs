//! Shopfront Storefront library.
//!
//! Client-side state for the storefront: the cart and wishlist stores, their
//! session persistence, and the [`ShopSession`] handle that reconciles them
//! with the backend REST API.
//!
//! # Modules
//!
//! - [`cart`] - Cart line items with derived totals, persisted per session
//! - [`wishlist`] - De-duplicated saved products, hydrated from the backend
//! - [`persistence`] - Session storage slots (memory or file backed)
//! - [`auth`] - The signed-in `{token, user}` pair
//! - [`api`] - Backend REST client
//! - [`session`] - The `ShopSession` handle tying it all together
//! - [`config`] - Environment configuration
//! - [`error`] - Error types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod auth;
pub mod cart;
pub mod config;
pub mod error;
pub mod persistence;
pub mod session;
pub mod wishlist;

pub use cart::{CartChange, CartLineItem, CartState, CartStore, Hydration};
pub use config::StorefrontConfig;
pub use error::{AppError, Result, StoreError};
pub use persistence::{FileStorage, MemoryStorage, SessionStorage};
pub use session::ShopSession;
pub use wishlist::{WishlistChange, WishlistLineItem, WishlistState, WishlistStore};
