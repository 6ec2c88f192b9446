//! Command implementations.
//!
//! Each command drives one [`ShopSession`](shopfront_storefront::ShopSession)
//! operation and reports the result through `tracing`.

pub mod auth;
pub mod cart;
pub mod wishlist;
