//! Backend API request and response types.

use serde::{Deserialize, Serialize};
use shopfront_core::{Price, ProductId, UserId};

use crate::cart::CartLineItem;
use crate::wishlist::WishlistLineItem;

/// A product as served by `GET /products/:id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Product ID.
    pub id: ProductId,
    /// Display title.
    pub title: String,
    /// Current unit price.
    pub price: Price,
    /// Display image URL.
    #[serde(default)]
    pub image: String,
    /// URL slug of the product page.
    #[serde(default)]
    pub slug: Option<String>,
    /// Whether the product can be ordered.
    #[serde(default)]
    pub in_stock: Option<bool>,
}

impl Product {
    /// Cart line for `amount` units at the current price.
    #[must_use]
    pub fn to_cart_item(&self, amount: u32) -> CartLineItem {
        CartLineItem {
            id: self.id.clone(),
            title: self.title.clone(),
            image: self.image.clone(),
            price: self.price,
            amount,
        }
    }

    /// Wishlist entry for this product.
    #[must_use]
    pub fn to_wishlist_item(&self) -> WishlistLineItem {
        WishlistLineItem {
            id: self.id.clone(),
            title: self.title.clone(),
            price: self.price,
            image: self.image.clone(),
            slug: self.slug.clone(),
            in_stock: self.in_stock,
        }
    }
}

/// Body of `POST /auth/login`.
#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Body of `POST /cart`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddCartItemRequest<'a> {
    pub user_id: &'a UserId,
    pub product_id: &'a ProductId,
    pub quantity: u32,
}

/// Body of `PUT /cart/:id`.
#[derive(Debug, Serialize)]
pub(crate) struct UpdateCartItemRequest {
    pub quantity: u32,
}

/// Body of `POST /wishlist`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddWishlistItemRequest<'a> {
    pub user_id: &'a UserId,
    pub product_id: &'a ProductId,
}
