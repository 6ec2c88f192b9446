//! Client-side wishlist store.
//!
//! A de-duplicated set of saved products. Unlike the cart there is no
//! quantity: adding a product that is already present changes nothing.
//! The backend's list is canonical; this store is a display cache hydrated
//! with [`WishlistStore::set_wishlist`] and is not persisted locally.

use serde::{Deserialize, Serialize};
use shopfront_core::{Price, ProductId};
use tracing::debug;

use crate::error::StoreError;

/// One saved product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistLineItem {
    /// Product ID, unique within the wishlist.
    pub id: ProductId,
    /// Display title.
    pub title: String,
    /// Unit price.
    pub price: Price,
    /// Display image URL.
    #[serde(default)]
    pub image: String,
    /// URL slug of the product page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    /// Stock flag as last reported by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_stock: Option<bool>,
}

/// A confirmed change to the wishlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WishlistChange {
    /// Save a product unless already present.
    Added(WishlistLineItem),
    /// Remove a product.
    Removed(ProductId),
    /// Replace the whole list with the canonical one.
    Replaced(Vec<WishlistLineItem>),
    /// Remove every product.
    Cleared,
}

/// Saved products and their derived count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WishlistState {
    items: Vec<WishlistLineItem>,
    count: usize,
}

impl WishlistState {
    /// Saved products in insertion order.
    #[must_use]
    pub fn items(&self) -> &[WishlistLineItem] {
        &self.items
    }

    /// Number of saved products.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Whether nothing is saved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether a product is saved.
    #[must_use]
    pub fn contains(&self, id: &ProductId) -> bool {
        self.get(id).is_some()
    }

    /// Look up a saved product.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&WishlistLineItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Apply a change and re-derive the count.
    ///
    /// Returns whether the change took effect: `false` for an `Added` product
    /// already present or a `Removed` product that was absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EmptyProductId`] if an added product has an
    /// empty ID; the state is left untouched.
    pub fn apply(&mut self, change: WishlistChange) -> Result<bool, StoreError> {
        let changed = match change {
            WishlistChange::Added(item) => {
                if item.id.is_empty() {
                    return Err(StoreError::EmptyProductId);
                }
                self.insert(item)
            }
            WishlistChange::Removed(id) => {
                let before = self.items.len();
                self.items.retain(|item| item.id != id);
                self.items.len() != before
            }
            WishlistChange::Replaced(items) => {
                self.items.clear();
                for item in items {
                    if !item.id.is_empty() {
                        self.insert(item);
                    }
                }
                true
            }
            WishlistChange::Cleared => {
                self.items.clear();
                true
            }
        };

        self.count = self.items.len();
        Ok(changed)
    }

    /// First write wins.
    fn insert(&mut self, item: WishlistLineItem) -> bool {
        if self.contains(&item.id) {
            return false;
        }
        self.items.push(item);
        true
    }
}

/// Wishlist state owned by one session.
#[derive(Debug, Default)]
pub struct WishlistStore {
    state: WishlistState,
}

impl WishlistStore {
    /// Create an empty wishlist.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &WishlistState {
        &self.state
    }

    /// Owned copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> WishlistState {
        self.state.clone()
    }

    /// Save a product. Returns `false` if it was already saved, in which case
    /// the stored fields are left as they were.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EmptyProductId`] if `item.id` is empty.
    pub fn add_to_wishlist(&mut self, item: WishlistLineItem) -> Result<bool, StoreError> {
        self.apply(WishlistChange::Added(item))
    }

    /// Remove a product. Returns `false` if it was not saved.
    pub fn remove_from_wishlist(&mut self, id: &ProductId) -> bool {
        // Removal never fails validation
        self.apply(WishlistChange::Removed(id.clone()))
            .unwrap_or(false)
    }

    /// Replace the wishlist with the backend's canonical list.
    ///
    /// Duplicate IDs keep their first occurrence; empty IDs are skipped.
    pub fn set_wishlist(&mut self, items: Vec<WishlistLineItem>) {
        let _ = self.apply(WishlistChange::Replaced(items));
    }

    /// Empty the wishlist.
    pub fn clear_wishlist(&mut self) {
        let _ = self.apply(WishlistChange::Cleared);
    }

    /// Apply a confirmed change.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EmptyProductId`] if an added product has an
    /// empty ID.
    pub fn apply(&mut self, change: WishlistChange) -> Result<bool, StoreError> {
        let changed = self.state.apply(change)?;
        debug!(changed, count = self.state.count(), "Wishlist updated");
        Ok(changed)
    }
}
