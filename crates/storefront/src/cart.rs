//! Client-side cart store.
//!
//! The cart is the local source of truth for rendering line items and
//! totals. Every mutation is a [`CartChange`] applied through
//! [`CartState::apply`], after which `total_quantity` and `total_price` are
//! re-derived from the items. Totals are never written any other way, so they
//! cannot drift from the line items.
//!
//! [`CartStore`] wraps the state with its session slot: it hydrates once on
//! construction and persists after every accepted change.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shopfront_core::{Price, ProductId};
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::persistence::{Loaded, SessionStorage, load_json, save_json};

/// Default session slot holding the cart.
pub const DEFAULT_SLOT: &str = "cart";

/// One product in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    /// Product ID, unique within the cart.
    pub id: ProductId,
    /// Display title.
    pub title: String,
    /// Display image URL.
    #[serde(default)]
    pub image: String,
    /// Unit price at the time the product was added.
    pub price: Price,
    /// Quantity, at least 1.
    pub amount: u32,
}

impl CartLineItem {
    /// Line total (`amount × price`), or `None` if it overflows.
    #[must_use]
    pub fn line_price(&self) -> Option<Decimal> {
        self.price.times(self.amount)
    }
}

/// A confirmed change to the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartChange {
    /// Add a product, merging additively into an existing line.
    Added(CartLineItem),
    /// Set the absolute quantity of an existing line.
    AmountSet {
        /// Product to update.
        id: ProductId,
        /// New quantity.
        amount: u32,
    },
    /// Remove a line.
    Removed(ProductId),
    /// Remove every line.
    Cleared,
}

impl CartChange {
    /// Reject quantities below one and empty product IDs.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EmptyProductId`] or
    /// [`StoreError::InvalidQuantity`].
    pub fn validate(&self) -> Result<(), StoreError> {
        match self {
            Self::Added(item) => {
                if item.id.is_empty() {
                    return Err(StoreError::EmptyProductId);
                }
                check_amount(&item.id, item.amount)
            }
            Self::AmountSet { id, amount } => check_amount(id, *amount),
            Self::Removed(_) | Self::Cleared => Ok(()),
        }
    }
}

fn check_amount(id: &ProductId, amount: u32) -> Result<(), StoreError> {
    if amount < 1 {
        return Err(StoreError::InvalidQuantity {
            id: id.clone(),
            amount,
        });
    }
    Ok(())
}

/// Cart line items and their derived totals.
///
/// Serializes as `{items, totalQuantity, totalPrice}`. Deserialization reads
/// only `items` and re-derives the totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "PersistedCart")]
pub struct CartState {
    items: Vec<CartLineItem>,
    total_quantity: u64,
    total_price: Decimal,
}

/// Wire shape accepted when reading a cart snapshot.
///
/// Lines are kept raw so one malformed line does not discard the rest.
#[derive(Deserialize)]
struct PersistedCart {
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

impl From<PersistedCart> for CartState {
    fn from(persisted: PersistedCart) -> Self {
        let mut state = Self::default();
        for raw in persisted.items {
            // Drop lines that could never have been added
            let result = serde_json::from_value::<CartLineItem>(raw)
                .map_err(|e| e.to_string())
                .and_then(|item| {
                    state
                        .apply(CartChange::Added(item))
                        .map_err(|e| e.to_string())
                });
            if let Err(error) = result {
                warn!(%error, "Dropping unreadable cart line");
            }
        }
        state
    }
}

impl CartState {
    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Look up a line by product ID.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&CartLineItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Sum of all line quantities.
    #[must_use]
    pub const fn total_quantity(&self) -> u64 {
        self.total_quantity
    }

    /// Sum of all line totals.
    #[must_use]
    pub const fn total_price(&self) -> Decimal {
        self.total_price
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Apply a change and re-derive totals.
    ///
    /// Returns whether a line matched (always `true` for `Added` and
    /// `Cleared`). A missing ID on `AmountSet` or `Removed` is a no-op.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the change fails validation, a merged
    /// amount exceeds `u32::MAX`, or the total price overflows. The state is
    /// left untouched.
    pub fn apply(&mut self, change: CartChange) -> Result<bool, StoreError> {
        change.validate()?;

        let mut items = self.items.clone();
        let matched = match change {
            CartChange::Added(item) => {
                merge(&mut items, item)?;
                true
            }
            CartChange::AmountSet { id, amount } => {
                match items.iter_mut().find(|item| item.id == id) {
                    Some(item) => {
                        item.amount = amount;
                        true
                    }
                    None => false,
                }
            }
            CartChange::Removed(id) => {
                let before = items.len();
                items.retain(|item| item.id != id);
                items.len() != before
            }
            CartChange::Cleared => {
                items.clear();
                true
            }
        };

        let (total_quantity, total_price) = totals(&items)?;
        self.items = items;
        self.total_quantity = total_quantity;
        self.total_price = total_price;
        Ok(matched)
    }

    /// Whether [`apply`](Self::apply) would accept `change`, without applying it.
    ///
    /// # Errors
    ///
    /// Returns the [`StoreError`] `apply` would return.
    pub fn check(&self, change: &CartChange) -> Result<(), StoreError> {
        self.clone().apply(change.clone()).map(|_| ())
    }
}

/// Additive merge: sum into an existing line, or append.
fn merge(items: &mut Vec<CartLineItem>, item: CartLineItem) -> Result<(), StoreError> {
    match items.iter_mut().find(|existing| existing.id == item.id) {
        Some(existing) => {
            existing.amount = existing.amount.checked_add(item.amount).ok_or_else(|| {
                StoreError::InvalidQuantity {
                    id: item.id.clone(),
                    amount: item.amount,
                }
            })?;
        }
        None => items.push(item),
    }
    Ok(())
}

/// Derive `(total_quantity, total_price)` from the lines.
fn totals(items: &[CartLineItem]) -> Result<(u64, Decimal), StoreError> {
    let quantity = items.iter().map(|item| u64::from(item.amount)).sum();
    let price = items.iter().try_fold(Decimal::ZERO, |total, item| {
        item.line_price()
            .and_then(|line| total.checked_add(line))
            .ok_or_else(|| StoreError::PriceOverflow {
                id: item.id.clone(),
            })
    })?;
    Ok((quantity, price))
}

/// Where a store's initial state came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hydration {
    /// Restored from the session slot.
    Restored,
    /// The slot was empty; started with an empty cart.
    Empty,
    /// The slot was unreadable; started with an empty cart.
    Discarded,
}

/// The cart state bound to its session slot.
#[derive(Debug)]
pub struct CartStore<S> {
    state: CartState,
    storage: S,
    slot: String,
    hydration: Hydration,
}

impl<S: SessionStorage> CartStore<S> {
    /// Create the store from the session slot, falling back to an empty cart.
    pub fn hydrate(storage: S, slot: impl Into<String>) -> Self {
        let slot = slot.into();
        let (state, hydration) = match load_json::<CartState>(&storage, &slot) {
            Loaded::Value(state) => (state, Hydration::Restored),
            Loaded::Missing => (CartState::default(), Hydration::Empty),
            Loaded::Unreadable(_) => (CartState::default(), Hydration::Discarded),
        };

        debug!(
            slot = %slot,
            ?hydration,
            lines = state.len(),
            total_quantity = state.total_quantity(),
            "Cart hydrated"
        );

        Self {
            state,
            storage,
            slot,
            hydration,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &CartState {
        &self.state
    }

    /// Owned copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> CartState {
        self.state.clone()
    }

    /// Where the initial state came from.
    #[must_use]
    pub const fn hydration(&self) -> Hydration {
        self.hydration
    }

    /// The backing storage.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Add a product; repeated adds of the same product accumulate quantity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidQuantity`] if `item.amount` is zero or
    /// the merged amount overflows, [`StoreError::EmptyProductId`] if
    /// `item.id` is empty and [`StoreError::PriceOverflow`] if the total
    /// price overflows.
    pub fn add_to_cart(&mut self, item: CartLineItem) -> Result<(), StoreError> {
        self.apply(CartChange::Added(item)).map(|_| ())
    }

    /// Remove a product. Returns `false` (and changes nothing) if absent.
    pub fn remove_from_cart(&mut self, id: &ProductId) -> bool {
        // Removal never fails validation
        self.apply(CartChange::Removed(id.clone())).unwrap_or(false)
    }

    /// Set a product's quantity. Returns `false` if the product is absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidQuantity`] if `amount` is zero and
    /// [`StoreError::PriceOverflow`] if the total price overflows.
    pub fn update_cart_amount(&mut self, id: &ProductId, amount: u32) -> Result<bool, StoreError> {
        self.apply(CartChange::AmountSet {
            id: id.clone(),
            amount,
        })
    }

    /// Empty the cart.
    pub fn clear_cart(&mut self) {
        // Clearing never fails validation
        let _ = self.apply(CartChange::Cleared);
    }

    /// Apply a confirmed change and persist the result.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the change fails validation; nothing is
    /// applied or persisted.
    pub fn apply(&mut self, change: CartChange) -> Result<bool, StoreError> {
        let matched = self.state.apply(change)?;
        self.persist();

        debug!(
            slot = %self.slot,
            matched,
            lines = self.state.len(),
            total_quantity = self.state.total_quantity(),
            total_price = %self.state.total_price(),
            "Cart updated"
        );
        Ok(matched)
    }

    fn persist(&self) {
        save_json(&self.storage, &self.slot, &self.state);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::rc::Rc;

    use crate::persistence::MemoryStorage;

    use super::*;

    fn item(id: &str, price_cents: i64, amount: u32) -> CartLineItem {
        CartLineItem {
            id: ProductId::new(id),
            title: format!("Product {id}"),
            image: format!("https://cdn.example.com/{id}.jpg"),
            price: Price::from_cents(price_cents).unwrap(),
            amount,
        }
    }

    fn store() -> CartStore<MemoryStorage> {
        CartStore::hydrate(MemoryStorage::new(), DEFAULT_SLOT)
    }

    fn assert_totals_derived(state: &CartState) {
        let quantity: u64 = state.items().iter().map(|i| u64::from(i.amount)).sum();
        let price: Decimal = state.items().iter().map(|i| i.line_price().unwrap()).sum();
        assert_eq!(state.total_quantity(), quantity);
        assert_eq!(state.total_price(), price);
    }

    #[test]
    fn test_scenario_add_merge_update_remove() {
        let mut cart = store();
        let p1 = ProductId::new("p1");

        cart.add_to_cart(item("p1", 2000, 1)).unwrap();
        assert_eq!(cart.state().get(&p1).map(|i| i.amount), Some(1));
        assert_eq!(cart.state().total_quantity(), 1);
        assert_eq!(cart.state().total_price(), Decimal::new(20, 0));

        cart.add_to_cart(item("p1", 2000, 2)).unwrap();
        assert_eq!(cart.state().get(&p1).map(|i| i.amount), Some(3));
        assert_eq!(cart.state().total_price(), Decimal::new(60, 0));

        assert!(cart.update_cart_amount(&p1, 1).unwrap());
        assert_eq!(cart.state().get(&p1).map(|i| i.amount), Some(1));
        assert_eq!(cart.state().total_price(), Decimal::new(20, 0));

        assert!(cart.remove_from_cart(&p1));
        assert!(cart.state().is_empty());
        assert_eq!(cart.state().total_quantity(), 0);
        assert_eq!(cart.state().total_price(), Decimal::ZERO);
    }

    #[test]
    fn test_additive_merge_keeps_single_entry() {
        let mut cart = store();
        for amount in [1, 4, 2, 7] {
            cart.add_to_cart(item("p1", 150, amount)).unwrap();
        }

        assert_eq!(cart.state().len(), 1);
        assert_eq!(cart.state().items()[0].amount, 14);
    }

    #[test]
    fn test_merge_keeps_first_display_fields() {
        let mut cart = store();
        cart.add_to_cart(item("p1", 2000, 1)).unwrap();

        let mut repriced = item("p1", 9999, 1);
        repriced.title = "Renamed".to_string();
        cart.add_to_cart(repriced).unwrap();

        let line = &cart.state().items()[0];
        assert_eq!(line.title, "Product p1");
        assert_eq!(line.price, Price::from_cents(2000).unwrap());
        assert_eq!(line.amount, 2);
    }

    fn max_price_item(id: &str, amount: u32) -> CartLineItem {
        CartLineItem {
            price: Price::new(Decimal::MAX).unwrap(),
            ..item(id, 0, amount)
        }
    }

    #[test]
    fn test_merge_overflow_rejected() {
        let mut cart = store();
        cart.add_to_cart(item("p1", 1, u32::MAX)).unwrap();

        assert_eq!(
            cart.add_to_cart(item("p1", 1, 5)),
            Err(StoreError::InvalidQuantity {
                id: ProductId::new("p1"),
                amount: 5
            })
        );
        assert_eq!(cart.state().items()[0].amount, u32::MAX);
        assert_eq!(cart.state().total_quantity(), u64::from(u32::MAX));
    }

    #[test]
    fn test_price_overflow_rejected_without_side_effects() {
        let storage = Rc::new(MemoryStorage::new());
        let mut cart = CartStore::hydrate(Rc::clone(&storage), DEFAULT_SLOT);
        cart.add_to_cart(item("p1", 2000, 1)).unwrap();
        let before = cart.snapshot();
        let persisted = storage.get_item(DEFAULT_SLOT).unwrap();

        assert_eq!(
            cart.add_to_cart(max_price_item("big", 2)),
            Err(StoreError::PriceOverflow {
                id: ProductId::new("big")
            })
        );
        // Fits alone, but not on top of the existing line
        assert!(matches!(
            cart.add_to_cart(max_price_item("big", 1)),
            Err(StoreError::PriceOverflow { .. })
        ));

        assert_eq!(cart.snapshot(), before);
        assert_eq!(storage.get_item(DEFAULT_SLOT).unwrap(), persisted);
    }

    #[test]
    fn test_amount_update_overflow_rejected() {
        let mut cart = store();
        cart.add_to_cart(max_price_item("big", 1)).unwrap();
        let before = cart.snapshot();

        assert!(matches!(
            cart.update_cart_amount(&ProductId::new("big"), 2),
            Err(StoreError::PriceOverflow { .. })
        ));
        assert_eq!(cart.snapshot(), before);
    }

    #[test]
    fn test_check_does_not_mutate() {
        let mut cart = store();
        cart.add_to_cart(item("p1", 2000, 1)).unwrap();
        let before = cart.snapshot();

        assert!(
            cart.state()
                .check(&CartChange::Added(item("p2", 100, 1)))
                .is_ok()
        );
        assert!(
            cart.state()
                .check(&CartChange::Added(max_price_item("big", 2)))
                .is_err()
        );
        assert_eq!(cart.snapshot(), before);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut cart = store();
        cart.add_to_cart(item("b", 100, 1)).unwrap();
        cart.add_to_cart(item("a", 100, 1)).unwrap();
        cart.add_to_cart(item("c", 100, 1)).unwrap();
        cart.add_to_cart(item("a", 100, 1)).unwrap();

        let ids: Vec<&str> = cart.state().items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["b", "a", "c"]);
    }

    #[test]
    fn test_totals_derived_after_mixed_operations() {
        let mut cart = store();
        cart.add_to_cart(item("p1", 1999, 2)).unwrap();
        cart.add_to_cart(item("p2", 350, 5)).unwrap();
        cart.add_to_cart(item("p3", 10, 1)).unwrap();
        assert_totals_derived(cart.state());

        cart.update_cart_amount(&ProductId::new("p2"), 1).unwrap();
        assert_totals_derived(cart.state());

        cart.remove_from_cart(&ProductId::new("p1"));
        assert_totals_derived(cart.state());

        cart.add_to_cart(item("p3", 10, 9)).unwrap();
        assert_totals_derived(cart.state());
        assert_eq!(cart.state().total_quantity(), 11);
        assert_eq!(cart.state().total_price(), Decimal::new(450, 2));
    }

    #[test]
    fn test_missing_id_is_noop() {
        let mut cart = store();
        cart.add_to_cart(item("p1", 2000, 2)).unwrap();
        let before = cart.snapshot();

        assert!(!cart.remove_from_cart(&ProductId::new("nope")));
        assert!(!cart.update_cart_amount(&ProductId::new("nope"), 3).unwrap());

        assert_eq!(cart.snapshot(), before);
    }

    #[test]
    fn test_clear_resets_fully() {
        let mut cart = store();
        cart.add_to_cart(item("p1", 2000, 2)).unwrap();
        cart.add_to_cart(item("p2", 500, 1)).unwrap();

        cart.clear_cart();

        assert!(cart.state().is_empty());
        assert_eq!(cart.state().total_quantity(), 0);
        assert_eq!(cart.state().total_price(), Decimal::ZERO);
    }

    #[test]
    fn test_zero_amount_rejected_without_side_effects() {
        let storage = Rc::new(MemoryStorage::new());
        let mut cart = CartStore::hydrate(Rc::clone(&storage), DEFAULT_SLOT);
        cart.add_to_cart(item("p1", 2000, 1)).unwrap();
        let persisted = storage.get_item(DEFAULT_SLOT).unwrap();

        assert_eq!(
            cart.add_to_cart(item("p2", 100, 0)),
            Err(StoreError::InvalidQuantity {
                id: ProductId::new("p2"),
                amount: 0
            })
        );
        assert!(matches!(
            cart.update_cart_amount(&ProductId::new("p1"), 0),
            Err(StoreError::InvalidQuantity { amount: 0, .. })
        ));

        assert_eq!(cart.state().len(), 1);
        assert_eq!(cart.state().items()[0].amount, 1);
        assert_eq!(storage.get_item(DEFAULT_SLOT).unwrap(), persisted);
    }

    #[test]
    fn test_empty_id_rejected() {
        let mut cart = store();
        assert_eq!(
            cart.add_to_cart(item("", 100, 1)),
            Err(StoreError::EmptyProductId)
        );
        assert!(cart.state().is_empty());
    }

    #[test]
    fn test_persisted_after_every_mutation() {
        let storage = Rc::new(MemoryStorage::new());
        let mut cart = CartStore::hydrate(Rc::clone(&storage), DEFAULT_SLOT);

        cart.add_to_cart(item("p1", 2000, 3)).unwrap();
        let reloaded = CartStore::hydrate(Rc::clone(&storage), DEFAULT_SLOT);
        assert_eq!(reloaded.snapshot(), cart.snapshot());

        cart.remove_from_cart(&ProductId::new("p1"));
        let reloaded = CartStore::hydrate(Rc::clone(&storage), DEFAULT_SLOT);
        assert!(reloaded.state().is_empty());
    }

    #[test]
    fn test_round_trip_persistence() {
        let mut cart = store();
        cart.add_to_cart(item("p1", 1999, 2)).unwrap();
        cart.add_to_cart(item("p2", 500, 1)).unwrap();

        let json = serde_json::to_string(cart.state()).unwrap();
        let restored: CartState = serde_json::from_str(&json).unwrap();

        assert_eq!(&restored, cart.state());
    }

    #[test]
    fn test_snapshot_field_names() {
        let mut cart = store();
        cart.add_to_cart(item("p1", 2000, 1)).unwrap();

        let value = serde_json::to_value(cart.state()).unwrap();
        assert_eq!(value["totalQuantity"], 1);
        assert_eq!(value["totalPrice"], "20.00");
        assert_eq!(value["items"][0]["id"], "p1");
        assert_eq!(value["items"][0]["amount"], 1);
    }

    #[test]
    fn test_hydrate_rederives_stale_totals() {
        let storage = MemoryStorage::new();
        storage
            .set_item(
                DEFAULT_SLOT,
                r#"{"items":[
                    {"id":"p1","title":"Shirt","image":"","price":20,"amount":2},
                    {"id":"p1","title":"Shirt","image":"","price":20,"amount":1},
                    {"id":"p2","title":"Hat","price":"5.50","amount":0}
                ],"totalQuantity":99,"totalPrice":"1.00"}"#,
            )
            .unwrap();

        let cart = CartStore::hydrate(storage, DEFAULT_SLOT);

        assert_eq!(cart.hydration(), Hydration::Restored);
        assert_eq!(cart.state().len(), 1);
        assert_eq!(cart.state().total_quantity(), 3);
        assert_eq!(cart.state().total_price(), Decimal::new(60, 0));
    }

    #[test]
    fn test_hydrate_drops_overflowing_line() {
        let storage = MemoryStorage::new();
        storage
            .set_item(
                DEFAULT_SLOT,
                r#"{"items":[
                    {"id":"p1","title":"x","price":"79228162514264337593543950335","amount":2},
                    {"id":"p2","title":"Hat","price":"5.50","amount":2}
                ]}"#,
            )
            .unwrap();

        let cart = CartStore::hydrate(storage, DEFAULT_SLOT);

        assert_eq!(cart.state().len(), 1);
        assert!(cart.state().get(&ProductId::new("p1")).is_none());
        assert_eq!(cart.state().total_price(), Decimal::new(11, 0));
    }

    #[test]
    fn test_hydrate_skips_malformed_lines_only() {
        let storage = MemoryStorage::new();
        storage
            .set_item(
                DEFAULT_SLOT,
                r#"{"items":[
                    {"id":"p1","title":"Shirt","price":"-3.00","amount":1},
                    {"id":"p2","title":"Hat","price":"5.50","amount":1},
                    {"title":"No id","price":1,"amount":1},
                    "garbage"
                ]}"#,
            )
            .unwrap();

        let cart = CartStore::hydrate(storage, DEFAULT_SLOT);

        assert_eq!(cart.hydration(), Hydration::Restored);
        assert_eq!(cart.state().len(), 1);
        assert_eq!(cart.state().items()[0].id, ProductId::new("p2"));
        assert_eq!(cart.state().total_price(), Decimal::new(55, 1));
    }

    #[test]
    fn test_hydrate_missing_and_corrupt() {
        let cart = store();
        assert_eq!(cart.hydration(), Hydration::Empty);

        let storage = MemoryStorage::new();
        storage.set_item(DEFAULT_SLOT, "not json").unwrap();
        let cart = CartStore::hydrate(storage, DEFAULT_SLOT);
        assert_eq!(cart.hydration(), Hydration::Discarded);
        assert!(cart.state().is_empty());
    }
}
