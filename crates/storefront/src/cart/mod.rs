//! Cart store.
//!
//! [`CartStore`] owns the authoritative copy of a visitor's cart. The cart is
//! kept as one JSON blob under [`CART_STORAGE_KEY`] in a [`KeyValueStore`],
//! and every mutation is written back before the call returns. Mutations
//! that change nothing write nothing.
//!
//! Reads fail soft: a missing, unreadable or corrupt blob is an empty cart.
//! Writes propagate [`CartStoreError`].
//!
//! Subscribers registered with [`CartStore::subscribe`] receive the new cart
//! after each persisted mutation; the HTTP layer uses this to decide when to
//! tell the page to refresh its cart widgets.
//!
//! A `CartStore` does not serialize concurrent writers itself; the HTTP layer
//! holds a per-session lock around each mutating request (see
//! [`crate::middleware::session_lock`]).

mod storage;

use std::num::NonZeroU32;

use innovatemart_core::{Cart, CartError, Product, ProductId};
use thiserror::Error;
use tokio::sync::watch;
use tracing::instrument;

pub use storage::{KeyValueStore, MemoryStorage, StorageError};

/// Storage key holding the serialized cart.
pub const CART_STORAGE_KEY: &str = "innovatemart_cart";

/// Errors returned by cart mutations.
#[derive(Debug, Error)]
pub enum CartStoreError {
    /// The updated cart could not be persisted.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The mutation was refused; the stored cart is unchanged.
    #[error(transparent)]
    Rejected(#[from] CartError),
}

/// Read/mutate/subscribe access to one visitor's cart.
pub struct CartStore<S> {
    storage: S,
    updates: watch::Sender<Cart>,
}

impl<S: KeyValueStore> CartStore<S> {
    /// Create a store over `storage`.
    pub fn new(storage: S) -> Self {
        let (updates, _) = watch::channel(Cart::default());
        Self { storage, updates }
    }

    /// Subscribe to cart changes made through this store.
    ///
    /// The receiver starts with its current value marked as seen; it is
    /// flagged as changed after every persisted mutation.
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.updates.subscribe()
    }

    /// Load the cart. Never fails: bad or missing data yields an empty cart.
    pub async fn get_cart(&self) -> Cart {
        let raw = match self.storage.get_item(CART_STORAGE_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Cart::default(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stored cart, using empty cart");
                return Cart::default();
            }
        };

        match serde_json::from_str::<Cart>(&raw) {
            Ok(cart) => cart.normalized(),
            Err(e) => {
                tracing::warn!(error = %e, "Stored cart is corrupt, using empty cart");
                Cart::default()
            }
        }
    }

    /// Add `quantity` of `product`, merging with an existing line.
    ///
    /// # Errors
    ///
    /// Returns `CartStoreError::Rejected` if the cart total would overflow,
    /// `CartStoreError::Storage` if the updated cart cannot be persisted.
    #[instrument(skip(self, product), fields(id = %product.id))]
    pub async fn add_to_cart(
        &self,
        product: &Product,
        quantity: NonZeroU32,
    ) -> Result<Cart, CartStoreError> {
        let mut cart = self.get_cart().await;
        cart.add(product, quantity).inspect_err(|e| {
            tracing::warn!(error = %e, "Add to cart refused");
        })?;
        self.save(cart).await
    }

    /// Remove the line for `id`; unknown ids leave the cart unchanged.
    ///
    /// # Errors
    ///
    /// Returns `CartStoreError::Storage` if the cart cannot be persisted.
    #[instrument(skip(self, id), fields(id = %id))]
    pub async fn remove_from_cart(&self, id: &ProductId) -> Result<Cart, CartStoreError> {
        let mut cart = self.get_cart().await;
        if !cart.remove(id) {
            tracing::debug!("Remove requested for product not in cart");
            return Ok(cart);
        }
        self.save(cart).await
    }

    /// Set the quantity for `id`; zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns `CartStoreError::Rejected` if the cart total would overflow,
    /// `CartStoreError::Storage` if the cart cannot be persisted.
    #[instrument(skip(self, id), fields(id = %id))]
    pub async fn update_quantity(
        &self,
        id: &ProductId,
        quantity: u32,
    ) -> Result<Cart, CartStoreError> {
        let mut cart = self.get_cart().await;
        if !cart.set_quantity(id, quantity)? {
            tracing::debug!("Quantity update for product not in cart");
            return Ok(cart);
        }
        self.save(cart).await
    }

    /// Empty the cart by deleting the stored blob.
    ///
    /// # Errors
    ///
    /// Returns `CartStoreError::Storage` if the blob cannot be read or removed.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<Cart, CartStoreError> {
        if self.storage.get_item(CART_STORAGE_KEY).await?.is_none() {
            return Ok(Cart::default());
        }
        self.storage.remove_item(CART_STORAGE_KEY).await?;
        self.updates.send_replace(Cart::default());
        Ok(Cart::default())
    }

    async fn save(&self, cart: Cart) -> Result<Cart, CartStoreError> {
        let raw = serde_json::to_string(&cart).map_err(StorageError::from)?;
        self.storage.set_item(CART_STORAGE_KEY, raw).await?;
        self.updates.send_replace(cart.clone());
        Ok(cart)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use innovatemart_core::Price;

    use super::*;

    fn widget() -> Product {
        Product {
            id: ProductId::from("a"),
            name: "Widget".to_string(),
            price: Price::from_cents(999),
            description: None,
        }
    }

    fn qty(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    fn store() -> (CartStore<MemoryStorage>, MemoryStorage) {
        let storage = MemoryStorage::new();
        (CartStore::new(storage.clone()), storage)
    }

    #[tokio::test]
    async fn test_empty_when_nothing_stored() {
        let (store, _) = store();
        assert!(store.get_cart().await.is_empty());
    }

    #[tokio::test]
    async fn test_add_is_persisted_immediately() {
        let (store, storage) = store();
        store.add_to_cart(&widget(), qty(1)).await.unwrap();

        assert_eq!(
            storage.raw(CART_STORAGE_KEY).unwrap(),
            r#"{"items":[{"id":"a","name":"Widget","price":9.99,"quantity":1}]}"#
        );
    }

    #[tokio::test]
    async fn test_add_same_product_accumulates() {
        let (store, _) = store();
        store.add_to_cart(&widget(), qty(1)).await.unwrap();
        let cart = store.add_to_cart(&widget(), qty(2)).await.unwrap();

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 3);
        assert_eq!(store.get_cart().await, cart);
    }

    #[tokio::test]
    async fn test_remove_unknown_id_leaves_cart_unchanged() {
        let (store, storage) = store();
        let before = store.add_to_cart(&widget(), qty(2)).await.unwrap();

        let updates = store.subscribe();
        let raw = storage.raw(CART_STORAGE_KEY);

        let after = store.remove_from_cart(&ProductId::from("zzz")).await.unwrap();
        assert_eq!(after, before);
        assert_eq!(storage.raw(CART_STORAGE_KEY), raw);
        assert!(!updates.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_noop_mutations_write_nothing() {
        let (store, storage) = store();
        let updates = store.subscribe();

        store.remove_from_cart(&ProductId::from("a")).await.unwrap();
        store.update_quantity(&ProductId::from("a"), 4).await.unwrap();
        store.clear_cart().await.unwrap();

        assert_eq!(storage.raw(CART_STORAGE_KEY), None);
        assert!(!updates.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_overflowing_add_is_refused_and_not_stored() {
        let (store, storage) = store();
        let yacht = Product {
            price: serde_json::from_str("1e28").unwrap(),
            ..widget()
        };
        store.add_to_cart(&yacht, qty(1)).await.unwrap();
        let raw = storage.raw(CART_STORAGE_KEY);

        let err = store.add_to_cart(&yacht, qty(10)).await.unwrap_err();
        assert!(matches!(err, CartStoreError::Rejected(CartError::TotalOverflow)));
        assert_eq!(storage.raw(CART_STORAGE_KEY), raw);
    }

    #[tokio::test]
    async fn test_corrupt_blob_reads_as_empty() {
        let (store, storage) = store();
        for corrupt in ["{not json", "null", "[]", r#"{"items":[{"id":"a"}]}"#] {
            storage.put_raw(CART_STORAGE_KEY, corrupt);
            assert_eq!(store.get_cart().await, Cart::default(), "blob: {corrupt}");
        }
    }

    #[tokio::test]
    async fn test_corrupt_blob_is_replaced_on_next_write() {
        let (store, storage) = store();
        storage.put_raw(CART_STORAGE_KEY, "garbage");

        let cart = store.add_to_cart(&widget(), qty(1)).await.unwrap();
        assert_eq!(cart.items.len(), 1);
        assert!(storage.raw(CART_STORAGE_KEY).unwrap().starts_with("{\"items\""));
    }

    #[tokio::test]
    async fn test_duplicate_lines_in_storage_are_merged() {
        let (store, storage) = store();
        storage.put_raw(
            CART_STORAGE_KEY,
            r#"{"items":[{"id":"a","name":"Widget","price":9.99,"quantity":1},{"id":"a","name":"Widget","price":9.99,"quantity":4}]}"#,
        );

        let cart = store.get_cart().await;
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.item_count(), 5);
    }

    #[tokio::test]
    async fn test_update_quantity_zero_removes() {
        let (store, _) = store();
        store.add_to_cart(&widget(), qty(3)).await.unwrap();

        let cart = store.update_quantity(&ProductId::from("a"), 0).await.unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_clear_removes_stored_cart() {
        let (store, storage) = store();
        store.add_to_cart(&widget(), qty(3)).await.unwrap();
        let updates = store.subscribe();

        store.clear_cart().await.unwrap();
        assert_eq!(storage.raw(CART_STORAGE_KEY), None);
        assert!(store.get_cart().await.is_empty());
        assert!(updates.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_clear_discards_corrupt_blob() {
        let (store, storage) = store();
        storage.put_raw(CART_STORAGE_KEY, "garbage");

        store.clear_cart().await.unwrap();
        assert_eq!(storage.raw(CART_STORAGE_KEY), None);
    }

    #[tokio::test]
    async fn test_subscribers_see_mutations() {
        let (store, _) = store();
        let mut updates = store.subscribe();
        assert!(!updates.has_changed().unwrap());

        store.add_to_cart(&widget(), qty(2)).await.unwrap();
        assert!(updates.has_changed().unwrap());
        assert_eq!(updates.borrow_and_update().item_count(), 2);

        store.remove_from_cart(&ProductId::from("a")).await.unwrap();
        assert!(updates.has_changed().unwrap());
        assert!(updates.borrow_and_update().is_empty());
    }

    #[tokio::test]
    async fn test_reads_do_not_notify() {
        let (store, _) = store();
        let updates = store.subscribe();
        let _ = store.get_cart().await;
        assert!(!updates.has_changed().unwrap());
    }
}
