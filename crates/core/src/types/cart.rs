//! Shopping cart state and merge logic.
//!
//! The cart is a flat list of lines, one per product id. It is stored as a
//! single JSON blob (`{"items":[...]}`) by the storefront, so the serialized
//! shape here is part of the storage format.
//!
//! ## Invariants
//!
//! - Line ids are unique within a cart
//! - Every line has `quantity >= 1`; a line that would reach zero is removed
//! - Mutations keep every subtotal and the cart total representable as a
//!   [`Price`]; a change that would overflow is rejected with [`CartError`]

use core::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use super::{Price, Product, ProductId};

/// Errors raised by cart mutations.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartError {
    /// The change would push a subtotal or the total past the largest
    /// representable amount.
    #[error("cart total would exceed the largest supported amount")]
    TotalOverflow,
}

/// One product in the cart with its aggregated quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub price: Price,
    pub quantity: u32,
}

impl CartLine {
    /// Line subtotal (`price × quantity`), clamped on overflow.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.price.saturating_times(self.quantity)
    }
}

/// A visitor's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<CartLine>,
}

impl Cart {
    /// Returns true if the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up the line for a product.
    #[must_use]
    pub fn line(&self, id: &ProductId) -> Option<&CartLine> {
        self.items.iter().find(|line| &line.id == id)
    }

    /// Add `quantity` of `product`.
    ///
    /// An existing line for the same id has its quantity increased (saturating
    /// at `u32::MAX`); otherwise a new line is appended with the product's
    /// current name and price.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::TotalOverflow`] and leaves the cart unchanged if
    /// the new total would not be representable.
    pub fn add(&mut self, product: &Product, quantity: NonZeroU32) -> Result<(), CartError> {
        let mut next = self.clone();
        if let Some(line) = next.items.iter_mut().find(|line| line.id == product.id) {
            line.quantity = line.quantity.saturating_add(quantity.get());
        } else {
            next.items.push(CartLine {
                id: product.id.clone(),
                name: product.name.clone(),
                price: product.price,
                quantity: quantity.get(),
            });
        }
        self.commit(next)
    }

    /// Remove the line for `id`. Returns whether a line was removed.
    pub fn remove(&mut self, id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|line| &line.id != id);
        self.items.len() != before
    }

    /// Set the quantity of the line for `id`; zero removes the line.
    ///
    /// Returns whether a line was found.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::TotalOverflow`] and leaves the cart unchanged if
    /// the new total would not be representable.
    pub fn set_quantity(&mut self, id: &ProductId, quantity: u32) -> Result<bool, CartError> {
        if quantity == 0 {
            return Ok(self.remove(id));
        }
        let mut next = self.clone();
        let Some(line) = next.items.iter_mut().find(|line| &line.id == id) else {
            return Ok(false);
        };
        line.quantity = quantity;
        self.commit(next)?;
        Ok(true)
    }

    fn commit(&mut self, next: Self) -> Result<(), CartError> {
        next.checked_total().ok_or(CartError::TotalOverflow)?;
        *self = next;
        Ok(())
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of all line quantities (the cart badge count).
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Sum of all line subtotals, clamped on overflow.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(CartLine::subtotal).sum()
    }

    /// Sum of all line subtotals, or `None` if any step overflows.
    #[must_use]
    pub fn checked_total(&self) -> Option<Price> {
        self.items.iter().try_fold(Price::ZERO, |total, line| {
            total.checked_add(line.price.checked_times(line.quantity)?)
        })
    }

    /// Restore the invariants on a cart read back from storage.
    ///
    /// Zero-quantity lines are dropped and repeated ids are merged into the
    /// first occurrence, keeping its name and price.
    #[must_use]
    pub fn normalized(self) -> Self {
        let mut items: Vec<CartLine> = Vec::with_capacity(self.items.len());
        for line in self.items {
            if line.quantity == 0 {
                continue;
            }
            if let Some(existing) = items.iter_mut().find(|l| l.id == line.id) {
                existing.quantity = existing.quantity.saturating_add(line.quantity);
            } else {
                items.push(line);
            }
        }
        Self { items }
    }
}
