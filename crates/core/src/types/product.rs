//! Catalog products.

use serde::{Deserialize, Serialize};

use super::{Price, ProductId};

/// A purchasable product as served by the remote catalog.
///
/// Products are immutable from the storefront's point of view. A missing
/// `price` is read as zero so that one incomplete entry does not take the
/// whole catalog down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Catalog listing envelope: `{ "items": [...] }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub items: Vec<Product>,
}

impl Catalog {
    /// Find a product by id.
    #[must_use]
    pub fn find(&self, id: &ProductId) -> Option<&Product> {
        self.items.iter().find(|p| &p.id == id)
    }

    /// Consume the envelope and take the product list.
    ///
    /// Entries whose id is blank can never be looked up or added to a cart,
    /// so they are dropped.
    #[must_use]
    pub fn into_items(self) -> Vec<Product> {
        self.items
            .into_iter()
            .filter(|p| !p.id.is_empty())
            .collect()
    }
}
