//! Order submission payloads.

use serde::{Deserialize, Serialize};

use super::{Cart, ProductId};

/// One ordered product. Names and prices are left out on purpose: the order
/// service reprices from its own catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: ProductId,
    pub quantity: u32,
}

/// Body of `POST /api/orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub items: Vec<OrderLine>,
}

impl OrderRequest {
    /// Returns true if the request has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<&Cart> for OrderRequest {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart
                .items
                .iter()
                .map(|line| OrderLine {
                    id: line.id.clone(),
                    quantity: line.quantity,
                })
                .collect(),
        }
    }
}
