//! Checkout: turn the cart into a submitted order.

use axum::http::StatusCode;
use innovatemart_core::OrderRequest;
use thiserror::Error;
use tracing::instrument;

use crate::api::{ApiError, CatalogClient};
use crate::cart::{CartStore, KeyValueStore};

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Checkout was attempted with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// The order service rejected the order or could not be reached.
    #[error("Checkout failed: {0}")]
    Api(#[from] ApiError),
}

impl CheckoutError {
    /// Status code used when reporting this error to the browser.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::EmptyCart => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Api(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

/// A successfully created order.
#[derive(Debug, Clone)]
pub struct OrderConfirmation {
    /// The order service's response body, shown back to the shopper.
    pub body: serde_json::Value,
}

impl OrderConfirmation {
    /// Message shown to the shopper.
    #[must_use]
    pub fn message(&self) -> String {
        format!("Order created: {}", self.body)
    }
}

/// Submit the cart as an order.
///
/// An empty cart is rejected before any network traffic. On success the cart
/// is cleared; on failure it is left exactly as it was.
///
/// # Errors
///
/// Returns `CheckoutError::EmptyCart` for an empty cart and
/// `CheckoutError::Api` if the order could not be submitted.
#[instrument(skip_all)]
pub async fn checkout<S: KeyValueStore>(
    store: &CartStore<S>,
    api: &CatalogClient,
) -> Result<OrderConfirmation, CheckoutError> {
    let order = OrderRequest::from(&store.get_cart().await);
    if order.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let body = api.submit_order(&order).await.inspect_err(|e| {
        tracing::warn!(error = %e, "Order submission failed, cart left intact");
    })?;

    // The order exists at this point; a failed clear must not be reported
    // as a failed checkout.
    if let Err(e) = store.clear_cart().await {
        tracing::error!(error = %e, "Order created but cart could not be cleared");
    }

    tracing::info!(lines = order.items.len(), "Checkout completed");
    Ok(OrderConfirmation { body })
}
