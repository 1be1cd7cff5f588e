//! Client for the remote catalog and orders API.
//!
//! # Endpoints
//!
//! ```text
//! GET  /api/catalog  -> { "items": [Product] }
//! POST /api/orders   <- { "items": [{ "id", "quantity" }] }
//! ```
//!
//! The catalog service is the source of truth. Every call goes to the
//! network: there is no response cache and no retry loop.
//!
//! # Example
//!
//! ```rust,ignore
//! use innovatemart_storefront::api::CatalogClient;
//!
//! let client = CatalogClient::new(&config.api)?;
//! let products = client.fetch_catalog().await?;
//! ```

use std::sync::Arc;

use innovatemart_core::{Catalog, OrderRequest, Product, ProductId};
use reqwest::StatusCode;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::config::CatalogApiConfig;

/// Number of response body characters kept in errors and logs.
const BODY_EXCERPT_CHARS: usize = 200;

/// Errors that can occur when talking to the catalog API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection, TLS, or timeout failure.
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// Response status.
        status: StatusCode,
        /// Leading part of the response body.
        body: String,
    },

    /// The response body was not the JSON we expected.
    #[error("invalid response body: {0}")]
    Parse(#[from] serde_json::Error),

    /// An endpoint URL could not be built from the base URL.
    #[error("invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// Whether the failure happened on the wire or at the remote service.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Status { .. })
    }
}

/// Client for the catalog/orders API.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    catalog_url: Url,
    orders_url: Url,
}

impl CatalogClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint URLs cannot be derived from the base
    /// URL or the HTTP client cannot be built.
    pub fn new(config: &CatalogApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("innovatemart-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(CatalogClientInner {
                client,
                catalog_url: config.base_url.join("api/catalog")?,
                orders_url: config.base_url.join("api/orders")?,
            }),
        })
    }

    /// Fetch the full product list.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Transport` or `ApiError::Status` when the request
    /// fails, `ApiError::Parse` when the body is not a catalog document.
    #[instrument(skip(self))]
    pub async fn fetch_catalog(&self) -> Result<Vec<Product>, ApiError> {
        let catalog = self.load_catalog().await?;
        tracing::debug!(count = catalog.items.len(), "Fetched catalog");
        Ok(catalog.into_items())
    }

    /// Fetch the catalog and select one product.
    ///
    /// # Errors
    ///
    /// Same as [`Self::fetch_catalog`].
    #[instrument(skip(self, id), fields(id = %id))]
    pub async fn find_product(&self, id: &ProductId) -> Result<Option<Product>, ApiError> {
        let catalog = self.load_catalog().await?;
        Ok(catalog.find(id).cloned())
    }

    async fn load_catalog(&self) -> Result<Catalog, ApiError> {
        let response = self
            .inner
            .client
            .get(self.inner.catalog_url.clone())
            .header("Accept", "application/json")
            .send()
            .await?;

        let body = read_success_body(response, "catalog").await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %excerpt(&body),
                "Failed to parse catalog response"
            );
            ApiError::Parse(e)
        })
    }

    /// Submit an order and return the service's confirmation document.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Transport` or `ApiError::Status` when the request
    /// fails, `ApiError::Parse` when the confirmation is not JSON.
    #[instrument(skip(self, order), fields(lines = order.items.len()))]
    pub async fn submit_order(&self, order: &OrderRequest) -> Result<serde_json::Value, ApiError> {
        let response = self
            .inner
            .client
            .post(self.inner.orders_url.clone())
            .header("Accept", "application/json")
            .json(order)
            .send()
            .await?;

        let body = read_success_body(response, "orders").await?;
        let confirmation = serde_json::from_str(&body)?;

        tracing::info!("Order submitted");
        Ok(confirmation)
    }
}

/// Read a response body, turning non-success statuses into `ApiError::Status`.
async fn read_success_body(
    response: reqwest::Response,
    endpoint: &'static str,
) -> Result<String, ApiError> {
    let status = response.status();

    // Get response body as text first for better error diagnostics
    let body = response.text().await?;

    if !status.is_success() {
        tracing::error!(
            endpoint,
            status = %status,
            body = %excerpt(&body),
            "Catalog API returned non-success status"
        );
        return Err(ApiError::Status {
            status,
            body: excerpt(&body),
        });
    }

    Ok(body)
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}
