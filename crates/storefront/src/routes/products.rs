//! Product route handlers.
//!
//! The catalog is fetched on every page view. A catalog failure still renders
//! the page shell with an error message so the cart stays reachable.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use innovatemart_core::ProductId;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::cart::CartStore;
use crate::render;
use crate::state::AppState;

/// Product detail query parameters.
#[derive(Debug, Deserialize)]
pub struct DetailQuery {
    pub id: Option<String>,
}

/// Display the product grid.
#[instrument(skip(state, session))]
pub async fn index(State(state): State<AppState>, session: Session) -> Response {
    let cart = CartStore::new(session).get_cart().await;

    match state.catalog().fetch_catalog().await {
        Ok(products) => render::product_list(&products, &cart).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load catalog");
            (
                StatusCode::BAD_GATEWAY,
                render::catalog_unavailable(&e, &cart),
            )
                .into_response()
        }
    }
}

/// Display a single product.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<DetailQuery>,
) -> Response {
    let cart = CartStore::new(session).get_cart().await;

    let Some(id) = query
        .id
        .as_deref()
        .and_then(|raw| ProductId::parse(raw).ok())
    else {
        return (StatusCode::NOT_FOUND, render::product_detail(None, &cart)).into_response();
    };

    match state.catalog().find_product(&id).await {
        Ok(Some(product)) => render::product_detail(Some(&product), &cart).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, render::product_detail(None, &cart)).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, %id, "Failed to load product");
            (
                StatusCode::BAD_GATEWAY,
                render::product_detail_unavailable(&e, &cart),
            )
                .into_response()
        }
    }
}
