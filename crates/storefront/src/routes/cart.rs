//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! The cart itself lives in the visitor's session under
//! [`CART_STORAGE_KEY`](crate::cart::CART_STORAGE_KEY).

use std::num::NonZeroU32;

use axum::{
    Form, Json,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use innovatemart_core::{Cart, ProductId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::cart_mutation_response;
use crate::cart::CartStore;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::render;
use crate::state::AppState;

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub id: String,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub id: String,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub id: String,
}

fn parse_id(raw: &str) -> Result<ProductId> {
    ProductId::parse(raw).map_err(|e| AppError::BadRequest(e.to_string()))
}

/// Display cart page.
#[instrument(skip(session))]
pub async fn show(session: Session) -> impl IntoResponse {
    let cart = CartStore::new(session).get_cart().await;
    render::cart_page(&cart, None)
}

/// Cart panel fragment (HTMX).
#[instrument(skip(session))]
pub async fn panel(session: Session) -> impl IntoResponse {
    let cart = CartStore::new(session).get_cart().await;
    render::cart_panel(&cart)
}

/// Cart count badge fragment (HTMX).
#[instrument(skip(session))]
pub async fn count(session: Session) -> impl IntoResponse {
    let cart = CartStore::new(session).get_cart().await;
    render::cart_count(&cart)
}

/// Cart in its stored JSON shape.
#[instrument(skip(session))]
pub async fn json(session: Session) -> Json<Cart> {
    Json(CartStore::new(session).get_cart().await)
}

/// Add item to cart.
///
/// The product is looked up in the catalog so the stored name and price come
/// from the catalog, not the form. Returns the updated count badge.
#[instrument(skip(state, session, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let id = parse_id(&form.id)?;
    let quantity = NonZeroU32::new(form.quantity.unwrap_or(1))
        .ok_or_else(|| AppError::BadRequest("quantity must be at least 1".to_string()))?;

    let product = state
        .catalog()
        .find_product(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    let store = CartStore::new(session);
    let updates = store.subscribe();
    let cart = store.add_to_cart(&product, quantity).await?;

    let quantity = quantity.to_string();
    add_breadcrumb(
        "cart",
        "Added product",
        Some(&[("product_id", id.as_str()), ("quantity", quantity.as_str())]),
    );

    Ok(cart_mutation_response(
        &headers,
        &updates,
        render::cart_count(&cart),
    ))
}

/// Set a line's quantity. A quantity of zero removes the line.
///
/// Returns the updated cart panel.
#[instrument(skip(session, headers))]
pub async fn update(
    session: Session,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let id = parse_id(&form.id)?;

    let store = CartStore::new(session);
    let updates = store.subscribe();
    let cart = store.update_quantity(&id, form.quantity).await?;

    Ok(cart_mutation_response(
        &headers,
        &updates,
        render::cart_panel(&cart),
    ))
}

/// Remove a line from the cart.
///
/// Removing an id that is not in the cart leaves the cart unchanged.
#[instrument(skip(session, headers))]
pub async fn remove(
    session: Session,
    headers: HeaderMap,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let id = parse_id(&form.id)?;

    let store = CartStore::new(session);
    let updates = store.subscribe();
    let cart = store.remove_from_cart(&id).await?;

    add_breadcrumb("cart", "Removed product", Some(&[("product_id", id.as_str())]));

    Ok(cart_mutation_response(
        &headers,
        &updates,
        render::cart_panel(&cart),
    ))
}

/// Empty the cart.
#[instrument(skip(session, headers))]
pub async fn clear(session: Session, headers: HeaderMap) -> Result<Response> {
    let store = CartStore::new(session);
    let updates = store.subscribe();
    let cart = store.clear_cart().await?;

    Ok(cart_mutation_response(
        &headers,
        &updates,
        render::cart_panel(&cart),
    ))
}
