//! Checkout route handler.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use super::{cart_mutation_response, is_htmx};
use crate::cart::CartStore;
use crate::checkout::checkout as submit_cart;
use crate::error::add_breadcrumb;
use crate::render::{self, Notice};
use crate::state::AppState;

/// Submit the cart as an order.
///
/// HTMX requests get a notice fragment with status 200, since HTMX does not
/// swap error responses; the cart-updated trigger fires only when the cart
/// was cleared. Plain form posts get the cart page with the notice and the
/// checkout status code.
#[instrument(skip(state, session, headers))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
) -> Response {
    let store = CartStore::new(session);
    let updates = store.subscribe();

    let (status, notice) = match submit_cart(&store, state.catalog()).await {
        Ok(confirmation) => {
            add_breadcrumb("checkout", "Order created", None);
            (StatusCode::OK, Notice::success(confirmation.message()))
        }
        Err(e) => {
            add_breadcrumb("checkout", "Checkout failed", None);
            (e.status(), Notice::error(e.to_string()))
        }
    };

    if is_htmx(&headers) {
        return cart_mutation_response(&headers, &updates, render::notice(notice));
    }

    let cart = store.get_cart().await;
    (status, render::cart_page(&cart, Some(notice))).into_response()
}
