//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Health check
//!
//! # Products
//! GET  /                       - Product grid
//! GET  /index.html             - Product grid
//! GET  /product.html?id=ID     - Product detail
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart page
//! GET  /cart/panel             - Cart panel (fragment)
//! GET  /cart/count             - Cart count badge (fragment)
//! GET  /cart.json              - Cart as stored
//! POST /cart/add               - Add to cart (returns count badge, triggers cart-updated)
//! POST /cart/update            - Update quantity (returns cart panel)
//! POST /cart/remove            - Remove item (returns cart panel)
//! POST /cart/clear             - Empty the cart (returns cart panel)
//!
//! # Checkout
//! POST /checkout               - Submit order (returns notice)
//! ```
//!
//! Form posts without an `HX-Request` header are answered with a redirect to
//! `/cart` so the site works without JavaScript.

pub mod cart;
pub mod checkout;
pub mod products;

use axum::{
    Router,
    http::{HeaderMap, Request},
    middleware,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use innovatemart_core::Cart;
use tokio::sync::watch;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::state::AppState;

/// Directory served under `/static`.
const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// Request header HTMX sets on every request it issues.
pub const HX_REQUEST: &str = "HX-Request";

/// Response header used to fire client-side events.
pub const HX_TRIGGER: &str = "HX-Trigger";

/// Event fired after every cart mutation; cart widgets re-fetch on it.
pub const CART_UPDATED_EVENT: &str = "cart-updated";

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/panel", get(cart::panel))
        .route("/count", get(cart::count))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Product pages
        .route("/", get(products::index))
        .route("/index.html", get(products::index))
        .route("/product.html", get(products::show))
        // Cart routes
        .nest("/cart", cart_routes())
        .route("/cart.json", get(cart::json))
        // Checkout
        .route("/checkout", post(checkout::checkout))
}

/// Build the complete application with its middleware stack.
///
/// Sentry layers are added by the binary, outside of this router.
pub fn app(state: AppState) -> Router {
    let session_layer = crate::middleware::create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .merge(routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(session_layer)
        .layer(middleware::from_fn_with_state(
            crate::middleware::SessionLocks::new(),
            crate::middleware::session_lock_middleware,
        ))
        .layer(middleware::from_fn(
            crate::middleware::security_headers_middleware,
        ))
        .layer(middleware::from_fn(crate::middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the catalog API.
async fn health() -> &'static str {
    "ok"
}

/// Whether the request was issued by HTMX.
#[must_use]
pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get(HX_REQUEST)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

/// Answer a cart mutation.
///
/// HTMX requests get `fragment`, plus a `cart-updated` trigger when the store
/// published a change. Plain form posts are redirected to the cart page.
pub fn cart_mutation_response(
    headers: &HeaderMap,
    updates: &watch::Receiver<Cart>,
    fragment: impl IntoResponse,
) -> Response {
    if !is_htmx(headers) {
        return Redirect::to("/cart").into_response();
    }

    if updates.has_changed().unwrap_or(false) {
        (
            AppendHeaders([(HX_TRIGGER, CART_UPDATED_EVENT)]),
            fragment,
        )
            .into_response()
    } else {
        fragment.into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use axum::{
        body::{Body, to_bytes},
        http::{HeaderValue, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::config::{CatalogApiConfig, StorefrontConfig};

    /// App whose catalog API is unreachable.
    fn offline_app() -> Router {
        let config = StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            api: CatalogApiConfig::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };
        app(AppState::new(config).unwrap())
    }

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = offline_app().oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "ok");
    }

    #[tokio::test]
    async fn test_new_visitor_has_empty_cart() {
        let response = offline_app().oneshot(get("/cart.json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, r#"{"items":[]}"#);
    }

    #[tokio::test]
    async fn test_cart_count_starts_at_zero() {
        let response = offline_app().oneshot(get("/cart/count")).await.unwrap();
        assert!(body_string(response).await.contains(">0<"));
    }

    #[tokio::test]
    async fn test_catalog_outage_keeps_page_usable() {
        let response = offline_app().oneshot(get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let html = body_string(response).await;
        assert!(html.contains("Failed to load catalog"));
        assert!(html.contains("id=\"cart-count\""));
    }

    #[tokio::test]
    async fn test_detail_without_id_is_not_found() {
        let response = offline_app().oneshot(get("/product.html")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_string(response).await.contains("Product not found."));
    }

    #[tokio::test]
    async fn test_empty_checkout_reports_error_without_network() {
        let response = offline_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/checkout")
                    .header(HX_REQUEST, "true")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(HX_TRIGGER).is_none());
        let html = body_string(response).await;
        assert!(html.contains("notice-error"));
        assert!(html.contains("Cart is empty"));
    }

    #[tokio::test]
    async fn test_add_with_zero_quantity_is_rejected() {
        let response = offline_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/cart/add")
                    .header("content-type", "application/x-www-form-urlencoded")
                    .body(Body::from("id=a&quantity=0"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_plain_form_post_redirects_to_cart() {
        let response = offline_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/cart/clear")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get("location").unwrap(), "/cart");
    }

    #[tokio::test]
    async fn test_noop_mutations_create_no_session() {
        let app = offline_app();
        let noops = [
            ("/cart/remove", "id=a"),
            ("/cart/update", "id=a&quantity=3"),
            ("/cart/clear", ""),
        ];
        for (uri, body) in noops {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri(uri)
                        .header(HX_REQUEST, "true")
                        .header("content-type", "application/x-www-form-urlencoded")
                        .body(Body::from(body))
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK, "{uri}");
            assert!(response.headers().get("set-cookie").is_none(), "{uri}");
            assert!(response.headers().get(HX_TRIGGER).is_none(), "{uri}");
        }
    }

    #[test]
    fn test_is_htmx() {
        let mut headers = HeaderMap::new();
        assert!(!is_htmx(&headers));
        headers.insert(HX_REQUEST, HeaderValue::from_static("true"));
        assert!(is_htmx(&headers));
    }
}
