//! Integration test harness for InnovateMart.
//!
//! Each test starts two in-process servers on ephemeral ports:
//!
//! - [`MockBackend`]: stands in for the remote catalog/orders API and records
//!   every order submission it receives.
//! - [`Storefront`]: the real storefront router pointed at the mock, driven
//!   through a cookie-keeping `reqwest` client so the session (and with it the
//!   cart) survives across requests.
//!
//! ```rust,ignore
//! let backend = MockBackend::start(sample_catalog()).await;
//! let shop = Storefront::start(&backend.url()).await;
//! let resp = shop.get("/").await;
//! assert_eq!(resp.status(), 200);
//! ```

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use innovatemart_storefront::{
    config::{CatalogApiConfig, StorefrontConfig},
    routes,
    state::AppState,
};
use reqwest::{Client, Response};
use serde_json::{Value, json};

/// Header HTMX sends on its requests.
pub const HX_REQUEST: &str = "HX-Request";

/// Catalog used by most tests: a string id, a numeric id, and a product
/// with a description.
#[must_use]
pub fn sample_catalog() -> Value {
    json!({
        "items": [
            { "id": "a", "name": "Widget", "price": 9.99 },
            { "id": 2, "name": "Lamp", "price": 12.5, "description": "Bright and warm" },
        ]
    })
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");

    tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("Test server error");
    });

    addr
}

// ============================================================================
// Mock catalog/orders API
// ============================================================================

struct MockState {
    catalog: Mutex<(StatusCode, Value)>,
    order_status: Mutex<StatusCode>,
    orders: Mutex<Vec<Value>>,
}

/// In-process stand-in for the remote catalog/orders API.
#[derive(Clone)]
pub struct MockBackend {
    addr: SocketAddr,
    state: Arc<MockState>,
}

impl MockBackend {
    /// Start serving `catalog` from `GET /api/catalog`.
    pub async fn start(catalog: Value) -> Self {
        let state = Arc::new(MockState {
            catalog: Mutex::new((StatusCode::OK, catalog)),
            order_status: Mutex::new(StatusCode::CREATED),
            orders: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/api/catalog", get(mock_catalog))
            .route("/api/orders", post(mock_create_order))
            .with_state(Arc::clone(&state));

        let addr = serve(app).await;
        Self { addr, state }
    }

    /// Base URL of the mock API.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Make `GET /api/catalog` answer with `status` and an error body.
    pub fn fail_catalog(&self, status: StatusCode) {
        *lock(&self.state.catalog) = (status, json!({ "error": "catalog unavailable" }));
    }

    /// Make `POST /api/orders` answer with `status`.
    pub fn set_order_status(&self, status: StatusCode) {
        *lock(&self.state.order_status) = status;
    }

    /// Every order body received so far, successful or not.
    #[must_use]
    pub fn orders(&self) -> Vec<Value> {
        lock(&self.state.orders).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn mock_catalog(State(state): State<Arc<MockState>>) -> (StatusCode, Json<Value>) {
    let (status, body) = lock(&state.catalog).clone();
    (status, Json(body))
}

async fn mock_create_order(
    State(state): State<Arc<MockState>>,
    Json(order): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let status = *lock(&state.order_status);
    let mut orders = lock(&state.orders);
    orders.push(order);

    if status.is_success() {
        (status, Json(json!({ "orderId": orders.len() })))
    } else {
        (status, Json(json!({ "error": "order rejected" })))
    }
}

// ============================================================================
// Storefront under test
// ============================================================================

/// A running storefront plus a client that keeps its session cookie.
///
/// Clones share the client and its cookie jar, so they act as the same
/// visitor.
#[derive(Clone)]
pub struct Storefront {
    base_url: String,
    client: Client,
}

impl Storefront {
    /// Start the storefront against the API at `api_url`.
    pub async fn start(api_url: &str) -> Self {
        let config = StorefrontConfig {
            host: [127, 0, 0, 1].into(),
            port: 0,
            base_url: "http://localhost".to_string(),
            api: CatalogApiConfig::new(api_url, Duration::from_secs(5))
                .expect("Invalid mock API URL"),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };
        let state = AppState::new(config).expect("Failed to build storefront state");
        let addr = serve(routes::app(state)).await;

        let client = Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: format!("http://{addr}"),
            client,
        }
    }

    /// Start a mock backend with [`sample_catalog`] and a storefront on it.
    pub async fn with_sample_catalog() -> (MockBackend, Self) {
        let backend = MockBackend::start(sample_catalog()).await;
        let shop = Self::start(&backend.url()).await;
        (backend, shop)
    }

    /// Plain `GET`.
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(format!("{}{path}", self.base_url))
            .send()
            .await
            .expect("GET request failed")
    }

    /// `GET` a page and return its body.
    pub async fn page(&self, path: &str) -> String {
        self.get(path)
            .await
            .text()
            .await
            .expect("Failed to read body")
    }

    /// Plain form `POST`, as a browser without JavaScript sends it.
    pub async fn post(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(format!("{}{path}", self.base_url))
            .form(form)
            .send()
            .await
            .expect("POST request failed")
    }

    /// Form `POST` as HTMX issues it.
    pub async fn htmx_post(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(format!("{}{path}", self.base_url))
            .header(HX_REQUEST, "true")
            .form(form)
            .send()
            .await
            .expect("POST request failed")
    }

    /// The visitor's cart as stored.
    pub async fn cart(&self) -> Value {
        self.get("/cart.json")
            .await
            .json()
            .await
            .expect("Cart is not JSON")
    }
}
