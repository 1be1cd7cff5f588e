//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors, added in `main`)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (CSP, framing, referrer)
//! 5. Session lock (one mutating request per session at a time)
//! 6. Session layer (tower-sessions over the expiring in-memory store; holds the cart)

pub mod request_id;
pub mod security_headers;
pub mod session;
pub mod session_lock;
pub mod session_store;

pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
pub use session_lock::{SessionLocks, session_lock_middleware};
pub use session_store::CartSessionStore;
