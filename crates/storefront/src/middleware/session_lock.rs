//! Per-session request serialization.
//!
//! A cart mutation loads the session, changes the cart and leaves the session
//! layer to write the record back once the handler returns. Mutating requests
//! that carry the same session cookie therefore run one at a time. The layer
//! has to wrap the session layer so the write-back happens under the lock.
//!
//! Safe methods and requests without a session cookie are never held.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::COOKIE},
    middleware::Next,
    response::Response,
};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tower_sessions::cookie::Cookie;

use super::session::SESSION_COOKIE_NAME;

type Slot = Arc<AsyncMutex<()>>;
type SlotMap = Arc<Mutex<HashMap<String, Slot>>>;

/// Registry of per-session locks.
///
/// Entries exist only while a request for that session holds or waits for
/// the lock.
#[derive(Clone, Default)]
pub struct SessionLocks {
    slots: SlotMap,
}

/// Exclusive hold on one session; released on drop.
pub struct SessionGuard {
    key: String,
    slot: Slot,
    held: Option<OwnedMutexGuard<()>>,
    slots: SlotMap,
}

fn lock_map(slots: &Mutex<HashMap<String, Slot>>) -> MutexGuard<'_, HashMap<String, Slot>> {
    slots.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionLocks {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other request holds `key`, then hold it.
    pub async fn lock(&self, key: &str) -> SessionGuard {
        let slot = Arc::clone(lock_map(&self.slots).entry(key.to_owned()).or_default());
        let held = Arc::clone(&slot).lock_owned().await;

        SessionGuard {
            key: key.to_owned(),
            slot,
            held: Some(held),
            slots: Arc::clone(&self.slots),
        }
    }

    /// Number of sessions currently held or waited on.
    #[must_use]
    pub fn active(&self) -> usize {
        lock_map(&self.slots).len()
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        drop(self.held.take());

        // One handle in the map, one here: nobody else is waiting.
        let mut slots = lock_map(&self.slots);
        if Arc::strong_count(&self.slot) == 2 {
            slots.remove(&self.key);
        }
    }
}

/// Value of the session cookie, if the request carries one.
fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .map(|cookie| cookie.value().to_owned())
}

/// Middleware that runs mutating requests of one session one at a time.
pub async fn session_lock_middleware(
    State(locks): State<SessionLocks>,
    request: Request,
    next: Next,
) -> Response {
    if request.method().is_safe() {
        return next.run(request).await;
    }

    let Some(session) = session_cookie(request.headers()) else {
        return next.run(request).await;
    };

    let _guard = locks.lock(&session).await;
    next.run(request).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use axum::{
        Router,
        body::Body,
        http::{self, Method, StatusCode},
        middleware,
        routing::post,
    };
    use tokio::task::JoinSet;
    use tower::ServiceExt;

    use super::*;

    #[test]
    fn test_finds_session_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, "theme=dark; im_session=abc123".parse().unwrap());
        assert_eq!(session_cookie(&headers).as_deref(), Some("abc123"));

        headers.insert(COOKIE, "theme=dark".parse().unwrap());
        assert_eq!(session_cookie(&headers), None);
    }

    #[tokio::test]
    async fn test_same_session_is_exclusive() {
        let locks = SessionLocks::new();
        let first = locks.lock("s1").await;

        let waiting = {
            let locks = locks.clone();
            tokio::spawn(async move { locks.lock("s1").await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiting.is_finished());

        // Other sessions are not blocked
        let other = locks.lock("s2").await;
        assert_eq!(locks.active(), 2);

        drop(first);
        let second = waiting.await.unwrap();
        drop(second);
        drop(other);
        assert_eq!(locks.active(), 0);
    }

    /// Router whose handler counts requests that overlap inside it.
    fn counting_app(inside: Arc<AtomicUsize>, overlaps: Arc<AtomicUsize>) -> Router {
        let handler = move || {
            let inside = Arc::clone(&inside);
            let overlaps = Arc::clone(&overlaps);
            async move {
                if inside.fetch_add(1, Ordering::SeqCst) > 0 {
                    overlaps.fetch_add(1, Ordering::SeqCst);
                }
                tokio::time::sleep(Duration::from_millis(2)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
                StatusCode::OK
            }
        };

        Router::new()
            .route("/cart/add", post(handler))
            .layer(middleware::from_fn_with_state(
                SessionLocks::new(),
                session_lock_middleware,
            ))
    }

    fn post_with_cookie(cookie: &str) -> Request {
        http::Request::builder()
            .method(Method::POST)
            .uri("/cart/add")
            .header(COOKIE, cookie)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_mutations_of_one_session_never_overlap() {
        let inside = Arc::new(AtomicUsize::new(0));
        let overlaps = Arc::new(AtomicUsize::new(0));
        let app = counting_app(Arc::clone(&inside), Arc::clone(&overlaps));

        let mut requests = JoinSet::new();
        for _ in 0..25 {
            let app = app.clone();
            requests.spawn(async move {
                app.oneshot(post_with_cookie("im_session=same"))
                    .await
                    .unwrap()
                    .status()
            });
        }
        while let Some(status) = requests.join_next().await {
            assert_eq!(status.unwrap(), StatusCode::OK);
        }

        assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    }
}
