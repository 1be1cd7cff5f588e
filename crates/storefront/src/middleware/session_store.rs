//! In-process session store with eviction.
//!
//! Records live in a bounded `moka` cache. Each entry expires at its record's
//! own `expiry_date`, which the session layer pushes forward on every saved
//! request, so abandoned sessions are dropped without a sweeper task.

use std::fmt;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::{Expiry, future::Cache};
use tower_sessions::{
    SessionStore,
    cookie::time::OffsetDateTime,
    session::{Id, Record},
    session_store,
};

/// Most sessions held at once; least recently used are evicted beyond this.
const MAX_SESSIONS: u64 = 100_000;

/// Expire each entry at its record's expiry date.
struct AtExpiryDate;

impl AtExpiryDate {
    fn remaining(record: &Record) -> Duration {
        let left = record.expiry_date - OffsetDateTime::now_utc();
        u64::try_from(left.whole_seconds()).map_or(Duration::ZERO, Duration::from_secs)
    }
}

impl Expiry<Id, Record> for AtExpiryDate {
    fn expire_after_create(
        &self,
        _id: &Id,
        record: &Record,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(Self::remaining(record))
    }

    fn expire_after_update(
        &self,
        _id: &Id,
        record: &Record,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(Self::remaining(record))
    }
}

/// Session store backed by an expiring, size-bounded cache.
#[derive(Clone)]
pub struct CartSessionStore {
    records: Cache<Id, Record>,
}

impl CartSessionStore {
    /// Create a store holding at most `capacity` sessions.
    #[must_use]
    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            records: Cache::builder()
                .max_capacity(capacity)
                .expire_after(AtExpiryDate)
                .build(),
        }
    }

    /// Number of stored sessions, including any not yet evicted.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.records.entry_count()
    }

    /// Whether the store holds no sessions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply pending evictions now instead of on the next writes.
    pub async fn sync(&self) {
        self.records.run_pending_tasks().await;
    }
}

impl Default for CartSessionStore {
    fn default() -> Self {
        Self::with_capacity(MAX_SESSIONS)
    }
}

impl fmt::Debug for CartSessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartSessionStore")
            .field("sessions", &self.records.entry_count())
            .finish()
    }
}

#[async_trait]
impl SessionStore for CartSessionStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        while self.records.contains_key(&record.id) {
            record.id = Id::default();
        }
        self.records.insert(record.id, record.clone()).await;
        Ok(())
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        self.records.insert(record.id, record.clone()).await;
        Ok(())
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        Ok(self
            .records
            .get(session_id)
            .await
            .filter(|record| record.expiry_date > OffsetDateTime::now_utc()))
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        self.records.invalidate(session_id).await;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use tower_sessions::cookie::time::Duration as CookieDuration;

    use super::*;

    fn record(ttl: CookieDuration) -> Record {
        Record {
            id: Id::default(),
            data: HashMap::from([("innovatemart_cart".to_string(), serde_json::json!("{}"))]),
            expiry_date: OffsetDateTime::now_utc() + ttl,
        }
    }

    #[tokio::test]
    async fn test_create_load_delete() {
        let store = CartSessionStore::default();
        let mut rec = record(CookieDuration::minutes(30));

        store.create(&mut rec).await.unwrap();
        assert_eq!(store.load(&rec.id).await.unwrap(), Some(rec.clone()));

        store.delete(&rec.id).await.unwrap();
        assert_eq!(store.load(&rec.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_create_avoids_id_collision() {
        let store = CartSessionStore::default();
        let mut first = record(CookieDuration::minutes(30));
        store.create(&mut first).await.unwrap();

        let mut second = record(CookieDuration::minutes(30));
        second.id = first.id;
        store.create(&mut second).await.unwrap();

        assert_ne!(second.id, first.id);
        assert_eq!(store.load(&first.id).await.unwrap(), Some(first));
    }

    #[tokio::test]
    async fn test_expired_records_are_not_loaded_and_are_evicted() {
        let store = CartSessionStore::default();
        let mut stale = record(CookieDuration::seconds(-5));
        store.create(&mut stale).await.unwrap();

        assert_eq!(store.load(&stale.id).await.unwrap(), None);

        store.sync().await;
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_capacity_bounds_stored_sessions() {
        let store = CartSessionStore::with_capacity(10);
        for _ in 0..50 {
            let mut rec = record(CookieDuration::minutes(30));
            store.create(&mut rec).await.unwrap();
        }

        store.sync().await;
        assert!(store.len() <= 10);
    }
}
