//! In-memory response cache with a fixed TTL and stale fallback on error.

use meteo_core::MeteoError;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::types::{City, CityDetails, ForecastDay};

/// Identity of a cached response: the operation plus its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Cities { postal_code: String },
    CityDetails { code: String },
    Forecast { city_code: String, days: u8 },
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Cities { postal_code } => write!(f, "cities_{}", postal_code),
            CacheKey::CityDetails { code } => write!(f, "details_{}", code),
            CacheKey::Forecast { city_code, days } => write!(f, "weather_{}_{}", city_code, days),
        }
    }
}

/// Values held by the shared response cache.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedPayload {
    Cities(Vec<City>),
    CityDetails(CityDetails),
    Forecast(Vec<ForecastDay>),
}

impl CachedPayload {
    /// Error for a payload found under a key of another kind.
    pub(crate) fn mismatch(&self) -> MeteoError {
        let kind = match self {
            CachedPayload::Cities(_) => "cities",
            CachedPayload::CityDetails(_) => "city details",
            CachedPayload::Forecast(_) => "forecast",
        };
        MeteoError::Format(format!("unexpected cached {} payload", kind))
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    data: V,
    stored_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) < ttl
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total: usize,
    pub valid: usize,
    pub expired: usize,
}

/// Key/value store where each entry is fresh for `ttl` after it was written.
///
/// The lock is held across the whole read-check-fetch-write sequence of
/// [`TtlCache::get_or_fetch`], so a miss triggers at most one fetch even with
/// concurrent callers.
#[derive(Debug)]
pub struct TtlCache<V> {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CacheEntry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the fresh value for `key`, or run `producer` and store its result.
    ///
    /// When `producer` fails and any entry (even expired) exists for `key`,
    /// that entry is returned instead of the error.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: CacheKey, producer: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: fmt::Display,
    {
        let mut entries = self.entries.lock().await;

        if let Some(entry) = entries.get(&key) {
            if entry.is_fresh(self.ttl, Instant::now()) {
                tracing::debug!(key = %key, "Cache hit");
                return Ok(entry.data.clone());
            }
        }

        tracing::debug!(key = %key, "Cache miss");
        Self::store_or_fallback(&mut entries, key, producer().await)
    }

    /// Always run `producer`, storing its result. On failure, fall back to
    /// whatever entry exists for `key` regardless of age.
    pub async fn refresh<F, Fut, E>(&self, key: CacheKey, producer: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: fmt::Display,
    {
        let mut entries = self.entries.lock().await;
        tracing::debug!(key = %key, "Forced refresh");
        Self::store_or_fallback(&mut entries, key, producer().await)
    }

    fn store_or_fallback<E: fmt::Display>(
        entries: &mut HashMap<CacheKey, CacheEntry<V>>,
        key: CacheKey,
        outcome: Result<V, E>,
    ) -> Result<V, E> {
        match outcome {
            Ok(value) => {
                entries.insert(
                    key,
                    CacheEntry {
                        data: value.clone(),
                        stored_at: Instant::now(),
                    },
                );
                Ok(value)
            }
            Err(err) => match entries.get(&key) {
                Some(stale) => {
                    tracing::warn!(key = %key, "Fetch failed, serving cached data: {}", err);
                    Ok(stale.data.clone())
                }
                None => Err(err),
            },
        }
    }

    /// Remove one entry. Returns whether it existed.
    pub async fn invalidate(&self, key: &CacheKey) -> bool {
        self.entries.lock().await.remove(key).is_some()
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
        tracing::debug!("Cache cleared");
    }

    /// Drop every entry whose age is at least the TTL. Returns how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_fresh(self.ttl, now));
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!("Purged {} expired cache entries", removed);
        }
        removed
    }

    pub async fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let entries = self.entries.lock().await;
        let valid = entries
            .values()
            .filter(|entry| entry.is_fresh(self.ttl, now))
            .count();
        CacheStats {
            total: entries.len(),
            valid,
            expired: entries.len() - valid,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn key(pc: &str) -> CacheKey {
        CacheKey::Cities {
            postal_code: pc.to_string(),
        }
    }

    #[test]
    fn test_key_serialization_is_distinct() {
        assert_eq!(key("75001").to_string(), "cities_75001");
        assert_eq!(
            CacheKey::CityDetails {
                code: "75056".into()
            }
            .to_string(),
            "details_75056"
        );
        assert_eq!(
            CacheKey::Forecast {
                city_code: "75056".into(),
                days: 3
            }
            .to_string(),
            "weather_75056_3"
        );
        assert_ne!(
            CacheKey::Forecast {
                city_code: "75056".into(),
                days: 3
            },
            CacheKey::Forecast {
                city_code: "75056".into(),
                days: 4
            }
        );
    }

    #[tokio::test]
    async fn test_fresh_entry_skips_producer() {
        let cache = TtlCache::new(Duration::from_secs(300));
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        for _ in 0..3 {
            let value: Result<u32, String> = cache
                .get_or_fetch(key("75001"), || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .await;
            assert_eq!(value.unwrap(), 7);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_refetches() {
        let cache = TtlCache::new(Duration::ZERO);
        let first: Result<u32, String> = cache.get_or_fetch(key("a"), || async { Ok(1) }).await;
        let second: Result<u32, String> = cache.get_or_fetch(key("a"), || async { Ok(2) }).await;
        assert_eq!(first.unwrap(), 1);
        assert_eq!(second.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_stale_value_masks_failure() {
        let cache = TtlCache::new(Duration::ZERO);
        let _: Result<u32, String> = cache.get_or_fetch(key("a"), || async { Ok(1) }).await;

        let value: Result<u32, String> = cache
            .get_or_fetch(key("a"), || async { Err("upstream down".to_string()) })
            .await;
        assert_eq!(value.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failure_without_prior_entry_propagates() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(300));
        let value: Result<u32, String> = cache
            .get_or_fetch(key("a"), || async { Err("boom".to_string()) })
            .await;
        assert_eq!(value.unwrap_err(), "boom");
        assert_eq!(cache.stats().await.total, 0);
    }

    #[tokio::test]
    async fn test_refresh_always_fetches_but_falls_back() {
        let cache = TtlCache::new(Duration::from_secs(300));
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        for expected in [1u32, 2] {
            let value: Result<u32, String> = cache
                .refresh(key("a"), || async move {
                    Ok(calls.fetch_add(1, Ordering::SeqCst) as u32 + 1)
                })
                .await;
            assert_eq!(value.unwrap(), expected);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let value: Result<u32, String> = cache
            .refresh(key("a"), || async { Err("down".to_string()) })
            .await;
        assert_eq!(value.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_and_clear() {
        let cache = TtlCache::new(Duration::from_secs(300));
        let _: Result<u32, String> = cache.get_or_fetch(key("a"), || async { Ok(1) }).await;
        let _: Result<u32, String> = cache.get_or_fetch(key("b"), || async { Ok(2) }).await;

        assert!(cache.invalidate(&key("a")).await);
        assert!(!cache.invalidate(&key("a")).await);
        assert_eq!(cache.stats().await.total, 1);

        cache.clear().await;
        assert_eq!(cache.stats().await, CacheStats::default());
    }

    #[tokio::test]
    async fn test_purge_and_stats() {
        let cache = TtlCache::new(Duration::ZERO);
        let _: Result<u32, String> = cache.get_or_fetch(key("a"), || async { Ok(1) }).await;
        let _: Result<u32, String> = cache.get_or_fetch(key("b"), || async { Ok(2) }).await;

        assert_eq!(
            cache.stats().await,
            CacheStats {
                total: 2,
                valid: 0,
                expired: 2
            }
        );
        assert_eq!(cache.purge_expired().await, 2);
        assert_eq!(cache.purge_expired().await, 0);
        assert_eq!(cache.stats().await.total, 0);
    }

    #[tokio::test]
    async fn test_fresh_entries_survive_purge() {
        let cache = TtlCache::new(Duration::from_secs(300));
        let _: Result<u32, String> = cache.get_or_fetch(key("a"), || async { Ok(1) }).await;
        assert_eq!(cache.purge_expired().await, 0);
        assert_eq!(cache.stats().await.valid, 1);
    }

    #[tokio::test]
    async fn test_concurrent_misses_fetch_once() {
        let cache = Arc::new(TtlCache::new(Duration::from_secs(300)));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                let value: Result<u32, String> = cache
                    .get_or_fetch(key("75001"), || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        Ok(42)
                    })
                    .await;
                value.unwrap()
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
