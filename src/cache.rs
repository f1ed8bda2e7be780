//! Request-scoped memoization.
//!
//! A [`RequestCache`] lives for exactly one analysis request. Entries are
//! keyed by the function name plus its full argument list and are dropped
//! with the cache, so nothing leaks between requests or players.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tracing::trace;
use uuid::Uuid;

type Entry = Arc<dyn Any + Send + Sync>;

/// Memoization key: function name plus every argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    function: &'static str,
    args: Vec<String>,
}

impl CacheKey {
    pub fn new<I, A>(function: &'static str, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: ToString,
    {
        Self {
            function,
            args: args.into_iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Hit/miss counters for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub entries: usize,
}

/// Memoization table for one request.
pub struct RequestCache {
    request_id: Uuid,
    entries: Mutex<HashMap<CacheKey, Entry>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl RequestCache {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            entries: Mutex::new(HashMap::new()),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, Entry>> {
        // Entries are only ever inserted whole, so a poisoned map is still consistent
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Look up a value. A value of a different type under the same key is
    /// treated as absent.
    pub fn get<T: Any + Send + Sync>(&self, key: &CacheKey) -> Option<Arc<T>> {
        let entry = self.lock().get(key).cloned()?;
        entry.downcast::<T>().ok()
    }

    pub fn insert<T: Any + Send + Sync>(&self, key: CacheKey, value: T) -> Arc<T> {
        let value = Arc::new(value);
        self.lock().insert(key, value.clone());
        value
    }

    /// Return the cached value for `key`, computing it on first use.
    pub fn get_or_insert_with<T, F>(&self, key: CacheKey, compute: F) -> Arc<T>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        if let Some(value) = self.get::<T>(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(request = %self.request_id, ?key, "cache hit");
            return value;
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        trace!(request = %self.request_id, ?key, "cache miss");
        self.insert(key, compute())
    }

    /// Async variant of [`get_or_insert_with`](Self::get_or_insert_with)
    /// for fallible fetches. Errors are not cached.
    pub async fn get_or_try_insert<T, E, F, Fut>(&self, key: CacheKey, fetch: F) -> Result<Arc<T>, E>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get::<T>(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(request = %self.request_id, ?key, "cache hit");
            return Ok(value);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        trace!(request = %self.request_id, ?key, "cache miss");
        let value = fetch().await?;
        Ok(self.insert(key, value))
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.lock().len(),
        }
    }
}

impl Default for RequestCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RequestCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestCache")
            .field("request_id", &self.request_id)
            .field("stats", &self.stats())
            .finish()
    }
}
