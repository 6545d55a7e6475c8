//! Memoizing cache for computed artifacts.
//!
//! One cache instance holds one artifact kind, keyed by the artifact's input
//! key. Concurrent requests for the same key share a single computation.
//! Failed computations are not stored, so a later request retries.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

pub struct RequestCache<K, V> {
    kind: &'static str,
    cells: Mutex<HashMap<K, Arc<OnceCell<V>>>>,
}

impl<K, V> RequestCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone,
{
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            cells: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached value for `key`, computing it with `compute` on the
    /// first request.
    pub async fn get_or_try_compute<F, Fut, E>(&self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let cell = {
            let mut cells = self.cells.lock().await;
            cells
                .entry(key.clone())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        if cell.initialized() {
            tracing::trace!("{} cache hit for {:?}", self.kind, key);
        } else {
            tracing::trace!("{} cache miss for {:?}", self.kind, key);
        }

        let value = cell.get_or_try_init(compute).await?;
        Ok(value.clone())
    }

    /// Number of keys with a computed value
    pub async fn len(&self) -> usize {
        let cells = self.cells.lock().await;
        cells.values().filter(|cell| cell.initialized()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
