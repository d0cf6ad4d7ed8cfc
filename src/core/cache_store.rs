use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use ordered_float::OrderedFloat;
use smallvec::SmallVec;
use tracing::{trace, warn};

/// One component of a [`CacheKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKeyPart {
    Int(i64),
    Float(OrderedFloat<f64>),
    Text(String),
    Bool(bool),
}

impl From<i64> for CacheKeyPart {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<usize> for CacheKeyPart {
    fn from(value: usize) -> Self {
        Self::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for CacheKeyPart {
    fn from(value: f64) -> Self {
        Self::Float(OrderedFloat(value))
    }
}

impl From<&str> for CacheKeyPart {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for CacheKeyPart {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for CacheKeyPart {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Composite memoization key: a static discriminator plus every input the
/// cached value depends on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    discriminator: &'static str,
    parts: SmallVec<[CacheKeyPart; 4]>,
}

impl CacheKey {
    #[must_use]
    pub fn new(discriminator: &'static str) -> Self {
        Self {
            discriminator,
            parts: SmallVec::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, part: impl Into<CacheKeyPart>) -> Self {
        self.parts.push(part.into());
        self
    }

    #[must_use]
    pub fn discriminator(&self) -> &'static str {
        self.discriminator
    }
}

/// Runtime metrics exposed by a [`CacheStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStoreStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
}

/// Append-only memo of expensive per-frame computations.
///
/// Entries are never evicted one by one; the owner drops the whole store (or
/// calls [`CacheStore::clear`]) when the context it was built for goes away.
#[derive(Default)]
pub struct CacheStore {
    entries: RefCell<HashMap<CacheKey, Arc<dyn Any + Send + Sync>>>,
    hits: Cell<u64>,
    misses: Cell<u64>,
}

impl CacheStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get<T: Any + Send + Sync>(&self, key: &CacheKey) -> Option<Arc<T>> {
        let entries = self.entries.borrow();
        let value = entries.get(key)?.clone();
        value.downcast::<T>().ok()
    }

    /// Returns the memoized value for `key`, computing and storing it on a miss.
    pub fn get_or_insert_with<T, F>(&self, key: CacheKey, compute: F) -> Arc<T>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        let existing = self.entries.borrow().get(&key).cloned();
        if let Some(existing) = existing {
            match existing.downcast::<T>() {
                Ok(value) => {
                    self.hits.set(self.hits.get() + 1);
                    return value;
                }
                Err(_) => {
                    warn!(
                        discriminator = key.discriminator,
                        "cache key reused with a different value type; recomputing"
                    );
                    self.misses.set(self.misses.get() + 1);
                    return Arc::new(compute());
                }
            }
        }

        self.misses.set(self.misses.get() + 1);
        let value = Arc::new(compute());
        trace!(discriminator = key.discriminator, "cache store miss");
        self.entries
            .borrow_mut()
            .insert(key, value.clone() as Arc<dyn Any + Send + Sync>);
        value
    }

    #[must_use]
    pub fn stats(&self) -> CacheStoreStats {
        CacheStoreStats {
            hits: self.hits.get(),
            misses: self.misses.get(),
            size: self.entries.borrow().len(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry and resets the stats.
    pub fn clear(&mut self) {
        self.entries.get_mut().clear();
        self.hits.set(0);
        self.misses.set(0);
    }
}

impl fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("stats", &self.stats())
            .finish()
    }
}
