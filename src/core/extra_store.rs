//! Immutable-snapshot key-value store used to attach per-pass auxiliary data
//! (staged drawing models, interpolation snapshots) to a chart without touching
//! the data model.
//!
//! Every mutation creates a new head node that points at the previous one, so
//! clones taken earlier keep observing their own snapshot. Lookups walk the
//! delta chain; once the chain grows past [`MAX_OVERLAY_DEPTH`] it is folded
//! into a flat map so lookups stay bounded.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

const MAX_OVERLAY_DEPTH: usize = 16;

static NEXT_KEY_INSTANCE: AtomicU64 = AtomicU64::new(1);

/// Typed key into an [`ExtraStore`].
///
/// Two keys address the same slot only when purpose, instance and value type
/// all match. `new` keys are shared by purpose; `unique` keys are private to
/// whoever created them (for example one layer instance).
pub struct ExtraKey<T> {
    purpose: &'static str,
    instance: u64,
    _value: PhantomData<fn() -> T>,
}

impl<T> ExtraKey<T> {
    #[must_use]
    pub const fn new(purpose: &'static str) -> Self {
        Self {
            purpose,
            instance: 0,
            _value: PhantomData,
        }
    }

    #[must_use]
    pub fn unique(purpose: &'static str) -> Self {
        Self {
            purpose,
            instance: NEXT_KEY_INSTANCE.fetch_add(1, Ordering::Relaxed),
            _value: PhantomData,
        }
    }

    #[must_use]
    pub fn purpose(&self) -> &'static str {
        self.purpose
    }
}

impl<T: 'static> ExtraKey<T> {
    fn erased(&self) -> ErasedKey {
        ErasedKey {
            purpose: self.purpose,
            instance: self.instance,
            type_id: TypeId::of::<T>(),
        }
    }
}

impl<T> Clone for ExtraKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ExtraKey<T> {}

impl<T> PartialEq for ExtraKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.purpose == other.purpose && self.instance == other.instance
    }
}

impl<T> Eq for ExtraKey<T> {}

impl<T> fmt::Debug for ExtraKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtraKey")
            .field("purpose", &self.purpose)
            .field("instance", &self.instance)
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ErasedKey {
    purpose: &'static str,
    instance: u64,
    type_id: TypeId,
}

type StoreValue = Arc<dyn Any + Send + Sync>;

enum StoreNode {
    Delta {
        key: ErasedKey,
        // `None` marks a removal.
        value: Option<StoreValue>,
        parent: Option<Arc<StoreNode>>,
        depth: usize,
    },
    Flat(HashMap<ErasedKey, StoreValue>),
}

impl StoreNode {
    fn depth(&self) -> usize {
        match self {
            Self::Delta { depth, .. } => *depth,
            Self::Flat(_) => 0,
        }
    }
}

/// Copy-on-write store of typed values.
#[derive(Clone, Default)]
pub struct ExtraStore {
    head: Option<Arc<StoreNode>>,
}

impl ExtraStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get<T: Any + Send + Sync>(&self, key: &ExtraKey<T>) -> Option<&T> {
        self.lookup(key.erased())
            .and_then(|value| (**value).downcast_ref::<T>())
    }

    #[must_use]
    pub fn contains<T: Any + Send + Sync>(&self, key: &ExtraKey<T>) -> bool {
        self.get(key).is_some()
    }

    pub fn insert<T: Any + Send + Sync>(&mut self, key: ExtraKey<T>, value: T) {
        self.push(key.erased(), Some(Arc::new(value)));
    }

    /// Returns a new snapshot with `key` set, leaving `self` untouched.
    #[must_use]
    pub fn with<T: Any + Send + Sync>(&self, key: ExtraKey<T>, value: T) -> Self {
        let mut next = self.clone();
        next.insert(key, value);
        next
    }

    /// Removes `key`, returning whether a value was present.
    pub fn remove<T: Any + Send + Sync>(&mut self, key: &ExtraKey<T>) -> bool {
        let erased = key.erased();
        if self.lookup(erased).is_none() {
            return false;
        }
        self.push(erased, None);
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        flatten(self.head.as_deref()).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Length of the delta chain above the last flat node.
    #[must_use]
    pub fn overlay_depth(&self) -> usize {
        self.head.as_deref().map_or(0, StoreNode::depth)
    }

    fn lookup(&self, key: ErasedKey) -> Option<&StoreValue> {
        let mut node = self.head.as_deref();
        while let Some(current) = node {
            match current {
                StoreNode::Delta {
                    key: node_key,
                    value,
                    parent,
                    ..
                } => {
                    if *node_key == key {
                        return value.as_ref();
                    }
                    node = parent.as_deref();
                }
                StoreNode::Flat(map) => return map.get(&key),
            }
        }
        None
    }

    fn push(&mut self, key: ErasedKey, value: Option<StoreValue>) {
        let mut parent = self.head.take();
        let mut depth = parent.as_deref().map_or(0, StoreNode::depth) + 1;
        if depth > MAX_OVERLAY_DEPTH {
            parent = Some(Arc::new(StoreNode::Flat(flatten(parent.as_deref()))));
            depth = 1;
        }
        self.head = Some(Arc::new(StoreNode::Delta {
            key,
            value,
            parent,
            depth,
        }));
    }
}

fn flatten(head: Option<&StoreNode>) -> HashMap<ErasedKey, StoreValue> {
    let mut deltas = Vec::new();
    let mut base = HashMap::new();
    let mut node = head;
    while let Some(current) = node {
        match current {
            StoreNode::Delta {
                key, value, parent, ..
            } => {
                deltas.push((*key, value.clone()));
                node = parent.as_deref();
            }
            StoreNode::Flat(map) => {
                base = map.clone();
                break;
            }
        }
    }

    for (key, value) in deltas.into_iter().rev() {
        match value {
            Some(value) => {
                base.insert(key, value);
            }
            None => {
                base.remove(&key);
            }
        }
    }
    base
}

impl fmt::Debug for ExtraStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flat = flatten(self.head.as_deref());
        let mut purposes: Vec<&'static str> = flat.keys().map(|key| key.purpose).collect();
        purposes.sort_unstable();
        f.debug_struct("ExtraStore")
            .field("keys", &purposes)
            .field("overlay_depth", &self.overlay_depth())
            .finish()
    }
}
