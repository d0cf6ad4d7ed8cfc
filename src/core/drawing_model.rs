use std::cmp::Ordering;

use indexmap::IndexMap;
use ordered_float::OrderedFloat;

/// Identity of one drawable entity across data snapshots.
///
/// Ordered by `x`, then by series index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityKey {
    pub x: OrderedFloat<f64>,
    pub series: u32,
}

impl EntityKey {
    #[must_use]
    pub fn new(x: f64, series: u32) -> Self {
        Self {
            x: OrderedFloat(x),
            series,
        }
    }

    #[must_use]
    pub fn x(self) -> f64 {
        self.x.0
    }
}

impl PartialOrd for EntityKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EntityKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.x
            .cmp(&other.x)
            .then_with(|| self.series.cmp(&other.series))
    }
}

/// Interpolatable geometry of one entity, in layer-relative units.
pub trait DrawingModelEntry: Clone + Send + Sync + 'static {
    /// The entity at zero magnitude: where it grows from and fades out to.
    #[must_use]
    fn zero(&self) -> Self;

    #[must_use]
    fn lerp(&self, to: &Self, fraction: f64) -> Self;
}

/// Entity-keyed geometry snapshot of one layer, iterated in key order.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawingModel<E> {
    entries: IndexMap<EntityKey, E>,
}

impl<E> Default for DrawingModel<E> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<E> DrawingModel<E> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, key: &EntityKey) -> Option<&E> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntityKey, &E)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &EntityKey> {
        self.entries.keys()
    }

    pub(crate) fn entry_at(&self, index: usize) -> Option<&E> {
        self.entries.get_index(index).map(|(_, entry)| entry)
    }
}

impl<E> FromIterator<(EntityKey, E)> for DrawingModel<E> {
    fn from_iter<I: IntoIterator<Item = (EntityKey, E)>>(iter: I) -> Self {
        let mut entries: IndexMap<EntityKey, E> = iter.into_iter().collect();
        entries.sort_unstable_keys();
        Self { entries }
    }
}
