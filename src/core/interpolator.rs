//! Lazy interpolation between two drawing-model snapshots.

use std::cmp::Ordering;
use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::core::drawing_model::{DrawingModel, DrawingModelEntry, EntityKey};

/// Produces the intermediate snapshot between `old` and `new` at `fraction`.
pub trait DrawingModelInterpolator<E: DrawingModelEntry>: fmt::Debug + Send + Sync {
    fn interpolate(
        &self,
        old: Option<&Arc<DrawingModel<E>>>,
        new: Option<&Arc<DrawingModel<E>>>,
        fraction: f64,
    ) -> Option<InterpolatedDrawingModel<E>>;
}

/// Matches entries by [`EntityKey`] and lerps them; unmatched entries fade
/// through their zero state.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearDrawingModelInterpolator;

impl<E: DrawingModelEntry> DrawingModelInterpolator<E> for LinearDrawingModelInterpolator {
    fn interpolate(
        &self,
        old: Option<&Arc<DrawingModel<E>>>,
        new: Option<&Arc<DrawingModel<E>>>,
        fraction: f64,
    ) -> Option<InterpolatedDrawingModel<E>> {
        if old.is_none() && new.is_none() {
            debug!("interpolation requested without either snapshot; nothing to draw");
            return None;
        }
        Some(InterpolatedDrawingModel::build(
            old.cloned(),
            new.cloned(),
            fraction.clamp(0.0, 1.0),
        ))
    }
}

#[derive(Debug, Clone, Copy)]
enum Source {
    Both { from: usize, to: usize },
    Vanishing { from: usize },
    Appearing { to: usize },
}

struct Slot<E> {
    key: EntityKey,
    source: Source,
    value: OnceLock<E>,
}

/// Interpolated snapshot whose entries are computed on first read.
pub struct InterpolatedDrawingModel<E> {
    old: Option<Arc<DrawingModel<E>>>,
    new: Option<Arc<DrawingModel<E>>>,
    fraction: f64,
    slots: Vec<Slot<E>>,
}

impl<E: DrawingModelEntry> InterpolatedDrawingModel<E> {
    fn build(
        old: Option<Arc<DrawingModel<E>>>,
        new: Option<Arc<DrawingModel<E>>>,
        fraction: f64,
    ) -> Self {
        let old_keys: Vec<EntityKey> = old
            .as_deref()
            .map(|model| model.keys().copied().collect())
            .unwrap_or_default();
        let new_keys: Vec<EntityKey> = new
            .as_deref()
            .map(|model| model.keys().copied().collect())
            .unwrap_or_default();

        let mut slots = Vec::with_capacity(old_keys.len().max(new_keys.len()));
        let (mut i, mut j) = (0, 0);
        while i < old_keys.len() || j < new_keys.len() {
            let ordering = match (old_keys.get(i), new_keys.get(j)) {
                (Some(a), Some(b)) => a.cmp(b),
                (Some(_), None) => Ordering::Less,
                _ => Ordering::Greater,
            };
            let (key, source) = match ordering {
                Ordering::Equal => {
                    let slot = (old_keys[i], Source::Both { from: i, to: j });
                    i += 1;
                    j += 1;
                    slot
                }
                Ordering::Less => {
                    let slot = (old_keys[i], Source::Vanishing { from: i });
                    i += 1;
                    slot
                }
                Ordering::Greater => {
                    let slot = (new_keys[j], Source::Appearing { to: j });
                    j += 1;
                    slot
                }
            };
            slots.push(Slot {
                key,
                source,
                value: OnceLock::new(),
            });
        }

        Self {
            old,
            new,
            fraction,
            slots,
        }
    }

    fn evaluate<'a>(&'a self, slot: &'a Slot<E>) -> Option<&'a E> {
        if let Some(value) = slot.value.get() {
            return Some(value);
        }
        let old_at = |index| self.old.as_deref().and_then(|m| m.entry_at(index));
        let new_at = |index| self.new.as_deref().and_then(|m| m.entry_at(index));
        let value = match slot.source {
            Source::Both { from, to } => old_at(from)?.lerp(new_at(to)?, self.fraction),
            Source::Vanishing { from } => {
                let from = old_at(from)?;
                from.lerp(&from.zero(), self.fraction)
            }
            Source::Appearing { to } => {
                let to = new_at(to)?;
                to.zero().lerp(to, self.fraction)
            }
        };
        Some(slot.value.get_or_init(|| value))
    }

    #[must_use]
    pub fn get(&self, key: &EntityKey) -> Option<&E> {
        let index = self
            .slots
            .binary_search_by(|slot| slot.key.cmp(key))
            .ok()?;
        self.evaluate(&self.slots[index])
    }

    /// Every entity of the union of both snapshots, in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&EntityKey, &E)> {
        self.slots
            .iter()
            .filter_map(|slot| self.evaluate(slot).map(|value| (&slot.key, value)))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    /// Number of entries computed so far.
    #[must_use]
    pub fn evaluated_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.value.get().is_some())
            .count()
    }

    /// Materializes the snapshot, e.g. as the starting point of the next
    /// transition. Entries that have completely vanished are dropped.
    #[must_use]
    pub fn to_drawing_model(&self) -> DrawingModel<E> {
        let finished = self.fraction >= 1.0;
        self.slots
            .iter()
            .filter(|slot| !(finished && matches!(slot.source, Source::Vanishing { .. })))
            .filter_map(|slot| self.evaluate(slot).map(|value| (slot.key, value.clone())))
            .collect()
    }
}

impl<E> fmt::Debug for InterpolatedDrawingModel<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterpolatedDrawingModel")
            .field("fraction", &self.fraction)
            .field("len", &self.slots.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{DrawingModelInterpolator, LinearDrawingModelInterpolator};
    use crate::core::drawing_model::{DrawingModel, DrawingModelEntry, EntityKey};

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Height(f64);

    impl DrawingModelEntry for Height {
        fn zero(&self) -> Self {
            Self(0.0)
        }

        fn lerp(&self, to: &Self, fraction: f64) -> Self {
            Self(crate::core::primitives::lerp(self.0, to.0, fraction))
        }
    }

    fn model(entries: &[(f64, f64)]) -> Arc<DrawingModel<Height>> {
        Arc::new(
            entries
                .iter()
                .map(|(x, h)| (EntityKey::new(*x, 0), Height(*h)))
                .collect(),
        )
    }

    #[test]
    fn both_absent_is_a_no_op() {
        let result =
            DrawingModelInterpolator::<Height>::interpolate(&LinearDrawingModelInterpolator, None, None, 0.5);
        assert!(result.is_none());
    }

    #[test]
    fn entries_are_evaluated_lazily_and_once() {
        let old = model(&[(0.0, 2.0), (1.0, 4.0)]);
        let new = model(&[(0.0, 4.0), (1.0, 8.0)]);
        let snapshot = LinearDrawingModelInterpolator
            .interpolate(Some(&old), Some(&new), 0.5)
            .expect("snapshot");

        assert_eq!(snapshot.evaluated_count(), 0);
        assert_eq!(snapshot.get(&EntityKey::new(1.0, 0)), Some(&Height(6.0)));
        assert_eq!(snapshot.evaluated_count(), 1);
        let first = snapshot.get(&EntityKey::new(1.0, 0)).map(|h| h as *const Height);
        let second = snapshot.get(&EntityKey::new(1.0, 0)).map(|h| h as *const Height);
        assert_eq!(first, second);
    }

    #[test]
    fn unmatched_entries_fade_through_zero() {
        let old = model(&[(0.0, 10.0)]);
        let new = model(&[(1.0, 10.0)]);
        let snapshot = LinearDrawingModelInterpolator
            .interpolate(Some(&old), Some(&new), 0.25)
            .expect("snapshot");

        let values: Vec<f64> = snapshot.iter().map(|(_, h)| h.0).collect();
        assert_eq!(values, vec![7.5, 2.5]);
    }

    #[test]
    fn materializing_a_finished_snapshot_drops_vanished_entries() {
        let old = model(&[(0.0, 10.0), (1.0, 1.0)]);
        let new = model(&[(1.0, 3.0)]);
        let snapshot = LinearDrawingModelInterpolator
            .interpolate(Some(&old), Some(&new), 1.0)
            .expect("snapshot");

        let materialized = snapshot.to_drawing_model();
        assert_eq!(materialized.len(), 1);
        assert_eq!(materialized.get(&EntityKey::new(1.0, 0)), Some(&Height(3.0)));
    }
}
