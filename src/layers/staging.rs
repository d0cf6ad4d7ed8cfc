//! Per-layer bookkeeping of staged and interpolated drawing models.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::core::{
    DrawingModel, DrawingModelEntry, DrawingModelInterpolator, EntityKey, ExtraKey, ExtraStore,
    InterpolatedDrawingModel, LinearDrawingModelInterpolator,
};

/// Endpoints of one transition. `None` stands for "nothing drawn".
#[derive(Debug)]
pub struct TransitionStage<E> {
    pub from: Option<Arc<DrawingModel<E>>>,
    pub to: Option<Arc<DrawingModel<E>>>,
}

/// Extra-store slots owned by one layer instance.
pub struct LayerTransition<E: DrawingModelEntry> {
    stage_key: ExtraKey<TransitionStage<E>>,
    snapshot_key: ExtraKey<InterpolatedDrawingModel<E>>,
    interpolator: Arc<dyn DrawingModelInterpolator<E>>,
}

impl<E: DrawingModelEntry> LayerTransition<E> {
    #[must_use]
    pub fn new(purpose: &'static str) -> Self {
        Self::with_interpolator(purpose, Arc::new(LinearDrawingModelInterpolator))
    }

    #[must_use]
    pub fn with_interpolator(
        purpose: &'static str,
        interpolator: Arc<dyn DrawingModelInterpolator<E>>,
    ) -> Self {
        Self {
            stage_key: ExtraKey::unique(purpose),
            snapshot_key: ExtraKey::unique(purpose),
            interpolator,
        }
    }

    /// Stages a transition from whatever is visible now to `target`.
    pub fn prepare(&self, target: Option<DrawingModel<E>>, extra_store: &mut ExtraStore) {
        let from = extra_store
            .get(&self.snapshot_key)
            .map(|snapshot| Arc::new(snapshot.to_drawing_model()))
            .filter(|model| !model.is_empty());
        let to = target.filter(|model| !model.is_empty()).map(Arc::new);
        trace!(
            purpose = self.stage_key.purpose(),
            from = from.as_ref().map_or(0, |m| m.len()),
            to = to.as_ref().map_or(0, |m| m.len()),
            "staging layer transition"
        );
        extra_store.insert(self.stage_key, TransitionStage { from, to });
    }

    /// Stores the snapshot for `fraction`; a no-op when nothing was staged.
    pub fn transform(&self, extra_store: &mut ExtraStore, fraction: f64) {
        let Some(stage) = extra_store.get(&self.stage_key) else {
            return;
        };
        match self
            .interpolator
            .interpolate(stage.from.as_ref(), stage.to.as_ref(), fraction)
        {
            Some(snapshot) => extra_store.insert(self.snapshot_key, snapshot),
            None => {
                extra_store.remove(&self.snapshot_key);
            }
        }
    }

    #[must_use]
    pub fn is_staged(&self, extra_store: &ExtraStore) -> bool {
        extra_store.contains(&self.stage_key)
    }

    #[must_use]
    pub fn snapshot<'s>(
        &self,
        extra_store: &'s ExtraStore,
    ) -> Option<&'s InterpolatedDrawingModel<E>> {
        extra_store.get(&self.snapshot_key)
    }

    /// Entries to draw: the current snapshot once a transition was staged,
    /// otherwise the static model built by `fallback`.
    pub fn entries(
        &self,
        extra_store: &ExtraStore,
        fallback: impl FnOnce() -> Option<DrawingModel<E>>,
    ) -> Vec<(EntityKey, E)> {
        if self.is_staged(extra_store) {
            return self
                .snapshot(extra_store)
                .map(|snapshot| {
                    snapshot
                        .iter()
                        .map(|(key, entry)| (*key, entry.clone()))
                        .collect()
                })
                .unwrap_or_default();
        }
        fallback()
            .map(|model| model.iter().map(|(key, entry)| (*key, entry.clone())).collect())
            .unwrap_or_default()
    }
}

impl<E: DrawingModelEntry> fmt::Debug for LayerTransition<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerTransition")
            .field("stage_key", &self.stage_key)
            .field("interpolator", &self.interpolator)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::LayerTransition;
    use crate::core::primitives::lerp;
    use crate::core::{DrawingModel, DrawingModelEntry, EntityKey, ExtraStore};

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Level(f64);

    impl DrawingModelEntry for Level {
        fn zero(&self) -> Self {
            Self(0.0)
        }

        fn lerp(&self, to: &Self, fraction: f64) -> Self {
            Self(lerp(self.0, to.0, fraction))
        }
    }

    fn model(level: f64) -> DrawingModel<Level> {
        [(EntityKey::new(0.0, 0), Level(level))].into_iter().collect()
    }

    #[test]
    fn restaging_mid_flight_starts_from_visible_state() {
        let transition = LayerTransition::new("test.level");
        let mut store = ExtraStore::new();

        transition.prepare(Some(model(10.0)), &mut store);
        transition.transform(&mut store, 0.5);
        let visible = transition.entries(&store, || None);
        assert_eq!(visible[0].1, Level(5.0));

        transition.prepare(Some(model(0.0)), &mut store);
        transition.transform(&mut store, 0.0);
        assert_eq!(transition.entries(&store, || None)[0].1, Level(5.0));
    }

    #[test]
    fn unstaged_layers_draw_the_static_model() {
        let transition = LayerTransition::<Level>::new("test.level");
        let store = ExtraStore::new();
        let entries = transition.entries(&store, || Some(model(3.0)));
        assert_eq!(entries[0].1, Level(3.0));
    }

    #[test]
    fn fading_everything_out_leaves_nothing_to_draw() {
        let transition = LayerTransition::new("test.level");
        let mut store = ExtraStore::new();
        transition.prepare(Some(model(4.0)), &mut store);
        transition.transform(&mut store, 1.0);

        transition.prepare(None, &mut store);
        transition.transform(&mut store, 1.0);
        let entries = transition.entries(&store, || Some(model(9.0)));
        assert_eq!(entries, vec![(EntityKey::new(0.0, 0), Level(0.0))]);

        transition.prepare(None, &mut store);
        transition.transform(&mut store, 1.0);
        assert!(transition.entries(&store, || Some(model(9.0))).is_empty());
    }
}
