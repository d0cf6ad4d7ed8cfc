use std::sync::Arc;

use cartesian_chart::core::{
    DrawingModel, DrawingModelInterpolator, EntityKey, LinearDrawingModelInterpolator,
};
use cartesian_chart::layers::ColumnEntry;
use proptest::prelude::*;

fn model(entries: &[(u8, f64)]) -> Arc<DrawingModel<ColumnEntry>> {
    Arc::new(
        entries
            .iter()
            .map(|(x, end)| {
                (
                    EntityKey::new(f64::from(*x), 0),
                    ColumnEntry {
                        start_fraction: 0.0,
                        end_fraction: *end,
                    },
                )
            })
            .collect(),
    )
}

fn entries() -> impl Strategy<Value = Vec<(u8, f64)>> {
    proptest::collection::vec((0u8..20, 0.0f64..1.0), 0..12)
}

proptest! {
    #[test]
    fn snapshot_covers_the_union_of_keys(
        old in entries(),
        new in entries(),
        fraction in 0.0f64..=1.0
    ) {
        let (old, new) = (model(&old), model(&new));
        let snapshot = LinearDrawingModelInterpolator
            .interpolate(Some(&old), Some(&new), fraction)
            .expect("snapshot");

        let mut expected: Vec<EntityKey> = old.keys().chain(new.keys()).copied().collect();
        expected.sort();
        expected.dedup();
        let actual: Vec<EntityKey> = snapshot.iter().map(|(key, _)| *key).collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn interpolated_values_stay_between_endpoints(
        old in entries(),
        new in entries(),
        fraction in 0.0f64..=1.0
    ) {
        let (old, new) = (model(&old), model(&new));
        let snapshot = LinearDrawingModelInterpolator
            .interpolate(Some(&old), Some(&new), fraction)
            .expect("snapshot");

        for (key, entry) in snapshot.iter() {
            let from = old.get(key).map_or(0.0, |entry| entry.end_fraction);
            let to = new.get(key).map_or(0.0, |entry| entry.end_fraction);
            let (low, high) = (from.min(to), from.max(to));
            prop_assert!(entry.end_fraction >= low - 1e-12);
            prop_assert!(entry.end_fraction <= high + 1e-12);
        }
    }

    #[test]
    fn finished_snapshot_materializes_the_target(
        old in entries(),
        new in entries()
    ) {
        let (old, new) = (model(&old), model(&new));
        let snapshot = LinearDrawingModelInterpolator
            .interpolate(Some(&old), Some(&new), 1.0)
            .expect("snapshot");
        prop_assert_eq!(&snapshot.to_drawing_model(), new.as_ref());
    }
}
