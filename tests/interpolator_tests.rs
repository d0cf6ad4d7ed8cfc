use std::sync::Arc;

use approx::assert_relative_eq;
use cartesian_chart::core::{
    DrawingModel, DrawingModelEntry, DrawingModelInterpolator, EntityKey,
    LinearDrawingModelInterpolator,
};
use cartesian_chart::layers::{ColumnEntry, LinePointEntry};

fn columns(entries: &[(f64, u32, f64)]) -> Arc<DrawingModel<ColumnEntry>> {
    Arc::new(
        entries
            .iter()
            .map(|(x, series, end)| {
                (
                    EntityKey::new(*x, *series),
                    ColumnEntry {
                        start_fraction: 0.0,
                        end_fraction: *end,
                    },
                )
            })
            .collect(),
    )
}

#[test]
fn vanishing_and_appearing_are_mirror_images() {
    let only = columns(&[(1.0, 0, 0.8)]);
    for fraction in [0.0, 0.1, 0.25, 0.5, 0.9, 1.0] {
        let vanishing = LinearDrawingModelInterpolator
            .interpolate(Some(&only), None, fraction)
            .expect("vanishing");
        let appearing = LinearDrawingModelInterpolator
            .interpolate(None, Some(&only), 1.0 - fraction)
            .expect("appearing");

        let key = EntityKey::new(1.0, 0);
        let a = vanishing.get(&key).expect("vanishing entry");
        let b = appearing.get(&key).expect("appearing entry");
        assert_relative_eq!(a.end_fraction, b.end_fraction, epsilon = 1e-12);
        assert_relative_eq!(a.start_fraction, b.start_fraction, epsilon = 1e-12);
    }
}

#[test]
fn union_of_keys_is_iterated_in_order() {
    let old = columns(&[(0.0, 0, 0.5), (2.0, 0, 0.5), (2.0, 1, 0.2)]);
    let new = columns(&[(1.0, 0, 0.4), (2.0, 0, 1.0)]);
    let snapshot = LinearDrawingModelInterpolator
        .interpolate(Some(&old), Some(&new), 0.5)
        .expect("snapshot");

    let keys: Vec<(f64, u32)> = snapshot.iter().map(|(key, _)| (key.x(), key.series)).collect();
    assert_eq!(keys, vec![(0.0, 0), (1.0, 0), (2.0, 0), (2.0, 1)]);
    assert_eq!(snapshot.len(), 4);

    let matched = snapshot.get(&EntityKey::new(2.0, 0)).expect("matched");
    assert_relative_eq!(matched.end_fraction, 0.75);
    let appearing = snapshot.get(&EntityKey::new(1.0, 0)).expect("appearing");
    assert_relative_eq!(appearing.end_fraction, 0.2);
}

#[test]
fn endpoints_reproduce_the_snapshots() {
    let old = columns(&[(0.0, 0, 0.3)]);
    let new = columns(&[(0.0, 0, 0.9)]);
    let key = EntityKey::new(0.0, 0);

    let start = LinearDrawingModelInterpolator
        .interpolate(Some(&old), Some(&new), 0.0)
        .expect("start");
    let end = LinearDrawingModelInterpolator
        .interpolate(Some(&old), Some(&new), 1.0)
        .expect("end");
    assert_eq!(start.get(&key), old.get(&key));
    assert_eq!(end.get(&key), new.get(&key));
}

#[test]
fn fractions_outside_the_unit_interval_are_clamped() {
    let old = columns(&[(0.0, 0, 0.2)]);
    let new = columns(&[(0.0, 0, 0.6)]);
    let snapshot = LinearDrawingModelInterpolator
        .interpolate(Some(&old), Some(&new), 3.0)
        .expect("snapshot");
    assert_eq!(snapshot.fraction(), 1.0);
    assert_eq!(
        snapshot.get(&EntityKey::new(0.0, 0)).map(|entry| entry.end_fraction),
        Some(0.6)
    );
}

#[test]
fn line_points_grow_from_their_baseline() {
    let target = LinePointEntry {
        y_fraction: 0.9,
        baseline_fraction: 0.4,
    };
    let halfway = target.zero().lerp(&target, 0.5);
    assert_relative_eq!(halfway.y_fraction, 0.65);
    assert_relative_eq!(halfway.baseline_fraction, 0.4);
}

#[test]
fn lookups_outside_the_union_miss() {
    let old = columns(&[(0.0, 0, 0.2)]);
    let snapshot = LinearDrawingModelInterpolator
        .interpolate(Some(&old), None, 0.5)
        .expect("snapshot");
    assert!(snapshot.get(&EntityKey::new(5.0, 0)).is_none());
    assert_eq!(snapshot.to_drawing_model().len(), 1);
}
