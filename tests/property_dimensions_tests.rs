use cartesian_chart::core::{LayerDimensions, MutableLayerDimensions};
use proptest::prelude::*;

fn dimensions() -> impl Strategy<Value = LayerDimensions> {
    (
        0.0f64..200.0,
        0.0f64..100.0,
        0.0f64..100.0,
        0.0f64..100.0,
        0.0f64..100.0,
    )
        .prop_map(|(x_spacing, ss, se, us, ue)| {
            LayerDimensions::new(x_spacing, ss, se, us, ue).expect("non-negative")
        })
}

proptest! {
    #[test]
    fn merge_is_commutative_and_idempotent(a in dimensions(), b in dimensions()) {
        prop_assert_eq!(a.merge(b), b.merge(a));
        prop_assert_eq!(a.merge(a), a);
        let merged = a.merge(b);
        prop_assert!(merged.x_spacing >= a.x_spacing && merged.x_spacing >= b.x_spacing);
    }

    #[test]
    fn accumulated_dimensions_never_shrink(
        updates in proptest::collection::vec(dimensions(), 1..10)
    ) {
        let mut accumulator = MutableLayerDimensions::new();
        let mut previous = accumulator.values();
        for update in &updates {
            accumulator.update(*update).expect("update");
            let current = accumulator.values();
            prop_assert!(current.x_spacing >= previous.x_spacing);
            prop_assert!(current.padding() >= previous.padding());
            previous = current;
        }
        let expected = updates
            .iter()
            .fold(LayerDimensions::default(), |acc, update| acc.merge(*update));
        prop_assert_eq!(accumulator.finalize(), expected);
    }

    #[test]
    fn zoom_scales_only_the_scalable_part(dims in dimensions(), zoom in 0.1f64..10.0) {
        let scaled = dims.scaled(zoom);
        prop_assert!((scaled.x_spacing - dims.x_spacing * zoom).abs() < 1e-9);
        prop_assert_eq!(scaled.unscalable_padding(), dims.unscalable_padding());
    }
}
