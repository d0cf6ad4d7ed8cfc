use cartesian_chart::core::{MutableChartRanges, RangeContribution, VerticalAxisPosition};
use proptest::prelude::*;

fn position() -> impl Strategy<Value = Option<VerticalAxisPosition>> {
    prop_oneof![
        Just(None),
        Just(Some(VerticalAxisPosition::Start)),
        Just(Some(VerticalAxisPosition::End)),
    ]
}

fn contribution() -> impl Strategy<Value = RangeContribution> {
    (
        -1_000.0f64..1_000.0,
        0.0f64..500.0,
        -1_000.0f64..1_000.0,
        0.0f64..500.0,
        proptest::option::of(0.01f64..50.0),
        position(),
    )
        .prop_map(|(min_x, width, min_y, height, min_x_delta, position)| RangeContribution {
            min_x,
            max_x: min_x + width,
            min_y,
            max_y: min_y + height,
            min_x_delta,
            vertical_axis_position: position,
        })
}

proptest! {
    #[test]
    fn finalized_ranges_cover_every_contribution(
        contributions in proptest::collection::vec(contribution(), 1..12)
    ) {
        let mut ranges = MutableChartRanges::new();
        for contribution in &contributions {
            ranges.update(*contribution).expect("finite contribution");
        }
        let ranges = ranges.finalize();
        let x = ranges.x().expect("x range");
        prop_assert!(x.x_step > 0.0);

        for contribution in &contributions {
            prop_assert!(x.min_x <= contribution.min_x && x.max_x >= contribution.max_x);

            let union = ranges.y_range(None);
            prop_assert!(union.min_y().expect("min") <= contribution.min_y);
            prop_assert!(union.max_y().expect("max") >= contribution.max_y);

            if let Some(position) = contribution.vertical_axis_position {
                let group = ranges.y_range(Some(position));
                prop_assert!(group.min_y().expect("min") <= contribution.min_y);
                prop_assert!(group.max_y().expect("max") >= contribution.max_y);
            }
        }
    }

    #[test]
    fn populated_y_ranges_have_positive_length(
        contributions in proptest::collection::vec(contribution(), 1..8)
    ) {
        let mut ranges = MutableChartRanges::new();
        for contribution in contributions {
            ranges.update(contribution).expect("finite contribution");
        }
        let ranges = ranges.finalize();
        for position in [None, Some(VerticalAxisPosition::Start), Some(VerticalAxisPosition::End)] {
            let range = ranges.y_range(position);
            if let Some(length) = range.length() {
                prop_assert!(length > 0.0);
            }
        }
    }

    #[test]
    fn update_order_does_not_matter(
        contributions in proptest::collection::vec(contribution(), 1..8)
    ) {
        let mut forward = MutableChartRanges::new();
        let mut backward = MutableChartRanges::new();
        for contribution in &contributions {
            forward.update(*contribution).expect("forward");
        }
        for contribution in contributions.iter().rev() {
            backward.update(*contribution).expect("backward");
        }
        prop_assert_eq!(forward.finalize(), backward.finalize());
    }
}
