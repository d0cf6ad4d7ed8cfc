use approx::assert_relative_eq;
use cartesian_chart::api::{CartesianChart, ChartInput};
use cartesian_chart::core::{ChartModel, ColumnLayerModel, DataPoint, DisplayMetrics, Rect, Viewport};
use cartesian_chart::layers::{ColumnLayer, ColumnLayerConfig, ColumnStyle, MergeMode};
use cartesian_chart::render::{Color, RectPrimitive, RenderFrame};

fn two_series_layer(merge_mode: MergeMode) -> ColumnLayer {
    ColumnLayer::new(ColumnLayerConfig {
        styles: vec![
            ColumnStyle::new(Color::rgb(0.9, 0.1, 0.1)),
            ColumnStyle::new(Color::rgb(0.1, 0.1, 0.9)),
        ],
        merge_mode,
        ..ColumnLayerConfig::default()
    })
    .expect("column layer")
}

fn draw_columns(layer: ColumnLayer, model: ColumnLayerModel) -> Vec<RectPrimitive> {
    let metrics = DisplayMetrics::default();
    let input = ChartInput {
        canvas_bounds: Rect::new(0.0, 0.0, 400.0, 200.0),
        units: &metrics,
    };
    let model = ChartModel::builder().layer(model).build();
    let mut chart = CartesianChart::builder()
        .layer(layer)
        .build()
        .expect("chart");

    chart.measure(&input, &model).expect("measure");
    let mut frame = RenderFrame::new(Viewport::new(400, 200));
    chart.draw(&mut frame, &input, &model).expect("draw");
    frame.validate().expect("valid frame");
    frame.rects().copied().collect()
}

fn series(points: &[(f64, f64)]) -> Vec<DataPoint> {
    points.iter().map(|(x, y)| DataPoint::new(*x, *y)).collect()
}

#[test]
fn grouped_columns_are_ordered_with_a_fixed_gap() {
    let model = ColumnLayerModel::new(vec![
        series(&[(1.0, 1.0), (2.0, 2.0), (3.0, 3.0)]),
        series(&[(1.0, 2.0), (2.0, 1.0), (3.0, 2.0)]),
    ])
    .expect("model");
    let rects = draw_columns(
        two_series_layer(MergeMode::Grouped {
            column_spacing_dp: 4.0,
        }),
        model,
    );

    assert_eq!(rects.len(), 6);
    for group in rects.chunks(2) {
        let (a, b) = (group[0], group[1]);
        assert!(a.right() < b.x, "series A must sit left of series B");
        assert_relative_eq!(b.x - a.right(), 4.0, epsilon = 1e-9);
        assert_relative_eq!(a.width, 8.0, epsilon = 1e-9);
    }
    for pair in rects.windows(2) {
        assert!(pair[0].right() <= pair[1].x, "columns must not overlap");
    }
}

#[test]
fn stacked_positive_columns_rest_on_each_other() {
    let model = ColumnLayerModel::new(vec![series(&[(0.0, 3.0)]), series(&[(0.0, 2.0)])])
        .expect("model");
    let rects = draw_columns(two_series_layer(MergeMode::Stacked), model);

    assert_eq!(rects.len(), 2);
    let (a, b) = (rects[0], rects[1]);
    assert_relative_eq!(a.bottom(), 200.0, epsilon = 1e-9);
    assert_relative_eq!(b.bottom(), a.y, epsilon = 1e-9);
    assert_relative_eq!(a.height, 120.0, epsilon = 1e-9);
    assert_relative_eq!(b.height, 80.0, epsilon = 1e-9);
    assert_relative_eq!(a.x, b.x, epsilon = 1e-9);
}

#[test]
fn stacked_negative_values_grow_down_from_zero() {
    let model = ColumnLayerModel::new(vec![series(&[(0.0, 3.0)]), series(&[(0.0, -2.0)])])
        .expect("model");
    let rects = draw_columns(two_series_layer(MergeMode::Stacked), model);

    let (a, b) = (rects[0], rects[1]);
    // Range is [-2, 3]: the zero line sits at 3/5 of the height from the top.
    let zero_y = 120.0;
    assert_relative_eq!(a.bottom(), zero_y, epsilon = 1e-9);
    assert_relative_eq!(b.y, zero_y, epsilon = 1e-9);
    assert_relative_eq!(b.bottom(), 200.0, epsilon = 1e-9);
}

#[test]
fn marker_targets_report_original_values() {
    let model = ColumnLayerModel::new(vec![series(&[(0.0, 3.0)]), series(&[(0.0, -2.0)])])
        .expect("model");
    let metrics = DisplayMetrics::default();
    let input = ChartInput {
        canvas_bounds: Rect::new(0.0, 0.0, 400.0, 200.0),
        units: &metrics,
    };
    let model = ChartModel::builder().layer(model).build();
    let mut chart = CartesianChart::builder()
        .layer(two_series_layer(MergeMode::Stacked))
        .build()
        .expect("chart");
    chart.measure(&input, &model).expect("measure");
    chart
        .draw(&mut RenderFrame::new(Viewport::new(400, 200)), &input, &model)
        .expect("draw");

    let values: Vec<f64> = chart
        .marker_targets()
        .values()
        .flatten()
        .map(|target| target.value.label_value())
        .collect();
    assert_eq!(values, vec![3.0, -2.0]);
}
