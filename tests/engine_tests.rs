use std::time::Duration;

use approx::assert_relative_eq;
use cartesian_chart::api::{
    CartesianChart, ChartEngine, ChartEngineConfig, Easing, ScrollZoomConfig, TransitionState,
    VerticalAxis, Zoom,
};
use cartesian_chart::core::{
    ChartModel, ColumnLayerModel, DataPoint, LineLayerModel, RangeProvider, VerticalAxisPosition,
    Viewport,
};
use cartesian_chart::interaction::MarkerMode;
use cartesian_chart::layers::{ColumnLayer, ColumnLayerConfig, LineLayer, LineLayerConfig};
use cartesian_chart::render::NullRenderer;

fn column_engine(config: ChartEngineConfig) -> ChartEngine<NullRenderer> {
    let chart = CartesianChart::builder().layer(
        ColumnLayer::new(ColumnLayerConfig {
            range_provider: RangeProvider::fixed_y(0.0, 10.0),
            ..ColumnLayerConfig::default()
        })
        .expect("layer"),
    );
    ChartEngine::new(NullRenderer::default(), config, chart).expect("engine")
}

fn column_model(values: &[f64]) -> ChartModel {
    ChartModel::builder()
        .layer(ColumnLayerModel::from_ys(values).expect("model"))
        .build()
}

fn first_column_height(engine: &mut ChartEngine<NullRenderer>) -> f64 {
    let frame = engine.build_render_frame().expect("frame");
    frame.rects().next().map_or(0.0, |rect| rect.height)
}

#[test]
fn engine_renders_through_the_renderer() {
    let mut engine = column_engine(
        ChartEngineConfig::new(Viewport::new(400, 200)).with_animate_changes(false),
    );
    assert!(engine.set_model(column_model(&[2.0, 5.0, 8.0])).expect("set model"));
    assert!(!engine.is_animating());

    engine.render().expect("render");
    let renderer = engine.into_renderer();
    assert_eq!(renderer.frames_rendered, 1);
    assert_eq!(renderer.last_rect_count, 3);
}

#[test]
fn ticks_drive_the_transition_to_completion() {
    let config = ChartEngineConfig::new(Viewport::new(400, 200))
        .with_animation(100, Easing::Linear);
    let mut engine = column_engine(config);
    engine.set_model(column_model(&[10.0])).expect("set model");
    assert!(engine.is_animating());
    assert_relative_eq!(first_column_height(&mut engine), 0.0, epsilon = 1e-9);

    assert!(engine.tick(Duration::from_millis(25)).expect("tick"));
    assert_relative_eq!(first_column_height(&mut engine), 50.0, epsilon = 1e-9);

    assert!(engine.tick(Duration::from_millis(200)).expect("tick"));
    assert!(!engine.is_animating());
    assert_relative_eq!(first_column_height(&mut engine), 200.0, epsilon = 1e-9);
    assert_eq!(engine.chart().transition_state(), TransitionState::Idle);
    assert_eq!(
        engine.chart().rendered_generation(),
        Some(engine.model().generation())
    );

    assert!(!engine.tick(Duration::from_millis(16)).expect("idle tick"));
}

#[test]
fn new_model_mid_animation_restarts_from_the_visible_state() {
    let config = ChartEngineConfig::new(Viewport::new(400, 200))
        .with_animation(100, Easing::Linear);
    let mut engine = column_engine(config);
    engine.set_model(column_model(&[10.0])).expect("set model");
    engine.tick(Duration::from_millis(50)).expect("tick");

    engine.set_model(column_model(&[0.0])).expect("set model");
    assert_relative_eq!(first_column_height(&mut engine), 100.0, epsilon = 1e-9);
    engine.tick(Duration::from_millis(50)).expect("tick");
    assert_relative_eq!(first_column_height(&mut engine), 50.0, epsilon = 1e-9);
}

#[test]
fn scroll_and_zoom_are_forwarded_to_the_chart() {
    let config = ChartEngineConfig::new(Viewport::new(200, 100))
        .with_animate_changes(false)
        .with_scroll_zoom(ScrollZoomConfig {
            initial_zoom: Zoom::Fixed(1.0),
            ..ScrollZoomConfig::default()
        });
    let chart = CartesianChart::builder()
        .layer(LineLayer::new(LineLayerConfig::default()).expect("layer"));
    let mut engine = ChartEngine::new(NullRenderer::default(), config, chart).expect("engine");
    let ys: Vec<f64> = (0..50).map(|i| f64::from(i % 7)).collect();
    engine
        .set_model(
            ChartModel::builder()
                .layer(LineLayerModel::from_ys(&ys).expect("model"))
                .build(),
        )
        .expect("set model");
    engine.build_render_frame().expect("frame");

    // 49 steps of 32 px plus 32 px of padding.
    let max_scroll = engine.chart().scroll_zoom().max_scroll_px();
    assert_relative_eq!(max_scroll, 49.0 * 32.0 + 32.0 - 200.0, epsilon = 1e-9);
    assert_relative_eq!(engine.scroll_by(100.0), 100.0, epsilon = 1e-9);
    assert_relative_eq!(engine.scroll_by(10_000.0), max_scroll - 100.0, epsilon = 1e-9);

    engine.zoom_by(0.5, 0.0);
    assert_relative_eq!(engine.chart().scroll_zoom().zoom(), 0.5, epsilon = 1e-9);
    engine.render().expect("render after zoom");
}

#[test]
fn hidden_marker_mode_ignores_the_pointer() {
    let config = ChartEngineConfig::new(Viewport::new(300, 100))
        .with_animate_changes(false)
        .with_marker_mode(MarkerMode::Hidden);
    let chart = CartesianChart::builder()
        .layer(LineLayer::new(LineLayerConfig::default()).expect("layer"))
        .marker(std::sync::Arc::new(
            cartesian_chart::extensions::DefaultCartesianMarker::default(),
        ));
    let mut engine = ChartEngine::new(NullRenderer::default(), config, chart).expect("engine");
    engine
        .set_model(
            ChartModel::builder()
                .layer(LineLayerModel::from_ys(&[1.0, 2.0]).expect("model"))
                .build(),
        )
        .expect("set model");

    let before = engine.build_render_frame().expect("frame").commands.len();
    engine.pointer_move(16.0, 50.0);
    let after = engine.build_render_frame().expect("frame").commands.len();
    assert_eq!(before, after);
    engine.pointer_leave();
}

#[test]
fn viewport_changes_are_validated() {
    let mut engine = column_engine(ChartEngineConfig::new(Viewport::new(400, 200)));
    assert!(engine.set_viewport(Viewport::new(0, 10)).is_err());
    engine.set_viewport(Viewport::new(800, 300)).expect("viewport");
    assert_eq!(engine.config().viewport, Viewport::new(800, 300));
}

#[test]
fn dual_axis_layers_keep_independent_ranges() {
    let config = ChartEngineConfig::new(Viewport::new(400, 200)).with_animate_changes(false);
    let chart = CartesianChart::builder()
        .layer(
            ColumnLayer::new(ColumnLayerConfig {
                vertical_axis_position: Some(VerticalAxisPosition::Start),
                ..ColumnLayerConfig::default()
            })
            .expect("columns"),
        )
        .layer(
            LineLayer::new(LineLayerConfig {
                vertical_axis_position: Some(VerticalAxisPosition::End),
                ..LineLayerConfig::default()
            })
            .expect("line"),
        )
        .vertical_axis(VerticalAxis::new(VerticalAxisPosition::Start))
        .vertical_axis(VerticalAxis::new(VerticalAxisPosition::End));
    let mut engine = ChartEngine::new(NullRenderer::default(), config, chart).expect("engine");
    engine
        .set_model(
            ChartModel::builder()
                .layer(ColumnLayerModel::from_ys(&[1.0, 2.0]).expect("columns"))
                .layer(
                    LineLayerModel::single(vec![
                        DataPoint::new(0.0, 100.0),
                        DataPoint::new(1.0, 400.0),
                    ])
                    .expect("line"),
                )
                .build(),
        )
        .expect("set model");
    let frame = engine.build_render_frame().expect("frame");

    let ranges = engine.chart().layout().expect("layout").ranges;
    assert_eq!(
        ranges.y_range(Some(VerticalAxisPosition::Start)).max_y(),
        Some(2.0)
    );
    assert_eq!(
        ranges.y_range(Some(VerticalAxisPosition::End)).max_y(),
        Some(400.0)
    );
    assert!(frame.texts().any(|text| text.text == "400"));
    assert!(frame.texts().any(|text| text.text == "2"));
}
