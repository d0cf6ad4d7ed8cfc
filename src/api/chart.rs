use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use ordered_float::OrderedFloat;
use tracing::{debug, trace, warn};

use crate::core::{
    CacheStore, ChartModel, ChartRanges, ExtraStore, LayerDimensions, MutableChartRanges,
    MutableLayerDimensions, Point, Rect, Remembered, UnitConverter, VerticalAxisPosition,
};
use crate::error::{ChartError, ChartResult};
use crate::extensions::{
    CartesianMarker, MarkerDrawContext, MarkerTargets, merge_marker_targets,
    nearest_marker_targets,
};
use crate::interaction::{MarkerMode, PointerState};
use crate::layers::{
    AnyCartesianLayer, CartesianLayer, CoordinateMapper, DrawingContext, MeasuringContext,
};
use crate::render::DrawingSurface;

use super::axis::{AxisDrawContext, HorizontalAxis, HorizontalAxisPosition, VerticalAxis};
use super::scroll_zoom::{ScrollZoomConfig, ScrollZoomState};
use super::transition::{TransitionState, validate_fraction};

/// Step of the measure/draw cycle the chart is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderPhase {
    #[default]
    Idle,
    Measuring,
    Dimensioned,
    Drawing,
}

impl RenderPhase {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Measuring => "measuring",
            Self::Dimensioned => "dimensioned",
            Self::Drawing => "drawing",
        }
    }
}

impl fmt::Display for RenderPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Host inputs of one measure/draw cycle.
#[derive(Clone, Copy)]
pub struct ChartInput<'a> {
    pub canvas_bounds: Rect,
    pub units: &'a dyn UnitConverter,
}

impl ChartInput<'_> {
    /// Everything the cache store's contents depend on.
    fn cache_context(&self) -> (Rect, f64, f64) {
        (
            self.canvas_bounds,
            self.units.dp_to_px(1.0),
            self.units.sp_to_px(1.0),
        )
    }
}

/// Result of a measuring pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartLayout {
    pub ranges: ChartRanges,
    /// Unzoomed dimensions.
    pub dimensions: LayerDimensions,
    pub layer_bounds: Rect,
    pub start_axis_bounds: Rect,
    pub end_axis_bounds: Rect,
    pub top_axis_bounds: Rect,
    pub bottom_axis_bounds: Rect,
}

/// Orchestrates layers, axes and markers through measure, draw and
/// animated transitions between chart models.
///
/// Layers and models are matched by position: layer `i` draws
/// `model.layer(i)`. A missing model means "no data" for that layer.
#[derive(Debug)]
pub struct CartesianChart {
    layers: Vec<Box<dyn AnyCartesianLayer>>,
    start_axis: Option<VerticalAxis>,
    end_axis: Option<VerticalAxis>,
    top_axis: Option<HorizontalAxis>,
    bottom_axis: Option<HorizontalAxis>,
    marker: Option<Arc<dyn CartesianMarker>>,
    persistent_markers: BTreeMap<OrderedFloat<f64>, Arc<dyn CartesianMarker>>,
    pointer: PointerState,
    scroll_zoom: ScrollZoomState,
    phase: RenderPhase,
    extra_store: ExtraStore,
    cache: Remembered<(Rect, f64, f64), CacheStore>,
    layout: Option<ChartLayout>,
    transition: TransitionState,
    /// Ranges of the model the latest transition targets.
    target_ranges: ChartRanges,
    /// Ranges kept on screen while the chart fades out to a model without data.
    fade_out_ranges: Option<ChartRanges>,
    rendered_generation: Option<u64>,
    marker_targets: MarkerTargets,
}

impl CartesianChart {
    #[must_use]
    pub fn builder() -> CartesianChartBuilder {
        CartesianChartBuilder::default()
    }

    #[must_use]
    pub fn phase(&self) -> RenderPhase {
        self.phase
    }

    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Layout of the last successful measuring pass.
    #[must_use]
    pub fn layout(&self) -> Option<ChartLayout> {
        self.layout
    }

    #[must_use]
    pub fn transition_state(&self) -> TransitionState {
        self.transition
    }

    /// Generation of the model the last finished transition reached.
    #[must_use]
    pub fn rendered_generation(&self) -> Option<u64> {
        self.rendered_generation
    }

    /// Targets published by the layers during the last draw pass.
    #[must_use]
    pub fn marker_targets(&self) -> &MarkerTargets {
        &self.marker_targets
    }

    #[must_use]
    pub fn scroll_zoom(&self) -> &ScrollZoomState {
        &self.scroll_zoom
    }

    pub fn scroll_zoom_mut(&mut self) -> &mut ScrollZoomState {
        &mut self.scroll_zoom
    }

    #[must_use]
    pub fn pointer(&self) -> PointerState {
        self.pointer
    }

    /// Reports the pointer position; it is sampled at the start of the next
    /// draw pass. `None` hides the pointer-driven marker.
    pub fn set_pointer_position(&mut self, position: Option<Point>) {
        self.pointer.set_position(position);
    }

    pub fn set_marker_mode(&mut self, mode: MarkerMode) {
        self.pointer.set_mode(mode);
    }

    /// Draws `marker` at data x `x` on every pass, regardless of the pointer.
    pub fn add_persistent_marker(
        &mut self,
        x: f64,
        marker: Arc<dyn CartesianMarker>,
    ) -> ChartResult<()> {
        if !x.is_finite() {
            return Err(ChartError::InvalidData(
                "persistent marker x must be finite".to_owned(),
            ));
        }
        self.persistent_markers.insert(OrderedFloat(x), marker);
        Ok(())
    }

    pub fn remove_persistent_marker(&mut self, x: f64) -> bool {
        self.persistent_markers.remove(&OrderedFloat(x)).is_some()
    }

    fn expect_phase(&self, operation: &'static str, allowed: &[RenderPhase]) -> ChartResult<()> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(ChartError::InvalidRenderPhase {
                operation,
                phase: self.phase.name(),
            })
        }
    }

    fn compute_ranges(&self, model: &ChartModel) -> ChartResult<ChartRanges> {
        if model.layer_count() > self.layers.len() {
            warn!(
                models = model.layer_count(),
                layers = self.layers.len(),
                "chart model has more layer models than the chart has layers; extras are ignored"
            );
        }
        let mut ranges = MutableChartRanges::new();
        for (index, layer) in self.layers.iter().enumerate() {
            layer.update_chart_ranges(&mut ranges, model.layer(index), index)?;
        }
        Ok(ranges.finalize())
    }

    /// Runs the measuring pass: ranges, then dimensions (layers, then
    /// horizontal axes), then the axis strips and the layer bounds.
    ///
    /// While a transition fades the chart out to a model without data, the
    /// pass keeps measuring against the ranges being faded out.
    pub fn measure(
        &mut self,
        input: &ChartInput<'_>,
        model: &ChartModel,
    ) -> ChartResult<(ChartRanges, LayerDimensions)> {
        self.expect_phase("measure", &[RenderPhase::Idle, RenderPhase::Dimensioned])?;
        let bounds = input.canvas_bounds;
        if !bounds.is_finite() || bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            return Err(ChartError::InvalidData(format!(
                "canvas bounds must be finite and non-empty, got {bounds:?}"
            )));
        }

        self.phase = RenderPhase::Measuring;
        match self.measure_pass(input, model) {
            Ok(layout) => {
                self.layout = Some(layout);
                self.phase = RenderPhase::Dimensioned;
                Ok((layout.ranges, layout.dimensions))
            }
            Err(error) => {
                self.layout = None;
                self.phase = RenderPhase::Idle;
                Err(error)
            }
        }
    }

    fn measure_pass(&mut self, input: &ChartInput<'_>, model: &ChartModel) -> ChartResult<ChartLayout> {
        let mut ranges = self.compute_ranges(model)?;
        if let Some(fading) = self.fade_out_ranges.filter(|_| ranges.is_empty()) {
            trace!("measuring against the ranges being faded out");
            ranges = fading;
        }
        let cache_store = &*self
            .cache
            .get_or_rebuild(input.cache_context(), |_| CacheStore::new());
        let context = MeasuringContext {
            canvas_bounds: input.canvas_bounds,
            units: input.units,
            ranges: &ranges,
            cache_store,
            pointer_position: self.pointer.latest(),
            scroll_enabled: self.scroll_zoom.config().scroll_enabled,
        };

        let mut dimensions = MutableLayerDimensions::new();
        for (index, layer) in self.layers.iter().enumerate() {
            layer.update_dimensions(&context, &mut dimensions, model.layer(index), index)?;
        }
        for axis in [&self.top_axis, &self.bottom_axis].into_iter().flatten() {
            axis.update_dimensions(&context, &mut dimensions)?;
        }
        let dimensions = dimensions.finalize();

        let vertical_width = |axis: &Option<VerticalAxis>| -> ChartResult<f64> {
            axis.as_ref()
                .map_or(Ok(0.0), |axis| axis.measure_width(&context))
        };
        let horizontal_height = |axis: &Option<HorizontalAxis>| -> f64 {
            axis.as_ref().map_or(0.0, |axis| axis.measure_height(&context))
        };
        let canvas = input.canvas_bounds;
        let layer_bounds = canvas.inset(
            vertical_width(&self.start_axis)?,
            horizontal_height(&self.top_axis),
            vertical_width(&self.end_axis)?,
            horizontal_height(&self.bottom_axis),
        );
        let layout = ChartLayout {
            ranges,
            dimensions,
            layer_bounds,
            start_axis_bounds: Rect::new(
                canvas.left,
                layer_bounds.top,
                layer_bounds.left,
                layer_bounds.bottom,
            ),
            end_axis_bounds: Rect::new(
                layer_bounds.right,
                layer_bounds.top,
                canvas.right,
                layer_bounds.bottom,
            ),
            top_axis_bounds: Rect::new(
                layer_bounds.left,
                canvas.top,
                layer_bounds.right,
                layer_bounds.top,
            ),
            bottom_axis_bounds: Rect::new(
                layer_bounds.left,
                layer_bounds.bottom,
                layer_bounds.right,
                canvas.bottom,
            ),
        };

        self.scroll_zoom
            .update(layer_bounds.width(), dimensions, &ranges);
        debug!(
            empty = ranges.is_empty(),
            x_spacing = dimensions.x_spacing,
            layer_width = layer_bounds.width(),
            "chart measured"
        );
        Ok(layout)
    }

    /// Runs the drawing pass on the layout of the preceding `measure` call.
    ///
    /// Order: axis guidelines, layers (clipped to the layer bounds, back to
    /// front), markers, axes. A chart without data issues no operations.
    pub fn draw(
        &mut self,
        surface: &mut dyn DrawingSurface,
        input: &ChartInput<'_>,
        model: &ChartModel,
    ) -> ChartResult<()> {
        self.expect_phase("draw", &[RenderPhase::Dimensioned])?;
        let layout = self.layout.ok_or(ChartError::InvalidRenderPhase {
            operation: "draw",
            phase: self.phase.name(),
        })?;
        self.phase = RenderPhase::Drawing;
        let result = self.draw_pass(surface, input, model, layout);
        self.phase = RenderPhase::Idle;
        result
    }

    fn draw_pass(
        &mut self,
        surface: &mut dyn DrawingSurface,
        input: &ChartInput<'_>,
        model: &ChartModel,
        layout: ChartLayout,
    ) -> ChartResult<()> {
        let pointer = self.pointer.sample();
        self.marker_targets.clear();
        if layout.ranges.is_empty() {
            trace!("chart has no data; nothing to draw");
            return Ok(());
        }

        let zoom = self.scroll_zoom.zoom();
        let mapper = CoordinateMapper {
            layer_bounds: layout.layer_bounds,
            dimensions: layout.dimensions.scaled(zoom),
            ranges: layout.ranges,
            scroll_px: self.scroll_zoom.scroll_px(),
        };
        let cache_store = &*self
            .cache
            .get_or_rebuild(input.cache_context(), |_| CacheStore::new());
        let measuring = MeasuringContext {
            canvas_bounds: input.canvas_bounds,
            units: input.units,
            ranges: &layout.ranges,
            cache_store,
            pointer_position: pointer,
            scroll_enabled: self.scroll_zoom.config().scroll_enabled,
        };

        let vertical_axes = [
            (&self.start_axis, layout.start_axis_bounds),
            (&self.end_axis, layout.end_axis_bounds),
        ];
        let horizontal_axes = [
            (&self.top_axis, layout.top_axis_bounds),
            (&self.bottom_axis, layout.bottom_axis_bounds),
        ];
        for (axis, axis_bounds) in vertical_axes {
            if let Some(axis) = axis {
                axis.draw_guidelines(&mut AxisDrawContext {
                    surface: &mut *surface,
                    units: input.units,
                    mapper,
                    axis_bounds,
                })?;
            }
        }
        for (axis, axis_bounds) in horizontal_axes {
            if let Some(axis) = axis {
                axis.draw_guidelines(&mut AxisDrawContext {
                    surface: &mut *surface,
                    units: input.units,
                    mapper,
                    axis_bounds,
                })?;
            }
        }

        surface.push_clip(layout.layer_bounds);
        let mut targets = MarkerTargets::new();
        let mut outcome = Ok(());
        for (index, layer) in self.layers.iter_mut().enumerate() {
            let mut context = DrawingContext {
                measuring,
                mapper,
                zoom,
                extra_store: &self.extra_store,
                surface: &mut *surface,
            };
            if let Err(error) = layer.draw(&mut context, model.layer(index), index) {
                outcome = Err(error);
                break;
            }
            merge_marker_targets(&mut targets, layer.marker_targets());
        }
        surface.pop_clip();
        outcome?;

        let mut marker_context = MarkerDrawContext {
            surface: &mut *surface,
            layer_bounds: layout.layer_bounds,
            ranges: &layout.ranges,
            units: input.units,
        };
        if let (Some(marker), Some(point)) = (&self.marker, pointer) {
            if layout.layer_bounds.contains(point) {
                if let Some(hit) = nearest_marker_targets(&targets, point.x) {
                    marker.draw(&mut marker_context, hit)?;
                }
            }
        }
        for (x, marker) in &self.persistent_markers {
            if let Some(hit) = targets.get(x) {
                marker.draw(&mut marker_context, hit)?;
            }
        }

        for (axis, axis_bounds) in vertical_axes {
            if let Some(axis) = axis {
                axis.draw(&mut AxisDrawContext {
                    surface: &mut *surface,
                    units: input.units,
                    mapper,
                    axis_bounds,
                })?;
            }
        }
        for (axis, axis_bounds) in horizontal_axes {
            if let Some(axis) = axis {
                axis.draw(&mut AxisDrawContext {
                    surface: &mut *surface,
                    units: input.units,
                    mapper,
                    axis_bounds,
                })?;
            }
        }

        trace!(targets = targets.len(), zoom, "chart drawn");
        self.marker_targets = targets;
        Ok(())
    }

    /// Stages a transition to `model` on every layer and applies fraction 0.
    ///
    /// Returns `false` when `model` is already displayed or already the
    /// target of the running transition. A transition in flight is abandoned
    /// and the new one starts from what is currently visible.
    pub fn start_transition(&mut self, model: &ChartModel) -> ChartResult<bool> {
        self.expect_phase(
            "start_transition",
            &[RenderPhase::Idle, RenderPhase::Dimensioned],
        )?;
        let generation = model.generation();
        let current_target = match self.transition {
            TransitionState::Running {
                target_generation, ..
            } => Some(target_generation),
            TransitionState::Idle => self.rendered_generation,
        };
        if current_target == Some(generation) {
            trace!(generation, "model already targeted; no transition");
            return Ok(false);
        }

        let ranges = self.compute_ranges(model)?;
        for (index, layer) in self.layers.iter().enumerate() {
            layer.prepare_for_transformation(
                model.layer(index),
                &ranges,
                &mut self.extra_store,
                index,
            )?;
            layer.transform(&mut self.extra_store, 0.0);
        }
        if self.transition.is_running() {
            debug!(generation, "abandoning in-flight transition");
        }
        self.fade_out_ranges = if ranges.is_empty() {
            self.fade_out_ranges
                .or(Some(self.target_ranges))
                .filter(|fading| !fading.is_empty())
        } else {
            None
        };
        self.target_ranges = ranges;
        self.transition = TransitionState::Running {
            target_generation: generation,
            fraction: 0.0,
        };
        debug!(generation, layers = self.layers.len(), "transition started");
        Ok(true)
    }

    /// Moves the running transition to `fraction`. Fractions must stay in
    /// `[0, 1]` and never decrease; reaching `1` completes the transition.
    pub fn advance(&mut self, fraction: f64) -> ChartResult<()> {
        self.expect_phase("advance", &[RenderPhase::Idle, RenderPhase::Dimensioned])?;
        let TransitionState::Running {
            target_generation,
            fraction: current,
        } = self.transition
        else {
            return Err(ChartError::InvalidTransition(
                "no transition is running".to_owned(),
            ));
        };
        let fraction = validate_fraction(current, fraction)?;
        for layer in &self.layers {
            layer.transform(&mut self.extra_store, fraction);
        }
        if fraction >= 1.0 {
            self.transition = TransitionState::Idle;
            self.fade_out_ranges = None;
            self.rendered_generation = Some(target_generation);
            debug!(generation = target_generation, "transition finished");
        } else {
            self.transition = TransitionState::Running {
                target_generation,
                fraction,
            };
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct CartesianChartBuilder {
    layers: Vec<Box<dyn AnyCartesianLayer>>,
    start_axis: Option<VerticalAxis>,
    end_axis: Option<VerticalAxis>,
    top_axis: Option<HorizontalAxis>,
    bottom_axis: Option<HorizontalAxis>,
    marker: Option<Arc<dyn CartesianMarker>>,
    marker_mode: MarkerMode,
    scroll_zoom: ScrollZoomConfig,
}

impl CartesianChartBuilder {
    /// Appends a layer; layers draw in the order they are added.
    #[must_use]
    pub fn layer(mut self, layer: impl CartesianLayer + 'static) -> Self {
        self.layers.push(Box::new(layer));
        self
    }

    /// Sets the axis on the edge named by the axis' position.
    #[must_use]
    pub fn vertical_axis(mut self, axis: VerticalAxis) -> Self {
        match axis.position() {
            VerticalAxisPosition::Start => self.start_axis = Some(axis),
            VerticalAxisPosition::End => self.end_axis = Some(axis),
        }
        self
    }

    #[must_use]
    pub fn horizontal_axis(mut self, axis: HorizontalAxis) -> Self {
        match axis.position() {
            HorizontalAxisPosition::Top => self.top_axis = Some(axis),
            HorizontalAxisPosition::Bottom => self.bottom_axis = Some(axis),
        }
        self
    }

    #[must_use]
    pub fn marker(mut self, marker: Arc<dyn CartesianMarker>) -> Self {
        self.marker = Some(marker);
        self
    }

    #[must_use]
    pub fn marker_mode(mut self, mode: MarkerMode) -> Self {
        self.marker_mode = mode;
        self
    }

    #[must_use]
    pub fn scroll_zoom(mut self, config: ScrollZoomConfig) -> Self {
        self.scroll_zoom = config;
        self
    }

    pub fn build(self) -> ChartResult<CartesianChart> {
        Ok(CartesianChart {
            layers: self.layers,
            start_axis: self.start_axis,
            end_axis: self.end_axis,
            top_axis: self.top_axis,
            bottom_axis: self.bottom_axis,
            marker: self.marker,
            persistent_markers: BTreeMap::new(),
            pointer: PointerState::new(self.marker_mode),
            scroll_zoom: ScrollZoomState::new(self.scroll_zoom)?,
            phase: RenderPhase::Idle,
            extra_store: ExtraStore::new(),
            cache: Remembered::new(),
            layout: None,
            transition: TransitionState::Idle,
            target_ranges: ChartRanges::empty(),
            fade_out_ranges: None,
            rendered_generation: None,
            marker_targets: MarkerTargets::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{CartesianChart, ChartInput, RenderPhase};
    use crate::core::{ChartModel, DisplayMetrics, LineLayerModel, Rect, Viewport};
    use crate::error::ChartError;
    use crate::layers::{LineLayer, LineLayerConfig};
    use crate::render::{DrawingSurface, RenderFrame};

    fn chart() -> CartesianChart {
        CartesianChart::builder()
            .layer(LineLayer::new(LineLayerConfig::default()).expect("layer"))
            .build()
            .expect("chart")
    }

    #[test]
    fn draw_requires_a_measured_chart() {
        let metrics = DisplayMetrics::default();
        let input = ChartInput {
            canvas_bounds: Rect::new(0.0, 0.0, 200.0, 100.0),
            units: &metrics,
        };
        let mut frame = RenderFrame::new(Viewport::new(200, 100));
        let mut chart = chart();
        let error = chart
            .draw(&mut frame, &input, &ChartModel::empty())
            .expect_err("not measured");
        assert!(matches!(error, ChartError::InvalidRenderPhase { .. }));
        assert_eq!(chart.phase(), RenderPhase::Idle);
    }

    #[test]
    fn a_full_cycle_returns_to_idle() {
        let metrics = DisplayMetrics::default();
        let input = ChartInput {
            canvas_bounds: Rect::new(0.0, 0.0, 200.0, 100.0),
            units: &metrics,
        };
        let model = ChartModel::builder()
            .layer(LineLayerModel::from_ys(&[1.0, 3.0, 2.0]).expect("model"))
            .build();
        let mut chart = chart();
        chart.measure(&input, &model).expect("measure");
        assert_eq!(chart.phase(), RenderPhase::Dimensioned);

        let mut frame = RenderFrame::new(Viewport::new(200, 100));
        chart.draw(&mut frame, &input, &model).expect("draw");
        assert_eq!(chart.phase(), RenderPhase::Idle);
        assert!(!frame.is_empty());
        assert_eq!(frame.bounds(), Rect::new(0.0, 0.0, 200.0, 100.0));
        assert_eq!(chart.marker_targets().len(), 3);
    }

    #[test]
    fn advancing_without_a_transition_fails() {
        let mut chart = chart();
        assert!(matches!(
            chart.advance(0.5),
            Err(ChartError::InvalidTransition(_))
        ));
    }
}
