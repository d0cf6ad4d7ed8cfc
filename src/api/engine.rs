use std::time::Duration;

use tracing::debug;

use crate::core::{ChartModel, Point, Viewport};
use crate::error::ChartResult;
use crate::render::{RenderFrame, Renderer};

use super::chart::{CartesianChart, CartesianChartBuilder, ChartInput};
use super::engine_config::ChartEngineConfig;
use super::transition::TransitionClock;

#[cfg(feature = "cairo-backend")]
use crate::render::CairoContextRenderer;

/// Main orchestration facade consumed by host applications.
///
/// `ChartEngine` owns the chart, the model currently shown, and the frame
/// clock that drives transitions, and hands finished frames to the renderer.
pub struct ChartEngine<R: Renderer> {
    renderer: R,
    config: ChartEngineConfig,
    chart: CartesianChart,
    model: ChartModel,
    clock: TransitionClock,
}

impl<R: Renderer> ChartEngine<R> {
    /// Builds the chart with the scroll/zoom and marker settings of `config`.
    pub fn new(
        renderer: R,
        config: ChartEngineConfig,
        chart: CartesianChartBuilder,
    ) -> ChartResult<Self> {
        let config = config.validate()?;
        let chart = chart
            .scroll_zoom(config.scroll_zoom)
            .marker_mode(config.marker_mode)
            .build()?;
        Ok(Self {
            renderer,
            config,
            chart,
            model: ChartModel::empty(),
            clock: TransitionClock::new(config.animation_duration(), config.easing),
        })
    }

    #[must_use]
    pub fn config(&self) -> ChartEngineConfig {
        self.config
    }

    #[must_use]
    pub fn chart(&self) -> &CartesianChart {
        &self.chart
    }

    pub fn chart_mut(&mut self) -> &mut CartesianChart {
        &mut self.chart
    }

    #[must_use]
    pub fn model(&self) -> &ChartModel {
        &self.model
    }

    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn set_viewport(&mut self, viewport: Viewport) -> ChartResult<()> {
        self.config.viewport = viewport.validate()?;
        Ok(())
    }

    /// Replaces the displayed model. Returns `true` when a transition started.
    pub fn set_model(&mut self, model: ChartModel) -> ChartResult<bool> {
        let started = self.chart.start_transition(&model)?;
        self.model = model;
        if !started {
            return Ok(false);
        }
        if self.config.animate_changes {
            self.clock.start();
        } else {
            self.clock.stop();
            self.chart.advance(1.0)?;
        }
        debug!(
            generation = self.model.generation(),
            animated = self.config.animate_changes,
            "model replaced"
        );
        Ok(true)
    }

    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.clock.is_running()
    }

    /// Advances the running transition by `delta`. Returns `true` when the
    /// chart changed and should be redrawn.
    pub fn tick(&mut self, delta: Duration) -> ChartResult<bool> {
        match self.clock.tick(delta) {
            Some(fraction) => {
                self.chart.advance(fraction)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) {
        self.chart.set_pointer_position(Some(Point::new(x, y)));
    }

    pub fn pointer_leave(&mut self) {
        self.chart.set_pointer_position(None);
    }

    /// Scrolls by `delta_px` and returns the distance actually scrolled.
    pub fn scroll_by(&mut self, delta_px: f64) -> f64 {
        self.chart.scroll_zoom_mut().scroll_by(delta_px)
    }

    pub fn zoom_by(&mut self, factor: f64, anchor_px: f64) {
        self.chart.scroll_zoom_mut().zoom_by(factor, anchor_px);
    }

    /// Measures and draws the current model into a fresh frame.
    pub fn build_render_frame(&mut self) -> ChartResult<RenderFrame> {
        let viewport = self.config.viewport;
        let metrics = self.config.display_metrics;
        let input = ChartInput {
            canvas_bounds: viewport.bounds(),
            units: &metrics,
        };
        self.chart.measure(&input, &self.model)?;
        let mut frame = RenderFrame::new(viewport);
        self.chart.draw(&mut frame, &input, &self.model)?;
        Ok(frame)
    }

    pub fn render(&mut self) -> ChartResult<()> {
        let frame = self.build_render_frame()?;
        self.renderer.render(&frame)
    }

    /// Renders the frame into an external cairo context.
    #[cfg(feature = "cairo-backend")]
    pub fn render_on_cairo_context(&mut self, context: &cairo::Context) -> ChartResult<()>
    where
        R: CairoContextRenderer,
    {
        let frame = self.build_render_frame()?;
        self.renderer.render_on_cairo_context(context, &frame)
    }

    #[must_use]
    pub fn into_renderer(self) -> R {
        self.renderer
    }
}
