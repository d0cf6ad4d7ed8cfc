//! Host-facing API: the chart orchestrator, its axes, scroll/zoom and
//! transition state, and the engine facade that ties them to a renderer.

mod axis;
mod chart;
mod engine;
mod engine_config;
mod scroll_zoom;
mod transition;

pub use axis::{AxisDrawContext, AxisStyle, HorizontalAxis, HorizontalAxisPosition, VerticalAxis};
pub use chart::{CartesianChart, CartesianChartBuilder, ChartInput, ChartLayout, RenderPhase};
pub use engine::ChartEngine;
pub use engine_config::ChartEngineConfig;
pub use scroll_zoom::{ScrollZoomConfig, ScrollZoomState, Zoom};
pub use transition::{Easing, TransitionClock, TransitionState};
