//! cartesian-chart: a Cartesian charting core.
//!
//! Layers (line, column, candlestick) share one set of ranges and one set of
//! layer dimensions, draw onto an abstract [`render::DrawingSurface`], and
//! animate between chart models through lazily interpolated drawing models.
//!
//! The two-pass API is [`api::CartesianChart::measure`] followed by
//! [`api::CartesianChart::draw`]; [`api::ChartEngine`] drives both plus the
//! transition clock for hosts that just want frames.

pub mod api;
pub mod core;
pub mod error;
pub mod extensions;
pub mod interaction;
pub mod layers;
pub mod render;
pub mod telemetry;

pub use api::{CartesianChart, ChartEngine, ChartEngineConfig, ChartInput};
pub use error::{ChartError, ChartResult};
