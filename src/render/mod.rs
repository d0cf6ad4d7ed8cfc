mod frame;
mod null_renderer;
mod primitives;
mod surface;

pub use frame::{DrawCommand, RenderFrame};
pub use null_renderer::NullRenderer;
pub use primitives::{
    Color, LinePrimitive, PathCommand, PathPrimitive, PathStroke, RectPrimitive, TextHAlign,
    TextPrimitive,
};
pub use surface::DrawingSurface;

use crate::error::ChartResult;

/// Contract implemented by any rendering backend.
///
/// Backends receive a fully materialized `RenderFrame`, so drawing code stays
/// isolated from layer measurement and transition logic.
pub trait Renderer {
    fn render(&mut self, frame: &RenderFrame) -> ChartResult<()>;
}

#[cfg(feature = "cairo-backend")]
mod cairo_backend;
#[cfg(feature = "cairo-backend")]
pub use cairo_backend::{CairoContextRenderer, CairoRenderStats, CairoRenderer};
