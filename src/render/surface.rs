use crate::core::Rect;
use crate::render::{LinePrimitive, PathPrimitive, RectPrimitive, TextPrimitive};

/// Minimal 2D canvas the chart draws onto.
///
/// Clip regions nest: every `push_clip` is matched by exactly one `pop_clip`
/// within the same draw pass.
pub trait DrawingSurface {
    fn bounds(&self) -> Rect;

    fn draw_line(&mut self, line: LinePrimitive);

    fn draw_rect(&mut self, rect: RectPrimitive);

    fn draw_text(&mut self, text: TextPrimitive);

    fn draw_path(&mut self, path: PathPrimitive);

    fn push_clip(&mut self, rect: Rect);

    fn pop_clip(&mut self);
}
