use crate::core::{Rect, Viewport};
use crate::error::{ChartError, ChartResult};
use crate::render::{DrawingSurface, LinePrimitive, PathPrimitive, RectPrimitive, TextPrimitive};

/// One recorded drawing operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Line(LinePrimitive),
    Rect(RectPrimitive),
    Text(TextPrimitive),
    Path(PathPrimitive),
    PushClip(Rect),
    PopClip,
}

/// Backend-agnostic scene for one chart draw pass, in paint order.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    pub viewport: Viewport,
    pub commands: Vec<DrawCommand>,
}

impl RenderFrame {
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            commands: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_line(mut self, line: LinePrimitive) -> Self {
        self.commands.push(DrawCommand::Line(line));
        self
    }

    #[must_use]
    pub fn with_rect(mut self, rect: RectPrimitive) -> Self {
        self.commands.push(DrawCommand::Rect(rect));
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: TextPrimitive) -> Self {
        self.commands.push(DrawCommand::Text(text));
        self
    }

    pub fn lines(&self) -> impl Iterator<Item = &LinePrimitive> {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::Line(line) => Some(line),
            _ => None,
        })
    }

    pub fn rects(&self) -> impl Iterator<Item = &RectPrimitive> {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::Rect(rect) => Some(rect),
            _ => None,
        })
    }

    pub fn texts(&self) -> impl Iterator<Item = &TextPrimitive> {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::Text(text) => Some(text),
            _ => None,
        })
    }

    pub fn paths(&self) -> impl Iterator<Item = &PathPrimitive> {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::Path(path) => Some(path),
            _ => None,
        })
    }

    pub fn validate(&self) -> ChartResult<()> {
        self.viewport.validate()?;

        let mut clip_depth = 0_usize;
        for command in &self.commands {
            match command {
                DrawCommand::Line(line) => line.validate()?,
                DrawCommand::Rect(rect) => rect.validate()?,
                DrawCommand::Text(text) => text.validate()?,
                DrawCommand::Path(path) => path.validate()?,
                DrawCommand::PushClip(rect) => {
                    if !rect.is_finite() {
                        return Err(ChartError::InvalidData(
                            "clip rectangle must be finite".to_owned(),
                        ));
                    }
                    clip_depth += 1;
                }
                DrawCommand::PopClip => {
                    clip_depth = clip_depth.checked_sub(1).ok_or_else(|| {
                        ChartError::InvalidData("clip popped without a matching push".to_owned())
                    })?;
                }
            }
        }
        if clip_depth != 0 {
            return Err(ChartError::InvalidData(format!(
                "{clip_depth} clip region(s) left open"
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl DrawingSurface for RenderFrame {
    fn bounds(&self) -> Rect {
        self.viewport.bounds()
    }

    fn draw_line(&mut self, line: LinePrimitive) {
        self.commands.push(DrawCommand::Line(line));
    }

    fn draw_rect(&mut self, rect: RectPrimitive) {
        self.commands.push(DrawCommand::Rect(rect));
    }

    fn draw_text(&mut self, text: TextPrimitive) {
        self.commands.push(DrawCommand::Text(text));
    }

    fn draw_path(&mut self, path: PathPrimitive) {
        self.commands.push(DrawCommand::Path(path));
    }

    fn push_clip(&mut self, rect: Rect) {
        self.commands.push(DrawCommand::PushClip(rect));
    }

    fn pop_clip(&mut self) {
        self.commands.push(DrawCommand::PopClip);
    }
}
