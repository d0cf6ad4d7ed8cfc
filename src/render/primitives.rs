use serde::{Deserialize, Serialize};

use crate::error::{ChartError, ChartResult};

/// RGBA color in normalized 0..=1 channel values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
}

impl Color {
    #[must_use]
    pub const fn rgba(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    #[must_use]
    pub const fn rgb(red: f64, green: f64, blue: f64) -> Self {
        Self::rgba(red, green, blue, 1.0)
    }

    /// Same color with its alpha multiplied by `opacity` (clamped to 0..=1).
    #[must_use]
    pub fn faded(self, opacity: f64) -> Self {
        Self {
            alpha: (self.alpha * opacity).clamp(0.0, 1.0),
            ..self
        }
    }

    pub fn validate(self) -> ChartResult<()> {
        for (channel, value) in [
            ("red", self.red),
            ("green", self.green),
            ("blue", self.blue),
            ("alpha", self.alpha),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ChartError::InvalidData(format!(
                    "color channel `{channel}` must be finite and in [0, 1]"
                )));
            }
        }
        Ok(())
    }
}

fn ensure_finite_coordinates(values: &[f64], what: &str) -> ChartResult<()> {
    if values.iter().any(|value| !value.is_finite()) {
        return Err(ChartError::InvalidData(format!(
            "{what} coordinates must be finite"
        )));
    }
    Ok(())
}

/// One straight segment in pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinePrimitive {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub stroke_width: f64,
    pub color: Color,
}

impl LinePrimitive {
    #[must_use]
    pub const fn new(x1: f64, y1: f64, x2: f64, y2: f64, stroke_width: f64, color: Color) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            stroke_width,
            color,
        }
    }

    pub fn validate(self) -> ChartResult<()> {
        ensure_finite_coordinates(&[self.x1, self.y1, self.x2, self.y2], "line")?;
        if !self.stroke_width.is_finite() || self.stroke_width <= 0.0 {
            return Err(ChartError::InvalidData(
                "line stroke width must be finite and > 0".to_owned(),
            ));
        }
        self.color.validate()
    }
}

/// Filled (optionally rounded, optionally bordered) rectangle in pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectPrimitive {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub fill_color: Color,
    pub border_color: Color,
    pub border_width: f64,
    pub corner_radius: f64,
}

impl RectPrimitive {
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64, fill_color: Color) -> Self {
        Self {
            x,
            y,
            width,
            height,
            fill_color,
            border_color: fill_color,
            border_width: 0.0,
            corner_radius: 0.0,
        }
    }

    /// Rectangle spanning two arbitrary corners.
    #[must_use]
    pub fn from_edges(left: f64, top: f64, right: f64, bottom: f64, fill_color: Color) -> Self {
        Self::new(
            left.min(right),
            top.min(bottom),
            (right - left).abs(),
            (bottom - top).abs(),
            fill_color,
        )
    }

    #[must_use]
    pub fn with_corner_radius(mut self, corner_radius: f64) -> Self {
        self.corner_radius = corner_radius;
        self
    }

    #[must_use]
    pub fn with_border(mut self, border_width: f64, border_color: Color) -> Self {
        self.border_width = border_width;
        self.border_color = border_color;
        self
    }

    #[must_use]
    pub fn bottom(self) -> f64 {
        self.y + self.height
    }

    #[must_use]
    pub fn right(self) -> f64 {
        self.x + self.width
    }

    pub fn validate(self) -> ChartResult<()> {
        ensure_finite_coordinates(&[self.x, self.y, self.width, self.height], "rect")?;
        if self.width < 0.0 || self.height < 0.0 {
            return Err(ChartError::InvalidData(
                "rect size must be >= 0".to_owned(),
            ));
        }
        for (name, value) in [
            ("border width", self.border_width),
            ("corner radius", self.corner_radius),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ChartError::InvalidData(format!(
                    "rect {name} must be finite and >= 0"
                )));
            }
        }
        self.fill_color.validate()?;
        self.border_color.validate()
    }
}

/// Horizontal text alignment relative to `TextPrimitive::x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextHAlign {
    Left,
    Center,
    Right,
}

/// One label in pixel space. `y` is the top of the text box.
#[derive(Debug, Clone, PartialEq)]
pub struct TextPrimitive {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub font_size_px: f64,
    pub color: Color,
    pub h_align: TextHAlign,
}

impl TextPrimitive {
    #[must_use]
    pub fn new(
        text: impl Into<String>,
        x: f64,
        y: f64,
        font_size_px: f64,
        color: Color,
        h_align: TextHAlign,
    ) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            font_size_px,
            color,
            h_align,
        }
    }

    pub fn validate(&self) -> ChartResult<()> {
        if self.text.is_empty() {
            return Err(ChartError::InvalidData(
                "text primitive must not be empty".to_owned(),
            ));
        }
        ensure_finite_coordinates(&[self.x, self.y], "text")?;
        if !self.font_size_px.is_finite() || self.font_size_px <= 0.0 {
            return Err(ChartError::InvalidData(
                "font size must be finite and > 0".to_owned(),
            ));
        }
        self.color.validate()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo { x: f64, y: f64 },
    LineTo { x: f64, y: f64 },
    CubicTo {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        x: f64,
        y: f64,
    },
    Close,
}

impl PathCommand {
    fn coordinates(self) -> ([f64; 6], usize) {
        match self {
            Self::MoveTo { x, y } | Self::LineTo { x, y } => ([x, y, 0.0, 0.0, 0.0, 0.0], 2),
            Self::CubicTo {
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => ([x1, y1, x2, y2, x, y], 6),
            Self::Close => ([0.0; 6], 0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathStroke {
    pub width: f64,
    pub color: Color,
}

/// Arbitrary path made of move/line/cubic segments, stroked and/or filled.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathPrimitive {
    pub commands: Vec<PathCommand>,
    pub stroke: Option<PathStroke>,
    pub fill: Option<Color>,
}

impl PathPrimitive {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.commands.push(PathCommand::MoveTo { x, y });
        self
    }

    pub fn line_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.commands.push(PathCommand::LineTo { x, y });
        self
    }

    pub fn cubic_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64) -> &mut Self {
        self.commands.push(PathCommand::CubicTo {
            x1,
            y1,
            x2,
            y2,
            x,
            y,
        });
        self
    }

    pub fn close(&mut self) -> &mut Self {
        self.commands.push(PathCommand::Close);
        self
    }

    #[must_use]
    pub fn stroked(mut self, width: f64, color: Color) -> Self {
        self.stroke = Some(PathStroke { width, color });
        self
    }

    #[must_use]
    pub fn filled(mut self, color: Color) -> Self {
        self.fill = Some(color);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Last point the path moved or drew to.
    #[must_use]
    pub fn current_point(&self) -> Option<(f64, f64)> {
        self.commands.iter().rev().find_map(|command| match *command {
            PathCommand::MoveTo { x, y }
            | PathCommand::LineTo { x, y }
            | PathCommand::CubicTo { x, y, .. } => Some((x, y)),
            PathCommand::Close => None,
        })
    }

    pub fn validate(&self) -> ChartResult<()> {
        if !matches!(self.commands.first(), Some(PathCommand::MoveTo { .. })) {
            return Err(ChartError::InvalidData(
                "path must start with a move".to_owned(),
            ));
        }
        for command in &self.commands {
            let (values, count) = command.coordinates();
            ensure_finite_coordinates(&values[..count], "path")?;
        }
        if self.stroke.is_none() && self.fill.is_none() {
            return Err(ChartError::InvalidData(
                "path needs a stroke or a fill".to_owned(),
            ));
        }
        if let Some(stroke) = self.stroke {
            if !stroke.width.is_finite() || stroke.width <= 0.0 {
                return Err(ChartError::InvalidData(
                    "path stroke width must be finite and > 0".to_owned(),
                ));
            }
            stroke.color.validate()?;
        }
        if let Some(fill) = self.fill {
            fill.validate()?;
        }
        Ok(())
    }
}
