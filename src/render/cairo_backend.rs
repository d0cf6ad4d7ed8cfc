use cairo::{Context, Format, ImageSurface};
use pango::FontDescription;
use std::f64::consts::{FRAC_PI_2, PI};

use crate::error::{ChartError, ChartResult};
use crate::render::{
    Color, DrawCommand, PathCommand, PathPrimitive, RectPrimitive, RenderFrame, Renderer,
    TextHAlign,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CairoRenderStats {
    pub lines_drawn: usize,
    pub rects_drawn: usize,
    pub texts_drawn: usize,
    pub paths_drawn: usize,
    pub clips_pushed: usize,
}

/// Renderers that can draw into an externally owned Cairo context.
pub trait CairoContextRenderer {
    fn render_on_cairo_context(
        &mut self,
        context: &Context,
        frame: &RenderFrame,
    ) -> ChartResult<()>;
}

/// Cairo + Pango + PangoCairo backend.
///
/// Renders offscreen through `Renderer::render`, or in place on an external
/// context through `CairoContextRenderer`.
#[derive(Debug)]
pub struct CairoRenderer {
    surface: ImageSurface,
    clear_color: Color,
    last_stats: CairoRenderStats,
}

impl CairoRenderer {
    pub fn new(width: i32, height: i32) -> ChartResult<Self> {
        if width <= 0 || height <= 0 {
            return Err(ChartError::InvalidData(
                "cairo surface size must be > 0".to_owned(),
            ));
        }

        let surface = ImageSurface::create(Format::ARgb32, width, height)
            .map_err(|err| map_backend_error("failed to create cairo surface", err))?;
        Ok(Self {
            surface,
            clear_color: Color::rgb(1.0, 1.0, 1.0),
            last_stats: CairoRenderStats::default(),
        })
    }

    #[must_use]
    pub fn surface(&self) -> &ImageSurface {
        &self.surface
    }

    pub fn set_clear_color(&mut self, color: Color) -> ChartResult<()> {
        color.validate()?;
        self.clear_color = color;
        Ok(())
    }

    #[must_use]
    pub fn last_stats(&self) -> CairoRenderStats {
        self.last_stats
    }

    fn render_with_context(&mut self, context: &Context, frame: &RenderFrame) -> ChartResult<()> {
        frame.validate()?;

        apply_color(context, self.clear_color);
        context
            .paint()
            .map_err(|err| map_backend_error("failed to clear surface", err))?;

        let mut stats = CairoRenderStats::default();
        for command in &frame.commands {
            match command {
                DrawCommand::Line(line) => {
                    apply_color(context, line.color);
                    context.set_line_width(line.stroke_width);
                    context.move_to(line.x1, line.y1);
                    context.line_to(line.x2, line.y2);
                    context
                        .stroke()
                        .map_err(|err| map_backend_error("failed to stroke line", err))?;
                    stats.lines_drawn += 1;
                }
                DrawCommand::Rect(rect) => {
                    draw_rect(context, *rect)?;
                    stats.rects_drawn += 1;
                }
                DrawCommand::Text(text) => {
                    let layout = pangocairo::functions::create_layout(context);
                    let font_description =
                        FontDescription::from_string(&format!("Sans {}px", text.font_size_px));
                    layout.set_font_description(Some(&font_description));
                    layout.set_text(&text.text);

                    let (text_width, _) = layout.pixel_size();
                    let x = match text.h_align {
                        TextHAlign::Left => text.x,
                        TextHAlign::Center => text.x - f64::from(text_width) / 2.0,
                        TextHAlign::Right => text.x - f64::from(text_width),
                    };
                    apply_color(context, text.color);
                    context.move_to(x, text.y);
                    pangocairo::functions::show_layout(context, &layout);
                    stats.texts_drawn += 1;
                }
                DrawCommand::Path(path) => {
                    draw_path(context, path)?;
                    stats.paths_drawn += 1;
                }
                DrawCommand::PushClip(rect) => {
                    context
                        .save()
                        .map_err(|err| map_backend_error("failed to save cairo state", err))?;
                    context.rectangle(rect.left, rect.top, rect.width(), rect.height());
                    context.clip();
                    stats.clips_pushed += 1;
                }
                DrawCommand::PopClip => {
                    context
                        .restore()
                        .map_err(|err| map_backend_error("failed to restore cairo state", err))?;
                }
            }
        }

        self.last_stats = stats;
        Ok(())
    }
}

impl Renderer for CairoRenderer {
    fn render(&mut self, frame: &RenderFrame) -> ChartResult<()> {
        let context = Context::new(&self.surface)
            .map_err(|err| map_backend_error("failed to create cairo context", err))?;
        self.render_with_context(&context, frame)
    }
}

impl CairoContextRenderer for CairoRenderer {
    fn render_on_cairo_context(
        &mut self,
        context: &Context,
        frame: &RenderFrame,
    ) -> ChartResult<()> {
        self.render_with_context(context, frame)
    }
}

fn apply_color(context: &Context, color: Color) {
    context.set_source_rgba(color.red, color.green, color.blue, color.alpha);
}

fn draw_rect(context: &Context, rect: RectPrimitive) -> ChartResult<()> {
    append_rect_path(context, rect);
    apply_color(context, rect.fill_color);
    if rect.border_width > 0.0 {
        context
            .fill_preserve()
            .map_err(|err| map_backend_error("failed to fill rectangle", err))?;
        apply_color(context, rect.border_color);
        context.set_line_width(rect.border_width);
        context
            .stroke()
            .map_err(|err| map_backend_error("failed to stroke rectangle border", err))
    } else {
        context
            .fill()
            .map_err(|err| map_backend_error("failed to fill rectangle", err))
    }
}

fn draw_path(context: &Context, path: &PathPrimitive) -> ChartResult<()> {
    context.new_path();
    for command in &path.commands {
        match *command {
            PathCommand::MoveTo { x, y } => context.move_to(x, y),
            PathCommand::LineTo { x, y } => context.line_to(x, y),
            PathCommand::CubicTo {
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => context.curve_to(x1, y1, x2, y2, x, y),
            PathCommand::Close => context.close_path(),
        }
    }
    if let Some(fill) = path.fill {
        apply_color(context, fill);
        context
            .fill_preserve()
            .map_err(|err| map_backend_error("failed to fill path", err))?;
    }
    if let Some(stroke) = path.stroke {
        apply_color(context, stroke.color);
        context.set_line_width(stroke.width);
        context
            .stroke_preserve()
            .map_err(|err| map_backend_error("failed to stroke path", err))?;
    }
    context.new_path();
    Ok(())
}

fn append_rect_path(context: &Context, rect: RectPrimitive) {
    if rect.corner_radius <= 0.0 {
        context.rectangle(rect.x, rect.y, rect.width, rect.height);
        return;
    }

    let radius = rect
        .corner_radius
        .min(rect.width * 0.5)
        .min(rect.height * 0.5);
    let left = rect.x;
    let top = rect.y;
    let right = rect.right();
    let bottom = rect.bottom();

    context.new_sub_path();
    context.arc(right - radius, top + radius, radius, -FRAC_PI_2, 0.0);
    context.arc(right - radius, bottom - radius, radius, 0.0, FRAC_PI_2);
    context.arc(left + radius, bottom - radius, radius, FRAC_PI_2, PI);
    context.arc(left + radius, top + radius, radius, PI, PI + FRAC_PI_2);
    context.close_path();
}

fn map_backend_error(prefix: &str, err: cairo::Error) -> ChartError {
    ChartError::InvalidData(format!("{prefix}: {err}"))
}
