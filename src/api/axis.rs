use std::ops::RangeInclusive;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::primitives::{ensure_non_negative, ensure_positive};
use crate::core::{
    CacheKey, ChartRanges, DecimalFormatter, MutableLayerDimensions, Rect, UnitConverter,
    ValueFormatter, VerticalAxisPosition, XRange, estimate_label_width_px, format_for_axis,
};
use crate::error::{ChartError, ChartResult};
use crate::layers::{CoordinateMapper, MeasuringContext};
use crate::render::{Color, DrawingSurface, LinePrimitive, TextHAlign, TextPrimitive};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HorizontalAxisPosition {
    Top,
    Bottom,
}

impl FromStr for HorizontalAxisPosition {
    type Err = ChartError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "top" => Ok(Self::Top),
            "bottom" => Ok(Self::Bottom),
            other => Err(ChartError::InvalidConfig(format!(
                "unknown horizontal axis position `{other}` (expected `top` or `bottom`)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisStyle {
    pub line_color: Color,
    pub line_thickness_dp: f64,
    pub tick_length_dp: f64,
    pub label_color: Color,
    pub label_size_sp: f64,
    pub label_padding_dp: f64,
    /// Lines drawn across the layer area at every labeled value.
    #[serde(default)]
    pub guideline_color: Option<Color>,
    pub guideline_thickness_dp: f64,
}

impl Default for AxisStyle {
    fn default() -> Self {
        Self {
            line_color: Color::rgb(0.55, 0.55, 0.55),
            line_thickness_dp: 1.0,
            tick_length_dp: 4.0,
            label_color: Color::rgb(0.25, 0.25, 0.25),
            label_size_sp: 12.0,
            label_padding_dp: 4.0,
            guideline_color: Some(Color::rgba(0.55, 0.55, 0.55, 0.3)),
            guideline_thickness_dp: 1.0,
        }
    }
}

impl AxisStyle {
    fn validate(self) -> ChartResult<Self> {
        self.line_color.validate()?;
        self.label_color.validate()?;
        if let Some(color) = self.guideline_color {
            color.validate()?;
        }
        ensure_positive(self.line_thickness_dp, "axis line_thickness_dp")?;
        ensure_non_negative(self.tick_length_dp, "axis tick_length_dp")?;
        ensure_positive(self.label_size_sp, "axis label_size_sp")?;
        ensure_non_negative(self.label_padding_dp, "axis label_padding_dp")?;
        ensure_positive(self.guideline_thickness_dp, "axis guideline_thickness_dp")?;
        Ok(self)
    }

    /// Space taken by the line, the ticks and the label padding, in pixels.
    fn decoration_px(self, units: &dyn UnitConverter) -> f64 {
        units.dp_to_px(self.line_thickness_dp + self.tick_length_dp + self.label_padding_dp)
    }
}

/// Inputs of one axis draw call.
pub struct AxisDrawContext<'a> {
    pub surface: &'a mut dyn DrawingSurface,
    pub units: &'a dyn UnitConverter,
    pub mapper: CoordinateMapper,
    /// Strip reserved for the axis next to the layer area.
    pub axis_bounds: Rect,
}

fn cached_label_width(context: &MeasuringContext<'_>, label: &str, font_px: f64) -> f64 {
    *context.cache_store.get_or_insert_with(
        CacheKey::new("axis.label_width")
            .with(label)
            .with(font_px),
        || estimate_label_width_px(label, font_px),
    )
}

/// Value axis along the start or end edge of the layer area, labeling
/// `item_count` evenly spaced values of its y range.
#[derive(Debug, Clone)]
pub struct VerticalAxis {
    position: VerticalAxisPosition,
    style: AxisStyle,
    item_count: usize,
    formatter: Arc<dyn ValueFormatter>,
}

impl VerticalAxis {
    #[must_use]
    pub fn new(position: VerticalAxisPosition) -> Self {
        Self {
            position,
            style: AxisStyle::default(),
            item_count: 5,
            formatter: Arc::new(DecimalFormatter::default()),
        }
    }

    pub fn with_style(mut self, style: AxisStyle) -> ChartResult<Self> {
        self.style = style.validate()?;
        Ok(self)
    }

    pub fn with_item_count(mut self, item_count: usize) -> ChartResult<Self> {
        if item_count < 2 {
            return Err(ChartError::InvalidConfig(format!(
                "vertical axis needs at least 2 items, got {item_count}"
            )));
        }
        self.item_count = item_count;
        Ok(self)
    }

    #[must_use]
    pub fn with_formatter(mut self, formatter: Arc<dyn ValueFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    #[must_use]
    pub fn position(&self) -> VerticalAxisPosition {
        self.position
    }

    /// Labeled values from the bottom of the range to its top.
    #[must_use]
    pub fn values(&self, ranges: &ChartRanges) -> Vec<f64> {
        let range = ranges.y_range_for_axis(self.position);
        let (Some(min_y), Some(length)) = (range.min_y(), range.length()) else {
            return Vec::new();
        };
        let last = (self.item_count - 1) as f64;
        (0..self.item_count)
            .map(|index| min_y + length * index as f64 / last)
            .collect()
    }

    pub fn labels(&self, ranges: &ChartRanges) -> ChartResult<Vec<(f64, String)>> {
        self.values(ranges)
            .into_iter()
            .map(|value| {
                format_for_axis(self.formatter.as_ref(), ranges, value, Some(self.position))
                    .map(|label| (value, label))
            })
            .collect()
    }

    /// Width of the axis strip; label widths are memoized in the cache store.
    pub fn measure_width(&self, context: &MeasuringContext<'_>) -> ChartResult<f64> {
        if context.ranges.is_empty() {
            return Ok(0.0);
        }
        let font_px = context.sp(self.style.label_size_sp);
        let widest = self
            .labels(context.ranges)?
            .iter()
            .map(|(_, label)| cached_label_width(context, label, font_px))
            .fold(0.0, f64::max);
        let width = widest + self.style.decoration_px(context.units);
        trace!(position = ?self.position, width, "vertical axis measured");
        Ok(width)
    }

    fn canvas_values(&self, mapper: &CoordinateMapper) -> ChartResult<Vec<(f64, String)>> {
        let range = mapper.ranges.y_range_for_axis(self.position);
        Ok(self
            .labels(&mapper.ranges)?
            .into_iter()
            .filter_map(|(value, label)| {
                let fraction = range.fraction_of(value)?;
                Some((mapper.fraction_to_canvas(fraction), label))
            })
            .collect())
    }

    pub fn draw_guidelines(&self, context: &mut AxisDrawContext<'_>) -> ChartResult<()> {
        let Some(color) = self.style.guideline_color else {
            return Ok(());
        };
        let layer = context.mapper.layer_bounds;
        let thickness = context.units.dp_to_px(self.style.guideline_thickness_dp);
        for (y, _) in self.canvas_values(&context.mapper)? {
            context
                .surface
                .draw_line(LinePrimitive::new(layer.left, y, layer.right, y, thickness, color));
        }
        Ok(())
    }

    pub fn draw(&self, context: &mut AxisDrawContext<'_>) -> ChartResult<()> {
        let style = self.style;
        let layer = context.mapper.layer_bounds;
        let line_px = context.units.dp_to_px(style.line_thickness_dp);
        let tick_px = context.units.dp_to_px(style.tick_length_dp);
        let padding_px = context.units.dp_to_px(style.label_padding_dp);
        let font_px = context.units.sp_to_px(style.label_size_sp);

        // Outward direction and the edge shared with the layer area.
        let (edge, direction, align) = match self.position {
            VerticalAxisPosition::Start => (context.axis_bounds.right, -1.0, TextHAlign::Right),
            VerticalAxisPosition::End => (context.axis_bounds.left, 1.0, TextHAlign::Left),
        };
        let line_x = edge + direction * line_px / 2.0;
        context.surface.draw_line(LinePrimitive::new(
            line_x,
            layer.top,
            line_x,
            layer.bottom,
            line_px,
            style.line_color,
        ));

        let tick_start = edge + direction * line_px;
        let label_x = tick_start + direction * (tick_px + padding_px);
        for (y, label) in self.canvas_values(&context.mapper)? {
            if tick_px > 0.0 {
                context.surface.draw_line(LinePrimitive::new(
                    tick_start,
                    y,
                    tick_start + direction * tick_px,
                    y,
                    line_px,
                    style.line_color,
                ));
            }
            context.surface.draw_text(TextPrimitive::new(
                label,
                label_x,
                y - font_px / 2.0,
                font_px,
                style.label_color,
                align,
            ));
        }
        Ok(())
    }
}

/// Axis along the top or bottom edge of the layer area, labeling every
/// `spacing`-th x step.
#[derive(Debug, Clone)]
pub struct HorizontalAxis {
    position: HorizontalAxisPosition,
    style: AxisStyle,
    spacing: usize,
    add_extreme_label_padding: bool,
    formatter: Arc<dyn ValueFormatter>,
}

impl HorizontalAxis {
    #[must_use]
    pub fn new(position: HorizontalAxisPosition) -> Self {
        Self {
            position,
            style: AxisStyle::default(),
            spacing: 1,
            add_extreme_label_padding: false,
            formatter: Arc::new(DecimalFormatter::default()),
        }
    }

    pub fn with_style(mut self, style: AxisStyle) -> ChartResult<Self> {
        self.style = style.validate()?;
        Ok(self)
    }

    pub fn with_spacing(mut self, spacing: usize) -> ChartResult<Self> {
        if spacing == 0 {
            return Err(ChartError::InvalidConfig(
                "horizontal axis spacing must be >= 1".to_owned(),
            ));
        }
        self.spacing = spacing;
        Ok(self)
    }

    /// Reserves room so the first and last labels are not cut off.
    #[must_use]
    pub fn with_extreme_label_padding(mut self, enabled: bool) -> Self {
        self.add_extreme_label_padding = enabled;
        self
    }

    #[must_use]
    pub fn with_formatter(mut self, formatter: Arc<dyn ValueFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    #[must_use]
    pub fn position(&self) -> HorizontalAxisPosition {
        self.position
    }

    /// Every labeled value of the x range. Drawing only walks the visible
    /// window; this is for callers that want the full list.
    #[must_use]
    pub fn values(&self, ranges: &ChartRanges) -> Vec<f64> {
        let Some(range) = ranges.x() else {
            return Vec::new();
        };
        (0..=self.last_index(range))
            .map(|index| self.value_at(range, index))
            .collect()
    }

    fn last_index(&self, range: XRange) -> usize {
        (range.step_count() / self.spacing as f64).floor() as usize
    }

    fn value_at(&self, range: XRange, index: usize) -> f64 {
        range.min_x + range.x_step * self.spacing as f64 * index as f64
    }

    /// First and last labeled values.
    fn extreme_values(&self, ranges: &ChartRanges) -> Option<(f64, f64)> {
        let range = ranges.x()?;
        Some((
            self.value_at(range, 0),
            self.value_at(range, self.last_index(range)),
        ))
    }

    /// Indices of the labels that can land inside the layer bounds, padded
    /// by one on each side.
    fn visible_indices(&self, mapper: &CoordinateMapper) -> Option<RangeInclusive<usize>> {
        let range = mapper.ranges.x()?;
        let last_index = self.last_index(range);
        let pitch = mapper.dimensions.x_spacing * self.spacing as f64;
        if !pitch.is_finite() || pitch <= 0.0 {
            return Some(0..=0);
        }
        let layer = mapper.layer_bounds;
        let origin = layer.left + mapper.dimensions.start_padding() - mapper.scroll_px;
        let first = ((layer.left - 0.5 - origin) / pitch).floor() - 1.0;
        let last = ((layer.right + 0.5 - origin) / pitch).ceil() + 1.0;
        if last < 0.0 || first > last_index as f64 {
            return None;
        }
        Some(first.max(0.0) as usize..=last.min(last_index as f64) as usize)
    }

    fn label(&self, ranges: &ChartRanges, value: f64) -> ChartResult<String> {
        format_for_axis(self.formatter.as_ref(), ranges, value, None)
    }

    /// Height of the axis strip.
    #[must_use]
    pub fn measure_height(&self, context: &MeasuringContext<'_>) -> f64 {
        if context.ranges.is_empty() {
            return 0.0;
        }
        context.sp(self.style.label_size_sp) + self.style.decoration_px(context.units)
    }

    /// Raises the unscalable paddings so half of each extreme label fits.
    pub fn update_dimensions(
        &self,
        context: &MeasuringContext<'_>,
        dimensions: &mut MutableLayerDimensions,
    ) -> ChartResult<()> {
        if !self.add_extreme_label_padding {
            return Ok(());
        }
        let Some((first, last)) = self.extreme_values(context.ranges) else {
            return Ok(());
        };
        let font_px = context.sp(self.style.label_size_sp);
        let half_width = |value: f64| -> ChartResult<f64> {
            let label = self.label(context.ranges, value)?;
            Ok(cached_label_width(context, &label, font_px) / 2.0)
        };
        let current = dimensions.values();
        let start = (half_width(first)? - current.scalable_start_padding).max(0.0);
        let end = (half_width(last)? - current.scalable_end_padding).max(0.0);
        dimensions.ensure_values_at_least(None, Some(start), Some(end))
    }

    fn canvas_values(&self, mapper: &CoordinateMapper) -> ChartResult<Vec<(f64, String)>> {
        let (Some(range), Some(indices)) = (mapper.ranges.x(), self.visible_indices(mapper)) else {
            return Ok(Vec::new());
        };
        let layer = mapper.layer_bounds;
        let mut out = Vec::new();
        for index in indices {
            let value = self.value_at(range, index);
            let Some(x) = mapper.x_to_canvas(value) else {
                continue;
            };
            if x < layer.left - 0.5 || x > layer.right + 0.5 {
                continue;
            }
            out.push((x, self.label(&mapper.ranges, value)?));
        }
        Ok(out)
    }

    pub fn draw_guidelines(&self, context: &mut AxisDrawContext<'_>) -> ChartResult<()> {
        let Some(color) = self.style.guideline_color else {
            return Ok(());
        };
        let layer = context.mapper.layer_bounds;
        let thickness = context.units.dp_to_px(self.style.guideline_thickness_dp);
        for (x, _) in self.canvas_values(&context.mapper)? {
            context
                .surface
                .draw_line(LinePrimitive::new(x, layer.top, x, layer.bottom, thickness, color));
        }
        Ok(())
    }

    pub fn draw(&self, context: &mut AxisDrawContext<'_>) -> ChartResult<()> {
        let style = self.style;
        let layer = context.mapper.layer_bounds;
        let line_px = context.units.dp_to_px(style.line_thickness_dp);
        let tick_px = context.units.dp_to_px(style.tick_length_dp);
        let padding_px = context.units.dp_to_px(style.label_padding_dp);
        let font_px = context.units.sp_to_px(style.label_size_sp);

        let (edge, direction) = match self.position {
            HorizontalAxisPosition::Bottom => (context.axis_bounds.top, 1.0),
            HorizontalAxisPosition::Top => (context.axis_bounds.bottom, -1.0),
        };
        let line_y = edge + direction * line_px / 2.0;
        context.surface.draw_line(LinePrimitive::new(
            layer.left,
            line_y,
            layer.right,
            line_y,
            line_px,
            style.line_color,
        ));

        let tick_start = edge + direction * line_px;
        let label_y = match self.position {
            HorizontalAxisPosition::Bottom => tick_start + tick_px + padding_px,
            HorizontalAxisPosition::Top => tick_start - tick_px - padding_px - font_px,
        };
        for (x, label) in self.canvas_values(&context.mapper)? {
            if tick_px > 0.0 {
                context.surface.draw_line(LinePrimitive::new(
                    x,
                    tick_start,
                    x,
                    tick_start + direction * tick_px,
                    line_px,
                    style.line_color,
                ));
            }
            context.surface.draw_text(TextPrimitive::new(
                label,
                x,
                label_y,
                font_px,
                style.label_color,
                TextHAlign::Center,
            ));
        }
        Ok(())
    }
}
