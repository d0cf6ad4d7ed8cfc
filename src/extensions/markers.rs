use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::core::{ChartRanges, DecimalFormatter, Rect, UnitConverter, ValueFormatter};
use crate::error::ChartResult;
use crate::render::{
    Color, DrawingSurface, LinePrimitive, RectPrimitive, TextHAlign, TextPrimitive,
};

/// Value reported for one marked entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MarkerValue {
    Single(f64),
    Ohlc {
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    },
}

impl MarkerValue {
    /// Value shown in marker labels.
    #[must_use]
    pub fn label_value(self) -> f64 {
        match self {
            Self::Single(value) => value,
            Self::Ohlc { close, .. } => close,
        }
    }
}

/// Canvas location of one entity a marker can point at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerTarget {
    pub x: f64,
    pub canvas_x: f64,
    pub canvas_y: f64,
    pub series_index: usize,
    pub color: Color,
    pub value: MarkerValue,
}

/// Marker targets grouped by data x.
pub type MarkerTargets = BTreeMap<OrderedFloat<f64>, Vec<MarkerTarget>>;

/// Merges `other` into `targets`, keeping per-x insertion order.
pub fn merge_marker_targets(targets: &mut MarkerTargets, other: &MarkerTargets) {
    for (x, entries) in other {
        targets.entry(*x).or_default().extend(entries.iter().copied());
    }
}

/// Targets whose canvas x is closest to `pointer_x`.
#[must_use]
pub fn nearest_marker_targets(targets: &MarkerTargets, pointer_x: f64) -> Option<&[MarkerTarget]> {
    targets
        .values()
        .filter_map(|entries| {
            let first = entries.first()?;
            Some((OrderedFloat((first.canvas_x - pointer_x).abs()), entries))
        })
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, entries)| entries.as_slice())
}

/// Everything a marker needs to draw itself.
pub struct MarkerDrawContext<'a> {
    pub surface: &'a mut dyn DrawingSurface,
    pub layer_bounds: Rect,
    pub ranges: &'a ChartRanges,
    pub units: &'a dyn UnitConverter,
}

/// Highlights a set of marker targets.
pub trait CartesianMarker: fmt::Debug + Send + Sync {
    fn draw(&self, context: &mut MarkerDrawContext<'_>, targets: &[MarkerTarget])
    -> ChartResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkerStyle {
    pub guideline_color: Color,
    pub guideline_thickness_dp: f64,
    pub indicator_size_dp: f64,
    pub label_font_sp: f64,
    pub label_color: Color,
    pub label_background: Color,
    pub label_padding_dp: f64,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            guideline_color: Color::rgba(0.0, 0.0, 0.0, 0.35),
            guideline_thickness_dp: 1.0,
            indicator_size_dp: 8.0,
            label_font_sp: 12.0,
            label_color: Color::rgb(1.0, 1.0, 1.0),
            label_background: Color::rgba(0.1, 0.1, 0.1, 0.85),
            label_padding_dp: 4.0,
        }
    }
}

/// Vertical guideline, one dot per target and a value label along the top edge.
#[derive(Debug, Clone)]
pub struct DefaultCartesianMarker {
    pub style: MarkerStyle,
    pub formatter: Arc<dyn ValueFormatter>,
}

impl Default for DefaultCartesianMarker {
    fn default() -> Self {
        Self {
            style: MarkerStyle::default(),
            formatter: Arc::new(DecimalFormatter::default()),
        }
    }
}

impl DefaultCartesianMarker {
    fn label_text(&self, context: &MarkerDrawContext<'_>, targets: &[MarkerTarget]) -> ChartResult<String> {
        let mut parts = Vec::with_capacity(targets.len());
        for target in targets {
            parts.push(
                self.formatter
                    .format(context.ranges, target.value.label_value(), None)?,
            );
        }
        Ok(parts.join(", "))
    }
}

impl CartesianMarker for DefaultCartesianMarker {
    fn draw(
        &self,
        context: &mut MarkerDrawContext<'_>,
        targets: &[MarkerTarget],
    ) -> ChartResult<()> {
        let Some(first) = targets.first() else {
            return Ok(());
        };
        let bounds = context.layer_bounds;
        let style = self.style;
        let x = first.canvas_x;

        context.surface.draw_line(LinePrimitive::new(
            x,
            bounds.top,
            x,
            bounds.bottom,
            context.units.dp_to_px(style.guideline_thickness_dp),
            style.guideline_color,
        ));

        let indicator = context.units.dp_to_px(style.indicator_size_dp);
        for target in targets {
            context.surface.draw_rect(
                RectPrimitive::new(
                    target.canvas_x - indicator / 2.0,
                    target.canvas_y - indicator / 2.0,
                    indicator,
                    indicator,
                    target.color,
                )
                .with_corner_radius(indicator / 2.0),
            );
        }

        let text = self.label_text(context, targets)?;
        if text.is_empty() {
            return Ok(());
        }
        let font_px = context.units.sp_to_px(style.label_font_sp);
        let padding = context.units.dp_to_px(style.label_padding_dp);
        let width = crate::core::estimate_label_width_px(&text, font_px) + 2.0 * padding;
        let center = clamp_x(x - bounds.left, width / 2.0, bounds.width()) + bounds.left;
        context.surface.draw_rect(
            RectPrimitive::new(
                center - width / 2.0,
                bounds.top,
                width,
                font_px + 2.0 * padding,
                style.label_background,
            )
            .with_corner_radius(padding),
        );
        context.surface.draw_text(TextPrimitive::new(
            text,
            center,
            bounds.top + padding,
            font_px,
            style.label_color,
            TextHAlign::Center,
        ));
        Ok(())
    }
}

/// Keeps a span of half-width `span_half` centered at `x` inside `[0, width]`.
fn clamp_x(x: f64, span_half: f64, width: f64) -> f64 {
    if width <= 2.0 * span_half {
        width * 0.5
    } else {
        x.clamp(span_half, width - span_half)
    }
}

#[cfg(test)]
mod tests {
    use ordered_float::OrderedFloat;

    use super::{
        MarkerTarget, MarkerTargets, MarkerValue, clamp_x, merge_marker_targets,
        nearest_marker_targets,
    };
    use crate::render::Color;

    fn target(x: f64, canvas_x: f64, series_index: usize) -> MarkerTarget {
        MarkerTarget {
            x,
            canvas_x,
            canvas_y: 0.0,
            series_index,
            color: Color::rgb(0.0, 0.0, 0.0),
            value: MarkerValue::Single(x),
        }
    }

    #[test]
    fn nearest_picks_closest_canvas_x() {
        let mut targets = MarkerTargets::new();
        targets.insert(OrderedFloat(0.0), vec![target(0.0, 10.0, 0)]);
        targets.insert(OrderedFloat(1.0), vec![target(1.0, 50.0, 0)]);

        let nearest = nearest_marker_targets(&targets, 34.0).expect("targets");
        assert_eq!(nearest[0].x, 1.0);
        assert!(nearest_marker_targets(&MarkerTargets::new(), 0.0).is_none());
    }

    #[test]
    fn merge_appends_per_x() {
        let mut targets = MarkerTargets::new();
        targets.insert(OrderedFloat(0.0), vec![target(0.0, 10.0, 0)]);
        let mut other = MarkerTargets::new();
        other.insert(OrderedFloat(0.0), vec![target(0.0, 10.0, 1)]);

        merge_marker_targets(&mut targets, &other);
        assert_eq!(targets[&OrderedFloat(0.0)].len(), 2);
    }

    #[test]
    fn labels_stay_inside_the_layer() {
        assert_eq!(clamp_x(2.0, 10.0, 100.0), 10.0);
        assert_eq!(clamp_x(99.0, 10.0, 100.0), 90.0);
        assert_eq!(clamp_x(40.0, 80.0, 100.0), 50.0);
    }
}
