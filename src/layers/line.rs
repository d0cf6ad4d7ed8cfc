use std::collections::BTreeMap;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::primitives::{ensure_non_negative, ensure_positive, lerp};
use crate::core::{
    CartesianLayerModel, ChartRanges, DrawingModel, DrawingModelEntry, EntityKey, ExtraStore,
    LayerDimensions, LineLayerModel, MutableChartRanges, MutableLayerDimensions,
    RangeContribution, RangeProvider, VerticalAxisPosition,
};
use crate::error::{ChartError, ChartResult};
use crate::extensions::{MarkerTarget, MarkerTargets, MarkerValue};
use crate::layers::{
    CartesianLayer, DrawingContext, LayerTransition, MeasuringContext, PointConnector,
};
use crate::render::{Color, PathPrimitive, RectPrimitive};

/// Position of one line point inside the y range (0 = bottom, 1 = top).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinePointEntry {
    pub y_fraction: f64,
    /// Fraction of the zero line; points grow from and collapse onto it.
    pub baseline_fraction: f64,
}

impl DrawingModelEntry for LinePointEntry {
    fn zero(&self) -> Self {
        Self {
            y_fraction: self.baseline_fraction,
            ..*self
        }
    }

    fn lerp(&self, to: &Self, fraction: f64) -> Self {
        Self {
            y_fraction: lerp(self.y_fraction, to.y_fraction, fraction),
            baseline_fraction: lerp(self.baseline_fraction, to.baseline_fraction, fraction),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    pub color: Color,
    pub thickness_dp: f64,
    #[serde(default)]
    pub connector: PointConnector,
    /// Fill between the line and the zero line.
    #[serde(default)]
    pub area_fill: Option<Color>,
    /// Diameter of a dot drawn at every point.
    #[serde(default)]
    pub point_size_dp: Option<f64>,
}

impl LineStyle {
    #[must_use]
    pub fn new(color: Color) -> Self {
        Self {
            color,
            thickness_dp: 2.0,
            connector: PointConnector::Straight,
            area_fill: None,
            point_size_dp: None,
        }
    }

    fn validate(self) -> ChartResult<Self> {
        self.color.validate()?;
        ensure_positive(self.thickness_dp, "line thickness_dp")?;
        self.connector.validate()?;
        if let Some(fill) = self.area_fill {
            fill.validate()?;
        }
        if let Some(size) = self.point_size_dp {
            ensure_non_negative(size, "point_size_dp")?;
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineLayerConfig {
    /// One style per series, reused cyclically.
    pub styles: Vec<LineStyle>,
    pub point_spacing_dp: f64,
    #[serde(default)]
    pub range_provider: RangeProvider,
    #[serde(default)]
    pub vertical_axis_position: Option<VerticalAxisPosition>,
}

impl Default for LineLayerConfig {
    fn default() -> Self {
        Self {
            styles: vec![LineStyle::new(Color::rgb(0.15, 0.45, 0.85))],
            point_spacing_dp: 32.0,
            range_provider: RangeProvider::Auto,
            vertical_axis_position: None,
        }
    }
}

#[derive(Debug)]
pub struct LineLayer {
    config: LineLayerConfig,
    transition: LayerTransition<LinePointEntry>,
    marker_targets: MarkerTargets,
}

impl LineLayer {
    pub fn new(config: LineLayerConfig) -> ChartResult<Self> {
        if config.styles.is_empty() {
            return Err(ChartError::InvalidConfig(
                "line layer needs at least one style".to_owned(),
            ));
        }
        for style in &config.styles {
            style.validate()?;
        }
        ensure_positive(config.point_spacing_dp, "point_spacing_dp")?;
        Ok(Self {
            config,
            transition: LayerTransition::new("line_layer.drawing_model"),
            marker_targets: MarkerTargets::new(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &LineLayerConfig {
        &self.config
    }

    fn style(&self, series: u32) -> LineStyle {
        self.config.styles[series as usize % self.config.styles.len()]
    }

    fn build_drawing_model(
        &self,
        model: &LineLayerModel,
        ranges: &ChartRanges,
    ) -> Option<DrawingModel<LinePointEntry>> {
        let y_range = ranges.y_range(self.config.vertical_axis_position);
        let baseline_fraction = y_range.fraction_of(0.0)?.clamp(0.0, 1.0);
        let mut entries = Vec::new();
        for (series, points) in model.data().series().iter().enumerate() {
            for point in points {
                entries.push((
                    EntityKey::new(point.x, series as u32),
                    LinePointEntry {
                        y_fraction: y_range.fraction_of(point.y)?,
                        baseline_fraction,
                    },
                ));
            }
        }
        Some(entries.into_iter().collect())
    }
}

impl CartesianLayer for LineLayer {
    type Model = LineLayerModel;

    fn update_chart_ranges(
        &self,
        ranges: &mut MutableChartRanges,
        model: &LineLayerModel,
    ) -> ChartResult<()> {
        let Some((min_x, max_x, min_y, max_y)) = model.extrema() else {
            return Ok(());
        };
        let (min_x, max_x, min_y, max_y) =
            self.config.range_provider.resolve(min_x, max_x, min_y, max_y);
        ranges.update(RangeContribution {
            min_x,
            max_x,
            min_y,
            max_y,
            min_x_delta: model.min_x_delta(),
            vertical_axis_position: self.config.vertical_axis_position,
        })
    }

    fn update_dimensions(
        &self,
        context: &MeasuringContext<'_>,
        dimensions: &mut MutableLayerDimensions,
        _model: Option<&LineLayerModel>,
    ) -> ChartResult<()> {
        let x_spacing = context.dp(self.config.point_spacing_dp);
        dimensions.update(LayerDimensions::new(
            x_spacing,
            x_spacing / 2.0,
            x_spacing / 2.0,
            0.0,
            0.0,
        )?)
    }

    fn prepare_for_transformation(
        &self,
        model: Option<&LineLayerModel>,
        ranges: &ChartRanges,
        extra_store: &mut ExtraStore,
    ) {
        let target = model.and_then(|model| self.build_drawing_model(model, ranges));
        self.transition.prepare(target, extra_store);
    }

    fn transform(&self, extra_store: &mut ExtraStore, fraction: f64) {
        self.transition.transform(extra_store, fraction);
    }

    fn draw(
        &mut self,
        context: &mut DrawingContext<'_>,
        model: Option<&LineLayerModel>,
    ) -> ChartResult<()> {
        self.marker_targets.clear();
        let ranges = context.mapper.ranges;
        let entries = self.transition.entries(context.extra_store, || {
            model.and_then(|model| self.build_drawing_model(model, &ranges))
        });
        if entries.is_empty() {
            return Ok(());
        }

        let position = self.config.vertical_axis_position;
        let y_range = context.mapper.y_range(position);
        let layer_height = context.layer_bounds().height();

        let mut by_series: BTreeMap<u32, Vec<(f64, LinePointEntry)>> = BTreeMap::new();
        for (key, entry) in entries {
            by_series.entry(key.series).or_default().push((key.x(), entry));
        }

        for (series, points) in by_series {
            let style = self.style(series);
            let canvas: Vec<(f64, f64, f64, LinePointEntry)> = points
                .iter()
                .filter_map(|(x, entry)| {
                    let canvas_x = context.mapper.x_to_canvas(*x)?;
                    let canvas_y = context.mapper.fraction_to_canvas(entry.y_fraction);
                    Some((*x, canvas_x, canvas_y, *entry))
                })
                .collect();
            let (Some(first), Some(last)) = (canvas.first(), canvas.last()) else {
                continue;
            };

            if canvas.len() > 1 {
                let mut line = PathPrimitive::new();
                line.move_to(first.1, first.2);
                for pair in canvas.windows(2) {
                    style.connector.connect(
                        &mut line,
                        (pair[0].1, pair[0].2),
                        (pair[1].1, pair[1].2),
                        layer_height,
                    );
                }
                if let Some(fill) = style.area_fill {
                    let baseline_y = context.mapper.fraction_to_canvas(first.3.baseline_fraction);
                    let mut area = line.clone();
                    area.line_to(last.1, baseline_y)
                        .line_to(first.1, baseline_y)
                        .close();
                    context.surface.draw_path(area.filled(fill));
                }
                let thickness = context.dp(style.thickness_dp);
                context.surface.draw_path(line.stroked(thickness, style.color));
            }

            let point_size = style.point_size_dp.map(|dp| context.dp(dp));
            for &(x, canvas_x, canvas_y, entry) in &canvas {
                if let Some(size) = point_size.filter(|size| *size > 0.0) {
                    context.surface.draw_rect(
                        RectPrimitive::new(
                            canvas_x - size / 2.0,
                            canvas_y - size / 2.0,
                            size,
                            size,
                            style.color,
                        )
                        .with_corner_radius(size / 2.0),
                    );
                }
                let value = model
                    .and_then(|model| model.data().value_at(series as usize, x))
                    .or_else(|| Some(y_range.min_y()? + entry.y_fraction * y_range.length()?));
                let Some(value) = value else {
                    continue;
                };
                self.marker_targets
                    .entry(OrderedFloat(x))
                    .or_default()
                    .push(MarkerTarget {
                        x,
                        canvas_x,
                        canvas_y,
                        series_index: series as usize,
                        color: style.color,
                        value: MarkerValue::Single(value),
                    });
            }
        }
        trace!(targets = self.marker_targets.len(), "line layer drawn");
        Ok(())
    }

    fn marker_targets(&self) -> &MarkerTargets {
        &self.marker_targets
    }
}

#[cfg(test)]
mod tests {
    use super::{LineLayer, LineLayerConfig, LinePointEntry};
    use crate::core::DrawingModelEntry;

    #[test]
    fn points_collapse_onto_the_zero_line() {
        let entry = LinePointEntry {
            y_fraction: 0.9,
            baseline_fraction: 0.25,
        };
        assert_eq!(entry.zero().y_fraction, 0.25);
    }

    #[test]
    fn empty_style_list_is_rejected() {
        let config = LineLayerConfig {
            styles: Vec::new(),
            ..LineLayerConfig::default()
        };
        assert!(LineLayer::new(config).is_err());
    }
}
