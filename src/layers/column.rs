use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::primitives::{ensure_non_negative, ensure_positive, lerp};
use crate::core::{
    CartesianLayerModel, ChartRanges, ColumnLayerModel, DrawingModel, DrawingModelEntry,
    EntityKey, ExtraStore, LayerDimensions, MutableChartRanges, MutableLayerDimensions,
    RangeContribution, RangeProvider, ValueFormatter, VerticalAxisPosition, YRange,
};
use crate::error::{ChartError, ChartResult};
use crate::extensions::{MarkerTarget, MarkerTargets, MarkerValue};
use crate::layers::{CartesianLayer, DrawingContext, LayerTransition, MeasuringContext};
use crate::render::{Color, RectPrimitive, TextHAlign, TextPrimitive};

const DEFAULT_COLUMN_SPACING_DP: f64 = 8.0;

/// Vertical extent of one column inside the y range (0 = bottom, 1 = top).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnEntry {
    /// Where the column starts: the zero line or, when stacked, the top of
    /// the previous column on the same side.
    pub start_fraction: f64,
    pub end_fraction: f64,
}

impl DrawingModelEntry for ColumnEntry {
    fn zero(&self) -> Self {
        Self {
            end_fraction: self.start_fraction,
            ..*self
        }
    }

    fn lerp(&self, to: &Self, fraction: f64) -> Self {
        Self {
            start_fraction: lerp(self.start_fraction, to.start_fraction, fraction),
            end_fraction: lerp(self.end_fraction, to.end_fraction, fraction),
        }
    }
}

/// How columns of different series sharing an x value are combined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MergeMode {
    /// Side by side in series order.
    Grouped { column_spacing_dp: f64 },
    /// On top of each other; positive and negative values stack separately.
    Stacked,
}

impl Default for MergeMode {
    fn default() -> Self {
        Self::Grouped {
            column_spacing_dp: DEFAULT_COLUMN_SPACING_DP,
        }
    }
}

impl FromStr for MergeMode {
    type Err = ChartError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "grouped" => Ok(Self::default()),
            "stacked" => Ok(Self::Stacked),
            other => Err(ChartError::InvalidConfig(format!(
                "unknown merge mode `{other}` (expected `grouped` or `stacked`)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnStyle {
    pub color: Color,
    pub thickness_dp: f64,
    #[serde(default)]
    pub corner_radius_dp: f64,
}

impl ColumnStyle {
    #[must_use]
    pub fn new(color: Color) -> Self {
        Self {
            color,
            thickness_dp: 8.0,
            corner_radius_dp: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataLabelStyle {
    pub font_sp: f64,
    pub color: Color,
    pub offset_dp: f64,
}

impl Default for DataLabelStyle {
    fn default() -> Self {
        Self {
            font_sp: 11.0,
            color: Color::rgb(0.2, 0.2, 0.2),
            offset_dp: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnLayerConfig {
    /// One style per series, reused cyclically.
    pub styles: Vec<ColumnStyle>,
    #[serde(default)]
    pub merge_mode: MergeMode,
    /// Gap between neighbouring x groups.
    pub column_collection_spacing_dp: f64,
    #[serde(default)]
    pub range_provider: RangeProvider,
    #[serde(default)]
    pub vertical_axis_position: Option<VerticalAxisPosition>,
}

impl Default for ColumnLayerConfig {
    fn default() -> Self {
        Self {
            styles: vec![ColumnStyle::new(Color::rgb(0.15, 0.45, 0.85))],
            merge_mode: MergeMode::default(),
            column_collection_spacing_dp: 32.0,
            range_provider: RangeProvider::Auto,
            vertical_axis_position: None,
        }
    }
}

impl ColumnLayerConfig {
    fn validate(self) -> ChartResult<Self> {
        if self.styles.is_empty() {
            return Err(ChartError::InvalidConfig(
                "column layer needs at least one style".to_owned(),
            ));
        }
        for style in &self.styles {
            style.color.validate()?;
            ensure_positive(style.thickness_dp, "column thickness_dp")?;
            ensure_non_negative(style.corner_radius_dp, "column corner_radius_dp")?;
        }
        if let MergeMode::Grouped { column_spacing_dp } = self.merge_mode {
            ensure_non_negative(column_spacing_dp, "column_spacing_dp")?;
        }
        ensure_non_negative(
            self.column_collection_spacing_dp,
            "column_collection_spacing_dp",
        )?;
        Ok(self)
    }
}

#[derive(Debug)]
pub struct ColumnLayer {
    config: ColumnLayerConfig,
    data_labels: Option<(DataLabelStyle, Arc<dyn ValueFormatter>)>,
    transition: LayerTransition<ColumnEntry>,
    marker_targets: MarkerTargets,
}

impl ColumnLayer {
    pub fn new(config: ColumnLayerConfig) -> ChartResult<Self> {
        Ok(Self {
            config: config.validate()?,
            data_labels: None,
            transition: LayerTransition::new("column_layer.drawing_model"),
            marker_targets: MarkerTargets::new(),
        })
    }

    /// Draws each column's value next to its free end.
    #[must_use]
    pub fn with_data_labels(
        mut self,
        style: DataLabelStyle,
        formatter: Arc<dyn ValueFormatter>,
    ) -> Self {
        self.data_labels = Some((style, formatter));
        self
    }

    #[must_use]
    pub fn config(&self) -> &ColumnLayerConfig {
        &self.config
    }

    fn style(&self, series: usize) -> ColumnStyle {
        self.config.styles[series % self.config.styles.len()]
    }

    fn column_spacing_dp(&self) -> f64 {
        match self.config.merge_mode {
            MergeMode::Grouped { column_spacing_dp } => column_spacing_dp,
            MergeMode::Stacked => 0.0,
        }
    }

    /// Width of all columns at one x, in dp.
    #[must_use]
    pub fn group_width_dp(&self, series_count: usize) -> f64 {
        let series_count = series_count.max(1);
        match self.config.merge_mode {
            MergeMode::Grouped { column_spacing_dp } => {
                let thickness: f64 = (0..series_count)
                    .map(|series| self.style(series).thickness_dp)
                    .sum();
                thickness + column_spacing_dp * (series_count - 1) as f64
            }
            MergeMode::Stacked => (0..series_count)
                .map(|series| self.style(series).thickness_dp)
                .fold(0.0, f64::max),
        }
    }

    /// Left edge of `series`' column relative to the group center, in dp.
    fn column_offset_dp(&self, series: usize, series_count: usize) -> f64 {
        match self.config.merge_mode {
            MergeMode::Grouped { .. } => {
                let preceding: f64 = (0..series)
                    .map(|index| self.style(index).thickness_dp + self.column_spacing_dp())
                    .sum();
                preceding - self.group_width_dp(series_count) / 2.0
            }
            MergeMode::Stacked => -self.style(series).thickness_dp / 2.0,
        }
    }

    fn stacked_extrema(model: &ColumnLayerModel) -> Option<(f64, f64)> {
        let data = model.data();
        data.distinct_xs()
            .into_iter()
            .map(|x| {
                (0..data.series_count())
                    .filter_map(|series| data.value_at(series, x))
                    .fold((0.0_f64, 0.0_f64), |(negative, positive), value| {
                        if value < 0.0 {
                            (negative + value, positive)
                        } else {
                            (negative, positive + value)
                        }
                    })
            })
            .reduce(|(lo, hi), (negative, positive)| (lo.min(negative), hi.max(positive)))
    }

    fn build_drawing_model(
        &self,
        model: &ColumnLayerModel,
        ranges: &ChartRanges,
    ) -> Option<DrawingModel<ColumnEntry>> {
        let y_range = ranges.y_range(self.config.vertical_axis_position);
        let data = model.data();
        let mut entries = Vec::new();
        match self.config.merge_mode {
            MergeMode::Grouped { .. } => {
                let base = y_range.fraction_of(0.0)?.clamp(0.0, 1.0);
                for (series, points) in data.series().iter().enumerate() {
                    for point in points {
                        entries.push((
                            EntityKey::new(point.x, series as u32),
                            ColumnEntry {
                                start_fraction: base,
                                end_fraction: y_range.fraction_of(point.y)?,
                            },
                        ));
                    }
                }
            }
            MergeMode::Stacked => {
                for x in data.distinct_xs() {
                    let (mut negative, mut positive) = (0.0, 0.0);
                    for series in 0..data.series_count() {
                        let Some(value) = data.value_at(series, x) else {
                            continue;
                        };
                        let side = if value < 0.0 { &mut negative } else { &mut positive };
                        let start = *side;
                        *side += value;
                        entries.push((
                            EntityKey::new(x, series as u32),
                            ColumnEntry {
                                start_fraction: y_range.fraction_of(start)?,
                                end_fraction: y_range.fraction_of(*side)?,
                            },
                        ));
                    }
                }
            }
        }
        Some(entries.into_iter().collect())
    }

    fn series_count(model: Option<&ColumnLayerModel>, entries: &[(EntityKey, ColumnEntry)]) -> usize {
        let from_entries = entries
            .iter()
            .map(|(key, _)| key.series as usize + 1)
            .max()
            .unwrap_or(0);
        model
            .map_or(0, |model| model.data().series_count())
            .max(from_entries)
    }
}

fn entry_value(y_range: YRange, entry: ColumnEntry) -> Option<f64> {
    Some((entry.end_fraction - entry.start_fraction) * y_range.length()?)
}

impl CartesianLayer for ColumnLayer {
    type Model = ColumnLayerModel;

    fn update_chart_ranges(
        &self,
        ranges: &mut MutableChartRanges,
        model: &ColumnLayerModel,
    ) -> ChartResult<()> {
        let Some((min_x, max_x, mut min_y, mut max_y)) = model.extrema() else {
            return Ok(());
        };
        if self.config.merge_mode == MergeMode::Stacked {
            if let Some((low, high)) = Self::stacked_extrema(model) {
                (min_y, max_y) = (low, high);
            }
        }
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
        model: Option<&ColumnLayerModel>,
    ) -> ChartResult<()> {
        let series_count = model.map_or(1, |model| model.data().series_count());
        let x_spacing = context.dp(
            self.group_width_dp(series_count) + self.config.column_collection_spacing_dp,
        );
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
        model: Option<&ColumnLayerModel>,
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
        model: Option<&ColumnLayerModel>,
    ) -> ChartResult<()> {
        self.marker_targets.clear();
        let ranges = context.mapper.ranges;
        let entries = self.transition.entries(context.extra_store, || {
            model.and_then(|model| self.build_drawing_model(model, &ranges))
        });
        if entries.is_empty() {
            return Ok(());
        }

        let series_count = Self::series_count(model, &entries);
        let y_range = context.mapper.y_range(self.config.vertical_axis_position);
        let px_per_dp = context.dp(1.0) * context.zoom;
        let visibility_margin = context.mapper.dimensions.x_spacing;

        let mut targets: BTreeMap<OrderedFloat<f64>, Vec<MarkerTarget>> = BTreeMap::new();
        for (key, entry) in &entries {
            let series = key.series as usize;
            let Some(center_x) = context.mapper.x_to_canvas(key.x()) else {
                continue;
            };
            if !context.mapper.is_x_visible(center_x, visibility_margin) {
                continue;
            }
            let style = self.style(series);
            let left = center_x + self.column_offset_dp(series, series_count) * px_per_dp;
            let width = style.thickness_dp * px_per_dp;
            let start_y = context.mapper.fraction_to_canvas(entry.start_fraction);
            let end_y = context.mapper.fraction_to_canvas(entry.end_fraction);

            context.surface.draw_rect(
                RectPrimitive::from_edges(left, start_y, left + width, end_y, style.color)
                    .with_corner_radius(context.dp(style.corner_radius_dp)),
            );

            let value = model
                .and_then(|model| model.data().value_at(series, key.x()))
                .or_else(|| entry_value(y_range, *entry));
            let Some(value) = value else {
                continue;
            };

            if let Some((label_style, formatter)) = &self.data_labels {
                let text = formatter.format(&ranges, value, self.config.vertical_axis_position)?;
                if !text.is_empty() {
                    let font_px = context.sp(label_style.font_sp);
                    let offset = context.dp(label_style.offset_dp);
                    let y = if end_y <= start_y {
                        end_y - offset - font_px
                    } else {
                        end_y + offset
                    };
                    context.surface.draw_text(TextPrimitive::new(
                        text,
                        left + width / 2.0,
                        y,
                        font_px,
                        label_style.color,
                        TextHAlign::Center,
                    ));
                }
            }

            targets.entry(OrderedFloat(key.x())).or_default().push(MarkerTarget {
                x: key.x(),
                canvas_x: left + width / 2.0,
                canvas_y: end_y,
                series_index: series,
                color: style.color,
                value: MarkerValue::Single(value),
            });
        }
        self.marker_targets = targets;
        trace!(columns = entries.len(), "column layer drawn");
        Ok(())
    }

    fn marker_targets(&self) -> &MarkerTargets {
        &self.marker_targets
    }
}
