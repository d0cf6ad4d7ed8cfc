use serde::{Deserialize, Serialize};
use tracing::trace;

#[cfg(feature = "parallel-projection")]
use rayon::prelude::*;

use crate::core::primitives::{ensure_non_negative, ensure_positive, lerp};
use crate::core::{
    CandleKind, CandlestickLayerModel, CartesianLayerModel, ChartRanges, DrawingModel,
    DrawingModelEntry, EntityKey, ExtraStore, LayerDimensions, MutableChartRanges,
    MutableLayerDimensions, RangeContribution, RangeProvider, VerticalAxisPosition, YRange,
};
use crate::error::{ChartError, ChartResult};
use crate::extensions::{MarkerTarget, MarkerTargets, MarkerValue};
use crate::layers::{
    CartesianLayer, CoordinateMapper, DrawingContext, LayerTransition, MeasuringContext,
};
use crate::render::{Color, LinePrimitive, RectPrimitive};

/// OHLC values of one candle as fractions of the y range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandleEntry {
    pub open: f64,
    pub close: f64,
    pub low: f64,
    pub high: f64,
}

impl CandleEntry {
    #[must_use]
    pub fn kind(self) -> CandleKind {
        if self.close > self.open {
            CandleKind::Bullish
        } else if self.close < self.open {
            CandleKind::Bearish
        } else {
            CandleKind::Neutral
        }
    }

    fn to_values(self, y_range: YRange) -> Option<MarkerValue> {
        let (min_y, length) = (y_range.min_y()?, y_range.length()?);
        let value = |fraction: f64| min_y + fraction * length;
        Some(MarkerValue::Ohlc {
            open: value(self.open),
            high: value(self.high),
            low: value(self.low),
            close: value(self.close),
        })
    }
}

impl DrawingModelEntry for CandleEntry {
    /// Collapses the candle onto the middle of its body.
    fn zero(&self) -> Self {
        let center = (self.open + self.close) / 2.0;
        Self {
            open: center,
            close: center,
            low: center,
            high: center,
        }
    }

    fn lerp(&self, to: &Self, fraction: f64) -> Self {
        Self {
            open: lerp(self.open, to.open, fraction),
            close: lerp(self.close, to.close, fraction),
            low: lerp(self.low, to.low, fraction),
            high: lerp(self.high, to.high, fraction),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandleStyle {
    pub body_color: Color,
    pub wick_color: Color,
    pub wick_thickness_dp: f64,
}

impl CandleStyle {
    #[must_use]
    pub fn solid(color: Color) -> Self {
        Self {
            body_color: color,
            wick_color: color,
            wick_thickness_dp: 1.0,
        }
    }

    fn validate(self) -> ChartResult<Self> {
        self.body_color.validate()?;
        self.wick_color.validate()?;
        ensure_positive(self.wick_thickness_dp, "wick_thickness_dp")?;
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandlestickLayerConfig {
    pub bullish: CandleStyle,
    pub neutral: CandleStyle,
    pub bearish: CandleStyle,
    pub body_thickness_dp: f64,
    /// Gap between neighbouring candle bodies.
    pub candle_spacing_dp: f64,
    /// Bodies shorter than this are drawn at this height, centered.
    pub min_body_height_dp: f64,
    /// Whether wick thickness follows the zoom factor like the body width.
    #[serde(default)]
    pub scale_candle_wicks: bool,
    #[serde(default)]
    pub range_provider: RangeProvider,
    #[serde(default)]
    pub vertical_axis_position: Option<VerticalAxisPosition>,
}

impl Default for CandlestickLayerConfig {
    fn default() -> Self {
        Self {
            bullish: CandleStyle::solid(Color::rgb(0.15, 0.65, 0.35)),
            neutral: CandleStyle::solid(Color::rgb(0.5, 0.5, 0.5)),
            bearish: CandleStyle::solid(Color::rgb(0.85, 0.2, 0.2)),
            body_thickness_dp: 8.0,
            candle_spacing_dp: 4.0,
            min_body_height_dp: 1.0,
            scale_candle_wicks: false,
            range_provider: RangeProvider::Auto,
            vertical_axis_position: None,
        }
    }
}

impl CandlestickLayerConfig {
    #[must_use]
    pub fn style(&self, kind: CandleKind) -> CandleStyle {
        match kind {
            CandleKind::Bullish => self.bullish,
            CandleKind::Neutral => self.neutral,
            CandleKind::Bearish => self.bearish,
        }
    }

    fn validate(self) -> ChartResult<Self> {
        self.bullish.validate()?;
        self.neutral.validate()?;
        self.bearish.validate()?;
        ensure_positive(self.body_thickness_dp, "body_thickness_dp")?;
        ensure_non_negative(self.candle_spacing_dp, "candle_spacing_dp")?;
        ensure_non_negative(self.min_body_height_dp, "min_body_height_dp")?;
        Ok(self)
    }
}

/// Projected candle geometry in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandleGeometry {
    pub x: f64,
    pub center_x: f64,
    pub body_left: f64,
    pub body_right: f64,
    pub body_top: f64,
    pub body_bottom: f64,
    pub close_y: f64,
    pub wick_top: f64,
    pub wick_bottom: f64,
    pub kind: CandleKind,
    /// Entry the geometry was projected from.
    pub entry: CandleEntry,
}

/// Projects candle entries onto the canvas. Entries without a canvas x are
/// skipped; bodies shorter than `min_body_height_px` grow around their center.
pub fn project_candles(
    entries: &[(EntityKey, CandleEntry)],
    mapper: &CoordinateMapper,
    body_width_px: f64,
    min_body_height_px: f64,
) -> ChartResult<Vec<CandleGeometry>> {
    if !body_width_px.is_finite() || body_width_px <= 0.0 {
        return Err(ChartError::InvalidData(
            "body width must be finite and > 0".to_owned(),
        ));
    }
    if !min_body_height_px.is_finite() || min_body_height_px < 0.0 {
        return Err(ChartError::InvalidData(
            "minimum body height must be finite and >= 0".to_owned(),
        ));
    }

    #[cfg(feature = "parallel-projection")]
    {
        Ok(entries
            .par_iter()
            .filter_map(|(key, entry)| {
                project_single_candle(key.x(), *entry, mapper, body_width_px, min_body_height_px)
            })
            .collect())
    }

    #[cfg(not(feature = "parallel-projection"))]
    {
        Ok(entries
            .iter()
            .filter_map(|(key, entry)| {
                project_single_candle(key.x(), *entry, mapper, body_width_px, min_body_height_px)
            })
            .collect())
    }
}

fn project_single_candle(
    x: f64,
    entry: CandleEntry,
    mapper: &CoordinateMapper,
    body_width_px: f64,
    min_body_height_px: f64,
) -> Option<CandleGeometry> {
    let center_x = mapper.x_to_canvas(x)?;
    let half = body_width_px / 2.0;
    let open_y = mapper.fraction_to_canvas(entry.open);
    let close_y = mapper.fraction_to_canvas(entry.close);
    let (mut body_top, mut body_bottom) = (open_y.min(close_y), open_y.max(close_y));
    if body_bottom - body_top < min_body_height_px {
        let middle = (body_top + body_bottom) / 2.0;
        body_top = middle - min_body_height_px / 2.0;
        body_bottom = middle + min_body_height_px / 2.0;
    }
    Some(CandleGeometry {
        x,
        center_x,
        body_left: center_x - half,
        body_right: center_x + half,
        body_top,
        body_bottom,
        close_y,
        wick_top: mapper.fraction_to_canvas(entry.high),
        wick_bottom: mapper.fraction_to_canvas(entry.low),
        kind: entry.kind(),
        entry,
    })
}

#[derive(Debug)]
pub struct CandlestickLayer {
    config: CandlestickLayerConfig,
    transition: LayerTransition<CandleEntry>,
    marker_targets: MarkerTargets,
}

impl CandlestickLayer {
    pub fn new(config: CandlestickLayerConfig) -> ChartResult<Self> {
        Ok(Self {
            config: config.validate()?,
            transition: LayerTransition::new("candlestick_layer.drawing_model"),
            marker_targets: MarkerTargets::new(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &CandlestickLayerConfig {
        &self.config
    }

    fn build_drawing_model(
        &self,
        model: &CandlestickLayerModel,
        ranges: &ChartRanges,
    ) -> Option<DrawingModel<CandleEntry>> {
        let y_range = ranges.y_range(self.config.vertical_axis_position);
        model
            .entries()
            .iter()
            .map(|entry| {
                Some((
                    EntityKey::new(entry.x, 0),
                    CandleEntry {
                        open: y_range.fraction_of(entry.open)?,
                        close: y_range.fraction_of(entry.close)?,
                        low: y_range.fraction_of(entry.low)?,
                        high: y_range.fraction_of(entry.high)?,
                    },
                ))
            })
            .collect::<Option<Vec<_>>>()
            .map(|entries| entries.into_iter().collect())
    }
}

impl CartesianLayer for CandlestickLayer {
    type Model = CandlestickLayerModel;

    fn update_chart_ranges(
        &self,
        ranges: &mut MutableChartRanges,
        model: &CandlestickLayerModel,
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
        _model: Option<&CandlestickLayerModel>,
    ) -> ChartResult<()> {
        let x_spacing = context.dp(self.config.body_thickness_dp + self.config.candle_spacing_dp);
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
        model: Option<&CandlestickLayerModel>,
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
        model: Option<&CandlestickLayerModel>,
    ) -> ChartResult<()> {
        self.marker_targets.clear();
        let ranges = context.mapper.ranges;
        let entries = self.transition.entries(context.extra_store, || {
            model.and_then(|model| self.build_drawing_model(model, &ranges))
        });
        if entries.is_empty() {
            return Ok(());
        }

        let body_width = context.dp(self.config.body_thickness_dp) * context.zoom;
        let wick_scale = if self.config.scale_candle_wicks {
            context.zoom
        } else {
            1.0
        };
        let candles = project_candles(
            &entries,
            &context.mapper,
            body_width,
            context.dp(self.config.min_body_height_dp),
        )?;
        let y_range = context.mapper.y_range(self.config.vertical_axis_position);
        let margin = context.mapper.dimensions.x_spacing;

        for candle in &candles {
            if !context.mapper.is_x_visible(candle.center_x, margin) {
                continue;
            }
            let style = self.config.style(candle.kind);
            context.surface.draw_line(LinePrimitive::new(
                candle.center_x,
                candle.wick_top,
                candle.center_x,
                candle.wick_bottom,
                context.dp(style.wick_thickness_dp) * wick_scale,
                style.wick_color,
            ));
            context.surface.draw_rect(RectPrimitive::from_edges(
                candle.body_left,
                candle.body_top,
                candle.body_right,
                candle.body_bottom,
                style.body_color,
            ));

            let value = model
                .and_then(|model| model.entry_at(candle.x))
                .map(|ohlc| MarkerValue::Ohlc {
                    open: ohlc.open,
                    high: ohlc.high,
                    low: ohlc.low,
                    close: ohlc.close,
                })
                .or_else(|| candle.entry.to_values(y_range));
            if let Some(value) = value {
                self.marker_targets
                    .entry(candle.x.into())
                    .or_default()
                    .push(MarkerTarget {
                        x: candle.x,
                        canvas_x: candle.center_x,
                        canvas_y: candle.close_y,
                        series_index: 0,
                        color: style.body_color,
                        value,
                    });
            }
        }
        trace!(candles = candles.len(), "candlestick layer drawn");
        Ok(())
    }

    fn marker_targets(&self) -> &MarkerTargets {
        &self.marker_targets
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::{CandleEntry, project_candles};
    use crate::core::{
        CandleKind, DrawingModelEntry, EntityKey, LayerDimensions, MutableChartRanges,
        RangeContribution, Rect,
    };
    use crate::layers::CoordinateMapper;

    fn mapper() -> CoordinateMapper {
        let mut ranges = MutableChartRanges::new();
        ranges
            .update(RangeContribution {
                min_x: 0.0,
                max_x: 4.0,
                min_y: 0.0,
                max_y: 100.0,
                min_x_delta: Some(1.0),
                vertical_axis_position: None,
            })
            .expect("ranges");
        CoordinateMapper {
            layer_bounds: Rect::new(0.0, 0.0, 200.0, 100.0),
            dimensions: LayerDimensions::new(20.0, 10.0, 10.0, 0.0, 0.0).expect("dimensions"),
            ranges: ranges.finalize(),
            scroll_px: 0.0,
        }
    }

    #[test]
    fn flat_bodies_get_the_minimum_height() {
        let entries = [(
            EntityKey::new(1.0, 0),
            CandleEntry {
                open: 0.5,
                close: 0.5,
                low: 0.2,
                high: 0.8,
            },
        )];
        let candles = project_candles(&entries, &mapper(), 8.0, 2.0).expect("projection");
        let candle = candles[0];
        assert_eq!(candle.kind, CandleKind::Neutral);
        assert_relative_eq!(candle.body_bottom - candle.body_top, 2.0);
        assert_relative_eq!(candle.body_top, 49.0);
        assert_relative_eq!(candle.center_x, 30.0);
        assert_relative_eq!(candle.body_left, 26.0);
        assert_relative_eq!(candle.wick_top, 20.0);
    }

    #[test]
    fn invalid_body_width_is_rejected() {
        assert!(project_candles(&[], &mapper(), 0.0, 1.0).is_err());
    }

    #[test]
    fn candles_collapse_onto_body_center() {
        let entry = CandleEntry {
            open: 0.2,
            close: 0.6,
            low: 0.1,
            high: 0.9,
        };
        let zero = entry.zero();
        assert_eq!(entry.kind(), CandleKind::Bullish);
        assert_relative_eq!(zero.low, 0.4);
        assert_relative_eq!(zero.high, 0.4);
    }
}
