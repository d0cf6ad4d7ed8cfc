use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::primitives::{datetime_to_unix_seconds, decimal_to_f64};
use crate::core::types::DataPoint;
use crate::error::{ChartError, ChartResult};

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Immutable data snapshot consumed by one Cartesian layer.
pub trait CartesianLayerModel: Any + fmt::Debug + Send + Sync {
    /// `(min_x, max_x, min_y, max_y)` over every entry, `None` when empty.
    fn extrema(&self) -> Option<(f64, f64, f64, f64)>;

    /// Smallest positive distance between consecutive x values.
    fn min_x_delta(&self) -> Option<f64>;

    fn is_empty(&self) -> bool;

    fn as_any(&self) -> &dyn Any;
}

fn validate_series(mut series: Vec<DataPoint>, index: usize) -> ChartResult<Vec<DataPoint>> {
    if let Some(point) = series.iter().find(|point| !point.is_finite()) {
        return Err(ChartError::InvalidData(format!(
            "series {index} contains a non-finite point ({}, {})",
            point.x, point.y
        )));
    }
    series.sort_by(|a, b| a.x.total_cmp(&b.x));
    if let Some(pair) = series.windows(2).find(|pair| pair[0].x == pair[1].x) {
        return Err(ChartError::InvalidData(format!(
            "series {index} has duplicate x value {}",
            pair[0].x
        )));
    }
    Ok(series)
}

fn min_positive_delta(xs: impl Iterator<Item = f64>) -> Option<f64> {
    let mut previous: Option<f64> = None;
    let mut smallest: Option<f64> = None;
    for x in xs {
        if let Some(prev) = previous {
            let delta = x - prev;
            if delta > 0.0 {
                smallest = Some(smallest.map_or(delta, |current| current.min(delta)));
            }
        }
        previous = Some(x);
    }
    smallest
}

/// One or more `(x, y)` series, each sorted by `x`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SeriesSet {
    series: Vec<Vec<DataPoint>>,
}

impl SeriesSet {
    fn new(series: Vec<Vec<DataPoint>>) -> ChartResult<Self> {
        let series = series
            .into_iter()
            .enumerate()
            .map(|(index, points)| validate_series(points, index))
            .collect::<ChartResult<Vec<_>>>()?;
        Ok(Self { series })
    }

    #[must_use]
    pub fn series(&self) -> &[Vec<DataPoint>] {
        &self.series
    }

    #[must_use]
    pub fn series_count(&self) -> usize {
        self.series.len()
    }

    /// y value of `series` at exactly `x`.
    #[must_use]
    pub fn value_at(&self, series: usize, x: f64) -> Option<f64> {
        let points = self.series.get(series)?;
        let index = points
            .binary_search_by(|point| point.x.total_cmp(&x))
            .ok()?;
        Some(points[index].y)
    }

    /// Distinct x values across every series, ascending.
    #[must_use]
    pub fn distinct_xs(&self) -> Vec<f64> {
        let mut xs: Vec<f64> = self.series.iter().flatten().map(|p| p.x).collect();
        xs.sort_by(f64::total_cmp);
        xs.dedup();
        xs
    }

    fn extrema(&self) -> Option<(f64, f64, f64, f64)> {
        self.series.iter().flatten().fold(None, |acc, point| {
            Some(match acc {
                None => (point.x, point.x, point.y, point.y),
                Some((min_x, max_x, min_y, max_y)) => (
                    min_x.min(point.x),
                    max_x.max(point.x),
                    min_y.min(point.y),
                    max_y.max(point.y),
                ),
            })
        })
    }

    fn min_x_delta(&self) -> Option<f64> {
        self.series
            .iter()
            .filter_map(|points| min_positive_delta(points.iter().map(|p| p.x)))
            .reduce(f64::min)
    }

    fn is_empty(&self) -> bool {
        self.series.iter().all(Vec::is_empty)
    }
}

macro_rules! series_layer_model {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
        pub struct $name {
            data: SeriesSet,
        }

        impl $name {
            /// Validates every point, sorts each series by `x` and rejects
            /// duplicate `x` values inside a series.
            pub fn new(series: Vec<Vec<DataPoint>>) -> ChartResult<Self> {
                Ok(Self {
                    data: SeriesSet::new(series)?,
                })
            }

            pub fn single(points: Vec<DataPoint>) -> ChartResult<Self> {
                Self::new(vec![points])
            }

            /// Builds one series from y values placed at x = 0, 1, 2, ...
            pub fn from_ys(ys: &[f64]) -> ChartResult<Self> {
                Self::single(
                    ys.iter()
                        .enumerate()
                        .map(|(index, y)| DataPoint::new(index as f64, *y))
                        .collect(),
                )
            }

            /// Builds one series from timestamped decimal values.
            pub fn from_decimal_time(
                values: &[(DateTime<Utc>, Decimal)],
            ) -> ChartResult<Self> {
                let points = values
                    .iter()
                    .map(|(time, value)| DataPoint::from_decimal_time(*time, *value))
                    .collect::<ChartResult<Vec<_>>>()?;
                Self::single(points)
            }

            #[must_use]
            pub fn data(&self) -> &SeriesSet {
                &self.data
            }
        }

        impl CartesianLayerModel for $name {
            fn extrema(&self) -> Option<(f64, f64, f64, f64)> {
                self.data.extrema()
            }

            fn min_x_delta(&self) -> Option<f64> {
                self.data.min_x_delta()
            }

            fn is_empty(&self) -> bool {
                self.data.is_empty()
            }

            fn as_any(&self) -> &dyn Any {
                self
            }
        }
    };
}

series_layer_model!(
    /// Model of a line layer: one polyline per series.
    LineLayerModel
);

series_layer_model!(
    /// Model of a column layer: one column per series and x value.
    ColumnLayerModel
);

/// One OHLC candle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OhlcEntry {
    pub x: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl OhlcEntry {
    /// Builds a validated entry.
    ///
    /// Invariants:
    /// - all values are finite
    /// - `low <= high`
    /// - `open` and `close` are within `[low, high]`
    pub fn new(x: f64, open: f64, high: f64, low: f64, close: f64) -> ChartResult<Self> {
        if [x, open, high, low, close].iter().any(|v| !v.is_finite()) {
            return Err(ChartError::InvalidData(
                "ohlc values must be finite".to_owned(),
            ));
        }
        if low > high {
            return Err(ChartError::InvalidData(
                "ohlc low must be <= high".to_owned(),
            ));
        }
        if open < low || open > high || close < low || close > high {
            return Err(ChartError::InvalidData(
                "ohlc open/close must be within low/high range".to_owned(),
            ));
        }
        Ok(Self {
            x,
            open,
            high,
            low,
            close,
        })
    }

    pub fn from_decimal_time(
        time: DateTime<Utc>,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
    ) -> ChartResult<Self> {
        Self::new(
            datetime_to_unix_seconds(time),
            decimal_to_f64(open, "open")?,
            decimal_to_f64(high, "high")?,
            decimal_to_f64(low, "low")?,
            decimal_to_f64(close, "close")?,
        )
    }

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
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandleKind {
    Bullish,
    Neutral,
    Bearish,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CandlestickLayerModel {
    entries: Vec<OhlcEntry>,
}

impl CandlestickLayerModel {
    /// Sorts entries by `x` and rejects duplicates.
    pub fn new(mut entries: Vec<OhlcEntry>) -> ChartResult<Self> {
        if let Some(entry) = entries.iter().find(|e| !e.x.is_finite()) {
            return Err(ChartError::InvalidData(format!(
                "candle x {} must be finite",
                entry.x
            )));
        }
        entries.sort_by(|a, b| a.x.total_cmp(&b.x));
        if let Some(pair) = entries.windows(2).find(|pair| pair[0].x == pair[1].x) {
            return Err(ChartError::InvalidData(format!(
                "duplicate candle x value {}",
                pair[0].x
            )));
        }
        Ok(Self { entries })
    }

    #[must_use]
    pub fn entries(&self) -> &[OhlcEntry] {
        &self.entries
    }

    #[must_use]
    pub fn entry_at(&self, x: f64) -> Option<&OhlcEntry> {
        let index = self
            .entries
            .binary_search_by(|entry| entry.x.total_cmp(&x))
            .ok()?;
        self.entries.get(index)
    }
}

impl CartesianLayerModel for CandlestickLayerModel {
    fn extrema(&self) -> Option<(f64, f64, f64, f64)> {
        let first = self.entries.first()?;
        let last = self.entries.last()?;
        let (min_y, max_y) = self
            .entries
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), entry| {
                (lo.min(entry.low), hi.max(entry.high))
            });
        Some((first.x, last.x, min_y, max_y))
    }

    fn min_x_delta(&self) -> Option<f64> {
        min_positive_delta(self.entries.iter().map(|entry| entry.x))
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Every layer model of one chart state. Model `i` feeds layer `i`.
#[derive(Debug, Clone)]
pub struct ChartModel {
    models: Vec<Option<Arc<dyn CartesianLayerModel>>>,
    generation: u64,
}

impl ChartModel {
    /// Assigns the next process-wide generation number.
    #[must_use]
    pub fn new(models: Vec<Option<Arc<dyn CartesianLayerModel>>>) -> Self {
        Self {
            models,
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
        }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    #[must_use]
    pub fn builder() -> ChartModelBuilder {
        ChartModelBuilder::default()
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Model for layer `index`; `None` means the layer has no data.
    #[must_use]
    pub fn layer(&self, index: usize) -> Option<&dyn CartesianLayerModel> {
        self.models.get(index)?.as_deref()
    }

    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.models.len()
    }

    /// `true` when no layer has any entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.iter().flatten().all(|model| model.is_empty())
    }
}

#[derive(Debug, Default)]
pub struct ChartModelBuilder {
    models: Vec<Option<Arc<dyn CartesianLayerModel>>>,
}

impl ChartModelBuilder {
    #[must_use]
    pub fn layer(mut self, model: impl CartesianLayerModel) -> Self {
        self.models.push(Some(Arc::new(model)));
        self
    }

    /// Leaves the next layer without data.
    #[must_use]
    pub fn no_data(mut self) -> Self {
        self.models.push(None);
        self
    }

    #[must_use]
    pub fn build(self) -> ChartModel {
        ChartModel::new(self.models)
    }
}
