//! Shared x/y domains across every layer of a chart.
//!
//! The x range is global. y ranges are grouped by the vertical axis a layer
//! is attached to, so a dual-axis chart keeps two independent scales while
//! untagged layers (and the union lookup) see everything.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ChartError, ChartResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerticalAxisPosition {
    Start,
    End,
}

impl VerticalAxisPosition {
    fn slot(self) -> usize {
        match self {
            Self::Start => 0,
            Self::End => 1,
        }
    }
}

impl FromStr for VerticalAxisPosition {
    type Err = ChartError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "start" => Ok(Self::Start),
            "end" => Ok(Self::End),
            other => Err(ChartError::InvalidConfig(format!(
                "unknown vertical axis position `{other}` (expected `start` or `end`)"
            ))),
        }
    }
}

/// Finalized x domain. `x_step` is always > 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct XRange {
    pub min_x: f64,
    pub max_x: f64,
    pub x_step: f64,
}

impl XRange {
    #[must_use]
    pub fn length(self) -> f64 {
        self.max_x - self.min_x
    }

    /// Number of x steps between `min_x` and `max_x`.
    #[must_use]
    pub fn step_count(self) -> f64 {
        self.length() / self.x_step
    }
}

/// Finalized y domain of one axis group.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum YRange {
    /// No layer contributed; must not be used for division.
    #[default]
    Empty,
    Populated { min_y: f64, max_y: f64 },
}

impl YRange {
    #[must_use]
    pub fn is_empty(self) -> bool {
        matches!(self, Self::Empty)
    }

    #[must_use]
    pub fn min_y(self) -> Option<f64> {
        match self {
            Self::Empty => None,
            Self::Populated { min_y, .. } => Some(min_y),
        }
    }

    #[must_use]
    pub fn max_y(self) -> Option<f64> {
        match self {
            Self::Empty => None,
            Self::Populated { max_y, .. } => Some(max_y),
        }
    }

    /// Strictly positive for populated ranges.
    #[must_use]
    pub fn length(self) -> Option<f64> {
        match self {
            Self::Empty => None,
            Self::Populated { min_y, max_y } => Some(max_y - min_y),
        }
    }

    /// Position of `value` inside the range, 0 at `min_y` and 1 at `max_y`.
    #[must_use]
    pub fn fraction_of(self, value: f64) -> Option<f64> {
        match self {
            Self::Empty => None,
            Self::Populated { min_y, max_y } => Some((value - min_y) / (max_y - min_y)),
        }
    }
}

/// Per-layer override of the automatically computed extrema.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum RangeProvider {
    /// Uses data extrema and keeps the zero baseline visible.
    #[default]
    Auto,
    Fixed {
        min_x: Option<f64>,
        max_x: Option<f64>,
        min_y: Option<f64>,
        max_y: Option<f64>,
    },
}

impl RangeProvider {
    #[must_use]
    pub fn fixed_y(min_y: f64, max_y: f64) -> Self {
        Self::Fixed {
            min_x: None,
            max_x: None,
            min_y: Some(min_y),
            max_y: Some(max_y),
        }
    }

    /// Applies the provider to raw data extrema.
    #[must_use]
    pub fn resolve(self, min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> (f64, f64, f64, f64) {
        match self {
            Self::Auto => {
                let (min_y, max_y) = if min_y == 0.0 && max_y == 0.0 {
                    (0.0, 1.0)
                } else {
                    (min_y.min(0.0), max_y.max(0.0))
                };
                (min_x, max_x, min_y, max_y)
            }
            Self::Fixed {
                min_x: fixed_min_x,
                max_x: fixed_max_x,
                min_y: fixed_min_y,
                max_y: fixed_max_y,
            } => (
                fixed_min_x.unwrap_or(min_x),
                fixed_max_x.unwrap_or(max_x),
                fixed_min_y.unwrap_or(min_y),
                fixed_max_y.unwrap_or(max_y),
            ),
        }
    }
}

/// One layer's contribution to the shared ranges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeContribution {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    /// Smallest positive distance between consecutive x values, if any.
    pub min_x_delta: Option<f64>,
    pub vertical_axis_position: Option<VerticalAxisPosition>,
}

impl RangeContribution {
    fn validate(self) -> ChartResult<Self> {
        for (value, name) in [
            (self.min_x, "min_x"),
            (self.max_x, "max_x"),
            (self.min_y, "min_y"),
            (self.max_y, "max_y"),
        ] {
            if !value.is_finite() {
                return Err(ChartError::InvalidData(format!(
                    "range contribution `{name}` must be finite"
                )));
            }
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Extent {
    min: f64,
    max: f64,
}

impl Extent {
    fn fold(slot: &mut Option<Self>, min: f64, max: f64) {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        *slot = Some(match *slot {
            None => Self { min, max },
            Some(current) => Self {
                min: current.min.min(min),
                max: current.max.max(max),
            },
        });
    }

    fn into_y_range(slot: Option<Self>) -> YRange {
        match slot {
            None => YRange::Empty,
            Some(Self { min, max }) if min == max => YRange::Populated {
                min_y: min,
                max_y: max + 1.0,
            },
            Some(Self { min, max }) => YRange::Populated {
                min_y: min,
                max_y: max,
            },
        }
    }
}

/// Mutable accumulator filled during the measuring pass.
#[derive(Debug, Clone, Default)]
pub struct MutableChartRanges {
    x: Option<Extent>,
    min_x_delta: Option<f64>,
    y_all: Option<Extent>,
    y_groups: [Option<Extent>; 2],
}

impl MutableChartRanges {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, contribution: RangeContribution) -> ChartResult<()> {
        let contribution = contribution.validate()?;
        Extent::fold(&mut self.x, contribution.min_x, contribution.max_x);
        Extent::fold(&mut self.y_all, contribution.min_y, contribution.max_y);
        if let Some(position) = contribution.vertical_axis_position {
            Extent::fold(
                &mut self.y_groups[position.slot()],
                contribution.min_y,
                contribution.max_y,
            );
        }
        if let Some(delta) = contribution.min_x_delta.filter(|d| d.is_finite() && *d > 0.0) {
            self.min_x_delta = Some(self.min_x_delta.map_or(delta, |current| current.min(delta)));
        }
        Ok(())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.x.is_none()
    }

    #[must_use]
    pub fn finalize(&self) -> ChartRanges {
        let Some(x) = self.x else {
            return ChartRanges::empty();
        };
        ChartRanges {
            x: Some(XRange {
                min_x: x.min,
                max_x: x.max,
                x_step: self.min_x_delta.unwrap_or(1.0),
            }),
            y_all: Extent::into_y_range(self.y_all),
            y_groups: [
                Extent::into_y_range(self.y_groups[0]),
                Extent::into_y_range(self.y_groups[1]),
            ],
        }
    }
}

/// Immutable ranges shared by every layer and axis during one drawing pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartRanges {
    x: Option<XRange>,
    y_all: YRange,
    y_groups: [YRange; 2],
}

impl Default for ChartRanges {
    fn default() -> Self {
        Self::empty()
    }
}

impl ChartRanges {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            x: None,
            y_all: YRange::Empty,
            y_groups: [YRange::Empty, YRange::Empty],
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.x.is_none()
    }

    #[must_use]
    pub fn x(&self) -> Option<XRange> {
        self.x
    }

    /// `Some(position)` yields that axis group (possibly empty); `None` yields
    /// the union of every contribution.
    #[must_use]
    pub fn y_range(&self, position: Option<VerticalAxisPosition>) -> YRange {
        match position {
            Some(position) => self.y_groups[position.slot()],
            None => self.y_all,
        }
    }

    /// Range an axis at `position` should label: its own group, or the union
    /// when no layer was attached to it.
    #[must_use]
    pub fn y_range_for_axis(&self, position: VerticalAxisPosition) -> YRange {
        let own = self.y_range(Some(position));
        if own.is_empty() { self.y_all } else { own }
    }
}
