use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::primitives::ensure_non_negative;
use crate::core::ranges::ChartRanges;
use crate::error::{ChartError, ChartResult};

/// Horizontal layout requirements of one layer or axis, in pixels.
///
/// Scalable paddings follow the zoom factor together with `x_spacing`;
/// unscalable paddings stay fixed on screen.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LayerDimensions {
    pub x_spacing: f64,
    pub scalable_start_padding: f64,
    pub scalable_end_padding: f64,
    pub unscalable_start_padding: f64,
    pub unscalable_end_padding: f64,
}

impl LayerDimensions {
    pub fn new(
        x_spacing: f64,
        scalable_start_padding: f64,
        scalable_end_padding: f64,
        unscalable_start_padding: f64,
        unscalable_end_padding: f64,
    ) -> ChartResult<Self> {
        Self {
            x_spacing,
            scalable_start_padding,
            scalable_end_padding,
            unscalable_start_padding,
            unscalable_end_padding,
        }
        .validate()
    }

    pub fn validate(self) -> ChartResult<Self> {
        ensure_non_negative(self.x_spacing, "x_spacing")?;
        ensure_non_negative(self.scalable_start_padding, "scalable_start_padding")?;
        ensure_non_negative(self.scalable_end_padding, "scalable_end_padding")?;
        ensure_non_negative(self.unscalable_start_padding, "unscalable_start_padding")?;
        ensure_non_negative(self.unscalable_end_padding, "unscalable_end_padding")?;
        Ok(self)
    }

    /// Field-wise maximum. Commutative and idempotent.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            x_spacing: self.x_spacing.max(other.x_spacing),
            scalable_start_padding: self
                .scalable_start_padding
                .max(other.scalable_start_padding),
            scalable_end_padding: self.scalable_end_padding.max(other.scalable_end_padding),
            unscalable_start_padding: self
                .unscalable_start_padding
                .max(other.unscalable_start_padding),
            unscalable_end_padding: self
                .unscalable_end_padding
                .max(other.unscalable_end_padding),
        }
    }

    #[must_use]
    pub fn start_padding(self) -> f64 {
        self.scalable_start_padding + self.unscalable_start_padding
    }

    #[must_use]
    pub fn end_padding(self) -> f64 {
        self.scalable_end_padding + self.unscalable_end_padding
    }

    #[must_use]
    pub fn scalable_padding(self) -> f64 {
        self.scalable_start_padding + self.scalable_end_padding
    }

    #[must_use]
    pub fn unscalable_padding(self) -> f64 {
        self.unscalable_start_padding + self.unscalable_end_padding
    }

    #[must_use]
    pub fn padding(self) -> f64 {
        self.start_padding() + self.end_padding()
    }

    /// Copy with `x_spacing` and the scalable paddings multiplied by `zoom`.
    #[must_use]
    pub fn scaled(self, zoom: f64) -> Self {
        Self {
            x_spacing: self.x_spacing * zoom,
            scalable_start_padding: self.scalable_start_padding * zoom,
            scalable_end_padding: self.scalable_end_padding * zoom,
            ..self
        }
    }

    /// Width of everything that scales with zoom: one `x_spacing` per x step
    /// plus the scalable paddings.
    #[must_use]
    pub fn scalable_content_width(self, ranges: &ChartRanges) -> f64 {
        let steps = ranges.x().map_or(0.0, |x| x.step_count());
        self.x_spacing * steps + self.scalable_padding()
    }

    #[must_use]
    pub fn content_width(self, ranges: &ChartRanges) -> f64 {
        self.scalable_content_width(ranges) + self.unscalable_padding()
    }
}

/// Accumulator filled by every layer and horizontal axis during measuring.
#[derive(Debug, Clone, Default)]
pub struct MutableLayerDimensions {
    values: LayerDimensions,
    frozen: bool,
}

impl MutableLayerDimensions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, dimensions: LayerDimensions) -> ChartResult<()> {
        if self.frozen {
            return Err(ChartError::DimensionsFrozen);
        }
        let dimensions = dimensions.validate()?;
        self.values = self.values.merge(dimensions);
        trace!(x_spacing = self.values.x_spacing, "layer dimensions updated");
        Ok(())
    }

    /// Raises only the fields that are `Some`, leaving the rest untouched.
    pub fn ensure_values_at_least(
        &mut self,
        x_spacing: Option<f64>,
        unscalable_start_padding: Option<f64>,
        unscalable_end_padding: Option<f64>,
    ) -> ChartResult<()> {
        self.update(LayerDimensions {
            x_spacing: x_spacing.unwrap_or(0.0),
            unscalable_start_padding: unscalable_start_padding.unwrap_or(0.0),
            unscalable_end_padding: unscalable_end_padding.unwrap_or(0.0),
            ..LayerDimensions::default()
        })
    }

    #[must_use]
    pub fn values(&self) -> LayerDimensions {
        self.values
    }

    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn finalize(&mut self) -> LayerDimensions {
        self.frozen = true;
        self.values
    }

    pub fn reset(&mut self) {
        self.values = LayerDimensions::default();
        self.frozen = false;
    }
}

#[cfg(test)]
mod tests {
    use super::{LayerDimensions, MutableLayerDimensions};
    use crate::core::ranges::{MutableChartRanges, RangeContribution};
    use crate::error::ChartError;

    #[test]
    fn merge_takes_field_wise_maximum() {
        let a = LayerDimensions::new(10.0, 1.0, 0.0, 4.0, 0.0).expect("a");
        let b = LayerDimensions::new(8.0, 2.0, 3.0, 0.0, 5.0).expect("b");
        assert_eq!(
            a.merge(b),
            LayerDimensions::new(10.0, 2.0, 3.0, 4.0, 5.0).expect("merged")
        );
    }

    #[test]
    fn update_after_finalize_is_rejected() {
        let mut dims = MutableLayerDimensions::new();
        dims.update(LayerDimensions::new(4.0, 0.0, 0.0, 0.0, 0.0).expect("dims"))
            .expect("update");
        assert_eq!(dims.finalize().x_spacing, 4.0);
        assert!(matches!(
            dims.ensure_values_at_least(Some(1.0), None, None),
            Err(ChartError::DimensionsFrozen)
        ));
        dims.reset();
        assert!(dims.ensure_values_at_least(Some(1.0), None, None).is_ok());
    }

    #[test]
    fn negative_padding_is_a_configuration_error() {
        assert!(LayerDimensions::new(1.0, -1.0, 0.0, 0.0, 0.0).is_err());
    }

    #[test]
    fn content_width_counts_steps_and_paddings() {
        let mut ranges = MutableChartRanges::new();
        ranges
            .update(RangeContribution {
                min_x: 0.0,
                max_x: 10.0,
                min_y: 0.0,
                max_y: 1.0,
                min_x_delta: Some(2.0),
                vertical_axis_position: None,
            })
            .expect("update");
        let ranges = ranges.finalize();
        let dims = LayerDimensions::new(20.0, 5.0, 5.0, 3.0, 3.0).expect("dims");

        assert_eq!(dims.scalable_content_width(&ranges), 110.0);
        assert_eq!(dims.content_width(&ranges), 116.0);
        assert_eq!(dims.scaled(0.5).scalable_content_width(&ranges), 55.0);
    }
}
