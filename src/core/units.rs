use serde::{Deserialize, Serialize};

use crate::core::primitives::ensure_positive;
use crate::error::ChartResult;

/// Host-supplied conversion from device-independent units to pixels.
pub trait UnitConverter {
    /// Converts density-independent pixels to pixels.
    fn dp_to_px(&self, dp: f64) -> f64;

    /// Converts scale-independent (font) pixels to pixels.
    fn sp_to_px(&self, sp: f64) -> f64;
}

/// Fixed display metrics: `px = dp * density`, `px = sp * density * font_scale`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayMetrics {
    pub density: f64,
    pub font_scale: f64,
}

impl Default for DisplayMetrics {
    fn default() -> Self {
        Self {
            density: 1.0,
            font_scale: 1.0,
        }
    }
}

impl DisplayMetrics {
    pub fn new(density: f64, font_scale: f64) -> ChartResult<Self> {
        Ok(Self {
            density: ensure_positive(density, "density")?,
            font_scale: ensure_positive(font_scale, "font_scale")?,
        })
    }
}

impl UnitConverter for DisplayMetrics {
    fn dp_to_px(&self, dp: f64) -> f64 {
        dp * self.density
    }

    fn sp_to_px(&self, sp: f64) -> f64 {
        sp * self.density * self.font_scale
    }
}

#[cfg(test)]
mod tests {
    use super::{DisplayMetrics, UnitConverter};

    #[test]
    fn font_scale_only_affects_sp() {
        let metrics = DisplayMetrics::new(2.0, 1.5).expect("metrics");
        assert_eq!(metrics.dp_to_px(4.0), 8.0);
        assert_eq!(metrics.sp_to_px(4.0), 12.0);
    }

    #[test]
    fn zero_density_is_rejected() {
        assert!(DisplayMetrics::new(0.0, 1.0).is_err());
    }
}
