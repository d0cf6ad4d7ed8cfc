use crate::core::{
    CacheStore, ChartRanges, ExtraStore, LayerDimensions, Point, Rect, UnitConverter,
    VerticalAxisPosition, YRange,
};
use crate::render::DrawingSurface;

/// Read-only inputs shared by every participant of a measuring pass.
#[derive(Clone, Copy)]
pub struct MeasuringContext<'a> {
    pub canvas_bounds: Rect,
    pub units: &'a dyn UnitConverter,
    pub ranges: &'a ChartRanges,
    pub cache_store: &'a CacheStore,
    pub pointer_position: Option<Point>,
    pub scroll_enabled: bool,
}

impl MeasuringContext<'_> {
    #[must_use]
    pub fn dp(&self, dp: f64) -> f64 {
        self.units.dp_to_px(dp)
    }

    #[must_use]
    pub fn sp(&self, sp: f64) -> f64 {
        self.units.sp_to_px(sp)
    }
}

/// Maps chart values onto the layer area of the canvas.
///
/// `dimensions` are already multiplied by the zoom factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    pub layer_bounds: Rect,
    pub dimensions: LayerDimensions,
    pub ranges: ChartRanges,
    pub scroll_px: f64,
}

impl CoordinateMapper {
    /// Canvas x of data value `x`; `None` when the chart has no x range.
    #[must_use]
    pub fn x_to_canvas(&self, x: f64) -> Option<f64> {
        let range = self.ranges.x()?;
        Some(
            self.layer_bounds.left + self.dimensions.start_padding()
                + (x - range.min_x) / range.x_step * self.dimensions.x_spacing
                - self.scroll_px,
        )
    }

    /// Canvas y of `value` on the y range of `position`.
    #[must_use]
    pub fn y_to_canvas(&self, value: f64, position: Option<VerticalAxisPosition>) -> Option<f64> {
        let fraction = self.y_range(position).fraction_of(value)?;
        Some(self.fraction_to_canvas(fraction))
    }

    /// Canvas y of a position inside the y range (0 = bottom, 1 = top).
    #[must_use]
    pub fn fraction_to_canvas(&self, fraction: f64) -> f64 {
        self.layer_bounds.bottom - fraction * self.layer_bounds.height()
    }

    #[must_use]
    pub fn y_range(&self, position: Option<VerticalAxisPosition>) -> YRange {
        self.ranges.y_range(position)
    }

    /// Whether `canvas_x` lies inside the layer bounds widened by `margin_px`.
    #[must_use]
    pub fn is_x_visible(&self, canvas_x: f64, margin_px: f64) -> bool {
        canvas_x >= self.layer_bounds.left - margin_px
            && canvas_x <= self.layer_bounds.right + margin_px
    }
}

/// Inputs of one layer draw call.
pub struct DrawingContext<'a> {
    pub measuring: MeasuringContext<'a>,
    pub mapper: CoordinateMapper,
    pub zoom: f64,
    pub extra_store: &'a ExtraStore,
    pub surface: &'a mut dyn DrawingSurface,
}

impl DrawingContext<'_> {
    #[must_use]
    pub fn dp(&self, dp: f64) -> f64 {
        self.measuring.dp(dp)
    }

    #[must_use]
    pub fn sp(&self, sp: f64) -> f64 {
        self.measuring.sp(sp)
    }

    #[must_use]
    pub fn layer_bounds(&self) -> Rect {
        self.mapper.layer_bounds
    }
}

#[cfg(test)]
mod tests {
    use super::CoordinateMapper;
    use crate::core::{LayerDimensions, MutableChartRanges, RangeContribution, Rect};

    #[test]
    fn maps_values_into_layer_bounds() {
        let mut ranges = MutableChartRanges::new();
        ranges
            .update(RangeContribution {
                min_x: 10.0,
                max_x: 20.0,
                min_y: 0.0,
                max_y: 100.0,
                min_x_delta: Some(5.0),
                vertical_axis_position: None,
            })
            .expect("update");
        let mapper = CoordinateMapper {
            layer_bounds: Rect::new(50.0, 0.0, 250.0, 200.0),
            dimensions: LayerDimensions::new(40.0, 10.0, 10.0, 0.0, 0.0).expect("dims"),
            ranges: ranges.finalize(),
            scroll_px: 15.0,
        };

        assert_eq!(mapper.x_to_canvas(15.0), Some(50.0 + 10.0 + 40.0 - 15.0));
        assert_eq!(mapper.y_to_canvas(25.0, None), Some(150.0));
    }
}
