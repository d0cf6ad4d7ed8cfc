use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::primitives::ensure_positive;
use crate::core::{ChartRanges, LayerDimensions};
use crate::error::{ChartError, ChartResult};

/// Zoom applied the first time the chart is measured.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zoom {
    /// Fits the whole content into the layer width.
    Content,
    Fixed(f64),
}

impl Default for Zoom {
    fn default() -> Self {
        Self::Fixed(1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollZoomConfig {
    #[serde(default = "default_scroll_enabled")]
    pub scroll_enabled: bool,
    #[serde(default)]
    pub initial_zoom: Zoom,
    #[serde(default = "default_min_zoom")]
    pub min_zoom: f64,
    #[serde(default = "default_max_zoom")]
    pub max_zoom: f64,
}

impl Default for ScrollZoomConfig {
    fn default() -> Self {
        Self {
            scroll_enabled: default_scroll_enabled(),
            initial_zoom: Zoom::default(),
            min_zoom: default_min_zoom(),
            max_zoom: default_max_zoom(),
        }
    }
}

impl ScrollZoomConfig {
    pub fn validate(self) -> ChartResult<Self> {
        ensure_positive(self.min_zoom, "min_zoom")?;
        ensure_positive(self.max_zoom, "max_zoom")?;
        if self.min_zoom > self.max_zoom {
            return Err(ChartError::InvalidConfig(format!(
                "min_zoom ({}) must not exceed max_zoom ({})",
                self.min_zoom, self.max_zoom
            )));
        }
        if let Zoom::Fixed(zoom) = self.initial_zoom {
            ensure_positive(zoom, "initial zoom")?;
        }
        Ok(self)
    }
}

fn default_scroll_enabled() -> bool {
    true
}

fn default_min_zoom() -> f64 {
    0.1
}

fn default_max_zoom() -> f64 {
    10.0
}

/// Horizontal scroll offset and zoom factor of one chart.
///
/// `scroll_px` counts pixels from the start of the content; it is kept within
/// `[0, max_scroll_px]` where `max_scroll_px` is the zoomed content width minus
/// the layer width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollZoomState {
    config: ScrollZoomConfig,
    scroll_px: f64,
    zoom: f64,
    max_scroll_px: f64,
    layer_width: f64,
    dimensions: LayerDimensions,
    ranges: ChartRanges,
    initialized: bool,
}

impl ScrollZoomState {
    pub fn new(config: ScrollZoomConfig) -> ChartResult<Self> {
        Ok(Self {
            config: config.validate()?,
            scroll_px: 0.0,
            zoom: 1.0,
            max_scroll_px: 0.0,
            layer_width: 0.0,
            dimensions: LayerDimensions::default(),
            ranges: ChartRanges::empty(),
            initialized: false,
        })
    }

    #[must_use]
    pub fn config(&self) -> ScrollZoomConfig {
        self.config
    }

    #[must_use]
    pub fn scroll_px(&self) -> f64 {
        self.scroll_px
    }

    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    #[must_use]
    pub fn max_scroll_px(&self) -> f64 {
        self.max_scroll_px
    }

    /// Zoom at which the whole content fits into the layer width.
    #[must_use]
    pub fn content_zoom(&self) -> f64 {
        content_zoom(self.layer_width, self.dimensions, &self.ranges)
    }

    /// Re-applies limits after a measuring pass.
    pub fn update(&mut self, layer_width: f64, dimensions: LayerDimensions, ranges: &ChartRanges) {
        self.layer_width = layer_width.max(0.0);
        self.dimensions = dimensions;
        self.ranges = *ranges;
        if !self.config.scroll_enabled {
            self.zoom = self.content_zoom();
        } else if !self.initialized {
            self.zoom = match self.config.initial_zoom {
                Zoom::Content => self.content_zoom(),
                Zoom::Fixed(zoom) => zoom,
            };
            self.zoom = self.clamp_zoom(self.zoom);
        } else {
            self.zoom = self.clamp_zoom(self.zoom);
        }
        self.initialized = !ranges.is_empty();
        self.refresh_scroll_limit();
        trace!(
            zoom = self.zoom,
            scroll_px = self.scroll_px,
            max_scroll_px = self.max_scroll_px,
            "scroll/zoom limits updated"
        );
    }

    /// Scrolls by `delta_px` and returns the distance actually scrolled.
    pub fn scroll_by(&mut self, delta_px: f64) -> f64 {
        let before = self.scroll_px;
        self.scroll_to(before + delta_px);
        self.scroll_px - before
    }

    pub fn scroll_to(&mut self, scroll_px: f64) {
        if !self.config.scroll_enabled || !scroll_px.is_finite() {
            return;
        }
        self.scroll_px = scroll_px.clamp(0.0, self.max_scroll_px);
    }

    /// Multiplies the zoom by `factor` while keeping the content under
    /// `anchor_px` (relative to the layer's left edge) in place.
    pub fn zoom_by(&mut self, factor: f64, anchor_px: f64) {
        if !self.config.scroll_enabled || !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let old_zoom = self.zoom;
        let new_zoom = self.clamp_zoom(old_zoom * factor);
        if new_zoom == old_zoom {
            return;
        }
        let anchor = if anchor_px.is_finite() { anchor_px } else { 0.0 };
        self.zoom = new_zoom;
        self.scroll_px = (self.scroll_px + anchor) * new_zoom / old_zoom - anchor;
        self.refresh_scroll_limit();
    }

    fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.clamp(self.config.min_zoom, self.config.max_zoom)
    }

    fn refresh_scroll_limit(&mut self) {
        let content_width = self.dimensions.scaled(self.zoom).content_width(&self.ranges);
        self.max_scroll_px = (content_width - self.layer_width).max(0.0);
        self.scroll_px = self.scroll_px.clamp(0.0, self.max_scroll_px);
    }
}

fn content_zoom(layer_width: f64, dimensions: LayerDimensions, ranges: &ChartRanges) -> f64 {
    let scalable = dimensions.scalable_content_width(ranges);
    if scalable <= 0.0 {
        return 1.0;
    }
    let available = layer_width - dimensions.unscalable_padding();
    if available <= 0.0 {
        return 1.0;
    }
    available / scalable
}
