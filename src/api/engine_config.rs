use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{DisplayMetrics, Viewport};
use crate::error::{ChartError, ChartResult};
use crate::interaction::MarkerMode;

use super::scroll_zoom::ScrollZoomConfig;
use super::transition::Easing;

/// Public engine bootstrap configuration.
///
/// This type is serializable so host applications can persist/load chart setup
/// without inventing their own ad-hoc format. Everything but the viewport has
/// a default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartEngineConfig {
    pub viewport: Viewport,
    #[serde(default)]
    pub display_metrics: DisplayMetrics,
    #[serde(default = "default_animation_duration_ms")]
    pub animation_duration_ms: u64,
    #[serde(default)]
    pub easing: Easing,
    /// When `false`, new models replace the displayed one without animation.
    #[serde(default = "default_animate_changes")]
    pub animate_changes: bool,
    #[serde(default)]
    pub scroll_zoom: ScrollZoomConfig,
    #[serde(default)]
    pub marker_mode: MarkerMode,
}

impl ChartEngineConfig {
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            display_metrics: DisplayMetrics::default(),
            animation_duration_ms: default_animation_duration_ms(),
            easing: Easing::default(),
            animate_changes: default_animate_changes(),
            scroll_zoom: ScrollZoomConfig::default(),
            marker_mode: MarkerMode::default(),
        }
    }

    #[must_use]
    pub fn with_display_metrics(mut self, display_metrics: DisplayMetrics) -> Self {
        self.display_metrics = display_metrics;
        self
    }

    #[must_use]
    pub fn with_animation(mut self, duration_ms: u64, easing: Easing) -> Self {
        self.animation_duration_ms = duration_ms;
        self.easing = easing;
        self
    }

    #[must_use]
    pub fn with_animate_changes(mut self, animate_changes: bool) -> Self {
        self.animate_changes = animate_changes;
        self
    }

    #[must_use]
    pub fn with_scroll_zoom(mut self, scroll_zoom: ScrollZoomConfig) -> Self {
        self.scroll_zoom = scroll_zoom;
        self
    }

    #[must_use]
    pub fn with_marker_mode(mut self, marker_mode: MarkerMode) -> Self {
        self.marker_mode = marker_mode;
        self
    }

    #[must_use]
    pub fn animation_duration(self) -> Duration {
        Duration::from_millis(self.animation_duration_ms)
    }

    pub fn validate(self) -> ChartResult<Self> {
        self.viewport.validate()?;
        DisplayMetrics::new(self.display_metrics.density, self.display_metrics.font_scale)?;
        self.scroll_zoom.validate()?;
        Ok(self)
    }

    /// Serializes config to pretty JSON.
    pub fn to_json_pretty(self) -> ChartResult<String> {
        serde_json::to_string_pretty(&self)
            .map_err(|e| ChartError::InvalidData(format!("failed to serialize config: {e}")))
    }

    /// Parses and validates config from JSON.
    pub fn from_json_str(input: &str) -> ChartResult<Self> {
        let config: Self = serde_json::from_str(input)
            .map_err(|e| ChartError::InvalidConfig(format!("failed to parse config: {e}")))?;
        config.validate()
    }
}

fn default_animation_duration_ms() -> u64 {
    500
}

fn default_animate_changes() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::ChartEngineConfig;
    use crate::api::Easing;
    use crate::core::Viewport;

    #[test]
    fn missing_fields_take_defaults() {
        let config = ChartEngineConfig::from_json_str(r#"{"viewport":{"width":640,"height":480}}"#)
            .expect("config");
        assert_eq!(config, ChartEngineConfig::new(Viewport::new(640, 480)));
        assert_eq!(config.animation_duration_ms, 500);
        assert_eq!(config.easing, Easing::EaseInOutCubic);
    }

    #[test]
    fn invalid_values_are_rejected_after_parsing() {
        let zero_viewport = r#"{"viewport":{"width":0,"height":480}}"#;
        assert!(ChartEngineConfig::from_json_str(zero_viewport).is_err());

        let bad_density =
            r#"{"viewport":{"width":10,"height":10},"display_metrics":{"density":0,"font_scale":1}}"#;
        assert!(ChartEngineConfig::from_json_str(bad_density).is_err());
    }
}
