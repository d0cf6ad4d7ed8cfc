use serde::{Deserialize, Serialize};

use crate::error::{ChartError, ChartResult};
use crate::render::PathPrimitive;

/// How consecutive line points are joined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum PointConnector {
    #[default]
    Straight,
    /// Horizontal-tangent cubic segments; `curvature` in `(0, 1]`.
    Cubic { curvature: f64 },
}

impl PointConnector {
    pub fn cubic(curvature: f64) -> ChartResult<Self> {
        Self::Cubic { curvature }.validate()
    }

    pub fn validate(self) -> ChartResult<Self> {
        if let Self::Cubic { curvature } = self {
            if !curvature.is_finite() || curvature <= 0.0 || curvature > 1.0 {
                return Err(ChartError::InvalidConfig(format!(
                    "cubic curvature must be in (0, 1], got {curvature}"
                )));
            }
        }
        Ok(self)
    }

    /// Appends the segment from the path's current point to `(x2, y2)`.
    ///
    /// The cubic control points sit at `x1 + offset` and `x2 - offset`, where
    /// `offset = min(4 * |dy| / layer_height, 1) * curvature * dx / 2`, so the
    /// curve never overshoots horizontally.
    pub fn connect(
        self,
        path: &mut PathPrimitive,
        (x1, y1): (f64, f64),
        (x2, y2): (f64, f64),
        layer_height: f64,
    ) {
        match self {
            Self::Straight => {
                path.line_to(x2, y2);
            }
            Self::Cubic { curvature } => {
                let offset = cubic_control_offset(x1, y1, x2, y2, layer_height, curvature);
                path.cubic_to(x1 + offset, y1, x2 - offset, y2, x2, y2);
            }
        }
    }
}

/// Horizontal distance between a segment endpoint and its control point.
#[must_use]
pub fn cubic_control_offset(
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    layer_height: f64,
    curvature: f64,
) -> f64 {
    let steepness = if layer_height > 0.0 {
        (4.0 * (y2 - y1).abs() / layer_height).min(1.0)
    } else {
        1.0
    };
    steepness * curvature * (x2 - x1) / 2.0
}

#[cfg(test)]
mod tests {
    use super::{PointConnector, cubic_control_offset};
    use crate::render::{PathCommand, PathPrimitive};

    #[test]
    fn curvature_outside_unit_interval_is_rejected() {
        assert!(PointConnector::cubic(0.0).is_err());
        assert!(PointConnector::cubic(1.5).is_err());
        assert!(PointConnector::cubic(f64::NAN).is_err());
        assert!(PointConnector::cubic(1.0).is_ok());
    }

    #[test]
    fn flat_segments_get_straight_controls() {
        assert_eq!(cubic_control_offset(0.0, 5.0, 10.0, 5.0, 100.0, 0.5), 0.0);
    }

    #[test]
    fn cubic_segment_ends_at_target() {
        let mut path = PathPrimitive::new();
        path.move_to(0.0, 0.0);
        PointConnector::Cubic { curvature: 1.0 }.connect(&mut path, (0.0, 0.0), (10.0, 50.0), 100.0);
        assert_eq!(
            path.commands[1],
            PathCommand::CubicTo {
                x1: 5.0,
                y1: 0.0,
                x2: 5.0,
                y2: 50.0,
                x: 10.0,
                y: 50.0
            }
        );
    }
}
