use serde::{Deserialize, Serialize};

use crate::core::Point;

/// How the chart reacts to the reported pointer position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MarkerMode {
    /// The marker follows the entity nearest to the pointer.
    #[default]
    Nearest,
    /// The pointer is ignored; only persistent markers are drawn.
    Hidden,
}

/// Pointer position reported by the host, sampled once per draw pass.
///
/// Updates arriving while a pass is running only become visible to the next
/// pass.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerState {
    mode: MarkerMode,
    latest: Option<Point>,
    sampled: Option<Point>,
}

impl PointerState {
    #[must_use]
    pub fn new(mode: MarkerMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn mode(self) -> MarkerMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: MarkerMode) {
        self.mode = mode;
    }

    /// Records the latest pointer position; `None` means the pointer left.
    pub fn set_position(&mut self, position: Option<Point>) {
        self.latest = position.filter(|point| point.x.is_finite() && point.y.is_finite());
    }

    #[must_use]
    pub fn latest(self) -> Option<Point> {
        self.latest
    }

    /// Freezes the latest position for the pass about to start.
    pub fn sample(&mut self) -> Option<Point> {
        self.sampled = match self.mode {
            MarkerMode::Nearest => self.latest,
            MarkerMode::Hidden => None,
        };
        self.sampled
    }

    #[must_use]
    pub fn sampled(self) -> Option<Point> {
        self.sampled
    }
}
