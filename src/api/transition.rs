use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ChartError, ChartResult};

/// Where the chart is in its animation between two models.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TransitionState {
    #[default]
    Idle,
    Running {
        target_generation: u64,
        fraction: f64,
    },
}

impl TransitionState {
    #[must_use]
    pub fn is_running(self) -> bool {
        matches!(self, Self::Running { .. })
    }
}

/// Maps linear animation progress onto the fraction handed to layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    #[default]
    EaseInOutCubic,
}

impl Easing {
    /// Monotonic on `[0, 1]` with `apply(0) == 0` and `apply(1) == 1`.
    #[must_use]
    pub fn apply(self, progress: f64) -> f64 {
        let t = progress.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}

impl FromStr for Easing {
    type Err = ChartError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "linear" => Ok(Self::Linear),
            "ease_in_out_cubic" => Ok(Self::EaseInOutCubic),
            other => Err(ChartError::InvalidConfig(format!(
                "unknown easing `{other}` (expected `linear` or `ease_in_out_cubic`)"
            ))),
        }
    }
}

/// Frame clock turning elapsed time into transition fractions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionClock {
    duration: Duration,
    easing: Easing,
    elapsed: Option<Duration>,
}

impl TransitionClock {
    #[must_use]
    pub fn new(duration: Duration, easing: Easing) -> Self {
        Self {
            duration,
            easing,
            elapsed: None,
        }
    }

    #[must_use]
    pub fn duration(self) -> Duration {
        self.duration
    }

    #[must_use]
    pub fn easing(self) -> Easing {
        self.easing
    }

    /// Restarts the clock; any running animation is abandoned.
    pub fn start(&mut self) {
        self.elapsed = Some(Duration::ZERO);
    }

    pub fn stop(&mut self) {
        self.elapsed = None;
    }

    #[must_use]
    pub fn is_running(self) -> bool {
        self.elapsed.is_some()
    }

    /// Advances by `delta` and returns the eased fraction, or `None` when the
    /// clock is not running. The tick that reaches the end returns `1.0` and
    /// stops the clock.
    pub fn tick(&mut self, delta: Duration) -> Option<f64> {
        let elapsed = self.elapsed? + delta;
        let progress = if self.duration.is_zero() {
            1.0
        } else {
            (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
        };
        self.elapsed = (progress < 1.0).then_some(elapsed);
        Some(self.easing.apply(progress))
    }
}

/// Checks that `fraction` may follow `current` in a running transition.
pub(crate) fn validate_fraction(current: f64, fraction: f64) -> ChartResult<f64> {
    if !fraction.is_finite() || !(0.0..=1.0).contains(&fraction) {
        return Err(ChartError::InvalidTransition(format!(
            "fraction must be within [0, 1], got {fraction}"
        )));
    }
    if fraction < current {
        return Err(ChartError::InvalidTransition(format!(
            "fraction must not decrease ({current} -> {fraction})"
        )));
    }
    Ok(fraction)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use approx::assert_relative_eq;

    use super::{Easing, TransitionClock, validate_fraction};

    #[test]
    fn easing_hits_both_endpoints() {
        for easing in [Easing::Linear, Easing::EaseInOutCubic] {
            assert_eq!(easing.apply(0.0), 0.0);
            assert_eq!(easing.apply(1.0), 1.0);
        }
        assert_relative_eq!(Easing::EaseInOutCubic.apply(0.5), 0.5);
    }

    #[test]
    fn clock_finishes_exactly_once() {
        let mut clock = TransitionClock::new(Duration::from_millis(100), Easing::Linear);
        assert_eq!(clock.tick(Duration::from_millis(16)), None);

        clock.start();
        assert_relative_eq!(
            clock.tick(Duration::from_millis(50)).expect("running"),
            0.5
        );
        assert_eq!(clock.tick(Duration::from_millis(80)), Some(1.0));
        assert!(!clock.is_running());
        assert_eq!(clock.tick(Duration::from_millis(16)), None);
    }

    #[test]
    fn zero_duration_jumps_to_the_end() {
        let mut clock = TransitionClock::new(Duration::ZERO, Easing::EaseInOutCubic);
        clock.start();
        assert_eq!(clock.tick(Duration::ZERO), Some(1.0));
    }

    #[test]
    fn fractions_are_bounded_and_monotonic() {
        assert!(validate_fraction(0.0, 1.5).is_err());
        assert!(validate_fraction(0.0, f64::NAN).is_err());
        assert!(validate_fraction(0.6, 0.4).is_err());
        assert_eq!(validate_fraction(0.4, 0.4).expect("same fraction"), 0.4);
    }

    #[test]
    fn easing_names_parse() {
        assert_eq!("linear".parse::<Easing>().expect("linear"), Easing::Linear);
        assert!("bounce".parse::<Easing>().is_err());
    }
}
