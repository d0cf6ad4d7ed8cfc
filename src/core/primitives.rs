use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::error::{ChartError, ChartResult};

pub fn decimal_to_f64(value: Decimal, field_name: &str) -> ChartResult<f64> {
    value.to_f64().ok_or_else(|| {
        ChartError::InvalidData(format!("{field_name} cannot be represented as f64"))
    })
}

#[must_use]
pub fn datetime_to_unix_seconds(time: DateTime<Utc>) -> f64 {
    time.timestamp_millis() as f64 / 1000.0
}

/// Linear interpolation that reproduces both endpoints exactly.
#[must_use]
pub fn lerp(from: f64, to: f64, fraction: f64) -> f64 {
    from * (1.0 - fraction) + to * fraction
}

pub(crate) fn ensure_non_negative(value: f64, name: &str) -> ChartResult<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(ChartError::InvalidConfig(format!(
            "`{name}` must be finite and >= 0"
        )));
    }
    Ok(value)
}

pub(crate) fn ensure_positive(value: f64, name: &str) -> ChartResult<f64> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ChartError::InvalidConfig(format!(
            "`{name}` must be finite and > 0"
        )));
    }
    Ok(value)
}
