use std::fmt;

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::core::ranges::{ChartRanges, VerticalAxisPosition};
use crate::error::{ChartError, ChartResult};

const MINUS_SIGN: char = '\u{2212}';

/// Decimal separator preset for formatted labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LabelLocale {
    #[default]
    EnUs,
    EsEs,
}

impl LabelLocale {
    fn decimal_separator(self) -> char {
        match self {
            Self::EnUs => '.',
            Self::EsEs => ',',
        }
    }
}

/// Turns a chart value into label text.
///
/// `axis_position` names the vertical axis the value belongs to, or `None`
/// for x values and values with no axis affinity.
pub trait ValueFormatter: fmt::Debug + Send + Sync {
    fn format(
        &self,
        ranges: &ChartRanges,
        value: f64,
        axis_position: Option<VerticalAxisPosition>,
    ) -> ChartResult<String>;
}

/// Formats an axis label. Axis labels must never be empty; the placement
/// strategy decides which values get a label.
pub fn format_for_axis(
    formatter: &dyn ValueFormatter,
    ranges: &ChartRanges,
    value: f64,
    axis_position: Option<VerticalAxisPosition>,
) -> ChartResult<String> {
    let text = formatter.format(ranges, value, axis_position)?;
    if text.is_empty() {
        return Err(ChartError::EmptyFormattedLabel { value });
    }
    Ok(text)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecimalFormatter {
    pub max_fraction_digits: u8,
    pub locale: LabelLocale,
}

impl Default for DecimalFormatter {
    fn default() -> Self {
        Self {
            max_fraction_digits: 2,
            locale: LabelLocale::EnUs,
        }
    }
}

impl DecimalFormatter {
    #[must_use]
    pub fn new(max_fraction_digits: u8, locale: LabelLocale) -> Self {
        Self {
            max_fraction_digits,
            locale,
        }
    }

    #[must_use]
    pub fn format_value(&self, value: f64) -> String {
        format_decimal(value, self.max_fraction_digits, self.locale)
    }
}

impl ValueFormatter for DecimalFormatter {
    fn format(
        &self,
        _ranges: &ChartRanges,
        value: f64,
        _axis_position: Option<VerticalAxisPosition>,
    ) -> ChartResult<String> {
        if !value.is_finite() {
            return Err(ChartError::InvalidData(
                "cannot format a non-finite value".to_owned(),
            ));
        }
        Ok(self.format_value(value))
    }
}

/// Formats a y value as a share of the axis range maximum.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PercentFormatter {
    pub decimal: DecimalFormatter,
}

impl ValueFormatter for PercentFormatter {
    fn format(
        &self,
        ranges: &ChartRanges,
        value: f64,
        axis_position: Option<VerticalAxisPosition>,
    ) -> ChartResult<String> {
        let y_range = match axis_position {
            Some(position) => ranges.y_range_for_axis(position),
            None => ranges.y_range(None),
        };
        let max_y = y_range
            .max_y()
            .filter(|max_y| *max_y != 0.0)
            .ok_or_else(|| {
                ChartError::InvalidData(
                    "percent labels need a y range with a non-zero maximum".to_owned(),
                )
            })?;
        let mut text = self.decimal.format(ranges, value / max_y * 100.0, axis_position)?;
        text.push('%');
        Ok(text)
    }
}

/// Formats x values holding unix seconds with a `chrono` strftime pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtcDateTimeFormatter {
    pub pattern: String,
}

impl Default for UtcDateTimeFormatter {
    fn default() -> Self {
        Self {
            pattern: "%Y-%m-%d".to_owned(),
        }
    }
}

impl ValueFormatter for UtcDateTimeFormatter {
    fn format(
        &self,
        _ranges: &ChartRanges,
        value: f64,
        _axis_position: Option<VerticalAxisPosition>,
    ) -> ChartResult<String> {
        if !value.is_finite() {
            return Err(ChartError::InvalidData(
                "timestamp must be finite".to_owned(),
            ));
        }
        let millis = (value * 1000.0).round() as i64;
        let time = DateTime::from_timestamp_millis(millis).ok_or_else(|| {
            ChartError::InvalidData(format!("timestamp {value} is out of range"))
        })?;
        Ok(time.format(&self.pattern).to_string())
    }
}

fn format_decimal(value: f64, max_fraction_digits: u8, locale: LabelLocale) -> String {
    let digits = usize::from(max_fraction_digits);
    let mut text = format!("{:.*}", digits, value.abs());
    if text.contains('.') {
        let trimmed = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(trimmed);
    }
    let negative = value < 0.0 && text.bytes().any(|b| matches!(b, b'1'..=b'9'));
    let text = text.replace('.', &locale.decimal_separator().to_string());
    if negative {
        format!("{MINUS_SIGN}{text}")
    } else {
        text
    }
}

/// Deterministic, backend-independent width estimate for label layout.
#[must_use]
pub fn estimate_label_width_px(text: &str, font_size_px: f64) -> f64 {
    let units = text.chars().fold(0.0, |acc, ch| {
        acc + match ch {
            '0'..='9' => 0.62,
            '.' | ',' => 0.34,
            '-' | '+' | '%' | MINUS_SIGN => 0.42,
            ' ' => 0.33,
            _ => 0.58,
        }
    });
    (units * font_size_px).max(font_size_px)
}
