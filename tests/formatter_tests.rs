use cartesian_chart::core::primitives::datetime_to_unix_seconds;
use cartesian_chart::core::{
    ChartRanges, DecimalFormatter, LabelLocale, MutableChartRanges, PercentFormatter,
    RangeContribution, UtcDateTimeFormatter, ValueFormatter, VerticalAxisPosition,
    estimate_label_width_px, format_for_axis,
};
use chrono::{TimeZone, Utc};

fn dual_ranges() -> ChartRanges {
    let mut ranges = MutableChartRanges::new();
    for (max_y, position) in [
        (50.0, VerticalAxisPosition::Start),
        (400.0, VerticalAxisPosition::End),
    ] {
        ranges
            .update(RangeContribution {
                min_x: 0.0,
                max_x: 1.0,
                min_y: 0.0,
                max_y,
                min_x_delta: None,
                vertical_axis_position: Some(position),
            })
            .expect("update");
    }
    ranges.finalize()
}

#[test]
fn percent_labels_use_their_own_axis_range() {
    let ranges = dual_ranges();
    let formatter = PercentFormatter::default();
    assert_eq!(
        formatter
            .format(&ranges, 25.0, Some(VerticalAxisPosition::Start))
            .expect("start"),
        "50%"
    );
    assert_eq!(
        formatter
            .format(&ranges, 100.0, Some(VerticalAxisPosition::End))
            .expect("end"),
        "25%"
    );
}

#[test]
fn decimal_labels_respect_fraction_digits_and_locale() {
    let formatter = DecimalFormatter::new(3, LabelLocale::EsEs);
    assert_eq!(formatter.format_value(1234.5678), "1234,568");
    assert_eq!(formatter.format_value(-0.5), "\u{2212}0,5");
    assert_eq!(DecimalFormatter::new(0, LabelLocale::EnUs).format_value(2.4), "2");
}

#[test]
fn non_finite_values_cannot_be_formatted() {
    let ranges = dual_ranges();
    assert!(
        format_for_axis(&DecimalFormatter::default(), &ranges, f64::NAN, None).is_err()
    );
}

#[test]
fn dates_round_trip_through_unix_seconds() {
    let time = Utc
        .with_ymd_and_hms(2024, 3, 9, 14, 30, 0)
        .single()
        .expect("valid time");
    let formatter = UtcDateTimeFormatter {
        pattern: "%Y-%m-%d %H:%M".to_owned(),
    };
    let text = formatter
        .format(&ChartRanges::empty(), datetime_to_unix_seconds(time), None)
        .expect("date");
    assert_eq!(text, "2024-03-09 14:30");
}

#[test]
fn label_width_estimate_grows_with_text_and_font() {
    let short = estimate_label_width_px("9", 12.0);
    let long = estimate_label_width_px("99999", 12.0);
    assert!(long > short);
    assert!(estimate_label_width_px("99999", 24.0) > long);
    assert!(estimate_label_width_px("", 12.0) >= 12.0);
}
