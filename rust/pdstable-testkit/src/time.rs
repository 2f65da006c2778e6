//! An ISO 8601 time converter for tests.
//!
//! Accepts `YYYY-MM-DD` optionally followed by `Thh:mm[:ss[.fff]]` (a trailing `Z` is
//! ignored) and returns seconds since 2000-01-01T00:00:00, without leap seconds.

use chrono::{NaiveDate, NaiveDateTime};

const DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

pub fn iso_seconds(text: &str) -> Option<f64> {
    let text = text.trim().trim_end_matches('Z');
    let time = parse_date_time(text)?;
    let epoch = NaiveDate::from_ymd_opt(2000, 1, 1)?.and_hms_opt(0, 0, 0)?;
    let micros = time.signed_duration_since(epoch).num_microseconds()?;
    Some(micros as f64 / 1_000_000.0)
}

fn parse_date_time(text: &str) -> Option<NaiveDateTime> {
    if !text.contains('T') {
        return NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()?
            .and_hms_opt(0, 0, 0);
    }
    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
}
