//! File-name timestamps and tick-time bucketing.
//!
//! Source files are named after the wall-clock instant they were captured at,
//! with colons percent-encoded: `2024-11-29T09%3A15%3A04.633.csv`.

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, TimeZone, Timelike};

use crate::summary::SkipReason;

const STEM_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const OI_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:00%:z";
const TICK_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f%:z";
const BUCKET_FORMAT: &str = "%Y-%m-%d %H:%M:%S%:z";

/// Percent-decode a file stem
pub fn decode_stem(stem: &str) -> Result<String, SkipReason> {
    urlencoding::decode(stem)
        .map(|s| s.into_owned())
        .map_err(|_| SkipReason::BadTimestamp(stem.to_string()))
}

/// Decode a file stem into an instant, reading the wall clock in `offset`
pub fn parse_file_timestamp(stem: &str, offset: &FixedOffset) -> Result<DateTime<FixedOffset>, SkipReason> {
    let decoded = decode_stem(stem)?;
    let naive = NaiveDateTime::parse_from_str(&decoded, STEM_FORMAT)
        .map_err(|_| SkipReason::BadTimestamp(stem.to_string()))?;
    offset
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| SkipReason::BadTimestamp(stem.to_string()))
}

/// OI time column: seconds and below dropped, e.g. `2024-11-29 09:15:00+05:30`
pub fn format_oi_minute(ts: &DateTime<FixedOffset>) -> String {
    ts.format(OI_TIME_FORMAT).to_string()
}

/// LTP file timestamp with millisecond precision
pub fn format_tick_time(ts: &DateTime<FixedOffset>) -> String {
    ts.format(TICK_TIME_FORMAT).to_string()
}

pub fn format_bucket(ts: &DateTime<FixedOffset>) -> String {
    ts.format(BUCKET_FORMAT).to_string()
}

/// Epoch milliseconds (UTC) viewed in `offset`
pub fn epoch_millis_to_local(millis: i64, offset: &FixedOffset) -> Option<DateTime<FixedOffset>> {
    DateTime::from_timestamp_millis(millis).map(|utc| utc.with_timezone(offset))
}

/// Start of the `width_minutes` bucket holding `ts`, buckets anchored at local midnight
pub fn floor_to_bucket(ts: &DateTime<FixedOffset>, width_minutes: u32) -> DateTime<FixedOffset> {
    let width = width_minutes.max(1);
    let minute_of_day = ts.hour() * 60 + ts.minute();
    let excess = minute_of_day % width;

    let truncated = ts
        .with_nanosecond(0)
        .and_then(|t| t.with_second(0))
        .unwrap_or(*ts);
    truncated - Duration::minutes(i64::from(excess))
}
