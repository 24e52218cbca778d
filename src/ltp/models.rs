use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::models::Token;
use crate::table::serialize_f64;

/// Output column order of the bucketed OHLC table
pub const OHLC_HEADERS: &[&str] = &[
    "token",
    "5min_interval",
    "Open",
    "High",
    "Low",
    "Close",
    "Volume",
    "Symbol",
    "Date",
];

/// Columns appended to each source row of the enriched tick table
pub const TICK_SYMBOL_COLUMN: &str = "symbol";
pub const TICK_DATE_COLUMN: &str = "Date";
pub const TICK_TIMESTAMP_COLUMN: &str = "Timestamp";
pub const TICK_OHLC_COLUMNS: [&str; 4] = ["Open", "High", "Low", "Close"];

/// One price observation with a resolved symbol, in source row order
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub token: Token,
    pub symbol: String,
    /// Date folder the file came from
    pub date: String,
    pub time: DateTime<FixedOffset>,
    pub ltp: f64,
    pub volume: f64,
}

/// One (token, interval) bar. Field order matches [`OHLC_HEADERS`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OhlcBucket {
    pub token: Token,

    #[serde(rename = "5min_interval")]
    pub interval_start: String,

    #[serde(rename = "Open", serialize_with = "serialize_f64")]
    pub open: f64,

    #[serde(rename = "High", serialize_with = "serialize_f64")]
    pub high: f64,

    #[serde(rename = "Low", serialize_with = "serialize_f64")]
    pub low: f64,

    #[serde(rename = "Close", serialize_with = "serialize_f64")]
    pub close: f64,

    #[serde(rename = "Volume", serialize_with = "serialize_f64")]
    pub volume: f64,

    #[serde(rename = "Symbol")]
    pub symbol: String,

    #[serde(rename = "Date")]
    pub date: String,
}
