use serde::Serialize;

use crate::models::Token;
use crate::table::serialize_opt_f64;

/// Output column order of the open-interest table
pub const OI_HEADERS: &[&str] = &[
    "openInterest",
    "buildUp",
    "ltp",
    "Stock Name",
    "Expiry",
    "StrikePrice",
    "Type",
    "Token",
    "Time",
];

/// One option row of an OI snapshot, tagged with its stock token and minute.
/// Field order matches [`OI_HEADERS`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OiRecord {
    #[serde(rename = "openInterest", serialize_with = "serialize_opt_f64")]
    pub open_interest: Option<f64>,

    #[serde(rename = "buildUp")]
    pub build_up: Option<String>,

    #[serde(serialize_with = "serialize_opt_f64")]
    pub ltp: Option<f64>,

    #[serde(rename = "Stock Name")]
    pub underlying: Option<String>,

    #[serde(rename = "Expiry")]
    pub expiry: Option<String>,

    #[serde(rename = "StrikePrice")]
    pub strike_price: Option<String>,

    #[serde(rename = "Type")]
    pub option_type: Option<String>,

    #[serde(rename = "Token")]
    pub token: Token,

    #[serde(rename = "Time")]
    pub time: String,
}
