use regex::Regex;
use std::sync::LazyLock;

/// Underlying ticker, DDMMMYY expiry, strike, CE/PE. Searched, not anchored.
static OPTION_SYMBOL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Za-z]+)(\d{2}[A-Za-z]{3}\d{2})(\d+)(CE|PE)").expect("option symbol pattern")
});

/// Parts of an encoded option identifier such as `RELIANCE29NOV24500CE`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionContract {
    pub underlying: String,
    pub expiry: String,
    pub strike: String,
    pub option_type: String,
}

/// All four parts or nothing. The first match anywhere in the string is used.
pub fn decompose(identifier: &str) -> Option<OptionContract> {
    let caps = OPTION_SYMBOL.captures(identifier)?;
    Some(OptionContract {
        underlying: caps[1].to_string(),
        expiry: caps[2].to_string(),
        strike: caps[3].to_string(),
        option_type: caps[4].to_string(),
    })
}
