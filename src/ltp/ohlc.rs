//! Open/high/low/close accumulation.
//!
//! Open and close are the first and last prices in the order rows are fed in,
//! never re-sorted by time, even when two ticks share a timestamp.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, FixedOffset};

use super::models::{OhlcBucket, Tick};
use crate::models::Token;
use crate::timestamp::{floor_to_bucket, format_bucket};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ohlc {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Ohlc {
    pub fn new(price: f64) -> Self {
        Self {
            open: price,
            high: price,
            low: price,
            close: price,
        }
    }

    pub fn update(&mut self, price: f64) {
        self.high = self.high.max(price);
        self.low = self.low.min(price);
        self.close = price;
    }
}

/// Per-token OHLC over `(token, price)` pairs in row order
pub fn ohlc_by_token<'a, I>(prices: I) -> HashMap<Token, Ohlc>
where
    I: IntoIterator<Item = (&'a Token, f64)>,
{
    let mut bars: HashMap<Token, Ohlc> = HashMap::new();
    for (token, price) in prices {
        bars.entry(token.clone())
            .and_modify(|bar| bar.update(price))
            .or_insert_with(|| Ohlc::new(price));
    }
    bars
}

struct BucketAcc {
    ohlc: Ohlc,
    volume: f64,
    symbol: String,
    date: String,
}

/// Group ticks by token and `width_minutes` interval.
/// Volume is summed, symbol and date are first-seen. Sorted by (token, interval).
pub fn aggregate_buckets(ticks: &[Tick], width_minutes: u32) -> Vec<OhlcBucket> {
    let mut buckets: BTreeMap<(Token, DateTime<FixedOffset>), BucketAcc> = BTreeMap::new();

    for tick in ticks {
        let start = floor_to_bucket(&tick.time, width_minutes);
        buckets
            .entry((tick.token.clone(), start))
            .and_modify(|acc| {
                acc.ohlc.update(tick.ltp);
                acc.volume += tick.volume;
            })
            .or_insert_with(|| BucketAcc {
                ohlc: Ohlc::new(tick.ltp),
                volume: tick.volume,
                symbol: tick.symbol.clone(),
                date: tick.date.clone(),
            });
    }

    buckets
        .into_iter()
        .map(|((token, start), acc)| OhlcBucket {
            token,
            interval_start: format_bucket(&start),
            open: acc.ohlc.open,
            high: acc.ohlc.high,
            low: acc.ohlc.low,
            close: acc.ohlc.close,
            volume: acc.volume,
            symbol: acc.symbol,
            date: acc.date,
        })
        .collect()
}
