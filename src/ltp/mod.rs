pub mod models;
pub mod ohlc;
pub mod processor;

pub use models::{OhlcBucket, Tick, OHLC_HEADERS};
pub use ohlc::{aggregate_buckets, ohlc_by_token, Ohlc};
pub use processor::{process_ltp_files, read_ltp_file, run_ltp_pipeline, FileTicks, LtpRun, LtpTicks};
