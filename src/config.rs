use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::error::EtlError;

// -----------------------------------------------
// DEFAULT LOCATIONS
// -----------------------------------------------
pub const DEFAULT_OI_DATA_DIR: &str = "./data/oi";
pub const DEFAULT_LTP_DATA_DIR: &str = "./data/ltp";
pub const DEFAULT_MAPPING_FILE: &str = "./data/mapping.csv";
pub const DEFAULT_OUTPUT_DIR: &str = "./Output";
pub const DEFAULT_LOG_DIR: &str = "./logs";
pub const LOG_FILE_NAME: &str = "nse-tick-etl.log";

// -----------------------------------------------
// OUTPUT ARTIFACTS
// -----------------------------------------------
pub const OI_OUTPUT_FILE: &str = "All_stock_open_interest_data.csv";
pub const OHLC_OUTPUT_FILE: &str = "All_stocks_ltp_ohlc_data.csv";
pub const TICKS_OUTPUT_FILE: &str = "All_stocks_ltp_ticks.csv";

// -----------------------------------------------
// INPUT CONVENTIONS
// -----------------------------------------------
/// Exchange qualifier stripped from mapping symbols ("RELIANCE-EQ" -> "RELIANCE")
pub const SYMBOL_SUFFIX: &str = "-EQ";
pub const OPTIONS_CHAIN_DIR: &str = "options-chain";
pub const CSV_EXTENSION: &str = "csv";

/// Asia/Kolkata, no DST
pub const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;
pub const DEFAULT_BUCKET_MINUTES: u32 = 5;
pub const MINUTES_PER_DAY: u32 = 24 * 60;

// -----------------------------------------------
// QUERY AGENT
// -----------------------------------------------
pub const AGENT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const AGENT_MODEL: &str = "gpt-3.5-turbo";
pub const AGENT_TEMPERATURE: f32 = 0.0;
pub const AGENT_MAX_SOURCE_BYTES: usize = 64 * 1024;
pub const AGENT_HTTP_TIMEOUT: Duration = Duration::from_secs(60);

pub const RETRY_BASE_DELAY_MS: u64 = 200;
pub const RETRY_FACTOR: u64 = 2;
pub const RETRY_MAX_DELAY_SECS: u64 = 5;
pub const RETRY_MAX_ATTEMPTS: usize = 3;

// -----------------------------------------------
// SERVER
// -----------------------------------------------
pub const DEFAULT_PORT: u16 = 3001;

// -----------------------------------------------
// PIPELINE CONFIGURATION
// -----------------------------------------------

/// Everything a pipeline run needs. Passed explicitly into each entry point.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub oi_data_dir: PathBuf,
    pub ltp_data_dir: PathBuf,
    pub mapping_file: PathBuf,
    pub output_dir: PathBuf,
    pub oi_output_file: String,
    pub ohlc_output_file: String,
    /// Enriched per-tick table; not written when `None`
    pub ltp_ticks_file: Option<String>,
    pub filter_symbols: Option<Vec<String>>,
    pub filter_tokens: Option<Vec<String>>,
    pub symbol_suffix: String,
    pub options_chain_dir: String,
    pub bucket_minutes: u32,
    pub utc_offset_secs: i32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            oi_data_dir: PathBuf::from(DEFAULT_OI_DATA_DIR),
            ltp_data_dir: PathBuf::from(DEFAULT_LTP_DATA_DIR),
            mapping_file: PathBuf::from(DEFAULT_MAPPING_FILE),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            oi_output_file: OI_OUTPUT_FILE.to_string(),
            ohlc_output_file: OHLC_OUTPUT_FILE.to_string(),
            ltp_ticks_file: None,
            filter_symbols: None,
            filter_tokens: None,
            symbol_suffix: SYMBOL_SUFFIX.to_string(),
            options_chain_dir: OPTIONS_CHAIN_DIR.to_string(),
            bucket_minutes: DEFAULT_BUCKET_MINUTES,
            utc_offset_secs: IST_OFFSET_SECS,
        }
    }
}

impl PipelineConfig {
    /// JSON file named by `ETL_CONFIG` if set, environment otherwise
    pub fn load() -> Result<Self, EtlError> {
        let config = match std::env::var("ETL_CONFIG") {
            Ok(path) => Self::from_json_file(path)?,
            Err(_) => Self::from_env(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, EtlError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| EtlError::Config(format!("{}: {}", path.display(), e)))?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            oi_data_dir: env_path("ETL_OI_DATA_DIR").unwrap_or(defaults.oi_data_dir),
            ltp_data_dir: env_path("ETL_LTP_DATA_DIR").unwrap_or(defaults.ltp_data_dir),
            mapping_file: env_path("ETL_MAPPING_FILE").unwrap_or(defaults.mapping_file),
            output_dir: env_path("ETL_OUTPUT_DIR").unwrap_or(defaults.output_dir),
            ltp_ticks_file: std::env::var("ETL_LTP_TICKS_FILE").ok().filter(|s| !s.is_empty()),
            filter_symbols: std::env::var("ETL_FILTER_SYMBOLS").ok().and_then(|s| parse_list(&s)),
            filter_tokens: std::env::var("ETL_FILTER_TOKENS").ok().and_then(|s| parse_list(&s)),
            bucket_minutes: std::env::var("ETL_BUCKET_MINUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.bucket_minutes),
            ..defaults
        }
    }

    pub fn validate(&self) -> Result<(), EtlError> {
        if self.bucket_minutes == 0 || self.bucket_minutes > MINUTES_PER_DAY {
            return Err(EtlError::Config(format!(
                "bucket_minutes must be within 1..={}, got {}",
                MINUTES_PER_DAY, self.bucket_minutes
            )));
        }
        self.offset()?;
        Ok(())
    }

    pub fn offset(&self) -> Result<FixedOffset, EtlError> {
        FixedOffset::east_opt(self.utc_offset_secs).ok_or_else(|| {
            EtlError::Config(format!("invalid UTC offset: {}s", self.utc_offset_secs))
        })
    }

    pub fn oi_output_path(&self) -> PathBuf {
        self.output_dir.join(&self.oi_output_file)
    }

    pub fn ohlc_output_path(&self) -> PathBuf {
        self.output_dir.join(&self.ohlc_output_file)
    }

    pub fn ltp_ticks_path(&self) -> Option<PathBuf> {
        self.ltp_ticks_file.as_ref().map(|name| self.output_dir.join(name))
    }

    /// The artifacts handed to the query agent
    pub fn output_paths(&self) -> Vec<PathBuf> {
        vec![self.oi_output_path(), self.ohlc_output_path()]
    }
}

// -----------------------------------------------
// AGENT CONFIGURATION
// -----------------------------------------------

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub max_source_bytes: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: AGENT_ENDPOINT.to_string(),
            model: AGENT_MODEL.to_string(),
            temperature: AGENT_TEMPERATURE,
            max_source_bytes: AGENT_MAX_SOURCE_BYTES,
        }
    }
}

impl AgentConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: std::env::var("OPENAI_API_KEY").ok().filter(|s| !s.is_empty()),
            endpoint: std::env::var("ETL_AGENT_ENDPOINT").unwrap_or(defaults.endpoint),
            model: std::env::var("ETL_AGENT_MODEL").unwrap_or(defaults.model),
            max_source_bytes: std::env::var("ETL_AGENT_MAX_SOURCE_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_source_bytes),
            ..defaults
        }
    }
}

// -----------------------------------------------
// RUNTIME CONFIGURATION
// -----------------------------------------------

/// Get the execution mode from environment or default to running both pipelines
pub fn get_execution_mode() -> String {
    std::env::var("ETL_MODE").unwrap_or_else(|_| "all".to_string())
}

pub fn get_port() -> u16 {
    std::env::var("ETL_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key).ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}

/// Comma separated allow-list; blank means no filter
pub fn parse_list(raw: &str) -> Option<Vec<String>> {
    let items: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    if items.is_empty() { None } else { Some(items) }
}
