pub mod agent;
pub mod api_server_axum;
pub mod app_config;
pub mod commands;
pub mod config;
pub mod error;
pub mod filter;
pub mod logging;
pub mod ltp;
pub mod mapping;
pub mod models;
pub mod oi;
pub mod summary;
pub mod table;
pub mod timestamp;
pub mod utility;
pub mod walker;

// Re-exports for convenience
pub use agent::{ChatCompletionAgent, QueryAgent};
pub use config::{AgentConfig, PipelineConfig};
pub use error::EtlError;
pub use ltp::{run_ltp_pipeline, LtpRun, OhlcBucket};
pub use mapping::MappingTable;
pub use models::Token;
pub use oi::{run_oi_pipeline, OiRecord, OiRun};
pub use summary::{RunSummary, SkipReason};
