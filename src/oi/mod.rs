pub mod decomposer;
pub mod models;
pub mod processor;

pub use decomposer::{decompose, OptionContract};
pub use models::{OiRecord, OI_HEADERS};
pub use processor::{process_oi_data, read_oi_file, run_oi_pipeline, OiRun};
