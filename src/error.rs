use std::fmt;

/// Errors that abort a pipeline run.
///
/// Per-file problems are not errors: they become a [`crate::summary::SkipReason`]
/// and the run carries on.
#[derive(Debug)]
pub enum EtlError {
    Mapping(String),
    Io(String),
    Csv(String),
    Config(String),
}

impl fmt::Display for EtlError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EtlError::Mapping(msg) => write!(f, "Mapping error: {}", msg),
            EtlError::Io(msg) => write!(f, "I/O error: {}", msg),
            EtlError::Csv(msg) => write!(f, "CSV error: {}", msg),
            EtlError::Config(msg) => write!(f, "Config error: {}", msg),
        }
    }
}

impl std::error::Error for EtlError {}

impl From<std::io::Error> for EtlError {
    fn from(err: std::io::Error) -> Self {
        EtlError::Io(err.to_string())
    }
}

impl From<csv::Error> for EtlError {
    fn from(err: csv::Error) -> Self {
        EtlError::Csv(err.to_string())
    }
}

impl From<serde_json::Error> for EtlError {
    fn from(err: serde_json::Error) -> Self {
        EtlError::Config(err.to_string())
    }
}
