use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Why a unit (directory, file or stock folder) contributed nothing to the output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    NotDirectory,
    NotCsv,
    /// Expected subfolder (e.g. `options-chain`) absent from a date folder
    MissingSubfolder(String),
    Unreadable(String),
    MissingColumns(Vec<String>),
    BadTimestamp(String),
    MalformedValue { row: usize, column: String, value: String },
    UnmappedSymbol(String),
    NoResolvableTokens,
    EmptyAfterFilter,
    FilteredOut,
}

impl SkipReason {
    /// Expected outcomes of walking and filtering, not data problems
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            SkipReason::NotDirectory
                | SkipReason::NotCsv
                | SkipReason::EmptyAfterFilter
                | SkipReason::FilteredOut
        )
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SkipReason::NotDirectory => write!(f, "not a directory"),
            SkipReason::NotCsv => write!(f, "not a CSV file"),
            SkipReason::MissingSubfolder(name) => write!(f, "missing '{}' folder", name),
            SkipReason::Unreadable(msg) => write!(f, "unreadable: {}", msg),
            SkipReason::MissingColumns(cols) => write!(f, "missing required columns: {}", cols.join(", ")),
            SkipReason::BadTimestamp(stem) => write!(f, "undecodable timestamp '{}'", stem),
            SkipReason::MalformedValue { row, column, value } => {
                write!(f, "malformed '{}' value '{}' at row {}", column, value, row)
            }
            SkipReason::UnmappedSymbol(symbol) => write!(f, "no matching token for '{}'", symbol),
            SkipReason::NoResolvableTokens => write!(f, "no token resolves to a symbol"),
            SkipReason::EmptyAfterFilter => write!(f, "no data left after filtering"),
            SkipReason::FilteredOut => write!(f, "excluded by filter"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedUnit {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// Outcome of one pipeline run, assertable in tests instead of console text.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub pipeline: String,
    pub files_seen: usize,
    pub files_processed: usize,
    pub rows_out: usize,
    pub rows_dropped_unmapped: usize,
    pub skipped: Vec<SkippedUnit>,
    pub elapsed_ms: u64,
}

impl RunSummary {
    pub fn new(pipeline: &str) -> Self {
        Self {
            pipeline: pipeline.to_string(),
            ..Self::default()
        }
    }

    /// Record and log a skipped unit
    pub fn skip(&mut self, path: &Path, reason: SkipReason) {
        match &reason {
            SkipReason::FilteredOut => debug!(path = %path.display(), "{}", reason),
            r if r.is_benign() => info!(path = %path.display(), "Skipping: {}", reason),
            _ => warn!(path = %path.display(), "Skipping: {}", reason),
        }
        self.skipped.push(SkippedUnit {
            path: path.to_path_buf(),
            reason,
        });
    }

    pub fn count_skips(&self, pred: impl Fn(&SkipReason) -> bool) -> usize {
        self.skipped.iter().filter(|s| pred(&s.reason)).count()
    }

    /// Skips caused by bad or unmappable data
    pub fn problem_count(&self) -> usize {
        self.count_skips(|r| !r.is_benign())
    }
}
