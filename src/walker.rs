//! Two-level directory traversal: `<data_dir>/<date>/<group>/*.csv`.
//!
//! Entries are visited in file-name order so repeated runs emit rows in the
//! same order.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config;
use crate::error::EtlError;
use crate::summary::{RunSummary, SkipReason};

/// A `<date>/<group>` folder: a stock folder for OI, the options-chain folder for LTP
#[derive(Debug, Clone, PartialEq)]
pub struct GroupFolder {
    pub date: String,
    pub name: String,
    pub path: PathBuf,
}

/// One CSV snapshot inside a group folder
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub date: String,
    pub path: PathBuf,
    pub stem: String,
}

/// Directory entries sorted by name
pub fn sorted_entries(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();
    Ok(entries)
}

fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Date folders under `data_dir`. An unreadable root is fatal.
pub fn date_folders(data_dir: &Path, summary: &mut RunSummary) -> Result<Vec<(String, PathBuf)>, EtlError> {
    let entries = sorted_entries(data_dir)
        .map_err(|e| EtlError::Io(format!("{}: {}", data_dir.display(), e)))?;

    let mut dates = Vec::new();
    for path in entries {
        if !path.is_dir() {
            summary.skip(&path, SkipReason::NotDirectory);
            continue;
        }
        dates.push((entry_name(&path), path));
    }
    Ok(dates)
}

/// Every `<date>/<stock>` folder
pub fn stock_folders(data_dir: &Path, summary: &mut RunSummary) -> Result<Vec<GroupFolder>, EtlError> {
    let mut folders = Vec::new();
    for (date, date_path) in date_folders(data_dir, summary)? {
        info!("Processing date folder: {}", date);
        let entries = match sorted_entries(&date_path) {
            Ok(entries) => entries,
            Err(e) => {
                summary.skip(&date_path, SkipReason::Unreadable(e.to_string()));
                continue;
            }
        };
        for path in entries {
            if !path.is_dir() {
                summary.skip(&path, SkipReason::NotDirectory);
                continue;
            }
            folders.push(GroupFolder {
                date: date.clone(),
                name: entry_name(&path),
                path,
            });
        }
    }
    Ok(folders)
}

/// The fixed `<date>/<subfolder>` of every date folder
pub fn fixed_subfolders(
    data_dir: &Path,
    subfolder: &str,
    summary: &mut RunSummary,
) -> Result<Vec<GroupFolder>, EtlError> {
    let mut folders = Vec::new();
    for (date, date_path) in date_folders(data_dir, summary)? {
        let path = date_path.join(subfolder);
        if !path.is_dir() {
            summary.skip(&date_path, SkipReason::MissingSubfolder(subfolder.to_string()));
            continue;
        }
        info!("Processing date folder: {}", date);
        folders.push(GroupFolder {
            date,
            name: subfolder.to_string(),
            path,
        });
    }
    Ok(folders)
}

/// CSV files of a group folder. Anything else is recorded as skipped.
pub fn csv_files(folder: &GroupFolder, summary: &mut RunSummary) -> Vec<SourceFile> {
    let entries = match sorted_entries(&folder.path) {
        Ok(entries) => entries,
        Err(e) => {
            summary.skip(&folder.path, SkipReason::Unreadable(e.to_string()));
            return Vec::new();
        }
    };

    let mut files = Vec::new();
    for path in entries {
        let is_csv = path.is_file()
            && path.extension().and_then(|e| e.to_str()) == Some(config::CSV_EXTENSION);
        if !is_csv {
            summary.skip(&path, SkipReason::NotCsv);
            continue;
        }
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        files.push(SourceFile {
            date: folder.date.clone(),
            path,
            stem,
        });
    }
    summary.files_seen += files.len();
    files
}
