use chrono::FixedOffset;
use std::time::Instant;
use tracing::{info, warn};

use super::decomposer::decompose;
use super::models::{OiRecord, OI_HEADERS};
use crate::config::PipelineConfig;
use crate::error::EtlError;
use crate::filter::TokenFilter;
use crate::mapping::MappingTable;
use crate::models::Token;
use crate::summary::{RunSummary, SkipReason};
use crate::table::{parse_number, write_records, Table};
use crate::timestamp::{format_oi_minute, parse_file_timestamp};
use crate::walker::{self, SourceFile};

pub const REQUIRED_COLUMNS: [&str; 4] = ["symbol", "openInterest", "buildUp", "ltp"];

/// Combined OI rows plus what happened along the way
#[derive(Debug, Clone)]
pub struct OiRun {
    pub records: Vec<OiRecord>,
    pub summary: RunSummary,
}

/// Load the mapping, process every stock folder and write the OI table
pub fn run_oi_pipeline(config: &PipelineConfig) -> Result<OiRun, EtlError> {
    let start = Instant::now();
    let mapping = MappingTable::load(&config.mapping_file, &config.symbol_suffix)?;

    let mut run = process_oi_data(config, &mapping)?;

    let output = config.oi_output_path();
    write_records(&output, OI_HEADERS, &run.records)?;
    info!("Saved {} OI rows to {}", run.records.len(), output.display());

    run.summary.elapsed_ms = start.elapsed().as_millis() as u64;
    Ok(run)
}

/// Walk `<oi_data_dir>/<date>/<stock>/*.csv` and build OI rows in walk order
pub fn process_oi_data(config: &PipelineConfig, mapping: &MappingTable) -> Result<OiRun, EtlError> {
    let offset = config.offset()?;
    let filter = TokenFilter::new(
        config.filter_tokens.as_deref(),
        config.filter_symbols.as_deref(),
        mapping,
    );

    let mut summary = RunSummary::new("oi");
    let mut records = Vec::new();

    for stock in walker::stock_folders(&config.oi_data_dir, &mut summary)? {
        let Some(token) = mapping.token_for_symbol(&stock.name) else {
            summary.skip(&stock.path, SkipReason::UnmappedSymbol(stock.name.clone()));
            continue;
        };
        if !filter.allows(token) {
            summary.skip(&stock.path, SkipReason::FilteredOut);
            continue;
        }

        info!("  Processing stock folder: {}", stock.name);
        for file in walker::csv_files(&stock, &mut summary) {
            match read_oi_file(&file, token, &offset) {
                Ok(rows) => {
                    summary.files_processed += 1;
                    records.extend(rows);
                }
                Err(reason) => summary.skip(&file.path, reason),
            }
        }
    }

    if records.is_empty() {
        info!("No valid OI data found in {}", config.oi_data_dir.display());
    }
    summary.rows_out = records.len();

    Ok(OiRun { records, summary })
}

/// One snapshot file. A bad name, unreadable CSV or missing column rejects the
/// file. Inside it, an identifier that does not decompose nulls its four option
/// columns and a non-numeric value nulls its own cell.
pub fn read_oi_file(file: &SourceFile, token: &Token, offset: &FixedOffset) -> Result<Vec<OiRecord>, SkipReason> {
    let timestamp = parse_file_timestamp(&file.stem, offset)?;
    let time = format_oi_minute(&timestamp);

    let table = Table::from_csv_path(&file.path).map_err(|e| SkipReason::Unreadable(e.to_string()))?;
    let missing = table.missing_columns(&REQUIRED_COLUMNS);
    if !missing.is_empty() {
        return Err(SkipReason::MissingColumns(missing));
    }

    let [symbol_idx, oi_idx, build_up_idx, ltp_idx] =
        REQUIRED_COLUMNS.map(|name| table.column_index(name).unwrap_or_default());

    let mut records = Vec::with_capacity(table.len());
    for (i, row) in table.rows.iter().enumerate() {
        let contract = row[symbol_idx].as_deref().and_then(decompose);
        records.push(OiRecord {
            open_interest: lenient_number(file, row[oi_idx].as_deref(), i + 1, "openInterest"),
            build_up: row[build_up_idx].clone(),
            ltp: lenient_number(file, row[ltp_idx].as_deref(), i + 1, "ltp"),
            underlying: contract.as_ref().map(|c| c.underlying.clone()),
            expiry: contract.as_ref().map(|c| c.expiry.clone()),
            strike_price: contract.as_ref().map(|c| c.strike.clone()),
            option_type: contract.map(|c| c.option_type),
            token: token.clone(),
            time: time.clone(),
        });
    }

    Ok(records)
}

/// Pass-through numeric cell: a placeholder such as `-` becomes empty, the row stays
fn lenient_number(file: &SourceFile, cell: Option<&str>, row: usize, column: &str) -> Option<f64> {
    parse_number(cell, row, column).unwrap_or_else(|reason| {
        warn!(path = %file.path.display(), "{}, left empty", reason);
        None
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IST_OFFSET_SECS;
    use std::path::Path;

    fn source(dir: &Path, stem: &str, body: &str) -> SourceFile {
        let path = dir.join(format!("{}.csv", stem));
        std::fs::write(&path, body).unwrap();
        SourceFile {
            date: "2024-11-29".to_string(),
            path,
            stem: stem.to_string(),
        }
    }

    fn ist() -> FixedOffset {
        FixedOffset::east_opt(IST_OFFSET_SECS).unwrap()
    }

    #[test]
    fn test_read_oi_file_rows() {
        let dir = tempfile::tempdir().unwrap();
        let file = source(
            dir.path(),
            "2024-11-29T09%3A15%3A04.633",
            "symbol,openInterest,buildUp,ltp,ltpChange\n\
             RELIANCE29NOV24500CE,1200,Long Buildup,12.5,0.5\n\
             RELIANCE29NOV24500XX,300,,7,0\n",
        );

        let rows = read_oi_file(&file, &Token::new("2885"), &ist()).unwrap();
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].underlying.as_deref(), Some("RELIANCE"));
        assert_eq!(rows[0].strike_price.as_deref(), Some("500"));
        assert_eq!(rows[0].open_interest, Some(1200.0));
        assert_eq!(rows[0].build_up.as_deref(), Some("Long Buildup"));
        assert_eq!(rows[0].time, "2024-11-29 09:15:00+05:30");
        assert_eq!(rows[0].token, Token::new("2885"));

        // Unmatched identifier: row kept, option columns null
        assert_eq!(rows[1].underlying, None);
        assert_eq!(rows[1].expiry, None);
        assert_eq!(rows[1].strike_price, None);
        assert_eq!(rows[1].option_type, None);
        assert_eq!(rows[1].build_up, None);
    }

    #[test]
    fn test_placeholder_value_only_nulls_its_cell() {
        let dir = tempfile::tempdir().unwrap();
        let file = source(
            dir.path(),
            "2024-11-29T09%3A15%3A04.633",
            "symbol,openInterest,buildUp,ltp\n\
             RELIANCE29NOV241300CE,1200,Long Buildup,12.5\n\
             RELIANCE29NOV241400CE,-,,0\n",
        );

        let rows = read_oi_file(&file, &Token::new("2885"), &ist()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].open_interest, Some(1200.0));
        assert_eq!(rows[1].open_interest, None);
        assert_eq!(rows[1].ltp, Some(0.0));
        assert_eq!(rows[1].strike_price.as_deref(), Some("1400"));
    }

    #[test]
    fn test_read_oi_file_missing_columns() {
        let dir = tempfile::tempdir().unwrap();
        let file = source(dir.path(), "2024-11-29T09%3A15%3A04.633", "symbol,ltp\nX,1\n");

        assert_eq!(
            read_oi_file(&file, &Token::new("1"), &ist()),
            Err(SkipReason::MissingColumns(vec![
                "openInterest".to_string(),
                "buildUp".to_string()
            ]))
        );
    }

    #[test]
    fn test_read_oi_file_bad_stem() {
        let dir = tempfile::tempdir().unwrap();
        let file = source(dir.path(), "latest", "symbol,openInterest,buildUp,ltp\n");

        assert!(matches!(
            read_oi_file(&file, &Token::new("1"), &ist()),
            Err(SkipReason::BadTimestamp(_))
        ));
    }
}
