use chrono::{DateTime, FixedOffset};
use std::time::Instant;
use tracing::{debug, info};

use super::models::{
    OhlcBucket, Tick, OHLC_HEADERS, TICK_DATE_COLUMN, TICK_OHLC_COLUMNS, TICK_SYMBOL_COLUMN,
    TICK_TIMESTAMP_COLUMN,
};
use super::ohlc::{aggregate_buckets, ohlc_by_token};
use crate::config::PipelineConfig;
use crate::error::EtlError;
use crate::filter::TokenFilter;
use crate::mapping::MappingTable;
use crate::models::Token;
use crate::summary::{RunSummary, SkipReason};
use crate::table::{parse_number, write_records, Table};
use crate::timestamp::{decode_stem, epoch_millis_to_local, format_tick_time, parse_file_timestamp};
use crate::walker::{self, SourceFile};

pub const REQUIRED_COLUMNS: [&str; 4] = ["token", "time", "ltp", "volume"];

/// Ticks from every surviving file, before bucketing
#[derive(Debug, Clone)]
pub struct LtpTicks {
    pub ticks: Vec<Tick>,
    /// Source rows enriched with symbol, date, file timestamp and per-file OHLC
    pub table: Table,
    pub summary: RunSummary,
}

#[derive(Debug, Clone)]
pub struct LtpRun {
    pub ticks: LtpTicks,
    pub buckets: Vec<OhlcBucket>,
}

impl LtpRun {
    pub fn summary(&self) -> &RunSummary {
        &self.ticks.summary
    }
}

/// Rows surviving one file: ticks, their enriched table, and unmapped rows dropped
#[derive(Debug, Clone)]
pub struct FileTicks {
    pub ticks: Vec<Tick>,
    pub table: Table,
    pub dropped_unmapped: usize,
}

struct ParsedRow {
    token: Token,
    time: DateTime<FixedOffset>,
    ltp: f64,
    volume: f64,
    cells: Vec<Option<String>>,
}

/// Load the mapping, process every options-chain file, bucket and write
pub fn run_ltp_pipeline(config: &PipelineConfig) -> Result<LtpRun, EtlError> {
    let start = Instant::now();
    let mapping = MappingTable::load(&config.mapping_file, &config.symbol_suffix)?;

    let mut ticks = process_ltp_files(config, &mapping)?;
    let buckets = aggregate_buckets(&ticks.ticks, config.bucket_minutes);

    let output = config.ohlc_output_path();
    write_records(&output, OHLC_HEADERS, &buckets)?;
    info!("Saved {} OHLC rows to {}", buckets.len(), output.display());

    if let Some(path) = config.ltp_ticks_path() {
        ticks.table.write_csv(&path)?;
        info!("Saved {} tick rows to {}", ticks.table.len(), path.display());
    }

    ticks.summary.rows_out = buckets.len();
    ticks.summary.elapsed_ms = start.elapsed().as_millis() as u64;
    Ok(LtpRun { ticks, buckets })
}

/// Walk `<ltp_data_dir>/<date>/options-chain/*.csv` and collect filtered ticks
pub fn process_ltp_files(config: &PipelineConfig, mapping: &MappingTable) -> Result<LtpTicks, EtlError> {
    let offset = config.offset()?;
    let filter = TokenFilter::new(
        config.filter_tokens.as_deref(),
        config.filter_symbols.as_deref(),
        mapping,
    );

    info!("Processing LTP data from directory: {}", config.ltp_data_dir.display());
    let mut summary = RunSummary::new("ltp");
    let mut ticks = Vec::new();
    let mut tables = Vec::new();

    let folders = walker::fixed_subfolders(&config.ltp_data_dir, &config.options_chain_dir, &mut summary)?;
    for folder in folders {
        for file in walker::csv_files(&folder, &mut summary) {
            match read_ltp_file(&file, mapping, &filter, &offset) {
                Ok(parsed) => {
                    summary.files_processed += 1;
                    summary.rows_dropped_unmapped += parsed.dropped_unmapped;
                    ticks.extend(parsed.ticks);
                    tables.push(parsed.table);
                }
                Err(reason) => summary.skip(&file.path, reason),
            }
        }
    }

    if tables.is_empty() {
        info!("No data files processed");
    } else {
        info!("All files processed ({} ticks)", ticks.len());
    }
    summary.rows_out = ticks.len();

    Ok(LtpTicks {
        ticks,
        table: Table::concat(tables),
        summary,
    })
}

/// One options-chain snapshot: parse, filter, resolve symbols, attach per-file OHLC
pub fn read_ltp_file(
    file: &SourceFile,
    mapping: &MappingTable,
    filter: &TokenFilter,
    offset: &FixedOffset,
) -> Result<FileTicks, SkipReason> {
    let timestamp = file_timestamp_label(&file.stem, offset);

    let table = Table::from_csv_path(&file.path).map_err(|e| SkipReason::Unreadable(e.to_string()))?;
    let missing = table.missing_columns(&REQUIRED_COLUMNS);
    if !missing.is_empty() {
        return Err(SkipReason::MissingColumns(missing));
    }

    let mut rows = parse_rows(table.rows, &table.columns, offset)?;

    filter.retain(&mut rows, |row| &row.token);
    if rows.is_empty() {
        return Err(SkipReason::EmptyAfterFilter);
    }

    let before = rows.len();
    rows.retain(|row| mapping.symbol_for_token(&row.token).is_some());
    let dropped_unmapped = before - rows.len();
    if rows.is_empty() {
        return Err(SkipReason::NoResolvableTokens);
    }

    let per_file = ohlc_by_token(rows.iter().map(|row| (&row.token, row.ltp)));

    let mut out = Table::new(table.columns);
    let symbol_idx = out.ensure_column(TICK_SYMBOL_COLUMN);
    let date_idx = out.ensure_column(TICK_DATE_COLUMN);
    let timestamp_idx = out.ensure_column(TICK_TIMESTAMP_COLUMN);
    let ohlc_idx = TICK_OHLC_COLUMNS.map(|name| out.ensure_column(name));
    let width = out.columns.len();

    let mut ticks = Vec::with_capacity(rows.len());
    for row in rows {
        let symbol = mapping.symbol_for_token(&row.token).unwrap_or_default().to_string();

        let mut cells = row.cells;
        cells.resize(width, None);
        cells[symbol_idx] = Some(symbol.clone());
        cells[date_idx] = Some(file.date.clone());
        cells[timestamp_idx] = Some(timestamp.clone());
        if let Some(bar) = per_file.get(&row.token) {
            let values = [bar.open, bar.high, bar.low, bar.close];
            for (idx, value) in ohlc_idx.iter().zip(values) {
                cells[*idx] = Some(value.to_string());
            }
        }
        out.rows.push(cells);

        ticks.push(Tick {
            token: row.token,
            symbol,
            date: file.date.clone(),
            time: row.time,
            ltp: row.ltp,
            volume: row.volume,
        });
    }

    Ok(FileTicks {
        ticks,
        table: out,
        dropped_unmapped,
    })
}

/// The file name only labels the rows; ticks carry their own time. A name that
/// is not a timestamp is kept as its decoded text.
fn file_timestamp_label(stem: &str, offset: &FixedOffset) -> String {
    match parse_file_timestamp(stem, offset) {
        Ok(ts) => format_tick_time(&ts),
        Err(_) => {
            debug!("File name '{}' is not a timestamp, using it as the label", stem);
            decode_stem(stem).unwrap_or_else(|_| stem.to_string())
        }
    }
}

/// All four required cells must be present and numeric
fn parse_rows(
    rows: Vec<Vec<Option<String>>>,
    columns: &[String],
    offset: &FixedOffset,
) -> Result<Vec<ParsedRow>, SkipReason> {
    let index = |name: &str| columns.iter().position(|c| c == name).unwrap_or_default();
    let [token_idx, time_idx, ltp_idx, volume_idx] = REQUIRED_COLUMNS.map(index);

    let mut parsed = Vec::with_capacity(rows.len());
    for (i, cells) in rows.into_iter().enumerate() {
        let row_no = i + 1;
        let required = |idx: usize, column: &str| -> Result<f64, SkipReason> {
            parse_number(cells[idx].as_deref(), row_no, column)?.ok_or_else(|| SkipReason::MalformedValue {
                row: row_no,
                column: column.to_string(),
                value: String::new(),
            })
        };

        let token = Token::new(cells[token_idx].as_deref().unwrap_or(""));
        if token.is_empty() {
            return Err(SkipReason::MalformedValue {
                row: row_no,
                column: "token".to_string(),
                value: String::new(),
            });
        }
        let time = parse_epoch_millis(cells[time_idx].as_deref())
            .and_then(|ms| epoch_millis_to_local(ms, offset))
            .ok_or_else(|| SkipReason::MalformedValue {
                row: row_no,
                column: "time".to_string(),
                value: cells[time_idx].clone().unwrap_or_default(),
            })?;
        let ltp = required(ltp_idx, "ltp")?;
        let volume = required(volume_idx, "volume")?;

        parsed.push(ParsedRow {
            token,
            time,
            ltp,
            volume,
            cells,
        });
    }
    Ok(parsed)
}

/// Integer milliseconds, tolerating a float rendering such as `1732852024633.0`
fn parse_epoch_millis(cell: Option<&str>) -> Option<i64> {
    let raw = cell?.trim();
    raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(|v| v.trunc() as i64)
    })
}
