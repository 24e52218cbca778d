use anyhow::{bail, Result};
use colored::Colorize;
use std::path::PathBuf;

use crate::agent::QueryAgent;
use crate::config::PipelineConfig;
use crate::ltp::run_ltp_pipeline;
use crate::oi::run_oi_pipeline;
use crate::summary::RunSummary;
use crate::utility::Timer;

/// Command handler behind each run mode
pub struct EtlCommands;

impl EtlCommands {
    pub fn run_oi(config: &PipelineConfig) -> Result<RunSummary> {
        Timer::section("Open Interest Pipeline");
        println!("{} Data directory: {}", "→".cyan(), config.oi_data_dir.display().to_string().yellow());
        println!();

        let timer = Timer::start("OI pipeline");
        let run = run_oi_pipeline(config)?;
        timer.stop();

        Self::display_summary(&run.summary, &config.oi_output_path());
        Ok(run.summary)
    }

    pub fn run_ltp(config: &PipelineConfig) -> Result<RunSummary> {
        Timer::section("LTP OHLC Pipeline");
        println!("{} Data directory: {}", "→".cyan(), config.ltp_data_dir.display().to_string().yellow());
        println!("{} Bucket width: {} min", "→".cyan(), config.bucket_minutes);
        println!();

        let timer = Timer::start("LTP pipeline");
        let run = run_ltp_pipeline(config)?;
        timer.stop();

        let summary = run.summary().clone();
        Self::display_summary(&summary, &config.ohlc_output_path());
        if let Some(path) = config.ltp_ticks_path() {
            println!("{} Tick table: {} rows → {}", "✓".green(), run.ticks.table.len(), path.display());
        }
        Ok(summary)
    }

    /// OI then LTP. A fatal error in one pipeline does not stop the other.
    pub fn run_all(config: &PipelineConfig) -> Result<Vec<RunSummary>> {
        let oi = Self::run_oi(config);
        let ltp = Self::run_ltp(config);

        let mut summaries = Vec::new();
        let mut failures = Vec::new();
        for (name, result) in [("OI", oi), ("LTP", ltp)] {
            match result {
                Ok(summary) => summaries.push(summary),
                Err(e) => {
                    println!("{} {} pipeline failed: {}", "✗".red(), name, e);
                    failures.push(format!("{}: {}", name, e));
                }
            }
        }

        if !failures.is_empty() {
            bail!("{}", failures.join("; "));
        }

        println!();
        println!("{}", "=".repeat(60).blue());
        println!("{}", "Done!".green().bold());
        println!("{}", "=".repeat(60).blue());
        Ok(summaries)
    }

    pub async fn run_query<A: QueryAgent>(agent: &A, config: &PipelineConfig, question: &str) -> Result<String> {
        Timer::section("Query Agent");
        let sources = existing_outputs(config)?;
        for source in &sources {
            println!("{} Source: {}", "→".cyan(), source.display());
        }
        println!("{} Question: {}", "?".cyan(), question.yellow());
        println!();

        let answer = agent.answer(&sources, question).await?;
        println!("{}", answer);
        Ok(answer)
    }

    fn display_summary(summary: &RunSummary, output: &std::path::Path) {
        println!();
        println!("{}", "Summary".cyan().bold());
        println!("{}", "-".repeat(60).blue());
        println!("{} Files seen: {}", "ℹ".blue(), summary.files_seen);
        println!("{} Files processed: {}", "✓".green(), summary.files_processed);
        println!("{} Rows written: {} → {}", "✓".green(), summary.rows_out, output.display());
        if summary.rows_dropped_unmapped > 0 {
            println!("{} Rows without a mapped symbol: {}", "⚠".yellow(), summary.rows_dropped_unmapped);
        }

        let problems: Vec<_> = summary.skipped.iter().filter(|s| !s.reason.is_benign()).collect();
        if !problems.is_empty() {
            println!("{} Skipped: {}", "✗".red(), problems.len());
            for skipped in problems.iter().take(10) {
                println!("  {} {} → {}", "✗".red(), skipped.path.display().to_string().yellow(), skipped.reason);
            }
            if problems.len() > 10 {
                println!("  ... and {} more", problems.len() - 10);
            }
        }
        println!("{} Time taken: {}ms", "⏱".yellow(), summary.elapsed_ms);
    }
}

/// Pipeline outputs present on disk
pub fn existing_outputs(config: &PipelineConfig) -> Result<Vec<PathBuf>> {
    let sources: Vec<PathBuf> = config.output_paths().into_iter().filter(|p| p.is_file()).collect();
    if sources.is_empty() {
        bail!(
            "No output tables found in {}; run the pipelines first",
            config.output_dir.display()
        );
    }
    Ok(sources)
}
