use anyhow::{bail, Result};
use colored::Colorize;

use nse_tick_etl::api_server_axum;
use nse_tick_etl::app_config::{AppConfig, RunMode};
use nse_tick_etl::commands::EtlCommands;
use nse_tick_etl::config::{self, PipelineConfig};
use nse_tick_etl::logging;
use nse_tick_etl::ChatCompletionAgent;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging(config::DEFAULT_LOG_DIR)?;

    let app_config = AppConfig::from_env()?;
    let pipeline_config = PipelineConfig::load()?;

    println!("{}", "=".repeat(60).blue());
    println!("{}", "NSE Tick ETL".green().bold());
    println!("{}", "=".repeat(60).blue());
    app_config.log_config();

    match app_config.mode {
        RunMode::Oi => {
            tokio::task::spawn_blocking(move || EtlCommands::run_oi(&pipeline_config)).await??;
        }
        RunMode::Ltp => {
            tokio::task::spawn_blocking(move || EtlCommands::run_ltp(&pipeline_config)).await??;
        }
        RunMode::All => {
            tokio::task::spawn_blocking(move || EtlCommands::run_all(&pipeline_config)).await??;
        }
        RunMode::Query => {
            let question = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
            if question.trim().is_empty() {
                bail!("Usage: ETL_MODE=query nse-tick-etl <question>");
            }
            let agent = ChatCompletionAgent::from_env()?;
            EtlCommands::run_query(&agent, &pipeline_config, &question).await?;
        }
        RunMode::Server => {
            let agent = ChatCompletionAgent::from_env()?;
            api_server_axum::start_server(pipeline_config, agent, app_config.port).await?;
        }
    }

    Ok(())
}
