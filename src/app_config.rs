use anyhow::{bail, Result};
use colored::Colorize;
use std::fmt;
use std::str::FromStr;

use crate::config;

/// What the binary does on startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Oi,
    Ltp,
    All,
    Query,
    Server,
}

impl FromStr for RunMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "oi" => Ok(RunMode::Oi),
            "ltp" => Ok(RunMode::Ltp),
            "all" | "" => Ok(RunMode::All),
            "query" => Ok(RunMode::Query),
            "server" => Ok(RunMode::Server),
            other => bail!("Unknown ETL_MODE '{}' (expected oi, ltp, all, query or server)", other),
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            RunMode::Oi => "oi",
            RunMode::Ltp => "ltp",
            RunMode::All => "all",
            RunMode::Query => "query",
            RunMode::Server => "server",
        };
        f.write_str(name)
    }
}

/// Application configuration handler
pub struct AppConfig {
    pub mode: RunMode,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            mode: config::get_execution_mode().parse()?,
            port: config::get_port(),
        })
    }

    pub fn log_config(&self) {
        println!("{} Mode: {}", "→".cyan(), self.mode.to_string().yellow());
        if self.mode == RunMode::Server {
            println!("{} Port: {}", "→".cyan(), self.port.to_string().yellow());
        }
    }
}
