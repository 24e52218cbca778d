use std::collections::{HashMap, HashSet};
use std::path::Path;

use tracing::{info, warn};

use crate::error::EtlError;
use crate::models::Token;
use crate::table::Table;

/// Symbol <-> token lookup loaded once per run and shared read-only.
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    entries: Vec<(String, Token)>,
    by_symbol: HashMap<String, Token>,
    by_token: HashMap<Token, String>,
}

impl MappingTable {
    /// Build from (raw symbol, token) pairs. First occurrence wins on lookups.
    pub fn from_pairs<I, S>(pairs: I, suffix: &str) -> Self
    where
        I: IntoIterator<Item = (S, Token)>,
        S: AsRef<str>,
    {
        let mut table = Self::default();
        for (symbol, token) in pairs {
            let symbol = clean_symbol(symbol.as_ref(), suffix);
            table.by_symbol.entry(symbol.clone()).or_insert_with(|| token.clone());
            table.by_token.entry(token.clone()).or_insert_with(|| symbol.clone());
            table.entries.push((symbol, token));
        }
        table
    }

    /// Load the mapping CSV. An unreadable file or missing column fails the load;
    /// rows with a blank symbol or token are skipped.
    pub fn load<P: AsRef<Path>>(path: P, suffix: &str) -> Result<Self, EtlError> {
        let path = path.as_ref();
        info!("Loading mapping file: {}", path.display());

        let table = Table::from_csv_path(path)
            .map_err(|e| EtlError::Mapping(format!("{}: {}", path.display(), e)))?;

        let missing = table.missing_columns(&["symbol", "token"]);
        if !missing.is_empty() {
            return Err(EtlError::Mapping(format!(
                "{}: missing columns {}",
                path.display(),
                missing.join(", ")
            )));
        }
        let symbol_idx = table.column_index("symbol").unwrap_or_default();
        let token_idx = table.column_index("token").unwrap_or_default();

        let mut pairs = Vec::with_capacity(table.len());
        for (row_no, row) in table.rows.iter().enumerate() {
            let symbol = row[symbol_idx].as_deref().map(str::trim).unwrap_or("");
            let token = Token::new(row[token_idx].as_deref().unwrap_or(""));
            if symbol.is_empty() || token.is_empty() {
                warn!(path = %path.display(), "Skipping mapping row {}: empty symbol or token", row_no + 1);
                continue;
            }
            pairs.push((symbol.to_string(), token));
        }

        let mapping = Self::from_pairs(pairs, suffix);
        info!("Mapping file loaded successfully ({} entries)", mapping.len());
        Ok(mapping)
    }

    pub fn token_for_symbol(&self, symbol: &str) -> Option<&Token> {
        self.by_symbol.get(symbol)
    }

    pub fn symbol_for_token(&self, token: &Token) -> Option<&str> {
        self.by_token.get(token).map(String::as_str)
    }

    /// Every token mapped to any of `symbols`
    pub fn tokens_for_symbols(&self, symbols: &[String]) -> HashSet<Token> {
        let wanted: HashSet<&str> = symbols.iter().map(String::as_str).collect();
        self.entries
            .iter()
            .filter(|(symbol, _)| wanted.contains(symbol.as_str()))
            .map(|(_, token)| token.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Drop the exchange qualifier from the end of a symbol
pub fn clean_symbol(symbol: &str, suffix: &str) -> String {
    let symbol = symbol.trim();
    if suffix.is_empty() {
        return symbol.to_string();
    }
    symbol.strip_suffix(suffix).unwrap_or(symbol).to_string()
}
