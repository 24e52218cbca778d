use std::collections::HashSet;

use crate::mapping::MappingTable;
use crate::models::Token;

/// Token allow-list first, then the symbol allow-list translated to tokens.
/// Both must pass when both are given; neither given lets everything through.
#[derive(Debug, Clone, Default)]
pub struct TokenFilter {
    tokens: Option<HashSet<Token>>,
    symbol_tokens: Option<HashSet<Token>>,
}

impl TokenFilter {
    /// Empty lists count as absent
    pub fn new(
        filter_tokens: Option<&[String]>,
        filter_symbols: Option<&[String]>,
        mapping: &MappingTable,
    ) -> Self {
        let tokens = filter_tokens
            .filter(|list| !list.is_empty())
            .map(|list| list.iter().map(|t| Token::new(t)).collect());
        let symbol_tokens = filter_symbols
            .filter(|list| !list.is_empty())
            .map(|list| mapping.tokens_for_symbols(list));
        Self { tokens, symbol_tokens }
    }

    pub fn is_active(&self) -> bool {
        self.tokens.is_some() || self.symbol_tokens.is_some()
    }

    pub fn allows(&self, token: &Token) -> bool {
        if let Some(tokens) = &self.tokens {
            if !tokens.contains(token) {
                return false;
            }
        }
        if let Some(symbol_tokens) = &self.symbol_tokens {
            if !symbol_tokens.contains(token) {
                return false;
            }
        }
        true
    }

    /// Keep allowed rows, source order untouched
    pub fn retain<T>(&self, rows: &mut Vec<T>, token_of: impl Fn(&T) -> &Token) {
        if self.is_active() {
            rows.retain(|row| self.allows(token_of(row)));
        }
    }
}
