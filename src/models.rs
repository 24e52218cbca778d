use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Instrument identifier as it appears in the mapping and tick files.
///
/// Kept as trimmed text. Ordering is numeric when both sides are integers so that
/// grouped output comes out in the same order as an integer group-by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn numeric(&self) -> Option<i64> {
        self.0.parse().ok()
    }
}

impl Ord for Token {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for Token {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Token {
    fn from(raw: &str) -> Self {
        Token::new(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_ordering() {
        let mut tokens: Vec<Token> = ["2885", "500", "ABC", "10"].iter().map(|s| Token::new(s)).collect();
        tokens.sort();
        let ordered: Vec<&str> = tokens.iter().map(Token::as_str).collect();
        assert_eq!(ordered, vec!["10", "500", "2885", "ABC"]);
    }

    #[test]
    fn test_trimmed() {
        assert_eq!(Token::new(" 500 "), Token::new("500"));
    }
}
