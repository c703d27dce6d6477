//! Numeric cell parsing strategies
//!
//! Exports from spreadsheet tools disagree on the decimal mark, so the
//! separator is chosen explicitly instead of being sniffed from the data.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Strategy for turning a raw cell into a number
pub trait DecimalParser {
    /// Parse a raw cell, returning `None` when it is not a finite number
    fn parse(&self, raw: &str) -> Option<f64>;
}

/// Decimal mark used by the input file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DecimalSeparator {
    /// `3.14`
    Period,
    /// `3,14` (a period is still accepted)
    #[default]
    Comma,
}

impl DecimalParser for DecimalSeparator {
    fn parse(&self, raw: &str) -> Option<f64> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        match self {
            DecimalSeparator::Period => parse_finite(trimmed),
            DecimalSeparator::Comma => {
                if trimmed.contains(',') {
                    parse_finite(&trimmed.replace(',', "."))
                } else {
                    parse_finite(trimmed)
                }
            }
        }
    }
}

/// Fallback parser for columns that did not load as numbers
///
/// Strips whitespace and stray quote characters, maps a decimal comma to a
/// period, then parses.
#[derive(Debug, Clone, Copy, Default)]
pub struct LenientParser;

impl DecimalParser for LenientParser {
    fn parse(&self, raw: &str) -> Option<f64> {
        let cleaned: String = raw
            .trim()
            .chars()
            .filter(|c| *c != '"' && *c != '\'')
            .map(|c| if c == ',' { '.' } else { c })
            .collect();
        let cleaned = cleaned.trim();
        if cleaned.is_empty() {
            return None;
        }
        parse_finite(cleaned)
    }
}

/// Rejects `inf`/`NaN` spellings that `f64::from_str` would otherwise accept
fn parse_finite(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Tokens read as a missing value rather than text
pub fn is_missing_token(raw: &str) -> bool {
    matches!(
        raw.trim(),
        "" | "NA" | "N/A" | "NaN" | "nan" | "null" | "NULL" | "None"
    )
}

/// Clean a header name: trim whitespace, drop quote characters
pub fn clean_header(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| *c != '\'' && *c != '"')
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_parser() {
        let p = DecimalSeparator::Period;
        assert_eq!(p.parse("3.25"), Some(3.25));
        assert_eq!(p.parse(" -1e3 "), Some(-1000.0));
        assert_eq!(p.parse("3,25"), None);
        assert_eq!(p.parse(""), None);
    }

    #[test]
    fn test_comma_parser_accepts_both_marks() {
        let p = DecimalSeparator::Comma;
        assert_eq!(p.parse("3,25"), Some(3.25));
        assert_eq!(p.parse("3.25"), Some(3.25));
        assert_eq!(p.parse("1,234.5"), None);
    }

    #[test]
    fn test_non_finite_rejected() {
        assert_eq!(DecimalSeparator::Period.parse("inf"), None);
        assert_eq!(DecimalSeparator::Period.parse("NaN"), None);
        assert_eq!(LenientParser.parse("infinity"), None);
    }

    #[test]
    fn test_lenient_parser_strips_quotes() {
        assert_eq!(LenientParser.parse("\"0,5\""), Some(0.5));
        assert_eq!(LenientParser.parse(" '12' "), Some(12.0));
        assert_eq!(LenientParser.parse("abc"), None);
        assert_eq!(LenientParser.parse("\"\""), None);
    }

    #[test]
    fn test_clean_header() {
        assert_eq!(clean_header("  'Principale1' "), "Principale1");
        assert_eq!(clean_header("\"us\""), "us");
        assert_eq!(clean_header("Colonna 25"), "Colonna 25");
    }

    #[test]
    fn test_missing_tokens() {
        assert!(is_missing_token(""));
        assert!(is_missing_token("  "));
        assert!(is_missing_token("NaN"));
        assert!(!is_missing_token("0"));
        assert!(!is_missing_token("x"));
    }
}
