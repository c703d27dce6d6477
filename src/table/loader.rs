use crate::config::DevianceConfig;
use crate::error::{DevianceError, Result};
use crate::table::parse::{clean_header, is_missing_token, DecimalParser, DecimalSeparator};
use crate::table::{Cell, Column, Table};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Reads delimited text files into a [`Table`]
///
/// # Example
/// ```
/// use deviance_engine::table::{DecimalSeparator, TableLoader};
///
/// let loader = TableLoader::new(',', DecimalSeparator::Comma);
/// let table = loader
///     .load_str("us, Principale1\n12, \"0,5\"\n8, \"-0,5\"\n")
///     .unwrap();
/// assert_eq!(table.numeric_values("Principale1"), Some(vec![0.5, -0.5]));
/// assert_eq!(table.row_count(), 2);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TableLoader {
    delimiter: char,
    decimal: DecimalSeparator,
}

impl TableLoader {
    pub fn new(delimiter: char, decimal: DecimalSeparator) -> Self {
        Self { delimiter, decimal }
    }

    pub fn from_config(config: &DevianceConfig) -> Self {
        Self::new(config.delimiter, config.decimal)
    }

    /// Load a table from a file on disk
    pub fn load_path<P: AsRef<Path>>(&self, path: P) -> Result<Table> {
        let content = fs::read_to_string(path.as_ref())?;
        let table = self.load_str(&content)?;
        debug!(
            path = %path.as_ref().display(),
            rows = table.row_count(),
            columns = table.column_count(),
            "loaded table"
        );
        Ok(table)
    }

    /// Load a table from any reader
    pub fn load_reader<R: Read>(&self, mut reader: R) -> Result<Table> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        self.load_str(&content)
    }

    /// Load a table from in-memory text
    pub fn load_str(&self, content: &str) -> Result<Table> {
        let content = skip_initial_space(content, self.delimiter);
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter_byte()?)
            .has_headers(true)
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers = dedupe_headers(reader.headers()?.iter().map(clean_header).collect());
        let mut cells: Vec<Vec<Cell>> = vec![Vec::new(); headers.len()];

        for (index, record) in reader.records().enumerate() {
            let record = record?;
            // A lone blank field is a stray empty line, unless the table has one column
            if headers.len() > 1
                && record.len() == 1
                && record.get(0).is_some_and(|f| f.trim().is_empty())
            {
                continue;
            }
            if record.len() != headers.len() {
                return Err(DevianceError::RaggedRow {
                    row: index + 2,
                    expected: headers.len(),
                    found: record.len(),
                });
            }
            for (column, field) in cells.iter_mut().zip(record.iter()) {
                column.push(self.parse_cell(field));
            }
        }

        Table::from_columns(
            headers
                .into_iter()
                .zip(cells)
                .map(|(name, cells)| Column::new(name, cells))
                .collect(),
        )
    }

    /// Type a single raw field
    pub fn parse_cell(&self, raw: &str) -> Cell {
        if is_missing_token(raw) {
            return Cell::Missing;
        }
        match self.decimal.parse(raw) {
            Some(v) => Cell::Number(v),
            None => Cell::Text(raw.trim().to_string()),
        }
    }

    fn delimiter_byte(&self) -> Result<u8> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| {
                DevianceError::Config(format!(
                    "delimiter must be a single ASCII character, got {:?}",
                    self.delimiter
                ))
            })
    }
}

/// Drop spaces and tabs that directly follow a delimiter outside quotes
///
/// The csv reader only recognizes a quoted field when the quote is its first
/// byte, so `a, "1,5"` would otherwise split inside the quotes.
fn skip_initial_space(content: &str, delimiter: char) -> Cow<'_, str> {
    let needs_pass = content
        .as_bytes()
        .windows(2)
        .any(|w| w[0] == delimiter as u8 && (w[1] == b' ' || w[1] == b'\t'));
    if !needs_pass {
        return Cow::Borrowed(content);
    }

    let mut out = String::with_capacity(content.len());
    let mut in_quotes = false;
    let mut after_delimiter = false;
    for ch in content.chars() {
        if after_delimiter && (ch == ' ' || ch == '\t') {
            continue;
        }
        after_delimiter = false;
        if ch == '"' {
            in_quotes = !in_quotes;
        } else if ch == delimiter && !in_quotes {
            after_delimiter = true;
        }
        out.push(ch);
    }
    Cow::Owned(out)
}

/// Disambiguate repeated header names as `name.1`, `name.2`, ...
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    headers
        .into_iter()
        .map(|name| {
            let count = seen.entry(name.clone()).or_insert(0);
            let unique = if *count == 0 {
                name.clone()
            } else {
                format!("{}.{}", name, count)
            };
            *count += 1;
            unique
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_initial_space_outside_quotes_only() {
        let out = skip_initial_space("a, \"x, y\",  b", ',');
        assert_eq!(out, "a,\"x, y\",b");
    }

    #[test]
    fn test_skip_initial_space_borrows_when_clean() {
        assert!(matches!(skip_initial_space("a,b\n1,2", ','), Cow::Borrowed(_)));
    }

    #[test]
    fn test_dedupe_headers() {
        let out = dedupe_headers(vec!["a".into(), "b".into(), "a".into(), "a".into()]);
        assert_eq!(out, vec!["a", "b", "a.1", "a.2"]);
    }

    #[test]
    fn test_non_ascii_delimiter_rejected() {
        let loader = TableLoader::new('§', DecimalSeparator::Period);
        assert!(matches!(
            loader.load_str("a§b\n1§2\n"),
            Err(DevianceError::Config(_))
        ));
    }
}
