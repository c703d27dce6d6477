// Observation tables loaded from delimited exports
//
// A table is a rectangular set of named columns whose cells are numbers, text
// or missing. Row order carries no meaning for any computation in this crate.
//
// Column typing follows what spreadsheet/dataframe exports produce: a column is
// numeric when it has at least one number and none of its cells is text. Text
// columns can be coerced later with a lenient parser; cells that still fail
// become missing and are counted in a `CoercionReport`.

mod loader;
mod parse;

pub use loader::TableLoader;
pub use parse::{clean_header, is_missing_token, DecimalParser, DecimalSeparator, LenientParser};

use crate::error::{DevianceError, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// A single table cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Missing,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Numeric view of the cell; anything that is not a number reads as NaN
    pub fn as_f64(&self) -> f64 {
        match self {
            Cell::Number(v) => *v,
            _ => f64::NAN,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// Canonical string form used to compare group labels
    ///
    /// Text is trimmed; integral numbers drop their fractional part so that a
    /// label read as `3` or `3.0` compares equal. Missing or blank labels
    /// return `None`.
    pub fn label(&self) -> Option<String> {
        match self {
            Cell::Missing => None,
            Cell::Number(v) if v.is_nan() => None,
            Cell::Number(v) => {
                if v.fract() == 0.0 && v.abs() < 1e15 {
                    Some(format!("{}", *v as i64))
                } else {
                    Some(format!("{}", v))
                }
            }
            Cell::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
        }
    }
}

/// A named column of cells
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            cells,
        }
    }

    /// Build a numeric column; NaN values become missing cells
    pub fn numeric(name: impl Into<String>, values: &[f64]) -> Self {
        let cells = values
            .iter()
            .map(|v| {
                if v.is_nan() {
                    Cell::Missing
                } else {
                    Cell::Number(*v)
                }
            })
            .collect();
        Self::new(name, cells)
    }

    /// Build a text column; blank strings stay as (blank) text
    pub fn text<S: AsRef<str>>(name: impl Into<String>, values: &[S]) -> Self {
        let cells = values
            .iter()
            .map(|v| Cell::Text(v.as_ref().to_string()))
            .collect();
        Self::new(name, cells)
    }

    /// A column is numeric when it holds at least one number and no text
    ///
    /// Columns with only missing cells (a trailing delimiter, a blank
    /// metadata column) carry no measurements and are not numeric.
    pub fn is_numeric(&self) -> bool {
        self.cells.iter().any(|c| matches!(c, Cell::Number(_)))
            && !self.cells.iter().any(|c| matches!(c, Cell::Text(_)))
    }

    pub fn values(&self) -> Vec<f64> {
        self.cells.iter().map(Cell::as_f64).collect()
    }
}

/// Count of cells per column that failed numeric parsing and were dropped
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CoercionReport {
    pub dropped: BTreeMap<String, usize>,
}

impl CoercionReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record dropped cells for a column (zero counts are ignored)
    pub fn record(&mut self, column: &str, dropped: usize) {
        if dropped > 0 {
            *self.dropped.entry(column.to_string()).or_insert(0) += dropped;
        }
    }

    pub fn merge(&mut self, other: &CoercionReport) {
        for (column, count) in &other.dropped {
            self.record(column, *count);
        }
    }

    pub fn total(&self) -> usize {
        self.dropped.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.dropped.is_empty()
    }
}

/// Column-major observation table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    /// Build a table from columns of equal length
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let rows = columns.first().map(|c| c.cells.len()).unwrap_or(0);
        if let Some(bad) = columns.iter().find(|c| c.cells.len() != rows) {
            return Err(DevianceError::Config(format!(
                "column '{}' has {} rows, expected {}",
                bad.name,
                bad.cells.len(),
                rows
            )));
        }
        Ok(Self { columns, rows })
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn is_numeric_column(&self, name: &str) -> bool {
        self.column(name).is_some_and(Column::is_numeric)
    }

    /// Names of numeric columns, in table order
    pub fn numeric_column_names(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.is_numeric())
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Values of a column as f64 (non-numbers read as NaN)
    pub fn numeric_values(&self, name: &str) -> Option<Vec<f64>> {
        self.column(name).map(Column::values)
    }

    /// Canonical labels of a column, one per row
    pub fn labels(&self, name: &str) -> Option<Vec<Option<String>>> {
        self.column(name)
            .map(|c| c.cells.iter().map(Cell::label).collect())
    }

    /// New table holding only the rows for which `keep(row_index)` is true
    pub fn filter_rows<F>(&self, keep: F) -> Table
    where
        F: Fn(usize) -> bool,
    {
        let kept: Vec<usize> = (0..self.rows).filter(|&i| keep(i)).collect();
        let columns = self
            .columns
            .iter()
            .map(|c| {
                let cells = kept.iter().map(|&i| c.cells[i].clone()).collect();
                Column::new(c.name.clone(), cells)
            })
            .collect();
        Table {
            columns,
            rows: kept.len(),
        }
    }

    /// Drop rows whose label in `group_col` is missing or blank
    pub fn retain_labeled(&self, group_col: &str) -> Result<Table> {
        let labels = self
            .labels(group_col)
            .ok_or_else(|| DevianceError::MissingGroupColumn {
                column: group_col.to_string(),
            })?;
        Ok(self.filter_rows(|i| labels[i].is_some()))
    }

    /// Convert a text column to numbers in place
    ///
    /// Returns the number of text cells that could not be parsed and became
    /// missing. Numeric columns and unknown names are left alone.
    pub fn coerce_numeric(&mut self, name: &str, parser: &dyn DecimalParser) -> usize {
        let Some(column) = self.column_mut(name) else {
            return 0;
        };
        let mut dropped = 0;
        for cell in column.cells.iter_mut() {
            if let Cell::Text(raw) = cell {
                *cell = match parser.parse(raw) {
                    Some(v) => Cell::Number(v),
                    None => {
                        if !is_missing_token(raw) {
                            dropped += 1;
                        }
                        Cell::Missing
                    }
                };
            }
        }
        dropped
    }
}
