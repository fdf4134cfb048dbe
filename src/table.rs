//! Row-oriented tables assembled from parallel, named columns.
//!
//! A [`Table`] is validated once at construction: every column must carry the
//! same number of values, names must be unique and non-empty, and count cells
//! must be non-negative. Derived columns are appended with the `with_*`
//! builders, which re-run the same validation.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::analyzers::utility::{mean, pct, round_to};

/// Errors raised while building or querying a [`Table`].
#[derive(Error, Debug, PartialEq)]
pub enum TableError {
    #[error("table has no columns")]
    NoColumns,

    #[error("column at position {0} has an empty name")]
    EmptyName(usize),

    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),

    #[error("column '{column}' has {found} values, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("column '{column}' row {row}: count must be non-negative, got {value}")]
    NegativeCount {
        column: String,
        row: usize,
        value: i64,
    },

    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("column '{column}' row {row} is not numeric")]
    NotNumeric { column: String, row: usize },
}

type Result<T> = core::result::Result<T, TableError>;

/// A single value in a table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Count(i64),
    Number(f64),
    Date(NaiveDate),
    Empty,
}

impl Cell {
    /// Numeric view of the cell. Text cells are parsed, so tables read back
    /// from CSV remain usable for aggregation and charting. NaN and
    /// infinities are not numbers here.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Cell::Count(v) => Some(*v as f64),
            Cell::Number(v) => Some(*v),
            Cell::Text(s) => s.trim().parse::<f64>().ok(),
            Cell::Date(_) | Cell::Empty => None,
        };
        value.filter(|v| v.is_finite())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Count(v) => write!(f, "{v}"),
            Cell::Number(v) => write!(f, "{v}"),
            Cell::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Cell::Empty => Ok(()),
        }
    }
}

/// A named sequence of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    cells: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            cells,
        }
    }

    pub fn text<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            name,
            values.into_iter().map(|v| Cell::Text(v.into())).collect(),
        )
    }

    pub fn counts<I, T>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<i64>,
    {
        Self::new(
            name,
            values.into_iter().map(|v| Cell::Count(v.into())).collect(),
        )
    }

    pub fn numbers<I>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        Self::new(name, values.into_iter().map(Cell::Number).collect())
    }

    pub fn dates<I>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        Self::new(name, values.into_iter().map(Cell::Date).collect())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cells rendered as text, in row order.
    pub fn to_strings(&self) -> Vec<String> {
        self.cells.iter().map(ToString::to_string).collect()
    }
}

/// A borrowed view of one table row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    index: usize,
}

impl<'a> Row<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Cell under the named column, if the column exists.
    pub fn get(&self, column: &str) -> Option<&'a Cell> {
        self.table
            .columns
            .iter()
            .find(|c| c.name == column)
            .map(|c| &c.cells[self.index])
    }

    pub fn cells(&self) -> impl Iterator<Item = &'a Cell> + 'a {
        let index = self.index;
        self.table.columns.iter().map(move |c| &c.cells[index])
    }
}

/// A validated, row-oriented table with named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    /// Builds a table from equal-length columns.
    ///
    /// # Errors
    ///
    /// Returns a [`TableError`] when there are no columns, a name is empty or
    /// repeated, lengths differ, or a count cell is negative.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let first = columns.first().ok_or(TableError::NoColumns)?;
        let rows = first.len();

        for (position, column) in columns.iter().enumerate() {
            if column.name.trim().is_empty() {
                return Err(TableError::EmptyName(position));
            }
            if columns[..position].iter().any(|c| c.name == column.name) {
                return Err(TableError::DuplicateColumn(column.name.clone()));
            }
            if column.len() != rows {
                return Err(TableError::LengthMismatch {
                    column: column.name.clone(),
                    expected: rows,
                    found: column.len(),
                });
            }
            for (row, cell) in column.cells.iter().enumerate() {
                if let Cell::Count(value) = cell {
                    if *value < 0 {
                        return Err(TableError::NegativeCount {
                            column: column.name.clone(),
                            row,
                            value: *value,
                        });
                    }
                }
            }
        }

        Ok(Self { columns, rows })
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| TableError::UnknownColumn(name.to_string()))
    }

    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        (index < self.rows).then_some(Row { table: self, index })
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        (0..self.rows).map(move |index| Row { table: self, index })
    }

    /// Values of a column as `f64`. Empty cells are skipped.
    pub fn numeric_values(&self, name: &str) -> Result<Vec<f64>> {
        let column = self.column(name)?;
        let mut values = Vec::with_capacity(column.len());
        for (row, cell) in column.cells.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            let value = cell.as_f64().ok_or_else(|| TableError::NotNumeric {
                column: name.to_string(),
                row,
            })?;
            values.push(value);
        }
        Ok(values)
    }

    pub fn sum(&self, name: &str) -> Result<f64> {
        Ok(self.numeric_values(name)?.iter().sum())
    }

    pub fn mean(&self, name: &str) -> Result<f64> {
        Ok(mean(&self.numeric_values(name)?))
    }

    pub fn max(&self, name: &str) -> Result<Option<f64>> {
        Ok(self.numeric_values(name)?.into_iter().reduce(f64::max))
    }

    /// Index of the first row holding the column's maximum value.
    pub fn max_row(&self, name: &str) -> Result<Option<usize>> {
        let column = self.column(name)?;
        let mut best: Option<(usize, f64)> = None;
        for (row, cell) in column.cells.iter().enumerate() {
            let Some(value) = cell.as_f64() else {
                continue;
            };
            if best.is_none_or(|(_, b)| value > b) {
                best = Some((row, value));
            }
        }
        Ok(best.map(|(row, _)| row))
    }

    /// A new table holding only the named columns, in the order given.
    pub fn select(&self, names: &[&str]) -> Result<Table> {
        let columns = names
            .iter()
            .map(|name| self.column(name).cloned())
            .collect::<Result<Vec<_>>>()?;
        Table::from_columns(columns)
    }

    /// A new table holding the rows for which `keep` returns `true`, in the
    /// original order.
    pub fn filter<F>(&self, keep: F) -> Table
    where
        F: Fn(&Row<'_>) -> bool,
    {
        let kept: Vec<usize> = self
            .rows()
            .filter(|row| keep(row))
            .map(|row| row.index)
            .collect();

        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                cells: kept.iter().map(|&i| c.cells[i].clone()).collect(),
            })
            .collect();

        Table {
            columns,
            rows: kept.len(),
        }
    }

    /// Appends a column, validating it against the existing shape.
    pub fn with_column(self, column: Column) -> Result<Table> {
        let mut columns = self.columns;
        columns.push(column);
        Table::from_columns(columns)
    }

    /// `numerator / denominator` per row, rounded to two places. A zero
    /// denominator yields `0.0`.
    pub fn with_ratio(self, name: &str, numerator: &str, denominator: &str) -> Result<Table> {
        let num = self.strict_values(numerator)?;
        let den = self.strict_values(denominator)?;
        let ratios = num
            .iter()
            .zip(&den)
            .map(|(n, d)| if *d == 0.0 { 0.0 } else { round_to(n / d, 2) });
        let column = Column::numbers(name, ratios);
        self.with_column(column)
    }

    /// Each row's share of the column total, as a percentage with one decimal.
    pub fn with_share_of_total(self, name: &str, source: &str) -> Result<Table> {
        let values = self.strict_values(source)?;
        let total: f64 = values.iter().sum();
        let shares = values.iter().map(|v| round_to(pct(*v, total), 1));
        let column = Column::numbers(name, shares);
        self.with_column(column)
    }

    /// Cumulative sum of a count column.
    pub fn with_running_total(self, name: &str, source: &str) -> Result<Table> {
        let values = self.strict_values(source)?;
        let totals: Vec<i64> = values
            .iter()
            .scan(0.0, |acc, v| {
                *acc += v;
                Some(*acc as i64)
            })
            .collect();
        let column = Column::counts(name, totals);
        self.with_column(column)
    }

    /// Percentage change from the previous row, one decimal. The first row and
    /// rows following a zero are left empty.
    pub fn with_pct_change(self, name: &str, source: &str) -> Result<Table> {
        let values = self.strict_values(source)?;
        let mut cells = Vec::with_capacity(values.len());
        cells.push(Cell::Empty);
        for pair in values.windows(2) {
            let (prev, curr) = (pair[0], pair[1]);
            if prev == 0.0 {
                cells.push(Cell::Empty);
            } else {
                cells.push(Cell::Number(round_to((curr - prev) / prev * 100.0, 1)));
            }
        }
        cells.truncate(values.len());
        let column = Column::new(name, cells);
        self.with_column(column)
    }

    /// Row-wise sum of several count columns.
    pub fn with_sum(self, name: &str, sources: &[&str]) -> Result<Table> {
        let series = sources
            .iter()
            .map(|s| self.strict_values(s))
            .collect::<Result<Vec<_>>>()?;
        let totals: Vec<i64> = (0..self.rows)
            .map(|row| series.iter().map(|s| s[row]).sum::<f64>() as i64)
            .collect();
        let column = Column::counts(name, totals);
        self.with_column(column)
    }

    /// One `f64` per row; any non-numeric or empty cell is an error.
    fn strict_values(&self, name: &str) -> Result<Vec<f64>> {
        let column = self.column(name)?;
        column
            .cells
            .iter()
            .enumerate()
            .map(|(row, cell)| {
                cell.as_f64().ok_or_else(|| TableError::NotNumeric {
                    column: name.to_string(),
                    row,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_columns(vec![
            Column::text("Station", ["Panchavati PS", "Bhadrakali PS", "Ambad PS"]),
            Column::counts("Personnel", [180, 150, 70]),
            Column::counts("Vehicles", [6u32, 5, 0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_from_columns_rejects_length_mismatch() {
        let err = Table::from_columns(vec![
            Column::text("Date", ["Aug 27", "Aug 28"]),
            Column::counts("Crowd", [50000, 20000, 22000]),
        ])
        .unwrap_err();

        assert_eq!(
            err,
            TableError::LengthMismatch {
                column: "Crowd".to_string(),
                expected: 2,
                found: 3,
            }
        );
    }

    #[test]
    fn test_from_columns_rejects_negative_count() {
        let err = Table::from_columns(vec![Column::counts("Personnel", [500, -1])]).unwrap_err();
        assert!(matches!(err, TableError::NegativeCount { row: 1, value: -1, .. }));
    }

    #[test]
    fn test_from_columns_rejects_bad_names() {
        assert_eq!(Table::from_columns(vec![]).unwrap_err(), TableError::NoColumns);

        let err = Table::from_columns(vec![Column::text(" ", ["x"])]).unwrap_err();
        assert_eq!(err, TableError::EmptyName(0));

        let err = Table::from_columns(vec![
            Column::text("Zone", ["a"]),
            Column::text("Zone", ["b"]),
        ])
        .unwrap_err();
        assert_eq!(err, TableError::DuplicateColumn("Zone".to_string()));
    }

    #[test]
    fn test_row_access_preserves_order() {
        let table = sample();
        let stations: Vec<String> = table
            .rows()
            .map(|r| r.get("Station").unwrap().to_string())
            .collect();
        assert_eq!(stations, ["Panchavati PS", "Bhadrakali PS", "Ambad PS"]);
        assert!(table.row(3).is_none());
    }

    #[test]
    fn test_summary_statistics() {
        let table = sample();
        assert_eq!(table.sum("Personnel").unwrap(), 400.0);
        assert_eq!(table.max("Personnel").unwrap(), Some(180.0));
        assert_eq!(table.max_row("Personnel").unwrap(), Some(0));
        assert!((table.mean("Personnel").unwrap() - 133.333).abs() < 1e-3);
        assert!(matches!(
            table.sum("Station"),
            Err(TableError::NotNumeric { row: 0, .. })
        ));
    }

    #[test]
    fn test_select_and_filter() {
        let table = sample();
        let picked = table.select(&["Personnel", "Station"]).unwrap();
        assert_eq!(picked.headers(), ["Personnel", "Station"]);

        let busy = table.filter(|r| r.get("Personnel").and_then(Cell::as_f64) > Some(100.0));
        assert_eq!(busy.row_count(), 2);
        assert_eq!(busy.column("Station").unwrap().to_strings()[1], "Bhadrakali PS");

        assert_eq!(
            table.select(&["Missing"]).unwrap_err(),
            TableError::UnknownColumn("Missing".to_string())
        );
    }

    #[test]
    fn test_derived_columns() {
        let table = sample()
            .with_share_of_total("Share", "Personnel")
            .unwrap()
            .with_running_total("Cumulative", "Personnel")
            .unwrap()
            .with_ratio("Per_Vehicle", "Personnel", "Vehicles")
            .unwrap()
            .with_sum("Total", &["Personnel", "Vehicles"])
            .unwrap();

        assert_eq!(table.column("Share").unwrap().to_strings(), ["45", "37.5", "17.5"]);
        assert_eq!(
            table.column("Cumulative").unwrap().to_strings(),
            ["180", "330", "400"]
        );
        assert_eq!(table.column("Per_Vehicle").unwrap().to_strings(), ["30", "30", "0"]);
        assert_eq!(table.column("Total").unwrap().to_strings(), ["186", "155", "70"]);
    }

    #[test]
    fn test_pct_change_leaves_first_row_empty() {
        let table = Table::from_columns(vec![Column::counts("Households", [9000, 9300, 4650])])
            .unwrap()
            .with_pct_change("Growth", "Households")
            .unwrap();

        let growth = table.column("Growth").unwrap();
        assert!(growth.cells()[0].is_empty());
        assert_eq!(growth.cells()[1], Cell::Number(3.3));
        assert_eq!(growth.cells()[2], Cell::Number(-50.0));
    }

    #[test]
    fn test_text_cells_parse_as_numbers() {
        assert_eq!(Cell::Text(" 42 ".into()).as_f64(), Some(42.0));
        assert_eq!(Cell::Text("Godaghat".into()).as_f64(), None);
    }

    #[test]
    fn test_non_finite_values_are_not_numeric() {
        for text in ["NaN", "inf", "-inf", "infinity"] {
            assert_eq!(Cell::Text(text.into()).as_f64(), None, "{text}");
        }
        assert_eq!(Cell::Number(f64::NAN).as_f64(), None);

        let table = Table::from_columns(vec![Column::text("Crowd", ["10", "NaN"])]).unwrap();
        assert!(matches!(
            table.numeric_values("Crowd"),
            Err(TableError::NotNumeric { row: 1, .. })
        ));
    }
}
