//! In-memory tables shared between the workbook and CSV readers.

use std::collections::HashMap;
use std::fmt;

use crate::text;

static EMPTY: Cell = Cell::Empty;

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    /// Construct a text cell, where the empty string becomes [`Cell::Empty`].
    pub fn text<S>(value: S) -> Self
    where
        S: Into<String>,
    {
        let value = value.into();

        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value)
        }
    }

    /// Test if the cell is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Access the cell as text, if it is text.
    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Access the cell as a number, if it is a number.
    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(number) => Some(*number),
            _ => None,
        }
    }

    /// Test if two non-empty cells are of the same kind.
    pub(crate) fn same_kind(&self, other: &Cell) -> bool {
        matches!(
            (self, other),
            (Cell::Text(..), Cell::Text(..)) | (Cell::Number(..), Cell::Number(..))
        )
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(text) => text.fmt(f),
            Cell::Number(number) => {
                if number.fract() == 0.0 && number.abs() < 1e15 {
                    write!(f, "{}", *number as i64)
                } else {
                    number.fmt(f)
                }
            }
        }
    }
}

/// A table with named columns.
///
/// Every row holds exactly one cell per column.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Construct an empty table with the given columns.
    pub fn new<I>(columns: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Construct a table where the first row supplies the column names.
    ///
    /// Rows wider than the header widen the table with unnamed columns.
    pub fn from_rows(mut rows: Vec<Vec<Cell>>) -> Self {
        if rows.is_empty() {
            return Self::default();
        }

        let header = rows.remove(0);
        let width = rows.iter().map(Vec::len).fold(header.len(), usize::max);

        let mut columns = header.iter().map(Cell::to_string).collect::<Vec<_>>();
        columns.resize(width, String::new());

        let mut table = Self {
            columns,
            rows: Vec::with_capacity(rows.len()),
        };

        for row in rows {
            table.push_row(row);
        }

        table
    }

    /// Column names.
    #[inline]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All rows.
    #[inline]
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Test if the table has no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns.
    #[inline]
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Push a row, padding or truncating it to the width of the table.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Empty);
        self.rows.push(row);
    }

    /// Get the cell at the given row and column, out of range cells are
    /// empty.
    pub fn get(&self, row: usize, column: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|row| row.get(column))
            .unwrap_or(&EMPTY)
    }

    /// Get the cell at the given row in an optional column, where a missing
    /// column reads as empty.
    pub fn cell(&self, row: usize, column: Option<usize>) -> &Cell {
        match column {
            Some(column) => self.get(row, column),
            None => &EMPTY,
        }
    }

    /// Mutable access to the given column of every row.
    pub fn column_mut(&mut self, column: usize) -> impl Iterator<Item = &mut Cell> {
        self.rows.iter_mut().filter_map(move |row| row.get_mut(column))
    }

    /// Mutable access to every cell.
    pub fn cells_mut(&mut self) -> impl Iterator<Item = &mut Cell> {
        self.rows.iter_mut().flatten()
    }

    /// Index of the first column with exactly the given name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Find the first column which matches one of the given names exactly,
    /// falling back to the column at `fallback` if it is in range.
    pub fn find_column(&self, names: &[&str], fallback: Option<usize>) -> Option<usize> {
        for name in names {
            if let Some(index) = self.column_index(name) {
                return Some(index);
            }
        }

        fallback.filter(|&index| index < self.columns.len())
    }

    /// Append a column with the given values, one per row.
    pub fn push_column<I>(&mut self, name: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = Cell>,
    {
        self.columns.push(name.into());

        let mut values = values.into_iter();

        for row in &mut self.rows {
            row.push(values.next().unwrap_or(Cell::Empty));
        }
    }

    /// Replace the column names, keeping rows consistent with the new width.
    pub fn set_columns(&mut self, columns: Vec<String>) {
        self.columns = columns;

        for row in &mut self.rows {
            row.resize(self.columns.len(), Cell::Empty);
        }
    }

    /// Drop the first `n` rows.
    pub fn drain_front(&mut self, n: usize) {
        let n = n.min(self.rows.len());
        self.rows.drain(..n);
    }

    /// Keep only the rows at the given indexes, in the order given.
    pub fn select(&self, indexes: &[usize]) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: indexes
                .iter()
                .filter_map(|&index| self.rows.get(index).cloned())
                .collect(),
        }
    }
}

/// Lookup of columns by their normalized label.
pub struct ColumnLookup {
    lookup: HashMap<String, usize>,
}

impl ColumnLookup {
    /// Build a lookup from column names. The first column wins when several
    /// normalize to the same label.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut lookup = HashMap::new();

        for (index, column) in columns.into_iter().enumerate() {
            let normalized = text::normalize_column_label(column.as_ref());

            if !normalized.is_empty() {
                lookup.entry(normalized).or_insert(index);
            }
        }

        Self { lookup }
    }

    /// Resolve the first alias which is present, returning the index of its
    /// column.
    pub fn resolve(&self, aliases: &[&str]) -> Option<usize> {
        for alias in aliases {
            let normalized = text::normalize_column_label(alias);

            if normalized.is_empty() {
                continue;
            }

            if let Some(&index) = self.lookup.get(&normalized) {
                return Some(index);
            }
        }

        None
    }
}

#[test]
fn test_cell_display() {
    assert_eq!(Cell::Number(12.0).to_string(), "12");
    assert_eq!(Cell::Number(-3.0).to_string(), "-3");
    assert_eq!(Cell::Number(1.5).to_string(), "1.5");
    assert_eq!(Cell::text("").to_string(), "");
    assert!(Cell::text("").is_empty());
    assert_eq!(Cell::Number(1.5).as_number(), Some(1.5));
    assert_eq!(Cell::text("x").as_number(), None);
}

#[test]
fn test_from_rows() {
    let table = Table::from_rows(vec![
        vec![Cell::text("a"), Cell::text("b")],
        vec![Cell::Number(1.0)],
        vec![Cell::Number(1.0), Cell::Number(2.0), Cell::text("extra")],
    ]);

    assert_eq!(table.columns(), ["a", "b", ""]);
    assert_eq!(table.len(), 2);
    assert_eq!(table.get(0, 1), &Cell::Empty);
    assert_eq!(table.get(1, 2), &Cell::text("extra"));
    assert_eq!(table.get(5, 5), &Cell::Empty);
    assert_eq!(table.cell(1, Some(2)), &Cell::text("extra"));
    assert_eq!(table.cell(1, None), &Cell::Empty);
}

#[test]
fn test_find_column() {
    let table = Table::new(["No", "活動先", "活動日"]);
    assert_eq!(table.find_column(&["日付", "活動日"], Some(0)), Some(2));
    assert_eq!(table.find_column(&["日付"], Some(1)), Some(1));
    assert_eq!(table.find_column(&["日付"], Some(7)), None);
    assert_eq!(table.find_column(&["日付"], None), None);
}

#[test]
fn test_column_lookup() {
    let lookup = ColumnLookup::new(["取引先ID（必須）", "取引先名", "取引先名(必須)"]);
    assert_eq!(lookup.resolve(&["取引先名(必須)", "顧客名"]), Some(1));
    assert_eq!(lookup.resolve(&["取引先ID(必須)"]), Some(0));
    assert_eq!(lookup.resolve(&["会社名"]), None);
}
