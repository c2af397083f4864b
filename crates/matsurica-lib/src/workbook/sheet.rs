use anyhow::Result;

use crate::table::Cell;
use crate::xml::{self, Output};

/// The declared type of a cell.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(super) enum CellType {
    /// A number, the default when no type is declared.
    #[default]
    Number,
    /// Index into the shared string table.
    Shared,
    /// String stored inside the cell.
    Inline,
    /// Result of a string formula.
    Formula,
    Boolean,
    Error,
    /// ISO 8601 date.
    Date,
}

impl CellType {
    pub(super) fn parse(value: &str) -> Self {
        match value {
            "s" => CellType::Shared,
            "inlineStr" => CellType::Inline,
            "str" => CellType::Formula,
            "b" => CellType::Boolean,
            "e" => CellType::Error,
            "d" => CellType::Date,
            _ => CellType::Number,
        }
    }
}

/// Convert the raw value of a cell into a [`Cell`].
pub(super) fn to_cell(ty: CellType, value: &str, shared_strings: &[String]) -> Cell {
    match ty {
        CellType::Shared => {
            let string = value
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|index| shared_strings.get(index));

            match string {
                Some(string) => Cell::text(string.as_str()),
                None => Cell::text(format!("STRING_{value}")),
            }
        }
        CellType::Boolean => match value.trim() {
            "1" => Cell::text("TRUE"),
            "0" => Cell::text("FALSE"),
            other => Cell::text(other),
        },
        CellType::Number => match value.trim().parse::<f64>() {
            Ok(number) if !value.trim().is_empty() => Cell::Number(number),
            _ => Cell::text(value),
        },
        CellType::Inline | CellType::Formula | CellType::Error | CellType::Date => {
            Cell::text(value)
        }
    }
}

/// Number of columns a worksheet can have, `A` through `XFD`.
pub(super) const MAX_COLUMNS: usize = 16384;

/// Convert a cell reference such as `AB12` into a zero-based column index.
///
/// References beyond the last worksheet column are rejected.
pub(super) fn column_index(reference: &str) -> Option<usize> {
    let mut index = 0usize;
    let mut any = false;

    for c in reference.chars() {
        if !c.is_ascii_alphabetic() {
            break;
        }

        let digit = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        index = index.checked_mul(26)?.checked_add(digit)?;
        any = true;

        if index > MAX_COLUMNS {
            return None;
        }
    }

    if !any {
        return None;
    }

    Some(index - 1)
}

/// Place a cell into the row, honoring its reference when it has one.
pub(super) fn place(row: &mut Vec<Cell>, column: Option<usize>, cell: Cell) {
    let column = match column {
        Some(column) if column >= row.len() => column,
        _ => row.len(),
    };

    row.resize(column, Cell::Empty);
    row.push(cell);
}

#[derive(Default)]
struct CellBuilder {
    column: Option<usize>,
    ty: CellType,
    value: Option<String>,
}

/// Parse the rows of a worksheet part.
pub(super) fn parse(input: &str, shared_strings: &[String]) -> Result<Vec<Vec<Cell>>> {
    let mut reader = xml::Reader::new(input);

    let mut rows = Vec::new();
    let mut row = None::<Vec<Cell>>;
    let mut cell = None::<CellBuilder>;
    let mut element = "";
    let mut collecting = false;

    loop {
        let output = reader.next()?;

        match output {
            Output::Open(name) => {
                element = name;

                match name {
                    "row" => {
                        row = Some(Vec::new());
                    }
                    "c" => {
                        cell = Some(CellBuilder::default());
                    }
                    // Text runs inside of phonetic guides are not part of the value.
                    "v" | "t" if !reader.path().as_str().contains("rPh") => {
                        if let Some(cell) = &mut cell {
                            cell.value.get_or_insert_with(String::new);
                            collecting = true;
                        }
                    }
                    _ => {}
                }
            }
            Output::Attribute(name, value) if element == "c" => {
                if let Some(cell) = &mut cell {
                    match name {
                        "r" => cell.column = column_index(value),
                        "t" => cell.ty = CellType::parse(value),
                        _ => {}
                    }
                }
            }
            Output::Text(text) if collecting => {
                if let Some(value) = cell.as_mut().and_then(|c| c.value.as_mut()) {
                    value.push_str(&xml::unescape(text));
                }
            }
            Output::Close(name) => match name {
                "v" | "t" => {
                    collecting = false;
                }
                "c" => {
                    let (Some(row), Some(c)) = (&mut row, cell.take()) else {
                        continue;
                    };

                    let value = match &c.value {
                        Some(value) => to_cell(c.ty, value, shared_strings),
                        None => Cell::Empty,
                    };

                    place(row, c.column, value);
                }
                "row" => {
                    rows.extend(row.take());
                }
                _ => {}
            },
            Output::Eof => break,
            _ => {}
        }
    }

    Ok(rows)
}
