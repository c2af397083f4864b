//! Reading and writing of Windows-31J (cp932) encoded CSV files.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use encoding_rs::{EncoderResult, SHIFT_JIS};

use crate::table::{Cell, Table};

/// Read a cp932 encoded CSV file where the first record names the columns.
pub fn read_table(path: &Path) -> Result<Table> {
    let bytes = fs::read(path).with_context(|| path.display().to_string())?;
    parse_table(&bytes).with_context(|| path.display().to_string())
}

/// Parse cp932 encoded CSV data where the first record names the columns.
///
/// A byte order mark switches decoding to the marked encoding.
pub fn parse_table(bytes: &[u8]) -> Result<Table> {
    let (text, encoding, had_errors) = SHIFT_JIS.decode(bytes);

    if had_errors {
        tracing::warn!(encoding = encoding.name(), "Malformed sequences in CSV data");
    }

    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();

    for (n, record) in reader.records().enumerate() {
        let record = record?;

        let row = if n == 0 {
            record.iter().map(Cell::text).collect()
        } else {
            record.iter().map(infer_cell).collect()
        };

        rows.push(row);
    }

    Ok(Table::from_rows(rows))
}

/// Infer the cell for a field, only canonical decimal text becomes a number so
/// that identifiers like `00123` survive.
fn infer_cell(field: &str) -> Cell {
    let trimmed = field.trim();

    if regex!(r"^-?(0|[1-9][0-9]*)(\.[0-9]+)?$").is_match(trimmed) {
        if let Ok(number) = trimmed.parse::<f64>() {
            return Cell::Number(number);
        }
    }

    Cell::text(field)
}

/// Write a table as a cp932 encoded CSV file, header first.
///
/// Characters which cannot be encoded are dropped.
pub fn write_table(path: &Path, table: &Table) -> Result<()> {
    let bytes = to_bytes(table)?;
    fs::write(path, bytes).with_context(|| path.display().to_string())?;
    Ok(())
}

/// Serialize a table into cp932 encoded CSV data.
pub fn to_bytes(table: &Table) -> Result<Vec<u8>> {
    let mut writer = ::csv::WriterBuilder::new()
        .terminator(::csv::Terminator::CRLF)
        .from_writer(Vec::new());

    writer.write_record(table.columns())?;

    for row in table.rows() {
        writer.write_record(row.iter().map(Cell::to_string))?;
    }

    let data = writer.into_inner().map_err(|e| e.into_error())?;
    let text = String::from_utf8(data).context("Serialized CSV is not UTF-8")?;
    Ok(encode_lossy(&text))
}

/// Encode as cp932, skipping characters which have no mapping.
fn encode_lossy(text: &str) -> Vec<u8> {
    let mut encoder = SHIFT_JIS.new_encoder();
    let mut out = Vec::with_capacity(text.len());
    let mut buf = [0u8; 4096];
    let mut input = text;

    loop {
        let (result, read, written) =
            encoder.encode_from_utf8_without_replacement(input, &mut buf, true);
        out.extend_from_slice(&buf[..written]);
        input = &input[read..];

        match result {
            EncoderResult::InputEmpty => break,
            EncoderResult::OutputFull => {}
            EncoderResult::Unmappable(c) => {
                tracing::trace!(?c, "Dropped character without cp932 mapping");
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sjis(text: &str) -> Vec<u8> {
        let (bytes, _, had_errors) = SHIFT_JIS.encode(text);
        assert!(!had_errors);
        bytes.into_owned()
    }

    #[test]
    fn read_infers_numbers() {
        let data = sjis("取引先名,取引先ID,金額\r\n株式会社マツリカ,00123,1500\r\n\"A, B\",7,-2.5\r\n短い\r\n");
        let table = parse_table(&data).unwrap();

        assert_eq!(table.columns(), ["取引先名", "取引先ID", "金額"]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(0, 0), &Cell::text("株式会社マツリカ"));
        assert_eq!(table.get(0, 1), &Cell::text("00123"));
        assert_eq!(table.get(0, 2), &Cell::Number(1500.0));
        assert_eq!(table.get(1, 0), &Cell::text("A, B"));
        assert_eq!(table.get(1, 1), &Cell::Number(7.0));
        assert_eq!(table.get(1, 2), &Cell::Number(-2.5));
        assert_eq!(table.get(2, 1), &Cell::Empty);
    }

    #[test]
    fn write_quotes_and_drops_unmappable() {
        let mut table = Table::new(["名前", "メモ"]);
        table.push_row(vec![Cell::text("マツリカ😀"), Cell::text("a,\"b\"\n改行")]);
        table.push_row(vec![Cell::Number(3.0), Cell::Empty]);

        let bytes = to_bytes(&table).unwrap();
        let (text, _, had_errors) = SHIFT_JIS.decode(&bytes);
        assert!(!had_errors);
        assert_eq!(
            text,
            "名前,メモ\r\nマツリカ,\"a,\"\"b\"\"\n改行\"\r\n3,\r\n"
        );
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("顧客.csv");

        let mut table = Table::new(["取引先名", "件数"]);
        table.push_row(vec![Cell::text("有限会社テスト"), Cell::Number(12.0)]);
        write_table(&path, &table).unwrap();

        assert_eq!(read_table(&path).unwrap(), table);
    }
}
