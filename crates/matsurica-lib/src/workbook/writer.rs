use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use anyhow::{Context, Result};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::table::{Cell, Table};
use crate::xml;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

/// Write a table as a single sheet workbook to the given path.
pub fn write(path: &Path, table: &Table, sheet_name: &str) -> Result<()> {
    let file = File::create(path).with_context(|| path.display().to_string())?;
    let writer = write_to(BufWriter::new(file), table, sheet_name)
        .with_context(|| path.display().to_string())?;
    writer
        .into_inner()
        .map_err(|e| e.into_error())
        .with_context(|| path.display().to_string())?;
    Ok(())
}

/// Write a table as a single sheet workbook to the given writer.
///
/// Text is stored as inline strings, so no shared string table is emitted.
pub fn write_to<W>(writer: W, table: &Table, sheet_name: &str) -> Result<W>
where
    W: Write + Seek,
{
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(writer);

    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(CONTENT_TYPES.as_bytes())?;

    zip.start_file("_rels/.rels", options)?;
    zip.write_all(ROOT_RELS.as_bytes())?;

    zip.start_file("xl/workbook.xml", options)?;
    zip.write_all(workbook_xml(sheet_name).as_bytes())?;

    zip.start_file("xl/_rels/workbook.xml.rels", options)?;
    zip.write_all(WORKBOOK_RELS.as_bytes())?;

    zip.start_file("xl/worksheets/sheet1.xml", options)?;
    zip.write_all(sheet_xml(table).as_bytes())?;

    Ok(zip.finish()?)
}

fn workbook_xml(sheet_name: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
        xml::escape(sheet_name)
    )
}

fn sheet_xml(table: &Table) -> String {
    let mut out = String::new();
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    out.push('\n');
    out.push_str(r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#);

    let header = table
        .columns()
        .iter()
        .map(|c| Cell::text(c.as_str()))
        .collect::<Vec<_>>();

    let rows = std::iter::once(header.as_slice()).chain(table.rows().iter().map(Vec::as_slice));

    for (n, row) in rows.enumerate() {
        let n = n + 1;
        // Writing into a `String` is infallible.
        let _ = write!(out, r#"<row r="{n}">"#);

        for (column, cell) in row.iter().enumerate() {
            let reference = format!("{}{n}", column_name(column));

            match cell {
                Cell::Empty => {}
                Cell::Text(text) => {
                    let _ = write!(
                        out,
                        r#"<c r="{reference}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                        xml::escape(text)
                    );
                }
                Cell::Number(number) => {
                    let _ = write!(out, r#"<c r="{reference}"><v>{number}</v></c>"#);
                }
            }
        }

        out.push_str("</row>");
    }

    out.push_str("</sheetData></worksheet>");
    out
}

/// Convert a zero-based column index into its spreadsheet name, like `AA`.
pub(super) fn column_name(mut index: usize) -> String {
    let mut name = Vec::new();

    loop {
        name.push(b'A' + (index % 26) as u8);

        if index < 26 {
            break;
        }

        index = index / 26 - 1;
    }

    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}
