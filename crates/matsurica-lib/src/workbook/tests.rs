use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use super::*;
use crate::reporter::{CollectReporter, Level};

/// Build an archive out of raw parts.
fn archive(parts: &[(&str, &str)]) -> Cursor<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    for (name, data) in parts {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(data.as_bytes()).unwrap();
    }

    let mut cursor = zip.finish().unwrap();
    cursor.set_position(0);
    cursor
}

const WORKBOOK_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets>
<sheet name="集計" sheetId="1" r:id="rId1"/>
<sheet name="明細データ" sheetId="2" r:id="rId2"/>
</sheets>
</workbook>"#;

const RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Target="worksheets/sheet1.xml" Type="worksheet"/>
<Relationship Id="rId2" Target="/xl/worksheets/detail.xml" Type="worksheet"/>
</Relationships>"#;

const SHARED_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="4" uniqueCount="4">
<si><t>No</t></si>
<si><t>活動先</t><rPh sb="0" eb="3"><t>カツドウサキ</t></rPh></si>
<si><r><t>株式会社</t></r><r><t xml:space="preserve">マツリカ</t></r></si>
<si><t>A &amp; B</t></si>
</sst>"#;

const DETAIL_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<sheetData>
<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c></row>
<row r="2"><c r="A2"><v>1</v></c><c r="B2" t="s"><v>2</v></c><c r="D2" t="inlineStr"><is><t>inline</t></is></c></row>
<row r="3"><c r="A3"><v>2.5</v></c><c r="B3" t="s"><v>99</v></c><c r="C3" t="b"><v>1</v></c></row>
</sheetData>
</worksheet>"#;

#[test]
fn reads_named_sheet_through_relationships() {
    let reporter = CollectReporter::new();

    let data = archive(&[
        ("xl/workbook.xml", WORKBOOK_XML),
        ("xl/_rels/workbook.xml.rels", RELS_XML),
        ("xl/sharedStrings.xml", SHARED_XML),
        ("xl/worksheets/sheet1.xml", "<worksheet><sheetData/></worksheet>"),
        ("xl/worksheets/detail.xml", DETAIL_XML),
    ]);

    let mut workbook = Workbook::new(data, &reporter).unwrap();

    assert_eq!(
        workbook.shared_strings(),
        ["No", "活動先", "株式会社マツリカ", "A & B"]
    );
    assert_eq!(workbook.sheets().len(), 2);
    assert_eq!(workbook.sheets()[1].part, "xl/worksheets/detail.xml");

    let (table, sheet) = workbook.sheet_table(DETAIL_SHEET, &reporter).unwrap();
    assert_eq!(sheet.name, DETAIL_SHEET);
    assert_eq!(table.columns(), ["No", "活動先", "", ""]);
    assert_eq!(table.len(), 2);

    assert_eq!(table.get(0, 0), &Cell::Number(1.0));
    assert_eq!(table.get(0, 1), &Cell::text("株式会社マツリカ"));
    assert_eq!(table.get(0, 2), &Cell::Empty);
    assert_eq!(table.get(0, 3), &Cell::text("inline"));
    assert_eq!(table.get(1, 0), &Cell::Number(2.5));
    assert_eq!(table.get(1, 1), &Cell::text("STRING_99"));
    assert_eq!(table.get(1, 2), &Cell::text("TRUE"));

    assert_eq!(reporter.count(Level::Warn), 0);
}

#[test]
fn falls_back_to_first_sheet() {
    let reporter = CollectReporter::new();

    let data = archive(&[
        ("xl/workbook.xml", WORKBOOK_XML),
        ("xl/worksheets/sheet1.xml", DETAIL_XML),
    ]);

    let mut workbook = Workbook::new(data, &reporter).unwrap();

    // Without relationships parts are derived from the sheet id.
    assert_eq!(workbook.sheets()[0].part, "xl/worksheets/sheet1.xml");

    let (_, sheet) = workbook.sheet_table("存在しない", &reporter).unwrap();
    assert_eq!(sheet.name, "集計");
    assert_eq!(reporter.count(Level::Warn), 1);
}

#[test]
fn falls_back_to_worksheet_parts() {
    let reporter = CollectReporter::new();

    let data = archive(&[
        ("xl/worksheets/sheet10.xml", "<worksheet/>"),
        ("xl/worksheets/sheet2.xml", DETAIL_XML),
    ]);

    let workbook = Workbook::new(data, &reporter).unwrap();
    let sheet = workbook.resolve_sheet(DETAIL_SHEET, &reporter).unwrap();
    assert_eq!(sheet.part, "xl/worksheets/sheet2.xml");
}

#[test]
fn no_sheets_is_an_error() {
    let reporter = CollectReporter::new();
    let data = archive(&[("docProps/app.xml", "<Properties/>")]);
    let workbook = Workbook::new(data, &reporter).unwrap();
    let error = workbook.resolve_sheet(DETAIL_SHEET, &reporter).unwrap_err();
    assert!(matches!(
        error.downcast_ref::<WorkbookError>(),
        Some(WorkbookError::NoSheets)
    ));
}

#[test]
fn malformed_sheet_uses_patterns() {
    let reporter = CollectReporter::new();

    // A part truncated in the middle of a tag.
    let broken = r#"<worksheet><sheetData>
<row r="1"><c r="A1" t="s"><v>0</v></c><c r="C1" t="inlineStr"><is><t>x</t></is></c></row>
<row r="2"><c r="A2"/><c r="B2"><v>42</v></c></row>
<row r="3"><c r="A3"#;

    let data = archive(&[
        ("xl/sharedStrings.xml", SHARED_XML),
        ("xl/worksheets/sheet1.xml", broken),
    ]);

    let mut workbook = Workbook::new(data, &reporter).unwrap();
    let sheet = workbook.resolve_sheet(DETAIL_SHEET, &reporter).unwrap();
    let rows = workbook.sheet_rows(&sheet, &reporter).unwrap();

    assert_eq!(
        rows,
        [
            vec![Cell::text("No"), Cell::Empty, Cell::text("x")],
            vec![Cell::Empty, Cell::Number(42.0)],
        ]
    );

    // Missing workbook part, fallback part selection and the malformed sheet.
    assert_eq!(reporter.count(Level::Warn), 3);
}

#[test]
fn unrecoverable_sheet_is_reported() {
    let reporter = CollectReporter::new();

    let broken = r#"<worksheet><sheetData><row r="1"><c r="A1"#;
    let data = archive(&[("xl/worksheets/sheet1.xml", broken)]);

    let mut workbook = Workbook::new(data, &reporter).unwrap();
    let sheet = workbook.resolve_sheet(DETAIL_SHEET, &reporter).unwrap();
    let rows = workbook.sheet_rows(&sheet, &reporter).unwrap();

    assert!(rows.is_empty());
    assert_eq!(reporter.count(Level::Error), 1);
}

#[test]
fn malformed_shared_strings_use_patterns() {
    let reporter = CollectReporter::new();

    let broken = r#"<sst>
<si><t>No</t></si>
<si><t>活動先</t><rPh sb="0" eb="3"><t>カツドウサキ</t></rPh></si>
<si><t>A &amp; B</t></si>
<si><t xml:space="pre"#;

    let data = archive(&[
        ("xl/sharedStrings.xml", broken),
        ("xl/worksheets/sheet1.xml", DETAIL_XML),
    ]);

    let mut workbook = Workbook::new(data, &reporter).unwrap();
    assert_eq!(workbook.shared_strings(), ["No", "活動先", "A & B"]);

    let messages = reporter.take();
    assert_eq!(messages[0].level, Level::Warn);
    assert!(
        messages[0].text.contains(SHARED_STRINGS),
        "{}",
        messages[0].text
    );

    let sheet = workbook.resolve_sheet(DETAIL_SHEET, &reporter).unwrap();
    let rows = workbook.sheet_rows(&sheet, &reporter).unwrap();
    assert_eq!(rows[0], [Cell::text("No"), Cell::text("活動先")]);
    assert_eq!(rows[1][1], Cell::text("A & B"));
}

#[test]
fn out_of_range_references_are_appended() {
    let reporter = CollectReporter::new();

    let intact = r#"<worksheet><sheetData>
<row r="1"><c r="A1"><v>1</v></c><c r="ZZZZZZZ1"><v>2</v></c><c r="C1"><v>3</v></c></row>
</sheetData></worksheet>"#;

    // Truncated, so the pattern reader sees the same reference.
    let broken = r#"<worksheet><sheetData>
<row r="1"><c r="A1"><v>1</v></c><c r="XFE1"><v>2</v></c></row>
<row r="2"><c r="A2"#;

    let data = archive(&[
        ("xl/worksheets/sheet1.xml", intact),
        ("xl/worksheets/sheet2.xml", broken),
    ]);

    let mut workbook = Workbook::new(data, &reporter).unwrap();

    let entry = SheetEntry {
        name: String::from("1"),
        part: String::from("xl/worksheets/sheet1.xml"),
    };

    let rows = workbook.sheet_rows(&entry, &reporter).unwrap();
    assert_eq!(
        rows,
        [vec![Cell::Number(1.0), Cell::Number(2.0), Cell::Number(3.0)]]
    );

    let entry = SheetEntry {
        name: String::from("2"),
        part: String::from("xl/worksheets/sheet2.xml"),
    };

    let rows = workbook.sheet_rows(&entry, &reporter).unwrap();
    assert_eq!(rows, [vec![Cell::Number(1.0), Cell::Number(2.0)]]);
}

#[test]
fn writer_output_reads_back() {
    let reporter = CollectReporter::new();

    let mut table = Table::new(["名前", "値", "備考"]);
    table.push_row(vec![
        Cell::text("<株式会社 & マツリカ>"),
        Cell::Number(3.0),
    ]);
    table.push_row(vec![Cell::Empty, Cell::Number(0.25), Cell::text("改行\nあり")]);

    let mut cursor = writer::write_to(Cursor::new(Vec::new()), &table, "一覧").unwrap();
    cursor.set_position(0);

    let mut workbook = Workbook::new(cursor, &reporter).unwrap();
    let (read, sheet) = workbook.sheet_table("一覧", &reporter).unwrap();

    assert_eq!(sheet.name, "一覧");
    assert_eq!(read, table);
}

#[test]
fn column_references() {
    assert_eq!(sheet::column_index("A1"), Some(0));
    assert_eq!(sheet::column_index("Z9"), Some(25));
    assert_eq!(sheet::column_index("AA10"), Some(26));
    assert_eq!(sheet::column_index("AZ1"), Some(51));
    assert_eq!(sheet::column_index("12"), None);
    assert_eq!(sheet::column_index("XFD1"), Some(sheet::MAX_COLUMNS - 1));
    assert_eq!(sheet::column_index("XFE1"), None);
    assert_eq!(sheet::column_index("ZZZZZZZ1"), None);

    for index in [0, 25, 26, 51, 52, 701, 702] {
        let name = writer::column_name(index);
        assert_eq!(sheet::column_index(&name), Some(index), "{name}");
    }
}
