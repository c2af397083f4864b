//! Reading and writing of `.xlsx` workbooks.
//!
//! Workbooks are read straight out of the archive, which means damaged files
//! that office suites refuse to open can often still be salvaged.

mod fallback;
mod sheet;
mod writer;

#[cfg(test)]
mod tests;

pub use self::writer::write;

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use anyhow::{Context, Result};
use relative_path::RelativePath;
use thiserror::Error;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::reporter::Reporter;
use crate::table::{Cell, Table};
use crate::xml::{self, Output};
use crate::{report_error, report_info, report_warn};

const SHARED_STRINGS: &str = "xl/sharedStrings.xml";
const WORKBOOK: &str = "xl/workbook.xml";
const WORKBOOK_RELS: &str = "xl/_rels/workbook.xml.rels";
const WORKSHEETS: &str = "xl/worksheets/";

/// Name of the sheet which holds activity details.
pub const DETAIL_SHEET: &str = "明細データ";

/// Error raised when a workbook lacks what we need from it.
#[derive(Debug, Error)]
pub enum WorkbookError {
    #[error("No worksheets found in workbook")]
    NoSheets,
    #[error("Worksheet part `{0}` is missing from the archive")]
    MissingPart(String),
}

/// A sheet declared by the workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetEntry {
    /// Display name of the sheet.
    pub name: String,
    /// Archive path of the worksheet part.
    pub part: String,
}

/// An opened workbook.
pub struct Workbook<R> {
    archive: ZipArchive<R>,
    shared_strings: Vec<String>,
    sheets: Vec<SheetEntry>,
}

impl Workbook<BufReader<File>> {
    /// Open the workbook at the given path.
    pub fn open(path: &Path, reporter: &dyn Reporter) -> Result<Self> {
        let file = File::open(path).with_context(|| path.display().to_string())?;
        Self::new(BufReader::new(file), reporter).with_context(|| path.display().to_string())
    }
}

impl<R> Workbook<R>
where
    R: Read + Seek,
{
    /// Open a workbook from the given reader.
    pub fn new(reader: R, reporter: &dyn Reporter) -> Result<Self> {
        let mut archive = ZipArchive::new(reader).context("Opening workbook archive")?;

        let shared_strings = match read_part(&mut archive, SHARED_STRINGS)? {
            Some(data) => match parse_shared_strings(&data) {
                Ok(strings) => strings,
                Err(error) => {
                    report_warn!(
                        reporter,
                        "Malformed {SHARED_STRINGS} ({error}), extracting strings by pattern"
                    );
                    fallback::shared_strings(&data)
                }
            },
            None => {
                report_info!(reporter, "No shared string table in workbook");
                Vec::new()
            }
        };

        let sheets = match read_part(&mut archive, WORKBOOK)? {
            Some(data) => {
                let rels = match read_part(&mut archive, WORKBOOK_RELS)? {
                    Some(rels) => parse_relationships(&rels).context(WORKBOOK_RELS)?,
                    None => Vec::new(),
                };

                parse_sheets(&data, &rels).context(WORKBOOK)?
            }
            None => {
                report_warn!(reporter, "No {WORKBOOK} in archive");
                Vec::new()
            }
        };

        for sheet in &sheets {
            tracing::debug!(name = %sheet.name, part = %sheet.part, "Found sheet");
        }

        Ok(Self {
            archive,
            shared_strings,
            sheets,
        })
    }

    /// Sheets declared by the workbook, in workbook order.
    pub fn sheets(&self) -> &[SheetEntry] {
        &self.sheets
    }

    /// Shared strings of the workbook.
    pub fn shared_strings(&self) -> &[String] {
        &self.shared_strings
    }

    /// Resolve which worksheet part to read for the given sheet name.
    ///
    /// Prefers the named sheet, then the first declared sheet, then the first
    /// worksheet part found in the archive.
    pub fn resolve_sheet(&self, name: &str, reporter: &dyn Reporter) -> Result<SheetEntry> {
        if let Some(sheet) = self.sheets.iter().find(|s| s.name == name) {
            return Ok(sheet.clone());
        }

        if let Some(sheet) = self.sheets.first() {
            report_warn!(
                reporter,
                "Sheet `{name}` not found, using first sheet `{}`",
                sheet.name
            );
            return Ok(sheet.clone());
        }

        let mut parts = self
            .archive
            .file_names()
            .filter(|n| n.starts_with(WORKSHEETS) && n.ends_with(".xml"))
            .map(str::to_owned)
            .collect::<Vec<_>>();

        parts.sort_by_key(|part| part_order(part));

        let part = parts.into_iter().next().ok_or(WorkbookError::NoSheets)?;
        report_warn!(reporter, "Sheet `{name}` not found, using part `{part}`");

        Ok(SheetEntry {
            name: name.to_owned(),
            part,
        })
    }

    /// Read the raw rows of the given sheet.
    pub fn sheet_rows(
        &mut self,
        sheet: &SheetEntry,
        reporter: &dyn Reporter,
    ) -> Result<Vec<Vec<Cell>>> {
        let data = read_part(&mut self.archive, &sheet.part)?
            .ok_or_else(|| WorkbookError::MissingPart(sheet.part.clone()))?;

        match sheet::parse(&data, &self.shared_strings) {
            Ok(rows) => Ok(rows),
            Err(error) => {
                report_warn!(
                    reporter,
                    "Malformed worksheet `{}` ({error}), extracting values by pattern",
                    sheet.part
                );

                let rows = fallback::parse(&data, &self.shared_strings);

                if rows.is_empty() {
                    report_error!(
                        reporter,
                        "No rows could be recovered from worksheet `{}`",
                        sheet.part
                    );
                }

                Ok(rows)
            }
        }
    }

    /// Read the given sheet as a table, where the first row names the
    /// columns.
    pub fn sheet_table(
        &mut self,
        name: &str,
        reporter: &dyn Reporter,
    ) -> Result<(Table, SheetEntry)> {
        let sheet = self.resolve_sheet(name, reporter)?;
        let rows = self.sheet_rows(&sheet, reporter)?;
        report_info!(
            reporter,
            "Read {} rows from sheet `{}`",
            rows.len(),
            sheet.name
        );
        Ok((Table::from_rows(rows), sheet))
    }
}

/// Order worksheet parts numerically, so that `sheet2.xml` sorts before
/// `sheet10.xml`.
fn part_order(part: &str) -> (u32, String) {
    let digits = part
        .trim_start_matches(WORKSHEETS)
        .chars()
        .filter(char::is_ascii_digit)
        .collect::<String>();

    (digits.parse().unwrap_or(u32::MAX), part.to_owned())
}

/// Read a part of the archive into a string, `None` if it doesn't exist.
fn read_part<R>(archive: &mut ZipArchive<R>, name: &str) -> Result<Option<String>>
where
    R: Read + Seek,
{
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(error) => return Err(error).with_context(|| name.to_owned()),
    };

    let mut data = Vec::new();
    file.read_to_end(&mut data).with_context(|| name.to_owned())?;
    Ok(Some(String::from_utf8_lossy(&data).into_owned()))
}

/// Parse the shared string table.
///
/// Every `<si>` contributes one string, made up of all of its text runs.
/// Phonetic guides (`<rPh>`) are skipped.
pub(crate) fn parse_shared_strings(input: &str) -> Result<Vec<String>> {
    let mut reader = xml::Reader::new(input);
    let mut strings = Vec::new();
    let mut current = None::<String>;
    let mut phonetic = 0usize;
    let mut in_text = false;

    loop {
        match reader.next()? {
            Output::Open("si") => {
                current = Some(String::new());
            }
            Output::Open("rPh") => {
                phonetic += 1;
            }
            Output::Open("t") => {
                in_text = true;
            }
            Output::Text(text) if in_text && phonetic == 0 => {
                if let Some(current) = &mut current {
                    current.push_str(&xml::unescape(text));
                }
            }
            Output::Close("t") => {
                in_text = false;
            }
            Output::Close("rPh") => {
                phonetic = phonetic.saturating_sub(1);
            }
            Output::Close("si") => {
                strings.extend(current.take());
            }
            Output::Eof => break,
            _ => {}
        }
    }

    Ok(strings)
}

/// A relationship declared in a `.rels` part.
#[derive(Debug, Default)]
pub(crate) struct Relationship {
    pub(crate) id: String,
    pub(crate) target: String,
}

pub(crate) fn parse_relationships(input: &str) -> Result<Vec<Relationship>> {
    let mut reader = xml::Reader::new(input);
    let mut rels = Vec::new();
    let mut current = None::<Relationship>;

    loop {
        match reader.next()? {
            Output::Open("Relationship") => {
                current = Some(Relationship::default());
            }
            Output::Attribute(name, value) => {
                if let Some(current) = &mut current {
                    match name {
                        "Id" => current.id = xml::unescape(value).into_owned(),
                        "Target" => current.target = xml::unescape(value).into_owned(),
                        _ => {}
                    }
                }
            }
            Output::Close("Relationship") => {
                rels.extend(current.take());
            }
            Output::Eof => break,
            _ => {}
        }
    }

    Ok(rels)
}

/// Parse sheet declarations from the workbook part, resolving their worksheet
/// parts through the workbook relationships.
pub(crate) fn parse_sheets(input: &str, rels: &[Relationship]) -> Result<Vec<SheetEntry>> {
    #[derive(Default)]
    struct Builder {
        name: String,
        sheet_id: String,
        rel_id: String,
    }

    let mut reader = xml::Reader::new(input);
    let mut sheets = Vec::new();
    let mut current = None::<Builder>;

    loop {
        match reader.next()? {
            Output::Open("sheet") => {
                current = Some(Builder::default());
            }
            Output::Attribute(name, value) => {
                if let Some(current) = &mut current {
                    match name {
                        "name" => current.name = xml::unescape(value).into_owned(),
                        "sheetId" => current.sheet_id = value.to_owned(),
                        "id" => current.rel_id = value.to_owned(),
                        _ => {}
                    }
                }
            }
            Output::Close("sheet") => {
                let Some(b) = current.take() else {
                    continue;
                };

                let part = match rels.iter().find(|r| r.id == b.rel_id) {
                    Some(rel) => resolve_target(&rel.target),
                    None => format!("{WORKSHEETS}sheet{}.xml", b.sheet_id),
                };

                sheets.push(SheetEntry { name: b.name, part });
            }
            Output::Eof => break,
            _ => {}
        }
    }

    Ok(sheets)
}

/// Resolve a relationship target relative to the `xl/` directory.
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_owned(),
        None => RelativePath::new("xl").join_normalized(target).into_string(),
    }
}
