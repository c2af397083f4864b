//! Pattern based extraction for worksheet parts which aren't well-formed XML.

use crate::table::Cell;
use crate::xml;

use super::sheet::{self, CellType};

/// Extract rows from a damaged worksheet part.
///
/// Cells are matched by pattern, so this works on truncated or otherwise
/// broken markup as long as individual rows are intact.
pub(super) fn parse(input: &str, shared_strings: &[String]) -> Vec<Vec<Cell>> {
    let row_re = regex!(r"(?s)<row\b[^>]*>(.*?)</row>");
    let cell_re = regex!(r"(?s)<c\b([^>]*?)(?:/>|>(.*?)</c>)");
    let value_re = regex!(r"(?s)<v[^>]*>(.*?)</v>");
    let inline_re = regex!(r"(?s)<t[^>]*>(.*?)</t>");
    let type_re = regex!(r#"\bt="([^"]*)""#);
    let ref_re = regex!(r#"\br="([A-Za-z]+[0-9]*)""#);

    let mut rows = Vec::new();

    for row_match in row_re.captures_iter(input) {
        let mut row = Vec::new();

        for cell_match in cell_re.captures_iter(&row_match[1]) {
            let attributes = &cell_match[1];
            let body = cell_match.get(2).map_or("", |m| m.as_str());

            let ty = type_re
                .captures(attributes)
                .map(|c| CellType::parse(&c[1]))
                .unwrap_or_default();

            let column = ref_re
                .captures(attributes)
                .and_then(|c| sheet::column_index(&c[1]));

            let value = match ty {
                CellType::Inline => inline_re.captures(body),
                _ => value_re.captures(body),
            };

            let cell = match value {
                Some(value) => sheet::to_cell(ty, &xml::unescape(&value[1]), shared_strings),
                None => Cell::Empty,
            };

            sheet::place(&mut row, column, cell);
        }

        rows.push(row);
    }

    rows
}

/// Extract the shared string table from a damaged part.
pub(super) fn shared_strings(input: &str) -> Vec<String> {
    let si_re = regex!(r"(?s)<si>(.*?)</si>");
    let phonetic_re = regex!(r"(?s)<rPh\b.*?</rPh>");
    let text_re = regex!(r"(?s)<t[^>]*>(.*?)</t>");

    let mut strings = Vec::new();

    for si in si_re.captures_iter(input) {
        let body = phonetic_re.replace_all(&si[1], "");
        let mut string = String::new();

        for t in text_re.captures_iter(&body) {
            string.push_str(&xml::unescape(&t[1]));
        }

        strings.push(string);
    }

    strings
}
