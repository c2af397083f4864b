//! Conversion of weekly activity workbooks into Mazrica customer action
//! import files.

/// Compile a built-in regular expression once and hand out a static
/// reference to it.
macro_rules! regex {
    ($pattern:expr) => {{
        static RE: ::std::sync::OnceLock<::regex::Regex> = ::std::sync::OnceLock::new();
        RE.get_or_init(|| ::regex::Regex::new($pattern).expect("built-in pattern is valid"))
    }};
}

pub mod reporter;

pub mod config;

mod dirs;
pub use self::dirs::Dirs;

pub mod kana;

pub mod text;

pub mod table;
pub use self::table::{Cell, ColumnLookup, Table};

pub mod xml;

pub mod workbook;
pub use self::workbook::Workbook;

pub mod csv;

pub mod dates;

pub mod header;

pub mod matching;

pub mod action;

pub mod output;

pub mod pipeline;

pub mod hosting;
