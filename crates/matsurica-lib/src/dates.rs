//! Dates and times found in activity records.

use chrono::{Datelike, Duration, Local, NaiveDate};
use regex::Captures;

use crate::report_warn;
use crate::reporter::Reporter;
use crate::table::Cell;
use crate::text;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Largest value treated as a spreadsheet serial date.
const SERIAL_LIMIT: f64 = 100_000.0;

/// The schedule of an activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTimeRange {
    pub start_date: String,
    pub start_time: String,
    pub end_date: String,
    pub end_time: String,
}

/// Convert a spreadsheet serial date into a `YYYY-MM-DD` date.
///
/// Numbers, and text which parses as a number, strictly between 0 and 100000
/// are converted. The 1900 date system counts a 29th of February 1900 which
/// never existed, so serials from 60 onwards are shifted back by a day. Every
/// other cell is returned unchanged.
pub fn excel_serial_to_date(cell: &Cell) -> Cell {
    let serial = match cell {
        Cell::Number(number) => Some(*number),
        Cell::Text(text) => text.trim().parse::<f64>().ok(),
        Cell::Empty => None,
    };

    match serial.and_then(serial_date) {
        Some(date) => Cell::Text(date.format(DATE_FORMAT).to_string()),
        None => cell.clone(),
    }
}

fn serial_date(serial: f64) -> Option<NaiveDate> {
    if !(serial > 0.0 && serial < SERIAL_LIMIT) {
        return None;
    }

    let serial = if serial >= 60.0 { serial - 1.0 } else { serial };
    let base = NaiveDate::from_ymd_opt(1900, 1, 1)?;
    base.checked_add_signed(Duration::days((serial - 1.0).floor() as i64))
}

/// Test if the given year, month and day form a real calendar date.
pub fn is_valid_date(year: i32, month: u32, day: u32) -> bool {
    NaiveDate::from_ymd_opt(year, month, day).is_some()
}

/// Interpret a fallback date cell, which is either a `YYYY-MM-DD` or
/// `YYYY/MM/DD` date (optionally followed by a time) or a serial date.
pub fn parse_fallback_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Number(number) => serial_date(*number),
        Cell::Text(text) => {
            let text = text.trim();

            if let Some(c) = regex!(r"^(\d{4})[-/](\d{1,2})[-/](\d{1,2})").captures(text) {
                return NaiveDate::from_ymd_opt(
                    c[1].parse().ok()?,
                    c[2].parse().ok()?,
                    c[3].parse().ok()?,
                );
            }

            serial_date(text.parse().ok()?)
        }
        Cell::Empty => None,
    }
}

/// Extract the schedule of an activity from its free text.
///
/// Looks for a date (`2024/05/01`, `2024-05-01`, `2024年5月1日` or `5月1日`)
/// followed by an optional start time and a range ending in an end time, like
/// `5月1日 10:00～11:30`. Without a range a lone date and time are still
/// picked up. Whatever isn't found is taken from `fallback`, today, or
/// `default_start_time`.
pub fn parse_date_time_range(
    text: Option<&str>,
    fallback: &Cell,
    default_start_time: &str,
    reporter: &dyn Reporter,
) -> DateTimeRange {
    let today = Local::now().date_naive();
    parse_date_time_range_at(text, fallback, default_start_time, today, reporter)
}

pub(crate) fn parse_date_time_range_at(
    text: Option<&str>,
    fallback: &Cell,
    default_start_time: &str,
    today: NaiveDate,
    reporter: &dyn Reporter,
) -> DateTimeRange {
    const DATE1: &str = r"(?P<y>\d{4})\s*(?:[/-]|年)\s*(?P<m>\d{1,2})\s*(?:[/-]|月)\s*(?P<d>\d{1,2})(?:日)?";
    const DATE2: &str = r"(?P<mj>\d{1,2})月(?P<dj>\d{1,2})日";

    let range_re = regex!(&format!(
        r"(?i)(?:{DATE1}|{DATE2}).*?(?:(?P<h1>\d{{1,2}})[:：時](?P<min1>\d{{0,2}}))?\s*[～〜~\-ー−—]\s*(?:(?P<h2>\d{{1,2}})[:：時](?P<min2>\d{{0,2}}))"
    ));
    let west_re = regex!(DATE1);
    let japanese_re = regex!(DATE2);
    let time_re = regex!(r"(?P<h>\d{1,2})[:：時](?P<min>\d{0,2})");

    let fallback_date = parse_fallback_date(fallback);
    let year = fallback_date.unwrap_or(today).year();

    let mut date = None;
    let mut start_time = None;
    let mut end_time = None;

    if let Some(text) = text {
        let text = text::clean_newlines(text);

        if let Some(c) = range_re.captures(&text) {
            date = capture_date(&c, year, reporter);
            start_time = capture_time(&c, "h1", "min1");
            end_time = capture_time(&c, "h2", "min2");
        } else {
            if let Some(c) = west_re.captures(&text) {
                date = capture_date(&c, year, reporter);
            } else if let Some(c) = japanese_re.captures(&text) {
                date = capture_date(&c, year, reporter);
            }

            if let Some(c) = time_re.captures(&text) {
                start_time = capture_time(&c, "h", "min");
            }
        }
    }

    let start_date = date
        .or(fallback_date)
        .unwrap_or(today)
        .format(DATE_FORMAT)
        .to_string();

    let start_time = start_time.unwrap_or_else(|| default_start_time.to_owned());
    let end_time = end_time.unwrap_or_else(|| start_time.clone());

    DateTimeRange {
        end_date: start_date.clone(),
        start_date,
        start_time,
        end_time,
    }
}

/// Build a date out of either the western or the month-day groups.
fn capture_date(c: &Captures<'_>, year: i32, reporter: &dyn Reporter) -> Option<NaiveDate> {
    let number = |name: &str| c.name(name).and_then(|m| m.as_str().parse::<u32>().ok());

    if let (Some(y), Some(m), Some(d)) = (c.name("y"), number("m"), number("d")) {
        let y = y.as_str().parse::<i32>().ok()?;

        if !is_valid_date(y, m, d) {
            report_warn!(reporter, "Ignoring invalid date {y}/{m}/{d}");
            return None;
        }

        return NaiveDate::from_ymd_opt(y, m, d);
    }

    let (m, d) = (number("mj")?, number("dj")?);

    if !is_valid_date(year, m, d) {
        report_warn!(reporter, "Ignoring invalid date {year}年{m}月{d}日");
        return None;
    }

    NaiveDate::from_ymd_opt(year, m, d)
}

/// Format a time out of an hour group and a possibly empty minute group.
fn capture_time(c: &Captures<'_>, hour: &str, minute: &str) -> Option<String> {
    let hour = c.name(hour)?.as_str().parse::<u32>().ok()?;

    let minute = match c.name(minute).map(|m| m.as_str()) {
        Some(m) if !m.is_empty() => m.parse::<u32>().ok()?,
        _ => 0,
    };

    Some(format!("{hour:02}:{minute:02}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::{CollectReporter, Level};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn parse(text: &str, fallback: &Cell) -> (DateTimeRange, usize) {
        let reporter = CollectReporter::new();
        let range = parse_date_time_range_at(Some(text), fallback, "10:00", today(), &reporter);
        (range, reporter.count(Level::Warn))
    }

    fn range(start_date: &str, start_time: &str, end_date: &str, end_time: &str) -> DateTimeRange {
        DateTimeRange {
            start_date: start_date.to_owned(),
            start_time: start_time.to_owned(),
            end_date: end_date.to_owned(),
            end_time: end_time.to_owned(),
        }
    }

    #[test]
    fn serial_dates() {
        assert_eq!(excel_serial_to_date(&Cell::Number(45292.0)), Cell::text("2024-01-01"));
        assert_eq!(excel_serial_to_date(&Cell::Number(45292.75)), Cell::text("2024-01-01"));
        assert_eq!(excel_serial_to_date(&Cell::text("45658")), Cell::text("2025-01-01"));
        assert_eq!(excel_serial_to_date(&Cell::Number(59.0)), Cell::text("1900-02-28"));
        assert_eq!(excel_serial_to_date(&Cell::Number(61.0)), Cell::text("1900-03-01"));
        assert_eq!(excel_serial_to_date(&Cell::Number(1.0)), Cell::text("1900-01-01"));
        assert_eq!(excel_serial_to_date(&Cell::Number(0.0)), Cell::Number(0.0));
        assert_eq!(excel_serial_to_date(&Cell::Number(100000.0)), Cell::Number(100000.0));
        assert_eq!(excel_serial_to_date(&Cell::text("明日")), Cell::text("明日"));
        assert_eq!(excel_serial_to_date(&Cell::Empty), Cell::Empty);
    }

    #[test]
    fn western_range() {
        let (r, warnings) = parse("訪問日時: 2024/05/01 13:30～15:00 商談", &Cell::Empty);
        assert_eq!(r, range("2024-05-01", "13:30", "2024-05-01", "15:00"));
        assert_eq!(warnings, 0);
    }

    #[test]
    fn japanese_range_uses_fallback_year() {
        let (r, _) = parse("5月7日 9時～10時", &Cell::text("2023-12-01"));
        assert_eq!(r, range("2023-05-07", "09:00", "2023-05-07", "10:00"));
    }

    #[test]
    fn range_without_start_time() {
        let (r, _) = parse("2024年5月1日 ～ 17:00", &Cell::Empty);
        assert_eq!(r, range("2024-05-01", "10:00", "2024-05-01", "17:00"));
    }

    #[test]
    fn single_date_and_time() {
        let (r, _) = parse("2024-07-02 14:05 来社", &Cell::Empty);
        assert_eq!(r, range("2024-07-02", "14:05", "2024-07-02", "14:05"));

        let (r, _) = parse("8月3日に訪問", &Cell::Empty);
        assert_eq!(r, range("2024-08-03", "10:00", "2024-08-03", "10:00"));
    }

    #[test]
    fn invalid_date_is_reported() {
        let (r, warnings) = parse("2024/02/30 10:00-11:00", &Cell::text("2024/03/04"));
        assert_eq!(r, range("2024-03-04", "10:00", "2024-03-04", "11:00"));
        assert_eq!(warnings, 1);
    }

    #[test]
    fn defaults() {
        let (r, _) = parse("特記事項なし", &Cell::Number(45292.0));
        assert_eq!(r, range("2024-01-01", "10:00", "2024-01-01", "10:00"));

        let reporter = CollectReporter::new();
        let r = parse_date_time_range_at(None, &Cell::Empty, "09:30", today(), &reporter);
        assert_eq!(r, range("2024-06-15", "09:30", "2024-06-15", "09:30"));
    }

    #[test]
    fn fallback_dates() {
        let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d);
        assert_eq!(parse_fallback_date(&Cell::text("2024/5/1")), date(2024, 5, 1));
        assert_eq!(parse_fallback_date(&Cell::text("2024-05-01 00:00:00")), date(2024, 5, 1));
        assert_eq!(parse_fallback_date(&Cell::text("45292")), date(2024, 1, 1));
        assert_eq!(parse_fallback_date(&Cell::text("先週")), None);
        assert_eq!(parse_fallback_date(&Cell::Empty), None);
    }
}
