//! Text normalization shared by the conversion steps.

use encoding_rs::SHIFT_JIS;
use unicode_normalization::UnicodeNormalization;

use crate::kana;

/// Replacement used for characters which have no Windows-31J encoding.
const REPLACEMENT: char = '?';

/// Test if the whole string can be encoded as Windows-31J (cp932).
pub fn is_sjis_encodable(s: &str) -> bool {
    let (_, _, had_errors) = SHIFT_JIS.encode(s);
    !had_errors
}

/// Make a string safe for a Windows-31J encoded file by replacing every
/// character which cannot be represented with `?`.
pub fn to_sjis_safe(s: &str) -> String {
    if is_sjis_encodable(s) {
        return s.to_owned();
    }

    let mut out = String::with_capacity(s.len());
    let mut buf = [0; 4];

    for c in s.chars() {
        if is_sjis_encodable(c.encode_utf8(&mut buf)) {
            out.push(c);
        } else {
            out.push(REPLACEMENT);
        }
    }

    out
}

/// Normalize line endings and strip control characters.
///
/// Spreadsheet exports encode carriage returns as the literal `_x000D_`
/// escape, which is dropped as well.
pub fn clean_newlines(s: &str) -> String {
    let s = s.replace("_x000D_", "");
    let s = s.replace("\r\n", "\n").replace('\r', "\n");
    s.chars().filter(|&c| !is_stripped_control(c)).collect()
}

fn is_stripped_control(c: char) -> bool {
    matches!(c, '\x00'..='\x08' | '\x0b' | '\x0c' | '\x0e'..='\x1f' | '\x7f')
}

/// Normalize a column label so that differently written headers compare
/// equal.
///
/// Width is folded through NFKC, bracketed annotations such as `(必須)` are
/// removed, and so are whitespace and separators.
pub fn normalize_column_label(label: &str) -> String {
    let text = label.nfkc().collect::<String>();
    let text = regex!(r"[（(][^）)]*[）)]").replace_all(&text, "");
    let text = text.replace("必須", "");

    text.chars()
        .filter(|&c| !is_label_separator(c))
        .collect::<String>()
        .trim()
        .to_owned()
}

fn is_label_separator(c: char) -> bool {
    c.is_whitespace()
        || matches!(
            c,
            '\u{3000}'
                | ':'
                | '_'
                | '：'
                | '・'
                | '･'
                | '／'
                | '/'
                | '、'
                | '，'
                | ','
                | '.'
                | '-'
        )
}

/// Normalize a company name for fuzzy containment matching.
///
/// Legal entity markers, punctuation and digits are dropped, latin script is
/// lowercased and katakana is folded into hiragana. Returns an empty string
/// for blank input.
pub fn normalize_company(s: &str) -> String {
    if s.trim().is_empty() {
        return String::new();
    }

    let t = s.nfkc().collect::<String>();
    let t = regex!(
        r"(?i)(株式会社|（株）|\(株\)|㈱|有限会社|合同会社|合名会社|合資会社|Co\.,?\s*Ltd\.?|Corporation|Company|Inc\.?)"
    )
    .replace_all(&t, "");
    let t = regex!(r#"[ \t\u{3000}‐\-–—・/／.,，、()\[\]{}<>『』「」”"'’`･_＋\\+]+"#)
        .replace_all(&t, "");
    let t = regex!(r"[0-9０-９]+").replace_all(&t, "");
    kana::to_hiragana(&t.to_lowercase())
}

#[test]
fn test_to_sjis_safe() {
    assert_eq!(to_sjis_safe("株式会社マツリカ"), "株式会社マツリカ");
    assert_eq!(to_sjis_safe("①②"), "①②");
    assert_eq!(to_sjis_safe("a😀b"), "a?b");
    assert_eq!(to_sjis_safe(""), "");
}

#[test]
fn test_clean_newlines() {
    assert_eq!(clean_newlines("a_x000D_\r\nb\rc\n"), "a\nb\nc\n");
    assert_eq!(clean_newlines("x\x01y\x7f\tz"), "xy\tz");
}

#[test]
fn test_normalize_column_label() {
    assert_eq!(normalize_column_label("取引先名(必須)"), "取引先名");
    assert_eq!(normalize_column_label("取引先名（必須）"), "取引先名");
    assert_eq!(
        normalize_column_label("顧客区分（管理番号:19103）"),
        normalize_column_label("顧客区分（管理番号：19103）")
    );
    assert_eq!(normalize_column_label("顧客区分（管理番号:19103）"), "顧客区分");
    assert_eq!(normalize_column_label("ＭＡ部・支援 担当"), "MA部支援担当");
    assert_eq!(normalize_column_label("顧客ID"), "顧客ID");
    assert_eq!(normalize_column_label("(必須)"), "");
    assert_eq!(normalize_column_label("名前(未閉"), "名前(未閉");
}

#[test]
fn test_normalize_company() {
    assert_eq!(normalize_company("株式会社マツリカ"), "まつりか");
    assert_eq!(normalize_company("㈱マツリカ"), "まつりか");
    assert_eq!(normalize_company("（株）マツリカ 東京支店"), "まつりか東京支店");
    assert_eq!(normalize_company("Acme Co., Ltd."), "acme");
    assert_eq!(normalize_company("ACME Inc."), "acme");
    assert_eq!(normalize_company("第2営業部"), "第営業部");
    assert_eq!(normalize_company("ｱｸﾒ"), "あくめ");
    assert_eq!(normalize_company("   "), "");
}
