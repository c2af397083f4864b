//! Action bodies and action types derived from activity records.

use crate::table::Cell;
use crate::text;

/// Body used when an activity has no usable content.
pub const UNKNOWN_BODY: &str = "\"内容不明\"";

/// Marker after which the actual activity content follows.
const CONTENT_MARKER: &str = "■活動内容";

/// Characters stripped from the start of a body.
const LEADING_PUNCTUATION: &str = "、。,.・:：;；!！?？\"'「」『』【】[]()（）";

const MAIL_WORDS: &[&str] = &["送付", "返信", "メール", "送信", "添付", "cc", "エビデンス", "提出"];
const PHONE_WORDS: &[&str] = &["架電", "折返", "通話", "連絡", "コール", "電話"];
const OUTSIDE_WORDS: &[&str] = &[
    "現調",
    "立会",
    "設置",
    "納品",
    "リモート設定",
    "現地",
    "フィールド",
    "調整",
];
const INSIDE_WORDS: &[&str] = &["見積", "資料作成", "社内", "mtg", "整理", "手配", "稟議", "準備"];

/// Extract the body of an action from the content of an activity.
///
/// Only text following `■活動内容` is kept when the marker is present, and
/// management headings such as `■記入者` are removed along with blank lines.
pub fn extract_action_body(cell: &Cell) -> String {
    let Some(content) = cell.as_text() else {
        return UNKNOWN_BODY.to_owned();
    };

    let content = text::clean_newlines(content);

    let body = match content.split_once(CONTENT_MARKER) {
        Some((_, after)) => after.trim(),
        None => content.as_str(),
    };

    let heading = regex!(
        r"^\s*■\s*(記入者|訪問日時|日時|提案機種|訪問者|販売店|訪問相手|顧客情報|活動ステージ)\s*[:：]?\s*$"
    );

    let body = body
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty() && !heading.is_match(line))
        .collect::<Vec<_>>()
        .join("\n");

    let mut body = body.trim();

    while let Some(rest) = body.strip_prefix(|c: char| LEADING_PUNCTUATION.contains(c)) {
        body = rest.trim();
    }

    let body = text::to_sjis_safe(body);

    if body.is_empty() {
        return UNKNOWN_BODY.to_owned();
    }

    body
}

/// Decide the action type of an activity.
///
/// Face to face activities are meetings. Otherwise the activity kind gives a
/// first guess, which keywords in the free text override.
pub fn decide_action_type(method: &Cell, kind: &Cell, free_text: &Cell) -> &'static str {
    let method = method.to_string();
    let kind = kind.to_string();
    let (method, kind) = (method.trim(), kind.trim());
    let free_text = free_text.to_string().to_lowercase();

    if method == "対面" || kind == "対面" {
        return "面談";
    }

    let mut action = "社外タスク";

    if kind.contains("電話") {
        action = "電話";
    } else if kind.contains("メール") {
        action = "メール";
    } else if kind.contains("会議") || kind.to_lowercase().contains("mtg") {
        action = "社内タスク";
    }

    let mentions = |words: &[&str]| words.iter().any(|w| free_text.contains(w));

    if mentions(MAIL_WORDS) {
        action = "メール";
    } else if mentions(PHONE_WORDS) {
        action = "電話";
    } else if mentions(OUTSIDE_WORDS) {
        action = "社外タスク";
    } else if mentions(INSIDE_WORDS) {
        action = "社内タスク";
    }

    action
}

#[test]
fn test_extract_action_body() {
    let body = |s: &str| extract_action_body(&Cell::text(s));

    assert_eq!(
        body("■記入者：山田\n■訪問日時\n2024/5/1\n■活動内容\n：新機種の提案を実施。_x000D_\r\n\r\n  次回は見積提出  \n"),
        "新機種の提案を実施。\n次回は見積提出"
    );

    assert_eq!(
        body("■訪問者:\n  「ご挨拶」に伺った\n\n■顧客情報\n担当者変更"),
        "ご挨拶」に伺った\n担当者変更"
    );

    assert_eq!(body("■活動内容\n■記入者"), UNKNOWN_BODY);
    assert_eq!(body("。、"), UNKNOWN_BODY);
    assert_eq!(body("絵文字😀あり"), "絵文字?あり");
    assert_eq!(extract_action_body(&Cell::Empty), UNKNOWN_BODY);
    assert_eq!(extract_action_body(&Cell::Number(3.0)), UNKNOWN_BODY);
}

#[test]
fn test_decide_action_type() {
    let t = |method: &str, kind: &str, free: &str| {
        decide_action_type(&Cell::text(method), &Cell::text(kind), &Cell::text(free))
    };

    assert_eq!(t("対面", "電話", "メール送付"), "面談");
    assert_eq!(t("", " 対面 ", ""), "面談");
    assert_eq!(t("", "電話", ""), "電話");
    assert_eq!(t("", "メール", ""), "メール");
    assert_eq!(t("", "定例MTG", ""), "社内タスク");
    assert_eq!(t("", "電話", "資料を送付"), "メール");
    assert_eq!(t("", "", "折返しの連絡"), "電話");
    assert_eq!(t("", "会議", "現地確認"), "社外タスク");
    assert_eq!(t("", "", "見積作成"), "社内タスク");
    assert_eq!(t("", "", "CCで共有"), "メール");
    assert_eq!(t("", "", "訪問"), "社外タスク");
    assert_eq!(
        decide_action_type(&Cell::Empty, &Cell::Empty, &Cell::Empty),
        "社外タスク"
    );
}
