//! Construction of the customer action import table.

use std::collections::HashMap;

use crate::action;
use crate::config::ConvertConfig;
use crate::dates;
use crate::matching::{
    CUSTOMER_ID_ALIASES, CUSTOMER_MA_SUPPORT_ALIASES, MATCHED_ID_COLUMN, MATCHED_NAME_COLUMN,
};
use crate::reporter::Reporter;
use crate::table::{Cell, ColumnLookup, Table};
use crate::text;

/// Columns of the import format, in order.
pub const TEMPLATE_COLUMNS: [&str; 12] = [
    "取引先ID(必須)",
    "アクション種別(必須)",
    "開始日(必須)",
    "開始時間(必須)",
    "終了日(必須)",
    "終了時間(必須)",
    "主担当者(必須)",
    "他の担当者",
    "事前メモ",
    "実施結果",
    "ステータス(必須)",
    "アクションコンタクト(コンタクトID)",
];

/// Activity columns used to build actions, resolved by name or position.
struct ActivityColumns {
    customer_name: Option<usize>,
    customer_id: Option<usize>,
    method: Option<usize>,
    kind: Option<usize>,
    body: Option<usize>,
    date: Option<usize>,
}

impl ActivityColumns {
    fn resolve(activity: &Table) -> Self {
        Self {
            customer_name: activity.find_column(&[MATCHED_NAME_COLUMN, "活動先"], Some(2)),
            customer_id: activity.find_column(&[MATCHED_ID_COLUMN], None),
            method: activity.find_column(&["方法", "活動方法", "訪問方法"], Some(4)),
            kind: activity.find_column(&["活動種別", "カテゴリ", "行動種別"], Some(10)),
            body: activity.find_column(&["活動内容", "実施内容", "内容", "備考"], Some(11)),
            date: activity.find_column(&["日付", "活動日", "訪問日"], Some(7)),
        }
    }
}

/// Customer support contacts keyed by customer id.
struct Owners<'a> {
    customers: &'a Table,
    support: Option<usize>,
    by_id: HashMap<String, usize>,
}

impl<'a> Owners<'a> {
    fn new(customers: &'a Table) -> Self {
        let lookup = ColumnLookup::new(customers.columns());
        let support = lookup.resolve(CUSTOMER_MA_SUPPORT_ALIASES);
        let mut by_id = HashMap::new();

        if let Some(id) = lookup.resolve(CUSTOMER_ID_ALIASES) {
            for row in 0..customers.len() {
                let key = customers.get(row, id).to_string().trim().to_owned();

                if !key.is_empty() {
                    by_id.entry(key).or_insert(row);
                }
            }
        }

        Self {
            customers,
            support,
            by_id,
        }
    }

    /// The support contact of the given customer, if any.
    fn get(&self, id: &str) -> Option<String> {
        let row = *self.by_id.get(id)?;
        let owner = self.customers.get(row, self.support?).to_string();
        Some(owner).filter(|o| !o.is_empty())
    }
}

/// Build the import table out of matched activity rows.
pub fn build_output(
    activity: &Table,
    customers: &Table,
    config: &ConvertConfig,
    reporter: &dyn Reporter,
) -> Table {
    let columns = ActivityColumns::resolve(activity);
    let owners = Owners::new(customers);
    let mut output = Table::new(TEMPLATE_COLUMNS);

    for row in 0..activity.len() {
        let customer_id = activity
            .cell(row, columns.customer_id)
            .to_string()
            .trim()
            .to_owned();
        let body_raw = activity.cell(row, columns.body);

        let body = action::extract_action_body(body_raw);

        let schedule = dates::parse_date_time_range(
            body_raw.as_text(),
            activity.cell(row, columns.date),
            &config.default_start_time,
            reporter,
        );

        let action = action::decide_action_type(
            activity.cell(row, columns.method),
            activity.cell(row, columns.kind),
            body_raw,
        );

        let owner = owners
            .get(&customer_id)
            .unwrap_or_else(|| config.unassigned_owner.clone());

        tracing::trace!(
            customer = %activity.cell(row, columns.customer_name),
            action,
            start = %schedule.start_date,
            "Built action"
        );

        output.push_row(vec![
            Cell::text(text::to_sjis_safe(&customer_id)),
            Cell::text(text::to_sjis_safe(action)),
            Cell::text(schedule.start_date),
            Cell::text(schedule.start_time),
            Cell::text(schedule.end_date),
            Cell::text(schedule.end_time),
            Cell::text(text::to_sjis_safe(&owner)),
            Cell::Empty,
            Cell::Empty,
            Cell::text(body),
            Cell::text(config.default_status.as_str()),
            Cell::Empty,
        ]);
    }

    output
}
