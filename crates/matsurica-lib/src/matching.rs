//! Matching of activity rows against the customer list.

use anyhow::Result;
use thiserror::Error;

use crate::reporter::Reporter;
use crate::table::{Cell, ColumnLookup, Table};
use crate::text;
use crate::{report_info, report_warn};

pub const CUSTOMER_NAME_ALIASES: &[&str] = &["取引先名(必須)", "取引先名", "顧客名", "会社名", "企業名"];

pub const CUSTOMER_ID_ALIASES: &[&str] = &[
    "取引先ID(必須)",
    "取引先ID",
    "顧客ID",
    "会社ID",
    "顧客コード",
    "取引先コード",
];

pub const CUSTOMER_KUBUN_ALIASES: &[&str] = &[
    "顧客区分（管理番号:19103）",
    "顧客区分（管理番号：19103）",
    "顧客区分",
    "顧客ランク",
    "区分",
];

pub const CUSTOMER_MA_SUPPORT_ALIASES: &[&str] = &[
    "MA部支援担当（管理番号:19258）",
    "MA部支援担当（管理番号：19258）",
    "MA部支援担当",
    "支援担当者",
    "担当者",
];

/// Column holding the name of the matched customer.
pub const MATCHED_NAME_COLUMN: &str = "マッチ顧客名";
/// Column holding the id of the matched customer.
pub const MATCHED_ID_COLUMN: &str = "取引先ID(必須)";
/// Column holding the classification of the matched customer.
pub const MATCHED_KUBUN_COLUMN: &str = "顧客区分（管理番号:19103）";

/// Column in the activity table naming who the activity was with.
const ACTIVITY_TARGET_COLUMN: &str = "活動先";
const ACTIVITY_TARGET_INDEX: usize = 2;
const ACTIVITY_SECONDARY_INDEX: usize = 12;
const ACTIVITY_TERTIARY_INDEX: usize = 6;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error(
        "Customer list has no customer name column (searched: {}; columns: {})",
        .searched.join(", "),
        .available.join(", ")
    )]
    MissingCustomerName {
        searched: Vec<String>,
        available: Vec<String>,
    },
}

/// Match activity rows to customers.
///
/// Customers are tried in list order, and each one claims every row not yet
/// claimed whose activity target, then secondary, then tertiary column
/// contains the normalized customer name. Rows which no customer claims are
/// dropped. The returned table has the matched customer's name, id and
/// classification appended as columns.
pub fn match_customers(
    customers: &Table,
    activity: &Table,
    reporter: &dyn Reporter,
) -> Result<Table> {
    let lookup = ColumnLookup::new(customers.columns());

    let Some(name_column) = lookup.resolve(CUSTOMER_NAME_ALIASES) else {
        return Err(MatchError::MissingCustomerName {
            searched: CUSTOMER_NAME_ALIASES.iter().map(|s| s.to_string()).collect(),
            available: customers.columns().to_vec(),
        }
        .into());
    };

    let id_column = lookup.resolve(CUSTOMER_ID_ALIASES);
    let kubun_column = lookup.resolve(CUSTOMER_KUBUN_ALIASES);

    let columns = [
        activity.find_column(&[ACTIVITY_TARGET_COLUMN], Some(ACTIVITY_TARGET_INDEX)),
        Some(ACTIVITY_SECONDARY_INDEX).filter(|&c| c < activity.width()),
        Some(ACTIVITY_TERTIARY_INDEX).filter(|&c| c < activity.width()),
    ];

    let normalized = columns.map(|column| normalize_column(activity, column));

    let mut claims = vec![None::<usize>; activity.len()];
    let mut remaining = activity.len();

    for customer in 0..customers.len() {
        if remaining == 0 {
            break;
        }

        let key = text::normalize_company(&customers.get(customer, name_column).to_string());

        if key.is_empty() {
            continue;
        }

        for values in &normalized {
            for (claim, value) in claims.iter_mut().zip(values) {
                if claim.is_none() && value.contains(key.as_str()) {
                    *claim = Some(customer);
                    remaining -= 1;
                }
            }
        }
    }

    let matched = claims
        .iter()
        .enumerate()
        .filter_map(|(n, claim)| claim.map(|_| n))
        .collect::<Vec<_>>();

    let unmatched = activity.len() - matched.len();
    report_info!(
        reporter,
        "Matched {}/{} activity rows",
        matched.len(),
        activity.len()
    );

    if unmatched > 0 {
        report_warn!(reporter, "Dropping {unmatched} activity rows without a matching customer");
    }

    let customer_cell = |n: &usize, column: Option<usize>| -> Cell {
        match claims[*n] {
            Some(customer) => customers.cell(customer, column).clone(),
            None => Cell::Empty,
        }
    };

    let mut output = activity.select(&matched);
    let names = matched
        .iter()
        .map(|n| customer_cell(n, Some(name_column)))
        .collect::<Vec<_>>();
    let ids = matched
        .iter()
        .map(|n| customer_cell(n, id_column))
        .collect::<Vec<_>>();
    let kubun = matched
        .iter()
        .map(|n| customer_cell(n, kubun_column))
        .collect::<Vec<_>>();

    output.push_column(MATCHED_NAME_COLUMN, names);
    output.push_column(MATCHED_ID_COLUMN, ids);
    output.push_column(MATCHED_KUBUN_COLUMN, kubun);
    Ok(output)
}

/// Normalize the text cells of a column, anything else becomes empty.
fn normalize_column(table: &Table, column: Option<usize>) -> Vec<String> {
    (0..table.len())
        .map(|row| {
            table
                .cell(row, column)
                .as_text()
                .map(text::normalize_company)
                .unwrap_or_default()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::{CollectReporter, Level};

    fn customers() -> Table {
        let mut table = Table::new(["取引先ID", "取引先名(必須)", "顧客区分（管理番号：19103）"]);
        table.push_row(vec![Cell::text("C001"), Cell::text("株式会社マツリカ"), Cell::text("A")]);
        table.push_row(vec![Cell::Number(2.0), Cell::text("ﾃｽﾄ商事"), Cell::Empty]);
        table.push_row(vec![Cell::text("C003"), Cell::text("㈱"), Cell::text("C")]);
        table
    }

    fn activity(rows: &[[&str; 13]]) -> Table {
        let mut table = Table::new((0..13).map(|n| format!("列{n}")));

        for row in rows {
            table.push_row(row.iter().map(|c| Cell::text(*c)).collect());
        }

        table
    }

    #[test]
    fn matches_in_column_order() {
        let reporter = CollectReporter::new();

        let mut rows = [[""; 13]; 4];
        rows[0][2] = "マツリカ（本社）";
        rows[1][12] = "テスト商事 大阪支店";
        rows[2][2] = "無関係";
        rows[2][6] = "まつりか";
        rows[3][2] = "該当なし";

        let output = match_customers(&customers(), &activity(&rows), &reporter).unwrap();

        assert_eq!(output.len(), 3);
        assert_eq!(output.width(), 16);
        assert_eq!(output.columns()[13], MATCHED_NAME_COLUMN);
        assert_eq!(output.columns()[14], MATCHED_ID_COLUMN);
        assert_eq!(output.columns()[15], MATCHED_KUBUN_COLUMN);

        assert_eq!(output.get(0, 13), &Cell::text("株式会社マツリカ"));
        assert_eq!(output.get(0, 14), &Cell::text("C001"));
        assert_eq!(output.get(0, 15), &Cell::text("A"));

        assert_eq!(output.get(1, 13), &Cell::text("ﾃｽﾄ商事"));
        assert_eq!(output.get(1, 14), &Cell::Number(2.0));
        assert_eq!(output.get(1, 15), &Cell::Empty);

        assert_eq!(output.get(2, 6), &Cell::text("まつりか"));
        assert_eq!(output.get(2, 13), &Cell::text("株式会社マツリカ"));

        assert_eq!(reporter.count(Level::Warn), 1);
    }

    #[test]
    fn first_customer_claims_row() {
        let reporter = CollectReporter::new();

        let mut customers = Table::new(["会社名"]);
        customers.push_row(vec![Cell::text("マツリカ")]);
        customers.push_row(vec![Cell::text("マツリカ商事")]);

        let mut rows = [[""; 13]; 1];
        rows[0][2] = "マツリカ商事";

        let output = match_customers(&customers, &activity(&rows), &reporter).unwrap();
        assert_eq!(output.get(0, 13), &Cell::text("マツリカ"));
        assert_eq!(output.get(0, 14), &Cell::Empty);
    }

    #[test]
    fn target_column_by_name() {
        let reporter = CollectReporter::new();

        let mut table = Table::new(["No", "活動先"]);
        table.push_row(vec![Cell::Number(1.0), Cell::text("株式会社マツリカ")]);

        let output = match_customers(&customers(), &table, &reporter).unwrap();
        assert_eq!(output.len(), 1);
        assert_eq!(output.get(0, 3), &Cell::text("C001"));
    }

    #[test]
    fn missing_name_column() {
        let reporter = CollectReporter::new();
        let customers = Table::new(["ID", "住所"]);

        let error = match_customers(&customers, &activity(&[]), &reporter).unwrap_err();

        match error.downcast_ref::<MatchError>() {
            Some(MatchError::MissingCustomerName { searched, available }) => {
                assert_eq!(searched.len(), CUSTOMER_NAME_ALIASES.len());
                assert_eq!(available, &["ID", "住所"]);
            }
            None => panic!("unexpected error: {error}"),
        }
    }
}
