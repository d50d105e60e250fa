//! Transaction aggregation for the dashboard summaries and charts.
//!
//! Provides functions to total transactions, group them by category, day,
//! month and quarter, and compute the net spending per day. Every function
//! borrows its input and returns new values.

use std::{
    collections::{BTreeMap, HashMap},
    iter,
};

use serde::Serialize;

use crate::{
    category::{Category, UNCATEGORIZED_LABEL},
    date::{LocalDate, YearMonth},
    filter::date_bounds,
    transaction::{Transaction, TransactionKind},
};

/// The totals for one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryAggregate {
    pub name: String,
    pub total: f64,
    pub count: usize,
    pub color: &'static str,
    pub icon: &'static str,
    /// The share of the aggregate's total amount, in percent.
    ///
    /// Negative amounts count against the total, so with refunds a share can
    /// be negative or above 100. The shares still sum to 100 unless the total
    /// is zero, in which case every share is 0.
    pub percentage_of_total: f64,
}

/// The total for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyAggregate {
    pub date: LocalDate,
    pub total: f64,
}

/// The total for one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthlyAggregate {
    pub month: YearMonth,
    pub total: f64,
}

/// The expense and income totals for one quarter of a year.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuarterAggregate {
    /// The quarter number, 1 for January to March through 4 for October to
    /// December.
    pub quarter: u8,
    pub expense_total: f64,
    pub income_total: f64,
    /// `expense_total - income_total`.
    pub net: f64,
    pub count: usize,
}

/// The summary of a collection of transactions of one kind.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    pub total_amount: f64,
    pub count: usize,
    pub average_amount: f64,
    /// Sorted by total, largest first.
    pub category_breakdown: Vec<CategoryAggregate>,
    pub top_category: Option<CategoryAggregate>,
    pub bottom_category: Option<CategoryAggregate>,
}

/// Totals, average and per-category breakdown of `transactions`.
///
/// The caller is expected to pass transactions of a single kind, see
/// [partition_by_kind]. Categories with equal totals keep the order they were
/// first seen in.
pub fn aggregate(transactions: &[Transaction]) -> AggregateResult {
    let total_amount: f64 = transactions.iter().map(|t| t.amount).sum();
    let count = transactions.len();
    let average_amount = if count == 0 {
        0.0
    } else {
        total_amount / count as f64
    };

    let category_breakdown = group_by_category(transactions, total_amount);

    tracing::debug!(
        "aggregated {count} transactions into {} categories",
        category_breakdown.len()
    );

    AggregateResult {
        total_amount,
        count,
        average_amount,
        top_category: category_breakdown.first().cloned(),
        bottom_category: category_breakdown.last().cloned(),
        category_breakdown,
    }
}

fn group_by_category(transactions: &[Transaction], total_amount: f64) -> Vec<CategoryAggregate> {
    let mut groups: Vec<(&str, f64, usize)> = Vec::new();
    let mut index_by_name: HashMap<&str, usize> = HashMap::new();

    for transaction in transactions {
        let name = match transaction.category_name.trim() {
            "" => UNCATEGORIZED_LABEL,
            name => name,
        };

        let index = *index_by_name.entry(name).or_insert_with(|| {
            groups.push((name, 0.0, 0));
            groups.len() - 1
        });

        groups[index].1 += transaction.amount;
        groups[index].2 += 1;
    }

    let mut breakdown: Vec<CategoryAggregate> = groups
        .into_iter()
        .map(|(name, total, count)| {
            let category = Category::from_name(name);

            CategoryAggregate {
                name: name.to_owned(),
                total,
                count,
                color: category.color(),
                icon: category.icon(),
                percentage_of_total: if total_amount == 0.0 {
                    0.0
                } else {
                    100.0 * total / total_amount
                },
            }
        })
        .collect();

    // `sort_by` is stable, ties stay in first-seen order.
    breakdown.sort_by(|a, b| b.total.total_cmp(&a.total));
    breakdown
}

/// Split `transactions` into `(expenses, income)`, preserving order.
pub fn partition_by_kind(transactions: &[Transaction]) -> (Vec<Transaction>, Vec<Transaction>) {
    transactions
        .iter()
        .cloned()
        .partition(|transaction| transaction.kind == TransactionKind::Expense)
}

/// Totals for each day that has at least one dated transaction, oldest first.
pub fn daily_breakdown(transactions: &[Transaction]) -> Vec<DailyAggregate> {
    totals_by_day(transactions, |t| t.amount)
        .into_iter()
        .map(|(date, total)| DailyAggregate { date, total })
        .collect()
}

/// Totals for each month that has at least one dated transaction, oldest
/// first.
pub fn monthly_breakdown(transactions: &[Transaction]) -> Vec<MonthlyAggregate> {
    totals_by_month(transactions)
        .into_iter()
        .map(|(month, total)| MonthlyAggregate { month, total })
        .collect()
}

/// Totals for every day from `start` to `end` inclusive.
///
/// Days without transactions have a total of zero. Transactions outside the
/// span or without a date are ignored. An empty vector is returned if `start`
/// is after `end`.
pub fn daily_breakdown_between(
    transactions: &[Transaction],
    start: LocalDate,
    end: LocalDate,
) -> Vec<DailyAggregate> {
    zero_filled_days(totals_by_day(transactions, |t| t.amount), start, end)
}

/// Totals for each of the twelve months of `year`.
pub fn monthly_breakdown_for_year(transactions: &[Transaction], year: i32) -> Vec<MonthlyAggregate> {
    let totals = totals_by_month(transactions);

    YearMonth::months_of_year(year)
        .map(|month| MonthlyAggregate {
            month,
            total: totals.get(&month).copied().unwrap_or(0.0),
        })
        .collect()
}

/// Totals for every day from the earliest to the latest dated transaction.
pub fn historical_daily_breakdown(transactions: &[Transaction]) -> Vec<DailyAggregate> {
    match date_bounds(transactions) {
        Some((start, end)) => daily_breakdown_between(transactions, start, end),
        None => Vec::new(),
    }
}

/// The net spending for every day from `start` to `end` inclusive.
///
/// Each day's total is its expenses minus its income, so a positive value
/// means more went out than came in.
pub fn net_per_day(
    transactions: &[Transaction],
    start: LocalDate,
    end: LocalDate,
) -> Vec<DailyAggregate> {
    zero_filled_days(totals_by_day(transactions, signed_net_amount), start, end)
}

/// [net_per_day] from the earliest to the latest dated transaction.
pub fn historical_net_per_day(transactions: &[Transaction]) -> Vec<DailyAggregate> {
    match date_bounds(transactions) {
        Some((start, end)) => net_per_day(transactions, start, end),
        None => Vec::new(),
    }
}

/// Expense and income totals for the four quarters of `year`.
///
/// Every transaction dated in `year` is counted, but only amounts of zero or
/// more are added to the totals.
pub fn quarterly_breakdown(transactions: &[Transaction], year: i32) -> [QuarterAggregate; 4] {
    let mut quarters: [QuarterAggregate; 4] = [1, 2, 3, 4].map(|quarter| QuarterAggregate {
        quarter,
        ..Default::default()
    });

    for transaction in transactions {
        let Some(date) = transaction.date.filter(|date| date.year() == year) else {
            continue;
        };

        let quarter = &mut quarters[usize::from((date.month() as u8 - 1) / 3)];
        quarter.count += 1;

        if transaction.amount < 0.0 {
            tracing::trace!(
                "leaving negative amount of transaction {:?} out of the quarter totals",
                transaction.id
            );
            continue;
        }

        match transaction.kind {
            TransactionKind::Expense => quarter.expense_total += transaction.amount,
            TransactionKind::Income => quarter.income_total += transaction.amount,
        }
    }

    for quarter in &mut quarters {
        quarter.net = quarter.expense_total - quarter.income_total;
    }

    quarters
}

/// The day with the largest total. The earliest day wins ties.
pub fn peak_day(daily: &[DailyAggregate]) -> Option<DailyAggregate> {
    daily.iter().copied().fold(None, |peak, day| match peak {
        Some(peak) if peak.total >= day.total => Some(peak),
        _ => Some(day),
    })
}

fn signed_net_amount(transaction: &Transaction) -> f64 {
    match transaction.kind {
        TransactionKind::Expense => transaction.amount,
        TransactionKind::Income => -transaction.amount,
    }
}

fn totals_by_day(
    transactions: &[Transaction],
    amount_of: impl Fn(&Transaction) -> f64,
) -> BTreeMap<LocalDate, f64> {
    let mut totals = BTreeMap::new();

    for transaction in transactions {
        if let Some(date) = transaction.date {
            *totals.entry(date).or_insert(0.0) += amount_of(transaction);
        }
    }

    totals
}

fn totals_by_month(transactions: &[Transaction]) -> BTreeMap<YearMonth, f64> {
    let mut totals = BTreeMap::new();

    for transaction in transactions {
        if let Some(date) = transaction.date {
            *totals.entry(date.year_month()).or_insert(0.0) += transaction.amount;
        }
    }

    totals
}

fn zero_filled_days(
    totals: BTreeMap<LocalDate, f64>,
    start: LocalDate,
    end: LocalDate,
) -> Vec<DailyAggregate> {
    iter::successors(Some(start), |date| date.next_day())
        .take_while(|date| *date <= end)
        .map(|date| DailyAggregate {
            date,
            total: totals.get(&date).copied().unwrap_or(0.0),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::UtcOffset;

    use crate::{
        aggregation::{
            DailyAggregate, aggregate, daily_breakdown, daily_breakdown_between,
            historical_daily_breakdown, historical_net_per_day, monthly_breakdown,
            monthly_breakdown_for_year, net_per_day, partition_by_kind, peak_day,
            quarterly_breakdown,
        },
        category::{Category, UNCATEGORIZED_LABEL},
        date::{LocalDate, YearMonth, parse_local_date},
        transaction::{RawTransaction, Transaction, TransactionKind},
    };

    fn local(text: &str) -> LocalDate {
        parse_local_date(text).unwrap()
    }

    fn create_test_transaction(amount: f64, date: &str, category: &str) -> Transaction {
        Transaction::build(amount, date).category(category).finalise()
    }

    fn totals(daily: &[DailyAggregate]) -> Vec<f64> {
        daily.iter().map(|day| day.total).collect()
    }

    #[test]
    fn aggregate_sums_two_expenses() {
        let transactions = vec![
            create_test_transaction(150.0, "2024-01-15", "Comida"),
            create_test_transaction(75.5, "2024-01-16", "Transporte"),
        ];

        let result = aggregate(&transactions);

        assert_eq!(result.total_amount, 225.5);
        assert_eq!(result.count, 2);
        assert_eq!(result.average_amount, 112.75);
        assert_eq!(result.top_category.unwrap().name, "Comida");
        assert_eq!(result.bottom_category.unwrap().name, "Transporte");
    }

    #[test]
    fn aggregate_handles_empty_input() {
        let result = aggregate(&[]);

        assert_eq!(result.total_amount, 0.0);
        assert_eq!(result.count, 0);
        assert_eq!(result.average_amount, 0.0);
        assert!(result.category_breakdown.is_empty());
        assert_eq!(result.top_category, None);
        assert_eq!(result.bottom_category, None);
    }

    #[test]
    fn non_numeric_amount_counts_as_zero() {
        let raw: RawTransaction = serde_json::from_value(json!({
            "id": "1",
            "date": "2024-01-15",
            "amount": "abc",
            "category": "Comida",
        }))
        .unwrap();
        let transactions = vec![
            Transaction::from_raw(raw, UtcOffset::UTC),
            create_test_transaction(10.0, "2024-01-15", "Comida"),
        ];

        let result = aggregate(&transactions);

        assert_eq!(result.total_amount, 10.0);
        assert_eq!(result.count, 2);
        assert_eq!(result.average_amount, 5.0);
        assert_eq!(result.category_breakdown[0].count, 2);
    }

    #[test]
    fn breakdown_is_sorted_by_total_with_percentages() {
        let transactions = vec![
            create_test_transaction(100.0, "2024-01-01", "Salud"),
            create_test_transaction(120.0, "2024-01-02", "Hogar"),
            create_test_transaction(180.0, "2024-01-03", "Hogar"),
        ];

        let result = aggregate(&transactions);
        let breakdown = &result.category_breakdown;

        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].name, "Hogar");
        assert_eq!(breakdown[0].total, 300.0);
        assert_eq!(breakdown[0].percentage_of_total, 75.0);
        assert_eq!(breakdown[0].count, 2);
        assert_eq!(breakdown[1].total, 100.0);
        assert_eq!(breakdown[1].percentage_of_total, 25.0);
    }

    #[test]
    fn percentages_sum_to_one_hundred() {
        let transactions = vec![
            create_test_transaction(33.3, "2024-01-01", "Comida"),
            create_test_transaction(12.1, "2024-01-01", "Salud"),
            create_test_transaction(7.77, "2024-01-01", "Hogar"),
            create_test_transaction(1.0, "2024-01-01", ""),
        ];

        let result = aggregate(&transactions);
        let sum: f64 = result
            .category_breakdown
            .iter()
            .map(|c| c.percentage_of_total)
            .sum();

        assert!((sum - 100.0).abs() < 1e-9, "got {sum}");
    }

    #[test]
    fn refunds_reduce_the_total_and_can_push_percentages_past_one_hundred() {
        let transactions = vec![
            create_test_transaction(100.0, "2024-01-01", "Comida"),
            create_test_transaction(-30.0, "2024-01-02", "Salud"),
        ];

        let result = aggregate(&transactions);
        let breakdown = &result.category_breakdown;

        assert_eq!(result.total_amount, 70.0);
        assert_eq!(breakdown[0].name, "Comida");
        assert!((breakdown[0].percentage_of_total - 10000.0 / 70.0).abs() < 1e-9);
        assert_eq!(breakdown[1].name, "Salud");
        assert!((breakdown[1].percentage_of_total + 3000.0 / 70.0).abs() < 1e-9);

        let sum: f64 = breakdown.iter().map(|c| c.percentage_of_total).sum();
        assert!((sum - 100.0).abs() < 1e-9, "got {sum}");
    }

    #[test]
    fn refunds_that_cancel_out_give_zero_percentages() {
        let transactions = vec![
            create_test_transaction(50.0, "2024-01-01", "Comida"),
            create_test_transaction(-50.0, "2024-01-02", "Salud"),
        ];

        let result = aggregate(&transactions);

        assert_eq!(result.total_amount, 0.0);
        assert_eq!(result.category_breakdown.len(), 2);
        for category in &result.category_breakdown {
            assert_eq!(category.percentage_of_total, 0.0);
        }
    }

    #[test]
    fn equal_totals_keep_first_seen_order() {
        let transactions = vec![
            create_test_transaction(5.0, "2024-01-01", "Zebra"),
            create_test_transaction(50.0, "2024-01-01", "Hogar"),
            create_test_transaction(5.0, "2024-01-01", "Alpha"),
            create_test_transaction(5.0, "2024-01-01", "Mid"),
        ];

        let result = aggregate(&transactions);
        let names: Vec<&str> = result
            .category_breakdown
            .iter()
            .map(|c| c.name.as_str())
            .collect();

        assert_eq!(names, vec!["Hogar", "Zebra", "Alpha", "Mid"]);
    }

    #[test]
    fn breakdown_attaches_category_colour_and_icon() {
        let transactions = vec![
            create_test_transaction(5.0, "2024-01-01", "Comida"),
            create_test_transaction(1.0, "2024-01-01", "Mascotas"),
            create_test_transaction(1.0, "2024-01-01", ""),
        ];

        let result = aggregate(&transactions);
        let comida = &result.category_breakdown[0];
        let unknown = result
            .category_breakdown
            .iter()
            .find(|c| c.name == "Mascotas")
            .unwrap();
        let other = result
            .category_breakdown
            .iter()
            .find(|c| c.name == UNCATEGORIZED_LABEL)
            .unwrap();

        assert_eq!(comida.color, Category::Comida.color());
        assert_eq!(comida.icon, Category::Comida.icon());
        assert_eq!(unknown.color, Category::Default.color());
        assert_eq!(other.icon, Category::Default.icon());
    }

    #[test]
    fn aggregate_is_idempotent() {
        let transactions = vec![
            create_test_transaction(100.0, "2024-01-15", "Comida"),
            create_test_transaction(-30.0, "2024-02-10", "Compras"),
        ];
        let before = transactions.clone();

        let first = aggregate(&transactions);
        let second = aggregate(&transactions);

        assert_eq!(first, second);
        assert_eq!(transactions, before);
    }

    #[test]
    fn partition_splits_expenses_and_income() {
        let transactions = vec![
            Transaction::build(10.0, "2024-01-01").id("a").finalise(),
            Transaction::build(20.0, "2024-01-01")
                .id("b")
                .kind(TransactionKind::Income)
                .finalise(),
            Transaction::build(30.0, "2024-01-02")
                .id("c")
                .kind(TransactionKind::Expense)
                .finalise(),
        ];

        let (expenses, income) = partition_by_kind(&transactions);

        assert_eq!(expenses.len(), 2);
        assert_eq!(expenses[0].id, "a");
        assert_eq!(expenses[1].id, "c");
        assert_eq!(income.len(), 1);
        assert_eq!(income[0].id, "b");
    }

    #[test]
    fn daily_breakdown_sorts_by_date_not_text() {
        let transactions = vec![
            create_test_transaction(1.0, "2024-1-10", "Comida"),
            create_test_transaction(2.0, "2024-01-9", "Comida"),
            create_test_transaction(3.0, "2024-01-09", "Comida"),
            create_test_transaction(4.0, "not a date", "Comida"),
        ];

        let result = daily_breakdown(&transactions);

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].date, local("2024-01-09"));
        assert_eq!(result[0].total, 5.0);
        assert_eq!(result[1].date, local("2024-01-10"));
        assert_eq!(result[1].total, 1.0);
    }

    #[test]
    fn monthly_breakdown_sums_transactions() {
        let transactions = vec![
            create_test_transaction(100.0, "2024-01-15", "Comida"),
            create_test_transaction(50.0, "2024-01-20", "Transporte"),
            create_test_transaction(-30.0, "2024-02-10", "Comida"),
            create_test_transaction(5.0, "2023-12-31", "Comida"),
        ];

        let result = monthly_breakdown(&transactions);

        assert_eq!(result.len(), 3);
        assert_eq!(result[0].month, YearMonth::new(2023, 12).unwrap());
        assert_eq!(result[0].total, 5.0);
        assert_eq!(result[1].month, YearMonth::new(2024, 1).unwrap());
        assert_eq!(result[1].total, 150.0);
        assert_eq!(result[2].total, -30.0);
    }

    #[test]
    fn daily_breakdown_between_fills_every_day() {
        let transactions = vec![
            create_test_transaction(10.0, "2024-02-28", "Comida"),
            create_test_transaction(5.0, "2024-03-01", "Comida"),
            create_test_transaction(99.0, "2024-03-05", "Comida"),
            create_test_transaction(99.0, "", "Comida"),
        ];

        let result =
            daily_breakdown_between(&transactions, local("2024-02-27"), local("2024-03-02"));

        assert_eq!(result.len(), 5);
        assert_eq!(result[0].date, local("2024-02-27"));
        assert_eq!(result[2].date, local("2024-02-29"));
        assert_eq!(result[4].date, local("2024-03-02"));
        assert_eq!(totals(&result), vec![0.0, 10.0, 0.0, 5.0, 0.0]);
    }

    #[test]
    fn daily_breakdown_between_reversed_span_is_empty() {
        let transactions = vec![create_test_transaction(10.0, "2024-01-01", "Comida")];

        let result =
            daily_breakdown_between(&transactions, local("2024-01-02"), local("2024-01-01"));

        assert!(result.is_empty());
    }

    #[test]
    fn historical_breakdown_covers_the_whole_span() {
        let transactions = vec![
            create_test_transaction(1.0, "2024-01-30", "Comida"),
            create_test_transaction(2.0, "2024-01-01", "Comida"),
        ];

        let result = historical_daily_breakdown(&transactions);

        assert_eq!(result.len(), 30);
        assert_eq!(result.first().unwrap().total, 2.0);
        assert_eq!(result.last().unwrap().total, 1.0);
        assert_eq!(result.iter().filter(|day| day.total == 0.0).count(), 28);
        assert!(historical_daily_breakdown(&[]).is_empty());
    }

    #[test]
    fn monthly_breakdown_for_year_has_twelve_months() {
        let transactions = vec![
            create_test_transaction(10.0, "2024-03-15", "Comida"),
            create_test_transaction(20.0, "2024-03-16", "Comida"),
            create_test_transaction(7.0, "2024-12-01", "Comida"),
            create_test_transaction(1000.0, "2025-03-01", "Comida"),
        ];

        let result = monthly_breakdown_for_year(&transactions, 2024);

        assert_eq!(result.len(), 12);
        assert_eq!(result[0].month, YearMonth::new(2024, 1).unwrap());
        assert_eq!(result[2].total, 30.0);
        assert_eq!(result[11].total, 7.0);
        assert_eq!(result.iter().map(|m| m.total).sum::<f64>(), 37.0);
    }

    #[test]
    fn net_per_day_subtracts_income_from_expenses() {
        let transactions = vec![
            Transaction::build(40.0, "2024-01-01").finalise(),
            Transaction::build(100.0, "2024-01-01").income().finalise(),
            Transaction::build(25.0, "2024-01-03").finalise(),
        ];

        let result = net_per_day(&transactions, local("2024-01-01"), local("2024-01-03"));

        assert_eq!(totals(&result), vec![-60.0, 0.0, 25.0]);
        assert_eq!(historical_net_per_day(&transactions), result);
    }

    #[test]
    fn quarterly_breakdown_groups_by_quarter() {
        let transactions = vec![
            Transaction::build(100.0, "2024-01-15").finalise(),
            Transaction::build(40.0, "2024-03-31").income().finalise(),
            Transaction::build(10.0, "2024-04-01").finalise(),
            Transaction::build(5.0, "2024-12-31").finalise(),
            Transaction::build(500.0, "2023-12-31").finalise(),
        ];

        let quarters = quarterly_breakdown(&transactions, 2024);

        assert_eq!(quarters.map(|q| q.quarter), [1, 2, 3, 4]);
        assert_eq!(quarters[0].expense_total, 100.0);
        assert_eq!(quarters[0].income_total, 40.0);
        assert_eq!(quarters[0].net, 60.0);
        assert_eq!(quarters[0].count, 2);
        assert_eq!(quarters[1].expense_total, 10.0);
        assert_eq!(quarters[2].count, 0);
        assert_eq!(quarters[3].net, 5.0);
    }

    #[test]
    fn quarterly_breakdown_leaves_out_negative_amounts_but_counts_them() {
        let transactions = vec![
            Transaction::build(100.0, "2024-02-01").finalise(),
            Transaction::build(-30.0, "2024-02-02").finalise(),
        ];

        let quarters = quarterly_breakdown(&transactions, 2024);

        assert_eq!(quarters[0].expense_total, 100.0);
        assert_eq!(quarters[0].count, 2);
        // The category breakdown does not apply the same guard.
        assert_eq!(aggregate(&transactions).total_amount, 70.0);
    }

    #[test]
    fn peak_day_prefers_the_earliest_of_equal_days() {
        let daily = vec![
            DailyAggregate {
                date: local("2024-01-01"),
                total: 5.0,
            },
            DailyAggregate {
                date: local("2024-01-02"),
                total: 9.0,
            },
            DailyAggregate {
                date: local("2024-01-03"),
                total: 9.0,
            },
        ];

        assert_eq!(peak_day(&daily), Some(daily[1]));
        assert_eq!(peak_day(&[]), None);
    }
}
