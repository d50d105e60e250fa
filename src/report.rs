//! Builds the full summary of a period: totals, breakdowns and the series
//! behind the charts.

use serde::Serialize;

use crate::{
    aggregation::{
        AggregateResult, DailyAggregate, MonthlyAggregate, QuarterAggregate, aggregate,
        daily_breakdown, daily_breakdown_between, monthly_breakdown_for_year, net_per_day,
        partition_by_kind, peak_day, quarterly_breakdown,
    },
    chart::{CategorySeries, TimeSeries},
    date::LocalDate,
    filter::{FilterSpecification, Period, evaluate},
    transaction::Transaction,
};

/// Totals over time, one entry per day of the period or, for a year, one per
/// month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "resolution", rename_all = "camelCase")]
pub enum Timeline {
    Daily {
        expenses: Vec<DailyAggregate>,
        income: Vec<DailyAggregate>,
    },
    Monthly {
        expenses: Vec<MonthlyAggregate>,
        income: Vec<MonthlyAggregate>,
    },
}

impl Timeline {
    fn series(&self) -> (TimeSeries, TimeSeries) {
        match self {
            Timeline::Daily { expenses, income } => {
                (TimeSeries::from_daily(expenses), TimeSeries::from_daily(income))
            }
            Timeline::Monthly { expenses, income } => (
                TimeSeries::from_monthly(expenses),
                TimeSeries::from_monthly(income),
            ),
        }
    }
}

/// The summary of the transactions that pass a filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodReport {
    pub period: Period,
    /// The first and last day the report covers, if known.
    pub span: Option<(LocalDate, LocalDate)>,
    pub expenses: AggregateResult,
    pub income: AggregateResult,
    pub timeline: Timeline,
    /// Expenses minus income per day. Empty for yearly reports.
    pub net_per_day: Vec<DailyAggregate>,
    /// Only set for yearly reports.
    pub quarters: Option<[QuarterAggregate; 4]>,
    /// Income minus expenses.
    pub balance: f64,
    pub peak_expense_day: Option<DailyAggregate>,
}

/// The series for every chart of a report.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    pub expense_categories: CategorySeries,
    pub income_categories: CategorySeries,
    pub expense_timeline: TimeSeries,
    pub income_timeline: TimeSeries,
    pub net_per_day: TimeSeries,
}

impl PeriodReport {
    pub fn chart_data(&self) -> ChartData {
        let (expense_timeline, income_timeline) = self.timeline.series();

        ChartData {
            expense_categories: CategorySeries::from_breakdown(&self.expenses.category_breakdown),
            income_categories: CategorySeries::from_breakdown(&self.income.category_breakdown),
            expense_timeline,
            income_timeline,
            net_per_day: TimeSeries::from_daily(&self.net_per_day),
        }
    }
}

/// Filter `transactions` with `spec` and summarize the result.
///
/// Yearly periods get a monthly timeline and a quarterly breakdown, every
/// other period gets a daily timeline and the net spending per day over the
/// period's span.
pub fn build_report(
    transactions: &[Transaction],
    spec: &FilterSpecification,
    today: LocalDate,
) -> PeriodReport {
    let filtered = evaluate(transactions, spec, today);
    let (expense_transactions, income_transactions) = partition_by_kind(&filtered);
    let span = spec.span(today, &filtered);

    let (timeline, net, quarters) = match (spec.period, span) {
        (Period::QuarterOrYear { year }, _) => (
            Timeline::Monthly {
                expenses: monthly_breakdown_for_year(&expense_transactions, year),
                income: monthly_breakdown_for_year(&income_transactions, year),
            },
            Vec::new(),
            Some(quarterly_breakdown(&filtered, year)),
        ),
        (_, Some((start, end))) => (
            Timeline::Daily {
                expenses: daily_breakdown_between(&expense_transactions, start, end),
                income: daily_breakdown_between(&income_transactions, start, end),
            },
            net_per_day(&filtered, start, end),
            None,
        ),
        (_, None) => (
            Timeline::Daily {
                expenses: Vec::new(),
                income: Vec::new(),
            },
            Vec::new(),
            None,
        ),
    };

    let expenses = aggregate(&expense_transactions);
    let income = aggregate(&income_transactions);
    let balance = income.total_amount - expenses.total_amount;
    let peak_expense_day = peak_day(&daily_breakdown(&expense_transactions));

    tracing::info!(
        "built report for {}: {} expenses, {} income, balance {balance}",
        spec.period,
        expenses.count,
        income.count
    );

    PeriodReport {
        period: spec.period,
        span,
        expenses,
        income,
        timeline,
        net_per_day: net,
        quarters,
        balance,
        peak_expense_day,
    }
}
