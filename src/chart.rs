//! Reshapes aggregates into the label and value series a chart renders.
//!
//! Nothing here computes totals, the series are projections of what
//! [crate::aggregation] produced. The [echarts] submodule turns the series
//! into ECharts options.

pub mod echarts;

use std::sync::OnceLock;

use numfmt::{Formatter, Precision};
use serde::Serialize;
use time::Month;

use crate::{
    aggregation::{CategoryAggregate, DailyAggregate, MonthlyAggregate},
    date::{LocalDate, YearMonth},
};

/// One slice per category, in breakdown order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CategorySeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub colors: Vec<&'static str>,
}

impl CategorySeries {
    pub fn from_breakdown(breakdown: &[CategoryAggregate]) -> Self {
        Self {
            labels: breakdown.iter().map(|c| c.name.clone()).collect(),
            values: breakdown.iter().map(|c| c.total).collect(),
            colors: breakdown.iter().map(|c| c.color).collect(),
        }
    }
}

/// One point per day or month, oldest first.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TimeSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl TimeSeries {
    /// Label each day as e.g. "15 Jan".
    pub fn from_daily(daily: &[DailyAggregate]) -> Self {
        Self {
            labels: daily.iter().map(|day| format_day_label(day.date)).collect(),
            values: daily.iter().map(|day| day.total).collect(),
        }
    }

    /// Label each month as e.g. "Jan".
    pub fn from_monthly(monthly: &[MonthlyAggregate]) -> Self {
        Self {
            labels: monthly
                .iter()
                .map(|month| format_month_label(month.month))
                .collect(),
            values: monthly.iter().map(|month| month.total).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The day of the month followed by the abbreviated month name, e.g. "15 Jan".
pub fn format_day_label(date: LocalDate) -> String {
    format!("{} {}", date.day(), month_abbreviation(date.month()))
}

/// The abbreviated month name, e.g. "Jan".
pub fn format_month_label(month: YearMonth) -> String {
    month_abbreviation(month.month()).to_owned()
}

fn month_abbreviation(month: Month) -> &'static str {
    match month {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    }
}

/// Format `number` as dollars and cents, e.g. "$1,234.50" or "-$12.00".
///
/// `NaN` and infinite values are shown as "$0.00".
pub fn format_currency(number: f64) -> String {
    static POSITIVE_FMT: OnceLock<Option<Formatter>> = OnceLock::new();

    let positive_fmt = POSITIVE_FMT.get_or_init(|| {
        Formatter::currency("$")
            .ok()
            .map(|fmt| fmt.precision(Precision::Decimals(2)))
    });

    static NEGATIVE_FMT: OnceLock<Option<Formatter>> = OnceLock::new();

    let negative_fmt = NEGATIVE_FMT.get_or_init(|| {
        Formatter::currency("-$")
            .ok()
            .map(|fmt| fmt.precision(Precision::Decimals(2)))
    });

    if !number.is_finite() || number == 0.0 {
        // numfmt renders zero as "0"
        return "$0.00".to_owned();
    }

    let formatted_string = match (number < 0.0, positive_fmt, negative_fmt) {
        (false, Some(fmt), _) => fmt.fmt_string(number),
        (true, _, Some(fmt)) => fmt.fmt_string(number.abs()),
        (false, None, _) => format!("${number:.2}"),
        (true, _, None) => format!("-${:.2}", number.abs()),
    };

    pad_cents(formatted_string)
}

/// numfmt drops trailing zeros from the cents, e.g. "12.30" is rendered as
/// "12.3" and "12.00" as "12".
fn pad_cents(mut formatted_string: String) -> String {
    match formatted_string.rfind('.') {
        None => formatted_string.push_str(".00"),
        Some(dot) => {
            for _ in formatted_string.len() - dot - 1..2 {
                formatted_string.push('0');
            }
        }
    }

    formatted_string
}

/// Round a percentage to a whole number, e.g. "75%".
pub fn format_percentage(value: f64) -> String {
    let rounded = value.round();

    if !rounded.is_finite() || rounded == 0.0 {
        // Avoids "-0%" for small negative values.
        return "0%".to_owned();
    }

    format!("{rounded}%")
}
