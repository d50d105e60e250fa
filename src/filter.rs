//! Selects the transactions that fall in a period and match the category and
//! currency filters.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    Error,
    date::{LocalDate, YearMonth, parse_local_date},
    transaction::{Currency, Transaction},
};

/// The length of the rolling "last week" window in days.
pub const LAST_WEEK_DAYS: i64 = 7;

/// The length of the rolling "last month" window in days.
///
/// This is a fixed window, not calendar-month arithmetic. Use
/// [Period::SpecificMonth] for a calendar month.
pub const LAST_MONTH_DAYS: i64 = 30;

/// The span of calendar dates to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "period", rename_all = "camelCase")]
pub enum Period {
    /// Every transaction, including ones without a usable date.
    #[default]
    All,
    /// Today and the seven days before it.
    LastWeek,
    /// Today and the thirty days before it.
    LastMonth,
    /// One calendar month.
    SpecificMonth { month: YearMonth },
    /// An explicit range, either bound may be open.
    CustomRange {
        start: Option<LocalDate>,
        end: Option<LocalDate>,
    },
    /// One calendar year, broken down into quarters by the aggregation.
    QuarterOrYear { year: i32 },
}

impl Period {
    /// Build a period from the loose arguments a form or command line provides.
    ///
    /// # Errors
    /// Returns [Error::InvalidPeriod] if the period needs an argument that is
    /// missing, i.e. a month for [PeriodKind::SpecificMonth] or a year for
    /// [PeriodKind::QuarterOrYear].
    pub fn from_parts(
        kind: PeriodKind,
        year: Option<i32>,
        month: Option<YearMonth>,
        start: Option<LocalDate>,
        end: Option<LocalDate>,
    ) -> Result<Self, Error> {
        match kind {
            PeriodKind::All => Ok(Period::All),
            PeriodKind::LastWeek => Ok(Period::LastWeek),
            PeriodKind::LastMonth => Ok(Period::LastMonth),
            PeriodKind::SpecificMonth => month
                .map(|month| Period::SpecificMonth { month })
                .ok_or_else(|| Error::InvalidPeriod("specific-month needs a month".to_owned())),
            PeriodKind::CustomRange => Ok(Period::CustomRange { start, end }),
            PeriodKind::QuarterOrYear => year
                .map(|year| Period::QuarterOrYear { year })
                .ok_or_else(|| Error::InvalidPeriod("quarter-or-year needs a year".to_owned())),
        }
    }

    /// Whether a transaction dated `date` falls in the period.
    ///
    /// Undated transactions only match [Period::All].
    pub fn contains(&self, date: Option<LocalDate>, today: LocalDate) -> bool {
        let Some(date) = date else {
            return *self == Period::All;
        };

        match *self {
            Period::All => true,
            Period::LastWeek => is_within_days(today, date, LAST_WEEK_DAYS),
            Period::LastMonth => is_within_days(today, date, LAST_MONTH_DAYS),
            Period::SpecificMonth { month } => month.contains(date),
            Period::CustomRange { start, end } => match (start, end) {
                (Some(start), Some(end)) => date.is_in_range(start, end),
                (Some(start), None) => date >= start,
                (None, Some(end)) => date <= end,
                (None, None) => true,
            },
            Period::QuarterOrYear { year } => date.year() == year,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::All => write!(f, "All time"),
            Period::LastWeek => write!(f, "Last {LAST_WEEK_DAYS} days"),
            Period::LastMonth => write!(f, "Last {LAST_MONTH_DAYS} days"),
            Period::SpecificMonth { month } => write!(f, "{month}"),
            Period::CustomRange { start, end } => match (start, end) {
                (Some(start), Some(end)) => write!(f, "{start} to {end}"),
                (Some(start), None) => write!(f, "From {start}"),
                (None, Some(end)) => write!(f, "Until {end}"),
                (None, None) => write!(f, "Any date"),
            },
            Period::QuarterOrYear { year } => write!(f, "{year}"),
        }
    }
}

/// The period names, without their arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodKind {
    All,
    LastWeek,
    LastMonth,
    SpecificMonth,
    CustomRange,
    QuarterOrYear,
}

impl PeriodKind {
    pub fn as_query_value(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::LastWeek => "last-week",
            Self::LastMonth => "last-month",
            Self::SpecificMonth => "specific-month",
            Self::CustomRange => "custom-range",
            Self::QuarterOrYear => "quarter-or-year",
        }
    }
}

impl FromStr for PeriodKind {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        [
            Self::All,
            Self::LastWeek,
            Self::LastMonth,
            Self::SpecificMonth,
            Self::CustomRange,
            Self::QuarterOrYear,
        ]
        .into_iter()
        .find(|kind| kind.as_query_value() == text.trim())
        .ok_or_else(|| Error::InvalidPeriod(format!("unknown period \"{text}\"")))
    }
}

/// Restricts the transactions to one category.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CategoryFilter {
    #[default]
    All,
    Named(String),
}

impl CategoryFilter {
    pub fn matches(&self, transaction: &Transaction) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Named(name) => transaction.category_name == *name,
        }
    }
}

impl From<String> for CategoryFilter {
    fn from(value: String) -> Self {
        if value.trim().eq_ignore_ascii_case("all") {
            CategoryFilter::All
        } else {
            CategoryFilter::Named(value.trim().to_owned())
        }
    }
}

impl From<CategoryFilter> for String {
    fn from(value: CategoryFilter) -> Self {
        match value {
            CategoryFilter::All => "all".to_owned(),
            CategoryFilter::Named(name) => name,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Ok(text.to_owned().into())
    }
}

/// Restricts the transactions to one currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CurrencyFilter {
    #[default]
    All,
    Only(Currency),
}

impl CurrencyFilter {
    pub fn matches(&self, transaction: &Transaction) -> bool {
        match self {
            CurrencyFilter::All => true,
            CurrencyFilter::Only(currency) => transaction.currency == *currency,
        }
    }
}

impl FromStr for CurrencyFilter {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        if text.trim().eq_ignore_ascii_case("all") {
            Ok(CurrencyFilter::All)
        } else {
            text.parse().map(CurrencyFilter::Only)
        }
    }
}

impl TryFrom<String> for CurrencyFilter {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CurrencyFilter> for String {
    fn from(value: CurrencyFilter) -> Self {
        match value {
            CurrencyFilter::All => "all".to_owned(),
            CurrencyFilter::Only(currency) => currency.code().to_owned(),
        }
    }
}

/// Which transactions to show, as chosen by the user.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpecification {
    #[serde(flatten)]
    pub period: Period,
    #[serde(default)]
    pub category: CategoryFilter,
    #[serde(default)]
    pub currency: CurrencyFilter,
}

impl FilterSpecification {
    /// A filter that keeps every transaction in `period`.
    pub fn for_period(period: Period) -> Self {
        Self {
            period,
            ..Default::default()
        }
    }

    pub fn category(mut self, category: CategoryFilter) -> Self {
        self.category = category;
        self
    }

    pub fn currency(mut self, currency: CurrencyFilter) -> Self {
        self.currency = currency;
        self
    }

    /// Whether `transaction` passes the period, category and currency filters.
    pub fn matches(&self, transaction: &Transaction, today: LocalDate) -> bool {
        self.period.contains(transaction.date, today)
            && self.category.matches(transaction)
            && self.currency.matches(transaction)
    }

    /// The inclusive span of calendar days the period covers.
    ///
    /// Rolling and calendar periods have a fixed span. For [Period::All] and
    /// the open ends of [Period::CustomRange] the span is taken from the
    /// earliest and latest dated entry in `transactions`. Returns `None` when
    /// the span cannot be determined, e.g. [Period::All] without dated
    /// transactions.
    pub fn span(
        &self,
        today: LocalDate,
        transactions: &[Transaction],
    ) -> Option<(LocalDate, LocalDate)> {
        match self.period {
            Period::All => date_bounds(transactions),
            Period::LastWeek => Some((today.add_days(-LAST_WEEK_DAYS), today)),
            Period::LastMonth => Some((today.add_days(-LAST_MONTH_DAYS), today)),
            Period::SpecificMonth { month } => Some((month.first_day(), month.last_day())),
            Period::QuarterOrYear { year } => {
                let first = YearMonth::new(year, 1)?.first_day();
                let last = YearMonth::new(year, 12)?.last_day();
                Some((first, last))
            }
            Period::CustomRange { start, end } => {
                let bounds = date_bounds(transactions);

                match (start, end) {
                    (Some(start), Some(end)) => Some((start, end)),
                    (Some(start), None) => {
                        let end = bounds.map_or(start, |(_, last)| last.max(start));
                        Some((start, end))
                    }
                    (None, Some(end)) => {
                        let start = bounds.map_or(end, |(first, _)| first.min(end));
                        Some((start, end))
                    }
                    (None, None) => bounds,
                }
            }
        }
    }
}

/// Keep the transactions that pass `spec`, preserving their order.
///
/// `today` anchors the rolling periods. `transactions` is not modified; the
/// matching records are cloned into the result.
pub fn evaluate(
    transactions: &[Transaction],
    spec: &FilterSpecification,
    today: LocalDate,
) -> Vec<Transaction> {
    let mut undated_excluded = 0;

    let matching: Vec<Transaction> = transactions
        .iter()
        .filter(|transaction| {
            if transaction.date.is_none() && spec.period != Period::All {
                tracing::trace!(
                    "excluding transaction {:?} without a usable date",
                    transaction.id
                );
                undated_excluded += 1;
                return false;
            }

            spec.matches(transaction, today)
        })
        .cloned()
        .collect();

    tracing::debug!(
        "filter {spec:?} kept {} of {} transactions ({undated_excluded} undated excluded)",
        matching.len(),
        transactions.len()
    );

    matching
}

/// The earliest and latest dates in `transactions`, ignoring undated ones.
pub fn date_bounds(transactions: &[Transaction]) -> Option<(LocalDate, LocalDate)> {
    let mut dates = transactions.iter().filter_map(|t| t.date);
    let first = dates.next()?;

    Some(dates.fold((first, first), |(earliest, latest), date| {
        (earliest.min(date), latest.max(date))
    }))
}

/// Check a range selection before it is aggregated.
///
/// Both bounds must be present and the start must not be after the end. A
/// range of a single day is valid.
///
/// # Errors
/// Returns [Error::MissingRangeStart], [Error::MissingRangeEnd] or
/// [Error::ReversedRange].
pub fn validate_range(
    start: Option<LocalDate>,
    end: Option<LocalDate>,
) -> Result<(LocalDate, LocalDate), Error> {
    let start = start.ok_or(Error::MissingRangeStart)?;
    let end = end.ok_or(Error::MissingRangeEnd)?;

    if start > end {
        return Err(Error::ReversedRange { start, end });
    }

    Ok((start, end))
}

/// [validate_range] for dates given as text. Text that is not a date counts
/// as a missing bound.
pub fn validate_range_text(start: &str, end: &str) -> Result<(LocalDate, LocalDate), Error> {
    validate_range(parse_local_date(start), parse_local_date(end))
}

/// Whether a range selection can be aggregated, see [validate_range].
pub fn is_valid_range(start: Option<LocalDate>, end: Option<LocalDate>) -> bool {
    validate_range(start, end).is_ok()
}

fn is_within_days(today: LocalDate, date: LocalDate, days: i64) -> bool {
    (0..=days).contains(&today.days_between(date))
}

#[cfg(test)]
mod tests {
    use super::{
        CategoryFilter, CurrencyFilter, FilterSpecification, Period, PeriodKind, date_bounds,
        evaluate, is_valid_range, validate_range, validate_range_text,
    };
    use crate::{
        Error,
        date::{LocalDate, YearMonth, parse_local_date},
        transaction::{Currency, Transaction},
    };

    fn local(text: &str) -> LocalDate {
        parse_local_date(text).unwrap()
    }

    fn expense(id: &str, date: &str) -> Transaction {
        Transaction::build(10.0, date).id(id).finalise()
    }

    fn ids(transactions: &[Transaction]) -> Vec<&str> {
        transactions.iter().map(|t| t.id.as_str()).collect()
    }

    fn run(transactions: &[Transaction], period: Period, today: &str) -> Vec<Transaction> {
        evaluate(
            transactions,
            &FilterSpecification::for_period(period),
            local(today),
        )
    }

    #[test]
    fn all_keeps_everything_including_undated() {
        let transactions = vec![expense("a", "2020-01-01"), expense("b", "garbage")];

        let got = run(&transactions, Period::All, "2024-03-15");

        assert_eq!(ids(&got), vec!["a", "b"]);
    }

    #[test]
    fn last_week_keeps_today_through_seven_days_ago() {
        let transactions = vec![
            expense("future", "2024-03-16"),
            expense("today", "2024-03-15"),
            expense("seven", "2024-03-08"),
            expense("eight", "2024-03-07"),
            expense("undated", ""),
        ];

        let got = run(&transactions, Period::LastWeek, "2024-03-15");

        assert_eq!(ids(&got), vec!["today", "seven"]);
    }

    #[test]
    fn last_month_is_a_thirty_day_window() {
        let transactions = vec![
            expense("thirty", "2024-02-14"),
            expense("thirty-one", "2024-02-13"),
            expense("start-of-month", "2024-03-01"),
        ];

        let got = run(&transactions, Period::LastMonth, "2024-03-15");

        assert_eq!(ids(&got), vec!["thirty", "start-of-month"]);
    }

    #[test]
    fn specific_month_uses_calendar_months() {
        let transactions = vec![
            expense("jan-31", "2024-01-31"),
            expense("feb-1", "2024-02-01"),
            expense("feb-29", "2024-02-29"),
            expense("feb-last-year", "2023-02-10"),
            expense("undated", "n/a"),
        ];
        let month = YearMonth::new(2024, 2).unwrap();

        let got = run(&transactions, Period::SpecificMonth { month }, "2024-03-15");

        assert_eq!(ids(&got), vec!["feb-1", "feb-29"]);
    }

    #[test]
    fn quarter_or_year_keeps_the_calendar_year() {
        let transactions = vec![
            expense("new-years-eve", "2023-12-31"),
            expense("new-years-day", "2024-01-01"),
            expense("december", "2024-12-31"),
        ];

        let got = run(&transactions, Period::QuarterOrYear { year: 2024 }, "2025-01-01");

        assert_eq!(ids(&got), vec!["new-years-day", "december"]);
    }

    #[test]
    fn custom_range_handles_open_bounds() {
        let transactions = vec![
            expense("a", "2024-01-01"),
            expense("b", "2024-01-15"),
            expense("c", "2024-01-31"),
            expense("undated", ""),
        ];
        let today = "2024-06-01";

        let both = Period::CustomRange {
            start: Some(local("2024-01-01")),
            end: Some(local("2024-01-15")),
        };
        assert_eq!(ids(&run(&transactions, both, today)), vec!["a", "b"]);

        let start_only = Period::CustomRange {
            start: Some(local("2024-01-15")),
            end: None,
        };
        assert_eq!(ids(&run(&transactions, start_only, today)), vec!["b", "c"]);

        let end_only = Period::CustomRange {
            start: None,
            end: Some(local("2024-01-15")),
        };
        assert_eq!(ids(&run(&transactions, end_only, today)), vec!["a", "b"]);

        let neither = Period::CustomRange {
            start: None,
            end: None,
        };
        assert_eq!(ids(&run(&transactions, neither, today)), vec!["a", "b", "c"]);
    }

    #[test]
    fn category_and_currency_filters_apply_after_the_period() {
        let transactions = vec![
            Transaction::build(1.0, "2024-01-01")
                .id("comida-cop")
                .category("Comida")
                .finalise(),
            Transaction::build(1.0, "2024-01-02")
                .id("comida-usd")
                .category("Comida")
                .currency(Currency::Usd)
                .finalise(),
            Transaction::build(1.0, "2024-01-03")
                .id("salud-cop")
                .category("Salud")
                .finalise(),
            Transaction::build(1.0, "2023-01-03")
                .id("old-comida")
                .category("Comida")
                .finalise(),
        ];
        let spec = FilterSpecification::for_period(Period::QuarterOrYear { year: 2024 })
            .category(CategoryFilter::Named("Comida".to_owned()));

        let got = evaluate(&transactions, &spec, local("2024-06-01"));
        assert_eq!(ids(&got), vec!["comida-cop", "comida-usd"]);

        let spec = spec.currency(CurrencyFilter::Only(Currency::Cop));
        let got = evaluate(&transactions, &spec, local("2024-06-01"));
        assert_eq!(ids(&got), vec!["comida-cop"]);
    }

    #[test]
    fn evaluate_does_not_modify_its_input() {
        let transactions = vec![expense("a", "2024-01-01"), expense("b", "")];
        let before = transactions.clone();

        let _ = run(&transactions, Period::LastWeek, "2024-01-02");

        assert_eq!(transactions, before);
    }

    #[test]
    fn reversed_range_is_invalid() {
        let got = validate_range_text("2024-02-01", "2024-01-01");

        assert_eq!(
            got,
            Err(Error::ReversedRange {
                start: local("2024-02-01"),
                end: local("2024-01-01"),
            })
        );
        assert!(!is_valid_range(
            Some(local("2024-02-01")),
            Some(local("2024-01-01"))
        ));
    }

    #[test]
    fn missing_bounds_are_invalid() {
        assert_eq!(
            validate_range(None, Some(local("2024-01-01"))),
            Err(Error::MissingRangeStart)
        );
        assert_eq!(
            validate_range(Some(local("2024-01-01")), None),
            Err(Error::MissingRangeEnd)
        );
        assert_eq!(
            validate_range_text("not a date", "2024-01-01"),
            Err(Error::MissingRangeStart)
        );
    }

    #[test]
    fn single_day_range_is_valid() {
        assert_eq!(
            validate_range_text("2024-01-01", "2024-01-01"),
            Ok((local("2024-01-01"), local("2024-01-01")))
        );
    }

    #[test]
    fn span_of_fixed_periods() {
        let today = local("2024-03-15");
        let span = |period| FilterSpecification::for_period(period).span(today, &[]);

        assert_eq!(
            span(Period::LastWeek),
            Some((local("2024-03-08"), local("2024-03-15")))
        );
        assert_eq!(
            span(Period::LastMonth),
            Some((local("2024-02-14"), local("2024-03-15")))
        );
        assert_eq!(
            span(Period::SpecificMonth {
                month: YearMonth::new(2023, 2).unwrap()
            }),
            Some((local("2023-02-01"), local("2023-02-28")))
        );
        assert_eq!(
            span(Period::QuarterOrYear { year: 2024 }),
            Some((local("2024-01-01"), local("2024-12-31")))
        );
        assert_eq!(span(Period::All), None);
    }

    #[test]
    fn span_of_open_periods_comes_from_the_data() {
        let today = local("2024-03-15");
        let transactions = vec![
            expense("a", "2024-01-10"),
            expense("b", ""),
            expense("c", "2023-12-30"),
        ];

        let all = FilterSpecification::for_period(Period::All).span(today, &transactions);
        assert_eq!(all, Some((local("2023-12-30"), local("2024-01-10"))));

        let open_end = FilterSpecification::for_period(Period::CustomRange {
            start: Some(local("2024-01-01")),
            end: None,
        })
        .span(today, &transactions);
        assert_eq!(open_end, Some((local("2024-01-01"), local("2024-01-10"))));

        assert_eq!(date_bounds(&[expense("x", "")]), None);
    }

    #[test]
    fn periods_are_built_from_parts() {
        let month = YearMonth::new(2024, 5).unwrap();

        assert_eq!(
            Period::from_parts(PeriodKind::SpecificMonth, None, Some(month), None, None),
            Ok(Period::SpecificMonth { month })
        );
        assert!(Period::from_parts(PeriodKind::SpecificMonth, None, None, None, None).is_err());
        assert!(Period::from_parts(PeriodKind::QuarterOrYear, None, None, None, None).is_err());
        assert_eq!("last-week".parse::<PeriodKind>(), Ok(PeriodKind::LastWeek));
        assert!("fortnight".parse::<PeriodKind>().is_err());
    }

    #[test]
    fn filter_specification_deserializes_from_json() {
        let spec: FilterSpecification = serde_json::from_str(
            r#"{ "period": "specificMonth", "month": "2024-01", "category": "Comida", "currency": "all" }"#,
        )
        .unwrap();

        assert_eq!(
            spec,
            FilterSpecification::for_period(Period::SpecificMonth {
                month: YearMonth::new(2024, 1).unwrap()
            })
            .category(CategoryFilter::Named("Comida".to_owned()))
        );

        let spec: FilterSpecification = serde_json::from_str(r#"{ "period": "all" }"#).unwrap();
        assert_eq!(spec, FilterSpecification::default());
    }
}
