//! Timezone-safe calendar dates.
//!
//! Every date in the engine is a [LocalDate]: a calendar day pinned to 12:00
//! local time. Comparisons, differences and grouping only ever look at the
//! (year, month, day) tuple, so a date never drifts to the neighbouring day
//! when it passes through a UTC conversion on its way to or from a client.

use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use time::{
    Date, Duration, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset,
    format_description::{BorrowedFormatItem, well_known::Rfc3339},
    macros::{date, format_description, time},
};

use crate::Error;

/// The time of day every [LocalDate] is anchored at.
const NOON: Time = time!(12:00);

/// The earliest day date arithmetic moves to.
pub const FIRST_SUPPORTED_DAY: Date = date!(0001-01-01);

/// The latest day date arithmetic moves to.
pub const LAST_SUPPORTED_DAY: Date = date!(9999-12-31);

/// The number of days from [FIRST_SUPPORTED_DAY] to [LAST_SUPPORTED_DAY].
const SUPPORTED_SPAN_DAYS: i64 = 3_652_058;

const NAIVE_DATE_TIME: &[BorrowedFormatItem<'_>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute][optional [:[second]]][optional [.[subsecond]]]"
);

const NAIVE_DATE_TIME_SPACED: &[BorrowedFormatItem<'_>] = format_description!(
    "[year]-[month]-[day] [hour]:[minute][optional [:[second]]][optional [.[subsecond]]]"
);

/// A calendar date anchored at local noon.
///
/// Equality, ordering and hashing use the calendar day only.
#[derive(Debug, Clone, Copy)]
pub struct LocalDate(PrimitiveDateTime);

impl LocalDate {
    /// Anchor `date` at noon.
    pub fn from_date(date: Date) -> Self {
        Self(PrimitiveDateTime::new(date, NOON))
    }

    /// Create a date from its calendar fields, `month` counting from 1.
    ///
    /// Returns `None` for impossible dates such as 2023-02-29.
    pub fn from_calendar_date(year: i32, month: u8, day: u8) -> Option<Self> {
        let month = Month::try_from(month).ok()?;

        Date::from_calendar_date(year, month, day)
            .ok()
            .map(Self::from_date)
    }

    /// The current calendar date at `offset`.
    pub fn today(offset: UtcOffset) -> Self {
        Self::from_date(OffsetDateTime::now_utc().to_offset(offset).date())
    }

    /// The calendar day.
    pub fn date(self) -> Date {
        self.0.date()
    }

    /// The noon-anchored date and time.
    pub fn date_time(self) -> PrimitiveDateTime {
        self.0
    }

    pub fn year(self) -> i32 {
        self.0.year()
    }

    pub fn month(self) -> Month {
        self.0.month()
    }

    pub fn day(self) -> u8 {
        self.0.day()
    }

    /// The month this date falls in.
    pub fn year_month(self) -> YearMonth {
        YearMonth {
            year: self.year(),
            month: self.month() as u8,
        }
    }

    /// The signed number of days from `other` to `self`.
    ///
    /// Both dates are truncated to midnight first. The result is positive
    /// when `other` is before `self`.
    pub fn days_between(self, other: LocalDate) -> i64 {
        let reference = self.0.replace_time(Time::MIDNIGHT);
        let other = other.0.replace_time(Time::MIDNIGHT);

        (reference - other).whole_days()
    }

    /// Compare two dates by their (year, month, day) tuple.
    pub fn compare(self, other: LocalDate) -> Ordering {
        let lhs = (self.year(), self.month() as u8, self.day());
        let rhs = (other.year(), other.month() as u8, other.day());

        lhs.cmp(&rhs)
    }

    /// Whether `self` lies in the inclusive range `start..=end`.
    pub fn is_in_range(self, start: LocalDate, end: LocalDate) -> bool {
        self.compare(start) != Ordering::Less && self.compare(end) != Ordering::Greater
    }

    /// Move the date by `days`.
    ///
    /// The result is clamped to [FIRST_SUPPORTED_DAY]..=[LAST_SUPPORTED_DAY],
    /// the four digit years that [format_local] and [parse_local_date] agree
    /// on.
    pub fn add_days(self, days: i64) -> Self {
        let days = days.clamp(-SUPPORTED_SPAN_DAYS, SUPPORTED_SPAN_DAYS);
        let date = self.date().saturating_add(Duration::days(days));

        Self::from_date(date.clamp(FIRST_SUPPORTED_DAY, LAST_SUPPORTED_DAY))
    }

    /// The following calendar day, or `None` after [LAST_SUPPORTED_DAY].
    pub fn next_day(self) -> Option<Self> {
        self.date()
            .next_day()
            .filter(|date| *date <= LAST_SUPPORTED_DAY)
            .map(Self::from_date)
    }
}

impl PartialEq for LocalDate {
    fn eq(&self, other: &Self) -> bool {
        self.compare(*other) == Ordering::Equal
    }
}

impl Eq for LocalDate {}

impl PartialOrd for LocalDate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LocalDate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(*other)
    }
}

impl Hash for LocalDate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.date().hash(state);
    }
}

impl fmt::Display for LocalDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_local(*self))
    }
}

impl Serialize for LocalDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LocalDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;

        parse_local_date(&text)
            .ok_or_else(|| de::Error::custom(format!("invalid date \"{text}\"")))
    }
}

/// Parse `text` as a calendar date, reading timestamps in UTC.
///
/// See [parse_local_date_in].
pub fn parse_local_date(text: &str) -> Option<LocalDate> {
    parse_local_date_in(text, UtcOffset::UTC)
}

/// Parse `text` as a calendar date.
///
/// `YYYY-MM-DD` is the primary format. The fallbacks are RFC 3339 timestamps
/// (shifted to `offset` before the day is taken), ISO date-times without an
/// offset, `YYYY/MM/DD` and `MM/DD/YYYY`.
///
/// Returns `None` when the text is not a real date in any of these formats.
pub fn parse_local_date_in(text: &str, offset: UtcOffset) -> Option<LocalDate> {
    let text = text.trim();

    if text.is_empty() {
        return None;
    }

    parse_dashed_date(text)
        .or_else(|| parse_timestamp(text, offset))
        .or_else(|| parse_naive_date_time(text))
        .or_else(|| parse_slashed_date(text))
}

/// Format `date` as `YYYY-MM-DD`.
pub fn format_local(date: LocalDate) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        date.month() as u8,
        date.day()
    )
}

/// The signed day count between two date strings.
///
/// Returns `None` if either string is not a date.
pub fn days_between_text(reference: &str, other: &str) -> Option<i64> {
    let reference = parse_local_date(reference)?;
    let other = parse_local_date(other)?;

    Some(reference.days_between(other))
}

/// Compare two date strings by calendar day.
///
/// Returns `None` if either string is not a date.
pub fn compare_date_text(lhs: &str, rhs: &str) -> Option<Ordering> {
    let lhs = parse_local_date(lhs)?;
    let rhs = parse_local_date(rhs)?;

    Some(lhs.compare(rhs))
}

/// Whether `date` lies within `start..=end`, all given as text.
///
/// False when any of the three strings is not a date.
pub fn is_in_range_text(date: &str, start: &str, end: &str) -> bool {
    match (
        parse_local_date(date),
        parse_local_date(start),
        parse_local_date(end),
    ) {
        (Some(date), Some(start), Some(end)) => date.is_in_range(start, end),
        _ => false,
    }
}

fn parse_dashed_date(text: &str) -> Option<LocalDate> {
    let [year, month, day] = split_numeric_fields(text, '-')?;

    if year.len() != 4 || month.len() > 2 || day.len() > 2 {
        return None;
    }

    LocalDate::from_calendar_date(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

fn parse_slashed_date(text: &str) -> Option<LocalDate> {
    let [first, second, third] = split_numeric_fields(text, '/')?;

    let (year, month, day) = if first.len() == 4 {
        (first, second, third)
    } else if third.len() == 4 {
        (third, first, second)
    } else {
        return None;
    };

    if month.len() > 2 || day.len() > 2 {
        return None;
    }

    LocalDate::from_calendar_date(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

fn parse_timestamp(text: &str, offset: UtcOffset) -> Option<LocalDate> {
    OffsetDateTime::parse(text, &Rfc3339)
        .ok()
        .map(|timestamp| LocalDate::from_date(timestamp.to_offset(offset).date()))
}

fn parse_naive_date_time(text: &str) -> Option<LocalDate> {
    PrimitiveDateTime::parse(text, NAIVE_DATE_TIME)
        .or_else(|_| PrimitiveDateTime::parse(text, NAIVE_DATE_TIME_SPACED))
        .ok()
        .map(|date_time| LocalDate::from_date(date_time.date()))
}

/// Split `text` into exactly three non-empty runs of ASCII digits.
fn split_numeric_fields(text: &str, separator: char) -> Option<[&str; 3]> {
    let fields: Vec<&str> = text.split(separator).collect();

    let &[first, second, third] = fields.as_slice() else {
        return None;
    };

    let is_numeric =
        |field: &str| !field.is_empty() && field.bytes().all(|byte| byte.is_ascii_digit());

    [first, second, third]
        .into_iter()
        .all(is_numeric)
        .then_some([first, second, third])
}

/// A calendar month, e.g. January 2024.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    /// Counts from 1.
    month: u8,
}

impl YearMonth {
    /// Returns `None` if `month` is not in `1..=12`.
    pub fn new(year: i32, month: u8) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> Month {
        Month::try_from(self.month).unwrap_or(Month::January)
    }

    /// The month number, counting from 1.
    pub fn month_number(self) -> u8 {
        self.month
    }

    pub fn first_day(self) -> LocalDate {
        LocalDate::from_date(
            Date::from_calendar_date(self.year, self.month(), 1).unwrap_or(Date::MIN),
        )
    }

    pub fn last_day(self) -> LocalDate {
        let day = last_day_of_month(self.year, self.month());

        LocalDate::from_date(
            Date::from_calendar_date(self.year, self.month(), day).unwrap_or(Date::MAX),
        )
    }

    /// Whether `date` falls in this month.
    pub fn contains(self, date: LocalDate) -> bool {
        date.year_month() == self
    }

    /// All twelve months of `year`, in order.
    pub fn months_of_year(year: i32) -> impl Iterator<Item = YearMonth> {
        (1..=12).map(move |month| YearMonth { year, month })
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidMonth(text.to_owned());
        let (year, month) = text.trim().split_once('-').ok_or_else(invalid)?;

        if year.len() != 4 || month.is_empty() || month.len() > 2 {
            return Err(invalid());
        }

        let year = year.parse().map_err(|_| invalid())?;
        let month = month.parse().map_err(|_| invalid())?;

        YearMonth::new(year, month).ok_or_else(invalid)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;

        text.parse().map_err(de::Error::custom)
    }
}

/// The number of days in the given month.
pub fn last_day_of_month(year: i32, month: Month) -> u8 {
    match month {
        Month::January
        | Month::March
        | Month::May
        | Month::July
        | Month::August
        | Month::October
        | Month::December => 31,
        Month::April | Month::June | Month::September | Month::November => 30,
        Month::February => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}
