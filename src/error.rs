//! Defines the crate level error type.
//!
//! The aggregation engine itself never fails on data. Bad dates, amounts and
//! categories are normalized away. The variants here cover the places where a
//! problem has to be surfaced to the caller instead: range selection, user
//! supplied filter text, configuration and loading a snapshot file.

use crate::date::LocalDate;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A custom range was selected without a start date.
    #[error("the range is missing a start date")]
    MissingRangeStart,

    /// A custom range was selected without an end date.
    #[error("the range is missing an end date")]
    MissingRangeEnd,

    /// The start of a custom range falls after its end.
    ///
    /// Aggregating over a reversed range would silently produce an empty
    /// result, so the range is rejected and the user should pick new dates.
    #[error("the range start {start} is after the range end {end}")]
    ReversedRange {
        /// The selected start date.
        start: LocalDate,
        /// The selected end date.
        end: LocalDate,
    },

    /// A month was not in the `YYYY-MM` format or was out of range.
    #[error("invalid month \"{0}\", expected YYYY-MM")]
    InvalidMonth(String),

    /// A currency code is not one of the supported currencies.
    #[error("unknown currency \"{0}\", expected COP or USD")]
    InvalidCurrency(String),

    /// A period name or the arguments it needs were not valid.
    #[error("invalid period: {0}")]
    InvalidPeriod(String),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// The snapshot file could not be read.
    #[error("could not read the snapshot: {0}")]
    Io(String),

    /// The JSON snapshot was not an array of transaction records.
    #[error("could not parse the JSON snapshot: {0}")]
    InvalidJson(String),

    /// The CSV snapshot had issues that prevented it from being parsed.
    #[error("could not parse the CSV snapshot: {0}")]
    InvalidCsv(String),

    /// The snapshot file extension is not one of `.json` or `.csv`.
    #[error("unsupported snapshot file \"{0}\", expected a .json or .csv file")]
    UnsupportedSnapshot(String),
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        tracing::error!("an IO error occurred: {value}");
        Error::Io(value.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::InvalidJson(value.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(value: csv::Error) -> Self {
        Error::InvalidCsv(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::{Error, date::LocalDate};

    #[test]
    fn reversed_range_message_names_both_dates() {
        let error = Error::ReversedRange {
            start: LocalDate::from_date(date!(2024 - 02 - 01)),
            end: LocalDate::from_date(date!(2024 - 01 - 01)),
        };

        assert_eq!(
            error.to_string(),
            "the range start 2024-02-01 is after the range end 2024-01-01"
        );
    }

    #[test]
    fn io_errors_are_stringified() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");

        let error = Error::from(io_error);

        assert_eq!(error, Error::Io("no such file".to_owned()));
    }
}
