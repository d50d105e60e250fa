//! Runtime configuration.
//!
//! The engine is pure, so the only setting it needs from the outside world is
//! the user's timezone, which decides what "today" is for the rolling
//! periods and which calendar day a timestamp falls on.

use time::UtcOffset;

use crate::{Error, date::LocalDate, timezone::get_local_offset};

/// The environment variable holding the IANA timezone name.
pub const TIMEZONE_ENV_VAR: &str = "TALLY_TIMEZONE";

/// The timezone used when none is configured.
pub const DEFAULT_TIMEZONE: &str = "Etc/UTC";

/// Settings shared by the library entry points and the `report` binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// A canonical IANA timezone name, e.g. "America/Bogota".
    pub timezone: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE.to_owned(),
        }
    }
}

impl Config {
    pub fn new(timezone: &str) -> Self {
        Self {
            timezone: timezone.to_owned(),
        }
    }

    /// Read the configuration from [TIMEZONE_ENV_VAR], falling back to
    /// [DEFAULT_TIMEZONE] when it is unset or blank.
    pub fn from_env() -> Self {
        match std::env::var(TIMEZONE_ENV_VAR) {
            Ok(timezone) if !timezone.trim().is_empty() => Self::new(timezone.trim()),
            _ => Self::default(),
        }
    }

    /// The current UTC offset of the configured timezone.
    ///
    /// # Errors
    /// Returns [Error::InvalidTimezoneError] if the timezone name is unknown.
    pub fn local_offset(&self) -> Result<UtcOffset, Error> {
        get_local_offset(&self.timezone).ok_or_else(|| {
            tracing::error!("Invalid timezone {}", self.timezone);
            Error::InvalidTimezoneError(self.timezone.clone())
        })
    }

    /// Today's date in the configured timezone.
    ///
    /// # Errors
    /// Returns [Error::InvalidTimezoneError] if the timezone name is unknown.
    pub fn today(&self) -> Result<LocalDate, Error> {
        self.local_offset().map(LocalDate::today)
    }
}
