//! Tally summarizes personal finance transactions for a dashboard.
//!
//! This library filters a snapshot of expense and income records by period,
//! category and currency, aggregates what is left into totals and
//! breakdowns, and projects the aggregates into chart series.
//!
//! The engine is pure: every function borrows its input, never mutates it and
//! returns new values. Dirty input is normalized rather than rejected, so the
//! only failure a caller has to handle while aggregating is an invalid range
//! selection, see [filter::validate_range].
//!
//! ```no_run
//! use tally_rs::{
//!     Config,
//!     filter::{FilterSpecification, Period},
//!     import::load_snapshot,
//!     report::build_report,
//! };
//!
//! # fn main() -> Result<(), tally_rs::Error> {
//! let config = Config::from_env();
//! let transactions = load_snapshot("transactions.json".as_ref(), config.local_offset()?)?;
//! let report = build_report(
//!     &transactions,
//!     &FilterSpecification::for_period(Period::LastMonth),
//!     config.today()?,
//! );
//! println!("balance: {}", report.balance);
//! # Ok(())
//! # }
//! ```

pub mod aggregation;
pub mod category;
pub mod chart;
pub mod config;
pub mod date;
mod error;
pub mod filter;
pub mod import;
pub mod logging;
pub mod report;
pub mod timezone;
pub mod transaction;

pub use config::Config;
pub use error::Error;
