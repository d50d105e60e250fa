//! Loads a snapshot of transaction records from a JSON or CSV file.
//!
//! Only structural problems are errors here. Field level problems, such as
//! an amount that is not a number, are left for [Transaction::from_raw] to
//! normalize.

use std::{collections::HashMap, fs, io, path::Path};

use serde_json::Value;
use time::UtcOffset;

use crate::{
    Error,
    transaction::{RawAmount, RawTransaction, Transaction, normalize_all},
};

/// Read the snapshot at `path` and normalize its records.
///
/// The format is chosen by the file extension, `.json` or `.csv`. Timestamps
/// in the snapshot are converted to `local_offset` before their calendar day
/// is taken.
///
/// # Errors
/// Returns [Error::UnsupportedSnapshot] for other extensions, [Error::Io] if
/// the file cannot be read, or [Error::InvalidJson]/[Error::InvalidCsv] if
/// the contents cannot be parsed.
pub fn load_snapshot(path: &Path, local_offset: UtcOffset) -> Result<Vec<Transaction>, Error> {
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase);

    let records = match extension.as_deref() {
        Some("json") => parse_json_snapshot(&fs::read_to_string(path)?)?,
        Some("csv") => parse_csv_snapshot(fs::File::open(path)?)?,
        _ => {
            tracing::error!("cannot load snapshot {}: unknown file type", path.display());
            return Err(Error::UnsupportedSnapshot(path.display().to_string()));
        }
    };

    tracing::info!("loaded {} records from {}", records.len(), path.display());

    Ok(normalize_all(records, local_offset))
}

/// Parse a JSON array of transaction records.
///
/// # Errors
/// Returns [Error::InvalidJson] if `text` is not a JSON array of objects.
pub fn parse_json_snapshot(text: &str) -> Result<Vec<RawTransaction>, Error> {
    serde_json::from_str(text).map_err(|error| {
        tracing::error!("could not parse JSON snapshot: {error}");
        Error::from(error)
    })
}

const ID_COLUMN: &str = "id";
const DATE_COLUMN: &str = "date";
const AMOUNT_COLUMN: &str = "amount";
const CATEGORY_COLUMN: &str = "category";
const DESCRIPTION_COLUMN: &str = "description";
const TYPE_COLUMN: &str = "type";
const IS_INCOME_COLUMN: &str = "is_income";
const CURRENCY_COLUMN: &str = "currency";

/// Parse CSV transaction records with a header row.
///
/// Columns are matched by name, case-insensitively and in any order:
/// `id`, `date`, `amount`, `category`, `description`, `type` (`income` or
/// `expense`), `is_income` (`true` or `false`) and `currency`. Missing
/// columns and empty cells are treated as missing fields.
///
/// # Errors
/// Returns [Error::InvalidCsv] if the header or a row cannot be read.
pub fn parse_csv_snapshot(reader: impl io::Read) -> Result<Vec<RawTransaction>, Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let index_by_name: HashMap<String, usize> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(index, name)| (name.trim().to_lowercase(), index))
        .collect();

    tracing::debug!("CSV snapshot columns: {index_by_name:?}");

    let mut records = Vec::new();

    for (row_index, row) in reader.records().enumerate() {
        let row = row.map_err(|error| {
            tracing::error!("could not read CSV row {}: {error}", row_index + 1);
            Error::from(error)
        })?;
        let value_for = |column: &str| {
            let index = index_by_name.get(column)?;
            row.get(*index)
                .filter(|value| !value.is_empty())
                .map(str::to_owned)
        };

        records.push(RawTransaction {
            id: value_for(ID_COLUMN).map(Value::String),
            date: value_for(DATE_COLUMN).map(Value::String),
            amount: value_for(AMOUNT_COLUMN).map(RawAmount::Text),
            category_name: value_for(CATEGORY_COLUMN).map(Value::String),
            description: value_for(DESCRIPTION_COLUMN).map(Value::String),
            is_income: value_for(TYPE_COLUMN)
                .or_else(|| value_for(IS_INCOME_COLUMN))
                .map(|text| Value::String(text.to_lowercase())),
            currency_code: value_for(CURRENCY_COLUMN).map(Value::String),
        });
    }

    Ok(records)
}
