//! The transaction record and its normalization.
//!
//! Records arrive from storage loosely typed: amounts may be numbers, numeric
//! strings or nested objects, dates are free text and categories may be
//! missing. [Transaction::from_raw] is the one place that coerces a
//! [RawTransaction] into the strongly typed [Transaction] the rest of the
//! engine works with.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::UtcOffset;

use crate::{
    Error,
    category::UNCATEGORIZED_LABEL,
    date::{LocalDate, parse_local_date_in},
};

// ============================================================================
// MODELS
// ============================================================================

/// The currencies a transaction can be recorded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Colombian peso.
    #[default]
    Cop,
    /// US dollar.
    Usd,
}

impl Currency {
    pub const ALL: [Currency; 2] = [Currency::Cop, Currency::Usd];

    /// The ISO 4217 code.
    pub fn code(self) -> &'static str {
        match self {
            Currency::Cop => "COP",
            Currency::Usd => "USD",
        }
    }

    /// Look up a currency by its code, ignoring case.
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();

        Self::ALL
            .into_iter()
            .find(|currency| currency.code().eq_ignore_ascii_case(code))
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = Error;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        Self::from_code(code).ok_or_else(|| Error::InvalidCurrency(code.to_owned()))
    }
}

/// Whether money was spent or earned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    #[default]
    Expense,
    Income,
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [Transaction::build] or
/// [Transaction::from_raw].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// An opaque identifier assigned by storage.
    pub id: String,
    /// The calendar day of the transaction, `None` if the stored date could
    /// not be parsed.
    pub date: Option<LocalDate>,
    /// The amount of money spent or earned.
    pub amount: f64,
    /// The category name, "Other" when the record had none.
    pub category_name: String,
    /// A text description of what the transaction was for.
    pub description: String,
    pub kind: TransactionKind,
    pub currency: Currency,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability. `date` is parsed
    /// with [crate::date::parse_local_date].
    pub fn build(amount: f64, date: &str) -> TransactionBuilder {
        TransactionBuilder {
            id: String::new(),
            amount,
            date: parse_local_date_in(date, UtcOffset::UTC),
            category_name: UNCATEGORIZED_LABEL.to_owned(),
            description: String::new(),
            kind: TransactionKind::Expense,
            currency: Currency::default(),
        }
    }

    /// Normalize a raw storage record.
    ///
    /// Timestamps in `raw.date` are converted to `local_offset` before the
    /// calendar day is taken. Amounts that are not numbers become 0, missing
    /// or blank categories become "Other" and unknown currencies become the
    /// default currency.
    pub fn from_raw(raw: RawTransaction, local_offset: UtcOffset) -> Self {
        let id = match raw.id {
            Some(Value::String(id)) => id,
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };

        let date = match &raw.date {
            Some(Value::String(text)) => parse_local_date_in(text, local_offset),
            _ => None,
        };

        if date.is_none() {
            tracing::trace!("transaction {id:?} has an unparseable date {:?}", raw.date);
        }

        let amount = raw.amount.as_ref().map(RawAmount::normalize).unwrap_or(0.0);

        let category_name = text_field(raw.category_name, "category", &id)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| UNCATEGORIZED_LABEL.to_owned());

        let kind = if is_truthy(raw.is_income.as_ref()) {
            TransactionKind::Income
        } else {
            TransactionKind::Expense
        };

        let currency_code = text_field(raw.currency_code, "currency", &id);

        let currency = match currency_code.as_deref() {
            None | Some("") => Currency::default(),
            Some(code) => Currency::from_code(code).unwrap_or_else(|| {
                tracing::warn!(
                    "transaction {id:?} has unknown currency {code:?}, using {}",
                    Currency::default()
                );
                Currency::default()
            }),
        };

        Self {
            id: id.clone(),
            date,
            amount,
            category_name,
            description: text_field(raw.description, "description", &id).unwrap_or_default(),
            kind,
            currency,
        }
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionKind::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionKind::Expense
    }
}

/// Normalize a batch of raw records, see [Transaction::from_raw].
pub fn normalize_all(records: Vec<RawTransaction>, local_offset: UtcOffset) -> Vec<Transaction> {
    let transactions: Vec<Transaction> = records
        .into_iter()
        .map(|raw| Transaction::from_raw(raw, local_offset))
        .collect();

    let undated = transactions.iter().filter(|t| t.date.is_none()).count();
    tracing::debug!(
        "normalized {} transactions, {undated} without a usable date",
        transactions.len()
    );

    transactions
}

/// The trimmed text of a loosely typed field.
///
/// Only strings carry text. Any other value is ignored so that the field
/// falls back to its default.
fn text_field(value: Option<Value>, field: &str, id: &str) -> Option<String> {
    match value {
        Some(Value::String(text)) => Some(text.trim().to_owned()),
        Some(Value::Null) | None => None,
        Some(other) => {
            tracing::warn!("transaction {id:?} has a non-text {field} {other}, using the default");
            None
        }
    }
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(text)) => {
            let text = text.trim();
            text.eq_ignore_ascii_case("true") || text == "1" || text.eq_ignore_ascii_case("income")
        }
        Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0),
        _ => false,
    }
}

/// A builder for creating [Transaction] instances.
///
/// Defaults to an uncategorized expense in the default currency.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionBuilder {
    id: String,
    amount: f64,
    date: Option<LocalDate>,
    category_name: String,
    description: String,
    kind: TransactionKind,
    currency: Currency,
}

impl TransactionBuilder {
    pub fn id(mut self, id: &str) -> Self {
        self.id = id.to_owned();
        self
    }

    pub fn category(mut self, name: &str) -> Self {
        self.category_name = if name.trim().is_empty() {
            UNCATEGORIZED_LABEL.to_owned()
        } else {
            name.trim().to_owned()
        };
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }

    /// Mark the transaction as income.
    pub fn income(mut self) -> Self {
        self.kind = TransactionKind::Income;
        self
    }

    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    pub fn finalise(self) -> Transaction {
        Transaction {
            id: self.id,
            date: self.date,
            amount: if self.amount.is_finite() { self.amount } else { 0.0 },
            category_name: self.category_name,
            description: self.description,
            kind: self.kind,
            currency: self.currency,
        }
    }
}

// ============================================================================
// RAW RECORDS
// ============================================================================

/// A transaction record as it comes out of storage, before normalization.
///
/// Every field is optional and loosely typed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawTransaction {
    pub id: Option<Value>,
    pub date: Option<Value>,
    pub amount: Option<RawAmount>,
    #[serde(alias = "category")]
    pub category_name: Option<Value>,
    pub description: Option<Value>,
    pub is_income: Option<Value>,
    #[serde(alias = "currency")]
    pub currency_code: Option<Value>,
}

/// An amount in any of the shapes storage has been seen to produce.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Number(f64),
    Text(String),
    Nested {
        #[serde(alias = "value")]
        amount: Box<RawAmount>,
    },
    Other(Value),
}

impl RawAmount {
    /// Coerce to a finite number, 0 when that is not possible.
    pub fn normalize(&self) -> f64 {
        let amount = match self {
            RawAmount::Number(number) => *number,
            RawAmount::Text(text) => parse_amount_text(text).unwrap_or(0.0),
            RawAmount::Nested { amount } => amount.normalize(),
            RawAmount::Other(_) => 0.0,
        };

        if amount.is_finite() { amount } else { 0.0 }
    }
}

/// Parse amounts like "1,234.50", "$ 75.5" or "-20".
fn parse_amount_text(text: &str) -> Option<f64> {
    let cleaned: String = text
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty()
        || !cleaned
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.' || c == '-' || c == '+')
    {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|amount| amount.is_finite())
}
