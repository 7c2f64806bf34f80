//! Boundary normalization from raw store records to canonical [`Transaction`]s.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::{PaymentStatus, Transaction, TransactionType};

/// Date as persisted by the upstream store: a plain date or timestamp string, a
/// `{seconds, nanoseconds}` wrapper, or epoch milliseconds.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RawDate {
    Text(String),
    Timestamp {
        seconds: i64,
        #[serde(default)]
        nanoseconds: u32,
    },
    Millis(i64),
}

impl RawDate {
    pub fn to_date(&self) -> Option<NaiveDate> {
        match self {
            RawDate::Text(text) => parse_date_text(text.trim()),
            _ => self.to_datetime().map(|ts| ts.date_naive()),
        }
    }

    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            RawDate::Text(text) => {
                let text = text.trim();
                if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
                    return Some(ts.with_timezone(&Utc));
                }
                if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
                    return Some(naive.and_utc());
                }
                NaiveDate::parse_from_str(text, "%Y-%m-%d")
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
                    .map(|naive| naive.and_utc())
            }
            RawDate::Timestamp {
                seconds,
                nanoseconds,
            } => DateTime::from_timestamp(*seconds, *nanoseconds),
            RawDate::Millis(millis) => DateTime::from_timestamp_millis(*millis),
        }
    }
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    // Keep the calendar day the writer saw rather than shifting it to UTC.
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.date_naive());
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.date())
}

/// A transaction exactly as stored upstream, before any validation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default, rename = "type")]
    pub kind: Option<TransactionType>,
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub date: Option<RawDate>,
    #[serde(default, alias = "created_at")]
    pub created_at: Option<RawDate>,
    #[serde(default)]
    pub status: Option<PaymentStatus>,
    #[serde(default, alias = "total_paid")]
    pub total_paid: Option<Value>,
    #[serde(default)]
    pub balance: Option<Value>,
    #[serde(default, alias = "general_id")]
    pub general_id: Option<Uuid>,
    #[serde(default, alias = "concept_id")]
    pub concept_id: Option<Uuid>,
    #[serde(default, alias = "subconcept_id")]
    pub subconcept_id: Option<Uuid>,
    #[serde(default, alias = "provider_id")]
    pub provider_id: Option<Uuid>,
    #[serde(default)]
    pub division: Option<String>,
    #[serde(default, alias = "is_carryover")]
    pub is_carryover: bool,
}

impl RawTransaction {
    /// Normalizes into a [`Transaction`], describing the defect when the record is unusable.
    pub fn normalize(self) -> Result<Transaction, String> {
        let id = self.id.ok_or("missing id")?;
        let kind = self.kind.ok_or_else(|| format!("{id}: missing type"))?;
        let amount = self
            .amount
            .as_ref()
            .and_then(parse_amount)
            .ok_or_else(|| format!("{id}: missing or non-numeric amount"))?;
        if amount < Decimal::ZERO {
            return Err(format!("{id}: negative amount {amount}"));
        }
        let date = self
            .date
            .as_ref()
            .and_then(RawDate::to_date)
            .ok_or_else(|| format!("{id}: missing or unreadable date"))?;
        let created_at = self
            .created_at
            .as_ref()
            .and_then(RawDate::to_datetime)
            .or_else(|| date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc()))
            .ok_or_else(|| format!("{id}: unreadable creation timestamp"))?;
        let total_paid = match self.total_paid.as_ref() {
            None | Some(Value::Null) => Decimal::ZERO,
            Some(value) => {
                parse_amount(value).ok_or_else(|| format!("{id}: non-numeric totalPaid"))?
            }
        };
        let balance = match self.balance.as_ref() {
            None | Some(Value::Null) => (amount - total_paid).max(Decimal::ZERO),
            Some(value) => parse_amount(value).ok_or_else(|| format!("{id}: non-numeric balance"))?,
        };
        let stored_status = self
            .status
            .unwrap_or_else(|| PaymentStatus::derive(total_paid, balance));

        Ok(Transaction {
            id,
            kind,
            amount,
            date,
            created_at,
            stored_status,
            total_paid,
            balance,
            general_id: self.general_id,
            concept_id: self.concept_id,
            subconcept_id: self.subconcept_id,
            provider_id: self.provider_id,
            division: self.division.filter(|division| !division.trim().is_empty()),
            is_carryover: self.is_carryover,
        })
    }
}

fn parse_amount(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(number) => Decimal::from_str(&number.to_string())
            .or_else(|_| Decimal::from_scientific(&number.to_string()))
            .ok(),
        Value::String(text) => Decimal::from_str(text.trim()).ok(),
        _ => None,
    }
}

/// Outcome of reading raw records: the usable transactions plus one warning per skip.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub transactions: Vec<Transaction>,
    pub warnings: Vec<String>,
}

impl LoadReport {
    /// Normalizes every raw value, skipping the malformed ones.
    pub fn from_values(values: Vec<Value>) -> Self {
        let mut report = LoadReport::default();
        for (index, value) in values.into_iter().enumerate() {
            let normalized = serde_json::from_value::<RawTransaction>(value)
                .map_err(|err| err.to_string())
                .and_then(RawTransaction::normalize);
            match normalized {
                Ok(txn) => report.transactions.push(txn),
                Err(reason) => {
                    tracing::warn!(record = index, %reason, "skipping malformed transaction record");
                    report.warnings.push(format!("record {index}: {reason}"));
                }
            }
        }
        report
    }
}
