// 🧾 Canonical Transaction Record
// The single shape every matcher and detector in this crate works on.

use crate::error::{ReconcileError, ReconcileResult};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// IDENTITY
// ============================================================================

/// Synthetic identity token assigned when a set is built.
///
/// Two records with identical content but different ids are different
/// transactions. Content equality (duplicates) never looks at the id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(pub usize);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ============================================================================
// CANONICAL RECORD
// ============================================================================

/// Canonical Transaction Record
///
/// Sign convention: positive amount = inflow, negative amount = outflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub id: RecordId,
    pub date: NaiveDate,
    pub account: String,
    pub category: Option<String>,
    pub payee: Option<String>,
    pub description: Option<String>,
    pub amount: Decimal,
    pub status: Option<String>,
}

impl CanonicalRecord {
    /// Create a record with the required fields; id defaults to #0 until the
    /// owning set assigns one
    pub fn new(date: NaiveDate, account: impl Into<String>, amount: Decimal) -> Self {
        CanonicalRecord {
            id: RecordId(0),
            date,
            account: account.into(),
            category: None,
            payee: None,
            description: None,
            amount,
            status: None,
        }
    }

    pub fn with_id(mut self, id: RecordId) -> Self {
        self.id = id;
        self
    }

    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }

    pub fn with_payee(mut self, payee: Option<String>) -> Self {
        self.payee = payee;
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn with_status(mut self, status: Option<String>) -> Self {
        self.status = status;
        self
    }

    /// Inflow magnitude, if this record is an inflow
    pub fn inflow(&self) -> Option<Decimal> {
        (self.amount > Decimal::ZERO).then_some(self.amount)
    }

    /// Outflow magnitude, if this record is an outflow
    pub fn outflow(&self) -> Option<Decimal> {
        (self.amount < Decimal::ZERO).then(|| -self.amount)
    }

    /// True when every canonical field matches (id ignored)
    pub fn same_content(&self, other: &CanonicalRecord) -> bool {
        self.date == other.date
            && self.account == other.account
            && self.category == other.category
            && self.payee == other.payee
            && self.description == other.description
            && self.amount == other.amount
            && self.status == other.status
    }

    /// SHA-256 over the canonical content, excluding the identity token.
    ///
    /// Amounts are normalized first so that `42.00` and `42.0` hash alike,
    /// matching `Decimal` equality.
    pub fn content_fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        self.feed_content(&mut hasher);
        format!("{:x}", hasher.finalize())
    }

    pub(crate) fn feed_content(&self, hasher: &mut Sha256) {
        let fields = [
            Some(self.date.to_string()),
            Some(self.account.clone()),
            self.category.clone(),
            self.payee.clone(),
            self.description.clone(),
            Some(self.amount.normalize().to_string()),
            self.status.clone(),
        ];

        for field in fields {
            // Tag each field so None and Some("") never collide
            match field {
                Some(value) => {
                    hasher.update(b"+");
                    hasher.update(value.as_bytes());
                }
                None => hasher.update(b"-"),
            }
            hasher.update(b"\x1f");
        }
    }
}

// ============================================================================
// RAW ROW (pre-normalization)
// ============================================================================

/// One CSV data row keyed by header name, plus provenance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub source_file: String,
    /// 1-based line in the source file (header is line 1)
    pub line_number: usize,
    pub fields: HashMap<String, String>,
}

impl RawRow {
    pub fn new(source_file: impl Into<String>, line_number: usize) -> Self {
        RawRow {
            source_file: source_file.into(),
            line_number,
            fields: HashMap::new(),
        }
    }

    /// Builder used by tests and adapters
    pub fn with_field(mut self, column: &str, value: &str) -> Self {
        self.fields.insert(column.to_string(), value.to_string());
        self
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.fields.contains_key(column)
    }

    /// Rename columns in place; a missing source column is ignored
    pub fn rename_columns(&mut self, column_map: &[(&str, &str)]) {
        for (from, to) in column_map {
            if let Some(value) = self.fields.remove(*from) {
                self.fields.insert((*to).to_string(), value);
            }
        }
    }

    /// Build a normalization error pointing at this row
    pub fn error(&self, field: &str, message: impl Into<String>) -> ReconcileError {
        ReconcileError::Normalization {
            file: self.source_file.clone(),
            line: self.line_number,
            field: field.to_string(),
            message: message.into(),
        }
    }

    fn require(&self, column: &str) -> ReconcileResult<&str> {
        self.fields
            .get(column)
            .map(|v| v.as_str())
            .ok_or_else(|| self.error(column, "missing column"))
    }

    /// Optional text column; missing or blank yields None
    pub fn text(&self, column: &str) -> Option<String> {
        self.fields
            .get(column)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(|v| v.to_string())
    }

    /// Required, non-blank text column
    pub fn required_text(&self, column: &str) -> ReconcileResult<String> {
        let value = self.require(column)?.trim();
        if value.is_empty() {
            return Err(self.error(column, "value is empty"));
        }
        Ok(value.to_string())
    }

    /// Required date column
    pub fn date(&self, column: &str) -> ReconcileResult<NaiveDate> {
        let raw = self.require(column)?;
        parse_date(raw).ok_or_else(|| self.error(column, format!("cannot parse date '{}'", raw)))
    }

    /// Required currency column; a blank cell yields None
    pub fn amount(&self, column: &str) -> ReconcileResult<Option<Decimal>> {
        let raw = self.require(column)?;
        parse_amount(raw).map_err(|message| self.error(column, message))
    }
}

// ============================================================================
// VALUE PARSING
// ============================================================================

// Two-digit years first: chrono's %Y would happily read "24" as year 24
const DATE_FORMATS: &[&str] = &["%m/%d/%y", "%m/%d/%Y", "%Y-%m-%d", "%Y/%m/%d"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%m/%d/%Y %H:%M:%S"];

/// Parse a statement or ledger date
///
/// Supports MM/DD/YYYY, YYYY-MM-DD, MM/DD/YY, YYYY/MM/DD and date-times
/// whose date part is kept.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
    }

    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
            return Some(datetime.date());
        }
    }

    None
}

/// Parse a currency string: `$` and `,` are stripped before conversion.
///
/// A blank value yields `Ok(None)`.
pub fn parse_amount(value: &str) -> Result<Option<Decimal>, String> {
    let cleaned: String = value
        .trim()
        .chars()
        .filter(|c| *c != '$' && *c != ',')
        .collect();

    if cleaned.is_empty() {
        return Ok(None);
    }

    Decimal::from_str(&cleaned)
        .map(Some)
        .map_err(|_| format!("cannot parse amount '{}'", value.trim()))
}

// ============================================================================
// TESTS
// ============================================================================
