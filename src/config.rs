// ⚙️ Run configuration
// Paths, date range and matching parameters for one reconciliation run

use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_LEDGER_PATH: &str = "./YNAB_data.csv";
pub const DEFAULT_STATEMENTS_DIR: &str = "./statement_files";
pub const DEFAULT_OUTPUT_DIR: &str = "./";

/// Days on either side of a statement date that still count as a date match
pub const DEFAULT_DAYS_BUFFER: u32 = 3;

/// Look-back used when no start date is given
pub const DEFAULT_LOOKBACK_DAYS: i64 = 90;

// ============================================================================
// DATE RANGE
// ============================================================================

/// Half-open date range `(start, end]`
///
/// A record dated exactly `start` is outside the range, one dated exactly
/// `end` is inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    /// `(end - 90 days, end]`
    pub fn ending_at(end: NaiveDate) -> Self {
        DateRange {
            start: end - Duration::days(DEFAULT_LOOKBACK_DAYS),
            end,
        }
    }

    /// Fill in whichever bound is missing from the defaults
    pub fn from_bounds(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        let end = end.unwrap_or_else(today);
        let start = start.unwrap_or_else(|| DateRange::ending_at(end).start);
        DateRange { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start < date && date <= self.end
    }
}

impl Default for DateRange {
    /// `(today - 90 days, today]`
    fn default() -> Self {
        DateRange::ending_at(today())
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

// ============================================================================
// RECONCILE CONFIG
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Ledger register export (CSV)
    pub ledger_path: PathBuf,

    /// Directory holding the statement exports
    pub statements_dir: PathBuf,

    /// Where the result CSV files are written
    pub output_dir: PathBuf,

    /// Records outside this range are dropped from both sides
    pub date_range: DateRange,

    /// Date window half-width for matching
    pub days_buffer: u32,

    /// Ledger accounts left out of reconciliation entirely
    pub excluded_accounts: Vec<String>,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        ReconcileConfig {
            ledger_path: PathBuf::from(DEFAULT_LEDGER_PATH),
            statements_dir: PathBuf::from(DEFAULT_STATEMENTS_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            date_range: DateRange::default(),
            days_buffer: DEFAULT_DAYS_BUFFER,
            excluded_accounts: Vec::new(),
        }
    }
}
