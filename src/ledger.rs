// 📒 Ledger Normalizer
// Budget register export (separate Inflow/Outflow columns) → canonical records

use crate::config::DateRange;
use crate::error::ReconcileResult;
use crate::parser::read_rows;
use crate::record::{CanonicalRecord, RawRow, RecordId};
use rust_decimal::Decimal;
use std::path::Path;
use tracing::{debug, info};

/// Ledger column names
pub mod columns {
    pub const ACCOUNT: &str = "Account";
    pub const DATE: &str = "Date";
    pub const PAYEE: &str = "Payee";
    pub const CATEGORY: &str = "Category";
    pub const MEMO: &str = "Memo";
    pub const OUTFLOW: &str = "Outflow";
    pub const INFLOW: &str = "Inflow";
    pub const CLEARED: &str = "Cleared";
}

pub struct LedgerNormalizer {
    date_range: DateRange,
    excluded_accounts: Vec<String>,
}

impl LedgerNormalizer {
    pub fn new(date_range: DateRange) -> Self {
        LedgerNormalizer {
            date_range,
            excluded_accounts: Vec::new(),
        }
    }

    /// Accounts whose rows are dropped after normalization
    pub fn with_excluded_accounts(mut self, accounts: Vec<String>) -> Self {
        self.excluded_accounts = accounts;
        self
    }

    /// Normalize one ledger row
    ///
    /// `amount = inflow if inflow > 0 else -outflow`. A blank Inflow or
    /// Outflow cell counts as zero; a negative magnitude or both sides
    /// non-zero is rejected.
    pub fn normalize_row(&self, row: &RawRow) -> ReconcileResult<CanonicalRecord> {
        let account = row.required_text(columns::ACCOUNT)?;
        let date = row.date(columns::DATE)?;
        let inflow = row.amount(columns::INFLOW)?.unwrap_or(Decimal::ZERO);
        let outflow = row.amount(columns::OUTFLOW)?.unwrap_or(Decimal::ZERO);

        if inflow < Decimal::ZERO {
            return Err(row.error(columns::INFLOW, format!("negative magnitude {}", inflow)));
        }
        if outflow < Decimal::ZERO {
            return Err(row.error(columns::OUTFLOW, format!("negative magnitude {}", outflow)));
        }
        if inflow > Decimal::ZERO && outflow > Decimal::ZERO {
            return Err(row.error(
                columns::INFLOW,
                format!("both Inflow ({}) and Outflow ({}) are set", inflow, outflow),
            ));
        }

        let amount = if inflow > Decimal::ZERO { inflow } else { -outflow };

        Ok(CanonicalRecord::new(date, account, amount)
            .with_category(row.text(columns::CATEGORY))
            .with_payee(row.text(columns::PAYEE))
            .with_description(row.text(columns::MEMO))
            .with_status(row.text(columns::CLEARED)))
    }

    /// Normalize, filter and number a batch of ledger rows
    ///
    /// The first row that fails to normalize aborts the batch.
    pub fn normalize_rows(&self, rows: &[RawRow]) -> ReconcileResult<Vec<CanonicalRecord>> {
        let mut records = Vec::new();

        for row in rows {
            let record = self.normalize_row(row)?;

            if !self.date_range.contains(record.date) {
                continue;
            }
            if self.excluded_accounts.iter().any(|a| *a == record.account) {
                debug!(account = %record.account, line = row.line_number, "excluded ledger account");
                continue;
            }

            records.push(record);
        }

        Ok(records
            .into_iter()
            .enumerate()
            .map(|(i, record)| record.with_id(RecordId(i)))
            .collect())
    }

    /// Load the ledger export from disk
    pub fn load(&self, path: &Path) -> ReconcileResult<Vec<CanonicalRecord>> {
        let rows = read_rows(path)?;
        let records = self.normalize_rows(&rows)?;

        info!(
            path = %path.display(),
            rows = rows.len(),
            kept = records.len(),
            "loaded ledger"
        );

        Ok(records)
    }
}
