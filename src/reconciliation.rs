// ⚖️ Reconciliation Engine - Match ledger entries to statement entries
//
// Algorithm:
//   1. Bucket both sides by exact amount
//   2. For every statement record, pair it with every ledger record of the
//      same bucket dated inside (statement_date - buffer, statement_date + buffer]
//   3. Ledger records never paired are unmatched (tracked by identity, not value)
//
// Matching is one-to-many: a statement record with two ledger
// candidates in its window yields two pairs, and a ledger record may pair
// with several statement records.

use crate::config::DEFAULT_DAYS_BUFFER;
use crate::error::{ReconcileError, ReconcileResult};
use crate::record::{CanonicalRecord, RecordId};
use chrono::Duration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use tracing::{debug, instrument};

// ============================================================================
// RESULT TYPES
// ============================================================================

/// One ledger record joined with one statement record on equal amount and
/// date proximity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchedPair {
    pub ledger: CanonicalRecord,
    pub statement: CanonicalRecord,
}

impl MatchedPair {
    /// Join key shared by both sides
    pub fn amount(&self) -> Decimal {
        self.statement.amount
    }

    /// Statement date minus ledger date, in days
    pub fn date_offset_days(&self) -> i64 {
        (self.statement.date - self.ledger.date).num_days()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnmatchReason {
    /// No ledger record carries this amount at all
    NoAmountMatch,
    /// Ledger records share the amount, none inside the date window
    NoDateMatch,
}

impl UnmatchReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnmatchReason::NoAmountMatch => "No amount match",
            UnmatchReason::NoDateMatch => "No date match",
        }
    }
}

impl fmt::Display for UnmatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnmatchedStatement {
    pub record: CanonicalRecord,
    pub reason: UnmatchReason,
}

// ============================================================================
// RECONCILIATION REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub matched: Vec<MatchedPair>,
    pub unmatched_ledger: Vec<CanonicalRecord>,
    pub unmatched_statement: Vec<UnmatchedStatement>,
    pub days_buffer: u32,
}

impl ReconciliationReport {
    /// Unmatched statement records with the given reason
    pub fn unmatched_with(&self, reason: UnmatchReason) -> impl Iterator<Item = &CanonicalRecord> {
        self.unmatched_statement
            .iter()
            .filter(move |u| u.reason == reason)
            .map(|u| &u.record)
    }

    pub fn summary(&self) -> String {
        format!(
            "Reconciliation (±{} days): {} matched pairs, {} unmatched statement ({} no amount, {} no date), {} unmatched ledger",
            self.days_buffer,
            self.matched.len(),
            self.unmatched_statement.len(),
            self.unmatched_with(UnmatchReason::NoAmountMatch).count(),
            self.unmatched_with(UnmatchReason::NoDateMatch).count(),
            self.unmatched_ledger.len(),
        )
    }
}

// ============================================================================
// RECONCILIATION ENGINE
// ============================================================================

pub struct ReconciliationEngine {
    /// Half-width of the date window in days (default: 3)
    pub days_buffer: u32,
}

impl ReconciliationEngine {
    pub fn new() -> Self {
        ReconciliationEngine {
            days_buffer: DEFAULT_DAYS_BUFFER,
        }
    }

    pub fn with_days_buffer(days_buffer: u32) -> Self {
        ReconciliationEngine { days_buffer }
    }

    /// Reconcile a ledger set against a statement set
    ///
    /// Pure function of its inputs: neither set is modified, and the same
    /// inputs always give the same report in the same order (amount buckets
    /// ascending, set order inside a bucket).
    #[instrument(name = "reconcile", skip_all, fields(ledger = ledger.len(), statements = statements.len(), days_buffer = self.days_buffer))]
    pub fn reconcile(
        &self,
        ledger: &[CanonicalRecord],
        statements: &[CanonicalRecord],
    ) -> ReconcileResult<ReconciliationReport> {
        self.check_preconditions(ledger, statements)?;

        let ledger_buckets = bucket_by_amount(ledger);
        let statement_buckets = bucket_by_amount(statements);

        let mut matched = Vec::new();
        let mut unmatched_statement = Vec::new();
        let mut matched_ledger_ids: HashSet<RecordId> = HashSet::new();

        for (amount, statement_group) in &statement_buckets {
            let ledger_group = match ledger_buckets.get(amount) {
                Some(group) => group,
                None => {
                    debug!(%amount, count = statement_group.len(), "no amount match");
                    unmatched_statement.extend(statement_group.iter().map(|s| UnmatchedStatement {
                        record: (*s).clone(),
                        reason: UnmatchReason::NoAmountMatch,
                    }));
                    continue;
                }
            };

            for statement in statement_group {
                let mut found = false;

                for candidate in ledger_group.iter().filter(|l| self.in_window(statement, l)) {
                    found = true;
                    matched_ledger_ids.insert(candidate.id);
                    matched.push(MatchedPair {
                        ledger: (*candidate).clone(),
                        statement: (*statement).clone(),
                    });
                }

                if !found {
                    unmatched_statement.push(UnmatchedStatement {
                        record: (*statement).clone(),
                        reason: UnmatchReason::NoDateMatch,
                    });
                }
            }
        }

        let unmatched_ledger = ledger
            .iter()
            .filter(|l| !matched_ledger_ids.contains(&l.id))
            .cloned()
            .collect();

        let report = ReconciliationReport {
            matched,
            unmatched_ledger,
            unmatched_statement,
            days_buffer: self.days_buffer,
        };

        debug!("{}", report.summary());

        Ok(report)
    }

    /// Window is `(statement - buffer, statement + buffer]`; a bound past
    /// the calendar range is left open
    fn in_window(&self, statement: &CanonicalRecord, ledger: &CanonicalRecord) -> bool {
        let buffer = Duration::days(i64::from(self.days_buffer));
        let lower = statement.date.checked_sub_signed(buffer);
        let upper = statement.date.checked_add_signed(buffer);

        lower.map_or(true, |lower| ledger.date > lower)
            && upper.map_or(true, |upper| ledger.date <= upper)
    }

    /// Inputs must be normalized: non-empty accounts and unique ledger ids
    fn check_preconditions(
        &self,
        ledger: &[CanonicalRecord],
        statements: &[CanonicalRecord],
    ) -> ReconcileResult<()> {
        for (side, records) in [("ledger", ledger), ("statement", statements)] {
            if let Some(record) = records.iter().find(|r| r.account.trim().is_empty()) {
                return Err(ReconcileError::Precondition(format!(
                    "{} record {} has an empty account; normalize inputs first",
                    side, record.id
                )));
            }
        }

        let mut seen = HashSet::with_capacity(ledger.len());
        for record in ledger {
            if !seen.insert(record.id) {
                return Err(ReconcileError::Precondition(format!(
                    "ledger identity {} assigned to more than one record",
                    record.id
                )));
            }
        }

        Ok(())
    }
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Exact-amount buckets, keys ascending, set order kept within a bucket
fn bucket_by_amount(records: &[CanonicalRecord]) -> BTreeMap<Decimal, Vec<&CanonicalRecord>> {
    let mut buckets: BTreeMap<Decimal, Vec<&CanonicalRecord>> = BTreeMap::new();
    for record in records {
        buckets.entry(record.amount).or_default().push(record);
    }
    buckets
}

// ============================================================================
// TESTS
// ============================================================================
