// 📤 CSV Export
// Writes the combined statements, filtered ledger, match results and
// duplicate report as fixed-name CSV files.

use crate::deduplication::{DuplicateReport, SetKind};
use crate::error::ReconcileResult;
use crate::reconciliation::{MatchedPair, ReconciliationReport, UnmatchedStatement};
use crate::record::CanonicalRecord;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const COMBINED_STATEMENTS_FILE: &str = "Combined_Card_Statements.csv";
pub const FILTERED_LEDGER_FILE: &str = "filtered_ynab_data.csv";
pub const UNMATCHED_STATEMENT_FILE: &str = "unmatched_statement_rows.csv";
pub const UNMATCHED_LEDGER_FILE: &str = "unmatched_ynab_rows.csv";
pub const MATCHED_FILE: &str = "matched_rows.csv";
pub const DUPLICATES_FILE: &str = "duplicate_rows.csv";

const DATE_FORMAT: &str = "%Y-%m-%d";
const EMPTY_AMOUNT: &str = "0.0";

const RECORD_HEADER: &[&str] = &[
    "Date",
    "Account",
    "Category",
    "Payee",
    "Description",
    "Inflow",
    "Outflow",
    "Status",
];

const UNMATCHED_STATEMENT_HEADER: &[&str] = &[
    "Date",
    "Account",
    "Category",
    "Payee",
    "Description",
    "Inflow",
    "Outflow",
    "Status",
    "Reason",
];

const MATCHED_HEADER: &[&str] = &[
    "Amount",
    "Date_YNAB",
    "Account_YNAB",
    "Category_YNAB",
    "Payee_YNAB",
    "Description_YNAB",
    "Status_YNAB",
    "Date_Statement",
    "Account_Statement",
    "Category_Statement",
    "Payee_Statement",
    "Description_Statement",
    "Status_Statement",
];

// ============================================================================
// ROW SHAPES
// ============================================================================

#[derive(Debug, Serialize)]
struct RecordRow<'a> {
    date: String,
    account: &'a str,
    category: Option<&'a str>,
    payee: Option<&'a str>,
    description: Option<&'a str>,
    inflow: String,
    outflow: String,
    status: Option<&'a str>,
}

impl<'a> From<&'a CanonicalRecord> for RecordRow<'a> {
    fn from(record: &'a CanonicalRecord) -> Self {
        RecordRow {
            date: record.date.format(DATE_FORMAT).to_string(),
            account: &record.account,
            category: record.category.as_deref(),
            payee: record.payee.as_deref(),
            description: record.description.as_deref(),
            inflow: amount_cell(record.inflow()),
            outflow: amount_cell(record.outflow()),
            status: record.status.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
struct UnmatchedStatementRow<'a> {
    date: String,
    account: &'a str,
    category: Option<&'a str>,
    payee: Option<&'a str>,
    description: Option<&'a str>,
    inflow: String,
    outflow: String,
    status: Option<&'a str>,
    reason: &'static str,
}

impl<'a> From<&'a UnmatchedStatement> for UnmatchedStatementRow<'a> {
    fn from(unmatched: &'a UnmatchedStatement) -> Self {
        let RecordRow {
            date,
            account,
            category,
            payee,
            description,
            inflow,
            outflow,
            status,
        } = RecordRow::from(&unmatched.record);

        UnmatchedStatementRow {
            date,
            account,
            category,
            payee,
            description,
            inflow,
            outflow,
            status,
            reason: unmatched.reason.as_str(),
        }
    }
}

/// One side of a matched/duplicate row; all empty when the side is absent
#[derive(Debug, Default)]
struct Side<'a> {
    date: String,
    account: &'a str,
    category: Option<&'a str>,
    payee: Option<&'a str>,
    description: Option<&'a str>,
    status: Option<&'a str>,
}

impl<'a> From<Option<&'a CanonicalRecord>> for Side<'a> {
    fn from(record: Option<&'a CanonicalRecord>) -> Self {
        record.map_or_else(Side::default, |record| Side {
            date: record.date.format(DATE_FORMAT).to_string(),
            account: &record.account,
            category: record.category.as_deref(),
            payee: record.payee.as_deref(),
            description: record.description.as_deref(),
            status: record.status.as_deref(),
        })
    }
}

#[derive(Debug, Serialize)]
struct MatchedRow<'a> {
    amount: Decimal,
    date_ynab: String,
    account_ynab: &'a str,
    category_ynab: Option<&'a str>,
    payee_ynab: Option<&'a str>,
    description_ynab: Option<&'a str>,
    status_ynab: Option<&'a str>,
    date_statement: String,
    account_statement: &'a str,
    category_statement: Option<&'a str>,
    payee_statement: Option<&'a str>,
    description_statement: Option<&'a str>,
    status_statement: Option<&'a str>,
}

impl<'a> MatchedRow<'a> {
    fn new(
        amount: Decimal,
        ledger: Option<&'a CanonicalRecord>,
        statement: Option<&'a CanonicalRecord>,
    ) -> Self {
        let ledger = Side::from(ledger);
        let statement = Side::from(statement);

        MatchedRow {
            amount,
            date_ynab: ledger.date,
            account_ynab: ledger.account,
            category_ynab: ledger.category,
            payee_ynab: ledger.payee,
            description_ynab: ledger.description,
            status_ynab: ledger.status,
            date_statement: statement.date,
            account_statement: statement.account,
            category_statement: statement.category,
            payee_statement: statement.payee,
            description_statement: statement.description,
            status_statement: statement.status,
        }
    }
}

impl<'a> From<&'a MatchedPair> for MatchedRow<'a> {
    fn from(pair: &'a MatchedPair) -> Self {
        MatchedRow::new(pair.amount(), Some(&pair.ledger), Some(&pair.statement))
    }
}

/// `Set` and `Group` followed by the matched layout
#[derive(Debug, Serialize)]
struct DuplicateRow<'a> {
    set: &'static str,
    group: usize,
    amount: Decimal,
    date_ynab: String,
    account_ynab: &'a str,
    category_ynab: Option<&'a str>,
    payee_ynab: Option<&'a str>,
    description_ynab: Option<&'a str>,
    status_ynab: Option<&'a str>,
    date_statement: String,
    account_statement: &'a str,
    category_statement: Option<&'a str>,
    payee_statement: Option<&'a str>,
    description_statement: Option<&'a str>,
    status_statement: Option<&'a str>,
}

impl<'a> DuplicateRow<'a> {
    fn new(set: SetKind, group: usize, row: MatchedRow<'a>) -> Self {
        DuplicateRow {
            set: set.as_str(),
            group,
            amount: row.amount,
            date_ynab: row.date_ynab,
            account_ynab: row.account_ynab,
            category_ynab: row.category_ynab,
            payee_ynab: row.payee_ynab,
            description_ynab: row.description_ynab,
            status_ynab: row.status_ynab,
            date_statement: row.date_statement,
            account_statement: row.account_statement,
            category_statement: row.category_statement,
            payee_statement: row.payee_statement,
            description_statement: row.description_statement,
            status_statement: row.status_statement,
        }
    }
}

fn amount_cell(value: Option<Decimal>) -> String {
    value.map_or_else(|| EMPTY_AMOUNT.to_string(), |v| v.to_string())
}

// ============================================================================
// WRITERS
// ============================================================================

/// Write `header` then every row; returns the row count.
///
/// The header is written explicitly so an empty result still produces a
/// file with column names. Rows are written positionally and must line up
/// with `header`.
fn write_csv<T: Serialize>(
    path: &Path,
    header: &[&str],
    rows: impl IntoIterator<Item = T>,
) -> ReconcileResult<usize> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;

    writer.write_record(header)?;

    let mut count = 0;
    for row in rows {
        writer.serialize(row)?;
        count += 1;
    }
    writer.flush()?;

    debug!(path = %path.display(), rows = count, "wrote csv");
    Ok(count)
}

pub fn write_records(path: &Path, records: &[CanonicalRecord]) -> ReconcileResult<usize> {
    write_csv(path, RECORD_HEADER, records.iter().map(RecordRow::from))
}

pub fn write_unmatched_statements(
    path: &Path,
    unmatched: &[UnmatchedStatement],
) -> ReconcileResult<usize> {
    write_csv(
        path,
        UNMATCHED_STATEMENT_HEADER,
        unmatched.iter().map(UnmatchedStatementRow::from),
    )
}

pub fn write_matched(path: &Path, matched: &[MatchedPair]) -> ReconcileResult<usize> {
    write_csv(path, MATCHED_HEADER, matched.iter().map(MatchedRow::from))
}

/// Ledger duplicates fill the `_YNAB` side, statement duplicates the
/// `_Statement` side, matched duplicates both. Group numbers start at 1
/// and run across the whole report.
pub fn write_duplicates(path: &Path, report: &DuplicateReport) -> ReconcileResult<usize> {
    let mut header = vec!["Set", "Group"];
    header.extend_from_slice(MATCHED_HEADER);

    let mut rows = Vec::with_capacity(report.row_count());
    let mut group = 0;

    for (kind, groups) in [
        (SetKind::Statement, &report.statement),
        (SetKind::Ledger, &report.ledger),
    ] {
        for g in groups {
            group += 1;
            rows.extend(g.members.iter().map(|member| duplicate_record_row(kind, group, member)));
        }
    }

    for g in &report.matched {
        group += 1;
        rows.extend(
            g.members
                .iter()
                .map(|pair| DuplicateRow::new(SetKind::Matched, group, MatchedRow::from(pair))),
        );
    }

    write_csv(path, &header, rows)
}

fn duplicate_record_row(kind: SetKind, group: usize, record: &CanonicalRecord) -> DuplicateRow<'_> {
    let row = match kind {
        SetKind::Ledger => MatchedRow::new(record.amount, Some(record), None),
        SetKind::Statement | SetKind::Matched => MatchedRow::new(record.amount, None, Some(record)),
    };
    DuplicateRow::new(kind, group, row)
}

// ============================================================================
// EXPORT BUNDLE
// ============================================================================

/// Everything one run writes
pub struct ExportBundle<'a> {
    pub statements: &'a [CanonicalRecord],
    pub ledger: &'a [CanonicalRecord],
    pub reconciliation: &'a ReconciliationReport,
    pub duplicates: &'a DuplicateReport,
}

#[derive(Debug, Clone)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub rows: usize,
}

/// Write all six output files into `output_dir`, creating it if missing
pub fn write_all(output_dir: &Path, bundle: &ExportBundle<'_>) -> ReconcileResult<Vec<WrittenFile>> {
    fs::create_dir_all(output_dir)?;

    let mut written = Vec::new();
    let mut record = |name: &str, rows: usize| {
        written.push(WrittenFile {
            path: output_dir.join(name),
            rows,
        });
    };

    record(
        COMBINED_STATEMENTS_FILE,
        write_records(&output_dir.join(COMBINED_STATEMENTS_FILE), bundle.statements)?,
    );
    record(
        FILTERED_LEDGER_FILE,
        write_records(&output_dir.join(FILTERED_LEDGER_FILE), bundle.ledger)?,
    );
    record(
        UNMATCHED_STATEMENT_FILE,
        write_unmatched_statements(
            &output_dir.join(UNMATCHED_STATEMENT_FILE),
            &bundle.reconciliation.unmatched_statement,
        )?,
    );
    record(
        UNMATCHED_LEDGER_FILE,
        write_records(
            &output_dir.join(UNMATCHED_LEDGER_FILE),
            &bundle.reconciliation.unmatched_ledger,
        )?,
    );
    record(
        MATCHED_FILE,
        write_matched(&output_dir.join(MATCHED_FILE), &bundle.reconciliation.matched)?,
    );
    record(
        DUPLICATES_FILE,
        write_duplicates(&output_dir.join(DUPLICATES_FILE), bundle.duplicates)?,
    );

    info!(dir = %output_dir.display(), files = written.len(), "wrote output files");
    Ok(written)
}

// ============================================================================
// TESTS
// ============================================================================
