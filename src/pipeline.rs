// 🔄 Reconciliation pipeline
// statements dir + ledger file → match results → output CSVs

use crate::aggregator::StatementAggregator;
use crate::config::ReconcileConfig;
use crate::deduplication::DuplicateReport;
use crate::error::ReconcileResult;
use crate::export::{self, ExportBundle, WrittenFile};
use crate::ledger::LedgerNormalizer;
use crate::parser::ParserRegistry;
use crate::reconciliation::{ReconciliationEngine, ReconciliationReport};
use crate::record::CanonicalRecord;
use anyhow::Context;
use tracing::info;

/// Match results and duplicate report for one pair of sets
#[derive(Debug, Clone)]
pub struct ReconcileOutput {
    pub reconciliation: ReconciliationReport,
    pub duplicates: DuplicateReport,
}

/// Reconcile already-normalized sets. No I/O.
pub fn reconcile_sets(
    statements: &[CanonicalRecord],
    ledger: &[CanonicalRecord],
    days_buffer: u32,
) -> ReconcileResult<ReconcileOutput> {
    let reconciliation = ReconciliationEngine::with_days_buffer(days_buffer).reconcile(ledger, statements)?;
    let duplicates = DuplicateReport::collect(statements, ledger, &reconciliation.matched);

    Ok(ReconcileOutput {
        reconciliation,
        duplicates,
    })
}

/// Totals for the CLI report
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub statement_files_loaded: usize,
    pub statement_files_skipped: usize,
    pub statement_rows: usize,
    pub ledger_rows: usize,
    pub matched: usize,
    pub unmatched_statement: usize,
    pub unmatched_ledger: usize,
    pub duplicate_rows: usize,
    pub written: Vec<WrittenFile>,
}

/// Run a full reconciliation from disk to disk
pub fn run(config: &ReconcileConfig) -> anyhow::Result<RunOutcome> {
    info!(
        ledger = %config.ledger_path.display(),
        statements = %config.statements_dir.display(),
        start = %config.date_range.start,
        end = %config.date_range.end,
        days_buffer = config.days_buffer,
        "starting reconciliation"
    );

    let aggregator = StatementAggregator::new(ParserRegistry::with_defaults(), config.date_range);
    let aggregation = aggregator.aggregate(&config.statements_dir).with_context(|| {
        format!(
            "Failed to aggregate statements in {}",
            config.statements_dir.display()
        )
    })?;

    let ledger = LedgerNormalizer::new(config.date_range)
        .with_excluded_accounts(config.excluded_accounts.clone())
        .load(&config.ledger_path)
        .with_context(|| format!("Failed to load ledger {}", config.ledger_path.display()))?;

    let output = reconcile_sets(&aggregation.records, &ledger, config.days_buffer)
        .context("Reconciliation failed")?;

    let written = export::write_all(
        &config.output_dir,
        &ExportBundle {
            statements: &aggregation.records,
            ledger: &ledger,
            reconciliation: &output.reconciliation,
            duplicates: &output.duplicates,
        },
    )
    .with_context(|| format!("Failed to write results to {}", config.output_dir.display()))?;

    info!("{}", output.reconciliation.summary());

    Ok(RunOutcome {
        statement_files_loaded: aggregation.loaded_files(),
        statement_files_skipped: aggregation.skipped_files(),
        statement_rows: aggregation.records.len(),
        ledger_rows: ledger.len(),
        matched: output.reconciliation.matched.len(),
        unmatched_statement: output.reconciliation.unmatched_statement.len(),
        unmatched_ledger: output.reconciliation.unmatched_ledger.len(),
        duplicate_rows: output.duplicates.row_count(),
        written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordId;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn record(id: usize, day: u32, account: &str, amount: rust_decimal::Decimal) -> CanonicalRecord {
        CanonicalRecord::new(NaiveDate::from_ymd_opt(2024, 3, day).unwrap(), account, amount)
            .with_id(RecordId(id))
    }

    #[test]
    fn test_reconcile_sets_collects_duplicates() {
        let statements = vec![
            record(0, 10, "BOA", dec!(-42.00)),
            record(1, 10, "BOA", dec!(-42.00)),
        ];
        let ledger = vec![record(0, 9, "BOA", dec!(-42.00))];

        let output = reconcile_sets(&statements, &ledger, 3).unwrap();

        assert_eq!(output.reconciliation.matched.len(), 2);
        assert!(output.reconciliation.unmatched_ledger.is_empty());
        // Both statement copies and both identical pairs are reported
        assert_eq!(output.duplicates.statement.len(), 1);
        assert_eq!(output.duplicates.matched.len(), 1);
        assert_eq!(output.duplicates.row_count(), 4);
    }

    #[test]
    fn test_reconcile_sets_surfaces_precondition() {
        let ledger = vec![record(0, 9, "", dec!(-1.00))];
        assert!(reconcile_sets(&[], &ledger, 3).is_err());
    }
}
