// 🗂️ Statement Aggregator
// Reads every statement export in a directory, normalizes it with the
// matching adapter and folds the batches into one canonical set.

use crate::config::DateRange;
use crate::error::{ReconcileError, ReconcileResult};
use crate::parser::{read_rows, ParserRegistry};
use crate::record::{CanonicalRecord, RecordId};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

// ============================================================================
// SET BUILDER
// ============================================================================

/// Folds per-file batches into one immutable statement set.
///
/// Insertion order is preserved; ids are assigned in that order on `build`.
#[derive(Debug, Default)]
pub struct StatementSetBuilder {
    records: Vec<CanonicalRecord>,
}

impl StatementSetBuilder {
    pub fn new() -> Self {
        StatementSetBuilder::default()
    }

    pub fn push_batch(mut self, batch: Vec<CanonicalRecord>) -> Self {
        self.records.extend(batch);
        self
    }

    pub fn build(self) -> Vec<CanonicalRecord> {
        self.records
            .into_iter()
            .enumerate()
            .map(|(i, record)| record.with_id(RecordId(i)))
            .collect()
    }
}

// ============================================================================
// AGGREGATION SUMMARY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Parsed; `kept` rows survived the date filter
    Loaded { rows: usize, kept: usize },
    Skipped { reason: String },
}

#[derive(Debug, Clone)]
pub struct FileReport {
    pub file_name: String,
    pub outcome: FileOutcome,
}

#[derive(Debug, Clone)]
pub struct AggregationSummary {
    pub records: Vec<CanonicalRecord>,
    pub files: Vec<FileReport>,
}

impl AggregationSummary {
    pub fn loaded_files(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, FileOutcome::Loaded { .. }))
            .count()
    }

    pub fn skipped_files(&self) -> usize {
        self.files.len() - self.loaded_files()
    }
}

// ============================================================================
// AGGREGATOR
// ============================================================================

pub struct StatementAggregator {
    registry: ParserRegistry,
    date_range: DateRange,
}

impl StatementAggregator {
    pub fn new(registry: ParserRegistry, date_range: DateRange) -> Self {
        debug!(sources = ?registry.sources(), "statement formats registered");
        StatementAggregator { registry, date_range }
    }

    /// Aggregate every recognized statement file in `dir`.
    ///
    /// Non-files, unknown prefixes and non-CSV files are skipped with a
    /// warning. A normalization failure inside a recognized file aborts the
    /// whole aggregation.
    pub fn aggregate(&self, dir: &Path) -> ReconcileResult<AggregationSummary> {
        let entries = fs::read_dir(dir).map_err(|e| ReconcileError::UnreadableFile {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry.path()),
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "skipping unreadable directory entry");
                    None
                }
            })
            .collect();
        paths.sort();

        let mut batches = Vec::new();
        let mut files = Vec::new();

        for path in paths {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            match self.load_file(&path) {
                Ok((rows, batch)) => {
                    info!(file = %file_name, rows, kept = batch.len(), "loaded statement file");
                    files.push(FileReport {
                        file_name,
                        outcome: FileOutcome::Loaded { rows, kept: batch.len() },
                    });
                    batches.push(batch);
                }
                Err(e) if e.is_skippable() => {
                    warn!(file = %file_name, "skipped: {}", e);
                    files.push(FileReport {
                        file_name,
                        outcome: FileOutcome::Skipped { reason: e.to_string() },
                    });
                }
                Err(e) => return Err(e),
            }
        }

        let records = batches
            .into_iter()
            .fold(StatementSetBuilder::new(), StatementSetBuilder::push_batch)
            .build();

        Ok(AggregationSummary { records, files })
    }

    /// Normalize one statement file; returns (rows read, rows kept)
    pub fn load_file(&self, path: &Path) -> ReconcileResult<(usize, Vec<CanonicalRecord>)> {
        if !path.is_file() {
            return Err(ReconcileError::UnreadableFile {
                path: path.to_path_buf(),
                reason: "not a regular file".to_string(),
            });
        }

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("");
        let parser = self.registry.parser_for(file_name)?;
        debug!(file = file_name, source = parser.source_type().name(), "reading statement file");

        let rows = read_rows(path)?;

        let mut kept = Vec::new();
        for row in &rows {
            let record = parser.normalize(row)?;
            if self.date_range.contains(record.date) {
                kept.push(record);
            }
        }

        Ok((rows.len(), kept))
    }
}

// ============================================================================
// TESTS
// ============================================================================
