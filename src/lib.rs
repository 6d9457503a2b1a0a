// Statement Reconciler - Core Library
// Exposes all modules for use in the CLI and tests

pub mod aggregator;
pub mod config;
pub mod deduplication;
pub mod error;
pub mod export;
pub mod ledger;
pub mod parser;
pub mod pipeline;
pub mod reconciliation;
pub mod record;

// Re-export commonly used types
pub use aggregator::{AggregationSummary, FileOutcome, FileReport, StatementAggregator, StatementSetBuilder};
pub use config::{DateRange, ReconcileConfig};
pub use deduplication::{DuplicateDetector, DuplicateGroup, DuplicateReport, Fingerprint, SetKind};
pub use error::{ReconcileError, ReconcileResult};
pub use export::{write_all, ExportBundle, WrittenFile};
pub use ledger::LedgerNormalizer;
pub use parser::{
    AmazonParser, BofAParser, CapitalOneParser, DiscoverParser, ParserRegistry, SourceType,
    StatementParser, UsaaCheckingParser, UsaaVisaParser,
};
pub use pipeline::{reconcile_sets, run, ReconcileOutput, RunOutcome};
pub use reconciliation::{
    MatchedPair, ReconciliationEngine, ReconciliationReport, UnmatchReason, UnmatchedStatement,
};
pub use record::{CanonicalRecord, RawRow, RecordId};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
