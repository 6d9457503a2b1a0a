// 🏗️ Parser Framework - Statement format adapters
// One adapter per bank/card export layout, dispatched by filename prefix

use crate::error::{ReconcileError, ReconcileResult};
use crate::record::{CanonicalRecord, RawRow};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

// ============================================================================
// CORE TYPES
// ============================================================================

/// SourceType - Which bank or card produced a statement file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceType {
    Amazon,
    CapitalOne,
    Discover,
    UsaaVisa,
    UsaaChecking,
    BankOfAmerica,
}

impl SourceType {
    /// Human-readable name for display
    pub fn name(&self) -> &str {
        match self {
            SourceType::Amazon => "Amazon Card",
            SourceType::CapitalOne => "Capital One",
            SourceType::Discover => "Discover",
            SourceType::UsaaVisa => "USAA Visa",
            SourceType::UsaaChecking => "USAA Checking",
            SourceType::BankOfAmerica => "Bank of America",
        }
    }

    /// Filename prefix that selects this source
    pub fn prefix(&self) -> &'static str {
        match self {
            SourceType::Amazon => "AMZ",
            SourceType::CapitalOne => "CapitalOne",
            SourceType::Discover => "Discover",
            SourceType::UsaaVisa => "USAAVisa",
            SourceType::UsaaChecking => "USAAChecking",
            SourceType::BankOfAmerica => "BOA",
        }
    }
}

/// Canonical column names every adapter renames into
pub mod columns {
    pub const DATE: &str = "Date";
    pub const CATEGORY: &str = "Category";
    pub const PAYEE: &str = "Payee";
    pub const DESCRIPTION: &str = "Description";
    pub const AMOUNT: &str = "Amount";
    pub const STATUS: &str = "Status";
}

// ============================================================================
// STATEMENT PARSER TRAIT
// ============================================================================

/// StatementParser - Turns one statement row into a canonical record
///
/// Adding a bank means implementing this trait and registering the parser;
/// the reconciliation engine never sees raw column names.
pub trait StatementParser: Send + Sync {
    /// Get the source type this parser handles
    fn source_type(&self) -> SourceType;

    /// Account label stamped on every record from this source
    fn account_label(&self) -> &str;

    /// Source column → canonical column renames
    fn column_map(&self) -> &[(&'static str, &'static str)];

    /// Filename prefix this parser claims
    fn prefix(&self) -> &str {
        self.source_type().prefix()
    }

    /// Signed amount of a renamed row (positive = inflow)
    fn amount(&self, row: &RawRow) -> ReconcileResult<Decimal> {
        row.amount(columns::AMOUNT)?
            .ok_or_else(|| row.error(columns::AMOUNT, "value is empty"))
    }

    /// Rename columns, stamp the account and build the canonical record
    fn normalize(&self, row: &RawRow) -> ReconcileResult<CanonicalRecord> {
        let mut row = row.clone();
        row.rename_columns(self.column_map());

        let date = row.date(columns::DATE)?;
        let amount = self.amount(&row)?;

        Ok(CanonicalRecord::new(date, self.account_label(), amount)
            .with_category(row.text(columns::CATEGORY))
            .with_payee(row.text(columns::PAYEE))
            .with_description(row.text(columns::DESCRIPTION))
            .with_status(row.text(columns::STATUS)))
    }
}

// ============================================================================
// ADAPTERS
// ============================================================================

/// Amazon store card
pub struct AmazonParser;

impl StatementParser for AmazonParser {
    fn source_type(&self) -> SourceType {
        SourceType::Amazon
    }

    fn account_label(&self) -> &str {
        "Amazon Card"
    }

    fn column_map(&self) -> &[(&'static str, &'static str)] {
        &[("Transaction Date", columns::DATE), ("Description", columns::PAYEE)]
    }
}

/// Capital One card - separate Debit/Credit magnitude columns
pub struct CapitalOneParser;

impl StatementParser for CapitalOneParser {
    fn source_type(&self) -> SourceType {
        SourceType::CapitalOne
    }

    fn account_label(&self) -> &str {
        "CapitalOne"
    }

    fn column_map(&self) -> &[(&'static str, &'static str)] {
        &[("Transaction Date", columns::DATE)]
    }

    /// Credit wins when positive, otherwise a positive Debit becomes an
    /// outflow. A row with neither is a zero-amount entry.
    fn amount(&self, row: &RawRow) -> ReconcileResult<Decimal> {
        let debit = row.amount("Debit")?.unwrap_or(Decimal::ZERO);
        let credit = row.amount("Credit")?.unwrap_or(Decimal::ZERO);

        if credit > Decimal::ZERO {
            Ok(credit)
        } else if debit > Decimal::ZERO {
            Ok(-debit)
        } else {
            Ok(Decimal::ZERO)
        }
    }
}

/// Discover card
pub struct DiscoverParser;

impl StatementParser for DiscoverParser {
    fn source_type(&self) -> SourceType {
        SourceType::Discover
    }

    fn account_label(&self) -> &str {
        "Discover Card"
    }

    fn column_map(&self) -> &[(&'static str, &'static str)] {
        &[("Trans. Date", columns::DATE), ("Description", columns::PAYEE)]
    }
}

/// USAA Visa card
pub struct UsaaVisaParser;

impl StatementParser for UsaaVisaParser {
    fn source_type(&self) -> SourceType {
        SourceType::UsaaVisa
    }

    fn account_label(&self) -> &str {
        "USAA Card"
    }

    fn column_map(&self) -> &[(&'static str, &'static str)] {
        &[
            ("date", columns::DATE),
            ("Cat", columns::CATEGORY),
            ("Original Description", columns::PAYEE),
        ]
    }
}

/// USAA checking account
pub struct UsaaCheckingParser;

impl StatementParser for UsaaCheckingParser {
    fn source_type(&self) -> SourceType {
        SourceType::UsaaChecking
    }

    fn account_label(&self) -> &str {
        "USAA Checking"
    }

    fn column_map(&self) -> &[(&'static str, &'static str)] {
        &[
            ("Transaction Date", columns::DATE),
            ("Cat", columns::CATEGORY),
            ("Original Description", columns::PAYEE),
        ]
    }
}

/// Bank of America
pub struct BofAParser;

impl StatementParser for BofAParser {
    fn source_type(&self) -> SourceType {
        SourceType::BankOfAmerica
    }

    fn account_label(&self) -> &str {
        "BOA"
    }

    fn column_map(&self) -> &[(&'static str, &'static str)] {
        &[("Posted Date", columns::DATE)]
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

/// Prefix → parser registry
///
/// Parsers are registered explicitly. Lookup picks the longest registered
/// prefix that the filename starts with, so overlapping prefixes resolve to
/// the most specific parser.
#[derive(Default)]
pub struct ParserRegistry {
    parsers: Vec<Box<dyn StatementParser>>,
}

impl ParserRegistry {
    /// Empty registry
    pub fn new() -> Self {
        ParserRegistry { parsers: Vec::new() }
    }

    /// Registry with every built-in statement format
    pub fn with_defaults() -> Self {
        let mut registry = ParserRegistry::new();
        registry.register(Box::new(AmazonParser));
        registry.register(Box::new(CapitalOneParser));
        registry.register(Box::new(DiscoverParser));
        registry.register(Box::new(UsaaVisaParser));
        registry.register(Box::new(UsaaCheckingParser));
        registry.register(Box::new(BofAParser));
        registry
    }

    pub fn register(&mut self, parser: Box<dyn StatementParser>) {
        self.parsers.push(parser);
    }

    /// Find the parser for a statement file name
    pub fn parser_for(&self, file_name: &str) -> ReconcileResult<&dyn StatementParser> {
        self.parsers
            .iter()
            .filter(|p| file_name.starts_with(p.prefix()))
            .max_by_key(|p| p.prefix().len())
            .map(|p| &**p)
            .ok_or_else(|| ReconcileError::UnrecognizedFormat {
                file: file_name.to_string(),
            })
    }

    /// Registered source types, in registration order
    pub fn sources(&self) -> Vec<SourceType> {
        self.parsers.iter().map(|p| p.source_type()).collect()
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}

// ============================================================================
// CSV READING
// ============================================================================

/// Read a CSV file into header-keyed rows
///
/// Any failure to open or tokenize the file (missing file, ragged rows,
/// invalid UTF-8) is reported as `UnreadableFile`.
pub fn read_rows(file_path: &Path) -> ReconcileResult<Vec<RawRow>> {
    let unreadable = |reason: String| ReconcileError::UnreadableFile {
        path: file_path.to_path_buf(),
        reason,
    };

    let file = File::open(file_path).map_err(|e| unreadable(e.to_string()))?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(file);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| unreadable(e.to_string()))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(unreadable("no header row".to_string()));
    }

    let filename = file_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown.csv")
        .to_string();

    let mut rows = Vec::new();

    for (line_num, result) in reader.records().enumerate() {
        let record = result.map_err(|e| unreadable(e.to_string()))?;

        let mut row = RawRow::new(filename.clone(), line_num + 2); // +2: 1-indexed + header row
        for (header, value) in headers.iter().zip(record.iter()) {
            row.fields.insert(header.clone(), value.to_string());
        }
        rows.push(row);
    }

    Ok(rows)
}

// ============================================================================
// TESTS
// ============================================================================
