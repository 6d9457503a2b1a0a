// 🔍 Duplicate Detector - Exact full-row duplicates within one set
//
// Reporting only: the scanned set is never modified. Every member of a
// duplicate group is reported (a row seen 3 times appears 3 times).

use crate::reconciliation::MatchedPair;
use crate::record::CanonicalRecord;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;

// ============================================================================
// FINGERPRINT
// ============================================================================

/// Content hash used to find identical rows.
///
/// Must ignore identity tokens: two independent rows with the same content
/// are duplicates.
pub trait Fingerprint {
    fn fingerprint(&self) -> String;
}

impl Fingerprint for CanonicalRecord {
    fn fingerprint(&self) -> String {
        self.content_fingerprint()
    }
}

impl Fingerprint for MatchedPair {
    fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        self.ledger.feed_content(&mut hasher);
        hasher.update(b"\x1e");
        self.statement.feed_content(&mut hasher);
        format!("{:x}", hasher.finalize())
    }
}

// ============================================================================
// DUPLICATE GROUP
// ============================================================================

/// Which set a duplicate group was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SetKind {
    Statement,
    Ledger,
    Matched,
}

impl SetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SetKind::Statement => "Statement",
            SetKind::Ledger => "YNAB",
            SetKind::Matched => "Matched",
        }
    }
}

impl fmt::Display for SetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Two or more rows identical across every canonical field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup<T> {
    pub fingerprint: String,
    /// Positions of the members in the scanned set
    pub positions: Vec<usize>,
    pub members: Vec<T>,
}

impl<T> DuplicateGroup<T> {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

// ============================================================================
// DETECTOR
// ============================================================================

pub struct DuplicateDetector;

impl DuplicateDetector {
    /// Find every group of identical rows in `rows`
    ///
    /// Groups are ordered by their first occurrence; members keep set order.
    pub fn find_duplicates<T: Fingerprint + Clone>(rows: &[T]) -> Vec<DuplicateGroup<T>> {
        let mut order: Vec<String> = Vec::new();
        let mut positions: HashMap<String, Vec<usize>> = HashMap::new();

        for (i, row) in rows.iter().enumerate() {
            let fingerprint = row.fingerprint();
            let entry = positions.entry(fingerprint.clone()).or_default();
            if entry.is_empty() {
                order.push(fingerprint);
            }
            entry.push(i);
        }

        order
            .into_iter()
            .filter_map(|fingerprint| {
                let group_positions = positions.remove(&fingerprint)?;
                if group_positions.len() < 2 {
                    return None;
                }
                let members = group_positions.iter().map(|&i| rows[i].clone()).collect();
                Some(DuplicateGroup {
                    fingerprint,
                    positions: group_positions,
                    members,
                })
            })
            .collect()
    }
}

// ============================================================================
// DUPLICATE REPORT
// ============================================================================

/// Duplicate groups from the statement, ledger and matched sets
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DuplicateReport {
    pub statement: Vec<DuplicateGroup<CanonicalRecord>>,
    pub ledger: Vec<DuplicateGroup<CanonicalRecord>>,
    pub matched: Vec<DuplicateGroup<MatchedPair>>,
}

impl DuplicateReport {
    pub fn collect(
        statements: &[CanonicalRecord],
        ledger: &[CanonicalRecord],
        matched: &[MatchedPair],
    ) -> Self {
        DuplicateReport {
            statement: DuplicateDetector::find_duplicates(statements),
            ledger: DuplicateDetector::find_duplicates(ledger),
            matched: DuplicateDetector::find_duplicates(matched),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.statement.is_empty() && self.ledger.is_empty() && self.matched.is_empty()
    }

    pub fn group_count(&self) -> usize {
        self.statement.len() + self.ledger.len() + self.matched.len()
    }

    /// Total reported rows across all groups
    pub fn row_count(&self) -> usize {
        let records: usize = self
            .statement
            .iter()
            .chain(self.ledger.iter())
            .map(DuplicateGroup::len)
            .sum();
        let pairs: usize = self.matched.iter().map(DuplicateGroup::len).sum();
        records + pairs
    }

    pub fn groups_in(&self, kind: SetKind) -> usize {
        match kind {
            SetKind::Statement => self.statement.len(),
            SetKind::Ledger => self.ledger.len(),
            SetKind::Matched => self.matched.len(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordId;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn create_test_record(id: usize, date: &str, amount: Decimal, payee: &str) -> CanonicalRecord {
        CanonicalRecord::new(NaiveDate::parse_from_str(date, "%m/%d/%Y").unwrap(), "Discover Card", amount)
            .with_payee(Some(payee.to_string()))
            .with_category(Some("Groceries".to_string()))
            .with_id(RecordId(id))
    }

    #[test]
    fn test_exact_duplicates_keep_none() {
        let rows = vec![
            create_test_record(0, "12/25/2024", dec!(-45.99), "Starbucks"),
            create_test_record(1, "12/25/2024", dec!(-45.99), "Starbucks"),
            create_test_record(2, "12/26/2024", dec!(-3.00), "Parking"),
            create_test_record(3, "12/25/2024", dec!(-45.99), "Starbucks"),
        ];

        let groups = DuplicateDetector::find_duplicates(&rows);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 3);
        assert_eq!(groups[0].positions, vec![0, 1, 3]);
        let ids: Vec<_> = groups[0].members.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![RecordId(0), RecordId(1), RecordId(3)]);
    }

    #[test]
    fn test_near_duplicates_are_not_duplicates() {
        let rows = vec![
            create_test_record(0, "12/25/2024", dec!(-45.99), "Starbucks"),
            create_test_record(1, "12/26/2024", dec!(-45.99), "Starbucks"),
            create_test_record(2, "12/25/2024", dec!(-46.00), "Starbucks"),
            create_test_record(3, "12/25/2024", dec!(-45.99), "STARBUCKS"),
            create_test_record(4, "12/25/2024", dec!(-45.99), "Starbucks").with_status(Some("Pending".to_string())),
        ];

        assert!(DuplicateDetector::find_duplicates(&rows).is_empty());
    }

    #[test]
    fn test_groups_ordered_by_first_occurrence() {
        let rows = vec![
            create_test_record(0, "12/26/2024", dec!(-3.00), "Parking"),
            create_test_record(1, "12/25/2024", dec!(-45.99), "Starbucks"),
            create_test_record(2, "12/25/2024", dec!(-45.99), "Starbucks"),
            create_test_record(3, "12/26/2024", dec!(-3.00), "Parking"),
        ];

        let groups = DuplicateDetector::find_duplicates(&rows);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].positions, vec![0, 3]);
        assert_eq!(groups[1].positions, vec![1, 2]);
    }

    #[test]
    fn test_idempotent_and_non_destructive() {
        let rows = vec![
            create_test_record(0, "12/25/2024", dec!(-45.99), "Starbucks"),
            create_test_record(1, "12/25/2024", dec!(-45.99), "Starbucks"),
            create_test_record(2, "12/26/2024", dec!(-3.00), "Parking"),
        ];

        let first = DuplicateDetector::find_duplicates(&rows);
        let second = DuplicateDetector::find_duplicates(&rows);

        assert_eq!(rows.len(), 3);
        assert_eq!(first.len(), second.len());
        assert_eq!(first[0].positions, second[0].positions);
        assert_eq!(first[0].fingerprint, second[0].fingerprint);
    }

    #[test]
    fn test_empty_set() {
        let rows: Vec<CanonicalRecord> = Vec::new();
        assert!(DuplicateDetector::find_duplicates(&rows).is_empty());
    }

    #[test]
    fn test_matched_pair_duplicates() {
        let ledger = create_test_record(0, "12/25/2024", dec!(-45.99), "Starbucks");
        let ledger_twin = ledger.clone().with_id(RecordId(1));
        let statement = create_test_record(0, "12/25/2024", dec!(-45.99), "STARBUCKS #4521");

        let pairs = vec![
            MatchedPair { ledger: ledger.clone(), statement: statement.clone() },
            MatchedPair { ledger: ledger_twin, statement: statement.clone() },
            // Same records, sides swapped: not the same pair
            MatchedPair { ledger: statement, statement: ledger },
        ];

        let groups = DuplicateDetector::find_duplicates(&pairs);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].positions, vec![0, 1]);
    }

    #[test]
    fn test_report_keeps_provenance() {
        let dup = create_test_record(0, "12/25/2024", dec!(-45.99), "Starbucks");
        let statements = vec![dup.clone(), dup.clone().with_id(RecordId(1))];
        let ledger = vec![create_test_record(0, "12/25/2024", dec!(-1.00), "Gum")];

        let report = DuplicateReport::collect(&statements, &ledger, &[]);

        assert!(!report.is_empty());
        assert_eq!(report.groups_in(SetKind::Statement), 1);
        assert_eq!(report.groups_in(SetKind::Ledger), 0);
        assert_eq!(report.groups_in(SetKind::Matched), 0);
        assert_eq!(report.group_count(), 1);
        assert_eq!(report.row_count(), 2);
    }

    #[test]
    fn test_report_empty_when_no_repeats() {
        let statements = vec![
            create_test_record(0, "12/25/2024", dec!(-45.99), "Starbucks"),
            create_test_record(1, "12/26/2024", dec!(-45.99), "Starbucks"),
        ];

        let report = DuplicateReport::collect(&statements, &statements, &[]);

        assert!(report.is_empty());
        assert_eq!(report.row_count(), 0);
    }
}
