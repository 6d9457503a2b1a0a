// End-to-end: statement folder + ledger file → output CSVs

use chrono::NaiveDate;
use statement_reconciler::config::{DateRange, ReconcileConfig};
use statement_reconciler::export::{
    DUPLICATES_FILE, MATCHED_FILE, UNMATCHED_LEDGER_FILE, UNMATCHED_STATEMENT_FILE,
};
use statement_reconciler::pipeline;
use std::fs;
use std::path::Path;

const LEDGER: &str = "\"Account\",\"Flag\",\"Date\",\"Payee\",\"Category Group/Category\",\"Category Group\",\"Category\",\"Memo\",\"Outflow\",\"Inflow\",\"Cleared\"
\"Discover Card\",\"\",\"03/09/2024\",\"Grocer\",\"Food: Groceries\",\"Food\",\"Groceries\",\"\",\"$42.00\",\"$0.00\",\"Cleared\"
\"Discover Card\",\"\",\"03/12/2024\",\"Grocer\",\"Food: Groceries\",\"Food\",\"Groceries\",\"\",\"$42.00\",\"$0.00\",\"Cleared\"
\"BOA\",\"\",\"03/01/2024\",\"Employer\",\"Inflow: Ready to Assign\",\"Inflow\",\"Ready to Assign\",\"\",\"$0.00\",\"$1,500.00\",\"Cleared\"
\"BOA\",\"\",\"03/20/2024\",\"Landlord\",\"Bills: Rent\",\"Bills\",\"Rent\",\"\",\"$900.00\",\"$0.00\",\"Uncleared\"
\"Checking\",\"\",\"03/20/2024\",\"Transfer\",\"\",\"\",\"\",\"\",\"$50.00\",\"$0.00\",\"Cleared\"
\"BOA\",\"\",\"01/05/2024\",\"Too Old\",\"\",\"\",\"\",\"\",\"$1.00\",\"$0.00\",\"Cleared\"
";

fn write_inputs(root: &Path) {
    fs::write(root.join("YNAB_data.csv"), LEDGER).unwrap();

    let statements = root.join("statement_files");
    fs::create_dir(&statements).unwrap();
    fs::write(
        statements.join("Discover_march.csv"),
        "Trans. Date,Post Date,Description,Amount,Category\n\
         03/10/2024,03/11/2024,GROCER #12,-42.00,Supermarkets\n\
         03/25/2024,03/26/2024,COFFEE,-4.50,Restaurants\n\
         03/25/2024,03/26/2024,COFFEE,-4.50,Restaurants\n",
    )
    .unwrap();
    fs::write(
        statements.join("BOA_march.csv"),
        "Posted Date,Reference Number,Payee,Address,Amount\n\
         03/02/2024,1001,PAYROLL,,1500.00\n\
         03/05/2024,1002,LANDLORD,,-900.00\n",
    )
    .unwrap();
    fs::write(statements.join("README.txt"), "not a statement").unwrap();
}

fn config(root: &Path) -> ReconcileConfig {
    ReconcileConfig {
        ledger_path: root.join("YNAB_data.csv"),
        statements_dir: root.join("statement_files"),
        output_dir: root.join("out"),
        date_range: DateRange::new(
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        ),
        days_buffer: 3,
        excluded_accounts: vec!["Checking".to_string()],
    }
}

fn data_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .skip(1)
        .map(str::to_string)
        .collect()
}

#[test]
fn test_full_run() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());
    let config = config(dir.path());

    let outcome = pipeline::run(&config).unwrap();

    assert_eq!(outcome.statement_files_loaded, 2);
    assert_eq!(outcome.statement_files_skipped, 1);
    assert_eq!(outcome.statement_rows, 5);
    // Checking excluded, January row out of range
    assert_eq!(outcome.ledger_rows, 4);

    // -42.00 matches both grocer rows (03/09 and 03/12), payroll matches
    assert_eq!(outcome.matched, 3);
    // Rent is outside the 03/05 window; two coffees have no ledger amount
    assert_eq!(outcome.unmatched_statement, 3);
    assert_eq!(outcome.unmatched_ledger, 1);
    // The two coffee rows
    assert_eq!(outcome.duplicate_rows, 2);
    assert_eq!(outcome.written.len(), 6);

    let out = &config.output_dir;

    let unmatched_statement = data_lines(&out.join(UNMATCHED_STATEMENT_FILE));
    assert_eq!(unmatched_statement.len(), 3);
    assert!(unmatched_statement
        .iter()
        .any(|l| l.starts_with("2024-03-05,BOA") && l.ends_with("No date match")));
    assert_eq!(
        unmatched_statement
            .iter()
            .filter(|l| l.ends_with("No amount match"))
            .count(),
        2
    );

    let unmatched_ledger = data_lines(&out.join(UNMATCHED_LEDGER_FILE));
    assert_eq!(unmatched_ledger, vec!["2024-03-20,BOA,Rent,Landlord,,0.0,900.00,Uncleared"]);

    assert_eq!(data_lines(&out.join(MATCHED_FILE)).len(), 3);

    let duplicates = data_lines(&out.join(DUPLICATES_FILE));
    assert_eq!(duplicates.len(), 2);
    assert!(duplicates.iter().all(|l| l.starts_with("Statement,1,-4.50,")));
}

#[test]
fn test_bad_statement_amount_aborts_run() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());
    fs::write(
        dir.path().join("statement_files").join("AMZ_march.csv"),
        "Transaction Date,Description,Amount\n2024-03-10,Books,nineteen\n",
    )
    .unwrap();

    let err = pipeline::run(&config(dir.path())).unwrap_err();

    assert!(format!("{:#}", err).contains("AMZ_march.csv"));
    assert!(!dir.path().join("out").join(MATCHED_FILE).exists());
}

#[test]
fn test_missing_ledger_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());
    fs::remove_file(dir.path().join("YNAB_data.csv")).unwrap();

    let err = pipeline::run(&config(dir.path())).unwrap_err();

    assert!(format!("{:#}", err).contains("Failed to load ledger"));
}
