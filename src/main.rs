use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use statement_reconciler::config::{
    DateRange, ReconcileConfig, DEFAULT_DAYS_BUFFER, DEFAULT_LEDGER_PATH, DEFAULT_OUTPUT_DIR,
    DEFAULT_STATEMENTS_DIR,
};
use statement_reconciler::pipeline::{self, RunOutcome};
use statement_reconciler::record::parse_date;

#[derive(Parser)]
#[command(
    name = "reconcile",
    version,
    about = "Reconcile a budgeting ledger export against bank and card statements",
    long_about = "Matches every statement transaction against the ledger by exact amount \
                  and a date window, then writes matched, unmatched and duplicate rows \
                  as CSV files."
)]
struct Cli {
    /// Ledger register export (CSV)
    #[arg(long, env = "RECONCILE_LEDGER")]
    ledger: Option<PathBuf>,

    /// Folder holding the statement CSV exports
    #[arg(long, env = "RECONCILE_STATEMENTS")]
    statements: Option<PathBuf>,

    /// Folder the result files are written to
    #[arg(long, env = "RECONCILE_OUTPUT")]
    output: Option<PathBuf>,

    /// Exclusive start of the date range (default: end date - 90 days)
    #[arg(long, env = "RECONCILE_START_DATE", value_parser = parse_date_arg)]
    start_date: Option<NaiveDate>,

    /// Inclusive end of the date range (default: today)
    #[arg(long, env = "RECONCILE_END_DATE", value_parser = parse_date_arg)]
    end_date: Option<NaiveDate>,

    /// Days on either side of a statement date that still match
    #[arg(long, env = "RECONCILE_DAYS_BUFFER", default_value_t = DEFAULT_DAYS_BUFFER)]
    days_buffer: u32,

    /// Ledger account to leave out (repeatable)
    #[arg(long = "exclude-account", env = "RECONCILE_EXCLUDE_ACCOUNTS", value_delimiter = ',')]
    exclude_accounts: Vec<String>,

    /// Use defaults for any path not given instead of asking
    #[arg(long)]
    no_prompt: bool,
}

fn parse_date_arg(value: &str) -> Result<NaiveDate, String> {
    parse_date(value).ok_or_else(|| format!("unrecognized date '{}'", value))
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let config = build_config(cli, &mut io::stdin().lock())?;

    let outcome = pipeline::run(&config)?;
    print_report(&config, &outcome);

    Ok(())
}

/// Fill the run configuration from flags, prompting on `input` for any
/// path not given
fn build_config(cli: Cli, input: &mut impl BufRead) -> Result<ReconcileConfig> {
    let mut path_or_prompt = |given: Option<PathBuf>, label: &str, default: &str| -> Result<PathBuf> {
        match given {
            Some(path) => Ok(path),
            None if cli.no_prompt => Ok(PathBuf::from(default)),
            None => prompt_path(&mut *input, label, default),
        }
    };

    let ledger_path = path_or_prompt(cli.ledger, "Ledger file", DEFAULT_LEDGER_PATH)?;
    let statements_dir = path_or_prompt(cli.statements, "Statements folder", DEFAULT_STATEMENTS_DIR)?;
    let output_dir = path_or_prompt(cli.output, "Output folder", DEFAULT_OUTPUT_DIR)?;

    Ok(ReconcileConfig {
        ledger_path,
        statements_dir,
        output_dir,
        date_range: DateRange::from_bounds(cli.start_date, cli.end_date),
        days_buffer: cli.days_buffer,
        excluded_accounts: cli.exclude_accounts,
    })
}

/// Ask for a path; a blank answer (or closed stdin) takes the default
fn prompt_path(input: &mut impl BufRead, label: &str, default: &str) -> Result<PathBuf> {
    print!("{} [{}]: ", label, default);
    io::stdout().flush().context("Failed to flush prompt")?;

    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .with_context(|| format!("Failed to read {}", label.to_lowercase()))?;

    let answer = answer.trim();
    Ok(PathBuf::from(if answer.is_empty() { default } else { answer }))
}

fn print_report(config: &ReconcileConfig, outcome: &RunOutcome) {
    println!("\n🧾 Reconciliation {} → {}", config.date_range.start, config.date_range.end);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "📂 Statement files: {} loaded, {} skipped",
        outcome.statement_files_loaded, outcome.statement_files_skipped
    );
    println!("✓ Statement rows processed: {}", outcome.statement_rows);
    println!("✓ Ledger rows in range: {}", outcome.ledger_rows);
    println!("✅ Matched pairs: {}", outcome.matched);
    println!("⚠️  Unmatched statement rows: {}", outcome.unmatched_statement);
    println!("⚠️  Unmatched ledger rows: {}", outcome.unmatched_ledger);
    println!("🔍 Duplicate rows: {}", outcome.duplicate_rows);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("💾 Results written to {}", config.output_dir.display());
    for file in &outcome.written {
        println!("   {} ({} rows)", file.path.display(), file.rows);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("reconcile").chain(args.iter().copied()))
    }

    #[test]
    fn test_prompt_blank_answer_takes_default() {
        let mut input = Cursor::new("\n");
        let path = prompt_path(&mut input, "Ledger file", DEFAULT_LEDGER_PATH).unwrap();
        assert_eq!(path, PathBuf::from(DEFAULT_LEDGER_PATH));
    }

    #[test]
    fn test_prompt_closed_stdin_takes_default() {
        let mut input = Cursor::new("");
        let path = prompt_path(&mut input, "Output folder", DEFAULT_OUTPUT_DIR).unwrap();
        assert_eq!(path, PathBuf::from(DEFAULT_OUTPUT_DIR));
    }

    #[test]
    fn test_prompt_answer_is_trimmed() {
        let mut input = Cursor::new("  ./exports/ynab.csv  \n");
        let path = prompt_path(&mut input, "Ledger file", DEFAULT_LEDGER_PATH).unwrap();
        assert_eq!(path, PathBuf::from("./exports/ynab.csv"));
    }

    #[test]
    fn test_build_config_prompts_only_for_missing_paths() {
        let mut input = Cursor::new("./cards\n\n");
        let config = build_config(cli(&["--ledger", "budget.csv"]), &mut input).unwrap();

        assert_eq!(config.ledger_path, PathBuf::from("budget.csv"));
        assert_eq!(config.statements_dir, PathBuf::from("./cards"));
        assert_eq!(config.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
    }

    #[test]
    fn test_no_prompt_takes_defaults_without_reading() {
        let mut input = Cursor::new("should-not-be-read\n");
        let config = build_config(cli(&["--no-prompt", "--days-buffer", "5"]), &mut input).unwrap();

        assert_eq!(config.ledger_path, PathBuf::from(DEFAULT_LEDGER_PATH));
        assert_eq!(config.statements_dir, PathBuf::from(DEFAULT_STATEMENTS_DIR));
        assert_eq!(config.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert_eq!(config.days_buffer, 5);
        assert_eq!(input.position(), 0);
    }

    #[test]
    fn test_date_flags_and_excluded_accounts() {
        let config = build_config(
            cli(&[
                "--no-prompt",
                "--start-date",
                "2024-01-01",
                "--end-date",
                "03/31/2024",
                "--exclude-account",
                "Checking",
                "--exclude-account",
                "HSA",
            ]),
            &mut Cursor::new(""),
        )
        .unwrap();

        assert_eq!(config.date_range.start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(config.date_range.end, NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
        assert_eq!(config.excluded_accounts, vec!["Checking".to_string(), "HSA".to_string()]);
    }
}
