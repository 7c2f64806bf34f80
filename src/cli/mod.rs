//! Command-line front end: parses arguments, opens the JSON data directory and
//! prints reports.

pub mod output;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::{
    config::{data_dir_in, manager::ConfigManager},
    core::{Report, ReportEngine},
    domain::{MonthKey, PaymentStatus, ReportFilters},
    errors::ReportError,
    utils::build_info,
};

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub const USAGE: &str = "\
Usage:
  report_core_cli <start> <end> [--json]   report for an inclusive date range (YYYY-MM-DD)
  report_core_cli carryover <YYYY-MM>      recompute and store a month's carryover
  report_core_cli --version                print build information";

/// A parsed command line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Report { filters: ReportFilters, json: bool },
    Carryover(MonthKey),
    Version,
    Help,
}

pub fn parse_args<I, S>(args: I) -> Result<Command, CliError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut json = false;
    let mut positional = Vec::new();
    for arg in args {
        match arg.as_ref() {
            "--json" => json = true,
            "--version" | "-V" => return Ok(Command::Version),
            "--help" | "-h" => return Ok(Command::Help),
            flag if flag.starts_with("--") => {
                return Err(CliError::Usage(format!("unknown option `{flag}`")))
            }
            value => positional.push(value.to_string()),
        }
    }

    match positional.as_slice() {
        [keyword, month] if keyword == "carryover" => {
            Ok(Command::Carryover(MonthKey::parse(month)?))
        }
        [start, end] => {
            let filters = ReportFilters::between(parse_date(start)?, parse_date(end)?)?;
            Ok(Command::Report { filters, json })
        }
        [] => Ok(Command::Help),
        _ => Err(CliError::Usage(format!(
            "expected a start and end date\n{USAGE}"
        ))),
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, CliError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| CliError::Usage(format!("`{value}` is not a YYYY-MM-DD date")))
}

/// Runs the CLI against the process arguments.
pub fn run_cli() -> Result<(), CliError> {
    match parse_args(std::env::args().skip(1))? {
        Command::Version => output::info(build_info::current().summary()),
        Command::Help => output::info(USAGE),
        Command::Carryover(month) => {
            let engine = open_engine()?;
            let record = engine.calculate_and_save_carryover(month.year, month.month)?;
            output::success(format!(
                "Carryover for {month}: {}",
                record.carryover_balance
            ));
        }
        Command::Report { filters, json } => {
            let engine = open_engine()?;
            let report = engine.build_report(&filters)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                render_report(&report, &engine.config().currency);
            }
        }
    }
    Ok(())
}

fn open_engine() -> Result<ReportEngine, CliError> {
    let manager = ConfigManager::new().map_err(ReportError::from)?;
    let config = manager.load().map_err(ReportError::from)?;
    let data_dir = data_dir_in(manager.base_dir());
    Ok(ReportEngine::open(config, &data_dir))
}

fn money(amount: Decimal, currency: &str) -> String {
    format!("{:.2} {currency}", amount.round_dp(2))
}

pub fn render_report(report: &Report, currency: &str) {
    let stats = &report.stats;
    let period = match report.filters.range() {
        Some((start, end)) => format!("Report {start} to {end}"),
        None => "Report".to_string(),
    };
    output::section(period);
    let width = 22;
    output::info(output::row("Income", money(stats.total_income, currency), width));
    output::info(output::row(
        "Expenses",
        money(stats.total_expenses, currency),
        width,
    ));
    output::info(output::row(
        "Period balance",
        money(stats.current_period_balance, currency),
        width,
    ));
    output::info(output::row(
        "Carryover income",
        money(stats.carryover_income, currency),
        width,
    ));
    output::info(output::row(
        "Total balance",
        money(stats.total_balance, currency),
        width,
    ));
    output::info(output::row(
        "Prior pending",
        money(stats.carryover_balance, currency),
        width,
    ));
    output::info(output::row("Transactions", stats.total_transactions, width));

    output::section("Expense status");
    for status in [PaymentStatus::Paid, PaymentStatus::Partial, PaymentStatus::Unpaid] {
        let tally = stats.payment_status_expense.bucket(status);
        output::info(output::row(
            &format!("{status:?} ({})", tally.count),
            money(tally.amount, currency),
            width,
        ));
    }

    if !stats.by_category.is_empty() {
        output::section("By category");
        for (label, entry) in &stats.by_category {
            output::info(output::row(label, money(entry.total, currency), width));
        }
    }

    if !report.mixed_trees.is_empty() {
        output::section("Mixed categories");
        for row in &report.mixed_trees {
            output::info(format!(
                "  W{} {} > {}: in {} | +{} -{} | to date {}",
                row.week_number,
                row.category_label,
                row.concept_label,
                money(row.carryover_in, currency),
                money(row.income, currency),
                money(row.expense, currency),
                money(row.running_balance_to_date, currency),
            ));
        }
    }

    for warning in &report.warnings {
        output::warning(warning);
    }
}
