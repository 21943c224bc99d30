//! # oyster-cli: Scenario Replay Driver
//!
//! Loads configuration, the tariff and a scenario, then replays the
//! scenario's taps against one card account and prints every outcome.
//!
//! ## Run Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. CliConfig::load()        env vars, then command-line flags          │
//! │  2. config.tariff()          JSON tariff or London default              │
//! │  3. Scenario                 JSON file or built-in London demo          │
//! │  4. replay()                 one StepReport per step                    │
//! │  5. stdout                   outcomes, final balance, optional ledger   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod scenario;
pub mod state;

use std::io::{self, Write};

use chrono::SecondsFormat;
use oyster_core::{Account, FarePolicy, LedgerEntry};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{CliConfig, USAGE};
use crate::scenario::{replay, Scenario, StepReport};
use crate::state::SharedAccount;

/// Initializes the tracing subscriber for logging.
///
/// Logs go to stderr so stdout carries only the replay output.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=oyster_core=trace` - Show trace for the fare engine only
/// - Default: INFO, DEBUG for the oyster crates
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok()))
        .with_writer(io::stderr)
        .init();
}

/// Default directives when `RUST_LOG` is unset or unparseable.
const DEFAULT_LOG_FILTER: &str = "info,oyster_core=debug,oyster_cli=debug";

fn log_filter(rust_log: Option<String>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Runs the driver with the given arguments (program name excluded).
pub fn run(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let Some(config) = CliConfig::load()?.apply_args(args)? else {
        println!("{}", USAGE);
        return Ok(());
    };

    let policy = FarePolicy::new(config.tariff()?)?;

    let scenario = match &config.scenario_path {
        Some(path) => Scenario::from_path(path)?,
        None => Scenario::london_demo()?,
    };
    let network = scenario.network()?;

    let opening = scenario.initial_balance.unwrap_or(config.initial_balance);
    let account = SharedAccount::new(Account::with_policy(opening, policy));

    account.with_account(|card| {
        info!(
            account = %card.id(),
            stations = network.len(),
            steps = scenario.steps.len(),
            balance = %opening,
            max_fare = %card.policy().max_fare(),
            boundary_stations = ?card.policy().tariff().boundary_stations,
            "Replaying scenario"
        )
    });

    let reports = replay(&scenario, &network, &account);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "Opening balance: {}", opening)?;
    write_reports(&mut out, &reports)?;

    account.with_account(|card| -> io::Result<()> {
        writeln!(out, "Final balance: {}", card.balance())?;
        if config.print_ledger {
            write_ledger(&mut out, card.ledger())?;
        }
        Ok(())
    })?;

    Ok(())
}

fn write_reports(out: &mut impl Write, reports: &[StepReport]) -> io::Result<()> {
    for (i, report) in reports.iter().enumerate() {
        writeln!(
            out,
            "{:>3}. {:<32} {}",
            i + 1,
            report.step.label(),
            report.describe()
        )?;
    }
    Ok(())
}

fn write_ledger(out: &mut impl Write, ledger: &[LedgerEntry]) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "Ledger:")?;
    for entry in ledger {
        writeln!(
            out,
            "  {}  {:<28} {:>9}  {:>9}",
            entry.at.to_rfc3339_opts(SecondsFormat::Millis, true),
            entry.kind.to_string(),
            entry.amount.to_string(),
            entry.balance_after.to_string()
        )?;
    }
    Ok(())
}
