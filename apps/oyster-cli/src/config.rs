//! CLI configuration.
//!
//! Loaded from environment variables with fallback to defaults, then
//! overridden by command-line flags.
//!
//! | Variable                 | Flag          | Default |
//! |--------------------------|---------------|---------|
//! | `OYSTER_INITIAL_BALANCE` | `--balance`   | `30.00` |
//! | `OYSTER_TARIFF_PATH`     | `--tariff`    | London  |
//! | `OYSTER_SCENARIO_PATH`   | `--scenario`  | demo    |
//! | `OYSTER_PRINT_LEDGER`    | `--ledger`    | `false` |

use std::env;
use std::fs;
use std::path::PathBuf;

use oyster_core::{CoreError, Money, Tariff};

/// Default opening balance: £30.00.
pub const DEFAULT_INITIAL_BALANCE: Money = Money::from_pence(3000);

/// CLI configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CliConfig {
    /// Opening balance, used when the scenario does not set one.
    pub initial_balance: Money,

    /// JSON tariff file; the London tariff when unset.
    pub tariff_path: Option<PathBuf>,

    /// JSON scenario file; the built-in demo when unset.
    pub scenario_path: Option<PathBuf>,

    /// Print the account ledger after the replay.
    pub print_ledger: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        CliConfig {
            initial_balance: DEFAULT_INITIAL_BALANCE,
            tariff_path: None,
            scenario_path: None,
            print_ledger: false,
        }
    }
}

impl CliConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let initial_balance = match lookup("OYSTER_INITIAL_BALANCE") {
            Some(raw) => Money::parse(&raw)
                .map_err(|_| ConfigError::InvalidValue("OYSTER_INITIAL_BALANCE".to_string()))?,
            None => DEFAULT_INITIAL_BALANCE,
        };

        let print_ledger = match lookup("OYSTER_PRINT_LEDGER") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue("OYSTER_PRINT_LEDGER".to_string()))?,
            None => false,
        };

        Ok(CliConfig {
            initial_balance,
            tariff_path: lookup("OYSTER_TARIFF_PATH").map(PathBuf::from),
            scenario_path: lookup("OYSTER_SCENARIO_PATH").map(PathBuf::from),
            print_ledger,
        })
    }

    /// Applies command-line flags on top of the loaded configuration.
    ///
    /// Returns `Ok(None)` when `--help` was requested.
    pub fn apply_args(mut self, args: &[String]) -> Result<Option<Self>, ConfigError> {
        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--scenario" | "-s" => {
                    self.scenario_path = Some(PathBuf::from(flag_value(args, i)?));
                    i += 1;
                }
                "--tariff" | "-t" => {
                    self.tariff_path = Some(PathBuf::from(flag_value(args, i)?));
                    i += 1;
                }
                "--balance" | "-b" => {
                    let raw = flag_value(args, i)?;
                    self.initial_balance = Money::parse(raw)
                        .map_err(|_| ConfigError::InvalidValue("--balance".to_string()))?;
                    i += 1;
                }
                "--ledger" | "-l" => self.print_ledger = true,
                "--help" | "-h" => return Ok(None),
                other => return Err(ConfigError::UnknownFlag(other.to_string())),
            }
            i += 1;
        }

        Ok(Some(self))
    }

    /// Reads the configured tariff, or the London default.
    pub fn tariff(&self) -> Result<Tariff, ConfigError> {
        let Some(path) = &self.tariff_path else {
            return Ok(Tariff::default());
        };

        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        Ok(Tariff::from_json_str(&json)?)
    }
}

fn flag_value<'a>(args: &'a [String], i: usize) -> Result<&'a str, ConfigError> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| ConfigError::MissingValue(args[i].clone()))
}

/// Usage text for `--help`.
pub const USAGE: &str = "\
Oyster fare engine - scenario replay

Usage: oyster [OPTIONS]

Options:
  -s, --scenario <PATH>   JSON scenario to replay (default: built-in London demo)
  -t, --tariff <PATH>     JSON tariff overriding London fares
  -b, --balance <AMOUNT>  Opening balance in pounds, e.g. 30.00 (default: 30.00)
  -l, --ledger            Print the account ledger after the replay
  -h, --help              Show this help message";

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing value for {0}")]
    MissingValue(String),

    #[error("Unknown option: {0}")]
    UnknownFlag(String),

    #[error("Failed to read {}: {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Tariff(#[from] CoreError),
}
