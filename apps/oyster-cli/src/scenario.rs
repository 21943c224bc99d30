//! # Scenarios
//!
//! A scenario is a station list plus a sequence of card operations, replayed
//! against one account.
//!
//! ## File Format
//! ```json
//! {
//!   "initial_balance": "30.00",
//!   "stations": [
//!     { "name": "Holborn", "zones": [1] },
//!     { "name": "Earl's Court", "zones": [1, 2] }
//!   ],
//!   "steps": [
//!     { "action": "swipe_in", "station": "Holborn" },
//!     { "action": "swipe_out", "station": "Earl's Court" },
//!     { "action": "swipe_out" },
//!     { "action": "bus" },
//!     { "action": "load", "amount": "10.00" }
//!   ]
//! }
//! ```
//! Amounts are either pound strings (`"10.00"`, `"£2.50"`) or integer pence
//! (`1000`). A `swipe_out` with no station, or with a name not in
//! the station list, is an invalid exit and is penalized.

use std::fs;
use std::path::{Path, PathBuf};

use oyster_core::{CoreError, Money, Station, StationNetwork, TapOutcome, ValidationError};
use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};

use crate::state::SharedAccount;

// =============================================================================
// Scenario
// =============================================================================

/// One card operation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Load {
        #[serde(deserialize_with = "deserialize_amount")]
        amount: Money,
    },
    SwipeIn { station: String },
    SwipeOut { station: Option<String> },
    Bus,
}

impl Step {
    /// Short label for reports.
    pub fn label(&self) -> String {
        match self {
            Step::Load { amount } => format!("load {}", amount),
            Step::SwipeIn { station } => format!("swipe in at {}", station),
            Step::SwipeOut {
                station: Some(station),
            } => format!("swipe out at {}", station),
            Step::SwipeOut { station: None } => "swipe out (no station)".to_string(),
            Step::Bus => "bus".to_string(),
        }
    }
}

/// Stations and steps to replay.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Overrides the configured opening balance.
    #[serde(default, deserialize_with = "deserialize_opening_balance")]
    pub initial_balance: Option<Money>,

    pub stations: Vec<Station>,

    pub steps: Vec<Step>,
}

impl Scenario {
    /// The London demo: Holborn to Earl's Court, a bus ride, then Earl's
    /// Court to Wimbledon.
    pub fn london_demo() -> Result<Self, ScenarioError> {
        let stations = vec![
            Station::new("Holborn", &[1])?,
            Station::new("Earl's Court", &[1, 2])?,
            Station::new("Hammersmith", &[2])?,
            Station::new("Wimbledon", &[3])?,
        ];

        let steps = vec![
            Step::SwipeIn {
                station: "Holborn".to_string(),
            },
            Step::SwipeOut {
                station: Some("Earl's Court".to_string()),
            },
            Step::Bus,
            Step::SwipeIn {
                station: "Earl's Court".to_string(),
            },
            Step::SwipeOut {
                station: Some("Wimbledon".to_string()),
            },
        ];

        Ok(Scenario {
            initial_balance: None,
            stations,
            steps,
        })
    }

    /// Parses a scenario from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a scenario file.
    pub fn from_path(path: &Path) -> Result<Self, ScenarioError> {
        let json = fs::read_to_string(path).map_err(|source| ScenarioError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Builds the station lookup, rejecting duplicate names.
    pub fn network(&self) -> Result<StationNetwork, ScenarioError> {
        Ok(StationNetwork::from_stations(self.stations.iter().cloned())?)
    }
}

/// Wire shape of an amount: integer pence or a pound string.
#[derive(Deserialize)]
#[serde(untagged)]
enum AmountDef {
    Pence(i64),
    Pounds(String),
}

impl AmountDef {
    fn into_money<E: serde::de::Error>(self) -> Result<Money, E> {
        match self {
            AmountDef::Pence(pence) => Ok(Money::from_pence(pence)),
            AmountDef::Pounds(text) => Money::parse(&text).map_err(E::custom),
        }
    }
}

fn deserialize_amount<'de, D>(deserializer: D) -> Result<Money, D::Error>
where
    D: Deserializer<'de>,
{
    AmountDef::deserialize(deserializer)?.into_money()
}

fn deserialize_opening_balance<'de, D>(deserializer: D) -> Result<Option<Money>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<AmountDef>::deserialize(deserializer)?
        .map(AmountDef::into_money)
        .transpose()
}

// =============================================================================
// Replay
// =============================================================================

/// What happened at one step.
#[derive(Debug)]
pub struct StepReport {
    pub step: Step,
    pub result: Result<TapOutcome, CoreError>,
    pub balance: Money,
}

impl StepReport {
    /// Human-readable status line.
    pub fn describe(&self) -> String {
        match &self.result {
            Ok(outcome) => outcome.to_string(),
            Err(err) => format!("Denied: {}. Balance: {}", err, self.balance),
        }
    }
}

/// Replays every step against `account`, in order.
///
/// Denials do not stop the replay; each step reports its own result.
pub fn replay(
    scenario: &Scenario,
    network: &StationNetwork,
    account: &SharedAccount,
) -> Vec<StepReport> {
    scenario
        .steps
        .iter()
        .map(|step| {
            account.with_account_mut(|card| {
                let result = apply(step, network, card);
                if let Err(err) = &result {
                    warn!(step = %step.label(), error = %err, "Step denied");
                } else {
                    debug!(step = %step.label(), "Step applied");
                }
                StepReport {
                    step: step.clone(),
                    result,
                    balance: card.balance(),
                }
            })
        })
        .collect()
}

fn apply(
    step: &Step,
    network: &StationNetwork,
    card: &mut oyster_core::Account,
) -> Result<TapOutcome, CoreError> {
    match step {
        Step::Load { amount } => card.load_balance(*amount),
        Step::SwipeIn { station } => {
            let station = network.resolve(station)?;
            card.swipe_in(station)
        }
        Step::SwipeOut { station } => {
            let exit = station.as_deref().and_then(|name| network.get(name));
            Ok(card.swipe_out(exit))
        }
        Step::Bus => card.take_bus(),
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Scenario loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("Failed to read {}: {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed scenario: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid scenario: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use oyster_core::{Account, PenaltyReason};

    fn run(scenario: &Scenario, pence: i64) -> (Vec<StepReport>, SharedAccount) {
        let network = scenario.network().unwrap();
        let shared = SharedAccount::new(Account::new(Money::from_pence(pence)));
        let reports = replay(scenario, &network, &shared);
        (reports, shared)
    }

    #[test]
    fn test_london_demo_balances() {
        let scenario = Scenario::london_demo().unwrap();
        let (reports, shared) = run(&scenario, 3000);

        let balances: Vec<i64> = reports.iter().map(|r| r.balance.pence()).collect();
        assert_eq!(balances, vec![2680, 2750, 2570, 2250, 2250]);
        assert!(reports.iter().all(|r| r.result.is_ok()));
        assert_eq!(shared.with_account(|a| a.balance().pence()), 2250);
    }

    #[test]
    fn test_parse_scenario() {
        let scenario = Scenario::from_json_str(
            r#"{
                "initial_balance": 500,
                "stations": [{ "name": "Holborn", "zones": [1] }],
                "steps": [
                    { "action": "load", "amount": 1000 },
                    { "action": "swipe_in", "station": "Holborn" },
                    { "action": "swipe_out" },
                    { "action": "swipe_out", "station": null },
                    { "action": "bus" }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(scenario.initial_balance, Some(Money::from_pence(500)));
        assert_eq!(scenario.steps.len(), 5);
        assert_eq!(scenario.steps[2], Step::SwipeOut { station: None });
        assert_eq!(scenario.steps[3], Step::SwipeOut { station: None });
    }

    #[test]
    fn test_parse_pound_amounts() {
        let scenario = Scenario::from_json_str(
            r#"{
                "initial_balance": "£12.50",
                "stations": [],
                "steps": [{ "action": "load", "amount": "2.5" }]
            }"#,
        )
        .unwrap();

        assert_eq!(scenario.initial_balance, Some(Money::from_pence(1250)));
        assert_eq!(
            scenario.steps[0],
            Step::Load {
                amount: Money::from_pence(250)
            }
        );

        assert!(matches!(
            Scenario::from_json_str(
                r#"{ "stations": [], "steps": [{ "action": "load", "amount": "1.234" }] }"#
            ),
            Err(ScenarioError::Parse(_))
        ));
    }

    #[test]
    fn test_bundled_london_scenario_replays() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios/london.json");
        let scenario = Scenario::from_path(&path).unwrap();
        assert_eq!(scenario.initial_balance, Some(Money::from_pence(3000)));

        let opening = scenario.initial_balance.unwrap().pence();
        let (reports, shared) = run(&scenario, opening);

        let balances: Vec<i64> = reports.iter().map(|r| r.balance.pence()).collect();
        assert_eq!(
            balances,
            vec![2680, 2750, 2570, 2250, 2370, 2050, 1730, 1090, 770, 1770]
        );
        assert!(reports.iter().all(|r| r.result.is_ok()));

        let penalties = reports
            .iter()
            .filter(|r| matches!(&r.result, Ok(outcome) if outcome.is_penalty()))
            .count();
        assert_eq!(penalties, 3);
        assert!(shared.with_account(|a| a.current_journey().is_none()));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(
            Scenario::from_json_str(r#"{ "stations": [], "steps": [{ "action": "fly" }] }"#),
            Err(ScenarioError::Parse(_))
        ));
        assert!(Scenario::from_json_str(
            r#"{ "stations": [{ "name": "Nowhere", "zones": [] }], "steps": [] }"#
        )
        .is_err());
        assert!(matches!(
            Scenario::from_path(Path::new("/nonexistent/oyster/scenario.json")),
            Err(ScenarioError::Read { .. })
        ));
    }

    #[test]
    fn test_duplicate_stations_rejected() {
        let scenario = Scenario {
            initial_balance: None,
            stations: vec![
                Station::new("Holborn", &[1]).unwrap(),
                Station::new("Holborn", &[1]).unwrap(),
            ],
            steps: vec![],
        };
        assert!(matches!(
            scenario.network(),
            Err(ScenarioError::Validation(ValidationError::Duplicate { .. }))
        ));
    }

    #[test]
    fn test_unknown_exit_station_is_penalized() {
        let scenario = Scenario {
            initial_balance: None,
            stations: vec![Station::new("Holborn", &[1]).unwrap()],
            steps: vec![
                Step::SwipeIn {
                    station: "Holborn".to_string(),
                },
                Step::SwipeOut {
                    station: Some("Atlantis".to_string()),
                },
            ],
        };
        let (reports, shared) = run(&scenario, 3000);

        assert!(matches!(
            reports[1].result,
            Ok(TapOutcome::Penalty {
                reason: PenaltyReason::InvalidStation,
                ..
            })
        ));
        assert_eq!(shared.with_account(|a| a.balance().pence()), 2360);
        assert!(shared.with_account(|a| a.current_journey().is_none()));
    }

    #[test]
    fn test_unknown_entry_station_is_denied() {
        let scenario = Scenario {
            initial_balance: None,
            stations: vec![],
            steps: vec![Step::SwipeIn {
                station: "Atlantis".to_string(),
            }],
        };
        let (reports, _) = run(&scenario, 3000);

        assert!(matches!(reports[0].result, Err(CoreError::UnknownStation(_))));
        assert_eq!(reports[0].balance.pence(), 3000);
        assert!(reports[0].describe().starts_with("Denied: Station not found"));
    }

    #[test]
    fn test_denials_do_not_stop_replay() {
        let scenario = Scenario {
            initial_balance: None,
            stations: vec![Station::new("Holborn", &[1]).unwrap()],
            steps: vec![
                Step::SwipeIn {
                    station: "Holborn".to_string(),
                },
                Step::Load {
                    amount: Money::from_pence(500),
                },
                Step::SwipeIn {
                    station: "Holborn".to_string(),
                },
            ],
        };
        let (reports, _) = run(&scenario, 200);

        assert!(reports[0].result.is_err());
        assert_eq!(reports[1].balance.pence(), 700);
        assert!(reports[2].result.is_ok());
        assert_eq!(reports[2].balance.pence(), 380);
    }

    #[test]
    fn test_step_labels() {
        assert_eq!(Step::Bus.label(), "bus");
        assert_eq!(
            Step::Load {
                amount: Money::from_pence(1000)
            }
            .label(),
            "load £10.00"
        );
        assert_eq!(
            Step::SwipeOut { station: None }.label(),
            "swipe out (no station)"
        );
    }
}
