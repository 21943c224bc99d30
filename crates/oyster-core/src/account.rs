//! # Account State Machine
//!
//! A card account: balance, at most one open journey, and the tap rules.
//!
//! ## States
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │              swipe_in (hold max fare)                                   │
//! │   ┌──────┐ ─────────────────────────────► ┌───────────┐                │
//! │   │ Idle │                                 │ InJourney │                │
//! │   └──────┘ ◄───────────────────────────── └───────────┘                │
//! │     │  ▲     swipe_out(Some) refund max - fare   │  ▲                   │
//! │     │  │     swipe_out(None) penalty             │  │ swipe_in again:   │
//! │     └──┘                                         └──┘ penalty, reopen   │
//! │   swipe_out: penalty (unmatched exit)                                   │
//! │   take_bus / load_balance: any state, journey untouched                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Balance Rules
//! - Swipe-in requires `balance >= max fare`; bus boarding requires
//!   `balance >= bus fare`. A denial changes nothing.
//! - Penalties are charged without a sufficiency check and may leave the
//!   balance negative.
//!
//! ## Usage
//! ```rust
//! use oyster_core::account::Account;
//! use oyster_core::money::Money;
//! use oyster_core::types::Station;
//!
//! let holborn = Station::new("Holborn", &[1]).unwrap();
//! let earls_court = Station::new("Earl's Court", &[1, 2]).unwrap();
//!
//! let mut card = Account::new(Money::from_pence(3000));
//! card.swipe_in(&holborn).unwrap();
//! card.swipe_out(Some(&earls_court));
//! assert_eq!(card.balance().pence(), 2750);
//! ```

use std::fmt;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::fare::FarePolicy;
use crate::money::Money;
use crate::types::{EntryKind, Journey, LedgerEntry, PenaltyReason, Station};
use crate::validation::validate_top_up;

// =============================================================================
// Account State
// =============================================================================

/// Whether the account has an open journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountState {
    Idle,
    InJourney,
}

// =============================================================================
// Tap Outcome
// =============================================================================

/// Result of an operation that went through, including penalty paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum TapOutcome {
    /// Balance topped up.
    Loaded { amount: Money, balance: Money },

    /// Entry granted and the max fare held. `penalty` is set when an
    /// abandoned journey was charged first.
    Entered {
        station: String,
        hold: Money,
        penalty: Option<Money>,
        balance: Money,
    },

    /// Journey settled; `refund` is the unused part of the hold.
    Exited {
        start: String,
        end: String,
        fare: Money,
        refund: Money,
        balance: Money,
    },

    /// A tap could not be resolved into a journey.
    Penalty {
        reason: PenaltyReason,
        charged: Money,
        balance: Money,
    },

    /// Flat bus fare charged.
    BusBoarded { fare: Money, balance: Money },
}

impl TapOutcome {
    /// Balance after the operation.
    pub fn balance(&self) -> Money {
        match self {
            TapOutcome::Loaded { balance, .. }
            | TapOutcome::Entered { balance, .. }
            | TapOutcome::Exited { balance, .. }
            | TapOutcome::Penalty { balance, .. }
            | TapOutcome::BusBoarded { balance, .. } => *balance,
        }
    }

    /// True when any penalty was charged.
    pub fn is_penalty(&self) -> bool {
        matches!(
            self,
            TapOutcome::Penalty { .. }
                | TapOutcome::Entered {
                    penalty: Some(_),
                    ..
                }
        )
    }
}

impl fmt::Display for TapOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TapOutcome::Loaded { amount, balance } => {
                write!(f, "Loaded {}. Balance: {}", amount, balance)
            }
            TapOutcome::Entered {
                station,
                hold,
                penalty,
                balance,
            } => {
                if let Some(penalty) = penalty {
                    write!(
                        f,
                        "Previous journey incomplete, charged {}. ",
                        penalty
                    )?;
                }
                write!(
                    f,
                    "Swiped in at {}. Maximum fare of {} held. Balance: {}",
                    station, hold, balance
                )
            }
            TapOutcome::Exited {
                start,
                end,
                fare,
                refund,
                balance,
            } => write!(
                f,
                "Swiped out at {} (from {}). Fare {}, refund {}. Balance: {}",
                end, start, fare, refund, balance
            ),
            TapOutcome::Penalty {
                reason,
                charged,
                balance,
            } => write!(
                f,
                "Penalty: {}. Charged {}. Balance: {}",
                reason, charged, balance
            ),
            TapOutcome::BusBoarded { fare, balance } => {
                write!(f, "Bus fare of {} charged. Balance: {}", fare, balance)
            }
        }
    }
}

// =============================================================================
// Account
// =============================================================================

/// A card account.
///
/// ## Invariants
/// - At most one open journey
/// - `is_pre_authorized()` is true exactly while a journey is open
/// - Every balance change after opening is recorded in the ledger
#[derive(Debug, Clone)]
pub struct Account {
    id: Uuid,
    balance: Money,
    journey: Option<Journey>,
    pre_authorized: bool,
    policy: FarePolicy,
    ledger: Vec<LedgerEntry>,
}

impl Account {
    /// Opens an account on the default (London) tariff.
    pub fn new(balance: Money) -> Self {
        Account::with_policy(balance, FarePolicy::default())
    }

    /// Opens an account priced by `policy`.
    pub fn with_policy(balance: Money, policy: FarePolicy) -> Self {
        Account {
            id: Uuid::new_v4(),
            balance,
            journey: None,
            pre_authorized: false,
            policy,
            ledger: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn balance(&self) -> Money {
        self.balance
    }

    pub fn state(&self) -> AccountState {
        if self.journey.is_some() {
            AccountState::InJourney
        } else {
            AccountState::Idle
        }
    }

    pub fn current_journey(&self) -> Option<&Journey> {
        self.journey.as_ref()
    }

    /// True while the max-fare hold from swipe-in is outstanding.
    pub fn is_pre_authorized(&self) -> bool {
        self.pre_authorized
    }

    pub fn policy(&self) -> &FarePolicy {
        &self.policy
    }

    /// Balance movements, oldest first.
    pub fn ledger(&self) -> &[LedgerEntry] {
        &self.ledger
    }

    /// Adds `amount` to the balance. Zero or negative amounts, and loads that
    /// would take the balance past [`MAX_BALANCE`](crate::MAX_BALANCE), are
    /// rejected.
    pub fn load_balance(&mut self, amount: Money) -> CoreResult<TapOutcome> {
        validate_top_up(amount, self.balance)?;
        self.post(EntryKind::TopUp, amount);

        info!(account = %self.id, %amount, balance = %self.balance, "Balance loaded");
        Ok(TapOutcome::Loaded {
            amount,
            balance: self.balance,
        })
    }

    /// Taps in at `station`.
    ///
    /// ## Flow
    /// ```text
    /// balance < max fare? ──yes──► Err(InsufficientBalance), nothing changes
    ///      │ no
    ///      ▼
    /// journey open? ──yes──► charge max fare (abandoned journey), drop it
    ///      │
    ///      ▼
    /// open journey at station, hold max fare
    /// ```
    pub fn swipe_in(&mut self, station: &Station) -> CoreResult<TapOutcome> {
        let max_fare = self.policy.max_fare();
        self.ensure_funds(max_fare, "swipe in")?;

        let penalty = match self.journey.take() {
            Some(abandoned) => {
                warn!(
                    account = %self.id,
                    start = abandoned.start().name(),
                    charged = %max_fare,
                    "Previous journey incomplete, charging maximum fare"
                );
                self.post(
                    EntryKind::Penalty(PenaltyReason::AbandonedJourney),
                    -max_fare,
                );
                Some(max_fare)
            }
            None => None,
        };

        self.journey = Some(Journey::begin(station.clone()));
        self.post(EntryKind::FareHold, -max_fare);
        self.pre_authorized = true;

        info!(
            account = %self.id,
            station = station.name(),
            hold = %max_fare,
            balance = %self.balance,
            "Swiped in"
        );
        Ok(TapOutcome::Entered {
            station: station.name().to_string(),
            hold: max_fare,
            penalty,
            balance: self.balance,
        })
    }

    /// Taps out at `station`; `None` stands for a missing or unreadable
    /// station.
    ///
    /// Never fails: anomalies are settled with a max-fare penalty.
    pub fn swipe_out(&mut self, station: Option<&Station>) -> TapOutcome {
        let Some(journey) = self.journey.take() else {
            return self.charge_penalty(PenaltyReason::UnmatchedExit);
        };

        let Some(end) = station else {
            self.pre_authorized = false;
            return self.charge_penalty(PenaltyReason::InvalidStation);
        };

        let journey = journey.complete(end.clone());
        let fare = self.policy.calculate_fare(journey.start(), end);
        let refund = self.policy.max_fare() - fare;

        self.post(EntryKind::FareRefund, refund);
        self.pre_authorized = false;

        debug!(
            account = %self.id,
            start = journey.start().name(),
            end = end.name(),
            %fare,
            %refund,
            balance = %self.balance,
            "Journey settled"
        );
        TapOutcome::Exited {
            start: journey.start().name().to_string(),
            end: end.name().to_string(),
            fare,
            refund,
            balance: self.balance,
        }
    }

    /// Charges the flat bus fare. Any open tube journey is left as is.
    pub fn take_bus(&mut self) -> CoreResult<TapOutcome> {
        let fare = self.policy.bus_fare();
        self.ensure_funds(fare, "bus")?;

        self.post(EntryKind::BusFare, -fare);

        info!(account = %self.id, %fare, balance = %self.balance, "Bus fare charged");
        Ok(TapOutcome::BusBoarded {
            fare,
            balance: self.balance,
        })
    }

    fn ensure_funds(&self, required: Money, operation: &str) -> CoreResult<()> {
        if self.balance < required {
            warn!(
                account = %self.id,
                operation,
                %required,
                balance = %self.balance,
                "Insufficient balance, access denied"
            );
            return Err(CoreError::InsufficientBalance {
                required,
                balance: self.balance,
            });
        }
        Ok(())
    }

    fn charge_penalty(&mut self, reason: PenaltyReason) -> TapOutcome {
        let charged = self.policy.max_fare();
        self.post(EntryKind::Penalty(reason), -charged);

        warn!(
            account = %self.id,
            %reason,
            %charged,
            balance = %self.balance,
            "Penalty charged"
        );
        TapOutcome::Penalty {
            reason,
            charged,
            balance: self.balance,
        }
    }

    fn post(&mut self, kind: EntryKind, amount: Money) {
        self.balance += amount;
        self.ledger.push(LedgerEntry {
            kind,
            amount,
            balance_after: self.balance,
            at: Utc::now(),
        });
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fare::Tariff;
    use crate::error::ValidationError;

    fn holborn() -> Station {
        Station::new("Holborn", &[1]).unwrap()
    }

    fn earls_court() -> Station {
        Station::new("Earl's Court", &[1, 2]).unwrap()
    }

    fn hammersmith() -> Station {
        Station::new("Hammersmith", &[2]).unwrap()
    }

    fn wimbledon() -> Station {
        Station::new("Wimbledon", &[3]).unwrap()
    }

    fn card(pence: i64) -> Account {
        Account::new(Money::from_pence(pence))
    }

    #[test]
    fn test_load_balance() {
        let mut card = card(3000);
        let outcome = card.load_balance(Money::from_pence(1000)).unwrap();
        assert_eq!(card.balance().pence(), 4000);
        assert_eq!(outcome.balance().pence(), 4000);
        assert_eq!(card.ledger().len(), 1);
        assert_eq!(card.ledger()[0].kind, EntryKind::TopUp);
    }

    #[test]
    fn test_load_balance_rejects_non_positive() {
        let mut card = card(3000);
        assert!(matches!(
            card.load_balance(Money::zero()),
            Err(CoreError::Validation(_))
        ));
        assert!(card.load_balance(Money::from_pence(-100)).is_err());
        assert_eq!(card.balance().pence(), 3000);
        assert!(card.ledger().is_empty());
    }

    #[test]
    fn test_load_balance_rejects_overflowing_amount() {
        let mut card = card(3000);
        assert!(matches!(
            card.load_balance(Money::from_pence(i64::MAX)),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
        assert_eq!(card.balance().pence(), 3000);
        assert!(card.ledger().is_empty());

        let headroom = crate::MAX_BALANCE - card.balance();
        card.load_balance(headroom).unwrap();
        assert_eq!(card.balance(), crate::MAX_BALANCE);
        assert!(card.load_balance(Money::from_pence(1)).is_err());
    }

    #[test]
    fn test_insufficient_balance_swipe_in() {
        let mut card = card(200);
        let err = card.swipe_in(&holborn()).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientBalance { .. }));
        assert!(card.current_journey().is_none());
        assert_eq!(card.state(), AccountState::Idle);
        assert_eq!(card.balance().pence(), 200);
        assert!(!card.is_pre_authorized());
    }

    #[test]
    fn test_swipe_in_requires_exactly_max_fare() {
        let mut card = card(319);
        assert!(card.swipe_in(&holborn()).is_err());

        let mut card = Account::new(Money::from_pence(320));
        assert!(card.swipe_in(&holborn()).is_ok());
        assert_eq!(card.balance().pence(), 0);
    }

    #[test]
    fn test_swipe_in_holds_max_fare() {
        let mut card = card(3000);
        let outcome = card.swipe_in(&holborn()).unwrap();

        assert_eq!(card.balance().pence(), 2680);
        assert_eq!(card.state(), AccountState::InJourney);
        assert!(card.is_pre_authorized());
        assert_eq!(card.current_journey().unwrap().start().name(), "Holborn");
        assert!(!outcome.is_penalty());
    }

    #[test]
    fn test_swipe_in_and_out_zone_1() {
        let mut card = card(3000);
        card.swipe_in(&holborn()).unwrap();
        let outcome = card.swipe_out(Some(&earls_court()));

        assert_eq!(card.balance().pence(), 2750);
        assert_eq!(card.state(), AccountState::Idle);
        assert!(!card.is_pre_authorized());
        match outcome {
            TapOutcome::Exited { fare, refund, .. } => {
                assert_eq!(fare.pence(), 250);
                assert_eq!(refund.pence(), 70);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_swipe_in_and_out_earls_court_to_wimbledon() {
        let mut card = card(2570);
        card.swipe_in(&earls_court()).unwrap();
        card.swipe_out(Some(&wimbledon()));
        assert_eq!(card.balance().pence(), 2250);
    }

    #[test]
    fn test_swipe_in_and_out_earls_court_to_hammersmith() {
        let mut card = card(3000);
        card.swipe_in(&earls_court()).unwrap();
        card.swipe_out(Some(&hammersmith()));
        assert_eq!(card.balance().pence(), 2800);
    }

    #[test]
    fn test_swipe_in_and_out_same_station() {
        let mut card = card(3000);
        card.swipe_in(&earls_court()).unwrap();
        card.swipe_out(Some(&earls_court()));
        assert_eq!(card.balance().pence(), 2750);
    }

    #[test]
    fn test_round_trip_charges_exactly_the_fare() {
        let stations = [holborn(), earls_court(), hammersmith(), wimbledon()];
        let policy = FarePolicy::default();

        for start in &stations {
            for end in &stations {
                let mut card = card(1000);
                card.swipe_in(start).unwrap();
                card.swipe_out(Some(end));
                let expected = Money::from_pence(1000) - policy.calculate_fare(start, end);
                assert_eq!(card.balance(), expected, "{} -> {}", start, end);
            }
        }
    }

    #[test]
    fn test_take_bus() {
        let mut card = card(3000);
        card.take_bus().unwrap();
        assert_eq!(card.balance().pence(), 2820);
    }

    #[test]
    fn test_take_bus_insufficient_balance() {
        let mut card = card(179);
        assert!(matches!(
            card.take_bus(),
            Err(CoreError::InsufficientBalance { .. })
        ));
        assert_eq!(card.balance().pence(), 179);

        let mut card = Account::new(Money::from_pence(180));
        card.take_bus().unwrap();
        assert!(card.balance().is_zero());
    }

    #[test]
    fn test_take_bus_leaves_journey_open() {
        let mut card = card(3000);
        card.swipe_in(&holborn()).unwrap();
        card.take_bus().unwrap();
        assert_eq!(card.state(), AccountState::InJourney);
        card.swipe_out(Some(&holborn()));
        assert_eq!(card.balance().pence(), 3000 - 180 - 250);
    }

    #[test]
    fn test_swipe_out_without_swipe_in() {
        let mut card = card(3000);
        let outcome = card.swipe_out(Some(&holborn()));

        assert_eq!(card.balance().pence(), 2680);
        assert_eq!(card.state(), AccountState::Idle);
        assert_eq!(
            outcome,
            TapOutcome::Penalty {
                reason: PenaltyReason::UnmatchedExit,
                charged: Money::from_pence(320),
                balance: Money::from_pence(2680),
            }
        );
    }

    #[test]
    fn test_invalid_station_swipe_out() {
        let mut card = card(3000);
        card.swipe_in(&holborn()).unwrap();
        let outcome = card.swipe_out(None);

        assert_eq!(card.balance().pence(), 2360);
        assert!(card.current_journey().is_none());
        assert!(!card.is_pre_authorized());
        assert!(matches!(
            outcome,
            TapOutcome::Penalty {
                reason: PenaltyReason::InvalidStation,
                ..
            }
        ));
    }

    #[test]
    fn test_abandoned_journey_is_penalized() {
        let mut card = card(3000);
        card.swipe_in(&holborn()).unwrap();
        let outcome = card.swipe_in(&hammersmith()).unwrap();

        assert!(outcome.is_penalty());
        assert_eq!(card.balance().pence(), 3000 - 320 - 320 - 320);
        assert_eq!(card.current_journey().unwrap().start().name(), "Hammersmith");

        card.swipe_out(Some(&hammersmith()));
        assert_eq!(card.balance().pence(), 3000 - 320 - 320 - 200);
    }

    #[test]
    fn test_denied_swipe_in_keeps_open_journey() {
        let mut card = card(400);
        card.swipe_in(&holborn()).unwrap();
        assert!(card.swipe_in(&hammersmith()).is_err());
        assert_eq!(card.balance().pence(), 80);
        assert_eq!(card.current_journey().unwrap().start().name(), "Holborn");
    }

    #[test]
    fn test_penalty_can_drive_balance_negative() {
        let mut card = card(100);
        card.swipe_out(None);
        assert_eq!(card.balance().pence(), -220);

        let mut card = Account::new(Money::from_pence(500));
        card.swipe_in(&holborn()).unwrap();
        card.swipe_out(None);
        assert_eq!(card.balance().pence(), -140);
    }

    #[test]
    fn test_ledger_records_every_movement() {
        let mut card = card(3000);
        card.swipe_in(&holborn()).unwrap();
        card.swipe_out(Some(&earls_court()));
        card.take_bus().unwrap();
        card.swipe_out(None);

        let kinds: Vec<EntryKind> = card.ledger().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EntryKind::FareHold,
                EntryKind::FareRefund,
                EntryKind::BusFare,
                EntryKind::Penalty(PenaltyReason::UnmatchedExit),
            ]
        );

        let total: Money = card
            .ledger()
            .iter()
            .fold(Money::zero(), |acc, e| acc + e.amount);
        assert_eq!(Money::from_pence(3000) + total, card.balance());
        assert_eq!(card.ledger().last().unwrap().balance_after, card.balance());
    }

    #[test]
    fn test_custom_tariff_account() {
        let tariff = Tariff {
            max_fare: Money::from_pence(500),
            bus_fare: Money::from_pence(150),
            ..Tariff::default()
        };
        let mut card = Account::with_policy(
            Money::from_pence(1000),
            FarePolicy::new(tariff.clone()).unwrap(),
        );
        assert_eq!(card.policy().tariff(), &tariff);
        assert_eq!(card.policy().max_fare().pence(), 500);

        card.swipe_in(&holborn()).unwrap();
        assert_eq!(card.balance().pence(), 500);
        card.swipe_out(Some(&holborn()));
        assert_eq!(card.balance().pence(), 750);
        card.take_bus().unwrap();
        assert_eq!(card.balance().pence(), 600);
    }

    #[test]
    fn test_outcome_display() {
        let mut card = card(3000);
        let entered = card.swipe_in(&holborn()).unwrap();
        assert_eq!(
            entered.to_string(),
            "Swiped in at Holborn. Maximum fare of £3.20 held. Balance: £26.80"
        );

        let exited = card.swipe_out(Some(&earls_court()));
        assert_eq!(
            exited.to_string(),
            "Swiped out at Earl's Court (from Holborn). Fare £2.50, refund £0.70. Balance: £27.50"
        );
    }

    #[test]
    fn test_accounts_have_distinct_ids() {
        assert_ne!(card(0).id(), card(0).id());
    }
}
