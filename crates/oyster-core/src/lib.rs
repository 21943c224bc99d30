//! # oyster-core: Pure Fare & Tap Logic
//!
//! The fare-calculation and tap-state engine of a contactless transit card.
//! Everything here is in-memory computation with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Oyster Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 oyster-cli (scenario driver)                    │   │
//! │  │    config ──► tariff/scenario files ──► replay ──► stdout      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ oyster-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   fare    │  │  account  │  │   │
//! │  │   │  Station  │  │   Money   │  │  Tariff   │  │  Account  │  │   │
//! │  │   │  Journey  │  │  (pence)  │  │FarePolicy │  │TapOutcome │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO PERSISTENCE • NO NETWORK                          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Stations, zones, journeys, ledger entries
//! - [`money`] - Money type with integer pence arithmetic
//! - [`fare`] - Tariff and zone-based fare policy
//! - [`account`] - Card account state machine
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//!
//! ## Example Usage
//!
//! ```rust
//! use oyster_core::{Account, Money, Station};
//!
//! let holborn = Station::new("Holborn", &[1]).unwrap();
//! let earls_court = Station::new("Earl's Court", &[1, 2]).unwrap();
//! let wimbledon = Station::new("Wimbledon", &[3]).unwrap();
//!
//! let mut card = Account::new(Money::from_pence(3000));
//!
//! card.swipe_in(&holborn).unwrap();
//! card.swipe_out(Some(&earls_court));
//! assert_eq!(card.balance().to_string(), "£27.50");
//!
//! card.take_bus().unwrap();
//! assert_eq!(card.balance().to_string(), "£25.70");
//!
//! card.swipe_in(&earls_court).unwrap();
//! card.swipe_out(Some(&wimbledon));
//! assert_eq!(card.balance().to_string(), "£22.50");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod account;
pub mod error;
pub mod fare;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use account::{Account, AccountState, TapOutcome};
pub use error::{CoreError, CoreResult, ValidationError};
pub use fare::{FarePolicy, Tariff};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Highest balance a card may be topped up to: £1,000,000.
pub const MAX_BALANCE: Money = Money::from_pence(100_000_000);

/// Maximum length of a station name, in characters.
pub const MAX_STATION_NAME_LEN: usize = 100;
