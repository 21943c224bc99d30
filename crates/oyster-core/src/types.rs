//! # Domain Types
//!
//! Stations, zones, journeys and ledger records consumed by the fare engine.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Station      │   │    Journey      │   │  LedgerEntry    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  name (key)     │   │  start          │   │  kind           │       │
//! │  │  zones (set)    │   │  end (optional) │   │  amount         │       │
//! │  └─────────────────┘   │  tapped_in_at   │   │  balance_after  │       │
//! │                        └─────────────────┘   │  at             │       │
//! │  ┌─────────────────┐   ┌─────────────────┐   └─────────────────┘       │
//! │  │      Zone       │   │ StationNetwork  │                             │
//! │  │  positive u32   │   │  name → Station │                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Station Identity
//! Two stations are the same station when their names match. Zones are
//! fixed at construction; a `Station` is never mutated afterwards.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::validation::{validate_station_name, validate_zone, validate_zones, ValidationResult};

// =============================================================================
// Zone
// =============================================================================

/// A fare zone. Zone numbers start at 1 (central London).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Zone(u32);

impl Zone {
    /// Zone 1, which carries its own fare band.
    pub const ONE: Zone = Zone(1);

    /// Creates a zone, rejecting zero.
    pub fn new(zone: u32) -> ValidationResult<Self> {
        validate_zone(zone)?;
        Ok(Zone(zone))
    }

    /// Returns the zone number.
    #[inline]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Station
// =============================================================================

/// A station and the zones it belongs to.
///
/// Boundary stations (e.g. Earl's Court) sit in more than one zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "StationDef")]
pub struct Station {
    name: String,
    zones: BTreeSet<Zone>,
}

/// Unvalidated wire shape of a station.
#[derive(Debug, Clone, Deserialize)]
struct StationDef {
    name: String,
    zones: Vec<u32>,
}

impl TryFrom<StationDef> for Station {
    type Error = ValidationError;

    fn try_from(def: StationDef) -> Result<Self, Self::Error> {
        Station::new(def.name, &def.zones)
    }
}

impl Station {
    /// Creates a station from a name and a non-empty list of zones.
    ///
    /// ## Example
    /// ```rust
    /// use oyster_core::types::Station;
    ///
    /// let earls_court = Station::new("Earl's Court", &[1, 2]).unwrap();
    /// assert!(earls_court.is_multi_zone());
    ///
    /// assert!(Station::new("Nowhere", &[]).is_err());
    /// ```
    pub fn new(name: impl Into<String>, zones: &[u32]) -> ValidationResult<Self> {
        let name = name.into();
        validate_station_name(&name)?;
        validate_zones(zones)?;

        Ok(Station {
            name: name.trim().to_string(),
            zones: zones.iter().map(|&z| Zone(z)).collect(),
        })
    }

    /// Station name, the identity key.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Zones this station belongs to, in ascending order. Never empty.
    #[inline]
    pub fn zones(&self) -> &BTreeSet<Zone> {
        &self.zones
    }

    /// Checks membership of a zone.
    #[inline]
    pub fn in_zone(&self, zone: Zone) -> bool {
        self.zones.contains(&zone)
    }

    /// True for stations that sit in more than one zone.
    #[inline]
    pub fn is_multi_zone(&self) -> bool {
        self.zones.len() > 1
    }
}

impl PartialEq for Station {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Station {}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let zones: Vec<String> = self.zones.iter().map(Zone::to_string).collect();
        write!(f, "{} [{}]", self.name, zones.join(","))
    }
}

// =============================================================================
// Station Network
// =============================================================================

/// Name-indexed set of stations known to a caller.
#[derive(Debug, Clone, Default)]
pub struct StationNetwork {
    stations: HashMap<String, Station>,
}

impl StationNetwork {
    /// Creates an empty network.
    pub fn new() -> Self {
        StationNetwork::default()
    }

    /// Builds a network, rejecting duplicate station names.
    pub fn from_stations(stations: impl IntoIterator<Item = Station>) -> ValidationResult<Self> {
        let mut network = StationNetwork::new();
        for station in stations {
            network.add(station)?;
        }
        Ok(network)
    }

    /// Adds a station. Names must be unique.
    pub fn add(&mut self, station: Station) -> ValidationResult<()> {
        if self.stations.contains_key(station.name()) {
            return Err(ValidationError::Duplicate {
                field: "station".to_string(),
                value: station.name().to_string(),
            });
        }
        self.stations.insert(station.name().to_string(), station);
        Ok(())
    }

    /// Looks up a station by name.
    pub fn get(&self, name: &str) -> Option<&Station> {
        self.stations.get(name.trim())
    }

    /// Looks up a station by name, failing with `UnknownStation`.
    pub fn resolve(&self, name: &str) -> CoreResult<&Station> {
        self.get(name)
            .ok_or_else(|| CoreError::UnknownStation(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

// =============================================================================
// Journey
// =============================================================================

/// An in-progress or just-settled tube journey.
///
/// Owned by exactly one account. Settlement produces a new value with the
/// end station attached rather than mutating a shared record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Journey {
    start: Station,
    end: Option<Station>,
    tapped_in_at: DateTime<Utc>,
}

impl Journey {
    /// Opens a journey at `start`, stamped with the current time.
    pub fn begin(start: Station) -> Self {
        Journey {
            start,
            end: None,
            tapped_in_at: Utc::now(),
        }
    }

    /// Returns the journey completed at `end`.
    pub fn complete(self, end: Station) -> Self {
        Journey {
            end: Some(end),
            ..self
        }
    }

    pub fn start(&self) -> &Station {
        &self.start
    }

    pub fn end(&self) -> Option<&Station> {
        self.end.as_ref()
    }

    pub fn tapped_in_at(&self) -> DateTime<Utc> {
        self.tapped_in_at
    }
}

// =============================================================================
// Penalties
// =============================================================================

/// Why a maximum-fare penalty was charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyReason {
    /// Swipe-out with no open journey.
    UnmatchedExit,
    /// Swipe-out with a missing or unknown station.
    InvalidStation,
    /// Swipe-in while a previous journey was still open.
    AbandonedJourney,
}

impl fmt::Display for PenaltyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            PenaltyReason::UnmatchedExit => "swipe out without a swipe in",
            PenaltyReason::InvalidStation => "invalid exit station",
            PenaltyReason::AbandonedJourney => "previous journey incomplete",
        };
        f.write_str(text)
    }
}

// =============================================================================
// Ledger
// =============================================================================

/// Kind of balance movement recorded in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "reason")]
pub enum EntryKind {
    TopUp,
    /// Maximum-fare hold taken at swipe-in.
    FareHold,
    /// Unused part of the hold returned at swipe-out.
    FareRefund,
    Penalty(PenaltyReason),
    BusFare,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::TopUp => f.write_str("top-up"),
            EntryKind::FareHold => f.write_str("fare hold"),
            EntryKind::FareRefund => f.write_str("fare refund"),
            EntryKind::Penalty(reason) => write!(f, "penalty ({})", reason),
            EntryKind::BusFare => f.write_str("bus fare"),
        }
    }
}

/// One balance movement. `amount` is signed: credits positive, debits negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub kind: EntryKind,
    pub amount: Money,
    pub balance_after: Money,
    pub at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
