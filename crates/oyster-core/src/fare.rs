//! # Fare Policy
//!
//! Zone-based fare calculation.
//!
//! ## Pricing Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Journey                                   │  Default fare             │
//! │  ──────────────────────────────────────────┼─────────────────────────  │
//! │  Same station, station in zone 1           │  £2.50                    │
//! │  Same station, outside zone 1              │  £2.00                    │
//! │  Zone 1 only                               │  £2.50                    │
//! │  One zone, outside zone 1                  │  £2.00                    │
//! │  Two zones, excluding zone 1               │  £2.25                    │
//! │  Two zones, including zone 1               │  £3.00                    │
//! │  Three zones                               │  £3.20                    │
//! │  Anything wider                            │  £3.20 (maximum fare)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Boundary Stations
//! A boundary station sits in several zones (Earl's Court is in zones 1 and
//! 2). Before pricing, its zone set collapses to the highest of its zones
//! that the other end of the journey also touches. When the other end shares
//! none of its zones it keeps its full zone set.
//!
//! ```text
//! Holborn [1]       → Earl's Court [1,2]   Earl's Court treated as [1]  → £2.50
//! Earl's Court [1,2]→ Hammersmith [2]      Earl's Court treated as [2]  → £2.00
//! Earl's Court [1,2]→ Wimbledon [3]        no shared zone, span 1..3    → £3.20
//! ```
//!
//! ## Usage
//! ```rust
//! use oyster_core::fare::FarePolicy;
//! use oyster_core::types::Station;
//!
//! let policy = FarePolicy::default();
//! let holborn = Station::new("Holborn", &[1]).unwrap();
//! let earls_court = Station::new("Earl's Court", &[1, 2]).unwrap();
//!
//! assert_eq!(policy.calculate_fare(&holborn, &earls_court).pence(), 250);
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Station, Zone};
use crate::validation::{validate_fare, validate_station_name};

// =============================================================================
// Tariff
// =============================================================================

/// Fare amounts and boundary stations for one pricing regime.
///
/// Several tariffs can coexist; each [`FarePolicy`] and
/// [`Account`](crate::account::Account) carries its own copy.
///
/// Deserializing fills unspecified fields from [`Tariff::default`], so a
/// tariff file only needs to list what changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tariff {
    /// Hold taken at swipe-in; also the penalty amount and the fare ceiling.
    pub max_fare: Money,

    /// Flat bus fare.
    pub bus_fare: Money,

    /// Tap in and out at the same zone 1 station.
    pub same_station_zone_one_fare: Money,

    /// Tap in and out at the same station outside zone 1.
    pub same_station_outer_fare: Money,

    /// Journey entirely within zone 1.
    pub zone_one_fare: Money,

    /// Journey within one zone other than zone 1.
    pub single_outer_zone_fare: Money,

    /// Journey across two zones, neither of them zone 1.
    pub two_outer_zones_fare: Money,

    /// Journey across two zones including zone 1.
    pub two_zones_with_zone_one_fare: Money,

    /// Journey across three zones.
    pub three_zones_fare: Money,

    /// Names of stations priced as boundary stations.
    pub boundary_stations: Vec<String>,
}

impl Default for Tariff {
    /// London fares.
    fn default() -> Self {
        Tariff {
            max_fare: Money::from_pence(320),
            bus_fare: Money::from_pence(180),
            same_station_zone_one_fare: Money::from_pence(250),
            same_station_outer_fare: Money::from_pence(200),
            zone_one_fare: Money::from_pence(250),
            single_outer_zone_fare: Money::from_pence(200),
            two_outer_zones_fare: Money::from_pence(225),
            two_zones_with_zone_one_fare: Money::from_pence(300),
            three_zones_fare: Money::from_pence(320),
            boundary_stations: vec!["Earl's Court".to_string()],
        }
    }
}

impl Tariff {
    /// Parses a tariff from JSON and validates it.
    ///
    /// ## Example
    /// ```rust
    /// use oyster_core::fare::Tariff;
    ///
    /// let tariff = Tariff::from_json_str(r#"{ "bus_fare": 175 }"#).unwrap();
    /// assert_eq!(tariff.bus_fare.pence(), 175);
    /// assert_eq!(tariff.max_fare.pence(), 320);
    /// ```
    pub fn from_json_str(json: &str) -> CoreResult<Self> {
        let tariff: Tariff = serde_json::from_str(json).map_err(|e| CoreError::InvalidTariff {
            reason: e.to_string(),
        })?;
        tariff.validate()?;
        Ok(tariff)
    }

    /// Checks that every journey fare is positive and no greater than the
    /// maximum fare, that the bus fare is positive, and that boundary station
    /// names are well formed.
    pub fn validate(&self) -> CoreResult<()> {
        if !self.max_fare.is_positive() {
            return Err(CoreError::InvalidTariff {
                reason: "max_fare must be positive".to_string(),
            });
        }

        if !self.bus_fare.is_positive() {
            return Err(CoreError::InvalidTariff {
                reason: "bus_fare must be positive".to_string(),
            });
        }

        let fares = [
            ("same_station_zone_one_fare", self.same_station_zone_one_fare),
            ("same_station_outer_fare", self.same_station_outer_fare),
            ("zone_one_fare", self.zone_one_fare),
            ("single_outer_zone_fare", self.single_outer_zone_fare),
            ("two_outer_zones_fare", self.two_outer_zones_fare),
            ("two_zones_with_zone_one_fare", self.two_zones_with_zone_one_fare),
            ("three_zones_fare", self.three_zones_fare),
        ];
        for (field, fare) in fares {
            validate_fare(field, fare, self.max_fare).map_err(|e| CoreError::InvalidTariff {
                reason: e.to_string(),
            })?;
        }

        for name in &self.boundary_stations {
            validate_station_name(name)?;
        }

        Ok(())
    }
}

// =============================================================================
// Fare Policy
// =============================================================================

/// Computes journey fares from a [`Tariff`]. Pure; holds no journey state.
#[derive(Debug, Clone, PartialEq)]
pub struct FarePolicy {
    tariff: Tariff,
}

impl FarePolicy {
    /// Creates a policy from a validated tariff.
    pub fn new(tariff: Tariff) -> CoreResult<Self> {
        tariff.validate()?;
        Ok(FarePolicy { tariff })
    }

    pub fn tariff(&self) -> &Tariff {
        &self.tariff
    }

    /// Maximum fare: the swipe-in hold and the penalty amount.
    #[inline]
    pub fn max_fare(&self) -> Money {
        self.tariff.max_fare
    }

    #[inline]
    pub fn bus_fare(&self) -> Money {
        self.tariff.bus_fare
    }

    /// Checks whether a station is priced as a boundary station.
    pub fn is_boundary_station(&self, station: &Station) -> bool {
        self.tariff
            .boundary_stations
            .iter()
            .any(|name| name.trim() == station.name())
    }

    /// Fare for a journey from `start` to `end`. Never exceeds the max fare.
    pub fn calculate_fare(&self, start: &Station, end: &Station) -> Money {
        if start == end {
            return self.same_station_fare(start);
        }

        let mut start_zones = start.zones().clone();
        let mut end_zones = end.zones().clone();

        if self.is_boundary_station(start) {
            start_zones = collapse_boundary(&start_zones, &end_zones);
        }
        if self.is_boundary_station(end) {
            end_zones = collapse_boundary(&end_zones, &start_zones);
        }

        self.fare_for_zones(&start_zones, &end_zones)
    }

    /// Fare for tapping in and out at the same station.
    ///
    /// Judged on the station's own zones, so a boundary station in zone 1
    /// always pays the zone 1 rate.
    pub fn same_station_fare(&self, station: &Station) -> Money {
        let fare = if station.in_zone(Zone::ONE) {
            self.tariff.same_station_zone_one_fare
        } else {
            self.tariff.same_station_outer_fare
        };
        fare.min(self.tariff.max_fare)
    }

    /// Prices a journey between two (already normalized) zone sets.
    pub fn fare_for_zones(&self, start_zones: &BTreeSet<Zone>, end_zones: &BTreeSet<Zone>) -> Money {
        let combined: BTreeSet<Zone> = start_zones.union(end_zones).copied().collect();

        let (Some(lowest), Some(highest)) = (combined.first(), combined.last()) else {
            return self.tariff.max_fare;
        };
        let span = highest.get() - lowest.get() + 1;
        let touches_zone_one = combined.contains(&Zone::ONE);

        let fare = match (span, touches_zone_one) {
            (1, true) => self.tariff.zone_one_fare,
            (1, false) => self.tariff.single_outer_zone_fare,
            (2, false) => self.tariff.two_outer_zones_fare,
            (2, true) => self.tariff.two_zones_with_zone_one_fare,
            (3, _) => self.tariff.three_zones_fare,
            _ => self.tariff.max_fare,
        };

        fare.min(self.tariff.max_fare)
    }
}

impl Default for FarePolicy {
    fn default() -> Self {
        FarePolicy {
            tariff: Tariff::default(),
        }
    }
}

/// Collapses a boundary station's zones to the highest one shared with the
/// other end of the journey. Unchanged when nothing is shared.
fn collapse_boundary(own: &BTreeSet<Zone>, other: &BTreeSet<Zone>) -> BTreeSet<Zone> {
    match own.iter().rev().find(|zone| other.contains(*zone)) {
        Some(&zone) => BTreeSet::from([zone]),
        None => own.clone(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
