//! # Validation Module
//!
//! Input validation for stations, zones, top-ups and tariffs.
//!
//! ## Where Validation Happens
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Scenario / tariff file (serde)                               │
//! │  └── Type validation (deserialization)                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Constructors (Station::new, Tariff::validate)                │
//! │  └── THIS MODULE: business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Account operations                                           │
//! │  └── Balance sufficiency (CoreError::InsufficientBalance)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use oyster_core::validation::{validate_station_name, validate_zone};
//!
//! validate_station_name("Earl's Court").unwrap();
//! validate_zone(2).unwrap();
//! assert!(validate_zone(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_BALANCE, MAX_STATION_NAME_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a station name.
///
/// ## Rules
/// - Must not be empty (after trimming)
/// - At most `MAX_STATION_NAME_LEN` characters
pub fn validate_station_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "station name".to_string(),
        });
    }

    if name.chars().count() > MAX_STATION_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "station name".to_string(),
            max: MAX_STATION_NAME_LEN,
        });
    }

    Ok(())
}

// =============================================================================
// Zone Validators
// =============================================================================

/// Validates a single zone number. Zones start at 1.
pub fn validate_zone(zone: u32) -> ValidationResult<()> {
    if zone == 0 {
        return Err(ValidationError::OutOfRange {
            field: "zone".to_string(),
            min: 1,
            max: u32::MAX as i64,
        });
    }

    Ok(())
}

/// Validates the zone list of a station: non-empty, every zone valid.
///
/// Repeated zones are allowed; they collapse into one.
pub fn validate_zones(zones: &[u32]) -> ValidationResult<()> {
    if zones.is_empty() {
        return Err(ValidationError::Required {
            field: "zones".to_string(),
        });
    }

    zones.iter().try_for_each(|&zone| validate_zone(zone))
}

// =============================================================================
// Money Validators
// =============================================================================

/// Validates a top-up amount.
///
/// ## Rules
/// - Must be positive (> 0); zero or negative loads are rejected
/// - The resulting balance must not exceed `MAX_BALANCE`
pub fn validate_top_up(amount: Money, balance: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "top-up amount".to_string(),
        });
    }

    let within_limit = balance
        .checked_add(amount)
        .is_some_and(|total| total <= MAX_BALANCE);
    if !within_limit {
        return Err(ValidationError::OutOfRange {
            field: "top-up amount".to_string(),
            min: 1,
            max: MAX_BALANCE.pence().saturating_sub(balance.pence()).max(0),
        });
    }

    Ok(())
}

/// Validates a fare amount against the maximum fare.
///
/// ## Rules
/// - Must be positive
/// - Must not exceed `max_fare`
pub fn validate_fare(field: &str, fare: Money, max_fare: Money) -> ValidationResult<()> {
    if !fare.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    if fare > max_fare {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: max_fare.pence(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_station_name() {
        assert!(validate_station_name("Holborn").is_ok());
        assert!(validate_station_name("Earl's Court").is_ok());

        assert!(validate_station_name("").is_err());
        assert!(validate_station_name("   ").is_err());
        assert!(validate_station_name(&"A".repeat(MAX_STATION_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn test_validate_zones() {
        assert!(validate_zones(&[1]).is_ok());
        assert!(validate_zones(&[1, 2]).is_ok());
        assert!(validate_zones(&[2, 4]).is_ok());

        assert!(validate_zones(&[]).is_err());
        assert!(validate_zones(&[0]).is_err());
        assert!(validate_zones(&[1, 0]).is_err());
    }

    #[test]
    fn test_validate_top_up() {
        let balance = Money::from_pence(3000);
        assert!(validate_top_up(Money::from_pence(1000), balance).is_ok());
        assert!(validate_top_up(Money::from_pence(1), balance).is_ok());
        assert!(validate_top_up(MAX_BALANCE - balance, balance).is_ok());

        assert!(validate_top_up(Money::zero(), balance).is_err());
        assert!(validate_top_up(Money::from_pence(-500), balance).is_err());
        assert!(matches!(
            validate_top_up(MAX_BALANCE - balance + Money::from_pence(1), balance),
            Err(ValidationError::OutOfRange { max: 99_997_000, .. })
        ));
        assert!(validate_top_up(Money::from_pence(i64::MAX), balance).is_err());
    }

    #[test]
    fn test_validate_fare() {
        let max = Money::from_pence(320);
        assert!(validate_fare("fare", Money::from_pence(250), max).is_ok());
        assert!(validate_fare("fare", max, max).is_ok());

        assert!(validate_fare("fare", Money::zero(), max).is_err());
        assert!(validate_fare("fare", Money::from_pence(321), max).is_err());
    }
}
