//! # Error Types
//!
//! Domain-specific error types for oyster-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  oyster-core errors (this file)                                        │
//! │  ├── CoreError        - Denied operations, bad tariffs, lookups        │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  oyster-cli errors (app)                                               │
//! │  ├── ConfigError      - Environment / flag parsing                     │
//! │  └── ScenarioError    - Scenario file loading                          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ScenarioError → stderr            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## What Is NOT an Error
//! Penalty charges (unmatched exit, invalid station, abandoned journey) are
//! recoverable anomalies. They are reported as
//! [`TapOutcome::Penalty`](crate::account::TapOutcome) so the balance change
//! is visible to the caller.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// A `CoreError` from an account operation means nothing was mutated.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Balance is below the amount required to proceed.
    ///
    /// ## When This Occurs
    /// - Swipe-in with balance below the maximum fare
    /// - Bus boarding with balance below the bus fare
    ///
    /// ## User Workflow
    /// ```text
    /// Swipe in at Holborn (balance £2.00)
    ///      │
    ///      ▼
    /// Check balance: required £3.20
    ///      │
    ///      ▼
    /// InsufficientBalance { required: £3.20, balance: £2.00 }
    ///      │
    ///      ▼
    /// Gate stays closed, nothing charged
    /// ```
    #[error("Insufficient balance: {required} required, {balance} available")]
    InsufficientBalance { required: Money, balance: Money },

    /// Station name could not be resolved in the network.
    #[error("Station not found: {0}")]
    UnknownStation(String),

    /// Tariff violates a pricing invariant.
    #[error("Invalid tariff: {reason}")]
    InvalidTariff { reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g. "2.5x" as an amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g. two stations with the same name).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
