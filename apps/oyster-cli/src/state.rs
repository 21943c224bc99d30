//! # Shared Account State
//!
//! Serializes access to one card account.
//!
//! ## Thread Safety
//! The account is wrapped in `Arc<Mutex<T>>` because:
//! 1. Every tap operation reads and then writes the balance
//! 2. Two taps against the same card must never interleave
//! 3. Accounts are independent, so one lock per account is enough
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Reader A ── swipe_in ──┐                                               │
//! │                         ├──► lock ──► Account ──► unlock               │
//! │  Reader B ── take_bus ──┘    (one operation at a time)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use oyster_core::Account;

/// Cloneable handle to a mutex-guarded account.
#[derive(Debug, Clone)]
pub struct SharedAccount {
    account: Arc<Mutex<Account>>,
}

impl SharedAccount {
    pub fn new(account: Account) -> Self {
        SharedAccount {
            account: Arc::new(Mutex::new(account)),
        }
    }

    /// Executes a function with read access to the account.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let balance = shared.with_account(|account| account.balance());
    /// ```
    pub fn with_account<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Account) -> R,
    {
        // Operations never panic half-way through a mutation, so a poisoned
        // lock still guards a consistent account.
        let account = self.account.lock().unwrap_or_else(PoisonError::into_inner);
        f(&account)
    }

    /// Executes a function with exclusive write access to the account.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// shared.with_account_mut(|account| account.take_bus())?;
    /// ```
    pub fn with_account_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Account) -> R,
    {
        let mut account = self.account.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut account)
    }
}
