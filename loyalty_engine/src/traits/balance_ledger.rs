use loyalty_common::Points;
use thiserror::Error;

use crate::db_types::Balance;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Insufficient balance. Requested {requested}, but only {available} is available")]
    InsufficientBalance { requested: Points, available: Points },
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::DatabaseError(e.to_string())
    }
}

/// The `BalanceLedger` trait defines behaviour for managing per-user point balances.
///
/// Balance rows are created lazily, so every method accepts logins that have never been seen before.
/// Mutations must be atomic per user: concurrent increases and decreases for the same login may never lose an update.
#[allow(async_fn_in_trait)]
pub trait BalanceLedger {
    /// Creates an empty balance for the user if one does not exist yet.
    async fn open_balance(&self, login: &str) -> Result<(), LedgerError>;

    /// The current balance, plus the sum of all withdrawals. Unknown users have a zero balance.
    async fn fetch_balance(&self, login: &str) -> Result<Balance, LedgerError>;

    /// Fails with [`LedgerError::InsufficientBalance`] if the current balance is less than `amount`.
    ///
    /// This is only a read. Use [`crate::traits::LoyaltyDatabase::withdraw`] to check and debit atomically.
    async fn check_withdrawable(&self, login: &str, amount: Points) -> Result<(), LedgerError>;

    /// Adds `amount` to the user's balance and returns the new balance.
    async fn increase_balance(&self, login: &str, amount: Points) -> Result<Points, LedgerError>;

    /// Subtracts `amount` from the user's balance and returns the new balance. There is no floor.
    async fn decrease_balance(&self, login: &str, amount: Points) -> Result<Points, LedgerError>;
}
