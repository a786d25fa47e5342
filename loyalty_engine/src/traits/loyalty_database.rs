use loyalty_common::Points;
use thiserror::Error;

use crate::{
    accrual::AccrualResult,
    db_types::{NewOrder, OrderNumber},
    traits::{AccrualUpdate, BalanceLedger, LedgerError, OrderRegistry, RegistryError, WithdrawalResult},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoyaltyDatabaseError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} is owned by another user")]
    OrderOwnedByOther(OrderNumber),
    #[error("Insufficient balance. Requested {requested}, but only {available} is available")]
    InsufficientBalance { requested: Points, available: Points },
    #[error("Withdrawals must be for a positive amount, not {0}")]
    InvalidWithdrawalAmount(Points),
}

impl From<sqlx::Error> for LoyaltyDatabaseError {
    fn from(e: sqlx::Error) -> Self {
        LoyaltyDatabaseError::DatabaseError(e.to_string())
    }
}

impl From<RegistryError> for LoyaltyDatabaseError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::DatabaseError(s) => Self::DatabaseError(s),
            RegistryError::OrderOwnedByOther(n) => Self::OrderOwnedByOther(n),
        }
    }
}

impl From<LedgerError> for LoyaltyDatabaseError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::DatabaseError(s) => Self::DatabaseError(s),
            LedgerError::InsufficientBalance { requested, available } => {
                Self::InsufficientBalance { requested, available }
            },
        }
    }
}

/// The highest level of behaviour for loyalty engine backends: the operations that touch the order registry and the
/// balance ledger together, and so must run in a single transaction.
#[allow(async_fn_in_trait)]
pub trait LoyaltyDatabase: Clone + OrderRegistry + BalanceLedger {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Applies an accrual result to a registered order.
    ///
    /// * `Processed(amount)` sets the order to `PROCESSED`, records the accrual and credits the owner, all in one
    ///   transaction.
    /// * `Invalid` sets the order to `INVALID`.
    /// * `Processing` moves a `NEW` order to `PROCESSING`.
    /// * `Registered` changes nothing.
    ///
    /// Orders that have already reached a terminal status, and withdrawals, are never touched, so re-applying the
    /// same result is a no-op and an accrual is credited at most once.
    async fn apply_accrual(
        &self,
        order_number: &OrderNumber,
        result: AccrualResult,
    ) -> Result<AccrualUpdate, LoyaltyDatabaseError>;

    /// Records a withdrawal of `order.withdrawn` points against the order number in `order`, in one transaction:
    ///
    /// 1. The balance is debited only if it covers the amount. Otherwise
    ///    [`LoyaltyDatabaseError::InsufficientBalance`] is returned, and nothing is registered.
    /// 2. The order number is registered with the same ownership rules as any other order. If another user owns it,
    ///    the debit is rolled back and [`LoyaltyDatabaseError::OrderOwnedByOther`] is returned. If the caller already
    ///    owns it, the debit is rolled back and [`WithdrawalResult::AlreadyRecorded`] is returned.
    async fn withdraw(&self, order: NewOrder) -> Result<WithdrawalResult, LoyaltyDatabaseError>;
}
