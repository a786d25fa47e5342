use loyalty_common::Points;
use thiserror::Error;

use crate::{
    accrual::AccrualError,
    db_types::{InvalidOrderNumber, OrderNumber},
    traits::{LedgerError, LoyaltyDatabaseError, RegistryError},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderFlowError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid order number: '{0}'")]
    InvalidOrderNumber(String),
    #[error("Order {0} has already been uploaded by another user")]
    OrderOwnedByOther(OrderNumber),
    #[error("The user has not uploaded any orders")]
    NoOrders,
    #[error("Accrual service error: {0}")]
    Accrual(#[from] AccrualError),
}

impl From<InvalidOrderNumber> for OrderFlowError {
    fn from(e: InvalidOrderNumber) -> Self {
        Self::InvalidOrderNumber(e.0)
    }
}

impl From<RegistryError> for OrderFlowError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::DatabaseError(s) => Self::DatabaseError(s),
            RegistryError::OrderOwnedByOther(n) => Self::OrderOwnedByOther(n),
        }
    }
}

impl From<LoyaltyDatabaseError> for OrderFlowError {
    fn from(e: LoyaltyDatabaseError) -> Self {
        match e {
            LoyaltyDatabaseError::OrderOwnedByOther(n) => Self::OrderOwnedByOther(n),
            e => Self::DatabaseError(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BalanceApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid order number: '{0}'")]
    InvalidOrderNumber(String),
    #[error("Withdrawals must be for a positive amount, not {0}")]
    InvalidAmount(Points),
    #[error("Insufficient balance. Requested {requested}, but only {available} is available")]
    InsufficientBalance { requested: Points, available: Points },
    #[error("Order {0} has already been used by another user")]
    OrderOwnedByOther(OrderNumber),
    #[error("The user has not made any withdrawals")]
    NoWithdrawals,
}

impl From<InvalidOrderNumber> for BalanceApiError {
    fn from(e: InvalidOrderNumber) -> Self {
        Self::InvalidOrderNumber(e.0)
    }
}

impl From<LedgerError> for BalanceApiError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::DatabaseError(s) => Self::DatabaseError(s),
            LedgerError::InsufficientBalance { requested, available } => {
                Self::InsufficientBalance { requested, available }
            },
        }
    }
}

impl From<RegistryError> for BalanceApiError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::DatabaseError(s) => Self::DatabaseError(s),
            RegistryError::OrderOwnedByOther(n) => Self::OrderOwnedByOther(n),
        }
    }
}

impl From<LoyaltyDatabaseError> for BalanceApiError {
    fn from(e: LoyaltyDatabaseError) -> Self {
        match e {
            LoyaltyDatabaseError::DatabaseError(s) => Self::DatabaseError(s),
            LoyaltyDatabaseError::OrderOwnedByOther(n) => Self::OrderOwnedByOther(n),
            LoyaltyDatabaseError::InsufficientBalance { requested, available } => {
                Self::InsufficientBalance { requested, available }
            },
            LoyaltyDatabaseError::InvalidWithdrawalAmount(p) => Self::InvalidAmount(p),
        }
    }
}
