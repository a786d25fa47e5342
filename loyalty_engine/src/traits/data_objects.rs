use loyalty_common::Points;

use crate::db_types::{Order, OrderStatusType};

/// The outcome of registering an order number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOrderResult {
    /// The order number was new, and is now owned by the caller.
    Inserted(Order),
    /// The caller already owns this order number. Nothing was changed.
    AlreadyOwnedBySelf(Order),
}

impl RegisterOrderResult {
    pub fn order(&self) -> &Order {
        match self {
            Self::Inserted(o) | Self::AlreadyOwnedBySelf(o) => o,
        }
    }

    pub fn into_order(self) -> Order {
        match self {
            Self::Inserted(o) | Self::AlreadyOwnedBySelf(o) => o,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Self::Inserted(_))
    }
}

/// What applying an accrual result did to the stored order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccrualUpdate {
    /// The order moved to `PROCESSED` and its owner was credited with `amount`.
    Credited { login: String, amount: Points },
    /// The order moved to a new status with no ledger effect.
    StatusChanged(OrderStatusType),
    /// Nothing changed, either because the result carried no news, or because the order had already reached a
    /// terminal status.
    Unchanged,
}

impl AccrualUpdate {
    pub fn is_change(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// The outcome of a withdrawal request that passed the balance check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WithdrawalResult {
    /// The withdrawal was recorded and the balance debited.
    Recorded { order: Order, balance: Points },
    /// The caller had already used this order number. Nothing was debited.
    AlreadyRecorded(Order),
}
