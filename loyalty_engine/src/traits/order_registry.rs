use thiserror::Error;

use crate::{
    db_types::{NewOrder, Order, OrderNumber},
    traits::RegisterOrderResult,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} is owned by another user")]
    OrderOwnedByOther(OrderNumber),
}

impl From<sqlx::Error> for RegistryError {
    fn from(e: sqlx::Error) -> Self {
        RegistryError::DatabaseError(e.to_string())
    }
}

/// The `OrderRegistry` trait defines the durable mapping from order numbers to the users who own them.
///
/// An order number belongs to exactly one user for its entire lifetime. Implementations must make the
/// "look up the owner, insert if absent" step atomic, so that two users racing to register the same number cannot
/// both succeed.
#[allow(async_fn_in_trait)]
pub trait OrderRegistry {
    /// Registers the order for `order.login`.
    ///
    /// Returns [`RegisterOrderResult::Inserted`] for a new order number, and
    /// [`RegisterOrderResult::AlreadyOwnedBySelf`] if the same user registered it before. If another user owns the
    /// number, [`RegistryError::OrderOwnedByOther`] is returned and nothing is changed.
    async fn register_order(&self, order: NewOrder) -> Result<RegisterOrderResult, RegistryError>;

    async fn fetch_order(&self, order_number: &OrderNumber) -> Result<Option<Order>, RegistryError>;

    /// Fetches the user's accrual orders (withdrawals are excluded), oldest first.
    async fn fetch_orders_for_user(&self, login: &str) -> Result<Vec<Order>, RegistryError>;

    /// Fetches the user's withdrawals, oldest first.
    async fn fetch_withdrawals_for_user(&self, login: &str) -> Result<Vec<Order>, RegistryError>;
}
