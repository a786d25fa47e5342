use chrono::{DateTime, Utc};
use loyalty_engine::db_types::{Balance, Order, OrderStatusType};
use loyalty_common::Points;
use serde::{Deserialize, Serialize};

use crate::errors::ServerError;

#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials").field("login", &self.login).field("password", &"****").finish()
    }
}

impl Credentials {
    /// Both fields must be non-blank.
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.login.trim().is_empty() || self.password.is_empty() {
            return Err(ServerError::InvalidRequestBody("Login and password are both required".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: std::fmt::Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }
}

/// An accrual order, as reported to its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderView {
    pub number: String,
    pub status: OrderStatusType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accrual: Option<Points>,
    pub uploaded_at: DateTime<Utc>,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        Self {
            number: order.order_number.to_string(),
            status: order.status,
            accrual: order.accrual,
            uploaded_at: order.uploaded_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BalanceView {
    pub current: Points,
    pub withdrawn: Points,
}

impl From<Balance> for BalanceView {
    fn from(b: Balance) -> Self {
        Self { current: b.current, withdrawn: b.withdrawn }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WithdrawRequest {
    pub order: String,
    pub sum: Points,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WithdrawalView {
    pub order: String,
    pub sum: Points,
    pub processed_at: DateTime<Utc>,
}

impl From<Order> for WithdrawalView {
    fn from(order: Order) -> Self {
        Self { order: order.order_number.to_string(), sum: order.withdrawn, processed_at: order.uploaded_at }
    }
}
