use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use loyalty_common::Points;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

use crate::helpers::luhn;

//--------------------------------------     OrderNumber       ---------------------------------------------------------
/// A Luhn-valid numeric order identifier. Order numbers are unique across all users.
///
/// The only way to build an `OrderNumber` from user input is [`OrderNumber::parse`], so holding one means the check
/// digit has already been verified.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderNumber(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid order number: '{0}'")]
pub struct InvalidOrderNumber(pub String);

impl OrderNumber {
    /// Trims surrounding whitespace and validates the check digit.
    pub fn parse<S: AsRef<str>>(value: S) -> Result<Self, InvalidOrderNumber> {
        let value = value.as_ref().trim();
        if luhn::validate(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(InvalidOrderNumber(value.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OrderNumber {
    type Err = InvalidOrderNumber;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatusType {
    /// The order has been registered, but the accrual service has not reported on it yet.
    New,
    /// The accrual service knows about the order and is still calculating the accrual.
    Processing,
    /// The accrual service rejected the order. Terminal.
    Invalid,
    /// The accrual has been calculated and credited to the owner's balance. Terminal.
    Processed,
}

impl OrderStatusType {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Invalid | Self::Processed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Processing => "PROCESSING",
            Self::Invalid => "INVALID",
            Self::Processed => "PROCESSED",
        }
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(Self::New),
            "PROCESSING" => Ok(Self::Processing),
            "INVALID" => Ok(Self::Invalid),
            "PROCESSED" => Ok(Self::Processed),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
/// A registered order. Withdrawals are orders too: they carry a nonzero `withdrawn` amount and never accrue.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Order {
    pub id: i64,
    pub order_number: OrderNumber,
    pub login: String,
    pub status: OrderStatusType,
    pub accrual: Option<Points>,
    pub withdrawn: Points,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_withdrawal(&self) -> bool {
        !self.withdrawn.is_zero()
    }

    /// True if the order still needs an answer from the accrual service.
    pub fn is_pending(&self) -> bool {
        !self.is_withdrawal() && !self.status.is_terminal()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub order_number: OrderNumber,
    pub login: String,
    pub withdrawn: Points,
    pub uploaded_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn new<S: Into<String>>(order_number: OrderNumber, login: S) -> Self {
        Self { order_number, login: login.into(), withdrawn: Points::ZERO, uploaded_at: Utc::now() }
    }

    pub fn withdrawal<S: Into<String>>(order_number: OrderNumber, login: S, amount: Points) -> Self {
        Self { withdrawn: amount, ..Self::new(order_number, login) }
    }

    pub fn with_uploaded_at(mut self, uploaded_at: DateTime<Utc>) -> Self {
        self.uploaded_at = uploaded_at;
        self
    }
}

//--------------------------------------       Balance         ---------------------------------------------------------
/// A user's balance. `withdrawn` is the sum of all withdrawals the user has made, and is zero when there are none.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Balance {
    pub current: Points,
    pub withdrawn: Points,
}

//--------------------------------------         User          ---------------------------------------------------------
#[derive(Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub login: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("login", &self.login)
            .field("password_hash", &"****")
            .field("created_at", &self.created_at)
            .finish()
    }
}
