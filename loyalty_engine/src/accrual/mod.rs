//! # Accrual resolver
//!
//! The accrual service is an external system that calculates how many loyalty points an order earns. It is queried
//! with `GET /api/orders/{number}` and answers with `{order, status, accrual}`.
//!
//! [`AccrualResolver`] is the seam the rest of the engine depends on. [`AccrualClient`] is the HTTP implementation.
//! Every call is a single best-effort request bounded by a deadline and the caller's cancellation token. Callers
//! decide whether to ask again later.
mod client;

pub use client::{AccrualClient, AccrualConfig, DEFAULT_ACCRUAL_TIMEOUT};
use loyalty_common::Points;
use serde::Deserialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::db_types::OrderNumber;

/// What the accrual service knows about an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccrualResult {
    /// The service has registered the order, but has not started calculating the accrual.
    Registered,
    /// The accrual is being calculated. Also used when the service has nothing to say about the order yet.
    Processing,
    /// The service rejected the order. No points will be awarded.
    Invalid,
    /// The accrual has been calculated.
    Processed(Points),
}

impl AccrualResult {
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Invalid | Self::Processed(_))
    }
}

/// The resolver could not produce an answer. The order should be treated as still pending.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccrualError {
    #[error("Could not initialize accrual client: {0}")]
    Initialization(String),
    #[error("The accrual service is unavailable: {0}")]
    Unavailable(String),
    #[error("The accrual service did not respond within {0}ms")]
    Timeout(u128),
    #[error("The accrual request was cancelled")]
    Cancelled,
    #[error("The accrual service is rate limiting requests. Retry after {0:?}s")]
    RateLimited(Option<u64>),
    #[error("The accrual service responded with HTTP status {0}")]
    UnexpectedStatus(u16),
    #[error("Could not read the accrual service response: {0}")]
    MalformedResponse(String),
}

/// Resolves the accrual for an order from an external accrual service.
#[allow(async_fn_in_trait)]
pub trait AccrualResolver {
    /// Make a single attempt to fetch the accrual status of `order_number`.
    ///
    /// Implementations must abort promptly, returning [`AccrualError::Cancelled`], once `cancel` is triggered.
    async fn resolve(
        &self,
        order_number: &OrderNumber,
        cancel: &CancellationToken,
    ) -> Result<AccrualResult, AccrualError>;
}

/// The wire status reported by the accrual service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccrualStatus {
    Registered,
    Invalid,
    Processing,
    Processed,
}

/// The JSON body returned by `GET /api/orders/{number}`.
#[derive(Debug, Clone, Deserialize)]
pub struct AccrualResponse {
    pub order: String,
    pub status: AccrualStatus,
    #[serde(default)]
    pub accrual: Option<Points>,
}

impl TryFrom<AccrualResponse> for AccrualResult {
    type Error = AccrualError;

    fn try_from(value: AccrualResponse) -> Result<Self, Self::Error> {
        match value.status {
            AccrualStatus::Registered => Ok(AccrualResult::Registered),
            AccrualStatus::Processing => Ok(AccrualResult::Processing),
            AccrualStatus::Invalid => Ok(AccrualResult::Invalid),
            AccrualStatus::Processed => match value.accrual {
                Some(accrual) if accrual.value() < 0 => Err(AccrualError::MalformedResponse(format!(
                    "Order {} was processed with a negative accrual of {accrual}",
                    value.order
                ))),
                // A processed order with no accrual earns nothing
                accrual => Ok(AccrualResult::Processed(accrual.unwrap_or_default())),
            },
        }
    }
}
