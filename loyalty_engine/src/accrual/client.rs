use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{header::RETRY_AFTER, Client, StatusCode};
use tokio_util::sync::CancellationToken;

use crate::{
    accrual::{AccrualError, AccrualResolver, AccrualResponse, AccrualResult},
    db_types::OrderNumber,
};

pub const DEFAULT_ACCRUAL_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct AccrualConfig {
    /// Base address of the accrual service, e.g. `http://127.0.0.1:8080`. A missing scheme defaults to `http://`.
    pub base_url: String,
    /// Deadline for a single accrual request, including connecting and reading the body.
    pub timeout: Duration,
}

impl Default for AccrualConfig {
    fn default() -> Self {
        Self { base_url: "http://127.0.0.1:8080".to_string(), timeout: DEFAULT_ACCRUAL_TIMEOUT }
    }
}

impl AccrualConfig {
    pub fn new<S: Into<String>>(base_url: S, timeout: Duration) -> Self {
        Self { base_url: base_url.into(), timeout }
    }

    pub fn order_url(&self, order_number: &OrderNumber) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.starts_with("http://") || base.starts_with("https://") {
            format!("{base}/api/orders/{order_number}")
        } else {
            format!("http://{base}/api/orders/{order_number}")
        }
    }
}

/// HTTP client for the accrual service.
#[derive(Clone)]
pub struct AccrualClient {
    config: AccrualConfig,
    client: Arc<Client>,
}

impl std::fmt::Debug for AccrualClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccrualClient ({})", self.config.base_url)
    }
}

impl AccrualClient {
    pub fn new(config: AccrualConfig) -> Result<Self, AccrualError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AccrualError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &AccrualConfig {
        &self.config
    }

    async fn fetch(&self, order_number: &OrderNumber) -> Result<AccrualResult, AccrualError> {
        let url = self.config.order_url(order_number);
        trace!("🛰️ GET {url}");
        let response = self.client.get(url).send().await.map_err(|e| self.request_error(e))?;
        let status = response.status();
        match status {
            StatusCode::NO_CONTENT => {
                debug!("🛰️ Accrual service has no record of order {order_number} yet");
                Ok(AccrualResult::Processing)
            },
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.trim().parse::<u64>().ok());
                Err(AccrualError::RateLimited(retry_after))
            },
            s if s.is_success() => {
                let body = response.bytes().await.map_err(|e| self.request_error(e))?;
                parse_accrual_body(order_number, &body)
            },
            s => Err(AccrualError::UnexpectedStatus(s.as_u16())),
        }
    }

    fn request_error(&self, e: reqwest::Error) -> AccrualError {
        if e.is_timeout() {
            AccrualError::Timeout(self.config.timeout.as_millis())
        } else {
            AccrualError::Unavailable(e.to_string())
        }
    }
}

impl AccrualResolver for AccrualClient {
    async fn resolve(
        &self,
        order_number: &OrderNumber,
        cancel: &CancellationToken,
    ) -> Result<AccrualResult, AccrualError> {
        let result = tokio::select! {
            _ = cancel.cancelled() => Err(AccrualError::Cancelled),
            r = tokio::time::timeout(self.config.timeout, self.fetch(order_number)) => {
                r.unwrap_or(Err(AccrualError::Timeout(self.config.timeout.as_millis())))
            }
        };
        match &result {
            Ok(r) => debug!("🛰️ Accrual for order {order_number}: {r:?}"),
            Err(e) => debug!("🛰️ Accrual for order {order_number} could not be resolved. {e}"),
        }
        result
    }
}

/// Interprets a 2xx response body. An empty body means the accrual service has nothing to report yet.
pub(crate) fn parse_accrual_body(order_number: &OrderNumber, body: &[u8]) -> Result<AccrualResult, AccrualError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(AccrualResult::Processing);
    }
    let response =
        serde_json::from_slice::<AccrualResponse>(body).map_err(|e| AccrualError::MalformedResponse(e.to_string()))?;
    if response.order != order_number.as_str() {
        warn!("🛰️ Asked the accrual service about order {order_number}, but it answered for {}", response.order);
    }
    AccrualResult::try_from(response)
}
