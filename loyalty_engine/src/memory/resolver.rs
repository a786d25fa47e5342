use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
        Mutex,
    },
};

use tokio_util::sync::CancellationToken;

use crate::{
    accrual::{AccrualError, AccrualResolver, AccrualResult},
    db_types::OrderNumber,
};

/// An accrual resolver with scripted answers. Order numbers with no script are reported as `Registered`.
#[derive(Debug, Clone, Default)]
pub struct StubAccrualResolver {
    answers: Arc<Mutex<HashMap<OrderNumber, Result<AccrualResult, AccrualError>>>>,
    calls: Arc<AtomicUsize>,
}

impl StubAccrualResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the answer for `order_number`, replacing any previous one.
    pub fn set(&self, order_number: &OrderNumber, answer: Result<AccrualResult, AccrualError>) {
        if let Ok(mut answers) = self.answers.lock() {
            answers.insert(order_number.clone(), answer);
        }
    }

    /// The number of times `resolve` has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AccrualResolver for StubAccrualResolver {
    async fn resolve(
        &self,
        order_number: &OrderNumber,
        cancel: &CancellationToken,
    ) -> Result<AccrualResult, AccrualError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if cancel.is_cancelled() {
            return Err(AccrualError::Cancelled);
        }
        let answers = self.answers.lock().map_err(|e| AccrualError::Unavailable(e.to_string()))?;
        answers.get(order_number).cloned().unwrap_or(Ok(AccrualResult::Registered))
    }
}
