//! # Reconciliation work queue
//!
//! Orders are accepted before their accrual is known. Reconciling them with the accrual service happens afterwards,
//! on a bounded queue that is drained by a small pool of workers.
//!
//! * [`ReconciliationProducer`] is handed to whoever accepts orders. [`ReconciliationProducer::enqueue`] never waits:
//!   if the queue is full the job is refused, and the order simply stays pending until it is reconciled by a later
//!   listing.
//! * [`ReconciliationQueue::start`] runs the jobs, with at most `workers` in flight at any time.
mod queue;

pub use queue::{JobHandler, ReconciliationProducer, ReconciliationQueue};

use crate::db_types::OrderNumber;

pub const DEFAULT_RECONCILE_WORKERS: usize = 4;
pub const DEFAULT_RECONCILE_QUEUE_SIZE: usize = 256;

/// A request to reconcile a single order with the accrual service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileJob {
    pub order_number: OrderNumber,
    pub login: String,
}

impl ReconcileJob {
    pub fn new<S: Into<String>>(order_number: OrderNumber, login: S) -> Self {
        Self { order_number, login: login.into() }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReconciliationConfig {
    /// The maximum number of reconciliations in flight.
    pub workers: usize,
    /// The number of jobs that can wait in the queue before new jobs are refused.
    pub queue_size: usize,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self { workers: DEFAULT_RECONCILE_WORKERS, queue_size: DEFAULT_RECONCILE_QUEUE_SIZE }
    }
}
