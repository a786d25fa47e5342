use std::fmt::Debug;

use futures_util::future::join_all;
use log::*;
use tokio_util::sync::CancellationToken;

use crate::{
    accrual::AccrualResolver,
    db_types::{NewOrder, Order, OrderNumber},
    lpe_api::errors::OrderFlowError,
    reconciliation::{ReconcileJob, ReconciliationProducer},
    traits::{AccrualUpdate, LoyaltyDatabase, RegisterOrderResult},
};

/// The result of a successful order submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOrderOutcome {
    /// The order number is new and has been registered to the user. Its accrual will be resolved later.
    Accepted(Order),
    /// The user had already uploaded this order number. Nothing was changed.
    AlreadyUploaded(Order),
}

impl SubmitOrderOutcome {
    pub fn order(&self) -> &Order {
        match self {
            Self::Accepted(o) | Self::AlreadyUploaded(o) => o,
        }
    }
}

/// `OrderFlowApi` handles the life cycle of loyalty orders: acceptance, and reconciliation with the accrual service.
///
/// Accepted orders are handed to the reconciliation queue, if one has been attached with
/// [`Self::with_reconciliation_queue`]. Pending orders are also reconciled whenever their owner lists them.
pub struct OrderFlowApi<B, R> {
    db: B,
    resolver: R,
    queue: Option<ReconciliationProducer<ReconcileJob>>,
}

impl<B, R> Debug for OrderFlowApi<B, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B, R> OrderFlowApi<B, R> {
    pub fn new(db: B, resolver: R) -> Self {
        Self { db, resolver, queue: None }
    }

    pub fn with_reconciliation_queue(mut self, producer: ReconciliationProducer<ReconcileJob>) -> Self {
        self.queue = Some(producer);
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }
}

impl<B, R> OrderFlowApi<B, R>
where
    B: LoyaltyDatabase,
    R: AccrualResolver,
{
    /// Validates and registers an order number on behalf of `login`.
    ///
    /// New orders are queued for reconciliation. If the queue is full, the order is still accepted and stays `NEW`
    /// until a later listing reconciles it.
    pub async fn submit_order(&self, login: &str, order_number: &str) -> Result<SubmitOrderOutcome, OrderFlowError> {
        let order_number = OrderNumber::parse(order_number)?;
        let result = self.db.register_order(NewOrder::new(order_number.clone(), login)).await?;
        match result {
            RegisterOrderResult::Inserted(order) => {
                debug!("🔄️📦️ Order [{order_number}] accepted for {login}");
                self.schedule_reconciliation(&order);
                Ok(SubmitOrderOutcome::Accepted(order))
            },
            RegisterOrderResult::AlreadyOwnedBySelf(order) => {
                debug!("🔄️📦️ Order [{order_number}] was already uploaded by {login}");
                Ok(SubmitOrderOutcome::AlreadyUploaded(order))
            },
        }
    }

    fn schedule_reconciliation(&self, order: &Order) {
        match &self.queue {
            Some(queue) => {
                let job = ReconcileJob::new(order.order_number.clone(), order.login.as_str());
                if !queue.enqueue(job) {
                    info!("🔄️📦️ Order [{}] could not be queued. It stays pending", order.order_number);
                }
            },
            None => trace!("🔄️📦️ No reconciliation queue. Order [{}] stays pending", order.order_number),
        }
    }

    /// Fetches the user's orders, oldest first.
    ///
    /// Every order that is still pending is reconciled with the accrual service first, concurrently. An order that
    /// cannot be reconciled right now is reported with its last known status. If the user has no orders,
    /// [`OrderFlowError::NoOrders`] is returned.
    pub async fn orders_for_user(&self, login: &str, cancel: &CancellationToken) -> Result<Vec<Order>, OrderFlowError> {
        let orders = self.db.fetch_orders_for_user(login).await?;
        if orders.is_empty() {
            return Err(OrderFlowError::NoOrders);
        }
        let pending = orders.iter().filter(|o| o.is_pending()).collect::<Vec<_>>();
        if pending.is_empty() {
            return Ok(orders);
        }
        trace!("🔄️📋️ Refreshing {} pending orders for {login}", pending.len());
        let results = join_all(pending.iter().map(|o| self.reconcile_order(&o.order_number, cancel))).await;
        let mut changed = false;
        for (order, result) in pending.iter().zip(results) {
            match result {
                Ok(update) => changed |= update.is_change(),
                Err(e) => debug!("🔄️📋️ Reporting order [{}] as {}. {e}", order.order_number, order.status),
            }
        }
        if !changed {
            return Ok(orders);
        }
        match self.db.fetch_orders_for_user(login).await {
            Ok(orders) => Ok(orders),
            Err(e) => {
                warn!("🔄️📋️ Could not re-read the orders for {login} after reconciling them. {e}");
                Ok(orders)
            },
        }
    }

    /// Asks the accrual service about a single order, and applies the answer.
    ///
    /// Accrual errors leave the order untouched. Applying an answer is idempotent, so reconciling the same order
    /// concurrently, or more than once, credits the owner at most once.
    pub async fn reconcile_order(
        &self,
        order_number: &OrderNumber,
        cancel: &CancellationToken,
    ) -> Result<AccrualUpdate, OrderFlowError> {
        let result = self.resolver.resolve(order_number, cancel).await?;
        let update = self.db.apply_accrual(order_number, result).await?;
        match &update {
            AccrualUpdate::Credited { login, amount } => {
                info!("🔄️💰️ Order [{order_number}] processed. {login} has been credited with {amount} points")
            },
            AccrualUpdate::StatusChanged(status) => debug!("🔄️📦️ Order [{order_number}] is now {status}"),
            AccrualUpdate::Unchanged => trace!("🔄️📦️ Order [{order_number}] is unchanged"),
        }
        Ok(update)
    }

    /// Runs a queued reconciliation job. Failures are logged, never returned: the order simply stays pending.
    pub async fn process_job(&self, job: ReconcileJob, cancel: &CancellationToken) {
        match self.reconcile_order(&job.order_number, cancel).await {
            Ok(_) => {},
            Err(OrderFlowError::Accrual(e)) => {
                warn!("🔄️📬️ Could not reconcile order [{}] for {}. It stays pending. {e}", job.order_number, job.login)
            },
            Err(e) => error!("🔄️📬️ Failed to record the accrual for order [{}]. {e}", job.order_number),
        }
    }
}
