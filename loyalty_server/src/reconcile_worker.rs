use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use loyalty_engine::{
    reconciliation::JobHandler,
    AccrualClient,
    OrderFlowApi,
    ReconcileJob,
    ReconciliationConfig,
    ReconciliationProducer,
    ReconciliationQueue,
    SqliteDatabase,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Starts the reconciliation worker, and returns its handle along with the producer that feeds it.
///
/// The worker runs until `shutdown` is cancelled, or every producer has been dropped. Awaiting the handle after
/// cancelling waits for the reconciliations that are in flight.
pub fn start_reconciliation_worker(
    db: SqliteDatabase,
    resolver: AccrualClient,
    config: ReconciliationConfig,
    shutdown: CancellationToken,
) -> (JoinHandle<()>, ReconciliationProducer<ReconcileJob>) {
    let queue = ReconciliationQueue::<ReconcileJob>::new(config.queue_size);
    let producer = queue.producer();
    let api = Arc::new(OrderFlowApi::new(db, resolver));
    let cancel = shutdown.clone();
    let handler: JobHandler<ReconcileJob> = Arc::new(move |job| {
        let api = Arc::clone(&api);
        let cancel = cancel.clone();
        Box::pin(async move { api.process_job(job, &cancel).await }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    let handle = tokio::spawn(async move {
        info!("📬️ Reconciliation worker started with {} workers", config.workers);
        queue.start(handler, config.workers, shutdown).await;
        info!("📬️ Reconciliation worker stopped");
    });
    (handle, producer)
}
