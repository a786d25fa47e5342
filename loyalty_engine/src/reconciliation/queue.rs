use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;

pub type JobHandler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct ReconciliationQueue<E: Send + 'static> {
    receiver: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
}

impl<E: Send + 'static> ReconciliationQueue<E> {
    pub fn new(queue_size: usize) -> Self {
        let (sender, receiver) = mpsc::channel(queue_size.max(1));
        Self { receiver, sender }
    }

    pub fn producer(&self) -> ReconciliationProducer<E> {
        ReconciliationProducer::new(self.sender.clone())
    }

    /// Runs `handler` for every job in the queue, with no more than `workers` jobs in flight.
    ///
    /// Returns once every producer has been dropped, or `shutdown` has been cancelled, and the jobs already in flight
    /// have completed. Jobs still waiting in the queue at shutdown are discarded.
    pub async fn start(mut self, handler: JobHandler<E>, workers: usize, shutdown: CancellationToken) {
        let workers = workers.max(1);
        debug!("📬️ Starting reconciliation queue with {workers} workers");
        // Only the producers handed out keep the queue alive
        drop(self.sender);
        let permits = Arc::new(Semaphore::new(workers));
        loop {
            let job = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("📬️ Reconciliation queue received the shutdown signal");
                    break;
                },
                job = self.receiver.recv() => match job {
                    Some(job) => job,
                    None => {
                        debug!("📬️ All reconciliation producers have been dropped");
                        break;
                    },
                },
            };
            let permit = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                permit = Arc::clone(&permits).acquire_owned() => match permit {
                    Ok(p) => p,
                    Err(e) => {
                        error!("📬️ Worker pool closed unexpectedly. {e}");
                        break;
                    },
                },
            };
            trace!("📬️ Dispatching reconciliation job");
            let handler = Arc::clone(&handler);
            tokio::spawn(async move {
                (handler)(job).await;
                drop(permit);
                trace!("📬️ Reconciliation job complete");
            });
        }
        self.receiver.close();
        let mut discarded = 0usize;
        while self.receiver.try_recv().is_ok() {
            discarded += 1;
        }
        if discarded > 0 {
            warn!("📬️ {discarded} reconciliation jobs were still queued at shutdown. Those orders stay pending");
        }
        debug!("📬️ Waiting for in-flight reconciliation jobs to complete");
        match permits.acquire_many(workers as u32).await {
            Ok(_) => debug!("📬️ Reconciliation queue has shut down"),
            Err(e) => warn!("📬️ Could not wait for in-flight reconciliation jobs. {e}"),
        };
    }
}

#[derive(Clone)]
pub struct ReconciliationProducer<E: Send> {
    sender: mpsc::Sender<E>,
}

impl<E: Send> std::fmt::Debug for ReconciliationProducer<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconciliationProducer (capacity {})", self.sender.capacity())
    }
}

impl<E: Send> ReconciliationProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    /// Adds a job to the queue without waiting. Returns `false` if the job was refused because the queue is full or
    /// has shut down.
    pub fn enqueue(&self, job: E) -> bool {
        match self.sender.try_send(job) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("📬️ Reconciliation queue is full. The job was dropped");
                false
            },
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!("📬️ Reconciliation queue has shut down. The job was dropped");
                false
            },
        }
    }

    /// Adds a job to the queue, waiting for space if it is full. Returns `false` if the queue has shut down.
    pub async fn enqueue_wait(&self, job: E) -> bool {
        match self.sender.send(job).await {
            Ok(()) => true,
            Err(e) => {
                error!("📬️ Failed to queue reconciliation job: {e}");
                false
            },
        }
    }
}
