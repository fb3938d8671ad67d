//! Worker pool with per-category backpressure.
//!
//! Each category owns a bounded queue drained by its own dispatcher task.
//! A job runs once it holds a worker permit: the category's reserved
//! permits are tried first, then the pool-wide general permits. A flood in
//! one category can exhaust the general permits but never another
//! category's reserved ones.
//!
//! A queued job holds one of the category's `max_queue` slots until it
//! gets a worker, so at most `max_queue` requests wait per category while
//! the running ones are bounded by the worker permits.

use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tracing::{debug, info, trace};

use shared_types::Message;

use crate::domain::{CategoryBudget, GatewayError};
use crate::handlers::CommandHandler;

/// A routed request waiting for a worker.
pub(crate) struct Job {
    pub command: String,
    pub handler: Arc<dyn CommandHandler>,
    pub message: Message,
}

impl Job {
    fn run(self) {
        trace!(command = %self.command, remote = %self.message.conn.remote, "running command");
        self.handler.handle(self.message);
    }

    fn reject(self, err: GatewayError) {
        debug!(command = %self.command, error = %err, "dropping queued request");
        self.message.reply.reply_response(err.to_response(), false);
    }
}

struct Queued {
    job: Job,
    slot: OwnedSemaphorePermit,
}

/// Why a job could not be queued. The job is handed back for the reply.
pub(crate) enum PushError {
    Full(Job),
    Closed(Job),
}

/// Producer side of one category's queue.
pub(crate) struct CategoryQueue {
    tx: mpsc::Sender<Queued>,
    slots: Arc<Semaphore>,
}

impl CategoryQueue {
    pub fn try_push(&self, job: Job) -> Result<(), PushError> {
        let slot = match self.slots.clone().try_acquire_owned() {
            Ok(slot) => slot,
            Err(TryAcquireError::NoPermits) => return Err(PushError::Full(job)),
            Err(TryAcquireError::Closed) => return Err(PushError::Closed(job)),
        };
        self.tx.try_send(Queued { job, slot }).map_err(|err| match err {
            TrySendError::Full(queued) => PushError::Full(queued.job),
            TrySendError::Closed(queued) => PushError::Closed(queued.job),
        })
    }
}

pub(crate) struct WorkerPool {
    runtime: Handle,
    general: Arc<Semaphore>,
    /// Every category's reserved permits and queue slots.
    owned: Vec<Arc<Semaphore>>,
}

impl WorkerPool {
    pub fn new(runtime: Handle, general_workers: usize) -> Self {
        Self {
            runtime,
            general: Arc::new(Semaphore::new(general_workers)),
            owned: Vec::new(),
        }
    }

    /// Refuse new work. Requests still queued are answered as closed.
    pub fn close(&self) {
        self.general.close();
        for semaphore in &self.owned {
            semaphore.close();
        }
    }

    /// Start the dispatcher for one category and return its queue.
    pub fn spawn_queue(&mut self, category: &str, budget: CategoryBudget) -> CategoryQueue {
        let capacity = budget.max_queue.max(1);
        let (tx, mut rx) = mpsc::channel::<Queued>(capacity);
        let slots = Arc::new(Semaphore::new(capacity));
        let reserved = Arc::new(Semaphore::new(budget.reserved_threads));
        let general = self.general.clone();
        let dispatcher_slots = slots.clone();
        let category = category.to_string();
        self.owned.push(reserved.clone());
        self.owned.push(slots.clone());

        self.runtime.spawn(async move {
            while let Some(Queued { job, slot }) = rx.recv().await {
                let permit = tokio::select! {
                    biased;
                    Ok(permit) = reserved.clone().acquire_owned() => permit,
                    Ok(permit) = general.clone().acquire_owned() => permit,
                    else => {
                        info!(category = %category, "worker permits closed, draining queue");
                        dispatcher_slots.close();
                        rx.close();
                        let closed = || GatewayError::Closed {
                            category: category.clone(),
                        };
                        job.reject(closed());
                        while let Ok(queued) = rx.try_recv() {
                            queued.job.reject(closed());
                        }
                        break;
                    }
                };
                drop(slot);
                tokio::task::spawn_blocking(move || {
                    let _permit = permit;
                    job.run();
                });
            }
            debug!(category = %category, "category dispatcher stopped");
        });

        CategoryQueue { tx, slots }
    }
}
