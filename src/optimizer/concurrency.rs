//! # Concurrency Coordinator
//!
//! Limita il numero di task attivi con un semaforo e attende il completamento di tutti.
//!
//! - Un permesso viene acquisito *prima* dello spawn, quindi i task attivi
//!   non superano mai il limite
//! - `work(item)` viene chiamato in ordine di dispatch: la sua parte sincrona
//!   (es. prenotazione dei nomi) è deterministica
//! - L'errore o il panic di un task non cancella gli altri
//! - Nessun retry: ogni elemento viene tentato una sola volta

use anyhow::Result;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error};

/// Current and peak number of running tasks
#[derive(Debug, Clone, Default)]
pub struct ActivityGauge {
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl ActivityGauge {
    /// Mark a task active until the guard is dropped
    pub fn enter(&self) -> ActiveGuard {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        ActiveGuard {
            active: Arc::clone(&self.active),
        }
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

pub struct ActiveGuard {
    active: Arc<AtomicUsize>,
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Bounded worker pool over a pre-materialized list of work items
pub struct ConcurrencyCoordinator {
    limit: usize,
    semaphore: Arc<Semaphore>,
    gauge: ActivityGauge,
}

impl ConcurrencyCoordinator {
    /// `limit` is clamped to at least one
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            limit,
            semaphore: Arc::new(Semaphore::new(limit)),
            gauge: ActivityGauge::default(),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Highest number of simultaneously running tasks so far
    pub fn peak_active(&self) -> usize {
        self.gauge.peak()
    }

    /// Run `work` for every item, at most `limit` at a time.
    ///
    /// Returns one outcome per item, in dispatch order, once every task has
    /// finished.
    pub async fn run_all<I, F, Fut, R, E>(&self, items: I, mut work: F) -> Result<Vec<Result<R>>>
    where
        I: IntoIterator,
        F: FnMut(I::Item) -> Fut,
        Fut: Future<Output = std::result::Result<R, E>> + Send + 'static,
        R: Send + 'static,
        E: Into<anyhow::Error> + Send + 'static,
    {
        let mut tasks = Vec::new();

        for (index, item) in items.into_iter().enumerate() {
            let permit = Arc::clone(&self.semaphore).acquire_owned().await?;
            let job = work(item);
            let gauge = self.gauge.clone();

            tasks.push(tokio::spawn(async move {
                let _permit = permit; // Keep permit alive
                let _active = gauge.enter();
                debug!("Task {} started ({} active)", index, gauge.active());
                job.await.map_err(Into::into)
            }));
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        for (index, joined) in futures::future::join_all(tasks).await.into_iter().enumerate() {
            let outcome = match joined {
                Ok(result) => result,
                Err(e) => {
                    error!("Task {} did not complete: {}", index, e);
                    Err(anyhow::anyhow!("task {} did not complete: {}", index, e))
                }
            };
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }
}
