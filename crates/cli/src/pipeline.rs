//! Event intake and bounded processing
//!
//! The intake loop owns the change detector and never waits on generation. Each
//! accepted path becomes a task that:
//! 1. waits for one of `max_concurrency` permits (or gives up on shutdown)
//! 2. takes the per-path lock so two passes never rewrite the same file at once
//! 3. runs the annotator with the request cancellation token
//!
//! A path that already has a task waiting is not queued again.
//!
//! Two tokens drive shutdown: `shutdown` stops intake and drops tasks still waiting
//! for a permit, `cancel` aborts in-flight generation (the pass is abandoned without
//! writing).

use dashmap::{DashMap, DashSet};
use helper_core::{Annotator, Generator, ProcessError};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use watcher::ChangeDetector;

pub struct Pipeline<G> {
    annotator: Arc<Annotator<G>>,
    permits: Arc<Semaphore>,
    file_locks: Arc<DashMap<PathBuf, Arc<Mutex<()>>>>,
    waiting: Arc<DashSet<PathBuf>>,
    shutdown: CancellationToken,
    cancel: CancellationToken,
    tasks: JoinSet<()>,
}

impl<G: Generator + 'static> Pipeline<G> {
    pub fn new(
        annotator: Arc<Annotator<G>>,
        max_concurrency: usize,
        shutdown: CancellationToken,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            annotator,
            permits: Arc::new(Semaphore::new(max_concurrency.max(1))),
            file_locks: Arc::new(DashMap::new()),
            waiting: Arc::new(DashSet::new()),
            shutdown,
            cancel,
            tasks: JoinSet::new(),
        }
    }

    /// Queue one pass over `path`
    pub fn dispatch(&mut self, path: PathBuf) {
        if !self.waiting.insert(path.clone()) {
            debug!("{} already queued", path.display());
            return;
        }

        let annotator = Arc::clone(&self.annotator);
        let permits = Arc::clone(&self.permits);
        let waiting = Arc::clone(&self.waiting);
        let lock = self
            .file_locks
            .entry(path.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let file_locks = Arc::clone(&self.file_locks);
        let shutdown = self.shutdown.clone();
        let cancel = self.cancel.clone();

        self.tasks.spawn(async move {
            let _permit = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    waiting.remove(&path);
                    return;
                }
                permit = permits.acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => return,
                },
            };

            let guard = lock.lock().await;
            // From here on a new event for this path queues a fresh pass
            waiting.remove(&path);

            match annotator.process(&path, &cancel).await {
                Ok(outcome) => {
                    debug!(
                        "Finished {}: {} marker(s), {} skipped",
                        path.display(),
                        outcome.markers,
                        outcome.skipped
                    );
                }
                Err(ProcessError::Cancelled(path)) => {
                    warn!("Abandoned {} without writing", path.display());
                }
                Err(e) => annotator.metrics().record_error(&e),
            }

            drop(guard);
            drop(lock);
            file_locks.remove_if(&path, |_, lock| Arc::strong_count(lock) == 1);
        });
    }

    /// Feed accepted changes from `detector` until shutdown, then wait for in-flight work
    pub async fn run(&mut self, detector: &mut ChangeDetector) {
        let shutdown = self.shutdown.clone();

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                changed = detector.next_change() => match changed {
                    Some(path) => self.dispatch(path),
                    None => break,
                },
                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    reap(joined);
                }
            }
        }

        self.drain().await;
    }

    /// Wait for every queued and running pass
    pub async fn drain(&mut self) {
        if !self.tasks.is_empty() {
            info!("Waiting for {} pending file(s)", self.tasks.len());
        }
        while let Some(joined) = self.tasks.join_next().await {
            reap(joined);
        }
    }

    pub fn pending(&self) -> usize {
        self.tasks.len()
    }
}

fn reap(joined: Result<(), JoinError>) {
    if let Err(e) = joined {
        if e.is_panic() {
            error!("File processing task panicked: {}", e);
        }
    }
}
