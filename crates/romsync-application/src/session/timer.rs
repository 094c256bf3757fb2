//! Single-slot deferred job.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

struct Pending {
    generation: u64,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Holds at most one outstanding deferred job.
///
/// Scheduling always cancels whatever was pending before, so the queue depth
/// is one. The job receives the cancellation token of its own slot and is
/// expected to check it between side effects.
#[derive(Default)]
pub struct PendingSyncTimer {
    slot: Arc<Mutex<Option<Pending>>>,
    generation: AtomicU64,
}

impl PendingSyncTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `job` after `delay`, replacing any pending job.
    pub fn schedule<F, Fut>(&self, delay: Duration, job: F)
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.schedule_with(CancellationToken::new(), delay, job);
    }

    /// Like [`schedule`](Self::schedule), but the job is also cancelled when
    /// `parent` is.
    pub fn schedule_child<F, Fut>(&self, parent: &CancellationToken, delay: Duration, job: F)
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.schedule_with(parent.child_token(), delay, job);
    }

    fn schedule_with<F, Fut>(&self, cancel: CancellationToken, delay: Duration, job: F)
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.take() {
            tracing::debug!(
                "[PendingSyncTimer] Replacing pending job #{}",
                previous.generation
            );
            previous.cancel.cancel();
        }

        let token = cancel.clone();
        let owner = Arc::clone(&self.slot);
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
            job(token.clone()).await;

            let mut slot = owner.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.as_ref().is_some_and(|p| p.generation == generation) {
                *slot = None;
            }
        });

        *slot = Some(Pending {
            generation,
            cancel,
            handle,
        });
    }

    /// Cancels the pending job, if any. The job observes the cancellation at
    /// its next check; a job still waiting out its delay never runs.
    pub fn cancel(&self) {
        let pending = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(pending) = pending {
            tracing::debug!("[PendingSyncTimer] Cancelled job #{}", pending.generation);
            pending.cancel.cancel();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|p| !p.handle.is_finished())
    }
}

impl Drop for PendingSyncTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
