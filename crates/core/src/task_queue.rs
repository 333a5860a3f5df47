//! Serialized async task executor.
//!
//! Tasks run one at a time in submission order. A worker is spawned on the first
//! `add_task` after the queue goes idle and exits once the queue is empty again.

use futures::FutureExt;
use std::collections::VecDeque;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

pub type TaskFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;
type Action = Box<dyn FnOnce() -> TaskFuture + Send + 'static>;

#[derive(Default)]
struct QueueState {
    pending: VecDeque<Action>,
    // A worker task exists for the current burst.
    draining: bool,
    // The worker is inside an action.
    running: bool,
}

struct Inner {
    state: Mutex<QueueState>,
    // True while anything is pending or running.
    busy: watch::Sender<bool>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Pops the next action, or marks the queue idle when there is none.
    fn next_action(&self) -> Option<Action> {
        let mut state = self.lock();
        match state.pending.pop_front() {
            Some(action) => {
                state.running = true;
                Some(action)
            }
            None => {
                state.running = false;
                state.draining = false;
                self.busy.send_replace(false);
                None
            }
        }
    }
}

/// FIFO queue of zero-argument async actions, at most one running at a time.
///
/// Cloning is cheap and every clone drives the same queue.
#[derive(Clone)]
pub struct TaskQueue {
    inner: Arc<Inner>,
}

impl TaskQueue {
    pub fn new() -> Self {
        let (busy, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(QueueState::default()),
                busy,
            }),
        }
    }

    /// Appends `action` to the tail of the queue and returns without waiting for it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn add_task<F, Fut>(&self, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let action: Action = Box::new(move || -> TaskFuture { Box::pin(action()) });
        let spawn_worker = {
            let mut state = self.inner.lock();
            state.pending.push_back(action);
            self.inner.busy.send_replace(true);
            !std::mem::replace(&mut state.draining, true)
        };
        if spawn_worker {
            tokio::spawn(drain(self.inner.clone()));
        }
    }

    /// Drops every entry that has not started yet and returns how many were dropped.
    ///
    /// A running entry is left alone; stopping it is that entry's own business.
    pub fn clear_queue(&self) -> usize {
        let mut state = self.inner.lock();
        let dropped = state.pending.len();
        state.pending.clear();
        if !state.running {
            self.inner.busy.send_replace(false);
        }
        if dropped > 0 {
            tracing::debug!("cleared {} pending task(s)", dropped);
        }
        dropped
    }

    /// True while any entry is pending or running.
    pub fn has_task(&self) -> bool {
        let state = self.inner.lock();
        state.running || !state.pending.is_empty()
    }

    /// Number of entries waiting to start.
    pub fn len(&self) -> usize {
        self.inner.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_task()
    }

    /// Resolves once the queue has drained to empty, immediately if it already is.
    pub async fn wait_for_completion(&self) {
        let mut busy = self.inner.busy.subscribe();
        // The sender lives as long as `self`, so this cannot fail while we wait.
        let _ = busy.wait_for(|busy| !*busy).await;
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

async fn drain(inner: Arc<Inner>) {
    while let Some(action) = inner.next_action() {
        // The closure call happens inside the first poll, so a panic there is caught too.
        let run = AssertUnwindSafe(async move { action().await });
        if let Err(panic) = run.catch_unwind().await {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::error!("queued task panicked, continuing with the next one: {}", reason);
        }
    }
}
