//! Backpressure handshake with the backend.
//!
//! The backend says `backend-synth-complete` once it has sent the last clip of a
//! turn. The client answers with a single `frontend-playback-complete` after
//! every queued clip has actually played, so the backend knows when the avatar
//! has gone quiet.

use crate::collaborators::Outbound;
use crate::task_queue::TaskQueue;
use avatar_realtime_types::ClientEvent;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Set when the backend has finished synthesizing the current turn.
#[derive(Clone)]
pub struct SynthCompleteFlag {
    flag: Arc<watch::Sender<bool>>,
}

impl SynthCompleteFlag {
    pub fn new() -> Self {
        let (flag, _) = watch::channel(false);
        Self {
            flag: Arc::new(flag),
        }
    }

    pub fn set(&self) {
        self.flag.send_replace(true);
    }

    pub fn is_set(&self) -> bool {
        *self.flag.borrow()
    }

    /// Clears the flag, returning whether it was set.
    pub fn take(&self) -> bool {
        self.flag.send_replace(false)
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.flag.subscribe()
    }
}

impl Default for SynthCompleteFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawns the task that acknowledges each synth-complete once the queue drains.
pub fn spawn_completion_watcher(
    queue: TaskQueue,
    flag: SynthCompleteFlag,
    outbound: Arc<dyn Outbound>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut changes = flag.subscribe();
        loop {
            if changes.wait_for(|set| *set).await.is_err() {
                break;
            }
            queue.wait_for_completion().await;
            if flag.take() {
                tracing::debug!("playback drained after synth complete, acknowledging");
                outbound.send(ClientEvent::FrontendPlaybackComplete {});
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingFrontend, wait_until};
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_ack_is_sent_once_after_queue_drains() {
        // --- Arrange ---
        let frontend = RecordingFrontend::new();
        let queue = TaskQueue::new();
        let flag = SynthCompleteFlag::new();
        let watcher = spawn_completion_watcher(queue.clone(), flag.clone(), frontend.clone());
        let (release_tx, release_rx) = oneshot::channel::<()>();
        queue.add_task(move || async move {
            let _ = release_rx.await;
        });

        // --- Act ---
        flag.set();
        tokio::task::yield_now().await;

        // --- Assert ---
        assert!(frontend.sent().is_empty(), "queue still busy");
        release_tx.send(()).unwrap();
        wait_until(|| !frontend.sent().is_empty()).await;
        assert_eq!(frontend.sent(), vec![ClientEvent::FrontendPlaybackComplete {}]);
        assert!(!flag.is_set());

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(frontend.sent().len(), 1);
        watcher.abort();
    }

    #[tokio::test]
    async fn test_ack_is_immediate_when_queue_is_idle() {
        let frontend = RecordingFrontend::new();
        let queue = TaskQueue::new();
        let flag = SynthCompleteFlag::new();
        let watcher = spawn_completion_watcher(queue, flag.clone(), frontend.clone());

        flag.set();
        wait_until(|| frontend.sent().len() == 1).await;
        flag.set();
        wait_until(|| frontend.sent().len() == 2).await;

        assert!(!flag.is_set());
        watcher.abort();
    }
}
