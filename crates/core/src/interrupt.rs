use crate::collaborators::Collaborators;
use crate::conversation_state::ConversationStateMachine;
use crate::model::ModelSlot;
use crate::task_queue::TaskQueue;
use avatar_realtime_types::ClientEvent;
use avatar_realtime_types::events::client::InterruptSignalEvent;

/// Stops the avatar mid-sentence and throws away everything still queued.
#[derive(Clone)]
pub struct InterruptController {
    state: ConversationStateMachine,
    queue: TaskQueue,
    model: ModelSlot,
    collaborators: Collaborators,
}

impl InterruptController {
    pub fn new(
        state: ConversationStateMachine,
        queue: TaskQueue,
        model: ModelSlot,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            state,
            queue,
            model,
            collaborators,
        }
    }

    /// Interrupts the current turn. With `propagate`, the backend is told what
    /// the user heard so far; a forwarded interrupt passes `false` so it is not echoed back.
    pub fn interrupt(&self, propagate: bool) {
        tracing::info!("interrupting conversation (propagate: {})", propagate);
        // State first, so anything that starts after this point sees `interrupted`.
        self.state.interrupt();
        let dropped = self.queue.clear_queue();
        match self.model.current() {
            Some(model) => model.stop_speaking(),
            None => tracing::debug!("no avatar model loaded, nothing to stop"),
        }

        if propagate {
            let heard = self.collaborators.chat.full_response();
            self.collaborators
                .outbound
                .send(ClientEvent::InterruptSignal(InterruptSignalEvent::new(&heard)));
        }
        tracing::debug!("interrupt dropped {} queued task(s)", dropped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{MockChatHistory, MockOutbound};
    use crate::conversation_state::ConversationState;
    use crate::testing::{Call, FakeModel, RecordingFrontend};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_local_interrupt_reports_heard_text_upstream() {
        // --- Arrange ---
        let frontend = RecordingFrontend::new();
        let mut collaborators = frontend.collaborators();
        let mut chat = MockChatHistory::new();
        chat.expect_full_response()
            .times(1)
            .returning(|| "Hello, I was say".to_string());
        let mut outbound = MockOutbound::new();
        outbound
            .expect_send()
            .withf(|event| {
                *event == ClientEvent::InterruptSignal(InterruptSignalEvent::new("Hello, I was say"))
            })
            .times(1)
            .return_const(());
        collaborators.chat = Arc::new(chat);
        collaborators.outbound = Arc::new(outbound);

        let state = ConversationStateMachine::with_state(ConversationState::ThinkingSpeaking);
        let model_slot = ModelSlot::new();
        let model = FakeModel::new();
        model_slot.install(model.clone());
        let controller =
            InterruptController::new(state.clone(), TaskQueue::new(), model_slot, collaborators);

        // --- Act ---
        controller.interrupt(true);

        // --- Assert ---
        assert_eq!(state.current(), ConversationState::Interrupted);
        assert_eq!(model.stop_count(), 1);
    }

    #[tokio::test]
    async fn test_forwarded_interrupt_is_not_echoed() {
        // --- Arrange ---
        let frontend = RecordingFrontend::new();
        let state = ConversationStateMachine::with_state(ConversationState::ThinkingSpeaking);
        let queue = TaskQueue::new();
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
        queue.add_task(move || async move {
            let _ = release_rx.await;
        });
        queue.add_task(|| async {});
        queue.add_task(|| async {});
        tokio::task::yield_now().await;
        let controller = InterruptController::new(
            state.clone(),
            queue.clone(),
            ModelSlot::new(),
            frontend.collaborators(),
        );

        // --- Act ---
        controller.interrupt(false);

        // --- Assert ---
        assert_eq!(state.current(), ConversationState::Interrupted);
        assert_eq!(queue.len(), 0);
        assert!(
            !frontend
                .calls()
                .iter()
                .any(|call| matches!(call, Call::Send(_)))
        );
        let _ = release_tx.send(());
        queue.wait_for_completion().await;
    }
}
