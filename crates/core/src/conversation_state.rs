use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::watch;

/// The avatar's phase in the turn-taking protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConversationState {
    Idle,
    ThinkingSpeaking,
    Listening,
    Interrupted,
    Loading,
}

impl ConversationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationState::Idle => "idle",
            ConversationState::ThinkingSpeaking => "thinking-speaking",
            ConversationState::Listening => "listening",
            ConversationState::Interrupted => "interrupted",
            ConversationState::Loading => "loading",
        }
    }

    /// States in which incoming audio must not be spoken.
    pub fn blocks_audio(&self) -> bool {
        matches!(
            self,
            ConversationState::Interrupted | ConversationState::Listening
        )
    }
}

impl std::fmt::Display for ConversationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Directives carried in the `text` of a `control` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    StartMic,
    StopMic,
    ConversationChainStart,
    ConversationChainEnd,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown control command: {0}")]
pub struct UnknownControlCommand(pub String);

impl FromStr for ControlCommand {
    type Err = UnknownControlCommand;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text {
            "start-mic" => Ok(ControlCommand::StartMic),
            "stop-mic" => Ok(ControlCommand::StopMic),
            "conversation-chain-start" => Ok(ControlCommand::ConversationChainStart),
            "conversation-chain-end" => Ok(ControlCommand::ConversationChainEnd),
            other => Err(UnknownControlCommand(other.to_string())),
        }
    }
}

/// Holds the current [`ConversationState`] and an interrupt generation counter.
///
/// Clones share the same state. Readers always see the freshest value, so queued
/// work checks the state when it runs rather than when it was submitted.
#[derive(Clone)]
pub struct ConversationStateMachine {
    state: Arc<watch::Sender<ConversationState>>,
    // Bumped on every interrupt; in-flight playback watches it to stop early.
    interrupts: Arc<watch::Sender<u64>>,
}

impl ConversationStateMachine {
    /// Starts in `loading`; the first `set-model-and-conf` moves the session to `idle`.
    pub fn new() -> Self {
        Self::with_state(ConversationState::Loading)
    }

    pub fn with_state(initial: ConversationState) -> Self {
        let (state, _) = watch::channel(initial);
        let (interrupts, _) = watch::channel(0);
        Self {
            state: Arc::new(state),
            interrupts: Arc::new(interrupts),
        }
    }

    pub fn current(&self) -> ConversationState {
        *self.state.borrow()
    }

    /// Moves to `next`. Re-entering the current state is a no-op; returns whether anything changed.
    pub fn set(&self, next: ConversationState) -> bool {
        let mut previous = next;
        let changed = self.state.send_if_modified(|state| {
            previous = *state;
            if *state == next {
                return false;
            }
            *state = next;
            true
        });
        if changed {
            tracing::debug!("conversation state: {} -> {}", previous, next);
        }
        changed
    }

    /// Moves to `next` only if the current state is `from`, atomically.
    pub fn transition(&self, from: ConversationState, next: ConversationState) -> bool {
        let changed = self.state.send_if_modified(|state| {
            if *state != from || from == next {
                return false;
            }
            *state = next;
            true
        });
        if changed {
            tracing::debug!("conversation state: {} -> {}", from, next);
        }
        changed
    }

    /// Forces `interrupted` and signals whatever is playing right now.
    pub fn interrupt(&self) {
        self.set(ConversationState::Interrupted);
        self.interrupts.send_modify(|generation| *generation += 1);
    }

    /// Hook for the voice-activity layer: the user started talking.
    pub fn mark_listening(&self) -> bool {
        self.set(ConversationState::Listening)
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<ConversationState> {
        self.state.subscribe()
    }

    /// A receiver whose `changed()` fires on the next interrupt after this call.
    pub fn interrupt_signal(&self) -> watch::Receiver<u64> {
        self.interrupts.subscribe()
    }
}

impl Default for ConversationStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
