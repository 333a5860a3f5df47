pub mod audio_task;
pub mod blink;
pub mod collaborators;
pub mod completion;
pub mod config;
pub mod conversation_state;
pub mod interrupt;
pub mod model;
pub mod router;
pub mod task_queue;

#[cfg(test)]
pub(crate) mod testing;

pub use audio_task::{AudioTask, PlaybackContext, PlaybackError};
pub use blink::{BlinkSuppressor, BlinkUpdate};
pub use collaborators::{
    ChatHistory, Collaborators, Microphone, Notification, NotificationKind, Notifier, Outbound,
    SessionSettings, Subtitle,
};
pub use completion::{SynthCompleteFlag, spawn_completion_watcher};
pub use config::{CoreConfig, CoreConfigBuilder};
pub use conversation_state::{ControlCommand, ConversationState, ConversationStateMachine};
pub use interrupt::InterruptController;
pub use model::{AvatarModel, ModelInstanceId, ModelSlot, PlaybackOutcome, PlaybackSignal};
pub use router::{Router, normalize_model_url};
pub use task_queue::TaskQueue;
