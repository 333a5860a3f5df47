//! Capabilities the core needs from the surrounding application.
//!
//! The router and the playback path never touch UI widgets, storage or the
//! network directly; they call these traits, and the host wires in whatever
//! implements them (a desktop shell, a headless logger, a test double).

use avatar_realtime_types::{ChatMessage, ClientEvent, ConfigFile, HistoryInfo, ModelInfo};
#[cfg(test)]
use mockall::automock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// The in-progress response and the stored transcript.
#[cfg_attr(test, automock)]
pub trait ChatHistory: Send + Sync {
    /// Appends to the response being spoken in the current turn.
    fn append_response(&self, text: &str);
    /// Everything appended since the last `clear_response`.
    fn full_response(&self) -> String;
    fn clear_response(&self);
    fn append_ai_message(&self, text: &str, name: Option<String>, avatar: Option<String>);
    fn append_human_message(&self, text: &str);
    fn set_messages(&self, messages: Vec<ChatMessage>);
    fn set_history_list(&self, histories: Vec<HistoryInfo>);
    fn prepend_history(&self, history: HistoryInfo);
    fn set_current_history_uid(&self, uid: &str);
    fn set_force_new_message(&self, force: bool);
}

#[cfg_attr(test, automock)]
pub trait Subtitle: Send + Sync {
    fn set_subtitle_text(&self, text: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Info,
    Warning,
}

/// A transient toast shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub kind: NotificationKind,
    pub duration: Duration,
}

impl Notification {
    pub const DEFAULT_DURATION: Duration = Duration::from_millis(2000);

    pub fn new(title: impl Into<String>, kind: NotificationKind) -> Self {
        Self {
            title: title.into(),
            kind,
            duration: Self::DEFAULT_DURATION,
        }
    }

    pub fn success(title: impl Into<String>) -> Self {
        Self::new(title, NotificationKind::Success)
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self::new(title, NotificationKind::Error)
    }
}

#[cfg_attr(test, automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

#[cfg_attr(test, automock)]
pub trait Microphone: Send + Sync {
    fn start_mic(&self);
    fn stop_mic(&self);
    /// User preference: reopen the mic once the avatar finishes a turn.
    fn auto_start_on_conversation_end(&self) -> bool;
}

/// Per-session settings pushed by the backend.
#[cfg_attr(test, automock)]
pub trait SessionSettings: Send + Sync {
    fn set_model_info(&self, model_info: ModelInfo);
    fn set_conf_name(&self, name: &str);
    fn set_conf_uid(&self, uid: &str);
    fn set_config_files(&self, configs: Vec<ConfigFile>);
    fn set_background_files(&self, files: Vec<String>);
    fn set_self_uid(&self, uid: &str);
    fn set_group_members(&self, members: Vec<String>);
    fn set_is_owner(&self, is_owner: bool);
}

/// Upstream channel to the backend.
#[cfg_attr(test, automock)]
pub trait Outbound: Send + Sync {
    fn send(&self, event: ClientEvent);
}

// The transport's client sender. Sending never blocks the router: when the
// channel is full the event is handed to a task that waits for room. Only a
// closed channel loses events.
impl Outbound for mpsc::Sender<ClientEvent> {
    fn send(&self, event: ClientEvent) {
        match self.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                tracing::warn!("client channel full, deferring {:?}", event);
                let tx = self.clone();
                tokio::spawn(async move {
                    if let Err(e) = tx.send(event).await {
                        tracing::error!("failed to send deferred client event: {}", e);
                    }
                });
            }
            Err(mpsc::error::TrySendError::Closed(event)) => {
                tracing::error!("client channel closed, dropping {:?}", event);
            }
        }
    }
}

/// Everything the router and playback tasks call out to.
#[derive(Clone)]
pub struct Collaborators {
    pub chat: Arc<dyn ChatHistory>,
    pub subtitle: Arc<dyn Subtitle>,
    pub notifier: Arc<dyn Notifier>,
    pub microphone: Arc<dyn Microphone>,
    pub settings: Arc<dyn SessionSettings>,
    pub outbound: Arc<dyn Outbound>,
}
