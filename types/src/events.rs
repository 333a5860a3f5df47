pub mod client;
pub mod server;

use client::*;
use server::*;

/// Messages the client sends upstream to the backend (and, through it, to peer clients).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    #[serde(rename = "audio-play-start")]
    AudioPlayStart(AudioPlayStartEvent),
    #[serde(rename = "frontend-playback-complete")]
    FrontendPlaybackComplete {},
    #[serde(rename = "fetch-history-list")]
    FetchHistoryList {},
    #[serde(rename = "create-new-history")]
    CreateNewHistory {},
    #[serde(rename = "interrupt-signal")]
    InterruptSignal(InterruptSignalEvent),
}

/// Messages pushed by the backend.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Synthesized locally by the transport when the connection closes.
    #[serde(rename = "close")]
    Close {
        reason: Option<String>,
    },
    #[serde(rename = "control")]
    Control(ControlEvent),
    #[serde(rename = "set-model-and-conf")]
    SetModelAndConf(SetModelAndConfEvent),
    #[serde(rename = "full-text")]
    FullText(FullTextEvent),
    #[serde(rename = "config-files")]
    ConfigFiles(ConfigFilesEvent),
    #[serde(rename = "config-switched")]
    ConfigSwitched {},
    #[serde(rename = "background-files")]
    BackgroundFiles(BackgroundFilesEvent),
    #[serde(rename = "audio")]
    Audio(AudioEvent),
    #[serde(rename = "history-data")]
    HistoryData(HistoryDataEvent),
    #[serde(rename = "new-history-created")]
    NewHistoryCreated(NewHistoryCreatedEvent),
    #[serde(rename = "history-deleted")]
    HistoryDeleted(HistoryDeletedEvent),
    #[serde(rename = "history-list")]
    HistoryList(HistoryListEvent),
    #[serde(rename = "user-input-transcription")]
    UserInputTranscription(UserInputTranscriptionEvent),
    #[serde(rename = "error")]
    Error(ErrorEvent),
    #[serde(rename = "group-update")]
    GroupUpdate(GroupUpdateEvent),
    #[serde(rename = "group-operation-result")]
    GroupOperationResult(GroupOperationResultEvent),
    #[serde(rename = "backend-synth-complete")]
    BackendSynthComplete {},
    #[serde(rename = "conversation-chain-end")]
    ConversationChainEnd {},
    #[serde(rename = "force-new-message")]
    ForceNewMessage {},
    #[serde(rename = "interrupt-signal")]
    InterruptSignal(InterruptSignalEvent),
    /// Any `type` this client does not know about.
    #[serde(other)]
    Unknown,
}

impl ServerEvent {
    /// The wire name of the event, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerEvent::Close { .. } => "close",
            ServerEvent::Control(_) => "control",
            ServerEvent::SetModelAndConf(_) => "set-model-and-conf",
            ServerEvent::FullText(_) => "full-text",
            ServerEvent::ConfigFiles(_) => "config-files",
            ServerEvent::ConfigSwitched {} => "config-switched",
            ServerEvent::BackgroundFiles(_) => "background-files",
            ServerEvent::Audio(_) => "audio",
            ServerEvent::HistoryData(_) => "history-data",
            ServerEvent::NewHistoryCreated(_) => "new-history-created",
            ServerEvent::HistoryDeleted(_) => "history-deleted",
            ServerEvent::HistoryList(_) => "history-list",
            ServerEvent::UserInputTranscription(_) => "user-input-transcription",
            ServerEvent::Error(_) => "error",
            ServerEvent::GroupUpdate(_) => "group-update",
            ServerEvent::GroupOperationResult(_) => "group-operation-result",
            ServerEvent::BackendSynthComplete {} => "backend-synth-complete",
            ServerEvent::ConversationChainEnd {} => "conversation-chain-end",
            ServerEvent::ForceNewMessage {} => "force-new-message",
            ServerEvent::InterruptSignal(_) => "interrupt-signal",
            ServerEvent::Unknown => "unknown",
        }
    }
}
