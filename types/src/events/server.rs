use crate::audio::Base64EncodedAudioBytes;
use crate::history::{ChatMessage, HistoryInfo};
use crate::model::{Actions, ConfigFile, DisplayText, Expression, ModelInfo};

/// `control` event
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ControlEvent {
    /// The control directive, e.g. "conversation-chain-start"
    #[serde(default)]
    text: Option<String>,
}

impl ControlEvent {
    pub fn new(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

/// `set-model-and-conf` event
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SetModelAndConfEvent {
    #[serde(default)]
    model_info: Option<ModelInfo>,
    #[serde(default)]
    conf_name: Option<String>,
    #[serde(default)]
    conf_uid: Option<String>,
    /// The uid the backend assigned to this client
    #[serde(default)]
    client_uid: Option<String>,
}

impl SetModelAndConfEvent {
    pub fn new(model_info: Option<ModelInfo>) -> Self {
        Self {
            model_info,
            conf_name: None,
            conf_uid: None,
            client_uid: None,
        }
    }

    pub fn with_conf(mut self, conf_name: &str, conf_uid: &str) -> Self {
        self.conf_name = Some(conf_name.to_string());
        self.conf_uid = Some(conf_uid.to_string());
        self
    }

    pub fn with_client_uid(mut self, client_uid: &str) -> Self {
        self.client_uid = Some(client_uid.to_string());
        self
    }

    pub fn model_info(&self) -> Option<&ModelInfo> {
        self.model_info.as_ref()
    }

    pub fn conf_name(&self) -> Option<&str> {
        self.conf_name.as_deref()
    }

    pub fn conf_uid(&self) -> Option<&str> {
        self.conf_uid.as_deref()
    }

    pub fn client_uid(&self) -> Option<&str> {
        self.client_uid.as_deref()
    }
}

/// `full-text` event
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FullTextEvent {
    #[serde(default)]
    text: Option<String>,
}

impl FullTextEvent {
    pub fn new(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

/// `config-files` event
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ConfigFilesEvent {
    #[serde(default)]
    configs: Option<Vec<ConfigFile>>,
}

impl ConfigFilesEvent {
    pub fn configs(&self) -> Option<&[ConfigFile]> {
        self.configs.as_deref()
    }
}

/// `background-files` event
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BackgroundFilesEvent {
    #[serde(default)]
    files: Option<Vec<String>>,
}

impl BackgroundFilesEvent {
    pub fn files(&self) -> Option<&[String]> {
        self.files.as_deref()
    }
}

/// `audio` event, one synthesized utterance
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AudioEvent {
    /// Base64 WAV clip; empty for text-only sentences
    #[serde(default)]
    audio: Option<Base64EncodedAudioBytes>,

    /// Per-slice loudness used by renderers that lip-sync from volume
    #[serde(default)]
    volumes: Vec<f32>,

    /// Length of each volume slice in milliseconds
    #[serde(default)]
    slice_length: Option<u32>,

    #[serde(default)]
    display_text: Option<DisplayText>,

    #[serde(default)]
    actions: Option<Actions>,

    /// Set when a peer client relayed this utterance
    #[serde(default)]
    forwarded: bool,
}

impl AudioEvent {
    pub fn new(audio: &str) -> Self {
        Self {
            audio: Some(audio.to_string()),
            volumes: vec![],
            slice_length: None,
            display_text: None,
            actions: None,
            forwarded: false,
        }
    }

    pub fn with_display_text(mut self, display_text: DisplayText) -> Self {
        self.display_text = Some(display_text);
        self
    }

    pub fn with_expressions(mut self, expressions: Vec<Expression>) -> Self {
        self.actions = Some(Actions {
            expressions: Some(expressions),
        });
        self
    }

    pub fn with_forwarded(mut self, forwarded: bool) -> Self {
        self.forwarded = forwarded;
        self
    }

    pub fn audio(&self) -> &str {
        self.audio.as_deref().unwrap_or_default()
    }

    pub fn volumes(&self) -> &[f32] {
        &self.volumes
    }

    pub fn slice_length(&self) -> Option<u32> {
        self.slice_length
    }

    pub fn display_text(&self) -> Option<&DisplayText> {
        self.display_text.as_ref()
    }

    pub fn expressions(&self) -> Option<&[Expression]> {
        self.actions.as_ref()?.expressions.as_deref()
    }

    pub fn forwarded(&self) -> bool {
        self.forwarded
    }
}

/// `history-data` event
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HistoryDataEvent {
    #[serde(default)]
    messages: Option<Vec<ChatMessage>>,
}

impl HistoryDataEvent {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages: Some(messages),
        }
    }

    pub fn messages(&self) -> Option<&[ChatMessage]> {
        self.messages.as_deref()
    }
}

/// `new-history-created` event
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NewHistoryCreatedEvent {
    #[serde(default)]
    history_uid: Option<String>,
}

impl NewHistoryCreatedEvent {
    pub fn new(history_uid: &str) -> Self {
        Self {
            history_uid: Some(history_uid.to_string()),
        }
    }

    pub fn history_uid(&self) -> Option<&str> {
        self.history_uid.as_deref()
    }
}

/// `history-deleted` event
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HistoryDeletedEvent {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    history_uid: Option<String>,
}

impl HistoryDeletedEvent {
    pub fn new(success: bool) -> Self {
        Self {
            success,
            history_uid: None,
        }
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn history_uid(&self) -> Option<&str> {
        self.history_uid.as_deref()
    }
}

/// `history-list` event
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HistoryListEvent {
    #[serde(default)]
    histories: Option<Vec<HistoryInfo>>,
}

impl HistoryListEvent {
    pub fn new(histories: Vec<HistoryInfo>) -> Self {
        Self {
            histories: Some(histories),
        }
    }

    pub fn histories(&self) -> Option<&[HistoryInfo]> {
        self.histories.as_deref()
    }
}

/// `user-input-transcription` event
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct UserInputTranscriptionEvent {
    #[serde(default)]
    text: Option<String>,
}

impl UserInputTranscriptionEvent {
    pub fn new(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

/// `error` event
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ErrorEvent {
    #[serde(default)]
    message: String,
}

impl ErrorEvent {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// `group-update` event
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GroupUpdateEvent {
    /// Client uids currently in the group
    #[serde(default)]
    members: Option<Vec<String>>,
    #[serde(default)]
    is_owner: Option<bool>,
}

impl GroupUpdateEvent {
    pub fn new(members: Vec<String>, is_owner: Option<bool>) -> Self {
        Self {
            members: Some(members),
            is_owner,
        }
    }

    pub fn members(&self) -> Option<&[String]> {
        self.members.as_deref()
    }

    pub fn is_owner(&self) -> Option<bool> {
        self.is_owner
    }
}

/// `group-operation-result` event
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GroupOperationResultEvent {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: String,
}

impl GroupOperationResultEvent {
    pub fn new(success: bool, message: &str) -> Self {
        Self {
            success,
            message: message.to_string(),
        }
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
