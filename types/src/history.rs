#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum MessageRole {
    #[serde(rename = "ai")]
    Ai,
    #[serde(rename = "human")]
    Human,
}

/// One stored chat message as the backend reports it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub content: String,
    pub role: MessageRole,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// The latest message of a stored conversation, as shown in the history list.
/// Unlike [`ChatMessage`] it carries no id.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MessagePreview {
    pub role: MessageRole,
    pub timestamp: String,
    pub content: String,
}

/// Summary of one stored conversation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct HistoryInfo {
    pub uid: String,
    #[serde(default)]
    pub latest_message: Option<MessagePreview>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl HistoryInfo {
    pub fn new(uid: &str, timestamp: &str) -> Self {
        Self {
            uid: uid.to_string(),
            latest_message: None,
            timestamp: Some(timestamp.to_string()),
        }
    }
}
