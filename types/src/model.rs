use serde_json::{Map, Value};

/// Description of the avatar model the backend wants loaded.
///
/// Only `url` is interpreted by the client; every other field (scale, offsets,
/// emotion maps, ...) is carried through untouched for the renderer.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ModelInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,

    /// Location of the model definition, either absolute or relative to the backend base URL
    url: String,

    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl ModelInfo {
    pub fn new(url: &str) -> Self {
        Self {
            name: None,
            url: url.to_string(),
            extra: Map::new(),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_url(mut self, url: String) -> Self {
        self.url = url;
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }
}

/// Text shown alongside an utterance, attributed to a speaker.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DisplayText {
    pub text: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl DisplayText {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            name: None,
            avatar: None,
        }
    }

    pub fn with_speaker(mut self, name: &str, avatar: Option<&str>) -> Self {
        self.name = Some(name.to_string());
        self.avatar = avatar.map(str::to_string);
        self
    }
}

/// A facial expression cue, addressed either by name or by index in the model's expression list.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum Expression {
    Index(i64),
    Name(String),
}

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expression::Index(index) => write!(f, "#{index}"),
            Expression::Name(name) => f.write_str(name),
        }
    }
}

/// Visual actions attached to an `audio` message.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Actions {
    #[serde(default)]
    pub expressions: Option<Vec<Expression>>,
}

/// One selectable character configuration offered by the backend.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ConfigFile {
    pub filename: String,
    pub name: String,
}
