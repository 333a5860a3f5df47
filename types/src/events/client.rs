use crate::model::DisplayText;

/// `audio-play-start` event, relayed to peer clients so they show the same sentence
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AudioPlayStartEvent {
    display_text: DisplayText,

    /// Always true on the wire so receivers never relay it again
    forwarded: bool,
}

impl AudioPlayStartEvent {
    pub fn new(display_text: DisplayText) -> Self {
        Self {
            display_text,
            forwarded: true,
        }
    }

    pub fn display_text(&self) -> &DisplayText {
        &self.display_text
    }

    pub fn forwarded(&self) -> bool {
        self.forwarded
    }
}

/// `interrupt-signal` event; sent upstream on a local interrupt and received when a peer interrupts
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct InterruptSignalEvent {
    /// The part of the response the user heard before interrupting
    #[serde(default)]
    text: Option<String>,
}

impl InterruptSignalEvent {
    pub fn new(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}
