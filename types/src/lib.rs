pub mod audio;
pub mod events;
pub mod history;
pub mod model;

//re-export types for easier access
pub use audio::Base64EncodedAudioBytes;
pub use events::{ClientEvent, ServerEvent};
pub use history::{ChatMessage, HistoryInfo, MessagePreview, MessageRole};
pub use model::{Actions, ConfigFile, DisplayText, Expression, ModelInfo};
