/// Audio data encoded as base64
pub type Base64EncodedAudioBytes = String;

/// MIME prefix of the data URI handed to the renderer for one synthesized clip.
pub const WAV_DATA_URI_PREFIX: &str = "data:audio/wav;base64,";

/// Wraps a base64 WAV clip into the data URI the renderer plays.
pub fn wav_data_uri(audio: &str) -> String {
    format!("{WAV_DATA_URI_PREFIX}{audio}")
}

/// Extracts the base64 payload back out of a WAV data URI.
pub fn payload_from_data_uri(uri: &str) -> Option<&str> {
    uri.strip_prefix(WAV_DATA_URI_PREFIX)
}
