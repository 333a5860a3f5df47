/// Transport counters, shared between the reader and writer tasks.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Stats {
    events_received: u64,
    events_sent: u64,
    audio_clips: u64,
    undecodable: u64,
}

impl Stats {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_received(&mut self, is_audio: bool) {
        self.events_received += 1;
        if is_audio {
            self.audio_clips += 1;
        }
    }

    pub(crate) fn record_sent(&mut self) {
        self.events_sent += 1;
    }

    pub(crate) fn record_undecodable(&mut self) {
        self.undecodable += 1;
    }

    pub fn events_received(&self) -> u64 {
        self.events_received
    }

    pub fn events_sent(&self) -> u64 {
        self.events_sent
    }

    pub fn audio_clips(&self) -> u64 {
        self.audio_clips
    }

    pub fn undecodable(&self) -> u64 {
        self.undecodable
    }
}
