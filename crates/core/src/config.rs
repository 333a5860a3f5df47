use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:12393";

/// Settings for the router and the playback path.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    base_url: String,
    playback_timeout: Option<Duration>,
}

impl CoreConfig {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            playback_timeout: None,
        }
    }

    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::new()
    }

    /// Base for relative model URLs.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Upper bound on waiting for one clip to finish. `None` waits for the renderer indefinitely.
    pub fn playback_timeout(&self) -> Option<Duration> {
        self.playback_timeout
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::new()
    }
}

pub struct CoreConfigBuilder {
    config: CoreConfig,
}

impl CoreConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: CoreConfig::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.config.base_url = base_url.to_string();
        self
    }

    pub fn with_playback_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.playback_timeout = timeout;
        self
    }

    pub fn build(self) -> CoreConfig {
        self.config
    }
}

impl Default for CoreConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
