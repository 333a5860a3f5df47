use crate::client::consts::{DEFAULT_BASE_URL, DEFAULT_WS_URL};

#[derive(Debug, Clone)]
pub struct Config {
    ws_url: String,
    base_url: String,
}

pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::new(),
        }
    }

    pub fn with_ws_url(mut self, ws_url: &str) -> Self {
        self.config.ws_url = ws_url.to_string();
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.config.base_url = base_url.to_string();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    // Sets the default values, pointing at a backend on the local machine.
    pub fn new() -> Self {
        Self {
            ws_url: DEFAULT_WS_URL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// The WebSocket endpoint events are exchanged on.
    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }

    /// The HTTP origin relative asset URLs (models, backgrounds) resolve against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
