pub const DEFAULT_WS_URL: &str = "ws://127.0.0.1:12393/client-ws";
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:12393";

pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

pub const USER_AGENT_HEADER: &str = "User-Agent";
pub const USER_AGENT: &str = concat!("avatar-realtime/", env!("CARGO_PKG_VERSION"));
