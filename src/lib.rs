mod client;

pub use avatar_realtime_types as types;
pub use client::config::{Config, ConfigBuilder};
pub use client::consts::DEFAULT_CHANNEL_CAPACITY;
pub use client::stats::Stats;
pub use client::{connect, connect_with_config, Client, ClientTx, ServerRx};
