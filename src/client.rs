use crate::client::stats::Stats;
use crate::types;
use anyhow::Result;
use futures_util::{SinkExt, StreamExt};
use std::sync::{Arc, Mutex, PoisonError};
use tokio_tungstenite::tungstenite::Message;

pub(crate) mod config;
pub(crate) mod consts;
pub(crate) mod stats;
mod utils;

pub type ClientTx = tokio::sync::mpsc::Sender<types::ClientEvent>;
type ServerTx = tokio::sync::broadcast::Sender<types::ServerEvent>;
pub type ServerRx = tokio::sync::broadcast::Receiver<types::ServerEvent>;

// Holds the channel capacity, the client/server transmitters once connected,
// the configuration, and transport stats guarded by a Mutex.
pub struct Client {
    capacity: usize,
    config: config::Config,
    c_tx: Option<ClientTx>,
    s_tx: Option<ServerTx>,
    // Subscribed before the reader starts; handed to the first `server_events` caller.
    first_rx: Mutex<Option<ServerRx>>,
    stats: Arc<Mutex<Stats>>,
}

impl Client {
    fn new(capacity: usize, config: config::Config) -> Self {
        Self {
            capacity,
            config,
            c_tx: None,
            s_tx: None,
            first_rx: Mutex::new(None),
            stats: Arc::new(Mutex::new(Stats::new())),
        }
    }

    async fn connect(&mut self) -> Result<()> {
        if self.c_tx.is_some() {
            return Err(anyhow::anyhow!("already connected"));
        }

        let request = utils::build_request(&self.config)?;
        let (ws_stream, _) = tokio_tungstenite::connect_async(request).await?;
        tracing::info!("connected to {}", self.config.ws_url());

        let (mut write, mut read) = ws_stream.split();

        // Outbound events queue up here; inbound events fan out to every subscriber.
        let (c_tx, mut c_rx) = tokio::sync::mpsc::channel(self.capacity);
        let (s_tx, s_rx) = tokio::sync::broadcast::channel(self.capacity);

        self.c_tx = Some(c_tx.clone());
        self.s_tx = Some(s_tx.clone());
        *self.first_rx.lock().unwrap_or_else(PoisonError::into_inner) = Some(s_rx);

        let stats = self.stats.clone();
        // Writer: serialize each client event and push it onto the socket.
        tokio::spawn(async move {
            while let Some(event) = c_rx.recv().await {
                match serde_json::to_string(&event) {
                    Ok(text) => {
                        if let Err(e) = write.send(Message::Text(text)).await {
                            tracing::error!("failed to send message: {}", e);
                        } else if let Ok(mut stats_guard) = stats.lock() {
                            stats_guard.record_sent();
                        }
                    }
                    Err(e) => {
                        tracing::error!("failed to serialize event: {}", e);
                    }
                }
            }
        });

        let stats = self.stats.clone();
        // Reader: decode each text frame into a server event and broadcast it.
        // Frames that do not decode are logged and dropped; they never end the session.
        tokio::spawn(async move {
            while let Some(message) = read.next().await {
                let message = match message {
                    Err(e) => {
                        tracing::error!("failed to read message: {}", e);
                        break;
                    }
                    Ok(message) => message,
                };
                match message {
                    Message::Text(text) => match serde_json::from_str::<types::ServerEvent>(&text) {
                        Ok(event) => {
                            tracing::debug!("received message: {}", event.kind());
                            if let Ok(mut stats_guard) = stats.lock() {
                                stats_guard
                                    .record_received(matches!(event, types::ServerEvent::Audio(_)));
                            }
                            if let Err(e) = s_tx.send(event) {
                                tracing::error!("failed to send event: {}", e);
                            }
                        }
                        Err(e) => {
                            if let Ok(mut stats_guard) = stats.lock() {
                                stats_guard.record_undecodable();
                            }
                            let json = serde_json::from_str::<serde_json::Value>(&text);
                            json.map(|json| {
                                tracing::error!(
                                    "failed to deserialize event: {}, type=> {:?}",
                                    e,
                                    json.get("type")
                                );
                            })
                            .unwrap_or_else(|_| {
                                tracing::error!(
                                    "failed to deserialize event: {}, text=> {:?}",
                                    e,
                                    text
                                );
                            });
                        }
                    },
                    Message::Binary(bin) => {
                        tracing::warn!("unexpected binary message of {} bytes", bin.len());
                    }
                    Message::Close(reason) => {
                        tracing::info!("connection closed: {:?}", reason);
                        let close_event = types::ServerEvent::Close {
                            reason: reason.map(|v| format!("{:?}", v)),
                        };
                        if let Err(e) = s_tx.send(close_event) {
                            tracing::error!("failed to send close event: {}", e);
                        }
                        break;
                    }
                    _ => {}
                }
            }
            drop(c_tx);
            drop(s_tx);
        });
        Ok(())
    }

    pub fn config(&self) -> &config::Config {
        &self.config
    }

    // Get a receiver for server events. The first call gets every event since the
    // handshake; later calls only see events sent after they subscribe.
    pub fn server_events(&self) -> Result<ServerRx> {
        let tx = match self.s_tx {
            Some(ref tx) => tx,
            None => return Err(anyhow::anyhow!("not connected yet")),
        };
        let first = self
            .first_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        Ok(first.unwrap_or_else(|| tx.subscribe()))
    }

    /// A cloneable handle for sending client events from other tasks.
    pub fn sender(&self) -> Result<ClientTx> {
        match self.c_tx {
            Some(ref tx) => Ok(tx.clone()),
            None => Err(anyhow::anyhow!("not connected yet")),
        }
    }

    pub fn stats(&self) -> Result<Stats> {
        if let Ok(stats_guard) = self.stats.lock() {
            Ok(stats_guard.clone())
        } else {
            Err(anyhow::anyhow!("failed to get stats"))
        }
    }

    /// Send a client event.
    pub async fn send_client_event(&self, event: types::ClientEvent) -> Result<()> {
        match self.c_tx {
            Some(ref tx) => {
                tx.send(event).await?;
                Ok(())
            }
            None => Err(anyhow::anyhow!("not connected yet")),
        }
    }

    // Ask the backend for the list of stored conversations.
    pub async fn fetch_history_list(&self) -> Result<()> {
        self.send_client_event(types::ClientEvent::FetchHistoryList {}).await
    }

    // Ask the backend to start a fresh conversation.
    pub async fn create_new_history(&self) -> Result<()> {
        self.send_client_event(types::ClientEvent::CreateNewHistory {}).await
    }
}

// Create a client with a specific config and connect to the backend.
pub async fn connect_with_config(capacity: usize, config: config::Config) -> Result<Client> {
    let mut client = Client::new(capacity, config);
    client.connect().await?;
    Ok(client)
}

// Connect with default settings.
pub async fn connect() -> Result<Client> {
    let config = config::Config::new();
    connect_with_config(consts::DEFAULT_CHANNEL_CAPACITY, config).await
}
