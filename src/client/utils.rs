use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use crate::client::config::Config;
use crate::client::consts::{USER_AGENT, USER_AGENT_HEADER};

pub fn build_request(config: &Config) -> tokio_tungstenite::tungstenite::Result<Request> {
    let mut request = config.ws_url().into_client_request()?;
    request.headers_mut().insert(USER_AGENT_HEADER, USER_AGENT.parse()?);
    Ok(request)
}
