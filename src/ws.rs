//! WebSocket plumbing shared by the STT and TTS sessions

use crate::error::{ClientError, ClientResult};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Build `scheme://host:port`; hosts without a scheme use `wss://`
pub fn endpoint_url(host: &str, port: u16) -> String {
    let host = host.trim_end_matches('/');
    if host.contains("://") {
        format!("{}:{}", host, port)
    } else {
        format!("wss://{}:{}", host, port)
    }
}

/// Open a WebSocket connection
///
/// Fails with `Authentication` when the upgrade is answered with 401/403 and
/// with `Connection` for every other transport failure.
pub async fn connect(url: &str) -> ClientResult<WsStream> {
    info!("Connecting to {}", url);

    let (stream, response) = tokio::time::timeout(CONNECT_TIMEOUT, tokio_tungstenite::connect_async(url))
        .await
        .map_err(|_| {
            ClientError::Connection(format!(
                "timed out after {}s connecting to {}",
                CONNECT_TIMEOUT.as_secs(),
                url
            ))
        })??;

    debug!("WebSocket upgrade completed with HTTP {}", response.status());
    info!("Connection established");

    Ok(stream)
}

/// Whether a server-reported error text describes an authentication failure
pub fn is_auth_failure(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    ["unauthorized", "auth", "api key", "api_key", "forbidden", "invalid key"]
        .iter()
        .any(|needle| lower.contains(needle))
}
