pub mod doctor;
mod ws;

use altpilot_proto::command::Command;
use async_trait::async_trait;

pub use ws::WsLink;

/// Default simulator endpoint.
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8765";

pub type WsError = tokio_tungstenite::tungstenite::Error;

#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("connect {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: WsError,
    },
    #[error("encode command: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("send command: {0}")]
    Send(#[source] WsError),
    #[error("connection closed by peer")]
    Closed,
}

/// Persistent command/telemetry connection to the flight peer.
///
/// One request in flight at a time: the control loop never overlaps calls.
#[async_trait]
pub trait CommandChannel: Send {
    /// Sends one command as a single JSON text message.
    async fn send(&mut self, cmd: &Command) -> Result<(), LinkError>;

    /// Waits for the next telemetry message and returns its status string.
    /// Malformed messages come back as an empty string, not as an error.
    async fn recv(&mut self) -> Result<String, LinkError>;

    /// Releases the connection. Safe to call more than once.
    async fn close(&mut self);
}
