use altpilot_proto::{command::Command, telemetry::frame_payload};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::{CommandChannel, LinkError};

pub struct WsLink {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    endpoint: String,
    closed: bool,
}

impl WsLink {
    pub async fn connect(endpoint: &str) -> Result<Self, LinkError> {
        let (ws, resp) = connect_async(endpoint).await.map_err(|source| LinkError::Connect {
            endpoint: endpoint.to_string(),
            source,
        })?;
        info!("link: connected to {} (HTTP {})", endpoint, resp.status());
        Ok(Self { ws, endpoint: endpoint.to_string(), closed: false })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CommandChannel for WsLink {
    async fn send(&mut self, cmd: &Command) -> Result<(), LinkError> {
        if self.closed {
            return Err(LinkError::Closed);
        }
        let text = cmd.to_json()?;
        debug!("link: -> {}", text);
        self.ws.send(Message::Text(text)).await.map_err(LinkError::Send)
    }

    async fn recv(&mut self) -> Result<String, LinkError> {
        if self.closed {
            return Err(LinkError::Closed);
        }
        loop {
            match self.ws.next().await {
                Some(Ok(Message::Text(text))) => {
                    debug!("link: <- {}", text);
                    return Ok(frame_payload(&text));
                }
                Some(Ok(Message::Binary(b))) => {
                    warn!("link: unexpected binary message ({} bytes), treating as malformed", b.len());
                    return Ok(String::new());
                }
                Some(Ok(Message::Close(frame))) => {
                    debug!("link: close frame from peer: {:?}", frame);
                    return Err(LinkError::Closed);
                }
                // ping/pong are answered by tungstenite itself
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    debug!("link: read failed: {}", e);
                    return Err(LinkError::Closed);
                }
                None => return Err(LinkError::Closed),
            }
        }
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.ws.close(None).await {
            debug!("link: close handshake: {}", e);
        }
        info!("link: connection to {} severed", self.endpoint);
    }
}
