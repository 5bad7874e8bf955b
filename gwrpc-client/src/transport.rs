//! Transport seam between the client and the socket
//!
//! The orchestrator never touches WebSocket types directly. It talks to a
//! `Connector` (dial a URL) and the `Transport` it returns (send one text
//! frame, receive one payload, close). Production uses `WsConnector`, tests
//! plug in scripted transports.
//!
//! # Failure Reporting
//!
//! Implementations must keep the two recoverable kinds apart:
//!
//! - `Error::ConnectionClosed` when the peer closed or reset the connection
//! - `Error::Transport` for any other I/O fault
//!
//! Both make the client drop the connection and replay the call once.
//! `Error::Connection` is reserved for `Connector::connect`.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use gwrpc_core::{Error, Result};
use std::time::Duration;
use tokio_tungstenite::tungstenite::error::{Error as WsError, ProtocolError};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

/// How long a closing handshake may take before the socket is just dropped
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// One live connection to a node
#[async_trait]
pub trait Transport: Send {
    /// Send one request as a text frame
    async fn send(&mut self, payload: String) -> Result<()>;

    /// Wait for the next data frame and return its payload
    async fn receive(&mut self) -> Result<Vec<u8>>;

    /// Close the connection
    ///
    /// Best-effort and idempotent: never fails, and calling it on an already
    /// closed or broken connection is a no-op.
    async fn close(&mut self);
}

/// Opens connections
#[async_trait]
pub trait Connector: Send + Sync {
    /// Dial `url`, failing with `Error::Connection`
    async fn connect(&self, url: &str) -> Result<Box<dyn Transport>>;
}

/// Connector for `ws://` and `wss://` endpoints
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn Transport>> {
        let (stream, _response) = connect_async(url).await.map_err(|e| Error::Connection {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Box::new(WsTransport::new(stream)))
    }
}

/// `Transport` over a tokio-tungstenite stream
pub struct WsTransport {
    stream: WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
    closed: bool,
}

impl WsTransport {
    /// Wrap an established stream
    pub fn new(stream: WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>) -> Self {
        Self {
            stream,
            closed: false,
        }
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn send(&mut self, payload: String) -> Result<()> {
        if self.closed {
            return Err(Error::ConnectionClosed);
        }
        self.stream
            .send(Message::Text(payload))
            .await
            .map_err(map_ws_error)
    }

    async fn receive(&mut self) -> Result<Vec<u8>> {
        if self.closed {
            return Err(Error::ConnectionClosed);
        }
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Ok(text.into_bytes()),
                Some(Ok(Message::Binary(data))) => return Ok(data),
                Some(Ok(Message::Close(frame))) => {
                    tracing::debug!(frame = ?frame, "Node sent close frame");
                    self.closed = true;
                    return Err(Error::ConnectionClosed);
                }
                // Ping/pong are answered by tungstenite itself.
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(map_ws_error(e)),
                None => {
                    self.closed = true;
                    return Err(Error::ConnectionClosed);
                }
            }
        }
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        match tokio::time::timeout(CLOSE_GRACE, self.stream.close(None)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::debug!(error = %e, "Ignoring error while closing socket"),
            Err(_) => tracing::debug!("Closing handshake timed out, dropping socket"),
        }
    }
}

/// Sort a tungstenite error into closed vs. other transport faults
pub(crate) fn map_ws_error(error: WsError) -> Error {
    use std::io::ErrorKind;

    match error {
        WsError::ConnectionClosed
        | WsError::AlreadyClosed
        | WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake) => Error::ConnectionClosed,
        WsError::Io(e)
            if matches!(
                e.kind(),
                ErrorKind::ConnectionReset
                    | ErrorKind::ConnectionAborted
                    | ErrorKind::BrokenPipe
                    | ErrorKind::UnexpectedEof
            ) =>
        {
            Error::ConnectionClosed
        }
        other => Error::Transport(other.to_string()),
    }
}
