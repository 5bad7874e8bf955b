//! Connection ownership and state
//!
//! The client owns at most one live transport. A broken transport is never
//! repaired: it is closed and a new one is dialed in its place.
//!
//! # States
//!
//! ```text
//! Disconnected ──open──▶ Connected
//!      ▲                     │
//!      └──close / fault──────┘
//! ```

use crate::transport::{Connector, Transport};
use gwrpc_core::{Error, Result};
use std::time::Duration;

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No live socket; the next request dials one
    Disconnected,
    /// A socket is open
    Connected,
}

impl ConnectionState {
    /// Numeric code recorded by the connection-state gauge
    pub fn as_gauge(self) -> i64 {
        match self {
            ConnectionState::Disconnected => 0,
            ConnectionState::Connected => 1,
        }
    }
}

/// Slot holding the client's single transport
pub(crate) struct ConnectionSlot {
    transport: Option<Box<dyn Transport>>,
    opened: u64,
}

impl ConnectionSlot {
    pub(crate) fn new() -> Self {
        Self {
            transport: None,
            opened: 0,
        }
    }

    pub(crate) fn state(&self) -> ConnectionState {
        if self.transport.is_some() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    /// Number of connections opened so far
    pub(crate) fn opened(&self) -> u64 {
        self.opened
    }

    pub(crate) fn transport_mut(&mut self) -> Option<&mut (dyn Transport + 'static)> {
        self.transport.as_deref_mut()
    }

    /// Close the current transport (if any) and dial a new one
    ///
    /// On failure the slot stays disconnected and the error is returned to
    /// whoever asked for the connection.
    #[tracing::instrument(skip(self, connector, url, timeout), fields(url = %url))]
    pub(crate) async fn open(
        &mut self,
        connector: &dyn Connector,
        url: &str,
        timeout: Duration,
    ) -> Result<()> {
        self.close().await;

        tracing::info!("Connecting to node");
        let connected = match tokio::time::timeout(timeout, connector.connect(url)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Connection {
                url: url.to_string(),
                reason: format!("timed out after {:?}", timeout),
            }),
        };

        match connected {
            Ok(transport) => {
                self.transport = Some(transport);
                self.opened += 1;
                tracing::info!(connections = self.opened, "Connected to node");
                Ok(())
            }
            Err(error) => {
                tracing::error!(error = %error, "Failed to connect to node");
                Err(error)
            }
        }
    }

    /// Close and forget the current transport; no-op when disconnected
    pub(crate) async fn close(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Script;

    #[tokio::test]
    async fn test_open_and_close() {
        let script = Script::new();
        let connector = script.connector();
        let mut slot = ConnectionSlot::new();
        assert_eq!(slot.state(), ConnectionState::Disconnected);

        slot.open(&connector, "ws://node.test", Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(slot.state(), ConnectionState::Connected);
        assert_eq!(slot.opened(), 1);

        slot.close().await;
        slot.close().await;
        assert_eq!(slot.state(), ConnectionState::Disconnected);
        assert_eq!(script.closes(), 1);
    }

    #[tokio::test]
    async fn test_reopen_closes_previous_transport() {
        let script = Script::new();
        let connector = script.connector();
        let mut slot = ConnectionSlot::new();

        slot.open(&connector, "ws://node.test", Duration::from_secs(1))
            .await
            .unwrap();
        slot.open(&connector, "ws://node.test", Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(script.connects(), 2);
        assert_eq!(script.closes(), 1);
        assert_eq!(slot.opened(), 2);
    }

    #[tokio::test]
    async fn test_failed_open_leaves_slot_disconnected() {
        let script = Script::new().refuse_connects(1);
        let connector = script.connector();
        let mut slot = ConnectionSlot::new();

        let result = slot
            .open(&connector, "ws://node.test", Duration::from_secs(1))
            .await;
        assert!(matches!(result, Err(Error::Connection { .. })));
        assert_eq!(slot.state(), ConnectionState::Disconnected);
        assert_eq!(slot.opened(), 0);
    }

    #[tokio::test]
    async fn test_connect_timeout() {
        let script = Script::new().stall_connects(1);
        let connector = script.connector();
        let mut slot = ConnectionSlot::new();

        let result = slot
            .open(&connector, "ws://node.test", Duration::from_millis(20))
            .await;
        match result {
            Err(Error::Connection { reason, .. }) => assert!(reason.contains("timed out")),
            other => panic!("Expected Connection error, got {:?}", other.err()),
        }
        assert_eq!(slot.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_gauge_codes() {
        assert_eq!(ConnectionState::Disconnected.as_gauge(), 0);
        assert_eq!(ConnectionState::Connected.as_gauge(), 1);
    }
}
