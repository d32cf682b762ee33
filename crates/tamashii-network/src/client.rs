//! TCP client for the manager link.
//!
//! The connection component owns one [`TcpClient`] and drives it from its
//! link task. The client only moves framed [`Event`]s; reconnect policy and
//! readiness tracking live in the component.
//!
//! # Example Usage
//!
//! ```no_run
//! use tamashii_network::{TcpClient, TcpClientConfig};
//! use tamashii_core::{Event, EventType};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TcpClientConfig {
//!     host: "manager.local".to_string(),
//!     port: 3000,
//!     timeout: Duration::from_millis(3000),
//! };
//!
//! let mut client = TcpClient::new(config);
//! client.connect().await?;
//!
//! client.send(Event::new(EventType::CardData, "04ABCDEF")).await?;
//! let reply = client.recv().await?;
//! println!("Received: {reply}");
//!
//! client.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Timeout Handling
//!
//! Connect, send and receive are each bounded by the configured timeout
//! (default 3000ms). A [`TcpClientError::ReadTimeout`] leaves the connection
//! usable; every other error after connect should be treated as a lost link.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::{debug, error, info, trace, warn};

use tamashii_core::Event;
use tamashii_core::constants::{DEFAULT_IO_TIMEOUT_MS, DEFAULT_MANAGER_PORT};

use crate::EventCodec;

/// Grace period for flushing and shutting down on close.
const CLOSE_TIMEOUT: Duration = Duration::from_millis(500);

/// Configuration for [`TcpClient`].
///
/// # Example
///
/// ```
/// use tamashii_network::TcpClientConfig;
///
/// let config = TcpClientConfig::default();
/// assert_eq!(config.address(), "127.0.0.1:3000");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpClientConfig {
    /// Manager host name or address
    pub host: String,

    /// Manager TCP port
    pub port: u16,

    /// Timeout for all I/O operations (connect, send, recv)
    pub timeout: Duration,
}

impl TcpClientConfig {
    /// `host:port` form used for logging.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for TcpClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_MANAGER_PORT,
            timeout: Duration::from_millis(DEFAULT_IO_TIMEOUT_MS),
        }
    }
}

/// Errors that can occur during TCP client operations
#[derive(Debug, Error)]
pub enum TcpClientError {
    /// Client is not connected to the manager
    #[error("Not connected to manager")]
    NotConnected,

    /// Connection attempt timed out
    #[error("Connection timeout after {0}ms")]
    ConnectionTimeout(u64),

    /// Read operation timed out
    #[error("Read timeout after {0}ms")]
    ReadTimeout(u64),

    /// Write operation timed out
    #[error("Write timeout after {0}ms")]
    WriteTimeout(u64),

    /// Connection was lost during operation
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// Framing error from the event codec
    #[error("Protocol error: {0}")]
    Protocol(#[from] tamashii_core::Error),

    /// Low-level I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TcpClientError {
    /// Whether the connection should be considered gone after this error.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::ReadTimeout(_))
    }
}

/// Framed event connection to the manager.
///
/// # Connection Lifecycle
///
/// 1. Create client with `new()`
/// 2. Connect with `connect()`
/// 3. Exchange events with `send()` and `recv()`
/// 4. Close with `close()`
pub struct TcpClient {
    config: TcpClientConfig,

    /// Framed TCP stream (None if not connected)
    framed: Option<Framed<TcpStream, EventCodec>>,
}

impl TcpClient {
    /// Create a new, disconnected client.
    ///
    /// ```
    /// use tamashii_network::{TcpClient, TcpClientConfig};
    ///
    /// let client = TcpClient::new(TcpClientConfig::default());
    /// assert!(!client.is_connected());
    /// ```
    pub fn new(config: TcpClientConfig) -> Self {
        debug!("Creating TCP client for manager {}", config.address());

        Self {
            config,
            framed: None,
        }
    }

    /// The configuration this client connects with.
    pub fn config(&self) -> &TcpClientConfig {
        &self.config
    }

    fn timeout_ms(&self) -> u64 {
        self.config.timeout.as_millis() as u64
    }

    /// Connect to the manager.
    ///
    /// Any previous connection is dropped first. The socket is configured
    /// with TCP_NODELAY so card reads reach the manager without batching.
    ///
    /// # Errors
    ///
    /// Returns [`TcpClientError::ConnectionTimeout`] when the attempt exceeds
    /// the timeout, or [`TcpClientError::Io`] when the manager refuses or the
    /// host cannot be resolved.
    pub async fn connect(&mut self) -> Result<(), TcpClientError> {
        self.framed = None;
        let address = self.config.address();
        info!("Connecting to manager at {}", address);

        let connect = TcpStream::connect((self.config.host.as_str(), self.config.port));
        let stream = match tokio::time::timeout(self.config.timeout, connect).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                error!("Connection to {} failed: {}", address, e);
                return Err(e.into());
            }
            Err(_) => {
                warn!("Connection timeout after {}ms", self.timeout_ms());
                return Err(TcpClientError::ConnectionTimeout(self.timeout_ms()));
            }
        };

        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY: {}", e);
        }

        self.framed = Some(Framed::new(stream, EventCodec::new()));
        info!("Connected to manager at {}", address);
        Ok(())
    }

    /// Send one event.
    ///
    /// # Errors
    ///
    /// Returns [`TcpClientError::NotConnected`] before `connect()`, a
    /// [`TcpClientError::WriteTimeout`] when the write stalls, or a
    /// [`TcpClientError::Protocol`] when the body exceeds the frame limit.
    pub async fn send(&mut self, event: Event) -> Result<(), TcpClientError> {
        trace!(%event, "Sending event to manager");

        let timeout = self.config.timeout;
        let timeout_ms = self.timeout_ms();
        let framed = self.framed.as_mut().ok_or(TcpClientError::NotConnected)?;

        match tokio::time::timeout(timeout, framed.send(event)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                error!("Failed to send event: {}", e);
                Err(TcpClientError::Protocol(e))
            }
            Err(_) => {
                warn!("Send timeout after {}ms", timeout_ms);
                Err(TcpClientError::WriteTimeout(timeout_ms))
            }
        }
    }

    /// Receive the next event.
    ///
    /// # Errors
    ///
    /// Returns [`TcpClientError::ReadTimeout`] when nothing arrives in time,
    /// [`TcpClientError::ConnectionLost`] when the manager closes the socket,
    /// or [`TcpClientError::Protocol`] on a malformed frame.
    pub async fn recv(&mut self) -> Result<Event, TcpClientError> {
        let timeout = self.config.timeout;
        let timeout_ms = self.timeout_ms();
        let framed = self.framed.as_mut().ok_or(TcpClientError::NotConnected)?;

        match tokio::time::timeout(timeout, framed.next()).await {
            Ok(Some(Ok(event))) => {
                trace!(%event, "Received event from manager");
                Ok(event)
            }
            Ok(Some(Err(e))) => {
                error!("Failed to decode event: {}", e);
                Err(TcpClientError::Protocol(e))
            }
            Ok(None) => {
                warn!("Connection closed by manager");
                Err(TcpClientError::ConnectionLost(
                    "Manager closed connection".to_string(),
                ))
            }
            Err(_) => Err(TcpClientError::ReadTimeout(timeout_ms)),
        }
    }

    /// Check if the client holds an open connection.
    pub fn is_connected(&self) -> bool {
        self.framed.is_some()
    }

    /// Close the connection.
    ///
    /// Idempotent. Flush and shutdown are each bounded by 500ms; failures are
    /// logged and the connection is dropped regardless.
    pub async fn close(&mut self) -> Result<(), TcpClientError> {
        let Some(mut framed) = self.framed.take() else {
            return Ok(());
        };
        info!("Closing connection to {}", self.config.address());

        match tokio::time::timeout(CLOSE_TIMEOUT, framed.flush()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Error flushing during close: {}", e),
            Err(_) => warn!("Flush timeout during close"),
        }

        let mut stream = framed.into_inner();
        match tokio::time::timeout(CLOSE_TIMEOUT, stream.shutdown()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Error during shutdown: {}", e),
            Err(_) => warn!("Shutdown timeout during close"),
        }

        debug!("Connection closed");
        Ok(())
    }
}

impl Drop for TcpClient {
    fn drop(&mut self) {
        if self.framed.is_some() {
            debug!("TcpClient dropped while connected");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tamashii_core::EventType;

    #[test]
    fn test_config_default() {
        let config = TcpClientConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3000);
        assert_eq!(config.timeout.as_millis(), 3000);
    }

    #[test]
    fn test_config_address() {
        let config = TcpClientConfig {
            host: "manager.local".to_string(),
            port: 4000,
            ..Default::default()
        };
        assert_eq!(config.address(), "manager.local:4000");
    }

    #[test]
    fn test_client_not_connected_initially() {
        let client = TcpClient::new(TcpClientConfig::default());
        assert!(!client.is_connected());
    }

    #[test]
    fn test_only_read_timeout_is_recoverable() {
        assert!(!TcpClientError::ReadTimeout(10).is_fatal());
        assert!(TcpClientError::WriteTimeout(10).is_fatal());
        assert!(TcpClientError::ConnectionLost("gone".into()).is_fatal());
        assert!(TcpClientError::NotConnected.is_fatal());
    }

    #[tokio::test]
    async fn test_send_without_connect() {
        let mut client = TcpClient::new(TcpClientConfig::default());
        let result = client.send(Event::new(EventType::CardData, "04")).await;
        assert!(matches!(result, Err(TcpClientError::NotConnected)));
    }

    #[tokio::test]
    async fn test_recv_without_connect() {
        let mut client = TcpClient::new(TcpClientConfig::default());
        let result = client.recv().await;
        assert!(matches!(result, Err(TcpClientError::NotConnected)));
    }

    #[tokio::test]
    async fn test_connection_timeout() {
        // RFC 5737 TEST-NET-1, never routed
        let config = TcpClientConfig {
            host: "192.0.2.1".to_string(),
            port: 9999,
            timeout: Duration::from_millis(100),
        };

        let mut client = TcpClient::new(config);
        let result = client.connect().await;

        assert!(matches!(
            result,
            Err(TcpClientError::ConnectionTimeout(_)) | Err(TcpClientError::Io(_))
        ));
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn test_multiple_close_calls() {
        let mut client = TcpClient::new(TcpClientConfig::default());
        client.close().await.unwrap();
        client.close().await.unwrap();
    }
}
