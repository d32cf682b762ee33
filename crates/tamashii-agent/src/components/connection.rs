//! Manager link component.
//!
//! A link task keeps one [`TcpClient`] connected to the manager,
//! reconnecting after a fixed interval whenever the link drops. Frames from
//! the manager are submitted to the master as events. `CARD_DATA` events
//! broadcast by the master are forwarded to the manager; when the link is
//! down the component reports `CONNECTION_NOT_READY` back to the master
//! instead, carrying the card UID as its body.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use tamashii_core::constants::{
    DEFAULT_IO_TIMEOUT_MS, DEFAULT_MANAGER_PORT, DEFAULT_RECONNECT_INTERVAL_MS,
    DEFAULT_STOP_TIMEOUT_MS,
};
use tamashii_core::{Event, EventType};
use tamashii_network::{TcpClient, TcpClientConfig};

use crate::component::{BackgroundTask, Component, ComponentKind, EventSender};
use crate::{AgentError, Result};

/// Manager link settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Manager host name or address.
    pub host: String,

    /// Manager TCP port.
    pub port: u16,

    /// Connect/send/receive timeout.
    pub io_timeout: Duration,

    /// Delay before reconnecting after a failure.
    pub reconnect_interval: Duration,

    /// Outbound events waiting for the link task.
    pub outbound_capacity: usize,

    /// How long `stop` waits for the link task.
    pub stop_timeout: Duration,
}

impl ConnectionConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Client settings for the link task.
    pub fn client_config(&self) -> TcpClientConfig {
        TcpClientConfig {
            host: self.host.clone(),
            port: self.port,
            timeout: self.io_timeout,
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_MANAGER_PORT,
            io_timeout: Duration::from_millis(DEFAULT_IO_TIMEOUT_MS),
            reconnect_interval: Duration::from_millis(DEFAULT_RECONNECT_INTERVAL_MS),
            outbound_capacity: 32,
            stop_timeout: Duration::from_millis(DEFAULT_STOP_TIMEOUT_MS),
        }
    }
}

/// Manager link component.
#[derive(Debug)]
pub struct Connection {
    config: ConnectionConfig,
    events: EventSender,
    ready: Arc<AtomicBool>,
    outbound: Option<mpsc::Sender<Event>>,
    task: Option<BackgroundTask>,
}

impl Connection {
    pub fn new(config: ConnectionConfig, events: EventSender) -> Self {
        Self {
            config,
            events,
            ready: Arc::new(AtomicBool::new(false)),
            outbound: None,
            task: None,
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Whether the manager link is currently up.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    fn forward(&self, event: &Event) -> bool {
        if !self.is_ready() {
            return false;
        }
        let Some(outbound) = &self.outbound else {
            return false;
        };

        match outbound.try_send(event.clone()) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Outbound queue unavailable");
                false
            }
        }
    }
}

impl Component for Connection {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Connection
    }

    async fn start(&mut self) -> Result<()> {
        if self.task.is_some() {
            return Err(AgentError::AlreadyStarted {
                component: ComponentKind::Connection,
            });
        }

        let (tx, rx) = mpsc::channel(self.config.outbound_capacity);
        self.outbound = Some(tx);

        let link = LinkTask {
            client: TcpClient::new(self.config.client_config()),
            reconnect_interval: self.config.reconnect_interval,
            events: self.events.clone(),
            ready: Arc::clone(&self.ready),
            outbound: rx,
        };
        self.task = Some(BackgroundTask::spawn(|shutdown| link.run(shutdown)));

        info!(host = %self.config.host, port = self.config.port, "Connection started");
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        self.outbound = None;
        let result = match self.task.take() {
            Some(task) => {
                task.stop(ComponentKind::Connection, self.config.stop_timeout)
                    .await
            }
            None => Ok(()),
        };
        self.ready.store(false, Ordering::Release);
        result
    }

    async fn receive(&mut self, event: &Event) -> Result<()> {
        if !event.event_type().is_outbound() {
            return Ok(());
        }
        if self.forward(event) {
            return Ok(());
        }

        debug!(%event, "Manager link not ready");
        self.events.try_submit(Event::new(
            EventType::ConnectionNotReady,
            event.body_bytes(),
        ))
    }
}

/// State owned by the link task.
struct LinkTask {
    client: TcpClient,
    reconnect_interval: Duration,
    events: EventSender,
    ready: Arc<AtomicBool>,
    outbound: mpsc::Receiver<Event>,
}

/// Why a connected session ended.
enum SessionEnd {
    /// Shutdown signalled or the master is gone.
    Exit,
    /// The link dropped; reconnect.
    Lost,
}

impl LinkTask {
    async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        loop {
            let connected = tokio::select! {
                _ = shutdown.changed() => break,
                result = self.client.connect() => result,
            };

            match connected {
                Ok(()) => {
                    self.ready.store(true, Ordering::Release);
                    info!("Manager link ready");

                    let end = self.session(&mut shutdown).await;

                    self.ready.store(false, Ordering::Release);
                    let _ = self.client.close().await;
                    if matches!(end, SessionEnd::Exit) {
                        break;
                    }
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        retry_ms = self.reconnect_interval.as_millis() as u64,
                        "Manager link unavailable"
                    );
                }
            }

            tokio::select! {
                _ = shutdown.changed() => break,
                _ = tokio::time::sleep(self.reconnect_interval) => {}
            }
        }

        self.ready.store(false, Ordering::Release);
        let _ = self.client.close().await;
        debug!("Link task exiting");
    }

    async fn session(&mut self, shutdown: &mut watch::Receiver<bool>) -> SessionEnd {
        loop {
            tokio::select! {
                _ = shutdown.changed() => return SessionEnd::Exit,
                received = self.client.recv() => match received {
                    Ok(event) => {
                        debug!(%event, "Event from manager");
                        if !self.events.submit_or_shutdown(event, shutdown).await {
                            return SessionEnd::Exit;
                        }
                    }
                    // Idle link, keep waiting
                    Err(e) if !e.is_fatal() => {}
                    Err(e) => {
                        warn!(error = %e, "Manager link lost");
                        return SessionEnd::Lost;
                    }
                },
                Some(event) = self.outbound.recv() => {
                    if let Err(e) = self.client.send(event).await {
                        warn!(error = %e, "Failed to send event to manager");
                        return SessionEnd::Lost;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::event_channel;
    use futures::{SinkExt, StreamExt};
    use tamashii_network::EventCodec;
    use tokio::net::TcpListener;
    use tokio_util::codec::Framed;

    async fn wait_until_ready(connection: &Connection) {
        for _ in 0..100 {
            if connection.is_ready() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("connection never became ready");
    }

    fn config_for(port: u16) -> ConnectionConfig {
        ConnectionConfig {
            io_timeout: Duration::from_millis(200),
            reconnect_interval: Duration::from_millis(50),
            stop_timeout: Duration::from_secs(1),
            ..ConnectionConfig::new("127.0.0.1", port)
        }
    }

    #[tokio::test]
    async fn test_inbound_and_outbound_events() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let (events, mut rx) = event_channel(8);
        let mut connection = Connection::new(config_for(port), events);
        connection.start().await.unwrap();

        let (stream, _) = listener.accept().await.unwrap();
        let mut manager = Framed::new(stream, EventCodec::new());
        wait_until_ready(&connection).await;

        manager
            .send(Event::new(EventType::AuthResult, "ok"))
            .await
            .unwrap();
        assert_eq!(
            rx.recv().await.unwrap(),
            Event::new(EventType::AuthResult, "ok")
        );

        connection
            .receive(&Event::new(EventType::CardData, "04ABCDEF"))
            .await
            .unwrap();
        let forwarded = manager.next().await.unwrap().unwrap();
        assert_eq!(forwarded, Event::new(EventType::CardData, "04ABCDEF"));

        connection.stop().await.unwrap();
        assert!(!connection.is_ready());
    }

    #[tokio::test]
    async fn test_card_data_while_not_ready() {
        // Nothing listens on this port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let (events, mut rx) = event_channel(8);
        let mut connection = Connection::new(config_for(port), events);
        connection.start().await.unwrap();

        connection
            .receive(&Event::new(EventType::CardData, "ABC"))
            .await
            .unwrap();
        assert_eq!(
            rx.recv().await.unwrap(),
            Event::new(EventType::ConnectionNotReady, "ABC")
        );

        connection.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_non_outbound_events_are_ignored() {
        let (events, mut rx) = event_channel(8);
        let mut connection = Connection::new(ConnectionConfig::default(), events);

        for event in [
            Event::new(EventType::Beep, "error"),
            Event::new(EventType::AuthResult, "ok"),
            Event::new(987654321u32, "ABC"),
        ] {
            connection.receive(&event).await.unwrap();
        }
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_reconnects_after_manager_drops() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let (events, mut rx) = event_channel(8);
        let mut connection = Connection::new(config_for(port), events);
        connection.start().await.unwrap();

        let (first, _) = listener.accept().await.unwrap();
        wait_until_ready(&connection).await;
        drop(first);

        let (second, _) = listener.accept().await.unwrap();
        let mut manager = Framed::new(second, EventCodec::new());
        manager
            .send(Event::new(EventType::Beep, "ok"))
            .await
            .unwrap();
        assert_eq!(rx.recv().await.unwrap().event_type(), EventType::Beep);

        connection.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_start_twice() {
        let (events, _rx) = event_channel(8);
        let mut connection = Connection::new(config_for(1), events);
        connection.start().await.unwrap();
        assert!(matches!(
            connection.start().await,
            Err(AgentError::AlreadyStarted { .. })
        ));
        connection.stop().await.unwrap();
        connection.stop().await.unwrap();
    }

    #[test]
    fn test_client_config() {
        let config = ConnectionConfig::new("manager.local", 4000);
        let client = config.client_config();
        assert_eq!(client.address(), "manager.local:4000");
        assert_eq!(client.timeout, Duration::from_millis(DEFAULT_IO_TIMEOUT_MS));
    }
}
