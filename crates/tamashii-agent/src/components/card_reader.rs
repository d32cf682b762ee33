//! Card reader component.
//!
//! Reads cards on a background task and submits `CARD_DATA` events with the
//! UID in uppercase hex. A card left on the reader is reported once per
//! debounce window.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error, info, trace};

use tamashii_core::constants::{DEFAULT_CARD_DEBOUNCE_MS, DEFAULT_STOP_TIMEOUT_MS};
use tamashii_core::{Event, EventType};
use tamashii_hardware::RfidDevice;
use tamashii_hardware::devices::AnyRfidDevice;

use crate::component::{BackgroundTask, Component, ComponentKind, EventSender};
use crate::{AgentError, Result};

/// Minimum delay between reads, so a misbehaving driver cannot spin.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Card reader settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardReaderConfig {
    /// Window in which a repeated read of the same UID is suppressed.
    pub debounce: Duration,

    /// How long `stop` waits for the reader task.
    pub stop_timeout: Duration,
}

impl Default for CardReaderConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_CARD_DEBOUNCE_MS),
            stop_timeout: Duration::from_millis(DEFAULT_STOP_TIMEOUT_MS),
        }
    }
}

/// Card reader component.
#[derive(Debug)]
pub struct CardReader {
    config: CardReaderConfig,
    device: Option<AnyRfidDevice>,
    events: EventSender,
    task: Option<BackgroundTask>,
}

impl CardReader {
    pub fn new(device: AnyRfidDevice, events: EventSender, config: CardReaderConfig) -> Self {
        Self {
            config,
            device: Some(device),
            events,
            task: None,
        }
    }

    /// Whether the reader task is alive.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Component for CardReader {
    fn kind(&self) -> ComponentKind {
        ComponentKind::CardReader
    }

    async fn start(&mut self) -> Result<()> {
        if self.task.is_some() {
            return Err(AgentError::AlreadyStarted {
                component: ComponentKind::CardReader,
            });
        }
        let device = self.device.take().ok_or_else(|| {
            AgentError::component(ComponentKind::CardReader, "device already released")
        })?;

        if let Ok(info) = device.get_reader_info().await {
            info!(
                reader = %info.name,
                protocols = ?info.protocols,
                max_baud_rate = ?info.max_baud_rate,
                "Card reader started"
            );
        }

        let events = self.events.clone();
        let debounce = self.config.debounce;
        self.task = Some(BackgroundTask::spawn(move |shutdown| {
            reader_task(device, events, debounce, shutdown)
        }));
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        match self.task.take() {
            Some(task) => {
                task.stop(ComponentKind::CardReader, self.config.stop_timeout)
                    .await
            }
            None => Ok(()),
        }
    }

    async fn receive(&mut self, _event: &Event) -> Result<()> {
        Ok(())
    }
}

async fn reader_task(
    mut device: AnyRfidDevice,
    events: EventSender,
    debounce: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut last_read: Option<(String, Instant)> = None;

    loop {
        let started = Instant::now();

        let result = tokio::select! {
            _ = shutdown.changed() => break,
            result = device.read_card() => result,
        };

        match result {
            Ok(card) => {
                let uid = card.uid_hex();
                let repeated = matches!(
                    &last_read,
                    Some((previous, at)) if *previous == uid && at.elapsed() < debounce
                );

                if repeated {
                    trace!(uid = %uid, "Suppressing repeated read");
                } else {
                    info!(
                        uid = %uid,
                        card_type = card.card_type.name(),
                        read_at = %card.read_at.to_rfc3339(),
                        "Card read"
                    );
                    last_read = Some((uid.clone(), Instant::now()));

                    let event = Event::new(EventType::CardData, uid);
                    if !events.submit_or_shutdown(event, &mut shutdown).await {
                        break;
                    }
                }
            }
            Err(e) => {
                error!(error = %e, "Card reader failed, stopping reader task");
                break;
            }
        }

        let elapsed = started.elapsed();
        if elapsed < MIN_POLL_INTERVAL {
            tokio::time::sleep(MIN_POLL_INTERVAL - elapsed).await;
        }
    }
    debug!("Card reader task exiting");
}
