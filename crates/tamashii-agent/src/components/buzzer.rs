//! Audible feedback component.
//!
//! `BEEP` events carry a reason (`ok`, `no`, `error`) mapped to a
//! [`BeepPattern`]; `AUTH_RESULT` events play `Ok` for an `ok` body and `No`
//! for anything else. Patterns are queued to a player task so `receive`
//! never waits on the device.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use tamashii_core::constants::DEFAULT_STOP_TIMEOUT_MS;
use tamashii_core::{Event, EventType};
use tamashii_hardware::devices::AnyBuzzerDevice;
use tamashii_hardware::{BeepPattern, BuzzerDevice};

use crate::component::{BackgroundTask, Component, ComponentKind};
use crate::{AgentError, Result};

/// Buzzer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuzzerConfig {
    /// Patterns waiting to be played before new ones are dropped.
    pub queue_capacity: usize,

    /// How long `stop` waits for the player task.
    pub stop_timeout: Duration,
}

impl Default for BuzzerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 8,
            stop_timeout: Duration::from_millis(DEFAULT_STOP_TIMEOUT_MS),
        }
    }
}

/// Buzzer component.
#[derive(Debug)]
pub struct Buzzer {
    config: BuzzerConfig,
    device: Option<AnyBuzzerDevice>,
    queue: Option<mpsc::Sender<BeepPattern>>,
    task: Option<BackgroundTask>,
}

impl Buzzer {
    pub fn new(device: AnyBuzzerDevice, config: BuzzerConfig) -> Self {
        Self {
            config,
            device: Some(device),
            queue: None,
            task: None,
        }
    }

    /// Pattern to play for an event, if the buzzer reacts to it.
    pub fn pattern_for(event: &Event) -> Option<BeepPattern> {
        match event.event_type() {
            EventType::Beep => {
                let pattern = event.body_str().and_then(BeepPattern::from_reason);
                if pattern.is_none() {
                    warn!(%event, "Unknown beep reason, ignoring");
                }
                pattern
            }
            EventType::AuthResult => {
                let accepted = event
                    .body_str()
                    .is_some_and(|body| body.trim().eq_ignore_ascii_case("ok"));
                Some(if accepted {
                    BeepPattern::Ok
                } else {
                    BeepPattern::No
                })
            }
            _ => None,
        }
    }

    fn enqueue(&self, pattern: BeepPattern) -> Result<()> {
        let Some(queue) = &self.queue else {
            debug!(?pattern, "Buzzer not running, dropping pattern");
            return Ok(());
        };

        match queue.try_send(pattern) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(pattern)) => {
                warn!(?pattern, "Buzzer queue full, dropping pattern");
                Ok(())
            }
            Err(TrySendError::Closed(_)) => Err(AgentError::component(
                ComponentKind::Buzzer,
                "player task has exited",
            )),
        }
    }
}

impl Component for Buzzer {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Buzzer
    }

    async fn start(&mut self) -> Result<()> {
        if self.task.is_some() {
            return Err(AgentError::AlreadyStarted {
                component: ComponentKind::Buzzer,
            });
        }
        let device = self.device.take().ok_or_else(|| {
            AgentError::component(ComponentKind::Buzzer, "device already released")
        })?;

        match device.get_info().await {
            Ok(info) => info!(device = %info.name, model = %info.model, "Buzzer started"),
            Err(e) => warn!(error = %e, "Buzzer started without device info"),
        }

        let (tx, rx) = mpsc::channel(self.config.queue_capacity);
        self.queue = Some(tx);
        self.task = Some(BackgroundTask::spawn(|shutdown| {
            player_task(device, rx, shutdown)
        }));
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        self.queue = None;
        match self.task.take() {
            Some(task) => {
                task.stop(ComponentKind::Buzzer, self.config.stop_timeout)
                    .await
            }
            None => Ok(()),
        }
    }

    async fn receive(&mut self, event: &Event) -> Result<()> {
        match Self::pattern_for(event) {
            Some(pattern) => self.enqueue(pattern),
            None => Ok(()),
        }
    }
}

async fn player_task(
    mut device: AnyBuzzerDevice,
    mut patterns: mpsc::Receiver<BeepPattern>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let pattern = tokio::select! {
            _ = shutdown.changed() => break,
            pattern = patterns.recv() => match pattern {
                Some(pattern) => pattern,
                None => break,
            },
        };

        debug!(?pattern, "Playing pattern");
        if let Err(e) = device.play(&pattern).await {
            warn!(error = %e, ?pattern, "Buzzer playback failed");
        }
    }
    debug!("Buzzer player task exiting");
}
