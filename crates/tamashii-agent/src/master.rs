//! The master orchestrator.
//!
//! The master creates the terminal's components, then sits on the single
//! consumer end of the event channel. Every submitted event is classified:
//!
//! | Incoming               | Action                    | Broadcast            |
//! |------------------------|---------------------------|----------------------|
//! | `SYSTEM_COMMAND`       | executed by the master    | none                 |
//! | `CONNECTION_NOT_READY` | replaced by `BEEP error`  | the `BEEP` event     |
//! | anything else          | passed through unchanged  | the original event   |
//!
//! Broadcasts reach every component once, in construction order, including
//! the component that submitted the event.
//!
//! # Example
//!
//! ```no_run
//! use tamashii_agent::{HardwareFactory, Master, MasterConfig};
//! use tamashii_hardware::devices::{AnyBuzzerDevice, AnyRfidDevice};
//! use tamashii_hardware::mock::{MockBuzzer, MockRfid};
//! use tamashii_hardware::CpuInfoSerial;
//!
//! # async fn example() -> tamashii_agent::Result<()> {
//! let (rfid, _) = MockRfid::new();
//! let (buzzer, _) = MockBuzzer::new();
//! let factory = HardwareFactory::new(AnyRfidDevice::Mock(rfid), AnyBuzzerDevice::Mock(buzzer));
//!
//! let mut master = Master::new(MasterConfig::new("manager.local", 3000), &CpuInfoSerial::new(), factory).await?;
//! master.run_until(async { let _ = tokio::signal::ctrl_c().await; }).await;
//! master.stop().await;
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use tamashii_core::constants::BEEP_ERROR;
use tamashii_core::{Event, EventType, SystemCommand};
use tamashii_hardware::SerialNumberSource;

use crate::component::{
    Component, ComponentKind, ComponentSpec, EventSender, WeakEventSender, event_channel,
};
use crate::config::MasterConfig;
use crate::factory::{ComponentFactory, HardwareFactory};
use crate::system::{CommandExecutor, ShellExecutor};
use crate::{AgentError, Result};

/// Extra time the master allows beyond a component's own stop timeout.
const STOP_GRACE: Duration = Duration::from_millis(500);

/// What the master does with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Handled by the master, never broadcast.
    MasterOnly(Event),
    /// Delivered to every component.
    Broadcast(Event),
}

/// Classify an event by its type code.
///
/// ```
/// use tamashii_agent::master::{Route, classify};
/// use tamashii_core::{Event, EventType};
///
/// let route = classify(Event::new(EventType::ConnectionNotReady, "ABC"));
/// assert_eq!(route, Route::Broadcast(Event::new(EventType::Beep, "error")));
/// ```
pub fn classify(event: Event) -> Route {
    match event.event_type() {
        t if t.is_master_only() => Route::MasterOnly(event),
        EventType::ConnectionNotReady => {
            Route::Broadcast(Event::new(EventType::Beep, BEEP_ERROR))
        }
        _ => Route::Broadcast(event),
    }
}

/// Why [`Master::run_until`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The shutdown future resolved.
    Shutdown,
    /// The manager sent `restart`.
    RestartRequested,
    /// Every component released its sender, so nothing can submit again.
    ChannelClosed,
}

/// Orchestrates the terminal's components.
pub struct Master<F: ComponentFactory = HardwareFactory> {
    serial_number: String,
    components: Vec<F::Component>,
    factory: F,
    events: WeakEventSender,
    inbox: mpsc::Receiver<Event>,
    executor: Box<dyn CommandExecutor>,
    stop_timeout: Duration,
    stopped: bool,
    exit_requested: bool,
}

impl<F: ComponentFactory> Master<F> {
    /// Validate `config`, resolve the serial number, then create and start
    /// Connection, Buzzer and CardReader in that order.
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration, when the serial number cannot be
    /// resolved, or when any component fails to build or start. In the last
    /// case the components already started are stopped before returning.
    pub async fn new(
        config: MasterConfig,
        serial: &impl SerialNumberSource,
        factory: F,
    ) -> Result<Self> {
        config.validate()?;
        let serial_number = serial.serial_number()?;
        info!(
            serial = %serial_number,
            host = %config.host,
            port = config.port,
            "Starting master"
        );

        // The master keeps only a weak handle; the channel lives as long as
        // some component holds a sender.
        let (events, inbox) = event_channel(config.channel_capacity);
        let mut master = Self {
            serial_number,
            components: Vec::with_capacity(3),
            factory,
            events: events.downgrade(),
            inbox,
            executor: Box::new(ShellExecutor),
            stop_timeout: config.stop_timeout(),
            stopped: false,
            exit_requested: false,
        };

        for spec in config.component_specs() {
            let kind = spec.kind();
            match master.create_component(spec).await {
                Ok(component) => master.components.push(component),
                Err(e) => {
                    error!(component = %kind, error = %e, "Component failed to start");
                    master.stop().await;
                    return Err(e);
                }
            }
        }

        drop(events);
        info!(components = master.components.len(), "Master ready");
        Ok(master)
    }

    /// Replace the system command executor.
    pub fn with_command_executor(mut self, executor: impl CommandExecutor + 'static) -> Self {
        self.executor = Box::new(executor);
        self
    }

    /// Build and start one component. The registry is not touched.
    ///
    /// # Errors
    ///
    /// Fails with [`AgentError::ChannelClosed`] once every registered
    /// component has released its sender, or with whatever the build or
    /// start returned.
    pub async fn create_component(&mut self, spec: ComponentSpec) -> Result<F::Component> {
        let kind = spec.kind();
        let events = self.event_sender().ok_or(AgentError::ChannelClosed)?;
        let mut component = self.factory.build(spec, events)?;
        component.start().await?;
        debug!(component = %kind, "Component started");
        Ok(component)
    }

    pub fn serial_number(&self) -> &str {
        &self.serial_number
    }

    /// Registered components in construction order.
    pub fn components(&self) -> &[F::Component] {
        &self.components
    }

    pub fn component_kinds(&self) -> Vec<ComponentKind> {
        self.components.iter().map(Component::kind).collect()
    }

    /// A submission handle for the master's event channel, or `None` once
    /// the channel has closed.
    pub fn event_sender(&self) -> Option<EventSender> {
        self.events.upgrade()
    }

    /// Whether a `restart` command has asked the dispatch loop to exit.
    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Classify one event and act on it.
    pub async fn process_event(&mut self, event: Event) {
        debug!(%event, "Processing event");
        match classify(event) {
            Route::MasterOnly(event) => self.handle_system_command(&event),
            Route::Broadcast(event) => {
                self.broadcast_event(&event).await;
            }
        }
    }

    /// Deliver `event` to every component once, in registry order.
    ///
    /// A component failing `receive` is logged and skipped. Returns how many
    /// components accepted the event.
    pub async fn broadcast_event(&mut self, event: &Event) -> usize {
        let mut delivered = 0;
        for component in &mut self.components {
            match component.receive(event).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(
                        component = %component.kind(),
                        %event,
                        error = %e,
                        "Component rejected event"
                    );
                }
            }
        }
        delivered
    }

    fn handle_system_command(&mut self, event: &Event) {
        let command = match event.text().and_then(str::parse::<SystemCommand>) {
            Ok(command) => command,
            Err(e) => {
                warn!(%event, error = %e, "Ignoring system command");
                return;
            }
        };

        info!(%command, "System command received");
        if command == SystemCommand::Restart {
            self.exit_requested = true;
            return;
        }
        if let Err(e) = self.executor.execute(command) {
            error!(%command, error = %e, "System command failed");
        }
    }

    /// Process submitted events until `shutdown` resolves, a `restart`
    /// command arrives, or the channel closes.
    ///
    /// Does not stop the components; call [`stop`](Self::stop) afterwards.
    pub async fn run_until(&mut self, shutdown: impl Future<Output = ()>) -> ExitReason {
        tokio::pin!(shutdown);

        loop {
            if self.exit_requested {
                info!("Restart requested, leaving dispatch loop");
                return ExitReason::RestartRequested;
            }

            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, leaving dispatch loop");
                    return ExitReason::Shutdown;
                }
                next = self.inbox.recv() => match next {
                    Some(event) => self.process_event(event).await,
                    None => {
                        warn!("Event channel closed, leaving dispatch loop");
                        return ExitReason::ChannelClosed;
                    }
                },
            }
        }
    }

    /// Stop every component exactly once, in registry order.
    ///
    /// Each stop is bounded; failures and timeouts are logged and the
    /// remaining components are still stopped. Calling this again is a
    /// no-op.
    pub async fn stop(&mut self) {
        if self.stopped {
            debug!("Master already stopped");
            return;
        }
        self.stopped = true;

        let bound = self.stop_timeout + STOP_GRACE;
        for component in &mut self.components {
            let kind = component.kind();
            match tokio::time::timeout(bound, component.stop()).await {
                Ok(Ok(())) => debug!(component = %kind, "Component stopped"),
                Ok(Err(e)) => {
                    error!(component = %kind, error = %e, "Component failed to stop cleanly")
                }
                Err(_) => error!(
                    component = %kind,
                    timeout_ms = bound.as_millis() as u64,
                    "Component stop timed out"
                ),
            }
        }
        info!("Master stopped");
    }
}

impl<F: ComponentFactory> Drop for Master<F> {
    fn drop(&mut self) {
        if !self.stopped {
            warn!("Master dropped without stop(), component tasks will be cancelled");
        }
    }
}

impl<F: ComponentFactory> std::fmt::Debug for Master<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Master")
            .field("serial_number", &self.serial_number)
            .field("components", &self.component_kinds())
            .field("stopped", &self.stopped)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Event::new(EventType::Beep, "ok"))]
    #[case(Event::new(EventType::AuthResult, "no"))]
    #[case(Event::new(EventType::CardData, "04ABCDEF"))]
    #[case(Event::new(987654321u32, "ABC"))]
    fn test_pass_through(#[case] event: Event) {
        assert_eq!(classify(event.clone()), Route::Broadcast(event));
    }

    #[test]
    fn test_system_command_is_master_only() {
        let event = Event::new(EventType::SystemCommand, "reboot");
        assert_eq!(classify(event.clone()), Route::MasterOnly(event));
    }

    #[rstest]
    #[case("ABC")]
    #[case("")]
    fn test_connection_not_ready_becomes_beep_error(#[case] body: &'static str) {
        assert_eq!(
            classify(Event::new(EventType::ConnectionNotReady, body)),
            Route::Broadcast(Event::new(EventType::Beep, "error"))
        );
    }
}
