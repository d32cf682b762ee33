//! The component contract and the plumbing components share.
//!
//! A component is started once, receives every broadcast event on the
//! master's task, and is stopped once. Anything slow happens on the
//! component's own [`BackgroundTask`]; results flow back to the master
//! through an [`EventSender`].

#![allow(async_fn_in_trait)]

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use tamashii_core::Event;

use crate::components::{BuzzerConfig, CardReaderConfig, ConnectionConfig};
use crate::{AgentError, Result};

/// The kinds of component the master creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Connection,
    Buzzer,
    CardReader,
}

impl ComponentKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connection => "Connection",
            Self::Buzzer => "Buzzer",
            Self::CardReader => "CardReader",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything a factory needs to build one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentSpec {
    Connection(ConnectionConfig),
    Buzzer(BuzzerConfig),
    CardReader(CardReaderConfig),
}

impl ComponentSpec {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::Connection(_) => ComponentKind::Connection,
            Self::Buzzer(_) => ComponentKind::Buzzer,
            Self::CardReader(_) => ComponentKind::CardReader,
        }
    }
}

/// A unit managed by the master.
///
/// # Object Safety
///
/// Like the device traits this uses native `async fn`, so it is not
/// object-safe. The master is generic over its factory's component type;
/// [`AnyComponent`](crate::AnyComponent) is the concrete dispatch enum.
pub trait Component: Send {
    /// Which kind of component this is.
    fn kind(&self) -> ComponentKind;

    /// Start background work.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::AlreadyStarted`] on a second call, or any error
    /// that prevents the component from running.
    async fn start(&mut self) -> Result<()>;

    /// Stop background work. Stopping a component that is not running is a
    /// no-op.
    async fn stop(&mut self) -> Result<()>;

    /// Handle one broadcast event.
    ///
    /// Runs on the master's task, so it must not wait on the master's event
    /// channel.
    async fn receive(&mut self, event: &Event) -> Result<()>;
}

/// Submission side of the master's event channel.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::Sender<Event>,
}

/// Create the master's event channel.
pub fn event_channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender { tx }, rx)
}

impl EventSender {
    /// Submit an event, waiting for channel capacity.
    pub async fn submit(&self, event: Event) -> Result<()> {
        self.tx
            .send(event)
            .await
            .map_err(|_| AgentError::ChannelClosed)
    }

    /// Submit without waiting. Used from `receive`, which runs on the task
    /// that drains the channel.
    pub fn try_submit(&self, event: Event) -> Result<()> {
        match self.tx.try_send(event) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(event)) => {
                warn!(%event, "Event channel full, dropping event");
                Err(AgentError::ChannelFull)
            }
            Err(TrySendError::Closed(_)) => Err(AgentError::ChannelClosed),
        }
    }

    /// Submit unless `shutdown` fires first.
    ///
    /// Returns `false` when the calling task should exit: either shutdown
    /// was signalled or the master is gone.
    pub async fn submit_or_shutdown(
        &self,
        event: Event,
        shutdown: &mut watch::Receiver<bool>,
    ) -> bool {
        tokio::select! {
            _ = shutdown.changed() => false,
            result = self.submit(event) => result.is_ok(),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// A handle that does not keep the channel open.
    pub fn downgrade(&self) -> WeakEventSender {
        WeakEventSender {
            tx: self.tx.downgrade(),
        }
    }
}

/// Non-owning submission handle. The channel closes once every
/// [`EventSender`] is dropped, regardless of how many of these exist.
#[derive(Debug, Clone)]
pub struct WeakEventSender {
    tx: mpsc::WeakSender<Event>,
}

impl WeakEventSender {
    /// A strong sender, or `None` once the channel has closed.
    pub fn upgrade(&self) -> Option<EventSender> {
        self.tx.upgrade().map(|tx| EventSender { tx })
    }
}

/// A spawned task with a shutdown signal.
///
/// The task receives a `watch::Receiver<bool>`; `changed()` resolving (or
/// erroring because the sender was dropped) means "exit now".
#[derive(Debug)]
pub struct BackgroundTask {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl BackgroundTask {
    pub fn spawn<F, Fut>(task: F) -> Self
    where
        F: FnOnce(watch::Receiver<bool>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (shutdown, rx) = watch::channel(false);
        let handle = tokio::spawn(task(rx));
        Self { shutdown, handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Signal the task and wait up to `timeout` for it to finish.
    ///
    /// A task still running after `timeout` is aborted and
    /// [`AgentError::StopTimeout`] is returned.
    pub async fn stop(self, component: ComponentKind, timeout: Duration) -> Result<()> {
        let Self {
            shutdown,
            mut handle,
        } = self;
        // The task may already have exited and dropped its receiver
        let _ = shutdown.send(true);

        match tokio::time::timeout(timeout, &mut handle).await {
            Ok(Ok(())) => {
                debug!(component = %component, "Background task finished");
                Ok(())
            }
            Ok(Err(e)) if e.is_panic() => Err(AgentError::component(
                component,
                format!("background task panicked: {e}"),
            )),
            Ok(Err(_)) => Ok(()),
            Err(_) => {
                warn!(
                    component = %component,
                    timeout_ms = timeout.as_millis() as u64,
                    "Background task did not stop in time, aborting"
                );
                handle.abort();
                Err(AgentError::StopTimeout {
                    component,
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        }
    }
}
