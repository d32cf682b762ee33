//! Enum wrapper for component dispatch.
//!
//! [`Component`] uses native `async fn` and cannot be boxed, so the master's
//! registry holds this enum when running with real components.

use tamashii_core::Event;

use crate::Result;
use crate::component::{Component, ComponentKind};
use crate::components::{Buzzer, CardReader, Connection};

/// Any component the hardware factory builds.
#[derive(Debug)]
pub enum AnyComponent {
    Connection(Connection),
    Buzzer(Buzzer),
    CardReader(CardReader),
}

impl Component for AnyComponent {
    fn kind(&self) -> ComponentKind {
        match self {
            Self::Connection(c) => c.kind(),
            Self::Buzzer(c) => c.kind(),
            Self::CardReader(c) => c.kind(),
        }
    }

    async fn start(&mut self) -> Result<()> {
        match self {
            Self::Connection(c) => c.start().await,
            Self::Buzzer(c) => c.start().await,
            Self::CardReader(c) => c.start().await,
        }
    }

    async fn stop(&mut self) -> Result<()> {
        match self {
            Self::Connection(c) => c.stop().await,
            Self::Buzzer(c) => c.stop().await,
            Self::CardReader(c) => c.stop().await,
        }
    }

    async fn receive(&mut self, event: &Event) -> Result<()> {
        match self {
            Self::Connection(c) => c.receive(event).await,
            Self::Buzzer(c) => c.receive(event).await,
            Self::CardReader(c) => c.receive(event).await,
        }
    }
}

impl From<Connection> for AnyComponent {
    fn from(component: Connection) -> Self {
        Self::Connection(component)
    }
}

impl From<Buzzer> for AnyComponent {
    fn from(component: Buzzer) -> Self {
        Self::Buzzer(component)
    }
}

impl From<CardReader> for AnyComponent {
    fn from(component: CardReader) -> Self {
        Self::CardReader(component)
    }
}
