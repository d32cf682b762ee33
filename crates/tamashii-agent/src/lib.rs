//! Terminal agent for Tamashii access terminals.
//!
//! The [`Master`] owns three components:
//!
//! - [`Connection`](components::Connection): the link to the remote manager
//! - [`Buzzer`](components::Buzzer): audible feedback
//! - [`CardReader`](components::CardReader): card detection
//!
//! Components submit [`Event`](tamashii_core::Event)s through an
//! [`EventSender`]; the master classifies each one and either handles it
//! itself (system commands) or broadcasts it back to every component.
//!
//! # Architecture
//!
//! ```text
//!                 ┌──────────────── Master ────────────────┐
//!   submit ──────▶│ inbox ─▶ classify ─▶ broadcast (order) │
//!                 └──────┬──────────────┬──────────────┬───┘
//!                        ▼              ▼              ▼
//!                   Connection        Buzzer       CardReader
//!                   (TcpClient)   (AnyBuzzerDevice) (AnyRfidDevice)
//! ```

pub mod any;
pub mod component;
pub mod components;
pub mod config;
pub mod error;
pub mod factory;
pub mod master;
pub mod system;

pub use any::AnyComponent;
pub use component::{
    Component, ComponentKind, ComponentSpec, EventSender, WeakEventSender, event_channel,
};
pub use config::MasterConfig;
pub use error::{AgentError, Result};
pub use factory::{ComponentFactory, HardwareFactory};
pub use master::{ExitReason, Master};
pub use system::{CommandExecutor, DisabledExecutor, ShellExecutor};
