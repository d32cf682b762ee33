//! Event value type exchanged between the master and its components.
//!
//! An [`Event`] is an immutable pair of a numeric classification code and an
//! opaque payload. The codes the master interprets are modelled by
//! [`EventType`]; every other code is carried verbatim in
//! [`EventType::Other`] so unknown traffic passes through untouched.
//!
//! # Examples
//!
//! ```
//! use tamashii_core::{Event, EventType};
//!
//! let beep = Event::new(EventType::Beep, "error");
//! assert_eq!(beep.code(), 1);
//! assert_eq!(beep.body_str(), Some("error"));
//!
//! let custom = Event::new(987654321u32, "ABC");
//! assert_eq!(custom.event_type(), EventType::Other(987654321));
//! ```

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::constants::{
    EVENT_AUTH_RESULT, EVENT_BEEP, EVENT_CARD_DATA, EVENT_CONNECTION_NOT_READY,
    EVENT_SYSTEM_COMMAND,
};
use crate::error::{Error, Result};

/// Classification of an event.
///
/// Equality and hashing go through [`code`](Self::code), so
/// `EventType::Other(1)` equals `EventType::Beep`. Use
/// [`from_code`](Self::from_code) to get the canonical variant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum EventType {
    /// Buzzer feedback request.
    Beep,

    /// Authentication verdict from the manager.
    AuthResult,

    /// Card UID read by the card reader.
    CardData,

    /// Command addressed to the master itself.
    SystemCommand,

    /// Manager link was not ready for an outward event.
    ConnectionNotReady,

    /// Any code the master does not interpret.
    Other(u32),
}

impl EventType {
    /// Map a raw code to its canonical variant.
    pub fn from_code(code: u32) -> Self {
        match code {
            EVENT_BEEP => Self::Beep,
            EVENT_AUTH_RESULT => Self::AuthResult,
            EVENT_CARD_DATA => Self::CardData,
            EVENT_SYSTEM_COMMAND => Self::SystemCommand,
            EVENT_CONNECTION_NOT_READY => Self::ConnectionNotReady,
            other => Self::Other(other),
        }
    }

    /// Raw wire code.
    pub fn code(&self) -> u32 {
        match self {
            Self::Beep => EVENT_BEEP,
            Self::AuthResult => EVENT_AUTH_RESULT,
            Self::CardData => EVENT_CARD_DATA,
            Self::SystemCommand => EVENT_SYSTEM_COMMAND,
            Self::ConnectionNotReady => EVENT_CONNECTION_NOT_READY,
            Self::Other(code) => *code,
        }
    }

    /// Events of this type are consumed by the master and never broadcast.
    pub fn is_master_only(&self) -> bool {
        matches!(Self::from_code(self.code()), Self::SystemCommand)
    }

    /// Events of this type are sent to the manager by the connection.
    pub fn is_outbound(&self) -> bool {
        matches!(Self::from_code(self.code()), Self::CardData)
    }
}

impl PartialEq for EventType {
    fn eq(&self, other: &Self) -> bool {
        self.code() == other.code()
    }
}

impl Eq for EventType {}

impl Hash for EventType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code().hash(state);
    }
}

impl From<u32> for EventType {
    fn from(code: u32) -> Self {
        Self::from_code(code)
    }
}

impl From<EventType> for u32 {
    fn from(event_type: EventType) -> Self {
        event_type.code()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match Self::from_code(self.code()) {
            Self::Beep => write!(f, "BEEP"),
            Self::AuthResult => write!(f, "AUTH_RESULT"),
            Self::CardData => write!(f, "CARD_DATA"),
            Self::SystemCommand => write!(f, "SYSTEM_COMMAND"),
            Self::ConnectionNotReady => write!(f, "CONNECTION_NOT_READY"),
            Self::Other(code) => write!(f, "{code}"),
        }
    }
}

/// Immutable event: classification plus opaque payload.
///
/// Cloning is cheap; the body is reference counted, so broadcasting one event
/// to many components shares a single buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Event {
    event_type: EventType,
    body: Bytes,
}

impl Event {
    /// Create an event from a type (or raw code) and a body.
    pub fn new(event_type: impl Into<EventType>, body: impl Into<Bytes>) -> Self {
        let event_type = EventType::from_code(event_type.into().code());
        Self {
            event_type,
            body: body.into(),
        }
    }

    /// Canonical classification of this event.
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// Raw wire code.
    pub fn code(&self) -> u32 {
        self.event_type.code()
    }

    /// Raw payload.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Payload as shared bytes.
    pub fn body_bytes(&self) -> Bytes {
        self.body.clone()
    }

    /// Payload as text, if it is valid UTF-8.
    pub fn body_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    /// Payload as text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NonUtf8Body`] if the payload is not valid UTF-8.
    pub fn text(&self) -> Result<&str> {
        self.body_str().ok_or(Error::NonUtf8Body)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.body_str() {
            Some(text) => write!(f, "{}({text:?})", self.event_type),
            None => write!(f, "{}(<{} bytes>)", self.event_type, self.body.len()),
        }
    }
}
