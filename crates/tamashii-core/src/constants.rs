//! Core constants for the Tamashii terminal agent.
//!
//! Event type codes travel over the manager link as raw integers, so the
//! values in this module are part of the wire contract with the remote
//! manager. Do not renumber them.
//!
//! # Usage
//!
//! ```
//! use tamashii_core::constants::*;
//!
//! assert_eq!(EVENT_BEEP, 1);
//! assert_eq!(EVENT_SYSTEM_COMMAND, 4);
//!
//! use std::time::Duration;
//! let timeout = Duration::from_millis(DEFAULT_STOP_TIMEOUT_MS);
//! assert_eq!(timeout.as_secs(), 5);
//! ```

// ============================================================================
// Event Type Codes
// ============================================================================

/// Feedback instruction for the buzzer. Body is a reason string
/// (`ok`, `no`, `error`).
pub const EVENT_BEEP: u32 = 1;

/// Authentication verdict returned by the manager for a card read.
pub const EVENT_AUTH_RESULT: u32 = 2;

/// Card UID sensed by the card reader.
pub const EVENT_CARD_DATA: u32 = 3;

/// Command for the agent itself (poweroff, reboot, restart, update).
///
/// Handled by the master only, never broadcast to components.
pub const EVENT_SYSTEM_COMMAND: u32 = 4;

/// The manager link was not ready when an outward event had to be sent.
pub const EVENT_CONNECTION_NOT_READY: u32 = 5;

// ============================================================================
// Beep Reasons
// ============================================================================

/// Beep reason for an accepted action.
pub const BEEP_OK: &str = "ok";

/// Beep reason for a rejected action.
pub const BEEP_NO: &str = "no";

/// Beep reason for a failure inside the terminal.
pub const BEEP_ERROR: &str = "error";

// ============================================================================
// Manager Link
// ============================================================================

/// Default manager port.
pub const DEFAULT_MANAGER_PORT: u16 = 3000;

/// Default timeout for connect/send/recv on the manager link, in milliseconds.
pub const DEFAULT_IO_TIMEOUT_MS: u64 = 3000;

/// Delay between reconnect attempts to the manager, in milliseconds.
pub const DEFAULT_RECONNECT_INTERVAL_MS: u64 = 3000;

/// Maximum event body carried in one frame (64 KiB).
pub const MAX_EVENT_BODY: usize = 64 * 1024;

/// Frame header: type code (u32) followed by body length (u32).
pub const FRAME_HEADER_LEN: usize = 8;

// ============================================================================
// Master
// ============================================================================

/// Capacity of the channel components use to submit events to the master.
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 100;

/// Upper bound for stopping one component, in milliseconds.
pub const DEFAULT_STOP_TIMEOUT_MS: u64 = 5000;

/// Window in which the same card read twice is reported once, in milliseconds.
pub const DEFAULT_CARD_DEBOUNCE_MS: u64 = 1000;
