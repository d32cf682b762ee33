//! Hardware device abstraction layer for the Tamashii terminal agent.
//!
//! This crate provides trait-based abstractions for the peripherals of an
//! access terminal: the card reader and the buzzer. It also resolves the
//! board's serial number, which identifies the terminal to its manager.
//!
//! # Design Philosophy
//!
//! - **Async-first**: All device I/O is asynchronous using native `async fn`
//!   in traits (Rust 1.90 + Edition 2024 RPITIT).
//! - **Enum dispatch**: Components hold [`devices::AnyRfidDevice`] and
//!   [`devices::AnyBuzzerDevice`] instead of trait objects.
//! - **Thread-safe**: All traits require `Send + Sync` for use with Tokio.
//! - **Error-aware**: All operations return [`Result<T>`] with a
//!   [`HardwareError`].
//!
//! # Card Readers
//!
//! ```no_run
//! use tamashii_hardware::traits::RfidDevice;
//! use tamashii_hardware::error::Result;
//!
//! async fn wait_for_card<R: RfidDevice>(reader: &mut R) -> Result<String> {
//!     let card = reader.read_card().await?;
//!     Ok(card.uid_hex())
//! }
//! ```
//!
//! # Buzzers
//!
//! ```no_run
//! use tamashii_hardware::traits::{BeepPattern, BuzzerDevice};
//! use tamashii_hardware::error::Result;
//!
//! async fn signal<B: BuzzerDevice>(buzzer: &mut B, reason: &str) -> Result<()> {
//!     if let Some(pattern) = BeepPattern::from_reason(reason) {
//!         buzzer.play(&pattern).await?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Mock Implementations
//!
//! [`mock`] provides controllable card reader and buzzer doubles used by the
//! test suites and by the agent binary when no driver is configured.

pub mod devices;
pub mod error;
pub mod mock;
pub mod serial;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{HardwareError, Result};
pub use serial::{CpuInfoSerial, FixedSerial, SerialNumberSource};
pub use traits::{
    BeepPattern, BuzzerDevice, CardData, CardType, MAX_UID_LENGTH, MIN_UID_LENGTH, RfidDevice,
    Tone, parse_uid_hex,
};
pub use types::{DeviceInfo, ReaderInfo};
