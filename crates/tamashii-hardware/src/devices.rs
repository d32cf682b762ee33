//! Enum wrappers for hardware device dispatch.
//!
//! Native `async fn` in traits is not object-safe, so `Box<dyn RfidDevice>`
//! is not available. These enums give the components a concrete type to hold
//! while still dispatching through the device traits. Real drivers are added
//! as new variants.
//!
//! # Examples
//!
//! ```
//! use tamashii_hardware::devices::AnyRfidDevice;
//! use tamashii_hardware::mock::MockRfid;
//!
//! let (reader, _handle) = MockRfid::new();
//! let any_reader = AnyRfidDevice::Mock(reader);
//! ```

use crate::mock::{MockBuzzer, MockRfid};
use crate::traits::{BeepPattern, BuzzerDevice, CardData, RfidDevice};
use crate::{DeviceInfo, ReaderInfo, Result};

/// Enum wrapper for RFID reader device dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyRfidDevice {
    /// Mock RFID reader for development and testing.
    Mock(MockRfid),
}

impl RfidDevice for AnyRfidDevice {
    async fn read_card(&mut self) -> Result<CardData> {
        match self {
            Self::Mock(device) => device.read_card().await,
        }
    }

    async fn get_reader_info(&self) -> Result<ReaderInfo> {
        match self {
            Self::Mock(device) => device.get_reader_info().await,
        }
    }
}

/// Enum wrapper for buzzer device dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyBuzzerDevice {
    /// Mock buzzer for development and testing.
    Mock(MockBuzzer),
}

impl BuzzerDevice for AnyBuzzerDevice {
    async fn play(&mut self, pattern: &BeepPattern) -> Result<()> {
        match self {
            Self::Mock(device) => device.play(pattern).await,
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        match self {
            Self::Mock(device) => device.get_info().await,
        }
    }
}
