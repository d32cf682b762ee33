//! Mock device implementations for testing and development.
//!
//! This module provides simulated device implementations that can be controlled
//! programmatically without requiring physical hardware.

pub mod buzzer;
pub mod rfid;

pub use buzzer::{MockBuzzer, MockBuzzerHandle};
pub use rfid::{MockRfid, MockRfidHandle};
