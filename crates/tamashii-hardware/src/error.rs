//! Error types for hardware operations.
//!
//! Covers the failures a terminal peripheral can report: a driver that went
//! away, a bad read or playback, malformed card data, and a serial number
//! that cannot be resolved.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during hardware device operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Device is not connected or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Invalid data received from device.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Card reading error.
    #[error("Card read error: {message}")]
    CardReadError { message: String },

    /// Buzzer playback error.
    #[error("Buzzer error: {message}")]
    BuzzerError { message: String },

    /// The device serial number could not be determined.
    #[error("Serial number unavailable: {reason}")]
    SerialUnavailable { reason: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Create a new card read error.
    pub fn card_read(message: impl Into<String>) -> Self {
        Self::CardReadError {
            message: message.into(),
        }
    }

    /// Create a new buzzer error.
    pub fn buzzer(message: impl Into<String>) -> Self {
        Self::BuzzerError {
            message: message.into(),
        }
    }

    /// Create a new serial number unavailable error.
    pub fn serial_unavailable(reason: impl Into<String>) -> Self {
        Self::SerialUnavailable {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnected_error() {
        let error = HardwareError::disconnected("MFRC522");
        assert!(matches!(error, HardwareError::Disconnected { .. }));
        assert_eq!(error.to_string(), "Device disconnected: MFRC522");
    }

    #[test]
    fn test_buzzer_error() {
        let error = HardwareError::buzzer("PWM channel busy");
        assert_eq!(error.to_string(), "Buzzer error: PWM channel busy");
    }

    #[test]
    fn test_card_read_error() {
        let error = HardwareError::card_read("antenna fault");
        assert!(matches!(error, HardwareError::CardReadError { .. }));
        assert_eq!(error.to_string(), "Card read error: antenna fault");
    }

    #[test]
    fn test_serial_unavailable_error() {
        let error = HardwareError::serial_unavailable("no Serial line in /proc/cpuinfo");
        assert!(matches!(error, HardwareError::SerialUnavailable { .. }));
        assert_eq!(
            error.to_string(),
            "Serial number unavailable: no Serial line in /proc/cpuinfo"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error: HardwareError = io.into();
        assert!(matches!(error, HardwareError::Io(_)));
    }
}
