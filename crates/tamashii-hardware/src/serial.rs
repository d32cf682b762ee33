//! Device serial number discovery.
//!
//! The agent identifies itself to the manager by the board's hardware serial
//! number. On Raspberry Pi class boards the kernel exposes it as the `Serial`
//! line of `/proc/cpuinfo`.
//!
//! # Examples
//!
//! ```
//! use tamashii_hardware::serial::{FixedSerial, SerialNumberSource};
//!
//! let source = FixedSerial::new("00000000a1b2c3d4");
//! assert_eq!(source.serial_number().unwrap(), "00000000a1b2c3d4");
//! ```

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{HardwareError, Result};

/// Default location of the CPU information file.
pub const CPUINFO_PATH: &str = "/proc/cpuinfo";

/// Source of the device's hardware serial number.
pub trait SerialNumberSource {
    /// Resolve the serial number.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::SerialUnavailable`] (or an I/O error) when the
    /// serial number cannot be determined.
    fn serial_number(&self) -> Result<String>;
}

/// Reads the serial number from a cpuinfo-formatted file.
#[derive(Debug, Clone)]
pub struct CpuInfoSerial {
    path: PathBuf,
}

impl CpuInfoSerial {
    /// Read from `/proc/cpuinfo`.
    pub fn new() -> Self {
        Self::with_path(CPUINFO_PATH)
    }

    /// Read from a custom path.
    pub fn with_path(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl Default for CpuInfoSerial {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialNumberSource for CpuInfoSerial {
    fn serial_number(&self) -> Result<String> {
        let contents = std::fs::read_to_string(&self.path)?;
        let serial = parse_cpuinfo_serial(&contents).ok_or_else(|| {
            HardwareError::serial_unavailable(format!(
                "no Serial line in {}",
                self.path.display()
            ))
        })?;

        debug!(path = %self.path.display(), serial = %serial, "Resolved serial number");
        Ok(serial)
    }
}

/// A serial number supplied by configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedSerial(String);

impl FixedSerial {
    /// Wrap a fixed serial number.
    pub fn new(serial: impl Into<String>) -> Self {
        Self(serial.into())
    }
}

impl SerialNumberSource for FixedSerial {
    fn serial_number(&self) -> Result<String> {
        let serial = self.0.trim();
        if serial.is_empty() {
            return Err(HardwareError::serial_unavailable(
                "configured serial number is empty",
            ));
        }
        Ok(serial.to_string())
    }
}

/// Extract the value of the `Serial` key from cpuinfo text.
///
/// Keys are matched case-sensitively and surrounding whitespace is ignored.
/// An empty value counts as missing.
pub fn parse_cpuinfo_serial(contents: &str) -> Option<String> {
    contents.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        if key.trim() != "Serial" {
            return None;
        }
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PI_CPUINFO: &str = "processor\t: 0\n\
        model name\t: ARMv7 Processor rev 4 (v7l)\n\
        BogoMIPS\t: 38.40\n\
        \n\
        Hardware\t: BCM2835\n\
        Revision\t: a02082\n\
        Serial\t\t: 00000000a1b2c3d4\n\
        Model\t\t: Raspberry Pi 3 Model B Rev 1.2\n";

    #[test]
    fn test_parse_cpuinfo_serial() {
        assert_eq!(
            parse_cpuinfo_serial(PI_CPUINFO).as_deref(),
            Some("00000000a1b2c3d4")
        );
    }

    #[test]
    fn test_parse_cpuinfo_without_serial() {
        assert_eq!(parse_cpuinfo_serial("processor\t: 0\nflags\t: fpu\n"), None);
        assert_eq!(parse_cpuinfo_serial("Serial\t: \n"), None);
        assert_eq!(parse_cpuinfo_serial(""), None);
    }

    #[test]
    fn test_cpuinfo_serial_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(PI_CPUINFO.as_bytes()).unwrap();

        let source = CpuInfoSerial::with_path(file.path());
        assert_eq!(source.serial_number().unwrap(), "00000000a1b2c3d4");
    }

    #[test]
    fn test_cpuinfo_serial_missing_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"processor\t: 0\n").unwrap();

        let source = CpuInfoSerial::with_path(file.path());
        assert!(matches!(
            source.serial_number(),
            Err(HardwareError::SerialUnavailable { .. })
        ));
    }

    #[test]
    fn test_cpuinfo_serial_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = CpuInfoSerial::with_path(dir.path().join("cpuinfo"));
        assert!(matches!(source.serial_number(), Err(HardwareError::Io(_))));
    }

    #[test]
    fn test_fixed_serial() {
        assert_eq!(FixedSerial::new(" Test ").serial_number().unwrap(), "Test");
        assert!(FixedSerial::new("   ").serial_number().is_err());
    }
}
