//! Hardware device trait definitions.
//!
//! This module defines the contract between the agent's components and the
//! terminal peripherals: the card reader ([`RfidDevice`]) and the buzzer
//! ([`BuzzerDevice`]). Mock and real drivers implement these traits and are
//! wrapped by the enum dispatchers in [`devices`](crate::devices).
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024 RPITIT),
//! eliminating the need for the `async_trait` macro.

#![allow(async_fn_in_trait)]

use std::time::Duration;

use crate::error::Result;
use crate::types::{DeviceInfo, ReaderInfo};

/// RFID card type identification.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CardType {
    /// Mifare Classic 1K (1024 bytes).
    MifareClassic1K,

    /// Mifare Ultralight (64 bytes).
    MifareUltralight,
}

impl CardType {
    /// Get a human-readable name for the card type.
    pub fn name(&self) -> &str {
        match self {
            Self::MifareClassic1K => "Mifare Classic 1K",
            Self::MifareUltralight => "Mifare Ultralight",
        }
    }
}

/// Minimum UID length in bytes (per ISO 14443 specification).
pub const MIN_UID_LENGTH: usize = 4;

/// Maximum UID length in bytes (per ISO 14443 specification).
pub const MAX_UID_LENGTH: usize = 10;

/// RFID card data.
///
/// Contains information about a card that was read by an RFID reader,
/// including the unique identifier (UID), card type and read time.
#[derive(Debug, Clone)]
pub struct CardData {
    /// Card unique identifier (4-10 bytes).
    pub uid: Vec<u8>,

    /// Card type identification.
    pub card_type: CardType,

    /// Wall-clock time of the read.
    pub read_at: chrono::DateTime<chrono::Utc>,
}

impl CardData {
    /// Create card data stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns an error if the UID length is not within 4-10 bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use tamashii_hardware::traits::{CardData, CardType};
    ///
    /// let card = CardData::new(vec![0x04, 0xAB, 0xCD, 0xEF], CardType::MifareClassic1K).unwrap();
    /// assert_eq!(card.uid_hex(), "04ABCDEF");
    /// ```
    pub fn new(uid: Vec<u8>, card_type: CardType) -> Result<Self> {
        let uid_len = uid.len();
        if !(MIN_UID_LENGTH..=MAX_UID_LENGTH).contains(&uid_len) {
            return Err(crate::HardwareError::invalid_data(format!(
                "Card UID length must be between {} and {} bytes, got {}",
                MIN_UID_LENGTH, MAX_UID_LENGTH, uid_len
            )));
        }

        Ok(Self {
            uid,
            card_type,
            read_at: chrono::Utc::now(),
        })
    }

    /// Get the UID as an uppercase hexadecimal string.
    ///
    /// This is the form the card reader puts in `CARD_DATA` event bodies.
    pub fn uid_hex(&self) -> String {
        self.uid.iter().map(|b| format!("{:02X}", b)).collect()
    }
}

/// Parse a hexadecimal UID string (as typed by an operator or sent by a
/// manager) into raw bytes.
///
/// Whitespace and `:` separators are ignored.
///
/// # Errors
///
/// Returns an error if the string contains anything but ASCII hex digits
/// and separators, or has an odd number of digits.
///
/// # Examples
///
/// ```
/// use tamashii_hardware::traits::parse_uid_hex;
///
/// assert_eq!(parse_uid_hex("04:ab:cd:ef").unwrap(), vec![0x04, 0xAB, 0xCD, 0xEF]);
/// assert!(parse_uid_hex("ABC").is_err());
/// ```
pub fn parse_uid_hex(text: &str) -> Result<Vec<u8>> {
    let digits: Vec<u8> = text
        .bytes()
        .filter(|b| !b.is_ascii_whitespace() && *b != b':')
        .collect();

    if !digits.iter().all(u8::is_ascii_hexdigit) {
        return Err(crate::HardwareError::invalid_data(format!(
            "UID {text:?} is not hexadecimal"
        )));
    }
    if digits.len() % 2 != 0 {
        return Err(crate::HardwareError::invalid_data(format!(
            "UID {text:?} has an odd number of hex digits"
        )));
    }

    Ok(digits
        .chunks_exact(2)
        .map(|pair| (hex_value(pair[0]) << 4) | hex_value(pair[1]))
        .collect())
}

/// Value of an ASCII hex digit; callers check `is_ascii_hexdigit` first.
fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        _ => digit - b'A' + 10,
    }
}

/// RFID reader device abstraction.
///
/// # Object Safety and Dynamic Dispatch
///
/// **NOTE**: This trait is NOT object-safe because `async fn` methods return
/// `impl Future`. Use generic type parameters, or
/// [`AnyRfidDevice`](crate::devices::AnyRfidDevice) for concrete dispatch.
///
/// # Examples
///
/// ```no_run
/// use tamashii_hardware::traits::RfidDevice;
/// use tamashii_hardware::error::Result;
///
/// async fn wait_for_card<R: RfidDevice>(reader: &mut R) -> Result<String> {
///     let card = reader.read_card().await?;
///     Ok(card.uid_hex())
/// }
/// ```
pub trait RfidDevice: Send + Sync {
    /// Read a card from the reader.
    ///
    /// Blocks asynchronously until a card is presented to the reader.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The card cannot be read (communication error)
    /// - The device is disconnected
    async fn read_card(&mut self) -> Result<CardData>;

    /// Get reader information.
    async fn get_reader_info(&self) -> Result<ReaderInfo>;
}

/// One tone of a beep pattern: sound for `on`, then silence for `off`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tone {
    /// How long the buzzer sounds.
    pub on: Duration,

    /// Silence after the tone.
    pub off: Duration,
}

impl Tone {
    /// Create a tone from millisecond durations.
    pub const fn from_millis(on_ms: u64, off_ms: u64) -> Self {
        Self {
            on: Duration::from_millis(on_ms),
            off: Duration::from_millis(off_ms),
        }
    }
}

/// Sound pattern played by the buzzer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeepPattern {
    /// Accepted: one short tone.
    Ok,

    /// Rejected: three short tones.
    No,

    /// Terminal failure: two long tones.
    Error,

    /// Arbitrary tone sequence.
    Custom(Vec<Tone>),
}

const OK_TONES: [Tone; 1] = [Tone::from_millis(100, 0)];
const NO_TONES: [Tone; 3] = [
    Tone::from_millis(80, 80),
    Tone::from_millis(80, 80),
    Tone::from_millis(80, 0),
];
const ERROR_TONES: [Tone; 2] = [Tone::from_millis(500, 200), Tone::from_millis(500, 0)];

impl BeepPattern {
    /// Map a `BEEP` reason string to a pattern.
    ///
    /// Returns `None` for reasons the buzzer does not know.
    ///
    /// # Examples
    ///
    /// ```
    /// use tamashii_hardware::traits::BeepPattern;
    ///
    /// assert_eq!(BeepPattern::from_reason("error"), Some(BeepPattern::Error));
    /// assert_eq!(BeepPattern::from_reason(" OK "), Some(BeepPattern::Ok));
    /// assert_eq!(BeepPattern::from_reason("melody"), None);
    /// ```
    pub fn from_reason(reason: &str) -> Option<Self> {
        match reason.trim().to_ascii_lowercase().as_str() {
            "ok" => Some(Self::Ok),
            "no" => Some(Self::No),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Tones making up this pattern.
    pub fn tones(&self) -> &[Tone] {
        match self {
            Self::Ok => &OK_TONES,
            Self::No => &NO_TONES,
            Self::Error => &ERROR_TONES,
            Self::Custom(tones) => tones,
        }
    }

    /// Total playback time of the pattern.
    pub fn duration(&self) -> Duration {
        self.tones().iter().map(|t| t.on + t.off).sum()
    }
}

/// Buzzer device abstraction.
///
/// Same dispatch rules as [`RfidDevice`]: use generics or
/// [`AnyBuzzerDevice`](crate::devices::AnyBuzzerDevice).
pub trait BuzzerDevice: Send + Sync {
    /// Play a pattern, returning once playback has finished.
    ///
    /// # Errors
    ///
    /// Returns an error if the device is disconnected or rejects the pattern.
    async fn play(&mut self, pattern: &BeepPattern) -> Result<()>;

    /// Get device information.
    async fn get_info(&self) -> Result<DeviceInfo>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_card_data_uid_hex() {
        let card = CardData::new(vec![0x04, 0xAB, 0xCD, 0xEF], CardType::MifareClassic1K).unwrap();
        assert_eq!(card.uid_hex(), "04ABCDEF");
    }

    #[rstest]
    #[case(vec![])]
    #[case(vec![0x01, 0x02, 0x03])]
    #[case(vec![0u8; 11])]
    fn test_card_data_rejects_bad_uid_length(#[case] uid: Vec<u8>) {
        let result = CardData::new(uid, CardType::MifareClassic1K);
        assert!(matches!(
            result,
            Err(crate::HardwareError::InvalidData { .. })
        ));
    }

    #[test]
    fn test_card_data_stamped_at_read() {
        let before = chrono::Utc::now();
        let card = CardData::new(vec![1, 2, 3, 4], CardType::MifareUltralight).unwrap();
        assert!(card.read_at >= before && card.read_at <= chrono::Utc::now());
        assert_eq!(card.card_type.name(), "Mifare Ultralight");
    }

    #[rstest]
    #[case("04ABCDEF", vec![0x04, 0xAB, 0xCD, 0xEF])]
    #[case("04 ab cd ef", vec![0x04, 0xAB, 0xCD, 0xEF])]
    #[case("de:ad:be:ef:00", vec![0xDE, 0xAD, 0xBE, 0xEF, 0x00])]
    #[case("\t0a1B2c3D\n", vec![0x0A, 0x1B, 0x2C, 0x3D])]
    fn test_parse_uid_hex(#[case] input: &str, #[case] expected: Vec<u8>) {
        assert_eq!(parse_uid_hex(input).unwrap(), expected);
    }

    #[rstest]
    #[case("ABC")]
    #[case("ZZ11")]
    #[case("aéb")]
    #[case("éé")]
    #[case("04AB\u{00A0}CD")]
    #[case("+1-2")]
    fn test_parse_uid_hex_invalid(#[case] input: &str) {
        assert!(matches!(
            parse_uid_hex(input),
            Err(crate::HardwareError::InvalidData { .. })
        ));
    }

    #[test]
    fn test_beep_pattern_tones() {
        assert_eq!(BeepPattern::Ok.tones().len(), 1);
        assert_eq!(BeepPattern::No.tones().len(), 3);
        assert_eq!(BeepPattern::Error.tones().len(), 2);
        assert_eq!(BeepPattern::Error.duration(), Duration::from_millis(1200));
    }

    #[test]
    fn test_beep_pattern_custom() {
        let pattern = BeepPattern::Custom(vec![Tone::from_millis(10, 20)]);
        assert_eq!(pattern.duration(), Duration::from_millis(30));
    }
}
