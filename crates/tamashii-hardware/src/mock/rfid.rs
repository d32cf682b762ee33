//! Mock RFID reader implementation for testing and development.
//!
//! This module provides a simulated RFID reader that can be controlled
//! programmatically for testing without requiring physical hardware.

use crate::{
    Result,
    traits::{CardData, CardType, RfidDevice},
    types::ReaderInfo,
};
use std::collections::HashMap;
use tokio::sync::mpsc;

/// Mock RFID reader for testing and development.
///
/// This device simulates an RFID/NFC card reader by maintaining a database
/// of cards that can be programmatically presented to the reader.
///
/// # Examples
///
/// ```
/// use tamashii_hardware::mock::MockRfid;
/// use tamashii_hardware::traits::{RfidDevice, CardType};
///
/// #[tokio::main]
/// async fn main() -> tamashii_hardware::Result<()> {
///     let (mut reader, mut handle) = MockRfid::new();
///
///     let card_uid = vec![0x04, 0xAB, 0xCD, 0xEF];
///     handle.add_card(card_uid.clone(), CardType::MifareClassic1K);
///     handle.present_card(card_uid).await?;
///
///     let card = reader.read_card().await?;
///     assert_eq!(card.uid_hex(), "04ABCDEF");
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockRfid {
    /// Channel receiver for card events
    event_rx: mpsc::Receiver<CardEvent>,

    /// Device name
    name: String,
}

impl MockRfid {
    /// Create a new mock RFID reader with the default name.
    ///
    /// Returns the reader and a handle used to simulate card presentations.
    pub fn new() -> (Self, MockRfidHandle) {
        Self::with_name("Mock RFID Reader".to_string())
    }

    /// Create a new mock RFID reader with a custom name.
    pub fn with_name(name: String) -> (Self, MockRfidHandle) {
        let (event_tx, event_rx) = mpsc::channel(32);

        let reader = Self { event_rx, name };

        let handle = MockRfidHandle {
            event_tx,
            cards: HashMap::new(),
        };

        (reader, handle)
    }
}

impl RfidDevice for MockRfid {
    async fn read_card(&mut self) -> Result<CardData> {
        let event = self
            .event_rx
            .recv()
            .await
            .ok_or_else(|| crate::HardwareError::disconnected("RFID event channel closed"))?;

        match event {
            CardEvent::CardPresented(card) => Ok(card),
            CardEvent::ReadFailure(message) => Err(crate::HardwareError::card_read(message)),
        }
    }

    async fn get_reader_info(&self) -> Result<ReaderInfo> {
        Ok(ReaderInfo::new(self.name.clone(), vec!["ISO14443A".to_string()])
            .with_max_baud_rate(424000))
    }
}

/// Internal event type for mock RFID reader.
#[derive(Debug, Clone)]
enum CardEvent {
    CardPresented(CardData),
    ReadFailure(String),
}

/// Handle for controlling a mock RFID reader.
///
/// Manages a card database and simulates card presentations and read
/// failures.
#[derive(Debug, Clone)]
pub struct MockRfidHandle {
    /// Channel sender for card events
    event_tx: mpsc::Sender<CardEvent>,

    /// Card database (UID -> CardType)
    cards: HashMap<Vec<u8>, CardType>,
}

impl MockRfidHandle {
    /// Add a card to the reader's database.
    pub fn add_card(&mut self, uid: Vec<u8>, card_type: CardType) {
        self.cards.insert(uid, card_type);
    }

    /// Present a card to the reader.
    ///
    /// The card must have been previously added with `add_card()`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The card UID is not in the database
    /// - The reader has been dropped and the channel is closed
    pub async fn present_card(&mut self, uid: Vec<u8>) -> Result<()> {
        let card_type = self
            .cards
            .get(&uid)
            .ok_or_else(|| {
                crate::HardwareError::invalid_data(format!("Card {:02X?} not in database", uid))
            })?
            .clone();

        let card = CardData::new(uid, card_type)?;

        self.event_tx
            .send(CardEvent::CardPresented(card))
            .await
            .map_err(|_| crate::HardwareError::disconnected("RFID event channel closed"))
    }

    /// Make the reader's next `read_card` fail with a card read error.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped.
    pub async fn fail_next_read(&mut self, message: impl Into<String>) -> Result<()> {
        self.event_tx
            .send(CardEvent::ReadFailure(message.into()))
            .await
            .map_err(|_| crate::HardwareError::disconnected("RFID event channel closed"))
    }
}
