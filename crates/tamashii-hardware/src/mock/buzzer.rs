//! Mock buzzer implementation for testing and development.
//!
//! The mock records every pattern it is asked to play so tests can assert on
//! the audible feedback a terminal would have given.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;

use crate::{
    Result,
    traits::{BeepPattern, BuzzerDevice},
    types::DeviceInfo,
};

/// Mock buzzer for testing and development.
///
/// # Examples
///
/// ```
/// use tamashii_hardware::mock::MockBuzzer;
/// use tamashii_hardware::traits::{BeepPattern, BuzzerDevice};
///
/// #[tokio::main]
/// async fn main() -> tamashii_hardware::Result<()> {
///     let (mut buzzer, mut handle) = MockBuzzer::new();
///
///     buzzer.play(&BeepPattern::Error).await?;
///     assert_eq!(handle.next_played().await, Some(BeepPattern::Error));
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockBuzzer {
    played_tx: mpsc::UnboundedSender<BeepPattern>,
    failing: Arc<AtomicBool>,
    name: String,
}

impl MockBuzzer {
    /// Create a new mock buzzer and its control handle.
    pub fn new() -> (Self, MockBuzzerHandle) {
        let (played_tx, played_rx) = mpsc::unbounded_channel();
        let failing = Arc::new(AtomicBool::new(false));

        let buzzer = Self {
            played_tx,
            failing: Arc::clone(&failing),
            name: "Mock Buzzer".to_string(),
        };

        (buzzer, MockBuzzerHandle { played_rx, failing })
    }
}

impl BuzzerDevice for MockBuzzer {
    async fn play(&mut self, pattern: &BeepPattern) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(crate::HardwareError::buzzer("simulated playback failure"));
        }

        // Nobody listening is fine: the handle may have been dropped
        let _ = self.played_tx.send(pattern.clone());
        Ok(())
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new(self.name.clone(), "Mock"))
    }
}

/// Handle for observing and controlling a mock buzzer.
#[derive(Debug)]
pub struct MockBuzzerHandle {
    played_rx: mpsc::UnboundedReceiver<BeepPattern>,
    failing: Arc<AtomicBool>,
}

impl MockBuzzerHandle {
    /// Wait for the next pattern played by the buzzer.
    ///
    /// Returns `None` once the buzzer has been dropped and every recorded
    /// pattern has been consumed.
    pub async fn next_played(&mut self) -> Option<BeepPattern> {
        self.played_rx.recv().await
    }

    /// Next recorded pattern, if one is already available.
    pub fn try_next_played(&mut self) -> Option<BeepPattern> {
        self.played_rx.try_recv().ok()
    }

    /// Make subsequent `play` calls fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_buzzer_records_patterns_in_order() {
        let (mut buzzer, mut handle) = MockBuzzer::new();

        buzzer.play(&BeepPattern::Ok).await.unwrap();
        buzzer.play(&BeepPattern::No).await.unwrap();

        assert_eq!(handle.try_next_played(), Some(BeepPattern::Ok));
        assert_eq!(handle.try_next_played(), Some(BeepPattern::No));
        assert_eq!(handle.try_next_played(), None);
    }

    #[tokio::test]
    async fn test_mock_buzzer_failure() {
        let (mut buzzer, mut handle) = MockBuzzer::new();

        handle.set_failing(true);
        let result = buzzer.play(&BeepPattern::Error).await;
        assert!(matches!(
            result,
            Err(crate::HardwareError::BuzzerError { .. })
        ));
        assert_eq!(handle.try_next_played(), None);

        handle.set_failing(false);
        buzzer.play(&BeepPattern::Error).await.unwrap();
        assert_eq!(handle.try_next_played(), Some(BeepPattern::Error));
    }

    #[tokio::test]
    async fn test_mock_buzzer_play_without_handle() {
        let (mut buzzer, handle) = MockBuzzer::new();
        drop(handle);

        assert!(buzzer.play(&BeepPattern::Ok).await.is_ok());
    }

    #[tokio::test]
    async fn test_next_played_ends_when_buzzer_dropped() {
        let (buzzer, mut handle) = MockBuzzer::new();
        drop(buzzer);

        assert_eq!(handle.next_played().await, None);
    }
}
