//! End-to-end flows through the real components.
//!
//! The master runs with the hardware factory over mock devices, against a
//! local listener playing the manager. Each scenario runs as the shutdown
//! future of `run_until`, so the master dispatches while the scenario drives
//! the devices and the manager socket.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tamashii_agent::{ExitReason, HardwareFactory, Master, MasterConfig};
use tamashii_core::{Event, EventType};
use tamashii_hardware::devices::{AnyBuzzerDevice, AnyRfidDevice};
use tamashii_hardware::mock::{MockBuzzer, MockBuzzerHandle, MockRfid, MockRfidHandle};
use tamashii_hardware::{BeepPattern, CardType, FixedSerial};
use tamashii_network::EventCodec;
use tokio::net::TcpListener;
use tokio_util::codec::Framed;

const UID: [u8; 4] = [0x04, 0xAB, 0xCD, 0xEF];

async fn terminal(port: u16) -> (Master, MockRfidHandle, MockBuzzerHandle) {
    let (rfid, mut rfid_handle) = MockRfid::new();
    let (buzzer, buzzer_handle) = MockBuzzer::new();
    rfid_handle.add_card(UID.to_vec(), CardType::MifareClassic1K);

    let config = MasterConfig {
        io_timeout_ms: 200,
        reconnect_interval_ms: 50,
        stop_timeout_ms: 1000,
        ..MasterConfig::new("127.0.0.1", port)
    };
    let factory = HardwareFactory::new(AnyRfidDevice::Mock(rfid), AnyBuzzerDevice::Mock(buzzer));
    let master = Master::new(config, &FixedSerial::new("Test"), factory)
        .await
        .unwrap();

    (master, rfid_handle, buzzer_handle)
}

#[tokio::test]
async fn test_card_is_authorized_by_manager() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let (mut master, mut rfid, mut buzzer) = terminal(port).await;

    let scenario = async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut manager = Framed::new(stream, EventCodec::new());
        // Let the link task mark the connection ready
        tokio::time::sleep(Duration::from_millis(100)).await;

        rfid.present_card(UID.to_vec()).await.unwrap();
        let forwarded = manager.next().await.unwrap().unwrap();
        assert_eq!(forwarded, Event::new(EventType::CardData, "04ABCDEF"));

        manager
            .send(Event::new(EventType::AuthResult, "ok"))
            .await
            .unwrap();
        assert_eq!(buzzer.next_played().await, Some(BeepPattern::Ok));

        manager
            .send(Event::new(EventType::Beep, "no"))
            .await
            .unwrap();
        assert_eq!(buzzer.next_played().await, Some(BeepPattern::No));
    };

    let reason = tokio::time::timeout(Duration::from_secs(5), master.run_until(scenario))
        .await
        .unwrap();
    assert_eq!(reason, ExitReason::Shutdown);

    master.stop().await;
}

#[tokio::test]
async fn test_card_without_manager_beeps_error() {
    // Reserve a port, then close it so nothing answers
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let (mut master, mut rfid, mut buzzer) = terminal(port).await;

    let scenario = async move {
        rfid.present_card(UID.to_vec()).await.unwrap();
        assert_eq!(buzzer.next_played().await, Some(BeepPattern::Error));
    };

    let reason = tokio::time::timeout(Duration::from_secs(5), master.run_until(scenario))
        .await
        .unwrap();
    assert_eq!(reason, ExitReason::Shutdown);

    master.stop().await;
}

#[tokio::test]
async fn test_restart_command_from_manager_ends_dispatch() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let (mut master, _rfid, mut buzzer) = terminal(port).await;

    let manager = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut manager = Framed::new(stream, EventCodec::new());
        manager
            .send(Event::new(EventType::SystemCommand, "restart"))
            .await
            .unwrap();
        // Hold the socket until the agent goes away
        let _ = manager.next().await;
    });

    let reason = tokio::time::timeout(
        Duration::from_secs(5),
        master.run_until(std::future::pending()),
    )
    .await
    .unwrap();
    assert_eq!(reason, ExitReason::RestartRequested);
    assert_eq!(buzzer.try_next_played(), None);

    master.stop().await;
    manager.await.unwrap();
}
