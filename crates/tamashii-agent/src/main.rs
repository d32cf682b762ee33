//! Tamashii terminal agent entry point.
//!
//! Runs the master against mock peripherals. Card UIDs typed on stdin (hex,
//! one per line) are presented to the mock reader, and every pattern the
//! mock buzzer plays is logged, so a terminal can be exercised end to end
//! without hardware.

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tamashii_agent::{DisabledExecutor, HardwareFactory, Master, MasterConfig};
use tamashii_core::constants::{
    DEFAULT_MANAGER_PORT, DEFAULT_RECONNECT_INTERVAL_MS, DEFAULT_STOP_TIMEOUT_MS,
};
use tamashii_hardware::devices::{AnyBuzzerDevice, AnyRfidDevice};
use tamashii_hardware::mock::{MockBuzzer, MockBuzzerHandle, MockRfid, MockRfidHandle};
use tamashii_hardware::{CardType, CpuInfoSerial, FixedSerial, parse_uid_hex};

#[derive(Debug, Parser)]
#[command(name = "tamashii-agent", version, about = "Tamashii terminal agent")]
struct Cli {
    /// Manager host name or address.
    #[arg(long, default_value = "127.0.0.1", env = "TAMASHII_HOST")]
    host: String,

    /// Manager TCP port.
    #[arg(long, default_value_t = DEFAULT_MANAGER_PORT, env = "TAMASHII_PORT")]
    port: u16,

    /// Use this serial number instead of reading /proc/cpuinfo.
    #[arg(long, env = "TAMASHII_SERIAL")]
    serial: Option<String>,

    /// Time each component gets to stop, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_STOP_TIMEOUT_MS, env = "TAMASHII_STOP_TIMEOUT_MS")]
    stop_timeout_ms: u64,

    /// Delay between manager reconnect attempts, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_RECONNECT_INTERVAL_MS, env = "TAMASHII_RECONNECT_MS")]
    reconnect_ms: u64,

    /// Log system commands from the manager instead of executing them.
    #[arg(long, env = "TAMASHII_NO_SYSTEM_COMMANDS")]
    no_system_commands: bool,
}

impl Cli {
    fn config(&self) -> MasterConfig {
        MasterConfig {
            stop_timeout_ms: self.stop_timeout_ms,
            reconnect_interval_ms: self.reconnect_ms,
            ..MasterConfig::new(self.host.clone(), self.port)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    info!(version = tamashii_core::VERSION, "Tamashii agent starting");

    let (rfid, rfid_handle) = MockRfid::new();
    let (buzzer, buzzer_handle) = MockBuzzer::new();
    let factory = HardwareFactory::new(AnyRfidDevice::Mock(rfid), AnyBuzzerDevice::Mock(buzzer));

    let config = cli.config();
    let master = match &cli.serial {
        Some(serial) => Master::new(config, &FixedSerial::new(serial.as_str()), factory).await,
        None => Master::new(config, &CpuInfoSerial::new(), factory).await,
    };
    let mut master = master.context("failed to start master")?;
    if cli.no_system_commands {
        master = master.with_command_executor(DisabledExecutor);
    }
    info!(serial = master.serial_number(), "Agent running");

    tokio::spawn(present_cards_from_stdin(rfid_handle));
    tokio::spawn(log_buzzer(buzzer_handle));

    let reason = master
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for Ctrl-C");
            }
        })
        .await;
    info!(?reason, "Dispatch loop finished");

    master.stop().await;
    Ok(())
}

async fn present_cards_from_stdin(mut handle: MockRfidHandle) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Failed to read stdin");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let uid = match parse_uid_hex(&line) {
            Ok(uid) => uid,
            Err(e) => {
                warn!(input = %line.trim(), error = %e, "Ignoring input");
                continue;
            }
        };
        handle.add_card(uid.clone(), CardType::MifareClassic1K);
        if let Err(e) = handle.present_card(uid).await {
            warn!(error = %e, "Failed to present card");
        }
    }
}

async fn log_buzzer(mut handle: MockBuzzerHandle) {
    while let Some(pattern) = handle.next_played().await {
        info!(?pattern, duration_ms = pattern.duration().as_millis() as u64, "Buzzer");
    }
}
