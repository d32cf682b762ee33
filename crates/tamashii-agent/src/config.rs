//! Master configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use tamashii_core::constants::{
    DEFAULT_CARD_DEBOUNCE_MS, DEFAULT_EVENT_CHANNEL_CAPACITY, DEFAULT_IO_TIMEOUT_MS,
    DEFAULT_MANAGER_PORT, DEFAULT_RECONNECT_INTERVAL_MS, DEFAULT_STOP_TIMEOUT_MS,
};

use crate::component::ComponentSpec;
use crate::components::{BuzzerConfig, CardReaderConfig, ConnectionConfig};
use crate::{AgentError, Result};

/// Settings for a [`Master`](crate::Master) and the components it creates.
///
/// # Examples
///
/// ```
/// use tamashii_agent::MasterConfig;
///
/// let config = MasterConfig::new("manager.local", 3000);
/// assert!(config.validate().is_ok());
/// assert!(MasterConfig::new("", 3000).validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MasterConfig {
    /// Manager host name or address.
    pub host: String,

    /// Manager TCP port.
    pub port: u16,

    /// Capacity of the master's event channel.
    pub channel_capacity: usize,

    /// Time each component gets to stop.
    pub stop_timeout_ms: u64,

    /// Manager link I/O timeout.
    pub io_timeout_ms: u64,

    /// Delay between manager reconnect attempts.
    pub reconnect_interval_ms: u64,

    /// Repeated reads of one card within this window are reported once.
    pub card_debounce_ms: u64,
}

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_MANAGER_PORT,
            channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
            stop_timeout_ms: DEFAULT_STOP_TIMEOUT_MS,
            io_timeout_ms: DEFAULT_IO_TIMEOUT_MS,
            reconnect_interval_ms: DEFAULT_RECONNECT_INTERVAL_MS,
            card_debounce_ms: DEFAULT_CARD_DEBOUNCE_MS,
        }
    }
}

impl MasterConfig {
    /// Defaults with the given manager address.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Check the settings before anything is built.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Config`] for an empty host, a zero port, a zero
    /// channel capacity or a zero stop timeout.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(AgentError::config("host must not be empty"));
        }
        if self.port == 0 {
            return Err(AgentError::config("port must be positive"));
        }
        if self.channel_capacity == 0 {
            return Err(AgentError::config("channel capacity must be positive"));
        }
        if self.stop_timeout_ms == 0 {
            return Err(AgentError::config("stop timeout must be positive"));
        }
        Ok(())
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }

    pub fn connection(&self) -> ConnectionConfig {
        ConnectionConfig {
            io_timeout: Duration::from_millis(self.io_timeout_ms),
            reconnect_interval: Duration::from_millis(self.reconnect_interval_ms),
            stop_timeout: self.stop_timeout(),
            ..ConnectionConfig::new(self.host.trim(), self.port)
        }
    }

    pub fn buzzer(&self) -> BuzzerConfig {
        BuzzerConfig {
            stop_timeout: self.stop_timeout(),
            ..Default::default()
        }
    }

    pub fn card_reader(&self) -> CardReaderConfig {
        CardReaderConfig {
            debounce: Duration::from_millis(self.card_debounce_ms),
            stop_timeout: self.stop_timeout(),
        }
    }

    /// Component specs in construction order.
    pub fn component_specs(&self) -> [ComponentSpec; 3] {
        [
            ComponentSpec::Connection(self.connection()),
            ComponentSpec::Buzzer(self.buzzer()),
            ComponentSpec::CardReader(self.card_reader()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentKind;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = MasterConfig::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.channel_capacity, 100);
        assert_eq!(config.stop_timeout(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[rstest]
    #[case(MasterConfig::new("", 3000))]
    #[case(MasterConfig::new("   ", 3000))]
    #[case(MasterConfig::new("localhost", 0))]
    #[case(MasterConfig { channel_capacity: 0, ..Default::default() })]
    #[case(MasterConfig { stop_timeout_ms: 0, ..Default::default() })]
    fn test_invalid(#[case] config: MasterConfig) {
        assert!(matches!(config.validate(), Err(AgentError::Config { .. })));
    }

    #[test]
    fn test_component_specs_order_and_values() {
        let config = MasterConfig {
            reconnect_interval_ms: 250,
            card_debounce_ms: 0,
            ..MasterConfig::new(" manager.local ", 4000)
        };

        let specs = config.component_specs();
        let kinds: Vec<_> = specs.iter().map(ComponentSpec::kind).collect();
        assert_eq!(
            kinds,
            vec![
                ComponentKind::Connection,
                ComponentKind::Buzzer,
                ComponentKind::CardReader
            ]
        );

        let ComponentSpec::Connection(connection) = &specs[0] else {
            panic!("first spec must be the connection");
        };
        assert_eq!(connection.host, "manager.local");
        assert_eq!(connection.port, 4000);
        assert_eq!(connection.reconnect_interval, Duration::from_millis(250));

        let ComponentSpec::CardReader(reader) = &specs[2] else {
            panic!("last spec must be the card reader");
        };
        assert_eq!(reader.debounce, Duration::ZERO);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: MasterConfig =
            serde_json::from_str(r#"{"host": "10.0.0.5", "port": 4000}"#).unwrap();
        assert_eq!(config.host, "10.0.0.5");
        assert_eq!(config.port, 4000);
        assert_eq!(config.stop_timeout_ms, DEFAULT_STOP_TIMEOUT_MS);
    }
}
