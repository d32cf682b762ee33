//! Error types for the agent.

use tamashii_hardware::HardwareError;
use tamashii_network::TcpClientError;

use crate::component::ComponentKind;

/// Result type alias for agent operations.
pub type Result<T> = std::result::Result<T, AgentError>;

/// Errors raised while building, running or stopping the agent.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// Configuration rejected by validation.
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// Peripheral or serial number failure.
    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),

    /// Manager link failure.
    #[error("Network error: {0}")]
    Network(#[from] TcpClientError),

    /// Event or command decoding failure.
    #[error("Event error: {0}")]
    Event(#[from] tamashii_core::Error),

    /// `start` called on a component that is already running.
    #[error("{component} is already started")]
    AlreadyStarted { component: ComponentKind },

    /// A component's background task outlived the stop timeout.
    #[error("{component} did not stop within {timeout_ms}ms")]
    StopTimeout {
        component: ComponentKind,
        timeout_ms: u64,
    },

    /// Component-specific failure.
    #[error("{component} failed: {message}")]
    Component {
        component: ComponentKind,
        message: String,
    },

    /// The master's event channel has been closed.
    #[error("Event channel closed")]
    ChannelClosed,

    /// The master's event channel is full.
    #[error("Event channel full")]
    ChannelFull,

    /// Operation not available on this terminal.
    #[error("Unsupported operation: {operation}")]
    Unsupported { operation: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AgentError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a component failure.
    pub fn component(component: ComponentKind, message: impl Into<String>) -> Self {
        Self::Component {
            component,
            message: message.into(),
        }
    }

    /// Create an unsupported operation error.
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            AgentError::config("port must be positive").to_string(),
            "Invalid configuration: port must be positive"
        );
        assert_eq!(
            AgentError::StopTimeout {
                component: ComponentKind::Connection,
                timeout_ms: 250
            }
            .to_string(),
            "Connection did not stop within 250ms"
        );
        assert_eq!(
            AgentError::component(ComponentKind::Buzzer, "player task has exited").to_string(),
            "Buzzer failed: player task has exited"
        );
    }

    #[test]
    fn test_from_hardware_error() {
        let err: AgentError = HardwareError::serial_unavailable("no Serial line").into();
        assert!(matches!(err, AgentError::Hardware(_)));
    }
}
