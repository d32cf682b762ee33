//! System commands carried in `SYSTEM_COMMAND` event bodies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Command addressed to the agent itself rather than to a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemCommand {
    /// Power the terminal off.
    Poweroff,

    /// Reboot the terminal.
    Reboot,

    /// Restart the agent process.
    Restart,

    /// Update the agent software.
    Update,
}

impl SystemCommand {
    /// Canonical command name as it appears in an event body.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Poweroff => "poweroff",
            Self::Reboot => "reboot",
            Self::Restart => "restart",
            Self::Update => "update",
        }
    }
}

impl fmt::Display for SystemCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SystemCommand {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "poweroff" | "shutdown" => Ok(Self::Poweroff),
            "reboot" => Ok(Self::Reboot),
            "restart" => Ok(Self::Restart),
            "update" => Ok(Self::Update),
            _ => Err(Error::UnknownSystemCommand(s.to_string())),
        }
    }
}
