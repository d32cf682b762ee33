//! Execution of system commands sent by the manager.

use tokio::process::Command;
use tracing::{info, warn};

use tamashii_core::SystemCommand;

use crate::{AgentError, Result};

/// Carries out `poweroff`, `reboot` and `update`.
///
/// `restart` never reaches an executor; the master handles it by leaving its
/// dispatch loop.
pub trait CommandExecutor: Send {
    fn execute(&mut self, command: SystemCommand) -> Result<()>;
}

/// Runs the host's `poweroff` and `reboot` programs.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellExecutor;

impl CommandExecutor for ShellExecutor {
    fn execute(&mut self, command: SystemCommand) -> Result<()> {
        let program = match command {
            SystemCommand::Poweroff => "poweroff",
            SystemCommand::Reboot => "reboot",
            SystemCommand::Update | SystemCommand::Restart => {
                return Err(AgentError::unsupported(format!("system command {command}")));
            }
        };

        info!(%command, program, "Executing system command");
        // The child outlives this call; tokio reaps it in the background
        Command::new(program).spawn()?;
        Ok(())
    }
}

/// Logs and ignores every command.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledExecutor;

impl CommandExecutor for DisabledExecutor {
    fn execute(&mut self, command: SystemCommand) -> Result<()> {
        warn!(%command, "System commands are disabled, ignoring");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_executor_rejects_update() {
        let result = ShellExecutor.execute(SystemCommand::Update);
        assert!(matches!(result, Err(AgentError::Unsupported { .. })));
    }

    #[test]
    fn test_disabled_executor_accepts_everything() {
        let mut executor = DisabledExecutor;
        for command in [
            SystemCommand::Poweroff,
            SystemCommand::Reboot,
            SystemCommand::Update,
        ] {
            assert!(executor.execute(command).is_ok());
        }
    }
}
