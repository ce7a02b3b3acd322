use crate::data::{PlayerCapability, PlayerCommand};
use crate::players::player_controller::{PlayerController, PlayerError, PlayerResult};
use std::collections::HashSet;
use std::io;
use std::sync::{Mutex, PoisonError};
use log::info;

/// A null player controller that does not play anything
///
/// Every command is logged and recorded. This is useful for dry runs and for tests, which can
/// restrict the capabilities or make selected operations fail.
pub struct NullPlayerController {
    capabilities: Vec<PlayerCapability>,
    /// Operations that report an execution failure
    failing: HashSet<PlayerCapability>,
    commands: Mutex<Vec<PlayerCommand>>,
}

impl NullPlayerController {
    /// Create a null player supporting every operation
    pub fn new() -> Self {
        Self::with_capabilities(PlayerCapability::all())
    }

    pub fn with_capabilities(capabilities: Vec<PlayerCapability>) -> Self {
        Self {
            capabilities,
            failing: HashSet::new(),
            commands: Mutex::new(Vec::new()),
        }
    }

    /// Make the given operations fail as if the player program could not be started
    pub fn with_failures(mut self, failing: &[PlayerCapability]) -> Self {
        self.failing.extend(failing.iter().copied());
        self
    }

    /// Commands received so far, oldest first
    pub fn commands(&self) -> Vec<PlayerCommand> {
        self.commands.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Forget recorded commands
    pub fn clear(&self) {
        self.commands.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl Default for NullPlayerController {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerController for NullPlayerController {
    fn get_player_name(&self) -> String {
        "null".to_string()
    }

    fn get_capabilities(&self) -> Vec<PlayerCapability> {
        self.capabilities.clone()
    }

    fn send_command(&self, command: PlayerCommand) -> PlayerResult {
        let capability = command.capability();
        if !self.has_capability(capability) {
            return Err(PlayerError::Unsupported(capability));
        }
        if self.failing.contains(&capability) {
            return Err(PlayerError::Execution {
                program: "null".to_string(),
                source: io::Error::new(io::ErrorKind::Other, "simulated failure"),
            });
        }

        info!("NullPlayerController: command received (no action taken): {}", command);
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(command);
        Ok(())
    }
}
