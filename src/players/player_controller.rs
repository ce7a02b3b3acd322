use crate::data::{PlayerCapability, PlayerCommand};
use std::io;
use thiserror::Error;

/// Error returned by a player that could not carry out a command
#[derive(Debug, Error)]
pub enum PlayerError {
    /// The player has no way to perform this operation
    #[error("unsupported operation: {0}")]
    Unsupported(PlayerCapability),

    /// The player supports the operation but running it failed
    #[error("failed to execute {program}: {source}")]
    Execution {
        program: String,
        #[source]
        source: io::Error,
    },
}

impl PlayerError {
    /// Whether this error is permanent for the player (as opposed to a failed attempt)
    pub fn is_unsupported(&self) -> bool {
        matches!(self, PlayerError::Unsupported(_))
    }
}

pub type PlayerResult = Result<(), PlayerError>;

/// PlayerController trait - abstract interface for player implementations
///
/// A player receives playback commands and either performs them or reports why it cannot.
/// Song paths handed to a player are relative to the music directory and use `/` as separator.
/// The server holds one player for the lifetime of the process.
pub trait PlayerController: Send + Sync {
    /// Get the name of this player controller
    ///
    /// Returns a string identifier for this type of player (e.g., "mpc", "null")
    fn get_player_name(&self) -> String;

    /// Get the capabilities of the player
    fn get_capabilities(&self) -> Vec<PlayerCapability>;

    /// Send a command to the player
    ///
    /// # Arguments
    ///
    /// * `command` - The command to send to the player
    ///
    /// # Returns
    ///
    /// `Ok(())` once the command was handed to the player, `PlayerError::Unsupported` if the
    /// player cannot perform it, `PlayerError::Execution` if performing it failed
    fn send_command(&self, command: PlayerCommand) -> PlayerResult;

    /// Check if the player supports a capability
    fn has_capability(&self, capability: PlayerCapability) -> bool {
        self.get_capabilities().contains(&capability)
    }

    /// Resume the playback of the current playlist or restart playback
    fn play(&self) -> PlayerResult {
        self.send_command(PlayerCommand::Play)
    }

    /// Pause playback; resuming from the same position should be possible
    fn pause(&self) -> PlayerResult {
        self.send_command(PlayerCommand::Pause)
    }

    /// Stop playback, possibly discarding the player's playlist
    fn stop(&self) -> PlayerResult {
        self.send_command(PlayerCommand::Stop)
    }

    /// Create a new playlist with the given songs and start playing it
    fn play_songs(&self, songs: &[String]) -> PlayerResult {
        self.send_command(PlayerCommand::PlaySongs(songs.to_vec()))
    }

    /// Add songs to the current playlist without changing the playback state
    fn add_songs(&self, songs: &[String]) -> PlayerResult {
        self.send_command(PlayerCommand::AddSongs(songs.to_vec()))
    }

    /// Skip to the next song
    fn next(&self) -> PlayerResult {
        self.send_command(PlayerCommand::Next)
    }

    /// Skip to the previous song
    fn previous(&self) -> PlayerResult {
        self.send_command(PlayerCommand::Previous)
    }

    /// Play a random song from the current playlist
    fn random(&self) -> PlayerResult {
        self.send_command(PlayerCommand::Random)
    }
}
