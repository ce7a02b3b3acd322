use serde::{Serialize, Deserialize};
use strum_macros::{Display, EnumString, AsRefStr};

/// Enum representing the playback operations a player can perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PlayerCapability {
    /// Can resume or restart playback
    Play,
    /// Can pause playback
    Pause,
    /// Can stop playback
    Stop,
    /// Can replace the player's playlist and start playing it
    PlaySongs,
    /// Can append songs to the player's playlist
    AddSongs,
    /// Can skip to next track
    Next,
    /// Can skip to previous track
    Previous,
    /// Can jump to a random track of the playlist
    Random,
}

impl PlayerCapability {
    /// Get a list of all capabilities
    pub fn all() -> Vec<PlayerCapability> {
        vec![
            Self::Play,
            Self::Pause,
            Self::Stop,
            Self::PlaySongs,
            Self::AddSongs,
            Self::Next,
            Self::Previous,
            Self::Random,
        ]
    }
}
