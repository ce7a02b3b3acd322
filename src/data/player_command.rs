/// Player commands that can be sent to media players
use serde::{Serialize, Deserialize};
use super::PlayerCapability;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlayerCommand {
    /// Simple playback commands
    Play,

    Pause,

    Stop,

    Next,

    Previous,

    Random,

    /// Replace the player's playlist with these songs and start playing.
    /// Paths are relative to the music directory and use `/` as separator.
    PlaySongs(Vec<String>),

    /// Append these songs to the player's playlist
    AddSongs(Vec<String>),
}

impl PlayerCommand {
    /// The capability a player needs to execute this command
    pub fn capability(&self) -> PlayerCapability {
        match self {
            PlayerCommand::Play => PlayerCapability::Play,
            PlayerCommand::Pause => PlayerCapability::Pause,
            PlayerCommand::Stop => PlayerCapability::Stop,
            PlayerCommand::Next => PlayerCapability::Next,
            PlayerCommand::Previous => PlayerCapability::Previous,
            PlayerCommand::Random => PlayerCapability::Random,
            PlayerCommand::PlaySongs(_) => PlayerCapability::PlaySongs,
            PlayerCommand::AddSongs(_) => PlayerCapability::AddSongs,
        }
    }
}

impl std::fmt::Display for PlayerCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerCommand::Play => write!(f, "play"),
            PlayerCommand::Pause => write!(f, "pause"),
            PlayerCommand::Stop => write!(f, "stop"),
            PlayerCommand::Next => write!(f, "next"),
            PlayerCommand::Previous => write!(f, "previous"),
            PlayerCommand::Random => write!(f, "random"),
            PlayerCommand::PlaySongs(songs) => write!(f, "play_songs:{}", songs.len()),
            PlayerCommand::AddSongs(songs) => write!(f, "add_songs:{}", songs.len()),
        }
    }
}
