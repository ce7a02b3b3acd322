// Data structures for rmc

pub mod capabilities;
pub mod client_command;
pub mod player_command;
pub mod playlist;
pub mod response;

pub use capabilities::PlayerCapability;
pub use client_command::ClientCommand;
pub use player_command::PlayerCommand;
pub use playlist::Playlist;
