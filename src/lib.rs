/// Configuration loading and validation
pub mod config;

/// Logger setup
pub mod logging;

/// Protocol and playback data types
pub mod data;

/// Player implementations and controllers
pub mod players;

/// Path resolution and session timers
pub mod helpers;

/// Connection handling and the command protocol
pub mod server;

pub use config::{ConfigError, RmcConfig};
pub use players::{create_player, PlayerController, PlayerError};
pub use server::{CommandDispatcher, RmcServer, ServerHandle, SessionSettings};
