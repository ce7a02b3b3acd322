/// Player management for the remote music control server
mod player_controller;
mod process_launcher;
mod external_controller;
mod foobar2000;
mod totem;
mod mpc;
mod null_controller;
pub mod player_factory;

// Re-export the PlayerController trait and related components
pub use player_controller::{PlayerController, PlayerError, PlayerResult};
pub use process_launcher::{ProcessLauncher, SystemLauncher};
pub use external_controller::{CommandTranslator, ExternalPlayerController};
pub use foobar2000::Foobar2000Translator;
pub use totem::TotemTranslator;
pub use mpc::MpcTranslator;
pub use null_controller::NullPlayerController;
pub use player_factory::{create_player, create_player_with_launcher, PlayerCreationError};
