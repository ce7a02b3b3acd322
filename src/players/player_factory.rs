use crate::config::RmcConfig;
use crate::players::{
    ExternalPlayerController, Foobar2000Translator, MpcTranslator, NullPlayerController,
    PlayerController, ProcessLauncher, SystemLauncher, TotemTranslator,
};
use std::path::PathBuf;
use std::sync::Arc;
use log::info;
use thiserror::Error;

/// Error type for player creation
#[derive(Debug, Error)]
pub enum PlayerCreationError {
    /// No player implementation matches the configured executable
    #[error("no player known for executable '{0}'")]
    NoSuchPlayer(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

/// Create the player selected by the configured executable name
pub fn create_player(config: &RmcConfig) -> Result<Arc<dyn PlayerController>, PlayerCreationError> {
    create_player_with_launcher(config, Arc::new(SystemLauncher::new()))
}

/// Create the player selected by the configured executable name, starting programs through
/// `launcher`.
///
/// The executable name is matched case-insensitively against the known players, so names like
/// `foobar2000.exe` or `/usr/local/bin/mpc-git` are recognised.
pub fn create_player_with_launcher(
    config: &RmcConfig,
    launcher: Arc<dyn ProcessLauncher>,
) -> Result<Arc<dyn PlayerController>, PlayerCreationError> {
    let exec = config
        .player_exec
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or(PlayerCreationError::MissingField("player_exec"))?;
    let name = exec.to_lowercase();

    let player: Arc<dyn PlayerController> = if name.contains("foobar2000") {
        Arc::new(ExternalPlayerController::new(
            program_path(config, exec)?,
            Foobar2000Translator::new(music_dir(config)?),
            launcher,
        ))
    } else if name.contains("totem") {
        Arc::new(ExternalPlayerController::new(
            program_path(config, exec)?,
            TotemTranslator::new(music_dir(config)?),
            launcher,
        ))
    } else if name.contains("mpc") {
        Arc::new(ExternalPlayerController::new(program_path(config, exec)?, MpcTranslator::new(), launcher))
    } else if name.contains("null") {
        info!("Commands are only logged by the null player");
        Arc::new(NullPlayerController::new())
    } else {
        return Err(PlayerCreationError::NoSuchPlayer(exec.to_string()));
    };

    info!("Using {} player", player.get_player_name());
    Ok(player)
}

fn program_path(config: &RmcConfig, exec: &str) -> Result<PathBuf, PlayerCreationError> {
    let dir = config
        .player_dir
        .as_ref()
        .ok_or(PlayerCreationError::MissingField("player_dir"))?;
    Ok(dir.join(exec))
}

fn music_dir(config: &RmcConfig) -> Result<PathBuf, PlayerCreationError> {
    config
        .music_dir
        .clone()
        .ok_or(PlayerCreationError::MissingField("music_dir"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::players::external_controller::testing::RecordingLauncher;
    use std::path::Path;

    fn config(exec: &str) -> RmcConfig {
        RmcConfig {
            music_dir: Some(PathBuf::from("/music")),
            player_dir: Some(PathBuf::from("/opt/player")),
            player_exec: Some(exec.to_string()),
            ..RmcConfig::default()
        }
    }

    fn create(exec: &str) -> Result<Arc<dyn PlayerController>, PlayerCreationError> {
        create_player_with_launcher(&config(exec), Arc::new(RecordingLauncher::default()))
    }

    #[test]
    fn test_selects_by_substring() {
        assert_eq!(create("foobar2000.exe").unwrap().get_player_name(), "foobar2000");
        assert_eq!(create("Totem").unwrap().get_player_name(), "totem");
        assert_eq!(create("mpc").unwrap().get_player_name(), "mpc");
        assert_eq!(create("null").unwrap().get_player_name(), "null");
    }

    #[test]
    fn test_unknown_player() {
        match create("vlc") {
            Err(PlayerCreationError::NoSuchPlayer(name)) => assert_eq!(name, "vlc"),
            other => panic!("unexpected result: {:?}", other.map(|p| p.get_player_name())),
        }
    }

    #[test]
    fn test_program_path_joins_player_dir() {
        let launcher = Arc::new(RecordingLauncher::default());
        let player = create_player_with_launcher(&config("mpc"), launcher.clone()).unwrap();
        player.play().unwrap();
        let launches = launcher.launches.lock().unwrap();
        assert_eq!(launches[0].0, Path::new("/opt/player").join("mpc"));
    }

    #[test]
    fn test_null_player_needs_no_player_dir() {
        let mut cfg = config("null");
        cfg.player_dir = None;
        let player = create_player_with_launcher(&cfg, Arc::new(RecordingLauncher::default())).unwrap();
        assert_eq!(player.get_player_name(), "null");
    }

    #[test]
    fn test_missing_fields() {
        let mut cfg = config("mpc");
        cfg.player_dir = None;
        assert!(matches!(
            create_player_with_launcher(&cfg, Arc::new(RecordingLauncher::default())),
            Err(PlayerCreationError::MissingField("player_dir"))
        ));

        cfg.player_exec = None;
        assert!(matches!(
            create_player_with_launcher(&cfg, Arc::new(RecordingLauncher::default())),
            Err(PlayerCreationError::MissingField("player_exec"))
        ));
    }
}
