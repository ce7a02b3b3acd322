use crate::data::{PlayerCapability, PlayerCommand};
use crate::players::player_controller::{PlayerController, PlayerError, PlayerResult};
use crate::players::process_launcher::ProcessLauncher;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use log::{debug, info, warn};

/// Translates player commands into command lines for one external program
pub trait CommandTranslator: Send + Sync {
    /// Short name of the player, used in logs
    fn name(&self) -> &str;

    /// Operations the program can perform
    fn capabilities(&self) -> Vec<PlayerCapability>;

    /// Turn a command into the ordered argument lists the program is started with.
    ///
    /// An empty list means there is nothing to run for this command.
    fn translate(&self, command: &PlayerCommand) -> Result<Vec<Vec<String>>, PlayerError>;

    /// Pause between two consecutive launches of the same command
    fn launch_delay(&self) -> Duration {
        Duration::ZERO
    }

    /// Called after every invocation of `command` was started successfully
    fn committed(&self, _command: &PlayerCommand) {}
}

/// Player controller that drives a command line program.
///
/// Every command is translated into one or more invocations of the program, which are started
/// through a [`ProcessLauncher`] one after another.
pub struct ExternalPlayerController<T: CommandTranslator> {
    program: PathBuf,
    translator: T,
    launcher: Arc<dyn ProcessLauncher>,
}

impl<T: CommandTranslator> ExternalPlayerController<T> {
    pub fn new(program: PathBuf, translator: T, launcher: Arc<dyn ProcessLauncher>) -> Self {
        debug!("Creating {} controller for {}", translator.name(), program.display());
        Self {
            program,
            translator,
            launcher,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn translator(&self) -> &T {
        &self.translator
    }
}

impl<T: CommandTranslator> PlayerController for ExternalPlayerController<T> {
    fn get_player_name(&self) -> String {
        self.translator.name().to_string()
    }

    fn get_capabilities(&self) -> Vec<PlayerCapability> {
        self.translator.capabilities()
    }

    fn send_command(&self, command: PlayerCommand) -> PlayerResult {
        let capability = command.capability();
        if !self.has_capability(capability) {
            info!("{} does not support {}", self.translator.name(), capability);
            return Err(PlayerError::Unsupported(capability));
        }

        let invocations = self.translator.translate(&command)?;
        debug!(
            "{}: {} translated to {} invocation(s)",
            self.translator.name(),
            command,
            invocations.len()
        );

        let delay = self.translator.launch_delay();
        for (index, args) in invocations.iter().enumerate() {
            if index > 0 && !delay.is_zero() {
                thread::sleep(delay);
            }
            self.launcher.launch(&self.program, args).map_err(|source| {
                warn!("{}: failed to run {:?}: {}", self.translator.name(), args, source);
                PlayerError::Execution {
                    program: self.program.display().to_string(),
                    source,
                }
            })?;
        }

        self.translator.committed(&command);
        Ok(())
    }
}

/// Build the absolute path of a song below the music directory
pub(crate) fn absolute_song_path(music_dir: &Path, song: &str) -> String {
    let mut path = music_dir.to_path_buf();
    for component in song.split('/').filter(|c| !c.is_empty() && *c != ".") {
        path.push(component);
    }
    path.display().to_string()
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::io;
    use std::sync::Mutex;

    /// Launcher that records every invocation instead of starting anything
    #[derive(Default)]
    pub struct RecordingLauncher {
        pub launches: Mutex<Vec<(PathBuf, Vec<String>)>>,
        pub fail: bool,
    }

    impl RecordingLauncher {
        pub fn failing() -> Self {
            Self {
                launches: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        pub fn args(&self) -> Vec<Vec<String>> {
            self.launches.lock().unwrap().iter().map(|(_, a)| a.clone()).collect()
        }
    }

    impl ProcessLauncher for RecordingLauncher {
        fn launch(&self, program: &Path, args: &[String]) -> io::Result<()> {
            if self.fail {
                return Err(io::Error::new(io::ErrorKind::NotFound, "no such program"));
            }
            self.launches.lock().unwrap().push((program.to_path_buf(), args.to_vec()));
            Ok(())
        }
    }

    pub fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{strings, RecordingLauncher};
    use super::*;

    struct EchoTranslator;

    impl CommandTranslator for EchoTranslator {
        fn name(&self) -> &str {
            "echo"
        }

        fn capabilities(&self) -> Vec<PlayerCapability> {
            vec![PlayerCapability::Play, PlayerCapability::AddSongs]
        }

        fn translate(&self, command: &PlayerCommand) -> Result<Vec<Vec<String>>, PlayerError> {
            match command {
                PlayerCommand::AddSongs(songs) => Ok(songs.iter().map(|s| strings(&["add", s])).collect()),
                other => Ok(vec![vec![other.capability().to_string()]]),
            }
        }
    }

    #[test]
    fn test_unsupported_command_is_not_launched() {
        let launcher = Arc::new(RecordingLauncher::default());
        let player = ExternalPlayerController::new(PathBuf::from("/usr/bin/echo"), EchoTranslator, launcher.clone());

        let result = player.next();
        assert!(matches!(result, Err(PlayerError::Unsupported(PlayerCapability::Next))));
        assert!(launcher.args().is_empty());
    }

    #[test]
    fn test_invocations_run_in_order() {
        let launcher = Arc::new(RecordingLauncher::default());
        let player = ExternalPlayerController::new(PathBuf::from("/usr/bin/echo"), EchoTranslator, launcher.clone());

        player.add_songs(&strings(&["a.mp3", "b/c.mp3"])).unwrap();
        assert_eq!(launcher.args(), vec![strings(&["add", "a.mp3"]), strings(&["add", "b/c.mp3"])]);
        let launches = launcher.launches.lock().unwrap();
        assert!(launches.iter().all(|(p, _)| p == Path::new("/usr/bin/echo")));
    }

    #[test]
    fn test_launch_failure_is_execution_error() {
        let launcher = Arc::new(RecordingLauncher::failing());
        let player = ExternalPlayerController::new(PathBuf::from("/missing/echo"), EchoTranslator, launcher);

        match player.play() {
            Err(PlayerError::Execution { program, .. }) => assert_eq!(program, "/missing/echo"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_absolute_song_path() {
        let path = absolute_song_path(Path::new("/music"), "./Rock/Song A.mp3");
        assert_eq!(PathBuf::from(path), Path::new("/music").join("Rock").join("Song A.mp3"));
    }
}
