use crate::data::{PlayerCapability, PlayerCommand};
use crate::players::external_controller::{absolute_song_path, CommandTranslator};
use crate::players::player_controller::PlayerError;
use std::path::PathBuf;
use std::time::Duration;

/// Command line remote of the Totem movie player.
///
/// Totem forwards each invocation to the running instance asynchronously, so consecutive
/// launches are spaced out to keep the enqueued songs in order. It has no random switch.
pub struct TotemTranslator {
    music_dir: PathBuf,
}

impl TotemTranslator {
    pub fn new(music_dir: PathBuf) -> Self {
        Self { music_dir }
    }

    fn enqueue_all(&self, songs: &[String]) -> Vec<Vec<String>> {
        songs
            .iter()
            .map(|song| vec!["--enqueue".to_string(), absolute_song_path(&self.music_dir, song)])
            .collect()
    }
}

impl CommandTranslator for TotemTranslator {
    fn name(&self) -> &str {
        "totem"
    }

    fn capabilities(&self) -> Vec<PlayerCapability> {
        PlayerCapability::all()
            .into_iter()
            .filter(|c| *c != PlayerCapability::Random)
            .collect()
    }

    fn translate(&self, command: &PlayerCommand) -> Result<Vec<Vec<String>>, PlayerError> {
        let single = |arg: &str| -> Result<Vec<Vec<String>>, PlayerError> { Ok(vec![vec![arg.to_string()]]) };

        match command {
            PlayerCommand::Play => single("--play"),
            PlayerCommand::Pause => single("--pause"),
            PlayerCommand::Stop => single("--quit"),
            PlayerCommand::Next => single("--next"),
            PlayerCommand::Previous => single("--previous"),
            PlayerCommand::Random => Err(PlayerError::Unsupported(PlayerCapability::Random)),
            PlayerCommand::PlaySongs(songs) => match songs.split_first() {
                Some((first, rest)) => {
                    let mut invocations = vec![vec![absolute_song_path(&self.music_dir, first)]];
                    invocations.extend(self.enqueue_all(rest));
                    Ok(invocations)
                }
                None => Ok(Vec::new()),
            },
            PlayerCommand::AddSongs(songs) => Ok(self.enqueue_all(songs)),
        }
    }

    fn launch_delay(&self) -> Duration {
        Duration::from_millis(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::players::external_controller::testing::{strings, RecordingLauncher};
    use crate::players::external_controller::ExternalPlayerController;
    use crate::players::PlayerController;
    use std::path::Path;
    use std::sync::Arc;

    #[test]
    fn test_random_is_unsupported() {
        let launcher = Arc::new(RecordingLauncher::default());
        let player = ExternalPlayerController::new(
            PathBuf::from("/usr/bin/totem"),
            TotemTranslator::new(PathBuf::from("/music")),
            launcher.clone(),
        );

        assert!(!player.has_capability(PlayerCapability::Random));
        assert!(matches!(player.random(), Err(PlayerError::Unsupported(PlayerCapability::Random))));
        assert!(launcher.args().is_empty());
    }

    #[test]
    fn test_add_songs_enqueues_absolute_paths() {
        let translator = TotemTranslator::new(PathBuf::from("/music"));
        let invocations = translator
            .translate(&PlayerCommand::AddSongs(strings(&["Jazz/x.mp3"])))
            .unwrap();
        assert_eq!(
            invocations,
            vec![vec!["--enqueue".to_string(), absolute_song_path(Path::new("/music"), "Jazz/x.mp3")]]
        );
    }

    #[test]
    fn test_stop_quits() {
        let translator = TotemTranslator::new(PathBuf::from("/music"));
        assert_eq!(translator.translate(&PlayerCommand::Stop).unwrap(), vec![strings(&["--quit"])]);
    }
}
