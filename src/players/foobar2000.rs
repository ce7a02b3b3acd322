use crate::data::{PlayerCapability, PlayerCommand};
use crate::players::external_controller::{absolute_song_path, CommandTranslator};
use crate::players::player_controller::PlayerError;
use std::path::PathBuf;

/// Command line interface of foobar2000
///
/// foobar2000 expects absolute file names, so songs are resolved against the music directory.
pub struct Foobar2000Translator {
    music_dir: PathBuf,
}

impl Foobar2000Translator {
    pub fn new(music_dir: PathBuf) -> Self {
        Self { music_dir }
    }

    fn add_all(&self, songs: &[String]) -> Vec<Vec<String>> {
        songs
            .iter()
            .map(|song| vec!["/add".to_string(), absolute_song_path(&self.music_dir, song)])
            .collect()
    }
}

impl CommandTranslator for Foobar2000Translator {
    fn name(&self) -> &str {
        "foobar2000"
    }

    fn capabilities(&self) -> Vec<PlayerCapability> {
        PlayerCapability::all()
    }

    fn translate(&self, command: &PlayerCommand) -> Result<Vec<Vec<String>>, PlayerError> {
        let single = |arg: &str| -> Result<Vec<Vec<String>>, PlayerError> { Ok(vec![vec![arg.to_string()]]) };

        match command {
            PlayerCommand::Play => single("/play"),
            PlayerCommand::Pause => single("/pause"),
            PlayerCommand::Stop => single("/exit"),
            PlayerCommand::Next => single("/next"),
            PlayerCommand::Previous => single("/prev"),
            PlayerCommand::Random => single("/rand"),
            PlayerCommand::PlaySongs(songs) => match songs.split_first() {
                // Opening a file without a switch replaces the playlist
                Some((first, rest)) => {
                    let mut invocations = vec![vec![absolute_song_path(&self.music_dir, first)]];
                    invocations.extend(self.add_all(rest));
                    Ok(invocations)
                }
                None => Ok(Vec::new()),
            },
            PlayerCommand::AddSongs(songs) => Ok(self.add_all(songs)),
        }
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

    fn abs(rel: &str) -> String {
        absolute_song_path(Path::new("/music"), rel)
    }

    #[test]
    fn test_simple_commands() {
        let translator = Foobar2000Translator::new(PathBuf::from("/music"));
        assert_eq!(translator.translate(&PlayerCommand::Stop).unwrap(), vec![strings(&["/exit"])]);
        assert_eq!(translator.translate(&PlayerCommand::Previous).unwrap(), vec![strings(&["/prev"])]);
        assert_eq!(translator.translate(&PlayerCommand::Random).unwrap(), vec![strings(&["/rand"])]);
    }

    #[test]
    fn test_play_songs_opens_first_and_adds_rest() {
        let launcher = Arc::new(RecordingLauncher::default());
        let player = ExternalPlayerController::new(
            PathBuf::from("/opt/foobar2000/foobar2000.exe"),
            Foobar2000Translator::new(PathBuf::from("/music")),
            launcher.clone(),
        );

        player.play_songs(&strings(&["Rock/a.mp3", "Rock/b.mp3", "c.wav"])).unwrap();
        assert_eq!(
            launcher.args(),
            vec![
                vec![abs("Rock/a.mp3")],
                vec!["/add".to_string(), abs("Rock/b.mp3")],
                vec!["/add".to_string(), abs("c.wav")],
            ]
        );
    }
}
