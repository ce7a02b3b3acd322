use crate::data::{PlayerCapability, PlayerCommand};
use crate::players::external_controller::CommandTranslator;
use crate::players::player_controller::PlayerError;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use log::debug;
use rand::Rng;

/// Command line client of the Music Player Daemon.
///
/// mpd resolves songs against its own music directory, so paths are passed on relative. The
/// translator tracks how many songs it queued so RANDOM can pick a playlist position.
pub struct MpcTranslator {
    queued: Mutex<usize>,
}

impl MpcTranslator {
    pub fn new() -> Self {
        Self {
            queued: Mutex::new(0),
        }
    }

    /// Number of songs queued through this translator since the last stop
    pub fn queued(&self) -> usize {
        *self.queued.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn add_all(songs: &[String]) -> impl Iterator<Item = Vec<String>> + '_ {
        songs.iter().map(|song| {
            let song = song.strip_prefix("./").unwrap_or(song);
            vec!["add".to_string(), song.to_string()]
        })
    }
}

impl Default for MpcTranslator {
    fn default() -> Self {
        Self::new()
    }
}

fn args(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl CommandTranslator for MpcTranslator {
    fn name(&self) -> &str {
        "mpc"
    }

    fn capabilities(&self) -> Vec<PlayerCapability> {
        PlayerCapability::all()
    }

    fn translate(&self, command: &PlayerCommand) -> Result<Vec<Vec<String>>, PlayerError> {
        let invocations = match command {
            PlayerCommand::Play => vec![args(&["play"])],
            PlayerCommand::Pause => vec![args(&["pause"])],
            PlayerCommand::Stop => vec![args(&["stop"]), args(&["clear"])],
            PlayerCommand::Next => vec![args(&["next"])],
            PlayerCommand::Previous => vec![args(&["prev"])],
            PlayerCommand::Random => {
                let queued = self.queued();
                if queued == 0 {
                    debug!("mpc: nothing queued, ignoring random");
                    Vec::new()
                } else {
                    let position = rand::thread_rng().gen_range(1..=queued);
                    vec![vec!["play".to_string(), position.to_string()]]
                }
            }
            PlayerCommand::PlaySongs(songs) => {
                let mut invocations = vec![args(&["stop"]), args(&["clear"])];
                invocations.extend(Self::add_all(songs));
                invocations.push(args(&["play"]));
                invocations
            }
            PlayerCommand::AddSongs(songs) => Self::add_all(songs).collect(),
        };
        Ok(invocations)
    }

    fn launch_delay(&self) -> Duration {
        Duration::from_millis(50)
    }

    fn committed(&self, command: &PlayerCommand) {
        let mut queued = self.queued.lock().unwrap_or_else(PoisonError::into_inner);
        match command {
            PlayerCommand::Stop => *queued = 0,
            PlayerCommand::PlaySongs(songs) => *queued = songs.len(),
            PlayerCommand::AddSongs(songs) => *queued += songs.len(),
            _ => {}
        }
    }
}
