//! Command processing for one protocol line.
//!
//! The dispatcher owns no session state. The session passes its playlist in, so a new
//! session always starts with an empty one.

use crate::data::response::{
    ack, help_lines, nack, COMMAND_NOT_RECOGNISED, NO_SONGS_FOUND, PATH_CONTAINS_DIR_UP,
    PATH_DOES_NOT_EXIST, UNSUPPORTED_OPERATION,
};
use crate::data::{ClientCommand, Playlist};
use crate::helpers::path_resolver::{
    contains_dir_up, relative_to_root, resolve_directory, resolve_track, split_fragments, unquote,
};
use crate::helpers::ResolveError;
use crate::players::{PlayerController, PlayerError, PlayerResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use log::{debug, error, warn};
use walkdir::WalkDir;

/// Lines to send back for one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Output lines, the last one is always the status line
    pub lines: Vec<String>,
    /// Close the session after sending
    pub terminate: bool,
}

impl Reply {
    fn status(line: String) -> Self {
        Self {
            lines: vec![line],
            terminate: false,
        }
    }

    fn with_body(mut body: Vec<String>, status: String) -> Self {
        body.push(status);
        Self {
            lines: body,
            terminate: false,
        }
    }

    /// The final ACK/NACK line
    pub fn status_line(&self) -> &str {
        self.lines.last().map(String::as_str).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SongsMode {
    Replace,
    Append,
}

pub struct CommandDispatcher {
    music_dir: PathBuf,
    player: Arc<dyn PlayerController>,
    /// Lower-case file extensions shown by LIST
    extensions: Vec<String>,
}

impl CommandDispatcher {
    pub fn new(music_dir: PathBuf, player: Arc<dyn PlayerController>, extensions: &[String]) -> Self {
        Self {
            music_dir,
            player,
            extensions: extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    pub fn music_dir(&self) -> &Path {
        &self.music_dir
    }

    pub fn player(&self) -> &Arc<dyn PlayerController> {
        &self.player
    }

    /// Process one line. Returns `None` for blank lines, which get no answer.
    pub fn dispatch(&self, line: &str, playlist: &mut Playlist) -> Option<Reply> {
        let line = line.trim();
        let command = ClientCommand::parse(line)?;
        debug!("Dispatching {:?}", command);

        let reply = match command {
            ClientCommand::Playlist => {
                Reply::with_body(playlist.entries().to_vec(), ack(command.verb()))
            }
            ClientCommand::Play => self.simple(&command, self.player.play()),
            ClientCommand::Pause => self.simple(&command, self.player.pause()),
            ClientCommand::Next => self.simple(&command, self.player.next()),
            ClientCommand::Previous => self.simple(&command, self.player.previous()),
            ClientCommand::Random => self.simple(&command, self.player.random()),
            ClientCommand::Stop => {
                let result = self.player.stop();
                if result.is_ok() {
                    playlist.clear();
                }
                self.simple(&command, result)
            }
            ClientCommand::PlaySongs(ref tokens) => {
                self.songs(line, tokens, SongsMode::Replace, playlist)
            }
            ClientCommand::AddSongs(ref tokens) => {
                self.songs(line, tokens, SongsMode::Append, playlist)
            }
            ClientCommand::List(ref path) => self.list(line, path),
            ClientCommand::Help => Reply::with_body(help_lines(), ack(command.verb())),
            ClientCommand::Exit => Reply {
                lines: vec![ack(command.verb())],
                terminate: true,
            },
            ClientCommand::Unknown => {
                warn!("Unrecognised command: {}", line);
                Reply::status(nack(COMMAND_NOT_RECOGNISED, line))
            }
        };

        Some(reply)
    }

    fn simple(&self, command: &ClientCommand, result: PlayerResult) -> Reply {
        match result {
            Ok(()) => Reply::status(ack(command.verb())),
            Err(e) => Reply::status(self.player_failure(command.verb(), &e)),
        }
    }

    /// Log a failed player call and build its NACK line
    fn player_failure(&self, verb: &str, err: &PlayerError) -> String {
        match err {
            PlayerError::Unsupported(capability) => warn!(
                "{}: {} player does not support {}",
                verb,
                self.player.get_player_name(),
                capability
            ),
            PlayerError::Execution { .. } => error!("{}: {}", verb, err),
        }
        nack(UNSUPPORTED_OPERATION, verb)
    }

    fn songs(&self, line: &str, tokens: &[String], mode: SongsMode, playlist: &mut Playlist) -> Reply {
        let verb = match mode {
            SongsMode::Replace => "PLAY",
            SongsMode::Append => "ADD",
        };

        let mut accepted = Vec::new();
        let mut problems = Vec::new();
        for token in tokens {
            let token = unquote(token);
            match resolve_track(&self.music_dir, token) {
                Ok(path) => accepted.push(relative_to_root(&self.music_dir, &path)),
                Err(e) => {
                    warn!("{}: cannot use '{}': {}", verb, token, e);
                    problems.push(token.to_string());
                }
            }
        }

        if !problems.is_empty() {
            return Reply::status(nack(&problems.join("; "), line));
        }
        if accepted.is_empty() {
            warn!("{}: no songs in '{}'", verb, line);
            return Reply::status(nack(NO_SONGS_FOUND, line));
        }

        let quoted = accepted
            .iter()
            .map(|song| format!("\"{}\"", song))
            .collect::<Vec<_>>()
            .join(" ");

        match mode {
            SongsMode::Replace => {
                // The old playlist is gone even if the player refuses the new one
                playlist.clear();
                match self.player.play_songs(&accepted) {
                    Ok(()) => {
                        playlist.replace(accepted);
                        Reply::status(ack(&format!("{} {}", verb, quoted)))
                    }
                    Err(e) => Reply::status(self.player_failure(verb, &e)),
                }
            }
            SongsMode::Append => match self.player.add_songs(&accepted) {
                Ok(()) => {
                    playlist.extend(accepted);
                    Reply::status(ack(&format!("{} {}", verb, quoted)))
                }
                Err(e) => Reply::status(self.player_failure(verb, &e)),
            },
        }
    }

    fn list(&self, line: &str, path: &str) -> Reply {
        let path = unquote(path);
        if contains_dir_up(path) {
            warn!("LIST: rejected '{}'", path);
            return Reply::status(nack(PATH_CONTAINS_DIR_UP, line));
        }

        let directory = match resolve_directory(&self.music_dir, &split_fragments(path)) {
            Ok(directory) => directory,
            Err(ResolveError::Forbidden(fragment)) => {
                warn!("LIST: rejected fragment '{}'", fragment);
                return Reply::status(nack(PATH_CONTAINS_DIR_UP, line));
            }
            Err(e) => {
                warn!("LIST: {}", e);
                return Reply::status(nack(PATH_DOES_NOT_EXIST, line));
            }
        };

        let mut directories = Vec::new();
        let mut files = Vec::new();
        let walker = WalkDir::new(&directory)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true);
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    warn!("LIST: cannot read {:?}: {}", directory, e);
                    return Reply::status(nack(PATH_DOES_NOT_EXIST, line));
                }
                Err(e) => {
                    debug!("LIST: skipping entry: {}", e);
                    continue;
                }
            };

            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type().is_dir() {
                directories.push(name);
            } else if entry.file_type().is_file() && self.is_listed_file(entry.path()) {
                files.push(name);
            }
        }

        directories.sort_by_key(|name| name.to_lowercase());
        files.sort_by_key(|name| name.to_lowercase());

        let mut body: Vec<String> = directories.into_iter().map(|d| format!("{}/", d)).collect();
        body.extend(files);

        let relative = relative_to_root(&self.music_dir, &directory);
        Reply::with_body(body, ack(&format!("LIST {}", relative)))
    }

    fn is_listed_file(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| self.extensions.contains(&ext))
    }
}
