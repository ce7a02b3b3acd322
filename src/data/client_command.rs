//! Parsing of the line-based client protocol.
//!
//! A line consists of a case-insensitive verb, optionally followed by a space and an
//! argument string. `PLAY` and `ADD` take a list of song fragments separated by `;` or `:`,
//! `LIST` takes a single directory path. Every other verb must stand alone.

/// A parsed client request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    /// Print the session playlist
    Playlist,
    /// Resume or restart playback
    Play,
    /// Replace the playlist with the given song tokens
    PlaySongs(Vec<String>),
    /// Append the given song tokens to the playlist
    AddSongs(Vec<String>),
    Pause,
    Next,
    Previous,
    Random,
    Stop,
    /// List a directory below the music root (empty for the root itself)
    List(String),
    Help,
    Exit,
    /// Anything the server does not understand
    Unknown,
}

impl ClientCommand {
    /// Parse a line received from the client.
    ///
    /// Returns `None` for lines that are empty after trimming; those are ignored.
    pub fn parse(line: &str) -> Option<ClientCommand> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let (verb, args) = match line.split_once(' ') {
            Some((verb, args)) => (verb, args.trim()),
            None => (line, ""),
        };
        let verb = verb.to_lowercase();

        let command = match (verb.as_str(), args.is_empty()) {
            ("playlist", true) => ClientCommand::Playlist,
            ("play", true) => ClientCommand::Play,
            ("play", false) => ClientCommand::PlaySongs(split_arguments(args)),
            ("add", false) => ClientCommand::AddSongs(split_arguments(args)),
            ("pause", true) => ClientCommand::Pause,
            ("next", true) => ClientCommand::Next,
            ("prev", true) | ("previous", true) => ClientCommand::Previous,
            ("rand", true) | ("random", true) => ClientCommand::Random,
            ("stop", true) => ClientCommand::Stop,
            ("list", _) => ClientCommand::List(args.to_string()),
            ("help", true) => ClientCommand::Help,
            ("exit", true) => ClientCommand::Exit,
            _ => ClientCommand::Unknown,
        };

        Some(command)
    }

    /// The verb used in status lines for this command
    pub fn verb(&self) -> &'static str {
        match self {
            ClientCommand::Playlist => "PLAYLIST",
            ClientCommand::Play | ClientCommand::PlaySongs(_) => "PLAY",
            ClientCommand::AddSongs(_) => "ADD",
            ClientCommand::Pause => "PAUSE",
            ClientCommand::Next => "NEXT",
            ClientCommand::Previous => "PREV",
            ClientCommand::Random => "RAND",
            ClientCommand::Stop => "STOP",
            ClientCommand::List(_) => "LIST",
            ClientCommand::Help => "HELP",
            ClientCommand::Exit => "EXIT",
            ClientCommand::Unknown => "UNKNOWN",
        }
    }
}

/// Split a `PLAY`/`ADD` argument string into trimmed, non-empty tokens
fn split_arguments(args: &str) -> Vec<String> {
    args.split([';', ':'])
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_lines_are_ignored() {
        assert_eq!(ClientCommand::parse(""), None);
        assert_eq!(ClientCommand::parse("   \t "), None);
    }

    #[test]
    fn test_verbs_are_case_insensitive() {
        assert_eq!(ClientCommand::parse("PLAYLIST"), Some(ClientCommand::Playlist));
        assert_eq!(ClientCommand::parse("  pAuSe  "), Some(ClientCommand::Pause));
        assert_eq!(ClientCommand::parse("Exit"), Some(ClientCommand::Exit));
        assert_eq!(ClientCommand::parse("previous"), Some(ClientCommand::Previous));
        assert_eq!(ClientCommand::parse("PREV"), Some(ClientCommand::Previous));
        assert_eq!(ClientCommand::parse("random"), Some(ClientCommand::Random));
        assert_eq!(ClientCommand::parse("RAND"), Some(ClientCommand::Random));
    }

    #[test]
    fn test_play_with_and_without_arguments() {
        assert_eq!(ClientCommand::parse("play"), Some(ClientCommand::Play));
        assert_eq!(ClientCommand::parse("play   "), Some(ClientCommand::Play));
        assert_eq!(
            ClientCommand::parse("PLAY rock/song one; jazz:  \"blue\" "),
            Some(ClientCommand::PlaySongs(vec![
                "rock/song one".to_string(),
                "jazz".to_string(),
                "\"blue\"".to_string(),
            ]))
        );
    }

    #[test]
    fn test_empty_tokens_are_dropped() {
        assert_eq!(
            ClientCommand::parse("add a;;b; "),
            Some(ClientCommand::AddSongs(vec!["a".to_string(), "b".to_string()]))
        );
        assert_eq!(ClientCommand::parse("play ;"), Some(ClientCommand::PlaySongs(vec![])));
    }

    #[test]
    fn test_list_keeps_raw_path() {
        assert_eq!(ClientCommand::parse("list"), Some(ClientCommand::List(String::new())));
        assert_eq!(
            ClientCommand::parse("LIST  \"rock/70s\" "),
            Some(ClientCommand::List("\"rock/70s\"".to_string()))
        );
    }

    #[test]
    fn test_unrecognised_forms() {
        assert_eq!(ClientCommand::parse("add"), Some(ClientCommand::Unknown));
        assert_eq!(ClientCommand::parse("pause now"), Some(ClientCommand::Unknown));
        assert_eq!(ClientCommand::parse("playlist all"), Some(ClientCommand::Unknown));
        assert_eq!(ClientCommand::parse("shuffle"), Some(ClientCommand::Unknown));
        assert_eq!(ClientCommand::parse("play\tsong"), Some(ClientCommand::Unknown));
    }

    #[test]
    fn test_status_verbs() {
        assert_eq!(ClientCommand::PlaySongs(vec![]).verb(), "PLAY");
        assert_eq!(ClientCommand::Previous.verb(), "PREV");
        assert_eq!(ClientCommand::Random.verb(), "RAND");
    }
}
