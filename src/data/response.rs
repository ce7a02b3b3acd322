//! Response lines of the client protocol.
//!
//! Every command answers with zero or more payload lines followed by exactly one status
//! line, which starts with either `ACK:` or `NACK (`.

/// Name announced in the greeting and in the busy notice
pub const SERVER_NAME: &str = "jRMC";

/// Sent when the idle timer expires
pub const TIMEOUT_NOTICE: &str = "ACK: TIMEOUT";

/// Sent when the absolute session deadline is reached
pub const SESSION_EXPIRED_NOTICE: &str = "ACK: SESSION EXPIRED";

/// NACK reason used when the player cannot perform an operation
pub const UNSUPPORTED_OPERATION: &str = "Unsupported Operation";

/// NACK reason for `PLAY`/`ADD` when every token was empty
pub const NO_SONGS_FOUND: &str = "No songs found";

/// NACK reason for `LIST` on a path that cannot be resolved
pub const PATH_DOES_NOT_EXIST: &str = "Path does not exist";

/// NACK reason for paths that try to leave the music directory
pub const PATH_CONTAINS_DIR_UP: &str = "Path must not contain \"..\"";

/// NACK reason for unknown commands
pub const COMMAND_NOT_RECOGNISED: &str = "Command not recognised";

/// Build a success status line
pub fn ack(subject: &str) -> String {
    format!("ACK: {}", subject)
}

/// Build a failure status line
pub fn nack(reason: &str, subject: &str) -> String {
    format!("NACK ({}): {}", reason, subject)
}

/// The line sent to every accepted client
pub fn greeting() -> String {
    ack(SERVER_NAME)
}

/// The line sent to a client that connects while another session is active
pub fn busy_notice() -> String {
    nack("busy", SERVER_NAME)
}

/// Check whether a line terminates a response
pub fn is_status_line(line: &str) -> bool {
    line.starts_with("ACK:") || line.starts_with("NACK (")
}

/// Usage text returned by `HELP`, without its status line
pub fn help_lines() -> Vec<String> {
    [
        "PLAY song1;song2;...",
        "\tCreate a new playlist with the specified songs and start playing",
        "ADD song1;song2;...",
        "\tAdds the specified songs to the current playlist",
        "PAUSE",
        "\tPause playback",
        "PLAY",
        "\tResume playback or re-start playback",
        "NEXT",
        "\tSkips to the next song",
        "PREV",
        "\tSkips to the previous song",
        "PREVIOUS",
        "\tSame as PREV",
        "RAND",
        "\tPlays a random song from the current playlist",
        "RANDOM",
        "\tSame as RAND",
        "STOP",
        "\tStops playback and deletes current playlist",
        "LIST directory",
        "\tLists the contents of the directory - folders first",
        "PLAYLIST",
        "\tLists all songs from the current playlist",
        "EXIT",
        "\tCloses the connection",
    ]
    .iter()
    .map(|line| line.to_string())
    .collect()
}
