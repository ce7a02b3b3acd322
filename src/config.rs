// Configuration for the rmc server
//
// The configuration is a flat JSON object. A system wide file is read first and a per-user file
// second; keys in the user file override the system file. Keys that are missing everywhere fall
// back to the defaults below.

use crate::server::SessionSettings;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// System wide configuration file
pub const SYSTEM_CONFIG_PATH: &str = "/etc/rmc/rmc.json";

/// Name of the per-user configuration file in the home directory
pub const USER_CONFIG_FILE: &str = ".rmc.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RmcConfig {
    /// Root of the music collection; every client path is resolved below it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub music_dir: Option<PathBuf>,

    /// Directory containing the player executable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_dir: Option<PathBuf>,

    /// Name of the player executable, also selects the player implementation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_exec: Option<String>,

    pub bind_address: String,
    pub port: u16,

    /// Idle timeout in seconds, 0 disables it
    pub timeout: u64,

    /// Maximum session length in seconds, 0 disables it
    pub max_session_length: u64,

    /// File extensions listed by LIST
    pub extensions: Vec<String>,
}

impl Default for RmcConfig {
    fn default() -> Self {
        Self {
            music_dir: default_music_dir(),
            player_dir: None,
            player_exec: None,
            bind_address: "0.0.0.0".to_string(),
            port: 2000,
            timeout: 90,
            max_session_length: 300,
            extensions: vec!["mp3".to_string(), "wav".to_string()],
        }
    }
}

/// The user's music directory: the platform audio directory, or `~/Music` if that exists
fn default_music_dir() -> Option<PathBuf> {
    dirs::audio_dir().filter(|d| d.is_dir()).or_else(|| {
        dirs::home_dir()
            .map(|home| home.join("Music"))
            .filter(|d| d.is_dir())
    })
}

impl RmcConfig {
    /// Load the configuration from the system and the user configuration files.
    ///
    /// If the user file does not exist yet it is created with the effective configuration, so
    /// there is something to edit.
    pub fn discover() -> Result<Self, ConfigError> {
        let user_file = dirs::home_dir().map(|home| home.join(USER_CONFIG_FILE));
        Self::discover_from(Path::new(SYSTEM_CONFIG_PATH), user_file.as_deref())
    }

    /// Same as [`RmcConfig::discover`] with explicit file locations
    pub fn discover_from(system_file: &Path, user_file: Option<&Path>) -> Result<Self, ConfigError> {
        let defaults = match serde_json::to_value(Self::default()) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        let mut merged = defaults.clone();

        for path in std::iter::once(system_file).chain(user_file) {
            let Some(overrides) = read_object(path) else {
                continue;
            };
            // Each file has to make sense on its own
            let mut candidate = defaults.clone();
            merge_into(&mut candidate, overrides.clone());
            if let Err(e) = serde_json::from_value::<Self>(Value::Object(candidate)) {
                warn!("Skipping invalid configuration file {}: {}", path.display(), e);
                continue;
            }
            info!("Reading configuration from {}", path.display());
            merge_into(&mut merged, overrides);
        }

        let config: Self = serde_json::from_value(Value::Object(merged)).map_err(|source| ConfigError::Parse {
            origin: "merged configuration".to_string(),
            source,
        })?;

        if let Some(path) = user_file {
            if !path.exists() {
                match config.save_to_file(path) {
                    Ok(()) => info!("Created configuration file {}", path.display()),
                    Err(e) => warn!("Could not create {}: {}", path.display(), e),
                }
            }
        }

        Ok(config)
    }

    /// Load the configuration from exactly one file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            origin: path.display().to_string(),
            source,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|source| ConfigError::Parse {
            origin: "JSON string".to_string(),
            source,
        })
    }

    /// Write the configuration as pretty printed JSON
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            origin: path.display().to_string(),
            source,
        })?;
        fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Whether the configured executable selects the logging-only null player
    pub fn uses_null_player(&self) -> bool {
        self.player_exec
            .as_deref()
            .is_some_and(|exec| exec.to_lowercase().contains("null"))
    }

    /// Full path of the player executable, if both parts are configured
    pub fn player_program(&self) -> Option<PathBuf> {
        match (&self.player_dir, &self.player_exec) {
            (Some(dir), Some(exec)) => Some(dir.join(exec.trim())),
            _ => None,
        }
    }

    /// Address the listener binds to
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Check the configuration, reporting every problem found
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        match &self.music_dir {
            None => problems.push("music_dir is not set".to_string()),
            Some(dir) if !dir.is_dir() => {
                problems.push(format!("music_dir {} is not a directory", dir.display()))
            }
            Some(_) => {}
        }

        if self.player_exec.as_deref().map_or(true, |e| e.trim().is_empty()) {
            problems.push("player_exec is not set".to_string());
        }

        if !self.uses_null_player() {
            match &self.player_dir {
                None => problems.push("player_dir is not set".to_string()),
                Some(dir) if !dir.is_dir() => {
                    problems.push(format!("player_dir {} is not a directory", dir.display()))
                }
                Some(_) => {}
            }

            if let Some(program) = self.player_program() {
                if let Some(problem) = check_executable(&program) {
                    problems.push(problem);
                }
            }
        }

        if self.port == 0 {
            problems.push("port must be between 1 and 65535".to_string());
        }

        if problems.is_empty() {
            debug!("Configuration is valid");
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems))
        }
    }

    /// Timer settings for sessions; a zero timeout disables the timer
    pub fn session_settings(&self) -> SessionSettings {
        let seconds = |s: u64| (s > 0).then(|| Duration::from_secs(s));
        SessionSettings {
            idle_timeout: seconds(self.timeout),
            max_session_length: seconds(self.max_session_length),
        }
    }
}

/// Read a JSON object from `path`. Missing, unreadable or malformed files yield `None`.
fn read_object(path: &Path) -> Option<Map<String, Value>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("No configuration file at {}", path.display());
            return None;
        }
        Err(e) => {
            warn!("Skipping unreadable configuration file {}: {}", path.display(), e);
            return None;
        }
    };

    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => {
            warn!("Skipping {}: configuration must be a JSON object", path.display());
            None
        }
        Err(e) => {
            warn!("Skipping malformed configuration file {}: {}", path.display(), e);
            None
        }
    }
}

/// Copy every non-null key of `overrides` into `base`
fn merge_into(base: &mut Map<String, Value>, overrides: Map<String, Value>) {
    for (key, value) in overrides {
        if !value.is_null() {
            base.insert(key, value);
        }
    }
}

fn check_executable(program: &Path) -> Option<String> {
    let metadata = match fs::metadata(program) {
        Ok(metadata) => metadata,
        Err(_) => return Some(format!("player executable {} does not exist", program.display())),
    };
    if !metadata.is_file() {
        return Some(format!("player executable {} is not a file", program.display()));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if metadata.permissions().mode() & 0o111 == 0 {
            return Some(format!("player executable {} is not executable", program.display()));
        }
    }

    None
}
