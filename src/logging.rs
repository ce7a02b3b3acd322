use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use log::{debug, info, warn, LevelFilter};
use serde::{Deserialize, Serialize};
use env_logger::{Builder, Target, WriteStyle};
use strum_macros::{Display, EnumString};

/// Available logging subsystems in rmc
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LoggingSubsystem {
    /// Startup, shutdown and everything not covered elsewhere
    Main,
    /// Listener, admission and session slot
    Server,
    /// Per-connection command processing
    Session,
    /// Player controllers and launched programs
    Players,
    /// Path resolution below the music directory
    Resolver,
    /// Configuration loading and validation
    Config,
}

impl LoggingSubsystem {
    /// Get the module prefixes for this subsystem
    pub fn module_prefixes(&self) -> &'static [&'static str] {
        match self {
            LoggingSubsystem::Main => &["rmc", "rmc_client"],
            LoggingSubsystem::Server => &["rmc::server"],
            LoggingSubsystem::Session => &["rmc::server::session", "rmc::server::dispatcher", "rmc::helpers::session_timer"],
            LoggingSubsystem::Players => &["rmc::players"],
            LoggingSubsystem::Resolver => &["rmc::helpers::path_resolver"],
            LoggingSubsystem::Config => &["rmc::config"],
        }
    }

    /// Get all available subsystems
    pub fn all() -> Vec<LoggingSubsystem> {
        vec![
            LoggingSubsystem::Main,
            LoggingSubsystem::Server,
            LoggingSubsystem::Session,
            LoggingSubsystem::Players,
            LoggingSubsystem::Resolver,
            LoggingSubsystem::Config,
        ]
    }
}

/// Logging configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Global log level (off, error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Target for log output (stdout, stderr, file)
    #[serde(default = "default_target")]
    pub target: String,

    /// Log file path (when target is "file")
    pub file_path: Option<String>,

    #[serde(default = "default_true")]
    pub timestamps: bool,

    #[serde(default = "default_true")]
    pub colors: bool,

    /// Subsystem-specific log levels, keyed by subsystem or module name
    #[serde(default)]
    pub subsystems: HashMap<String, String>,

    #[serde(default)]
    pub include_module_path: bool,

    #[serde(default)]
    pub include_line_numbers: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_target() -> String {
    "stdout".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            target: default_target(),
            file_path: None,
            timestamps: true,
            colors: true,
            subsystems: HashMap::new(),
            include_module_path: false,
            include_line_numbers: false,
        }
    }
}

impl LoggingConfig {
    /// Load logging configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read logging config file: {}", e))?;
        Self::from_json(&content)
    }

    /// Load logging configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json)
            .map_err(|e| format!("Failed to parse logging config JSON: {}", e))
    }

    /// Convert string log level to LevelFilter, falling back to info
    fn parse_log_level(level: &str) -> LevelFilter {
        LevelFilter::from_str(level).unwrap_or_else(|_| {
            eprintln!("Warning: Unknown log level '{}', defaulting to 'info'", level);
            LevelFilter::Info
        })
    }

    /// Expand the subsystem table into (module, level) filter directives
    pub fn module_filters(&self) -> Vec<(String, LevelFilter)> {
        let mut filters = Vec::new();
        for (name, level) in &self.subsystems {
            let level = Self::parse_log_level(level);
            match LoggingSubsystem::from_str(name) {
                Ok(subsystem) => {
                    for prefix in subsystem.module_prefixes() {
                        filters.push((prefix.to_string(), level));
                    }
                }
                // Allow custom module specifications
                Err(_) => filters.push((name.clone(), level)),
            }
        }
        filters.sort();
        filters
    }

    /// Build the filter string in env_logger syntax, used for reporting
    pub fn build_filter_string(&self) -> String {
        let mut parts = vec![self.level.to_lowercase()];
        parts.extend(
            self.module_filters()
                .into_iter()
                .map(|(module, level)| format!("{}={}", module, level.as_str().to_lowercase())),
        );
        parts.join(",")
    }

    /// Initialize the logger with this configuration
    pub fn initialize_logger(&self) -> Result<(), String> {
        let filter_string = self.build_filter_string();

        let mut builder = Builder::new();
        builder.filter(None, Self::parse_log_level(&self.level));
        for (module, level) in self.module_filters() {
            builder.filter(Some(module.as_str()), level);
        }
        // RUST_LOG wins over the file
        builder.parse_env("RUST_LOG");

        builder.write_style(if self.colors { WriteStyle::Auto } else { WriteStyle::Never });

        match self.target.to_lowercase().as_str() {
            "stdout" => {
                builder.target(Target::Stdout);
            }
            "stderr" => {
                builder.target(Target::Stderr);
            }
            "file" => {
                let path = self
                    .file_path
                    .as_ref()
                    .ok_or_else(|| "File target specified but no file_path provided".to_string())?;
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|e| format!("Failed to open log file {}: {}", path, e))?;
                builder.write_style(WriteStyle::Never);
                builder.target(Target::Pipe(Box::new(file)));
            }
            _ => {
                return Err(format!("Unknown logging target: {}", self.target));
            }
        }

        let include_module_path = self.include_module_path;
        let include_line_numbers = self.include_line_numbers;
        let timestamps = self.timestamps;

        builder.format(move |buf, record| {
            if timestamps {
                write!(buf, "[{}] ", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"))?;
            }
            write!(buf, "[{}] ", record.level())?;
            if include_module_path {
                if let Some(module) = record.module_path() {
                    write!(buf, "[{}] ", module)?;
                }
            }
            if include_line_numbers {
                if let (Some(file), Some(line)) = (record.file(), record.line()) {
                    write!(buf, "[{}:{}] ", file, line)?;
                }
            }
            writeln!(buf, "{}", record.args())
        });

        builder
            .try_init()
            .map_err(|e| format!("Failed to initialize logger: {}", e))?;

        debug!("Logging initialized with filter: {}", filter_string);
        Ok(())
    }
}

/// Initialize logging from an optional config file and the command line verbosity flags.
///
/// `--debug` raises the global level to debug, `--verbose` to trace.
pub fn initialize_logging(config_file: Option<&Path>, debug_mode: bool, verbose_mode: bool) -> Result<(), String> {
    let mut missing_file = None;
    let mut config = match config_file {
        Some(path) if path.exists() => LoggingConfig::from_file(path)?,
        Some(path) => {
            missing_file = Some(path.display().to_string());
            LoggingConfig::default()
        }
        None => LoggingConfig::default(),
    };

    if verbose_mode {
        config.level = "trace".to_string();
    } else if debug_mode {
        config.level = "debug".to_string();
    }

    config.initialize_logger()?;

    if let Some(path) = missing_file {
        warn!("Logging config file {} not found, using defaults", path);
    }
    if verbose_mode || debug_mode {
        info!("Log level raised to {} via command line", config.level);
    }
    Ok(())
}
