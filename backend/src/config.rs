//! Configuration management.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration structure that matches the TOML file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    server: ServerConfig,
    #[serde(default)]
    logging: LoggingConfig,
    #[serde(default)]
    engine: EngineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ServerConfig {
    #[serde(default = "default_port")]
    port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct LoggingConfig {
    /// Path to log file (if set, logs will be written to file in addition to stdout)
    log_file: Option<PathBuf>,
    /// Log level (trace, debug, info, warn, error)
    log_level: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct EngineConfig {
    /// Empty tracks created at startup
    #[serde(default)]
    initial_tracks: usize,
}

/// Top-level tables of the config file.
const CONFIG_SECTIONS: [&str; 3] = ["server", "logging", "engine"];

fn default_port() -> u16 {
    mixdesk_types::DEFAULT_PORT
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Port to listen on
    pub port: u16,
    /// Path to log file (if set, logs will be written to file in addition to stdout)
    pub log_file: Option<PathBuf>,
    /// Log level (if set, overrides RUST_LOG environment variable)
    pub log_level: Option<String>,
    /// Number of empty tracks seeded at startup
    pub initial_tracks: usize,
}

impl Config {
    /// Load configuration with full priority chain: CLI args > env vars > config files > defaults.
    ///
    /// Config files are searched in this order:
    /// 1. `config.toml` in user config directory (~/.config/mixdesk/ on Linux)
    /// 2. `.mixdesk.toml` in current directory (wins over the user file)
    pub fn from_figment(
        port: Option<u16>,
        log_level: Option<String>,
        initial_tracks: Option<usize>,
    ) -> anyhow::Result<Self> {
        let local_config = std::env::current_dir()
            .ok()
            .map(|d| d.join(".mixdesk.toml"));
        let user_config = directories::ProjectDirs::from("", "", "mixdesk")
            .map(|dirs| dirs.config_dir().join("config.toml"));

        let mut figment = Figment::new().merge(Serialized::defaults(ConfigFile::default()));

        if let Some(ref path) = user_config {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        }

        if let Some(ref path) = local_config {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        }

        // MIXDESK_<SECTION>_<KEY>: the first underscore separates the section.
        // Other MIXDESK_* variables, such as the console's MIXDESK_SERVER, are not ours.
        figment = figment.merge(
            Env::prefixed("MIXDESK_")
                .filter(|key| {
                    let key = key.as_str().to_ascii_lowercase();
                    CONFIG_SECTIONS
                        .iter()
                        .any(|section| key.starts_with(&format!("{}_", section)))
                })
                .map(|key| key.as_str().replacen('_', ".", 1).into()),
        );

        if let Some(p) = port {
            figment = figment.merge(Serialized::default("server.port", p));
        }
        if let Some(ref level) = log_level {
            figment = figment.merge(Serialized::default("logging.log_level", level));
        }
        if let Some(n) = initial_tracks {
            figment = figment.merge(Serialized::default("engine.initial_tracks", n));
        }

        let config_file: ConfigFile = figment.extract()?;

        Ok(Self {
            port: config_file.server.port,
            log_file: config_file.logging.log_file,
            log_level: config_file.logging.log_level,
            initial_tracks: config_file.engine.initial_tracks,
        })
    }
}
