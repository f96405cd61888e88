//! CLI argument definitions for the Parlance binary.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Parlance — a real-time dictation session demo driven by a scripted engine.
#[derive(Parser, Debug)]
#[command(name = "parlance", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Recognition locale (BCP 47 tag, e.g. en-US).
    #[arg(long = "locale")]
    pub locale: Option<String>,

    /// Replay final results only, without provisional updates.
    #[arg(long = "no-interim")]
    pub no_interim: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > PARLANCE_CONFIG env var > ~/.parlance/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("PARLANCE_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }

    /// Resolve the recognition locale.
    ///
    /// Priority: --locale flag > config file value.
    pub fn resolve_locale(&self, config_locale: &str) -> String {
        self.locale
            .clone()
            .unwrap_or_else(|| config_locale.to_string())
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".parlance").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".parlance").join("config.toml");
    }
    PathBuf::from("config.toml")
}
