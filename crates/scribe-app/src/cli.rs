//! Command-line arguments for the CivicScribe server.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use scribe_core::config::ScribeConfig;

const DEFAULT_PORT: u16 = 8000;

/// CivicScribe - conversational benefits-application interviews.
#[derive(Parser, Debug)]
#[command(name = "civicscribe", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// API server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Data directory for the transcript database, token and audio files.
    #[arg(short = 'd', long = "data-dir")]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Transcript backend ("sqlite" or "memory").
    #[arg(long = "storage")]
    pub storage: Option<String>,
}

impl CliArgs {
    /// Priority: --config flag > CIVICSCRIBE_CONFIG env var > ~/.civicscribe/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("CIVICSCRIBE_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Priority: --port flag > CIVICSCRIBE_PORT env var > config file value > 8000.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        if let Some(p) = self.port {
            return p;
        }
        if let Ok(val) = std::env::var("CIVICSCRIBE_PORT") {
            if let Ok(p) = val.parse::<u16>() {
                return p;
            }
        }
        if config_port != 0 {
            return config_port;
        }
        DEFAULT_PORT
    }

    /// Apply every override to a loaded configuration.
    pub fn apply(&self, config: &mut ScribeConfig) {
        config.server.port = self.resolve_port(config.server.port);
        if let Some(ref dir) = self.data_dir {
            config.general.data_dir = dir.to_string_lossy().to_string();
        }
        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(ref backend) = self.storage {
            config.storage.backend = backend.clone();
        }
    }
}

fn default_config_path() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".civicscribe").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let args = CliArgs::try_parse_from([
            "civicscribe",
            "-c",
            "/tmp/scribe.toml",
            "--port",
            "9001",
            "--storage",
            "memory",
        ])
        .unwrap();
        assert_eq!(args.resolve_config_path(), PathBuf::from("/tmp/scribe.toml"));
        assert_eq!(args.resolve_port(8000), 9001);
        assert_eq!(args.storage.as_deref(), Some("memory"));
    }

    #[test]
    fn test_rejects_invalid_port() {
        assert!(CliArgs::try_parse_from(["civicscribe", "--port", "99999"]).is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let args = CliArgs::try_parse_from([
            "civicscribe",
            "-p",
            "7000",
            "-d",
            "/srv/civicscribe",
            "-l",
            "debug",
        ])
        .unwrap();
        let mut config = ScribeConfig::default();
        args.apply(&mut config);
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.general.data_dir, "/srv/civicscribe");
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.storage.backend, "sqlite");
    }

    #[test]
    fn test_apply_without_flags_keeps_config() {
        let args = CliArgs::try_parse_from(["civicscribe"]).unwrap();
        let mut config = ScribeConfig::default();
        config.general.data_dir = "/var/lib/scribe".to_string();
        args.apply(&mut config);
        assert_eq!(config.general.data_dir, "/var/lib/scribe");
        assert_eq!(config.general.log_level, "info");
    }
}
