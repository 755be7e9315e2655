//! Console configuration: CLI flags and environment over an optional RON
//! file over built-in defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use fleet_core::{Action, DEFAULT_CADENCE};
use fleet_engine::{ApiTimeouts, EngineConfig, GatewaySettings};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_CONCURRENCY: usize = 5;

#[derive(Parser, Debug)]
#[command(
    name = "fleet_console",
    version,
    about = "Live console for a fleet of data-pipeline connectors"
)]
pub struct Cli {
    /// Control-plane API base url, e.g. https://connect.example.com
    #[arg(long, env = "FLEET_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Cluster id used in every API path
    #[arg(long, env = "FLEET_CLUSTER", global = true)]
    pub cluster: Option<String>,

    /// RON file with defaults for any of the options below
    #[arg(long, env = "FLEET_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Seconds between automatic refreshes
    #[arg(long, global = true)]
    pub interval_secs: Option<u64>,

    /// Maximum concurrent per-connector requests
    #[arg(long, global = true)]
    pub concurrency: Option<usize>,

    #[arg(long, global = true)]
    pub list_timeout_secs: Option<u64>,

    #[arg(long, global = true)]
    pub status_timeout_secs: Option<u64>,

    #[arg(long, global = true)]
    pub action_timeout_secs: Option<u64>,

    /// Where log output goes (default: file for `watch`, terminal otherwise)
    #[arg(long, value_enum, global = true)]
    pub log: Option<LogTarget>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum LogTarget {
    Terminal,
    File,
    Both,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ActionArg {
    Pause,
    Resume,
    Restart,
    Delete,
}

impl From<ActionArg> for Action {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::Pause => Action::Pause,
            ActionArg::Resume => Action::Resume,
            ActionArg::Restart => Action::Restart,
            ActionArg::Delete => Action::Delete,
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Interactive console with auto refresh (default)
    Watch,
    /// Refresh once and print the fleet
    List,
    /// Apply an action to one or more connectors
    Act {
        #[arg(value_enum)]
        action: ActionArg,
        #[arg(required = true)]
        names: Vec<String>,
        /// Confirm destructive actions (required for delete)
        #[arg(long)]
        yes: bool,
    },
    /// Check which plugin classes are installed
    Plugins {
        #[arg(required = true)]
        classes: Vec<String>,
    },
    /// Validate a connector configuration against its plugin
    Validate {
        class: String,
        /// Settings as key=value
        #[arg(value_parser = parse_key_value)]
        settings: Vec<(String, String)>,
    },
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got `{raw}`")),
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse config file {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("missing required setting `{0}` (flag, environment or config file)")]
    Missing(&'static str),
    #[error("invalid setting `{name}`: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// One layer of optional settings. The file and the command line both produce one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigLayer {
    pub base_url: Option<String>,
    pub cluster: Option<String>,
    pub interval_secs: Option<u64>,
    pub concurrency: Option<usize>,
    pub list_timeout_secs: Option<u64>,
    pub status_timeout_secs: Option<u64>,
    pub action_timeout_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
}

impl ConfigLayer {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            base_url: cli.base_url.clone(),
            cluster: cli.cluster.clone(),
            interval_secs: cli.interval_secs,
            concurrency: cli.concurrency,
            list_timeout_secs: cli.list_timeout_secs,
            status_timeout_secs: cli.status_timeout_secs,
            action_timeout_secs: cli.action_timeout_secs,
            connect_timeout_secs: None,
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&content).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }

    /// Values from `self` win over `base`.
    pub fn over(self, base: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            base_url: self.base_url.or(base.base_url),
            cluster: self.cluster.or(base.cluster),
            interval_secs: self.interval_secs.or(base.interval_secs),
            concurrency: self.concurrency.or(base.concurrency),
            list_timeout_secs: self.list_timeout_secs.or(base.list_timeout_secs),
            status_timeout_secs: self.status_timeout_secs.or(base.status_timeout_secs),
            action_timeout_secs: self.action_timeout_secs.or(base.action_timeout_secs),
            connect_timeout_secs: self.connect_timeout_secs.or(base.connect_timeout_secs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    pub base_url: String,
    pub cluster: String,
    pub cadence: Duration,
    pub concurrency: usize,
    pub timeouts: ApiTimeouts,
    pub connect_timeout: Duration,
}

impl ConsoleConfig {
    pub fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) => ConfigLayer::load(path)?,
            None => ConfigLayer::default(),
        };
        Self::from_layer(ConfigLayer::from_cli(cli).over(file))
    }

    pub fn from_layer(layer: ConfigLayer) -> Result<Self, ConfigError> {
        let base_url = layer
            .base_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::Missing("base_url"))?;
        let parsed = url::Url::parse(&base_url).map_err(|err| ConfigError::Invalid {
            name: "base_url",
            reason: err.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                name: "base_url",
                reason: format!("unsupported scheme `{}`", parsed.scheme()),
            });
        }

        let cluster = layer
            .cluster
            .map(|cluster| cluster.trim().to_string())
            .filter(|cluster| !cluster.is_empty())
            .ok_or(ConfigError::Missing("cluster"))?;

        let cadence = layer
            .interval_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_CADENCE);
        if cadence.is_zero() {
            return Err(ConfigError::Invalid {
                name: "interval_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        let concurrency = layer.concurrency.unwrap_or(DEFAULT_CONCURRENCY);
        if concurrency == 0 {
            return Err(ConfigError::Invalid {
                name: "concurrency",
                reason: "must be at least 1".to_string(),
            });
        }

        let defaults = ApiTimeouts::default();
        let timeouts = ApiTimeouts {
            list: layer
                .list_timeout_secs
                .map_or(defaults.list, Duration::from_secs),
            status: layer
                .status_timeout_secs
                .map_or(defaults.status, Duration::from_secs),
            action: layer
                .action_timeout_secs
                .map_or(defaults.action, Duration::from_secs),
        };
        let connect_timeout = layer
            .connect_timeout_secs
            .map_or(GatewaySettings::default().connect_timeout, Duration::from_secs);

        Ok(Self {
            base_url,
            cluster,
            cadence,
            concurrency,
            timeouts,
            connect_timeout,
        })
    }

    pub fn gateway_settings(&self) -> GatewaySettings {
        GatewaySettings {
            connect_timeout: self.connect_timeout,
            ..GatewaySettings::default()
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            base_url: self.base_url.clone(),
            cluster_id: self.cluster.clone(),
            concurrency: self.concurrency,
            timeouts: self.timeouts,
            gateway: self.gateway_settings(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn layer(base_url: &str, cluster: &str) -> ConfigLayer {
        ConfigLayer {
            base_url: Some(base_url.to_string()),
            cluster: Some(cluster.to_string()),
            ..ConfigLayer::default()
        }
    }

    #[test]
    fn defaults_fill_unset_values() {
        let config = ConsoleConfig::from_layer(layer("http://localhost:8080", "prod")).unwrap();
        assert_eq!(config.cadence, Duration::from_secs(10));
        assert_eq!(config.concurrency, 5);
        assert_eq!(config.timeouts, ApiTimeouts::default());
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn cli_layer_wins_over_file_layer() {
        let file = ConfigLayer {
            concurrency: Some(8),
            interval_secs: Some(30),
            ..layer("http://file.example.com", "staging")
        };
        let cli = ConfigLayer {
            cluster: Some("prod".to_string()),
            interval_secs: Some(5),
            ..ConfigLayer::default()
        };
        let config = ConsoleConfig::from_layer(cli.over(file)).unwrap();
        assert_eq!(config.base_url, "http://file.example.com");
        assert_eq!(config.cluster, "prod");
        assert_eq!(config.cadence, Duration::from_secs(5));
        assert_eq!(config.concurrency, 8);
    }

    #[test]
    fn rejects_invalid_settings() {
        assert!(matches!(
            ConsoleConfig::from_layer(ConfigLayer::default()),
            Err(ConfigError::Missing("base_url"))
        ));
        assert!(matches!(
            ConsoleConfig::from_layer(layer("ftp://x", "prod")),
            Err(ConfigError::Invalid { name: "base_url", .. })
        ));
        assert!(matches!(
            ConsoleConfig::from_layer(layer("http://x", "  ")),
            Err(ConfigError::Missing("cluster"))
        ));
        let zero = ConfigLayer {
            concurrency: Some(0),
            ..layer("http://x", "prod")
        };
        assert!(matches!(
            ConsoleConfig::from_layer(zero),
            Err(ConfigError::Invalid { name: "concurrency", .. })
        ));
    }

    #[test]
    fn loads_ron_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"(base_url: Some("https://connect.example.com"),"#).unwrap();
        writeln!(file, r#" cluster: Some("prod"), status_timeout_secs: Some(20))"#).unwrap();

        let loaded = ConfigLayer::load(file.path()).unwrap();
        let config = ConsoleConfig::from_layer(loaded).unwrap();
        assert_eq!(config.base_url, "https://connect.example.com");
        assert_eq!(config.timeouts.status, Duration::from_secs(20));
    }

    #[test]
    fn key_value_parser() {
        assert_eq!(
            parse_key_value("topics=a,b").unwrap(),
            ("topics".to_string(), "a,b".to_string())
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }
}
