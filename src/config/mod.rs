//! Configuration parsing and validation.
//!
//! Handles loading configuration from YAML files with environment variable
//! interpolation.

mod vars;

use serde::{Deserialize, Serialize};
use snafu::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::error::{
    ConfigError, EmptyArtifactSnafu, EmptySinkPathSnafu, EmptySourceUrlSnafu,
    EnvInterpolationSnafu, ReadFileSnafu, YamlParseSnafu,
};

/// Main configuration structure for the exporter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    pub sink: SinkConfig,
    /// Trigger configuration (optional; without any trigger the binary
    /// performs a single run and exits).
    #[serde(default)]
    pub trigger: TriggerConfig,
}

/// Source configuration for the registry download.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// URL of the gzip-compressed full dataset.
    #[serde(default = "default_source_url")]
    pub url: String,

    /// Emit a progress observation every this many records (debug level).
    #[serde(default = "default_progress_every")]
    pub progress_every: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: default_source_url(),
            progress_every: default_progress_every(),
        }
    }
}

fn default_source_url() -> String {
    "https://data.brreg.no/enhetsregisteret/oppslag/enheter/lastned".to_string()
}

fn default_progress_every() -> usize {
    10_000
}

/// Sink configuration for the output artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Destination container URL.
    /// Examples: "az://minimaler", "https://myaccount.blob.core.windows.net/minimaler",
    /// "/var/lib/brreg-export/out"
    pub path: String,

    /// Name of the artifact inside the container.
    #[serde(default = "default_artifact")]
    pub artifact: String,

    /// Storage options (account, credentials, etc.)
    #[serde(default)]
    pub storage_options: HashMap<String, String>,
}

fn default_artifact() -> String {
    "mainunits2.tsv".to_string()
}

/// Trigger configuration: a recurring schedule and/or an HTTP endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Seconds between scheduled runs. Absent = no schedule.
    #[serde(default)]
    pub interval_secs: Option<u64>,

    /// On-demand HTTP trigger. Absent = no endpoint.
    #[serde(default)]
    pub http: Option<HttpTriggerConfig>,
}

impl TriggerConfig {
    /// Interval between scheduled runs, if a schedule is configured.
    pub fn interval(&self) -> Option<Duration> {
        self.interval_secs.map(Duration::from_secs)
    }
}

/// Configuration for the on-demand HTTP trigger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpTriggerConfig {
    /// Address to bind the trigger endpoint (e.g. "0.0.0.0:8080").
    pub address: String,

    /// Bearer token required on refresh requests. Absent = unauthenticated.
    #[serde(default)]
    pub auth_token: Option<String>,
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).context(ReadFileSnafu)?;

        let content = vars::interpolate(&content).map_err(|errors| {
            EnvInterpolationSnafu {
                message: errors.join("\n"),
            }
            .build()
        })?;

        let config: Config = serde_yaml::from_str(&content).context(YamlParseSnafu)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        ensure!(!self.source.url.is_empty(), EmptySourceUrlSnafu);
        ensure!(!self.sink.path.is_empty(), EmptySinkPathSnafu);
        ensure!(!self.sink.artifact.is_empty(), EmptyArtifactSnafu);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_yaml_parsing() {
        let yaml = r#"
source:
  url: "https://data.brreg.no/enhetsregisteret/oppslag/enheter/lastned"
  progress_every: 5000

sink:
  path: "az://minimaler"
  artifact: "mainunits2.tsv"

trigger:
  interval_secs: 604800
  http:
    address: "0.0.0.0:8080"
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.source.progress_every, 5000);
        assert_eq!(config.sink.path, "az://minimaler");
        assert_eq!(
            config.trigger.interval(),
            Some(Duration::from_secs(604800))
        );
        assert_eq!(
            config.trigger.http.unwrap().address,
            "0.0.0.0:8080"
        );
    }

    #[test]
    fn test_config_defaults() {
        let yaml = r#"
sink:
  path: "/var/lib/brreg-export/out"
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.source.url.contains("data.brreg.no"));
        assert_eq!(config.source.progress_every, 10_000);
        assert_eq!(config.sink.artifact, "mainunits2.tsv");
        assert!(config.trigger.interval().is_none());
        assert!(config.trigger.http.is_none());
    }

    #[test]
    fn test_validation_rejects_empty_sink() {
        let config = Config {
            source: SourceConfig::default(),
            sink: SinkConfig {
                path: String::new(),
                artifact: default_artifact(),
                storage_options: HashMap::new(),
            },
            trigger: TriggerConfig::default(),
        };
        assert!(config.validate().is_err());
    }
}
