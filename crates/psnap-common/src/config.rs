//! ---
//! psnap_section: "01-core-functionality"
//! psnap_subsection: "module"
//! psnap_type: "source"
//! psnap_scope: "code"
//! psnap_description: "Shared configuration and tracing primitives."
//! psnap_version: "v0.0.0-prealpha"
//! psnap_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use tracing::debug;

use crate::logging::LogFormat;

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

fn default_read_defaults() -> bool {
    true
}

/// Primary configuration object for a collection run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub collection: CollectionConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Metadata describing where an [`AppConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedAppConfig {
    pub config: AppConfig,
    pub source: Option<PathBuf>,
}

impl AppConfig {
    pub const ENV_CONFIG_PATH: &str = "PSNAP_CONFIG";

    /// Load configuration from disk, respecting the `PSNAP_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Ok(Self::load_with_source(candidates)?.config)
    }

    /// Load configuration together with the effective source path.
    ///
    /// An explicit `PSNAP_CONFIG` must exist; otherwise the first existing
    /// candidate wins and built-in defaults apply when none exist.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(&path)?;
                return Ok(LoadedAppConfig {
                    config,
                    source: Some(path),
                });
            }
        }

        for candidate in candidates {
            if candidate.as_ref().exists() {
                let path = candidate.as_ref().to_path_buf();
                let config = Self::from_path(&path)?;
                return Ok(LoadedAppConfig {
                    config,
                    source: Some(path),
                });
            }
        }

        debug!(
            inspected = candidates.len(),
            "no configuration file found, using defaults"
        );
        Ok(LoadedAppConfig {
            config: AppConfig::default(),
            source: None,
        })
    }

    fn from_path(path: &Path) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let config = toml::from_str::<AppConfig>(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        self.collection.validate()?;
        Ok(())
    }
}

impl std::str::FromStr for AppConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

/// Knobs for the parameter pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Collect every catalog parameter, not only those flagged for recording.
    #[serde(default)]
    pub collect_all: bool,
    /// Emit one trace line per collected parameter.
    #[serde(default)]
    pub verbose_trace: bool,
    /// Backfill missing defaults with one extra read per parameter.
    #[serde(default = "default_read_defaults")]
    pub read_defaults: bool,
    /// Cap the scattered-read batch size below the family limit.
    #[serde(default)]
    pub batch_size_override: Option<usize>,
    /// Operator hint naming the device family when identity is unreliable.
    #[serde(default)]
    pub family: Option<String>,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            collect_all: false,
            verbose_trace: false,
            read_defaults: default_read_defaults(),
            batch_size_override: None,
            family: None,
        }
    }
}

impl CollectionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size_override == Some(0) {
            return Err(anyhow!("collection.batch_size_override must be at least 1"));
        }
        if let Some(family) = &self.family {
            if family.trim().is_empty() {
                return Err(anyhow!("collection.family cannot be blank"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub file_prefix: Option<String>,
    /// Skip the rolling file layer and log to stdout only.
    #[serde(default)]
    pub stdout_only: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            format: default_log_format(),
            file_prefix: None,
            stdout_only: false,
        }
    }
}

/// Settings for the simulated device used when no live transport is wired in.
#[serde_as]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Device image (JSON or TOML) describing the simulated device.
    #[serde(default)]
    pub image: Option<PathBuf>,
    /// Artificial per-request latency.
    #[serde(default)]
    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    pub response_delay: Option<Duration>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_enable_default_backfill() {
        let config: AppConfig = "".parse().unwrap();
        assert!(config.collection.read_defaults);
        assert!(!config.collection.collect_all);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.simulation.image.is_none());
    }

    #[test]
    fn parses_collection_and_simulation_sections() {
        let config: AppConfig = r#"
            [collection]
            collect_all = true
            batch_size_override = 8
            family = "PowerFlex 755"

            [simulation]
            image = "images/pf755.json"
            response_delay = 25
        "#
        .parse()
        .unwrap();
        assert!(config.collection.collect_all);
        assert_eq!(config.collection.batch_size_override, Some(8));
        assert_eq!(config.collection.family.as_deref(), Some("PowerFlex 755"));
        assert_eq!(
            config.simulation.response_delay,
            Some(Duration::from_millis(25))
        );
    }

    #[test]
    fn rejects_zero_batch_size() {
        let err = "[collection]\nbatch_size_override = 0"
            .parse::<AppConfig>()
            .unwrap_err();
        assert!(err.to_string().contains("batch_size_override"));
    }

    #[test]
    fn loads_first_existing_candidate() {
        std::env::remove_var(AppConfig::ENV_CONFIG_PATH);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("psnap.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[collection]\nverbose_trace = true").unwrap();

        let missing = dir.path().join("missing.toml");
        let loaded = AppConfig::load_with_source(&[missing, path.clone()]).unwrap();
        assert_eq!(loaded.source.as_deref(), Some(path.as_path()));
        assert!(loaded.config.collection.verbose_trace);
    }
}
