//! ---
//! psnap_section: "07-operator-cli"
//! psnap_subsection: "binary"
//! psnap_type: "source"
//! psnap_scope: "code"
//! psnap_description: "Snapshot collection against a simulated device image."
//! psnap_version: "v0.0.0-prealpha"
//! psnap_owner: "tbd"
//! ---
use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use psnap_common::{init_tracing, AppConfig, CollectionConfig};
use psnap_core::{collect_device, CollectOptions, DeviceSnapshot, TracingObserver};
use psnap_logging::{psnap_error, psnap_info, psnap_warn, LogContext};
use psnap_sim::SimulatedDevice;

/// Configuration files inspected when `--config` is not given.
const DEFAULT_CONFIG_CANDIDATES: &[&str] = &["psnap.toml", "/etc/psnap/psnap.toml"];

#[derive(Debug, Args)]
pub struct CollectCommand {
    /// Device image (JSON or TOML). Defaults to `simulation.image`.
    #[arg(long, value_name = "FILE")]
    image: Option<PathBuf>,

    /// Configuration file; `PSNAP_CONFIG` takes precedence.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Family hint used when the identity does not match a variant.
    #[arg(long, value_name = "NAME")]
    family: Option<String>,

    /// Collect every catalog parameter, not only recorded ones.
    #[arg(long = "all")]
    collect_all: bool,

    /// Trace every collected value.
    #[arg(long)]
    verbose: bool,

    /// Skip the default-value backfill reads.
    #[arg(long = "no-defaults")]
    no_defaults: bool,

    /// Cap scattered batches at this many parameters.
    #[arg(long = "batch-size", value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    batch_size: Option<u16>,

    /// Write the snapshot here instead of stdout.
    #[arg(long, short, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Single-line JSON.
    #[arg(long)]
    compact: bool,
}

impl CollectCommand {
    /// Command-line flags layered over the configured collection settings.
    pub fn options(&self, config: &CollectionConfig) -> CollectOptions {
        CollectOptions {
            collect_all: self.collect_all || config.collect_all,
            verbose_trace: self.verbose || config.verbose_trace,
            read_defaults: !self.no_defaults && config.read_defaults,
            batch_size_override: self
                .batch_size
                .map(usize::from)
                .or(config.batch_size_override),
            family: self.family.clone().or_else(|| config.family.clone()),
        }
    }

    pub fn execute(self) -> Result<()> {
        let candidates: Vec<PathBuf> = match &self.config {
            Some(path) if !path.exists() => bail!("config file {} not found", path.display()),
            Some(path) => vec![path.clone()],
            None => DEFAULT_CONFIG_CANDIDATES.iter().map(PathBuf::from).collect(),
        };
        let loaded = AppConfig::load_with_source(&candidates)?;
        let config = loaded.config;
        init_tracing("psnapctl", &config.logging)?;
        if let Some(source) = &loaded.source {
            psnap_info!("configuration loaded from {}", source.display());
        }

        let image = self
            .image
            .clone()
            .or_else(|| config.simulation.image.clone())
            .ok_or_else(|| anyhow!("no device image; pass --image or set simulation.image"))?;
        let mut device = SimulatedDevice::from_path(&image)?
            .with_delay(config.simulation.response_delay);

        let options = self.options(&config.collection);
        let label = image.display().to_string();
        let mut observer = TracingObserver::new(label.clone());
        let snapshot = match collect_device(&mut device, &mut observer, &options) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                psnap_error!(
                    context = LogContext::new().with_device(&label),
                    "collection aborted after {} requests: {}",
                    device.request_count(),
                    err
                );
                return Err(err).with_context(|| format!("collection from {label} failed"));
            }
        };
        self.report(&label, &snapshot, device.request_count());

        let json = if self.compact {
            serde_json::to_string(&snapshot)?
        } else {
            serde_json::to_string_pretty(&snapshot)?
        };
        match &self.output {
            Some(path) => fs::write(path, json)
                .with_context(|| format!("unable to write snapshot {}", path.display()))?,
            None => println!("{json}"),
        }
        Ok(())
    }

    fn report(&self, label: &str, snapshot: &DeviceSnapshot, requests: usize) {
        let ctx = LogContext::new().with_device(label);
        psnap_info!(
            context = ctx.clone(),
            "variant {}: {} values across {} ports in {} requests",
            snapshot.variant,
            snapshot.collected_count(),
            snapshot.ports.len(),
            requests
        );
        if snapshot.stats.warnings > 0 {
            psnap_warn!(
                context = ctx,
                "{} warnings during collection",
                snapshot.stats.warnings
            );
        }
    }
}
