//! ---
//! psnap_section: "01-core-functionality"
//! psnap_subsection: "module"
//! psnap_type: "source"
//! psnap_scope: "code"
//! psnap_description: "Shared configuration and tracing primitives."
//! psnap_version: "v0.0.0-prealpha"
//! psnap_owner: "tbd"
//! ---
//! Shared primitives for the paramsnap workspace: configuration loading and
//! tracing initialisation consumed by the CLI and the simulator.

pub mod config;
pub mod logging;

pub use config::{AppConfig, CollectionConfig, LoadedAppConfig, LoggingConfig, SimulationConfig};
pub use logging::{init_tracing, LogFormat};
