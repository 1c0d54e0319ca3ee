//! ---
//! psnap_section: "06-simulation"
//! psnap_subsection: "module"
//! psnap_type: "source"
//! psnap_scope: "code"
//! psnap_description: "Simulated device module exports."
//! psnap_version: "v0.0.0-prealpha"
//! psnap_owner: "tbd"
//! ---
//! A drive or relay in memory, answering the same explicit messages a real
//! device would. Device images are JSON or TOML files.

pub mod device;
pub mod image;

pub use device::SimulatedDevice;
pub use image::{DeviceImage, FaultPlan, ParameterImage, PortImage};
