//! ---
//! psnap_section: "04-acquisition-engine"
//! psnap_subsection: "module"
//! psnap_type: "source"
//! psnap_scope: "code"
//! psnap_description: "Parameter acquisition engine for CIP motor-control devices."
//! psnap_version: "v0.0.0-prealpha"
//! psnap_owner: "tbd"
//! ---
//! Reads complete parameter sets from drives and overload relays over an
//! explicit-messaging transport: scattered reads in four wire families, a
//! type codec, a device variant registry and backplane port discovery.

pub mod cards;
pub mod catalog;
pub mod codec;
pub mod discovery;
pub mod dpi;
pub mod errors;
pub mod model;
pub mod observer;
pub mod pipeline;
pub mod reader;
pub mod registry;
pub mod scattered;

pub use codec::{BaseType, CodecError, ParamValue, TypeTag};
pub use errors::{CoreError, Result};
pub use model::{
    CollectionStats, DeviceSnapshot, IdentityDescriptor, ParameterDescriptor, PortGroup,
    PortMapEntry, PortSource, ScatteredReadResult,
};
pub use observer::{CollectionEvent, CollectionObserver, RecordingObserver, TracingObserver};
pub use pipeline::{collect, collect_device, collect_port, CollectOptions};
pub use reader::ParameterReader;
pub use registry::{resolve, DeviceVariantDescriptor, ResolveQuery, VariantBehavior};
pub use scattered::BatchFamily;
