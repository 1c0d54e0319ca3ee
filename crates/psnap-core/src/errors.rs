//! ---
//! psnap_section: "04-acquisition-engine"
//! psnap_subsection: "module"
//! psnap_type: "source"
//! psnap_scope: "code"
//! psnap_description: "Error taxonomy of the acquisition engine."
//! psnap_version: "v0.0.0-prealpha"
//! psnap_owner: "tbd"
//! ---
use psnap_transport::TransportError;
use thiserror::Error;

use crate::codec::CodecError;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),
    #[error("decode failure: {0}")]
    Codec(#[from] CodecError),
    #[error("parameter {number} does not fit a {family} request record")]
    ParameterOutOfRange { number: u32, family: &'static str },
    #[error("identity response holds {length} bytes, at least {expected} required")]
    MalformedIdentity { length: usize, expected: usize },
    #[error("read-full response holds {length} bytes, {expected} required")]
    MalformedReadFull { length: usize, expected: usize },
    #[error("descriptor response holds {length} bytes")]
    MalformedDescriptor { length: usize },
    #[error("variant '{variant}' offers no parameter access for this device")]
    NoParameterAccess { variant: String },
}
