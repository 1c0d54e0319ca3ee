//! ---
//! psnap_section: "02-transport-boundary"
//! psnap_subsection: "module"
//! psnap_type: "source"
//! psnap_scope: "code"
//! psnap_description: "Explicit-message transport boundary."
//! psnap_version: "v0.0.0-prealpha"
//! psnap_owner: "tbd"
//! ---
//! Boundary between the acquisition engine and whatever carries CIP explicit
//! messages to a device. Session setup, encapsulation and timeouts live
//! behind [`ExplicitMessaging`]; the engine only sees request/response bytes.
#![warn(missing_docs)]

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

pub mod cip;
pub mod mock;

pub use mock::MockTransport;

/// Shared result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Failures surfaced by a transport. The engine treats every variant alike.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// No response arrived within the transport's deadline.
    #[error("request timed out")]
    Timeout,
    /// The session was closed by the peer or never established.
    #[error("session disconnected")]
    Disconnected,
    /// The device answered with a non-zero CIP general status.
    #[error("cip error status 0x{general:02X}{}", extended_suffix(.extended))]
    CipStatus {
        /// General status byte.
        general: u8,
        /// Optional first extended status word.
        extended: Option<u16>,
    },
    /// Socket level failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Anything else a transport wants to report.
    #[error("{0}")]
    Other(String),
}

fn extended_suffix(extended: &Option<u16>) -> String {
    extended
        .map(|word| format!(" (extended 0x{word:04X})"))
        .unwrap_or_default()
}

impl TransportError {
    /// Shorthand for a CIP status failure without extended status.
    pub fn status(general: u8) -> Self {
        TransportError::CipStatus {
            general,
            extended: None,
        }
    }
}

/// One explicit request addressed to `class/instance[/attribute]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplicitRequest {
    /// CIP service code.
    pub service: u8,
    /// Object class.
    pub class_id: u16,
    /// Object instance; 0 addresses the class itself.
    pub instance: u32,
    /// Optional attribute segment.
    pub attribute: Option<u8>,
    /// Service data.
    #[serde(skip)]
    pub payload: Bytes,
}

impl ExplicitRequest {
    /// Build a request with an empty payload.
    pub fn new(service: u8, class_id: u16, instance: u32, attribute: Option<u8>) -> Self {
        Self {
            service,
            class_id,
            instance,
            attribute,
            payload: Bytes::new(),
        }
    }

    /// Attach service data.
    pub fn with_payload(mut self, payload: impl Into<Bytes>) -> Self {
        self.payload = payload.into();
        self
    }

    /// `Get_Attribute_Single` for `class/instance/attribute`.
    pub fn get_attribute_single(class_id: u16, instance: u32, attribute: u8) -> Self {
        Self::new(
            cip::service::GET_ATTRIBUTE_SINGLE,
            class_id,
            instance,
            Some(attribute),
        )
    }

    /// `Get_Attributes_All` for `class/instance`.
    pub fn get_attributes_all(class_id: u16, instance: u32) -> Self {
        Self::new(cip::service::GET_ATTRIBUTES_ALL, class_id, instance, None)
    }
}

impl fmt::Display for ExplicitRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "svc 0x{:02X} class 0x{:02X} inst {}",
            self.service, self.class_id, self.instance
        )?;
        if let Some(attribute) = self.attribute {
            write!(f, " attr {attribute}")?;
        }
        if !self.payload.is_empty() {
            write!(f, " ({} bytes)", self.payload.len())?;
        }
        Ok(())
    }
}

/// Request/response channel to a single device.
///
/// Calls block until the device answers or the transport gives up.
pub trait ExplicitMessaging {
    /// Send a request and return the response service data.
    fn send_explicit_message(&mut self, request: ExplicitRequest) -> Result<Bytes>;

    /// Read one attribute.
    fn get_attribute_single(&mut self, class_id: u16, instance: u32, attribute: u8) -> Result<Bytes> {
        self.send_explicit_message(ExplicitRequest::get_attribute_single(
            class_id, instance, attribute,
        ))
    }

    /// Human-readable transport name for logging.
    fn name(&self) -> &'static str;
}

impl<T: ExplicitMessaging + ?Sized> ExplicitMessaging for &mut T {
    fn send_explicit_message(&mut self, request: ExplicitRequest) -> Result<Bytes> {
        (**self).send_explicit_message(request)
    }

    fn get_attribute_single(&mut self, class_id: u16, instance: u32, attribute: u8) -> Result<Bytes> {
        (**self).get_attribute_single(class_id, instance, attribute)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

impl<T: ExplicitMessaging + ?Sized> ExplicitMessaging for Box<T> {
    fn send_explicit_message(&mut self, request: ExplicitRequest) -> Result<Bytes> {
        (**self).send_explicit_message(request)
    }

    fn get_attribute_single(&mut self, class_id: u16, instance: u32, attribute: u8) -> Result<Bytes> {
        (**self).get_attribute_single(class_id, instance, attribute)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_display_includes_attribute_and_payload() {
        let request = ExplicitRequest::new(cip::service::SCATTERED_READ, 0x93, 0, None)
            .with_payload(vec![0u8; 12]);
        assert_eq!(request.to_string(), "svc 0x4B class 0x93 inst 0 (12 bytes)");

        let single = ExplicitRequest::get_attribute_single(0x0F, 7, 1);
        assert_eq!(single.to_string(), "svc 0x0E class 0x0F inst 7 attr 1");
    }

    #[test]
    fn cip_status_error_formats_extended_word() {
        let err = TransportError::CipStatus {
            general: 0x1F,
            extended: Some(0x0102),
        };
        assert_eq!(err.to_string(), "cip error status 0x1F (extended 0x0102)");
        assert_eq!(
            TransportError::status(0x14).to_string(),
            "cip error status 0x14"
        );
    }
}
