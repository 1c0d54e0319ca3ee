//! ---
//! psnap_section: "04-acquisition-engine"
//! psnap_subsection: "module"
//! psnap_type: "source"
//! psnap_scope: "code"
//! psnap_description: "Parameter, identity and port records."
//! psnap_version: "v0.0.0-prealpha"
//! psnap_owner: "tbd"
//! ---
use bytes::{Buf, BufMut, Bytes, BytesMut};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};

use crate::catalog::CatalogEntry;
use crate::codec::{self, CodecError, ParamValue, TypeTag};
use crate::errors::{CoreError, Result};

/// Raw values keyed by parameter number, in the order they were parsed.
pub type ScatteredReadResult = IndexMap<u32, Bytes>;

/// One parameter of one device session.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub number: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub data_type: Option<TypeTag>,
    /// Eligible for active collection.
    #[serde(default)]
    pub record: bool,
    #[serde(default)]
    pub is_writable: bool,
    #[serde(default)]
    pub value: Option<ParamValue>,
    #[serde_as(as = "Option<Hex>")]
    #[serde(default)]
    pub value_raw: Option<Vec<u8>>,
    #[serde(default)]
    pub default_value: Option<ParamValue>,
    #[serde_as(as = "Option<Hex>")]
    #[serde(default)]
    pub default_value_raw: Option<Vec<u8>>,
}

impl ParameterDescriptor {
    pub fn new(number: u32) -> Self {
        Self {
            number,
            name: None,
            data_type: None,
            record: true,
            is_writable: false,
            value: None,
            value_raw: None,
            default_value: None,
            default_value_raw: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_type(mut self, data_type: TypeTag) -> Self {
        self.data_type = Some(data_type);
        self
    }

    pub fn with_record(mut self, record: bool) -> Self {
        self.record = record;
        self
    }

    /// Build from a static catalog row. A catalog default is materialised only
    /// when the row also declares its type.
    pub fn from_catalog(entry: &CatalogEntry) -> Self {
        let mut descriptor = Self::new(entry.number).with_record(entry.record);
        descriptor.name = Some(entry.name.to_owned());
        descriptor.data_type = entry.data_type;
        if let (Some(default), Some(tag)) = (entry.default_value, entry.data_type) {
            if let Ok(raw) = codec::encode_i64(default, tag) {
                descriptor.default_value = codec::decode(&raw, tag).ok();
                descriptor.default_value_raw = Some(raw);
            }
        }
        descriptor
    }

    /// Store a raw value and decode it when the type is known. The raw bytes
    /// are kept even when decoding fails.
    pub fn apply_value(&mut self, raw: &[u8]) -> std::result::Result<(), CodecError> {
        self.value_raw = Some(raw.to_vec());
        self.value = None;
        if let Some(tag) = self.data_type {
            self.value = Some(codec::decode(raw, tag)?);
        }
        Ok(())
    }

    pub fn apply_default(&mut self, raw: &[u8]) -> std::result::Result<(), CodecError> {
        self.default_value_raw = Some(raw.to_vec());
        if let Some(tag) = self.data_type {
            self.default_value = Some(codec::decode(raw, tag)?);
        }
        Ok(())
    }

    pub fn has_value(&self) -> bool {
        self.value_raw.is_some()
    }

    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

/// Minimum `Get_Attributes_All` identity response: fixed fields plus the
/// product-name length byte.
pub const IDENTITY_MIN_LEN: usize = 15;

/// Self-description of a device or backplane slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityDescriptor {
    pub vendor_id: u16,
    /// CIP device type.
    pub product_type: u16,
    pub product_code: u16,
    pub major_revision: u8,
    pub minor_revision: u8,
    pub status: u16,
    pub serial_number: u32,
    pub product_name: String,
}

impl IdentityDescriptor {
    /// Parse an Identity object `Get_Attributes_All` response.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        if raw.len() < IDENTITY_MIN_LEN {
            return Err(CoreError::MalformedIdentity {
                length: raw.len(),
                expected: IDENTITY_MIN_LEN,
            });
        }
        let mut buf = raw;
        let vendor_id = buf.get_u16_le();
        let product_type = buf.get_u16_le();
        let product_code = buf.get_u16_le();
        let major_revision = buf.get_u8();
        let minor_revision = buf.get_u8();
        let status = buf.get_u16_le();
        let serial_number = buf.get_u32_le();
        let name_len = usize::from(buf.get_u8());
        if buf.remaining() < name_len {
            return Err(CoreError::MalformedIdentity {
                length: raw.len(),
                expected: IDENTITY_MIN_LEN + name_len,
            });
        }
        let product_name = String::from_utf8_lossy(&buf[..name_len]).trim().to_owned();
        Ok(Self {
            vendor_id,
            product_type,
            product_code,
            major_revision,
            minor_revision,
            status,
            serial_number,
            product_name,
        })
    }

    pub fn encode(&self) -> Bytes {
        let name = self.product_name.as_bytes();
        let name_len = name.len().min(u8::MAX as usize);
        let mut out = BytesMut::with_capacity(IDENTITY_MIN_LEN + name_len);
        out.put_u16_le(self.vendor_id);
        out.put_u16_le(self.product_type);
        out.put_u16_le(self.product_code);
        out.put_u8(self.major_revision);
        out.put_u8(self.minor_revision);
        out.put_u16_le(self.status);
        out.put_u32_le(self.serial_number);
        out.put_u8(name_len as u8);
        out.put_slice(&name[..name_len]);
        out.freeze()
    }

    pub fn revision(&self) -> String {
        format!("{}.{:03}", self.major_revision, self.minor_revision)
    }
}

/// Address-space base of one backplane port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortMapEntry {
    pub port: u8,
    pub offset: u32,
}

/// Where a port's parameter list came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PortSource {
    /// Probed, not resolved yet.
    Pending,
    /// Static list from a known card definition.
    Card {
        label: String,
        class_id: u16,
        use_scattered: bool,
    },
    /// Enumerated with Online Read Full.
    Dynamic { class_id: u16 },
}

/// A populated backplane slot and its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortGroup {
    pub port: u8,
    pub offset: u32,
    pub identity: IdentityDescriptor,
    pub source: PortSource,
    /// Parameters numbered locally; add `offset` to address them.
    pub parameters: Vec<ParameterDescriptor>,
}

impl PortGroup {
    pub fn new(port: u8, offset: u32, identity: IdentityDescriptor) -> Self {
        Self {
            port,
            offset,
            identity,
            source: PortSource::Pending,
            parameters: Vec::new(),
        }
    }

    pub fn parameter(&self, local: u32) -> Option<&ParameterDescriptor> {
        self.parameters.iter().find(|p| p.number == local)
    }
}

/// Counters accumulated over one collection run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionStats {
    pub requests: usize,
    pub scattered_batches: usize,
    pub individual_reads: usize,
    pub batch_fallbacks: usize,
    pub device_errors: usize,
    pub truncations: usize,
    pub mismatches: usize,
    pub read_failures: usize,
    pub decode_failures: usize,
    pub warnings: usize,
}

/// Everything collected from one device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub variant: String,
    pub identity: Option<IdentityDescriptor>,
    pub collected_at: DateTime<Utc>,
    pub parameters: Vec<ParameterDescriptor>,
    pub ports: Vec<PortGroup>,
    pub stats: CollectionStats,
}

impl DeviceSnapshot {
    pub fn parameter(&self, number: u32) -> Option<&ParameterDescriptor> {
        self.parameters.iter().find(|p| p.number == number)
    }

    pub fn port(&self, port: u8) -> Option<&PortGroup> {
        self.ports.iter().find(|group| group.port == port)
    }

    /// Parameters holding a value, across the device and all ports.
    pub fn collected_count(&self) -> usize {
        self.parameters.iter().filter(|p| p.has_value()).count()
            + self
                .ports
                .iter()
                .flat_map(|group| group.parameters.iter())
                .filter(|p| p.has_value())
                .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::BaseType;

    fn identity(name: &str) -> IdentityDescriptor {
        IdentityDescriptor {
            vendor_id: 1,
            product_type: 0x8E,
            product_code: 0x0A20,
            major_revision: 12,
            minor_revision: 4,
            status: 0x0031,
            serial_number: 0xC0FF_EE01,
            product_name: name.into(),
        }
    }

    #[test]
    fn identity_parses_its_encoding() {
        let identity = identity("PowerFlex 755");
        let parsed = IdentityDescriptor::parse(&identity.encode()).unwrap();
        assert_eq!(parsed, identity);
        assert_eq!(parsed.revision(), "12.004");
    }

    #[test]
    fn identity_rejects_short_name() {
        let mut raw = identity("20-750-ENETR").encode().to_vec();
        raw.truncate(raw.len() - 3);
        assert!(matches!(
            IdentityDescriptor::parse(&raw),
            Err(CoreError::MalformedIdentity { .. })
        ));
        assert!(IdentityDescriptor::parse(&[0u8; 4]).is_err());
    }

    #[test]
    fn apply_value_keeps_raw_on_decode_failure() {
        let mut descriptor = ParameterDescriptor::new(7).with_type(TypeTag::new(BaseType::Dint));
        assert!(descriptor.apply_value(&[0x01, 0x02]).is_err());
        assert_eq!(descriptor.value_raw.as_deref(), Some(&[0x01, 0x02][..]));
        assert!(descriptor.value.is_none());
        assert!(descriptor.has_value());
    }

    #[test]
    fn catalog_default_is_materialised_with_type() {
        let entry = CatalogEntry::recorded(41, "Accel Time 1", TypeTag::scaled(BaseType::Uint, 2), 1000);
        let descriptor = ParameterDescriptor::from_catalog(&entry);
        assert_eq!(
            descriptor.default_value,
            Some(ParamValue::Scaled {
                raw: 1000,
                decimals: 2
            })
        );
        let untyped = ParameterDescriptor::from_catalog(&entry.untyped());
        assert!(untyped.default_value.is_none());
    }
}
