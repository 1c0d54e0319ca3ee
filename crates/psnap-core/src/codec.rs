//! ---
//! psnap_section: "04-acquisition-engine"
//! psnap_subsection: "module"
//! psnap_type: "source"
//! psnap_scope: "code"
//! psnap_description: "Typed decoding of raw parameter payloads."
//! psnap_version: "v0.0.0-prealpha"
//! psnap_owner: "tbd"
//! ---
//! Turns raw little-endian parameter payloads into typed values.
//!
//! A [`TypeTag`] is whatever the device declared for a parameter, either a CIP
//! elementary data-type code or a DPI descriptor word. Payloads may be longer
//! than the declared width (32-bit scattered records carry 16-bit values); only
//! the leading bytes are consumed.

use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

/// DPI descriptor: data type field.
const DPI_TYPE_MASK: u32 = 0x0007;
/// DPI descriptor: decimal places field.
const DPI_DECIMALS_SHIFT: u32 = 4;
const DPI_DECIMALS_MASK: u32 = 0x00F0;
/// DPI descriptor: parameter may be written.
pub const DPI_WRITABLE: u32 = 1 << 10;
/// Largest scale a DPI descriptor can declare.
pub const MAX_DECIMALS: u8 = 15;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("payload holds {available} bytes, {needed} required")]
    Truncated { needed: usize, available: usize },
    #[error("value {value} does not fit {base}")]
    OutOfRange { value: i64, base: BaseType },
    #[error("unknown CIP data type code 0x{0:02X}")]
    UnknownCipType(u8),
}

/// Storage class of a parameter value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BaseType {
    /// 8 flag bits.
    Bool8,
    /// 16 flag bits.
    Bool16,
    /// 32 flag bits.
    Bool32,
    Usint,
    Uint,
    Udint,
    Sint,
    Int,
    Dint,
    Real,
}

impl BaseType {
    /// Bytes occupied on the wire.
    pub const fn width(self) -> usize {
        match self {
            BaseType::Bool8 | BaseType::Usint | BaseType::Sint => 1,
            BaseType::Bool16 | BaseType::Uint | BaseType::Int => 2,
            BaseType::Bool32 | BaseType::Udint | BaseType::Dint | BaseType::Real => 4,
        }
    }

    pub const fn is_flags(self) -> bool {
        matches!(self, BaseType::Bool8 | BaseType::Bool16 | BaseType::Bool32)
    }

    pub const fn is_signed(self) -> bool {
        matches!(self, BaseType::Sint | BaseType::Int | BaseType::Dint)
    }

    /// Map a CIP elementary data-type code.
    pub fn from_cip_code(code: u8) -> Result<Self, CodecError> {
        Ok(match code {
            0xC1 | 0xD1 => BaseType::Bool8,
            0xD2 => BaseType::Bool16,
            0xD3 => BaseType::Bool32,
            0xC2 => BaseType::Sint,
            0xC3 => BaseType::Int,
            0xC4 => BaseType::Dint,
            0xC6 => BaseType::Usint,
            0xC7 => BaseType::Uint,
            0xC8 => BaseType::Udint,
            0xCA => BaseType::Real,
            other => return Err(CodecError::UnknownCipType(other)),
        })
    }

    pub const fn cip_code(self) -> u8 {
        match self {
            BaseType::Bool8 => 0xD1,
            BaseType::Bool16 => 0xD2,
            BaseType::Bool32 => 0xD3,
            BaseType::Sint => 0xC2,
            BaseType::Int => 0xC3,
            BaseType::Dint => 0xC4,
            BaseType::Usint => 0xC6,
            BaseType::Uint => 0xC7,
            BaseType::Udint => 0xC8,
            BaseType::Real => 0xCA,
        }
    }

    fn from_dpi_code(code: u32) -> Self {
        match code & DPI_TYPE_MASK {
            0 => BaseType::Uint,
            1 => BaseType::Bool16,
            2 => BaseType::Udint,
            3 => BaseType::Bool32,
            4 => BaseType::Int,
            5 => BaseType::Dint,
            6 => BaseType::Real,
            _ => BaseType::Usint,
        }
    }

    fn dpi_code(self) -> u32 {
        match self {
            BaseType::Uint => 0,
            BaseType::Bool16 => 1,
            BaseType::Udint => 2,
            BaseType::Bool32 => 3,
            BaseType::Int | BaseType::Sint => 4,
            BaseType::Dint => 5,
            BaseType::Real => 6,
            BaseType::Usint | BaseType::Bool8 => 7,
        }
    }

    fn range(self) -> (i64, i64) {
        match self {
            BaseType::Bool8 | BaseType::Usint => (0, u8::MAX as i64),
            BaseType::Bool16 | BaseType::Uint => (0, u16::MAX as i64),
            BaseType::Bool32 | BaseType::Udint => (0, u32::MAX as i64),
            BaseType::Sint => (i8::MIN as i64, i8::MAX as i64),
            BaseType::Int => (i16::MIN as i64, i16::MAX as i64),
            BaseType::Dint | BaseType::Real => (i32::MIN as i64, i32::MAX as i64),
        }
    }
}

/// Device-declared type of a parameter: storage class plus fixed-point scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeTag {
    pub base: BaseType,
    /// Implied decimal places; only meaningful for integer storage.
    #[serde(default, deserialize_with = "bounded_decimals")]
    pub decimals: u8,
}

fn bounded_decimals<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let decimals = u8::deserialize(deserializer)?;
    if decimals > MAX_DECIMALS {
        return Err(de::Error::custom(format!(
            "{decimals} decimal places exceed the maximum of {MAX_DECIMALS}"
        )));
    }
    Ok(decimals)
}

impl TypeTag {
    pub const fn new(base: BaseType) -> Self {
        Self { base, decimals: 0 }
    }

    pub const fn scaled(base: BaseType, decimals: u8) -> Self {
        Self { base, decimals }
    }

    pub const fn width(self) -> usize {
        self.base.width()
    }

    pub fn from_cip_code(code: u8) -> Result<Self, CodecError> {
        BaseType::from_cip_code(code).map(Self::new)
    }

    /// Decode a DPI descriptor word: bits 0-2 data type, bits 4-7 decimals.
    pub fn from_dpi_descriptor(descriptor: u32) -> Self {
        Self {
            base: BaseType::from_dpi_code(descriptor),
            decimals: ((descriptor & DPI_DECIMALS_MASK) >> DPI_DECIMALS_SHIFT) as u8,
        }
    }

    pub fn to_dpi_descriptor(self, writable: bool) -> u32 {
        let mut descriptor = self.base.dpi_code()
            | ((u32::from(self.decimals.min(15)) << DPI_DECIMALS_SHIFT) & DPI_DECIMALS_MASK);
        if writable {
            descriptor |= DPI_WRITABLE;
        }
        descriptor
    }

    fn is_scaled(self) -> bool {
        self.decimals > 0 && !self.base.is_flags() && self.base != BaseType::Real
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_scaled() {
            write!(f, "{}/{}", self.base, self.decimals)
        } else {
            write!(f, "{}", self.base)
        }
    }
}

/// A decoded parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParamValue {
    Unsigned { value: u32 },
    Signed { value: i32 },
    /// Bit-packed flag word; `width` is the number of meaningful bits.
    Flags { bits: u32, width: u8 },
    /// Fixed-point value equal to `raw / 10^decimals`.
    Scaled { raw: i64, decimals: u8 },
    Real { value: f32 },
}

impl ParamValue {
    /// Integer view used for encoding; `None` for reals.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            ParamValue::Unsigned { value } => Some(i64::from(value)),
            ParamValue::Signed { value } => Some(i64::from(value)),
            ParamValue::Flags { bits, .. } => Some(i64::from(bits)),
            ParamValue::Scaled { raw, .. } => Some(raw),
            ParamValue::Real { .. } => None,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            ParamValue::Scaled { raw, decimals } => raw as f64 / 10f64.powi(i32::from(decimals)),
            ParamValue::Real { value } => f64::from(value),
            other => other.as_i64().unwrap_or_default() as f64,
        }
    }

    /// Whether flag bit `index` is set; `None` for non-flag values.
    pub fn flag(&self, index: u8) -> Option<bool> {
        match *self {
            ParamValue::Flags { bits, width } if index < width => Some(bits & (1 << index) != 0),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ParamValue::Unsigned { value } => write!(f, "{value}"),
            ParamValue::Signed { value } => write!(f, "{value}"),
            ParamValue::Flags { bits, width } => {
                write!(f, "0b{:0width$b}", bits, width = usize::from(width))
            }
            ParamValue::Scaled { raw, decimals } => {
                let Some(scale) = 10u64.checked_pow(u32::from(decimals)) else {
                    return write!(f, "{raw}e-{decimals}");
                };
                let sign = if raw < 0 { "-" } else { "" };
                let magnitude = raw.unsigned_abs();
                write!(
                    f,
                    "{sign}{}.{:0width$}",
                    magnitude / scale,
                    magnitude % scale,
                    width = usize::from(decimals)
                )
            }
            ParamValue::Real { value } => write!(f, "{value}"),
        }
    }
}

/// Decode the leading bytes of `raw` as `tag`.
pub fn decode(raw: &[u8], tag: TypeTag) -> Result<ParamValue, CodecError> {
    let width = tag.width();
    let bytes = raw.get(..width).ok_or(CodecError::Truncated {
        needed: width,
        available: raw.len(),
    })?;

    let integer: i64 = match tag.base {
        BaseType::Usint | BaseType::Bool8 => i64::from(bytes[0]),
        BaseType::Sint => i64::from(bytes[0] as i8),
        BaseType::Uint | BaseType::Bool16 => i64::from(u16::from_le_bytes([bytes[0], bytes[1]])),
        BaseType::Int => i64::from(i16::from_le_bytes([bytes[0], bytes[1]])),
        BaseType::Udint | BaseType::Bool32 => {
            i64::from(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
        }
        BaseType::Dint => i64::from(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])),
        BaseType::Real => {
            let value = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            return Ok(ParamValue::Real { value });
        }
    };

    if tag.base.is_flags() {
        return Ok(ParamValue::Flags {
            bits: integer as u32,
            width: (width * 8) as u8,
        });
    }
    if tag.is_scaled() {
        return Ok(ParamValue::Scaled {
            raw: integer,
            decimals: tag.decimals,
        });
    }
    Ok(if tag.base.is_signed() {
        ParamValue::Signed {
            value: integer as i32,
        }
    } else {
        ParamValue::Unsigned {
            value: integer as u32,
        }
    })
}

/// Encode an integer (or the integral part of a real) as `tag` would store it.
pub fn encode_i64(value: i64, tag: TypeTag) -> Result<Vec<u8>, CodecError> {
    if tag.base == BaseType::Real {
        return Ok((value as f32).to_le_bytes().to_vec());
    }
    let (min, max) = tag.base.range();
    if value < min || value > max {
        return Err(CodecError::OutOfRange {
            value,
            base: tag.base,
        });
    }
    let bytes = value.to_le_bytes();
    Ok(bytes[..tag.width()].to_vec())
}

/// Inverse of [`decode`].
pub fn encode(value: &ParamValue, tag: TypeTag) -> Result<Vec<u8>, CodecError> {
    match (value, tag.base) {
        (ParamValue::Real { value }, BaseType::Real) => Ok(value.to_le_bytes().to_vec()),
        (ParamValue::Real { value }, _) => encode_i64(value.round() as i64, tag),
        (other, _) => encode_i64(other.as_i64().unwrap_or_default(), tag),
    }
}
