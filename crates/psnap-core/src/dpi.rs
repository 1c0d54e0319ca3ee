//! ---
//! psnap_section: "04-acquisition-engine"
//! psnap_subsection: "module"
//! psnap_type: "source"
//! psnap_scope: "code"
//! psnap_description: "DPI Online Read Full record layout."
//! psnap_version: "v0.0.0-prealpha"
//! psnap_owner: "tbd"
//! ---
//! DPI Online Read Full: one response describes a parameter completely and
//! names the next parameter number, which makes it usable as a linked list
//! over an otherwise unknown parameter space.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::codec::{TypeTag, DPI_WRITABLE};
use crate::errors::{CoreError, Result};

/// Encoded size of one record.
pub const READ_FULL_LEN: usize = 52;
const UNITS_LEN: usize = 4;
const NAME_LEN: usize = 16;

/// One decoded Online Read Full response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadFull {
    pub descriptor: u32,
    pub value: [u8; 4],
    pub minimum: [u8; 4],
    pub maximum: [u8; 4],
    pub default: [u8; 4],
    /// Next parameter number, local to the port; 0 ends the list.
    pub next: u16,
    pub previous: u16,
    pub units: String,
    pub multiplier: u16,
    pub divisor: u16,
    pub base: u16,
    pub offset: i16,
    pub name: String,
}

impl ReadFull {
    pub fn data_type(&self) -> TypeTag {
        TypeTag::from_dpi_descriptor(self.descriptor)
    }

    pub fn is_writable(&self) -> bool {
        self.descriptor & DPI_WRITABLE != 0
    }

    pub fn parse(raw: &[u8]) -> Result<Self> {
        if raw.len() < READ_FULL_LEN {
            return Err(CoreError::MalformedReadFull {
                length: raw.len(),
                expected: READ_FULL_LEN,
            });
        }
        let mut buf = raw;
        let descriptor = buf.get_u32_le();
        let value = take4(&mut buf);
        let minimum = take4(&mut buf);
        let maximum = take4(&mut buf);
        let default = take4(&mut buf);
        let next = buf.get_u16_le();
        let previous = buf.get_u16_le();
        let units = ascii_field(&buf[..UNITS_LEN]);
        buf.advance(UNITS_LEN);
        let multiplier = buf.get_u16_le();
        let divisor = buf.get_u16_le();
        let base = buf.get_u16_le();
        let offset = buf.get_i16_le();
        let name = ascii_field(&buf[..NAME_LEN]);
        Ok(Self {
            descriptor,
            value,
            minimum,
            maximum,
            default,
            next,
            previous,
            units,
            multiplier,
            divisor,
            base,
            offset,
            name,
        })
    }

    /// Serialise in wire order; strings are space padded and truncated.
    pub fn encode(&self) -> Bytes {
        let mut out = BytesMut::with_capacity(READ_FULL_LEN);
        out.put_u32_le(self.descriptor);
        out.put_slice(&self.value);
        out.put_slice(&self.minimum);
        out.put_slice(&self.maximum);
        out.put_slice(&self.default);
        out.put_u16_le(self.next);
        out.put_u16_le(self.previous);
        put_padded(&mut out, &self.units, UNITS_LEN);
        out.put_u16_le(self.multiplier);
        out.put_u16_le(self.divisor);
        out.put_u16_le(self.base);
        out.put_i16_le(self.offset);
        put_padded(&mut out, &self.name, NAME_LEN);
        out.freeze()
    }
}

fn take4(buf: &mut &[u8]) -> [u8; 4] {
    let mut out = [0u8; 4];
    buf.copy_to_slice(&mut out);
    out
}

fn ascii_field(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_end_matches(|c: char| c == ' ' || c == '\0')
        .to_owned()
}

fn put_padded(out: &mut BytesMut, text: &str, len: usize) {
    let bytes = text.as_bytes();
    let used = bytes.len().min(len);
    out.put_slice(&bytes[..used]);
    out.put_bytes(b' ', len - used);
}
