//! ---
//! psnap_section: "04-acquisition-engine"
//! psnap_subsection: "module"
//! psnap_type: "source"
//! psnap_scope: "code"
//! psnap_description: "Scattered-read request layouts and response parsing per family."
//! psnap_version: "v0.0.0-prealpha"
//! psnap_owner: "tbd"
//! ---
//! A scattered read asks for many parameters in one `0x4B` request. Each
//! family fixes the record size on both sides and the way the device marks a
//! parameter it could not read.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::errors::{CoreError, Result};
use crate::model::ScatteredReadResult;
use crate::observer::CollectionEvent;

/// Bit the backplane family flips in the echoed number to signal an error.
pub const BACKPLANE_ERROR_FLAG: u32 = 0x8000;
/// Sign bit of the 16-bit echoed number used by families A and B.
const SIGNED_NUMBER_MASK: u16 = 0x7FFF;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum BatchFamily {
    /// 16-bit number, 16-bit value.
    Simple16,
    /// 16-bit number, 32-bit value with embedded error code.
    Extended,
    /// As `Extended`, over a slower link: half the batch and a trailing pad.
    ExtendedLowThroughput,
    /// 32-bit number and value; errors flip bit 15 of the echo.
    Backplane32,
}

impl BatchFamily {
    pub const fn request_len(self) -> usize {
        match self {
            BatchFamily::Simple16 => 4,
            BatchFamily::Extended | BatchFamily::ExtendedLowThroughput => 6,
            BatchFamily::Backplane32 => 8,
        }
    }

    pub const fn response_len(self) -> usize {
        self.request_len()
    }

    /// Bytes appended once after the last request record.
    pub const fn trailing_len(self) -> usize {
        match self {
            BatchFamily::ExtendedLowThroughput => 2,
            _ => 0,
        }
    }

    pub const fn default_batch_size(self) -> usize {
        match self {
            BatchFamily::Simple16 => 64,
            BatchFamily::Extended => 22,
            BatchFamily::ExtendedLowThroughput => 11,
            BatchFamily::Backplane32 => 32,
        }
    }

    /// Largest parameter number a request record can carry.
    pub const fn max_number(self) -> u32 {
        match self {
            BatchFamily::Backplane32 => i32::MAX as u32,
            _ => SIGNED_NUMBER_MASK as u32,
        }
    }

    /// Width of the value field in a response record.
    pub const fn value_len(self) -> usize {
        match self {
            BatchFamily::Simple16 => 2,
            _ => 4,
        }
    }

    const fn number_len(self) -> usize {
        self.response_len() - self.value_len()
    }
}

/// Build a scattered-read payload: one record per number, in order.
pub fn build_request(family: BatchFamily, numbers: &[u32]) -> Result<Bytes> {
    let mut out =
        BytesMut::with_capacity(numbers.len() * family.request_len() + family.trailing_len());
    for &number in numbers {
        if number > family.max_number() {
            return Err(CoreError::ParameterOutOfRange {
                number,
                family: family.into(),
            });
        }
        match family {
            BatchFamily::Simple16 => {
                out.put_u16_le(number as u16);
                out.put_bytes(0, 2);
            }
            BatchFamily::Extended | BatchFamily::ExtendedLowThroughput => {
                out.put_u16_le(number as u16);
                out.put_bytes(0, 4);
            }
            BatchFamily::Backplane32 => {
                out.put_i32_le(number as i32);
                out.put_bytes(0, 4);
            }
        }
    }
    out.put_bytes(0, family.trailing_len());
    Ok(out.freeze())
}

/// Parse a scattered-read response against the numbers that were requested.
///
/// Successful records are stored under the requested number. A record whose
/// echo names a different parameter is reported and stored under the echoed
/// number. Device errors are reported and omitted. A short tail stops parsing
/// and keeps what was already decoded.
pub fn parse_response(
    family: BatchFamily,
    raw: &Bytes,
    expected: &[u32],
    report: &mut dyn FnMut(CollectionEvent),
) -> ScatteredReadResult {
    let record_len = family.response_len();
    let mut result = ScatteredReadResult::with_capacity(expected.len());

    for (index, &number) in expected.iter().enumerate() {
        let start = index * record_len;
        if raw.len() < start + record_len {
            report(CollectionEvent::Truncated {
                number,
                available: raw.len().saturating_sub(start),
                needed: record_len,
            });
            break;
        }
        let mut record = &raw[start..start + record_len];
        let value = raw.slice(start + family.number_len()..start + record_len);

        let echoed = match family {
            BatchFamily::Backplane32 => {
                let echoed = record.get_i32_le() as u32;
                if echoed == number {
                    result.insert(number, value);
                    continue;
                }
                if echoed == number ^ BACKPLANE_ERROR_FLAG {
                    report(CollectionEvent::DeviceError {
                        number,
                        echoed,
                        code: None,
                    });
                    continue;
                }
                echoed
            }
            _ => {
                let echoed = record.get_i16_le();
                if echoed < 0 {
                    let code = match family {
                        BatchFamily::Simple16 => None,
                        _ => Some(record.get_u16_le()),
                    };
                    report(CollectionEvent::DeviceError {
                        number,
                        echoed: u32::from(echoed as u16 & SIGNED_NUMBER_MASK),
                        code,
                    });
                    continue;
                }
                echoed as u32
            }
        };

        if echoed != number {
            report(CollectionEvent::Mismatch { expected: number, echoed });
        }
        result.insert(echoed, value);
    }

    result
}
