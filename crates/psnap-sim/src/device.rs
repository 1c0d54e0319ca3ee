//! ---
//! psnap_section: "06-simulation"
//! psnap_subsection: "module"
//! psnap_type: "source"
//! psnap_scope: "code"
//! psnap_description: "Explicit-message responder backed by a device image."
//! psnap_version: "v0.0.0-prealpha"
//! psnap_owner: "tbd"
//! ---
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use psnap_core::dpi::ReadFull;
use psnap_core::scattered::BACKPLANE_ERROR_FLAG;
use psnap_core::BatchFamily;
use psnap_transport::cip::{class, dpi_attr, parameter_attr, service, status};
use psnap_transport::{ExplicitMessaging, ExplicitRequest, TransportError};
use tracing::debug;

use crate::image::{DeviceImage, FaultPlan, ParameterImage};

/// Error code placed in the value field of family B error records.
pub const EXTENDED_ERROR_CODE: u16 = 0x000B;
const SIXTEEN_BIT_ERROR_FLAG: u16 = 0x8000;

#[derive(Debug, Clone)]
struct StoredParameter {
    image: ParameterImage,
    value: Vec<u8>,
    default: Option<Vec<u8>>,
}

impl StoredParameter {
    fn new(image: &ParameterImage) -> Result<Self> {
        let value = image
            .encode_value()
            .with_context(|| format!("parameter {} value", image.number))?;
        let default = image
            .encode_default()
            .transpose()
            .with_context(|| format!("parameter {} default", image.number))?;
        Ok(Self {
            image: image.clone(),
            value,
            default,
        })
    }

    fn descriptor(&self) -> u32 {
        self.image.data_type.to_dpi_descriptor(self.image.writable)
    }
}

/// Parameters sharing one numbering, answered at `local + offset`.
#[derive(Debug, Clone)]
struct AddressSpace {
    offset: u32,
    parameters: BTreeMap<u32, StoredParameter>,
}

impl AddressSpace {
    fn build(offset: u32, images: &[ParameterImage]) -> Result<Self> {
        let parameters = images
            .iter()
            .map(|image| Ok((image.number, StoredParameter::new(image)?)))
            .collect::<Result<_>>()?;
        Ok(Self { offset, parameters })
    }

    fn read_full(&self, local: u32, stored: &StoredParameter) -> ReadFull {
        let next = self
            .parameters
            .range(local + 1..)
            .next()
            .map(|(&number, _)| number as u16)
            .unwrap_or(0);
        let previous = self
            .parameters
            .range(..local)
            .next_back()
            .map(|(&number, _)| number as u16)
            .unwrap_or(0);
        ReadFull {
            descriptor: stored.descriptor(),
            value: word(&stored.value),
            minimum: [0; 4],
            maximum: [0xFF; 4],
            default: stored.default.as_deref().map(word).unwrap_or([0; 4]),
            next,
            previous,
            units: String::new(),
            multiplier: 1,
            divisor: 1,
            base: 1,
            offset: 0,
            name: stored.image.name.clone(),
        }
    }
}

fn word(raw: &[u8]) -> [u8; 4] {
    let mut out = [0u8; 4];
    let used = raw.len().min(4);
    out[..used].copy_from_slice(&raw[..used]);
    out
}

fn put_value(out: &mut BytesMut, raw: &[u8], width: usize) {
    let used = raw.len().min(width);
    out.put_slice(&raw[..used]);
    out.put_bytes(0, width - used);
}

/// In-memory device implementing [`ExplicitMessaging`].
#[derive(Debug, Clone)]
pub struct SimulatedDevice {
    image: DeviceImage,
    /// Host space first, then one per port in ascending offset.
    spaces: Vec<AddressSpace>,
    delay: Option<Duration>,
    requests: usize,
}

impl SimulatedDevice {
    pub fn new(image: DeviceImage) -> Result<Self> {
        let mut spaces = vec![AddressSpace::build(0, &image.parameters)?];
        for port in &image.ports {
            spaces.push(
                AddressSpace::build(port.offset, &port.parameters)
                    .with_context(|| format!("slot {}", port.slot))?,
            );
        }
        spaces.sort_by_key(|space| space.offset);
        Ok(Self {
            image,
            spaces,
            delay: None,
            requests: 0,
        })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        Self::new(DeviceImage::from_path(path)?)
    }

    /// Sleep this long before every response.
    pub fn with_delay(mut self, delay: Option<Duration>) -> Self {
        self.delay = delay;
        self
    }

    pub fn image(&self) -> &DeviceImage {
        &self.image
    }

    pub fn faults_mut(&mut self) -> &mut FaultPlan {
        &mut self.image.faults
    }

    pub fn request_count(&self) -> usize {
        self.requests
    }

    fn lookup(&self, address: u32) -> Option<(&AddressSpace, u32, &StoredParameter)> {
        self.spaces
            .iter()
            .rev()
            .filter(|space| address >= space.offset)
            .find_map(|space| {
                let local = address - space.offset;
                space
                    .parameters
                    .get(&local)
                    .map(|stored| (space, local, stored))
            })
    }

    fn identity(&self, instance: u32) -> psnap_transport::Result<Bytes> {
        if instance == 1 {
            return self
                .image
                .identity
                .as_ref()
                .map(|identity| identity.encode())
                .ok_or_else(|| TransportError::status(status::OBJECT_DOES_NOT_EXIST));
        }
        let slot = instance.checked_sub(self.image.slot_instance_base);
        self.image
            .ports
            .iter()
            .find(|port| Some(u32::from(port.slot)) == slot)
            .map(|port| port.identity.encode())
            .ok_or_else(|| TransportError::status(status::PATH_DESTINATION_UNKNOWN))
    }

    fn scattered(&self, payload: &Bytes) -> psnap_transport::Result<Bytes> {
        let family = self
            .image
            .family
            .ok_or_else(|| TransportError::status(status::SERVICE_NOT_SUPPORTED))?;
        let faults = &self.image.faults;
        if faults.fail_scattered {
            debug!("scattered read failure injected");
            return Err(TransportError::Timeout);
        }

        let mut out = BytesMut::with_capacity(payload.len());
        for mut record in payload.chunks_exact(family.request_len()) {
            let number = match family {
                BatchFamily::Backplane32 => record.get_u32_le(),
                _ => u32::from(record.get_u16_le()),
            };
            let stored = self
                .lookup(number)
                .map(|(_, _, stored)| stored)
                .filter(|_| !faults.scattered_errors.contains(&number));
            match (family, stored) {
                (BatchFamily::Backplane32, Some(stored)) => {
                    out.put_u32_le(number);
                    put_value(&mut out, &stored.value, 4);
                }
                (BatchFamily::Backplane32, None) => {
                    out.put_u32_le(number ^ BACKPLANE_ERROR_FLAG);
                    out.put_u32_le(0);
                }
                (_, Some(stored)) => {
                    out.put_u16_le(number as u16);
                    put_value(&mut out, &stored.value, family.value_len());
                }
                (BatchFamily::Simple16, None) => {
                    out.put_u16_le(number as u16 | SIXTEEN_BIT_ERROR_FLAG);
                    out.put_u16_le(0);
                }
                (_, None) => {
                    out.put_u16_le(number as u16 | SIXTEEN_BIT_ERROR_FLAG);
                    out.put_u16_le(EXTENDED_ERROR_CODE);
                    out.put_u16_le(0);
                }
            }
        }

        if let Some(cut) = faults.truncate_scattered {
            debug!(cut, "scattered response truncation injected");
            out.truncate(out.len().saturating_sub(cut));
        }
        Ok(out.freeze())
    }

    fn attribute(
        &self,
        class_id: u16,
        instance: u32,
        attribute: Option<u8>,
    ) -> psnap_transport::Result<Bytes> {
        let not_found = TransportError::status(status::OBJECT_DOES_NOT_EXIST);
        let unsupported = TransportError::status(status::ATTRIBUTE_NOT_SUPPORTED);
        if self.image.faults.failing_parameters.contains(&instance) {
            debug!(instance, "single read failure injected");
            return Err(not_found);
        }
        let (space, local, stored) = self.lookup(instance).ok_or(not_found)?;
        let default = || {
            stored
                .default
                .as_deref()
                .filter(|_| !self.image.faults.no_defaults)
                .map(Bytes::copy_from_slice)
                .ok_or_else(|| TransportError::status(status::ATTRIBUTE_NOT_SUPPORTED))
        };

        match class_id {
            class::PARAMETER => match attribute {
                Some(parameter_attr::VALUE) => Ok(Bytes::copy_from_slice(&stored.value)),
                Some(parameter_attr::DATA_TYPE) => {
                    Ok(Bytes::copy_from_slice(&[stored.image.data_type.base.cip_code()]))
                }
                Some(parameter_attr::DEFAULT_VALUE) => default(),
                _ => Err(unsupported),
            },
            class::DPI_PARAMETER | class::HOST_DPI_PARAMETER | class::DEVICELOGIX_PARAMETER => {
                match attribute {
                    Some(dpi_attr::VALUE) => Ok(Bytes::copy_from_slice(&stored.value)),
                    Some(dpi_attr::DESCRIPTOR) => {
                        Ok(Bytes::copy_from_slice(&stored.descriptor().to_le_bytes()))
                    }
                    Some(dpi_attr::DEFAULT_VALUE) => default(),
                    Some(dpi_attr::ONLINE_READ_FULL) => {
                        Ok(space.read_full(local, stored).encode())
                    }
                    _ => Err(unsupported),
                }
            }
            _ => Err(TransportError::status(status::PATH_DESTINATION_UNKNOWN)),
        }
    }
}

impl ExplicitMessaging for SimulatedDevice {
    fn send_explicit_message(&mut self, request: ExplicitRequest) -> psnap_transport::Result<Bytes> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        self.requests += 1;
        match request.service {
            service::GET_ATTRIBUTES_ALL if request.class_id == class::IDENTITY => {
                self.identity(request.instance)
            }
            service::SCATTERED_READ => self.scattered(&request.payload),
            service::GET_ATTRIBUTE_SINGLE => {
                self.attribute(request.class_id, request.instance, request.attribute)
            }
            _ => Err(TransportError::status(status::SERVICE_NOT_SUPPORTED)),
        }
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}

#[cfg(test)]
mod tests {
    use psnap_core::codec::{BaseType, TypeTag};
    use psnap_core::scattered::{build_request, parse_response};
    use psnap_core::{CollectionEvent, CollectionObserver, IdentityDescriptor, RecordingObserver};

    use super::*;
    use crate::image::PortImage;

    fn identity(code: u16, name: &str) -> IdentityDescriptor {
        IdentityDescriptor {
            vendor_id: 1,
            product_type: 0x8E,
            product_code: code,
            major_revision: 3,
            minor_revision: 1,
            status: 0,
            serial_number: 77,
            product_name: name.into(),
        }
    }

    fn device(family: BatchFamily) -> SimulatedDevice {
        let mut image = DeviceImage::new(Some(identity(0x0A00, "PowerFlex 755")), Some(family));
        image.parameters = vec![
            ParameterImage::new(1, "Output Frequency", TypeTag::new(BaseType::Uint), 50.0),
            ParameterImage::new(3, "Output Current", TypeTag::scaled(BaseType::Uint, 2), 4.25)
                .with_default(0.0),
        ];
        image.ports.push(PortImage {
            slot: 5,
            offset: 0xA000,
            identity: identity(0x0E01, "Encoder"),
            parameters: vec![
                ParameterImage::new(1, "Enc PPR", TypeTag::new(BaseType::Udint), 1024.0)
                    .with_default(1024.0)
                    .writable(),
                ParameterImage::new(4, "Enc Status", TypeTag::new(BaseType::Bool16), 3.0),
            ],
        });
        SimulatedDevice::new(image).unwrap()
    }

    fn scattered(
        device: &mut SimulatedDevice,
        family: BatchFamily,
        numbers: &[u32],
    ) -> (usize, RecordingObserver) {
        let payload = build_request(family, numbers).unwrap();
        let request = ExplicitRequest::new(service::SCATTERED_READ, class::DPI_PARAMETER, 0, None)
            .with_payload(payload);
        let raw = device.send_explicit_message(request).unwrap();
        let mut observer = RecordingObserver::new();
        let result = parse_response(family, &raw, numbers, &mut |event| observer.on_event(None, &event));
        (result.len(), observer)
    }

    #[test]
    fn answers_each_family_layout() {
        for family in [
            BatchFamily::Simple16,
            BatchFamily::Extended,
            BatchFamily::ExtendedLowThroughput,
        ] {
            let mut device = device(family);
            let (found, observer) = scattered(&mut device, family, &[1, 2, 3]);
            assert_eq!(found, 2, "{family}");
            assert!(matches!(
                observer.warnings()[0],
                CollectionEvent::DeviceError { number: 2, .. }
            ));
        }
        let mut device = device(BatchFamily::Backplane32);
        let (found, observer) =
            scattered(&mut device, BatchFamily::Backplane32, &[1, 0xA001, 0xA004, 0xA002]);
        assert_eq!(found, 3);
        assert_eq!(observer.warnings().len(), 1);
    }

    #[test]
    fn identity_by_instance() {
        let mut device = device(BatchFamily::Backplane32);
        let raw = device.identity(1).unwrap();
        assert_eq!(IdentityDescriptor::parse(&raw).unwrap().product_name, "PowerFlex 755");
        let raw = device.identity(6).unwrap();
        assert_eq!(IdentityDescriptor::parse(&raw).unwrap().product_code, 0x0E01);
        assert!(device.identity(7).is_err());
        device.faults_mut().fail_scattered = true;
        assert!(device.scattered(&Bytes::new()).is_err());
    }

    #[test]
    fn read_full_links_port_parameters() {
        let device = device(BatchFamily::Backplane32);
        let raw = device
            .attribute(class::HOST_DPI_PARAMETER, 0xA001, Some(dpi_attr::ONLINE_READ_FULL))
            .unwrap();
        let record = ReadFull::parse(&raw).unwrap();
        assert_eq!(record.next, 4);
        assert_eq!(record.name, "Enc PPR");
        assert!(record.is_writable());
        let raw = device
            .attribute(class::HOST_DPI_PARAMETER, 0xA004, Some(dpi_attr::ONLINE_READ_FULL))
            .unwrap();
        assert_eq!(ReadFull::parse(&raw).unwrap().next, 0);
    }

    #[test]
    fn truncation_and_default_faults() {
        let mut device = device(BatchFamily::Simple16);
        device.faults_mut().truncate_scattered = Some(2);
        let (found, observer) = scattered(&mut device, BatchFamily::Simple16, &[1, 3]);
        assert_eq!(found, 1);
        assert!(matches!(
            observer.warnings()[0],
            CollectionEvent::Truncated { number: 3, .. }
        ));

        assert_eq!(
            &device
                .attribute(class::PARAMETER, 3, Some(parameter_attr::DEFAULT_VALUE))
                .unwrap()[..],
            &[0, 0]
        );
        device.faults_mut().no_defaults = true;
        assert!(device
            .attribute(class::PARAMETER, 3, Some(parameter_attr::DEFAULT_VALUE))
            .is_err());
        assert_eq!(
            &device
                .attribute(class::PARAMETER, 3, Some(parameter_attr::DATA_TYPE))
                .unwrap()[..],
            &[0xC7]
        );
    }
}
