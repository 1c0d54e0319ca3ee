//! ---
//! psnap_section: "04-acquisition-engine"
//! psnap_subsection: "module"
//! psnap_type: "source"
//! psnap_scope: "code"
//! psnap_description: "Request/response cycles against one device session."
//! psnap_version: "v0.0.0-prealpha"
//! psnap_owner: "tbd"
//! ---
use bytes::Bytes;
use psnap_transport::cip::{class, dpi_attr, service};
use psnap_transport::{ExplicitMessaging, ExplicitRequest, TransportError};
use tracing::trace;

use crate::codec::TypeTag;
use crate::dpi::ReadFull;
use crate::errors::{CoreError, Result};
use crate::model::{CollectionStats, IdentityDescriptor, ScatteredReadResult};
use crate::observer::{CollectionEvent, CollectionObserver, Severity};
use crate::registry::{DomainAccess, TypeEncoding};
use crate::scattered::{self, BatchFamily};

/// Type information read from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedType {
    pub tag: TypeTag,
    /// Only DPI descriptors carry a writable bit.
    pub writable: Option<bool>,
}

/// Owns the transport and observer for the duration of one collection run.
pub struct ParameterReader<'a> {
    transport: &'a mut dyn ExplicitMessaging,
    observer: &'a mut dyn CollectionObserver,
    port: Option<u8>,
    stats: CollectionStats,
}

impl<'a> ParameterReader<'a> {
    pub fn new(
        transport: &'a mut dyn ExplicitMessaging,
        observer: &'a mut dyn CollectionObserver,
    ) -> Self {
        Self {
            transport,
            observer,
            port: None,
            stats: CollectionStats::default(),
        }
    }

    /// Tag subsequent events with a backplane port.
    pub fn set_port(&mut self, port: Option<u8>) {
        self.port = port;
    }

    pub fn stats(&self) -> CollectionStats {
        self.stats
    }

    pub fn emit(&mut self, event: CollectionEvent) {
        let stats = &mut self.stats;
        match &event {
            CollectionEvent::DeviceError { .. } => stats.device_errors += 1,
            CollectionEvent::Truncated { .. } => stats.truncations += 1,
            CollectionEvent::Mismatch { .. } => stats.mismatches += 1,
            CollectionEvent::BatchFailed { .. } => stats.batch_fallbacks += 1,
            CollectionEvent::ReadFailed { .. } => stats.read_failures += 1,
            CollectionEvent::DecodeFailed { .. } => stats.decode_failures += 1,
            _ => {}
        }
        if event.severity() == Severity::Warn {
            stats.warnings += 1;
        }
        self.observer.on_event(self.port, &event);
    }

    fn send(&mut self, request: ExplicitRequest) -> std::result::Result<Bytes, TransportError> {
        self.stats.requests += 1;
        trace!(transport = self.transport.name(), request = %request, "explicit request");
        self.transport.send_explicit_message(request)
    }

    fn get_attribute_single(
        &mut self,
        class_id: u16,
        instance: u32,
        attribute: u8,
    ) -> std::result::Result<Bytes, TransportError> {
        self.stats.requests += 1;
        trace!(
            transport = self.transport.name(),
            class_id,
            instance,
            attribute,
            "get attribute single"
        );
        self.transport.get_attribute_single(class_id, instance, attribute)
    }

    /// One scattered request for `numbers` under `class_id`.
    pub fn scattered_read(
        &mut self,
        family: BatchFamily,
        class_id: u16,
        numbers: &[u32],
    ) -> Result<ScatteredReadResult> {
        let payload = scattered::build_request(family, numbers)?;
        let request = ExplicitRequest::new(service::SCATTERED_READ, class_id, 0, None)
            .with_payload(payload);
        self.stats.scattered_batches += 1;
        let response = self.send(request)?;
        let mut events = Vec::new();
        let result = scattered::parse_response(family, &response, numbers, &mut |event| {
            events.push(event)
        });
        for event in events {
            self.emit(event);
        }
        Ok(result)
    }

    /// Read `numbers` through `access`, batching when the domain supports it.
    ///
    /// A batch whose request cannot be built or sent is retried one parameter
    /// at a time; the outcome merges into the same result.
    pub fn run_batches(&mut self, access: &DomainAccess, numbers: &[u32]) -> ScatteredReadResult {
        let Some(family) = access.scattered else {
            return self.read_individually(access, numbers);
        };
        let mut result = ScatteredReadResult::with_capacity(numbers.len());
        for chunk in numbers.chunks(access.batch_size()) {
            match self.scattered_read(family, access.class_id, chunk) {
                Ok(values) => result.extend(values),
                Err(err) => {
                    self.emit(CollectionEvent::BatchFailed {
                        first: chunk[0],
                        count: chunk.len(),
                        error: err.to_string(),
                    });
                    let values = self.read_individually(access, chunk);
                    result.extend(values);
                }
            }
        }
        result
    }

    /// One `Get_Attribute_Single` per number; failures are reported and skipped.
    pub fn read_individually(
        &mut self,
        access: &DomainAccess,
        numbers: &[u32],
    ) -> ScatteredReadResult {
        let mut result = ScatteredReadResult::with_capacity(numbers.len());
        for &number in numbers {
            self.stats.individual_reads += 1;
            match self.get_attribute_single(access.class_id, number, access.value_attribute) {
                Ok(value) => {
                    result.insert(number, value);
                }
                Err(err) => self.emit(CollectionEvent::ReadFailed {
                    number,
                    error: err.to_string(),
                }),
            }
        }
        result
    }

    pub fn read_type(&mut self, access: &DomainAccess, number: u32) -> Result<ResolvedType> {
        let raw = self.get_attribute_single(access.class_id, number, access.type_attribute)?;
        match access.type_encoding {
            TypeEncoding::CipCode => {
                let code = *raw
                    .first()
                    .ok_or(CoreError::MalformedDescriptor { length: 0 })?;
                Ok(ResolvedType {
                    tag: TypeTag::from_cip_code(code)?,
                    writable: None,
                })
            }
            TypeEncoding::DpiDescriptor => {
                let word: [u8; 4] = raw
                    .get(..4)
                    .and_then(|bytes| bytes.try_into().ok())
                    .ok_or(CoreError::MalformedDescriptor { length: raw.len() })?;
                let descriptor = u32::from_le_bytes(word);
                Ok(ResolvedType {
                    tag: TypeTag::from_dpi_descriptor(descriptor),
                    writable: Some(descriptor & crate::codec::DPI_WRITABLE != 0),
                })
            }
        }
    }

    pub fn read_default(&mut self, access: &DomainAccess, number: u32) -> Result<Bytes> {
        Ok(self.get_attribute_single(access.class_id, number, access.default_attribute)?)
    }

    /// `Get_Attributes_All` on the Identity object.
    pub fn read_identity(&mut self, instance: u32) -> Result<IdentityDescriptor> {
        let raw = self.send(ExplicitRequest::get_attributes_all(class::IDENTITY, instance))?;
        IdentityDescriptor::parse(&raw)
    }

    /// DPI Online Read Full of one parameter instance.
    pub fn read_full(&mut self, class_id: u16, instance: u32) -> Result<ReadFull> {
        let raw = self.get_attribute_single(class_id, instance, dpi_attr::ONLINE_READ_FULL)?;
        ReadFull::parse(&raw)
    }
}

#[cfg(test)]
mod tests {
    use bytes::{BufMut, BytesMut};
    use psnap_transport::MockTransport;

    use super::*;
    use crate::codec::BaseType;
    use crate::observer::RecordingObserver;

    /// Answers scattered reads for family A with value = number * 10 and
    /// single reads with the number as a u16.
    fn echo_device(fail_scattered: bool) -> MockTransport {
        MockTransport::new(move |request| {
            if request.service == service::SCATTERED_READ {
                if fail_scattered {
                    return Err(TransportError::Timeout);
                }
                let mut out = BytesMut::new();
                for record in request.payload.chunks(4) {
                    let number = u16::from_le_bytes([record[0], record[1]]);
                    out.put_u16_le(number);
                    out.put_u16_le(number * 10);
                }
                return Ok(out.freeze());
            }
            let number = request.instance as u16;
            Ok(Bytes::copy_from_slice(&number.to_le_bytes()))
        })
    }

    fn scattered_access() -> DomainAccess {
        DomainAccess::parameter_object(Some(BatchFamily::Simple16))
    }

    #[test]
    fn batches_follow_batch_size_in_order() {
        let mut transport = echo_device(false);
        let mut observer = RecordingObserver::new();
        let numbers: Vec<u32> = (1..=50).collect();
        let access = scattered_access().with_batch_size(22);
        let result = {
            let mut reader = ParameterReader::new(&mut transport, &mut observer);
            reader.run_batches(&access, &numbers)
        };

        let batches = transport.requests_with_service(service::SCATTERED_READ);
        let sizes: Vec<usize> = batches.iter().map(|r| r.payload.len() / 4).collect();
        assert_eq!(sizes, vec![22, 22, 6]);
        assert_eq!(&batches[1].payload[..2], &23u16.to_le_bytes());
        assert_eq!(result.len(), 50);
        assert_eq!(result.keys().copied().collect::<Vec<_>>(), numbers);
        assert_eq!(&result[&7][..], &70u16.to_le_bytes());
        assert!(observer.events.is_empty());
    }

    #[test]
    fn failed_batch_falls_back_to_individual_reads() {
        let mut transport = echo_device(true);
        let mut observer = RecordingObserver::new();
        let numbers = [4, 5, 6];
        let (result, stats) = {
            let mut reader = ParameterReader::new(&mut transport, &mut observer);
            let result = reader.run_batches(&scattered_access(), &numbers);
            (result, reader.stats())
        };

        let singles: Vec<u32> = transport
            .requests_with_service(service::GET_ATTRIBUTE_SINGLE)
            .iter()
            .map(|r| r.instance)
            .collect();
        assert_eq!(singles, vec![4, 5, 6]);
        assert_eq!(result.keys().copied().collect::<Vec<_>>(), vec![4, 5, 6]);
        assert_eq!(stats.batch_fallbacks, 1);
        assert_eq!(stats.individual_reads, 3);
        assert_eq!(observer.warnings().len(), 1);
    }

    #[test]
    fn out_of_range_number_falls_back_without_sending() {
        let mut transport = echo_device(false);
        let mut observer = RecordingObserver::new();
        let result = {
            let mut reader = ParameterReader::new(&mut transport, &mut observer);
            reader.run_batches(&scattered_access(), &[1, 0x9000])
        };
        assert!(transport.requests_with_service(service::SCATTERED_READ).is_empty());
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn individual_failures_are_reported_and_skipped() {
        let mut transport = MockTransport::new(|request| {
            if request.instance == 2 {
                Err(TransportError::status(psnap_transport::cip::status::OBJECT_DOES_NOT_EXIST))
            } else {
                Ok(Bytes::from_static(&[1, 0]))
            }
        });
        let mut observer = RecordingObserver::new();
        let result = {
            let mut reader = ParameterReader::new(&mut transport, &mut observer);
            reader.read_individually(&DomainAccess::parameter_object(None), &[1, 2, 3])
        };
        assert_eq!(result.keys().copied().collect::<Vec<_>>(), vec![1, 3]);
        assert!(matches!(
            observer.events[0].1,
            CollectionEvent::ReadFailed { number: 2, .. }
        ));
    }

    #[test]
    fn read_type_understands_both_encodings() {
        let descriptor = TypeTag::scaled(BaseType::Uint, 2).to_dpi_descriptor(true);
        let mut transport = MockTransport::new(move |request| match request.class_id {
            class::PARAMETER => Ok(Bytes::from_static(&[0xC4])),
            _ => Ok(Bytes::copy_from_slice(&descriptor.to_le_bytes())),
        });
        let mut observer = RecordingObserver::new();
        let mut reader = ParameterReader::new(&mut transport, &mut observer);

        let cip = reader
            .read_type(&DomainAccess::parameter_object(None), 9)
            .unwrap();
        assert_eq!(cip.tag, TypeTag::new(BaseType::Dint));
        assert_eq!(cip.writable, None);

        let dpi = reader
            .read_type(&DomainAccess::dpi(class::DPI_PARAMETER, None), 9)
            .unwrap();
        assert_eq!(dpi.tag, TypeTag::scaled(BaseType::Uint, 2));
        assert_eq!(dpi.writable, Some(true));
    }

    /// Serves attribute reads through its own primitive and refuses
    /// generic explicit messages.
    struct AttributeOnly {
        reads: Vec<(u16, u32, u8)>,
    }

    impl ExplicitMessaging for AttributeOnly {
        fn send_explicit_message(
            &mut self,
            _request: ExplicitRequest,
        ) -> std::result::Result<Bytes, TransportError> {
            Err(TransportError::status(
                psnap_transport::cip::status::SERVICE_NOT_SUPPORTED,
            ))
        }

        fn get_attribute_single(
            &mut self,
            class_id: u16,
            instance: u32,
            attribute: u8,
        ) -> std::result::Result<Bytes, TransportError> {
            self.reads.push((class_id, instance, attribute));
            Ok(Bytes::copy_from_slice(&(instance as u16).to_le_bytes()))
        }

        fn name(&self) -> &'static str {
            "attribute-only"
        }
    }

    #[test]
    fn single_reads_use_the_transport_attribute_primitive() {
        let mut transport = AttributeOnly { reads: Vec::new() };
        let mut observer = RecordingObserver::new();
        let access = DomainAccess::parameter_object(None);
        let (result, stats) = {
            let mut reader = ParameterReader::new(&mut transport, &mut observer);
            let result = reader.read_individually(&access, &[7, 8]);
            (result, reader.stats())
        };
        assert_eq!(&result[&7][..], &7u16.to_le_bytes());
        assert_eq!(result.len(), 2);
        assert_eq!(stats.requests, 2);
        assert_eq!(
            transport.reads,
            vec![
                (access.class_id, 7, access.value_attribute),
                (access.class_id, 8, access.value_attribute)
            ]
        );
        assert!(observer.events.is_empty());
    }

    #[test]
    fn short_descriptor_is_malformed() {
        let mut transport = MockTransport::new(|_| Ok(Bytes::from_static(&[0x01, 0x00])));
        let mut observer = RecordingObserver::new();
        let mut reader = ParameterReader::new(&mut transport, &mut observer);
        let err = reader
            .read_type(&DomainAccess::dpi(class::DPI_PARAMETER, None), 1)
            .unwrap_err();
        assert!(matches!(err, CoreError::MalformedDescriptor { length: 2 }));
    }
}
