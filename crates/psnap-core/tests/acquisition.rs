//! ---
//! psnap_section: "04-acquisition-engine"
//! psnap_subsection: "integration-tests"
//! psnap_type: "source"
//! psnap_scope: "code"
//! psnap_description: "Acquisition engine behaviour through its public API."
//! psnap_version: "v0.0.0-prealpha"
//! psnap_owner: "tbd"
//! ---
use bytes::{BufMut, Bytes, BytesMut};
use psnap_core::catalog::CatalogEntry;
use psnap_core::codec::{self, BaseType, ParamValue, TypeTag};
use psnap_core::registry::{DomainAccess, Partitioning, VariantBehavior};
use psnap_core::scattered::{build_request, parse_response};
use psnap_core::{
    collect, BatchFamily, CollectOptions, CollectionEvent, CollectionObserver, ParameterDescriptor,
    ParameterReader, RecordingObserver,
};
use psnap_transport::cip::{parameter_attr, service};
use psnap_transport::{MockTransport, TransportError};

/// Answers a family B request with the given value per number.
fn extended_response(numbers: &[u32], value: impl Fn(u32) -> u32) -> Bytes {
    let mut out = BytesMut::new();
    for &number in numbers {
        out.put_u16_le(number as u16);
        out.put_u32_le(value(number));
    }
    out.freeze()
}

fn requested_numbers(family: BatchFamily, payload: &Bytes) -> Vec<u32> {
    payload
        .chunks_exact(family.request_len())
        .map(|record| match family {
            BatchFamily::Backplane32 => {
                u32::from_le_bytes([record[0], record[1], record[2], record[3]])
            }
            _ => u32::from(u16::from_le_bytes([record[0], record[1]])),
        })
        .collect()
}

#[test]
fn extended_values_decode_back_to_device_values() {
    let numbers = [41u32, 42, 43, 140];
    let tag = TypeTag::scaled(BaseType::Uint, 1);
    let raw = extended_response(&numbers, |n| n * 10);
    let mut observer = RecordingObserver::new();
    let result = parse_response(BatchFamily::Extended, &raw, &numbers, &mut |event| {
        observer.on_event(None, &event)
    });

    assert_eq!(result.len(), numbers.len());
    for number in numbers {
        let value = codec::decode(&result[&number], tag).unwrap();
        assert_eq!(value, ParamValue::Scaled { raw: i64::from(number * 10), decimals: 1 });
        assert_eq!(codec::encode(&value, tag).unwrap(), &result[&number][..2]);
    }
    assert!(observer.events.is_empty());
}

#[test]
fn low_throughput_request_carries_trailing_pad_once() {
    let numbers: Vec<u32> = (1..=11).collect();
    let raw = build_request(BatchFamily::ExtendedLowThroughput, &numbers).unwrap();
    assert_eq!(raw.len(), 6 * 11 + 2);
    assert_eq!(&raw[raw.len() - 2..], &[0, 0]);
    assert_eq!(
        requested_numbers(BatchFamily::ExtendedLowThroughput, &raw.slice(..66)),
        numbers
    );
}

#[test]
fn every_requested_number_is_accounted_for() {
    // 0x800C flags parameter 12; the tail is cut inside parameter 14.
    let mut out = BytesMut::new();
    out.put_i16_le(11);
    out.put_u16_le(1);
    out.put_u16_le(0x800C);
    out.put_u16_le(0);
    out.put_i16_le(13);
    out.put_u16_le(3);
    out.put_i16_le(14);
    let raw = out.freeze();
    let expected = [11, 12, 13, 14, 15];

    let mut observer = RecordingObserver::new();
    let result = parse_response(BatchFamily::Simple16, &raw, &expected, &mut |event| {
        observer.on_event(None, &event)
    });

    assert_eq!(result.keys().copied().collect::<Vec<_>>(), vec![11, 13]);
    let warnings = observer.warnings();
    assert_eq!(warnings.len(), 2);
    assert!(matches!(warnings[0], CollectionEvent::DeviceError { number: 12, .. }));
    assert!(matches!(warnings[1], CollectionEvent::Truncated { number: 14, .. }));
}

#[test]
fn low_throughput_device_sees_batches_of_eleven() {
    let mut transport = MockTransport::new(|request| {
        let numbers = requested_numbers(BatchFamily::ExtendedLowThroughput, &request.payload);
        Ok(extended_response(&numbers, |n| n))
    });
    let mut observer = RecordingObserver::new();
    let access = DomainAccess::dpi(0x93, Some(BatchFamily::ExtendedLowThroughput));
    let numbers: Vec<u32> = (1..=30).collect();
    let result = {
        let mut reader = ParameterReader::new(&mut transport, &mut observer);
        reader.run_batches(&access, &numbers)
    };

    let sizes: Vec<usize> = transport
        .requests_with_service(service::SCATTERED_READ)
        .iter()
        .map(|r| (r.payload.len() - 2) / 6)
        .collect();
    assert_eq!(sizes, vec![11, 11, 8]);
    assert_eq!(result.len(), 30);
}

#[test]
fn failing_batch_is_read_individually_once_in_order() {
    let mut transport = MockTransport::new(|request| {
        if request.service == service::SCATTERED_READ {
            let numbers = requested_numbers(BatchFamily::Backplane32, &request.payload);
            if numbers.contains(&40) {
                return Err(TransportError::Timeout);
            }
            let mut out = BytesMut::new();
            for number in numbers {
                out.put_u32_le(number);
                out.put_u32_le(number);
            }
            return Ok(out.freeze());
        }
        Ok(Bytes::copy_from_slice(&request.instance.to_le_bytes()))
    });
    let mut observer = RecordingObserver::new();
    let access = DomainAccess::dpi(0x93, Some(BatchFamily::Backplane32));
    let numbers: Vec<u32> = (1..=70).collect();
    let result = {
        let mut reader = ParameterReader::new(&mut transport, &mut observer);
        reader.run_batches(&access, &numbers)
    };

    let singles: Vec<u32> = transport
        .requests_with_service(service::GET_ATTRIBUTE_SINGLE)
        .iter()
        .map(|r| r.instance)
        .collect();
    assert_eq!(singles, (33..=64).collect::<Vec<_>>());
    assert_eq!(result.len(), 70);
    assert_eq!(
        observer.count(|e| matches!(e, CollectionEvent::BatchFailed { first: 33, count: 32, .. })),
        1
    );
}

#[test]
fn domains_split_at_adapter_boundary() {
    static CATALOG: &[CatalogEntry] = &[
        CatalogEntry::status(1, "Output Freq", TypeTag::new(BaseType::Uint)),
        CatalogEntry::status(2, "Output Current", TypeTag::new(BaseType::Uint)),
        CatalogEntry::status(3, "Output Voltage", TypeTag::new(BaseType::Uint)),
        CatalogEntry::status(100, "Adapter Status", TypeTag::new(BaseType::Uint)),
        CatalogEntry::status(101, "Adapter Mode", TypeTag::new(BaseType::Uint)),
    ];
    let behavior = VariantBehavior {
        core_catalog: CATALOG,
        adapter_catalog: None,
        partitioning: Partitioning::Threshold { boundary: 100 },
        core_access: DomainAccess::parameter_object(Some(BatchFamily::Simple16)),
        adapter_access: Some(DomainAccess::parameter_object(None)),
        modular: None,
    };
    let mut transport = MockTransport::new(|request| {
        if request.service == service::SCATTERED_READ {
            let numbers = requested_numbers(BatchFamily::Simple16, &request.payload);
            let mut out = BytesMut::new();
            for number in numbers {
                out.put_u16_le(number as u16);
                out.put_u16_le(7);
            }
            return Ok(out.freeze());
        }
        assert_eq!(request.attribute, Some(parameter_attr::VALUE));
        Ok(Bytes::from_static(&[9, 0]))
    });
    let mut observer = RecordingObserver::new();
    let mut parameters: Vec<ParameterDescriptor> =
        CATALOG.iter().map(ParameterDescriptor::from_catalog).collect();
    let options = CollectOptions {
        read_defaults: false,
        ..CollectOptions::default()
    };
    {
        let mut reader = ParameterReader::new(&mut transport, &mut observer);
        collect(&mut reader, &mut parameters, &behavior, &options);
    }

    let scattered = transport.requests_with_service(service::SCATTERED_READ);
    assert_eq!(scattered.len(), 1);
    assert_eq!(requested_numbers(BatchFamily::Simple16, &scattered[0].payload), vec![1, 2, 3]);
    let singles: Vec<u32> = transport
        .requests_with_service(service::GET_ATTRIBUTE_SINGLE)
        .iter()
        .map(|r| r.instance)
        .collect();
    assert_eq!(singles, vec![100, 101]);
    assert_eq!(parameters[4].value, Some(ParamValue::Unsigned { value: 9 }));
    assert_eq!(parameters[0].value, Some(ParamValue::Unsigned { value: 7 }));
}
