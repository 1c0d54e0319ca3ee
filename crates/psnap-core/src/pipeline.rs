//! ---
//! psnap_section: "04-acquisition-engine"
//! psnap_subsection: "module"
//! psnap_type: "source"
//! psnap_scope: "code"
//! psnap_description: "Parameter collection pipeline and whole-device sessions."
//! psnap_version: "v0.0.0-prealpha"
//! psnap_owner: "tbd"
//! ---
use chrono::Utc;
use psnap_logging::{log_stage_event, LogContext, StageOutcome};
use psnap_transport::ExplicitMessaging;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::discovery;
use crate::errors::{CoreError, Result};
use crate::model::{DeviceSnapshot, ParameterDescriptor, PortGroup, PortSource};
use crate::observer::{CollectionEvent, CollectionObserver};
use crate::reader::ParameterReader;
use crate::registry::{self, DomainAccess, ModularLayout, ResolveQuery, VariantBehavior};

/// Identity instance of the device itself.
pub const DEVICE_IDENTITY_INSTANCE: u32 = 1;

/// Knobs for one collection run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectOptions {
    /// Also collect catalog rows not marked for recording.
    pub collect_all: bool,
    pub verbose_trace: bool,
    /// Read a default for every collected parameter that lacks one.
    pub read_defaults: bool,
    pub batch_size_override: Option<usize>,
    /// Operator hint passed to variant resolution.
    pub family: Option<String>,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            collect_all: false,
            verbose_trace: false,
            read_defaults: true,
            batch_size_override: None,
            family: None,
        }
    }
}

impl CollectOptions {
    fn domain_access(&self, access: DomainAccess) -> DomainAccess {
        match self.batch_size_override {
            Some(size) if access.scattered.is_some() => access.with_batch_size(size),
            _ => access,
        }
    }
}

/// Collect the core and adapter domains of one descriptor set in place.
pub fn collect(
    reader: &mut ParameterReader<'_>,
    descriptors: &mut [ParameterDescriptor],
    behavior: &VariantBehavior,
    options: &CollectOptions,
) {
    let (adapter, core): (Vec<usize>, Vec<usize>) = (0..descriptors.len())
        .filter(|&index| options.collect_all || descriptors[index].record)
        .partition(|&index| behavior.partitioning.is_adapter(descriptors[index].number));

    collect_domain(
        reader,
        "core",
        descriptors,
        &core,
        &options.domain_access(behavior.core_access),
        0,
        options,
    );
    if !adapter.is_empty() {
        collect_domain(
            reader,
            "adapter",
            descriptors,
            &adapter,
            &options.domain_access(behavior.adapter_access()),
            0,
            options,
        );
    }
}

/// Collect the static parameter list of a card-backed port. Dynamically
/// enumerated ports already hold their values.
pub fn collect_port(
    reader: &mut ParameterReader<'_>,
    group: &mut PortGroup,
    layout: &ModularLayout,
    options: &CollectOptions,
) {
    let PortSource::Card {
        class_id,
        use_scattered,
        ..
    } = group.source
    else {
        return;
    };
    let family = use_scattered.then_some(layout.port_family);
    let access = options.domain_access(DomainAccess::dpi(class_id, family));
    let selected: Vec<usize> = (0..group.parameters.len())
        .filter(|&index| options.collect_all || group.parameters[index].record)
        .collect();

    reader.set_port(Some(group.port));
    collect_domain(
        reader,
        "port",
        &mut group.parameters,
        &selected,
        &access,
        group.offset,
        options,
    );
    reader.set_port(None);
}

/// Resolve types, read values and backfill defaults for `indices`.
/// Numbers are addressed as `number + offset`.
fn collect_domain(
    reader: &mut ParameterReader<'_>,
    domain: &'static str,
    descriptors: &mut [ParameterDescriptor],
    indices: &[usize],
    access: &DomainAccess,
    offset: u32,
    options: &CollectOptions,
) {
    if indices.is_empty() {
        return;
    }

    for &index in indices {
        let descriptor = &mut descriptors[index];
        if descriptor.data_type.is_some() {
            continue;
        }
        match reader.read_type(access, descriptor.number + offset) {
            Ok(resolved) => {
                descriptor.data_type = Some(resolved.tag);
                if let Some(writable) = resolved.writable {
                    descriptor.is_writable = writable;
                }
            }
            Err(err) => reader.emit(CollectionEvent::TypeUnresolved {
                number: descriptor.number,
                error: err.to_string(),
            }),
        }
    }

    reader.emit(CollectionEvent::BatchPlan {
        domain,
        parameters: indices.len(),
        batch_size: access.batch_size(),
        scattered: access.scattered.is_some(),
    });
    let numbers: Vec<u32> = indices
        .iter()
        .map(|&index| descriptors[index].number + offset)
        .collect();
    let values = reader.run_batches(access, &numbers);

    for &index in indices {
        let descriptor = &mut descriptors[index];
        let Some(raw) = values.get(&(descriptor.number + offset)) else {
            continue;
        };
        if let Err(err) = descriptor.apply_value(raw) {
            reader.emit(CollectionEvent::DecodeFailed {
                number: descriptor.number,
                error: err.to_string(),
            });
        }
        if options.verbose_trace {
            let value = descriptor
                .value
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| format!("raw {:02X?}", raw.as_ref()));
            reader.emit(CollectionEvent::ParameterValue {
                number: descriptor.number,
                name: descriptor.label().to_owned(),
                value,
            });
        }
    }

    if !options.read_defaults {
        return;
    }
    for &index in indices {
        let descriptor = &mut descriptors[index];
        if !descriptor.has_value() || descriptor.default_value_raw.is_some() {
            continue;
        }
        let result = reader
            .read_default(access, descriptor.number + offset)
            .and_then(|raw| descriptor.apply_default(&raw).map_err(CoreError::from));
        if let Err(err) = result {
            reader.emit(CollectionEvent::DefaultUnavailable {
                number: descriptor.number,
                error: err.to_string(),
            });
        }
    }
}

/// Run a full session: identity, variant, catalogs, ports.
pub fn collect_device(
    transport: &mut dyn ExplicitMessaging,
    observer: &mut dyn CollectionObserver,
    options: &CollectOptions,
) -> Result<DeviceSnapshot> {
    let mut reader = ParameterReader::new(transport, observer);

    let identity = match reader.read_identity(DEVICE_IDENTITY_INSTANCE) {
        Ok(identity) => Some(identity),
        Err(err) => {
            reader.emit(CollectionEvent::IdentityUnavailable {
                error: err.to_string(),
            });
            None
        }
    };
    let variant = registry::resolve(&ResolveQuery::new(
        options.family.as_deref(),
        identity.as_ref(),
    ));
    let behavior = &variant.behavior;
    if !behavior.has_catalog() && behavior.modular.is_none() {
        return Err(CoreError::NoParameterAccess {
            variant: variant.name.to_owned(),
        });
    }
    info!(
        variant = variant.name,
        product = identity.as_ref().map(|id| id.product_name.as_str()).unwrap_or(""),
        "collecting device"
    );

    let mut parameters: Vec<ParameterDescriptor> = behavior
        .core_catalog
        .iter()
        .chain(behavior.adapter_catalog.unwrap_or_default())
        .map(ParameterDescriptor::from_catalog)
        .collect();
    collect(&mut reader, &mut parameters, behavior, options);

    let mut ports = Vec::new();
    if let Some(layout) = &behavior.modular {
        for mut group in discovery::discover_ports(&mut reader, layout) {
            if !discovery::resolve_port_parameters(&mut reader, &mut group, layout) {
                continue;
            }
            collect_port(&mut reader, &mut group, layout, options);
            let outcome = if group.parameters.iter().all(ParameterDescriptor::has_value) {
                StageOutcome::Complete
            } else {
                StageOutcome::Degraded
            };
            log_stage_event(
                Some(&LogContext::new().with_device(variant.name).with_port(group.port)),
                "collect.port",
                &format!("{} parameters", group.parameters.len()),
                outcome,
            );
            ports.push(group);
        }
    }

    Ok(DeviceSnapshot {
        variant: variant.name.to_owned(),
        identity,
        collected_at: Utc::now(),
        parameters,
        ports,
        stats: reader.stats(),
    })
}
