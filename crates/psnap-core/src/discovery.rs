//! ---
//! psnap_section: "04-acquisition-engine"
//! psnap_subsection: "module"
//! psnap_type: "source"
//! psnap_scope: "code"
//! psnap_description: "Backplane slot probing and per-port parameter resolution."
//! psnap_version: "v0.0.0-prealpha"
//! psnap_owner: "tbd"
//! ---
use crate::cards::{self, CardAccess};
use crate::model::{IdentityDescriptor, ParameterDescriptor, PortGroup, PortSource};
use crate::observer::CollectionEvent;
use crate::reader::ParameterReader;
use crate::registry::ModularLayout;

/// Product code reported by an unpopulated slot.
pub const EMPTY_SLOT_PRODUCT_CODE: u16 = 0;
/// Product-name fragment of an unpopulated slot.
pub const EMPTY_SLOT_MARKER: &str = "Not Present";
/// Product-name fragment of the operator panel.
pub const OPERATOR_PANEL_MARKER: &str = "HIM";

/// Why a responding slot is not a parameter-bearing port.
pub fn exclusion_reason(identity: &IdentityDescriptor) -> Option<&'static str> {
    if identity.product_code == EMPTY_SLOT_PRODUCT_CODE {
        Some("empty slot")
    } else if identity.product_name.contains(EMPTY_SLOT_MARKER) {
        Some("not present")
    } else if identity.product_name.contains(OPERATOR_PANEL_MARKER) {
        Some("operator panel")
    } else {
        None
    }
}

/// Probe every slot of `layout` and return the populated, mapped ones.
pub fn discover_ports(reader: &mut ParameterReader<'_>, layout: &ModularLayout) -> Vec<PortGroup> {
    let mut groups = Vec::new();
    for slot in layout.slots() {
        reader.set_port(Some(slot));
        let identity = match reader.read_identity(u32::from(slot) + layout.instance_base) {
            Ok(identity) => identity,
            Err(err) => {
                reader.emit(CollectionEvent::SlotProbeFailed {
                    slot,
                    error: err.to_string(),
                });
                continue;
            }
        };
        if let Some(reason) = exclusion_reason(&identity) {
            reader.emit(CollectionEvent::SlotExcluded { slot, reason });
            continue;
        }
        let Some(offset) = layout.offset_for(slot) else {
            reader.emit(CollectionEvent::PortUnmapped { slot });
            continue;
        };
        reader.emit(CollectionEvent::PortDiscovered {
            port: slot,
            product_name: identity.product_name.clone(),
        });
        groups.push(PortGroup::new(slot, offset, identity));
    }
    reader.set_port(None);
    groups
}

/// Decide where the parameters of `group` come from and fill its list.
///
/// Returns `false` when the port has no parameter object and should be
/// dropped.
pub fn resolve_port_parameters(
    reader: &mut ParameterReader<'_>,
    group: &mut PortGroup,
    layout: &ModularLayout,
) -> bool {
    reader.set_port(Some(group.port));
    let card = cards::lookup(layout.cards, group.identity.product_code);
    let keep = match card.map(|card| (card.label, card.access)) {
        Some((label, CardAccess::Skip)) => {
            reader.emit(CollectionEvent::PortSkipped {
                port: group.port,
                label,
            });
            false
        }
        Some((
            label,
            CardAccess::Parameters {
                class_id,
                use_scattered,
                parameters,
            },
        )) if !parameters.is_empty() => {
            group.parameters = parameters.iter().map(ParameterDescriptor::from_catalog).collect();
            group.source = PortSource::Card {
                label: label.to_owned(),
                class_id,
                use_scattered,
            };
            true
        }
        Some((_, CardAccess::Parameters { class_id, .. })) => {
            group.parameters = enumerate_dynamic(reader, class_id, group.offset);
            group.source = PortSource::Dynamic { class_id };
            true
        }
        None => {
            let class_id = layout.default_port_class;
            group.parameters = enumerate_dynamic(reader, class_id, group.offset);
            group.source = PortSource::Dynamic { class_id };
            true
        }
    };
    reader.set_port(None);
    keep
}

/// Walk the Online Read Full linked list of one port, starting at local 1.
///
/// Stops when a record points at a number not above its own (0 ends the
/// list) or when a read fails.
pub fn enumerate_dynamic(
    reader: &mut ParameterReader<'_>,
    class_id: u16,
    offset: u32,
) -> Vec<ParameterDescriptor> {
    let mut parameters = Vec::new();
    let mut local: u32 = 1;
    loop {
        let record = match reader.read_full(class_id, local + offset) {
            Ok(record) => record,
            Err(err) => {
                reader.emit(CollectionEvent::EnumerationFailed {
                    number: local,
                    error: err.to_string(),
                });
                break;
            }
        };

        let mut descriptor = ParameterDescriptor::new(local)
            .with_name(record.name.clone())
            .with_type(record.data_type());
        descriptor.is_writable = record.is_writable();
        if let Err(err) = descriptor.apply_value(&record.value) {
            reader.emit(CollectionEvent::DecodeFailed {
                number: local,
                error: err.to_string(),
            });
        }
        if let Err(err) = descriptor.apply_default(&record.default) {
            reader.emit(CollectionEvent::DecodeFailed {
                number: local,
                error: err.to_string(),
            });
        }
        parameters.push(descriptor);

        let next = u32::from(record.next);
        if next <= local {
            reader.emit(CollectionEvent::EnumerationFinished {
                last: local,
                next,
                count: parameters.len(),
            });
            break;
        }
        local = next;
    }
    parameters
}
