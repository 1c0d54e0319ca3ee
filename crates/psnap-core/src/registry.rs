//! ---
//! psnap_section: "04-acquisition-engine"
//! psnap_subsection: "module"
//! psnap_type: "source"
//! psnap_scope: "code"
//! psnap_description: "Device variant table and identity-based resolution."
//! psnap_version: "v0.0.0-prealpha"
//! psnap_owner: "tbd"
//! ---
//! Every supported product is one row of [`VARIANTS`]: a match key plus the
//! behaviour values the engine needs to talk to it. [`resolve`] picks the most
//! specific eligible row and falls back to [`GENERIC`].

use psnap_transport::cip::{class, device_type, dpi_attr, parameter_attr};
use serde::Serialize;

use crate::cards::{CardDefinition, POWERFLEX_750_CARDS};
use crate::catalog::{e300, powerflex4m, powerflex525, powerflex700, powerflex755, CatalogEntry};
use crate::model::{IdentityDescriptor, PortMapEntry};
use crate::scattered::BatchFamily;

/// How a domain reports parameter types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TypeEncoding {
    /// One CIP elementary data-type byte.
    CipCode,
    /// A 32-bit DPI descriptor word.
    DpiDescriptor,
}

/// Object class, attributes and read strategy of one addressing domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DomainAccess {
    pub class_id: u16,
    pub value_attribute: u8,
    pub type_attribute: u8,
    pub default_attribute: u8,
    pub type_encoding: TypeEncoding,
    /// `None` restricts the domain to individual reads.
    pub scattered: Option<BatchFamily>,
    pub batch_size: Option<usize>,
}

impl DomainAccess {
    /// Standard Parameter Object (class 0x0F).
    pub const fn parameter_object(scattered: Option<BatchFamily>) -> Self {
        Self {
            class_id: class::PARAMETER,
            value_attribute: parameter_attr::VALUE,
            type_attribute: parameter_attr::DATA_TYPE,
            default_attribute: parameter_attr::DEFAULT_VALUE,
            type_encoding: TypeEncoding::CipCode,
            scattered,
            batch_size: None,
        }
    }

    /// One of the DPI parameter classes.
    pub const fn dpi(class_id: u16, scattered: Option<BatchFamily>) -> Self {
        Self {
            class_id,
            value_attribute: dpi_attr::VALUE,
            type_attribute: dpi_attr::DESCRIPTOR,
            default_attribute: dpi_attr::DEFAULT_VALUE,
            type_encoding: TypeEncoding::DpiDescriptor,
            scattered,
            batch_size: None,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size.max(1));
        self
    }

    /// Parameters per scattered request; the family default unless overridden.
    pub fn batch_size(&self) -> usize {
        match (self.batch_size, self.scattered) {
            (Some(size), _) => size.max(1),
            (None, Some(family)) => family.default_batch_size(),
            (None, None) => 1,
        }
    }
}

/// How the catalog splits into addressing domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Partitioning {
    /// Every parameter lives in the core domain.
    Single,
    /// Numbers at or above `boundary` belong to the adapter domain.
    Threshold { boundary: u32 },
}

impl Partitioning {
    pub fn is_adapter(&self, number: u32) -> bool {
        match self {
            Partitioning::Single => false,
            Partitioning::Threshold { boundary } => number >= *boundary,
        }
    }
}

/// Backplane of a modular drive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModularLayout {
    pub first_slot: u8,
    pub last_slot: u8,
    /// Identity instance of slot `n` is `n + instance_base`.
    pub instance_base: u32,
    pub port_map: &'static [PortMapEntry],
    /// Scattered layout for cards that support it.
    pub port_family: BatchFamily,
    /// Class used to enumerate cards missing from `cards`.
    pub default_port_class: u16,
    #[serde(skip)]
    pub cards: &'static [CardDefinition],
}

impl ModularLayout {
    pub fn offset_for(&self, port: u8) -> Option<u32> {
        self.port_map
            .iter()
            .find(|entry| entry.port == port)
            .map(|entry| entry.offset)
    }

    pub fn slots(&self) -> std::ops::RangeInclusive<u8> {
        self.first_slot..=self.last_slot
    }
}

/// Strategy values bound to one variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VariantBehavior {
    #[serde(skip)]
    pub core_catalog: &'static [CatalogEntry],
    #[serde(skip)]
    pub adapter_catalog: Option<&'static [CatalogEntry]>,
    pub partitioning: Partitioning,
    pub core_access: DomainAccess,
    /// Falls back to `core_access` when absent.
    pub adapter_access: Option<DomainAccess>,
    pub modular: Option<ModularLayout>,
}

impl VariantBehavior {
    pub fn has_catalog(&self) -> bool {
        !self.core_catalog.is_empty() || self.adapter_catalog.is_some_and(|c| !c.is_empty())
    }

    pub fn adapter_access(&self) -> DomainAccess {
        self.adapter_access.unwrap_or(self.core_access)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchKey {
    pub family: &'static str,
    pub product_type: Option<u16>,
    pub product_code: Option<u16>,
    pub identity_required: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DeviceVariantDescriptor {
    pub name: &'static str,
    pub key: MatchKey,
    pub behavior: VariantBehavior,
}

/// What is known about a device before its variant is chosen.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveQuery<'a> {
    /// Operator-supplied family name.
    pub family: Option<&'a str>,
    pub identity: Option<&'a IdentityDescriptor>,
}

impl<'a> ResolveQuery<'a> {
    pub fn new(family: Option<&'a str>, identity: Option<&'a IdentityDescriptor>) -> Self {
        Self { family, identity }
    }
}

const fn port(port: u8, offset: u32) -> PortMapEntry {
    PortMapEntry { port, offset }
}

static POWERFLEX_755_PORTS: &[PortMapEntry] = &[
    port(1, 0x2000),
    port(2, 0x4000),
    port(3, 0x6000),
    port(4, 0x8000),
    port(5, 0xA000),
    port(6, 0xC000),
    port(7, 0xE000),
    port(8, 0x1_0000),
    port(9, 0x1_2000),
    port(10, 0x1_4000),
    port(11, 0x1_6000),
    port(12, 0x1_8000),
    port(13, 0x1_A000),
    port(14, 0x1_C000),
];

const ALL_BY_CIP: DomainAccess = DomainAccess::parameter_object(None);

const GENERIC_BEHAVIOR: VariantBehavior = VariantBehavior {
    core_catalog: &[],
    adapter_catalog: None,
    partitioning: Partitioning::Single,
    core_access: ALL_BY_CIP,
    adapter_access: None,
    modular: None,
};

pub static GENERIC: DeviceVariantDescriptor = DeviceVariantDescriptor {
    name: "generic",
    key: MatchKey {
        family: "generic",
        product_type: None,
        product_code: None,
        identity_required: false,
    },
    behavior: GENERIC_BEHAVIOR,
};

/// Registered variants in registration order. Product codes are illustrative.
pub static VARIANTS: &[DeviceVariantDescriptor] = &[
    DeviceVariantDescriptor {
        name: "powerflex-525",
        key: MatchKey {
            family: "powerflex-525",
            product_type: Some(device_type::AC_DRIVE),
            product_code: Some(0x0090),
            identity_required: false,
        },
        behavior: VariantBehavior {
            core_catalog: powerflex525::CORE,
            adapter_catalog: Some(powerflex525::ADAPTER),
            partitioning: Partitioning::Threshold {
                boundary: powerflex525::ADAPTER_BOUNDARY,
            },
            core_access: DomainAccess::parameter_object(Some(BatchFamily::Simple16)),
            adapter_access: Some(ALL_BY_CIP),
            modular: None,
        },
    },
    DeviceVariantDescriptor {
        name: "powerflex-4m",
        key: MatchKey {
            family: "powerflex-4m",
            product_type: Some(device_type::AC_DRIVE),
            product_code: Some(0x0062),
            identity_required: false,
        },
        behavior: VariantBehavior {
            core_catalog: powerflex4m::CORE,
            adapter_catalog: None,
            partitioning: Partitioning::Single,
            core_access: DomainAccess::parameter_object(Some(BatchFamily::Simple16)),
            adapter_access: None,
            modular: None,
        },
    },
    DeviceVariantDescriptor {
        name: "powerflex-700-comm-e",
        key: MatchKey {
            family: "powerflex-700",
            product_type: Some(device_type::AC_DRIVE),
            product_code: Some(0x0440),
            identity_required: false,
        },
        behavior: VariantBehavior {
            core_catalog: powerflex700::CORE,
            adapter_catalog: Some(powerflex700::ADAPTER),
            partitioning: Partitioning::Threshold {
                boundary: powerflex700::ADAPTER_BOUNDARY,
            },
            core_access: DomainAccess::dpi(class::DPI_PARAMETER, Some(BatchFamily::Extended)),
            adapter_access: Some(DomainAccess::dpi(class::DPI_PARAMETER, None)),
            modular: None,
        },
    },
    DeviceVariantDescriptor {
        name: "powerflex-700-comm-d",
        key: MatchKey {
            family: "powerflex-700",
            product_type: Some(device_type::AC_DRIVE),
            product_code: Some(0x0441),
            identity_required: false,
        },
        behavior: VariantBehavior {
            core_catalog: powerflex700::CORE,
            adapter_catalog: None,
            partitioning: Partitioning::Single,
            core_access: DomainAccess::dpi(
                class::DPI_PARAMETER,
                Some(BatchFamily::ExtendedLowThroughput),
            ),
            adapter_access: None,
            modular: None,
        },
    },
    DeviceVariantDescriptor {
        name: "powerflex-755",
        key: MatchKey {
            family: "powerflex-755",
            product_type: Some(device_type::POWERFLEX_750_HOST),
            product_code: Some(0x0A00),
            identity_required: false,
        },
        behavior: VariantBehavior {
            core_catalog: powerflex755::HOST,
            adapter_catalog: None,
            partitioning: Partitioning::Single,
            core_access: DomainAccess::dpi(class::DPI_PARAMETER, Some(BatchFamily::Backplane32)),
            adapter_access: None,
            modular: Some(ModularLayout {
                first_slot: 1,
                last_slot: 14,
                instance_base: 1,
                port_map: POWERFLEX_755_PORTS,
                port_family: BatchFamily::Backplane32,
                default_port_class: class::HOST_DPI_PARAMETER,
                cards: POWERFLEX_750_CARDS,
            }),
        },
    },
    DeviceVariantDescriptor {
        name: "e300",
        key: MatchKey {
            family: "e300",
            product_type: Some(device_type::MOTOR_OVERLOAD),
            product_code: Some(0x00C3),
            identity_required: true,
        },
        behavior: VariantBehavior {
            core_catalog: e300::CORE,
            adapter_catalog: None,
            partitioning: Partitioning::Single,
            core_access: DomainAccess::parameter_object(Some(BatchFamily::Simple16)),
            adapter_access: None,
            modular: None,
        },
    },
];

/// Number of key fields `variant` matches, or `None` when it is ineligible.
fn specificity(variant: &DeviceVariantDescriptor, query: &ResolveQuery<'_>) -> Option<usize> {
    let key = &variant.key;
    if key.identity_required && query.identity.is_none() {
        return None;
    }
    let mut score = 0;
    if let Some(family) = query.family {
        if !family.trim().eq_ignore_ascii_case(key.family)
            && !family.trim().eq_ignore_ascii_case(variant.name)
        {
            return None;
        }
        score += 1;
    }
    if let Some(identity) = query.identity {
        if let Some(product_type) = key.product_type {
            if product_type != identity.product_type {
                return None;
            }
            score += 1;
        }
        if let Some(product_code) = key.product_code {
            if product_code != identity.product_code {
                return None;
            }
            score += 1;
        }
    }
    (score > 0).then_some(score)
}

pub fn resolve_in<'t>(
    table: &'t [DeviceVariantDescriptor],
    query: &ResolveQuery<'_>,
) -> Option<&'t DeviceVariantDescriptor> {
    let mut best: Option<(usize, &DeviceVariantDescriptor)> = None;
    for variant in table {
        if let Some(score) = specificity(variant, query) {
            if best.map_or(true, |(top, _)| score > top) {
                best = Some((score, variant));
            }
        }
    }
    best.map(|(_, variant)| variant)
}

/// Pick the registered variant for a device, or [`GENERIC`].
pub fn resolve(query: &ResolveQuery<'_>) -> &'static DeviceVariantDescriptor {
    resolve_in(VARIANTS, query).unwrap_or(&GENERIC)
}

pub fn variant_by_name(name: &str) -> Option<&'static DeviceVariantDescriptor> {
    VARIANTS
        .iter()
        .chain(std::iter::once(&GENERIC))
        .find(|variant| variant.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(product_type: u16, product_code: u16) -> IdentityDescriptor {
        IdentityDescriptor {
            vendor_id: 1,
            product_type,
            product_code,
            major_revision: 1,
            minor_revision: 1,
            status: 0,
            serial_number: 1,
            product_name: "device".into(),
        }
    }

    #[test]
    fn identity_selects_exact_product() {
        let id = identity(device_type::AC_DRIVE, 0x0090);
        assert_eq!(resolve(&ResolveQuery::new(None, Some(&id))).name, "powerflex-525");
        let id = identity(device_type::POWERFLEX_750_HOST, 0x0A00);
        let variant = resolve(&ResolveQuery::new(None, Some(&id)));
        assert_eq!(variant.name, "powerflex-755");
        assert!(variant.behavior.modular.is_some());
    }

    #[test]
    fn family_hint_alone_picks_first_registered_member() {
        let variant = resolve(&ResolveQuery::new(Some("PowerFlex-700"), None));
        assert_eq!(variant.name, "powerflex-700-comm-e");
        let variant = resolve(&ResolveQuery::new(Some("powerflex-700-comm-d"), None));
        assert_eq!(variant.name, "powerflex-700-comm-d");
    }

    #[test]
    fn hint_and_identity_must_agree() {
        let id = identity(device_type::AC_DRIVE, 0x0090);
        let variant = resolve(&ResolveQuery::new(Some("powerflex-4m"), Some(&id)));
        assert_eq!(variant.name, "generic");
    }

    #[test]
    fn identity_required_variant_needs_identity() {
        assert_eq!(resolve(&ResolveQuery::new(Some("e300"), None)).name, "generic");
        let id = identity(device_type::MOTOR_OVERLOAD, 0x00C3);
        assert_eq!(resolve(&ResolveQuery::new(Some("e300"), Some(&id))).name, "e300");
    }

    #[test]
    fn unknown_device_falls_back_to_generic() {
        let id = identity(0x2B, 0x1234);
        let variant = resolve(&ResolveQuery::new(None, Some(&id)));
        assert_eq!(variant.name, GENERIC.name);
        assert!(!variant.behavior.has_catalog());
        assert_eq!(variant.behavior.core_access.scattered, None);
        assert_eq!(resolve(&ResolveQuery::default()).name, "generic");
    }

    #[test]
    fn more_specific_entry_wins_over_registration_order() {
        static TABLE: &[DeviceVariantDescriptor] = &[
            DeviceVariantDescriptor {
                name: "by-type",
                key: MatchKey {
                    family: "drive",
                    product_type: Some(device_type::AC_DRIVE),
                    product_code: None,
                    identity_required: false,
                },
                behavior: GENERIC_BEHAVIOR,
            },
            DeviceVariantDescriptor {
                name: "by-code",
                key: MatchKey {
                    family: "drive",
                    product_type: Some(device_type::AC_DRIVE),
                    product_code: Some(0x0090),
                    identity_required: false,
                },
                behavior: GENERIC_BEHAVIOR,
            },
        ];
        let id = identity(device_type::AC_DRIVE, 0x0090);
        let variant = resolve_in(TABLE, &ResolveQuery::new(None, Some(&id))).unwrap();
        assert_eq!(variant.name, "by-code");
        let other = identity(device_type::AC_DRIVE, 0x0091);
        let variant = resolve_in(TABLE, &ResolveQuery::new(None, Some(&other))).unwrap();
        assert_eq!(variant.name, "by-type");
    }

    #[test]
    fn batch_size_defaults_to_family() {
        let access = DomainAccess::dpi(class::DPI_PARAMETER, Some(BatchFamily::Extended));
        assert_eq!(access.batch_size(), 22);
        assert_eq!(access.with_batch_size(0).batch_size(), 1);
        assert_eq!(ALL_BY_CIP.batch_size(), 1);
    }

    #[test]
    fn powerflex_755_ports_are_mapped() {
        let layout = variant_by_name("powerflex-755")
            .and_then(|v| v.behavior.modular)
            .unwrap();
        assert_eq!(layout.offset_for(5), Some(0xA000));
        assert_eq!(layout.offset_for(0), None);
        assert_eq!(layout.slots().count(), 14);
    }
}
