//! ---
//! psnap_section: "05-device-catalogs"
//! psnap_subsection: "module"
//! psnap_type: "source"
//! psnap_scope: "code"
//! psnap_description: "PowerFlex 525 parameter sample and embedded adapter parameters."
//! psnap_version: "v0.0.0-prealpha"
//! psnap_owner: "tbd"
//! ---
use super::CatalogEntry;
use crate::codec::{BaseType, TypeTag};

const UINT: TypeTag = TypeTag::new(BaseType::Uint);
const USINT: TypeTag = TypeTag::new(BaseType::Usint);
const WORD: TypeTag = TypeTag::new(BaseType::Bool16);
const HZ: TypeTag = TypeTag::scaled(BaseType::Uint, 2);
const AMPS: TypeTag = TypeTag::scaled(BaseType::Uint, 2);
const VOLTS: TypeTag = TypeTag::scaled(BaseType::Uint, 1);
const SECS: TypeTag = TypeTag::scaled(BaseType::Uint, 2);

/// Adapter parameters are numbered from here up.
pub const ADAPTER_BOUNDARY: u32 = 1000;

pub static CORE: &[CatalogEntry] = &[
    CatalogEntry::status(1, "Output Freq", HZ),
    CatalogEntry::status(2, "Commanded Freq", HZ),
    CatalogEntry::status(3, "Output Current", AMPS),
    CatalogEntry::status(4, "Output Voltage", VOLTS),
    CatalogEntry::status(5, "DC Bus Voltage", UINT),
    CatalogEntry::status(6, "Drive Status", WORD),
    CatalogEntry::status(7, "Fault 1 Code", UINT),
    CatalogEntry::reference(30, "Language", UINT, 1),
    CatalogEntry::recorded(31, "Motor NP Volts", UINT, 460),
    CatalogEntry::recorded(32, "Motor NP Hertz", UINT, 60),
    CatalogEntry::recorded(33, "Motor OL Current", TypeTag::scaled(BaseType::Uint, 1), 100),
    CatalogEntry::recorded(34, "Motor NP FLA", TypeTag::scaled(BaseType::Uint, 1), 100),
    CatalogEntry::recorded(35, "Motor NP Poles", UINT, 4),
    CatalogEntry::recorded(36, "Motor NP RPM", UINT, 1750),
    CatalogEntry::recorded(37, "Motor NP Power", TypeTag::scaled(BaseType::Uint, 2), 75),
    CatalogEntry::recorded(41, "Accel Time 1", SECS, 1000),
    CatalogEntry::recorded(42, "Decel Time 1", SECS, 1000),
    CatalogEntry::recorded(43, "Minimum Freq", HZ, 0),
    CatalogEntry::recorded(44, "Maximum Freq", HZ, 6000),
    CatalogEntry::recorded(45, "Stop Mode", UINT, 0).untyped(),
    CatalogEntry::recorded(46, "Start Source 1", UINT, 1).untyped(),
    CatalogEntry::recorded(47, "Speed Reference1", UINT, 2),
];

pub static ADAPTER: &[CatalogEntry] = &[
    CatalogEntry::recorded(1128, "EN Addr Sel", UINT, 2),
    CatalogEntry::recorded(1129, "EN IP Addr Cfg 1", USINT, 0),
    CatalogEntry::recorded(1130, "EN IP Addr Cfg 2", USINT, 0),
    CatalogEntry::recorded(1131, "EN IP Addr Cfg 3", USINT, 0),
    CatalogEntry::recorded(1132, "EN IP Addr Cfg 4", USINT, 0),
    CatalogEntry::recorded(1133, "EN Subnet Cfg 1", USINT, 0),
    CatalogEntry::reference(1153, "EN Rate Cfg", UINT, 0),
];
