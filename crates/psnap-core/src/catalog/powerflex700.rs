//! ---
//! psnap_section: "05-device-catalogs"
//! psnap_subsection: "module"
//! psnap_type: "source"
//! psnap_scope: "code"
//! psnap_description: "PowerFlex 70/700 parameter sample and 20-COMM adapter parameters."
//! psnap_version: "v0.0.0-prealpha"
//! psnap_owner: "tbd"
//! ---
use super::CatalogEntry;
use crate::codec::{BaseType, TypeTag};

const UINT: TypeTag = TypeTag::new(BaseType::Uint);
const USINT: TypeTag = TypeTag::new(BaseType::Usint);
const WORD: TypeTag = TypeTag::new(BaseType::Bool16);
const TENTHS: TypeTag = TypeTag::scaled(BaseType::Uint, 1);
const HUNDREDTHS: TypeTag = TypeTag::scaled(BaseType::Uint, 2);
const SIGNED_TENTHS: TypeTag = TypeTag::scaled(BaseType::Int, 1);

/// 20-COMM adapter parameters are reached above this number.
pub const ADAPTER_BOUNDARY: u32 = 0x4000;

pub static CORE: &[CatalogEntry] = &[
    CatalogEntry::status(1, "Output Frequency", SIGNED_TENTHS),
    CatalogEntry::status(3, "Output Current", HUNDREDTHS),
    CatalogEntry::status(6, "Output Voltage", TENTHS),
    CatalogEntry::status(12, "DC Bus Voltage", TENTHS),
    CatalogEntry::recorded(41, "Motor NP Volts", TENTHS, 4600),
    CatalogEntry::recorded(42, "Motor NP FLA", TENTHS, 150),
    CatalogEntry::recorded(43, "Motor NP Hertz", TENTHS, 600),
    CatalogEntry::recorded(44, "Motor NP RPM", UINT, 1750),
    CatalogEntry::recorded(45, "Motor NP Power", HUNDREDTHS, 750),
    CatalogEntry::recorded(53, "Motor Cntl Sel", UINT, 0).untyped(),
    CatalogEntry::recorded(81, "Minimum Speed", TENTHS, 0),
    CatalogEntry::recorded(82, "Maximum Speed", TENTHS, 600),
    CatalogEntry::recorded(90, "Speed Ref A Sel", UINT, 2),
    CatalogEntry::recorded(140, "Accel Time 1", TENTHS, 100),
    CatalogEntry::recorded(142, "Decel Time 1", TENTHS, 100),
    CatalogEntry::recorded(155, "Stop Mode A", UINT, 1),
    CatalogEntry::status(209, "Drive Status 1", WORD),
    CatalogEntry::status(210, "Drive Status 2", WORD),
    CatalogEntry::reference(196, "Param Access Lvl", UINT, 0),
];

pub static ADAPTER: &[CatalogEntry] = &[
    CatalogEntry::status(0x4001, "DPI Port", UINT),
    CatalogEntry::status(0x4002, "DPI Data Rate", UINT),
    CatalogEntry::recorded(0x4003, "BOOTP", UINT, 1),
    CatalogEntry::recorded(0x4004, "IP Addr Cfg 1", USINT, 0),
    CatalogEntry::recorded(0x4005, "IP Addr Cfg 2", USINT, 0),
    CatalogEntry::recorded(0x4006, "IP Addr Cfg 3", USINT, 0),
    CatalogEntry::recorded(0x4007, "IP Addr Cfg 4", USINT, 0),
];
