//! ---
//! psnap_section: "05-device-catalogs"
//! psnap_subsection: "module"
//! psnap_type: "source"
//! psnap_scope: "code"
//! psnap_description: "PowerFlex 755 host parameters and option-card parameter lists."
//! psnap_version: "v0.0.0-prealpha"
//! psnap_owner: "tbd"
//! ---
use super::CatalogEntry;
use crate::codec::{BaseType, TypeTag};

const REAL: TypeTag = TypeTag::new(BaseType::Real);
const UINT: TypeTag = TypeTag::new(BaseType::Uint);
const UDINT: TypeTag = TypeTag::new(BaseType::Udint);
const DWORD: TypeTag = TypeTag::new(BaseType::Bool32);
const WORD: TypeTag = TypeTag::new(BaseType::Bool16);

pub static HOST: &[CatalogEntry] = &[
    CatalogEntry::status(1, "Output Frequency", REAL),
    CatalogEntry::status(2, "Commanded SpdRef", REAL),
    CatalogEntry::status(3, "Mtr Vel Fdbk", REAL),
    CatalogEntry::status(7, "Output Current", REAL),
    CatalogEntry::status(8, "Output Voltage", REAL),
    CatalogEntry::status(11, "DC Bus Volts", REAL),
    CatalogEntry::recorded(25, "Motor NP Volts", REAL, 400),
    CatalogEntry::recorded(26, "Motor NP Amps", REAL, 10),
    CatalogEntry::recorded(27, "Motor NP Hertz", REAL, 50),
    CatalogEntry::recorded(28, "Motor NP RPM", REAL, 1500),
    CatalogEntry::recorded(30, "Motor NP Power", REAL, 4),
    CatalogEntry::recorded(35, "Motor Ctrl Mode", UINT, 1),
    CatalogEntry::recorded(370, "Stop Mode A", UINT, 1),
    CatalogEntry::recorded(520, "Max Fwd Speed", REAL, 50),
    CatalogEntry::recorded(521, "Max Rev Speed", REAL, -50),
    CatalogEntry::recorded(535, "Accel Time 1", REAL, 10),
    CatalogEntry::recorded(537, "Decel Time 1", REAL, 10),
    CatalogEntry::recorded(545, "Spd Ref A Sel", UDINT, 0),
    CatalogEntry::status(935, "Drive Status 1", DWORD),
    CatalogEntry::status(936, "Drive Status 2", DWORD),
];

/// 20-750-ENETR dual-port EtherNet/IP option, numbered locally.
pub static ENETR: &[CatalogEntry] = &[
    CatalogEntry::recorded(1, "Operating Mode", UINT, 0),
    CatalogEntry::status(2, "Port Number", UINT),
    CatalogEntry::recorded(3, "IP Addr Src", UINT, 0),
    CatalogEntry::recorded(4, "IP Addr Cfg 1", UINT, 0),
    CatalogEntry::recorded(5, "IP Addr Cfg 2", UINT, 0),
    CatalogEntry::recorded(6, "IP Addr Cfg 3", UINT, 0),
    CatalogEntry::recorded(7, "IP Addr Cfg 4", UINT, 0),
];

/// 20-750-2262C-2R digital/analog I/O option, numbered locally.
pub static IO_2262C: &[CatalogEntry] = &[
    CatalogEntry::status(1, "Dig In Sts", WORD),
    CatalogEntry::recorded(2, "Dig In Filt Mask", WORD, 0),
    CatalogEntry::recorded(3, "Dig In Filt", UINT, 0).untyped(),
    CatalogEntry::status(5, "Dig Out Sts", WORD),
    CatalogEntry::status(50, "Anlg In0 Value", REAL),
];
