//! ---
//! psnap_section: "05-device-catalogs"
//! psnap_subsection: "module"
//! psnap_type: "source"
//! psnap_scope: "code"
//! psnap_description: "PowerFlex 4M parameter sample."
//! psnap_version: "v0.0.0-prealpha"
//! psnap_owner: "tbd"
//! ---
use super::CatalogEntry;
use crate::codec::{BaseType, TypeTag};

const UINT: TypeTag = TypeTag::new(BaseType::Uint);
const TENTHS: TypeTag = TypeTag::scaled(BaseType::Uint, 1);
const HUNDREDTHS: TypeTag = TypeTag::scaled(BaseType::Uint, 2);

pub static CORE: &[CatalogEntry] = &[
    CatalogEntry::status(1, "Output Freq", HUNDREDTHS),
    CatalogEntry::status(2, "Commanded Freq", HUNDREDTHS),
    CatalogEntry::status(3, "Output Current", HUNDREDTHS),
    CatalogEntry::status(4, "Output Voltage", UINT),
    CatalogEntry::status(5, "DC Bus Voltage", UINT),
    CatalogEntry::status(6, "Drive Status", TypeTag::new(BaseType::Bool16)),
    CatalogEntry::recorded(31, "Motor NP Volts", UINT, 230),
    CatalogEntry::recorded(32, "Motor NP Hertz", UINT, 60),
    CatalogEntry::recorded(33, "Motor OL Current", TENTHS, 18),
    CatalogEntry::recorded(34, "Minimum Freq", TENTHS, 0),
    CatalogEntry::recorded(35, "Maximum Freq", TENTHS, 600),
    CatalogEntry::recorded(36, "Start Source", UINT, 0),
    CatalogEntry::recorded(37, "Stop Mode", UINT, 0),
    CatalogEntry::recorded(38, "Speed Reference", UINT, 0),
    CatalogEntry::recorded(39, "Accel Time 1", TENTHS, 100),
    CatalogEntry::recorded(40, "Decel Time 1", TENTHS, 100),
    CatalogEntry::reference(41, "Reset To Defaults", UINT, 0),
];
