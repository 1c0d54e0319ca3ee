//! ---
//! psnap_section: "05-device-catalogs"
//! psnap_subsection: "module"
//! psnap_type: "source"
//! psnap_scope: "code"
//! psnap_description: "E300 electronic overload relay parameter sample."
//! psnap_version: "v0.0.0-prealpha"
//! psnap_owner: "tbd"
//! ---
use super::CatalogEntry;
use crate::codec::{BaseType, TypeTag};

const AMPS: TypeTag = TypeTag::scaled(BaseType::Int, 2);
const PERCENT: TypeTag = TypeTag::new(BaseType::Uint);
const USINT: TypeTag = TypeTag::new(BaseType::Usint);

pub static CORE: &[CatalogEntry] = &[
    CatalogEntry::status(1, "L1 Current", AMPS),
    CatalogEntry::status(2, "L2 Current", AMPS),
    CatalogEntry::status(3, "L3 Current", AMPS),
    CatalogEntry::status(5, "Average Current", AMPS),
    CatalogEntry::status(7, "Thermal Utilized", PERCENT),
    CatalogEntry::status(8, "Current Imbal", PERCENT),
    CatalogEntry::status(20, "Device Status 0", TypeTag::new(BaseType::Bool16)),
    CatalogEntry::recorded(171, "FLA Setting", AMPS, 50),
    CatalogEntry::recorded(172, "Trip Class", USINT, 10),
    CatalogEntry::recorded(173, "OL/PTC ResetMode", USINT, 0),
    CatalogEntry::recorded(174, "OL Reset Level", USINT, 75),
    CatalogEntry::recorded(183, "TripEnable I", TypeTag::new(BaseType::Bool16), 3),
    CatalogEntry::reference(196, "Set Operating Mode", USINT, 0),
];
