//! ---
//! psnap_section: "05-device-catalogs"
//! psnap_subsection: "module"
//! psnap_type: "source"
//! psnap_scope: "code"
//! psnap_description: "Static parameter catalogs per product family."
//! psnap_version: "v0.0.0-prealpha"
//! psnap_owner: "tbd"
//! ---
//! Catalog rows are a sample of each product's parameter list. Rows marked
//! `reference` describe a parameter but are only collected with `collect_all`.

pub mod e300;
pub mod powerflex4m;
pub mod powerflex525;
pub mod powerflex700;
pub mod powerflex755;

use crate::codec::TypeTag;

/// One row of a static parameter catalog.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogEntry {
    pub number: u32,
    pub name: &'static str,
    pub default_value: Option<i64>,
    pub record: bool,
    /// `None` leaves the type to be read from the device.
    pub data_type: Option<TypeTag>,
}

impl CatalogEntry {
    pub const fn recorded(number: u32, name: &'static str, data_type: TypeTag, default: i64) -> Self {
        Self {
            number,
            name,
            default_value: Some(default),
            record: true,
            data_type: Some(data_type),
        }
    }

    /// Read-only status values with no meaningful default.
    pub const fn status(number: u32, name: &'static str, data_type: TypeTag) -> Self {
        Self {
            number,
            name,
            default_value: None,
            record: true,
            data_type: Some(data_type),
        }
    }

    pub const fn reference(number: u32, name: &'static str, data_type: TypeTag, default: i64) -> Self {
        Self {
            number,
            name,
            default_value: Some(default),
            record: false,
            data_type: Some(data_type),
        }
    }

    pub const fn untyped(mut self) -> Self {
        self.data_type = None;
        self
    }
}
