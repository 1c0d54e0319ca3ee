//! ---
//! psnap_section: "02-transport-boundary"
//! psnap_subsection: "module"
//! psnap_type: "source"
//! psnap_scope: "code"
//! psnap_description: "CIP service, class and attribute identifiers."
//! psnap_version: "v0.0.0-prealpha"
//! psnap_owner: "tbd"
//! ---
//! CIP identifiers shared by the acquisition engine and the simulator.
#![allow(missing_docs)]

/// Service codes.
pub mod service {
    pub const GET_ATTRIBUTES_ALL: u8 = 0x01;
    pub const GET_ATTRIBUTE_SINGLE: u8 = 0x0E;
    /// Vendor-specific multi-parameter read used by drive parameter objects.
    pub const SCATTERED_READ: u8 = 0x4B;
}

/// Object class identifiers.
pub mod class {
    pub const IDENTITY: u16 = 0x01;
    /// Standard CIP Parameter Object.
    pub const PARAMETER: u16 = 0x0F;
    /// DPI Parameter Object (drive-resident parameters).
    pub const DPI_PARAMETER: u16 = 0x93;
    /// Host DPI Parameter Object; reaches backplane ports through offsets.
    pub const HOST_DPI_PARAMETER: u16 = 0x9F;
    /// DeviceLogix parameter space exposed by some option cards.
    pub const DEVICELOGIX_PARAMETER: u16 = 0x9E;
}

/// Attributes of the standard Parameter Object (class 0x0F).
pub mod parameter_attr {
    pub const VALUE: u8 = 1;
    pub const DESCRIPTOR: u8 = 4;
    pub const DATA_TYPE: u8 = 5;
    pub const DATA_SIZE: u8 = 6;
    pub const NAME: u8 = 7;
    pub const DEFAULT_VALUE: u8 = 12;
}

/// Attributes of the DPI Parameter Objects (classes 0x93 / 0x9E / 0x9F).
pub mod dpi_attr {
    pub const ONLINE_READ_FULL: u8 = 7;
    pub const DESCRIPTOR: u8 = 8;
    pub const VALUE: u8 = 9;
    pub const DEFAULT_VALUE: u8 = 12;
}

/// CIP device type (identity attribute 2) values seen on motor-control products.
pub mod device_type {
    pub const AC_DRIVE: u16 = 0x02;
    pub const MOTOR_OVERLOAD: u16 = 0x03;
    pub const COMMUNICATIONS_ADAPTER: u16 = 0x0C;
    pub const DPI_PERIPHERAL: u16 = 0x7B;
    pub const POWERFLEX_750_HOST: u16 = 0x8E;
}

/// General status codes returned in CIP error responses.
pub mod status {
    pub const SUCCESS: u8 = 0x00;
    pub const PATH_DESTINATION_UNKNOWN: u8 = 0x05;
    pub const SERVICE_NOT_SUPPORTED: u8 = 0x08;
    pub const ATTRIBUTE_NOT_SUPPORTED: u8 = 0x14;
    pub const OBJECT_DOES_NOT_EXIST: u8 = 0x16;
}
