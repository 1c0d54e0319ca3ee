//! ---
//! psnap_section: "06-simulation"
//! psnap_subsection: "module"
//! psnap_type: "source"
//! psnap_scope: "code"
//! psnap_description: "Device image files describing a simulated device."
//! psnap_version: "v0.0.0-prealpha"
//! psnap_owner: "tbd"
//! ---
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use psnap_core::codec::{self, BaseType, CodecError, TypeTag};
use psnap_core::{BatchFamily, IdentityDescriptor};
use serde::{Deserialize, Serialize};

fn default_slot_instance_base() -> u32 {
    1
}

/// One parameter as the device holds it. Values are engineering values:
/// `60.5` for a two-decimal UINT is stored as raw 6050.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterImage {
    pub number: u32,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: TypeTag,
    pub value: f64,
    #[serde(default)]
    pub default: Option<f64>,
    #[serde(default)]
    pub writable: bool,
}

impl ParameterImage {
    pub fn new(number: u32, name: impl Into<String>, data_type: TypeTag, value: f64) -> Self {
        Self {
            number,
            name: name.into(),
            data_type,
            value,
            default: None,
            writable: false,
        }
    }

    pub fn with_default(mut self, default: f64) -> Self {
        self.default = Some(default);
        self
    }

    pub fn writable(mut self) -> Self {
        self.writable = true;
        self
    }

    pub fn encode_value(&self) -> std::result::Result<Vec<u8>, CodecError> {
        encode_engineering(self.value, self.data_type)
    }

    pub fn encode_default(&self) -> Option<std::result::Result<Vec<u8>, CodecError>> {
        self.default
            .map(|default| encode_engineering(default, self.data_type))
    }
}

fn encode_engineering(value: f64, tag: TypeTag) -> std::result::Result<Vec<u8>, CodecError> {
    if tag.base == BaseType::Real {
        return Ok((value as f32).to_le_bytes().to_vec());
    }
    let raw = (value * 10f64.powi(i32::from(tag.decimals))).round() as i64;
    codec::encode_i64(raw, tag)
}

/// A populated backplane slot. Parameter numbers are local to the port and
/// answered at `local + offset`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortImage {
    pub slot: u8,
    #[serde(default)]
    pub offset: u32,
    pub identity: IdentityDescriptor,
    #[serde(default)]
    pub parameters: Vec<ParameterImage>,
}

/// Misbehaviour to inject. Parameter numbers are full addresses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaultPlan {
    /// Every scattered request times out.
    pub fail_scattered: bool,
    /// Flagged as device errors inside scattered responses.
    pub scattered_errors: Vec<u32>,
    /// Single-attribute reads of these parameters fail.
    pub failing_parameters: Vec<u32>,
    /// Bytes cut from the end of every scattered response.
    pub truncate_scattered: Option<usize>,
    /// The default-value attribute is unsupported.
    pub no_defaults: bool,
}

/// Everything a simulated device knows about itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceImage {
    #[serde(default)]
    pub identity: Option<IdentityDescriptor>,
    /// Scattered layout the device answers; `None` rejects scattered reads.
    #[serde(default)]
    pub family: Option<BatchFamily>,
    #[serde(default = "default_slot_instance_base")]
    pub slot_instance_base: u32,
    #[serde(default)]
    pub parameters: Vec<ParameterImage>,
    #[serde(default)]
    pub ports: Vec<PortImage>,
    #[serde(default)]
    pub faults: FaultPlan,
}

impl DeviceImage {
    pub fn new(identity: Option<IdentityDescriptor>, family: Option<BatchFamily>) -> Self {
        Self {
            identity,
            family,
            slot_instance_base: default_slot_instance_base(),
            parameters: Vec::new(),
            ports: Vec::new(),
            faults: FaultPlan::default(),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("unable to read device image {}", path.display()))?;
        let image: Self = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&contents)
                .with_context(|| format!("invalid device image JSON {}", path.display()))?,
            Some("toml") => toml::from_str(&contents)
                .with_context(|| format!("invalid device image TOML {}", path.display()))?,
            _ => bail!("unsupported device image format: {}", path.display()),
        };
        image
            .validate()
            .with_context(|| format!("device image {} rejected", path.display()))?;
        Ok(image)
    }

    /// Every value must encode and numbers must be unique per address space.
    pub fn validate(&self) -> Result<()> {
        check_space("device", &self.parameters)?;
        let mut slots = HashSet::new();
        for port in &self.ports {
            if !slots.insert(port.slot) {
                bail!("slot {} listed twice", port.slot);
            }
            check_space(&format!("slot {}", port.slot), &port.parameters)?;
        }
        Ok(())
    }
}

fn check_space(space: &str, parameters: &[ParameterImage]) -> Result<()> {
    let mut seen = HashSet::new();
    for parameter in parameters {
        if !seen.insert(parameter.number) {
            bail!("{space}: parameter {} listed twice", parameter.number);
        }
        parameter
            .encode_value()
            .with_context(|| format!("{space}: parameter {} value", parameter.number))?;
        if let Some(default) = parameter.encode_default() {
            default.with_context(|| format!("{space}: parameter {} default", parameter.number))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::Builder;

    use super::*;

    const TOML_IMAGE: &str = r#"
family = "simple16"

[identity]
vendor_id = 1
product_type = 2
product_code = 144
major_revision = 7
minor_revision = 1
status = 0
serial_number = 305419896
product_name = "PowerFlex 525"

[[parameters]]
number = 41
name = "Accel Time 1"
type = { base = "uint", decimals = 2 }
value = 5.5
default = 10

[faults]
scattered_errors = [7]
"#;

    #[test]
    fn loads_toml_images() -> Result<()> {
        let mut file = Builder::new().suffix(".toml").tempfile()?;
        file.write_all(TOML_IMAGE.as_bytes())?;
        file.flush()?;
        let image = DeviceImage::from_path(file.path())?;
        assert_eq!(image.family, Some(BatchFamily::Simple16));
        assert_eq!(image.slot_instance_base, 1);
        assert_eq!(image.parameters[0].encode_value()?, 550u16.to_le_bytes());
        assert_eq!(image.faults.scattered_errors, vec![7]);
        Ok(())
    }

    #[test]
    fn rejects_scales_beyond_the_descriptor_range() {
        let image = TOML_IMAGE.replace("decimals = 2", "decimals = 19");
        let err = toml::from_str::<DeviceImage>(&image).unwrap_err();
        assert!(err.to_string().contains("decimal places"));
    }

    #[test]
    fn loads_json_images() -> Result<()> {
        let image: DeviceImage = toml::from_str(TOML_IMAGE)?;
        let mut file = Builder::new().suffix(".json").tempfile()?;
        file.write_all(serde_json::to_string(&image)?.as_bytes())?;
        file.flush()?;
        assert_eq!(DeviceImage::from_path(file.path())?, image);
        Ok(())
    }

    #[test]
    fn rejects_values_outside_their_type() {
        let mut image = DeviceImage::new(None, None);
        image.parameters.push(ParameterImage::new(
            1,
            "Output Freq",
            TypeTag::scaled(BaseType::Uint, 2),
            700.0,
        ));
        assert!(image.validate().is_err());
    }

    #[test]
    fn bundled_images_validate() -> Result<()> {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("images");
        for name in ["powerflex755.toml", "powerflex525.json", "e300.toml"] {
            DeviceImage::from_path(&dir.join(name))?;
        }
        Ok(())
    }

    #[test]
    fn rejects_unknown_extensions() {
        let file = Builder::new().suffix(".yaml").tempfile().unwrap();
        let err = DeviceImage::from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported device image format"));
    }
}
