//! ---
//! psnap_section: "07-operator-cli"
//! psnap_subsection: "binary"
//! psnap_type: "source"
//! psnap_scope: "code"
//! psnap_description: "Variant registry listing."
//! psnap_version: "v0.0.0-prealpha"
//! psnap_owner: "tbd"
//! ---
use anyhow::Result;
use clap::Args;
use psnap_core::registry::{DomainAccess, VARIANTS};
use serde::Serialize;

#[derive(Debug, Args)]
pub struct VariantsCommand {
    /// Print the registry as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct VariantRow {
    name: &'static str,
    family: &'static str,
    product_type: Option<u16>,
    product_code: Option<u16>,
    core_parameters: usize,
    adapter_parameters: usize,
    access: String,
    slots: Option<String>,
}

fn describe(access: &DomainAccess) -> String {
    match access.scattered {
        Some(family) => format!(
            "class {:#04x} scattered {} x{}",
            access.class_id,
            family,
            access.batch_size()
        ),
        None => format!("class {:#04x} individual", access.class_id),
    }
}

fn rows() -> Vec<VariantRow> {
    VARIANTS
        .iter()
        .map(|variant| {
            let behavior = &variant.behavior;
            VariantRow {
                name: variant.name,
                family: variant.key.family,
                product_type: variant.key.product_type,
                product_code: variant.key.product_code,
                core_parameters: behavior.core_catalog.len(),
                adapter_parameters: behavior.adapter_catalog.map_or(0, <[_]>::len),
                access: describe(&behavior.core_access),
                slots: behavior.modular.as_ref().map(|layout| {
                    format!("{}-{}", layout.first_slot, layout.last_slot)
                }),
            }
        })
        .collect()
}

impl VariantsCommand {
    pub fn execute(self) -> Result<()> {
        let rows = rows();
        if self.json {
            println!("{}", serde_json::to_string_pretty(&rows)?);
            return Ok(());
        }
        for row in rows {
            let code = row
                .product_code
                .map(|code| format!("{code:#06x}"))
                .unwrap_or_else(|| "-".into());
            println!(
                "{:<22} {:<8} core={:<4} adapter={:<4} {}{}",
                row.name,
                code,
                row.core_parameters,
                row.adapter_parameters,
                row.access,
                row.slots
                    .map(|slots| format!(" slots={slots}"))
                    .unwrap_or_default()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_every_registered_variant() {
        let rows = rows();
        assert_eq!(rows.len(), VARIANTS.len());
        let modular = rows.iter().find(|row| row.name == "powerflex-755").unwrap();
        assert_eq!(modular.slots.as_deref(), Some("1-14"));
        assert!(modular.access.contains("backplane32"));
    }
}
