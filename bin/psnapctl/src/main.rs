//! ---
//! psnap_section: "07-operator-cli"
//! psnap_subsection: "binary"
//! psnap_type: "source"
//! psnap_scope: "code"
//! psnap_description: "Operator CLI for parameter snapshot collection."
//! psnap_version: "v0.0.0-prealpha"
//! psnap_owner: "tbd"
//! ---
use anyhow::Result;
use clap::{Parser, Subcommand};

mod collect;
mod variants;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "paramsnap parameter acquisition utility",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Collect a parameter snapshot from a device.
    Collect(collect::CollectCommand),
    /// List the registered device variants.
    Variants(variants::VariantsCommand),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Collect(cmd) => cmd.execute(),
        Commands::Variants(cmd) => cmd.execute(),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_collect_flags() {
        let cli = Cli::try_parse_from([
            "psnapctl",
            "collect",
            "--image",
            "pf755.toml",
            "--family",
            "powerflex-755",
            "--all",
            "--batch-size",
            "8",
        ])
        .unwrap();
        let Commands::Collect(cmd) = cli.command else {
            panic!("expected collect");
        };
        let options = cmd.options(&Default::default());
        assert!(options.collect_all);
        assert_eq!(options.batch_size_override, Some(8));
        assert_eq!(options.family.as_deref(), Some("powerflex-755"));
    }
}
