use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Locate methods in a class pool by fingerprint and patch them
#[derive(Debug, Parser)]
#[command(name = "dexpatch", version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve a fingerprint set against a class pool
    Resolve {
        /// Class pool JSON file
        #[arg(short, long, value_name = "FILE")]
        pool: PathBuf,

        /// Fingerprint definitions JSON file
        #[arg(short, long, value_name = "FILE")]
        fingerprints: PathBuf,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Look up a resource id by type and name
    Lookup {
        /// Resource table: JSON, or an Android public.xml
        #[arg(short, long, value_name = "FILE")]
        resources: PathBuf,

        /// Resource type, e.g. layout or string
        #[arg(short = 't', long = "type")]
        resource_type: String,

        /// Resource name
        #[arg(short, long)]
        name: String,
    },

    /// Print a method as smali
    Show {
        /// Class pool JSON file
        #[arg(short, long, value_name = "FILE")]
        pool: PathBuf,

        /// Method descriptor, e.g. "Lapp/Player;->seek(J)Z"
        #[arg(short, long)]
        method: String,
    },

    /// Run the built-in patches and save the patched pool
    Patch {
        /// Class pool JSON file
        #[arg(short, long, value_name = "FILE")]
        pool: PathBuf,

        /// Resource table: JSON, or an Android public.xml
        #[arg(short, long, value_name = "FILE")]
        resources: PathBuf,

        /// Patch configuration TOML file
        #[arg(short, long, value_name = "FILE", default_value = "dexpatch.toml")]
        config: PathBuf,

        /// Where to write the patched pool
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Only run these patches (and what they depend on)
        #[arg(long = "patch", value_name = "NAME")]
        patches: Vec<String>,
    },
}
