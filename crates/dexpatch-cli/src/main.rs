mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "dexpatch=debug" } else { "dexpatch=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse()?))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Resolve {
            pool,
            fingerprints,
            json,
        } => commands::resolve::run(&pool, &fingerprints, json),
        Command::Lookup {
            resources,
            resource_type,
            name,
        } => commands::lookup::run(&resources, &resource_type, &name),
        Command::Show { pool, method } => commands::show::run(&pool, &method),
        Command::Patch {
            pool,
            resources,
            config,
            output,
            patches,
        } => commands::patch::run(&pool, &resources, &config, &output, &patches),
    }
}
