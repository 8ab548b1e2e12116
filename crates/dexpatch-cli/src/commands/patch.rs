//! Patch command implementation.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use dexpatch::{PatchConfig, PatchContext, ResourceMapping, patches, save_pool};
use owo_colors::OwoColorize;
use tracing::{info, warn};

use super::{load_pool, load_resources};

/// Run the patch command
pub fn run(
    pool: &Path,
    resources: &Path,
    config: &Path,
    output: &Path,
    selected: &[String],
) -> Result<()> {
    let config = match load_config(config) {
        Ok(c) => {
            info!("Loaded config from {:?}", config);
            c
        }
        Err(e) => {
            warn!("Failed to load config: {:#}, using defaults", e);
            PatchConfig::default()
        }
    };

    let pool = load_pool(pool)?;
    let mapping = ResourceMapping::build(&load_resources(resources)?);
    info!(
        "Loaded {} classes and {} resource ids",
        pool.len(),
        mapping.len()
    );

    let runner = patches::default_runner();
    let mut ctx = PatchContext::new(pool, mapping, config);
    let applied = if selected.is_empty() {
        runner.run(&mut ctx)
    } else {
        runner.run_selected(selected, &mut ctx)
    }
    .context("Patching failed")?;

    for name in &applied {
        println!("{} {}", "applied".green(), name);
    }
    for (key, resource) in ctx.resource_ids.missing() {
        println!(
            "{} {} ({}/{})",
            "missing".yellow(),
            key,
            resource.resource_type,
            resource.name
        );
    }
    for preference in ctx.settings.preferences() {
        println!("{} {}", "preference".cyan(), preference);
    }

    save_pool(output, &ctx.into_pool())
        .with_context(|| format!("Failed to write patched pool to {}", output.display()))?;
    println!("Wrote {}", output.display());
    Ok(())
}

/// Read a TOML patch configuration
pub fn load_config(path: &Path) -> Result<PatchConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(config)
}
