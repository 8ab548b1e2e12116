//! Lookup command implementation.

use std::path::Path;

use anyhow::{Result, bail};
use dexpatch::{NOT_FOUND, ResourceMapping, ResourceType};
use owo_colors::OwoColorize;

use super::load_resources;

/// Run the lookup command
pub fn run(resources: &Path, resource_type: &str, name: &str) -> Result<()> {
    let resource_type = parse_resource_type(resource_type)?;
    let mapping = ResourceMapping::build(&load_resources(resources)?);

    let id = mapping.lookup(resource_type, name);
    if id == NOT_FOUND {
        println!("{} {}/{} ({})", "NOT_FOUND".red(), resource_type, name, NOT_FOUND);
    } else {
        println!("0x{:08x} ({})", id, id);
    }
    Ok(())
}

pub fn parse_resource_type(text: &str) -> Result<ResourceType> {
    match text.to_ascii_lowercase().parse::<ResourceType>() {
        Ok(resource_type) => Ok(resource_type),
        Err(_) => bail!("Unknown resource type '{}'", text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resource_type() {
        assert_eq!(parse_resource_type("Layout").unwrap(), ResourceType::Layout);
        assert_eq!(parse_resource_type("string").unwrap(), ResourceType::String);
        assert!(parse_resource_type("widget").is_err());
    }
}
