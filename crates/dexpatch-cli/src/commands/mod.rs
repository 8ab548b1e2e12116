//! CLI command implementations.

pub mod lookup;
pub mod patch;
pub mod resolve;
pub mod show;

use std::path::Path;

use anyhow::{Context, Result};
use dexpatch::{ClassPool, ResourceTable};

/// Load a class pool, naming the file on failure
pub fn load_pool(path: &Path) -> Result<ClassPool> {
    dexpatch::load_pool(path)
        .with_context(|| format!("Failed to load class pool from {}", path.display()))
}

/// Load a resource table; `.xml` files are read as Android `public.xml`
pub fn load_resources(path: &Path) -> Result<ResourceTable> {
    let is_xml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"));
    let table = if is_xml {
        dexpatch::load_public_xml(path)
    } else {
        dexpatch::load_resource_table(path)
    };
    table.with_context(|| format!("Failed to load resources from {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_resources_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let xml = dir.path().join("public.xml");
        fs::write(
            &xml,
            r#"<resources><public type="bool" name="is_tablet" id="0x7f050004" /></resources>"#,
        )
        .unwrap();
        assert_eq!(load_resources(&xml).unwrap().entries.len(), 1);

        let json = dir.path().join("resources.json");
        fs::write(
            &json,
            r#"{"entries":[{"type":"id","name":"text1","id":2131427329}]}"#,
        )
        .unwrap();
        assert_eq!(load_resources(&json).unwrap().entries[0].name, "text1");

        let missing = load_resources(&dir.path().join("nope.json")).unwrap_err();
        assert!(missing.to_string().contains("nope.json"));
    }
}
