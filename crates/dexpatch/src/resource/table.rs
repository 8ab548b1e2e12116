use std::fs;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::ResourceType;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceEntry {
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub name: String,
    pub id: i64,
}

impl ResourceEntry {
    pub fn new(resource_type: ResourceType, name: impl Into<String>, id: i64) -> Self {
        Self {
            resource_type,
            name: name.into(),
            id,
        }
    }
}

/// Resource entries as parsed by the host, in table order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTable {
    pub entries: Vec<ResourceEntry>,
}

impl ResourceTable {
    pub fn new(entries: Vec<ResourceEntry>) -> Self {
        Self { entries }
    }

    /// Parse the `<public type=".." name=".." id="0x.."/>` entries of a
    /// `public.xml`
    ///
    /// Entries of types this crate does not know are skipped with a warning.
    pub fn from_public_xml(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut entries = Vec::new();
        loop {
            match reader.read_event() {
                Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"public" => {
                    if let Some(entry) = parse_public(&e)? {
                        entries.push(entry);
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(Error::InvalidResourceTable(format!(
                        "XML error at position {}: {}",
                        reader.error_position(),
                        e
                    )));
                }
            }
        }

        Ok(Self { entries })
    }
}

fn parse_public(element: &BytesStart<'_>) -> Result<Option<ResourceEntry>> {
    let mut resource_type = None;
    let mut name = None;
    let mut id = None;

    for attribute in element.attributes() {
        let attribute =
            attribute.map_err(|e| Error::InvalidResourceTable(format!("Bad attribute: {}", e)))?;
        let value = attribute
            .unescape_value()
            .map_err(|e| Error::InvalidResourceTable(format!("Bad attribute value: {}", e)))?
            .into_owned();
        match attribute.key.as_ref() {
            b"type" => resource_type = Some(value),
            b"name" => name = Some(value),
            b"id" => id = Some(value),
            _ => {}
        }
    }

    let (Some(resource_type), Some(name), Some(id)) = (resource_type, name, id) else {
        return Err(Error::InvalidResourceTable(
            "<public> entry needs type, name and id".to_string(),
        ));
    };

    let Ok(resource_type) = resource_type.parse::<ResourceType>() else {
        warn!("Skipping resource {} of unknown type {}", name, resource_type);
        return Ok(None);
    };

    let id = parse_id(&id)
        .ok_or_else(|| Error::InvalidResourceTable(format!("Bad id '{}' for {}", id, name)))?;

    Ok(Some(ResourceEntry {
        resource_type,
        name,
        id,
    }))
}

fn parse_id(text: &str) -> Option<i64> {
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

pub fn load_resource_table<P: AsRef<Path>>(path: P) -> Result<ResourceTable> {
    let content = fs::read_to_string(&path)?;
    let data = serde_json::from_str(&content)?;
    Ok(data)
}

pub fn save_resource_table<P: AsRef<Path>>(path: P, table: &ResourceTable) -> Result<()> {
    let content = serde_json::to_string_pretty(table)?;
    fs::write(path, content)?;
    Ok(())
}

pub fn load_public_xml<P: AsRef<Path>>(path: P) -> Result<ResourceTable> {
    let content = fs::read_to_string(&path)?;
    ResourceTable::from_public_xml(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    const PUBLIC_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<resources>
    <public type="bool" name="is_tablet" id="0x7f050004" />
    <public type="id" name="actions_container" id="0x7f0b0049" />
    <public type="style" name="Theme.YouTubeMusic.Dialog.Solid" id="0x7f14036e" />
    <public type="overlayable" name="ignored" id="0x7f150000" />
</resources>
"#;

    #[test]
    fn test_parse_public_xml() {
        let table = ResourceTable::from_public_xml(PUBLIC_XML).unwrap();
        assert_eq!(table.entries.len(), 3);
        assert_eq!(
            table.entries[0],
            ResourceEntry::new(ResourceType::Bool, "is_tablet", 0x7f050004)
        );
        assert_eq!(table.entries[2].name, "Theme.YouTubeMusic.Dialog.Solid");
    }

    #[test]
    fn test_parse_public_xml_errors() {
        let missing_id = r#"<resources><public type="id" name="x"/></resources>"#;
        assert!(matches!(
            ResourceTable::from_public_xml(missing_id),
            Err(Error::InvalidResourceTable(_))
        ));

        let bad_id = r#"<resources><public type="id" name="x" id="0xZZ"/></resources>"#;
        assert!(ResourceTable::from_public_xml(bad_id).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let temp_file = NamedTempFile::new().unwrap();
        let table = ResourceTable::new(vec![
            ResourceEntry::new(ResourceType::String, "quality_auto", 0x7f1301a2),
            ResourceEntry::new(ResourceType::Layout, "chip_cloud", 0x7f0e0051),
        ]);
        save_resource_table(temp_file.path(), &table).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("\"type\": \"string\""));

        let loaded = load_resource_table(temp_file.path()).unwrap();
        assert_eq!(loaded, table);
    }
}
