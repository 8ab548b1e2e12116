use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::debug;

use super::ResourceType;
use super::table::ResourceTable;
use crate::error::{Error, Result};

/// Id reported for a `(type, name)` pair that is not in the table
pub const NOT_FOUND: i64 = -1;

#[derive(Debug, Clone, Default)]
pub struct ResourceMapping {
    ids: HashMap<ResourceType, HashMap<String, i64>>,
    len: usize,
}

impl ResourceMapping {
    /// Index every entry of the table; the first entry for a pair wins
    pub fn build(table: &ResourceTable) -> Self {
        let mut mapping = Self::default();
        let mut duplicates = 0;

        for entry in &table.entries {
            let names = mapping.ids.entry(entry.resource_type).or_default();
            if names.contains_key(&entry.name) {
                duplicates += 1;
                continue;
            }
            names.insert(entry.name.clone(), entry.id);
            mapping.len += 1;
        }

        debug!(
            "Built resource mapping with {} entries ({} duplicates ignored)",
            mapping.len, duplicates
        );
        mapping
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, resource_type: ResourceType, name: &str) -> Option<i64> {
        self.ids.get(&resource_type)?.get(name).copied()
    }

    /// Id for the pair, or [`NOT_FOUND`]
    pub fn lookup(&self, resource_type: ResourceType, name: &str) -> i64 {
        self.get(resource_type, name).unwrap_or(NOT_FOUND)
    }

    pub fn require(&self, resource_type: ResourceType, name: &str) -> Result<i64> {
        self.get(resource_type, name)
            .ok_or_else(|| Error::ResourceNotFound {
                resource_type: resource_type.to_string(),
                name: name.to_string(),
            })
    }
}

/// A resource id resolved once and shared between patches
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharedResource {
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub name: String,
    /// [`NOT_FOUND`] when the table has no such entry
    pub id: i64,
}

impl SharedResource {
    pub fn is_found(&self) -> bool {
        self.id != NOT_FOUND
    }
}

/// Shared resource ids, by key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResourceIds {
    ids: BTreeMap<String, SharedResource>,
}

impl ResourceIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look the pair up in `mapping` and store the outcome under `key`
    pub fn resolve(
        &mut self,
        mapping: &ResourceMapping,
        key: impl Into<String>,
        resource_type: ResourceType,
        name: &str,
    ) -> &SharedResource {
        let id = mapping.lookup(resource_type, name);
        if id == NOT_FOUND {
            debug!("Shared resource {}/{} not found", resource_type, name);
        }
        let key = key.into();
        self.ids.insert(
            key.clone(),
            SharedResource {
                resource_type,
                name: name.to_string(),
                id,
            },
        );
        &self.ids[&key]
    }

    pub fn get(&self, key: &str) -> Option<&SharedResource> {
        self.ids.get(key)
    }

    /// Id stored under `key`, [`NOT_FOUND`] included
    pub fn id(&self, key: &str) -> Option<i64> {
        self.ids.get(key).map(|r| r.id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SharedResource)> {
        self.ids.iter().map(|(key, resource)| (key.as_str(), resource))
    }

    /// Entries whose lookup missed
    pub fn missing(&self) -> impl Iterator<Item = (&str, &SharedResource)> {
        self.iter().filter(|(_, resource)| !resource.is_found())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
