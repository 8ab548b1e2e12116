use tracing::warn;

use super::hooks::HookRegistry;
use super::settings::SettingsRegistry;
use crate::bytecode::{ClassId, ClassPool, Method, MethodId};
use crate::config::PatchConfig;
use crate::error::{Error, Result};
use crate::fingerprint::{Fingerprint, Resolution, ResolutionStore};
use crate::resource::{NOT_FOUND, ResourceIds, ResourceMapping, ResourceType};
use crate::walker::MethodWalker;

/// Everything a patch can see and change
///
/// The pool is shared by every patch of a run, so each patch observes the
/// edits of the ones before it.
#[derive(Debug)]
pub struct PatchContext {
    pub pool: ClassPool,
    pub resources: ResourceMapping,
    pub resource_ids: ResourceIds,
    pub resolutions: ResolutionStore,
    pub settings: SettingsRegistry,
    pub hooks: HookRegistry,
    pub config: PatchConfig,
}

impl PatchContext {
    pub fn new(pool: ClassPool, resources: ResourceMapping, config: PatchConfig) -> Self {
        Self {
            pool,
            resources,
            resource_ids: ResourceIds::new(),
            resolutions: ResolutionStore::new(),
            settings: SettingsRegistry::new(),
            hooks: HookRegistry::new(),
            config,
        }
    }

    /// Look up a resource id under the configured miss policy
    ///
    /// With `strict_resources` a miss is `ResourceNotFound`; without it the
    /// miss is logged and [`NOT_FOUND`] is returned.
    pub fn resource_id(&self, resource_type: ResourceType, name: &str) -> Result<i64> {
        if self.config.strict_resources {
            return self.resources.require(resource_type, name);
        }
        match self.resources.get(resource_type, name) {
            Some(id) => Ok(id),
            None => {
                warn!("Resource {}/{} not found, using {}", resource_type, name, NOT_FOUND);
                Ok(NOT_FOUND)
            }
        }
    }

    /// Shared id stored under `key`, under the same miss policy
    ///
    /// Fails with `ResourceNotFound` if nothing was ever stored for `key`.
    pub fn shared_resource_id(&self, key: &str) -> Result<i64> {
        let resource = self.resource_ids.get(key).ok_or_else(|| Error::ResourceNotFound {
            resource_type: "shared".to_string(),
            name: key.to_string(),
        })?;
        if resource.is_found() {
            return Ok(resource.id);
        }
        if self.config.strict_resources {
            return Err(Error::ResourceNotFound {
                resource_type: resource.resource_type.to_string(),
                name: resource.name.clone(),
            });
        }
        warn!(
            "Shared resource {} ({}/{}) not found, using {}",
            key, resource.resource_type, resource.name, NOT_FOUND
        );
        Ok(NOT_FOUND)
    }

    pub fn resolve(&mut self, fingerprint: &Fingerprint) -> Result<Resolution> {
        self.resolutions.resolve(fingerprint, &self.pool)
    }

    pub fn resolve_in(&mut self, fingerprint: &Fingerprint, class: ClassId) -> Result<Resolution> {
        self.resolutions.resolve_in(fingerprint, &self.pool, class)
    }

    /// Stored result of an earlier resolution
    pub fn resolution(&self, name: &str) -> Result<Resolution> {
        self.resolutions.require(name).cloned()
    }

    /// Call `descriptor` at a hook point registered by an earlier patch
    pub fn inject_call(&mut self, hook: &str, descriptor: &str) -> Result<usize> {
        self.hooks.inject(&mut self.pool, hook, descriptor)
    }

    pub fn walker(&self, start: MethodId) -> MethodWalker<'_> {
        MethodWalker::new(&self.pool, start)
    }

    pub fn find_class(&self, descriptor: &str) -> Result<ClassId> {
        self.pool
            .find_class(descriptor)
            .ok_or_else(|| Error::ClassNotFound(descriptor.to_string()))
    }

    pub fn method(&self, id: MethodId) -> &Method {
        self.pool.method(id)
    }

    pub fn method_mut(&mut self, id: MethodId) -> &mut Method {
        self.pool.method_mut(id)
    }

    pub fn into_pool(self) -> ClassPool {
        self.pool
    }
}
