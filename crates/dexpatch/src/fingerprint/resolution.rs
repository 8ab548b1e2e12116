use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use super::Fingerprint;
use super::scan::{PatternScanResult, ScanResult};
use crate::bytecode::{ClassId, ClassPool, MethodId};
use crate::error::{Error, Result};

/// Where a fingerprint matched
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub fingerprint: String,
    #[serde(skip)]
    pub class: ClassId,
    #[serde(skip)]
    pub method: MethodId,
    pub scan: ScanResult,
}

impl Resolution {
    /// Opcode window; an error when the fingerprint declared no pattern
    pub fn pattern(&self) -> Result<PatternScanResult> {
        self.scan.pattern.ok_or_else(|| Error::NoPatternScan {
            fingerprint: self.fingerprint.clone(),
        })
    }

    /// Index of the first instruction loading `string`, if it was required
    pub fn string_index(&self, string: &str) -> Option<usize> {
        self.scan
            .strings
            .iter()
            .find(|m| m.string == string)
            .map(|m| m.index)
    }
}

/// Resolution results keyed by fingerprint name
///
/// Owned by whoever runs the patches and passed to them explicitly; a
/// fingerprint itself never remembers where it matched.
#[derive(Debug, Clone, Default)]
pub struct ResolutionStore {
    results: HashMap<String, Resolution>,
}

impl ResolutionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `fingerprint`, scoped to its parent's class when it has one
    ///
    /// A success replaces any earlier result for the same name and a failure
    /// removes it.
    pub fn resolve(&mut self, fingerprint: &Fingerprint, pool: &ClassPool) -> Result<Resolution> {
        let scope = match fingerprint.parent() {
            Some(parent) => {
                let resolution = self.get(parent).ok_or_else(|| Error::ParentNotResolved {
                    fingerprint: fingerprint.name().to_string(),
                    parent: parent.to_string(),
                })?;
                Some(resolution.class)
            }
            None => None,
        };
        self.resolve_scoped(fingerprint, pool, scope)
    }

    /// Resolve `fingerprint` against one class, ignoring any declared parent
    pub fn resolve_in(
        &mut self,
        fingerprint: &Fingerprint,
        pool: &ClassPool,
        class: ClassId,
    ) -> Result<Resolution> {
        self.resolve_scoped(fingerprint, pool, Some(class))
    }

    fn resolve_scoped(
        &mut self,
        fingerprint: &Fingerprint,
        pool: &ClassPool,
        scope: Option<ClassId>,
    ) -> Result<Resolution> {
        match fingerprint.try_resolve(pool, scope) {
            Ok(resolution) => {
                self.results
                    .insert(fingerprint.name().to_string(), resolution.clone());
                Ok(resolution)
            }
            Err(e) => {
                if self.results.remove(fingerprint.name()).is_some() {
                    debug!("Dropped stale result for {}", fingerprint.name());
                }
                Err(e)
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Resolution> {
        self.results.get(name)
    }

    /// Result for `name`; never resolved or failed is an error
    pub fn require(&self, name: &str) -> Result<&Resolution> {
        self.get(name).ok_or_else(|| Error::ResolutionFailed {
            fingerprint: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.results.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn clear(&mut self) {
        self.results.clear();
    }
}
