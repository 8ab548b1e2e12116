//! Fingerprints: partial structural descriptions of a method.
//!
//! A fingerprint never names the method it is looking for. It describes the
//! shape instead (return type, access flags, parameters, loaded strings and
//! literals, a run of opcodes) and is resolved against a [`ClassPool`] by
//! scanning candidates in pool order. The first candidate passing every check
//! wins.
//!
//! ## Example
//!
//! ```ignore
//! use dexpatch::bytecode::Opcode;
//! use dexpatch::fingerprint::Fingerprint;
//!
//! let fingerprint = Fingerprint::builder("VideoLength")
//!     .return_type("V")
//!     .opcodes([
//!         Some(Opcode::MoveResultWide),
//!         None,
//!         Some(Opcode::InvokeStatic),
//!     ])
//!     .build();
//!
//! let resolution = fingerprint.try_resolve(&pool, None)?;
//! let window = resolution.pattern()?;
//! ```

mod definition;
mod resolution;
mod scan;

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::bytecode::{AccessFlags, ClassDef, ClassId, ClassPool, Method, MethodId, Opcode};
use crate::error::{Error, Result};

pub use definition::{
    FingerprintDef, FingerprintSet, format_opcode_pattern, load_fingerprints,
    parse_opcode_pattern, save_fingerprints,
};
pub use resolution::{Resolution, ResolutionStore};
pub use scan::{PatternScanResult, ScanResult, StringMatch, scan_opcodes, scan_strings};

/// Extra predicate evaluated against a candidate and its class
pub type CustomFilter = Arc<dyn Fn(&Method, &ClassDef) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct Fingerprint {
    name: String,
    return_type: Option<String>,
    /// `(mask, value)`: the candidate's flags masked by `mask` must equal `value`
    access_flags: Option<(AccessFlags, AccessFlags)>,
    parameters: Option<Vec<String>>,
    opcodes: Option<Vec<Option<Opcode>>>,
    strings: Vec<String>,
    literal: Option<i64>,
    custom: Option<CustomFilter>,
    parent: Option<String>,
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fingerprint")
            .field("name", &self.name)
            .field("return_type", &self.return_type)
            .field("access_flags", &self.access_flags)
            .field("parameters", &self.parameters)
            .field("opcodes", &self.opcodes)
            .field("strings", &self.strings)
            .field("literal", &self.literal)
            .field("custom", &self.custom.is_some())
            .field("parent", &self.parent)
            .finish()
    }
}

impl Fingerprint {
    pub fn builder(name: impl Into<String>) -> FingerprintBuilder {
        FingerprintBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fingerprint whose resolved class scopes this one
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn opcodes(&self) -> Option<&[Option<Opcode>]> {
        self.opcodes.as_deref()
    }

    pub fn has_pattern(&self) -> bool {
        self.opcodes.is_some()
    }

    /// Check one candidate, returning what the scans found on success
    ///
    /// Checks run cheapest first and stop at the first failure.
    pub fn matches(&self, method: &Method, class: &ClassDef) -> Option<ScanResult> {
        if let Some((mask, value)) = self.access_flags
            && method.access_flags & mask != value
        {
            return None;
        }

        if let Some(return_type) = &self.return_type
            && !method.return_type.starts_with(return_type.as_str())
        {
            return None;
        }

        if let Some(parameters) = &self.parameters {
            if parameters.len() != method.parameters.len() {
                return None;
            }
            let same = parameters
                .iter()
                .zip(&method.parameters)
                .all(|(expected, actual)| actual.starts_with(expected.as_str()));
            if !same {
                return None;
            }
        }

        if let Some(custom) = &self.custom
            && !custom(method, class)
        {
            return None;
        }

        if let Some(literal) = self.literal
            && !method.instructions.iter().any(|i| i.literal == Some(literal))
        {
            return None;
        }

        let strings = scan_strings(&method.instructions, &self.strings)?;

        let pattern = match &self.opcodes {
            Some(opcodes) => Some(scan_opcodes(&method.instructions, opcodes)?),
            None => None,
        };

        Some(ScanResult { pattern, strings })
    }

    /// Resolve against the pool, or against one class when `scope` is given
    pub fn resolve(&self, pool: &ClassPool, scope: Option<ClassId>) -> Option<Resolution> {
        let candidates: Box<dyn Iterator<Item = MethodId> + '_> = match scope {
            Some(class) => Box::new(pool.class_methods(class)),
            None => Box::new(pool.methods()),
        };

        for id in candidates {
            let class = pool.class(id.class);
            let method = pool.method(id);
            if let Some(scan) = self.matches(method, class) {
                debug!(
                    "Fingerprint {} resolved to {} {:?}",
                    self.name,
                    method.descriptor(),
                    scan.pattern
                );
                return Some(Resolution {
                    fingerprint: self.name.clone(),
                    class: id.class,
                    method: id,
                    scan,
                });
            }
        }

        debug!("Fingerprint {} did not match", self.name);
        None
    }

    pub fn try_resolve(&self, pool: &ClassPool, scope: Option<ClassId>) -> Result<Resolution> {
        self.resolve(pool, scope)
            .ok_or_else(|| Error::ResolutionFailed {
                fingerprint: self.name.clone(),
            })
    }
}

/// Builder for Fingerprint
#[derive(Clone)]
pub struct FingerprintBuilder {
    fingerprint: Fingerprint,
}

impl FingerprintBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            fingerprint: Fingerprint {
                name: name.into(),
                return_type: None,
                access_flags: None,
                parameters: None,
                opcodes: None,
                strings: Vec::new(),
                literal: None,
                custom: None,
                parent: None,
            },
        }
    }

    /// Return type prefix, e.g. `"V"` or `"L"` for any object
    pub fn return_type(mut self, return_type: impl Into<String>) -> Self {
        self.fingerprint.return_type = Some(return_type.into());
        self
    }

    /// Require exactly these access flags
    pub fn access_flags(mut self, flags: AccessFlags) -> Self {
        self.fingerprint.access_flags = Some((AccessFlags::all(), flags));
        self
    }

    /// Require `flags & mask == value`
    pub fn access_flags_masked(mut self, mask: AccessFlags, value: AccessFlags) -> Self {
        self.fingerprint.access_flags = Some((mask, value & mask));
        self
    }

    /// Parameter type prefixes, matched by position; the count must be equal
    pub fn parameters<I, S>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fingerprint.parameters = Some(parameters.into_iter().map(Into::into).collect());
        self
    }

    /// Opcode run to locate; `None` is the wildcard
    pub fn opcodes(mut self, opcodes: impl Into<Vec<Option<Opcode>>>) -> Self {
        self.fingerprint.opcodes = Some(opcodes.into());
        self
    }

    pub fn strings<I, S>(mut self, strings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fingerprint.strings = strings.into_iter().map(Into::into).collect();
        self
    }

    /// Require the method to load this literal
    pub fn literal(mut self, literal: i64) -> Self {
        self.fingerprint.literal = Some(literal);
        self
    }

    pub fn custom<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Method, &ClassDef) -> bool + Send + Sync + 'static,
    {
        self.fingerprint.custom = Some(Arc::new(filter));
        self
    }

    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.fingerprint.parent = Some(parent.into());
        self
    }

    pub fn build(self) -> Fingerprint {
        self.fingerprint
    }
}
