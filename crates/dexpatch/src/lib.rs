//! # dexpatch
//!
//! Fingerprint matching and instruction injection for Dalvik bytecode.
//!
//! This crate provides:
//! - An in-memory class pool with mutable method bodies
//! - Fingerprints that locate methods by shape and return an opcode window
//! - A method walker that follows call references from a resolved method
//! - Smali templates assembled and spliced into existing methods
//! - A resource name to id table for code that needs numeric ids
//! - A patch runner, shared hook points, and the built-in patches

pub mod bytecode;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod injector;
pub mod patch;
pub mod patches;
pub mod prelude;
pub mod resource;
pub mod smali;
pub mod walker;

#[cfg(test)]
pub(crate) mod testing;

pub use bytecode::{
    AccessFlags, ClassDef, ClassId, ClassPool, Instruction, Method, MethodId, MethodRef, Opcode,
    Reference, load_pool, save_pool,
};
pub use config::{PatchConfig, PatchConfigBuilder};
pub use error::{Error, Result};
pub use fingerprint::{
    Fingerprint, FingerprintBuilder, FingerprintDef, FingerprintSet, PatternScanResult,
    Resolution, ResolutionStore, ScanResult, load_fingerprints, save_fingerprints,
};
pub use injector::{Mark, MethodBuilder, MethodEditor};
pub use patch::{HookPoint, HookRegistry, Patch, PatchContext, PatchRunner, SettingsRegistry};
pub use resource::{
    NOT_FOUND, ResourceIds, ResourceMapping, ResourceTable, ResourceType, load_public_xml,
    load_resource_table,
};
pub use smali::{ExternalLabel, Template};
pub use walker::{MethodWalker, StepFilter, WalkStep};
