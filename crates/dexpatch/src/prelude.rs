//! Prelude module for convenient imports
//!
//! ```ignore
//! use dexpatch::prelude::*;
//! ```
//!
//! This brings the types a patch usually touches into scope.

// Error handling
pub use crate::error::{Error, Result};

// Bytecode model
pub use crate::bytecode::{AccessFlags, ClassId, ClassPool, Method, MethodId, Opcode};

// Matching and navigation
pub use crate::fingerprint::{Fingerprint, Resolution};
pub use crate::walker::{StepFilter, WalkStep};

// Editing
pub use crate::injector::{MethodBuilder, MethodEditor};
pub use crate::smali::{ExternalLabel, Template};

// Patches
pub use crate::patch::{HookPoint, Patch, PatchContext, PatchRunner};
pub use crate::resource::{NOT_FOUND, ResourceType};
