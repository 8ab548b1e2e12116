//! Patch orchestration: the [`Patch`] trait, the context patches run in, the
//! hook points they share, and the runner that orders and applies them.

mod context;
mod hooks;
mod runner;
mod settings;

use crate::error::Result;
use crate::fingerprint::Fingerprint;

pub use context::PatchContext;
pub use hooks::{HookPoint, HookRegistry};
pub use runner::PatchRunner;
pub use settings::SettingsRegistry;

pub trait Patch {
    /// Unique name, also used to declare dependencies
    fn name(&self) -> &str;

    /// Patches that must run before this one
    fn dependencies(&self) -> &[&str] {
        &[]
    }

    /// Fingerprints resolved before [`Patch::execute`], in order
    ///
    /// Parents must come before the fingerprints scoped to them.
    fn fingerprints(&self, _ctx: &PatchContext) -> Result<Vec<Fingerprint>> {
        Ok(Vec::new())
    }

    fn execute(&self, ctx: &mut PatchContext) -> Result<()>;
}
