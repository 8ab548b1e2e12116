use std::collections::HashMap;

use tracing::{debug, info, warn};

use super::{Patch, PatchContext};
use crate::error::{Error, Result};

/// Runs patches one at a time in dependency order
#[derive(Default)]
pub struct PatchRunner {
    patches: Vec<Box<dyn Patch>>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

impl PatchRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_patch<P: Patch + 'static>(mut self, patch: P) -> Self {
        self.add(Box::new(patch));
        self
    }

    pub fn add(&mut self, patch: Box<dyn Patch>) {
        self.patches.push(patch);
    }

    pub fn names(&self) -> Vec<&str> {
        self.patches.iter().map(|p| p.name()).collect()
    }

    /// Patch names in the order they would run
    ///
    /// Dependencies come before their dependents; otherwise registration
    /// order is kept.
    pub fn order(&self) -> Result<Vec<&str>> {
        let all: Vec<usize> = (0..self.patches.len()).collect();
        let order = self.order_of(&all)?;
        Ok(order.into_iter().map(|i| self.patches[i].name()).collect())
    }

    /// Run every registered patch
    pub fn run(&self, ctx: &mut PatchContext) -> Result<Vec<String>> {
        let all: Vec<usize> = (0..self.patches.len()).collect();
        self.run_indices(&all, ctx)
    }

    /// Run the named patches and whatever they depend on
    pub fn run_selected(&self, names: &[String], ctx: &mut PatchContext) -> Result<Vec<String>> {
        let index = self.index();
        let mut selected = Vec::with_capacity(names.len());
        for name in names {
            let i = index
                .get(name.as_str())
                .copied()
                .ok_or_else(|| Error::PatchNotFound(name.clone()))?;
            selected.push(i);
        }
        self.run_indices(&selected, ctx)
    }

    fn run_indices(&self, roots: &[usize], ctx: &mut PatchContext) -> Result<Vec<String>> {
        let order = self.order_of(roots)?;
        let mut applied = Vec::with_capacity(order.len());

        for i in order {
            let patch = &self.patches[i];
            let name = patch.name().to_string();
            info!("Applying patch {}", name);

            Self::apply(patch.as_ref(), ctx).map_err(|e| Error::PatchFailed {
                patch: name.clone(),
                source: Box::new(e),
            })?;

            info!("Applied patch {}", name);
            applied.push(name);
        }

        Ok(applied)
    }

    fn apply(patch: &dyn Patch, ctx: &mut PatchContext) -> Result<()> {
        for fingerprint in patch.fingerprints(ctx)? {
            // a miss only matters if the patch asks for the result
            if let Err(e) = ctx.resolve(&fingerprint) {
                warn!("{}", e);
            }
        }
        patch.execute(ctx)
    }

    fn index(&self) -> HashMap<&str, usize> {
        let mut index = HashMap::new();
        for (i, patch) in self.patches.iter().enumerate() {
            index.entry(patch.name()).or_insert(i);
        }
        index
    }

    fn order_of(&self, roots: &[usize]) -> Result<Vec<usize>> {
        let index = self.index();
        let mut state: HashMap<usize, Visit> = HashMap::new();
        let mut order = Vec::new();

        for &root in roots {
            self.visit(root, &index, &mut state, &mut order)?;
        }

        debug!(
            "Patch order: {:?}",
            order.iter().map(|&i| self.patches[i].name()).collect::<Vec<_>>()
        );
        Ok(order)
    }

    fn visit(
        &self,
        i: usize,
        index: &HashMap<&str, usize>,
        state: &mut HashMap<usize, Visit>,
        order: &mut Vec<usize>,
    ) -> Result<()> {
        match state.get(&i) {
            Some(Visit::Done) => return Ok(()),
            Some(Visit::InProgress) => {
                return Err(Error::DependencyCycle(self.patches[i].name().to_string()));
            }
            None => {}
        }

        state.insert(i, Visit::InProgress);
        let patch = &self.patches[i];
        for dependency in patch.dependencies() {
            let dep = index.get(dependency).copied().ok_or_else(|| Error::UnknownDependency {
                patch: patch.name().to_string(),
                dependency: dependency.to_string(),
            })?;
            self.visit(dep, index, state, order)?;
        }
        state.insert(i, Visit::Done);
        order.push(i);
        Ok(())
    }
}
