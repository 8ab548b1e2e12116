//! Splice smali into method bodies.
//!
//! Every edit assembles its text against the method being edited, so `pN`
//! registers and labels come out right for that method. Raw indices go stale
//! after an insertion; [`MethodEditor`] tracks positions across edits for
//! callers that make more than one.

mod builder;
mod editor;

use tracing::debug;

use crate::bytecode::{Instruction, Method};
use crate::error::{Error, Result};
use crate::smali::{ExternalLabel, assemble_at};

pub use builder::MethodBuilder;
pub use editor::{Mark, MethodEditor};

impl Method {
    /// Insert smali instructions at `index`
    pub fn add_instructions(&mut self, index: usize, smali: &str) -> Result<()> {
        self.add_instructions_with_labels(index, smali, &[])
    }

    /// Insert exactly one smali instruction at `index`
    pub fn add_instruction(&mut self, index: usize, smali: &str) -> Result<()> {
        let instruction = self.assemble_single(index, smali)?;
        self.insert_instructions(index, vec![instruction])
    }

    /// Insert smali that may branch to instructions already in the method
    ///
    /// Label indices refer to the method as it is before this insertion.
    pub fn add_instructions_with_labels(
        &mut self,
        index: usize,
        smali: &str,
        labels: &[ExternalLabel],
    ) -> Result<()> {
        let len = self.instruction_count();
        if index > len {
            return Err(Error::IndexOutOfBounds {
                method: self.descriptor(),
                index,
                len,
            });
        }
        if let Some(label) = labels.iter().find(|label| label.index >= len) {
            return Err(Error::IndexOutOfBounds {
                method: self.descriptor(),
                index: label.index,
                len,
            });
        }

        let instructions = assemble_at(smali, self, index, labels)?;
        debug!(
            "Inserting {} instruction(s) into {} at {}",
            instructions.len(),
            self.descriptor(),
            index
        );
        self.insert_instructions(index, instructions)
    }

    /// Replace the instruction at `index` with one assembled from smali
    pub fn replace_instruction_smali(&mut self, index: usize, smali: &str) -> Result<()> {
        self.instruction(index)?;
        let instruction = self.assemble_single(index, smali)?;
        self.replace_instruction(index, instruction)
    }

    pub fn remove_instruction(&mut self, index: usize) -> Result<()> {
        self.remove_instructions(index, 1)
    }

    fn assemble_single(&self, index: usize, smali: &str) -> Result<Instruction> {
        let mut instructions = assemble_at(smali, self, index, &[])?;
        if instructions.len() != 1 {
            return Err(Error::smali(
                1,
                format!("expected one instruction, found {}", instructions.len()),
            ));
        }
        Ok(instructions.remove(0))
    }
}
