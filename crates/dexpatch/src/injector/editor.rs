use std::sync::atomic::{AtomicUsize, Ordering};

use crate::bytecode::Method;
use crate::error::{Error, Result};
use crate::smali::ExternalLabel;

static NEXT_EDITOR: AtomicUsize = AtomicUsize::new(0);

/// A tracked position inside the [`MethodEditor`] that made it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mark {
    editor: usize,
    slot: usize,
}

/// Edits a method while keeping marked positions up to date
///
/// A mark follows the instruction it was placed on: inserting at or before
/// it moves it up, removing something before it moves it down.
///
/// ```ignore
/// let mut editor = MethodEditor::new(method);
/// let hook = editor.mark(video_id_index)?;
/// editor.insert_after(hook, "invoke-static {v3}, Lapp/Hooks;->first(Ljava/lang/String;)V")?;
/// editor.insert(0, "nop")?;
/// // still right after the marked instruction
/// editor.insert_after(hook, "invoke-static {v3}, Lapp/Hooks;->second(Ljava/lang/String;)V")?;
/// ```
#[derive(Debug)]
pub struct MethodEditor<'m> {
    id: usize,
    method: &'m mut Method,
    marks: Vec<usize>,
}

impl<'m> MethodEditor<'m> {
    pub fn new(method: &'m mut Method) -> Self {
        Self {
            id: NEXT_EDITOR.fetch_add(1, Ordering::Relaxed),
            method,
            marks: Vec::new(),
        }
    }

    pub fn method(&self) -> &Method {
        self.method
    }

    /// Track `index`; one past the last instruction is allowed
    pub fn mark(&mut self, index: usize) -> Result<Mark> {
        let len = self.method.instruction_count();
        if index > len {
            return Err(Error::IndexOutOfBounds {
                method: self.method.descriptor(),
                index,
                len,
            });
        }
        self.marks.push(index);
        Ok(Mark {
            editor: self.id,
            slot: self.marks.len() - 1,
        })
    }

    /// Current index of a mark; marks from other editors are an error
    pub fn position(&self, mark: Mark) -> Result<usize> {
        match self.marks.get(mark.slot) {
            Some(position) if mark.editor == self.id => Ok(*position),
            _ => Err(Error::ForeignMark(mark.slot)),
        }
    }

    /// First register of the marked instruction
    pub fn register_at(&self, mark: Mark) -> Result<u16> {
        self.method.register_at(self.position(mark)?)
    }

    pub fn insert(&mut self, index: usize, smali: &str) -> Result<usize> {
        self.insert_with_labels(index, smali, &[])
    }

    /// Insert in front of the marked instruction
    pub fn insert_at(&mut self, mark: Mark, smali: &str) -> Result<usize> {
        self.insert(self.position(mark)?, smali)
    }

    /// Insert right behind the marked instruction
    pub fn insert_after(&mut self, mark: Mark, smali: &str) -> Result<usize> {
        self.insert(self.position(mark)? + 1, smali)
    }

    /// Insert and return how many instructions were added
    pub fn insert_with_labels(
        &mut self,
        index: usize,
        smali: &str,
        labels: &[ExternalLabel],
    ) -> Result<usize> {
        let before = self.method.instruction_count();
        self.method.add_instructions_with_labels(index, smali, labels)?;
        let added = self.method.instruction_count() - before;

        for position in &mut self.marks {
            if *position >= index {
                *position += added;
            }
        }
        Ok(added)
    }

    pub fn remove(&mut self, index: usize) -> Result<()> {
        self.method.remove_instruction(index)?;
        for position in &mut self.marks {
            if *position > index {
                *position -= 1;
            }
        }
        Ok(())
    }
}
