//! In-memory instruction model: opcodes, instructions, methods, classes and
//! the class pool that owns them.

mod access;
mod class;
mod instruction;
mod method;
mod opcode;
mod pool;
mod reference;

pub use access::AccessFlags;
pub use class::ClassDef;
pub use instruction::Instruction;
pub use method::Method;
pub use opcode::{Format, Opcode, ReferenceKind};
pub use pool::{ClassId, ClassPool, MethodId, PoolFile, load_pool, save_pool};
pub use reference::{
    FieldRef, MethodRef, Reference, is_prototype, is_type_descriptor, parse_type_list,
    register_width,
};
