//! Smali text in and out: the template assembler used by the injector and
//! the listing renderer used for inspection.

mod assembler;
mod render;
mod template;

pub use assembler::{ExternalLabel, assemble, assemble_at};
pub use render::{render_class, render_method};
pub use template::Template;
