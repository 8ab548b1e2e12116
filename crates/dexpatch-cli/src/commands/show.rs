//! Show command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use dexpatch::MethodRef;
use dexpatch::smali::render_method;

use super::load_pool;

/// Run the show command
pub fn run(pool: &Path, descriptor: &str) -> Result<()> {
    let pool = load_pool(pool)?;
    let reference: MethodRef = descriptor
        .parse()
        .with_context(|| format!("Invalid method descriptor '{}'", descriptor))?;

    let id = pool
        .find_method(&reference)
        .with_context(|| format!("Method {} is not in the pool", reference))?;
    print!("{}", render_method(pool.method(id)));
    Ok(())
}
