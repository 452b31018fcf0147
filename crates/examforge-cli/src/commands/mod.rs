pub mod criteria;
pub mod import;
pub mod init;
pub mod preview;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};

/// Reads a question file.
pub(crate) fn read_input(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}
