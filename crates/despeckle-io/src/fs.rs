use std::path::Path;

use crate::error::IoError;

/// Make sure a directory exists, creating it and its parents if needed.
///
/// Calling it on an existing directory is not an error.
///
/// # Errors
///
/// [`IoError::NotADirectory`] if the path exists but is a file, or
/// [`IoError::FileError`] if the directory cannot be created.
pub fn ensure_dir(dir: impl AsRef<Path>) -> Result<(), IoError> {
    let dir = dir.as_ref();
    if dir.is_dir() {
        return Ok(());
    }
    if dir.exists() {
        return Err(IoError::NotADirectory(dir.to_path_buf()));
    }

    std::fs::create_dir_all(dir)?;
    log::debug!("created directory {}", dir.display());
    Ok(())
}
