#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Error types for I/O operations.
///
/// Defines [`IoError`] variants for file access and encoding/decoding failures.
pub mod error;

/// Filesystem helpers.
///
/// Idempotent directory creation for the output tree.
pub mod fs;

/// High-level image reading functions.
///
/// See [`functional::read_image_any_gray8`] for automatic format detection.
pub mod functional;

/// PNG image encoding.
pub mod png;

pub use crate::error::IoError;
pub use crate::fs::ensure_dir;
pub use crate::functional::read_image_any_gray8;
pub use crate::png::write_image_png_gray8;
