use std::path::PathBuf;

use despeckle_imgproc::FilterError;
use despeckle_io::IoError;

/// Errors that abort a whole run.
#[derive(thiserror::Error, Debug)]
pub enum DatasetError {
    /// The manifest file could not be read.
    #[error("could not open manifest {path}: {source}")]
    ManifestUnreadable {
        /// Path of the manifest.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The manifest is not a valid document.
    #[error("invalid manifest: {0}")]
    ManifestMalformed(String),

    /// A filter parameter or executor option is invalid.
    #[error("invalid parameter: {0}")]
    InvalidParameter(#[from] FilterError),

    /// The output root could not be created.
    #[error("could not create output directory {path}: {source}")]
    OutputDirectory {
        /// Path of the output root.
        path: PathBuf,
        /// Underlying I/O error.
        source: IoError,
    },

    /// The configuration file could not be loaded.
    #[error("invalid configuration {path}: {reason}")]
    Config {
        /// Path of the configuration file.
        path: PathBuf,
        /// Why loading failed.
        reason: String,
    },
}

/// Errors local to one manifest entry. The run continues after them.
#[derive(thiserror::Error, Debug)]
pub enum EntryError {
    /// The record has no usable file name.
    #[error("record has no `file_name`")]
    MissingFileName,

    /// The file name escapes the dataset directory.
    #[error("file name must be a relative path inside the dataset: {0}")]
    InvalidPath(String),

    /// An earlier entry of the run already wrote to the same output path.
    #[error("output {0} was already written by an earlier entry")]
    DuplicateOutput(PathBuf),

    /// The image could not be read or decoded.
    #[error("could not read image {path}: {source}")]
    Decode {
        /// Path of the source image.
        path: PathBuf,
        /// Underlying I/O error.
        source: IoError,
    },

    /// The filter pipeline failed, for example when out of memory.
    #[error("could not filter image: {0}")]
    Filter(#[from] FilterError),

    /// The output directory for this entry could not be created.
    #[error("could not create directory {path}: {source}")]
    Directory {
        /// Path of the directory.
        path: PathBuf,
        /// Underlying I/O error.
        source: IoError,
    },

    /// The filtered image could not be written.
    #[error("could not write image {path}: {source}")]
    Encode {
        /// Path of the output image.
        path: PathBuf,
        /// Underlying I/O error.
        source: IoError,
    },
}
