#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// run configuration and its defaults.
pub mod config;

/// error types for the dataset runs.
pub mod error;

/// manifest decoding.
pub mod manifest;

/// the dataset processor driving the filters.
pub mod processor;

/// run statistics.
pub mod stats;

pub use crate::config::DenoiseConfig;
pub use crate::error::{DatasetError, EntryError};
pub use crate::manifest::{Manifest, ManifestEntry};
pub use crate::processor::DatasetProcessor;
pub use crate::stats::RunStatistics;
