#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// error types for the filters and executors.
pub mod error;

/// image filtering module.
pub mod filter;

/// gpu execution of the filters.
#[cfg(feature = "gpu")]
pub mod gpu;

/// module containing the execution strategies.
pub mod parallel;

pub use crate::error::FilterError;
