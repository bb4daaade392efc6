//! Filter operations
//!
//! This module provides the denoising filters: the gaussian kernel builder, the
//! gaussian and local mean passes with their border policy, and the two pass
//! pipeline.

/// Filter kernels
pub mod kernels;

/// Filter operations
mod ops;
pub use ops::*;
