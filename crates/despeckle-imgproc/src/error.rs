use despeckle_image::ImageError;
use thiserror::Error;

/// Errors that can occur while building or applying a filter.
#[derive(Error, Debug, PartialEq)]
pub enum FilterError {
    /// The kernel size must be odd and strictly positive.
    #[error("kernel size must be an odd positive integer, got {0}")]
    InvalidKernelSize(usize),

    /// The gaussian sigma must be finite and strictly positive.
    #[error("sigma must be a finite value > 0, got {0}")]
    InvalidSigma(f64),

    /// The requested thread count is invalid.
    #[error("thread count must be > 0, got {0}")]
    InvalidThreadCount(usize),

    /// The gpu tile size is invalid.
    #[error("tile size must be between 1 and 32, got {0}")]
    InvalidTileSize(u32),

    /// The scratch output buffer could not be allocated.
    #[error("failed to allocate the output buffer: {0}")]
    AllocationFailed(ImageError),

    /// The thread pool failed to build.
    #[error("failed to build thread pool: {0}")]
    ThreadPool(String),

    /// The gpu strategy was requested but is not available in this build.
    #[error("gpu execution is not available: {0}")]
    GpuUnavailable(String),

    /// Moving the buffers to or from the accelerator failed.
    #[error("device transfer failed: {0}")]
    DeviceTransfer(String),

    /// Error from the image crate.
    #[error(transparent)]
    Image(ImageError),
}

impl From<ImageError> for FilterError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::AllocationFailed(_) => FilterError::AllocationFailed(err),
            other => FilterError::Image(other),
        }
    }
}

impl FilterError {
    /// Whether the error only concerns the image being processed.
    ///
    /// Resource errors abort the current image but leave the executor usable.
    pub fn is_resource_exhausted(&self) -> bool {
        matches!(
            self,
            FilterError::AllocationFailed(_) | FilterError::DeviceTransfer(_)
        )
    }
}
