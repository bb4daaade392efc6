use std::ops::Range;

use despeckle_image::{GrayImage, ImageSize};

use super::kernels::{self, Kernel2d};
use crate::{error::FilterError, parallel::FilterExecutor};

/// The neighborhood filters applied by a filter pass.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterKind {
    /// Weighted convolution with a normalized gaussian kernel.
    Gaussian(Kernel2d),
    /// Unweighted mean over a square window, the Wiener approximation.
    LocalMean {
        /// Side length of the window. Always odd.
        kernel_size: usize,
    },
}

impl FilterKind {
    /// Create a gaussian filter pass.
    ///
    /// # Arguments
    ///
    /// * `kernel_size` - The side length of the kernel. Must be odd.
    /// * `sigma` - The standard deviation of the gaussian. Must be > 0.
    pub fn gaussian(kernel_size: usize, sigma: f64) -> Result<Self, FilterError> {
        Ok(FilterKind::Gaussian(kernels::gaussian_kernel_2d(
            kernel_size,
            sigma,
        )?))
    }

    /// Create a local mean filter pass.
    ///
    /// # Arguments
    ///
    /// * `kernel_size` - The side length of the window. Must be odd.
    pub fn local_mean(kernel_size: usize) -> Result<Self, FilterError> {
        kernels::validate_kernel_size(kernel_size)?;
        Ok(FilterKind::LocalMean { kernel_size })
    }

    /// Side length of the neighborhood.
    pub fn kernel_size(&self) -> usize {
        match self {
            FilterKind::Gaussian(kernel) => kernel.size(),
            FilterKind::LocalMean { kernel_size } => *kernel_size,
        }
    }

    /// Neighborhood radius, the width of the copied border.
    pub fn radius(&self) -> usize {
        self.kernel_size() / 2
    }

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            FilterKind::Gaussian(_) => "gaussian",
            FilterKind::LocalMean { .. } => "local_mean",
        }
    }

    /// Filter the interior columns of one interior row.
    ///
    /// `dst_row` is the full output row `row`; its border columns are left
    /// untouched.
    pub(crate) fn filter_row(&self, src: &[u8], cols: usize, row: usize, dst_row: &mut [u8]) {
        match self {
            FilterKind::Gaussian(kernel) => gaussian_row(kernel, src, cols, row, dst_row),
            FilterKind::LocalMean { kernel_size } => {
                local_mean_row(*kernel_size, src, cols, row, dst_row)
            }
        }
    }
}

/// Quantize a convolution result to an 8-bit sample.
///
/// Clamps to `[0, 255]` and rounds half up.
#[inline]
pub(crate) fn quantize(value: f64) -> u8 {
    (value.clamp(0.0, 255.0) + 0.5).floor() as u8
}

fn gaussian_row(kernel: &Kernel2d, src: &[u8], cols: usize, row: usize, dst_row: &mut [u8]) {
    let size = kernel.size();
    let radius = kernel.radius();

    for col in radius..cols - radius {
        let mut acc = 0.0f64;
        for (k, weights) in kernel.as_slice().chunks_exact(size).enumerate() {
            let start = (row + k - radius) * cols + col - radius;
            acc += src[start..start + size]
                .iter()
                .zip(weights)
                .map(|(&px, &w)| px as f64 * w)
                .sum::<f64>();
        }
        dst_row[col] = quantize(acc);
    }
}

fn local_mean_row(kernel_size: usize, src: &[u8], cols: usize, row: usize, dst_row: &mut [u8]) {
    let radius = kernel_size / 2;
    // the window fits in the image, so its area fits in usize
    let area = (kernel_size * kernel_size) as u64;

    for col in radius..cols - radius {
        let mut sum = 0u64;
        for k in 0..kernel_size {
            let start = (row + k - radius) * cols + col - radius;
            sum += src[start..start + kernel_size]
                .iter()
                .map(|&px| px as u64)
                .sum::<u64>();
        }
        dst_row[col] = (sum / area) as u8;
    }
}

/// The rows that have a full neighborhood of the given radius.
///
/// Returns `None` when the image is too small to have any interior pixel.
pub fn interior_rows(size: ImageSize, radius: usize) -> Option<Range<usize>> {
    if size.width <= 2 * radius || size.height <= 2 * radius {
        return None;
    }
    Some(radius..size.height - radius)
}

/// Copy the border pixels of `src` into `dst`.
///
/// The top and bottom `radius` rows are copied in full, and the left and right
/// `radius` columns of the remaining rows. When the image has no interior, the
/// whole image is copied.
///
/// PRECONDITION: `src` and `dst` must have the same size.
pub fn copy_border(src: &GrayImage, dst: &mut GrayImage, radius: usize) {
    let cols = src.cols();
    let src_data = src.as_slice();
    let dst_data = dst.as_slice_mut();

    let Some(rows) = interior_rows(src.size(), radius) else {
        dst_data.copy_from_slice(src_data);
        return;
    };

    // top and bottom rows
    let top = rows.start * cols;
    let bottom = rows.end * cols;
    dst_data[..top].copy_from_slice(&src_data[..top]);
    dst_data[bottom..].copy_from_slice(&src_data[bottom..]);

    // left and right columns
    for row in rows {
        let start = row * cols;
        let end = start + cols;
        dst_data[start..start + radius].copy_from_slice(&src_data[start..start + radius]);
        dst_data[end - radius..end].copy_from_slice(&src_data[end - radius..end]);
    }
}

/// Allocate the output of a filter pass with its border already in place.
///
/// # Errors
///
/// [`FilterError::AllocationFailed`] if the output buffer cannot be reserved.
pub fn prepare_output(kind: &FilterKind, src: &GrayImage) -> Result<GrayImage, FilterError> {
    let mut dst = GrayImage::from_size_val(src.size(), 0)?;
    copy_border(src, &mut dst, kind.radius());
    Ok(dst)
}

/// Apply a gaussian blur followed by a local mean filter.
///
/// The two passes share the kernel size. The gaussian output, not the original
/// image, feeds the local mean pass.
#[derive(Debug, Clone, PartialEq)]
pub struct DenoisePipeline {
    gaussian: FilterKind,
    local_mean: FilterKind,
}

impl DenoisePipeline {
    /// Create the pipeline, validating the parameters.
    ///
    /// # Arguments
    ///
    /// * `kernel_size` - The side length of both filters. Must be odd.
    /// * `sigma` - The standard deviation of the gaussian. Must be > 0.
    pub fn new(kernel_size: usize, sigma: f64) -> Result<Self, FilterError> {
        Ok(Self {
            gaussian: FilterKind::gaussian(kernel_size, sigma)?,
            local_mean: FilterKind::local_mean(kernel_size)?,
        })
    }

    /// The filter passes in the order they are applied.
    pub fn passes(&self) -> [&FilterKind; 2] {
        [&self.gaussian, &self.local_mean]
    }

    /// Run both passes on the image.
    ///
    /// # Arguments
    ///
    /// * `executor` - The execution strategy for each pass.
    /// * `src` - The decoded image. It is dropped once the first pass completes.
    pub fn run(
        &self,
        executor: &dyn FilterExecutor,
        src: GrayImage,
    ) -> Result<GrayImage, FilterError> {
        let smoothed = executor.apply(&self.gaussian, &src)?;
        drop(src);
        executor.apply(&self.local_mean, &smoothed)
    }
}
