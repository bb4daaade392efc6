use crate::error::FilterError;

/// A square 2D convolution kernel with odd side length.
///
/// The weights are stored row-major; `weights[k * size + l]` multiplies the
/// sample at offset `(k - radius, l - radius)` from the output pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel2d {
    size: usize,
    weights: Vec<f64>,
}

impl Kernel2d {
    /// Side length of the kernel.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Half the side length, i.e. the neighborhood radius.
    pub fn radius(&self) -> usize {
        self.size / 2
    }

    /// Row-major kernel weights.
    pub fn as_slice(&self) -> &[f64] {
        &self.weights
    }

    /// Get the weight at the given kernel row and column.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.size || col >= self.size {
            return None;
        }
        self.weights.get(row * self.size + col).copied()
    }
}

/// Check that a kernel size is odd and strictly positive.
pub fn validate_kernel_size(kernel_size: usize) -> Result<(), FilterError> {
    if kernel_size == 0 || kernel_size % 2 == 0 {
        return Err(FilterError::InvalidKernelSize(kernel_size));
    }
    Ok(())
}

/// Create a normalized 2D gaussian kernel.
///
/// # Arguments
///
/// * `kernel_size` - The side length of the kernel. Must be odd.
/// * `sigma` - The standard deviation of the gaussian. Must be > 0.
///
/// # Returns
///
/// A kernel whose weights sum to one.
///
/// # Errors
///
/// [`FilterError::InvalidKernelSize`] for an even or zero size and
/// [`FilterError::InvalidSigma`] for a non-positive or non-finite sigma.
///
/// # Example
///
/// ```
/// use despeckle_imgproc::filter::kernels::gaussian_kernel_2d;
///
/// let kernel = gaussian_kernel_2d(5, 1.5).unwrap();
///
/// assert_eq!(kernel.size(), 5);
/// assert!((kernel.as_slice().iter().sum::<f64>() - 1.0).abs() < 1e-9);
/// ```
pub fn gaussian_kernel_2d(kernel_size: usize, sigma: f64) -> Result<Kernel2d, FilterError> {
    validate_kernel_size(kernel_size)?;

    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(FilterError::InvalidSigma(sigma));
    }

    let center = (kernel_size / 2) as f64;
    let denom = 2.0 * sigma * sigma;

    // compute the kernel
    let mut weights = Vec::with_capacity(kernel_size * kernel_size);
    for i in 0..kernel_size {
        let y = i as f64 - center;
        for j in 0..kernel_size {
            let x = j as f64 - center;
            weights.push((-(x * x + y * y) / denom).exp());
        }
    }

    // normalize the kernel
    let norm = weights.iter().sum::<f64>();
    weights.iter_mut().for_each(|w| *w /= norm);

    Ok(Kernel2d {
        size: kernel_size,
        weights,
    })
}
