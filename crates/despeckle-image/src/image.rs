use crate::error::ImageError;

/// Image size in pixels
///
/// A struct to represent the size of an image in pixels.
///
/// # Examples
///
/// ```
/// use despeckle_image::ImageSize;
///
/// let image_size = ImageSize {
///   width: 10,
///   height: 20,
/// };
///
/// assert_eq!(image_size.width, 10);
/// assert_eq!(image_size.height, 20);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageSize {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
}

impl ImageSize {
    /// Number of pixels covered by the size, saturating at `usize::MAX`.
    pub fn area(&self) -> usize {
        self.width.saturating_mul(self.height)
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "ImageSize {{ width: {}, height: {} }}",
            self.width, self.height
        )
    }
}

impl From<[usize; 2]> for ImageSize {
    fn from(size: [usize; 2]) -> Self {
        ImageSize {
            width: size[0],
            height: size[1],
        }
    }
}

/// Represents an image with pixel data.
///
/// The pixels are stored row-major with interleaved channels, i.e. the sample
/// at `(row, col, ch)` lives at `(row * width + col) * CHANNELS + ch`.
#[derive(Clone, Debug, PartialEq)]
pub struct Image<T, const CHANNELS: usize> {
    size: ImageSize,
    data: Vec<T>,
}

/// A single channel 8-bit image, the buffer type flowing through the filters.
pub type GrayImage = Image<u8, 1>;

impl<T, const CHANNELS: usize> Image<T, CHANNELS> {
    /// Create a new image from pixel data.
    ///
    /// # Arguments
    ///
    /// * `size` - The size of the image in pixels.
    /// * `data` - The pixel data of the image.
    ///
    /// # Returns
    ///
    /// A new image with the given pixel data.
    ///
    /// # Errors
    ///
    /// If the image has a zero dimension or the length of the pixel data does not
    /// match the image size, an error is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use despeckle_image::{Image, ImageSize};
    ///
    /// let image = Image::<u8, 1>::new(
    ///    ImageSize {
    ///       width: 10,
    ///       height: 20,
    ///    },
    ///    vec![0u8; 10 * 20],
    /// ).unwrap();
    ///
    /// assert_eq!(image.size().width, 10);
    /// assert_eq!(image.size().height, 20);
    /// assert_eq!(image.num_channels(), 1);
    /// ```
    pub fn new(size: ImageSize, data: Vec<T>) -> Result<Self, ImageError> {
        if size.width == 0 || size.height == 0 {
            return Err(ImageError::EmptyImage(size.width, size.height));
        }

        // check if the data length matches the image size
        let numel = size.area().saturating_mul(CHANNELS);
        if data.len() != numel {
            return Err(ImageError::InvalidChannelShape(data.len(), numel));
        }

        Ok(Self { size, data })
    }

    /// Create a new image with the given size and default pixel data.
    ///
    /// The pixel buffer is reserved up front so an allocation failure surfaces as
    /// [`ImageError::AllocationFailed`] instead of aborting the process.
    ///
    /// # Arguments
    ///
    /// * `size` - The size of the image in pixels.
    /// * `val` - The default value of the pixel data.
    ///
    /// # Examples
    ///
    /// ```
    /// use despeckle_image::{Image, ImageSize};
    ///
    /// let image = Image::<u8, 1>::from_size_val(
    ///   ImageSize {
    ///     width: 10,
    ///     height: 20,
    ///   }, 0u8).unwrap();
    ///
    /// assert_eq!(image.size().width, 10);
    /// assert_eq!(image.size().height, 20);
    /// ```
    pub fn from_size_val(size: ImageSize, val: T) -> Result<Self, ImageError>
    where
        T: Clone,
    {
        // an overflowing size saturates and fails to reserve
        let numel = size.area().saturating_mul(CHANNELS);

        let mut data = Vec::new();
        data.try_reserve_exact(numel)
            .map_err(|_| ImageError::AllocationFailed(numel))?;
        data.resize(numel, val);

        Image::new(size, data)
    }

    /// Get the size of the image in pixels.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Get the number of columns of the image.
    pub fn cols(&self) -> usize {
        self.width()
    }

    /// Get the number of rows of the image.
    pub fn rows(&self) -> usize {
        self.height()
    }

    /// Get the width of the image in pixels.
    pub fn width(&self) -> usize {
        self.size.width
    }

    /// Get the height of the image in pixels.
    pub fn height(&self) -> usize {
        self.size.height
    }

    /// Get the number of channels in the image.
    pub fn num_channels(&self) -> usize {
        CHANNELS
    }

    /// Get the pixel data as a flat slice.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Get the pixel data as a flat mutable slice.
    pub fn as_slice_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Get a sample of the image.
    ///
    /// # Arguments
    ///
    /// * `index` - The `[row, col, channel]` coordinates of the sample.
    ///
    /// # Returns
    ///
    /// The sample, or `None` if any coordinate is out of bounds.
    ///
    /// # Examples
    ///
    /// ```
    /// use despeckle_image::Image;
    ///
    /// let image = Image::<u8, 1>::new([2, 1].into(), vec![7, 9]).unwrap();
    ///
    /// assert_eq!(image.get([0, 1, 0]), Some(&9));
    /// assert_eq!(image.get([1, 0, 0]), None);
    /// ```
    pub fn get(&self, index: [usize; 3]) -> Option<&T> {
        let [row, col, ch] = index;
        if row >= self.height() || col >= self.width() || ch >= CHANNELS {
            return None;
        }
        self.data.get((row * self.width() + col) * CHANNELS + ch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_size() {
        let image_size = ImageSize {
            width: 10,
            height: 20,
        };
        assert_eq!(image_size.width, 10);
        assert_eq!(image_size.height, 20);
        assert_eq!(image_size.area(), 200);
        assert_eq!(ImageSize::from([usize::MAX, 2]).area(), usize::MAX);
        assert_eq!(
            image_size.to_string(),
            "ImageSize { width: 10, height: 20 }"
        );
    }

    #[test]
    fn image_smoke() -> Result<(), ImageError> {
        let image = Image::<u8, 3>::new([10, 20].into(), vec![0u8; 10 * 20 * 3])?;
        assert_eq!(image.size().width, 10);
        assert_eq!(image.size().height, 20);
        assert_eq!(image.cols(), 10);
        assert_eq!(image.rows(), 20);
        assert_eq!(image.num_channels(), 3);
        Ok(())
    }

    #[test]
    fn image_invalid_shape() {
        let image = Image::<u8, 1>::new([3, 3].into(), vec![0u8; 8]);
        assert_eq!(image, Err(ImageError::InvalidChannelShape(8, 9)));
    }

    #[test]
    fn image_empty() {
        let image = Image::<u8, 1>::new([0, 4].into(), vec![]);
        assert_eq!(image, Err(ImageError::EmptyImage(0, 4)));

        let image = Image::<u8, 1>::from_size_val([4, 0].into(), 0);
        assert_eq!(image, Err(ImageError::EmptyImage(4, 0)));
    }

    #[test]
    fn image_from_size_val() -> Result<(), ImageError> {
        let image = GrayImage::from_size_val([4, 3].into(), 128)?;
        assert_eq!(image.as_slice().len(), 12);
        assert!(image.as_slice().iter().all(|&v| v == 128));
        Ok(())
    }

    #[test]
    fn image_from_size_val_overflow() {
        let image = GrayImage::from_size_val([usize::MAX, 2].into(), 0);
        assert!(matches!(image, Err(ImageError::AllocationFailed(_))));
    }

    #[test]
    fn image_get() -> Result<(), ImageError> {
        #[rustfmt::skip]
        let image = GrayImage::new(
            [3, 2].into(),
            vec![
                0, 1, 2,
                3, 4, 5,
            ],
        )?;
        assert_eq!(image.get([1, 2, 0]), Some(&5));
        assert_eq!(image.get([2, 0, 0]), None);
        assert_eq!(image.get([0, 3, 0]), None);
        assert_eq!(image.get([0, 0, 1]), None);
        Ok(())
    }

    #[test]
    fn image_as_slice_mut() -> Result<(), ImageError> {
        let mut image = GrayImage::from_size_val([2, 2].into(), 0)?;
        image.as_slice_mut()[3] = 42;
        assert_eq!(image.as_slice(), &[0, 0, 0, 42]);
        assert_eq!(image.get([1, 1, 0]), Some(&42));
        Ok(())
    }
}
