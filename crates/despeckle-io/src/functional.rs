use std::{fs::File, io::BufReader, path::Path};

use despeckle_image::{GrayImage, ImageSize};

use crate::error::IoError;

/// Reads an image from the given file path as a single channel 8-bit image.
///
/// The method tries to read from any image format supported by the image crate
/// and converts color images to luma.
///
/// # Arguments
///
/// * `file_path` - The path to a valid image file.
///
/// # Returns
///
/// A grayscale image containing the image data.
///
/// # Errors
///
/// [`IoError::FileDoesNotExist`] if there is no file at the path, and
/// [`IoError::ImageDecodeError`] if the content cannot be decoded.
pub fn read_image_any_gray8(file_path: impl AsRef<Path>) -> Result<GrayImage, IoError> {
    // resolve the file path correctly
    let file_path = file_path.as_ref().to_owned();

    // verify the file exists
    if !file_path.is_file() {
        return Err(IoError::FileDoesNotExist(file_path));
    }

    let file = File::open(&file_path)?;
    let img = image::ImageReader::new(BufReader::new(file))
        .with_guessed_format()?
        .decode()?;

    let size = ImageSize {
        width: img.width() as usize,
        height: img.height() as usize,
    };

    log::trace!("decoded {} as {} {:?}", file_path.display(), size, img.color());

    Ok(GrayImage::new(size, img.into_luma8().into_raw())?)
}
