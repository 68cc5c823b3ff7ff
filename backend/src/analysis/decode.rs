use image::RgbImage;

use crate::analysis::validate::MAX_IMAGE_BYTES;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Image file too large. Please upload an image smaller than 8MB.")]
    TooLarge,
    #[error("Invalid image format. Please upload a valid image file.")]
    InvalidFormat(#[source] image::ImageError),
}

/// Decodes raw upload bytes into an RGB pixel grid.
///
/// Grayscale, palette and RGBA inputs are converted to RGB; the alpha
/// channel is dropped, not blended. The 8 MiB cap is re-checked here even
/// though the route layer enforces it while reading the upload.
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage, DecodeError> {
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(DecodeError::TooLarge);
    }
    let img = image::load_from_memory(bytes).map_err(DecodeError::InvalidFormat)?;
    Ok(img.to_rgb8())
}
