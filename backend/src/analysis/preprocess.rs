use image::RgbImage;
use image::imageops::{self, FilterType};
use ndarray::Array4;

/// Side length of the square input the classifier was trained on.
pub const MODEL_INPUT_SIZE: u32 = 224;

/// Maps a decoded grid to the classifier input: resize to 224x224,
/// scale intensities into `[0.0, 1.0]`, add a leading batch axis.
///
/// Deterministic for a given grid; triangle filtering keeps the resample
/// stable across runs.
pub fn prepare(img: &RgbImage) -> Array4<f32> {
    let resized = imageops::resize(img, MODEL_INPUT_SIZE, MODEL_INPUT_SIZE, FilterType::Triangle);
    let size = MODEL_INPUT_SIZE as usize;
    let mut tensor = Array4::<f32>::zeros((1, size, size, 3));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for (channel, &value) in pixel.0.iter().enumerate() {
            tensor[[0, y as usize, x as usize, channel]] = value as f32 / 255.0;
        }
    }
    tensor
}
