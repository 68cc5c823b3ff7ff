use image::RgbImage;

/// Hard cap on the encoded upload, shared with the decode and route layers.
pub const MAX_IMAGE_BYTES: usize = 8 * 1024 * 1024;
/// Minimum width and height accepted for analysis.
pub const MIN_DIMENSION: u32 = 100;

// Heuristic thresholds. The green-ratio and skin-tone constants are kept
// for parity with the deployed classifier pipeline; they are uncalibrated
// and tunable, not derived from data.
const MIN_BRIGHTNESS: f64 = 20.0;
const MAX_BRIGHTNESS: f64 = 235.0;
const MIN_GREEN_RATIO: f64 = 0.10;
const MIN_INTENSITY_STDDEV: f64 = 15.0;
const MAX_SKIN_FRACTION: f64 = 0.15;
const MAX_ASPECT_RATIO: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    TooSmall,
    TooLarge,
    TooDark,
    TooBright,
    NoPlantContent,
    LowDetail,
    SkinDetected,
    ExtremeAspectRatio,
    ProcessingError,
}

impl RejectionReason {
    /// Caller-facing guidance for resubmitting a usable photo.
    pub fn message(self) -> &'static str {
        match self {
            RejectionReason::TooSmall => {
                "Image resolution too low. Please upload a higher quality image (minimum 100x100 pixels)."
            }
            RejectionReason::TooLarge => {
                "Image file too large. Please upload an image smaller than 8MB."
            }
            RejectionReason::TooDark => {
                "Image is too dark. Please ensure good lighting when taking the photo."
            }
            RejectionReason::TooBright => {
                "Image is overexposed. Please reduce lighting or adjust camera settings."
            }
            RejectionReason::NoPlantContent => {
                "No significant plant content detected. Please upload a clear image of a plant leaf."
            }
            RejectionReason::LowDetail => {
                "Image appears to lack detail. Please upload a clear, detailed image of a plant leaf."
            }
            RejectionReason::SkinDetected => {
                "Hands or skin detected in image. Please upload an image showing only the plant leaf."
            }
            RejectionReason::ExtremeAspectRatio => {
                "Image aspect ratio is too extreme. Please upload a more square-shaped image of the leaf."
            }
            RejectionReason::ProcessingError => {
                "Error processing image. Please try uploading a different image."
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Rejection {
    pub reason: RejectionReason,
    pub message: &'static str,
}

impl Rejection {
    fn new(reason: RejectionReason) -> Self {
        Self {
            reason,
            message: reason.message(),
        }
    }
}

type Check = fn(&RgbImage, usize) -> Option<Rejection>;

// Evaluated in order; the first failing check names the rejection. Each
// check is a pure function of the grid, so only the reported reason
// depends on the ordering.
const CHECKS: &[(&str, Check)] = &[
    ("resolution", check_resolution),
    ("file_size", check_file_size),
    ("brightness", check_brightness),
    ("plant_content", check_plant_content),
    ("detail", check_detail),
    ("skin_tone", check_skin_tone),
    ("aspect_ratio", check_aspect_ratio),
];

/// Runs the suitability checks against a decoded grid, stopping at the
/// first rejection. The classifier must never see a rejected image.
pub fn validate(img: &RgbImage, raw_byte_len: usize) -> Result<(), Rejection> {
    if img.as_raw().is_empty() {
        return Err(Rejection::new(RejectionReason::ProcessingError));
    }
    for (name, check) in CHECKS {
        if let Some(rejection) = check(img, raw_byte_len) {
            log::info!(
                "Image rejected by {} check: {:?}",
                name,
                rejection.reason
            );
            return Err(rejection);
        }
    }
    log::info!(
        "Image validation passed - Size: {}x{}",
        img.width(),
        img.height()
    );
    Ok(())
}

fn check_resolution(img: &RgbImage, _raw_byte_len: usize) -> Option<Rejection> {
    if img.width() < MIN_DIMENSION || img.height() < MIN_DIMENSION {
        return Some(Rejection::new(RejectionReason::TooSmall));
    }
    None
}

fn check_file_size(_img: &RgbImage, raw_byte_len: usize) -> Option<Rejection> {
    if raw_byte_len > MAX_IMAGE_BYTES {
        return Some(Rejection::new(RejectionReason::TooLarge));
    }
    None
}

fn check_brightness(img: &RgbImage, _raw_byte_len: usize) -> Option<Rejection> {
    let mean = mean_intensity(img);
    if mean < MIN_BRIGHTNESS {
        return Some(Rejection::new(RejectionReason::TooDark));
    }
    if mean > MAX_BRIGHTNESS {
        return Some(Rejection::new(RejectionReason::TooBright));
    }
    None
}

// Coarse plant proxy: any sufficiently green image passes.
fn check_plant_content(img: &RgbImage, _raw_byte_len: usize) -> Option<Rejection> {
    let pixel_count = (img.width() as u64 * img.height() as u64) as f64;
    let green_sum: f64 = img.pixels().map(|p| p.0[1] as f64).sum();
    let green_ratio = green_sum / pixel_count / 255.0;
    if green_ratio < MIN_GREEN_RATIO {
        return Some(Rejection::new(RejectionReason::NoPlantContent));
    }
    None
}

// Near-uniform color swatches carry no leaf texture worth classifying.
fn check_detail(img: &RgbImage, _raw_byte_len: usize) -> Option<Rejection> {
    if intensity_stddev(img) < MIN_INTENSITY_STDDEV {
        return Some(Rejection::new(RejectionReason::LowDetail));
    }
    None
}

fn check_skin_tone(img: &RgbImage, _raw_byte_len: usize) -> Option<Rejection> {
    let pixel_count = (img.width() as u64 * img.height() as u64) as f64;
    let skin_pixels = img
        .pixels()
        .filter(|p| is_skin_tone(p.0[0], p.0[1], p.0[2]))
        .count() as f64;
    if skin_pixels / pixel_count > MAX_SKIN_FRACTION {
        return Some(Rejection::new(RejectionReason::SkinDetected));
    }
    None
}

fn check_aspect_ratio(img: &RgbImage, _raw_byte_len: usize) -> Option<Rejection> {
    let w = img.width() as f64;
    let h = img.height() as f64;
    if w.max(h) / w.min(h) > MAX_ASPECT_RATIO {
        return Some(Rejection::new(RejectionReason::ExtremeAspectRatio));
    }
    None
}

/// Rule-of-thumb skin segmentation predicate over a single pixel.
fn is_skin_tone(r: u8, g: u8, b: u8) -> bool {
    let (r, g, b) = (r as i32, g as i32, b as i32);
    r > g
        && r > b
        && r > 95
        && g > 40
        && b > 20
        && r - g > 15
        && (r - g).abs() > (r - b).abs()
}

fn mean_intensity(img: &RgbImage) -> f64 {
    let raw = img.as_raw();
    let sum: f64 = raw.iter().map(|&v| v as f64).sum();
    sum / raw.len() as f64
}

// Population standard deviation over every channel sample in the grid.
fn intensity_stddev(img: &RgbImage) -> f64 {
    let raw = img.as_raw();
    let n = raw.len() as f64;
    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    for &v in raw {
        let v = v as f64;
        sum += v;
        sum_sq += v * v;
    }
    let mean = sum / n;
    (sum_sq / n - mean * mean).max(0.0).sqrt()
}
