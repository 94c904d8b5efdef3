use crate::error::{AppError, Result};
use crate::services::classifier::inference::{preprocess_image, run_first_output, SALIENCY_PREPROCESSING};
use crate::services::classifier::model_manager::{load_session, SessionOptions};
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, Luma, RgbaImage};
use ort::session::Session;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// A model that separates the subject from the background.
pub trait BackgroundRemover: Send + Sync {
    /// Returns the image with background pixels at low or zero alpha.
    fn remove_background(&self, image: &DynamicImage) -> Result<RgbaImage>;
}

/// Wraps an optional background remover and never fails: without a remover,
/// or when it errors, the image comes back fully opaque.
#[derive(Clone, Default)]
pub struct SubjectIsolator {
    remover: Option<Arc<dyn BackgroundRemover>>,
}

impl SubjectIsolator {
    pub fn new(remover: Arc<dyn BackgroundRemover>) -> Self {
        Self {
            remover: Some(remover),
        }
    }

    pub fn passthrough() -> Self {
        Self { remover: None }
    }

    pub fn isolate(&self, source_id: &str, image: &DynamicImage) -> DynamicImage {
        let Some(remover) = &self.remover else {
            return DynamicImage::ImageRgba8(opaque(image));
        };

        match remover.remove_background(image) {
            Ok(isolated) => DynamicImage::ImageRgba8(isolated),
            Err(e) => {
                log::warn!(
                    "Could not remove background of {}: {}. Using original image.",
                    source_id,
                    e
                );
                DynamicImage::ImageRgba8(opaque(image))
            }
        }
    }
}

/// The image as RGBA with every pixel fully opaque.
fn opaque(image: &DynamicImage) -> RgbaImage {
    let mut rgba = image.to_rgba8();
    for pixel in rgba.pixels_mut() {
        pixel[3] = u8::MAX;
    }
    rgba
}

/// Saliency-mask background removal (U²-Net family) on ONNX Runtime.
pub struct OnnxBackgroundRemover {
    session: Mutex<Session>,
}

impl OnnxBackgroundRemover {
    pub fn load(model_path: &Path, options: SessionOptions) -> Result<Self> {
        Ok(Self {
            session: Mutex::new(load_session(model_path, options)?),
        })
    }
}

impl BackgroundRemover for OnnxBackgroundRemover {
    fn remove_background(&self, image: &DynamicImage) -> Result<RgbaImage> {
        let size = SALIENCY_PREPROCESSING.size;
        let tensor = preprocess_image(image, &SALIENCY_PREPROCESSING)?;

        let prediction = {
            let mut session = self
                .session
                .lock()
                .map_err(|_| AppError::inference("Background model lock poisoned"))?;
            run_first_output(&mut session, tensor)?
        };

        let mask = saliency_to_mask(&prediction, size)?;
        let mask = image::imageops::resize(&mask, image.width(), image.height(), FilterType::Lanczos3);
        Ok(apply_mask(image, &mask))
    }
}

/// Min-max normalizes the first `size * size` predictions into an 8-bit mask.
pub fn saliency_to_mask(prediction: &[f32], size: u32) -> Result<GrayImage> {
    let hw = (size * size) as usize;
    if prediction.len() < hw {
        return Err(AppError::inference(format!(
            "Saliency output has {} values, expected at least {}",
            prediction.len(),
            hw
        )));
    }
    let values = &prediction[..hw];
    let min = values.iter().copied().fold(f32::INFINITY, f32::min);
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let range = max - min;

    let mut mask = GrayImage::new(size, size);
    for (i, pixel) in mask.pixels_mut().enumerate() {
        let normalized = if range > 0.0 {
            (values[i] - min) / range
        } else {
            0.0
        };
        *pixel = Luma([(normalized * 255.0).round().clamp(0.0, 255.0) as u8]);
    }
    Ok(mask)
}

/// Uses `mask` as the alpha channel of `image`; both must share dimensions.
pub fn apply_mask(image: &DynamicImage, mask: &GrayImage) -> RgbaImage {
    let mut rgba = image.to_rgba8();
    for (pixel, alpha) in rgba.pixels_mut().zip(mask.pixels()) {
        pixel[3] = alpha[0];
    }
    rgba
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba};

    struct FailingRemover;

    impl BackgroundRemover for FailingRemover {
        fn remove_background(&self, _image: &DynamicImage) -> Result<RgbaImage> {
            Err(AppError::inference("model exploded"))
        }
    }

    /// Keeps the left half.
    struct LeftHalfRemover;

    impl BackgroundRemover for LeftHalfRemover {
        fn remove_background(&self, image: &DynamicImage) -> Result<RgbaImage> {
            let width = image.width();
            let mask = GrayImage::from_fn(width, image.height(), |x, _| {
                Luma([if x < width / 2 { 255 } else { 0 }])
            });
            Ok(apply_mask(image, &mask))
        }
    }

    fn image() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 4, Rgb([10, 20, 30])))
    }

    #[test]
    fn test_failure_falls_back_to_opaque() {
        let isolator = SubjectIsolator::new(Arc::new(FailingRemover));
        let out = isolator.isolate("a.jpg", &image()).to_rgba8();
        assert_eq!(out.dimensions(), (8, 4));
        assert!(out.pixels().all(|p| *p == Rgba([10, 20, 30, 255])));
    }

    #[test]
    fn test_passthrough_is_opaque_rgba() {
        let out = SubjectIsolator::passthrough().isolate("a.jpg", &image());
        assert!(out.color().has_alpha());
        assert!(out.to_rgba8().pixels().all(|p| p[3] == 255));
    }

    #[test]
    fn test_remover_alpha_is_kept() {
        let isolator = SubjectIsolator::new(Arc::new(LeftHalfRemover));
        let out = isolator.isolate("a.jpg", &image()).to_rgba8();
        assert_eq!(out.get_pixel(0, 0)[3], 255);
        assert_eq!(out.get_pixel(7, 0)[3], 0);
    }

    #[test]
    fn test_saliency_mask_normalization() {
        let prediction = vec![0.2, 0.4, 0.6, 1.0];
        let mask = saliency_to_mask(&prediction, 2).unwrap();
        assert_eq!(mask.get_pixel(0, 0)[0], 0);
        assert_eq!(mask.get_pixel(1, 1)[0], 255);
        assert_eq!(mask.get_pixel(0, 1)[0], 128);

        let flat = saliency_to_mask(&[0.5; 4], 2).unwrap();
        assert!(flat.pixels().all(|p| p[0] == 0));

        assert!(saliency_to_mask(&[0.5; 3], 2).is_err());
    }
}
