use crate::error::{AppError, Result};
use crate::services::classifier::embedding::EmbeddingOracle;
use crate::services::classifier::model_manager::{load_session, SessionOptions};
use image::imageops::FilterType;
use image::DynamicImage;
use ndarray::Array4;
use ort::session::Session;
use ort::value::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResizeMode {
    /// Resize the short edge to `size / crop_pct`, then center-crop `size`.
    CenterCrop { crop_pct: f32 },
    /// Resize straight to `size` x `size`, ignoring aspect ratio.
    Stretch,
}

/// How an image becomes an NCHW input tensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preprocessing {
    pub size: u32,
    pub resize: ResizeMode,
    pub filter: FilterType,
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

/// CLIP image encoders: 224px bicubic, center crop, CLIP normalization.
pub const CLIP_PREPROCESSING: Preprocessing = Preprocessing {
    size: 224,
    resize: ResizeMode::CenterCrop { crop_pct: 1.0 },
    filter: FilterType::CatmullRom,
    mean: [0.481_454_66, 0.457_827_5, 0.408_210_73],
    std: [0.268_629_54, 0.261_302_58, 0.275_777_11],
};

/// U²-Net style saliency models: 320px stretched, ImageNet normalization.
pub const SALIENCY_PREPROCESSING: Preprocessing = Preprocessing {
    size: 320,
    resize: ResizeMode::Stretch,
    filter: FilterType::Lanczos3,
    mean: [0.485, 0.456, 0.406],
    std: [0.229, 0.224, 0.225],
};

pub fn preprocess_image(img: &DynamicImage, prep: &Preprocessing) -> Result<Array4<f32>> {
    let size = prep.size;
    if img.width() == 0 || img.height() == 0 {
        return Err(AppError::inference("Image has no pixels"));
    }

    let rgb = match prep.resize {
        ResizeMode::Stretch => img.resize_exact(size, size, prep.filter).to_rgb8(),
        ResizeMode::CenterCrop { crop_pct } => {
            let resize_size = (size as f32 / crop_pct).ceil() as u32;
            let (w, h) = (img.width(), img.height());
            let (new_w, new_h) = if w < h {
                (resize_size, ((h as f32 / w as f32) * resize_size as f32).round() as u32)
            } else {
                (((w as f32 / h as f32) * resize_size as f32).round() as u32, resize_size)
            };
            let resized = img.resize_exact(new_w.max(size), new_h.max(size), prep.filter);

            let crop_x = (resized.width().saturating_sub(size)) / 2;
            let crop_y = (resized.height().saturating_sub(size)) / 2;
            resized.crop_imm(crop_x, crop_y, size, size).to_rgb8()
        }
    };

    // Pass 1: normalize pixels sequentially (reads and writes are contiguous).
    let raw = rgb.into_raw();
    let hw = (size * size) as usize;
    let mut interleaved = vec![0f32; 3 * hw];
    for (i, pixel) in raw.chunks_exact(3).enumerate() {
        let off = i * 3;
        for c in 0..3 {
            interleaved[off + c] = (pixel[c] as f32 / 255.0 - prep.mean[c]) / prep.std[c];
        }
    }

    // Pass 2: transpose HWC -> CHW in tiles that stay cache resident.
    let mut data = vec![0f32; 3 * hw];
    const TILE: usize = 1024;
    for base in (0..hw).step_by(TILE) {
        let end = (base + TILE).min(hw);
        for i in base..end {
            let src = i * 3;
            data[i] = interleaved[src];
            data[hw + i] = interleaved[src + 1];
            data[2 * hw + i] = interleaved[src + 2];
        }
    }

    Array4::from_shape_vec((1, 3, size as usize, size as usize), data)
        .map_err(|e| AppError::inference(format!("Failed to create tensor: {}", e)))
}

fn input_name(first_input: Option<&str>) -> Result<String> {
    first_input
        .map(str::to_string)
        .ok_or_else(|| AppError::inference("Model declares no inputs"))
}

/// Runs a single-input model and copies out its first output tensor.
pub fn run_first_output(session: &mut Session, input: Array4<f32>) -> Result<Vec<f32>> {
    let input_name = input_name(session.inputs().first().map(|input| input.name()))?;

    let input_tensor = Value::from_array(input)
        .map_err(|e| AppError::inference(format!("Failed to create tensor value: {}", e)))?;

    let outputs = session
        .run(ort::inputs![input_name.as_str() => input_tensor])
        .map_err(|e| AppError::inference(format!("Inference failed: {}", e)))?;

    let output_value = outputs
        .values()
        .next()
        .ok_or_else(|| AppError::inference("Model produced no outputs"))?;

    let (_, data) = output_value
        .try_extract_tensor::<f32>()
        .map_err(|e| AppError::inference(format!("Failed to extract output tensor: {}", e)))?;

    Ok(data.to_vec())
}

/// Image embeddings from an ONNX encoder, text embeddings from a precomputed table.
pub struct OnnxEmbeddingOracle {
    session: Mutex<Session>,
    preprocessing: Preprocessing,
    text_embeddings: HashMap<String, Vec<f32>>,
}

impl OnnxEmbeddingOracle {
    pub fn load(
        model_path: &Path,
        text_embeddings_path: &Path,
        options: SessionOptions,
    ) -> Result<Self> {
        let content = std::fs::read_to_string(text_embeddings_path).map_err(|e| {
            AppError::resource(
                "text embeddings",
                format!("Failed to read {}: {}", text_embeddings_path.display(), e),
            )
        })?;
        let text_embeddings: HashMap<String, Vec<f32>> = serde_json::from_str(&content)
            .map_err(|e| AppError::resource("text embeddings", format!("Failed to parse: {}", e)))?;

        let session = load_session(model_path, options)?;
        log::info!("Loaded {} precomputed label embeddings", text_embeddings.len());

        Ok(Self {
            session: Mutex::new(session),
            preprocessing: CLIP_PREPROCESSING,
            text_embeddings,
        })
    }
}

impl EmbeddingOracle for OnnxEmbeddingOracle {
    fn encode_image(&self, image: &DynamicImage) -> Result<Vec<f32>> {
        // Preprocess outside the lock; only the session run is serialized.
        let tensor = preprocess_image(image, &self.preprocessing)?;
        let mut session = self
            .session
            .lock()
            .map_err(|_| AppError::inference("Embedding model lock poisoned"))?;
        run_first_output(&mut session, tensor)
    }

    fn encode_text(&self, label: &str) -> Result<Vec<f32>> {
        self.text_embeddings
            .get(label)
            .cloned()
            .ok_or_else(|| AppError::inference(format!("No text embedding for label '{}'", label)))
    }
}
