use crate::error::{AppError, Result};
use image::{DynamicImage, ImageReader};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp", "tiff", "tif"];

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// One input image with a stable identifier.
pub trait ImageSource: Send + Sync {
    fn id(&self) -> &str;
    /// Decodes the image to 8-bit RGB.
    fn load(&self) -> Result<DynamicImage>;
}

pub struct FileImageSource {
    path: PathBuf,
    id: String,
}

impl FileImageSource {
    pub fn new(path: PathBuf) -> Self {
        let id = path.to_string_lossy().to_string();
        Self { path, id }
    }
}

impl ImageSource for FileImageSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn load(&self) -> Result<DynamicImage> {
        let img = ImageReader::open(&self.path)
            .map_err(|e| AppError::image_processing(&self.id, format!("Failed to open image: {}", e)))?
            .with_guessed_format()
            .map_err(|e| AppError::image_processing(&self.id, format!("Failed to read image format: {}", e)))?
            .decode()
            .map_err(|e| AppError::image_processing(&self.id, format!("Failed to decode image: {}", e)))?;
        Ok(DynamicImage::ImageRgb8(img.to_rgb8()))
    }
}

/// Already fetched bytes, e.g. from object storage.
pub struct MemoryImageSource {
    id: String,
    bytes: Vec<u8>,
}

impl MemoryImageSource {
    pub fn new(id: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            bytes,
        }
    }
}

impl ImageSource for MemoryImageSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn load(&self) -> Result<DynamicImage> {
        let img = ImageReader::new(Cursor::new(&self.bytes))
            .with_guessed_format()
            .map_err(|e| AppError::image_processing(&self.id, format!("Failed to read image format: {}", e)))?
            .decode()
            .map_err(|e| AppError::image_processing(&self.id, format!("Failed to decode image: {}", e)))?;
        Ok(DynamicImage::ImageRgb8(img.to_rgb8()))
    }
}

/// Lists image files under `input` (recursively, sorted by name), or `input` itself
/// when it is a file.
pub fn list_image_files(input: &Path) -> Result<Vec<PathBuf>> {
    if !input.exists() {
        return Err(format!("Path does not exist: {}", input.display()).into());
    }
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    let files = WalkDir::new(input)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_image_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    Ok(files)
}

pub fn resolve_sources(input: &Path) -> Result<Vec<Box<dyn ImageSource>>> {
    let files = list_image_files(input)?;
    log::info!("Found {} images to analyze under {}", files.len(), input.display());
    Ok(files
        .into_iter()
        .map(|path| Box::new(FileImageSource::new(path)) as Box<dyn ImageSource>)
        .collect())
}
