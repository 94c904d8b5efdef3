use crate::config::AnalysisConfig;
use crate::error::{AppError, Result};
use crate::models::color_types::{rgb_to_hex, rgb_to_hsv, ColorSwatch};
use crate::services::color_library::ColorMatcher;
use image::DynamicImage;
use kmeans_colors::get_kmeans;
use palette::Srgb;
use std::collections::HashSet;

/// Seeded k-means settings shared by per-image and corpus-wide clustering.
#[derive(Debug, Clone, Copy)]
pub struct KMeansParams {
    pub max_iterations: usize,
    pub convergence: f32,
    pub seed: u64,
}

impl KMeansParams {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            max_iterations: config.kmeans_max_iterations,
            convergence: config.kmeans_convergence,
            seed: config.kmeans_seed,
        }
    }
}

/// Centroids on the 0-255 scale with their member counts, index-aligned.
#[derive(Debug, Clone, Default)]
pub struct Clusters {
    pub centroids: Vec<[f64; 3]>,
    pub counts: Vec<usize>,
}

/// Runs k-means over RGB points (0-255 scale).
///
/// `k` is capped at the number of distinct points: seeding needs a fresh
/// point for every centroid.
pub fn cluster_points(points: &[[f64; 3]], k: usize, params: KMeansParams) -> Result<Clusters> {
    if points.is_empty() || k == 0 {
        return Ok(Clusters::default());
    }
    if k > u8::MAX as usize {
        return Err(AppError::Clustering {
            message: format!("k = {} exceeds the supported maximum of {}", k, u8::MAX),
        });
    }

    let distinct: HashSet<[u64; 3]> = points.iter().map(|p| p.map(f64::to_bits)).collect();
    let k = k.min(distinct.len());

    // 1. Normalize into the unit cube the Srgb type expects
    let buf: Vec<Srgb> = points
        .iter()
        .map(|p| Srgb::new((p[0] / 255.0) as f32, (p[1] / 255.0) as f32, (p[2] / 255.0) as f32))
        .collect();

    // 2. Train
    let result = get_kmeans(
        k,
        params.max_iterations,
        params.convergence,
        false,
        &buf,
        params.seed,
    );

    if result.indices.len() != points.len() {
        return Err(AppError::Clustering {
            message: format!(
                "k-means assigned {} of {} points",
                result.indices.len(),
                points.len()
            ),
        });
    }

    // 3. Member counts and f64 sums per centroid
    let mut counts = vec![0usize; result.centroids.len()];
    let mut sums = vec![[0f64; 3]; result.centroids.len()];
    for (&idx, point) in result.indices.iter().zip(points) {
        let idx = idx as usize;
        if idx >= counts.len() {
            return Err(AppError::Clustering {
                message: format!("k-means produced out-of-range label {}", idx),
            });
        }
        counts[idx] += 1;
        for (acc, c) in sums[idx].iter_mut().zip(point) {
            *acc += c;
        }
    }

    // 4. Centroids as the exact mean of their members; the f32 training
    // centroid is only kept for clusters left empty.
    let centroids = result
        .centroids
        .iter()
        .zip(sums.iter().zip(&counts))
        .map(|(c, (sum, &count))| {
            if count > 0 {
                sum.map(|v| v / count as f64)
            } else {
                [
                    f64::from(c.red) * 255.0,
                    f64::from(c.green) * 255.0,
                    f64::from(c.blue) * 255.0,
                ]
            }
        })
        .collect();

    Ok(Clusters { centroids, counts })
}

/// Extracts representative color swatches from an isolated image.
#[derive(Debug, Clone)]
pub struct ColorExtractor {
    pub num_colors: usize,
    pub min_cluster_pixels: usize,
    pub alpha_threshold: u8,
    pub params: KMeansParams,
}

impl ColorExtractor {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            num_colors: config.num_colors,
            min_cluster_pixels: config.min_cluster_pixels,
            alpha_threshold: config.alpha_threshold,
            params: KMeansParams::from_config(config),
        }
    }

    /// Pixels that survive background removal; every pixel when there is no alpha.
    pub fn foreground_pixels(&self, image: &DynamicImage) -> Vec<[f64; 3]> {
        if image.color().has_alpha() {
            image
                .to_rgba8()
                .pixels()
                .filter(|p| p[3] > self.alpha_threshold)
                .map(|p| [f64::from(p[0]), f64::from(p[1]), f64::from(p[2])])
                .collect()
        } else {
            image
                .to_rgb8()
                .pixels()
                .map(|p| [f64::from(p[0]), f64::from(p[1]), f64::from(p[2])])
                .collect()
        }
    }

    pub fn extract(&self, image: &DynamicImage, matcher: &ColorMatcher) -> Result<Vec<ColorSwatch>> {
        let pixels = self.foreground_pixels(image);

        // Clustering needs more samples than clusters.
        if pixels.len() <= self.num_colors {
            log::debug!(
                "Only {} foreground pixels for k = {}, no swatches",
                pixels.len(),
                self.num_colors
            );
            return Ok(Vec::new());
        }

        let clusters = cluster_points(&pixels, self.num_colors, self.params)?;
        let total = pixels.len() as f64;

        let swatches: Vec<ColorSwatch> = clusters
            .centroids
            .iter()
            .zip(&clusters.counts)
            .filter(|(_, &count)| count >= self.min_cluster_pixels)
            .map(|(&centroid, &count)| build_swatch(centroid, count as f64 / total, matcher))
            .collect();

        log::debug!(
            "{} of {} clusters kept from {} foreground pixels",
            swatches.len(),
            clusters.centroids.len(),
            pixels.len()
        );
        Ok(swatches)
    }
}

pub fn build_swatch(rgb: [f64; 3], proportion: f64, matcher: &ColorMatcher) -> ColorSwatch {
    let (hue, saturation, value) = rgb_to_hsv(rgb);
    let brightness = rgb.iter().sum::<f64>() / 3.0;
    let complexity = (rgb.iter().map(|c| (c - brightness).powi(2)).sum::<f64>() / 3.0).sqrt();
    let reference = matcher.match_rgb(rgb);

    ColorSwatch {
        rgb,
        hex: rgb_to_hex(rgb),
        hue,
        saturation,
        value,
        brightness,
        complexity,
        proportion,
        reference_name: reference.name,
        reference_hex: reference.hex,
    }
}
