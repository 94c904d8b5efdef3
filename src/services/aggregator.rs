use crate::config::{AnalysisConfig, Vocabulary};
use crate::models::analysis_types::{ImageAnalysis, ImageOutcome};
use crate::models::color_types::ColorSwatch;
use crate::models::report_types::{
    ColorMetrics, ColorTrends, DominantColor, GarmentColorBin, HueRangeShare, LabelCount,
    ReferenceShare, TrendReport,
};
use crate::services::color_library::ColorMatcher;
use crate::services::color_service::{cluster_points, KMeansParams};
use crate::services::hue_ranges::{hue_range_index, HUE_RANGES};
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Number of representative hex codes kept per hue range.
const HUE_RANGE_REPRESENTATIVES: usize = 3;

/// Turns per-image analyses into corpus-level distributions.
pub struct TrendAggregator<'a> {
    config: &'a AnalysisConfig,
    matcher: &'a ColorMatcher,
}

impl<'a> TrendAggregator<'a> {
    pub fn new(config: &'a AnalysisConfig, matcher: &'a ColorMatcher) -> Self {
        Self { config, matcher }
    }

    /// `None` when no image contributed an accepted garment.
    pub fn aggregate(&self, outcomes: Vec<ImageOutcome>) -> Option<TrendReport> {
        let total = outcomes.len();
        let analyses: Vec<ImageAnalysis> = outcomes
            .into_iter()
            .filter_map(ImageOutcome::into_analysis)
            .collect();
        let skipped = total - analyses.len();
        let mut report = self.aggregate_analyses(analyses)?;
        report.images_skipped = skipped;
        Some(report)
    }

    pub fn aggregate_analyses(&self, analyses: Vec<ImageAnalysis>) -> Option<TrendReport> {
        let garments: Vec<&str> = analyses
            .iter()
            .flat_map(|a| a.accepted_garments.iter().map(|g| g.label.as_str()))
            .collect();
        if garments.is_empty() {
            log::warn!("No data could be extracted from {} images", analyses.len());
            return None;
        }

        let garment_distribution = count_labels(garments.iter().copied());
        let macro_distribution = macro_distribution(&self.config.vocabulary, &garments);
        let style_distribution =
            count_labels(analyses.iter().filter_map(|a| a.primary_style.as_deref()));

        let swatches: Vec<&ColorSwatch> = analyses.iter().flat_map(|a| a.swatches.iter()).collect();
        let color_trends = ColorTrends {
            color_range_distribution: hue_range_distribution(&swatches),
            reference_distribution: reference_distribution(&swatches, self.config.reference_top_n),
            dominant_colors: self.dominant_colors(&swatches),
            metrics: color_metrics(&swatches),
        };

        let garment_colors = garment_distribution
            .iter()
            .map(|g| (g.label.clone(), self.garment_color_bins(&g.label, &analyses)))
            .collect::<IndexMap<_, _>>();

        log::info!(
            "Aggregated {} images: {} garment labels, {} swatches",
            analyses.len(),
            garment_distribution.len(),
            swatches.len()
        );

        Some(TrendReport {
            color_trends,
            garment_distribution,
            macro_distribution,
            style_distribution,
            garment_colors,
            images_processed: analyses.len(),
            images_skipped: 0,
            images: analyses,
        })
    }

    /// Re-clusters every swatch color of the corpus.
    pub fn dominant_colors(&self, swatches: &[&ColorSwatch]) -> Vec<DominantColor> {
        if swatches.is_empty() {
            return Vec::new();
        }

        // Canonical order so the result does not depend on image order.
        let mut points: Vec<[f64; 3]> = swatches.iter().map(|s| s.rgb).collect();
        points.sort_by(|a, b| cmp_rgb(a, b));

        let params = KMeansParams::from_config(self.config);
        let clusters = match cluster_points(&points, self.config.dominant_color_count, params) {
            Ok(clusters) => clusters,
            Err(e) => {
                log::warn!("Dominant color clustering failed: {}", e);
                return Vec::new();
            }
        };

        let total = points.len() as f64;
        let mut dominant: Vec<DominantColor> = clusters
            .centroids
            .iter()
            .zip(&clusters.counts)
            .filter(|(_, count)| **count > 0)
            .map(|(&rgb, &count)| {
                let reference = self.matcher.match_rgb(rgb);
                DominantColor {
                    rgb,
                    hex: reference.hex,
                    reference_name: reference.name,
                    percentage: count as f64 / total * 100.0,
                }
            })
            .collect();

        dominant.sort_by(|a, b| {
            b.percentage
                .partial_cmp(&a.percentage)
                .unwrap_or(Ordering::Equal)
                .then_with(|| cmp_rgb(&a.rgb, &b.rgb))
        });
        dominant
    }

    /// Quantized color bins of the swatches of every image that accepted `garment`.
    pub fn garment_color_bins(&self, garment: &str, analyses: &[ImageAnalysis]) -> Vec<GarmentColorBin> {
        let width = self.config.correlation_bin_width;

        let mut bins: BTreeMap<[u32; 3], Vec<&ColorSwatch>> = BTreeMap::new();
        for swatch in analyses
            .iter()
            .filter(|a| a.accepts(garment))
            .flat_map(|a| a.swatches.iter())
        {
            let key = swatch.rgb.map(|c| ((c / width).floor() * width) as u32);
            bins.entry(key).or_default().push(swatch);
        }

        let mut result: Vec<GarmentColorBin> = bins
            .into_iter()
            .map(|(bin, mut members)| {
                members.sort_by(|a, b| cmp_rgb(&a.rgb, &b.rgb));
                let n = members.len() as f64;
                let mut rgb = [0.0; 3];
                for member in &members {
                    for (acc, c) in rgb.iter_mut().zip(member.rgb) {
                        *acc += c;
                    }
                }
                let rgb = rgb.map(|c| c / n);
                let reference = self.matcher.match_rgb(rgb);
                GarmentColorBin {
                    bin,
                    rgb,
                    hex: reference.hex,
                    reference_name: reference.name,
                    frequency: members.iter().map(|s| s.proportion).sum::<f64>() * 100.0,
                    swatch_count: members.len(),
                }
            })
            .collect();

        result.sort_by(|a, b| {
            b.frequency
                .partial_cmp(&a.frequency)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.bin.cmp(&b.bin))
        });
        result
    }
}

fn cmp_rgb(a: &[f64; 3], b: &[f64; 3]) -> Ordering {
    a[0].total_cmp(&b[0])
        .then_with(|| a[1].total_cmp(&b[1]))
        .then_with(|| a[2].total_cmp(&b[2]))
}

/// Counts labels, most frequent first; equal counts sort by label.
pub fn count_labels<'s>(labels: impl Iterator<Item = &'s str>) -> Vec<LabelCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut total = 0usize;
    for label in labels {
        *counts.entry(label).or_default() += 1;
        total += 1;
    }

    let mut result: Vec<LabelCount> = counts
        .into_iter()
        .map(|(label, count)| LabelCount {
            label: label.to_string(),
            count,
            percentage: count as f64 / total as f64 * 100.0,
        })
        .collect();
    result.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    result
}

fn macro_distribution(vocabulary: &Vocabulary, garments: &[&str]) -> Vec<LabelCount> {
    count_labels(garments.iter().filter_map(|g| vocabulary.category_of(g)))
}

fn hue_range_distribution(swatches: &[&ColorSwatch]) -> Vec<HueRangeShare> {
    if swatches.is_empty() {
        return Vec::new();
    }
    let total = swatches.len() as f64;

    let mut buckets: Vec<Vec<&ColorSwatch>> = vec![Vec::new(); HUE_RANGES.len()];
    for swatch in swatches {
        if let Some(i) = hue_range_index(swatch.hue) {
            buckets[i].push(swatch);
        }
    }

    HUE_RANGES
        .iter()
        .zip(buckets)
        .filter(|(_, members)| !members.is_empty())
        .map(|(range, mut members)| {
            members.sort_by(|a, b| {
                (b.saturation * b.value)
                    .partial_cmp(&(a.saturation * a.value))
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| a.reference_hex.cmp(&b.reference_hex))
            });
            HueRangeShare {
                name: range.name.to_string(),
                count: members.len(),
                percentage: members.len() as f64 / total * 100.0,
                representative_colors: members
                    .iter()
                    .take(HUE_RANGE_REPRESENTATIVES)
                    .map(|s| s.reference_hex.clone())
                    .collect(),
                reference_code: range.reference_code.to_string(),
                primary_color: range.hex.to_string(),
            }
        })
        .collect()
}

fn reference_distribution(swatches: &[&ColorSwatch], top_n: usize) -> Vec<ReferenceShare> {
    if swatches.is_empty() {
        return Vec::new();
    }
    let total = swatches.len() as f64;

    let mut by_name: HashMap<&str, (usize, &str)> = HashMap::new();
    for swatch in swatches {
        let entry = by_name
            .entry(swatch.reference_name.as_str())
            .or_insert((0, swatch.reference_hex.as_str()));
        entry.0 += 1;
        // Fallback matches share one name but not one hex.
        if swatch.reference_hex.as_str() < entry.1 {
            entry.1 = swatch.reference_hex.as_str();
        }
    }

    let mut shares: Vec<ReferenceShare> = by_name
        .into_iter()
        .map(|(name, (count, hex))| ReferenceShare {
            name: name.to_string(),
            count,
            percentage: count as f64 / total * 100.0,
            representative_color: hex.to_string(),
        })
        .collect();
    shares.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    shares.truncate(top_n);
    shares
}

fn color_metrics(swatches: &[&ColorSwatch]) -> ColorMetrics {
    if swatches.is_empty() {
        return ColorMetrics::default();
    }
    let total = swatches.len() as f64;
    let unique: HashSet<&str> = swatches.iter().map(|s| s.reference_hex.as_str()).collect();

    ColorMetrics {
        total_unique_colors: unique.len(),
        average_saturation: swatches.iter().map(|s| s.saturation).sum::<f64>() / total,
        average_brightness: swatches.iter().map(|s| s.value).sum::<f64>() / total,
        color_diversity_index: unique.len() as f64 / total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::classify_types::{ClassifyResult, LabelScore};
    use crate::services::color_library::ColorLibrary;
    use crate::services::color_service::build_swatch;
    use std::sync::Arc;

    fn matcher() -> ColorMatcher {
        let library = ColorLibrary::from_entries([
            ("Red", "#FF0000"),
            ("Blue", "#0000FF"),
            ("Green", "#00FF00"),
            ("Black", "#000000"),
        ])
        .unwrap();
        ColorMatcher::new(Arc::new(library))
    }

    fn analysis(id: &str, garments: &[&str], style: &str, colors: &[([f64; 3], f64)]) -> ImageAnalysis {
        let matcher = matcher();
        ImageAnalysis {
            source_id: id.to_string(),
            scores: ClassifyResult::default(),
            swatches: colors
                .iter()
                .map(|&(rgb, proportion)| build_swatch(rgb, proportion, &matcher))
                .collect(),
            accepted_garments: garments.iter().map(|g| LabelScore::new(*g, 0.5)).collect(),
            primary_style: Some(style.to_string()),
        }
    }

    fn corpus() -> Vec<ImageAnalysis> {
        vec![
            analysis("1", &["dress"], "minimalist", &[([250.0, 5.0, 5.0], 0.6), ([5.0, 5.0, 250.0], 0.3)]),
            analysis("2", &["dress", "coat"], "goth", &[([240.0, 10.0, 0.0], 0.7)]),
            analysis("3", &["jeans"], "minimalist", &[([10.0, 20.0, 230.0], 0.9), ([0.0, 200.0, 0.0], 0.05)]),
        ]
    }

    #[test]
    fn test_empty_corpus_yields_none() {
        let config = AnalysisConfig::default();
        let matcher = matcher();
        let aggregator = TrendAggregator::new(&config, &matcher);
        assert!(aggregator.aggregate(Vec::new()).is_none());

        let skipped = vec![ImageOutcome::Skipped {
            source_id: "x".to_string(),
            reason: "decode".to_string(),
        }];
        assert!(aggregator.aggregate(skipped).is_none());
    }

    #[test]
    fn test_label_distributions() {
        let config = AnalysisConfig::default();
        let matcher = matcher();
        let report = TrendAggregator::new(&config, &matcher)
            .aggregate_analyses(corpus())
            .unwrap();

        let garments: Vec<(&str, usize)> = report
            .garment_distribution
            .iter()
            .map(|g| (g.label.as_str(), g.count))
            .collect();
        assert_eq!(garments, vec![("dress", 2), ("coat", 1), ("jeans", 1)]);
        assert!((report.garment_distribution[0].percentage - 50.0).abs() < 1e-9);

        let styles: Vec<(&str, usize)> = report
            .style_distribution
            .iter()
            .map(|s| (s.label.as_str(), s.count))
            .collect();
        assert_eq!(styles, vec![("minimalist", 2), ("goth", 1)]);

        let macros: Vec<(&str, usize)> = report
            .macro_distribution
            .iter()
            .map(|m| (m.label.as_str(), m.count))
            .collect();
        assert_eq!(macros, vec![("Dresses", 2), ("Bottoms", 1), ("Outerwear", 1)]);
        assert_eq!(report.images_processed, 3);
    }

    #[test]
    fn test_hue_and_reference_distribution() {
        let config = AnalysisConfig::default();
        let matcher = matcher();
        let report = TrendAggregator::new(&config, &matcher)
            .aggregate_analyses(corpus())
            .unwrap();
        let trends = &report.color_trends;

        let total: usize = trends.color_range_distribution.iter().map(|r| r.count).sum();
        assert_eq!(total, 5);
        let red = trends
            .color_range_distribution
            .iter()
            .find(|r| r.name == "True Red")
            .unwrap();
        assert_eq!(red.count, 2);
        assert!((red.percentage - 40.0).abs() < 1e-9);
        assert_eq!(red.primary_color, "#D12631");
        assert!(red.representative_colors.len() <= 3);

        let refs: Vec<(&str, usize)> = trends
            .reference_distribution
            .iter()
            .map(|r| (r.name.as_str(), r.count))
            .collect();
        assert_eq!(refs, vec![("Blue", 2), ("Red", 2), ("Green", 1)]);
        assert_eq!(trends.reference_distribution[0].representative_color, "#0000FF");

        assert_eq!(trends.metrics.total_unique_colors, 3);
        assert!((trends.metrics.color_diversity_index - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_reference_distribution_is_capped() {
        let mut config = AnalysisConfig::default();
        config.reference_top_n = 2;
        let matcher = matcher();
        let report = TrendAggregator::new(&config, &matcher)
            .aggregate_analyses(corpus())
            .unwrap();
        assert_eq!(report.color_trends.reference_distribution.len(), 2);
    }

    #[test]
    fn test_dominant_colors_cover_all_swatches() {
        let config = AnalysisConfig::default();
        let matcher = matcher();
        let report = TrendAggregator::new(&config, &matcher)
            .aggregate_analyses(corpus())
            .unwrap();
        let dominant = &report.color_trends.dominant_colors;

        // Five distinct swatch colors, so five clusters of one swatch each.
        assert_eq!(dominant.len(), 5);
        let sum: f64 = dominant.iter().map(|d| d.percentage).sum();
        assert!((sum - 100.0).abs() < 1e-9);
        assert!(dominant.windows(2).all(|w| w[0].percentage >= w[1].percentage));
    }

    #[test]
    fn test_garment_color_bins() {
        let config = AnalysisConfig::default();
        let matcher = matcher();
        let aggregator = TrendAggregator::new(&config, &matcher);
        let analyses = vec![
            analysis("1", &["dress"], "x", &[([251.0, 3.0, 3.0], 0.5), ([5.0, 5.0, 250.0], 0.3)]),
            analysis("2", &["dress"], "x", &[([255.0, 9.0, 1.0], 0.4)]),
            analysis("3", &["coat"], "x", &[([0.0, 255.0, 0.0], 0.9)]),
        ];

        let bins = aggregator.garment_color_bins("dress", &analyses);
        assert_eq!(bins.len(), 2);
        assert_eq!(bins[0].bin, [250, 0, 0]);
        assert_eq!(bins[0].swatch_count, 2);
        assert!((bins[0].frequency - 90.0).abs() < 1e-9);
        assert!((bins[0].rgb[0] - 253.0).abs() < 1e-9);
        assert!((bins[0].rgb[1] - 6.0).abs() < 1e-9);
        assert_eq!(bins[0].reference_name, "Red");
        assert_eq!(bins[1].bin, [0, 0, 250]);

        assert!(aggregator.garment_color_bins("jeans", &analyses).is_empty());
    }

    #[test]
    fn test_extracted_bin_boundary_color_keeps_its_bin() {
        use crate::services::color_service::ColorExtractor;
        use image::{DynamicImage, Rgb, RgbImage};

        let config = AnalysisConfig::default();
        let matcher = matcher();
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(20, 20, Rgb([25, 50, 75])));
        let swatches = ColorExtractor::from_config(&config).extract(&image, &matcher).unwrap();

        let analyses = vec![ImageAnalysis {
            source_id: "1".to_string(),
            scores: ClassifyResult::default(),
            swatches,
            accepted_garments: vec![LabelScore::new("dress", 0.9)],
            primary_style: None,
        }];
        let bins = TrendAggregator::new(&config, &matcher).garment_color_bins("dress", &analyses);
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].bin, [25, 50, 75]);
        assert_eq!(bins[0].rgb, [25.0, 50.0, 75.0]);
    }

    #[test]
    fn test_bins_floor_without_rounding() {
        let config = AnalysisConfig::default();
        let matcher = matcher();
        let aggregator = TrendAggregator::new(&config, &matcher);
        let analyses = vec![analysis(
            "1",
            &["dress"],
            "x",
            &[([24.999, 0.0, 0.0], 0.5), ([25.0, 0.0, 0.0], 0.5)],
        )];
        let bins = aggregator.garment_color_bins("dress", &analyses);
        let keys: Vec<[u32; 3]> = bins.iter().map(|b| b.bin).collect();
        assert!(keys.contains(&[0, 0, 0]));
        assert!(keys.contains(&[25, 0, 0]));
    }

    #[test]
    fn test_swatchless_images_still_count_garments() {
        let config = AnalysisConfig::default();
        let matcher = matcher();
        let report = TrendAggregator::new(&config, &matcher)
            .aggregate_analyses(vec![analysis("1", &["dress"], "goth", &[])])
            .unwrap();
        assert_eq!(report.garment_distribution[0].count, 1);
        assert!(report.color_trends.dominant_colors.is_empty());
        assert!(report.color_trends.color_range_distribution.is_empty());
        assert_eq!(report.color_trends.metrics, ColorMetrics::default());
        assert_eq!(report.garment_colors.get("dress").map(Vec::len), Some(0));
    }

    #[test]
    fn test_skipped_images_are_counted() {
        let config = AnalysisConfig::default();
        let matcher = matcher();
        let mut outcomes: Vec<ImageOutcome> = corpus().into_iter().map(ImageOutcome::Analyzed).collect();
        outcomes.push(ImageOutcome::Skipped {
            source_id: "bad.jpg".to_string(),
            reason: "decode".to_string(),
        });
        let report = TrendAggregator::new(&config, &matcher).aggregate(outcomes).unwrap();
        assert_eq!(report.images_processed, 3);
        assert_eq!(report.images_skipped, 1);
        assert!(report.images.iter().all(|a| a.source_id != "bad.jpg"));
    }
}
