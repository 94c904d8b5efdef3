use crate::models::analysis_types::ImageAnalysis;
use crate::models::color_types::{rgb_to_u8, ColorSwatch};
use crate::models::report_types::{
    ColorMetrics, ColorTrends, DominantColor, GarmentColorBin, HueRangeShare, LabelCount,
    ReferenceShare, TrendReport,
};
use crate::models::schema_types::{
    ColorMetricsDoc, ColorTrendsDoc, CountDoc, DominantColorDoc, GarmentAnalysisDoc,
    GarmentColorDoc, GarmentTrendsDoc, HueRangeDoc, ImageDoc, ReferenceShareDoc, StyleTrendsDoc,
    SwatchDoc, TrendDocument,
};
use indexmap::IndexMap;

pub fn percentage_to_proportion(percentage: f64) -> f64 {
    percentage / 100.0
}

pub fn proportion_to_percentage(proportion: f64) -> f64 {
    proportion * 100.0
}

/// Reshapes an aggregated report into the stored document layout.
///
/// Every section of the report has a counterpart in the document, empty
/// sections included.
pub fn transform(report: &TrendReport) -> TrendDocument {
    TrendDocument {
        color_trends: color_trends_doc(&report.color_trends),
        garment_trends: GarmentTrendsDoc {
            distribution: distribution_doc(&report.garment_distribution),
            top_garments: ranked_labels(&report.garment_distribution),
            macro_distribution: distribution_doc(&report.macro_distribution),
        },
        style_trends: StyleTrendsDoc {
            distribution: distribution_doc(&report.style_distribution),
            top_styles: ranked_labels(&report.style_distribution),
        },
        color_garment_trends: report
            .garment_colors
            .iter()
            .map(|(garment, bins)| (garment.clone(), bins.iter().map(garment_color_doc).collect()))
            .collect(),
        detailed_image_analysis: report.images.iter().map(image_doc).collect(),
        images_processed: report.images_processed,
        images_skipped: report.images_skipped,
    }
}

fn color_trends_doc(trends: &ColorTrends) -> ColorTrendsDoc {
    ColorTrendsDoc {
        dominant_colors: trends.dominant_colors.iter().map(dominant_color_doc).collect(),
        color_range_distribution: trends
            .color_range_distribution
            .iter()
            .map(|range| (range.name.clone(), hue_range_doc(range)))
            .collect(),
        pantone_distribution: trends
            .reference_distribution
            .iter()
            .map(|share| (share.name.clone(), reference_share_doc(share)))
            .collect(),
        color_metrics: metrics_doc(&trends.metrics),
    }
}

fn dominant_color_doc(color: &DominantColor) -> DominantColorDoc {
    DominantColorDoc {
        rgb: rgb_to_u8(color.rgb),
        hex: color.hex.clone(),
        pantone_ref: color.reference_name.clone(),
        proportion: percentage_to_proportion(color.percentage),
        percentage: color.percentage,
        color_name: color.reference_name.clone(),
    }
}

fn hue_range_doc(range: &HueRangeShare) -> HueRangeDoc {
    HueRangeDoc {
        count: range.count,
        percentage: range.percentage,
        representative_colors: range.representative_colors.clone(),
        pantone_ref: range.reference_code.clone(),
        primary_color: range.primary_color.clone(),
    }
}

fn reference_share_doc(share: &ReferenceShare) -> ReferenceShareDoc {
    ReferenceShareDoc {
        count: share.count,
        percentage: share.percentage,
        representative_color: share.representative_color.clone(),
    }
}

fn metrics_doc(metrics: &ColorMetrics) -> ColorMetricsDoc {
    ColorMetricsDoc {
        total_unique_colors: metrics.total_unique_colors,
        average_saturation: metrics.average_saturation,
        average_brightness: metrics.average_brightness,
        color_diversity_index: metrics.color_diversity_index,
    }
}

fn distribution_doc(counts: &[LabelCount]) -> IndexMap<String, CountDoc> {
    counts
        .iter()
        .map(|c| {
            (
                c.label.clone(),
                CountDoc {
                    count: c.count,
                    percentage: c.percentage,
                },
            )
        })
        .collect()
}

/// Labels ordered by count, highest first; equal counts keep their order.
fn ranked_labels(counts: &[LabelCount]) -> Vec<String> {
    let mut ranked: Vec<&LabelCount> = counts.iter().collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.into_iter().map(|c| c.label.clone()).collect()
}

fn garment_color_doc(bin: &GarmentColorBin) -> GarmentColorDoc {
    GarmentColorDoc {
        rgb: rgb_to_u8(bin.rgb),
        hex: bin.hex.clone(),
        frequency: bin.frequency,
        color_name: bin.reference_name.clone(),
    }
}

fn image_doc(analysis: &ImageAnalysis) -> ImageDoc {
    let top = analysis.scores.top_garment();
    ImageDoc {
        source: analysis.source_id.clone(),
        garment_analysis: GarmentAnalysisDoc {
            primary_category: top.map(|g| g.label.clone()),
            confidence_category: top.map(|g| g.probability),
            primary_style: analysis.primary_style.clone(),
            accepted_garments: analysis
                .accepted_garments
                .iter()
                .map(|g| g.label.clone())
                .collect(),
        },
        colors: analysis.swatches.iter().map(swatch_doc).collect(),
    }
}

fn swatch_doc(swatch: &ColorSwatch) -> SwatchDoc {
    SwatchDoc {
        rgb: rgb_to_u8(swatch.rgb),
        hex: swatch.reference_hex.clone(),
        proportion: swatch.proportion,
        color_name: swatch.reference_name.clone(),
        pantone_ref: swatch.reference_name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::classify_types::{ClassifyResult, LabelScore};
    use crate::services::color_library::ColorMatcher;
    use crate::services::color_service::build_swatch;

    fn report() -> TrendReport {
        let matcher = ColorMatcher::unavailable();
        let mut garment_colors = IndexMap::new();
        garment_colors.insert(
            "dress".to_string(),
            vec![GarmentColorBin {
                bin: [225, 0, 0],
                rgb: [240.7, 12.2, 3.9],
                hex: "#f00c03".to_string(),
                reference_name: "Custom".to_string(),
                frequency: 130.0,
                swatch_count: 2,
            }],
        );
        garment_colors.insert("coat".to_string(), Vec::new());

        TrendReport {
            color_trends: ColorTrends {
                color_range_distribution: Vec::new(),
                reference_distribution: vec![ReferenceShare {
                    name: "Custom".to_string(),
                    count: 3,
                    percentage: 100.0,
                    representative_color: "#0000fa".to_string(),
                }],
                dominant_colors: vec![
                    DominantColor {
                        rgb: [245.9, 7.5, 2.1],
                        hex: "#f50702".to_string(),
                        reference_name: "Custom".to_string(),
                        percentage: 200.0 / 3.0,
                    },
                    DominantColor {
                        rgb: [5.0, 5.0, 250.0],
                        hex: "#0505fa".to_string(),
                        reference_name: "Custom".to_string(),
                        percentage: 100.0 / 3.0,
                    },
                ],
                metrics: ColorMetrics::default(),
            },
            garment_distribution: vec![
                LabelCount {
                    label: "dress".to_string(),
                    count: 2,
                    percentage: 66.0,
                },
                LabelCount {
                    label: "coat".to_string(),
                    count: 1,
                    percentage: 33.0,
                },
            ],
            macro_distribution: Vec::new(),
            style_distribution: Vec::new(),
            garment_colors,
            images: vec![ImageAnalysis {
                source_id: "look.jpg".to_string(),
                scores: ClassifyResult {
                    garment_scores: vec![LabelScore::new("dress", 0.7), LabelScore::new("coat", 0.3)],
                    style_scores: vec![LabelScore::new("goth", 1.0)],
                },
                swatches: vec![build_swatch([200.6, 10.0, 10.0], 0.8, &matcher)],
                accepted_garments: vec![LabelScore::new("dress", 0.7), LabelScore::new("coat", 0.3)],
                primary_style: Some("goth".to_string()),
            }],
            images_processed: 1,
            images_skipped: 2,
        }
    }

    #[test]
    fn test_percentages_round_trip() {
        let report = report();
        let doc = transform(&report);

        for (original, stored) in report
            .color_trends
            .dominant_colors
            .iter()
            .zip(&doc.color_trends.dominant_colors)
        {
            assert!((proportion_to_percentage(stored.proportion) - original.percentage).abs() < 1e-9);
            assert_eq!(stored.percentage, original.percentage);
        }
        let proportions: f64 = doc.color_trends.dominant_colors.iter().map(|d| d.proportion).sum();
        assert!((proportions - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_rgb_is_truncated() {
        let doc = transform(&report());
        assert_eq!(doc.color_trends.dominant_colors[0].rgb, [245, 7, 2]);
        assert_eq!(doc.color_garment_trends["dress"][0].rgb, [240, 12, 3]);
        assert_eq!(doc.detailed_image_analysis[0].colors[0].rgb, [200, 10, 10]);
    }

    #[test]
    fn test_keeps_every_section() {
        let doc = transform(&report());
        assert_eq!(
            doc.color_garment_trends.keys().collect::<Vec<_>>(),
            vec!["dress", "coat"]
        );
        assert!(doc.color_garment_trends["coat"].is_empty());
        assert!(doc.color_trends.color_range_distribution.is_empty());
        assert!(doc.style_trends.distribution.is_empty());
        assert!(doc.style_trends.top_styles.is_empty());
        assert_eq!(doc.images_processed, 1);
        assert_eq!(doc.images_skipped, 2);

        let json = serde_json::to_value(&doc).unwrap();
        for key in [
            "color_trends",
            "garment_trends",
            "style_trends",
            "color_garment_trends",
            "detailed_image_analysis",
        ] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
        assert!(json["garment_trends"]["top_garments"].is_array());
        assert!(json["color_trends"]["dominant_colors"].is_array());
    }

    #[test]
    fn test_top_lists_and_image_details() {
        let doc = transform(&report());
        assert_eq!(doc.garment_trends.top_garments, vec!["dress", "coat"]);
        assert_eq!(doc.garment_trends.distribution["dress"].count, 2);

        let image = &doc.detailed_image_analysis[0];
        assert_eq!(image.source, "look.jpg");
        assert_eq!(image.garment_analysis.primary_category.as_deref(), Some("dress"));
        assert_eq!(image.garment_analysis.confidence_category, Some(0.7));
        assert_eq!(image.garment_analysis.primary_style.as_deref(), Some("goth"));
        assert_eq!(image.garment_analysis.accepted_garments, vec!["dress", "coat"]);
        assert_eq!(image.colors[0].color_name, "Custom");
        assert_eq!(image.colors[0].hex, "#c80a0a");
    }
}
