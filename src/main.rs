use clap::{Parser, Subcommand};
use std::path::PathBuf;
use trend_lens::commands::analyze::{analyze, AnalyzeRequest};
use trend_lens::commands::match_color::match_color;
use trend_lens::config::AnalysisConfig;
use trend_lens::logging::{init_logging, LoggingConfig};
use trend_lens::services::classifier::model_manager::{ModelPaths, SessionOptions};
use trend_lens::AppError;

#[derive(Parser)]
#[command(name = "trend-lens")]
#[command(version, about = "Garment, style and color trends from fashion photos", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze an image or a directory of images and export the trend report
    Analyze {
        /// Input file or directory
        #[arg(value_name = "SOURCE")]
        source: PathBuf,

        /// Reference color catalog (JSON)
        #[arg(long, value_name = "FILE")]
        catalog: Option<PathBuf>,

        /// ONNX image encoder
        #[arg(long, value_name = "FILE")]
        image_model: PathBuf,

        /// Precomputed label embeddings (JSON)
        #[arg(long, value_name = "FILE")]
        text_embeddings: PathBuf,

        /// ONNX saliency model used for background removal
        #[arg(long, value_name = "FILE")]
        background_model: Option<PathBuf>,

        /// Analysis configuration (JSON)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Garment confidence threshold
        #[arg(long, value_name = "FLOAT")]
        threshold: Option<f64>,

        /// Colors extracted per image
        #[arg(long, value_name = "K")]
        colors: Option<usize>,

        /// Number of parallel threads
        #[arg(short = 'j', long, value_name = "N")]
        threads: Option<usize>,

        /// Output report
        #[arg(short, long, value_name = "FILE", default_value = "fashion_trends_report.json")]
        out: PathBuf,

        /// Try GPU execution providers
        #[arg(long)]
        gpu: bool,
    },

    /// Find the catalog color closest to a hex color
    MatchColor {
        /// Color as #RRGGBB
        hex: String,

        /// Reference color catalog (JSON)
        #[arg(long, value_name = "FILE")]
        catalog: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(LoggingConfig::from_verbosity(cli.verbose));

    let result = match cli.command {
        Commands::Analyze {
            source,
            catalog,
            image_model,
            text_embeddings,
            background_model,
            config,
            threshold,
            colors,
            threads,
            out,
            gpu,
        } => cmd_analyze(
            source,
            catalog,
            ModelPaths {
                image_encoder: Some(image_model),
                text_embeddings: Some(text_embeddings),
                background_remover: background_model,
            },
            config,
            threshold,
            colors,
            threads,
            out,
            gpu,
        ),
        Commands::MatchColor { hex, catalog } => cmd_match_color(hex, catalog),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        let code = if matches!(e, AppError::EmptyCorpus) { 2 } else { 1 };
        std::process::exit(code);
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_analyze(
    source: PathBuf,
    catalog: Option<PathBuf>,
    models: ModelPaths,
    config_path: Option<PathBuf>,
    threshold: Option<f64>,
    colors: Option<usize>,
    threads: Option<usize>,
    out: PathBuf,
    gpu: bool,
) -> Result<(), AppError> {
    let mut config = match config_path {
        Some(path) => AnalysisConfig::from_json_file(&path)?,
        None => AnalysisConfig::default(),
    };
    if let Some(threshold) = threshold {
        config.confidence_threshold = threshold;
    }
    if let Some(colors) = colors {
        config.num_colors = colors;
    }
    if threads.is_some() {
        config.threads = threads;
    }

    // Configure thread pool if specified
    if let Some(num_threads) = config.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .map_err(|e| AppError::Config {
                message: format!("Failed to configure thread pool: {}", e),
            })?;
        log::info!("Using {} threads for parallel processing", num_threads);
    }

    let summary = analyze(AnalyzeRequest {
        source,
        catalog,
        models,
        session: SessionOptions {
            use_gpu: gpu,
            ..SessionOptions::default()
        },
        config,
        output: out,
    })?;

    println!(
        "Analyzed {} images ({} skipped), report written to {}",
        summary.images_processed,
        summary.images_skipped,
        summary.output.display()
    );
    if !summary.top_garments.is_empty() {
        println!("Top garments: {}", summary.top_garments.iter().take(5).cloned().collect::<Vec<_>>().join(", "));
    }
    if !summary.top_styles.is_empty() {
        println!("Top styles: {}", summary.top_styles.iter().take(5).cloned().collect::<Vec<_>>().join(", "));
    }
    Ok(())
}

fn cmd_match_color(hex: String, catalog: Option<PathBuf>) -> Result<(), AppError> {
    let result = match_color(&hex, catalog.as_deref())?;
    match result.distance {
        Some(distance) => println!("{} -> {} ({}), ΔE {:.2}", result.input, result.name, result.hex, distance),
        None => println!("{} -> {} ({})", result.input, result.name, result.hex),
    }
    Ok(())
}
