pub mod aggregator;
pub mod classifier;
pub mod color_library;
pub mod color_service;
pub mod fs_service;
pub mod hue_ranges;
pub mod isolation;
pub mod pipeline;
pub mod report_transformer;
