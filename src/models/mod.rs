pub mod analysis_types;
pub mod classify_types;
pub mod color_types;
pub mod report_types;
pub mod schema_types;
