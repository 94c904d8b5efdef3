pub mod analyze;
pub mod match_color;
