use thiserror::Error;

#[derive(Debug, Error)]
pub enum DielineError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid box dimensions: {length}x{width}x{height}")]
    InvalidDimensions { length: f64, width: f64, height: f64 },
    #[error("Unknown plant: {0}")]
    UnknownPlant(String),
    #[error(
        "Slug for group {group} ({width:.4}x{height:.4}) cannot fit the sheet interior ({max_width:.4}x{max_height:.4})"
    )]
    UnpackableGroup {
        group: String,
        width: f64,
        height: f64,
        max_width: f64,
        max_height: f64,
    },
    #[error("Nothing to pack")]
    Empty,
}

pub type Result<T> = std::result::Result<T, DielineError>;
