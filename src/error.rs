use thiserror::Error;

pub type ServiceResult<T> = core::result::Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),
    #[error("Food name required")]
    InvalidFoodName,
    #[error("Food already exists: {0} (use edit instead)")]
    DuplicateFood(String),
    #[error("Food not found: {0}")]
    FoodNotFound(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("Could not determine the home directory; pass --data-dir")]
    NoHomeDir,
}
