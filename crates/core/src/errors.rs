use thiserror::Error;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] eyre::Report),

    #[error("Internal server error: {0}")]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl BookingError {
    /// Stable machine-readable name of the error class, used in API bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            BookingError::NotFound(_) => "not_found",
            BookingError::Validation(_) => "validation",
            BookingError::Authentication(_) => "authentication",
            BookingError::Forbidden(_) => "forbidden",
            BookingError::Conflict(_) => "conflict",
            BookingError::Database(_) => "database",
            BookingError::Internal(_) => "internal",
        }
    }
}

pub type BookingResult<T> = Result<T, BookingError>;
