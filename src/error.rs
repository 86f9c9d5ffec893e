use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("{0}")]
    InvalidInput(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP-style status code for the caller-facing contract.
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::InvalidInput(_) | AppError::InvalidState(_) => 400,
            AppError::Unauthenticated => 401,
            AppError::Forbidden(_) => 403,
            AppError::NotFound(_) => 404,
            AppError::Database(_) | AppError::Internal(_) => 500,
        }
    }

    /// Caller-facing message. With `verbose` false (production), 5xx
    /// errors collapse to a generic message so internal detail never
    /// reaches end users.
    pub fn public_message(&self, verbose: bool) -> String {
        match self {
            AppError::Database(_) | AppError::Internal(_) if !verbose => {
                "An unexpected error occurred. Please try again later.".to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
