/// Errors that can cross the engine boundary. The engine itself never fails;
/// these come from configuration parsing and drawing-surface acquisition.
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    ConfigError(String),
    RenderingError(String),
    ValidationError(String),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::ConfigError(msg) => write!(f, "Config Error: {}", msg),
            AppError::RenderingError(msg) => write!(f, "Rendering Error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        AppError::ConfigError(error.to_string())
    }
}

pub type ConfigResult<T> = Result<T, AppError>;
pub type RenderingResult<T> = Result<T, AppError>;
