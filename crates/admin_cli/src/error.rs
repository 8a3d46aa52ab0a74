use engine::{FormError, ServiceError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Form(#[from] FormError),
    #[error("backend error: {0}")]
    Service(#[from] ServiceError),
    #[error("invalid setting: {0}")]
    Setting(String),
}

impl AppError {
    /// Process exit code: 2 for input the form rejected, 1 for everything else.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Form(FormError::Validation(_) | FormError::InvalidInput { .. }) => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use engine::ValidationReport;

    use super::*;

    #[test]
    fn validation_failures_exit_with_two() {
        let err = AppError::Form(FormError::Validation(ValidationReport::default()));
        assert_eq!(err.exit_code(), 2);
        let err = AppError::Form(FormError::RemoteWrite(ServiceError::Unauthorized));
        assert_eq!(err.exit_code(), 1);
        assert_eq!(AppError::Setting("x".to_string()).exit_code(), 1);
    }

    #[test]
    fn transport_failures_surface_as_backend_errors() {
        let err = AppError::from(ServiceError::Transport("connection refused".to_string()));
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().starts_with("backend error: "));
    }
}
