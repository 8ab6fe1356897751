use std::fmt;

#[derive(Debug)]
pub enum AppError {
    InvalidRequest(String),
    NotFound(String),
    /// Stored object changed between read and conditional write.
    Conflict(String),
    MalformedDocument(String),
    StorageError(String),
    IdentityError(String),
    ConfigError(String),
}

impl AppError {
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::InvalidRequest(_) => 400,
            AppError::NotFound(_) => 404,
            AppError::Conflict(_) => 409,
            AppError::MalformedDocument(_)
            | AppError::StorageError(_)
            | AppError::IdentityError(_)
            | AppError::ConfigError(_) => 500,
        }
    }

    pub fn is_internal(&self) -> bool {
        self.status_code() >= 500
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidRequest(msg) => write!(f, "{}", msg),
            AppError::NotFound(msg) => write!(f, "{}", msg),
            AppError::Conflict(msg) => write!(f, "{}", msg),
            AppError::MalformedDocument(msg) => write!(f, "Malformed document: {}", msg),
            AppError::StorageError(msg) => write!(f, "Storage error: {}", msg),
            AppError::IdentityError(msg) => write!(f, "Identity error: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::InvalidRequest("x".into()).status_code(), 400);
        assert_eq!(AppError::NotFound("x".into()).status_code(), 404);
        assert_eq!(AppError::Conflict("x".into()).status_code(), 409);
        assert_eq!(AppError::StorageError("x".into()).status_code(), 500);
        assert!(AppError::MalformedDocument("x".into()).is_internal());
        assert!(!AppError::NotFound("x".into()).is_internal());
    }
}
