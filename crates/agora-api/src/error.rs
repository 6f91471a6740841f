use thiserror::Error;

/// One per-field message from a server validation payload
/// (`{"errors": [{"path": ..., "msg": ...}]}`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Error, Debug)]
pub enum ApiError {
    /// Network-level failure (DNS, connect, TLS, body read).
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response with a plain error message.
    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Non-2xx response carrying per-field validation errors.
    #[error("Validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    /// 2xx response whose body did not have the expected shape.
    #[error("Unexpected response shape: {0}")]
    Decode(String),
}

impl ApiError {
    /// Whether the failure means the credential is no longer accepted.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Status { status: 401, .. })
    }
}
