use thiserror::Error;

// Errors surfaced by every car service operation and by the booking lifecycle
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CarServiceError {
    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Network failure: {0}")]
    NetworkFailure(String),

    #[error("Validation failure: {0}")]
    ValidationFailure(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Service error: {status} - {message}")]
    Service { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// Fieldless discriminant of [`CarServiceError`], stored by rejected bookings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInterval,
    Conflict,
    NotFound,
    Forbidden,
    AuthenticationFailed,
    NetworkFailure,
    ValidationFailure,
    InvalidState,
    Service,
    MalformedResponse,
}

impl CarServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CarServiceError::InvalidInterval(_) => ErrorKind::InvalidInterval,
            CarServiceError::Conflict(_) => ErrorKind::Conflict,
            CarServiceError::NotFound(_) => ErrorKind::NotFound,
            CarServiceError::Forbidden(_) => ErrorKind::Forbidden,
            CarServiceError::AuthenticationFailed(_) => ErrorKind::AuthenticationFailed,
            CarServiceError::NetworkFailure(_) => ErrorKind::NetworkFailure,
            CarServiceError::ValidationFailure(_) => ErrorKind::ValidationFailure,
            CarServiceError::InvalidState(_) => ErrorKind::InvalidState,
            CarServiceError::Service { .. } => ErrorKind::Service,
            CarServiceError::MalformedResponse(_) => ErrorKind::MalformedResponse,
        }
    }

    /// The human-readable text without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            CarServiceError::InvalidInterval(message)
            | CarServiceError::Conflict(message)
            | CarServiceError::NotFound(message)
            | CarServiceError::Forbidden(message)
            | CarServiceError::AuthenticationFailed(message)
            | CarServiceError::NetworkFailure(message)
            | CarServiceError::ValidationFailure(message)
            | CarServiceError::InvalidState(message)
            | CarServiceError::MalformedResponse(message) => message,
            CarServiceError::Service { message, .. } => message,
        }
    }

    // Errors that are resolved before anything is sent over the wire
    pub fn is_local(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InvalidInterval | ErrorKind::ValidationFailure | ErrorKind::InvalidState
        )
    }
}
