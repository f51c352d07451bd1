use serde_json::Value;
use thiserror::Error;

/// Uniform failure shape produced by the API gateway
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// HTTP 401. The session has already been cleared when this is returned.
    #[error("{message}")]
    AuthRequired { message: String },

    /// 4xx responses, or a request rejected before it was sent (no status)
    #[error("{message}")]
    ValidationFailed {
        status: Option<u16>,
        message: String,
        details: Option<Value>,
    },

    /// 5xx responses
    #[error("{message}")]
    Server {
        status: u16,
        message: String,
        details: Option<Value>,
    },

    #[error("Network error: {message}")]
    NetworkUnreachable { message: String },

    /// A success body that does not match the expected shape
    #[error("Invalid response from server: {message}")]
    InvalidResponse {
        message: String,
        details: Option<Value>,
    },

    #[error("An unexpected error occurred: {message}")]
    Unexpected { message: String },
}

impl ApiError {
    /// Reject a request on the client side, before any network traffic
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            status: None,
            message: message.into(),
            details: None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::AuthRequired { message }
            | Self::ValidationFailed { message, .. }
            | Self::Server { message, .. }
            | Self::NetworkUnreachable { message }
            | Self::InvalidResponse { message, .. }
            | Self::Unexpected { message } => message,
        }
    }

    /// HTTP status that produced the error, if there was a response at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::AuthRequired { .. } => Some(401),
            Self::ValidationFailed { status, .. } => *status,
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn details(&self) -> Option<&Value> {
        match self {
            Self::ValidationFailed { details, .. }
            | Self::Server { details, .. }
            | Self::InvalidResponse { details, .. } => details.as_ref(),
            _ => None,
        }
    }

    pub fn is_auth_required(&self) -> bool {
        matches!(self, Self::AuthRequired { .. })
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Self::NetworkUnreachable { .. })
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::ValidationFailed {
            status: None,
            message: errors.to_string(),
            details: serde_json::to_value(&errors).ok(),
        }
    }
}

/// Failure reading or writing persisted session slots
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored session is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No storage location available: {0}")]
    Unavailable(String),
}

/// Failures of the session store operations
#[derive(Error, Debug)]
pub enum SessionError {
    /// Login rejected, or the profile fetch after login failed
    #[error("{0}")]
    Auth(#[source] ApiError),

    /// Registration rejected, or the automatic login that follows it failed
    #[error("{0}")]
    Registration(#[source] ApiError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Another session change landed while this operation was in flight
    #[error("Session changed while the operation was in progress")]
    Superseded,

    #[error("Session store has been disposed")]
    Disposed,
}

impl SessionError {
    /// The gateway error underneath, when there is one
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Auth(err) | Self::Registration(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accessors() {
        let err = ApiError::ValidationFailed {
            status: Some(400),
            message: "Email or username already registered".to_string(),
            details: Some(json!({"detail": "Email or username already registered"})),
        };
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.message(), "Email or username already registered");
        assert_eq!(err.to_string(), "Email or username already registered");
        assert!(err.details().is_some());

        let auth = ApiError::AuthRequired {
            message: "Authentication required".to_string(),
        };
        assert_eq!(auth.status(), Some(401));
        assert!(auth.is_auth_required());

        let network = ApiError::NetworkUnreachable {
            message: "connection refused".to_string(),
        };
        assert_eq!(network.status(), None);
        assert!(network.is_network());
        assert!(network.to_string().starts_with("Network error"));
    }

    #[test]
    fn test_session_error_keeps_backend_message() {
        let err = SessionError::Auth(ApiError::AuthRequired {
            message: "Incorrect email or password".to_string(),
        });
        assert_eq!(err.to_string(), "Incorrect email or password");
        assert!(err.api_error().is_some());
        assert!(SessionError::Disposed.api_error().is_none());
    }
}
