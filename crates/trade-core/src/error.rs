use thiserror::Error;

/// Gateway failures, classified so the caller can route on them instead of
/// inspecting status codes. Variants carry the backend's human-readable
/// `detail` message where one was returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Transport-level failure; no response arrived.
    #[error("network error: {0}")]
    Network(String),

    /// The backend rejected the bearer token. The stored session is dead.
    #[error("session expired or invalid")]
    Unauthorized,

    /// Login refused: wrong username or password.
    #[error("{0}")]
    InvalidCredentials(String),

    /// Registration refused: the username already exists.
    #[error("{0}")]
    UsernameTaken(String),

    /// The request payload failed backend validation.
    #[error("{0}")]
    Validation(String),

    /// Client-side guard: a draft without a positive whole-number quantity
    /// is never sent to the backend.
    #[error("quantity must be a positive whole number")]
    InvalidQuantity,

    /// Any other non-success response.
    #[error("request rejected ({status}): {reason}")]
    Rejected { status: u16, reason: String },
}

impl ApiError {
    /// True when the failure invalidates the stored session and the user
    /// must log in again.
    pub fn is_auth_expiry(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }

    /// Short notification text for this failure. Backend-supplied details
    /// pass through verbatim; transport failures get a canned message.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(_) => "Network error. Please try again.".to_string(),
            ApiError::Unauthorized => "Session expired. Please log in again.".to_string(),
            ApiError::InvalidCredentials(msg)
            | ApiError::UsernameTaken(msg)
            | ApiError::Validation(msg) => msg.clone(),
            ApiError::InvalidQuantity => "Please enter a valid quantity".to_string(),
            ApiError::Rejected { reason, .. } => reason.clone(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
