use domain::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum BrokerError {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("rate limit wait timed out")]
    RateLimit,
    #[error("vendor rejected request, code={code}: {message}")]
    RequestError { code: String, message: String },
    #[error("order outcome ambiguous or rejected: {0}")]
    OrderError(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl BrokerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BrokerError::Auth(_) => ErrorKind::Auth,
            BrokerError::Network(_) => ErrorKind::Network,
            BrokerError::RateLimit => ErrorKind::RateLimit,
            BrokerError::RequestError { .. } => ErrorKind::RequestError,
            BrokerError::OrderError(_) => ErrorKind::OrderError,
            BrokerError::Validation(_) => ErrorKind::Validation,
            BrokerError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Transport errors, vendor-auth-expired, and rate-limit-exceeded are
    /// retryable with backoff; everything else (including `Auth`, which
    /// here always means a genuine credential failure) is not.
    pub fn is_retryable(&self) -> bool {
        match self {
            BrokerError::Network(_) | BrokerError::RateLimit => true,
            BrokerError::RequestError { code, .. } => crate::vendor_error::classify(code).is_retryable(),
            _ => false,
        }
    }

    /// Whether this error indicates the cached token should be dropped
    /// before the next retry attempt.
    pub fn invalidates_token(&self) -> bool {
        matches!(
            self,
            BrokerError::RequestError { code, .. }
                if crate::vendor_error::classify(code) == crate::vendor_error::VendorErrorClass::AuthExpired
        )
    }
}
