/// Classification used across component boundaries to decide retry
/// behavior (spec §7). Each crate keeps its own `thiserror` error type for
/// the errors it can actually produce; this tag is how those types report
/// which bucket a given failure falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Auth,
    RateLimit,
    Network,
    RequestError,
    OrderError,
    Internal,
}

impl ErrorKind {
    /// Transport errors, vendor-auth-expired codes, and rate-limit-exceeded
    /// codes are retryable with exponential backoff; everything else is not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Auth | ErrorKind::RateLimit | ErrorKind::Network)
    }
}
