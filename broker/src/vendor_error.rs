#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VendorErrorClass {
    AuthExpired,
    RateLimitExceeded,
    Other,
}

impl VendorErrorClass {
    pub fn is_retryable(self) -> bool {
        matches!(self, VendorErrorClass::AuthExpired | VendorErrorClass::RateLimitExceeded)
    }
}

/// Static vendor error code table. Codes are placeholders for the
/// documented values of whichever exchange's gateway is wired up; unknown
/// codes classify as `Other` (non-retryable, surfaced verbatim).
const AUTH_EXPIRED_CODES: &[&str] = &["EGW00121", "TOKEN_EXPIRED", "invalid_token"];
const RATE_LIMIT_CODES: &[&str] = &["EGW00201", "TOO_MANY_REQUESTS", "rate_limit_exceeded"];

/// Codes returned by the token endpoint itself that mean the credentials
/// are simply wrong, not that an existing token expired. Distinct from
/// `AUTH_EXPIRED_CODES` above, which apply to a regular API call made with
/// a token the vendor no longer honors.
const CREDENTIAL_INVALID_CODES: &[&str] = &["EGW00001", "invalid_client", "invalid_grant"];

pub fn classify(code: &str) -> VendorErrorClass {
    if AUTH_EXPIRED_CODES.contains(&code) {
        VendorErrorClass::AuthExpired
    } else if RATE_LIMIT_CODES.contains(&code) {
        VendorErrorClass::RateLimitExceeded
    } else {
        VendorErrorClass::Other
    }
}

pub fn is_credential_invalid(code: &str) -> bool {
    CREDENTIAL_INVALID_CODES.contains(&code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_classify_as_retryable() {
        assert!(classify("EGW00121").is_retryable());
        assert!(classify("TOO_MANY_REQUESTS").is_retryable());
    }

    #[test]
    fn unknown_codes_are_not_retryable() {
        assert!(!classify("INSUFFICIENT_BALANCE").is_retryable());
    }
}
