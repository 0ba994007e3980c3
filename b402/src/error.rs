//! Error taxonomy for B402 payment verification.
//!
//! These are business rejections, not system failures: the facilitator
//! reports them as `isValid: false` / `success: false` payloads with the
//! Display string as the wire reason, and never as HTTP errors.

/// Reasons a payment authorization fails verification.
///
/// The Display strings are the wire-level `invalidReason` values and must
/// stay stable; clients match on them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaymentVerificationError {
    /// The request body is structurally invalid (missing or malformed fields).
    #[error("{0}")]
    InvalidFormat(String),
    /// The signature does not recover to `authorization.from`.
    #[error("Invalid signature")]
    InvalidSignature,
    /// The authorization's `validAfter` timestamp is still in the future.
    #[error("Authorization not yet valid")]
    Early,
    /// The authorization's `validBefore` timestamp has passed.
    #[error("Authorization expired")]
    Expired,
    /// The `(from, nonce)` pair is already consumed on-chain.
    #[error("Nonce already used")]
    NonceAlreadyUsed,
}

impl From<serde_json::Error> for PaymentVerificationError {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidFormat(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_reasons_are_stable() {
        assert_eq!(
            PaymentVerificationError::InvalidSignature.to_string(),
            "Invalid signature"
        );
        assert_eq!(
            PaymentVerificationError::Early.to_string(),
            "Authorization not yet valid"
        );
        assert_eq!(
            PaymentVerificationError::Expired.to_string(),
            "Authorization expired"
        );
        assert_eq!(
            PaymentVerificationError::NonceAlreadyUsed.to_string(),
            "Nonce already used"
        );
    }
}
