//! Pure verification checks for payment authorizations.
//!
//! Everything here is deterministic signature math and clock comparison; no
//! chain access. The replay-guard lookup lives behind
//! [`RelayerApi`](crate::relayer::RelayerApi) and must only run after
//! [`assert_signature`] has succeeded, so a forged `from` can never probe
//! another account's nonce state.

use alloy_primitives::{Address, Bytes, Signature};
use alloy_sol_types::Eip712Domain;
use b402::error::PaymentVerificationError;
use b402::proto::Authorization;
use b402::timestamp::UnixTimestamp;

use crate::eip712::authorization_signing_hash;

/// Recovers the signer address from an authorization and its signature.
///
/// # Errors
///
/// Returns [`PaymentVerificationError::InvalidSignature`] if the signature
/// is not a well-formed 65-byte ECDSA signature or recovery fails.
pub fn recover_payer(
    authorization: &Authorization,
    signature: &Bytes,
    domain: &Eip712Domain,
) -> Result<Address, PaymentVerificationError> {
    let hash = authorization_signing_hash(authorization, domain);
    let signature =
        Signature::from_raw(signature).map_err(|_| PaymentVerificationError::InvalidSignature)?;
    signature
        .normalized_s()
        .recover_address_from_prehash(&hash)
        .map_err(|_| PaymentVerificationError::InvalidSignature)
}

/// Verifies that the signature recovers to `authorization.from`.
///
/// Address comparison is case-insensitive by construction: both sides are
/// parsed 20-byte values.
///
/// # Errors
///
/// Returns [`PaymentVerificationError::InvalidSignature`] on malformed
/// signatures and on recovered-address mismatch alike; the two cases are
/// indistinguishable on the wire by design.
pub fn assert_signature(
    authorization: &Authorization,
    signature: &Bytes,
    domain: &Eip712Domain,
) -> Result<Address, PaymentVerificationError> {
    let recovered = recover_payer(authorization, signature, domain)?;
    if recovered == authorization.from {
        Ok(recovered)
    } else {
        Err(PaymentVerificationError::InvalidSignature)
    }
}

/// Validates the authorization window against the current clock.
///
/// # Errors
///
/// Returns [`PaymentVerificationError::Early`] or
/// [`PaymentVerificationError::Expired`] outside `[validAfter, validBefore)`.
pub fn assert_time(
    valid_after: UnixTimestamp,
    valid_before: UnixTimestamp,
) -> Result<(), PaymentVerificationError> {
    assert_time_at(UnixTimestamp::now(), valid_after, valid_before)
}

/// Validates the authorization window against an explicit `now`.
///
/// The interval is half-open: `now == valid_after` is valid,
/// `now == valid_before` is expired.
///
/// # Errors
///
/// Returns [`PaymentVerificationError::Early`] or
/// [`PaymentVerificationError::Expired`] outside the window.
pub fn assert_time_at(
    now: UnixTimestamp,
    valid_after: UnixTimestamp,
    valid_before: UnixTimestamp,
) -> Result<(), PaymentVerificationError> {
    if now < valid_after {
        return Err(PaymentVerificationError::Early);
    }
    if now >= valid_before {
        return Err(PaymentVerificationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{B256, U256, address};
    use alloy_signer::SignerSync;
    use alloy_signer_local::PrivateKeySigner;
    use b402::proto::TokenAmount;

    use crate::eip712::b402_domain;

    fn authorization_for(signer: &PrivateKeySigner) -> Authorization {
        Authorization {
            from: signer.address(),
            to: address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8"),
            value: TokenAmount(U256::from(10u64).pow(U256::from(18u64))),
            valid_after: UnixTimestamp::from_secs(1_700_000_000),
            valid_before: UnixTimestamp::from_secs(1_700_003_600),
            nonce: B256::repeat_byte(0x11),
        }
    }

    fn sign(authorization: &Authorization, signer: &PrivateKeySigner, domain: &Eip712Domain) -> Bytes {
        let hash = authorization_signing_hash(authorization, domain);
        let signature = signer.sign_hash_sync(&hash).unwrap();
        signature.as_bytes().to_vec().into()
    }

    #[test]
    fn test_valid_signature_recovers_payer() {
        let signer = PrivateKeySigner::random();
        let domain = b402_domain(97, address!("0x5FbDB2315678afecb367f032d93F642f64180aa3"));
        let authorization = authorization_for(&signer);
        let signature = sign(&authorization, &signer, &domain);

        let payer = assert_signature(&authorization, &signature, &domain).unwrap();
        assert_eq!(payer, signer.address());
    }

    #[test]
    fn test_wrong_signer_is_rejected() {
        let signer = PrivateKeySigner::random();
        let impostor = PrivateKeySigner::random();
        let domain = b402_domain(97, address!("0x5FbDB2315678afecb367f032d93F642f64180aa3"));
        let authorization = authorization_for(&signer);
        let signature = sign(&authorization, &impostor, &domain);

        assert_eq!(
            assert_signature(&authorization, &signature, &domain),
            Err(PaymentVerificationError::InvalidSignature)
        );
    }

    #[test]
    fn test_signature_does_not_transfer_across_domains() {
        let signer = PrivateKeySigner::random();
        let relayer = address!("0x5FbDB2315678afecb367f032d93F642f64180aa3");
        let authorization = authorization_for(&signer);
        let signature = sign(&authorization, &signer, &b402_domain(97, relayer));

        // Same bytes verified under the mainnet domain must not recover `from`.
        assert_eq!(
            assert_signature(&authorization, &signature, &b402_domain(56, relayer)),
            Err(PaymentVerificationError::InvalidSignature)
        );
    }

    #[test]
    fn test_tampered_authorization_is_rejected() {
        let signer = PrivateKeySigner::random();
        let domain = b402_domain(97, address!("0x5FbDB2315678afecb367f032d93F642f64180aa3"));
        let authorization = authorization_for(&signer);
        let signature = sign(&authorization, &signer, &domain);

        let mut tampered = authorization;
        tampered.value = TokenAmount::from(2u64);
        assert_eq!(
            assert_signature(&tampered, &signature, &domain),
            Err(PaymentVerificationError::InvalidSignature)
        );
    }

    #[test]
    fn test_malformed_signature_bytes() {
        let signer = PrivateKeySigner::random();
        let domain = b402_domain(97, address!("0x5FbDB2315678afecb367f032d93F642f64180aa3"));
        let authorization = authorization_for(&signer);

        assert_eq!(
            assert_signature(&authorization, &Bytes::from_static(&[0xab; 12]), &domain),
            Err(PaymentVerificationError::InvalidSignature)
        );
    }

    #[test]
    fn test_time_window_boundaries() {
        let after = UnixTimestamp::from_secs(1000);
        let before = UnixTimestamp::from_secs(2000);

        assert_eq!(
            assert_time_at(UnixTimestamp::from_secs(999), after, before),
            Err(PaymentVerificationError::Early)
        );
        // Both ends are exact: validAfter itself is in the window,
        // validBefore itself is not.
        assert_eq!(assert_time_at(after, after, before), Ok(()));
        assert_eq!(
            assert_time_at(UnixTimestamp::from_secs(1999), after, before),
            Ok(())
        );
        assert_eq!(
            assert_time_at(before, after, before),
            Err(PaymentVerificationError::Expired)
        );
        assert_eq!(
            assert_time_at(UnixTimestamp::from_secs(3000), after, before),
            Err(PaymentVerificationError::Expired)
        );
    }
}
