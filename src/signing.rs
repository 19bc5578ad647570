//! Signing and verifying licenses.
//!
//! The signed bytes are the compact JSON encoding of the license with its
//! `signature` field set to the empty string, produced by
//! [`crate::encoding::to_compact_vec`]. [`canonical_payload`] builds
//! that encoding from a copy, so the license passed in is never modified and
//! cannot be left half-cleared if encoding fails.

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;

use crate::encoding::to_compact_vec;
use crate::errors::{LicenseError, LicenseResult};
use crate::license::License;
use crate::scheme::SignatureScheme;

/// Exact bytes covered by a license signature.
pub fn canonical_payload(license: &License) -> LicenseResult<Vec<u8>> {
    let mut unsigned = license.clone();
    unsigned.signature.clear();
    to_compact_vec(&unsigned)
}

/// Sign `license` and return the base64 signature. The license is not modified.
pub fn sign_license<S: SignatureScheme>(
    scheme: &S,
    key: &S::PrivateKey,
    license: &License,
) -> LicenseResult<String> {
    let payload = canonical_payload(license)?;
    let signature = scheme.sign(key, &payload)?;
    Ok(B64.encode(signature))
}

/// Check the signature attached to `license`.
///
/// Undecodable base64, an empty signature and a cryptographic mismatch all
/// yield [`LicenseError::SignatureInvalid`].
pub fn verify_license_signature<S: SignatureScheme>(
    scheme: &S,
    key: &S::PublicKey,
    license: &License,
) -> LicenseResult<()> {
    let signature = B64
        .decode(license.signature.as_bytes())
        .map_err(|_| LicenseError::SignatureInvalid)?;
    if signature.is_empty() {
        return Err(LicenseError::SignatureInvalid);
    }

    let payload = canonical_payload(license)?;
    scheme.verify(key, &payload, &signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::license::LicenseLevel;
    use crate::scheme::{KeyPair, RsaPkcs1Sha256, DEFAULT_KEY_BITS};
    use std::sync::OnceLock;

    fn keys() -> &'static KeyPair<RsaPkcs1Sha256> {
        static PAIR: OnceLock<KeyPair<RsaPkcs1Sha256>> = OnceLock::new();
        PAIR.get_or_init(|| RsaPkcs1Sha256.generate(DEFAULT_KEY_BITS).unwrap())
    }

    fn signed_license() -> License {
        let mut license = License::new("alice", "dev-1", LicenseLevel::Basic, 30).unwrap();
        license.signature = sign_license(&RsaPkcs1Sha256, &keys().private_key, &license).unwrap();
        license
    }

    #[test]
    fn payload_ignores_signature_and_leaves_input_untouched() {
        let license = signed_license();
        let original_signature = license.signature.clone();

        let mut stripped = license.clone();
        stripped.signature = String::new();

        assert_eq!(
            canonical_payload(&license).unwrap(),
            canonical_payload(&stripped).unwrap()
        );
        assert_eq!(license.signature, original_signature);
    }

    #[test]
    fn payload_is_compact_json_with_empty_signature() {
        let license = signed_license();
        let payload = String::from_utf8(canonical_payload(&license).unwrap()).unwrap();

        assert!(payload.starts_with("{\"id\":"));
        assert!(payload.contains("\"signature\":\"\""));
        assert!(!payload.contains('\n'));
    }

    #[test]
    fn signed_license_verifies() {
        let license = signed_license();
        verify_license_signature(&RsaPkcs1Sha256, &keys().public_key, &license)
            .expect("fresh signature should verify");
    }

    #[test]
    fn garbage_signatures_are_signature_invalid() {
        let mut license = signed_license();

        license.signature = "%%% not base64 %%%".to_string();
        let result = verify_license_signature(&RsaPkcs1Sha256, &keys().public_key, &license);
        assert!(matches!(result, Err(LicenseError::SignatureInvalid)));

        license.signature = String::new();
        let result = verify_license_signature(&RsaPkcs1Sha256, &keys().public_key, &license);
        assert!(matches!(result, Err(LicenseError::SignatureInvalid)));
    }

    #[test]
    fn edited_expiry_is_detected() {
        let mut license = signed_license();
        license.expires_at = license.expires_at + chrono::Duration::days(365);

        let result = verify_license_signature(&RsaPkcs1Sha256, &keys().public_key, &license);
        assert!(matches!(result, Err(LicenseError::SignatureInvalid)));
    }
}
