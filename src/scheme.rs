//! Signature schemes used to sign license payloads.
//!
//! A scheme bundles key generation, signing, verification and the DER
//! encodings of its keys. [`crate::manager::LicenseManager`] only talks to
//! this trait, so switching from RSA to Ed25519 does not touch license logic.
//!
//! # Schemes
//!
//! - [`RsaPkcs1Sha256`] (default): SHA-256 digest, PKCS#1 v1.5 signature.
//!   Private keys are PKCS#1 DER, public keys are SubjectPublicKeyInfo DER.
//! - `Ed25519Scheme` (feature `ed25519`): PKCS#8 private keys, SPKI public keys.

use rand::rngs::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey};
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey, ObjectIdentifier, SubjectPublicKeyInfoRef};
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};

use crate::errors::{LicenseError, LicenseResult};

/// Smallest RSA modulus accepted for new keys.
pub const MIN_RSA_BITS: usize = 2048;

/// Default RSA modulus size.
pub const DEFAULT_KEY_BITS: usize = 2048;

/// rsaEncryption (RFC 8017).
const RSA_ENCRYPTION_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");

/// A freshly generated private/public key pair.
pub struct KeyPair<S: SignatureScheme + ?Sized> {
    pub private_key: S::PrivateKey,
    pub public_key: S::PublicKey,
}

/// Capability interface for an asymmetric signature scheme.
pub trait SignatureScheme {
    type PrivateKey;
    type PublicKey;

    /// Short name used in configuration (`"rsa"`, `"ed25519"`).
    const NAME: &'static str;
    /// Armor label for private key files.
    const PRIVATE_KEY_LABEL: &'static str;
    /// Armor label for public key files.
    const PUBLIC_KEY_LABEL: &'static str;

    /// Generate a new key pair. `bits` is the modulus size where the scheme has one.
    fn generate(&self, bits: usize) -> LicenseResult<KeyPair<Self>>;

    /// Sign `payload`, returning the raw signature bytes.
    fn sign(&self, key: &Self::PrivateKey, payload: &[u8]) -> LicenseResult<Vec<u8>>;

    /// Check `signature` over `payload`.
    ///
    /// Every mismatch is reported as [`LicenseError::SignatureInvalid`].
    fn verify(&self, key: &Self::PublicKey, payload: &[u8], signature: &[u8]) -> LicenseResult<()>;

    fn encode_private_key(&self, key: &Self::PrivateKey) -> LicenseResult<Vec<u8>>;
    fn decode_private_key(&self, der: &[u8]) -> LicenseResult<Self::PrivateKey>;
    fn encode_public_key(&self, key: &Self::PublicKey) -> LicenseResult<Vec<u8>>;
    fn decode_public_key(&self, der: &[u8]) -> LicenseResult<Self::PublicKey>;
}

/// Parse a SubjectPublicKeyInfo and make sure it carries the expected algorithm.
fn check_spki_algorithm(der: &[u8], expected: ObjectIdentifier, scheme: &str) -> LicenseResult<()> {
    let spki = SubjectPublicKeyInfoRef::try_from(der)
        .map_err(|e| LicenseError::KeyFormatError(format!("invalid public key DER: {e}")))?;

    if spki.algorithm.oid != expected {
        return Err(LicenseError::KeyTypeError(format!(
            "expected {scheme} public key, found algorithm {}",
            spki.algorithm.oid
        )));
    }
    Ok(())
}

// ============================================================================
// RSA PKCS#1 v1.5 + SHA-256
// ============================================================================

/// RSA signatures over a SHA-256 digest with PKCS#1 v1.5 padding.
#[derive(Debug, Clone, Copy, Default)]
pub struct RsaPkcs1Sha256;

impl SignatureScheme for RsaPkcs1Sha256 {
    type PrivateKey = RsaPrivateKey;
    type PublicKey = RsaPublicKey;

    const NAME: &'static str = "rsa";
    const PRIVATE_KEY_LABEL: &'static str = "RSA PRIVATE KEY";
    const PUBLIC_KEY_LABEL: &'static str = "RSA PUBLIC KEY";

    fn generate(&self, bits: usize) -> LicenseResult<KeyPair<Self>> {
        if bits < MIN_RSA_BITS {
            return Err(LicenseError::KeyGenerationError(format!(
                "RSA modulus must be at least {MIN_RSA_BITS} bits, got {bits}"
            )));
        }

        let private_key = RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|e| LicenseError::KeyGenerationError(e.to_string()))?;
        let public_key = RsaPublicKey::from(&private_key);

        Ok(KeyPair {
            private_key,
            public_key,
        })
    }

    fn sign(&self, key: &RsaPrivateKey, payload: &[u8]) -> LicenseResult<Vec<u8>> {
        let digest = Sha256::digest(payload);
        key.sign_with_rng(&mut OsRng, Pkcs1v15Sign::new::<Sha256>(), &digest)
            .map_err(|e| LicenseError::SigningError(e.to_string()))
    }

    fn verify(&self, key: &RsaPublicKey, payload: &[u8], signature: &[u8]) -> LicenseResult<()> {
        let digest = Sha256::digest(payload);
        key.verify(Pkcs1v15Sign::new::<Sha256>(), &digest, signature)
            .map_err(|_| LicenseError::SignatureInvalid)
    }

    fn encode_private_key(&self, key: &RsaPrivateKey) -> LicenseResult<Vec<u8>> {
        let doc = key
            .to_pkcs1_der()
            .map_err(|e| LicenseError::KeyFormatError(format!("PKCS#1 encoding failed: {e}")))?;
        Ok(doc.as_bytes().to_vec())
    }

    fn decode_private_key(&self, der: &[u8]) -> LicenseResult<RsaPrivateKey> {
        RsaPrivateKey::from_pkcs1_der(der)
            .map_err(|e| LicenseError::KeyFormatError(format!("invalid PKCS#1 private key: {e}")))
    }

    fn encode_public_key(&self, key: &RsaPublicKey) -> LicenseResult<Vec<u8>> {
        let doc = key
            .to_public_key_der()
            .map_err(|e| LicenseError::KeyFormatError(format!("SPKI encoding failed: {e}")))?;
        Ok(doc.as_bytes().to_vec())
    }

    fn decode_public_key(&self, der: &[u8]) -> LicenseResult<RsaPublicKey> {
        check_spki_algorithm(der, RSA_ENCRYPTION_OID, Self::NAME)?;
        RsaPublicKey::from_public_key_der(der)
            .map_err(|e| LicenseError::KeyFormatError(format!("invalid RSA public key: {e}")))
    }
}

// ============================================================================
// Ed25519
// ============================================================================

#[cfg(feature = "ed25519")]
pub use self::ed25519::Ed25519Scheme;

#[cfg(feature = "ed25519")]
mod ed25519 {
    use ed25519_dalek::pkcs8::{
        DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey,
    };
    use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
    use rand::rngs::OsRng;
    use rsa::pkcs8::ObjectIdentifier;

    use super::{check_spki_algorithm, KeyPair, SignatureScheme};
    use crate::errors::{LicenseError, LicenseResult};

    /// id-Ed25519 (RFC 8410).
    const ED25519_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.112");

    /// Ed25519 signatures. Keys have a fixed size, so `bits` is ignored.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct Ed25519Scheme;

    impl SignatureScheme for Ed25519Scheme {
        type PrivateKey = SigningKey;
        type PublicKey = VerifyingKey;

        const NAME: &'static str = "ed25519";
        const PRIVATE_KEY_LABEL: &'static str = "PRIVATE KEY";
        const PUBLIC_KEY_LABEL: &'static str = "PUBLIC KEY";

        fn generate(&self, _bits: usize) -> LicenseResult<KeyPair<Self>> {
            let private_key = SigningKey::generate(&mut OsRng);
            let public_key = private_key.verifying_key();
            Ok(KeyPair {
                private_key,
                public_key,
            })
        }

        fn sign(&self, key: &SigningKey, payload: &[u8]) -> LicenseResult<Vec<u8>> {
            let signature = key
                .try_sign(payload)
                .map_err(|e| LicenseError::SigningError(e.to_string()))?;
            Ok(signature.to_bytes().to_vec())
        }

        fn verify(
            &self,
            key: &VerifyingKey,
            payload: &[u8],
            signature: &[u8],
        ) -> LicenseResult<()> {
            let signature =
                Signature::from_slice(signature).map_err(|_| LicenseError::SignatureInvalid)?;
            key.verify(payload, &signature)
                .map_err(|_| LicenseError::SignatureInvalid)
        }

        fn encode_private_key(&self, key: &SigningKey) -> LicenseResult<Vec<u8>> {
            let doc = key
                .to_pkcs8_der()
                .map_err(|e| LicenseError::KeyFormatError(format!("PKCS#8 encoding failed: {e}")))?;
            Ok(doc.as_bytes().to_vec())
        }

        fn decode_private_key(&self, der: &[u8]) -> LicenseResult<SigningKey> {
            SigningKey::from_pkcs8_der(der).map_err(|e| {
                LicenseError::KeyFormatError(format!("invalid Ed25519 private key: {e}"))
            })
        }

        fn encode_public_key(&self, key: &VerifyingKey) -> LicenseResult<Vec<u8>> {
            let doc = key
                .to_public_key_der()
                .map_err(|e| LicenseError::KeyFormatError(format!("SPKI encoding failed: {e}")))?;
            Ok(doc.as_bytes().to_vec())
        }

        fn decode_public_key(&self, der: &[u8]) -> LicenseResult<VerifyingKey> {
            check_spki_algorithm(der, ED25519_OID, Self::NAME)?;
            VerifyingKey::from_public_key_der(der).map_err(|e| {
                LicenseError::KeyFormatError(format!("invalid Ed25519 public key: {e}"))
            })
        }
    }
}
