//! Shared fixtures for integration tests.
//!
//! RSA generation is slow in debug builds, so each key pair is generated once
//! per test binary and copied into per-test temp directories as PEM.

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use licensor::{KeyStore, LicenseManager, ManagerConfig, RsaPkcs1Sha256};
use tempfile::TempDir;

pub struct PemPair {
    pub private: String,
    pub public: String,
}

fn generate_pem() -> PemPair {
    let store = KeyStore::<RsaPkcs1Sha256>::default();
    let pair = store
        .generate_key_pair(2048)
        .expect("failed to generate key pair");
    PemPair {
        private: store
            .private_key_to_pem(&pair.private_key)
            .expect("failed to armor private key"),
        public: store
            .public_key_to_pem(&pair.public_key)
            .expect("failed to armor public key"),
    }
}

/// The primary test key pair.
pub fn rsa_pem() -> &'static PemPair {
    static PAIR: OnceLock<PemPair> = OnceLock::new();
    PAIR.get_or_init(generate_pem)
}

/// An unrelated key pair, for mismatch tests.
pub fn other_rsa_pem() -> &'static PemPair {
    static PAIR: OnceLock<PemPair> = OnceLock::new();
    PAIR.get_or_init(generate_pem)
}

/// Write `pair` as `private.pem` / `public.pem` into `dir`.
pub fn install_keys(dir: &Path, pair: &PemPair) {
    fs::write(dir.join("private.pem"), &pair.private).expect("failed to write private key");
    fs::write(dir.join("public.pem"), &pair.public).expect("failed to write public key");
}

/// A manager over a fresh temp dir holding the primary key pair.
pub fn manager_with_keys() -> (TempDir, LicenseManager) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    install_keys(dir.path(), rsa_pem());
    let manager = LicenseManager::new(ManagerConfig::new(dir.path()));
    (dir, manager)
}
