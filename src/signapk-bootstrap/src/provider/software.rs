//! Pure-Rust secondary provider.
//!
//! Built on the RustCrypto stack, so it works on every platform the crate
//! compiles for. Registration runs a small self test first: a provider that
//! cannot sign and verify its own fixed message must not become active.

use std::sync::Arc;

use ed25519_dalek::{Signer as _, Verifier as _};
use p256::ecdsa::signature::{Signer as _, Verifier as _};
use sha2::{Digest, Sha256, Sha512};

use super::{Capability, CryptoProvider, ProviderCandidate, ProviderKind, SHA256_ABC};
use crate::error::BootstrapError;

const CAPABILITIES: [Capability; 4] = [
    Capability::Sha256,
    Capability::Sha512,
    Capability::EcdsaP256,
    Capability::Ed25519,
];

const SELF_TEST_MESSAGE: &[u8] = b"signapk provider self test";

/// RustCrypto-backed provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftwareProvider;

impl SoftwareProvider {
    /// Provider name.
    pub const NAME: &'static str = "RustCrypto";

    /// Run the known-answer and sign/verify self test.
    ///
    /// # Errors
    ///
    /// Returns a description of the first check that failed.
    pub fn self_test() -> Result<(), String> {
        if Sha256::digest(b"abc").as_slice() != SHA256_ABC {
            return Err("SHA-256 known-answer test failed".into());
        }
        if Sha512::digest(b"abc")[..4] != [0xdd, 0xaf, 0x35, 0xa1] {
            return Err("SHA-512 known-answer test failed".into());
        }

        // Fixed scalars: the test must be deterministic.
        let p256_key = p256::ecdsa::SigningKey::from_slice(&[0x5Au8; 32])
            .map_err(|e| format!("P-256 key: {e}"))?;
        let p256_sig: p256::ecdsa::Signature = p256_key.sign(SELF_TEST_MESSAGE);
        p256_key
            .verifying_key()
            .verify(SELF_TEST_MESSAGE, &p256_sig)
            .map_err(|e| format!("P-256 verify: {e}"))?;

        let ed_key = ed25519_dalek::SigningKey::from_bytes(&[0x3Cu8; 32]);
        let ed_sig = ed_key.sign(SELF_TEST_MESSAGE);
        ed_key
            .verifying_key()
            .verify(SELF_TEST_MESSAGE, &ed_sig)
            .map_err(|e| format!("Ed25519 verify: {e}"))?;

        Ok(())
    }
}

impl CryptoProvider for SoftwareProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Software
    }

    fn capabilities(&self) -> &[Capability] {
        &CAPABILITIES
    }
}

/// Registers [`SoftwareProvider`] after its self test passes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftwareCandidate;

impl ProviderCandidate for SoftwareCandidate {
    fn name(&self) -> &str {
        SoftwareProvider::NAME
    }

    fn priority(&self) -> u16 {
        10
    }

    fn register(&self) -> Result<Arc<dyn CryptoProvider>, BootstrapError> {
        SoftwareProvider::self_test()
            .map_err(|reason| BootstrapError::provider_unavailable(SoftwareProvider::NAME, reason))?;
        tracing::debug!("SoftwareProvider: self test passed");
        Ok(Arc::new(SoftwareProvider))
    }
}
