//! Crypto providers and the fallback chain.
//!
//! Candidates, in priority order:
//! - Native: Conscrypt, backed by the bundled BoringSSL JNI library
//! - Software: pure-Rust RustCrypto implementations
//! - Host default: whatever digests the host always has

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::BootstrapError;

mod chain;
mod host;
mod native;

#[cfg(feature = "software")]
mod software;

pub use chain::{ProviderChain, ProviderRegistration, ProviderStatus};
pub use host::HostDefaultProvider;
pub use native::{NativeCandidate, NativeProvider};

#[cfg(feature = "software")]
pub use software::{SoftwareCandidate, SoftwareProvider};

/// SHA-256("abc"), FIPS 180-2 appendix B.1.
pub(crate) const SHA256_ABC: [u8; 32] = [
    0xba, 0x78, 0x16, 0xbf, 0x8f, 0x01, 0xcf, 0xea, 0x41, 0x41, 0x40, 0xde, 0x5d, 0xae, 0x22, 0x23,
    0xb0, 0x03, 0x61, 0xa3, 0x96, 0x17, 0x7a, 0x9c, 0xb4, 0x10, 0xff, 0x61, 0xf2, 0x00, 0x15, 0xad,
];

/// Cryptographic capability a provider may offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    /// SHA-256 message digest.
    Sha256,
    /// SHA-512 message digest.
    Sha512,
    /// ECDSA over NIST P-256.
    EcdsaP256,
    /// Ed25519 signatures.
    Ed25519,
    /// RSA PKCS#1 v1.5 signatures.
    RsaPkcs1,
}

impl Capability {
    /// Every known capability.
    pub const ALL: [Capability; 5] = [
        Self::Sha256,
        Self::Sha512,
        Self::EcdsaP256,
        Self::Ed25519,
        Self::RsaPkcs1,
    ];

    /// Canonical name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha-256",
            Self::Sha512 => "sha-512",
            Self::EcdsaP256 => "ecdsa-p256",
            Self::Ed25519 => "ed25519",
            Self::RsaPkcs1 => "rsa-pkcs1",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|cap| cap.as_str() == wanted || cap.as_str().replace('-', "") == wanted)
            .ok_or_else(|| format!("unknown capability: {s}"))
    }
}

/// How a provider is implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Backed by a platform-specific compiled library.
    Native,
    /// Portable, pure-Rust implementation.
    Software,
    /// Host default providers.
    HostDefault,
}

/// An active cryptographic provider.
pub trait CryptoProvider: Send + Sync + fmt::Debug {
    /// Provider name, e.g. `Conscrypt`.
    fn name(&self) -> &str;

    /// How the provider is implemented.
    fn kind(&self) -> ProviderKind;

    /// Capabilities this provider offers.
    fn capabilities(&self) -> &[Capability];

    /// Check a single capability.
    fn supports(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

/// Something the fallback chain can try to register.
pub trait ProviderCandidate: Send + Sync {
    /// Provider name.
    fn name(&self) -> &str;

    /// Lower priorities are tried first.
    fn priority(&self) -> u16;

    /// Try to bring the provider up.
    ///
    /// # Errors
    ///
    /// Any error means "skip me"; the chain moves to the next candidate.
    fn register(&self) -> Result<Arc<dyn CryptoProvider>, BootstrapError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_parse() {
        assert_eq!("sha-256".parse::<Capability>(), Ok(Capability::Sha256));
        assert_eq!("SHA256".parse::<Capability>(), Ok(Capability::Sha256));
        assert_eq!("ed25519".parse::<Capability>(), Ok(Capability::Ed25519));
        assert!("md5".parse::<Capability>().is_err());
    }
}
