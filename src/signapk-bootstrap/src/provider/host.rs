//! Host default provider.
//!
//! The last resort. Digests are always available, so this candidate always
//! registers; signature schemes are left to higher layers to demand.

use std::sync::Arc;

use sha2::{Digest, Sha256};

use super::{Capability, CryptoProvider, ProviderCandidate, ProviderKind, SHA256_ABC};
use crate::error::BootstrapError;

const CAPABILITIES: [Capability; 2] = [Capability::Sha256, Capability::Sha512];

/// Digest-only provider that is always present.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostDefaultProvider;

impl HostDefaultProvider {
    /// Provider name.
    pub const NAME: &'static str = "HostDefault";

    /// Priority in the fallback chain.
    pub const PRIORITY: u16 = 100;
}

impl CryptoProvider for HostDefaultProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::HostDefault
    }

    fn capabilities(&self) -> &[Capability] {
        &CAPABILITIES
    }
}

impl ProviderCandidate for HostDefaultProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn priority(&self) -> u16 {
        Self::PRIORITY
    }

    fn register(&self) -> Result<Arc<dyn CryptoProvider>, BootstrapError> {
        let digest = Sha256::digest(b"abc");
        if digest.as_slice() != SHA256_ABC {
            return Err(BootstrapError::provider_unavailable(
                Self::NAME,
                "SHA-256 known-answer test failed",
            ));
        }
        Ok(Arc::new(*self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_always_registers() {
        let provider = HostDefaultProvider.register().unwrap();
        assert_eq!(provider.kind(), ProviderKind::HostDefault);
        assert!(provider.supports(Capability::Sha256));
        assert!(!provider.supports(Capability::EcdsaP256));
    }
}
