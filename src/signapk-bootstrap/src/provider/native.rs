//! Native Conscrypt provider.

use std::path::PathBuf;
use std::sync::Arc;

use super::{Capability, CryptoProvider, ProviderCandidate, ProviderKind};
use crate::error::BootstrapError;
use crate::native::NativeLoader;

/// Conscrypt, active once its JNI library is linked.
#[derive(Debug, Clone)]
pub struct NativeProvider {
    library: Option<PathBuf>,
}

impl NativeProvider {
    /// Path the native library was loaded from.
    pub fn library_path(&self) -> Option<&PathBuf> {
        self.library.as_ref()
    }
}

impl CryptoProvider for NativeProvider {
    fn name(&self) -> &str {
        NativeCandidate::NAME
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Native
    }

    fn capabilities(&self) -> &[Capability] {
        &Capability::ALL
    }
}

/// Registers Conscrypt if the loader manages to link it.
#[derive(Debug, Clone)]
pub struct NativeCandidate {
    loader: Arc<NativeLoader>,
}

impl NativeCandidate {
    /// Provider name.
    pub const NAME: &'static str = "Conscrypt";

    /// Candidate backed by `loader`.
    pub fn new(loader: Arc<NativeLoader>) -> Self {
        Self { loader }
    }
}

impl ProviderCandidate for NativeCandidate {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn priority(&self) -> u16 {
        0
    }

    fn register(&self) -> Result<Arc<dyn CryptoProvider>, BootstrapError> {
        if self.loader.load() {
            Ok(Arc::new(NativeProvider {
                library: self.loader.library_path(),
            }))
        } else {
            let reason = self
                .loader
                .failure()
                .unwrap_or_else(|| "native library not loaded".into());
            Err(BootstrapError::provider_unavailable(Self::NAME, reason))
        }
    }
}
