//! Error types for provider bootstrap.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::provider::Capability;

/// Errors that can occur while bootstrapping a crypto provider.
///
/// Only [`BootstrapError::DirectoryUnwritable`] and
/// [`BootstrapError::CapabilityUnavailable`] are fatal. The native-loading
/// categories are absorbed by the loader and turned into a fallback.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The host platform has no bundled native library.
    #[error("Unsupported platform for native library: {os} / {arch}")]
    UnsupportedPlatform {
        /// Raw OS name as reported by the host.
        os: String,
        /// Raw architecture as reported by the host.
        arch: String,
    },

    /// The descriptor resolved, but the resource is not in the artifact.
    #[error("Native library not found in bundle: {resource}")]
    ResourceMissing {
        /// Resource path that was looked up.
        resource: String,
    },

    /// Disk full, permission denied or similar while extracting.
    #[error("Failed to extract native library to {}: {source}", path.display())]
    ExtractionIo {
        /// Path being written when the failure occurred.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The extracted library exists but could not be linked.
    #[error("Failed to load native library {}: {reason}", path.display())]
    Link {
        /// Path handed to the dynamic linker.
        path: PathBuf,
        /// Linker diagnostic.
        reason: String,
    },

    /// Every working-directory candidate failed the write probe.
    #[error("No writable working directory found; tried: {attempts}")]
    DirectoryUnwritable {
        /// Every candidate that was attempted, in order.
        attempts: CandidateFailures,
    },

    /// A fallback candidate declined to register.
    #[error("Provider {name} unavailable: {reason}")]
    ProviderUnavailable {
        /// Provider name.
        name: String,
        /// Reason registration failed.
        reason: String,
    },

    /// The active provider cannot satisfy a required capability.
    #[error("Capability {capability} not offered by active provider {provider}")]
    CapabilityUnavailable {
        /// The capability that was required.
        capability: Capability,
        /// Name of the active provider, or "none".
        provider: String,
    },
}

impl BootstrapError {
    /// Create an extraction error for a path.
    #[must_use]
    pub fn extraction(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ExtractionIo {
            path: path.into(),
            source,
        }
    }

    /// Create a link error for a path.
    #[must_use]
    pub fn link(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Link {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a provider-unavailable error.
    #[must_use]
    pub fn provider_unavailable(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ProviderUnavailable {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error must terminate the host operation.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::DirectoryUnwritable { .. } | Self::CapabilityUnavailable { .. }
        )
    }

    /// Check if this error is absorbed by the loader and routed to a fallback provider.
    #[must_use]
    pub fn routes_to_fallback(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedPlatform { .. }
                | Self::ResourceMissing { .. }
                | Self::ExtractionIo { .. }
                | Self::Link { .. }
        )
    }
}

/// A working-directory candidate that was rejected, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFailure {
    /// Candidate path.
    pub path: PathBuf,
    /// Why the candidate was rejected.
    pub reason: String,
}

/// Ordered list of rejected candidates, rendered as `path (reason); ...`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateFailures(pub Vec<CandidateFailure>);

impl CandidateFailures {
    /// Paths of all attempted candidates, in order.
    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.0.iter().map(|f| &f.path)
    }
}

impl fmt::Display for CandidateFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("no candidates");
        }
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{} ({})", failure.path.display(), failure.reason)?;
        }
        Ok(())
    }
}
