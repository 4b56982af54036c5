//! Priority-ordered provider fallback.

use std::sync::Arc;

use serde::Serialize;

use super::{Capability, CryptoProvider, ProviderCandidate};
use crate::error::BootstrapError;

/// Registration status of one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "reason")]
pub enum ProviderStatus {
    /// Not tried yet.
    Pending,
    /// Registered and in use.
    Active,
    /// Tried and declined.
    Failed(String),
    /// Never tried because a higher-priority candidate is active.
    Skipped,
}

/// One entry of the fallback list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderRegistration {
    /// Provider name.
    pub name: String,
    /// Lower is tried first.
    pub priority: u16,
    /// Current status.
    pub status: ProviderStatus,
}

/// Activates the first candidate that registers.
pub struct ProviderChain {
    candidates: Vec<Box<dyn ProviderCandidate>>,
    registrations: Vec<ProviderRegistration>,
    active: Option<Arc<dyn CryptoProvider>>,
}

impl std::fmt::Debug for ProviderChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderChain")
            .field("registrations", &self.registrations)
            .field("active", &self.active)
            .finish()
    }
}

impl Default for ProviderChain {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderChain {
    /// Empty chain.
    pub fn new() -> Self {
        Self {
            candidates: Vec::new(),
            registrations: Vec::new(),
            active: None,
        }
    }

    /// Add a candidate, keeping the list sorted by priority.
    ///
    /// Candidates with equal priority keep insertion order.
    #[must_use]
    pub fn with(mut self, candidate: impl ProviderCandidate + 'static) -> Self {
        let registration = ProviderRegistration {
            name: candidate.name().to_string(),
            priority: candidate.priority(),
            status: ProviderStatus::Pending,
        };
        let at = self
            .candidates
            .partition_point(|c| c.priority() <= candidate.priority());
        self.candidates.insert(at, Box::new(candidate));
        self.registrations.insert(at, registration);
        self
    }

    /// Walk the candidates and activate the first that registers.
    ///
    /// Idempotent: once a provider is active it is returned directly. Returns
    /// `None` only if every candidate declined.
    pub fn activate(&mut self) -> Option<Arc<dyn CryptoProvider>> {
        if let Some(active) = &self.active {
            return Some(Arc::clone(active));
        }

        for (candidate, registration) in self.candidates.iter().zip(self.registrations.iter_mut())
        {
            if self.active.is_some() {
                registration.status = ProviderStatus::Skipped;
                continue;
            }
            if registration.status != ProviderStatus::Pending {
                continue;
            }

            match candidate.register() {
                Ok(provider) => {
                    tracing::info!(
                        provider = provider.name(),
                        kind = ?provider.kind(),
                        priority = registration.priority,
                        "Provider chain: activated"
                    );
                    registration.status = ProviderStatus::Active;
                    self.active = Some(provider);
                },
                Err(e) => {
                    tracing::info!(
                        provider = %registration.name,
                        "Provider chain: candidate declined: {}",
                        e
                    );
                    registration.status = ProviderStatus::Failed(e.to_string());
                },
            }
        }

        if self.active.is_none() {
            tracing::warn!("Provider chain: no provider could be registered");
        }
        self.active.clone()
    }

    /// The active provider, if any.
    pub fn active(&self) -> Option<Arc<dyn CryptoProvider>> {
        self.active.clone()
    }

    /// Snapshot of every registration, in priority order.
    pub fn registrations(&self) -> &[ProviderRegistration] {
        &self.registrations
    }

    /// Return the active provider if it offers `capability`.
    ///
    /// This is where a missing capability becomes fatal; the chain itself
    /// never is.
    ///
    /// # Errors
    ///
    /// `CapabilityUnavailable` if nothing is active or the active provider
    /// lacks the capability.
    pub fn require(&self, capability: Capability) -> Result<Arc<dyn CryptoProvider>, BootstrapError> {
        match &self.active {
            Some(provider) if provider.supports(capability) => Ok(Arc::clone(provider)),
            Some(provider) => Err(BootstrapError::CapabilityUnavailable {
                capability,
                provider: provider.name().to_string(),
            }),
            None => Err(BootstrapError::CapabilityUnavailable {
                capability,
                provider: "none".into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Fake {
        name: String,
        capabilities: Vec<Capability>,
    }

    impl CryptoProvider for Fake {
        fn name(&self) -> &str {
            &self.name
        }

        fn kind(&self) -> ProviderKind {
            ProviderKind::Software
        }

        fn capabilities(&self) -> &[Capability] {
            &self.capabilities
        }
    }

    struct FakeCandidate {
        name: &'static str,
        priority: u16,
        works: bool,
        attempts: Arc<AtomicUsize>,
    }

    impl FakeCandidate {
        fn new(name: &'static str, priority: u16, works: bool) -> Self {
            Self {
                name,
                priority,
                works,
                attempts: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl ProviderCandidate for FakeCandidate {
        fn name(&self) -> &str {
            self.name
        }

        fn priority(&self) -> u16 {
            self.priority
        }

        fn register(&self) -> Result<Arc<dyn CryptoProvider>, BootstrapError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if self.works {
                Ok(Arc::new(Fake {
                    name: self.name.to_string(),
                    capabilities: vec![Capability::Sha256],
                }))
            } else {
                Err(BootstrapError::provider_unavailable(self.name, "not today"))
            }
        }
    }

    #[test]
    fn test_first_working_candidate_wins() {
        let later = FakeCandidate::new("later", 20, true);
        let later_attempts = Arc::clone(&later.attempts);

        let mut chain = ProviderChain::new()
            .with(later)
            .with(FakeCandidate::new("broken", 0, false))
            .with(FakeCandidate::new("second", 10, true));

        let active = chain.activate().unwrap();
        assert_eq!(active.name(), "second");
        assert_eq!(later_attempts.load(Ordering::SeqCst), 0);

        let statuses: Vec<_> = chain
            .registrations()
            .iter()
            .map(|r| (r.name.as_str(), r.status.clone()))
            .collect();
        assert_eq!(
            statuses,
            vec![
                ("broken", ProviderStatus::Failed("Provider broken unavailable: not today".into())),
                ("second", ProviderStatus::Active),
                ("later", ProviderStatus::Skipped),
            ]
        );
    }

    #[test]
    fn test_activate_is_idempotent() {
        let only = FakeCandidate::new("only", 0, true);
        let attempts = Arc::clone(&only.attempts);
        let mut chain = ProviderChain::new().with(only);

        chain.activate();
        chain.activate();
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        let active: Vec<_> = chain
            .registrations()
            .iter()
            .filter(|r| r.status == ProviderStatus::Active)
            .collect();
        assert_eq!(active.len(), 1);
    }

    #[test]
    fn test_all_declined_is_not_fatal() {
        let mut chain = ProviderChain::new()
            .with(FakeCandidate::new("a", 0, false))
            .with(FakeCandidate::new("b", 1, false));
        assert!(chain.activate().is_none());

        let err = chain.require(Capability::Sha256).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("none"));
    }

    #[test]
    fn test_require_missing_capability() {
        let mut chain = ProviderChain::new().with(FakeCandidate::new("digest-only", 0, true));
        chain.activate();

        assert!(chain.require(Capability::Sha256).is_ok());
        let err = chain.require(Capability::RsaPkcs1).unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::CapabilityUnavailable { capability: Capability::RsaPkcs1, .. }
        ));
    }
}
