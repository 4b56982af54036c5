//! # signapk-bootstrap
//!
//! Crypto provider bootstrap for signapk.
//!
//! Before signing, signapk needs two things from its host: a working
//! cryptographic provider and a directory it can write scratch files to.
//! Neither is a given on restricted hosts such as Termux, where `/tmp` is
//! read-only and the bundled native library may not load.
//!
//! ## Control flow
//!
//! ```text
//! sandbox::inspect ──► WorkdirResolver ──► working directory
//!                                               │
//! platform::identify ──► native::lookup         ▼
//!                             │        NativeLibraryExtractor
//!                             └──────────►  NativeLoader
//!                                               │
//!                   ProviderChain: Conscrypt ─► RustCrypto ─► HostDefault
//! ```
//!
//! ## Failure policy
//!
//! | Condition | Effect |
//! |-----------|--------|
//! | Unsupported platform | fall back |
//! | Library missing from bundle | fall back |
//! | Extraction I/O error | fall back, partial files removed |
//! | Link error | fall back |
//! | No writable working directory | fatal |
//! | Required capability missing | fatal (raised by `ProviderChain::require`) |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use signapk_bootstrap::{bootstrap, Capability};
//!
//! let boot = bootstrap()?;
//! println!("{}", boot.working_directory.message());
//! let provider = boot.chain.require(Capability::EcdsaP256)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::pedantic)] // Too strict for production code
#![allow(clippy::doc_markdown)] // Allow product names without backticks
#![allow(clippy::missing_errors_doc)] // Error documentation not required
#![allow(clippy::module_name_repetitions)] // Allow Type in module::Type
#![allow(clippy::must_use_candidate)] // Not all functions need must_use

pub mod config;
mod error;
pub mod native;
pub mod platform;
pub mod provider;
pub mod sandbox;
pub mod workdir;

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

pub use config::{BootstrapConfig, HostEnvironment};
pub use error::{BootstrapError, CandidateFailure, CandidateFailures};
pub use native::{LoadState, NativeLibraryDescriptor, NativeLoader};
pub use platform::{ArchFamily, OsFamily, PlatformSignature};
pub use provider::{
    Capability, CryptoProvider, HostDefaultProvider, NativeCandidate, ProviderCandidate,
    ProviderChain, ProviderKind, ProviderRegistration, ProviderStatus,
};
pub use sandbox::{SandboxKind, SandboxReport};
pub use workdir::{CandidateSource, DirectoryCandidate, WorkdirResolver, WorkingDirectory};

#[cfg(feature = "software")]
pub use provider::{SoftwareCandidate, SoftwareProvider};

static HOST: OnceLock<HostEnvironment> = OnceLock::new();
static WORKDIR: OnceLock<WorkdirResolver> = OnceLock::new();
static LOADER: OnceLock<Arc<NativeLoader>> = OnceLock::new();

fn host() -> &'static HostEnvironment {
    HOST.get_or_init(HostEnvironment::capture)
}

fn workdir_resolver() -> &'static WorkdirResolver {
    WORKDIR.get_or_init(|| WorkdirResolver::new(host().clone(), BootstrapConfig::default()))
}

/// The process-wide native loader.
///
/// Extraction goes under the working directory when one resolves, since the
/// system temp dir is exactly what restricted sandboxes reject.
pub fn native_loader() -> Arc<NativeLoader> {
    Arc::clone(LOADER.get_or_init(|| {
        let root = workdir_resolver().resolve().ok().map(|dir| dir.path);
        Arc::new(NativeLoader::from_host(
            host(),
            &BootstrapConfig::default(),
            root.as_deref(),
        ))
    }))
}

/// Load the bundled native library for this process.
///
/// Idempotent. Returns `true` if Conscrypt's native library is linked,
/// `false` if the caller should use a fallback provider. Never fails.
pub fn load_native_library() -> bool {
    native_loader().load()
}

/// Resolve the process-wide working directory.
///
/// # Errors
///
/// `DirectoryUnwritable` listing every attempted candidate.
pub fn resolve_working_directory() -> Result<PathBuf, BootstrapError> {
    workdir_resolver().resolve().map(|dir| dir.path)
}

/// The standard fallback chain: Conscrypt, then RustCrypto, then host defaults.
pub fn standard_chain(loader: Arc<NativeLoader>) -> ProviderChain {
    let chain = ProviderChain::new().with(NativeCandidate::new(loader));
    #[cfg(feature = "software")]
    let chain = chain.with(SoftwareCandidate);
    chain.with(HostDefaultProvider)
}

/// Everything the signing pipeline needs from bootstrap.
#[derive(Debug)]
pub struct Bootstrap {
    /// Chosen working directory.
    pub working_directory: WorkingDirectory,
    /// The fallback chain, already activated.
    pub chain: ProviderChain,
    /// Active provider.
    pub provider: Arc<dyn CryptoProvider>,
}

/// Run the full bootstrap for this process.
///
/// Resolves the working directory first, then walks the provider chain.
///
/// # Errors
///
/// `DirectoryUnwritable` if no working directory can be found, or
/// `CapabilityUnavailable` if no provider at all could be registered.
pub fn bootstrap() -> Result<Bootstrap, BootstrapError> {
    let working_directory = workdir_resolver().resolve()?;
    run_chain(working_directory, standard_chain(native_loader()))
}

/// Bootstrap against an explicit environment and loader, without touching
/// process-wide state.
pub fn bootstrap_with(
    resolver: &WorkdirResolver,
    loader: Arc<NativeLoader>,
) -> Result<Bootstrap, BootstrapError> {
    let working_directory = resolver.resolve()?;
    run_chain(working_directory, standard_chain(loader))
}

fn run_chain(
    working_directory: WorkingDirectory,
    mut chain: ProviderChain,
) -> Result<Bootstrap, BootstrapError> {
    let provider = chain
        .activate()
        .ok_or_else(|| BootstrapError::CapabilityUnavailable {
            capability: Capability::Sha256,
            provider: "none".into(),
        })?;
    Ok(Bootstrap {
        working_directory,
        chain,
        provider,
    })
}
