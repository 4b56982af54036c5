//! End-to-end bootstrap against controlled environments.

use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;

use signapk_bootstrap::native::{LinkedLibrary, Linker, NativeLibraryExtractor, StaticResources};
use signapk_bootstrap::{
    bootstrap_with, BootstrapConfig, BootstrapError, Capability, CandidateSource,
    HostEnvironment, LoadState, NativeLoader, ProviderKind, ProviderStatus, WorkdirResolver,
};

const X86_64_LIBRARY: &str = "jni/x86_64/libconscrypt_jni.so";

/// Accepts any file without calling the OS loader.
struct AcceptingLinker;

impl Linker for AcceptingLinker {
    fn link(&self, path: &Path) -> Result<LinkedLibrary, BootstrapError> {
        Ok(LinkedLibrary::detached(path))
    }
}

fn host(tmp: &TempDir) -> HostEnvironment {
    HostEnvironment::new("Linux", "amd64")
        .with_home(tmp.path().join("home"))
        .with_cwd(tmp.path().join("work"))
}

fn loader_for(env: &HostEnvironment, tmp: &TempDir, bytes: &'static [u8]) -> NativeLoader {
    let resources = StaticResources::new().with(X86_64_LIBRARY, bytes);
    NativeLoader::new(env, Box::new(resources)).with_extractor(
        NativeLibraryExtractor::new("conscrypt-native").in_root(tmp.path().join("extract")),
    )
}

fn entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|it| it.count()).unwrap_or(0)
}

#[test]
fn native_provider_wins_when_library_links() {
    let tmp = TempDir::new().unwrap();
    let env = host(&tmp);
    let loader = Arc::new(loader_for(&env, &tmp, b"\x7fELF stub").with_linker(AcceptingLinker));
    let resolver = WorkdirResolver::new(env, BootstrapConfig::default());

    let boot = bootstrap_with(&resolver, Arc::clone(&loader)).unwrap();

    assert_eq!(boot.provider.name(), "Conscrypt");
    assert_eq!(boot.provider.kind(), ProviderKind::Native);
    assert_eq!(loader.state(), LoadState::Succeeded);
    assert!(boot.chain.require(Capability::RsaPkcs1).is_ok());
    assert!(boot
        .chain
        .registrations()
        .iter()
        .skip(1)
        .all(|r| r.status == ProviderStatus::Skipped));
}

#[cfg(feature = "software")]
#[test]
fn corrupt_library_falls_back_to_software() {
    let tmp = TempDir::new().unwrap();
    let env = host(&tmp);
    let loader = Arc::new(loader_for(&env, &tmp, b"definitely not a shared object"));
    let resolver = WorkdirResolver::new(env, BootstrapConfig::default());

    let boot = bootstrap_with(&resolver, Arc::clone(&loader)).unwrap();

    assert_eq!(boot.provider.name(), "RustCrypto");
    assert_eq!(loader.state(), LoadState::Failed);
    assert!(loader.failure().is_some());
    assert_eq!(entries(&tmp.path().join("extract")), 0);

    let statuses: Vec<_> = boot.chain.registrations().iter().map(|r| &r.status).collect();
    assert!(matches!(statuses[0], ProviderStatus::Failed(_)));
    assert_eq!(statuses[1], &ProviderStatus::Active);
    assert_eq!(statuses[2], &ProviderStatus::Skipped);

    assert!(boot.chain.require(Capability::Ed25519).is_ok());
    let err = boot.chain.require(Capability::RsaPkcs1).unwrap_err();
    assert!(err.is_fatal());
}

#[test]
fn load_is_stable_across_calls() {
    let tmp = TempDir::new().unwrap();
    let env = host(&tmp);
    let loader = loader_for(&env, &tmp, b"garbage");

    let first = loader.load();
    let second = loader.load();

    assert!(!first);
    assert_eq!(first, second);
    assert_eq!(loader.state(), LoadState::Failed);
}

#[test]
fn unsupported_platform_skips_extraction() {
    let tmp = TempDir::new().unwrap();
    let env = HostEnvironment::new("SunOS", "sparcv9").with_home(tmp.path());
    let loader = loader_for(&env, &tmp, b"unused");

    assert!(!loader.load());
    assert!(loader.platform().is_none());
    assert!(!tmp.path().join("extract").exists());
}

#[test]
fn termux_uses_home_tmp() {
    let tmp = TempDir::new().unwrap();
    let env = host(&tmp).with_var("TERMUX_VERSION", "0.118.0");
    let resolver = WorkdirResolver::new(env.clone(), BootstrapConfig::default());
    let loader = Arc::new(loader_for(&env, &tmp, b"garbage"));

    let boot = bootstrap_with(&resolver, loader).unwrap();

    let expected = tmp.path().join("home").join("tmp");
    assert_eq!(boot.working_directory.path, expected);
    assert_eq!(boot.working_directory.source, CandidateSource::Home);
    assert_eq!(
        boot.working_directory.message(),
        format!(
            "Termux environment detected, using working directory {}",
            expected.display()
        )
    );
}

#[test]
fn no_writable_directory_is_fatal() {
    let tmp = TempDir::new().unwrap();
    let blocker = tmp.path().join("blocker");
    std::fs::write(&blocker, b"regular file").unwrap();
    let env = HostEnvironment::new("linux", "x86_64")
        .with_home(&blocker)
        .with_cwd(&blocker);
    let resolver = WorkdirResolver::new(env.clone(), BootstrapConfig::default());
    let loader = Arc::new(loader_for(&env, &tmp, b"garbage"));

    let err = bootstrap_with(&resolver, Arc::clone(&loader)).unwrap_err();

    assert!(err.is_fatal());
    match err {
        BootstrapError::DirectoryUnwritable { attempts } => {
            assert_eq!(attempts.0.len(), 2);
            assert!(attempts.0.iter().all(|a| a.path.starts_with(&blocker)));
        },
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(loader.state(), LoadState::Unattempted);
}
