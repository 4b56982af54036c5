//! One-shot native library loading.
//!
//! [`NativeLoader::load`] runs the identify → resolve → extract → link
//! sequence at most once per loader. Every failure is absorbed here: it is
//! logged as a warning naming the platform and the reason, recorded as
//! [`LoadState::Failed`], and reported to the caller as `false`.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use crate::config::{BootstrapConfig, HostEnvironment};
use crate::error::BootstrapError;
use crate::native::extract::{ExtractedLibrary, NativeLibraryExtractor};
use crate::native::resources::{resources_at, DirectoryResources, ResourceSource, StaticResources};
use crate::native::table;
use crate::platform::{self, PlatformSignature};

/// Outcome of the single load attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    /// No attempt yet.
    Unattempted,
    /// The native library is linked.
    Succeeded,
    /// The attempt failed; fallback providers are in use.
    Failed,
}

/// A library handed to the dynamic linker.
#[derive(Debug)]
pub struct LinkedLibrary {
    path: PathBuf,
    // Kept alive so the library is never unloaded.
    _handle: Option<libloading::Library>,
}

impl LinkedLibrary {
    /// A linked library with no OS handle, for linkers that manage their own.
    pub fn detached(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _handle: None,
        }
    }

    /// Path the library was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Performs the dynamic link step.
pub trait Linker: Send + Sync {
    /// Link the library at `path`.
    ///
    /// # Errors
    ///
    /// `BootstrapError::Link` if the file cannot be loaded.
    fn link(&self, path: &Path) -> Result<LinkedLibrary, BootstrapError>;
}

/// Links through the platform dynamic loader (`dlopen`, `LoadLibraryW`).
#[derive(Debug, Default, Clone, Copy)]
pub struct DynamicLinker;

impl Linker for DynamicLinker {
    fn link(&self, path: &Path) -> Result<LinkedLibrary, BootstrapError> {
        // SAFETY: the library's initializers run here. The file was just
        // extracted from our own bundle into a private directory.
        let library = unsafe { libloading::Library::new(path) }
            .map_err(|e| BootstrapError::link(path, e.to_string()))?;
        Ok(LinkedLibrary {
            path: path.to_path_buf(),
            _handle: Some(library),
        })
    }
}

#[derive(Debug)]
struct LoaderInner {
    state: LoadState,
    library: Option<LinkedLibrary>,
    // Dropped after `library`, so the file outlives the handle.
    extracted: Option<ExtractedLibrary>,
    failure: Option<String>,
}

/// Loads the bundled Conscrypt native library, once.
pub struct NativeLoader {
    os_name: String,
    arch: String,
    platform: Option<PlatformSignature>,
    resources: Box<dyn ResourceSource>,
    extractor: NativeLibraryExtractor,
    linker: Box<dyn Linker>,
    inner: Mutex<LoaderInner>,
}

impl std::fmt::Debug for NativeLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeLoader")
            .field("os_name", &self.os_name)
            .field("arch", &self.arch)
            .field("platform", &self.platform)
            .field("resources", &self.resources.describe())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl NativeLoader {
    /// Create a loader for the given host and resource bundle.
    pub fn new(env: &HostEnvironment, resources: Box<dyn ResourceSource>) -> Self {
        Self {
            os_name: env.os_name.clone(),
            arch: env.arch.clone(),
            platform: platform::identify(&env.os_name, &env.arch),
            resources,
            extractor: NativeLibraryExtractor::new(BootstrapConfig::default().extraction_prefix),
            linker: Box::new(DynamicLinker),
            inner: Mutex::new(LoaderInner {
                state: LoadState::Unattempted,
                library: None,
                extracted: None,
                failure: None,
            }),
        }
    }

    /// Create a loader for the running process.
    ///
    /// Resources come from the `native_root_var` override when set, else from
    /// the directory of the running executable. Extraction directories go
    /// under `extraction_root`, or the system temp dir if `None`.
    pub fn from_host(
        env: &HostEnvironment,
        config: &BootstrapConfig,
        extraction_root: Option<&Path>,
    ) -> Self {
        let resources: Box<dyn ResourceSource> = match env.var(&config.native_root_var) {
            Some(root) => resources_at(Path::new(root)),
            None => match DirectoryResources::beside_executable() {
                Ok(dir) => Box::new(dir),
                Err(e) => {
                    tracing::debug!("Native loader: cannot locate executable ({}), no bundle", e);
                    Box::new(StaticResources::new())
                },
            },
        };

        let mut extractor = NativeLibraryExtractor::new(config.extraction_prefix.clone());
        if let Some(root) = extraction_root {
            extractor = extractor.in_root(root);
        }

        Self::new(env, resources).with_extractor(extractor)
    }

    /// Replace the extractor.
    #[must_use]
    pub fn with_extractor(mut self, extractor: NativeLibraryExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Replace the linker.
    #[must_use]
    pub fn with_linker(mut self, linker: impl Linker + 'static) -> Self {
        self.linker = Box::new(linker);
        self
    }

    /// Platform this loader was built for, if recognized.
    pub fn platform(&self) -> Option<PlatformSignature> {
        self.platform
    }

    /// Current load state.
    pub fn state(&self) -> LoadState {
        self.lock().state
    }

    /// Reason the attempt failed, if it did.
    pub fn failure(&self) -> Option<String> {
        self.lock().failure.clone()
    }

    /// Path the native library was loaded from, if it was.
    pub fn library_path(&self) -> Option<PathBuf> {
        self.lock().library.as_ref().map(|l| l.path().to_path_buf())
    }

    /// Load the native library, returning whether it is active.
    ///
    /// Only the first call does any work; concurrent first callers block
    /// until it completes and then see the same answer.
    pub fn load(&self) -> bool {
        let mut inner = self.lock();
        match inner.state {
            LoadState::Succeeded => return true,
            LoadState::Failed => return false,
            LoadState::Unattempted => {},
        }

        match self.attempt() {
            Ok((library, extracted)) => {
                tracing::info!(
                    platform = ?self.platform,
                    path = %library.path().display(),
                    "Native loader: loaded Conscrypt native library for {}",
                    self.arch
                );
                inner.library = Some(library);
                inner.extracted = extracted;
                inner.state = LoadState::Succeeded;
                true
            },
            Err(e) => {
                tracing::warn!(
                    os = %self.os_name,
                    arch = %self.arch,
                    reason = %e,
                    "Native loader: {}. Conscrypt will not be available, using fallback crypto providers",
                    e
                );
                inner.failure = Some(e.to_string());
                inner.state = LoadState::Failed;
                false
            },
        }
    }

    fn attempt(&self) -> Result<(LinkedLibrary, Option<ExtractedLibrary>), BootstrapError> {
        let unsupported = || BootstrapError::UnsupportedPlatform {
            os: self.os_name.clone(),
            arch: self.arch.clone(),
        };
        let signature = self.platform.ok_or_else(unsupported)?;
        let descriptor = table::lookup(signature).ok_or_else(unsupported)?;

        tracing::debug!(
            platform = %signature,
            resource = descriptor.resource_path,
            source = %self.resources.describe(),
            "Native loader: extracting"
        );
        let extracted = self.extractor.extract(descriptor, self.resources.as_ref())?;

        let library = match self.linker.link(extracted.path()) {
            Ok(library) => library,
            Err(e) => {
                extracted.cleanup();
                return Err(e);
            },
        };

        // A mapped library survives unlinking on Unix, so the files can go now.
        // Elsewhere they stay until the loader is dropped.
        if cfg!(unix) {
            extracted.cleanup();
            Ok((library, None))
        } else {
            Ok((library, Some(extracted)))
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LoaderInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
