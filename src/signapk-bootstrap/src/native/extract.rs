//! Extraction of a bundled native library to disk.
//!
//! Each extraction gets its own uniquely named directory. Bytes are staged in
//! a sibling temp file and renamed into place only after the copy completes,
//! so a failed copy never leaves a loadable file at the target path.
//!
//! Cleanup is best-effort: dropping [`ExtractedLibrary`] removes the
//! directory. A process killed before that happens leaks it.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::BootstrapError;
use crate::native::resources::ResourceSource;
use crate::native::table::NativeLibraryDescriptor;

/// Copies bundled libraries into scoped temporary directories.
#[derive(Debug, Clone)]
pub struct NativeLibraryExtractor {
    root: Option<PathBuf>,
    prefix: String,
}

/// A library on disk, ready for the dynamic linker.
///
/// The backing directory is deleted when this value is dropped.
#[derive(Debug)]
pub struct ExtractedLibrary {
    path: PathBuf,
    dir: TempDir,
}

impl ExtractedLibrary {
    /// Absolute path of the extracted library.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the library.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the directory now, logging instead of failing.
    pub fn cleanup(self) {
        let dir = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            tracing::debug!(dir = %dir.display(), "Extractor: cleanup failed: {}", e);
        }
    }
}

impl NativeLibraryExtractor {
    /// Extractor rooted in the system temp directory.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            root: None,
            prefix: prefix.into(),
        }
    }

    /// Create extraction directories under `root` instead of the system temp dir.
    #[must_use]
    pub fn in_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Extract `descriptor` from `resources`.
    ///
    /// # Errors
    ///
    /// `ResourceMissing` if the bundle lacks the resource, `ExtractionIo` for
    /// any failure while creating, copying or finalizing the file.
    pub fn extract(
        &self,
        descriptor: &NativeLibraryDescriptor,
        resources: &dyn ResourceSource,
    ) -> Result<ExtractedLibrary, BootstrapError> {
        let mut reader = resources
            .open(descriptor.resource_path)
            .map_err(|e| BootstrapError::extraction(descriptor.resource_path, e))?
            .ok_or_else(|| BootstrapError::ResourceMissing {
                resource: descriptor.resource_path.to_string(),
            })?;

        let dir = self.create_dir().map_err(|e| {
            BootstrapError::extraction(self.root.clone().unwrap_or_else(std::env::temp_dir), e)
        })?;
        let target = dir.path().join(descriptor.file_name);

        let mut staged = tempfile::Builder::new()
            .prefix(".partial-")
            .tempfile_in(dir.path())
            .map_err(|e| BootstrapError::extraction(dir.path(), e))?;

        let copied = io::copy(&mut reader, staged.as_file_mut())
            .and_then(|n| staged.as_file().sync_all().map(|()| n))
            .map_err(|e| BootstrapError::extraction(&target, e))?;
        drop(reader);

        mark_executable(staged.path()).map_err(|e| BootstrapError::extraction(&target, e))?;

        staged
            .persist(&target)
            .map_err(|e| BootstrapError::extraction(&target, e.error))?;

        tracing::debug!(
            resource = descriptor.resource_path,
            path = %target.display(),
            bytes = copied,
            "Extractor: native library extracted"
        );

        Ok(ExtractedLibrary { path: target, dir })
    }

    fn create_dir(&self) -> io::Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(&self.prefix);
        match &self.root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                builder.tempdir_in(root)
            },
            None => builder.tempdir(),
        }
    }
}

#[cfg(unix)]
fn mark_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn mark_executable(path: &Path) -> io::Result<()> {
    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_readonly(false);
    std::fs::set_permissions(path, perms)
}
