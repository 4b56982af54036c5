//! Sources of bundled resource bytes.
//!
//! The native libraries ship inside the distributed artifact. Depending on
//! packaging that is a directory next to the executable, a zip/jar archive,
//! or bytes compiled into the binary with `include_bytes!`.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};

/// Something that can hand out the bytes of a bundled resource.
pub trait ResourceSource: Send + Sync {
    /// Open a resource for reading.
    ///
    /// Returns `Ok(None)` when the resource is absent, and `Err` only for
    /// genuine I/O failures while locating it.
    fn open(&self, resource_path: &str) -> io::Result<Option<Box<dyn Read + Send + '_>>>;

    /// Human-readable description, for logs.
    fn describe(&self) -> String;
}

/// Resources laid out on disk under a root directory.
#[derive(Debug, Clone)]
pub struct DirectoryResources {
    root: PathBuf,
}

impl DirectoryResources {
    /// Resources rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resources next to the running executable.
    pub fn beside_executable() -> io::Result<Self> {
        let exe = std::env::current_exe()?;
        let dir = exe
            .parent()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "executable has no parent"))?;
        Ok(Self::new(dir))
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ResourceSource for DirectoryResources {
    fn open(&self, resource_path: &str) -> io::Result<Option<Box<dyn Read + Send + '_>>> {
        let path = self.root.join(resource_path);
        match File::open(&path) {
            Ok(file) => Ok(Some(Box::new(file) as Box<dyn Read + Send>)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn describe(&self) -> String {
        format!("directory {}", self.root.display())
    }
}

/// Resources held in memory, typically from `include_bytes!`.
#[derive(Debug, Clone, Default)]
pub struct StaticResources {
    entries: HashMap<String, Cow<'static, [u8]>>,
}

impl StaticResources {
    /// Empty resource set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource.
    #[must_use]
    pub fn with(
        mut self,
        resource_path: impl Into<String>,
        bytes: impl Into<Cow<'static, [u8]>>,
    ) -> Self {
        self.entries.insert(resource_path.into(), bytes.into());
        self
    }
}

impl ResourceSource for StaticResources {
    fn open(&self, resource_path: &str) -> io::Result<Option<Box<dyn Read + Send + '_>>> {
        Ok(self
            .entries
            .get(resource_path)
            .map(|bytes| Box::new(Cursor::new(bytes.as_ref())) as Box<dyn Read + Send + '_>))
    }

    fn describe(&self) -> String {
        format!("{} embedded resources", self.entries.len())
    }
}

/// Resources stored as entries of a zip or jar archive.
#[cfg(feature = "archive")]
#[derive(Debug, Clone)]
pub struct ArchiveResources {
    archive: PathBuf,
}

#[cfg(feature = "archive")]
impl ArchiveResources {
    /// Resources inside the archive at `archive`.
    pub fn new(archive: impl Into<PathBuf>) -> Self {
        Self {
            archive: archive.into(),
        }
    }
}

#[cfg(feature = "archive")]
impl ResourceSource for ArchiveResources {
    fn open(&self, resource_path: &str) -> io::Result<Option<Box<dyn Read + Send + '_>>> {
        let file = File::open(&self.archive)?;
        let mut archive = zip::ZipArchive::new(file).map_err(io::Error::other)?;

        // Entries borrow the archive, so inflate into memory before returning.
        let mut entry = match archive.by_name(resource_path) {
            Ok(entry) => entry,
            Err(zip::result::ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(io::Error::other(e)),
        };
        let mut bytes = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
        entry.read_to_end(&mut bytes)?;
        Ok(Some(Box::new(Cursor::new(bytes)) as Box<dyn Read + Send>))
    }

    fn describe(&self) -> String {
        format!("archive {}", self.archive.display())
    }
}

/// Pick a resource source for a configured root.
///
/// A regular file is treated as an archive, anything else as a directory.
pub fn resources_at(root: &Path) -> Box<dyn ResourceSource> {
    #[cfg(feature = "archive")]
    {
        if root.is_file() {
            return Box::new(ArchiveResources::new(root));
        }
    }
    Box::new(DirectoryResources::new(root))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(source: &dyn ResourceSource, path: &str) -> Option<Vec<u8>> {
        let mut reader = source.open(path).unwrap()?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).unwrap();
        Some(buf)
    }

    #[test]
    fn test_static_resources() {
        let source = StaticResources::new().with("jni/x86/libconscrypt_jni.so", &b"\x7fELF"[..]);
        assert_eq!(
            read_all(&source, "jni/x86/libconscrypt_jni.so"),
            Some(b"\x7fELF".to_vec())
        );
        assert_eq!(read_all(&source, "jni/x86_64/libconscrypt_jni.so"), None);
    }

    #[test]
    fn test_directory_resources() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("jni/arm64-v8a")).unwrap();
        std::fs::write(dir.path().join("jni/arm64-v8a/libconscrypt_jni.so"), b"lib").unwrap();

        let source = DirectoryResources::new(dir.path());
        assert_eq!(
            read_all(&source, "jni/arm64-v8a/libconscrypt_jni.so"),
            Some(b"lib".to_vec())
        );
        assert_eq!(read_all(&source, "jni/x86/libconscrypt_jni.so"), None);
    }

    #[cfg(feature = "archive")]
    #[test]
    fn test_archive_resources() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("signapk.jar");
        {
            let mut writer = zip::ZipWriter::new(File::create(&jar).unwrap());
            writer
                .start_file(
                    "jni/x86_64/libconscrypt_jni.so",
                    zip::write::SimpleFileOptions::default(),
                )
                .unwrap();
            writer.write_all(b"native bytes").unwrap();
            writer.finish().unwrap();
        }

        let source = resources_at(&jar);
        assert_eq!(
            read_all(source.as_ref(), "jni/x86_64/libconscrypt_jni.so"),
            Some(b"native bytes".to_vec())
        );
        assert_eq!(read_all(source.as_ref(), "jni/x86/libconscrypt_jni.so"), None);
    }
}
