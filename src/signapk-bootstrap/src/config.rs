//! Configuration for the bootstrap subsystem.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variable holding an explicit working-directory override.
pub const TMPDIR_OVERRIDE_VAR: &str = "SIGNAPK_TMPDIR";

/// Environment variable pointing at a directory or archive with the bundled
/// native libraries.
pub const NATIVE_ROOT_VAR: &str = "SIGNAPK_NATIVE_ROOT";

/// Configuration for provider bootstrap.
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    /// Env var consulted for the working-directory override.
    pub tmpdir_override_var: String,
    /// Env var consulted for the native resource root.
    pub native_root_var: String,
    /// Name of the dedicated subdirectory under home and cwd.
    pub workdir_name: String,
    /// Prefix for the per-process extraction directory.
    pub extraction_prefix: String,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            tmpdir_override_var: TMPDIR_OVERRIDE_VAR.into(),
            native_root_var: NATIVE_ROOT_VAR.into(),
            workdir_name: "tmp".into(),
            extraction_prefix: "conscrypt-native".into(),
        }
    }
}

/// Snapshot of the host facts the bootstrap depends on.
///
/// Captured once from the running process, or built by hand in tests so that
/// nothing has to mutate the real process environment.
#[derive(Debug, Clone, Default)]
pub struct HostEnvironment {
    /// OS name, e.g. `linux` or `Mac OS X`.
    pub os_name: String,
    /// Architecture, e.g. `x86_64` or `amd64`.
    pub arch: String,
    /// User home directory, if known.
    pub home: Option<PathBuf>,
    /// Current working directory, if known.
    pub cwd: Option<PathBuf>,
    vars: BTreeMap<String, String>,
}

impl HostEnvironment {
    /// Capture the environment of the running process.
    pub fn capture() -> Self {
        Self {
            os_name: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            home: dirs::home_dir(),
            cwd: std::env::current_dir().ok(),
            vars: std::env::vars().collect(),
        }
    }

    /// Create an empty environment for the given OS and architecture.
    pub fn new(os_name: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os_name: os_name.into(),
            arch: arch.into(),
            ..Self::default()
        }
    }

    /// Set the home directory.
    #[must_use]
    pub fn with_home(mut self, home: impl AsRef<Path>) -> Self {
        self.home = Some(home.as_ref().to_path_buf());
        self
    }

    /// Set the current working directory.
    #[must_use]
    pub fn with_cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Set an environment variable.
    #[must_use]
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Look up a variable. Empty values count as unset.
    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Check whether a variable is present at all, even if empty.
    pub fn has_var(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }
}
