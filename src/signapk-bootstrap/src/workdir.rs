//! Writable working-directory resolution.
//!
//! Candidates, in priority order:
//!
//! 1. the override from `SIGNAPK_TMPDIR`
//! 2. `<home>/tmp`
//! 3. `<cwd>/tmp`
//!
//! Each is created if missing and then write-probed. The first that passes
//! wins and is memoized. The filesystem root is never accepted.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use crate::config::{BootstrapConfig, HostEnvironment};
use crate::error::{BootstrapError, CandidateFailure, CandidateFailures};
use crate::sandbox::{self, SandboxReport};

/// Where a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    /// Explicit environment override.
    Override,
    /// Under the user's home directory.
    Home,
    /// Under the current working directory.
    CurrentDir,
}

/// A directory that may be used for temporary work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryCandidate {
    /// Directory path.
    pub path: PathBuf,
    /// Lower is tried first.
    pub priority: u8,
    /// Where the candidate came from.
    pub source: CandidateSource,
    /// Result of the write probe, once run.
    pub writable: Option<bool>,
}

/// The chosen working directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkingDirectory {
    /// Directory path.
    pub path: PathBuf,
    /// Which candidate won.
    pub source: CandidateSource,
    /// Sandbox detected at resolution time.
    pub sandbox: Option<SandboxReport>,
    /// Candidates probed up to and including the winner.
    pub probed: Vec<DirectoryCandidate>,
}

impl WorkingDirectory {
    /// Informational message naming the chosen path.
    pub fn message(&self) -> String {
        match self.sandbox {
            Some(report) => format!(
                "{} environment detected, using working directory {}",
                report.kind,
                self.path.display()
            ),
            None => format!("Using working directory {}", self.path.display()),
        }
    }
}

/// Build the candidate list for an environment.
///
/// Candidates that would be the filesystem root are dropped here.
pub fn candidates(env: &HostEnvironment, config: &BootstrapConfig) -> Vec<DirectoryCandidate> {
    let mut out = Vec::with_capacity(3);

    if let Some(value) = env.var(&config.tmpdir_override_var) {
        let path = PathBuf::from(value);
        let path = match (&env.cwd, path.is_relative()) {
            (Some(cwd), true) => cwd.join(path),
            _ => path,
        };
        out.push((path, CandidateSource::Override));
    }
    if let Some(home) = &env.home {
        out.push((home.join(&config.workdir_name), CandidateSource::Home));
    }
    if let Some(cwd) = &env.cwd {
        out.push((cwd.join(&config.workdir_name), CandidateSource::CurrentDir));
    }

    out.into_iter()
        .filter(|(path, _)| !is_root(path))
        .enumerate()
        .map(|(i, (path, source))| DirectoryCandidate {
            path,
            priority: i as u8,
            source,
            writable: None,
        })
        .collect()
}

/// Check whether a path is a filesystem root (or empty).
pub fn is_root(path: &Path) -> bool {
    path.as_os_str().is_empty() || path.parent().is_none()
}

/// Create `dir` if needed and prove it is writable.
///
/// The probe creates a uniquely named marker file, writes to it and removes it.
pub fn probe(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let mut marker = tempfile::Builder::new()
        .prefix(".signapk-probe-")
        .tempfile_in(dir)?;
    marker.write_all(b"probe")?;
    marker.flush()?;
    marker.close()
}

/// Resolves and memoizes the working directory.
#[derive(Debug)]
pub struct WorkdirResolver {
    env: HostEnvironment,
    config: BootstrapConfig,
    resolved: Mutex<Option<WorkingDirectory>>,
}

impl WorkdirResolver {
    /// Create a resolver for an environment.
    pub fn new(env: HostEnvironment, config: BootstrapConfig) -> Self {
        Self {
            env,
            config,
            resolved: Mutex::new(None),
        }
    }

    /// Resolve the working directory, probing candidates on first success only.
    ///
    /// Failure is not memoized; a later call probes again.
    ///
    /// # Errors
    ///
    /// `DirectoryUnwritable` listing every attempted candidate.
    pub fn resolve(&self) -> Result<WorkingDirectory, BootstrapError> {
        let mut resolved = self.resolved.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(dir) = resolved.as_ref() {
            return Ok(dir.clone());
        }

        let sandbox = sandbox::inspect(&self.env);
        if let Some(report) = sandbox {
            tracing::info!(
                sandbox = %report.kind,
                indicator = report.indicator,
                "Workdir: sandbox-aware defaults in effect"
            );
        }

        let mut failures = Vec::new();
        let mut probed = Vec::new();
        for mut candidate in candidates(&self.env, &self.config) {
            let outcome = probe(&candidate.path);
            candidate.writable = Some(outcome.is_ok());
            probed.push(candidate.clone());

            match outcome {
                Ok(()) => {
                    let dir = WorkingDirectory {
                        path: candidate.path,
                        source: candidate.source,
                        sandbox,
                        probed,
                    };
                    tracing::info!(source = ?dir.source, "Workdir: {}", dir.message());
                    *resolved = Some(dir.clone());
                    return Ok(dir);
                },
                Err(e) => {
                    tracing::debug!(
                        path = %candidate.path.display(),
                        priority = candidate.priority,
                        "Workdir: candidate rejected: {}",
                        e
                    );
                    failures.push(CandidateFailure {
                        path: candidate.path,
                        reason: e.to_string(),
                    });
                },
            }
        }

        let err = BootstrapError::DirectoryUnwritable {
            attempts: CandidateFailures(failures),
        };
        tracing::error!("Workdir: {}", err);
        Err(err)
    }

    /// The memoized directory, if resolution already succeeded.
    pub fn resolved(&self) -> Option<WorkingDirectory> {
        self.resolved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
