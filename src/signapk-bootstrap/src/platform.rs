//! Platform identification.
//!
//! Maps the vendor-varying OS name and architecture strings reported by the
//! host to a canonical [`PlatformSignature`]. Recognition is deliberately
//! broader than packaging coverage: a signature says what the host *is*,
//! [`crate::native::lookup`] says whether a library ships for it.

use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Canonical operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    /// Linux, including Android userlands such as Termux.
    Linux,
    /// Apple macOS.
    MacOs,
    /// Microsoft Windows.
    Windows,
}

/// Canonical CPU architecture family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchFamily {
    /// 64-bit ARM.
    Aarch64,
    /// 64-bit x86.
    X86_64,
    /// 32-bit x86.
    X86,
    /// 32-bit ARM.
    Arm,
    /// 64-bit RISC-V.
    Riscv64,
    /// 64-bit little-endian POWER.
    Ppc64le,
    /// IBM Z.
    S390x,
}

/// Canonical (OS family, architecture family) pair used for dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlatformSignature {
    /// Operating system family.
    pub os: OsFamily,
    /// Architecture family.
    pub arch: ArchFamily,
}

impl PlatformSignature {
    /// Create a signature from its parts.
    #[must_use]
    pub const fn new(os: OsFamily, arch: ArchFamily) -> Self {
        Self { os, arch }
    }
}

impl OsFamily {
    /// Lowercase canonical name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::MacOs => "macos",
            Self::Windows => "windows",
        }
    }

    /// Classify a raw OS name, ignoring case.
    pub fn parse(raw: &str) -> Option<Self> {
        let name = raw.trim().to_ascii_lowercase();
        if name.contains("linux") || name.contains("android") {
            Some(Self::Linux)
        } else if name.contains("mac") || name.contains("darwin") {
            Some(Self::MacOs)
        } else if name.starts_with("windows") {
            Some(Self::Windows)
        } else {
            None
        }
    }
}

impl ArchFamily {
    /// Lowercase canonical name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Aarch64 => "aarch64",
            Self::X86_64 => "x86_64",
            Self::X86 => "x86",
            Self::Arm => "arm",
            Self::Riscv64 => "riscv64",
            Self::Ppc64le => "ppc64le",
            Self::S390x => "s390x",
        }
    }

    /// Classify a raw architecture string, ignoring case.
    ///
    /// Order matters: `arm64` must match before the generic `arm`, and
    /// `x86_64` before `x86`.
    pub fn parse(raw: &str) -> Option<Self> {
        let arch = raw.trim().to_ascii_lowercase();
        if arch.contains("aarch64") || arch.contains("arm64") {
            Some(Self::Aarch64)
        } else if arch.contains("amd64") || arch.contains("x86_64") || arch == "x64" {
            Some(Self::X86_64)
        } else if arch == "x86"
            || arch.contains("i386")
            || arch.contains("i486")
            || arch.contains("i586")
            || arch.contains("i686")
        {
            Some(Self::X86)
        } else if arch.starts_with("arm") {
            Some(Self::Arm)
        } else if arch.contains("riscv64") {
            Some(Self::Riscv64)
        } else if arch.contains("ppc64le") || arch.contains("powerpc64le") {
            Some(Self::Ppc64le)
        } else if arch.contains("s390x") {
            Some(Self::S390x)
        } else {
            None
        }
    }
}

impl fmt::Display for PlatformSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os.as_str(), self.arch.as_str())
    }
}

/// Identify a platform from raw OS name and architecture strings.
///
/// Returns `None` when either part is unrecognized. That is not an error:
/// callers take it as a signal to skip native loading entirely.
pub fn identify(os_name: &str, arch: &str) -> Option<PlatformSignature> {
    let os = OsFamily::parse(os_name)?;
    let arch = ArchFamily::parse(arch)?;
    Some(PlatformSignature { os, arch })
}

/// Signature of the running process, derived once.
pub fn current() -> Option<PlatformSignature> {
    static CURRENT: OnceLock<Option<PlatformSignature>> = OnceLock::new();
    *CURRENT.get_or_init(|| identify(std::env::consts::OS, std::env::consts::ARCH))
}
