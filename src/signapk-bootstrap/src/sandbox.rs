//! Restricted-sandbox detection.
//!
//! Termux runs as an ordinary Android app: `/tmp` and the other system-wide
//! temp locations are not writable, but the app's home directory is. The
//! working-directory resolver already prefers home over any system default,
//! so detection only changes what gets reported.

use std::fmt;

use serde::Serialize;

use crate::config::HostEnvironment;

/// Env vars whose presence identifies Termux.
pub const TERMUX_INDICATORS: [&str; 2] = ["TERMUX_VERSION", "TERMUX_APK_RELEASE"];

/// Known restricted execution environments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SandboxKind {
    /// Termux terminal emulator on Android.
    Termux,
}

impl fmt::Display for SandboxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Termux => f.write_str("Termux"),
        }
    }
}

/// A detected sandbox and the variable that gave it away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SandboxReport {
    /// Which sandbox.
    pub kind: SandboxKind,
    /// Indicator variable that was present.
    pub indicator: &'static str,
}

/// Detect a known sandbox from the environment.
pub fn inspect(env: &HostEnvironment) -> Option<SandboxReport> {
    let indicator = TERMUX_INDICATORS.into_iter().find(|name| env.has_var(name))?;
    tracing::debug!(indicator, "Sandbox: Termux environment detected");
    Some(SandboxReport {
        kind: SandboxKind::Termux,
        indicator,
    })
}
