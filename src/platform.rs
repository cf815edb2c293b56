// SPDX-License-Identifier: MIT
//! Host platform detection.
//!
//! A closed enumeration — every branch in the installer and activator
//! dispatches on this, never on raw OS strings. Unlisted platforms fold
//! into `Other` and take the safe (manual) path everywhere.

/// The platforms the provisioner distinguishes between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOs,
    Other,
}

impl Platform {
    /// Detect the platform the provisioner is running on.
    pub fn detect() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    fn from_os(os: &str) -> Self {
        match os {
            "linux" => Platform::Linux,
            "macos" => Platform::MacOs,
            _ => Platform::Other,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Linux => write!(f, "linux"),
            Platform::MacOs => write!(f, "macos"),
            Platform::Other => write!(f, "other"),
        }
    }
}
