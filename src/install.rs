// SPDX-License-Identifier: MIT
//! Ollama installer — one strategy per platform.
//!
//! Invoked only when detection reported the binary absent; re-running with
//! Ollama present never reaches this module. Linux gets the vendor install
//! script; macOS has no automation path and halts with manual download
//! instructions; anything else halts with a generic message.

use std::process::Command;

use tracing::info;

use crate::error::SetupError;
use crate::platform::Platform;

/// What the installer will do on a given platform. `strategy_for` is
/// total over [`Platform`] — no variant falls through silently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallStrategy {
    /// Fetch and run the vendor install script via the shell.
    RunScript(&'static str),
    /// No automation — halt with these manual instructions.
    Manual(&'static str),
    /// Platform not recognized — halt with a generic message.
    Unsupported(&'static str),
}

const LINUX_INSTALL_CMD: &str = "curl -fsSL https://ollama.com/install.sh | sh";
const MACOS_INSTRUCTIONS: &str = "Ollama cannot be installed automatically on macOS.\n\
    Download it from https://ollama.com/download, open the app once,\n\
    then re-run `devstack setup`.";
const GENERIC_INSTRUCTIONS: &str = "no automated Ollama install for this platform — \
    see https://ollama.com/download for manual instructions, then re-run `devstack setup`";

pub fn strategy_for(platform: Platform) -> InstallStrategy {
    match platform {
        Platform::Linux => InstallStrategy::RunScript(LINUX_INSTALL_CMD),
        Platform::MacOs => InstallStrategy::Manual(MACOS_INSTRUCTIONS),
        Platform::Other => InstallStrategy::Unsupported(GENERIC_INSTRUCTIONS),
    }
}

/// Execute the install strategy for `platform`.
///
/// A non-zero exit from the automated path is fatal — nothing downstream
/// can compensate for a half-installed runtime. The caller re-probes the
/// binary afterwards instead of assuming success.
pub fn install_ollama(platform: Platform) -> Result<(), SetupError> {
    match strategy_for(platform) {
        InstallStrategy::RunScript(cmd) => {
            info!(platform = %platform, "installing Ollama via vendor script");
            let status = Command::new("sh")
                .arg("-c")
                .arg(cmd)
                .status()
                .map_err(|e| SetupError::OllamaInstall {
                    detail: format!("install script could not start: {e}"),
                })?;
            if !status.success() {
                return Err(SetupError::OllamaInstall {
                    detail: format!("install script exited with {status}"),
                });
            }
            info!("Ollama install script completed");
            Ok(())
        }
        InstallStrategy::Manual(msg) | InstallStrategy::Unsupported(msg) => {
            Err(SetupError::UnsupportedPlatform(msg.to_string()))
        }
    }
}
