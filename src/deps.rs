// SPDX-License-Identifier: MIT
//! Front-end and backend dependency installation.
//!
//! Front-end packages install at the project root (`npm install`); backend
//! packages install into a virtualenv at `backend/.venv`, created only if
//! absent. Either step failing aborts the pipeline — every later component
//! assumes these are in place.

use std::path::Path;
use std::process::Command;

use tracing::info;

use crate::error::SetupError;

pub const VENV_DIR: &str = "backend/.venv";
const REQUIREMENTS: &str = "requirements.txt";

fn run_step(step: &str, cmd: &mut Command) -> Result<(), SetupError> {
    let status = cmd.status().map_err(|e| SetupError::DependencyInstall {
        step: format!("{step}: could not start: {e}"),
    })?;
    if !status.success() {
        return Err(SetupError::DependencyInstall {
            step: format!("{step} exited with {status}"),
        });
    }
    Ok(())
}

/// `npm install` at the project root.
pub fn install_frontend(dir: &Path) -> Result<(), SetupError> {
    info!("installing front-end dependencies (npm install)");
    run_step("npm install", Command::new("npm").arg("install").current_dir(dir))
}

/// Create the backend virtualenv if absent, then `pip install` into it.
pub fn install_backend(dir: &Path) -> Result<(), SetupError> {
    let venv = dir.join(VENV_DIR);
    if venv.exists() {
        info!(path = %venv.display(), "virtualenv already exists — skipping creation");
    } else {
        info!(path = %venv.display(), "creating backend virtualenv");
        run_step(
            "python3 -m venv",
            Command::new("python3")
                .args(["-m", "venv"])
                .arg(&venv)
                .current_dir(dir),
        )?;
    }

    let pip = venv.join("bin").join("pip");
    info!("installing backend dependencies (pip install)");
    run_step(
        "pip install",
        Command::new(pip)
            .args(["install", "-r", REQUIREMENTS])
            .current_dir(dir.join("backend")),
    )
}
