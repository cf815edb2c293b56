// SPDX-License-Identifier: MIT
//! Launcher script materialization.
//!
//! Writes the three launcher artifacts at fixed paths under the project
//! root. Templates are fixed text: same input, same bytes, so re-running
//! setup is idempotent. Existing files are overwritten unconditionally.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

pub const BACKEND_LAUNCHER: &str = "start_backend.sh";
pub const FRONTEND_LAUNCHER: &str = "start_frontend.sh";
pub const COMBINED_LAUNCHER: &str = "start_all.sh";

const BACKEND_TEMPLATE: &str = r#"#!/usr/bin/env bash
# Generated by devstack — do not edit; re-run `devstack setup` to regenerate.
set -euo pipefail
cd "$(dirname "$0")/backend"

source .venv/bin/activate

# Export every key from the configuration artifact into the environment.
set -a
source ../.env
set +a

exec uvicorn main:app --host 0.0.0.0 --port "${PORT:-8080}" --reload
"#;

const FRONTEND_TEMPLATE: &str = r#"#!/usr/bin/env bash
# Generated by devstack — do not edit; re-run `devstack setup` to regenerate.
set -euo pipefail
cd "$(dirname "$0")"

exec npm run dev
"#;

const COMBINED_TEMPLATE: &str = r#"#!/usr/bin/env bash
# Generated by devstack — do not edit; re-run `devstack setup` to regenerate.
# Starts backend and front-end as one process group; Ctrl-C stops both.
# Prefer `devstack up` for the supervised equivalent.
cd "$(dirname "$0")"

cleanup() {
    kill $(jobs -p) 2>/dev/null
    exit 0
}
trap cleanup INT TERM

./start_backend.sh &
sleep 3
./start_frontend.sh &

wait
"#;

fn write_executable(path: &Path, body: &str) -> Result<()> {
    std::fs::write(path, body).with_context(|| format!("cannot write {}", path.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
            .with_context(|| format!("cannot chmod {}", path.display()))?;
    }
    Ok(())
}

/// Write all three launcher artifacts. Returns the written paths.
pub fn materialize(dir: &Path) -> Result<Vec<PathBuf>> {
    let artifacts = [
        (BACKEND_LAUNCHER, BACKEND_TEMPLATE),
        (FRONTEND_LAUNCHER, FRONTEND_TEMPLATE),
        (COMBINED_LAUNCHER, COMBINED_TEMPLATE),
    ];

    let mut written = Vec::with_capacity(artifacts.len());
    for (name, body) in artifacts {
        let path = dir.join(name);
        write_executable(&path, body)?;
        info!(path = %path.display(), "launcher written");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn writes_all_three_launchers() {
        let tmp = TempDir::new().unwrap();
        let written = materialize(tmp.path()).unwrap();
        assert_eq!(written.len(), 3);
        for name in [BACKEND_LAUNCHER, FRONTEND_LAUNCHER, COMBINED_LAUNCHER] {
            assert!(tmp.path().join(name).exists(), "{name} missing");
        }
    }

    #[test]
    fn rerun_produces_identical_bytes() {
        let tmp = TempDir::new().unwrap();
        materialize(tmp.path()).unwrap();
        let first = std::fs::read(tmp.path().join(COMBINED_LAUNCHER)).unwrap();
        materialize(tmp.path()).unwrap();
        let second = std::fs::read(tmp.path().join(COMBINED_LAUNCHER)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn overwrites_stale_content() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(BACKEND_LAUNCHER), "stale").unwrap();
        materialize(tmp.path()).unwrap();
        let body = std::fs::read_to_string(tmp.path().join(BACKEND_LAUNCHER)).unwrap();
        assert!(body.contains("uvicorn"));
        assert!(!body.contains("stale"));
    }

    #[cfg(unix)]
    #[test]
    fn launchers_are_executable() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = TempDir::new().unwrap();
        for path in materialize(tmp.path()).unwrap() {
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o111, 0o111, "{} not executable", path.display());
        }
    }

    #[test]
    fn backend_launcher_loads_env_and_venv() {
        let tmp = TempDir::new().unwrap();
        materialize(tmp.path()).unwrap();
        let body = std::fs::read_to_string(tmp.path().join(BACKEND_LAUNCHER)).unwrap();
        assert!(body.contains("source .venv/bin/activate"));
        assert!(body.contains("source ../.env"));
    }

    #[test]
    fn combined_launcher_traps_interrupt() {
        let tmp = TempDir::new().unwrap();
        materialize(tmp.path()).unwrap();
        let body = std::fs::read_to_string(tmp.path().join(COMBINED_LAUNCHER)).unwrap();
        assert!(body.contains("trap cleanup INT TERM"));
        assert!(body.contains("kill $(jobs -p)"));
    }
}
