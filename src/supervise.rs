// SPDX-License-Identifier: MIT
//! Process supervisor — `devstack up`.
//!
//! Starts the backend and front-end launchers as one managed group,
//! blocks until Ctrl-C or until every child has exited on its own, then
//! delivers a terminate signal to each recorded pid. Best-effort cleanup
//! for an interactive foreground session: no restart policy, no health
//! polling, exit status 0 either way.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::process::{Child, Command};
use tracing::{info, warn};

use crate::scripts::{BACKEND_LAUNCHER, FRONTEND_LAUNCHER};

/// Heuristic warm-up delay so the backend binds its port before the
/// front-end dev server starts proxying to it. Not a readiness check.
pub const BACKEND_WARMUP: Duration = Duration::from_secs(3);

const REAP_TIMEOUT: Duration = Duration::from_secs(5);

/// Child process handles owned exclusively by the supervisor.
#[derive(Default)]
pub struct ProcessGroup {
    children: Vec<(String, Child)>,
}

impl ProcessGroup {
    /// Spawn a launcher script as a background child of this group.
    ///
    /// Launchers are executed directly so the shebang selects the
    /// interpreter — the materialized scripts are bash and use options
    /// the platform `sh` may reject.
    pub fn spawn(&mut self, name: &str, script: &Path) -> Result<()> {
        let child = Command::new(script)
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to start {}", script.display()))?;
        info!(name, pid = child.id(), "service started");
        self.children.push((name.to_string(), child));
        Ok(())
    }

    pub fn pids(&self) -> Vec<u32> {
        self.children.iter().filter_map(|(_, c)| c.id()).collect()
    }

    /// Block until every child has exited.
    pub async fn wait_all(&mut self) {
        for (name, child) in &mut self.children {
            match child.wait().await {
                Ok(status) => info!(name = %name, %status, "service exited"),
                Err(e) => warn!(name = %name, error = %e, "wait failed"),
            }
        }
    }

    /// Signal every recorded child, then reap each with a short timeout.
    /// Individual failures are logged and ignored.
    pub async fn terminate_all(&mut self) {
        for (name, child) in &mut self.children {
            if let Some(pid) = child.id() {
                info!(name = %name, pid, "terminating");
                send_terminate(pid, child);
            }
        }
        for (name, child) in &mut self.children {
            match tokio::time::timeout(REAP_TIMEOUT, child.wait()).await {
                Ok(Ok(status)) => info!(name = %name, %status, "service stopped"),
                Ok(Err(e)) => warn!(name = %name, error = %e, "reap failed"),
                Err(_) => {
                    warn!(name = %name, "did not stop in time — killing");
                    let _ = child.start_kill();
                }
            }
        }
    }
}

#[cfg(unix)]
fn send_terminate(pid: u32, _child: &mut Child) {
    unsafe {
        libc::kill(pid as libc::pid_t, libc::SIGTERM);
    }
}

#[cfg(not(unix))]
fn send_terminate(_pid: u32, child: &mut Child) {
    let _ = child.start_kill();
}

/// Run the supervisor: spawn both launchers, wait for Ctrl-C or group
/// exit, then tear the group down. Always returns `Ok` — a crashed child
/// ends the session, it does not fail it.
pub async fn run(dir: &Path) -> Result<()> {
    let mut group = ProcessGroup::default();

    group.spawn("backend", &dir.join(BACKEND_LAUNCHER))?;
    tokio::time::sleep(BACKEND_WARMUP).await;
    group.spawn("frontend", &dir.join(FRONTEND_LAUNCHER))?;

    println!("Backend and front-end running. Press Ctrl-C to stop both.");

    let interrupted = tokio::select! {
        _ = tokio::signal::ctrl_c() => true,
        _ = group.wait_all() => false,
    };

    if interrupted {
        info!("interrupt received — terminating process group");
        group.terminate_all().await;
    } else {
        warn!("all services exited on their own");
    }
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    /// Write an executable script in the shape the materializer emits:
    /// bash shebang, strict-mode options included.
    fn launcher_script(dir: &Path, name: &str, tail: &str) -> std::path::PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        let body = format!("#!/usr/bin/env bash\nset -euo pipefail\n{tail}\n");
        std::fs::write(&path, body).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[tokio::test]
    async fn bash_only_launchers_stay_alive_after_spawn() {
        // `set -o pipefail` is rejected by dash; a launcher spawned
        // through the platform `sh` would exit immediately with status 2.
        let tmp = tempfile::TempDir::new().unwrap();
        let path = launcher_script(tmp.path(), "launcher.sh", "sleep 30");

        let mut group = ProcessGroup::default();
        group.spawn("svc", &path).unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;

        let pid = group.pids()[0];
        let alive = unsafe { libc::kill(pid as libc::pid_t, 0) } == 0;
        assert!(alive, "launcher exited right after spawn");

        group.terminate_all().await;
    }

    #[tokio::test]
    async fn terminate_all_stops_every_child() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut group = ProcessGroup::default();
        group
            .spawn("a", &launcher_script(tmp.path(), "a.sh", "sleep 30"))
            .unwrap();
        group
            .spawn("b", &launcher_script(tmp.path(), "b.sh", "sleep 30"))
            .unwrap();

        let pids = group.pids();
        assert_eq!(pids.len(), 2);

        group.terminate_all().await;

        // kill(pid, 0) fails once the process is reaped.
        for pid in pids {
            let alive = unsafe { libc::kill(pid as libc::pid_t, 0) } == 0;
            assert!(!alive, "pid {pid} still alive after terminate_all");
        }
    }

    #[tokio::test]
    async fn wait_all_returns_when_children_exit() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = launcher_script(tmp.path(), "quick.sh", "exit 0");

        let mut group = ProcessGroup::default();
        group.spawn("quick", &path).unwrap();
        tokio::time::timeout(Duration::from_secs(10), group.wait_all())
            .await
            .expect("wait_all should unblock once the child exits");
    }
}
