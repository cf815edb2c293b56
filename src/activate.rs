// SPDX-License-Identifier: MIT
//! Ollama service activation.
//!
//! Probe the status endpoint; if the service is already up, do nothing.
//! Otherwise issue exactly one service-manager start (when one is
//! detectable) followed by one re-probe, or fall back to a manual-start
//! instruction that blocks on operator confirmation. Deliberately
//! single-attempt — this runs once per interactive session, not unattended.
//!
//! The endpoint probe and the service manager sit behind seams so tests
//! can count invocations without network or systemctl.

use std::process::Command;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use crate::interact::Interaction;

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);
const START_SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Seam for the status-endpoint check.
#[async_trait]
pub trait StatusProbe {
    async fn check(&mut self) -> bool;
}

/// One short-timeout GET against `{base_url}/api/tags`.
pub struct HttpProbe {
    client: reqwest::Client,
    url: String,
}

impl HttpProbe {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            url: format!("{base_url}/api/tags"),
        }
    }
}

#[async_trait]
impl StatusProbe for HttpProbe {
    async fn check(&mut self) -> bool {
        matches!(
            self.client.get(&self.url).timeout(PROBE_TIMEOUT).send().await,
            Ok(resp) if resp.status().is_success()
        )
    }
}

/// Seam for the host service manager.
pub trait ServiceManager {
    fn available(&self) -> bool;
    /// Issue the one start command.
    fn start(&mut self) -> Result<()>;
}

/// systemd — the only service manager the activator drives.
pub struct Systemctl;

impl ServiceManager for Systemctl {
    fn available(&self) -> bool {
        Command::new("systemctl")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn start(&mut self) -> Result<()> {
        let status = Command::new("systemctl").args(["start", "ollama"]).status()?;
        if !status.success() {
            anyhow::bail!("`systemctl start ollama` exited with {status}");
        }
        Ok(())
    }
}

/// Ensure the Ollama service answers on `base_url`.
///
/// Never fatal: a start failure degrades to the manual fallback, and an
/// endpoint that stays down after the one recovery attempt is reported as
/// a warning for the prefetch step to tolerate.
pub async fn ensure_running(
    client: &reqwest::Client,
    base_url: &str,
    interaction: &mut dyn Interaction,
) -> Result<bool> {
    let mut probe = HttpProbe::new(client.clone(), base_url);
    activate_with(&mut probe, &mut Systemctl, interaction).await
}

/// Core activation sequence: at most one start command, at most one
/// re-probe after the initial check.
pub async fn activate_with(
    probe: &mut dyn StatusProbe,
    manager: &mut dyn ServiceManager,
    interaction: &mut dyn Interaction,
) -> Result<bool> {
    if probe.check().await {
        info!("Ollama service already running");
        return Ok(true);
    }

    if manager.available() {
        info!("Ollama not responding — starting via the service manager");
        match manager.start() {
            Ok(()) => tokio::time::sleep(START_SETTLE_DELAY).await,
            Err(e) => warn!(error = %e, "service start failed"),
        }
    } else {
        println!("Ollama is installed but not running.");
        println!("Start it in another terminal with: ollama serve");
        interaction.confirm("Press Enter once Ollama is running...")?;
    }

    // One re-probe, no polling loop.
    let up = probe.check().await;
    if up {
        info!("Ollama service is up");
    } else {
        warn!("Ollama still unreachable — model prefetch will be skipped");
    }
    Ok(up)
}
