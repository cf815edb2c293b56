// SPDX-License-Identifier: MIT
//! The provisioning pipeline — `devstack setup`.
//!
//! Strictly sequential: detection → install → credential → service
//! activation → dependency install → config synthesis → model prefetch →
//! script materialization → connectivity report. State flows through an
//! explicit [`SetupState`] value; no step reads or writes globals.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{info, warn};

use crate::envfile::{self, RuntimeConfig, DEFAULT_OLLAMA_URL};
use crate::interact::{acquire_credential, Interaction};
use crate::platform::Platform;
use crate::prefetch::{self, JobStatus, ModelPuller, OllamaClient};
use crate::{activate, deps, doctor, install, scripts, verify};

/// Options for one pipeline run.
pub struct SetupOptions {
    /// Project root holding `package.json` and `backend/`.
    pub dir: PathBuf,
    pub skip_models: bool,
    pub quiet: bool,
}

/// Pipeline state threaded step to step.
#[derive(Debug, Clone)]
pub struct SetupState {
    pub platform: Platform,
    /// Confirmed by a detection pass — the installer never sets this
    /// directly, the pipeline re-probes after installing.
    pub ollama_installed: bool,
    /// Set by the service activator; gates the prefetch step.
    pub ollama_running: bool,
}

/// Run the full provisioning pipeline.
pub async fn run(opts: &SetupOptions, interaction: &mut dyn Interaction) -> Result<()> {
    let say = |msg: &str| {
        if !opts.quiet {
            println!("{msg}");
        }
    };

    // 1. Prerequisite detection. Mandatory tools are fatal here.
    say("Checking prerequisites...");
    let report = doctor::detect_prerequisites();
    doctor::ensure_mandatory(&report)?;
    let mut state = SetupState {
        platform: Platform::detect(),
        ollama_installed: report.is_present("ollama"),
        ollama_running: false,
    };
    info!(platform = %state.platform, ollama = state.ollama_installed, "prerequisites ok");

    // 2. Install Ollama if absent, then confirm with a fresh probe —
    //    the captured report stays as detected.
    if !state.ollama_installed {
        say("Ollama not found — installing...");
        install::install_ollama(state.platform)?;
        state.ollama_installed = reprobe_presence("ollama");
        if !state.ollama_installed {
            warn!("ollama still not resolvable after install — model prefetch will be skipped");
        }
    }

    // 3. Credential, before any artifact is written.
    let credential = acquire_credential(interaction)?;

    // 4. Service activation (only meaningful with the binary present).
    if state.ollama_installed {
        let probe_client = reqwest::Client::new();
        state.ollama_running =
            activate::ensure_running(&probe_client, DEFAULT_OLLAMA_URL, interaction).await?;
    }

    // 5. Dependencies — hard precondition for everything after.
    say("Installing dependencies...");
    deps::install_frontend(&opts.dir)?;
    deps::install_backend(&opts.dir)?;

    // 6. Configuration artifact.
    let config = RuntimeConfig::new(&credential);
    envfile::write_env(&opts.dir, &config)?;

    // 7. Model prefetch — convenience only, per-model failures tolerated.
    if state.ollama_installed && state.ollama_running && !opts.skip_models {
        say("Prefetching models...");
        let client = OllamaClient::new(DEFAULT_OLLAMA_URL);
        prefetch_and_report(&client, opts.quiet).await;
    } else if !opts.skip_models {
        say("Skipping model prefetch (Ollama unavailable).");
    }

    // 8. Launcher artifacts.
    scripts::materialize(&opts.dir)?;

    // 9. Connectivity report — diagnostic only, never fatal.
    let checks = verify::run_checks(&config).await;
    if !opts.quiet {
        verify::print_results(&checks);
    }

    print_summary(&opts.dir, opts.quiet);
    Ok(())
}

async fn prefetch_and_report(puller: &dyn ModelPuller, quiet: bool) {
    let jobs = prefetch::pull_models(puller, prefetch::DEFAULT_MODELS, quiet).await;
    let failed: Vec<_> = jobs
        .iter()
        .filter(|j| j.status == JobStatus::Failed)
        .collect();
    if failed.is_empty() {
        info!(count = jobs.len(), "all models pulled");
    } else {
        for job in &failed {
            warn!(model = %job.name, "model not available — pull it later with `devstack pull`");
        }
    }
}

/// Post-install confirmation: a fresh probe decides presence; the
/// detection-time report is read-only and never updated in place.
fn reprobe_presence(tool: &str) -> bool {
    doctor::probe_tool(tool).present
}

fn print_summary(dir: &Path, quiet: bool) {
    if quiet {
        return;
    }
    println!();
    println!("Setup complete. Artifacts written to {}:", dir.display());
    println!("  .env               runtime configuration");
    println!("  start_backend.sh   backend launcher");
    println!("  start_frontend.sh  front-end launcher");
    println!("  start_all.sh       combined launcher");
    println!();
    println!("Start the stack with `devstack up` (or ./start_all.sh).");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doctor::{PrerequisiteReport, ToolCheck, ToolStatus};

    fn report_without_ollama() -> PrerequisiteReport {
        PrerequisiteReport {
            tools: vec![ToolCheck {
                name: "ollama",
                mandatory: false,
                hint: "",
                status: ToolStatus {
                    present: false,
                    version: None,
                },
            }],
        }
    }

    /// The installer never mutates the captured report: after an install
    /// attempt, only the threaded state changes, and only from a fresh
    /// detection pass.
    #[test]
    fn install_attempt_leaves_captured_report_untouched() {
        let report = report_without_ollama();
        let mut state = SetupState {
            platform: Platform::Other,
            ollama_installed: report.is_present("ollama"),
            ollama_running: false,
        };

        // Non-automatable platform: the install halts with instructions.
        assert!(install::install_ollama(state.platform).is_err());

        // A fresh probe (of a binary that cannot exist) feeds the state.
        state.ollama_installed = reprobe_presence("devstack-test-missing-ollama");

        assert!(!report.is_present("ollama"), "report must stay as detected");
        assert!(!state.ollama_installed);
    }
}
