// SPDX-License-Identifier: MIT
//! doctor — prerequisite detection and pre-flight environment checks.
//!
//! Two distinct responsibilities:
//!
//! 1. **Prerequisite detection** (`detect_prerequisites` / `probe_tool`):
//!    the first pipeline step. Resolves each required tool on PATH and
//!    captures a version string. Missing mandatory tools are fatal;
//!    a missing `ollama` only flags the installer step.
//!
//! 2. **Pre-flight CLI checks** (`run_doctor` / `print_doctor_results`):
//!    the `devstack doctor` subcommand. Prerequisites plus environment
//!    diagnostics (backend port free, Ollama endpoint reachable).

use std::process::Command;
use std::time::Duration;

use crate::envfile::{DEFAULT_BACKEND_PORT, DEFAULT_OLLAMA_URL};
use crate::error::SetupError;

/// Presence and version of a single tool on the execution path.
#[derive(Debug, Clone)]
pub struct ToolStatus {
    pub present: bool,
    /// First line of `<tool> --version` output, when resolvable.
    pub version: Option<String>,
}

/// One probed tool with its classification.
#[derive(Debug, Clone)]
pub struct ToolCheck {
    pub name: &'static str,
    pub mandatory: bool,
    /// Printed in the fatal diagnostic when a mandatory tool is missing.
    pub hint: &'static str,
    pub status: ToolStatus,
}

/// Snapshot of the host's tooling, built once per pipeline run.
///
/// Read-only after construction: the installer never mutates it, the
/// pipeline re-probes after an install instead.
#[derive(Debug, Clone)]
pub struct PrerequisiteReport {
    pub tools: Vec<ToolCheck>,
}

impl PrerequisiteReport {
    pub fn is_present(&self, name: &str) -> bool {
        self.tools
            .iter()
            .any(|t| t.name == name && t.status.present)
    }

    /// First missing mandatory tool, if any.
    pub fn missing_mandatory(&self) -> Option<&ToolCheck> {
        self.tools
            .iter()
            .find(|t| t.mandatory && !t.status.present)
    }
}

const REQUIRED_TOOLS: &[(&str, bool, &str)] = &[
    (
        "node",
        true,
        "install Node.js 18+ from https://nodejs.org",
    ),
    ("npm", true, "npm ships with Node.js — reinstall Node.js"),
    (
        "python3",
        true,
        "install Python 3.11+ from https://python.org",
    ),
    (
        "ollama",
        false,
        "optional — installed automatically on supported platforms",
    ),
];

/// Probe a single tool by running `<tool> --version`.
pub fn probe_tool(name: &str) -> ToolStatus {
    match Command::new(name).arg("--version").output() {
        Ok(out) if out.status.success() => {
            let version = String::from_utf8_lossy(&out.stdout)
                .lines()
                .next()
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty());
            ToolStatus {
                present: true,
                version,
            }
        }
        _ => ToolStatus {
            present: false,
            version: None,
        },
    }
}

/// Probe every required tool and return the report.
pub fn detect_prerequisites() -> PrerequisiteReport {
    let tools = REQUIRED_TOOLS
        .iter()
        .map(|&(name, mandatory, hint)| ToolCheck {
            name,
            mandatory,
            hint,
            status: probe_tool(name),
        })
        .collect();
    PrerequisiteReport { tools }
}

/// Halt with a diagnostic if any mandatory tool is missing.
pub fn ensure_mandatory(report: &PrerequisiteReport) -> Result<(), SetupError> {
    match report.missing_mandatory() {
        Some(tool) => Err(SetupError::MissingMandatoryTool {
            tool: tool.name,
            hint: tool.hint,
        }),
        None => Ok(()),
    }
}

// ─── Pre-flight CLI checks (`devstack doctor`) ───────────────────────────────

/// The result of a single diagnostic check.
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    /// A failed optional check prints as a warning, not a failure.
    pub mandatory: bool,
    pub detail: String,
}

/// Run all diagnostic checks and return a list of results.
pub async fn run_doctor() -> Vec<CheckResult> {
    let report = detect_prerequisites();
    let mut results: Vec<CheckResult> = report
        .tools
        .iter()
        .map(|t| CheckResult {
            name: format!("{} installed", t.name),
            passed: t.status.present,
            mandatory: t.mandatory,
            detail: match (&t.status.version, t.status.present) {
                (Some(v), _) => v.clone(),
                (None, true) => "found on PATH".to_string(),
                (None, false) if t.mandatory => format!("not found in PATH — {}", t.hint),
                (None, false) => "not found in PATH (optional)".to_string(),
            },
        })
        .collect();

    results.push(check_backend_port());
    results.push(check_ollama_reachable().await);
    results
}

/// Backend port is available (not in use by another process).
fn check_backend_port() -> CheckResult {
    let passed = std::net::TcpListener::bind(("127.0.0.1", DEFAULT_BACKEND_PORT)).is_ok();
    CheckResult {
        name: format!("Port {DEFAULT_BACKEND_PORT} available"),
        passed,
        mandatory: true,
        detail: if passed {
            format!("port {DEFAULT_BACKEND_PORT} is free")
        } else {
            format!("port {DEFAULT_BACKEND_PORT} is in use by another process")
        },
    }
}

/// Ollama status endpoint responds. Informational — the activator can
/// start the service later.
async fn check_ollama_reachable() -> CheckResult {
    let url = format!("{DEFAULT_OLLAMA_URL}/api/tags");
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap_or_default();
    let passed = matches!(client.get(&url).send().await, Ok(r) if r.status().is_success());
    CheckResult {
        name: "Ollama reachable".to_string(),
        passed,
        mandatory: false,
        detail: if passed {
            format!("{DEFAULT_OLLAMA_URL} responding")
        } else {
            format!("{DEFAULT_OLLAMA_URL} not responding (service may be stopped)")
        },
    }
}

// ─── Output ───────────────────────────────────────────────────────────────────

const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

/// Print a formatted table of check results to stdout.
pub fn print_doctor_results(results: &[CheckResult]) {
    println!();
    println!("{BOLD}devstack doctor — pre-flight checks{RESET}");
    println!("{}", "─".repeat(60));

    for r in results {
        let (symbol, color) = match (r.passed, r.mandatory) {
            (true, _) => ("✓", GREEN),
            (false, true) => ("✗", RED),
            (false, false) => ("!", YELLOW),
        };
        println!("  {color}{symbol}{RESET}  {:<26}  {}", r.name, r.detail);
    }

    println!("{}", "─".repeat(60));

    let failed = results.iter().filter(|r| !r.passed && r.mandatory).count();
    if failed == 0 {
        println!("{GREEN}All required checks passed.{RESET}");
    } else {
        println!("{RED}{failed} required check(s) failed. See above for details.{RESET}");
    }
    println!();
}
