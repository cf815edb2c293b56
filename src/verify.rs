// SPDX-License-Identifier: MIT
//! Connectivity verification — one reachability probe per provider kind.
//!
//! Purely diagnostic: results are printed as a pass/fail table and never
//! abort the session. Reachability is recomputed on every run, never
//! cached.

use std::time::Duration;

use crate::envfile::RuntimeConfig;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Which provider an endpoint belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    LocalInference,
    RemoteApi,
}

/// Result of one endpoint probe.
#[derive(Debug, Clone)]
pub struct EndpointCheck {
    pub kind: EndpointKind,
    pub name: &'static str,
    pub url: String,
    pub reachable: bool,
    pub detail: String,
}

async fn probe(
    client: &reqwest::Client,
    url: &str,
    bearer: Option<&str>,
) -> (bool, String) {
    let mut req = client.get(url).timeout(PROBE_TIMEOUT);
    if let Some(token) = bearer {
        req = req.bearer_auth(token);
    }
    match req.send().await {
        Ok(resp) if resp.status().is_success() => (true, format!("HTTP {}", resp.status())),
        Ok(resp) => (false, format!("HTTP {}", resp.status())),
        Err(e) => (false, e.to_string()),
    }
}

/// Probe both provider endpoints named in the configuration.
pub async fn run_checks(config: &RuntimeConfig) -> Vec<EndpointCheck> {
    let client = reqwest::Client::new();
    let mut checks = Vec::with_capacity(2);

    if let Some(base) = config.get("OLLAMA_BASE_URL") {
        let url = format!("{base}/api/tags");
        let (reachable, detail) = probe(&client, &url, None).await;
        checks.push(EndpointCheck {
            kind: EndpointKind::LocalInference,
            name: "Ollama",
            url,
            reachable,
            detail,
        });
    }

    if let Some(base) = config.get("OPENAI_API_BASE_URL") {
        let url = format!("{base}/models");
        let (reachable, detail) = probe(&client, &url, config.get("OPENAI_API_KEY")).await;
        checks.push(EndpointCheck {
            kind: EndpointKind::RemoteApi,
            name: "OpenAI API",
            url,
            reachable,
            detail,
        });
    }

    checks
}

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

/// Print a formatted table of endpoint checks to stdout.
pub fn print_results(checks: &[EndpointCheck]) {
    println!();
    println!("{BOLD}devstack verify — connectivity{RESET}");
    println!("{}", "─".repeat(60));
    for c in checks {
        let (symbol, color) = if c.reachable {
            ("✓", GREEN)
        } else {
            ("✗", RED)
        };
        println!("  {color}{symbol}{RESET}  {:<12}  {}  ({})", c.name, c.url, c.detail);
    }
    println!("{}", "─".repeat(60));
    let unreachable = checks.iter().filter(|c| !c.reachable).count();
    if unreachable == 0 {
        println!("{GREEN}All endpoints reachable.{RESET}");
    } else {
        println!("{RED}{unreachable} endpoint(s) unreachable — see above.{RESET} The session is still usable.");
    }
    println!();
}
