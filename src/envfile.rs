// SPDX-License-Identifier: MIT
//! Runtime configuration synthesis — renders the `.env` artifact.
//!
//! The artifact is a flat `KEY=value` file consumed by the backend launcher
//! (exported into the process environment) and by `devstack verify`.
//! Rendering is fully deterministic: same inputs, same bytes. Re-running
//! setup overwrites the file without merging.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::interact::ProviderCredential;

pub const DEFAULT_BACKEND_PORT: u16 = 8080;
pub const DEFAULT_FRONTEND_ORIGIN: &str = "http://localhost:5173";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";

pub const ENV_FILE_NAME: &str = ".env";

/// Ordered key/value pairs written to the configuration artifact.
///
/// Order is fixed at construction and preserved in the rendered output —
/// a `Vec` rather than a map so repeated runs emit identical bytes.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pairs: Vec<(String, String)>,
}

impl RuntimeConfig {
    /// Build the standard single-connection configuration.
    ///
    /// Both provider kinds are enabled; multi-connection syntax is emitted
    /// only as commented templates (see `render`).
    pub fn new(credential: &ProviderCredential) -> Self {
        let pairs = vec![
            ("ENV".to_string(), "dev".to_string()),
            ("PORT".to_string(), DEFAULT_BACKEND_PORT.to_string()),
            (
                "CORS_ALLOW_ORIGIN".to_string(),
                DEFAULT_FRONTEND_ORIGIN.to_string(),
            ),
            ("ENABLE_OLLAMA_API".to_string(), "true".to_string()),
            (
                "OLLAMA_BASE_URL".to_string(),
                DEFAULT_OLLAMA_URL.to_string(),
            ),
            ("ENABLE_OPENAI_API".to_string(), "true".to_string()),
            (
                "OPENAI_API_BASE_URL".to_string(),
                DEFAULT_OPENAI_URL.to_string(),
            ),
            ("OPENAI_API_KEY".to_string(), credential.key.clone()),
            (
                "ENABLE_MULTI_CONNECTIONS".to_string(),
                "false".to_string(),
            ),
        ];
        Self { pairs }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Enablement invariant: every `ENABLE_*=true` flag must have its
    /// paired base-URL (and, for the remote API, credential) keys present
    /// and non-empty.
    pub fn validate(&self) -> Result<()> {
        let enabled = |flag: &str| self.get(flag) == Some("true");
        let non_empty = |key: &str| self.get(key).is_some_and(|v| !v.is_empty());

        if enabled("ENABLE_OLLAMA_API") && !non_empty("OLLAMA_BASE_URL") {
            anyhow::bail!("ENABLE_OLLAMA_API=true but OLLAMA_BASE_URL is empty");
        }
        if enabled("ENABLE_OPENAI_API") {
            if !non_empty("OPENAI_API_BASE_URL") {
                anyhow::bail!("ENABLE_OPENAI_API=true but OPENAI_API_BASE_URL is empty");
            }
            if !non_empty("OPENAI_API_KEY") {
                anyhow::bail!("ENABLE_OPENAI_API=true but OPENAI_API_KEY is empty");
            }
        }
        Ok(())
    }

    /// Render the artifact text. Deterministic — no timestamps, no
    /// randomness, fixed key order, fixed template block.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("# Generated by devstack — re-run `devstack setup` to regenerate.\n");
        for (k, v) in &self.pairs {
            out.push_str(k);
            out.push('=');
            out.push_str(v);
            out.push('\n');
        }
        out.push('\n');
        out.push_str("# Multiple connections use `;` delimited lists (index-aligned).\n");
        out.push_str("# Uncomment and set ENABLE_MULTI_CONNECTIONS=true to activate:\n");
        out.push_str("# OLLAMA_BASE_URLS=http://localhost:11434;http://gpu-box:11434\n");
        out.push_str(
            "# OPENAI_API_BASE_URLS=https://api.openai.com/v1;https://api.example.com/v1\n",
        );
        out.push_str("# OPENAI_API_KEYS=sk-first;sk-second\n");
        out
    }
}

/// Read a previously written artifact back into a `RuntimeConfig` view.
/// Comment lines (the inactive multi-connection templates) are skipped.
pub fn read_env(dir: &Path) -> Result<RuntimeConfig> {
    let path = dir.join(ENV_FILE_NAME);
    let body = std::fs::read_to_string(&path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let pairs = body
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .filter_map(|l| {
            l.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        })
        .collect();
    Ok(RuntimeConfig { pairs })
}

/// Validate and write the artifact, overwriting any previous version.
pub fn write_env(dir: &Path, config: &RuntimeConfig) -> Result<()> {
    config.validate()?;
    let path = dir.join(ENV_FILE_NAME);
    std::fs::write(&path, config.render())
        .with_context(|| format!("cannot write {}", path.display()))?;
    info!(path = %path.display(), "configuration artifact written");
    Ok(())
}
