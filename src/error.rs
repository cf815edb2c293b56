// SPDX-License-Identifier: MIT
//! Typed error taxonomy for the provisioning pipeline.
//!
//! Fatal variants halt the pipeline with a non-zero exit; everything else
//! (service start, model pulls, reachability) degrades to warnings at the
//! call site and never appears here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SetupError {
    /// A mandatory tool (node, npm, python3) is not on PATH.
    #[error("required tool `{tool}` not found — {hint}")]
    MissingMandatoryTool {
        tool: &'static str,
        hint: &'static str,
    },

    /// The host platform has no automated install path for the local
    /// inference runtime. The message carries the manual instructions.
    #[error("{0}")]
    UnsupportedPlatform(String),

    /// No API key in the environment and the interactive prompt returned
    /// an empty line. One prompt only — no retry loop.
    #[error("no API key provided — set OPENAI_API_KEY or enter one at the prompt")]
    MissingCredential,

    /// The automated Ollama install path could not start or exited
    /// non-zero. Distinct from [`Self::DependencyInstall`], which covers
    /// the front-end and backend package installs.
    #[error("ollama install failed: {detail}")]
    OllamaInstall { detail: String },

    /// A front-end or backend dependency install step exited non-zero.
    /// Dependencies are a hard precondition for every later step.
    #[error("dependency install failed: {step}")]
    DependencyInstall { step: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_tool_names_tool_and_hint() {
        let err = SetupError::MissingMandatoryTool {
            tool: "node",
            hint: "install Node.js 18+ from https://nodejs.org",
        };
        let msg = err.to_string();
        assert!(msg.contains("`node`"));
        assert!(msg.contains("nodejs.org"));
    }

    #[test]
    fn installer_failure_names_its_own_class() {
        let err = SetupError::OllamaInstall {
            detail: "install script exited with exit status: 1".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("ollama install failed"));
        assert!(!msg.contains("dependency install"));
    }

    #[test]
    fn missing_credential_mentions_env_var() {
        assert!(SetupError::MissingCredential
            .to_string()
            .contains("OPENAI_API_KEY"));
    }
}
