// SPDX-License-Identifier: MIT
//! Model prefetching against the Ollama API.
//!
//! Pulls a fixed ordered list of models so the stack is usable offline on
//! first launch. Each pull succeeds or fails independently — a failed pull
//! is a warning, never a pipeline error, and never skips later items.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use tracing::{info, warn};

/// Models pulled by default after setup.
pub const DEFAULT_MODELS: &[&str] = &["llama3.2", "qwen2.5-coder:7b", "nomic-embed-text"];

/// Outcome of one pull attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Succeeded,
    Failed,
}

/// One entry in the prefetch list with its final status.
#[derive(Debug, Clone)]
pub struct ModelJob {
    pub name: String,
    pub status: JobStatus,
}

/// Seam for issuing pull requests — the real [`OllamaClient`] in
/// production, a scripted double in tests.
#[async_trait]
pub trait ModelPuller {
    async fn pull(&self, name: &str) -> Result<()>;
}

/// Thin client over the Ollama HTTP API.
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct PullResponse {
    #[serde(default)]
    status: String,
}

impl OllamaClient {
    /// The shared probe client carries a global short timeout; pulls can
    /// run for minutes, so this client sets none and callers rely on the
    /// server's own completion signal.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Short-timeout reachability check against `/api/tags`.
    pub async fn is_reachable(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        matches!(
            self.client
                .get(&url)
                .timeout(Duration::from_secs(2))
                .send()
                .await,
            Ok(resp) if resp.status().is_success()
        )
    }
}

#[async_trait]
impl ModelPuller for OllamaClient {
    async fn pull(&self, name: &str) -> Result<()> {
        let url = format!("{}/api/pull", self.base_url);
        let body = serde_json::json!({ "name": name, "stream": false });

        let resp = self.client.post(&url).json(&body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            anyhow::bail!("HTTP {status}: {detail}");
        }

        let parsed: PullResponse = resp.json().await?;
        if parsed.status == "success" || parsed.status.is_empty() {
            Ok(())
        } else {
            anyhow::bail!("pull ended with status `{}`", parsed.status)
        }
    }
}

/// Pull every model in order, recording per-item status.
///
/// Failure of item *i* never skips item *i+1*.
pub async fn pull_models(puller: &dyn ModelPuller, models: &[&str], quiet: bool) -> Vec<ModelJob> {
    let mut jobs: Vec<ModelJob> = models
        .iter()
        .map(|m| ModelJob {
            name: m.to_string(),
            status: JobStatus::Pending,
        })
        .collect();

    for job in &mut jobs {
        let spinner = if quiet {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::with_template("{spinner} pulling {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.set_message(job.name.clone());
            pb.enable_steady_tick(Duration::from_millis(120));
            pb
        };

        match puller.pull(&job.name).await {
            Ok(()) => {
                job.status = JobStatus::Succeeded;
                spinner.finish_with_message(format!("{} pulled", job.name));
                info!(model = %job.name, "model pulled");
            }
            Err(e) => {
                job.status = JobStatus::Failed;
                spinner.finish_with_message(format!("{} failed", job.name));
                warn!(model = %job.name, error = %e, "model pull failed — continuing");
            }
        }
    }

    jobs
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Fails every model whose name appears in `fail`; records call order.
    struct Scripted {
        fail: Vec<&'static str>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ModelPuller for Scripted {
        async fn pull(&self, name: &str) -> Result<()> {
            self.calls.lock().unwrap().push(name.to_string());
            if self.fail.contains(&name) {
                anyhow::bail!("simulated pull failure")
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn failure_does_not_skip_later_models() {
        let puller = Scripted {
            fail: vec!["b"],
            calls: Mutex::new(Vec::new()),
        };
        let jobs = pull_models(&puller, &["a", "b", "c"], true).await;

        assert_eq!(
            puller.calls.lock().unwrap().as_slice(),
            ["a", "b", "c"],
            "all pulls must be issued in order"
        );
        assert_eq!(jobs[0].status, JobStatus::Succeeded);
        assert_eq!(jobs[1].status, JobStatus::Failed);
        assert_eq!(jobs[2].status, JobStatus::Succeeded);
    }

    #[tokio::test]
    async fn all_failures_still_attempt_everything() {
        let puller = Scripted {
            fail: vec!["a", "b"],
            calls: Mutex::new(Vec::new()),
        };
        let jobs = pull_models(&puller, &["a", "b"], true).await;
        assert_eq!(puller.calls.lock().unwrap().len(), 2);
        assert!(jobs.iter().all(|j| j.status == JobStatus::Failed));
    }
}
