// SPDX-License-Identifier: MIT
use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use devstack::envfile::DEFAULT_OLLAMA_URL;
use devstack::interact::Terminal;
use devstack::prefetch::{self, JobStatus, OllamaClient};
use devstack::setup::{self, SetupOptions};
use devstack::{doctor, supervise, verify};

#[derive(Parser)]
#[command(
    name = "devstack",
    about = "devstack — local AI chat stack provisioner",
    version
)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Project root containing package.json and backend/ (default: cwd)
    #[arg(long, env = "DEVSTACK_DIR", global = true)]
    dir: Option<std::path::PathBuf>,

    /// Log level filter (trace, debug, info, warn, error)
    #[arg(long, env = "DEVSTACK_LOG")]
    log: Option<String>,

    /// Suppress progress and informational output.
    ///
    /// Errors are still printed to stderr. Use this flag when piping
    /// output to other tools.
    #[arg(long, short = 'q', global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full provisioning pipeline (default when no subcommand given).
    ///
    /// Detects prerequisites, installs Ollama if missing, acquires the
    /// API key, installs dependencies, writes .env and the launcher
    /// scripts, prefetches models, and reports connectivity.
    ///
    /// Examples:
    ///   devstack setup
    ///   devstack
    ///   OPENAI_API_KEY=sk-... devstack setup --skip-models
    Setup {
        /// Skip the model prefetch step
        #[arg(long)]
        skip_models: bool,
    },
    /// Run diagnostic checks on stack prerequisites.
    ///
    /// Checks tool installation (node, npm, python3, ollama), backend
    /// port availability, and Ollama endpoint reachability.
    ///
    /// Exit code 0 if all required checks pass, 1 if any fails.
    ///
    /// Examples:
    ///   devstack doctor
    Doctor,
    /// Start backend and front-end as a supervised process group.
    ///
    /// Spawns the generated launchers, waits a short warm-up between
    /// them, and stops both on Ctrl-C. Exits 0 after teardown.
    ///
    /// Examples:
    ///   devstack up
    Up,
    /// Probe both provider endpoints and print a reachability table.
    ///
    /// Diagnostic only — always exits 0.
    ///
    /// Examples:
    ///   devstack verify
    Verify,
    /// Pull models into the local Ollama runtime.
    ///
    /// Each pull succeeds or fails independently; failures are warnings.
    ///
    /// Examples:
    ///   devstack pull
    ///   devstack pull llama3.2 mistral
    Pull {
        /// Models to pull (default: the standard prefetch list)
        models: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Init once — must happen before any tracing calls.
    let log_level = args.log.as_deref().unwrap_or("info").to_owned();
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .compact()
        .init();

    let dir = match args.dir {
        Some(d) => d,
        None => std::env::current_dir().context("failed to determine current directory")?,
    };
    let quiet = args.quiet;

    match args.command {
        Some(Command::Doctor) => {
            let results = doctor::run_doctor().await;
            doctor::print_doctor_results(&results);
            let failed = results.iter().filter(|r| !r.passed && r.mandatory).count();
            std::process::exit(if failed == 0 { 0 } else { 1 });
        }
        Some(Command::Up) => {
            supervise::run(&dir).await?;
        }
        Some(Command::Verify) => {
            let config = load_config(&dir)?;
            let checks = verify::run_checks(&config).await;
            verify::print_results(&checks);
        }
        Some(Command::Pull { models }) => {
            let client = OllamaClient::new(DEFAULT_OLLAMA_URL);
            let names: Vec<&str> = if models.is_empty() {
                prefetch::DEFAULT_MODELS.to_vec()
            } else {
                models.iter().map(String::as_str).collect()
            };
            let jobs = prefetch::pull_models(&client, &names, quiet).await;
            let failed = jobs.iter().filter(|j| j.status == JobStatus::Failed).count();
            if failed > 0 {
                eprintln!("{failed} model(s) failed to pull — see warnings above.");
            }
        }
        other => {
            let skip_models = matches!(other, Some(Command::Setup { skip_models: true }));
            let opts = SetupOptions {
                dir,
                skip_models,
                quiet,
            };
            let mut terminal = Terminal;
            setup::run(&opts, &mut terminal).await?;
        }
    }

    Ok(())
}

/// Rebuild a RuntimeConfig view from the written `.env` for `verify`.
fn load_config(dir: &std::path::Path) -> Result<devstack::envfile::RuntimeConfig> {
    devstack::envfile::read_env(dir)
        .context("cannot read .env — run `devstack setup` first")
}
