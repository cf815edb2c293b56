// SPDX-License-Identifier: MIT
//! Interactive terminal capabilities and credential acquisition.
//!
//! Both blocking prompts in the pipeline (masked API-key entry, the
//! "press Enter when ready" confirmation) sit behind the [`Interaction`]
//! trait so tests supply scripted responses without real terminal I/O.

use std::io::Write;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use tracing::info;

use crate::error::SetupError;

/// Environment variable consulted before falling back to the prompt.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Where the credential came from. Interactive keys live only for the
/// session (plus the generated `.env` artifact).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Environment,
    Interactive,
}

/// The remote-API credential for this session.
#[derive(Debug, Clone)]
pub struct ProviderCredential {
    pub key: String,
    pub source: CredentialSource,
}

/// Terminal capabilities the pipeline needs from the operator.
pub trait Interaction {
    /// Prompt for one line of masked input.
    fn read_secret(&mut self, prompt: &str) -> Result<String>;
    /// Print `prompt`, block until the operator presses Enter, discard
    /// the line.
    fn confirm(&mut self, prompt: &str) -> Result<()>;
}

/// Real terminal implementation. Masked entry uses crossterm raw mode so
/// typed characters never echo.
pub struct Terminal;

impl Interaction for Terminal {
    fn read_secret(&mut self, prompt: &str) -> Result<String> {
        print!("{prompt}: ");
        std::io::stdout().flush()?;

        crossterm::terminal::enable_raw_mode()?;
        let result = read_masked_line();
        crossterm::terminal::disable_raw_mode()?;
        println!();
        result
    }

    fn confirm(&mut self, prompt: &str) -> Result<()> {
        print!("{prompt} ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
        Ok(())
    }
}

/// Read key events until Enter. Raw mode must already be enabled.
fn read_masked_line() -> Result<String> {
    let mut buf = String::new();
    loop {
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Enter => break,
                KeyCode::Backspace => {
                    buf.pop();
                }
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    anyhow::bail!("interrupted");
                }
                KeyCode::Char(c) => buf.push(c),
                _ => {}
            }
        }
    }
    Ok(buf)
}

/// Obtain the remote-API credential: environment first, then one masked
/// prompt. An empty result after prompting is fatal.
pub fn acquire_credential(
    interaction: &mut dyn Interaction,
) -> Result<ProviderCredential, SetupError> {
    let env_value = std::env::var(API_KEY_ENV).ok().filter(|v| !v.is_empty());
    acquire_from(env_value, interaction)
}

/// Testable core of `acquire_credential` — the environment lookup is an
/// input rather than ambient state.
pub fn acquire_from(
    env_value: Option<String>,
    interaction: &mut dyn Interaction,
) -> Result<ProviderCredential, SetupError> {
    if let Some(key) = env_value {
        info!("using API key from {API_KEY_ENV}");
        return Ok(ProviderCredential {
            key,
            source: CredentialSource::Environment,
        });
    }

    let key = interaction
        .read_secret("Enter your OpenAI API key")
        .map_err(|_| SetupError::MissingCredential)?;
    if key.trim().is_empty() {
        return Err(SetupError::MissingCredential);
    }
    Ok(ProviderCredential {
        key: key.trim().to_string(),
        source: CredentialSource::Interactive,
    })
}
