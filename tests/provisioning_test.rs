// SPDX-License-Identifier: MIT
//! Cross-module provisioning behavior: credential acquisition feeding the
//! configuration artifact, and the fatal paths that must halt before any
//! artifact is written.

use anyhow::Result;
use devstack::envfile::{read_env, write_env, RuntimeConfig, ENV_FILE_NAME};
use devstack::error::SetupError;
use devstack::install::{strategy_for, InstallStrategy};
use devstack::interact::{acquire_from, CredentialSource, Interaction};
use devstack::platform::Platform;
use tempfile::TempDir;

/// Scripted stand-in for the terminal.
struct Scripted {
    secret: Option<String>,
}

impl Interaction for Scripted {
    fn read_secret(&mut self, _prompt: &str) -> Result<String> {
        Ok(self.secret.take().unwrap_or_default())
    }

    fn confirm(&mut self, _prompt: &str) -> Result<()> {
        Ok(())
    }
}

#[test]
fn interactive_credential_flows_into_artifact() {
    let tmp = TempDir::new().unwrap();
    let mut term = Scripted {
        secret: Some("sk-interactive".to_string()),
    };

    let cred = acquire_from(None, &mut term).unwrap();
    assert_eq!(cred.source, CredentialSource::Interactive);

    let config = RuntimeConfig::new(&cred);
    write_env(tmp.path(), &config).unwrap();

    let loaded = read_env(tmp.path()).unwrap();
    assert_eq!(loaded.get("OPENAI_API_KEY"), Some("sk-interactive"));
    assert_eq!(loaded.get("ENABLE_OPENAI_API"), Some("true"));
    assert_eq!(loaded.get("ENABLE_OLLAMA_API"), Some("true"));
}

/// Credential env unset plus empty interactive input halts with
/// MissingCredential — and no artifact exists at that point.
#[test]
fn empty_credential_halts_before_artifact() {
    let tmp = TempDir::new().unwrap();
    let mut term = Scripted {
        secret: Some(String::new()),
    };

    let err = acquire_from(None, &mut term).unwrap_err();
    assert!(matches!(err, SetupError::MissingCredential));
    assert!(
        !tmp.path().join(ENV_FILE_NAME).exists(),
        "no configuration artifact may be written without a credential"
    );
}

/// An artifact can never be written with an enabled provider whose
/// credential is empty, even if a caller bypasses acquisition.
#[test]
fn write_env_enforces_enablement_invariant() {
    let tmp = TempDir::new().unwrap();
    let cred = devstack::interact::ProviderCredential {
        key: String::new(),
        source: CredentialSource::Interactive,
    };
    let config = RuntimeConfig::new(&cred);
    assert!(write_env(tmp.path(), &config).is_err());
    assert!(!tmp.path().join(ENV_FILE_NAME).exists());
}

/// Installer dispatch is total over the platform enumeration.
#[test]
fn installer_selects_one_strategy_per_platform() {
    for platform in [Platform::Linux, Platform::MacOs, Platform::Other] {
        match strategy_for(platform) {
            InstallStrategy::RunScript(cmd) => {
                assert_eq!(platform, Platform::Linux);
                assert!(cmd.contains("ollama.com/install.sh"));
            }
            InstallStrategy::Manual(msg) => {
                assert_eq!(platform, Platform::MacOs);
                assert!(msg.contains("ollama.com/download"));
            }
            InstallStrategy::Unsupported(_) => {
                assert_eq!(platform, Platform::Other);
            }
        }
    }
}

/// Rendering twice with identical inputs yields byte-identical artifacts.
#[test]
fn repeated_setup_is_reproducible() {
    let cred = devstack::interact::ProviderCredential {
        key: "sk-fixed".to_string(),
        source: CredentialSource::Environment,
    };

    let tmp_a = TempDir::new().unwrap();
    let tmp_b = TempDir::new().unwrap();
    write_env(tmp_a.path(), &RuntimeConfig::new(&cred)).unwrap();
    write_env(tmp_b.path(), &RuntimeConfig::new(&cred)).unwrap();

    let a = std::fs::read(tmp_a.path().join(ENV_FILE_NAME)).unwrap();
    let b = std::fs::read(tmp_b.path().join(ENV_FILE_NAME)).unwrap();
    assert_eq!(a, b);
}
