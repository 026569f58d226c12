//! Manage provider API keys.

use anyhow::{Result, bail};
use clap::Args;
use dialoguer::{Password, theme::ColorfulTheme};
use timelens_imagegen::CredentialType;
use timelens_imagegen::auth::{CredentialSource, KeyringSecretStore, SecretStore};

use crate::config::ConfigLoader;

/// Auth arguments.
#[derive(Args, Debug)]
pub struct AuthArgs {
    /// Credential to configure (gemini or openai)
    pub credential: Option<CredentialType>,

    /// List configured credentials
    #[arg(long)]
    pub list: bool,

    /// Delete the stored credential
    #[arg(long, requires = "credential")]
    pub delete: bool,
}

/// Run auth command.
pub fn run(args: AuthArgs) -> Result<()> {
    let config = ConfigLoader::load()?;
    let store = super::secret_store(&config);

    if args.list {
        list_credentials(&store);
        return Ok(());
    }

    let Some(kind) = args.credential else {
        bail!("Credential type required (gemini or openai). Use --list to see configured keys.");
    };

    if args.delete {
        store.remove(kind)?;
        println!("Credential for '{kind}' deleted.");
        if store.credential_source(kind) == Some(CredentialSource::Environment) {
            println!("Note: {} is still set in the environment.", kind.env_var());
        }
        return Ok(());
    }

    println!("Enter API key for {kind} (or set {})", kind.env_var());

    let key = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("API key")
        .interact()?;

    let key = entered_key(&key)?;
    store.save(kind, key)?;
    println!("Credential for '{kind}' saved to keyring.");

    Ok(())
}

/// Trim a pasted key; blank input is refused.
fn entered_key(input: &str) -> Result<&str> {
    let key = input.trim();
    if key.is_empty() {
        bail!("API key cannot be empty");
    }
    Ok(key)
}

fn list_credentials(store: &KeyringSecretStore) {
    let stored = store.stored_types();
    if stored.is_empty() {
        println!("No API keys configured.");
        println!();
        println!("Configure one with: timelens auth <gemini|openai>");
        return;
    }

    println!("Configured credentials:");
    println!();
    for kind in stored {
        println!("  {:<8} {}", kind.as_str(), source_label(store.credential_source(kind)));
    }
}

fn source_label(source: Option<CredentialSource>) -> &'static str {
    match source {
        Some(CredentialSource::Keyring) => "(keyring)",
        Some(CredentialSource::Environment) => "(environment)",
        None => "",
    }
}
