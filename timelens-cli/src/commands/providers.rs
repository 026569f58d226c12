//! List image providers.

use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use timelens_imagegen::{ProviderChoice, ProviderDescriptor, ProviderId};

use crate::config::ConfigLoader;

#[derive(Args, Debug)]
pub struct ProvidersArgs {
    /// Include providers whose credential is missing
    #[arg(long)]
    pub all: bool,
}

pub fn run(args: ProvidersArgs) -> Result<()> {
    let config = ConfigLoader::load()?;
    let (orchestrator, _) = super::orchestrator(&config)?;

    let auto_id = orchestrator
        .resolve(&ProviderChoice::Auto)
        .map(|p| p.id.clone());
    let available: Vec<&ProviderDescriptor> = orchestrator.list_available_providers();

    let rows: Vec<(&ProviderDescriptor, bool)> = if args.all {
        orchestrator
            .registry()
            .providers()
            .iter()
            .map(|p| (p, available.iter().any(|a| a.id == p.id)))
            .collect()
    } else {
        available.iter().map(|p| (*p, true)).collect()
    };

    println!("{}", provider_table(&rows, auto_id.as_ref()));
    if !args.all && rows.len() < orchestrator.registry().providers().len() {
        println!();
        println!("Store an API key with `timelens auth <gemini|openai>` to unlock more providers.");
    }
    Ok(())
}

fn provider_table(rows: &[(&ProviderDescriptor, bool)], auto_id: Option<&ProviderId>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("").fg(Color::Cyan),
        Cell::new("Provider").fg(Color::Cyan),
        Cell::new("Name").fg(Color::Cyan),
        Cell::new("Credential").fg(Color::Cyan),
        Cell::new("Models").fg(Color::Cyan),
        Cell::new("Status").fg(Color::Cyan),
    ]);

    for (provider, available) in rows {
        let credential = provider
            .credential
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        let status = if auto_id == Some(&provider.id) {
            Cell::new("auto").fg(Color::Green)
        } else if *available {
            Cell::new("ready")
        } else {
            Cell::new("no key").fg(Color::Yellow)
        };

        table.add_row(vec![
            Cell::new(&provider.icon),
            Cell::new(&provider.id),
            Cell::new(&provider.display_name),
            Cell::new(credential),
            Cell::new(provider.models.join(", ")),
            status,
        ]);
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use timelens_imagegen::ProviderRegistry;

    #[test]
    fn table_marks_auto_choice_and_missing_keys() {
        let registry = ProviderRegistry::builtin();
        let rows: Vec<(&ProviderDescriptor, bool)> = registry
            .providers()
            .iter()
            .map(|p| (p, p.credential.is_none()))
            .collect();
        let auto = ProviderId::new("pollinations");

        let rendered = provider_table(&rows, Some(&auto)).to_string();

        assert!(rendered.contains("nanobanana"));
        assert!(rendered.contains("gemini-2.5-flash-image, gemini-2.5-flash-image-preview"));
        assert!(rendered.contains("auto"));
        assert!(rendered.contains("no key"));
        assert!(!rendered.contains("ready"));
    }
}
