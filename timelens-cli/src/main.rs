use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod prompt;

#[derive(Parser)]
#[command(name = "timelens", about = "Picture any place at any moment in history")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage provider API keys
    Auth(commands::auth::AuthArgs),
    /// Manage configuration
    Config(commands::config::ConfigArgs),
    /// Generate an image
    Generate(commands::generate::GenerateArgs),
    /// Compose a prompt without generating
    Prompt(commands::prompt::PromptArgs),
    /// List image providers
    Providers(commands::providers::ProvidersArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Auth(args) => commands::auth::run(args),
        Commands::Config(args) => commands::config::run(args),
        Commands::Generate(args) => commands::generate::run(args).await,
        Commands::Prompt(args) => commands::prompt::run(args),
        Commands::Providers(args) => commands::providers::run(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generate_accepts_scene_flags() {
        let cli = Cli::try_parse_from([
            "timelens",
            "generate",
            "--lat",
            "-33.8688",
            "--lng",
            "151.2093",
            "--preset",
            "moon-landing",
            "--provider",
            "pollinations",
            "--save",
        ])
        .unwrap();

        let Commands::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.scene.lat, Some(-33.8688));
        assert_eq!(args.provider.as_deref(), Some("pollinations"));
        assert_eq!(args.save, Some(None));
    }

    #[test]
    fn date_conflicts_with_preset() {
        let result = Cli::try_parse_from([
            "timelens",
            "prompt",
            "--lat",
            "0",
            "--lng",
            "0",
            "--date",
            "1969-7-20",
            "--preset",
            "moon-landing",
        ]);
        assert!(result.is_err());
    }
}
