//! Generate an image through the provider fallback chain.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;
use timelens_imagegen::transport::{HttpRequest, HttpTransport};
use timelens_imagegen::{GenerationOutcome, ImagePayload, ProviderChoice};
use tracing::debug;

use super::prompt::SceneArgs;
use crate::config::ConfigLoader;

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Prompt text (or describe a scene with --lat/--lng and a date)
    pub prompt: Option<String>,

    /// Provider id, or "auto" to pick from stored credentials
    #[arg(short, long)]
    pub provider: Option<String>,

    #[command(flatten)]
    pub scene: SceneArgs,

    /// Save the image; a directory or file path, or the configured output directory
    #[arg(long, value_name = "PATH")]
    pub save: Option<Option<PathBuf>>,
}

pub async fn run(args: GenerateArgs) -> Result<()> {
    let config = ConfigLoader::load()?;

    let prompt = match (args.prompt, args.scene.compose()?) {
        (Some(prompt), None) => prompt,
        (None, Some(prompt)) => prompt,
        (Some(_), Some(_)) => bail!("give either a prompt or a scene, not both"),
        (None, None) => bail!("a prompt is required (or --lat, --lng and --date or --preset)"),
    };

    let provider = args
        .provider
        .as_deref()
        .unwrap_or(&config.generation.default_provider);
    let Ok(choice) = provider.parse::<ProviderChoice>();
    debug!(%choice, "generating");

    let (orchestrator, transport) = super::orchestrator(&config)?;
    let outcome = orchestrator.generate_prompt(&prompt, choice).await?;

    let (provider_id, model, image, generated_at) = match outcome {
        GenerationOutcome::Success {
            provider_id,
            model,
            image,
            generated_at,
        } => (provider_id, model, image, generated_at),
        GenerationOutcome::Failure { reason, .. } => bail!("{reason}"),
    };

    println!("Provider: {provider_id}");
    println!("Model:    {model}");
    match &image {
        ImagePayload::Url { url } => println!("Image:    {url}"),
        ImagePayload::Inline { mime_type, data } => {
            println!("Image:    inline {mime_type}, {} base64 chars", data.len())
        }
    }

    if let Some(target) = args.save {
        let default_dir = config
            .generation
            .output_dir
            .unwrap_or_else(timelens_paths::images_dir);
        let file_name = format!(
            "timelens-{provider_id}-{}.{}",
            generated_at.format("%Y%m%d-%H%M%S"),
            image.extension()
        );
        let path = save_path(target.as_deref(), &default_dir, &file_name);
        let bytes = image_bytes(&image, transport.as_ref()).await?;
        write_image(&path, &bytes)?;
        println!("Saved:    {}", path.display());
    }

    Ok(())
}

/// Where to write the image.
///
/// An existing directory or a path ending in a separator gets `file_name`
/// appended; any other path is used as is.
fn save_path(target: Option<&Path>, default_dir: &Path, file_name: &str) -> PathBuf {
    match target {
        None => default_dir.join(file_name),
        Some(path) if path.is_dir() || path.as_os_str().to_string_lossy().ends_with('/') => {
            path.join(file_name)
        }
        Some(path) => path.to_path_buf(),
    }
}

/// Image bytes, decoded locally or downloaded.
async fn image_bytes(image: &ImagePayload, transport: &dyn HttpTransport) -> Result<Vec<u8>> {
    match image {
        ImagePayload::Inline { .. } => Ok(image.decode()?),
        ImagePayload::Url { url } => {
            let response = transport.send(HttpRequest::get(url)).await?;
            if !response.is_success() {
                bail!("image download failed (status {})", response.status);
            }
            Ok(response.body)
        }
    }
}

fn write_image(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
}
