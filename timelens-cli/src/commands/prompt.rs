//! Build prompts from a place and a historical moment.

use anyhow::{Result, bail};
use clap::Args;

use crate::prompt::{Coordinates, HistoricalDate, PRESETS, find_preset, location_prompt};

/// Place and moment a prompt is composed from.
#[derive(Args, Debug, Default)]
pub struct SceneArgs {
    /// Latitude in degrees, north positive
    #[arg(long, allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude in degrees, east positive
    #[arg(long, allow_negative_numbers = true)]
    pub lng: Option<f64>,

    /// Date as YEAR-MONTH-DAY
    #[arg(long, conflicts_with = "preset")]
    pub date: Option<HistoricalDate>,

    /// Hour of day (0-23)
    #[arg(long, requires = "date")]
    pub hour: Option<u8>,

    /// Date is before the common era
    #[arg(long, requires = "date")]
    pub bce: bool,

    /// Use a named historical moment instead of --date
    #[arg(long)]
    pub preset: Option<String>,
}

impl SceneArgs {
    /// The composed prompt, or `None` when no scene was given.
    pub fn compose(&self) -> Result<Option<String>> {
        let has_date = self.date.is_some() || self.preset.is_some();
        let (lat, lng) = match (self.lat, self.lng) {
            (None, None) if !has_date => return Ok(None),
            (Some(lat), Some(lng)) => (lat, lng),
            _ => bail!("--lat and --lng are both required to describe a place"),
        };
        let coordinates = Coordinates::new(lat, lng)?;

        let date = match (&self.date, &self.preset) {
            (Some(date), _) => {
                let date = date.bce(self.bce);
                match self.hour {
                    Some(hour) => date.with_hour(hour)?,
                    None => date,
                }
            }
            (None, Some(name)) => find_preset(name)?.date,
            (None, None) => bail!("a date is required: use --date or --preset"),
        };

        Ok(Some(location_prompt(&coordinates, &date)))
    }
}

#[derive(Args, Debug)]
pub struct PromptArgs {
    #[command(flatten)]
    pub scene: SceneArgs,

    /// List the named presets
    #[arg(long)]
    pub list_presets: bool,
}

pub fn run(args: PromptArgs) -> Result<()> {
    if args.list_presets {
        for preset in PRESETS {
            println!("{:<18} {:<20} {}", preset.name, preset.label, preset.date);
        }
        return Ok(());
    }

    match args.scene.compose()? {
        Some(prompt) => println!("{prompt}"),
        None => bail!("nothing to compose: give --lat, --lng and --date or --preset"),
    }
    Ok(())
}
