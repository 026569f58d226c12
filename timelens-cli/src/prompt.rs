//! Prompt composition from a place and a historical moment.
//!
//! ```text
//! Create an image at 41.8902° N, 12.4922° E, March 15, 44 BCE, 11:00 hours.
//! Photorealistic, street photography style.
//! ```

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors from parsing or validating prompt inputs.
#[derive(Error, Debug, PartialEq)]
pub enum PromptError {
    #[error("latitude must be between -90 and 90, got {0}")]
    Latitude(f64),

    #[error("longitude must be between -180 and 180, got {0}")]
    Longitude(f64),

    #[error("invalid date '{0}', expected YEAR-MONTH-DAY")]
    DateFormat(String),

    #[error("year must be at least 1, got {0}")]
    Year(u32),

    #[error("month must be between 1 and 12, got {0}")]
    Month(u8),

    #[error("day must be between 1 and 31, got {0}")]
    Day(u8),

    #[error("hour must be between 0 and 23, got {0}")]
    Hour(u8),

    #[error("unknown preset '{0}'")]
    UnknownPreset(String),
}

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Format a coordinate as `"{abs:.4}° {N|S|E|W}"`. Zero is north/east.
pub fn format_coordinate(value: f64, is_latitude: bool) -> String {
    let direction = match (is_latitude, value >= 0.0) {
        (true, true) => 'N',
        (true, false) => 'S',
        (false, true) => 'E',
        (false, false) => 'W',
    };
    format!("{:.4}° {direction}", value.abs())
}

/// A validated point on the globe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, PromptError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(PromptError::Latitude(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(PromptError::Longitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}",
            format_coordinate(self.latitude, true),
            format_coordinate(self.longitude, false)
        )
    }
}

/// A calendar date with an era and an optional hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoricalDate {
    year: u32,
    month: u8,
    day: u8,
    hour: Option<u8>,
    bce: bool,
}

impl HistoricalDate {
    pub fn new(year: u32, month: u8, day: u8, bce: bool) -> Result<Self, PromptError> {
        if year < 1 {
            return Err(PromptError::Year(year));
        }
        if !(1..=12).contains(&month) {
            return Err(PromptError::Month(month));
        }
        if !(1..=31).contains(&day) {
            return Err(PromptError::Day(day));
        }
        Ok(Self {
            year,
            month,
            day,
            hour: None,
            bce,
        })
    }

    pub fn with_hour(mut self, hour: u8) -> Result<Self, PromptError> {
        if hour > 23 {
            return Err(PromptError::Hour(hour));
        }
        self.hour = Some(hour);
        Ok(self)
    }

    pub fn bce(mut self, bce: bool) -> Self {
        self.bce = bce;
        self
    }
}

impl FromStr for HistoricalDate {
    type Err = PromptError;

    /// Parses `YEAR-MONTH-DAY` as a CE date.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PromptError::DateFormat(s.to_string());
        let mut parts = s.trim().splitn(3, '-');
        let mut next = || parts.next().ok_or_else(invalid);
        let year = next()?.parse::<u32>().map_err(|_| invalid())?;
        let month = next()?.parse::<u8>().map_err(|_| invalid())?;
        let day = next()?.parse::<u8>().map_err(|_| invalid())?;
        Self::new(year, month, day, false)
    }
}

impl fmt::Display for HistoricalDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let era = if self.bce { "BCE" } else { "CE" };
        let month = MONTHS[usize::from(self.month - 1)];
        write!(f, "{month} {}, {} {era}", self.day, self.year)?;
        if let Some(hour) = self.hour {
            write!(f, ", {hour:02}:00 hours")?;
        }
        Ok(())
    }
}

/// Compose the image prompt for a place and moment.
pub fn location_prompt(coordinates: &Coordinates, date: &HistoricalDate) -> String {
    format!("Create an image at {coordinates}, {date}. Photorealistic, street photography style.")
}

/// A well-known moment, selectable by name.
#[derive(Debug, Clone, Copy)]
pub struct Preset {
    pub name: &'static str,
    pub label: &'static str,
    pub date: HistoricalDate,
}

const fn preset(
    name: &'static str,
    label: &'static str,
    (year, month, day, hour, bce): (u32, u8, u8, u8, bool),
) -> Preset {
    Preset {
        name,
        label,
        date: HistoricalDate {
            year,
            month,
            day,
            hour: Some(hour),
            bce,
        },
    }
}

pub const PRESETS: &[Preset] = &[
    preset("ides-of-march", "Ides of March", (44, 3, 15, 11, true)),
    preset("moon-landing", "Moon Landing", (1969, 7, 20, 20, false)),
    preset("berlin-wall", "Fall of Berlin Wall", (1989, 11, 9, 19, false)),
    preset("pompeii", "Pompeii Eruption", (79, 8, 24, 13, false)),
    preset("french-revolution", "French Revolution", (1789, 7, 14, 10, false)),
    preset("columbus", "Columbus Arrives", (1492, 10, 12, 6, false)),
];

/// Look up a preset by name, ignoring case.
pub fn find_preset(name: &str) -> Result<&'static Preset, PromptError> {
    PRESETS
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
        .ok_or_else(|| PromptError::UnknownPreset(name.to_string()))
}
