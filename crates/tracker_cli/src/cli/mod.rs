use clap::{Parser, Subcommand};
use tracker_core::config::{ConfigOverrides, Theme, WeatherProvider, canonicalize_key};
use tracker_core::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "daily_tracker",
    author,
    version,
    about = "Clock, weather and a task planner for the day",
    long_about = None
)]
pub struct Cli {
    // No subcommand starts an interactive session.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task
    ///
    /// Example: daily_tracker add Buy milk
    Add {
        #[arg(value_name = "TEXT")]
        text: Vec<String>,
    },
    /// Flip a task between pending and done
    ///
    /// Example: daily_tracker toggle 0
    Toggle { index: usize },
    /// Show tasks in the order they were added
    ///
    /// Example: daily_tracker list
    List,
    /// Show tasks ordered by creation time
    ///
    /// Example: daily_tracker timeline
    Timeline,
    /// Show the current weather
    ///
    /// Example: daily_tracker weather
    Weather,
    /// Show the current date and time
    ///
    /// Example: daily_tracker now
    Now,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    Theme,
    WeatherEnabled,
    WeatherProvider,
    Latitude,
    Longitude,
    City,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let (field, remainder) = key_raw
        .split_once('.')
        .map(|(field, rest)| (field.trim(), Some(rest.trim())))
        .unwrap_or((key_raw.trim(), None));

    let canonical_field = canonicalize_key(field);
    if canonical_field.is_empty() {
        return Err("override key cannot be empty".to_string());
    }

    let target = match (canonical_field.as_str(), remainder.map(canonicalize_key)) {
        ("theme", None) => ConfigOverrideTarget::Theme,
        ("theme", Some(_)) => return Err("theme override cannot have subfields".to_string()),
        ("weather", None) => return Err("weather override requires a field name".to_string()),
        ("weather", Some(sub)) => match sub.as_str() {
            "enabled" => ConfigOverrideTarget::WeatherEnabled,
            "provider" => ConfigOverrideTarget::WeatherProvider,
            "latitude" | "lat" => ConfigOverrideTarget::Latitude,
            "longitude" | "lon" | "lng" => ConfigOverrideTarget::Longitude,
            "city" => ConfigOverrideTarget::City,
            "" => return Err("weather override requires a field name".to_string()),
            other => return Err(format!("unknown weather field '{other}'")),
        },
        (other, _) => return Err(format!("unknown config field '{other}'")),
    };

    Ok(ParsedConfigOverride { target, value })
}

/// Collect every `--config-override` into typed overrides.
pub fn config_overrides_from_args(raw: &[String]) -> Result<ConfigOverrides, AppError> {
    let mut overrides = ConfigOverrides::default();

    for entry in raw {
        let parsed = parse_config_override(entry).map_err(AppError::invalid_input)?;
        let value = parsed.value;
        match parsed.target {
            ConfigOverrideTarget::Theme => {
                let theme = Theme::parse(&value).ok_or_else(|| {
                    AppError::invalid_input(format!("unknown theme '{value}'"))
                })?;
                overrides.theme = Some(theme);
            }
            ConfigOverrideTarget::WeatherEnabled => {
                let enabled = value.parse::<bool>().map_err(|_| {
                    AppError::invalid_input("weather.enabled must be true or false")
                })?;
                overrides.weather_enabled = Some(enabled);
            }
            ConfigOverrideTarget::WeatherProvider => {
                let provider = WeatherProvider::parse(&value).ok_or_else(|| {
                    AppError::invalid_input(format!("unknown weather provider '{value}'"))
                })?;
                overrides.weather_provider = Some(provider);
            }
            ConfigOverrideTarget::Latitude => {
                overrides.latitude = Some(parse_coordinate(&value, "weather.latitude", 90.0)?);
            }
            ConfigOverrideTarget::Longitude => {
                overrides.longitude = Some(parse_coordinate(&value, "weather.longitude", 180.0)?);
            }
            ConfigOverrideTarget::City => {
                if value.is_empty() {
                    return Err(AppError::invalid_input("weather.city cannot be empty"));
                }
                overrides.city = Some(value);
            }
        }
    }

    Ok(overrides)
}

fn parse_coordinate(value: &str, key: &str, limit: f64) -> Result<f64, AppError> {
    let parsed = value
        .parse::<f64>()
        .map_err(|_| AppError::invalid_input(format!("{key} must be a number")))?;
    if !parsed.is_finite() || parsed.abs() > limit {
        return Err(AppError::invalid_input(format!(
            "{key} must be between -{limit} and {limit}"
        )));
    }
    Ok(parsed)
}
