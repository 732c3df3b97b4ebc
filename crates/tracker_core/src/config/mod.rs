use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_DIR_NAME: &str = "daily_tracker";
const CONFIG_ENV_VAR: &str = "DAILY_TRACKER_CONFIG_PATH";

const DEFAULT_LATITUDE: f64 = 12.97;
const DEFAULT_LONGITUDE: f64 = 77.59;
const DEFAULT_CITY: &str = "Bengaluru";

/// Terminal styling. `Plain` emits no escape codes; `Ansi` bolds headings
/// and strikes through completed tasks in grey.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    #[serde(alias = "default")]
    Plain,
    #[serde(alias = "color", alias = "colour")]
    Ansi,
}

const HEADING: &str = "\x1b[1m";
const DONE: &str = "\x1b[9;90m";
const RESET: &str = "\x1b[0m";

impl Theme {
    pub fn parse(raw: &str) -> Option<Self> {
        match canonicalize_key(raw).as_str() {
            "" | "plain" | "default" | "none" => Some(Self::Plain),
            "ansi" | "color" | "colour" => Some(Self::Ansi),
            _ => None,
        }
    }

    pub fn heading(self, text: &str) -> String {
        self.wrap(HEADING, text)
    }

    pub fn done(self, text: &str) -> String {
        self.wrap(DONE, text)
    }

    fn wrap(self, code: &str, text: &str) -> String {
        match self {
            Self::Plain => text.to_string(),
            Self::Ansi => format!("{code}{text}{RESET}"),
        }
    }
}

/// Lowercases and collapses runs of non-alphanumerics into single `_`.
pub fn canonicalize_key(raw: &str) -> String {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    cleaned.trim_matches('_').to_string()
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherProvider {
    #[default]
    OpenMeteo,
    OpenWeather,
}

impl WeatherProvider {
    pub fn parse(raw: &str) -> Option<Self> {
        match canonicalize_key(raw).as_str() {
            "open_meteo" | "openmeteo" => Some(Self::OpenMeteo),
            "open_weather" | "openweather" | "openweathermap" => Some(Self::OpenWeather),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub enabled: bool,
    pub provider: WeatherProvider,
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
    pub api_key: Option<String>,
    /// Replaces the provider endpoint, e.g. for a caching proxy.
    pub base_url: Option<String>,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: WeatherProvider::default(),
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
            city: DEFAULT_CITY.to_string(),
            api_key: None,
            base_url: None,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub weather: WeatherConfig,
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ConfigOverrides {
    pub theme: Option<Theme>,
    pub weather_enabled: Option<bool>,
    pub weather_provider: Option<WeatherProvider>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub city: Option<String>,
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata)
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME))
    }
}

pub fn load_config_with_fallback() -> ConfigLoad {
    match config_path() {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Config {
    let mut merged = base.clone();
    if let Some(theme) = overrides.theme {
        merged.theme = theme;
    }

    let weather = &mut merged.weather;
    if let Some(enabled) = overrides.weather_enabled {
        weather.enabled = enabled;
    }
    if let Some(provider) = overrides.weather_provider {
        weather.provider = provider;
    }
    if let Some(latitude) = overrides.latitude {
        weather.latitude = latitude;
    }
    if let Some(longitude) = overrides.longitude {
        weather.longitude = longitude;
    }
    if let Some(city) = overrides.city.as_ref() {
        weather.city = city.clone();
    }

    merged
}
