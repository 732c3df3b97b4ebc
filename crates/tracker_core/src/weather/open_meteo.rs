use crate::error::AppError;
use crate::model::{RainOutlook, WeatherSnapshot};
use crate::weather::{WeatherSource, http_agent};
use serde::Deserialize;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

pub const OPEN_METEO_URL: &str = "https://api.open-meteo.com/v1/forecast";

#[derive(Debug, Deserialize)]
struct ForecastPayload {
    #[serde(default)]
    utc_offset_seconds: i32,
    current_weather: CurrentWeather,
    #[serde(default)]
    hourly: Option<HourlyForecast>,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    temperature: f64,
    #[serde(default)]
    weathercode: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct HourlyForecast {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    precipitation: Vec<Option<f64>>,
}

pub struct OpenMeteoSource {
    latitude: f64,
    longitude: f64,
    base_url: String,
    agent: ureq::Agent,
}

impl OpenMeteoSource {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            base_url: OPEN_METEO_URL.to_string(),
            agent: http_agent(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl WeatherSource for OpenMeteoSource {
    fn name(&self) -> &'static str {
        "open_meteo"
    }

    fn fetch(&self) -> Result<WeatherSnapshot, AppError> {
        let body = self
            .agent
            .get(&self.base_url)
            .query("latitude", &self.latitude.to_string())
            .query("longitude", &self.longitude.to_string())
            .query("current_weather", "true")
            .query("hourly", "precipitation_probability,precipitation")
            .query("timezone", "auto")
            .call()
            .map_err(|err| AppError::network(err.to_string()))?
            .into_string()
            .map_err(|err| AppError::network(err.to_string()))?;

        decode_open_meteo(&body)
    }
}

/// Decodes a forecast body. The rain outlook is the first hourly slot with
/// non-zero precipitation.
pub fn decode_open_meteo(body: &str) -> Result<WeatherSnapshot, AppError> {
    let payload: ForecastPayload = serde_json::from_str(body)
        .map_err(|err| AppError::invalid_data(format!("open-meteo payload: {err}")))?;

    let offset = UtcOffset::from_whole_seconds(payload.utc_offset_seconds)
        .map_err(|err| AppError::invalid_data(format!("utc_offset_seconds: {err}")))?;

    let rain = match payload.hourly.as_ref() {
        Some(hourly) => next_rain(hourly, offset)?,
        None => RainOutlook::Clear,
    };

    Ok(WeatherSnapshot {
        temperature_c: payload.current_weather.temperature,
        weather_code: payload.current_weather.weathercode,
        rain,
    })
}

fn next_rain(hourly: &HourlyForecast, offset: UtcOffset) -> Result<RainOutlook, AppError> {
    let slot = hourly
        .time
        .iter()
        .zip(hourly.precipitation.iter())
        .find(|(_, amount)| amount.is_some_and(|value| value > 0.0));

    match slot {
        Some((time, _)) => Ok(RainOutlook::NextAt(parse_hourly_time(time, offset)?)),
        None => Ok(RainOutlook::Clear),
    }
}

fn parse_hourly_time(value: &str, offset: UtcOffset) -> Result<OffsetDateTime, AppError> {
    PrimitiveDateTime::parse(value, format_description!("[year]-[month]-[day]T[hour]:[minute]"))
        .map(|local| local.assume_offset(offset))
        .map_err(|_| AppError::invalid_data(format!("hourly time '{value}' is not YYYY-MM-DDTHH:MM")))
}
