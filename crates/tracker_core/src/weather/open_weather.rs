use crate::error::AppError;
use crate::model::{RainOutlook, WeatherSnapshot};
use crate::weather::{WeatherSource, http_agent};
use serde::Deserialize;

pub const OPEN_WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

#[derive(Debug, Deserialize)]
struct CurrentPayload {
    main: MainReading,
    #[serde(default)]
    weather: Vec<Condition>,
}

#[derive(Debug, Deserialize)]
struct MainReading {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct Condition {
    main: String,
}

pub struct OpenWeatherSource {
    city: String,
    api_key: String,
    base_url: String,
    agent: ureq::Agent,
}

impl OpenWeatherSource {
    pub fn new(city: &str, api_key: &str) -> Result<Self, AppError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(AppError::invalid_input("weather city is required"));
        }
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(AppError::invalid_input("OpenWeatherMap API key is required"));
        }

        Ok(Self {
            city: city.to_string(),
            api_key: api_key.to_string(),
            base_url: OPEN_WEATHER_URL.to_string(),
            agent: http_agent(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl WeatherSource for OpenWeatherSource {
    fn name(&self) -> &'static str {
        "open_weather"
    }

    fn fetch(&self) -> Result<WeatherSnapshot, AppError> {
        let body = self
            .agent
            .get(&self.base_url)
            .query("q", &self.city)
            .query("units", "metric")
            .query("appid", &self.api_key)
            .call()
            .map_err(|err| AppError::network(err.to_string()))?
            .into_string()
            .map_err(|err| AppError::network(err.to_string()))?;

        decode_open_weather(&body)
    }
}

pub fn decode_open_weather(body: &str) -> Result<WeatherSnapshot, AppError> {
    let payload: CurrentPayload = serde_json::from_str(body)
        .map_err(|err| AppError::invalid_data(format!("openweathermap payload: {err}")))?;

    let raining = payload
        .weather
        .iter()
        .any(|condition| condition.main.to_lowercase().contains("rain"));

    Ok(WeatherSnapshot {
        temperature_c: payload.main.temp,
        weather_code: None,
        rain: if raining {
            RainOutlook::Expected
        } else {
            RainOutlook::Clear
        },
    })
}
