use crate::config::{WeatherConfig, WeatherProvider};
use crate::error::AppError;
use crate::model::WeatherSnapshot;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::Duration;

mod open_meteo;
mod open_weather;
#[cfg(test)]
mod testing;

pub use open_meteo::{OpenMeteoSource, decode_open_meteo};
pub use open_weather::{OpenWeatherSource, decode_open_weather};

const DISABLE_ENV_VAR: &str = "DAILY_TRACKER_DISABLE_WEATHER";
const API_KEY_ENV_VAR: &str = "OPENWEATHER_API_KEY";

pub trait WeatherSource: Send {
    fn name(&self) -> &'static str;

    fn fetch(&self) -> Result<WeatherSnapshot, AppError>;
}

fn http_agent() -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout_connect(Duration::from_secs(10))
        .timeout_read(Duration::from_secs(20))
        .build()
}

/// Builds the configured source. `Ok(None)` means weather is switched off.
pub fn source_from_config(
    config: &WeatherConfig,
) -> Result<Option<Box<dyn WeatherSource>>, AppError> {
    if std::env::var(DISABLE_ENV_VAR).is_ok() || !config.enabled {
        return Ok(None);
    }

    let base_url = config.base_url.as_deref();
    match config.provider {
        WeatherProvider::OpenMeteo => {
            let mut source = OpenMeteoSource::new(config.latitude, config.longitude);
            if let Some(base_url) = base_url {
                source = source.with_base_url(base_url);
            }
            Ok(Some(Box::new(source)))
        }
        WeatherProvider::OpenWeather => {
            let api_key = config
                .api_key
                .clone()
                .or_else(|| std::env::var(API_KEY_ENV_VAR).ok())
                .unwrap_or_default();
            let mut source = OpenWeatherSource::new(&config.city, &api_key)?;
            if let Some(base_url) = base_url {
                source = source.with_base_url(base_url);
            }
            Ok(Some(Box::new(source)))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum WeatherState {
    #[default]
    Loading,
    Ready(WeatherSnapshot),
}

impl WeatherState {
    /// Applies a fetch result. Failures are logged and leave the state as it
    /// was; there is no retry.
    pub fn apply(&mut self, result: Result<WeatherSnapshot, AppError>) {
        match result {
            Ok(snapshot) => *self = Self::Ready(snapshot),
            Err(err) => {
                tracing::warn!(code = err.code(), error = %err, "weather fetch failed");
            }
        }
    }

    pub fn snapshot(&self) -> Option<&WeatherSnapshot> {
        match self {
            Self::Loading => None,
            Self::Ready(snapshot) => Some(snapshot),
        }
    }
}

/// One-shot background fetch. The result arrives at most once.
pub struct WeatherFeed {
    rx: Option<Receiver<Result<WeatherSnapshot, AppError>>>,
}

impl WeatherFeed {
    pub fn spawn(source: Box<dyn WeatherSource>) -> Result<Self, AppError> {
        let (tx, rx) = mpsc::channel();
        let name = source.name();

        std::thread::Builder::new()
            .name("weather-fetch".to_string())
            .spawn(move || {
                let _ = tx.send(source.fetch());
            })
            .map_err(|err| AppError::io(err.to_string()))?;

        tracing::debug!(provider = name, "weather fetch started");
        Ok(Self { rx: Some(rx) })
    }

    pub fn is_pending(&self) -> bool {
        self.rx.is_some()
    }

    /// Applies the result if it has arrived. Returns true when it did.
    pub fn poll(&mut self, state: &mut WeatherState) -> bool {
        let Some(rx) = self.rx.as_ref() else {
            return false;
        };

        match rx.try_recv() {
            Ok(result) => {
                state.apply(result);
                self.rx = None;
                true
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => {
                tracing::warn!("weather fetch ended without a result");
                self.rx = None;
                false
            }
        }
    }
}
