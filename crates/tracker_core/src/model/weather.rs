use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherSnapshot {
    pub temperature_c: f64,
    pub weather_code: Option<u32>,
    pub rain: RainOutlook,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RainOutlook {
    /// First forecast slot with precipitation.
    NextAt(OffsetDateTime),
    /// Current conditions mention rain but no hourly slot is known.
    Expected,
    Clear,
}

impl RainOutlook {
    pub fn is_rain_expected(&self) -> bool {
        !matches!(self, Self::Clear)
    }
}

/// Short label for a WMO weather interpretation code.
pub fn describe_weather_code(code: u32) -> &'static str {
    match code {
        0 => "clear sky",
        1..=3 => "partly cloudy",
        45 | 48 => "fog",
        51..=57 => "drizzle",
        61..=67 => "rain",
        71..=77 => "snow",
        80..=82 => "rain showers",
        85 | 86 => "snow showers",
        95..=99 => "thunderstorm",
        _ => "unknown",
    }
}
