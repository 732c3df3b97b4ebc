mod task;
mod weather;

pub use task::Task;
pub use weather::{RainOutlook, WeatherSnapshot, describe_weather_code};
