use std::sync::Arc;
use time::OffsetDateTime;
use tracker_core::clock::{Clock, ClockTicker, TICK_INTERVAL};
use tracker_core::config::{Config, WeatherConfig};
use tracker_core::error::AppError;
use tracker_core::model::Task;
use tracker_core::task_list::TaskList;
use tracker_core::weather::{WeatherFeed, WeatherSource, WeatherState, source_from_config};

/// In-memory state for one run of the tracker.
///
/// The task list only ever sees plain timestamps from the clock. The ticker
/// and the weather feed are owned here and torn down by `stop`.
pub struct Session {
    config: Config,
    clock: Arc<dyn Clock>,
    tasks: TaskList,
    ticker: Option<ClockTicker>,
    weather: WeatherState,
    feed: Option<WeatherFeed>,
    weather_requested: bool,
}

impl Session {
    pub fn new(config: Config, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            tasks: TaskList::new(),
            ticker: None,
            weather: WeatherState::default(),
            feed: None,
            weather_requested: false,
        }
    }

    pub fn tasks(&self) -> &TaskList {
        &self.tasks
    }

    /// Starts the clock ticker and the background weather fetch.
    pub fn start(&mut self) {
        if self.ticker.is_none() {
            match ClockTicker::start(Arc::clone(&self.clock), TICK_INTERVAL) {
                Ok(ticker) => self.ticker = Some(ticker),
                Err(err) => tracing::warn!(error = %err, "clock ticker unavailable"),
            }
        }

        if !self.weather_requested {
            self.weather_requested = true;
            if let Some(source) = self.weather_source() {
                match WeatherFeed::spawn(source) {
                    Ok(feed) => self.feed = Some(feed),
                    Err(err) => self.weather.apply(Err(err)),
                }
            }
        }
    }

    pub fn stop(mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.stop();
        }
        self.feed = None;
    }

    /// Returns `None` when `text` is blank.
    pub fn add(&mut self, text: &str) -> Option<(usize, &Task)> {
        let now = self.clock.now();
        let position = self.tasks.len();
        self.tasks.append(text, now).map(|task| (position, task))
    }

    pub fn toggle(&mut self, index: usize) -> Result<&Task, AppError> {
        let now = self.clock.now();
        self.tasks.toggle(index, now)
    }

    /// Latest ticker reading, or a fresh clock reading when no ticker runs.
    pub fn now(&self) -> OffsetDateTime {
        match self.ticker.as_ref() {
            Some(ticker) => ticker.latest(),
            None => self.clock.now(),
        }
    }

    /// Current weather. The first call in a session without a background
    /// feed fetches synchronously; failures leave the state loading.
    pub fn weather(&mut self) -> &WeatherState {
        if let Some(feed) = self.feed.as_mut() {
            feed.poll(&mut self.weather);
            if !feed.is_pending() {
                self.feed = None;
            }
        } else if !self.weather_requested {
            self.weather_requested = true;
            if let Some(source) = self.weather_source() {
                let result = source.fetch();
                self.weather.apply(result);
            }
        }

        &self.weather
    }

    fn weather_source(&mut self) -> Option<Box<dyn WeatherSource>> {
        let config: &WeatherConfig = &self.config.weather;
        match source_from_config(config) {
            Ok(source) => source,
            Err(err) => {
                self.weather.apply(Err(err));
                None
            }
        }
    }
}
