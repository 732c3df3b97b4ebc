use crate::error::AppError;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, RwLock};
use std::thread::JoinHandle;
use std::time::Duration;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Keeps the latest clock reading fresh on a background thread.
///
/// The ticker subscribes when started and unsubscribes on `stop` or drop.
/// Readers only ever see the newest value.
pub struct ClockTicker {
    latest: Arc<RwLock<OffsetDateTime>>,
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ClockTicker {
    pub fn start(clock: Arc<dyn Clock>, interval: Duration) -> Result<Self, AppError> {
        let latest = Arc::new(RwLock::new(clock.now()));
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let shared = Arc::clone(&latest);

        let handle = std::thread::Builder::new()
            .name("clock-ticker".to_string())
            .spawn(move || {
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            if let Ok(mut slot) = shared.write() {
                                *slot = clock.now();
                            }
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })
            .map_err(|err| AppError::io(err.to_string()))?;

        tracing::debug!(?interval, "clock ticker started");

        Ok(Self {
            latest,
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    pub fn latest(&self) -> OffsetDateTime {
        match self.latest.read() {
            Ok(value) => *value,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
            tracing::debug!("clock ticker stopped");
        }
    }
}

impl Drop for ClockTicker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

/// `DD-MM-YY`
pub fn format_date(value: OffsetDateTime, offset: UtcOffset) -> Result<String, AppError> {
    value
        .to_offset(offset)
        .format(format_description!("[day]-[month]-[year repr:last_two]"))
        .map_err(|err| AppError::invalid_data(err.to_string()))
}

/// `HH:MM:SS`
pub fn format_time(value: OffsetDateTime, offset: UtcOffset) -> Result<String, AppError> {
    value
        .to_offset(offset)
        .format(format_description!("[hour]:[minute]:[second]"))
        .map_err(|err| AppError::invalid_data(err.to_string()))
}

/// `HH:MM`
pub fn format_hour_minute(value: OffsetDateTime, offset: UtcOffset) -> Result<String, AppError> {
    value
        .to_offset(offset)
        .format(format_description!("[hour]:[minute]"))
        .map_err(|err| AppError::invalid_data(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{Clock, ClockTicker, format_date, format_hour_minute, format_time};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::time::Duration;
    use time::macros::{datetime, offset};
    use time::{OffsetDateTime, UtcOffset};

    struct SteppingClock {
        ticks: AtomicI64,
    }

    impl Clock for SteppingClock {
        fn now(&self) -> OffsetDateTime {
            let step = self.ticks.fetch_add(1, Ordering::SeqCst);
            datetime!(2025-12-20 09:00 UTC) + time::Duration::seconds(step)
        }
    }

    #[test]
    fn ticker_starts_with_current_reading() {
        let clock = Arc::new(SteppingClock {
            ticks: AtomicI64::new(0),
        });
        let ticker = ClockTicker::start(clock, Duration::from_secs(60)).unwrap();

        assert_eq!(ticker.latest(), datetime!(2025-12-20 09:00 UTC));
        ticker.stop();
    }

    #[test]
    fn ticker_refreshes_latest_reading() {
        let clock = Arc::new(SteppingClock {
            ticks: AtomicI64::new(0),
        });
        let ticker = ClockTicker::start(clock, Duration::from_millis(5)).unwrap();
        let first = ticker.latest();

        let mut refreshed = false;
        for _ in 0..200 {
            std::thread::sleep(Duration::from_millis(5));
            if ticker.latest() > first {
                refreshed = true;
                break;
            }
        }

        ticker.stop();
        assert!(refreshed);
    }

    #[test]
    fn ticker_stops_on_drop() {
        let clock = Arc::new(SteppingClock {
            ticks: AtomicI64::new(0),
        });
        let ticker = ClockTicker::start(clock.clone(), Duration::from_millis(1)).unwrap();
        drop(ticker);

        let after_stop = clock.ticks.load(Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(clock.ticks.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn ticker_accepts_unbounded_interval() {
        let clock = Arc::new(SteppingClock {
            ticks: AtomicI64::new(0),
        });
        let ticker = ClockTicker::start(clock, Duration::MAX).unwrap();

        assert_eq!(ticker.latest(), datetime!(2025-12-20 09:00 UTC));
        ticker.stop();
    }

    #[test]
    fn formats_date_and_time_in_offset() {
        let value = datetime!(2025-12-31 22:05:09 UTC);

        assert_eq!(format_date(value, UtcOffset::UTC).unwrap(), "31-12-25");
        assert_eq!(format_time(value, UtcOffset::UTC).unwrap(), "22:05:09");
        assert_eq!(format_date(value, offset!(+5:30)).unwrap(), "01-01-26");
        assert_eq!(format_hour_minute(value, offset!(+5:30)).unwrap(), "03:35");
    }
}
