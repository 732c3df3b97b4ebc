use tabled::settings::Style;
use tabled::{Table, Tabled};
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};
use tracker_core::clock::{format_date, format_hour_minute, format_time};
use tracker_core::config::Theme;
use tracker_core::error::AppError;
use tracker_core::model::{RainOutlook, Task, describe_weather_code};
use tracker_core::task_list::TaskList;
use tracker_core::weather::WeatherState;

pub const LOADING_WEATHER: &str = "Loading weather...";

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "Task")]
    text: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Added")]
    added: String,
    #[tabled(rename = "Completed")]
    completed: String,
}

fn stamp(value: OffsetDateTime, offset: UtcOffset) -> Result<String, AppError> {
    Ok(format!(
        "{} {}",
        format_date(value, offset)?,
        format_hour_minute(value, offset)?
    ))
}

fn rfc3339(value: OffsetDateTime) -> Result<String, AppError> {
    value
        .format(&Rfc3339)
        .map_err(|err| AppError::invalid_data(err.to_string()))
}

fn status_label(task: &Task) -> &'static str {
    if task.is_done() { "done" } else { "pending" }
}

pub fn added_line(position: usize, task: &Task) -> String {
    format!("Added task #{}: {}", position, task.text())
}

pub fn toggled_line(position: usize, task: &Task, offset: UtcOffset) -> Result<String, AppError> {
    match task.completed_at() {
        Some(completed_at) => Ok(format!(
            "Completed task #{}: {} at {}",
            position,
            task.text(),
            stamp(completed_at, offset)?
        )),
        None => Ok(format!("Reopened task #{}: {}", position, task.text())),
    }
}

/// Insertion-order view rendered as a table.
pub fn grid(list: &TaskList, offset: UtcOffset, theme: Theme) -> Result<String, AppError> {
    if list.is_empty() {
        return Ok("No tasks yet.".to_string());
    }

    let mut rows = Vec::with_capacity(list.len());
    for (position, task) in list.tasks().iter().enumerate() {
        let completed = match task.completed_at() {
            Some(value) => stamp(value, offset)?,
            None => "-".to_string(),
        };
        rows.push(TaskRow {
            position,
            text: task.text().to_string(),
            status: status_label(task).to_string(),
            added: stamp(task.created_at(), offset)?,
            completed,
        });
    }

    let mut table = Table::new(rows);
    table.with(Style::psql());
    Ok(format!(
        "{}\n{}",
        theme.heading("Task Planner"),
        table
    ))
}

/// Creation-order view. Positions refer to the stored list, so they can be
/// passed straight to `toggle`.
pub fn timeline(list: &TaskList, offset: UtcOffset, theme: Theme) -> Result<String, AppError> {
    let mut lines = vec![theme.heading("Timeline View")];
    if list.is_empty() {
        lines.push("No tasks yet.".to_string());
        return Ok(lines.join("\n"));
    }

    for entry in list.timeline() {
        let task = entry.task;
        let marker = if task.is_done() { "[x]" } else { "[ ]" };
        let mut line = format!(
            "| {} #{} {} (added {})",
            marker,
            entry.position,
            task.text(),
            stamp(task.created_at(), offset)?
        );
        if let Some(completed_at) = task.completed_at() {
            line.push_str(&format!(" completed {}", stamp(completed_at, offset)?));
            line = theme.done(&line);
        }
        lines.push(line);
    }

    Ok(lines.join("\n"))
}

pub fn weather(state: &WeatherState, offset: UtcOffset) -> Result<String, AppError> {
    let Some(snapshot) = state.snapshot() else {
        return Ok(LOADING_WEATHER.to_string());
    };

    let mut temperature = format!("Temperature: {:.1}°C", snapshot.temperature_c);
    if let Some(code) = snapshot.weather_code {
        temperature.push_str(&format!(" ({})", describe_weather_code(code)));
    }

    let rain = match snapshot.rain {
        RainOutlook::NextAt(at) => format!("Next rain at {}", format_hour_minute(at, offset)?),
        RainOutlook::Expected => "Rain expected today".to_string(),
        RainOutlook::Clear => "No rain expected today".to_string(),
    };

    Ok(format!("{temperature}\n{rain}"))
}

pub fn clock(now: OffsetDateTime, offset: UtcOffset) -> Result<String, AppError> {
    Ok(format!(
        "{} {}",
        format_date(now, offset)?,
        format_time(now, offset)?
    ))
}

pub fn task_json(position: usize, task: &Task) -> Result<serde_json::Value, AppError> {
    let completed_at = match task.completed_at() {
        Some(value) => Some(rfc3339(value)?),
        None => None,
    };

    Ok(serde_json::json!({
        "position": position,
        "text": task.text(),
        "done": task.is_done(),
        "created_at": rfc3339(task.created_at())?,
        "completed_at": completed_at,
    }))
}

pub fn grid_json(list: &TaskList) -> Result<serde_json::Value, AppError> {
    let mut payload = Vec::with_capacity(list.len());
    for (position, task) in list.tasks().iter().enumerate() {
        payload.push(task_json(position, task)?);
    }
    Ok(serde_json::Value::Array(payload))
}

pub fn timeline_json(list: &TaskList) -> Result<serde_json::Value, AppError> {
    let mut payload = Vec::with_capacity(list.len());
    for entry in list.timeline() {
        payload.push(task_json(entry.position, entry.task)?);
    }
    Ok(serde_json::Value::Array(payload))
}

pub fn weather_json(state: &WeatherState) -> Result<serde_json::Value, AppError> {
    let Some(snapshot) = state.snapshot() else {
        return Ok(serde_json::json!({ "status": "loading" }));
    };

    let next_rain_at = match snapshot.rain {
        RainOutlook::NextAt(at) => Some(rfc3339(at)?),
        RainOutlook::Expected | RainOutlook::Clear => None,
    };

    Ok(serde_json::json!({
        "status": "ready",
        "temperature_c": snapshot.temperature_c,
        "weather_code": snapshot.weather_code,
        "rain_expected": snapshot.rain.is_rain_expected(),
        "next_rain_at": next_rain_at,
    }))
}

pub fn clock_json(now: OffsetDateTime, offset: UtcOffset) -> Result<serde_json::Value, AppError> {
    Ok(serde_json::json!({
        "now": rfc3339(now)?,
        "date": format_date(now, offset)?,
        "time": format_time(now, offset)?,
    }))
}

#[cfg(test)]
mod tests {
    use super::{
        LOADING_WEATHER, clock, grid, grid_json, timeline, toggled_line, weather, weather_json,
    };
    use time::macros::datetime;
    use time::{Duration, UtcOffset};
    use tracker_core::config::Theme;
    use tracker_core::model::{RainOutlook, WeatherSnapshot};
    use tracker_core::task_list::TaskList;
    use tracker_core::weather::WeatherState;

    fn sample_list() -> TaskList {
        let t0 = datetime!(2025-12-20 09:00 UTC);
        let mut list = TaskList::new();
        list.append("Call mom", t0 + Duration::minutes(30));
        list.append("Buy milk", t0);
        list.toggle(1, t0 + Duration::hours(1)).unwrap();
        list
    }

    #[test]
    fn grid_lists_tasks_in_insertion_order() {
        let rendered = grid(&sample_list(), UtcOffset::UTC, Theme::Plain).unwrap();

        let call = rendered.find("Call mom").unwrap();
        let milk = rendered.find("Buy milk").unwrap();
        assert!(call < milk);
        assert!(rendered.contains("20-12-25 10:00"));
        assert!(rendered.contains("pending"));
    }

    #[test]
    fn grid_reports_empty_list() {
        let rendered = grid(&TaskList::new(), UtcOffset::UTC, Theme::Plain).unwrap();
        assert_eq!(rendered, "No tasks yet.");
    }

    #[test]
    fn timeline_orders_by_creation_and_keeps_positions() {
        let rendered = timeline(&sample_list(), UtcOffset::UTC, Theme::Plain).unwrap();
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines[0], "Timeline View");
        assert_eq!(
            lines[1],
            "| [x] #1 Buy milk (added 20-12-25 09:00) completed 20-12-25 10:00"
        );
        assert_eq!(lines[2], "| [ ] #0 Call mom (added 20-12-25 09:30)");
    }

    #[test]
    fn toggled_line_describes_transition() {
        let list = sample_list();
        let done = toggled_line(1, list.get(1).unwrap(), UtcOffset::UTC).unwrap();
        assert_eq!(done, "Completed task #1: Buy milk at 20-12-25 10:00");

        let pending = toggled_line(0, list.get(0).unwrap(), UtcOffset::UTC).unwrap();
        assert_eq!(pending, "Reopened task #0: Call mom");
    }

    #[test]
    fn weather_shows_loading_until_ready() {
        let state = WeatherState::Loading;
        assert_eq!(weather(&state, UtcOffset::UTC).unwrap(), LOADING_WEATHER);

        let ready = WeatherState::Ready(WeatherSnapshot {
            temperature_c: 26.04,
            weather_code: Some(61),
            rain: RainOutlook::NextAt(datetime!(2025-12-20 15:00 UTC)),
        });
        assert_eq!(
            weather(&ready, UtcOffset::UTC).unwrap(),
            "Temperature: 26.0°C (rain)\nNext rain at 15:00"
        );
    }

    #[test]
    fn clock_formats_date_and_time() {
        let rendered = clock(datetime!(2025-12-20 07:08:09 UTC), UtcOffset::UTC).unwrap();
        assert_eq!(rendered, "20-12-25 07:08:09");
    }

    #[test]
    fn grid_json_carries_completion() {
        let payload = grid_json(&sample_list()).unwrap();

        assert_eq!(payload[0]["text"], "Call mom");
        assert_eq!(payload[0]["done"], false);
        assert!(payload[0]["completed_at"].is_null());
        assert_eq!(payload[1]["done"], true);
        assert_eq!(payload[1]["completed_at"], "2025-12-20T10:00:00Z");
    }

    #[test]
    fn ansi_timeline_strikes_through_done_tasks() {
        let rendered = timeline(&sample_list(), UtcOffset::UTC, Theme::Ansi).unwrap();
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines[0], "\x1b[1mTimeline View\x1b[0m");
        assert!(lines[1].starts_with("\x1b[9;90m| [x] #1 Buy milk"));
        assert_eq!(lines[2], "| [ ] #0 Call mom (added 20-12-25 09:30)");
    }

    #[test]
    fn weather_json_reports_rain_expectation() {
        let loading = weather_json(&WeatherState::Loading).unwrap();
        assert_eq!(loading["status"], "loading");

        let showers = WeatherState::Ready(WeatherSnapshot {
            temperature_c: 22.5,
            weather_code: None,
            rain: RainOutlook::Expected,
        });
        let payload = weather_json(&showers).unwrap();
        assert_eq!(payload["status"], "ready");
        assert_eq!(payload["rain_expected"], true);
        assert!(payload["next_rain_at"].is_null());

        let clear = WeatherState::Ready(WeatherSnapshot {
            temperature_c: 30.0,
            weather_code: Some(0),
            rain: RainOutlook::Clear,
        });
        assert_eq!(weather_json(&clear).unwrap()["rain_expected"], false);
    }
}
