//! Terminal rendering: the presentation half of the dashboard.

use std::{
    fmt::Write as _,
    io::{IsTerminal, Write as _},
    sync::{Mutex, PoisonError},
    time::Instant,
};

use chrono::{Local, NaiveDate};
use weatherboard_core::{CurrentConditions, DailyForecast, Notice, Presenter, WeatherReport};

const NO_LOCATIONS: &str = "No saved locations yet. Search for a city to get started!";

/// Writes reports to stdout and transient messages to stderr.
#[derive(Debug, Default)]
pub struct TerminalPresenter {
    /// Last notice and when it was shown, until it expires or a new search starts.
    notice: Mutex<Option<(Notice, Instant)>>,
}

impl TerminalPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current notice if it hasn't expired yet.
    pub fn active_notice(&self) -> Option<String> {
        let mut slot = self.notice.lock().unwrap_or_else(PoisonError::into_inner);

        let expired = slot
            .as_ref()
            .is_some_and(|(notice, shown_at)| shown_at.elapsed() >= notice.duration);
        if expired {
            *slot = None;
        }

        slot.as_ref().map(|(notice, _)| notice.message.clone())
    }
}

impl Presenter for TerminalPresenter {
    fn show_loading(&self) {
        *self.notice.lock().unwrap_or_else(PoisonError::into_inner) = None;

        let mut stderr = std::io::stderr();
        if stderr.is_terminal() {
            let _ = write!(stderr, "Loading...");
            let _ = stderr.flush();
        }
    }

    fn hide_loading(&self) {
        let mut stderr = std::io::stderr();
        if stderr.is_terminal() {
            let _ = write!(stderr, "\r\x1b[2K");
            let _ = stderr.flush();
        }
    }

    fn show_report(&self, report: &WeatherReport) {
        let today = Local::now().date_naive();
        println!("{}", format_current(&report.current, today));
        println!("{}", format_forecast(&report.forecast));
    }

    fn show_favorites(&self, names: &[String]) {
        println!("{}", format_favorites(names));
    }

    fn show_notice(&self, notice: &Notice) {
        eprintln!("error: {}", notice.message);
        *self.notice.lock().unwrap_or_else(PoisonError::into_inner) =
            Some((notice.clone(), Instant::now()));
    }
}

pub fn format_current(current: &CurrentConditions, today: NaiveDate) -> String {
    let mut out = String::new();
    let icon = condition_symbol(&current.icon);

    let _ = writeln!(out, "{}", current.location_name);
    let _ = writeln!(out, "{}", today.format("%A, %B %-d, %Y"));
    let _ = writeln!(
        out,
        "  {}°C  {}{}",
        whole(current.temperature_c),
        icon,
        current.description
    );
    let _ = writeln!(out, "  Feels like  {}°C", whole(current.feels_like_c));
    let _ = writeln!(out, "  Humidity    {}%", current.humidity_pct);
    let _ = writeln!(out, "  Wind        {} km/h", whole(current.wind_speed_mps * 3.6));
    let _ = write!(out, "  Pressure    {} hPa", whole(current.pressure_hpa));

    out
}

pub fn format_forecast(days: &[DailyForecast]) -> String {
    let mut out = String::from("Forecast");

    for day in days {
        let _ = write!(
            out,
            "\n  {:<11} {}{:<24} {:>4}° / {}°",
            day.date.format("%a %b %-d").to_string(),
            condition_symbol(&day.condition_icon),
            day.condition_description,
            whole(day.temperature_max),
            whole(day.temperature_min),
        );
    }

    out
}

pub fn format_favorites(names: &[String]) -> String {
    if names.is_empty() {
        return NO_LOCATIONS.to_string();
    }

    let mut out = String::from("Saved locations");
    for (i, name) in names.iter().enumerate() {
        let _ = write!(out, "\n  {}. {name}", i + 1);
    }
    out
}

/// Symbol for an OpenWeather icon code such as `10d`; other icon ids get none.
fn condition_symbol(icon: &str) -> &'static str {
    match icon.get(..2) {
        Some("01") => "☀ ",
        Some("02") => "⛅ ",
        Some("03") | Some("04") => "☁ ",
        Some("09") | Some("10") => "🌧 ",
        Some("11") => "⛈ ",
        Some("13") => "❄ ",
        Some("50") => "🌫 ",
        _ => "",
    }
}

/// Rounded to a whole number, without printing `-0`.
fn whole(value: f64) -> i64 {
    value.round() as i64
}
