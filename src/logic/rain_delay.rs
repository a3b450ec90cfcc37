use crate::models::{Forecast, RainDelayState};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

pub const SECONDS_PER_DAY: u32 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "cause", rename_all = "snake_case")]
pub enum RainDecision {
    NotDelayed,
    /// The controller already has an open delay window
    DeviceDelay,
    /// Rain is forecast on `date`; the device is not yet delayed
    ForecastDelay { date: NaiveDate },
}

impl RainDecision {
    pub fn is_delayed(&self) -> bool {
        !matches!(self, RainDecision::NotDelayed)
    }

    /// Whether the controller must be told to start its own delay window
    pub fn needs_device_delay(&self) -> bool {
        matches!(self, RainDecision::ForecastDelay { .. })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RainDecision::NotDelayed => "No rain delay",
            RainDecision::DeviceDelay => "Controller rain delay active",
            RainDecision::ForecastDelay { .. } => "Rain in forecast",
        }
    }
}

impl std::fmt::Display for RainDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RainDecision::ForecastDelay { date } => write!(f, "{} ({})", self.as_str(), date),
            _ => write!(f, "{}", self.as_str()),
        }
    }
}

/// Rain gate.
///
/// The device window wins over the forecast so an already-delayed controller
/// is never re-delayed. Only the first `rain_check_days` forecast entries are
/// inspected; a shorter forecast is checked as far as it goes.
pub fn evaluate(
    device: &RainDelayState,
    forecast: &Forecast,
    rain_check_days: u32,
    now: DateTime<Utc>,
) -> RainDecision {
    if device.is_active(now) {
        return RainDecision::DeviceDelay;
    }

    match forecast.first_rain_within(rain_check_days as usize) {
        Some(day) => RainDecision::ForecastDelay { date: day.date },
        None => RainDecision::NotDelayed,
    }
}

pub fn delay_duration_seconds(rain_delay_days: u32) -> u32 {
    rain_delay_days * SECONDS_PER_DAY
}
