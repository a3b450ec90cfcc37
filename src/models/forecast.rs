use crate::error::{Result, SprinklerError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which of a day's temperatures counts as "the" temperature for a month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureBasis {
    #[serde(alias = "Low")]
    Low,
    #[serde(alias = "avg", alias = "Avg", alias = "Average")]
    Average,
    #[serde(alias = "High")]
    High,
}

impl TemperatureBasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemperatureBasis::Low => "Low",
            TemperatureBasis::Average => "Average",
            TemperatureBasis::High => "High",
        }
    }
}

impl std::fmt::Display for TemperatureBasis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One forecast day in the controller's local calendar (°F)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub high: i32,
    pub low: i32,
    average: i32,
    pub rain_expected: bool,
}

impl ForecastDay {
    /// The average is always derived from high/low, rounded toward negative infinity
    pub fn new(date: NaiveDate, high: i32, low: i32, rain_expected: bool) -> Self {
        Self {
            date,
            high,
            low,
            average: (high + low).div_euclid(2),
            rain_expected,
        }
    }

    pub fn average(&self) -> i32 {
        self.average
    }

    pub fn temperature(&self, basis: TemperatureBasis) -> i32 {
        match basis {
            TemperatureBasis::Low => self.low,
            TemperatureBasis::Average => self.average,
            TemperatureBasis::High => self.high,
        }
    }
}

/// Chronologically ordered daily forecast, today first
#[derive(Debug, Clone, Serialize)]
pub struct Forecast {
    pub days: Vec<ForecastDay>,
}

impl Forecast {
    pub fn new(mut days: Vec<ForecastDay>) -> Self {
        days.sort_by_key(|d| d.date);
        Self { days }
    }

    pub fn day(&self, date: NaiveDate) -> Option<&ForecastDay> {
        self.days.iter().find(|d| d.date == date)
    }

    /// Temperature for `today` using the given basis.
    ///
    /// A forecast without an entry for `today` (stale upstream data) cannot
    /// drive an adjustment, so this is a hard error.
    pub fn current_temperature(&self, today: NaiveDate, basis: TemperatureBasis) -> Result<i32> {
        self.day(today)
            .map(|d| d.temperature(basis))
            .ok_or_else(|| {
                SprinklerError::NotFound(format!("no forecast entry for {}", today))
            })
    }

    /// First of the leading `days` entries that expects rain
    pub fn first_rain_within(&self, days: usize) -> Option<&ForecastDay> {
        self.days.iter().take(days).find(|d| d.rain_expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
    }

    #[test]
    fn average_is_floored_midpoint() {
        assert_eq!(ForecastDay::new(date(1), 91, 70, false).average(), 80);
        assert_eq!(ForecastDay::new(date(1), 90, 70, false).average(), 80);
        assert_eq!(ForecastDay::new(date(1), 0, -3, false).average(), -2);
        assert_eq!(ForecastDay::new(date(1), -5, -10, false).average(), -8);
    }

    #[test]
    fn temperature_follows_basis() {
        let day = ForecastDay::new(date(1), 90, 65, false);
        assert_eq!(day.temperature(TemperatureBasis::High), 90);
        assert_eq!(day.temperature(TemperatureBasis::Low), 65);
        assert_eq!(day.temperature(TemperatureBasis::Average), 77);
    }

    #[test]
    fn current_temperature_requires_today() {
        let forecast = Forecast::new(vec![
            ForecastDay::new(date(2), 80, 60, false),
            ForecastDay::new(date(3), 85, 62, false),
        ]);

        assert_eq!(
            forecast
                .current_temperature(date(2), TemperatureBasis::High)
                .unwrap(),
            80
        );
        assert!(matches!(
            forecast.current_temperature(date(1), TemperatureBasis::High),
            Err(SprinklerError::NotFound(_))
        ));
    }

    #[test]
    fn days_are_kept_in_date_order() {
        let forecast = Forecast::new(vec![
            ForecastDay::new(date(3), 80, 60, true),
            ForecastDay::new(date(1), 80, 60, false),
            ForecastDay::new(date(2), 80, 60, false),
        ]);
        let dates: Vec<_> = forecast.days.iter().map(|d| d.date).collect();
        assert_eq!(dates, vec![date(1), date(2), date(3)]);
    }

    #[test]
    fn rain_window_stops_before_limit() {
        let forecast = Forecast::new(vec![
            ForecastDay::new(date(1), 80, 60, false),
            ForecastDay::new(date(2), 80, 60, false),
            ForecastDay::new(date(3), 80, 60, true),
        ]);

        assert!(forecast.first_rain_within(2).is_none());
        assert_eq!(forecast.first_rain_within(3).map(|d| d.date), Some(date(3)));
        assert!(forecast.first_rain_within(0).is_none());
        assert!(forecast.first_rain_within(10).is_some());
    }
}
