use super::WeatherSource;
use crate::config::{OpenWeatherMapConfig, MAX_RAIN_CHECK_DAYS};
use crate::error::{Result, SprinklerError};
use crate::models::{Forecast, ForecastDay};
use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

pub struct OpenWeatherMapClient {
    client: reqwest::Client,
    config: OpenWeatherMapConfig,
}

// OpenWeatherMap daily forecast response structures
#[derive(Debug, Deserialize)]
struct OwmDailyResponse {
    list: Vec<OwmDailyItem>,
}

#[derive(Debug, Deserialize)]
struct OwmDailyItem {
    dt: i64,
    temp: OwmDailyTemp,
    /// Daily totals in mm, omitted on dry days
    #[serde(default)]
    rain: Option<f64>,
    #[serde(default)]
    snow: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwmDailyTemp {
    min: f64,
    max: f64,
}

/// Running extremes for one local calendar day
#[derive(Debug)]
struct DayAccumulator {
    high_f: f64,
    low_f: f64,
    precipitation_mm: f64,
}

impl OpenWeatherMapClient {
    pub fn new(config: OpenWeatherMapConfig, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, config })
    }

    /// Today plus the longest rain window the config allows
    fn forecast_url(&self, zip: &str) -> String {
        format!(
            "{}/forecast/daily?zip={},{}&cnt={}&appid={}&units=imperial",
            self.config.base_url.trim_end_matches('/'),
            zip,
            self.config.country,
            MAX_RAIN_CHECK_DAYS + 1,
            self.config.api_key
        )
    }

    /// One record per day; records that land on the same local date are merged
    fn convert_response(&self, response: OwmDailyResponse, timezone: Tz) -> Result<Forecast> {
        let mut by_date: BTreeMap<NaiveDate, DayAccumulator> = BTreeMap::new();

        for item in &response.list {
            let timestamp = DateTime::from_timestamp(item.dt, 0).ok_or_else(|| {
                SprinklerError::InvalidData(format!("forecast timestamp out of range: {}", item.dt))
            })?;
            let date = timestamp.with_timezone(&timezone).date_naive();

            // Combine rain and snow precipitation
            let precipitation = item.rain.unwrap_or(0.0) + item.snow.unwrap_or(0.0);

            let day = by_date.entry(date).or_insert(DayAccumulator {
                high_f: item.temp.max,
                low_f: item.temp.min,
                precipitation_mm: 0.0,
            });
            day.high_f = day.high_f.max(item.temp.max);
            day.low_f = day.low_f.min(item.temp.min);
            day.precipitation_mm += precipitation;
        }

        let days = by_date
            .into_iter()
            .map(|(date, day)| {
                ForecastDay::new(
                    date,
                    day.high_f.round() as i32,
                    day.low_f.round() as i32,
                    day.precipitation_mm > self.config.rain_threshold_mm,
                )
            })
            .collect();

        Ok(Forecast::new(days))
    }
}

#[async_trait::async_trait]
impl WeatherSource for OpenWeatherMapClient {
    async fn fetch_forecast(&self, location: &str, timezone: Tz) -> Result<Forecast> {
        let response = self
            .client
            .get(self.forecast_url(location))
            .send()
            .await
            .map_err(|e| SprinklerError::Transport(format!("OpenWeatherMap: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SprinklerError::Transport(format!(
                "OpenWeatherMap returned {}: {}",
                status, body
            )));
        }

        let owm_response: OwmDailyResponse = response.json().await.map_err(|e| {
            SprinklerError::Transport(format!("Failed to parse OpenWeatherMap response: {}", e))
        })?;

        let forecast = self.convert_response(owm_response, timezone)?;
        tracing::info!(
            "Forecast for {}: {} days starting {}",
            location,
            forecast.days.len(),
            forecast
                .days
                .first()
                .map(|d| d.date.to_string())
                .unwrap_or_else(|| "-".into())
        );
        Ok(forecast)
    }

    async fn test_connection(&self, zip: &str) -> Result<bool> {
        let url = format!(
            "{}/weather?zip={},{}&appid={}&units=imperial",
            self.config.base_url.trim_end_matches('/'),
            zip,
            self.config.country,
            self.config.api_key
        );

        let response =
            self.client.get(&url).send().await.map_err(|e| {
                SprinklerError::Transport(format!("OpenWeatherMap: {}", e))
            })?;

        Ok(response.status().is_success())
    }
}
