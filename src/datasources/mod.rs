pub mod openweathermap;
pub mod rachio;

pub use openweathermap::OpenWeatherMapClient;
pub use rachio::RachioClient;

use crate::error::Result;
use crate::models::{DeviceState, Forecast, ZoneStartCommand};
use chrono_tz::Tz;

/// Irrigation controller: device state plus the two write commands
#[async_trait::async_trait]
pub trait ControllerApi: Send + Sync {
    async fn fetch_device_state(&self) -> Result<DeviceState>;

    /// Start (or extend) a rain delay beginning now
    async fn set_rain_delay(&self, device_id: &str, duration_seconds: u32) -> Result<()>;

    /// Start every given zone in one batched request.
    /// Returns how many zones were actually sent.
    async fn start_zones(&self, commands: &[ZoneStartCommand]) -> Result<usize>;

    async fn test_connection(&self) -> Result<bool>;
}

/// Daily forecast provider
#[async_trait::async_trait]
pub trait WeatherSource: Send + Sync {
    /// Forecast for `location`, bucketed into dates local to `timezone`
    async fn fetch_forecast(&self, location: &str, timezone: Tz) -> Result<Forecast>;

    async fn test_connection(&self, location: &str) -> Result<bool>;
}
