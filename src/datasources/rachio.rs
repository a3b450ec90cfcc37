use super::ControllerApi;
use crate::config::RachioConfig;
use crate::error::{Result, SprinklerError};
use crate::models::{DeviceState, RainDelayState, ZoneConfig, ZoneStartCommand};
use chrono::DateTime;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub struct RachioClient {
    client: reqwest::Client,
    config: RachioConfig,
}

// Rachio public API response structures
#[derive(Debug, Deserialize)]
struct PersonInfo {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Person {
    #[serde(default)]
    devices: Vec<RachioDevice>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RachioDevice {
    id: String,
    #[serde(default)]
    name: String,
    time_zone: String,
    zip: String,
    #[serde(default)]
    rain_delay_start_date: Option<i64>, // epoch millis
    #[serde(default)]
    rain_delay_expiration_date: Option<i64>,
    #[serde(default)]
    zones: Vec<RachioZone>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RachioZone {
    id: String,
    zone_number: u32,
    #[serde(default)]
    name: String,
    enabled: bool,
}

#[derive(Debug, Serialize)]
struct RainDelayRequest<'a> {
    id: &'a str,
    duration: u32,
}

#[derive(Debug, Serialize)]
struct StartMultipleRequest<'a> {
    zones: Vec<ZoneStartRequest<'a>>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct ZoneStartRequest<'a> {
    id: &'a str,
    duration: u32,
    sort_order: usize,
}

impl RachioClient {
    pub fn new(config: RachioConfig, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(&self.config.api_token)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| SprinklerError::Transport(format!("Rachio: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SprinklerError::Transport(format!(
                "Rachio GET {} returned {}: {}",
                path, status, body
            )));
        }

        response.json().await.map_err(|e| {
            SprinklerError::Transport(format!("Failed to parse Rachio response: {}", e))
        })
    }

    async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        let response = self
            .client
            .put(self.url(path))
            .bearer_auth(&self.config.api_token)
            .json(body)
            .send()
            .await
            .map_err(|e| SprinklerError::Transport(format!("Rachio: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SprinklerError::Transport(format!(
                "Rachio PUT {} returned {}: {}",
                path, status, body
            )));
        }

        Ok(())
    }
}

fn convert_device(device: RachioDevice) -> Result<DeviceState> {
    let millis = |value: Option<i64>, field: &str| -> Result<_> {
        value
            .map(|ms| {
                DateTime::from_timestamp_millis(ms).ok_or_else(|| {
                    SprinklerError::InvalidData(format!("{} out of range: {}", field, ms))
                })
            })
            .transpose()
    };

    let rain_delay = RainDelayState {
        start: millis(device.rain_delay_start_date, "rainDelayStartDate")?,
        expiration: millis(device.rain_delay_expiration_date, "rainDelayExpirationDate")?,
    };

    let mut zones: Vec<ZoneConfig> = device
        .zones
        .into_iter()
        .map(|z| ZoneConfig {
            id: z.id,
            zone_number: z.zone_number,
            name: z.name,
            enabled: z.enabled,
        })
        .collect();
    zones.sort_by_key(|z| z.zone_number);

    Ok(DeviceState {
        device_id: device.id,
        name: device.name,
        timezone: device.time_zone,
        zip: device.zip,
        zones,
        rain_delay,
    })
}

/// Zero-length starts are dropped here; the controller has no use for them
fn start_request(commands: &[ZoneStartCommand]) -> StartMultipleRequest<'_> {
    StartMultipleRequest {
        zones: commands
            .iter()
            .filter(|c| c.duration_seconds > 0)
            .enumerate()
            .map(|(i, c)| ZoneStartRequest {
                id: &c.zone_id,
                duration: c.duration_seconds,
                sort_order: i + 1,
            })
            .collect(),
    }
}

#[async_trait::async_trait]
impl ControllerApi for RachioClient {
    async fn fetch_device_state(&self) -> Result<DeviceState> {
        let info: PersonInfo = self.get("person/info").await?;
        let person: Person = self.get(&format!("person/{}", info.id)).await?;

        let device = person.devices.into_iter().next().ok_or_else(|| {
            SprinklerError::NotFound(format!("no controller registered to person {}", info.id))
        })?;

        let state = convert_device(device)?;
        tracing::info!(
            "Controller {} ({}): {} zones, timezone {}",
            state.name,
            state.device_id,
            state.zones.len(),
            state.timezone
        );
        Ok(state)
    }

    async fn set_rain_delay(&self, device_id: &str, duration_seconds: u32) -> Result<()> {
        tracing::info!(
            "Setting rain delay on {} for {}s",
            device_id,
            duration_seconds
        );
        self.put(
            "device/rain_delay",
            &RainDelayRequest {
                id: device_id,
                duration: duration_seconds,
            },
        )
        .await
    }

    async fn start_zones(&self, commands: &[ZoneStartCommand]) -> Result<usize> {
        let request = start_request(commands);
        if request.zones.is_empty() {
            tracing::info!("No zone has a non-zero runtime; nothing to start");
            return Ok(0);
        }

        tracing::info!("Starting {} zones", request.zones.len());
        self.put("zone/start_multiple", &request).await?;
        Ok(request.zones.len())
    }

    async fn test_connection(&self) -> Result<bool> {
        let response = self
            .client
            .get(self.url("person/info"))
            .bearer_auth(&self.config.api_token)
            .send()
            .await
            .map_err(|e| SprinklerError::Transport(format!("Rachio: {}", e)))?;

        Ok(response.status().is_success())
    }
}
