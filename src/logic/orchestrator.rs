use super::engine::DecisionEngine;
use super::rain_delay::RainDecision;
use super::runtime::ZonePlan;
use crate::datasources::{ControllerApi, WeatherSource};
use crate::error::{Result, SprinklerError};
use crate::models::{DeviceState, Forecast};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

/// What a run decided, and whether it was sent to the controller
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    Delayed {
        decision: RainDecision,
        /// Seconds of controller rain delay requested by this run
        delay_set_seconds: Option<u32>,
    },
    Watered {
        plan: ZonePlan,
        committed: bool,
        /// Zones the controller was asked to run; zero-minute zones are not sent
        zones_started: usize,
    },
}

impl RunOutcome {
    pub fn status_line(&self) -> &'static str {
        match self {
            RunOutcome::Delayed { .. } => "=== Stopping: Rain Delay ===",
            RunOutcome::Watered {
                committed: true,
                zones_started: 0,
                ..
            } => "=== Done: No Zone Needed Water ===",
            RunOutcome::Watered { committed: true, .. } => "=== Done: Lawn Watered ===",
            RunOutcome::Watered {
                committed: false, ..
            } => "=== Planned: Lawn Not Watered (no-commit) ===",
        }
    }
}

/// Sequences one run: device state, forecast, rain gate, runtime gate, commands.
///
/// Calls are strictly sequential and any collaborator error ends the run
/// before a start command could be issued.
pub struct Orchestrator<C, W> {
    controller: C,
    weather: W,
    engine: DecisionEngine,
}

impl<C: ControllerApi, W: WeatherSource> Orchestrator<C, W> {
    pub fn new(controller: C, weather: W, engine: DecisionEngine) -> Self {
        Self {
            controller,
            weather,
            engine,
        }
    }

    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    /// Device state plus its forecast, bucketed in the device's timezone
    pub async fn fetch_inputs(&self) -> Result<(DeviceState, Tz, Forecast)> {
        let device = self.controller.fetch_device_state().await?;
        let timezone = parse_timezone(&device.timezone)?;
        let forecast = self.weather.fetch_forecast(&device.zip, timezone).await?;

        let wanted = self.engine.settings().rain_check_days as usize;
        if forecast.days.len() < wanted {
            tracing::warn!(
                "Forecast has {} days but rain_check_days is {}; checking only the days available",
                forecast.days.len(),
                wanted
            );
        }
        Ok((device, timezone, forecast))
    }

    /// With `commit == false` every decision is made but nothing is written
    pub async fn run(&self, now: DateTime<Utc>, commit: bool) -> Result<RunOutcome> {
        let (device, timezone, forecast) = self.fetch_inputs().await?;
        let today = now.with_timezone(&timezone).date_naive();
        tracing::debug!(
            "Local date for {} is {}; {} of {} zones enabled",
            device.timezone,
            today,
            device.enabled_zones().count(),
            device.zones.len()
        );

        let decision = self
            .engine
            .rain_decision(&device.rain_delay, &forecast, now);

        if decision.is_delayed() {
            tracing::info!("Rain gate: {}", decision);

            let mut delay_set_seconds = None;
            if decision.needs_device_delay() {
                let seconds = self.engine.rain_delay_seconds();
                if commit {
                    self.controller
                        .set_rain_delay(&device.device_id, seconds)
                        .await?;
                    delay_set_seconds = Some(seconds);
                } else {
                    tracing::info!("no-commit: skipping {}s rain delay", seconds);
                }
            }

            return Ok(RunOutcome::Delayed {
                decision,
                delay_set_seconds,
            });
        }

        let plan = self.engine.zone_plan(&device.zones, &forecast, today)?;
        tracing::info!(
            "Runtime gate: month {} basis {} temperature {:?} multiplier {} -> {} zones",
            plan.month,
            plan.basis,
            plan.temperature,
            plan.multiplier,
            plan.commands.len()
        );

        let mut zones_started = 0;
        if commit {
            zones_started = self.controller.start_zones(&plan.commands).await?;
        } else {
            tracing::info!("no-commit: skipping zone start");
        }

        Ok(RunOutcome::Watered {
            plan,
            committed: commit,
            zones_started,
        })
    }

    pub async fn check_connections(&self) -> ConnectionStatus {
        let mut status = ConnectionStatus::default();

        match self.controller.fetch_device_state().await {
            Ok(device) => {
                status.controller = true;
                status.weather = self
                    .weather
                    .test_connection(&device.zip)
                    .await
                    .unwrap_or(false);
            }
            Err(e) => {
                tracing::warn!("Controller check failed: {}", e);
                status.controller = self.controller.test_connection().await.unwrap_or(false);
            }
        }

        status
    }
}

fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>().map_err(|_| {
        SprinklerError::InvalidData(format!("controller reports unknown timezone '{}'", name))
    })
}

#[derive(Debug, Clone, Default)]
pub struct ConnectionStatus {
    pub controller: bool,
    pub weather: bool,
}

impl ConnectionStatus {
    pub fn all_connected(&self) -> bool {
        self.controller && self.weather
    }
}
