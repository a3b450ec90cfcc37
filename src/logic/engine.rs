use super::calendar::SeasonalCalendar;
use super::rain_delay::{self, RainDecision};
use super::runtime::{self, ZonePlan};
use crate::config::Config;
use crate::error::Result;
use crate::models::{Forecast, RainDelayState, ZoneConfig};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub rain_check_days: u32,
    pub rain_delay_days: u32,
    pub dry_run_duration: Option<u32>,
    /// Minutes at 100°F, keyed by zone number
    pub runtime_basis: BTreeMap<u32, u32>,
}

/// Rain gate followed by the runtime gate. Holds only immutable
/// configuration, so identical inputs always produce identical decisions.
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    calendar: SeasonalCalendar,
    settings: EngineSettings,
}

impl DecisionEngine {
    pub fn new(calendar: SeasonalCalendar, settings: EngineSettings) -> Self {
        Self { calendar, settings }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            config.calendar()?,
            EngineSettings {
                rain_check_days: config.model.rain_check_days,
                rain_delay_days: config.model.rain_delay_days,
                dry_run_duration: config.model.dry_run_duration,
                runtime_basis: config.runtime_basis(),
            },
        ))
    }

    pub fn rain_decision(
        &self,
        device: &RainDelayState,
        forecast: &Forecast,
        now: DateTime<Utc>,
    ) -> RainDecision {
        rain_delay::evaluate(device, forecast, self.settings.rain_check_days, now)
    }

    pub fn rain_delay_seconds(&self) -> u32 {
        rain_delay::delay_duration_seconds(self.settings.rain_delay_days)
    }

    pub fn zone_plan(
        &self,
        zones: &[ZoneConfig],
        forecast: &Forecast,
        today: NaiveDate,
    ) -> Result<ZonePlan> {
        runtime::plan_zones(
            zones,
            forecast,
            today,
            &self.calendar,
            &self.settings.runtime_basis,
            self.settings.dry_run_duration,
        )
    }

    pub fn calendar(&self) -> &SeasonalCalendar {
        &self.calendar
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }
}
