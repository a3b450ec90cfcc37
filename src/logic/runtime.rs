use crate::config::MAX_ZONE_MINUTES;
use crate::error::{Result, SprinklerError};
use crate::logic::calendar::SeasonalCalendar;
use crate::models::{Forecast, TemperatureBasis, ZoneConfig, ZoneStartCommand};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

/// Weather-adjusted minutes for one zone.
///
/// `runtime_basis` is the runtime at a 100°F reference with multiplier 1.0.
/// Below-zero temperatures clamp to no watering.
pub fn adjusted_runtime_minutes(runtime_basis: u32, temperature: i32, multiplier: f64) -> u32 {
    let scaled = (runtime_basis as f64) * (temperature as f64) * multiplier / 100.0;
    if scaled <= 0.0 {
        0
    } else {
        scaled.floor() as u32
    }
}

#[derive(Debug, Clone, Copy)]
enum Runtime {
    Fixed(u32),
    Adjusted(i32),
}

/// Result of the runtime gate: the batch to start and how it was derived
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZonePlan {
    pub month: u32,
    pub basis: TemperatureBasis,
    pub multiplier: f64,
    /// `None` when a fixed dry-run duration bypassed the weather model
    pub temperature: Option<i32>,
    pub commands: Vec<ZoneStartCommand>,
}

/// Runtime gate.
///
/// Every enabled zone gets a command, including zero-duration ones. An
/// enabled zone missing from `runtime_basis` aborts the whole plan.
/// Adjusted runtimes are capped at `MAX_ZONE_MINUTES`; a fixed dry-run
/// duration above it is rejected.
pub fn plan_zones(
    zones: &[ZoneConfig],
    forecast: &Forecast,
    today: NaiveDate,
    calendar: &SeasonalCalendar,
    runtime_basis: &BTreeMap<u32, u32>,
    dry_run_duration: Option<u32>,
) -> Result<ZonePlan> {
    let month = today.month();
    let basis = calendar.basis_for(month)?;
    let multiplier = calendar.multiplier_for(month)?;

    let runtime = match dry_run_duration {
        Some(minutes) if minutes > MAX_ZONE_MINUTES => {
            return Err(SprinklerError::Config(format!(
                "dry-run duration {} min exceeds the {} min zone limit",
                minutes, MAX_ZONE_MINUTES
            )));
        }
        Some(minutes) => {
            tracing::info!("Dry-run duration set: every zone runs {} min", minutes);
            Runtime::Fixed(minutes)
        }
        None => Runtime::Adjusted(forecast.current_temperature(today, basis)?),
    };

    let mut commands = Vec::new();
    for zone in zones.iter().filter(|z| z.enabled) {
        let minutes = match runtime {
            Runtime::Fixed(minutes) => minutes,
            Runtime::Adjusted(temperature) => {
                let basis_minutes = runtime_basis.get(&zone.zone_number).copied().ok_or_else(
                    || {
                        SprinklerError::NotFound(format!(
                            "no runtime basis configured for zone {} ({})",
                            zone.zone_number, zone.name
                        ))
                    },
                )?;
                let minutes = adjusted_runtime_minutes(basis_minutes, temperature, multiplier);
                if minutes > MAX_ZONE_MINUTES {
                    tracing::warn!(
                        "Zone {} wants {} min; capping at {}",
                        zone.zone_number,
                        minutes,
                        MAX_ZONE_MINUTES
                    );
                }
                minutes.min(MAX_ZONE_MINUTES)
            }
        };

        tracing::debug!(
            "Zone {} ({}): {} min",
            zone.zone_number,
            zone.name,
            minutes
        );

        commands.push(ZoneStartCommand {
            zone_id: zone.id.clone(),
            zone_number: zone.zone_number,
            name: zone.name.clone(),
            duration_seconds: minutes * 60,
        });
    }

    let temperature = match runtime {
        Runtime::Adjusted(temperature) => Some(temperature),
        Runtime::Fixed(_) => None,
    };

    Ok(ZonePlan {
        month,
        basis,
        multiplier,
        temperature,
        commands,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::calendar::CalendarEntry;
    use crate::models::ForecastDay;

    fn july(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, day).unwrap()
    }

    fn zone(number: u32, enabled: bool) -> ZoneConfig {
        ZoneConfig {
            id: format!("zone-{}", number),
            zone_number: number,
            name: format!("Zone {}", number),
            enabled,
        }
    }

    fn basis_table(pairs: &[(u32, u32)]) -> BTreeMap<u32, u32> {
        pairs.iter().copied().collect()
    }

    fn hot_day() -> Forecast {
        Forecast::new(vec![ForecastDay::new(july(1), 90, 70, false)])
    }

    #[test]
    fn formula_floors_result() {
        assert_eq!(adjusted_runtime_minutes(22, 90, 1.0), 19);
        assert_eq!(adjusted_runtime_minutes(98, 90, 1.0), 88);
        assert_eq!(adjusted_runtime_minutes(10, 100, 1.0), 10);
        assert_eq!(adjusted_runtime_minutes(10, 100, 1.5), 15);
    }

    #[test]
    fn formula_never_goes_negative() {
        assert_eq!(adjusted_runtime_minutes(22, -10, 1.0), 0);
        assert_eq!(adjusted_runtime_minutes(0, 90, 1.0), 0);
    }

    #[test]
    fn summer_plan_uses_high_temperature() {
        let plan = plan_zones(
            &[zone(1, true), zone(2, true)],
            &hot_day(),
            july(1),
            &SeasonalCalendar::default(),
            &basis_table(&[(1, 8), (2, 22)]),
            None,
        )
        .unwrap();

        assert_eq!(plan.basis, TemperatureBasis::High);
        assert_eq!(plan.temperature, Some(90));
        assert_eq!(plan.commands.len(), 2);
        assert_eq!(plan.commands[0].duration_seconds, 7 * 60);
        assert_eq!(plan.commands[1].duration_seconds, 1140);
    }

    #[test]
    fn disabled_zones_are_left_out_and_zero_basis_kept() {
        let plan = plan_zones(
            &[zone(1, false), zone(2, true), zone(3, true)],
            &hot_day(),
            july(1),
            &SeasonalCalendar::default(),
            &basis_table(&[(2, 22), (3, 0)]),
            None,
        )
        .unwrap();

        let numbers: Vec<_> = plan.commands.iter().map(|c| c.zone_number).collect();
        assert_eq!(numbers, vec![2, 3]);
        assert_eq!(plan.commands[1].duration_seconds, 0);
    }

    #[test]
    fn multiplier_scales_runtime() {
        let entries: Vec<_> = (1..=12)
            .map(|m| CalendarEntry::new(m, TemperatureBasis::Average, 2.0))
            .collect();
        let calendar = SeasonalCalendar::new(&entries).unwrap();

        let plan = plan_zones(
            &[zone(1, true)],
            &hot_day(),
            july(1),
            &calendar,
            &basis_table(&[(1, 10)]),
            None,
        )
        .unwrap();

        // average of 90/70 is 80; 10 * 80 * 2.0 / 100 = 16
        assert_eq!(plan.temperature, Some(80));
        assert_eq!(plan.commands[0].duration_seconds, 16 * 60);
    }

    #[test]
    fn missing_today_is_not_found() {
        let result = plan_zones(
            &[zone(1, true)],
            &hot_day(),
            july(2),
            &SeasonalCalendar::default(),
            &basis_table(&[(1, 10)]),
            None,
        );
        assert!(matches!(result, Err(SprinklerError::NotFound(_))));
    }

    #[test]
    fn enabled_zone_without_basis_is_not_found() {
        let result = plan_zones(
            &[zone(1, true), zone(4, true)],
            &hot_day(),
            july(1),
            &SeasonalCalendar::default(),
            &basis_table(&[(1, 10)]),
            None,
        );
        assert!(matches!(result, Err(SprinklerError::NotFound(_))));
    }

    #[test]
    fn dry_run_duration_bypasses_weather() {
        // No forecast entry for today and no basis table: dry run still plans
        let plan = plan_zones(
            &[zone(1, true), zone(2, false)],
            &Forecast::new(Vec::new()),
            july(1),
            &SeasonalCalendar::default(),
            &BTreeMap::new(),
            Some(1),
        )
        .unwrap();

        assert_eq!(plan.temperature, None);
        assert_eq!(plan.commands.len(), 1);
        assert_eq!(plan.commands[0].duration_seconds, 60);
    }

    #[test]
    fn runtimes_stay_within_controller_limit() {
        let entries: Vec<_> = (1..=12)
            .map(|m| CalendarEntry::new(m, TemperatureBasis::High, 1000.0))
            .collect();
        let calendar = SeasonalCalendar::new(&entries).unwrap();

        let plan = plan_zones(
            &[zone(1, true)],
            &hot_day(),
            july(1),
            &calendar,
            &basis_table(&[(1, u32::MAX)]),
            None,
        )
        .unwrap();
        assert_eq!(plan.commands[0].duration_seconds, MAX_ZONE_MINUTES * 60);

        let result = plan_zones(
            &[zone(1, true)],
            &hot_day(),
            july(1),
            &SeasonalCalendar::default(),
            &BTreeMap::new(),
            Some(71_582_789),
        );
        assert!(matches!(result, Err(SprinklerError::Config(_))));
    }

    #[test]
    fn identical_inputs_give_identical_plans() {
        let zones = [zone(1, true), zone(2, true)];
        let table = basis_table(&[(1, 8), (2, 22)]);
        let calendar = SeasonalCalendar::default();
        let forecast = hot_day();

        let first = plan_zones(&zones, &forecast, july(1), &calendar, &table, None).unwrap();
        let second = plan_zones(&zones, &forecast, july(1), &calendar, &table, None).unwrap();
        assert_eq!(first, second);
    }
}
