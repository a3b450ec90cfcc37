use crate::error::{Result, SprinklerError};
use crate::logic::calendar::{CalendarEntry, SeasonalCalendar};
use dialoguer::{Input, Password};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const MAX_RAIN_CHECK_DAYS: u32 = 10;
pub const MAX_RAIN_DELAY_DAYS: u32 = 7;
/// Rachio accepts at most 10800 seconds per zone in one start request
pub const MAX_ZONE_MINUTES: u32 = 180;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub rachio: RachioConfig,
    pub openweathermap: OpenWeatherMapConfig,
    #[serde(default)]
    pub model: ModelConfig,
    /// Runtime basis per controller zone number
    #[serde(default)]
    pub zones: BTreeMap<u32, ZoneBasisConfig>,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

#[derive(Clone, Deserialize, Serialize)]
pub struct RachioConfig {
    pub api_token: String,
    #[serde(default = "default_rachio_url")]
    pub base_url: String,
}

impl std::fmt::Debug for RachioConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RachioConfig")
            .field("api_token", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Clone, Deserialize, Serialize)]
pub struct OpenWeatherMapConfig {
    pub api_key: String,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default = "default_owm_url")]
    pub base_url: String,
    /// Daily precipitation above this many millimetres counts as rain
    #[serde(default)]
    pub rain_threshold_mm: f64,
}

impl std::fmt::Debug for OpenWeatherMapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherMapConfig")
            .field("api_key", &"[REDACTED]")
            .field("country", &self.country)
            .field("base_url", &self.base_url)
            .field("rain_threshold_mm", &self.rain_threshold_mm)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelConfig {
    #[serde(default = "default_rain_check_days")]
    pub rain_check_days: u32,
    #[serde(default = "default_rain_delay_days")]
    pub rain_delay_days: u32,
    /// Fixed minutes per zone, bypassing the weather model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dry_run_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar: Option<Vec<CalendarEntry>>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            rain_check_days: default_rain_check_days(),
            rain_delay_days: default_rain_delay_days(),
            dry_run_duration: None,
            calendar: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ZoneBasisConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub runtime_basis: u32,
}

fn default_rachio_url() -> String {
    "https://api.rach.io/1/public".into()
}

fn default_owm_url() -> String {
    "https://api.openweathermap.org/data/2.5".into()
}

fn default_country() -> String {
    "us".into()
}

fn default_rain_check_days() -> u32 {
    2
}

fn default_rain_delay_days() -> u32 {
    7
}

fn default_http_timeout_secs() -> u64 {
    30
}

impl Config {
    pub fn load(config_override: Option<&PathBuf>) -> Result<Self> {
        let config_path = match config_override {
            Some(p) => p.clone(),
            None => Self::find_config_path()?,
        };

        if !config_path.exists() {
            return Err(SprinklerError::Config(format!(
                "Config file not found at {:?}. Run `sprinklerops init` to set up.",
                config_path
            )));
        }

        let config_str = std::fs::read_to_string(&config_path)
            .map_err(|e| SprinklerError::Config(format!("Failed to read config: {}", e)))?;

        let config = Self::from_yaml(&Self::substitute_env_vars(&config_str))?;
        tracing::debug!("Loaded config from {}", config_path.display());
        Ok(config)
    }

    /// Parse and validate, without touching the environment
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| SprinklerError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject anything that would only blow up after the controller was contacted
    pub fn validate(&self) -> Result<()> {
        if self.rachio.api_token.trim().is_empty() {
            return Err(SprinklerError::Config("rachio.api_token is empty".into()));
        }
        if self.openweathermap.api_key.trim().is_empty() {
            return Err(SprinklerError::Config(
                "openweathermap.api_key is empty".into(),
            ));
        }
        if !self.openweathermap.rain_threshold_mm.is_finite()
            || self.openweathermap.rain_threshold_mm < 0.0
        {
            return Err(SprinklerError::Config(format!(
                "openweathermap.rain_threshold_mm must be >= 0, got {}",
                self.openweathermap.rain_threshold_mm
            )));
        }
        if self.model.rain_check_days > MAX_RAIN_CHECK_DAYS {
            return Err(SprinklerError::Config(format!(
                "model.rain_check_days must be 0-{}, got {}",
                MAX_RAIN_CHECK_DAYS, self.model.rain_check_days
            )));
        }
        if self.model.rain_delay_days > MAX_RAIN_DELAY_DAYS {
            return Err(SprinklerError::Config(format!(
                "model.rain_delay_days must be 0-{}, got {}",
                MAX_RAIN_DELAY_DAYS, self.model.rain_delay_days
            )));
        }
        if let Some(minutes) = self.model.dry_run_duration {
            if minutes > MAX_ZONE_MINUTES {
                return Err(SprinklerError::Config(format!(
                    "model.dry_run_duration must be 0-{} minutes, got {}",
                    MAX_ZONE_MINUTES, minutes
                )));
            }
        }
        for (number, zone) in &self.zones {
            if zone.runtime_basis > MAX_ZONE_MINUTES {
                return Err(SprinklerError::Config(format!(
                    "zones.{}.runtime_basis must be 0-{} minutes, got {}",
                    number, MAX_ZONE_MINUTES, zone.runtime_basis
                )));
            }
        }
        if self.http_timeout_secs == 0 {
            return Err(SprinklerError::Config(
                "http_timeout_secs must be positive".into(),
            ));
        }
        self.calendar()?;
        Ok(())
    }

    pub fn calendar(&self) -> Result<SeasonalCalendar> {
        match &self.model.calendar {
            Some(entries) => SeasonalCalendar::new(entries),
            None => Ok(SeasonalCalendar::default()),
        }
    }

    pub fn runtime_basis(&self) -> BTreeMap<u32, u32> {
        self.zones
            .iter()
            .map(|(number, zone)| (*number, zone.runtime_basis))
            .collect()
    }

    /// Search for config.yaml in standard locations.
    /// Returns the path of the first found config, or the XDG default path if none found.
    fn find_config_path() -> Result<PathBuf> {
        let local_config = PathBuf::from("config/config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        Self::default_config_path()
    }

    /// Default path for writing new config files (~/.config/sprinklerops/config.yaml).
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| SprinklerError::Config("Cannot determine config directory".into()))?
            .join("sprinklerops");
        Ok(config_dir.join("config.yaml"))
    }

    /// Run interactive setup prompts and write config to disk.
    pub fn setup_interactive(target: Option<&PathBuf>) -> Result<(Self, PathBuf)> {
        println!();
        println!("Let's set up SprinklerOps!");
        println!();

        println!("Rachio");
        let api_token: String = Password::new()
            .with_prompt("  API token")
            .interact()
            .map_err(|e| SprinklerError::Config(format!("Input error: {}", e)))?;

        println!();
        println!("OpenWeatherMap");
        let api_key: String = Password::new()
            .with_prompt("  API key")
            .interact()
            .map_err(|e| SprinklerError::Config(format!("Input error: {}", e)))?;

        let country: String = Input::new()
            .with_prompt("  Country code for ZIP lookups")
            .default(default_country())
            .interact_text()
            .map_err(|e| SprinklerError::Config(format!("Input error: {}", e)))?;

        println!();
        println!("Watering model");
        let rain_check_days: u32 = Input::new()
            .with_prompt(format!("  Days of forecast to check for rain (0-{})", MAX_RAIN_CHECK_DAYS))
            .default(default_rain_check_days())
            .validate_with(|v: &u32| {
                if *v <= MAX_RAIN_CHECK_DAYS {
                    Ok(())
                } else {
                    Err("out of range")
                }
            })
            .interact_text()
            .map_err(|e| SprinklerError::Config(format!("Input error: {}", e)))?;

        let rain_delay_days: u32 = Input::new()
            .with_prompt(format!("  Rain delay length in days (0-{})", MAX_RAIN_DELAY_DAYS))
            .default(default_rain_delay_days())
            .validate_with(|v: &u32| {
                if *v <= MAX_RAIN_DELAY_DAYS {
                    Ok(())
                } else {
                    Err("out of range")
                }
            })
            .interact_text()
            .map_err(|e| SprinklerError::Config(format!("Input error: {}", e)))?;

        let zone_count: u32 = Input::new()
            .with_prompt("  Number of controller zones")
            .default(8)
            .interact_text()
            .map_err(|e| SprinklerError::Config(format!("Input error: {}", e)))?;

        let mut zones = BTreeMap::new();
        for number in 1..=zone_count {
            let runtime_basis: u32 = Input::new()
                .with_prompt(format!(
                    "  Zone {} minutes at 100°F (0-{}, 0 to skip)",
                    number, MAX_ZONE_MINUTES
                ))
                .default(0)
                .validate_with(|v: &u32| {
                    if *v <= MAX_ZONE_MINUTES {
                        Ok(())
                    } else {
                        Err("out of range")
                    }
                })
                .interact_text()
                .map_err(|e| SprinklerError::Config(format!("Input error: {}", e)))?;
            zones.insert(
                number,
                ZoneBasisConfig {
                    name: None,
                    runtime_basis,
                },
            );
        }

        println!();

        let config = Config {
            rachio: RachioConfig {
                api_token,
                base_url: default_rachio_url(),
            },
            openweathermap: OpenWeatherMapConfig {
                api_key,
                country,
                base_url: default_owm_url(),
                rain_threshold_mm: 0.0,
            },
            model: ModelConfig {
                rain_check_days,
                rain_delay_days,
                dry_run_duration: None,
                calendar: None,
            },
            zones,
            http_timeout_secs: default_http_timeout_secs(),
        };
        config.validate()?;

        let config_path = match target {
            Some(p) => p.clone(),
            None => Self::default_config_path()?,
        };
        config.write_to(&config_path)?;

        println!("Configuration saved to {}", config_path.display());
        println!();

        Ok((config, config_path))
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(self)?;
        let content = format!(
            "# SprinklerOps Configuration\n# Generated by `sprinklerops init`\n# Environment variable substitution (${{VAR}}) is supported.\n\n{}",
            yaml
        );
        std::fs::write(path, content)?;
        Ok(())
    }

    fn substitute_env_vars(content: &str) -> String {
        let mut result = content.to_string();

        // Find all ${VAR_NAME} patterns and substitute
        let re = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .expect("env var pattern is a valid regex");

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let placeholder = &cap[0];
            if let Ok(value) = std::env::var(var_name) {
                result = result.replace(placeholder, &value);
            }
        }

        result
    }

    pub fn data_dir(data_dir_override: Option<&PathBuf>) -> Result<PathBuf> {
        // CLI override takes priority
        if let Some(dir) = data_dir_override {
            std::fs::create_dir_all(dir)?;
            return Ok(dir.clone());
        }

        if let Ok(dir) = std::env::var("SPRINKLEROPS_DATA_DIR") {
            let p = PathBuf::from(dir);
            std::fs::create_dir_all(&p)?;
            return Ok(p);
        }

        let data_dir = dirs::data_dir()
            .ok_or_else(|| SprinklerError::Config("Cannot determine data directory".into()))?
            .join("sprinklerops");

        std::fs::create_dir_all(&data_dir)?;
        Ok(data_dir)
    }
}
