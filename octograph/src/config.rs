use std::{fs, path::Path};

use anyhow::Context;
use chrono::NaiveTime;
use chrono_tz::Tz;
use octograph_domain::domain::LowRateWindow;
use serde::Deserialize;

use crate::{pipeline::PipelineError, sources::octopus::DEFAULT_BASE_URL};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OctopusConfig {
    pub api_key: Option<String>,
    pub account_name: Option<String>,
    pub base_url: String,
}

impl Default for OctopusConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            account_name: None,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InfluxDbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl Default for InfluxDbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8086,
            user: String::new(),
            password: String::new(),
            database: "energy".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ElectricityConfig {
    pub mpan: Option<String>,
    pub serial_number: Option<String>,
    pub product_code: String,
    pub tariff_code: String,
    /// Overrides the published standing charge.
    pub standing_charge: Option<f64>,
    pub unit_rate_high: f64,
    pub unit_rate_low: f64,
    pub unit_rate_low_start: String,
    pub unit_rate_low_end: String,
    /// Empty disables the low-rate window.
    pub unit_rate_time_zone: String,
    pub agile_standing_charge: Option<f64>,
    /// Fetch the agile rate table and emit agile cost fields.
    pub agile: bool,
}

impl Default for ElectricityConfig {
    fn default() -> Self {
        Self {
            mpan: None,
            serial_number: None,
            product_code: "AGILE-FLEX-22-11-25".to_string(),
            tariff_code: "E-1R-AGILE-FLEX-22-11-25-C".to_string(),
            standing_charge: None,
            unit_rate_high: 0.0,
            unit_rate_low: 0.0,
            unit_rate_low_start: "00:00".to_string(),
            unit_rate_low_end: "00:00".to_string(),
            unit_rate_time_zone: "Europe/London".to_string(),
            agile_standing_charge: None,
            agile: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GasConfig {
    pub ignore: bool,
    pub mprn: Option<String>,
    pub serial_number: Option<String>,
    /// SMETS1 meters (1) report kWh; later types report m³.
    pub meter_type: u32,
    pub volume_correction_factor: f64,
    pub calorific_value: f64,
    pub product_code: String,
    pub tariff_code: String,
    pub standing_charge: Option<f64>,
    pub unit_rate: Option<f64>,
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            ignore: false,
            mprn: None,
            serial_number: None,
            meter_type: 1,
            volume_correction_factor: 1.02264,
            calorific_value: 40.0,
            product_code: "VAR-22-10-01".to_string(),
            tariff_code: "G-1R-VAR-22-10-01-C".to_string(),
            standing_charge: None,
            unit_rate: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub octopus: OctopusConfig,
    pub influxdb: InfluxDbConfig,
    pub electricity: ElectricityConfig,
    pub gas: GasConfig,
}

/// Meter point number (MPAN/MPRN) and meter serial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeterId<'a> {
    pub meter_point: &'a str,
    pub serial_number: &'a str,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_clock_time(key: &str, value: &str) -> Result<NaiveTime, PipelineError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|e| PipelineError::Config(format!("invalid electricity.{key} '{value}': {e}")))
}

impl OctopusConfig {
    pub fn api_key(&self) -> Result<&str, PipelineError> {
        non_empty(&self.api_key).ok_or_else(|| PipelineError::Config("No Octopus API key set".to_string()))
    }

    /// Account tag value; blank means untagged.
    pub fn account_name(&self) -> Option<&str> {
        non_empty(&self.account_name)
    }
}

impl ElectricityConfig {
    pub fn meter(&self) -> Result<MeterId<'_>, PipelineError> {
        match (non_empty(&self.mpan), non_empty(&self.serial_number)) {
            (Some(meter_point), Some(serial_number)) => Ok(MeterId {
                meter_point,
                serial_number,
            }),
            _ => Err(PipelineError::Config("No electricity meter identifiers".to_string())),
        }
    }

    /// Zone for the low-rate window and the run's date range.
    pub fn time_zone(&self) -> Result<Option<Tz>, PipelineError> {
        let zone = self.unit_rate_time_zone.trim();
        if zone.is_empty() {
            return Ok(None);
        }
        zone.parse::<Tz>().map(Some).map_err(|e| {
            PipelineError::Config(format!("invalid electricity.unit_rate_time_zone '{zone}': {e}"))
        })
    }

    pub fn low_rate_window(&self) -> Result<Option<LowRateWindow>, PipelineError> {
        let Some(zone) = self.time_zone()? else {
            return Ok(None);
        };
        Ok(Some(LowRateWindow {
            start: parse_clock_time("unit_rate_low_start", &self.unit_rate_low_start)?,
            end: parse_clock_time("unit_rate_low_end", &self.unit_rate_low_end)?,
            zone,
        }))
    }
}

impl GasConfig {
    /// `None` when gas is ignored for this run.
    pub fn meter(&self) -> Result<Option<MeterId<'_>>, PipelineError> {
        if self.ignore {
            return Ok(None);
        }
        match (non_empty(&self.mprn), non_empty(&self.serial_number)) {
            (Some(meter_point), Some(serial_number)) => Ok(Some(MeterId {
                meter_point,
                serial_number,
            })),
            _ => Err(PipelineError::Config("No gas meter identifiers".to_string())),
        }
    }

    /// m³ → kWh multiplier for volumetric meters.
    pub fn conversion_factor(&self) -> Option<f64> {
        (self.meter_type > 1).then(|| self.volume_correction_factor * self.calorific_value / 3.6)
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let cfg: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    /// Checks everything a run needs before any request is made.
    pub fn validate(&self) -> Result<(), PipelineError> {
        self.octopus.api_key()?;
        self.electricity.meter()?;
        self.electricity.low_rate_window()?;
        self.gas.meter()?;
        Ok(())
    }
}
