use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, NaiveTime, Utc};
use chrono_tz::Tz;

use super::Series;

/// Which of the catalog's unit rates applies to an interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateCategory {
    UnitRate,
    UnitRateHigh,
    UnitRateLow,
}

impl RateCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnitRate => "unit_rate",
            Self::UnitRateHigh => "unit_rate_high",
            Self::UnitRateLow => "unit_rate_low",
        }
    }
}

impl fmt::Display for RateCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Daily low-rate clock window, interpreted in `zone`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LowRateWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub zone: Tz,
}

/// Half-hourly dynamic ("agile") unit rates keyed by interval start.
#[derive(Debug, Clone, PartialEq)]
pub struct AgileRates {
    standing_charge: f64,
    unit_rates: BTreeMap<DateTime<Utc>, f64>,
}

impl AgileRates {
    /// Returns `None` for an empty rate table: agile output is only produced
    /// when at least one published rate exists.
    pub fn new<I>(standing_charge: f64, unit_rates: I) -> Option<Self>
    where
        I: IntoIterator<Item = (DateTime<Utc>, f64)>,
    {
        let unit_rates: BTreeMap<_, _> = unit_rates.into_iter().collect();
        if unit_rates.is_empty() {
            return None;
        }
        Some(Self {
            standing_charge,
            unit_rates,
        })
    }

    pub fn standing_charge(&self) -> f64 {
        self.standing_charge
    }

    pub fn rate_at(&self, interval_start: DateTime<Utc>) -> Option<f64> {
        self.unit_rates.get(&interval_start).copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GasRates {
    pub unit_rate: f64,
    /// m³ → kWh multiplier, set only for meters reporting volume.
    pub conversion_factor: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElectricityRates {
    pub unit_rate_high: f64,
    pub unit_rate_low: f64,
    /// `None` means there is no low-rate band: every interval is high rate.
    pub low_rate_window: Option<LowRateWindow>,
    pub agile: Option<AgileRates>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Tariff {
    Gas(GasRates),
    Electricity(ElectricityRates),
}

/// Resolved tariff parameters for one series, fixed for the whole run.
#[derive(Debug, Clone, PartialEq)]
pub struct RateCatalog {
    /// Currency per day.
    pub standing_charge: f64,
    pub tariff: Tariff,
}

impl RateCatalog {
    pub fn gas(standing_charge: f64, rates: GasRates) -> Self {
        Self {
            standing_charge,
            tariff: Tariff::Gas(rates),
        }
    }

    pub fn electricity(standing_charge: f64, rates: ElectricityRates) -> Self {
        Self {
            standing_charge,
            tariff: Tariff::Electricity(rates),
        }
    }

    pub fn series(&self) -> Series {
        match self.tariff {
            Tariff::Gas(_) => Series::Gas,
            Tariff::Electricity(_) => Series::Electricity,
        }
    }

    /// Unit rate for `category`, or `None` when the category does not exist
    /// in this series' tariff schema.
    pub fn rate(&self, category: RateCategory) -> Option<f64> {
        match (&self.tariff, category) {
            (Tariff::Gas(gas), RateCategory::UnitRate) => Some(gas.unit_rate),
            (Tariff::Electricity(e), RateCategory::UnitRateHigh) => Some(e.unit_rate_high),
            (Tariff::Electricity(e), RateCategory::UnitRateLow) => Some(e.unit_rate_low),
            _ => None,
        }
    }

    pub fn conversion_factor(&self) -> Option<f64> {
        match &self.tariff {
            Tariff::Gas(gas) => gas.conversion_factor,
            Tariff::Electricity(_) => None,
        }
    }

    pub fn low_rate_window(&self) -> Option<&LowRateWindow> {
        match &self.tariff {
            Tariff::Electricity(e) => e.low_rate_window.as_ref(),
            Tariff::Gas(_) => None,
        }
    }

    pub fn agile(&self) -> Option<&AgileRates> {
        match &self.tariff {
            Tariff::Electricity(e) => e.agile.as_ref(),
            Tariff::Gas(_) => None,
        }
    }
}
