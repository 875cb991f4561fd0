use chrono::{DateTime, FixedOffset};

use super::{RateCategory, Series};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgileFields {
    pub agile_rate: f64,
    pub agile_cost: f64,
    pub agile_total_cost: f64,
}

/// Derived numeric fields for one reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSet {
    pub consumption: f64,
    pub cost: f64,
    pub total_cost: f64,
    pub rate: f64,
    pub agile: Option<AgileFields>,
}

impl FieldSet {
    /// Field names and values in output order; agile fields only when present.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        let base = [
            ("consumption", self.consumption),
            ("cost", self.cost),
            ("total_cost", self.total_cost),
            ("rate", self.rate),
        ];
        let agile = self.agile.iter().flat_map(|a| {
            [
                ("agile_rate", a.agile_rate),
                ("agile_cost", a.agile_cost),
                ("agile_total_cost", a.agile_total_cost),
            ]
        });
        base.into_iter().chain(agile)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tags {
    pub active_rate: RateCategory,
    /// "HH:MM" of the interval start.
    pub time_of_day: String,
    pub account_name: Option<String>,
}

impl Tags {
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        [
            ("active_rate", self.active_rate.as_str()),
            ("time_of_day", self.time_of_day.as_str()),
        ]
        .into_iter()
        .chain(
            self.account_name
                .as_deref()
                .filter(|name| !name.is_empty())
                .map(|name| ("account_name", name)),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub series: Series,
    pub tags: Tags,
    pub timestamp: DateTime<FixedOffset>,
    pub fields: FieldSet,
}
