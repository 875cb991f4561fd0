use std::fmt;

use chrono::{DateTime, FixedOffset};

/// The energy series a reading or rate catalog belongs to.
///
/// The lowercase name doubles as the time-series measurement name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Series {
    Electricity,
    Gas,
}

impl Series {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Electricity => "electricity",
            Self::Gas => "gas",
        }
    }
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One half-hourly metered interval, in raw meter units.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub interval_start: DateTime<FixedOffset>,
    pub interval_end: DateTime<FixedOffset>,
    pub consumption: f64,
}
