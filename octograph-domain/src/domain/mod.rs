mod point;
mod rate_catalog;
mod reading;

pub use point::{AgileFields, FieldSet, Point, Tags};
pub use rate_catalog::{
    AgileRates, ElectricityRates, GasRates, LowRateWindow, RateCatalog, RateCategory, Tariff,
};
pub use reading::{Reading, Series};
