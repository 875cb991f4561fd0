pub mod consumption;
pub mod octopus;
pub mod rates;

pub use consumption::ConsumptionSource;
pub use octopus::{Endpoints, OctopusClient, PageFetcher};
