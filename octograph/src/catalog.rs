use octograph_domain::domain::{AgileRates, ElectricityRates, GasRates, RateCatalog, Series};

use crate::{
    config::{ElectricityConfig, GasConfig},
    pipeline::{DateRange, PipelineError},
    sources::{
        octopus::{Endpoints, PageFetcher},
        rates::{agile_unit_rates, latest_value_inc_vat},
    },
};

/// Resolves rate catalogs for a run from configuration and published rates.
///
/// Configured values win; the published rate for the run's period is only
/// requested when a value is not configured.
pub struct CatalogBuilder<'a, F: ?Sized> {
    fetcher: &'a F,
    endpoints: &'a Endpoints,
    range: &'a DateRange,
}

impl<'a, F> CatalogBuilder<'a, F>
where
    F: PageFetcher + ?Sized,
{
    pub fn new(fetcher: &'a F, endpoints: &'a Endpoints, range: &'a DateRange) -> Self {
        Self {
            fetcher,
            endpoints,
            range,
        }
    }

    pub async fn electricity(&self, cfg: &ElectricityConfig) -> Result<RateCatalog, PipelineError> {
        let series = Series::Electricity;
        let needs_published_charge =
            cfg.standing_charge.is_none() || (cfg.agile && cfg.agile_standing_charge.is_none());
        let published_charge = if needs_published_charge {
            let url = self
                .endpoints
                .standing_charges(series, &cfg.product_code, &cfg.tariff_code)?;
            Some(latest_value_inc_vat(self.fetcher, &url, self.range).await?)
        } else {
            None
        };

        let standing_charge = cfg
            .standing_charge
            .or(published_charge)
            .ok_or_else(|| missing(series, "standing charge"))?;

        let agile = if cfg.agile {
            let agile_standing_charge = cfg
                .agile_standing_charge
                .or(published_charge)
                .ok_or_else(|| missing(series, "agile standing charge"))?;
            let url = self
                .endpoints
                .standard_unit_rates(series, &cfg.product_code, &cfg.tariff_code)?;
            let unit_rates = agile_unit_rates(self.fetcher, &url, self.range).await?;
            tracing::info!(rates = unit_rates.len(), "retrieved agile rates");
            AgileRates::new(agile_standing_charge, unit_rates)
        } else {
            None
        };

        Ok(RateCatalog::electricity(
            standing_charge,
            ElectricityRates {
                unit_rate_high: cfg.unit_rate_high,
                unit_rate_low: cfg.unit_rate_low,
                low_rate_window: cfg.low_rate_window()?,
                agile,
            },
        ))
    }

    pub async fn gas(&self, cfg: &GasConfig) -> Result<RateCatalog, PipelineError> {
        let series = Series::Gas;

        let standing_charge = match cfg.standing_charge {
            Some(value) => value,
            None => {
                let url = self
                    .endpoints
                    .standing_charges(series, &cfg.product_code, &cfg.tariff_code)?;
                latest_value_inc_vat(self.fetcher, &url, self.range).await?
            }
        };

        let unit_rate = match cfg.unit_rate {
            Some(value) => value,
            None => {
                let url = self
                    .endpoints
                    .standard_unit_rates(series, &cfg.product_code, &cfg.tariff_code)?;
                latest_value_inc_vat(self.fetcher, &url, self.range).await?
            }
        };

        Ok(RateCatalog::gas(
            standing_charge,
            GasRates {
                unit_rate,
                conversion_factor: cfg.conversion_factor(),
            },
        ))
    }
}

fn missing(series: Series, what: &str) -> PipelineError {
    PipelineError::Config(format!("no {series} {what} configured or published"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::octopus::{tests::range, Page};
    use chrono::{TimeZone, Utc};
    use reqwest::Url;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    /// Serves one canned page per URL path.
    struct RouteFetcher {
        routes: Vec<(&'static str, Value)>,
        requested: Mutex<Vec<String>>,
    }

    impl RouteFetcher {
        fn new(routes: Vec<(&'static str, Value)>) -> Self {
            Self {
                routes,
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl PageFetcher for RouteFetcher {
        async fn fetch_page(
            &self,
            url: &Url,
            _range: &DateRange,
            _page: Option<&str>,
        ) -> Result<Page, PipelineError> {
            self.requested.lock().unwrap().push(url.path().to_string());
            let body = self
                .routes
                .iter()
                .find(|(path, _)| url.path().ends_with(path))
                .map(|(_, body)| body.clone())
                .ok_or_else(|| PipelineError::Source(format!("unexpected request {url}")))?;
            serde_json::from_value(body).map_err(|e| PipelineError::Source(e.to_string()))
        }
    }

    fn value(v: f64) -> Value {
        json!({"results": [{"value_inc_vat": v}], "next": null})
    }

    #[tokio::test]
    async fn electricity_falls_back_to_published_standing_charge_and_agile_table() {
        let fetcher = RouteFetcher::new(vec![
            ("/electricity-tariffs/E-1R-AGILE-FLEX-22-11-25-C/standing-charges/", value(47.85)),
            (
                "/electricity-tariffs/E-1R-AGILE-FLEX-22-11-25-C/standard-unit-rates/",
                json!({
                    "results": [{"value_inc_vat": 18.2, "valid_from": "2023-01-01T00:00:00Z"}],
                    "next": null
                }),
            ),
        ]);
        let endpoints = Endpoints::new("https://api.example.test/v1");
        let range = range();
        let builder = CatalogBuilder::new(&fetcher, &endpoints, &range);

        let catalog = builder.electricity(&ElectricityConfig::default()).await.unwrap();

        assert_eq!(catalog.series(), Series::Electricity);
        assert_eq!(catalog.standing_charge, 47.85);
        let agile = catalog.agile().unwrap();
        assert_eq!(agile.standing_charge(), 47.85);
        assert_eq!(agile.rate_at(Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()), Some(18.2));
        assert!(catalog.low_rate_window().is_some());
    }

    #[tokio::test]
    async fn configured_values_skip_lookups() {
        let fetcher = RouteFetcher::new(Vec::new());
        let endpoints = Endpoints::new("https://api.example.test/v1");
        let range = range();
        let builder = CatalogBuilder::new(&fetcher, &endpoints, &range);

        let electricity = builder
            .electricity(&ElectricityConfig {
                standing_charge: Some(40.0),
                agile: false,
                unit_rate_time_zone: String::new(),
                ..ElectricityConfig::default()
            })
            .await
            .unwrap();
        assert_eq!(electricity.standing_charge, 40.0);
        assert!(electricity.agile().is_none());
        assert!(electricity.low_rate_window().is_none());

        let gas = builder
            .gas(&GasConfig {
                standing_charge: Some(27.0),
                unit_rate: Some(7.5),
                ..GasConfig::default()
            })
            .await
            .unwrap();
        assert_eq!(gas.standing_charge, 27.0);
        assert_eq!(gas.conversion_factor(), None);

        assert!(fetcher.requested.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_agile_table_means_no_agile_output() {
        let fetcher = RouteFetcher::new(vec![(
            "/standard-unit-rates/",
            json!({"results": [], "next": null}),
        )]);
        let endpoints = Endpoints::new("https://api.example.test/v1");
        let range = range();
        let builder = CatalogBuilder::new(&fetcher, &endpoints, &range);

        let catalog = builder
            .electricity(&ElectricityConfig {
                standing_charge: Some(40.0),
                agile_standing_charge: Some(45.0),
                ..ElectricityConfig::default()
            })
            .await
            .unwrap();
        assert!(catalog.agile().is_none());
    }

    #[tokio::test]
    async fn gas_rates_are_looked_up_and_converted() {
        let fetcher = RouteFetcher::new(vec![
            ("/gas-tariffs/G-1R-VAR-22-10-01-C/standing-charges/", value(29.11)),
            ("/gas-tariffs/G-1R-VAR-22-10-01-C/standard-unit-rates/", value(10.29)),
        ]);
        let endpoints = Endpoints::new("https://api.example.test/v1");
        let range = range();
        let builder = CatalogBuilder::new(&fetcher, &endpoints, &range);

        let catalog = builder
            .gas(&GasConfig {
                meter_type: 2,
                ..GasConfig::default()
            })
            .await
            .unwrap();

        assert_eq!(catalog.series(), Series::Gas);
        assert_eq!(catalog.standing_charge, 29.11);
        assert_eq!(catalog.rate(octograph_domain::domain::RateCategory::UnitRate), Some(10.29));
        assert_eq!(catalog.conversion_factor(), Some(1.02264 * 40.0 / 3.6));
    }
}
