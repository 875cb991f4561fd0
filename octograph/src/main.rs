use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use octograph::{
    catalog::CatalogBuilder,
    cli::{self, Args},
    config::AppConfig,
    observability,
    pipeline::Pipeline,
    sinks::InfluxDbSink,
    sources::{ConsumptionSource, Endpoints, OctopusClient},
};
use octograph_domain::domain::Series;

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args = Args::parse();

    // Load and check configuration before touching the network.
    let cfg = AppConfig::load(&args.config_file)?;
    cfg.validate()?;

    let api_key = cfg.octopus.api_key()?;
    let electricity_meter = cfg.electricity.meter()?;
    let gas_meter = cfg.gas.meter()?;
    let zone = cfg.electricity.time_zone()?;
    let range = cli::date_range(&args, zone, Utc::now())?;

    let endpoints = Endpoints::new(&cfg.octopus.base_url);
    let client = OctopusClient::new(api_key)?;
    let sink = InfluxDbSink::new(&cfg.influxdb)?;

    // Rate catalogs are resolved once, up front, for every active series.
    let builder = CatalogBuilder::new(&client, &endpoints, &range);
    let electricity_catalog = builder.electricity(&cfg.electricity).await?;
    let gas_catalog = match gas_meter {
        Some(_) => Some(builder.gas(&cfg.gas).await?),
        None => None,
    };

    let electricity = Pipeline {
        source: ConsumptionSource::new(
            &client,
            endpoints.consumption(
                Series::Electricity,
                electricity_meter.meter_point,
                electricity_meter.serial_number,
            )?,
        ),
        catalog: electricity_catalog,
        account_name: cfg.octopus.account_name().map(str::to_owned),
        sink: sink.clone(),
    };
    electricity.run(&range).await?;

    if let (Some(meter), Some(catalog)) = (gas_meter, gas_catalog) {
        let gas = Pipeline {
            source: ConsumptionSource::new(
                &client,
                endpoints.consumption(Series::Gas, meter.meter_point, meter.serial_number)?,
            ),
            catalog,
            account_name: cfg.octopus.account_name().map(str::to_owned),
            sink,
        };
        gas.run(&range).await?;
    } else {
        tracing::info!("gas ignored");
    }

    Ok(())
}
