pub mod influxdb;

pub use influxdb::InfluxDbSink;
