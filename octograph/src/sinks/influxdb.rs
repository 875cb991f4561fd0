use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use octograph_domain::domain::Point;
use reqwest::{Client, Url};

use crate::{
    config::InfluxDbConfig,
    pipeline::{PipelineError, Sink},
};

/// Escape measurement/tag keys/tag values/field keys for line protocol.
///
/// Line protocol requires escaping commas, spaces and equals with a backslash.
fn escape_ident(s: &str, out: &mut String) {
    for ch in s.chars() {
        match ch {
            ',' | ' ' | '=' => {
                out.push('\\');
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
}

fn push_tag(out: &mut String, key: &str, value: &str) {
    out.push(',');
    escape_ident(key, out);
    out.push('=');
    escape_ident(value, out);
}

fn push_field_f64(out: &mut String, first: &mut bool, key: &str, value: f64) {
    if *first {
        *first = false;
    } else {
        out.push(',');
    }

    escape_ident(key, out);
    out.push('=');
    out.push_str(&value.to_string());
}

fn ts_to_unix_nanos(ts: DateTime<FixedOffset>) -> i128 {
    i128::from(ts.timestamp()) * 1_000_000_000 + i128::from(ts.timestamp_subsec_nanos())
}

pub trait LineProtocol {
    fn write_line(&self, out: &mut String);
}

impl LineProtocol for Point {
    fn write_line(&self, out: &mut String) {
        // measurement
        escape_ident(self.series.as_str(), out);

        for (key, value) in self.tags.iter() {
            push_tag(out, key, value);
        }

        out.push(' ');
        let mut first = true;
        for (key, value) in self.fields.iter() {
            push_field_f64(out, &mut first, key, value);
        }

        // timestamp (nanos)
        out.push(' ');
        out.push_str(&ts_to_unix_nanos(self.timestamp).to_string());
    }
}

pub fn encode_batch(points: &[Point]) -> String {
    // Heuristic capacity: ~200 bytes per line.
    let mut s = String::with_capacity(points.len().saturating_mul(200));
    for point in points {
        point.write_line(&mut s);
        s.push('\n');
    }
    s
}

/// InfluxDB 1.x HTTP write endpoint.
#[derive(Clone)]
pub struct InfluxDbSink {
    http: Client,
    write_url: Url,
    credentials: Option<(String, String)>,
}

impl InfluxDbSink {
    pub fn new(cfg: &InfluxDbConfig) -> Result<Self, PipelineError> {
        let mut write_url = Url::parse(&format!("http://{}:{}/write", cfg.host, cfg.port))
            .map_err(|e| PipelineError::Config(format!("invalid influxdb host '{}': {e}", cfg.host)))?;
        write_url
            .query_pairs_mut()
            .append_pair("db", &cfg.database)
            .append_pair("precision", "ns");

        let credentials = (!cfg.user.is_empty()).then(|| (cfg.user.clone(), cfg.password.clone()));

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PipelineError::Sink(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            write_url,
            credentials,
        })
    }

    pub fn write_url(&self) -> &Url {
        &self.write_url
    }
}

#[async_trait::async_trait]
impl Sink for InfluxDbSink {
    async fn write(&self, points: Vec<Point>) -> Result<(), PipelineError> {
        if points.is_empty() {
            tracing::info!("no points to write");
            return Ok(());
        }

        let body = encode_batch(&points);
        let mut request = self.http.post(self.write_url.clone()).body(body);
        if let Some((user, password)) = &self.credentials {
            request = request.basic_auth(user, Some(password));
        }

        request
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| {
                tracing::error!(error = %e, points = points.len(), "InfluxDB write failed");
                PipelineError::Sink(format!("influxdb write failed: {e}"))
            })?;

        Ok(())
    }
}
