//! InfluxDB 1.x HTTP client: liveness probe, query commands and line-protocol writes.

use crate::errors::PipelineError;
use crate::models::{BatchPoints, FieldValue};
use log::{debug, info};
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Duration;

/// Destination of batched point writes.
///
/// Calls are awaited one at a time by the importer; an implementation is never
/// driven concurrently.
#[allow(async_fn_in_trait)]
pub trait PointSink {
    /// Executes a query command such as `CREATE DATABASE`.
    async fn query(&mut self, command: &str, database: &str) -> Result<(), PipelineError>;

    /// Writes one batch. `start` is the batch's offset within the file's points.
    async fn write(&mut self, batch: &BatchPoints<'_>, start: usize) -> Result<(), PipelineError>;
}

#[derive(Debug, Clone)]
struct Credentials {
    user: String,
    password: String,
}

/// Connected session with an InfluxDB server.
pub struct InfluxClient {
    client: Client,
    base_url: Url,
    credentials: Option<Credentials>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    #[serde(default)]
    error: Option<String>,
}

impl InfluxClient {
    /// Builds the endpoint, checks the server answers `/ping`, then attaches credentials.
    pub async fn connect(
        host: &str,
        port: u16,
        user: &str,
        password: &str,
        timeout: Duration,
    ) -> Result<Self, PipelineError> {
        let endpoint = format!("http://{}:{}", host, port);
        let connection_error = |message: String| PipelineError::Connection {
            endpoint: endpoint.clone(),
            message,
        };

        let base_url = Url::parse(&endpoint).map_err(|e| connection_error(e.to_string()))?;
        if base_url.host_str().map_or(true, str::is_empty) {
            return Err(connection_error("missing host".to_string()));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| connection_error(e.to_string()))?;

        let mut influx = Self {
            client,
            base_url,
            credentials: None,
        };
        let version = influx.ping().await.map_err(connection_error)?;
        info!("Connected to InfluxDB {} at {}", version, endpoint);

        if !user.is_empty() {
            influx.set_auth(user, password);
        }
        Ok(influx)
    }

    pub fn set_auth(&mut self, user: &str, password: &str) {
        self.credentials = Some(Credentials {
            user: user.to_string(),
            password: password.to_string(),
        });
    }

    /// Liveness probe; returns the server version header when present.
    pub async fn ping(&self) -> Result<String, String> {
        let url = self.endpoint("ping")?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let status = response.status();
        if !status.is_success() {
            return Err(format!("ping returned HTTP {}", status));
        }
        Ok(response
            .headers()
            .get("X-Influxdb-Version")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string())
    }

    fn endpoint(&self, path: &str) -> Result<Url, String> {
        self.base_url.join(path).map_err(|e| e.to_string())
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.credentials {
            Some(c) => request.basic_auth(&c.user, Some(&c.password)),
            None => request,
        }
    }
}

impl PointSink for InfluxClient {
    async fn query(&mut self, command: &str, database: &str) -> Result<(), PipelineError> {
        let query_error = |message: String| PipelineError::Query {
            command: command.to_string(),
            message,
        };
        let url = self.endpoint("query").map_err(query_error)?;
        debug!("Executing query: {}", command);

        let request = self
            .client
            .post(url)
            .form(&[("q", command), ("db", database)]);
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| query_error(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| query_error(e.to_string()))?;
        if !status.is_success() {
            return Err(query_error(format!("HTTP {}: {}", status, body.trim())));
        }
        query_failure(&body).map_or(Ok(()), |message| Err(query_error(message)))
    }

    async fn write(&mut self, batch: &BatchPoints<'_>, start: usize) -> Result<(), PipelineError> {
        let end = start + batch.points.len();
        let write_error = |message: String| PipelineError::Write {
            database: batch.database.to_string(),
            start,
            end,
            message,
        };

        let mut url = self.endpoint("write").map_err(write_error)?;
        url.query_pairs_mut()
            .append_pair("db", batch.database)
            .append_pair("rp", batch.retention_policy)
            .append_pair("precision", "s");

        let body = to_line_protocol(batch);
        let request = self.client.post(url).body(body);
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| write_error(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(write_error(format!("HTTP {}: {}", status, message.trim())))
        }
    }
}

/// Extracts the first error reported in a `/query` response body, if any.
fn query_failure(body: &str) -> Option<String> {
    let parsed: QueryResponse = serde_json::from_str(body).ok()?;
    parsed
        .error
        .or_else(|| parsed.results.into_iter().find_map(|r| r.error))
}

/// Renders a batch as line protocol with second-precision timestamps.
/// Batch tags are repeated on every line.
pub fn to_line_protocol(batch: &BatchPoints<'_>) -> String {
    let mut tag_suffix = String::new();
    for (key, value) in batch.tags {
        tag_suffix.push(',');
        tag_suffix.push_str(&escape_key(key));
        tag_suffix.push('=');
        tag_suffix.push_str(&escape_key(value));
    }

    let mut lines = Vec::with_capacity(batch.points.len());
    for point in batch.points {
        let fields: Vec<String> = point
            .fields
            .entries()
            .iter()
            .map(|(name, value)| {
                let rendered = match value {
                    FieldValue::Float(v) => format!("{}", v),
                    FieldValue::Integer(v) => format!("{}i", v),
                };
                format!("{}={}", escape_key(name), rendered)
            })
            .collect();
        lines.push(format!(
            "{}{} {} {}",
            escape_measurement(point.measurement),
            tag_suffix,
            fields.join(","),
            point.unix_seconds()
        ));
    }
    lines.join("\n")
}

/// Escape special characters in tag keys, tag values and field keys
fn escape_key(s: &str) -> String {
    s.replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}

fn escape_measurement(s: &str) -> String {
    s.replace(',', "\\,").replace(' ', "\\ ")
}
