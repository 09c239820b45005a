//! BGeometrics on-chain metric client.
//!
//! Free API serving the latest values for MVRV Z-Score, Puell Multiple,
//! LTH-SOPR and Reserve Risk.
//!
//! API docs: https://bitcoin-data.com
//! Base URL: https://bitcoin-data.com/api/v1
//! Auth: not required for the `/last` endpoints.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::{Metric, MetricSource};

const BASE_URL: &str = "https://bitcoin-data.com/api/v1";

/// BGeometrics metric client.
pub struct BGeometricsClient {
    http: Client,
}

impl BGeometricsClient {
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .user_agent("APEX/0.1.0 (cycle-top-monitor)")
            .build()
            .context("Failed to build HTTP client for BGeometrics")?;
        Ok(Self { http })
    }

    /// Pull the numeric value out of a `/last` response body.
    ///
    /// Some series arrive as JSON numbers, others as quoted decimal
    /// strings; accept both.
    fn extract_value(body: &Value, key: &str) -> Result<f64> {
        let field = body
            .get(key)
            .with_context(|| format!("key '{key}' not found in response"))?;
        match field {
            Value::Number(n) => n
                .as_f64()
                .with_context(|| format!("key '{key}' is not representable as f64")),
            Value::String(s) => s
                .parse::<f64>()
                .with_context(|| format!("key '{key}' is not numeric: {s:?}")),
            other => anyhow::bail!("key '{key}' has unexpected type: {other}"),
        }
    }
}

#[async_trait]
impl MetricSource for BGeometricsClient {
    async fn latest(&self, metric: Metric) -> Result<f64> {
        let url = format!("{BASE_URL}/{}/last", metric.endpoint());
        debug!(metric = %metric, url = %url, "Fetching latest metric");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("BGeometrics request failed for {metric}"))?;

        if !resp.status().is_success() {
            let status = resp.status();
            anyhow::bail!("BGeometrics API error for {metric}: {status}");
        }

        let body: Value = resp
            .json()
            .await
            .with_context(|| format!("Failed to parse BGeometrics response for {metric}"))?;

        let value = Self::extract_value(&body, metric.response_key())
            .with_context(|| format!("Bad BGeometrics payload for {metric}"))?;

        debug!(metric = %metric, value, "Metric fetched");
        Ok(value)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
