//! FRED price history client.
//!
//! Pulls daily BTC closes from the `CBBTCUSD` series (Coinbase BTC/USD)
//! on FRED (Federal Reserve Economic Data). An API key is optional for
//! this endpoint; configure one via the env var named in `config.toml`.
//!
//! API: `https://api.stlouisfed.org/fred/series/observations`
//! Rate limit: 120 req/min.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::PriceHistorySource;
use crate::types::{PricePoint, PriceSeries};

const BASE_URL: &str = "https://api.stlouisfed.org/fred/series/observations";
const SERIES_ID: &str = "CBBTCUSD";

/// Calendar days requested for `min_days` usable observations. The
/// series has occasional missing points, so over-fetch and trim.
fn fetch_window(min_days: usize) -> i64 {
    (min_days as i64 * 5 / 4) + 14
}

// ---------------------------------------------------------------------------
// FRED API response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FredResponse {
    #[serde(default)]
    observations: Vec<FredObservation>,
}

#[derive(Debug, Deserialize)]
struct FredObservation {
    date: String,
    value: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// FRED daily-close client.
pub struct FredClient {
    http: Client,
    api_key: Option<String>,
}

impl FredClient {
    pub fn new(api_key: Option<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .user_agent("APEX/0.1.0 (cycle-top-monitor)")
            .build()
            .context("Failed to build HTTP client for FRED")?;
        Ok(Self { http, api_key })
    }

    /// Convert raw observations into price points, skipping the "."
    /// placeholder FRED uses for missing values.
    fn parse_observations(observations: &[FredObservation]) -> Result<Vec<PricePoint>> {
        let mut points = Vec::with_capacity(observations.len());
        for obs in observations {
            if obs.value == "." {
                continue;
            }
            let date = NaiveDate::parse_from_str(&obs.date, "%Y-%m-%d")
                .with_context(|| format!("Bad observation date: {}", obs.date))?;
            let price: f64 = obs
                .value
                .parse()
                .with_context(|| format!("Bad observation value on {}: {:?}", obs.date, obs.value))?;
            points.push(PricePoint { date, price });
        }
        Ok(points)
    }
}

#[async_trait]
impl PriceHistorySource for FredClient {
    async fn price_history(&self, min_days: usize) -> Result<PriceSeries> {
        let end = Utc::now().date_naive();
        let start = end - Duration::days(fetch_window(min_days));

        let mut url = format!(
            "{BASE_URL}?series_id={SERIES_ID}&file_type=json\
             &observation_start={start}&observation_end={end}&sort_order=asc"
        );
        if let Some(key) = &self.api_key {
            url.push_str("&api_key=");
            url.push_str(key);
        }

        debug!(series = SERIES_ID, %start, %end, "Fetching price history");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .context("FRED request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            anyhow::bail!("FRED API error for {SERIES_ID}: {status}");
        }

        let data: FredResponse = resp
            .json()
            .await
            .context("Failed to parse FRED observations response")?;

        let points = Self::parse_observations(&data.observations)?;
        if points.len() < min_days {
            anyhow::bail!(
                "FRED returned {} usable observations for {SERIES_ID}, need {min_days}",
                points.len()
            );
        }

        let series = PriceSeries::new(points)
            .context("FRED observations do not form a valid price series")?;

        debug!(days = series.len(), "Price history fetched");
        Ok(series)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
