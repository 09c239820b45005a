//! External data sources.
//!
//! Defines the acquisition traits the assessor depends on and the
//! concrete clients behind them: BGeometrics for on-chain metrics and
//! FRED for daily BTC closes. Transport and parse failures stay in this
//! layer as `anyhow` errors with context — the engine only ever sees
//! already-validated numeric inputs.

pub mod bgeometrics;
pub mod fred;

use anyhow::Result;
use async_trait::async_trait;
use std::fmt;

use crate::types::PriceSeries;

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// The four remotely sourced Tier-1 indicators.
///
/// `pi_cycle_proximity` is not listed: it is derived locally from the
/// price history rather than fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    MvrvZScore,
    PuellMultiple,
    LthSopr,
    ReserveRisk,
}

impl Metric {
    /// All remotely fetched metrics (useful for iteration).
    pub const ALL: &'static [Metric] = &[
        Metric::MvrvZScore,
        Metric::PuellMultiple,
        Metric::LthSopr,
        Metric::ReserveRisk,
    ];

    /// API endpoint slug.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Metric::MvrvZScore => "mvrv-zscore",
            Metric::PuellMultiple => "puell-multiple",
            Metric::LthSopr => "lth-sopr",
            Metric::ReserveRisk => "reserve-risk",
        }
    }

    /// JSON key carrying the value in the `/last` response.
    pub fn response_key(&self) -> &'static str {
        match self {
            Metric::MvrvZScore => "mvrvZscore",
            Metric::PuellMultiple => "puellMultiple",
            Metric::LthSopr => "lthSopr",
            Metric::ReserveRisk => "reserveRisk",
        }
    }

    /// Field name in the indicator snapshot.
    pub fn indicator_name(&self) -> &'static str {
        match self {
            Metric::MvrvZScore => "mvrv_z",
            Metric::PuellMultiple => "puell_multiple",
            Metric::LthSopr => "lth_sopr",
            Metric::ReserveRisk => "reserve_risk",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.indicator_name())
    }
}

// ---------------------------------------------------------------------------
// Source traits
// ---------------------------------------------------------------------------

/// Abstraction over the on-chain metric provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetricSource: Send + Sync {
    /// Latest value for the given metric. Fails loudly on any transport
    /// or data problem — never substitutes a placeholder value.
    async fn latest(&self, metric: Metric) -> Result<f64>;
}

/// Abstraction over the daily price history provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceHistorySource: Send + Sync {
    /// At least `min_days` of the most recent daily closes, oldest first.
    async fn price_history(&self, min_days: usize) -> Result<PriceSeries>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_endpoint_mapping() {
        assert_eq!(Metric::MvrvZScore.endpoint(), "mvrv-zscore");
        assert_eq!(Metric::PuellMultiple.endpoint(), "puell-multiple");
        assert_eq!(Metric::LthSopr.endpoint(), "lth-sopr");
        assert_eq!(Metric::ReserveRisk.endpoint(), "reserve-risk");
    }

    #[test]
    fn test_metric_response_key_mapping() {
        assert_eq!(Metric::MvrvZScore.response_key(), "mvrvZscore");
        assert_eq!(Metric::PuellMultiple.response_key(), "puellMultiple");
        assert_eq!(Metric::LthSopr.response_key(), "lthSopr");
        assert_eq!(Metric::ReserveRisk.response_key(), "reserveRisk");
    }

    #[test]
    fn test_metric_indicator_names_match_snapshot_keys() {
        use crate::types::IndicatorSnapshot;
        for metric in Metric::ALL {
            assert!(
                IndicatorSnapshot::REQUIRED_KEYS.contains(&metric.indicator_name()),
                "{metric} has no snapshot field"
            );
        }
    }

    #[test]
    fn test_metric_display() {
        assert_eq!(format!("{}", Metric::MvrvZScore), "mvrv_z");
        assert_eq!(format!("{}", Metric::ReserveRisk), "reserve_risk");
    }

    #[test]
    fn test_metric_all_covers_every_variant() {
        assert_eq!(Metric::ALL.len(), 4);
    }
}
