//! Assessment orchestration.
//!
//! One `assess()` call is one complete evaluation: pull the four remote
//! indicators and the price history, derive the Pi-Cycle proximity,
//! validate the snapshot, classify. Any failure aborts the whole
//! evaluation — the Tier-1 signal count is only meaningful when all five
//! indicators are known, so there is no partial result.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use tracing::{debug, info};

use crate::signals::classifier::{RiskClassifier, SignalBreakdown};
use crate::signals::proximity::PiCycleCalculator;
use crate::sources::{Metric, MetricSource, PriceHistorySource};
use crate::types::{IndicatorSnapshot, RiskLevel};

// ---------------------------------------------------------------------------
// Assessment result
// ---------------------------------------------------------------------------

/// A completed risk evaluation.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RiskAssessment {
    pub timestamp: DateTime<Utc>,
    pub snapshot: IndicatorSnapshot,
    pub level: RiskLevel,
    pub signal_count: usize,
    pub breakdown: SignalBreakdown,
}

impl fmt::Display for RiskAssessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}/5 signals) | {}",
            self.level, self.signal_count, self.snapshot,
        )
    }
}

// ---------------------------------------------------------------------------
// Assessor
// ---------------------------------------------------------------------------

/// Runs complete risk evaluations against the configured sources.
pub struct Assessor {
    metrics: Box<dyn MetricSource>,
    prices: Box<dyn PriceHistorySource>,
    calculator: PiCycleCalculator,
    classifier: RiskClassifier,
    /// Days of price history requested per evaluation. Must cover the
    /// calculator's long window.
    lookback_days: usize,
}

impl Assessor {
    pub fn new(
        metrics: Box<dyn MetricSource>,
        prices: Box<dyn PriceHistorySource>,
        calculator: PiCycleCalculator,
        classifier: RiskClassifier,
        lookback_days: usize,
    ) -> Self {
        Self {
            metrics,
            prices,
            calculator,
            classifier,
            lookback_days,
        }
    }

    /// Run one complete evaluation.
    pub async fn assess(&self) -> Result<RiskAssessment> {
        let (mvrv_z, puell_multiple, lth_sopr, reserve_risk) = tokio::try_join!(
            self.metrics.latest(Metric::MvrvZScore),
            self.metrics.latest(Metric::PuellMultiple),
            self.metrics.latest(Metric::LthSopr),
            self.metrics.latest(Metric::ReserveRisk),
        )
        .context("Metric acquisition failed")?;

        let series = self
            .prices
            .price_history(self.lookback_days)
            .await
            .context("Price history acquisition failed")?;
        debug!(days = series.len(), "Price history acquired");

        let pi_cycle_proximity = self.calculator.proximity(&series)?;
        let snapshot = IndicatorSnapshot::new(
            mvrv_z,
            pi_cycle_proximity,
            puell_multiple,
            lth_sopr,
            reserve_risk,
        )?;

        let classification = self.classifier.classify(&snapshot);
        let assessment = RiskAssessment {
            timestamp: Utc::now(),
            snapshot,
            level: classification.level,
            signal_count: classification.signal_count,
            breakdown: classification.breakdown,
        };

        info!(
            level = %assessment.level,
            signals = assessment.signal_count,
            mvrv_z = format!("{mvrv_z:.2}"),
            pi_cycle = format!("{pi_cycle_proximity:.3}"),
            puell = format!("{puell_multiple:.2}"),
            lth_sopr = format!("{lth_sopr:.2}"),
            reserve_risk = format!("{reserve_risk:.4}"),
            "Assessment complete"
        );

        Ok(assessment)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
