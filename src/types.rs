//! Shared types for the APEX monitor.
//!
//! These types form the data model used across all modules: the validated
//! inputs the engine consumes (price series, indicator snapshots), the
//! risk level it produces, and the engine's error taxonomy. Validation
//! happens at construction so the calculators stay total functions over
//! well-formed values.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Price series
// ---------------------------------------------------------------------------

/// A single daily close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// A chronologically ordered daily price history.
///
/// Invariants enforced at construction: dates strictly increasing (hence
/// no duplicates), prices positive and finite. The series is treated as
/// dense in trading order — non-trading-day gaps are not interpolated.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series, validating the ordering and value invariants.
    pub fn new(points: Vec<PricePoint>) -> Result<Self, EngineError> {
        for (i, point) in points.iter().enumerate() {
            if !point.price.is_finite() || point.price <= 0.0 {
                return Err(EngineError::MalformedSeries(format!(
                    "price on {} must be positive and finite, got {}",
                    point.date, point.price,
                )));
            }
            if i > 0 && point.date <= points[i - 1].date {
                return Err(EngineError::MalformedSeries(format!(
                    "dates must be strictly increasing: {} follows {}",
                    point.date,
                    points[i - 1].date,
                )));
            }
        }
        Ok(Self { points })
    }

    /// Number of daily observations.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All points, oldest first.
    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    /// The most recent observation.
    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Helper to build a flat test series of the given length.
    #[cfg(test)]
    pub fn constant(days: usize, price: f64) -> Self {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let points = (0..days)
            .map(|i| PricePoint {
                date: start + chrono::Duration::days(i as i64),
                price,
            })
            .collect();
        Self::new(points).unwrap()
    }
}

// ---------------------------------------------------------------------------
// Indicator snapshot
// ---------------------------------------------------------------------------

/// One complete set of Tier-1 indicator values, captured for a single
/// evaluation.
///
/// All five values are required and must be finite; a snapshot is never
/// partially filled. `reserve_risk` in particular may legitimately sit
/// near zero, and `mvrv_z` can go negative in deep bear markets.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct IndicatorSnapshot {
    pub mvrv_z: f64,
    pub pi_cycle_proximity: f64,
    pub puell_multiple: f64,
    pub lth_sopr: f64,
    pub reserve_risk: f64,
}

impl IndicatorSnapshot {
    /// The five required keys, in canonical order.
    pub const REQUIRED_KEYS: &'static [&'static str] = &[
        "mvrv_z",
        "pi_cycle_proximity",
        "puell_multiple",
        "lth_sopr",
        "reserve_risk",
    ];

    /// Build a snapshot, rejecting non-finite values.
    pub fn new(
        mvrv_z: f64,
        pi_cycle_proximity: f64,
        puell_multiple: f64,
        lth_sopr: f64,
        reserve_risk: f64,
    ) -> Result<Self, EngineError> {
        let snapshot = Self {
            mvrv_z,
            pi_cycle_proximity,
            puell_multiple,
            lth_sopr,
            reserve_risk,
        };
        for (name, value) in snapshot.fields() {
            if !value.is_finite() {
                return Err(EngineError::MalformedSnapshot(format!(
                    "{name} must be finite, got {value}",
                )));
            }
        }
        Ok(snapshot)
    }

    /// Build a snapshot from a keyed map, rejecting missing keys before
    /// any value validation.
    pub fn from_map(values: &HashMap<String, f64>) -> Result<Self, EngineError> {
        let get = |key: &str| {
            values.get(key).copied().ok_or_else(|| {
                EngineError::MalformedSnapshot(format!("missing required key: {key}"))
            })
        };
        Self::new(
            get("mvrv_z")?,
            get("pi_cycle_proximity")?,
            get("puell_multiple")?,
            get("lth_sopr")?,
            get("reserve_risk")?,
        )
    }

    /// Named field values in canonical order.
    pub fn fields(&self) -> [(&'static str, f64); 5] {
        [
            ("mvrv_z", self.mvrv_z),
            ("pi_cycle_proximity", self.pi_cycle_proximity),
            ("puell_multiple", self.puell_multiple),
            ("lth_sopr", self.lth_sopr),
            ("reserve_risk", self.reserve_risk),
        ]
    }
}

impl fmt::Display for IndicatorSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mvrv_z={:.2} pi_cycle={:.3} puell={:.2} lth_sopr={:.2} reserve_risk={:.4}",
            self.mvrv_z,
            self.pi_cycle_proximity,
            self.puell_multiple,
            self.lth_sopr,
            self.reserve_risk,
        )
    }
}

// ---------------------------------------------------------------------------
// Risk level
// ---------------------------------------------------------------------------

/// Categorical cycle-top risk, ordered by severity.
///
/// The derived `Ord` follows declaration order, so
/// `AccumulationHold < ElevatedCaution < HighRisk < ExtremeDanger`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "ACCUMULATION/HOLD")]
    AccumulationHold,
    #[serde(rename = "ELEVATED CAUTION")]
    ElevatedCaution,
    #[serde(rename = "HIGH RISK")]
    HighRisk,
    #[serde(rename = "EXTREME DANGER")]
    ExtremeDanger,
}

impl RiskLevel {
    /// All levels, least severe first (useful for iteration).
    pub const ALL: &'static [RiskLevel] = &[
        RiskLevel::AccumulationHold,
        RiskLevel::ElevatedCaution,
        RiskLevel::HighRisk,
        RiskLevel::ExtremeDanger,
    ];

    /// The fixed wire/display label.
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::AccumulationHold => "ACCUMULATION/HOLD",
            RiskLevel::ElevatedCaution => "ELEVATED CAUTION",
            RiskLevel::HighRisk => "HIGH RISK",
            RiskLevel::ExtremeDanger => "EXTREME DANGER",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Attempt to parse a string into a RiskLevel (case-insensitive).
impl std::str::FromStr for RiskLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "accumulation/hold" | "accumulation" | "hold" => Ok(RiskLevel::AccumulationHold),
            "elevated caution" | "caution" => Ok(RiskLevel::ElevatedCaution),
            "high risk" => Ok(RiskLevel::HighRisk),
            "extreme danger" | "danger" => Ok(RiskLevel::ExtremeDanger),
            _ => Err(anyhow::anyhow!("Unknown risk level: {s}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Engine-level failures. Any of these aborts the whole evaluation —
/// there is no partial risk level from incomplete inputs.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("insufficient price history: need at least {required} days, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("malformed indicator snapshot: {0}")]
    MalformedSnapshot(String),

    #[error("malformed price series: {0}")]
    MalformedSeries(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
