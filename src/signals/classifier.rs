//! Tier-1 risk classification.
//!
//! Evaluates five independent danger predicates (strict `>` against a
//! configured threshold) and maps the number that fire onto a four-level
//! risk ladder, most severe first. The classifier is a total, pure
//! function over a validated snapshot — no error paths.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::types::{IndicatorSnapshot, RiskLevel};

// ---------------------------------------------------------------------------
// Configuration (defaults — overridden by config.toml at runtime)
// ---------------------------------------------------------------------------

/// Default danger thresholds, calibrated for the bounded-distance
/// Pi-Cycle proximity variant.
pub const MVRV_THRESHOLD: f64 = 6.0;
pub const PI_CYCLE_THRESHOLD: f64 = 0.95;
pub const PUELL_THRESHOLD: f64 = 3.0;
pub const SOPR_THRESHOLD: f64 = 8.0;
pub const RESERVE_RISK_THRESHOLD: f64 = 0.015;

/// Per-indicator danger thresholds. A signal fires only when the
/// indicator is strictly above its threshold.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TierThresholds {
    #[serde(default = "default_mvrv_z")]
    pub mvrv_z: f64,
    #[serde(default = "default_pi_cycle_proximity")]
    pub pi_cycle_proximity: f64,
    #[serde(default = "default_puell_multiple")]
    pub puell_multiple: f64,
    #[serde(default = "default_lth_sopr")]
    pub lth_sopr: f64,
    #[serde(default = "default_reserve_risk")]
    pub reserve_risk: f64,
}

fn default_mvrv_z() -> f64 {
    MVRV_THRESHOLD
}
fn default_pi_cycle_proximity() -> f64 {
    PI_CYCLE_THRESHOLD
}
fn default_puell_multiple() -> f64 {
    PUELL_THRESHOLD
}
fn default_lth_sopr() -> f64 {
    SOPR_THRESHOLD
}
fn default_reserve_risk() -> f64 {
    RESERVE_RISK_THRESHOLD
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            mvrv_z: MVRV_THRESHOLD,
            pi_cycle_proximity: PI_CYCLE_THRESHOLD,
            puell_multiple: PUELL_THRESHOLD,
            lth_sopr: SOPR_THRESHOLD,
            reserve_risk: RESERVE_RISK_THRESHOLD,
        }
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Which Tier-1 predicates fired for a snapshot.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SignalBreakdown {
    pub mvrv_z: bool,
    pub pi_cycle_proximity: bool,
    pub puell_multiple: bool,
    pub lth_sopr: bool,
    pub reserve_risk: bool,
}

impl SignalBreakdown {
    /// Number of predicates that fired (0–5).
    pub fn count(&self) -> usize {
        [
            self.mvrv_z,
            self.pi_cycle_proximity,
            self.puell_multiple,
            self.lth_sopr,
            self.reserve_risk,
        ]
        .iter()
        .filter(|fired| **fired)
        .count()
    }

    /// Names of the indicators that fired, in canonical order.
    pub fn fired(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.mvrv_z {
            names.push("mvrv_z");
        }
        if self.pi_cycle_proximity {
            names.push("pi_cycle_proximity");
        }
        if self.puell_multiple {
            names.push("puell_multiple");
        }
        if self.lth_sopr {
            names.push("lth_sopr");
        }
        if self.reserve_risk {
            names.push("reserve_risk");
        }
        names
    }
}

impl fmt::Display for SignalBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/5 [{}]", self.count(), self.fired().join(", "))
    }
}

/// Classifier output: the level plus the evidence that produced it.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Classification {
    pub level: RiskLevel,
    pub signal_count: usize,
    pub breakdown: SignalBreakdown,
}

/// Severity ladder, most severe first. The first rung whose minimum
/// signal count is met wins; below the last rung is ACCUMULATION/HOLD.
/// Order is load-bearing: it is what makes boundary counts classify
/// unambiguously.
const SEVERITY_LADDER: &[(usize, RiskLevel)] = &[
    (3, RiskLevel::ExtremeDanger),
    (2, RiskLevel::HighRisk),
    (1, RiskLevel::ElevatedCaution),
];

/// Aggregates Tier-1 signals into a categorical risk level.
pub struct RiskClassifier {
    thresholds: TierThresholds,
}

impl RiskClassifier {
    pub fn new(thresholds: TierThresholds) -> Self {
        Self { thresholds }
    }

    /// Access the threshold configuration.
    pub fn thresholds(&self) -> &TierThresholds {
        &self.thresholds
    }

    /// Classify a snapshot. Total and pure: every well-formed snapshot
    /// maps to exactly one level.
    pub fn classify(&self, snapshot: &IndicatorSnapshot) -> Classification {
        let t = &self.thresholds;
        let breakdown = SignalBreakdown {
            mvrv_z: snapshot.mvrv_z > t.mvrv_z,
            pi_cycle_proximity: snapshot.pi_cycle_proximity > t.pi_cycle_proximity,
            puell_multiple: snapshot.puell_multiple > t.puell_multiple,
            lth_sopr: snapshot.lth_sopr > t.lth_sopr,
            reserve_risk: snapshot.reserve_risk > t.reserve_risk,
        };
        let signal_count = breakdown.count();

        let level = SEVERITY_LADDER
            .iter()
            .find(|(min_signals, _)| signal_count >= *min_signals)
            .map(|(_, level)| *level)
            .unwrap_or(RiskLevel::AccumulationHold);

        debug!(
            signal_count,
            level = %level,
            fired = ?breakdown.fired(),
            "Snapshot classified"
        );

        Classification {
            level,
            signal_count,
            breakdown,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> RiskClassifier {
        RiskClassifier::new(TierThresholds::default())
    }

    /// A snapshot with exactly `n` indicators above their default
    /// thresholds, fired in canonical order.
    fn snapshot_with_signals(n: usize) -> IndicatorSnapshot {
        assert!(n <= 5);
        let hot = [
            MVRV_THRESHOLD + 1.0,
            1.0,
            PUELL_THRESHOLD + 1.0,
            SOPR_THRESHOLD + 1.0,
            RESERVE_RISK_THRESHOLD + 0.01,
        ];
        let cold = [0.0, 0.0, 0.0, 0.0, 0.0];
        let v: Vec<f64> = (0..5)
            .map(|i| if i < n { hot[i] } else { cold[i] })
            .collect();
        IndicatorSnapshot::new(v[0], v[1], v[2], v[3], v[4]).unwrap()
    }

    #[test]
    fn test_boundary_exactness() {
        let expected = [
            RiskLevel::AccumulationHold,
            RiskLevel::ElevatedCaution,
            RiskLevel::HighRisk,
            RiskLevel::ExtremeDanger,
            RiskLevel::ExtremeDanger,
            RiskLevel::ExtremeDanger,
        ];
        let classifier = classifier();
        for (count, want) in expected.iter().enumerate() {
            let result = classifier.classify(&snapshot_with_signals(count));
            assert_eq!(result.signal_count, count);
            assert_eq!(result.level, *want, "count {count}");
        }
    }

    #[test]
    fn test_monotonic_in_signal_count() {
        let classifier = classifier();
        let mut previous = RiskLevel::AccumulationHold;
        for count in 0..=5 {
            let level = classifier.classify(&snapshot_with_signals(count)).level;
            assert!(level >= previous, "level decreased at count {count}");
            previous = level;
        }
    }

    #[test]
    fn test_level_depends_only_on_count_not_which_fired() {
        // Two different single-signal snapshots classify identically.
        let classifier = classifier();
        let only_sopr = IndicatorSnapshot::new(0.0, 0.0, 0.0, 9.0, 0.0).unwrap();
        let only_reserve = IndicatorSnapshot::new(0.0, 0.0, 0.0, 0.0, 0.02).unwrap();

        let a = classifier.classify(&only_sopr);
        let b = classifier.classify(&only_reserve);
        assert_eq!(a.level, RiskLevel::ElevatedCaution);
        assert_eq!(a.level, b.level);
        assert_eq!(a.breakdown.fired(), vec!["lth_sopr"]);
        assert_eq!(b.breakdown.fired(), vec!["reserve_risk"]);
    }

    #[test]
    fn test_threshold_equality_does_not_fire() {
        // Predicates are strict: a value exactly at the threshold is safe,
        // one ULP above fires.
        let classifier = classifier();
        let at = IndicatorSnapshot::new(
            MVRV_THRESHOLD,
            PI_CYCLE_THRESHOLD,
            PUELL_THRESHOLD,
            SOPR_THRESHOLD,
            RESERVE_RISK_THRESHOLD,
        )
        .unwrap();
        let result = classifier.classify(&at);
        assert_eq!(result.signal_count, 0);
        assert_eq!(result.level, RiskLevel::AccumulationHold);

        let above = IndicatorSnapshot::new(
            f64::from_bits(MVRV_THRESHOLD.to_bits() + 1),
            PI_CYCLE_THRESHOLD,
            PUELL_THRESHOLD,
            SOPR_THRESHOLD,
            RESERVE_RISK_THRESHOLD,
        )
        .unwrap();
        let result = classifier.classify(&above);
        assert_eq!(result.signal_count, 1);
        assert_eq!(result.breakdown.fired(), vec!["mvrv_z"]);
    }

    #[test]
    fn test_reference_high_risk_scenario() {
        // mvrv_z and pi_cycle_proximity exceed, the rest do not → 2 → HIGH RISK.
        let snapshot = IndicatorSnapshot::new(8.0, 0.97, 2.0, 5.0, 0.01).unwrap();
        let result = classifier().classify(&snapshot);
        assert_eq!(result.signal_count, 2);
        assert_eq!(result.level, RiskLevel::HighRisk);
        assert_eq!(result.breakdown.fired(), vec!["mvrv_z", "pi_cycle_proximity"]);
    }

    #[test]
    fn test_all_cold_is_accumulation() {
        let snapshot = IndicatorSnapshot::new(-0.5, 0.1, 0.4, 0.9, 0.001).unwrap();
        let result = classifier().classify(&snapshot);
        assert_eq!(result.level, RiskLevel::AccumulationHold);
        assert_eq!(result.signal_count, 0);
        assert!(result.breakdown.fired().is_empty());
    }

    #[test]
    fn test_custom_thresholds() {
        // The alternate calibration from the second reference variant.
        let classifier = RiskClassifier::new(TierThresholds {
            mvrv_z: 7.0,
            pi_cycle_proximity: 0.95,
            puell_multiple: 4.0,
            lth_sopr: 10.0,
            reserve_risk: 0.02,
        });
        // 6.5 clears the default 6.0 but not the custom 7.0.
        let snapshot = IndicatorSnapshot::new(6.5, 0.97, 2.0, 5.0, 0.01).unwrap();
        let result = classifier.classify(&snapshot);
        assert_eq!(result.signal_count, 1);
        assert_eq!(result.level, RiskLevel::ElevatedCaution);
    }

    #[test]
    fn test_default_thresholds() {
        let t = TierThresholds::default();
        assert_eq!(t.mvrv_z, 6.0);
        assert_eq!(t.pi_cycle_proximity, 0.95);
        assert_eq!(t.puell_multiple, 3.0);
        assert_eq!(t.lth_sopr, 8.0);
        assert_eq!(t.reserve_risk, 0.015);
    }

    #[test]
    fn test_thresholds_partial_toml_uses_defaults() {
        let t: TierThresholds = toml::from_str("mvrv_z = 7.0").unwrap();
        assert_eq!(t.mvrv_z, 7.0);
        assert_eq!(t.pi_cycle_proximity, PI_CYCLE_THRESHOLD);
        assert_eq!(t.reserve_risk, RESERVE_RISK_THRESHOLD);
    }

    #[test]
    fn test_severity_ladder_descending() {
        let mut counts = SEVERITY_LADDER.iter().map(|(min, _)| *min);
        let mut previous = counts.next().unwrap();
        for count in counts {
            assert!(count < previous, "ladder must be strictly descending");
            previous = count;
        }
    }

    #[test]
    fn test_breakdown_display() {
        let snapshot = IndicatorSnapshot::new(8.0, 0.97, 2.0, 5.0, 0.01).unwrap();
        let result = classifier().classify(&snapshot);
        let display = format!("{}", result.breakdown);
        assert!(display.starts_with("2/5"));
        assert!(display.contains("mvrv_z"));
        assert!(display.contains("pi_cycle_proximity"));
    }

    #[test]
    fn test_breakdown_serializes_bools() {
        let snapshot = IndicatorSnapshot::new(8.0, 0.97, 2.0, 5.0, 0.01).unwrap();
        let result = classifier().classify(&snapshot);
        let json = serde_json::to_value(result.breakdown).unwrap();
        assert_eq!(json["mvrv_z"], true);
        assert_eq!(json["puell_multiple"], false);
    }
}
