//! Pi-Cycle proximity.
//!
//! Measures how close the short (111-day) simple moving average of price
//! is to crossing 2× the long (350-day) SMA — the classic cycle-top
//! heuristic. Output is the bounded-distance variant: a dimensionless
//! ratio in `[0, 1]` where `1` means the two lines coincide (cross
//! imminent) and `0` means maximal divergence.

use crate::types::{EngineError, PriceSeries};

// ---------------------------------------------------------------------------
// Configuration (defaults — overridden by config.toml at runtime)
// ---------------------------------------------------------------------------

/// Default short SMA window (trading days).
pub const SHORT_WINDOW: usize = 111;
/// Default long SMA window (trading days). Also the minimum series length.
pub const LONG_WINDOW: usize = 350;

/// Moving-average windows for the Pi-Cycle calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PiCycleConfig {
    pub short_window: usize,
    pub long_window: usize,
}

impl Default for PiCycleConfig {
    fn default() -> Self {
        Self {
            short_window: SHORT_WINDOW,
            long_window: LONG_WINDOW,
        }
    }
}

// ---------------------------------------------------------------------------
// Calculator
// ---------------------------------------------------------------------------

/// Computes the Pi-Cycle proximity for a price series.
pub struct PiCycleCalculator {
    config: PiCycleConfig,
}

impl PiCycleCalculator {
    pub fn new(config: PiCycleConfig) -> Self {
        Self { config }
    }

    /// Access the window configuration.
    pub fn config(&self) -> &PiCycleConfig {
        &self.config
    }

    /// Minimum series length for both averages to be defined.
    pub fn min_days(&self) -> usize {
        self.config.short_window.max(self.config.long_window)
    }

    /// Proximity of the two moving averages at the most recent day.
    ///
    /// `proximity = 1 − min(|sma_short − 2·sma_long| / sma_short, 1)`,
    /// clamped to `[0, 1]`. A series shorter than the long window is
    /// rejected with `InsufficientData` — never padded or extrapolated.
    /// The series is treated as dense in trading order; gaps are not
    /// interpolated.
    pub fn proximity(&self, series: &PriceSeries) -> Result<f64, EngineError> {
        let required = self.min_days();
        if series.len() < required {
            return Err(EngineError::InsufficientData {
                required,
                actual: series.len(),
            });
        }

        let sma_short = Self::trailing_mean(series, self.config.short_window);
        let doubled_long = 2.0 * Self::trailing_mean(series, self.config.long_window);

        if sma_short == 0.0 {
            return Ok(0.0);
        }

        let distance = ((sma_short - doubled_long).abs() / sma_short).min(1.0);
        Ok((1.0 - distance).clamp(0.0, 1.0))
    }

    /// Mean of the trailing `window` prices. Caller guarantees
    /// `series.len() >= window`.
    fn trailing_mean(series: &PriceSeries, window: usize) -> f64 {
        let points = series.points();
        let tail = &points[points.len() - window..];
        let sum: f64 = tail.iter().map(|p| p.price).sum();
        sum / window as f64
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
