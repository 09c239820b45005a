//! Dashboard API route handlers.
//!
//! All endpoints return JSON. State is shared via `Arc<DashboardState>`
//! and updated by the monitor loop after each assessment cycle.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::engine::assessor::RiskAssessment;
use crate::signals::classifier::SignalBreakdown;

/// Most recent assessments kept for `/api/history`. In-memory only —
/// nothing is persisted across restarts.
const HISTORY_LIMIT: usize = 100;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct DashboardState {
    pub monitor_name: String,
    pub started_at: DateTime<Utc>,
    pub latest: RwLock<Option<RiskAssessment>>,
    pub history: RwLock<Vec<HistoryEntry>>,
    pub cycles_run: RwLock<u64>,
    pub cycles_failed: RwLock<u64>,
}

impl DashboardState {
    pub fn new(monitor_name: &str) -> Self {
        Self {
            monitor_name: monitor_name.to_string(),
            started_at: Utc::now(),
            latest: RwLock::new(None),
            history: RwLock::new(Vec::new()),
            cycles_run: RwLock::new(0),
            cycles_failed: RwLock::new(0),
        }
    }

    /// Record a completed assessment.
    pub async fn record(&self, assessment: RiskAssessment) {
        *self.latest.write().await = Some(assessment);

        let mut history = self.history.write().await;
        history.push(HistoryEntry::from(&assessment));
        if history.len() > HISTORY_LIMIT {
            let excess = history.len() - HISTORY_LIMIT;
            history.drain(..excess);
        }
        drop(history);

        *self.cycles_run.write().await += 1;
    }

    /// Record a failed assessment cycle.
    pub async fn record_failure(&self) {
        *self.cycles_run.write().await += 1;
        *self.cycles_failed.write().await += 1;
    }
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Full latest-assessment payload: the five indicator values flattened
/// beside the classification, mirroring the monitor's log line.
#[derive(Debug, Clone, Serialize)]
pub struct RiskResponse {
    pub timestamp: String,
    pub mvrv_z: f64,
    pub pi_cycle_proximity: f64,
    pub puell_multiple: f64,
    pub lth_sopr: f64,
    pub reserve_risk: f64,
    pub risk_level: String,
    pub signal_count: usize,
    pub signals: SignalBreakdown,
}

impl From<&RiskAssessment> for RiskResponse {
    fn from(a: &RiskAssessment) -> Self {
        Self {
            timestamp: a.timestamp.to_rfc3339(),
            mvrv_z: a.snapshot.mvrv_z,
            pi_cycle_proximity: a.snapshot.pi_cycle_proximity,
            puell_multiple: a.snapshot.puell_multiple,
            lth_sopr: a.snapshot.lth_sopr,
            reserve_risk: a.snapshot.reserve_risk,
            risk_level: a.level.label().to_string(),
            signal_count: a.signal_count,
            signals: a.breakdown,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub timestamp: String,
    pub risk_level: String,
    pub signal_count: usize,
}

impl From<&RiskAssessment> for HistoryEntry {
    fn from(a: &RiskAssessment) -> Self {
        Self {
            timestamp: a.timestamp.to_rfc3339(),
            risk_level: a.level.label().to_string(),
            signal_count: a.signal_count,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub monitor: String,
    pub uptime_secs: i64,
    pub cycles_run: u64,
    pub cycles_failed: u64,
    pub last_risk_level: Option<String>,
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

pub type AppState = Arc<DashboardState>;

/// GET /api/risk — latest assessment, 503 until the first one lands.
pub async fn get_risk(
    State(state): State<AppState>,
) -> Result<Json<RiskResponse>, (StatusCode, String)> {
    let latest = state.latest.read().await;
    match latest.as_ref() {
        Some(assessment) => Ok(Json(RiskResponse::from(assessment))),
        None => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "no completed assessment yet".to_string(),
        )),
    }
}

/// GET /api/history
pub async fn get_history(State(state): State<AppState>) -> Json<Vec<HistoryEntry>> {
    let history = state.history.read().await;
    Json(history.clone())
}

/// GET /api/status
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let uptime = (Utc::now() - state.started_at).num_seconds();
    let last_risk_level = state
        .latest
        .read()
        .await
        .as_ref()
        .map(|a| a.level.label().to_string());

    Json(StatusResponse {
        monitor: state.monitor_name.clone(),
        uptime_secs: uptime,
        cycles_run: *state.cycles_run.read().await,
        cycles_failed: *state.cycles_failed.read().await,
        last_risk_level,
    })
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::classifier::{RiskClassifier, TierThresholds};
    use crate::types::{IndicatorSnapshot, RiskLevel};

    fn sample_assessment() -> RiskAssessment {
        let snapshot = IndicatorSnapshot::new(8.0, 0.97, 2.0, 5.0, 0.01).unwrap();
        let classification = RiskClassifier::new(TierThresholds::default()).classify(&snapshot);
        RiskAssessment {
            timestamp: Utc::now(),
            snapshot,
            level: classification.level,
            signal_count: classification.signal_count,
            breakdown: classification.breakdown,
        }
    }

    #[tokio::test]
    async fn test_get_risk_before_first_assessment() {
        let state = Arc::new(DashboardState::new("APEX-TEST"));
        let result = get_risk(State(state)).await;
        let (status, _) = result.unwrap_err();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_get_risk_after_assessment() {
        let state = Arc::new(DashboardState::new("APEX-TEST"));
        state.record(sample_assessment()).await;

        let Json(resp) = get_risk(State(state)).await.unwrap();
        assert_eq!(resp.risk_level, "HIGH RISK");
        assert_eq!(resp.signal_count, 2);
        assert!((resp.mvrv_z - 8.0).abs() < 1e-12);
        assert!(resp.signals.mvrv_z);
        assert!(!resp.signals.puell_multiple);
    }

    #[tokio::test]
    async fn test_history_accumulates() {
        let state = Arc::new(DashboardState::new("APEX-TEST"));
        state.record(sample_assessment()).await;
        state.record(sample_assessment()).await;

        let Json(history) = get_history(State(state.clone())).await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].risk_level, "HIGH RISK");
        assert_eq!(*state.cycles_run.read().await, 2);
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let state = Arc::new(DashboardState::new("APEX-TEST"));
        for _ in 0..(HISTORY_LIMIT + 10) {
            state.record(sample_assessment()).await;
        }
        let Json(history) = get_history(State(state)).await;
        assert_eq!(history.len(), HISTORY_LIMIT);
    }

    #[tokio::test]
    async fn test_status_counts_failures() {
        let state = Arc::new(DashboardState::new("APEX-TEST"));
        state.record(sample_assessment()).await;
        state.record_failure().await;

        let Json(status) = get_status(State(state)).await;
        assert_eq!(status.monitor, "APEX-TEST");
        assert_eq!(status.cycles_run, 2);
        assert_eq!(status.cycles_failed, 1);
        assert_eq!(status.last_risk_level.as_deref(), Some("HIGH RISK"));
    }

    #[tokio::test]
    async fn test_status_before_first_assessment() {
        let state = Arc::new(DashboardState::new("APEX-TEST"));
        let Json(status) = get_status(State(state)).await;
        assert_eq!(status.cycles_run, 0);
        assert!(status.last_risk_level.is_none());
    }

    #[test]
    fn test_risk_response_serializes_fixed_labels() {
        let mut assessment = sample_assessment();
        assessment.level = RiskLevel::ExtremeDanger;
        let resp = RiskResponse::from(&assessment);
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"risk_level\":\"EXTREME DANGER\""));
        assert!(json.contains("pi_cycle_proximity"));
    }
}
