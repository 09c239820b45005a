//! APEX — Bitcoin Cycle-Top Risk Monitor
//!
//! Entry point. Loads configuration, initialises structured logging,
//! wires the data sources into the assessor, and runs the periodic
//! assess→publish loop with graceful shutdown.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use apex::config;
use apex::dashboard::{self, routes::DashboardState};
use apex::engine::assessor::Assessor;
use apex::signals::classifier::RiskClassifier;
use apex::signals::proximity::{PiCycleCalculator, PiCycleConfig};
use apex::sources::bgeometrics::BGeometricsClient;
use apex::sources::fred::FredClient;
use apex::types::RiskLevel;

const BANNER: &str = r#"
    _    ____  _______  __
   / \  |  _ \| ____\ \/ /
  / _ \ | |_) |  _|  \  /
 / ___ \|  __/| |___ /  \
/_/   \_\_|   |_____/_/\_\

  Aggregated Pi-cycle & EXtremes — Bitcoin Cycle-Top Risk Monitor
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load configuration from TOML
    let cfg = config::AppConfig::load("config.toml")?;

    // Initialise structured logging
    init_logging();

    // Print startup banner
    println!("{BANNER}");
    info!(
        monitor = %cfg.monitor.name,
        poll_interval_secs = cfg.monitor.poll_interval_secs,
        short_window = cfg.engine.short_window,
        long_window = cfg.engine.long_window,
        lookback_days = cfg.engine.lookback_days,
        "APEX starting up"
    );

    // -- Initialise components -------------------------------------------

    let fred_key = cfg
        .data_sources
        .fred_api_key_env
        .as_deref()
        .and_then(|env| std::env::var(env).ok());
    if fred_key.is_none() {
        warn!("No FRED API key configured — relying on unauthenticated access");
    }

    let metrics = BGeometricsClient::new()?;
    let prices = FredClient::new(fred_key)?;

    let assessor = Assessor::new(
        Box::new(metrics),
        Box::new(prices),
        PiCycleCalculator::new(PiCycleConfig {
            short_window: cfg.engine.short_window,
            long_window: cfg.engine.long_window,
        }),
        RiskClassifier::new(cfg.thresholds),
        cfg.engine.lookback_days,
    );

    let state = Arc::new(DashboardState::new(&cfg.monitor.name));
    if cfg.dashboard.enabled {
        dashboard::spawn_dashboard(state.clone(), cfg.dashboard.port)?;
    }

    // -- Monitor loop ------------------------------------------------------

    let mut interval = tokio::time::interval(Duration::from_secs(cfg.monitor.poll_interval_secs));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        interval_secs = cfg.monitor.poll_interval_secs,
        "Entering monitor loop. Press Ctrl+C to stop."
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match assessor.assess().await {
                    Ok(assessment) => {
                        if assessment.level >= RiskLevel::HighRisk {
                            warn!(
                                level = %assessment.level,
                                signals = assessment.signal_count,
                                fired = ?assessment.breakdown.fired(),
                                "Cycle-top risk elevated"
                            );
                        }
                        state.record(assessment).await;
                    }
                    Err(e) => {
                        error!(error = format!("{e:#}"), "Assessment failed — continuing to next cycle");
                        state.record_failure().await;
                    }
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    info!(
        cycles = *state.cycles_run.read().await,
        failed = *state.cycles_failed.read().await,
        "APEX shut down cleanly."
    );

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("apex=info"));

    let json_logging = std::env::var("APEX_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
