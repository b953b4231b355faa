//! Background maintenance loops.
//!
//! Authorization polling, delivered-history cleanup, and periodic
//! statistics logging run on independent fixed-interval timers, detached
//! from the foreground request path. Failures here are logged and dropped;
//! nothing is ever surfaced to a caller.

use std::sync::Arc;
use std::time::Duration;

use centime_core::config::NotifyConfig;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::authorize::AuthorizationGate;
use crate::diagnostics::DiagnosticsEngine;
use crate::scheduler::AlertScheduler;

/// Spawn all three loops. Abort the handles to stop them.
pub fn spawn_maintenance(
    scheduler: Arc<Mutex<AlertScheduler>>,
    gate: Arc<AuthorizationGate>,
    diagnostics: Arc<DiagnosticsEngine>,
    config: &NotifyConfig,
) -> Vec<JoinHandle<()>> {
    vec![
        tokio::spawn(authorization_loop(gate, config.auth_poll_secs)),
        tokio::spawn(cleanup_loop(
            scheduler,
            config.delivered_max_age_days,
            config.cleanup_interval_secs,
        )),
        tokio::spawn(stats_loop(diagnostics, config.stats_interval_secs)),
    ]
}

/// Re-observe the OS permission state; the user can flip it at any time.
async fn authorization_loop(gate: Arc<AuthorizationGate>, every_secs: u64) {
    tracing::info!("⏰ Authorization poll started (every {every_secs}s)");
    let mut interval = tokio::time::interval(Duration::from_secs(every_secs.max(1)));
    loop {
        interval.tick().await;
        if let Err(e) = gate.check_status().await {
            tracing::warn!("⚠️ Authorization poll failed: {e}");
        }
    }
}

async fn cleanup_loop(
    scheduler: Arc<Mutex<AlertScheduler>>,
    max_age_days: u64,
    every_secs: u64,
) {
    tracing::info!("⏰ Delivered-history cleanup started (every {every_secs}s)");
    let mut interval = tokio::time::interval(Duration::from_secs(every_secs.max(1)));
    loop {
        interval.tick().await;
        let max_age = chrono::Duration::days(max_age_days as i64);
        let mut scheduler = scheduler.lock().await;
        match scheduler.cleanup_old(max_age).await {
            Ok(0) => {}
            Ok(removed) => tracing::info!("🧹 Cleanup removed {removed} delivered record(s)"),
            Err(e) => tracing::warn!("⚠️ Delivered-history cleanup failed: {e}"),
        }
    }
}

async fn stats_loop(diagnostics: Arc<DiagnosticsEngine>, every_secs: u64) {
    tracing::info!("⏰ Statistics sampling started (every {every_secs}s)");
    let mut interval = tokio::time::interval(Duration::from_secs(every_secs.max(1)));
    loop {
        interval.tick().await;
        match diagnostics.statistics().await {
            Ok(stats) => tracing::info!(
                "📊 Alerts: pending={} delivered={} next={:?}",
                stats.pending_count,
                stats.delivered_count,
                stats.next_scheduled
            ),
            Err(e) => tracing::warn!("⚠️ Statistics sample failed: {e}"),
        }
    }
}
