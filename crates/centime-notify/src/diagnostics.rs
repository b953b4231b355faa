//! Health and statistics derived from current store state.
//!
//! Everything here is recomputed on demand and never persisted. The
//! statistics sample and the system report both re-read the store, so they
//! see whatever the OS currently holds, not what the mirror last saw.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use centime_core::config::NotifyConfig;
use centime_core::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::request::{AuthorizationState, Category, ChannelSettings};
use crate::scheduler::OpsStatus;
use crate::store::NotificationStore;
use crate::trigger;

/// Slots left before capacity counts as a soft warning.
const HEADROOM_FLOOR: usize = 8;

/// Point-in-time scheduling statistics.
#[derive(Debug, Clone, Serialize)]
pub struct Statistics {
    pub pending_count: usize,
    pub delivered_count: usize,
    pub category_breakdown: HashMap<Category, usize>,
    /// Earliest computed next-fire instant across all pending triggers.
    pub next_scheduled: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub last_successful_schedule: Option<DateTime<Utc>>,
}

/// Coarse health classification, a strict priority chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Health {
    Error,
    Warning,
    Active,
    Idle,
}

/// Overall grade of the system report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemGrade {
    Healthy,
    Caution,
    Warning,
    Critical,
}

/// Structured multi-section diagnostic for a debug/ops collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct SystemReport {
    pub generated_at: DateTime<Utc>,
    pub authorization: AuthorizationState,
    pub channels: ChannelSettings,
    pub pending_count: usize,
    pub capacity: usize,
    pub registered_categories: usize,
    pub expected_categories: usize,
    pub last_error: Option<String>,
    pub hard_issues: Vec<String>,
    pub soft_warnings: Vec<String>,
    pub grade: SystemGrade,
}

impl std::fmt::Display for SystemReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "== Notification System Report ==")?;
        writeln!(f, "Generated: {}", self.generated_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
        writeln!(f, "Grade: {:?}", self.grade)?;
        writeln!(f)?;
        writeln!(f, "-- Authorization --")?;
        writeln!(f, "State: {:?}", self.authorization)?;
        writeln!(
            f,
            "Notifications: {}  Alerts: {}  Badges: {}  Sounds: {}",
            on_off(self.channels.enabled),
            on_off(self.channels.alerts_enabled),
            on_off(self.channels.badges_enabled),
            on_off(self.channels.sounds_enabled),
        )?;
        writeln!(f)?;
        writeln!(f, "-- Queue --")?;
        writeln!(f, "Pending: {} / {}", self.pending_count, self.capacity)?;
        writeln!(
            f,
            "Categories registered: {} / {}",
            self.registered_categories, self.expected_categories
        )?;
        writeln!(f)?;
        writeln!(f, "-- Issues --")?;
        if self.hard_issues.is_empty() && self.soft_warnings.is_empty() {
            writeln!(f, "(none)")?;
        }
        for issue in &self.hard_issues {
            writeln!(f, "[hard] {issue}")?;
        }
        for warning in &self.soft_warnings {
            writeln!(f, "[soft] {warning}")?;
        }
        Ok(())
    }
}

fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

/// Derives statistics and health from store state plus the scheduler's
/// shared status scalars.
pub struct DiagnosticsEngine {
    store: Arc<dyn NotificationStore>,
    status: Arc<Mutex<OpsStatus>>,
    config: NotifyConfig,
}

impl DiagnosticsEngine {
    pub fn new(
        store: Arc<dyn NotificationStore>,
        status: Arc<Mutex<OpsStatus>>,
        config: NotifyConfig,
    ) -> Self {
        Self { store, status, config }
    }

    fn status_snapshot(&self) -> OpsStatus {
        self.status.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub async fn statistics(&self) -> Result<Statistics> {
        let pending = self.store.pending().await?;
        let delivered = self.store.delivered().await?;
        let now = Utc::now();

        let next_scheduled = pending
            .iter()
            .filter_map(|p| trigger::next_fire_after(&p.trigger, p.requested_at, now))
            .min();

        let mut category_breakdown: HashMap<Category, usize> = HashMap::new();
        for entry in &pending {
            *category_breakdown.entry(entry.category).or_default() += 1;
        }

        let status = self.status_snapshot();
        Ok(Statistics {
            pending_count: pending.len(),
            delivered_count: delivered.len(),
            category_breakdown,
            next_scheduled,
            last_error: status.last_error,
            last_successful_schedule: status.last_successful_schedule,
        })
    }

    /// Strict priority chain: a recorded error outranks authorization, which
    /// outranks activity.
    pub async fn health(&self) -> Result<Health> {
        if self.status_snapshot().last_error.is_some() {
            return Ok(Health::Error);
        }
        let auth = self.store.authorization_status().await?;
        if !auth.can_deliver() {
            return Ok(Health::Warning);
        }
        let pending = self.store.pending().await?;
        Ok(if pending.is_empty() { Health::Idle } else { Health::Active })
    }

    pub async fn system_report(&self) -> Result<SystemReport> {
        let authorization = self.store.authorization_status().await?;
        let channels = self.store.channel_settings().await?;
        let pending = self.store.pending().await?;
        let registered = self.store.registered_categories().await?;
        let status = self.status_snapshot();

        let mut hard_issues = Vec::new();
        let mut soft_warnings = Vec::new();

        if authorization == AuthorizationState::Denied {
            hard_issues.push("notification authorization denied".to_string());
        }
        if !channels.enabled {
            hard_issues.push("notifications disabled in system settings".to_string());
        }
        if authorization == AuthorizationState::NotDetermined {
            soft_warnings.push("authorization not requested yet".to_string());
        }
        if !channels.alerts_enabled {
            soft_warnings.push("alert banners disabled".to_string());
        }
        if !channels.badges_enabled {
            soft_warnings.push("badges disabled".to_string());
        }
        if !channels.sounds_enabled {
            soft_warnings.push("sounds disabled".to_string());
        }
        let headroom = self.config.max_pending.saturating_sub(pending.len());
        if headroom < HEADROOM_FLOOR {
            soft_warnings.push(format!("only {headroom} scheduling slots left"));
        }
        if registered.len() < Category::ALL.len() {
            soft_warnings.push(format!(
                "{} of {} action categories registered",
                registered.len(),
                Category::ALL.len()
            ));
        }
        if let Some(e) = &status.last_error {
            soft_warnings.push(format!("last error: {e}"));
        }

        let grade = if !hard_issues.is_empty() {
            SystemGrade::Critical
        } else if soft_warnings.len() > 2 {
            SystemGrade::Warning
        } else if !soft_warnings.is_empty() {
            SystemGrade::Caution
        } else {
            SystemGrade::Healthy
        };

        Ok(SystemReport {
            generated_at: Utc::now(),
            authorization,
            channels,
            pending_count: pending.len(),
            capacity: self.config.max_pending,
            registered_categories: registered.len(),
            expected_categories: Category::ALL.len(),
            last_error: status.last_error,
            hard_issues,
            soft_warnings,
            grade,
        })
    }
}
