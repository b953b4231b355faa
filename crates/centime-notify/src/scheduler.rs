//! The scheduling core — validates, submits, cancels, and caps alert
//! requests against the OS store.
//!
//! Every decision that needs current state follows refresh-then-act: the
//! pending mirror is re-read from the store, then the write happens. The
//! window between refresh and write is an accepted best-effort tradeoff;
//! the OS store stays the single source of truth. One logical writer at a
//! time: callers drive the scheduler behind `Arc<tokio::sync::Mutex<_>>`
//! and must not fan out concurrent mutation calls.

use std::sync::{Arc, Mutex};

use centime_core::config::NotifyConfig;
use centime_core::error::{NotifyError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::authorize::AuthorizationGate;
use crate::request::{Category, CategoryRegistration, PendingNotification, ScheduleRequest};
use crate::store::NotificationStore;
use crate::template::TemplateCatalog;
use crate::trigger::{self, Frequency};

/// Metadata keys the scheduler stamps on every submission, read back by the
/// router and diagnostics.
pub const META_CATEGORY: &str = "category";
pub const META_PRIORITY: &str = "priority";
pub const META_IDENTIFIER: &str = "identifier";

/// Stable ids for the singleton recurring alerts. One-off alerts append a
/// fresh token instead, since the store replaces on id collision.
pub const PURCHASE_REMINDER_ID: &str = "centime.reminder.purchase";
pub const BUDGET_UPDATE_ID: &str = "centime.reminder.budget-update";

/// The only state this engine keeps outside the OS store, shared with the
/// diagnostics engine.
#[derive(Debug, Clone, Default)]
pub struct OpsStatus {
    pub last_error: Option<String>,
    pub last_successful_schedule: Option<DateTime<Utc>>,
}

/// Snapshot of the user's reminder settings, handed in by the settings
/// collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderSettings {
    pub purchase_enabled: bool,
    pub purchase_frequency: Frequency,
    pub purchase_hour: u32,
    pub budget_enabled: bool,
    pub budget_frequency: Frequency,
    pub budget_hour: u32,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            purchase_enabled: true,
            purchase_frequency: Frequency::Daily,
            purchase_hour: 20,
            budget_enabled: true,
            budget_frequency: Frequency::Monthly,
            budget_hour: 9,
        }
    }
}

/// The scheduling engine. One explicitly constructed instance per process.
pub struct AlertScheduler {
    store: Arc<dyn NotificationStore>,
    gate: Arc<AuthorizationGate>,
    catalog: TemplateCatalog,
    config: NotifyConfig,
    /// Best-effort mirror of the OS pending set.
    pending: Vec<PendingNotification>,
    status: Arc<Mutex<OpsStatus>>,
}

impl AlertScheduler {
    pub fn new(
        store: Arc<dyn NotificationStore>,
        gate: Arc<AuthorizationGate>,
        catalog: TemplateCatalog,
        config: NotifyConfig,
    ) -> Self {
        Self {
            store,
            gate,
            catalog,
            config,
            pending: Vec::new(),
            status: Arc::new(Mutex::new(OpsStatus::default())),
        }
    }

    /// Handle to the shared status scalars, for the diagnostics engine.
    pub fn status_handle(&self) -> Arc<Mutex<OpsStatus>> {
        self.status.clone()
    }

    pub fn config(&self) -> &NotifyConfig {
        &self.config
    }

    /// The mirror as of the last refresh.
    pub fn pending_mirror(&self) -> &[PendingNotification] {
        &self.pending
    }

    /// Re-read the pending set from the store.
    pub async fn refresh(&mut self) -> Result<()> {
        self.pending = self.store.pending().await?;
        Ok(())
    }

    /// Register the five category/action sets with the OS so delivered
    /// alerts carry their buttons. Called once at startup.
    pub async fn register_categories(&self) -> Result<()> {
        let registrations: Vec<CategoryRegistration> = Category::ALL
            .iter()
            .map(|&category| CategoryRegistration { category, actions: category.actions() })
            .collect();
        self.store.register_categories(&registrations).await?;
        tracing::debug!("🗂️ Registered {} alert categories", registrations.len());
        Ok(())
    }

    /// Validate, capacity-check, and submit one request.
    ///
    /// Success records `last_successful_schedule` and clears `last_error`;
    /// any failure lands in `last_error`. A corrected subsequent call is the
    /// only retry mechanism.
    pub async fn schedule(&mut self, request: ScheduleRequest) -> Result<()> {
        let result = self.try_schedule(request).await;
        let mut status = self.status.lock().unwrap_or_else(|e| e.into_inner());
        match &result {
            Ok(()) => {
                status.last_successful_schedule = Some(Utc::now());
                status.last_error = None;
            }
            Err(e) => status.last_error = Some(e.to_string()),
        }
        result
    }

    async fn try_schedule(&mut self, mut request: ScheduleRequest) -> Result<()> {
        request.template.validate()?;

        let auth = self.gate.check_status().await?;
        if !auth.can_deliver() {
            return Err(NotifyError::AuthorizationDenied);
        }

        self.refresh().await?;
        if self.pending.len() >= self.config.max_pending {
            return Err(NotifyError::TooManyNotifications {
                pending: self.pending.len(),
                max: self.config.max_pending,
            });
        }

        // Tag for later routing and cancellation.
        let metadata = &mut request.template.metadata;
        metadata.insert(META_CATEGORY.into(), request.template.category.to_string());
        metadata.insert(META_PRIORITY.into(), request.template.priority.to_string());
        metadata.insert(META_IDENTIFIER.into(), request.id.clone());

        let title = request.template.title.clone();
        let id = request.id.clone();
        self.store
            .add(request)
            .await
            .map_err(|e| NotifyError::SchedulingFailed(e.to_string()))?;
        tracing::info!("📅 Alert scheduled: '{title}' ({id})");
        Ok(())
    }

    /// Cancel every pending alert tagged with the category. Removes exactly
    /// the matching set; everything else is untouched.
    pub async fn cancel_category(&mut self, category: Category) -> Result<()> {
        self.refresh().await?;
        let ids: Vec<String> = self
            .pending
            .iter()
            .filter(|p| p.category == category)
            .map(|p| p.id.clone())
            .collect();
        if !ids.is_empty() {
            self.store.remove_pending(&ids).await?;
            tracing::info!("🗑️ Cancelled {} pending {category} alert(s)", ids.len());
        }
        self.refresh().await
    }

    /// Cancel specific requests by id.
    pub async fn cancel_ids(&mut self, ids: &[String]) -> Result<()> {
        self.store.remove_pending(ids).await?;
        self.refresh().await
    }

    /// Cancel everything pending.
    pub async fn cancel_all(&mut self) -> Result<()> {
        self.store.remove_all_pending().await?;
        tracing::info!("🗑️ Cancelled all pending alerts");
        self.refresh().await
    }

    /// Apply a settings snapshot. Each kind cancels then reschedules (or
    /// only cancels when disabled) on its own; there is no cross-kind
    /// transaction. Both kinds are always attempted and the first error is
    /// returned afterwards. Calling twice with the same snapshot produces
    /// the same end state.
    pub async fn update_from_settings(&mut self, settings: &ReminderSettings) -> Result<()> {
        let purchase = self.update_purchase_reminder(settings).await;
        if let Err(e) = &purchase {
            tracing::warn!("⚠️ Purchase reminder update failed: {e}");
        }
        let budget = self.update_budget_reminder(settings).await;
        if let Err(e) = &budget {
            tracing::warn!("⚠️ Budget reminder update failed: {e}");
        }
        purchase.and(budget)
    }

    async fn update_purchase_reminder(&mut self, settings: &ReminderSettings) -> Result<()> {
        self.cancel_category(Category::Purchase).await?;
        if !settings.purchase_enabled {
            return Ok(());
        }
        let template = self.catalog.purchase_reminder()?;
        let spec = trigger::from_frequency(settings.purchase_frequency, settings.purchase_hour);
        self.schedule(ScheduleRequest::new(PURCHASE_REMINDER_ID, template, spec))
            .await
    }

    async fn update_budget_reminder(&mut self, settings: &ReminderSettings) -> Result<()> {
        self.cancel_category(Category::Budget).await?;
        if !settings.budget_enabled {
            return Ok(());
        }
        let template = self.catalog.budget_update()?;
        let spec = trigger::from_frequency_on_day(
            settings.budget_frequency,
            settings.budget_hour,
            self.config.budget_update_day,
        );
        self.schedule(ScheduleRequest::new(BUDGET_UPDATE_ID, template, spec))
            .await
    }

    /// Best-effort achievement alert; failures are logged, never surfaced.
    pub async fn schedule_achievement(&mut self, title: &str, message: &str, delay_secs: u64) {
        if let Err(e) = self.schedule_achievement_inner(title, message, delay_secs).await {
            tracing::warn!("⚠️ Achievement alert dropped: {e}");
        }
    }

    async fn schedule_achievement_inner(
        &mut self,
        title: &str,
        message: &str,
        delay_secs: u64,
    ) -> Result<()> {
        let template = self.catalog.achievement(title, message)?;
        let id = format!("centime.achievement.{}", Uuid::new_v4());
        self.schedule(ScheduleRequest::new(id, template, trigger::from_delay(delay_secs)))
            .await
    }

    /// Budget threshold breach: user-critical, errors propagate to the
    /// caller. Every call gets a fresh token; repeated crossings in the same
    /// period schedule again rather than dedup.
    pub async fn schedule_budget_warning(
        &mut self,
        category: &str,
        spent: f64,
        limit: f64,
        delay_secs: u64,
    ) -> Result<()> {
        let template = self.catalog.budget_warning(category, spent, limit)?;
        let slug = category.to_lowercase().replace(' ', "-");
        let id = format!("centime.warning.{slug}.{}", Uuid::new_v4());
        self.schedule(ScheduleRequest::new(id, template, trigger::from_delay(delay_secs)))
            .await
    }

    /// Best-effort backup nudge; failures are logged, never surfaced.
    pub async fn schedule_backup_reminder(&mut self, delay_secs: u64) {
        let result = match self.catalog.backup_reminder() {
            Ok(template) => {
                let id = format!("centime.backup.{}", Uuid::new_v4());
                self.schedule(ScheduleRequest::new(id, template, trigger::from_delay(delay_secs)))
                    .await
            }
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            tracing::warn!("⚠️ Backup reminder dropped: {e}");
        }
    }

    /// Re-schedule a one-shot purchase reminder after a "remind me later"
    /// interaction. Consumes a capacity slot like any other request.
    pub async fn snooze_purchase_reminder(&mut self) -> Result<()> {
        let template = self.catalog.purchase_reminder()?;
        let id = format!("{PURCHASE_REMINDER_ID}.snooze.{}", Uuid::new_v4());
        let spec = trigger::from_delay(self.config.snooze_delay_secs);
        self.schedule(ScheduleRequest::new(id, template, spec)).await
    }

    /// Prune delivered records older than `max_age`. Returns how many were
    /// removed.
    pub async fn cleanup_old(&mut self, max_age: Duration) -> Result<usize> {
        let cutoff = Utc::now() - max_age;
        let delivered = self.store.delivered().await?;
        let stale: Vec<String> = delivered
            .iter()
            .filter(|record| record.delivered_at < cutoff)
            .map(|record| record.id.clone())
            .collect();
        if !stale.is_empty() {
            self.store.remove_delivered(&stale).await?;
            tracing::debug!("🧹 Pruned {} delivered record(s)", stale.len());
        }
        Ok(stale.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{AuthorizationState, Priority, Template, TriggerSpec};
    use crate::store::MemoryStore;

    fn service() -> (AlertScheduler, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let gate = Arc::new(AuthorizationGate::new(store.clone()));
        let scheduler = AlertScheduler::new(
            store.clone(),
            gate,
            TemplateCatalog::with_seed(42),
            NotifyConfig::default(),
        );
        (scheduler, store)
    }

    fn one_shot(id: &str, category: Category) -> ScheduleRequest {
        let template = Template::new("title", "body", category, Priority::Normal);
        ScheduleRequest::new(id, template, TriggerSpec::OneShot { delay_secs: 60 })
    }

    #[tokio::test]
    async fn test_schedule_tags_metadata() {
        let (mut scheduler, store) = service();
        scheduler.schedule(one_shot("a", Category::Purchase)).await.unwrap();

        let submitted = store.pending_request("a").await.unwrap();
        assert_eq!(submitted.template.metadata[META_CATEGORY], "purchase");
        assert_eq!(submitted.template.metadata[META_PRIORITY], "normal");
        assert_eq!(submitted.template.metadata[META_IDENTIFIER], "a");

        let status = scheduler.status_handle();
        let status = status.lock().unwrap();
        assert!(status.last_successful_schedule.is_some());
        assert!(status.last_error.is_none());
    }

    #[tokio::test]
    async fn test_capacity_64_accepted_65th_rejected() {
        let (mut scheduler, _store) = service();
        for i in 0..64 {
            scheduler
                .schedule(one_shot(&format!("alert-{i}"), Category::Reminder))
                .await
                .unwrap();
        }
        let err = scheduler
            .schedule(one_shot("alert-64", Category::Reminder))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            NotifyError::TooManyNotifications { pending: 64, max: 64 }
        ));
        assert_eq!(scheduler.pending_mirror().len(), 64);
    }

    #[tokio::test]
    async fn test_invalid_template_rejected_before_submission() {
        let (mut scheduler, store) = service();
        let bad = ScheduleRequest::new(
            "bad",
            Template::new("", "body", Category::Reminder, Priority::Normal),
            TriggerSpec::OneShot { delay_secs: 60 },
        );
        let err = scheduler.schedule(bad).await.unwrap_err();
        assert!(matches!(err, NotifyError::InvalidTemplate(_)));
        assert!(store.pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_schedule_requires_authorization() {
        let (mut scheduler, store) = service();
        store.set_authorization(AuthorizationState::Denied).await;

        let err = scheduler.schedule(one_shot("a", Category::Purchase)).await.unwrap_err();
        assert!(matches!(err, NotifyError::AuthorizationDenied));

        let status = scheduler.status_handle();
        assert!(status.lock().unwrap().last_error.is_some());
    }

    #[tokio::test]
    async fn test_success_clears_last_error() {
        let (mut scheduler, store) = service();
        store.set_authorization(AuthorizationState::Denied).await;
        scheduler.schedule(one_shot("a", Category::Purchase)).await.unwrap_err();

        store.set_authorization(AuthorizationState::Authorized).await;
        scheduler.schedule(one_shot("a", Category::Purchase)).await.unwrap();

        let status = scheduler.status_handle();
        assert!(status.lock().unwrap().last_error.is_none());
    }

    #[tokio::test]
    async fn test_store_failure_wraps_as_scheduling_failed() {
        let (mut scheduler, store) = service();
        store.set_add_failure(true).await;

        let err = scheduler.schedule(one_shot("a", Category::Purchase)).await.unwrap_err();
        assert!(matches!(err, NotifyError::SchedulingFailed(_)));

        let status = scheduler.status_handle();
        assert!(status.lock().unwrap().last_error.is_some());
    }

    #[tokio::test]
    async fn test_cancel_category_is_exact() {
        let (mut scheduler, store) = service();
        scheduler.schedule(one_shot("p1", Category::Purchase)).await.unwrap();
        scheduler.schedule(one_shot("p2", Category::Purchase)).await.unwrap();
        scheduler.schedule(one_shot("b1", Category::Budget)).await.unwrap();
        scheduler.schedule(one_shot("w1", Category::Warning)).await.unwrap();

        scheduler.cancel_category(Category::Purchase).await.unwrap();

        let remaining: Vec<String> =
            store.pending().await.unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(remaining, vec!["b1".to_string(), "w1".to_string()]);
    }

    #[tokio::test]
    async fn test_cancel_all() {
        let (mut scheduler, store) = service();
        scheduler.schedule(one_shot("a", Category::Purchase)).await.unwrap();
        scheduler.schedule(one_shot("b", Category::Budget)).await.unwrap();

        scheduler.cancel_all().await.unwrap();
        assert!(store.pending().await.unwrap().is_empty());
        assert!(scheduler.pending_mirror().is_empty());
    }

    #[tokio::test]
    async fn test_update_from_settings_schedules_both_kinds() {
        let (mut scheduler, store) = service();
        scheduler.update_from_settings(&ReminderSettings::default()).await.unwrap();

        let pending = store.pending().await.unwrap();
        assert_eq!(pending.len(), 2);
        assert!(pending.iter().any(|p| p.id == PURCHASE_REMINDER_ID));
        assert!(pending.iter().any(|p| p.id == BUDGET_UPDATE_ID));
    }

    #[tokio::test]
    async fn test_update_from_settings_disabled_purchase_leaves_none() {
        let (mut scheduler, store) = service();
        scheduler.update_from_settings(&ReminderSettings::default()).await.unwrap();

        let settings = ReminderSettings { purchase_enabled: false, ..Default::default() };
        scheduler.update_from_settings(&settings).await.unwrap();

        let pending = store.pending().await.unwrap();
        assert!(pending.iter().all(|p| p.category != Category::Purchase));
        assert!(pending.iter().any(|p| p.id == BUDGET_UPDATE_ID));

        // Idempotent: a second application produces the same end state.
        scheduler.update_from_settings(&settings).await.unwrap();
        let again = store.pending().await.unwrap();
        assert_eq!(again.len(), pending.len());
    }

    #[tokio::test]
    async fn test_update_from_settings_attempts_budget_after_purchase_failure() {
        let (mut scheduler, store) = service();
        store.set_authorization(AuthorizationState::Denied).await;

        let err = scheduler.update_from_settings(&ReminderSettings::default()).await.unwrap_err();
        assert!(matches!(err, NotifyError::AuthorizationDenied));
        // Neither kind landed, but both were attempted without panicking.
        assert!(store.pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_budget_warning_unique_per_call() {
        let (mut scheduler, store) = service();
        scheduler.schedule_budget_warning("Food", 120.0, 100.0, 1).await.unwrap();
        scheduler.schedule_budget_warning("Food", 125.0, 100.0, 1).await.unwrap();

        // No dedup across repeated crossings: two distinct pending alerts.
        let pending = store.pending().await.unwrap();
        assert_eq!(pending.len(), 2);
        assert!(pending.iter().all(|p| p.category == Category::Warning));
        assert_ne!(pending[0].id, pending[1].id);
    }

    #[tokio::test]
    async fn test_achievement_is_best_effort() {
        let (mut scheduler, store) = service();
        store.set_unavailable(true).await;

        // Must not propagate or panic.
        scheduler.schedule_achievement("Streak!", "Seven days in a row.", 1).await;

        let status = scheduler.status_handle();
        assert!(status.lock().unwrap().last_error.is_some());
    }

    #[tokio::test]
    async fn test_backup_reminder_is_best_effort() {
        let (mut scheduler, store) = service();
        scheduler.schedule_backup_reminder(30).await;
        let pending = store.pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].category, Category::Reminder);
    }

    #[tokio::test]
    async fn test_cleanup_old_prunes_only_stale() {
        let (mut scheduler, store) = service();
        store.push_delivered("old", Utc::now() - Duration::days(10)).await;
        store.push_delivered("fresh", Utc::now() - Duration::days(2)).await;

        let removed = scheduler.cleanup_old(Duration::days(7)).await.unwrap();
        assert_eq!(removed, 1);

        let delivered = store.delivered().await.unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].id, "fresh");
    }

    #[tokio::test]
    async fn test_register_categories_is_complete() {
        let (scheduler, store) = service();
        scheduler.register_categories().await.unwrap();
        let registered = store.registered_categories().await.unwrap();
        assert_eq!(registered.len(), Category::ALL.len());
    }
}
