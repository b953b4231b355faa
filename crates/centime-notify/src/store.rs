//! The OS notification store boundary.
//!
//! The platform notification center is a global mutable external system and
//! the single source of truth for all schedule state. The engine only talks
//! to it through this capability trait, so tests and local development can
//! substitute [`MemoryStore`] for the real OS binding.
//!
//! Writes are not guaranteed immediately visible to subsequent reads; every
//! caller that needs current state re-lists before acting.

use async_trait::async_trait;
use centime_core::error::{NotifyError, Result};
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::request::{
    AuthorizationOptions, AuthorizationState, Category, CategoryRegistration, ChannelSettings,
    DeliveredRecord, PendingNotification, ScheduleRequest,
};

/// Capability surface of the OS notification center.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Prompt the user for permission. Returns whether delivery is allowed.
    async fn request_authorization(&self, options: AuthorizationOptions) -> Result<bool>;

    /// Fresh poll of the current authorization state.
    async fn authorization_status(&self) -> Result<AuthorizationState>;

    /// Master-switch and per-channel enablement as the OS reports them.
    async fn channel_settings(&self) -> Result<ChannelSettings>;

    /// Replace the registered category/action sets.
    async fn register_categories(&self, categories: &[CategoryRegistration]) -> Result<()>;

    async fn registered_categories(&self) -> Result<Vec<Category>>;

    /// Submit one schedule request. An existing request with the same id is
    /// replaced.
    async fn add(&self, request: ScheduleRequest) -> Result<()>;

    /// All currently pending requests.
    async fn pending(&self) -> Result<Vec<PendingNotification>>;

    async fn remove_pending(&self, ids: &[String]) -> Result<()>;

    async fn remove_all_pending(&self) -> Result<()>;

    /// Requests the OS has already presented to the user.
    async fn delivered(&self) -> Result<Vec<DeliveredRecord>>;

    async fn remove_delivered(&self, ids: &[String]) -> Result<()>;
}

/// In-memory notification store for tests and local development.
///
/// Starts authorized with all channels enabled so scheduling paths work
/// without a permission dance; use the `set_*` helpers to exercise the
/// unhappy paths.
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

struct MemoryInner {
    authorization: AuthorizationState,
    grant_on_request: bool,
    auth_requests: u32,
    settings: ChannelSettings,
    categories: Vec<CategoryRegistration>,
    pending: Vec<(ScheduleRequest, DateTime<Utc>)>,
    delivered: Vec<DeliveredRecord>,
    unavailable: bool,
    add_fails: bool,
}

impl Default for MemoryInner {
    fn default() -> Self {
        Self {
            authorization: AuthorizationState::Authorized,
            grant_on_request: true,
            auth_requests: 0,
            settings: ChannelSettings::default(),
            categories: Vec::new(),
            pending: Vec::new(),
            delivered: Vec::new(),
            unavailable: false,
            add_fails: false,
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self { inner: Mutex::new(MemoryInner::default()) }
    }

    /// Force a specific authorization state.
    pub async fn set_authorization(&self, state: AuthorizationState) {
        self.inner.lock().await.authorization = state;
    }

    /// Make future permission prompts resolve to denied.
    pub async fn set_grant(&self, grant: bool) {
        self.inner.lock().await.grant_on_request = grant;
    }

    /// How many times the user has actually been prompted.
    pub async fn auth_request_count(&self) -> u32 {
        self.inner.lock().await.auth_requests
    }

    pub async fn set_channel_settings(&self, settings: ChannelSettings) {
        self.inner.lock().await.settings = settings;
    }

    /// Simulate the store going away (every call fails).
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.inner.lock().await.unavailable = unavailable;
    }

    /// Fail only submissions, leaving reads working.
    pub async fn set_add_failure(&self, fail: bool) {
        self.inner.lock().await.add_fails = fail;
    }

    /// Full stored request, for asserting submitted content in tests.
    pub async fn pending_request(&self, id: &str) -> Option<ScheduleRequest> {
        self.inner
            .lock()
            .await
            .pending
            .iter()
            .find(|(request, _)| request.id == id)
            .map(|(request, _)| request.clone())
    }

    /// Move a pending request into the delivered set, as the OS does when it
    /// presents an alert. Returns false if the id was not pending.
    pub async fn deliver(&self, id: &str) -> bool {
        let mut inner = self.inner.lock().await;
        let before = inner.pending.len();
        inner.pending.retain(|(request, _)| request.id != id);
        if inner.pending.len() < before {
            inner
                .delivered
                .push(DeliveredRecord { id: id.to_string(), delivered_at: Utc::now() });
            true
        } else {
            false
        }
    }

    /// Insert a delivered record with an explicit timestamp (for pruning
    /// tests).
    pub async fn push_delivered(&self, id: &str, delivered_at: DateTime<Utc>) {
        self.inner
            .lock()
            .await
            .delivered
            .push(DeliveredRecord { id: id.to_string(), delivered_at });
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn check_available(inner: &MemoryInner) -> Result<()> {
    if inner.unavailable {
        Err(NotifyError::unavailable("simulated outage"))
    } else {
        Ok(())
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn request_authorization(&self, _options: AuthorizationOptions) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        check_available(&inner)?;
        inner.auth_requests += 1;
        if inner.authorization == AuthorizationState::NotDetermined {
            inner.authorization = if inner.grant_on_request {
                AuthorizationState::Authorized
            } else {
                AuthorizationState::Denied
            };
        }
        Ok(inner.authorization.can_deliver())
    }

    async fn authorization_status(&self) -> Result<AuthorizationState> {
        let inner = self.inner.lock().await;
        check_available(&inner)?;
        Ok(inner.authorization)
    }

    async fn channel_settings(&self) -> Result<ChannelSettings> {
        let inner = self.inner.lock().await;
        check_available(&inner)?;
        Ok(inner.settings)
    }

    async fn register_categories(&self, categories: &[CategoryRegistration]) -> Result<()> {
        let mut inner = self.inner.lock().await;
        check_available(&inner)?;
        inner.categories = categories.to_vec();
        Ok(())
    }

    async fn registered_categories(&self) -> Result<Vec<Category>> {
        let inner = self.inner.lock().await;
        check_available(&inner)?;
        Ok(inner.categories.iter().map(|r| r.category).collect())
    }

    async fn add(&self, request: ScheduleRequest) -> Result<()> {
        let mut inner = self.inner.lock().await;
        check_available(&inner)?;
        if inner.add_fails {
            return Err(NotifyError::unavailable("submission rejected"));
        }
        // Same-id submission replaces, as the OS store does.
        inner.pending.retain(|(existing, _)| existing.id != request.id);
        inner.pending.push((request, Utc::now()));
        Ok(())
    }

    async fn pending(&self) -> Result<Vec<PendingNotification>> {
        let inner = self.inner.lock().await;
        check_available(&inner)?;
        Ok(inner
            .pending
            .iter()
            .map(|(request, requested_at)| PendingNotification {
                id: request.id.clone(),
                category: request.template.category,
                priority: request.template.priority,
                trigger: request.trigger.clone(),
                requested_at: *requested_at,
            })
            .collect())
    }

    async fn remove_pending(&self, ids: &[String]) -> Result<()> {
        let mut inner = self.inner.lock().await;
        check_available(&inner)?;
        inner.pending.retain(|(request, _)| !ids.contains(&request.id));
        Ok(())
    }

    async fn remove_all_pending(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        check_available(&inner)?;
        inner.pending.clear();
        Ok(())
    }

    async fn delivered(&self) -> Result<Vec<DeliveredRecord>> {
        let inner = self.inner.lock().await;
        check_available(&inner)?;
        Ok(inner.delivered.clone())
    }

    async fn remove_delivered(&self, ids: &[String]) -> Result<()> {
        let mut inner = self.inner.lock().await;
        check_available(&inner)?;
        inner.delivered.retain(|record| !ids.contains(&record.id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{Priority, Template, TriggerSpec};

    fn request(id: &str, category: Category) -> ScheduleRequest {
        let template = Template::new("title", "body", category, Priority::Normal);
        ScheduleRequest::new(id, template, TriggerSpec::OneShot { delay_secs: 60 })
    }

    #[tokio::test]
    async fn test_add_and_list() {
        let store = MemoryStore::new();
        store.add(request("a", Category::Purchase)).await.unwrap();
        store.add(request("b", Category::Budget)).await.unwrap();

        let pending = store.pending().await.unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].id, "a");
        assert_eq!(pending[0].category, Category::Purchase);
    }

    #[tokio::test]
    async fn test_same_id_replaces() {
        let store = MemoryStore::new();
        store.add(request("a", Category::Purchase)).await.unwrap();
        store.add(request("a", Category::Budget)).await.unwrap();

        let pending = store.pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].category, Category::Budget);
    }

    #[tokio::test]
    async fn test_deliver_moves_to_history() {
        let store = MemoryStore::new();
        store.add(request("a", Category::Purchase)).await.unwrap();
        assert!(store.deliver("a").await);
        assert!(!store.deliver("a").await);

        assert!(store.pending().await.unwrap().is_empty());
        let delivered = store.delivered().await.unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].id, "a");
    }

    #[tokio::test]
    async fn test_authorization_prompt_transitions_once() {
        let store = MemoryStore::new();
        store.set_authorization(AuthorizationState::NotDetermined).await;

        assert!(store.request_authorization(AuthorizationOptions::default()).await.unwrap());
        assert_eq!(
            store.authorization_status().await.unwrap(),
            AuthorizationState::Authorized
        );
        assert_eq!(store.auth_request_count().await, 1);
    }

    #[tokio::test]
    async fn test_denied_prompt() {
        let store = MemoryStore::new();
        store.set_authorization(AuthorizationState::NotDetermined).await;
        store.set_grant(false).await;

        assert!(!store.request_authorization(AuthorizationOptions::default()).await.unwrap());
        assert_eq!(store.authorization_status().await.unwrap(), AuthorizationState::Denied);
    }

    #[tokio::test]
    async fn test_unavailable_store_errors() {
        let store = MemoryStore::new();
        store.set_unavailable(true).await;
        let err = store.pending().await.unwrap_err();
        assert!(matches!(err, NotifyError::SystemUnavailable(_)));
    }
}
