//! Authorization tracking against the OS permission system.
//!
//! The OS owns this state and can change it at any time outside the engine
//! (Settings app, profile policy), so it is polled, never pushed: fresh on
//! every foreground transition and on a background timer.

use std::sync::{Arc, Mutex};

use centime_core::error::Result;

use crate::request::{AuthorizationOptions, AuthorizationState};
use crate::store::NotificationStore;

/// Cached view of the OS permission state.
///
/// State machine as the engine sees it: `not_determined` transitions to
/// `authorized` or `denied` through [`request_authorization`]; every other
/// state is terminal here and only re-observed.
///
/// [`request_authorization`]: AuthorizationGate::request_authorization
pub struct AuthorizationGate {
    store: Arc<dyn NotificationStore>,
    cached: Mutex<AuthorizationState>,
}

impl AuthorizationGate {
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        Self { store, cached: Mutex::new(AuthorizationState::NotDetermined) }
    }

    /// Idempotent permission request: a state that already allows delivery
    /// short-circuits without re-prompting the user. Denial is a valid
    /// `false` result, not an error.
    pub async fn request_authorization(&self, options: AuthorizationOptions) -> Result<bool> {
        let current = self.check_status().await?;
        if current.can_deliver() {
            return Ok(true);
        }
        let granted = self.store.request_authorization(options).await?;
        let state = self.store.authorization_status().await?;
        *self.cached.lock().unwrap_or_else(|e| e.into_inner()) = state;
        tracing::info!("🔐 Notification permission prompt answered: granted={granted}");
        Ok(granted)
    }

    /// Fresh poll of the OS; updates the cached state.
    pub async fn check_status(&self) -> Result<AuthorizationState> {
        let state = self.store.authorization_status().await?;
        let mut cached = self.cached.lock().unwrap_or_else(|e| e.into_inner());
        if *cached != state {
            tracing::info!("🔐 Authorization state changed: {:?} -> {:?}", *cached, state);
        }
        *cached = state;
        Ok(state)
    }

    /// Last observed state, without touching the OS.
    pub fn cached(&self) -> AuthorizationState {
        *self.cached.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Re-poll hook for app-foreground transitions.
    pub async fn on_foreground(&self) {
        if let Err(e) = self.check_status().await {
            tracing::warn!("⚠️ Authorization re-poll failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn gate_with_store() -> (AuthorizationGate, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (AuthorizationGate::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_request_prompts_from_not_determined() {
        let (gate, store) = gate_with_store();
        store.set_authorization(AuthorizationState::NotDetermined).await;

        assert!(gate.request_authorization(AuthorizationOptions::default()).await.unwrap());
        assert_eq!(gate.cached(), AuthorizationState::Authorized);
        assert_eq!(store.auth_request_count().await, 1);
    }

    #[tokio::test]
    async fn test_request_is_idempotent_once_authorized() {
        let (gate, store) = gate_with_store();

        assert!(gate.request_authorization(AuthorizationOptions::default()).await.unwrap());
        assert!(gate.request_authorization(AuthorizationOptions::default()).await.unwrap());
        // Already authorized: the user is never prompted.
        assert_eq!(store.auth_request_count().await, 0);
    }

    #[tokio::test]
    async fn test_denial_is_false_not_error() {
        let (gate, store) = gate_with_store();
        store.set_authorization(AuthorizationState::NotDetermined).await;
        store.set_grant(false).await;

        let granted = gate.request_authorization(AuthorizationOptions::default()).await.unwrap();
        assert!(!granted);
        assert_eq!(gate.cached(), AuthorizationState::Denied);
    }

    #[tokio::test]
    async fn test_foreground_repoll_observes_external_change() {
        let (gate, store) = gate_with_store();
        gate.check_status().await.unwrap();
        assert_eq!(gate.cached(), AuthorizationState::Authorized);

        // The user flips the switch in system settings.
        store.set_authorization(AuthorizationState::Denied).await;
        gate.on_foreground().await;
        assert_eq!(gate.cached(), AuthorizationState::Denied);
    }
}
