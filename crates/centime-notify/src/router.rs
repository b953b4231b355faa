//! Maps delivered-alert interactions back into the application.
//!
//! When the user taps an action button (or the alert body), the OS hands
//! back the action id plus the metadata stamped at scheduling time. The
//! router either publishes a navigation event on the outbound channel or,
//! for "remind me later", performs the deferred re-schedule. Unrecognized
//! ids are logged and dropped, never an error.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::sync::mpsc;

use crate::request::action_ids;
use crate::scheduler::{AlertScheduler, META_CATEGORY};

/// Tap on the alert body rather than a button.
pub const DEFAULT_ACTION: &str = "default";

/// Navigation events consumed by the navigation collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AppEvent {
    OpenAddPurchase,
    OpenBudgetView,
    OpenBudgetUpdate,
    OpenSpendingView,
    OpenBudgetAdjustment,
    OpenAchievements,
    OpenApp,
}

/// Routing outcome for one interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    Event(AppEvent),
    /// "Remind me later": re-schedule instead of navigating.
    Deferred,
    /// Unrecognized action id; logged, no-op.
    Unknown,
}

/// Closed action-id mapping.
pub fn route(action_id: &str) -> Routed {
    match action_id {
        action_ids::ADD_PURCHASE => Routed::Event(AppEvent::OpenAddPurchase),
        action_ids::VIEW_BUDGET => Routed::Event(AppEvent::OpenBudgetView),
        action_ids::UPDATE_BUDGET => Routed::Event(AppEvent::OpenBudgetUpdate),
        action_ids::VIEW_SPENDING => Routed::Event(AppEvent::OpenSpendingView),
        action_ids::ADJUST_BUDGET => Routed::Event(AppEvent::OpenBudgetAdjustment),
        action_ids::VIEW_ACHIEVEMENTS => Routed::Event(AppEvent::OpenAchievements),
        action_ids::OPEN_APP | DEFAULT_ACTION => Routed::Event(AppEvent::OpenApp),
        action_ids::REMIND_LATER => Routed::Deferred,
        _ => Routed::Unknown,
    }
}

/// Publishes routed interactions to the navigation collaborator.
pub struct ActionRouter {
    scheduler: Arc<Mutex<AlertScheduler>>,
    events: mpsc::UnboundedSender<AppEvent>,
}

impl ActionRouter {
    /// Returns the router and the receiving end of the outbound channel.
    pub fn new(
        scheduler: Arc<Mutex<AlertScheduler>>,
    ) -> (Self, mpsc::UnboundedReceiver<AppEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        (Self { scheduler, events }, receiver)
    }

    /// Handle one delivered-alert interaction.
    pub async fn handle(&self, action_id: &str, metadata: &HashMap<String, String>) -> Routed {
        let routed = route(action_id);
        match routed {
            Routed::Event(event) => {
                tracing::info!("🔀 Alert action '{action_id}' routed to {event:?}");
                if self.events.send(event).is_err() {
                    tracing::warn!("⚠️ Navigation consumer gone; dropping {event:?}");
                }
            }
            Routed::Deferred => {
                let mut scheduler = self.scheduler.lock().await;
                if let Err(e) = scheduler.snooze_purchase_reminder().await {
                    tracing::warn!("⚠️ Snooze re-schedule failed: {e}");
                }
            }
            Routed::Unknown => {
                tracing::warn!(
                    "❓ Unrecognized alert action '{action_id}' (category: {:?})",
                    metadata.get(META_CATEGORY)
                );
            }
        }
        routed
    }
}
