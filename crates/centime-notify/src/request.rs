//! Core data model for scheduled alerts.

use std::collections::HashMap;

use centime_core::error::{NotifyError, Result};
use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Title ceiling imposed by the delivery surface.
pub const MAX_TITLE_CHARS: usize = 100;
/// Body ceiling imposed by the delivery surface.
pub const MAX_BODY_CHARS: usize = 500;

/// Action button identifiers carried on delivered alerts.
pub mod action_ids {
    pub const ADD_PURCHASE: &str = "add-purchase";
    pub const REMIND_LATER: &str = "remind-later";
    pub const UPDATE_BUDGET: &str = "update-budget";
    pub const VIEW_SPENDING: &str = "view-spending";
    pub const VIEW_BUDGET: &str = "view-budget";
    pub const ADJUST_BUDGET: &str = "adjust-budget";
    pub const VIEW_ACHIEVEMENTS: &str = "view-achievements";
    pub const OPEN_APP: &str = "open-app";
}

/// Coarse classification used for routing and bulk cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Purchase,
    Budget,
    Reminder,
    Achievement,
    Warning,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Purchase,
        Category::Budget,
        Category::Reminder,
        Category::Achievement,
        Category::Warning,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Purchase => "purchase",
            Category::Budget => "budget",
            Category::Reminder => "reminder",
            Category::Achievement => "achievement",
            Category::Warning => "warning",
        }
    }

    /// Action buttons delivered alongside alerts of this category. Shared by
    /// the template builders and the category registration at startup.
    pub fn actions(&self) -> Vec<TemplateAction> {
        let pairs: &[(&str, &str)] = match self {
            Category::Purchase => &[
                (action_ids::ADD_PURCHASE, "Add purchase"),
                (action_ids::REMIND_LATER, "Remind me later"),
            ],
            Category::Budget => &[
                (action_ids::UPDATE_BUDGET, "Review budget"),
                (action_ids::VIEW_SPENDING, "View spending"),
            ],
            Category::Warning => &[
                (action_ids::VIEW_BUDGET, "View budget"),
                (action_ids::ADJUST_BUDGET, "Adjust limit"),
            ],
            Category::Achievement => &[(action_ids::VIEW_ACHIEVEMENTS, "See achievements")],
            Category::Reminder => &[(action_ids::OPEN_APP, "Open Centime")],
        };
        pairs
            .iter()
            .map(|&(id, label)| TemplateAction::new(id, label))
            .collect()
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = NotifyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "purchase" => Ok(Category::Purchase),
            "budget" => Ok(Category::Budget),
            "reminder" => Ok(Category::Reminder),
            "achievement" => Ok(Category::Achievement),
            "warning" => Ok(Category::Warning),
            other => Err(NotifyError::CategoryNotFound(other.to_string())),
        }
    }
}

/// How assertively an alert is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Normal,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }

    /// Deterministic map to the OS interruption level.
    pub fn interruption_level(&self) -> InterruptionLevel {
        match self {
            Priority::Low => InterruptionLevel::Passive,
            Priority::Normal => InterruptionLevel::Active,
            Priority::High | Priority::Critical => InterruptionLevel::TimeSensitive,
        }
    }

    /// Low is silent, normal plays the default sound, high and critical the
    /// urgent one.
    pub fn sound(&self) -> Option<Sound> {
        match self {
            Priority::Low => None,
            Priority::Normal => Some(Sound::Default),
            Priority::High | Priority::Critical => Some(Sound::Urgent),
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How intrusively the OS presents an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterruptionLevel {
    Passive,
    Active,
    TimeSensitive,
}

/// Sound profile attached to a delivered alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sound {
    Default,
    Urgent,
}

/// One action button on a delivered alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateAction {
    pub id: String,
    pub label: String,
}

impl TemplateAction {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self { id: id.into(), label: label.into() }
    }
}

/// Validated content for one alert. Built through the catalog; immutable
/// once submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub title: String,
    pub body: String,
    pub category: Category,
    pub priority: Priority,
    #[serde(default)]
    pub actions: Vec<TemplateAction>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Template {
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        category: Category,
        priority: Priority,
    ) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            category,
            priority,
            actions: category.actions(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Title non-empty and at most 100 chars; body non-empty and at most
    /// 500 chars.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(NotifyError::template("title must not be empty"));
        }
        let title_len = self.title.chars().count();
        if title_len > MAX_TITLE_CHARS {
            return Err(NotifyError::template(format!(
                "title is {title_len} chars, max {MAX_TITLE_CHARS}"
            )));
        }
        if self.body.trim().is_empty() {
            return Err(NotifyError::template("body must not be empty"));
        }
        let body_len = self.body.chars().count();
        if body_len > MAX_BODY_CHARS {
            return Err(NotifyError::template(format!(
                "body is {body_len} chars, max {MAX_BODY_CHARS}"
            )));
        }
        Ok(())
    }
}

/// The timing rule governing when a request fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerSpec {
    /// Calendar-based repeating trigger; unset fields match every value.
    Recurring {
        weekday: Option<Weekday>,
        day_of_month: Option<u32>,
        month: Option<u32>,
        hour: u32,
        minute: u32,
    },
    /// Fires once after a relative delay.
    OneShot { delay_secs: u64 },
}

impl TriggerSpec {
    pub fn repeats(&self) -> bool {
        matches!(self, TriggerSpec::Recurring { .. })
    }
}

/// One submission against the OS store. Ids are namespaced and stable per
/// logical alert; one-off alerts append a unique token since the store
/// replaces on id collision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub id: String,
    pub template: Template,
    pub trigger: TriggerSpec,
    pub repeats: bool,
}

impl ScheduleRequest {
    pub fn new(id: impl Into<String>, template: Template, trigger: TriggerSpec) -> Self {
        let repeats = trigger.repeats();
        Self { id: id.into(), template, trigger, repeats }
    }
}

/// Mirror entry for one OS-held pending request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingNotification {
    pub id: String,
    pub category: Category,
    pub priority: Priority,
    pub trigger: TriggerSpec,
    pub requested_at: DateTime<Utc>,
}

/// A request the OS has already presented; kept only for age-based pruning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveredRecord {
    pub id: String,
    pub delivered_at: DateTime<Utc>,
}

/// OS-owned permission state; polled, never pushed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationState {
    #[default]
    NotDetermined,
    Denied,
    Authorized,
    Provisional,
    Ephemeral,
}

impl AuthorizationState {
    /// Whether the OS will deliver alerts in this state.
    pub fn can_deliver(&self) -> bool {
        matches!(
            self,
            AuthorizationState::Authorized
                | AuthorizationState::Provisional
                | AuthorizationState::Ephemeral
        )
    }
}

/// What the permission prompt asks for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AuthorizationOptions {
    pub alerts: bool,
    pub badges: bool,
    pub sounds: bool,
}

impl Default for AuthorizationOptions {
    fn default() -> Self {
        Self { alerts: true, badges: true, sounds: true }
    }
}

/// Master-switch and per-channel enablement as the OS reports them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChannelSettings {
    pub enabled: bool,
    pub alerts_enabled: bool,
    pub badges_enabled: bool,
    pub sounds_enabled: bool,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self { enabled: true, alerts_enabled: true, badges_enabled: true, sounds_enabled: true }
    }
}

/// A category/action set registered with the OS at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRegistration {
    pub category: Category,
    pub actions: Vec<TemplateAction>,
}
