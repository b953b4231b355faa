//! # Centime Notify
//!
//! Local notification scheduling and delivery coordination for the Centime
//! budget tracker. Turns business events (recurring reminders, budget
//! threshold breaches, achievements, backup nudges) into scheduled alerts
//! against the OS-owned notification store, routes delivered-alert
//! interactions back into the application, and reports scheduling health.
//!
//! ## Architecture
//! ```text
//! settings / budget events
//!   └── AlertScheduler ──(validate + capacity cap)──> NotificationStore (OS)
//!         ├── TemplateCatalog: canned + parameterized content
//!         ├── TriggerPlanner: frequency/delay → concrete triggers
//!         └── AuthorizationGate: polled OS permission state
//!
//! delivered alert action
//!   └── ActionRouter ──> AppEvent channel (navigation) | snooze re-schedule
//!
//! DiagnosticsEngine: statistics + health + system report
//! Maintenance: auth poll / delivered cleanup / stats logging (tokio timers)
//! ```
//!
//! The OS store is external, asynchronous, and eventually consistent; the
//! engine keeps only a best-effort mirror and a last-error/last-success
//! scalar pair. Tests substitute the bundled in-memory [`MemoryStore`].

pub mod authorize;
pub mod diagnostics;
pub mod maintenance;
pub mod request;
pub mod router;
pub mod scheduler;
pub mod store;
pub mod template;
pub mod trigger;

pub use authorize::AuthorizationGate;
pub use diagnostics::{DiagnosticsEngine, Health, Statistics, SystemGrade, SystemReport};
pub use request::{
    AuthorizationOptions, AuthorizationState, Category, CategoryRegistration, ChannelSettings,
    DeliveredRecord, PendingNotification, Priority, ScheduleRequest, Template, TriggerSpec,
};
pub use router::{ActionRouter, AppEvent, Routed};
pub use scheduler::{AlertScheduler, OpsStatus, ReminderSettings};
pub use store::{MemoryStore, NotificationStore};
pub use template::TemplateCatalog;
pub use trigger::Frequency;
