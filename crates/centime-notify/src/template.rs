//! Template catalog — builds validated content for the five alert kinds.
//!
//! Purchase and budget-update reminders pick uniformly at random from a
//! fixed pool of canned phrasings so the recurring alerts don't go stale.
//! The RNG seed is injectable for deterministic tests.

use std::sync::Mutex;

use centime_core::error::{NotifyError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::request::{Category, Priority, Template};

const PURCHASE_POOL: &[(&str, &str)] = &[
    (
        "Log today's spending",
        "Take a minute to record any purchases you made today.",
    ),
    (
        "Purchases to record?",
        "Keep your ledger honest and add anything you bought today.",
    ),
    (
        "Quick spending check-in",
        "A few seconds now keeps your budget numbers accurate.",
    ),
    (
        "Don't lose track",
        "Recent purchases not in Centime yet? Add them while they're fresh.",
    ),
];

const BUDGET_POOL: &[(&str, &str)] = &[
    (
        "Budget check time",
        "See how this month's spending lines up against your budget.",
    ),
    (
        "How's the budget holding up?",
        "Open Centime for a quick look at where this month stands.",
    ),
    (
        "Monthly budget review",
        "Your categories are ready for a fresh look.",
    ),
    (
        "Time to review your budget",
        "A short review now makes month-end a lot calmer.",
    ),
];

/// Metadata keys written by the parameterized builders.
pub const META_BUDGET_CATEGORY: &str = "budget-category";
pub const META_SPENT: &str = "spent";
pub const META_LIMIT: &str = "limit";
pub const META_PERCENTAGE_OVER: &str = "percentage-over";

/// Builds and validates alert content.
pub struct TemplateCatalog {
    rng: Mutex<StdRng>,
}

impl TemplateCatalog {
    pub fn new() -> Self {
        Self { rng: Mutex::new(StdRng::from_entropy()) }
    }

    /// Deterministic pool selection for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self { rng: Mutex::new(StdRng::seed_from_u64(seed)) }
    }

    fn pick<'a>(&self, pool: &'a [(&'a str, &'a str)]) -> (&'a str, &'a str) {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        pool[rng.gen_range(0..pool.len())]
    }

    /// Recurring nudge to log recent purchases.
    pub fn purchase_reminder(&self) -> Result<Template> {
        let (title, body) = self.pick(PURCHASE_POOL);
        let template = Template::new(title, body, Category::Purchase, Priority::Normal);
        template.validate()?;
        Ok(template)
    }

    /// Recurring budget review reminder.
    pub fn budget_update(&self) -> Result<Template> {
        let (title, body) = self.pick(BUDGET_POOL);
        let template = Template::new(title, body, Category::Budget, Priority::Normal);
        template.validate()?;
        Ok(template)
    }

    /// Threshold-breach warning for one budget category.
    pub fn budget_warning(&self, category: &str, spent: f64, limit: f64) -> Result<Template> {
        if limit <= 0.0 {
            return Err(NotifyError::template("budget limit must be positive"));
        }
        let over = ((spent - limit) / limit) * 100.0;
        let template = Template::new(
            format!("{category} budget exceeded"),
            format!(
                "You've spent ${spent:.2} of your ${limit:.2} {category} budget, \
                 {over:.1}% over the limit."
            ),
            Category::Warning,
            Priority::High,
        )
        .with_metadata(META_BUDGET_CATEGORY, category)
        .with_metadata(META_SPENT, format!("{spent:.2}"))
        .with_metadata(META_LIMIT, format!("{limit:.2}"))
        .with_metadata(META_PERCENTAGE_OVER, format!("{over:.1}"));
        template.validate()?;
        Ok(template)
    }

    /// Caller-worded achievement celebration.
    pub fn achievement(&self, title: &str, message: &str) -> Result<Template> {
        let template = Template::new(title, message, Category::Achievement, Priority::Low);
        template.validate()?;
        Ok(template)
    }

    /// Fixed maintenance nudge to back up the ledger.
    pub fn backup_reminder(&self) -> Result<Template> {
        let template = Template::new(
            "Back up your data",
            "It's been a while since your last backup. Export a copy of your ledger to keep it safe.",
            Category::Reminder,
            Priority::Low,
        );
        template.validate()?;
        Ok(template)
    }
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self::new()
    }
}
