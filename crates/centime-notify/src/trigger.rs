//! Trigger planning — converts abstract frequency/delay specs into concrete
//! triggers and computes next-fire instants.
//!
//! The frequency mapping is deterministic and load-bearing for callers:
//! daily keeps only the hour, weekly pins Sunday, monthly pins a day of
//! month, yearly pins January 1st at 09:00 regardless of the requested hour.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::request::TriggerSpec;

/// Abstract cadence coming from the settings surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// Map a frequency to its calendar trigger.
pub fn from_frequency(frequency: Frequency, hour: u32) -> TriggerSpec {
    match frequency {
        Frequency::Daily => TriggerSpec::Recurring {
            weekday: None,
            day_of_month: None,
            month: None,
            hour,
            minute: 0,
        },
        Frequency::Weekly => TriggerSpec::Recurring {
            weekday: Some(Weekday::Sun),
            day_of_month: None,
            month: None,
            hour,
            minute: 0,
        },
        Frequency::Monthly => TriggerSpec::Recurring {
            weekday: None,
            day_of_month: Some(1),
            month: None,
            hour,
            minute: 0,
        },
        // Yearly always lands on Jan 1st at 09:00.
        Frequency::Yearly => TriggerSpec::Recurring {
            weekday: None,
            day_of_month: Some(1),
            month: Some(1),
            hour: 9,
            minute: 0,
        },
    }
}

/// Monthly cadence on a configured day (the budget-update reminder).
/// Days are clamped to 1..=28 so the trigger fires in every month.
pub fn from_frequency_on_day(frequency: Frequency, hour: u32, day: u32) -> TriggerSpec {
    let mut spec = from_frequency(frequency, hour);
    if let TriggerSpec::Recurring { day_of_month: Some(dom), month: None, .. } = &mut spec {
        *dom = day.clamp(1, 28);
    }
    spec
}

/// One-shot trigger; delays below one second floor to one to avoid an
/// instant or invalid firing.
pub fn from_delay(delay_secs: u64) -> TriggerSpec {
    TriggerSpec::OneShot { delay_secs: delay_secs.max(1) }
}

/// Earliest fire instant for a trigger.
///
/// One-shots fire at `requested_at + delay` (returned even when already
/// past, since the store is about to deliver them). Recurring triggers
/// search the calendar for the first matching instant strictly after `now`,
/// up to two years ahead; an unsatisfiable spec yields None.
pub fn next_fire_after(
    trigger: &TriggerSpec,
    requested_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match trigger {
        TriggerSpec::OneShot { delay_secs } => {
            Some(requested_at + Duration::seconds(*delay_secs as i64))
        }
        TriggerSpec::Recurring { weekday, day_of_month, month, hour, minute } => {
            let mut day = now.date_naive();
            for _ in 0..=(366 * 2) {
                let day_matches = weekday.is_none_or(|w| day.weekday() == w)
                    && day_of_month.is_none_or(|d| day.day() == d)
                    && month.is_none_or(|m| day.month() == m);
                if day_matches
                    && let Some(at) = day.and_hms_opt(*hour, *minute, 0)
                {
                    let at = Utc.from_utc_datetime(&at);
                    if at > now {
                        return Some(at);
                    }
                }
                day = day.succ_opt()?;
            }
            None
        }
    }
}
