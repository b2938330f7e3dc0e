//! Schedule matching and cross-cycle deduplication.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Datelike, Local, NaiveDateTime, TimeZone, Timelike};

use slotwatch_core::ScheduleWindow;

use crate::parse::scrape_results_page;

/// Shape of the normalized appointment text, e.g.
/// `"Saturday, March 14, 2026 9:30 AM"`.
const APPOINTMENT_FORMAT: &str = "%A, %B %d, %Y %I:%M %p";

/// Display shape: `MM/DD/YYYY hh:mm am|pm`, zero-padded, hour 0 shown as 12.
const DISPLAY_FORMAT: &str = "%m/%d/%Y %I:%M %P";

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// An appointment slot that passed the schedule test and was not seen before.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentMatch {
    pub office_name: String,
    pub appointment: DateTime<Local>,
    pub formatted: String,
}

/// Outcome of one schedule entry firing against a scraped slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchSignal {
    Found(AppointmentMatch),
    /// The slot fired but its `(office, raw date)` key was already notified.
    Duplicate {
        office_name: String,
        raw_date: String,
    },
}

/// Already-notified `(office, raw date string)` keys. Memory-only, never
/// evicted; cardinality is bounded by offices × distinct slots actually seen.
#[derive(Debug, Default)]
pub struct DedupSet {
    seen: HashSet<String>,
}

impl DedupSet {
    /// Marks the key as notified. Returns `true` if it was new.
    pub fn mark(&mut self, office_name: &str, raw_date: &str) -> bool {
        self.seen.insert(format!("{office_name}{raw_date}"))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Tests scraped results pages against the per-weekday schedule and owns the
/// dedup state. Accessed only from the single polling task, so no locking.
#[derive(Debug)]
pub struct Matcher {
    schedule: BTreeMap<u8, ScheduleWindow>,
    find_appointment_within_days: f64,
    dedup: DedupSet,
}

impl Matcher {
    #[must_use]
    pub fn new(schedule: BTreeMap<u8, ScheduleWindow>, find_appointment_within_days: f64) -> Self {
        Self {
            schedule,
            find_appointment_within_days,
            dedup: DedupSet::default(),
        }
    }

    /// Evaluates a results page against the schedule.
    ///
    /// Returns one signal per schedule entry that fires: the first firing
    /// entry for a new `(office, raw date)` key yields [`MatchSignal::Found`],
    /// every further firing yields [`MatchSignal::Duplicate`]. A page with no
    /// slot, or with unparsable appointment text, yields no signals — that is
    /// the site's normal "nothing available" answer, never an error.
    pub fn evaluate(&mut self, html: &str, office_name: &str) -> Vec<MatchSignal> {
        self.evaluate_at(html, office_name, Local::now())
    }

    /// Number of distinct `(office, raw date)` keys already notified.
    #[must_use]
    pub fn dedup_len(&self) -> usize {
        self.dedup.len()
    }

    /// [`Self::evaluate`] with an injected clock, for tests.
    pub fn evaluate_at(
        &mut self,
        html: &str,
        office_name: &str,
        now: DateTime<Local>,
    ) -> Vec<MatchSignal> {
        let scrape = scrape_results_page(html);

        let Some(raw_date) = scrape.appointment_text else {
            if !scrape.validation_errors.is_empty() {
                tracing::warn!(
                    office = office_name,
                    "results page carries validation errors; check the configured form fields"
                );
                for message in &scrape.validation_errors {
                    tracing::warn!(office = office_name, %message, "validation error");
                }
            } else {
                tracing::debug!(office = office_name, "no open slot");
            }
            return Vec::new();
        };

        tracing::info!(office = office_name, date = %raw_date, "scraped appointment");

        let Some(appointment) = parse_appointment_date(&raw_date) else {
            tracing::debug!(office = office_name, date = %raw_date, "unparsable appointment text");
            return Vec::new();
        };

        let days_until = (appointment - now).num_milliseconds() as f64 / MILLIS_PER_DAY;
        let weekday = appointment.weekday().num_days_from_sunday();
        let hour = appointment.hour();

        let mut signals = Vec::new();
        for (day, window) in &self.schedule {
            let fires = u32::from(*day) == weekday
                && hour >= window.start_hour
                && hour < window.end_hour
                && days_until < self.find_appointment_within_days
                && window.allowed;
            if !fires {
                continue;
            }

            if self.dedup.mark(office_name, &raw_date) {
                signals.push(MatchSignal::Found(AppointmentMatch {
                    office_name: office_name.to_string(),
                    appointment,
                    formatted: format_appointment(&appointment),
                }));
            } else {
                signals.push(MatchSignal::Duplicate {
                    office_name: office_name.to_string(),
                    raw_date: raw_date.clone(),
                });
            }
        }

        signals
    }
}

/// Parses normalized appointment text into a local-timezone timestamp.
///
/// Returns `None` for text that does not match the expected shape, or for
/// wall-clock times that do not exist locally (DST gaps).
#[must_use]
pub fn parse_appointment_date(raw: &str) -> Option<DateTime<Local>> {
    let naive = NaiveDateTime::parse_from_str(raw, APPOINTMENT_FORMAT).ok()?;
    Local.from_local_datetime(&naive).single()
}

#[must_use]
pub fn format_appointment(appointment: &DateTime<Local>) -> String {
    appointment.format(DISPLAY_FORMAT).to_string()
}

#[cfg(test)]
#[path = "matcher_test.rs"]
mod tests;
