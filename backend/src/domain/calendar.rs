//! Calendar domain logic for the dog tracker.
//!
//! Dates and times are kept as the strings the app displays: `MM/DD/YY` for
//! dates and `hh:mm AM/PM` for times. "Is this today?" is string equality
//! against a freshly formatted today.

use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use std::fmt::Debug;
use std::sync::{Arc, Mutex};

/// chrono pattern for stored dates (MM/DD/YY)
pub const DATE_FORMAT: &str = "%m/%d/%y";

/// chrono pattern for stored times (hh:mm AM/PM)
pub const TIME_FORMAT: &str = "%I:%M %p";

/// Source of the current local date and time
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> NaiveDateTime;
}

/// Wall clock in the local timezone
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock pinned to a settable instant
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now: Mutex::new(now) }
    }

    /// Clock fixed at noon on the given day
    pub fn on(date: NaiveDate) -> Self {
        Self::new(date.and_hms_opt(12, 0, 0).unwrap_or_default())
    }

    pub fn set(&self, now: NaiveDateTime) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }

    pub fn advance_days(&self, days: i64) {
        if let Ok(mut guard) = self.now.lock() {
            *guard += Duration::days(days);
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.now.lock().map(|guard| *guard).unwrap_or_default()
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_time(time: NaiveDateTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// Calendar service that answers "what day is it" for the rest of the domain
#[derive(Clone, Debug)]
pub struct CalendarService {
    clock: Arc<dyn Clock>,
}

impl Default for CalendarService {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl CalendarService {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Today's date formatted as MM/DD/YY
    pub fn today(&self) -> String {
        format_date(self.clock.now().date())
    }

    /// Current time formatted as hh:mm AM/PM
    pub fn current_time(&self) -> String {
        format_time(self.clock.now())
    }

    pub fn is_today(&self, date: &str) -> bool {
        date == self.today()
    }
}
